//! Models behind the full-screen test surfaces
//!
//! Each model tracks what the user has done on its surface and knows when
//! the surface has passed. Verdicts reach the outcome stream adapter as
//! [`DeviceEvent::SurfaceResult`] events on the bus.

pub mod compass;
pub mod deadpixel;
pub mod multitouch;
pub mod touch;

use std::time::Duration;

use crate::assessment::Surface;
use crate::events::{DeviceEvent, EventBus, EventSeq};

pub use compass::CompassTracker;
pub use deadpixel::{DeadpixelColor, DeadpixelSequence};
pub use multitouch::{MultitouchPairs, Side};
pub use touch::TouchGrid;

/// Time a surface gives the user before it fails.
pub const SURFACE_COUNTDOWN: Duration = Duration::from_secs(10);

/// Publish the verdict for `surface`.
pub async fn publish_verdict(bus: &dyn EventBus, surface: Surface, passed: bool) -> EventSeq {
    bus.publish(DeviceEvent::SurfaceResult { surface, passed })
        .await
}
