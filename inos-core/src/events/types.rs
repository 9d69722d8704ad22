//! Events exchanged between test surfaces, the system shell and the engine.

use serde::{Deserialize, Serialize};

use crate::assessment::{Surface, SystemTrigger};

/// Events published on the device event bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A full-screen test surface finished with a verdict.
    SurfaceResult { surface: Surface, passed: bool },
    /// The user typed back the number of trials they perceived.
    CountEntered { count: u32 },
    /// The app moved to the background.
    DidEnterBackground,
    /// The app is about to return to the foreground.
    WillEnterForeground,
    /// The device orientation changed.
    OrientationChanged,
}

impl DeviceEvent {
    /// The lifecycle trigger this event represents, if any.
    pub fn trigger(&self) -> Option<SystemTrigger> {
        match self {
            Self::DidEnterBackground => Some(SystemTrigger::DidEnterBackground),
            Self::WillEnterForeground => Some(SystemTrigger::WillEnterForeground),
            Self::OrientationChanged => Some(SystemTrigger::OrientationChanged),
            _ => None,
        }
    }

    pub fn from_trigger(trigger: SystemTrigger) -> Self {
        match trigger {
            SystemTrigger::DidEnterBackground => Self::DidEnterBackground,
            SystemTrigger::WillEnterForeground => Self::WillEnterForeground,
            SystemTrigger::OrientationChanged => Self::OrientationChanged,
        }
    }

    /// The verdict carried for `surface`, if this event is one.
    pub fn surface_verdict(&self, surface: Surface) -> Option<bool> {
        match self {
            Self::SurfaceResult {
                surface: reported,
                passed,
            } if *reported == surface => Some(*passed),
            _ => None,
        }
    }
}
