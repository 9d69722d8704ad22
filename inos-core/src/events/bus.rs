//! EventBus trait definition
//!
//! The bus is injected into the orchestrator rather than living in process
//! wide state, so tests publish synthetic events on their own instance.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::DeviceEvent;

/// Sequence number for events (monotonically increasing)
pub type EventSeq = u64;

/// Event bus for publishing and subscribing to DeviceEvents
///
/// Events are live only: a probe subscribes before it triggers anything,
/// so nothing published earlier matters to it.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event, returns its sequence number
    async fn publish(&self, event: DeviceEvent) -> EventSeq;

    /// Subscribe to all events from now (live stream)
    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, DeviceEvent)>;
}
