//! In-memory EventBus implementation

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use super::DeviceEvent;
use super::bus::{EventBus, EventSeq};

/// In-memory implementation of EventBus
///
/// A subscriber more than `capacity` events behind skips the oldest ones.
pub struct MemoryEventBus {
    /// Next sequence number to assign
    next_seq: AtomicU64,
    /// Broadcast channel for live subscribers
    tx: broadcast::Sender<(EventSeq, DeviceEvent)>,
}

impl MemoryEventBus {
    /// Create a bus whose broadcast channel holds `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            next_seq: AtomicU64::new(0),
            tx,
        }
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: DeviceEvent) -> EventSeq {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

        // No receivers is fine
        let receivers = self.tx.send((seq, event)).unwrap_or(0);
        trace!(seq, receivers, "Published device event");

        seq
    }

    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, DeviceEvent)> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::Surface;

    // ==================== Publish Tests ====================

    #[tokio::test]
    async fn publish_increments_sequence_number() {
        let bus = MemoryEventBus::new(16);

        let first = bus.publish(DeviceEvent::OrientationChanged).await;
        let second = bus.publish(DeviceEvent::DidEnterBackground).await;

        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let bus = MemoryEventBus::new(4);
        assert_eq!(bus.publish(DeviceEvent::CountEntered { count: 3 }).await, 0);
    }

    // ==================== Subscribe Tests ====================

    #[tokio::test]
    async fn subscriber_receives_events_published_after_subscribing() {
        let bus = MemoryEventBus::new(16);
        bus.publish(DeviceEvent::OrientationChanged).await;

        let mut rx = bus.subscribe();
        let event = DeviceEvent::SurfaceResult {
            surface: Surface::Touchscreen,
            passed: true,
        };
        bus.publish(event.clone()).await;

        let (seq, received) = rx.recv().await.unwrap();
        assert_eq!(seq, 1);
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_past_capacity() {
        let bus = MemoryEventBus::new(2);
        let mut rx = bus.subscribe();
        for count in 0..4 {
            bus.publish(DeviceEvent::CountEntered { count }).await;
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        let (seq, _) = rx.recv().await.unwrap();
        assert_eq!(seq, 2);
    }
}
