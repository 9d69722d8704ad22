//! One-shot confirmation gate.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// How a confirmation wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Declined,
    Cancelled,
}

/// Holds the pending go-ahead request, if any.
///
/// Arming the gate replaces any earlier request; the earlier waiter sees
/// its request dropped and resolves as cancelled.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<bool>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a request and return the receiver to wait on.
    pub fn arm(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        *self.lock() = Some(tx);
        rx
    }

    /// Answer the pending request. Returns false when nothing was pending.
    pub fn resolve(&self, confirmed: bool) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(confirmed).is_ok(),
            None => false,
        }
    }

    /// Drop the pending request without answering it.
    pub fn clear(&self) {
        self.lock().take();
    }
}

/// Wait for the user's decision or for `token` to be cancelled.
pub async fn wait(request: oneshot::Receiver<bool>, token: &CancellationToken) -> Decision {
    tokio::select! {
        biased;
        _ = token.cancelled() => Decision::Cancelled,
        answer = request => match answer {
            Ok(true) => Decision::Confirmed,
            Ok(false) => Decision::Declined,
            Err(_) => Decision::Cancelled,
        },
    }
}
