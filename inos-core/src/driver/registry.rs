//! Shared bookkeeping for driver implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use super::measurement::Measurement;
use crate::assessment::Assessment;

#[derive(Default)]
struct Inner {
    passed: HashMap<Assessment, bool>,
    measurements: HashMap<Assessment, Measurement>,
    tasks: HashMap<Assessment, JoinHandle<()>>,
}

/// Outcome snapshots plus the probe tasks currently running.
///
/// Cloning shares the same state, so a spawned probe can hold a clone and
/// record into it while the driver answers snapshot queries.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a payload and its derived outcome.
    pub fn record(&self, assessment: Assessment, measurement: Measurement, passed: bool) {
        let mut inner = self.lock();
        inner.measurements.insert(assessment, measurement);
        inner.passed.insert(assessment, passed);
    }

    pub fn record_passed(&self, assessment: Assessment, passed: bool) {
        self.lock().passed.insert(assessment, passed);
    }

    pub fn record_measurement(&self, assessment: Assessment, measurement: Measurement) {
        self.lock().measurements.insert(assessment, measurement);
    }

    /// Forget everything known about `assessment`.
    pub fn reset(&self, assessment: Assessment) {
        let mut inner = self.lock();
        inner.passed.remove(&assessment);
        inner.measurements.remove(&assessment);
    }

    /// Track a probe task, aborting any earlier task for the same assessment.
    pub fn track(&self, assessment: Assessment, task: JoinHandle<()>) {
        if let Some(previous) = self.lock().tasks.insert(assessment, task) {
            previous.abort();
        }
    }

    /// Abort the probe task for `assessment`. Returns whether one was running.
    pub fn abort(&self, assessment: Assessment) -> bool {
        match self.lock().tasks.remove(&assessment) {
            Some(task) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }

    pub fn passed(&self) -> HashMap<Assessment, bool> {
        self.lock().passed.clone()
    }

    pub fn measurements(&self) -> HashMap<Assessment, Measurement> {
        self.lock().measurements.clone()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn record_updates_both_snapshots() {
        let registry = ProbeRegistry::new();
        registry.record(Assessment::Torch, Measurement::Flag(true), true);
        assert_eq!(registry.passed().get(&Assessment::Torch), Some(&true));
        assert_eq!(
            registry.measurements().get(&Assessment::Torch),
            Some(&Measurement::Flag(true))
        );

        registry.reset(Assessment::Torch);
        assert!(registry.passed().is_empty());
        assert!(registry.measurements().is_empty());
    }

    #[tokio::test]
    async fn track_replaces_and_aborts_previous_task() {
        let registry = ProbeRegistry::new();
        let (guard, dropped) = tokio::sync::oneshot::channel::<()>();
        registry.track(
            Assessment::Gps,
            tokio::spawn(async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_secs(60)).await;
            }),
        );
        registry.track(
            Assessment::Gps,
            tokio::spawn(async { tokio::time::sleep(Duration::from_secs(60)).await }),
        );

        assert!(dropped.await.is_err());
        assert!(registry.abort(Assessment::Gps));
        assert!(!registry.abort(Assessment::Gps));
    }
}
