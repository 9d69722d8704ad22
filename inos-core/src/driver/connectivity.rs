//! Connectivity driver: cellular, Wi-Fi, Bluetooth and GPS.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::measurement::Measurement;
use super::registry::ProbeRegistry;
use super::traits::{AssessmentDriver, DriverKind, ProbeSender, ProbeUpdate};
use crate::assessment::Assessment;

/// Checks one radio link.
#[async_trait]
pub trait LinkMonitor: Send + Sync {
    /// Returns `Flag(true)` when the link is usable, or a failure payload.
    async fn check(&self, assessment: Assessment) -> Measurement;
}

pub struct ConnectivityDriver {
    monitor: Arc<dyn LinkMonitor>,
    registry: ProbeRegistry,
}

impl ConnectivityDriver {
    pub fn new(monitor: Arc<dyn LinkMonitor>) -> Self {
        Self {
            monitor,
            registry: ProbeRegistry::new(),
        }
    }
}

impl AssessmentDriver for ConnectivityDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Connectivity
    }

    fn start(&self, assessment: Assessment, updates: ProbeSender) {
        if assessment.driver_kind() != DriverKind::Connectivity {
            debug!(assessment = %assessment, "Connectivity driver does not probe this assessment");
            return;
        }

        let monitor = Arc::clone(&self.monitor);
        let registry = self.registry.clone();
        registry.reset(assessment);
        let task = tokio::spawn(async move {
            let measurement = monitor.check(assessment).await;
            let passed = measurement.verdict().unwrap_or(false);
            debug!(assessment = %assessment, passed, "Link check finished");
            registry.record(assessment, measurement, passed);
            let _ = updates.send(ProbeUpdate::Completed);
        });
        self.registry.track(assessment, task);
    }

    fn stop(&self, assessment: Assessment) {
        self.registry.abort(assessment);
    }

    fn has_passed(&self) -> HashMap<Assessment, bool> {
        self.registry.passed()
    }

    fn measurements(&self) -> HashMap<Assessment, Measurement> {
        self.registry.measurements()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::measurement::Permission;
    use crate::driver::traits::probe_channel;

    struct FixedLinks;

    #[async_trait]
    impl LinkMonitor for FixedLinks {
        async fn check(&self, assessment: Assessment) -> Measurement {
            match assessment {
                Assessment::Gps => Measurement::PermissionFailure(Permission::Location),
                Assessment::Cellular => Measurement::Flag(false),
                _ => Measurement::Flag(true),
            }
        }
    }

    #[tokio::test]
    async fn link_outcomes_follow_checks() {
        let driver = ConnectivityDriver::new(Arc::new(FixedLinks));
        for assessment in [Assessment::Wifi, Assessment::Cellular, Assessment::Gps] {
            let (tx, mut rx) = probe_channel();
            driver.start(assessment, tx);
            assert_eq!(rx.recv().await, Some(ProbeUpdate::Completed));
        }

        let passed = driver.has_passed();
        assert_eq!(passed.get(&Assessment::Wifi), Some(&true));
        assert_eq!(passed.get(&Assessment::Cellular), Some(&false));
        assert_eq!(passed.get(&Assessment::Gps), Some(&false));
    }

    #[tokio::test]
    async fn non_link_assessment_is_ignored() {
        let driver = ConnectivityDriver::new(Arc::new(FixedLinks));
        let (tx, mut rx) = probe_channel();
        driver.start(Assessment::Torch, tx);
        assert_eq!(rx.recv().await, None);
        assert!(driver.has_passed().is_empty());
    }
}
