//! Physical driver: buttons, sensors, speakers and haptics.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::measurement::Measurement;
use super::registry::ProbeRegistry;
use super::traits::{AssessmentDriver, DriverKind, ProbeSender, ProbeUpdate};
use crate::assessment::{Assessment, ProbePattern};

/// Access to the device's sensors and actuators.
#[async_trait]
pub trait SensorHub: Send + Sync {
    /// Run the probe for a sensor-backed assessment and return its payload.
    ///
    /// Refused permissions and unusable sensors are reported as
    /// [`Measurement::PermissionFailure`] or [`Measurement::SensorFailure`].
    async fn probe(&self, assessment: Assessment) -> Measurement;

    /// Play `count` trials (sounds or vibrations) for a count assessment.
    async fn emit_trials(&self, assessment: Assessment, count: u32);

    /// Release anything the probe holds, such as a lit torch.
    fn release(&self, assessment: Assessment);
}

pub struct PhysicalDriver {
    hub: Arc<dyn SensorHub>,
    registry: ProbeRegistry,
    trial_count_max: u32,
}

impl PhysicalDriver {
    pub fn new(hub: Arc<dyn SensorHub>, trial_count_max: u32) -> Self {
        Self {
            hub,
            registry: ProbeRegistry::new(),
            trial_count_max: trial_count_max.max(1),
        }
    }

    fn start_trials(&self, assessment: Assessment, updates: ProbeSender) {
        let count = rand::thread_rng().gen_range(1..=self.trial_count_max);
        self.registry.reset(assessment);
        self.registry
            .record_measurement(assessment, Measurement::TrialCount(count));
        debug!(assessment = %assessment, count, "Playing trials");

        let hub = Arc::clone(&self.hub);
        let task = tokio::spawn(async move {
            let _ = updates.send(ProbeUpdate::Reported(Measurement::TrialCount(count)));
            hub.emit_trials(assessment, count).await;
            let _ = updates.send(ProbeUpdate::Completed);
        });
        self.registry.track(assessment, task);
    }

    fn start_probe(&self, assessment: Assessment, updates: ProbeSender) {
        let hub = Arc::clone(&self.hub);
        let registry = self.registry.clone();
        registry.reset(assessment);
        let task = tokio::spawn(async move {
            let measurement = hub.probe(assessment).await;
            let passed = measurement.verdict().unwrap_or(false);
            debug!(assessment = %assessment, passed, "Physical probe finished");
            registry.record(assessment, measurement, passed);
            let _ = updates.send(ProbeUpdate::Completed);
        });
        self.registry.track(assessment, task);
    }
}

impl AssessmentDriver for PhysicalDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Physical
    }

    fn start(&self, assessment: Assessment, updates: ProbeSender) {
        match assessment.pattern() {
            ProbePattern::CountConfirmation => self.start_trials(assessment, updates),
            ProbePattern::SingleCallback | ProbePattern::FailureSensitive => {
                self.start_probe(assessment, updates)
            }
            pattern => debug!(
                assessment = %assessment,
                ?pattern,
                "Physical driver has no probe for this pattern"
            ),
        }
    }

    fn stop(&self, assessment: Assessment) {
        self.registry.abort(assessment);
        self.hub.release(assessment);
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
    use std::sync::Mutex;

    use super::*;
    use crate::driver::measurement::{Permission, SensorFailureReason};
    use crate::driver::traits::probe_channel;

    #[derive(Default)]
    struct FakeHub {
        emitted: Mutex<Vec<(Assessment, u32)>>,
        released: Mutex<Vec<Assessment>>,
    }

    #[async_trait]
    impl SensorHub for FakeHub {
        async fn probe(&self, assessment: Assessment) -> Measurement {
            match assessment {
                Assessment::Biometric => Measurement::SensorFailure(SensorFailureReason::LockedOut),
                Assessment::Microphone => Measurement::PermissionFailure(Permission::Microphone),
                _ => Measurement::Flag(true),
            }
        }

        async fn emit_trials(&self, assessment: Assessment, count: u32) {
            self.emitted.lock().unwrap().push((assessment, count));
        }

        fn release(&self, assessment: Assessment) {
            self.released.lock().unwrap().push(assessment);
        }
    }

    #[tokio::test]
    async fn probe_records_flag_outcome() {
        let driver = PhysicalDriver::new(Arc::new(FakeHub::default()), 5);
        let (tx, mut rx) = probe_channel();
        driver.start(Assessment::Torch, tx);

        assert_eq!(rx.recv().await, Some(ProbeUpdate::Completed));
        assert_eq!(driver.has_passed().get(&Assessment::Torch), Some(&true));
    }

    #[tokio::test]
    async fn failure_payload_is_kept_in_measurements() {
        let driver = PhysicalDriver::new(Arc::new(FakeHub::default()), 5);
        let (tx, mut rx) = probe_channel();
        driver.start(Assessment::Biometric, tx);

        assert_eq!(rx.recv().await, Some(ProbeUpdate::Completed));
        assert_eq!(driver.has_passed().get(&Assessment::Biometric), Some(&false));
        assert_eq!(
            driver.measurements().get(&Assessment::Biometric),
            Some(&Measurement::SensorFailure(SensorFailureReason::LockedOut))
        );
    }

    #[tokio::test]
    async fn trial_count_stays_within_bounds() {
        let hub = Arc::new(FakeHub::default());
        let driver = PhysicalDriver::new(hub.clone(), 3);
        for _ in 0..20 {
            let (tx, mut rx) = probe_channel();
            driver.start(Assessment::Vibration, tx);
            let Some(ProbeUpdate::Reported(Measurement::TrialCount(count))) = rx.recv().await
            else {
                panic!("expected a trial count first");
            };
            assert!((1..=3).contains(&count));
            assert_eq!(rx.recv().await, Some(ProbeUpdate::Completed));
        }
        assert_eq!(hub.emitted.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn stop_releases_hardware() {
        let hub = Arc::new(FakeHub::default());
        let driver = PhysicalDriver::new(hub.clone(), 5);
        driver.stop(Assessment::Torch);
        assert_eq!(*hub.released.lock().unwrap(), vec![Assessment::Torch]);
    }
}
