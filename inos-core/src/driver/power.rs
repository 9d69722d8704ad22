//! Power driver: battery status, cable connector and wireless charging.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::measurement::{BatteryInfo, BatteryState, Measurement, estimate_remaining_minutes};
use super::registry::ProbeRegistry;
use super::traits::{AssessmentDriver, DriverKind, ProbeSender, ProbeUpdate};
use crate::assessment::Assessment;

/// Battery facts and charging notifications.
pub trait PowerSource: Send + Sync {
    /// Charge level in `0.0..=1.0`, `None` when monitoring is unavailable.
    fn battery_level(&self) -> Option<f32>;

    fn battery_state(&self) -> BatteryState;

    /// Live charging state changes.
    fn state_changes(&self) -> broadcast::Receiver<BatteryState>;

    /// Whether a wired accessory (charging cable) is attached.
    fn accessory_connected(&self) -> bool;
}

pub struct PowerDriver {
    source: Arc<dyn PowerSource>,
    registry: ProbeRegistry,
    remeasure_after: Duration,
    // Outlives `stop`; only the next battery probe replaces it.
    remeasure: Mutex<Option<JoinHandle<()>>>,
}

impl PowerDriver {
    /// `remeasure_after` is the wait before the battery probe samples the
    /// level again to estimate remaining time. Zero disables the estimate.
    pub fn new(source: Arc<dyn PowerSource>, remeasure_after: Duration) -> Self {
        Self {
            source,
            registry: ProbeRegistry::new(),
            remeasure_after,
            remeasure: Mutex::new(None),
        }
    }

    fn start_battery(&self, updates: ProbeSender) {
        let info = battery_snapshot(self.source.as_ref(), None);
        let readable = info.is_readable();
        let first_level = info.level;
        self.registry
            .record(Assessment::BatteryStatus, Measurement::Battery(info), readable);
        let _ = updates.send(ProbeUpdate::Completed);

        let Some(before) = first_level else {
            return;
        };
        if self.remeasure_after.is_zero() {
            return;
        }

        let source = Arc::clone(&self.source);
        let registry = self.registry.clone();
        let interval = self.remeasure_after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let remaining = source
                .battery_level()
                .and_then(|after| estimate_remaining_minutes(before, after, interval));
            let info = battery_snapshot(source.as_ref(), remaining);
            debug!(remaining_minutes = ?info.remaining_minutes, "Battery re-measured");
            registry.record_measurement(Assessment::BatteryStatus, Measurement::Battery(info));
        });
        let mut remeasure = self.remeasure.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = remeasure.replace(task) {
            previous.abort();
        }
    }

    fn start_charging_watch(&self, assessment: Assessment, updates: ProbeSender) {
        let source = Arc::clone(&self.source);
        let registry = self.registry.clone();
        let mut changes = self.source.state_changes();

        let current = self.source.battery_state();
        let passing = charging_verdict(assessment, current, self.source.accessory_connected());
        registry.record_measurement(assessment, Measurement::Flag(passing));
        if passing {
            registry.record_passed(assessment, true);
            let _ = updates.send(ProbeUpdate::Completed);
        }

        let task = tokio::spawn(async move {
            loop {
                let state = match changes.recv().await {
                    Ok(state) => state,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        trace!(skipped, "Battery state receiver lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let passed = charging_verdict(assessment, state, source.accessory_connected());
                registry.record(assessment, Measurement::Flag(passed), passed);
                if updates.send(ProbeUpdate::Completed).is_err() {
                    break;
                }
            }
        });
        self.registry.track(assessment, task);
    }
}

impl Drop for PowerDriver {
    fn drop(&mut self) {
        let remeasure = self.remeasure.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = remeasure.take() {
            task.abort();
        }
    }
}

impl AssessmentDriver for PowerDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Power
    }

    fn start(&self, assessment: Assessment, updates: ProbeSender) {
        match assessment {
            Assessment::BatteryStatus => self.start_battery(updates),
            Assessment::Connector | Assessment::WirelessCharging => {
                self.start_charging_watch(assessment, updates)
            }
            other => debug!(assessment = %other, "Power driver does not probe this assessment"),
        }
    }

    fn stop(&self, assessment: Assessment) {
        if self.registry.abort(assessment) {
            debug!(assessment = %assessment, "Stopped power probe");
        }
    }

    fn has_passed(&self) -> HashMap<Assessment, bool> {
        self.registry.passed()
    }

    fn measurements(&self) -> HashMap<Assessment, Measurement> {
        self.registry.measurements()
    }
}

fn battery_snapshot(source: &dyn PowerSource, remaining_minutes: Option<f32>) -> BatteryInfo {
    BatteryInfo {
        level: source.battery_level(),
        state: source.battery_state(),
        remaining_minutes,
    }
}

/// A cable charge needs an accessory attached; a wireless charge must not
/// have one.
fn charging_verdict(assessment: Assessment, state: BatteryState, accessory: bool) -> bool {
    match assessment {
        Assessment::Connector => state.is_powered() && accessory,
        Assessment::WirelessCharging => state.is_powered() && !accessory,
        _ => false,
    }
}
