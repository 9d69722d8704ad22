//! Assessment drivers
//!
//! Four driver groups do the actual probing. Each is built over a small
//! collaborator trait ([`DeviceSource`], [`PowerSource`], [`SensorHub`],
//! [`LinkMonitor`]) so the platform side can be swapped out, and
//! [`MockDriver`] stands in for all of them in tests.

pub mod connectivity;
pub mod device;
pub mod measurement;
pub mod mock;
pub mod physical;
pub mod power;
pub mod registry;
pub mod traits;

use std::fmt;
use std::sync::Arc;

use crate::assessment::Assessment;

pub use connectivity::{ConnectivityDriver, LinkMonitor};
pub use device::{DeviceDriver, DeviceSource, DiskCapacity, JAILBREAK_MARKERS};
pub use measurement::{
    BatteryInfo, BatteryState, CpuInfo, Measurement, Permission, SensorFailureReason, StorageInfo,
    estimate_remaining_minutes, format_gb, format_percentage,
};
pub use mock::{MockCall, MockDriver};
pub use physical::{PhysicalDriver, SensorHub};
pub use power::{PowerDriver, PowerSource};
pub use registry::ProbeRegistry;
pub use traits::{
    AssessmentDriver, DriverKind, ProbeReceiver, ProbeSender, ProbeUpdate, probe_channel,
};

/// Exactly one driver per group, shared for the orchestrator's lifetime.
#[derive(Clone)]
pub struct DriverSet {
    device: Arc<dyn AssessmentDriver>,
    connectivity: Arc<dyn AssessmentDriver>,
    physical: Arc<dyn AssessmentDriver>,
    power: Arc<dyn AssessmentDriver>,
}

impl DriverSet {
    pub fn new(
        device: Arc<dyn AssessmentDriver>,
        connectivity: Arc<dyn AssessmentDriver>,
        physical: Arc<dyn AssessmentDriver>,
        power: Arc<dyn AssessmentDriver>,
    ) -> Self {
        Self {
            device,
            connectivity,
            physical,
            power,
        }
    }

    pub fn for_kind(&self, kind: DriverKind) -> &Arc<dyn AssessmentDriver> {
        match kind {
            DriverKind::Device => &self.device,
            DriverKind::Connectivity => &self.connectivity,
            DriverKind::Physical => &self.physical,
            DriverKind::Power => &self.power,
        }
    }

    /// The driver that probes `assessment`.
    pub fn for_assessment(&self, assessment: Assessment) -> &Arc<dyn AssessmentDriver> {
        self.for_kind(assessment.driver_kind())
    }
}

impl fmt::Debug for DriverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverSet")
            .field("device", &self.device.kind())
            .field("connectivity", &self.connectivity.kind())
            .field("physical", &self.physical.kind())
            .field("power", &self.power.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mocks() -> DriverSet {
        DriverSet::new(
            Arc::new(MockDriver::new(DriverKind::Device)),
            Arc::new(MockDriver::new(DriverKind::Connectivity)),
            Arc::new(MockDriver::new(DriverKind::Physical)),
            Arc::new(MockDriver::new(DriverKind::Power)),
        )
    }

    #[test]
    fn every_assessment_routes_to_its_driver_kind() {
        let drivers = mocks();
        for assessment in Assessment::ALL {
            assert_eq!(
                drivers.for_assessment(assessment).kind(),
                assessment.driver_kind()
            );
        }
    }
}
