//! Device status summary shown above the assessment list.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::assessment::{Assessment, DeviceShape};
use crate::driver::{
    AssessmentDriver, DriverKind, DriverSet, Measurement, format_gb, format_percentage,
    probe_channel,
};

/// Placeholder for values that could not be read.
pub const UNKNOWN_VALUE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "percentage", rename_all = "snake_case")]
pub enum StatusKind {
    Phone,
    Cpu,
    Memory,
    Storage,
    Battery(f32),
    Other,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Self::Phone => "Device",
            Self::Cpu => "CPU",
            Self::Memory => "Memory",
            Self::Storage => "Storage",
            Self::Battery(_) => "Battery",
            Self::Other => "Other",
        };
        f.write_str(title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub kind: StatusKind,
    pub value: String,
}

impl DeviceStatus {
    fn new(kind: StatusKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Collect the status summary, probing storage and battery for fresh values.
pub async fn load_status(drivers: &DriverSet, shape: &DeviceShape) -> Vec<DeviceStatus> {
    let mut statuses = vec![DeviceStatus::new(
        StatusKind::Phone,
        if shape.is_tablet { "Tablet" } else { "Phone" },
    )];

    let device = drivers.for_kind(DriverKind::Device);
    if let Some(Measurement::Cpu(cpu)) = device.measurements().get(&Assessment::Cpu) {
        statuses.push(DeviceStatus::new(
            StatusKind::Cpu,
            cpu.frequency.clone().unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        ));
    }

    if let Some(Measurement::Storage(storage)) =
        probe_once(device.as_ref(), Assessment::Storage).await
    {
        statuses.push(DeviceStatus::new(StatusKind::Memory, gb_or_unknown(storage.total_ram)));
        statuses.push(DeviceStatus::new(
            StatusKind::Storage,
            gb_or_unknown(storage.total_space),
        ));
    }

    let power = drivers.for_kind(DriverKind::Power);
    if let Some(Measurement::Battery(battery)) =
        probe_once(power.as_ref(), Assessment::BatteryStatus).await
    {
        let level = battery.level.unwrap_or(0.0);
        statuses.push(DeviceStatus::new(
            StatusKind::Battery(level),
            battery
                .level
                .map(format_percentage)
                .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        ));
    }

    statuses.push(DeviceStatus::new(StatusKind::Other, "Others"));
    statuses
}

/// Run a probe to its first update and return the measured payload.
async fn probe_once(driver: &dyn AssessmentDriver, assessment: Assessment) -> Option<Measurement> {
    let (tx, mut rx) = probe_channel();
    driver.start(assessment, tx);
    let update = rx.recv().await;
    driver.stop(assessment);
    debug!(assessment = %assessment, reported = update.is_some(), "Status probe finished");
    update?;
    driver.measurements().get(&assessment).cloned()
}

fn gb_or_unknown(bytes: u64) -> String {
    if bytes == 0 {
        UNKNOWN_VALUE.to_string()
    } else {
        format_gb(bytes)
    }
}
