//! Typed measurement payloads reported by drivers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assessment::Assessment;
use crate::error::AssessmentError;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Processor description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub model: Option<String>,
    pub core_count: usize,
    pub architecture: String,
    pub frequency: Option<String>,
}

impl CpuInfo {
    /// A processor counts as identified when it reports a non-empty model.
    pub fn is_identified(&self) -> bool {
        self.model.as_deref().is_some_and(|model| !model.trim().is_empty())
    }
}

/// Storage capacity and measured throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub read_speed_mbps: f64,
    pub write_speed_mbps: f64,
    pub total_space: u64,
    pub free_space: u64,
    pub total_ram: u64,
}

impl StorageInfo {
    pub fn used_space(&self) -> u64 {
        self.total_space.saturating_sub(self.free_space)
    }

    /// Capacity and memory were both readable.
    pub fn is_complete(&self) -> bool {
        self.total_space > 0 && self.total_ram > 0
    }
}

/// Charging state as reported by the power source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryState {
    #[default]
    Unknown,
    Unplugged,
    Charging,
    Full,
}

impl BatteryState {
    pub fn is_powered(self) -> bool {
        matches!(self, Self::Charging | Self::Full)
    }
}

/// Battery snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// Charge level in `0.0..=1.0`, when readable.
    pub level: Option<f32>,
    pub state: BatteryState,
    /// Minutes until full (charging) or empty (discharging).
    pub remaining_minutes: Option<f32>,
}

impl BatteryInfo {
    pub fn is_readable(&self) -> bool {
        self.level.is_some_and(|level| (0.0..=1.0).contains(&level))
    }
}

/// A permission the user can refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Microphone,
    Camera,
    Motion,
    Location,
    Bluetooth,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Microphone => "microphone",
            Self::Camera => "camera",
            Self::Motion => "motion",
            Self::Location => "location",
            Self::Bluetooth => "bluetooth",
        };
        f.write_str(name)
    }
}

/// Why a sensor could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFailureReason {
    Unavailable,
    NotEnrolled,
    LockedOut,
    UserCancelled,
    Other(String),
}

impl fmt::Display for SensorFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("hardware unavailable"),
            Self::NotEnrolled => f.write_str("not enrolled"),
            Self::LockedOut => f.write_str("locked out"),
            Self::UserCancelled => f.write_str("cancelled by user"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Last-measured payload for an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Measurement {
    Cpu(CpuInfo),
    Storage(StorageInfo),
    Battery(BatteryInfo),
    Flag(bool),
    /// Number of trials a count-confirmation probe played.
    TrialCount(u32),
    PermissionFailure(Permission),
    SensorFailure(SensorFailureReason),
}

impl Measurement {
    /// The typed error carried by failure payloads.
    pub fn failure(&self, assessment: Assessment) -> Option<AssessmentError> {
        match self {
            Self::PermissionFailure(permission) => Some(AssessmentError::PermissionDenied {
                assessment,
                permission: *permission,
            }),
            Self::SensorFailure(reason) => Some(AssessmentError::SensorUnavailable {
                assessment,
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_trial_count(&self) -> Option<u32> {
        match self {
            Self::TrialCount(count) => Some(*count),
            _ => None,
        }
    }

    /// Pass rule for payload-judged assessments. `None` when the payload
    /// does not decide the outcome on its own.
    pub fn verdict(&self) -> Option<bool> {
        match self {
            Self::Cpu(cpu) => Some(cpu.is_identified()),
            Self::Storage(storage) => Some(storage.is_complete()),
            Self::Battery(battery) => Some(battery.is_readable()),
            Self::Flag(value) => Some(*value),
            Self::PermissionFailure(_) | Self::SensorFailure(_) => Some(false),
            Self::TrialCount(_) => None,
        }
    }
}

/// Format a byte count as gigabytes with one decimal.
pub fn format_gb(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / BYTES_PER_GB)
}

/// Format a `0.0..=1.0` level as a whole percentage, clamping out-of-range input.
pub fn format_percentage(level: f32) -> String {
    let clamped = level.clamp(0.0, 1.0);
    format!("{}%", (clamped * 100.0).round() as u32)
}

/// Estimate minutes until full or empty from two level samples.
///
/// Returns `None` when the level did not move or the interval is zero.
pub fn estimate_remaining_minutes(before: f32, after: f32, interval: Duration) -> Option<f32> {
    let minutes = interval.as_secs_f32() / 60.0;
    let delta = after - before;
    if minutes <= 0.0 || delta.abs() < f32::EPSILON {
        return None;
    }
    let rate = delta / minutes;
    let remaining = if rate > 0.0 {
        (1.0 - after) / rate
    } else {
        after / -rate
    };
    Some(remaining.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_with_blank_model_is_not_identified() {
        let mut cpu = CpuInfo {
            model: Some("  ".to_string()),
            core_count: 6,
            architecture: "arm64".to_string(),
            frequency: None,
        };
        assert!(!cpu.is_identified());
        cpu.model = Some("A17 Pro".to_string());
        assert!(cpu.is_identified());
        cpu.model = None;
        assert!(!cpu.is_identified());
    }

    #[test]
    fn storage_requires_capacity_and_memory() {
        let storage = StorageInfo {
            read_speed_mbps: 900.0,
            write_speed_mbps: 400.0,
            total_space: 128 * 1024 * 1024 * 1024,
            free_space: 28 * 1024 * 1024 * 1024,
            total_ram: 0,
        };
        assert!(!storage.is_complete());
        assert_eq!(storage.used_space(), 100 * 1024 * 1024 * 1024);
    }

    #[test]
    fn battery_level_must_be_in_range() {
        let mut battery = BatteryInfo {
            level: Some(0.42),
            state: BatteryState::Unplugged,
            remaining_minutes: None,
        };
        assert!(battery.is_readable());
        battery.level = Some(-1.0);
        assert!(!battery.is_readable());
        battery.level = None;
        assert!(!battery.is_readable());
    }

    #[test]
    fn failure_payloads_become_errors() {
        let denied = Measurement::PermissionFailure(Permission::Microphone);
        assert_eq!(
            denied.failure(Assessment::Microphone),
            Some(AssessmentError::PermissionDenied {
                assessment: Assessment::Microphone,
                permission: Permission::Microphone,
            })
        );
        assert!(Measurement::Flag(true).failure(Assessment::Torch).is_none());
    }

    #[test]
    fn trial_count_has_no_verdict() {
        assert_eq!(Measurement::TrialCount(3).verdict(), None);
        assert_eq!(Measurement::TrialCount(3).as_trial_count(), Some(3));
        assert_eq!(Measurement::Flag(false).verdict(), Some(false));
    }

    #[test]
    fn formats_gigabytes_and_percentages() {
        assert_eq!(format_gb(64 * 1024 * 1024 * 1024), "64.0 GB");
        assert_eq!(format_percentage(0.873), "87%");
        assert_eq!(format_percentage(1.7), "100%");
    }

    #[test]
    fn remaining_minutes_for_charging_and_discharging() {
        let interval = Duration::from_secs(600);
        let charging = estimate_remaining_minutes(0.50, 0.60, interval).unwrap();
        assert!((charging - 40.0).abs() < 0.01);

        let discharging = estimate_remaining_minutes(0.50, 0.45, interval).unwrap();
        assert!((discharging - 90.0).abs() < 0.01);

        assert_eq!(estimate_remaining_minutes(0.5, 0.5, interval), None);
        assert_eq!(estimate_remaining_minutes(0.5, 0.6, Duration::ZERO), None);
    }
}
