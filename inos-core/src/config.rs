//! Engine configuration.
//!
//! Every section defaults independently, so a config file only needs the
//! keys it wants to change:
//!
//! ```toml
//! [timing]
//! pre_run_pause_ms = 1500
//!
//! [catalog]
//! disabled = ["barometer", "homeButton"]
//!
//! [device]
//! is_tablet = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assessment::{Assessment, DeviceShape};
use crate::error::ConfigError;

/// Main configuration for the assessment engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InosConfig {
    /// Pauses and intervals used while running assessments.
    pub timing: TimingConfig,
    /// Catalog filtering and app gating.
    pub catalog: CatalogConfig,
    /// Device shape used to rule assessments out.
    pub device: DeviceShape,
    /// Result persistence.
    pub store: StoreConfig,
    /// Event bus sizing.
    pub events: EventsConfig,
}

impl InosConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Timing policy for runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause before probing assessments outside the undelayed set.
    pub pre_run_pause_ms: u64,
    /// Scroll position increment after each serial step.
    pub scroll_step: f64,
    /// Delay before the battery probe re-measures to estimate remaining time.
    pub battery_remeasure_secs: u64,
    /// Upper bound of the random trial count for count-confirmation probes.
    pub trial_count_max: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pre_run_pause_ms: 2000,
            scroll_step: 0.5,
            battery_remeasure_secs: 10,
            trial_count_max: 5,
        }
    }
}

impl TimingConfig {
    /// Timing with no pauses, for tests and scripted runs.
    pub fn immediate() -> Self {
        Self {
            pre_run_pause_ms: 0,
            battery_remeasure_secs: 0,
            ..Self::default()
        }
    }

    pub fn pre_run_pause(&self) -> Duration {
        Duration::from_millis(self.pre_run_pause_ms)
    }

    pub fn battery_remeasure(&self) -> Duration {
        Duration::from_secs(self.battery_remeasure_secs)
    }
}

/// Catalog filtering, standing in for remote feature flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Assessments switched off.
    pub disabled: Vec<Assessment>,
    /// App is in maintenance mode.
    pub maintenance: bool,
    /// App requires an update before use.
    pub force_update: bool,
    /// Replacement for the declared ordering.
    pub order: Option<Vec<Assessment>>,
}

/// Result persistence configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Results file. Defaults to the XDG data directory.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(inos_paths::results_path)
    }
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}
