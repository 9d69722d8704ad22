//! Assessment catalog: enablement rules and run policy.
//!
//! The catalog owns the declared ordering of assessments and filters it
//! against remote feature flags and the device's shape. It also carries the
//! two fixed policy subsets the orchestrator consults before probing:
//! assessments that skip the pre-run pause and assessments that must wait
//! for an explicit go-ahead.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Assessment;
use crate::config::CatalogConfig;

/// Declared ordering used when no override is configured.
pub const DEFAULT_ORDER: [Assessment; 27] = [
    Assessment::Cpu,
    Assessment::Storage,
    Assessment::BatteryStatus,
    Assessment::Jailbreak,
    Assessment::SilentSwitch,
    Assessment::VolumeUp,
    Assessment::VolumeDown,
    Assessment::PowerButton,
    Assessment::Vibration,
    Assessment::Camera,
    Assessment::Torch,
    Assessment::Touchscreen,
    Assessment::Multitouch,
    Assessment::Cellular,
    Assessment::Wifi,
    Assessment::Biometric,
    Assessment::Accelerometer,
    Assessment::Bluetooth,
    Assessment::Gps,
    Assessment::Compass,
    Assessment::MainSpeaker,
    Assessment::EarSpeaker,
    Assessment::Proximity,
    Assessment::Deadpixel,
    Assessment::Rotation,
    Assessment::Microphone,
    Assessment::Connector,
];

/// Assessments that start without the pre-run pause.
pub const UNDELAYED: [Assessment; 6] = [
    Assessment::VolumeUp,
    Assessment::VolumeDown,
    Assessment::SilentSwitch,
    Assessment::Connector,
    Assessment::Touchscreen,
    Assessment::Compass,
];

/// Disruptive assessments that wait for the user before probing.
pub const NEEDS_CONFIRMATION: [Assessment; 7] = [
    Assessment::Camera,
    Assessment::Touchscreen,
    Assessment::Multitouch,
    Assessment::Cellular,
    Assessment::Wifi,
    Assessment::Compass,
    Assessment::Deadpixel,
];

const TABLET_EXCLUDED: [Assessment; 3] = [
    Assessment::Vibration,
    Assessment::Cellular,
    Assessment::WirelessCharging,
];

/// Remote feature flag lookups.
pub trait FeatureFlags: Send + Sync {
    fn is_assessment_enabled(&self, assessment: Assessment) -> bool;

    fn is_maintenance(&self) -> bool;

    fn is_force_update(&self) -> bool;
}

/// Feature flags resolved once from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticFlags {
    disabled: HashSet<Assessment>,
    maintenance: bool,
    force_update: bool,
}

impl StaticFlags {
    /// Flags with every assessment enabled and no gating.
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            disabled: config.disabled.iter().copied().collect(),
            maintenance: config.maintenance,
            force_update: config.force_update,
        }
    }

    #[must_use]
    pub fn with_disabled(mut self, assessments: impl IntoIterator<Item = Assessment>) -> Self {
        self.disabled.extend(assessments);
        self
    }

    #[must_use]
    pub fn with_maintenance(mut self, maintenance: bool) -> Self {
        self.maintenance = maintenance;
        self
    }

    #[must_use]
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }
}

impl FeatureFlags for StaticFlags {
    fn is_assessment_enabled(&self, assessment: Assessment) -> bool {
        !self.disabled.contains(&assessment)
    }

    fn is_maintenance(&self) -> bool {
        self.maintenance
    }

    fn is_force_update(&self) -> bool {
        self.force_update
    }
}

/// Physical characteristics that rule assessments out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceShape {
    /// Tablet-class device (no vibration motor, cellular or wireless charging).
    pub is_tablet: bool,
    /// Device has a physical mute switch rather than an action button.
    pub has_mute_switch: bool,
}

impl Default for DeviceShape {
    fn default() -> Self {
        Self {
            is_tablet: false,
            has_mute_switch: true,
        }
    }
}

impl DeviceShape {
    pub fn phone() -> Self {
        Self::default()
    }

    pub fn tablet() -> Self {
        Self {
            is_tablet: true,
            has_mute_switch: false,
        }
    }

    /// Whether this shape rules the assessment out.
    pub fn excludes(&self, assessment: Assessment) -> bool {
        (self.is_tablet && TABLET_EXCLUDED.contains(&assessment))
            || (!self.has_mute_switch && assessment == Assessment::SilentSwitch)
    }
}

/// Whether the app may run assessments at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppGate {
    Ready,
    Maintenance,
    ForceUpdate,
}

/// Static registry of assessments and their run policy.
#[derive(Clone)]
pub struct Catalog {
    order: Vec<Assessment>,
    flags: Arc<dyn FeatureFlags>,
    undelayed: Vec<Assessment>,
    needs_confirmation: Vec<Assessment>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("order", &self.order)
            .field("undelayed", &self.undelayed)
            .field("needs_confirmation", &self.needs_confirmation)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Catalog with the default ordering and policy.
    pub fn new(flags: Arc<dyn FeatureFlags>) -> Self {
        Self {
            order: DEFAULT_ORDER.to_vec(),
            flags,
            undelayed: UNDELAYED.to_vec(),
            needs_confirmation: NEEDS_CONFIRMATION.to_vec(),
        }
    }

    /// Catalog configured from the `[catalog]` section.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let catalog = Self::new(Arc::new(StaticFlags::from_config(config)));
        match &config.order {
            Some(order) if !order.is_empty() => catalog.with_order(order.clone()),
            _ => catalog,
        }
    }

    /// Replace the declared ordering. Duplicates keep their first position.
    #[must_use]
    pub fn with_order(mut self, order: Vec<Assessment>) -> Self {
        let mut seen = HashSet::new();
        self.order = order.into_iter().filter(|a| seen.insert(*a)).collect();
        self
    }

    /// Replace the confirmation-gated subset.
    #[must_use]
    pub fn with_needs_confirmation(mut self, assessments: Vec<Assessment>) -> Self {
        self.needs_confirmation = assessments;
        self
    }

    /// Replace the undelayed subset.
    #[must_use]
    pub fn with_undelayed(mut self, assessments: Vec<Assessment>) -> Self {
        self.undelayed = assessments;
        self
    }

    /// The full declared ordering, before any filtering.
    pub fn declared(&self) -> &[Assessment] {
        &self.order
    }

    /// Declared assessments that are flagged on and fit the device shape.
    ///
    /// Never empty: when filtering removes everything the declared ordering
    /// is returned unfiltered.
    pub fn enabled_assessments(&self, shape: &DeviceShape) -> Vec<Assessment> {
        let enabled: Vec<Assessment> = self
            .order
            .iter()
            .copied()
            .filter(|a| self.flags.is_assessment_enabled(*a))
            .filter(|a| !shape.excludes(*a))
            .collect();

        if enabled.is_empty() {
            warn!("Every assessment filtered out, falling back to the full catalog");
            self.order.clone()
        } else {
            debug!(
                enabled = enabled.len(),
                declared = self.order.len(),
                "Resolved enabled assessments"
            );
            enabled
        }
    }

    pub fn undelayed(&self) -> &[Assessment] {
        &self.undelayed
    }

    pub fn needs_confirmation_set(&self) -> &[Assessment] {
        &self.needs_confirmation
    }

    pub fn is_undelayed(&self, assessment: Assessment) -> bool {
        self.undelayed.contains(&assessment)
    }

    pub fn needs_confirmation(&self, assessment: Assessment) -> bool {
        self.needs_confirmation.contains(&assessment)
    }

    /// Maintenance and force-update gating. Force update wins.
    pub fn app_gate(&self) -> AppGate {
        if self.flags.is_force_update() {
            AppGate::ForceUpdate
        } else if self.flags.is_maintenance() {
            AppGate::Maintenance
        } else {
            AppGate::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(flags: StaticFlags) -> Catalog {
        Catalog::new(Arc::new(flags))
    }

    // ==================== Enablement Tests ====================

    #[test]
    fn all_flags_on_phone_returns_default_order() {
        let catalog = catalog_with(StaticFlags::all_enabled());
        assert_eq!(
            catalog.enabled_assessments(&DeviceShape::phone()),
            DEFAULT_ORDER.to_vec()
        );
    }

    #[test]
    fn disabled_flags_are_filtered_out() {
        let catalog =
            catalog_with(StaticFlags::all_enabled().with_disabled([Assessment::Camera, Assessment::Gps]));
        let enabled = catalog.enabled_assessments(&DeviceShape::phone());
        assert!(!enabled.contains(&Assessment::Camera));
        assert!(!enabled.contains(&Assessment::Gps));
        assert_eq!(enabled.len(), DEFAULT_ORDER.len() - 2);
    }

    #[test]
    fn tablet_excludes_vibration_cellular_and_wireless_charging() {
        let catalog = catalog_with(StaticFlags::all_enabled()).with_order(Assessment::ALL.to_vec());
        let enabled = catalog.enabled_assessments(&DeviceShape::tablet());
        for excluded in TABLET_EXCLUDED {
            assert!(!enabled.contains(&excluded), "{excluded}");
        }
        assert!(!enabled.contains(&Assessment::SilentSwitch));
    }

    #[test]
    fn missing_mute_switch_excludes_silent_switch() {
        let shape = DeviceShape {
            is_tablet: false,
            has_mute_switch: false,
        };
        let catalog = catalog_with(StaticFlags::all_enabled());
        let enabled = catalog.enabled_assessments(&shape);
        assert!(!enabled.contains(&Assessment::SilentSwitch));
        assert!(enabled.contains(&Assessment::Vibration));
    }

    #[test]
    fn everything_disabled_falls_back_to_full_catalog() {
        let catalog = catalog_with(StaticFlags::all_enabled().with_disabled(Assessment::ALL));
        let enabled = catalog.enabled_assessments(&DeviceShape::phone());
        assert_eq!(enabled, DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn order_override_is_respected_and_deduplicated() {
        let catalog = catalog_with(StaticFlags::all_enabled()).with_order(vec![
            Assessment::Wifi,
            Assessment::Cpu,
            Assessment::Wifi,
        ]);
        assert_eq!(catalog.declared(), &[Assessment::Wifi, Assessment::Cpu]);
    }

    // ==================== Policy Tests ====================

    #[test]
    fn default_policy_subsets() {
        let catalog = catalog_with(StaticFlags::all_enabled());
        assert!(catalog.is_undelayed(Assessment::Compass));
        assert!(!catalog.is_undelayed(Assessment::Cpu));
        assert!(catalog.needs_confirmation(Assessment::Camera));
        assert!(!catalog.needs_confirmation(Assessment::Torch));
        assert_eq!(catalog.undelayed().len(), 6);
        assert_eq!(catalog.needs_confirmation_set().len(), 7);
    }

    #[test]
    fn app_gate_prefers_force_update() {
        let catalog = catalog_with(
            StaticFlags::all_enabled()
                .with_maintenance(true)
                .with_force_update(true),
        );
        assert_eq!(catalog.app_gate(), AppGate::ForceUpdate);

        let catalog = catalog_with(StaticFlags::all_enabled().with_maintenance(true));
        assert_eq!(catalog.app_gate(), AppGate::Maintenance);

        let catalog = catalog_with(StaticFlags::all_enabled());
        assert_eq!(catalog.app_gate(), AppGate::Ready);
    }

    #[test]
    fn from_config_applies_flags_and_order() {
        let config = CatalogConfig {
            disabled: vec![Assessment::Cpu],
            maintenance: true,
            force_update: false,
            order: Some(vec![Assessment::Cpu, Assessment::Torch]),
        };
        let catalog = Catalog::from_config(&config);
        assert_eq!(
            catalog.enabled_assessments(&DeviceShape::phone()),
            vec![Assessment::Torch]
        );
        assert_eq!(catalog.app_gate(), AppGate::Maintenance);
    }
}
