//! Assessment identifiers and their static metadata.
//!
//! An [`Assessment`] is one discrete hardware or software self-test with a
//! pass/fail outcome. The set is closed; everything the engine knows about
//! an assessment (display text, owning driver, probe pattern) is derived
//! from the identifier alone.

pub mod catalog;
pub mod passed;
pub mod pattern;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::driver::DriverKind;

pub use catalog::{AppGate, Catalog, DeviceShape, FeatureFlags, StaticFlags};
pub use passed::PassedAssessments;
pub use pattern::{ProbePattern, Surface, SystemTrigger};

/// A discrete hardware/software self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Assessment {
    Cpu,
    Storage,
    BatteryStatus,
    Jailbreak,
    SilentSwitch,
    VolumeUp,
    VolumeDown,
    PowerButton,
    Vibration,
    Camera,
    Torch,
    Touchscreen,
    Multitouch,
    Cellular,
    Wifi,
    Biometric,
    Accelerometer,
    Barometer,
    Bluetooth,
    Gps,
    Compass,
    HomeButton,
    MainSpeaker,
    EarSpeaker,
    Proximity,
    Deadpixel,
    Rotation,
    Microphone,
    Connector,
    WirelessCharging,
}

/// Error returned when parsing an unknown assessment key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown assessment key: {0}")]
pub struct UnknownAssessment(pub String);

impl Assessment {
    /// Every declared identifier, in declaration order.
    pub const ALL: [Assessment; 30] = [
        Self::Cpu,
        Self::Storage,
        Self::BatteryStatus,
        Self::Jailbreak,
        Self::SilentSwitch,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::PowerButton,
        Self::Vibration,
        Self::Camera,
        Self::Torch,
        Self::Touchscreen,
        Self::Multitouch,
        Self::Cellular,
        Self::Wifi,
        Self::Biometric,
        Self::Accelerometer,
        Self::Barometer,
        Self::Bluetooth,
        Self::Gps,
        Self::Compass,
        Self::HomeButton,
        Self::MainSpeaker,
        Self::EarSpeaker,
        Self::Proximity,
        Self::Deadpixel,
        Self::Rotation,
        Self::Microphone,
        Self::Connector,
        Self::WirelessCharging,
    ];

    /// Stable storage key, identical to the serde representation.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Storage => "storage",
            Self::BatteryStatus => "batteryStatus",
            Self::Jailbreak => "jailbreak",
            Self::SilentSwitch => "silentSwitch",
            Self::VolumeUp => "volumeUp",
            Self::VolumeDown => "volumeDown",
            Self::PowerButton => "powerButton",
            Self::Vibration => "vibration",
            Self::Camera => "camera",
            Self::Torch => "torch",
            Self::Touchscreen => "touchscreen",
            Self::Multitouch => "multitouch",
            Self::Cellular => "cellular",
            Self::Wifi => "wifi",
            Self::Biometric => "biometric",
            Self::Accelerometer => "accelerometer",
            Self::Barometer => "barometer",
            Self::Bluetooth => "bluetooth",
            Self::Gps => "gps",
            Self::Compass => "compass",
            Self::HomeButton => "homeButton",
            Self::MainSpeaker => "mainSpeaker",
            Self::EarSpeaker => "earSpeaker",
            Self::Proximity => "proximity",
            Self::Deadpixel => "deadpixel",
            Self::Rotation => "rotation",
            Self::Microphone => "microphone",
            Self::Connector => "connector",
            Self::WirelessCharging => "wirelessCharging",
        }
    }

    /// Human readable name.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Storage => "Storage",
            Self::BatteryStatus => "Battery Status",
            Self::Jailbreak => "Jailbreak",
            Self::SilentSwitch => "Silent Switch",
            Self::VolumeUp => "Volume Up",
            Self::VolumeDown => "Volume Down",
            Self::PowerButton => "Power Button",
            Self::Vibration => "Vibration",
            Self::Camera => "Camera",
            Self::Torch => "Flashlight",
            Self::Touchscreen => "Touchscreen",
            Self::Multitouch => "Multitouch",
            Self::Cellular => "Cellular",
            Self::Wifi => "Wi-Fi",
            Self::Biometric => "Biometric",
            Self::Accelerometer => "Accelerometer",
            Self::Barometer => "Barometer",
            Self::Bluetooth => "Bluetooth",
            Self::Gps => "GPS",
            Self::Compass => "Compass",
            Self::HomeButton => "Home Button",
            Self::MainSpeaker => "Main Speaker",
            Self::EarSpeaker => "Ear Speaker",
            Self::Proximity => "Proximity",
            Self::Deadpixel => "Dead Pixel",
            Self::Rotation => "Rotation",
            Self::Microphone => "Microphone",
            Self::Connector => "Connector",
            Self::WirelessCharging => "Wireless Charging",
        }
    }

    /// Text shown while the assessment is preparing. Empty when the
    /// assessment finishes without user involvement.
    pub const fn testing_message(self) -> &'static str {
        match self {
            Self::Cpu | Self::Jailbreak => "",
            Self::Storage => "Measuring storage speed...",
            Self::BatteryStatus => "Reading battery status...",
            Self::SilentSwitch => "Toggle the silent switch",
            Self::VolumeUp => "Press the volume up button",
            Self::VolumeDown => "Press the volume down button",
            Self::PowerButton => "Press the power button",
            Self::Vibration => "Count the vibrations",
            Self::Camera => "Preparing the camera",
            Self::Torch => "Turning on the flashlight...",
            Self::Touchscreen => "Touch every tile on the screen",
            Self::Multitouch => "Place several fingers on the screen",
            Self::Cellular => "Checking the cellular connection...",
            Self::Wifi => "Checking the Wi-Fi connection...",
            Self::Biometric => "Authenticate with Face ID or Touch ID",
            Self::Accelerometer => "Move your device around",
            Self::Barometer => "Reading air pressure...",
            Self::Bluetooth => "Checking Bluetooth...",
            Self::Gps => "Locating your device...",
            Self::Compass => "Rotate your device a full turn",
            Self::HomeButton => "Press the home button",
            Self::MainSpeaker => "Count the sounds from the speaker",
            Self::EarSpeaker => "Hold the device to your ear and count the sounds",
            Self::Proximity => "Cover the top of the screen",
            Self::Deadpixel => "Look closely for dead pixels",
            Self::Rotation => "Rotate your device",
            Self::Microphone => "Say something into the microphone",
            Self::Connector => "Plug in the charging cable",
            Self::WirelessCharging => "Place the device on a wireless charger",
        }
    }

    /// Text shown once a result has been recorded.
    pub fn finished_message(self) -> String {
        format!("{} test finished", self.title())
    }

    pub fn has_testing_message(self) -> bool {
        !self.testing_message().is_empty()
    }

    /// The driver variant that probes this assessment.
    pub const fn driver_kind(self) -> DriverKind {
        match self {
            Self::Cpu | Self::Storage | Self::Jailbreak => DriverKind::Device,
            Self::BatteryStatus | Self::Connector | Self::WirelessCharging => DriverKind::Power,
            Self::Cellular | Self::Wifi | Self::Bluetooth | Self::Gps => DriverKind::Connectivity,
            _ => DriverKind::Physical,
        }
    }

    /// How the outcome stream adapter turns this assessment's probe into a
    /// single pass/fail outcome.
    pub const fn pattern(self) -> ProbePattern {
        match self {
            Self::Cpu | Self::Jailbreak => ProbePattern::Immediate,
            Self::Storage
            | Self::BatteryStatus
            | Self::Connector
            | Self::WirelessCharging
            | Self::Torch
            | Self::SilentSwitch
            | Self::Cellular
            | Self::Wifi
            | Self::Bluetooth
            | Self::Gps
            | Self::Barometer => ProbePattern::SingleCallback,
            Self::PowerButton => ProbePattern::EventTrigger(SystemTrigger::DidEnterBackground),
            Self::HomeButton => ProbePattern::EventTrigger(SystemTrigger::WillEnterForeground),
            Self::Rotation => ProbePattern::EventTrigger(SystemTrigger::OrientationChanged),
            Self::Camera => ProbePattern::Surface(Surface::Camera),
            Self::Touchscreen => ProbePattern::Surface(Surface::Touchscreen),
            Self::Deadpixel => ProbePattern::Surface(Surface::Deadpixel),
            Self::Multitouch => ProbePattern::Surface(Surface::Multitouch),
            Self::Compass => ProbePattern::Surface(Surface::Compass),
            Self::MainSpeaker | Self::EarSpeaker | Self::Vibration => {
                ProbePattern::CountConfirmation
            }
            Self::Biometric
            | Self::Microphone
            | Self::Proximity
            | Self::Accelerometer
            | Self::VolumeUp
            | Self::VolumeDown => ProbePattern::FailureSensitive,
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Assessment {
    type Err = UnknownAssessment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|assessment| assessment.key() == s)
            .ok_or_else(|| UnknownAssessment(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back_to_the_same_assessment() {
        for assessment in Assessment::ALL {
            assert_eq!(assessment.key().parse::<Assessment>(), Ok(assessment));
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "nfc".parse::<Assessment>().unwrap_err();
        assert_eq!(err, UnknownAssessment("nfc".to_string()));
    }

    #[test]
    fn serde_uses_storage_keys() {
        let json = serde_json::to_string(&Assessment::WirelessCharging).unwrap();
        assert_eq!(json, "\"wirelessCharging\"");
        for assessment in Assessment::ALL {
            let json = serde_json::to_string(&assessment).unwrap();
            assert_eq!(json, format!("\"{}\"", assessment.key()));
        }
    }

    #[test]
    fn immediate_assessments_have_no_testing_message() {
        for assessment in Assessment::ALL {
            if assessment.pattern() == ProbePattern::Immediate {
                assert!(!assessment.has_testing_message(), "{assessment}");
            }
        }
        assert!(Assessment::Camera.has_testing_message());
    }

    #[test]
    fn finished_message_uses_title() {
        assert_eq!(Assessment::Torch.finished_message(), "Flashlight test finished");
    }

    #[test]
    fn drivers_cover_expected_groups() {
        assert_eq!(Assessment::Jailbreak.driver_kind(), DriverKind::Device);
        assert_eq!(Assessment::Connector.driver_kind(), DriverKind::Power);
        assert_eq!(Assessment::Gps.driver_kind(), DriverKind::Connectivity);
        assert_eq!(Assessment::Torch.driver_kind(), DriverKind::Physical);
        assert_eq!(Assessment::Camera.driver_kind(), DriverKind::Physical);
    }

    #[test]
    fn surface_patterns_map_to_their_surface() {
        assert_eq!(
            Assessment::Deadpixel.pattern(),
            ProbePattern::Surface(Surface::Deadpixel)
        );
        assert_eq!(
            Assessment::Rotation.pattern(),
            ProbePattern::EventTrigger(SystemTrigger::OrientationChanged)
        );
        assert_eq!(Assessment::EarSpeaker.pattern(), ProbePattern::CountConfirmation);
    }
}
