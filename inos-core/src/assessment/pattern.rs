//! Probe pattern classification.

use serde::{Deserialize, Serialize};

use super::Assessment;

/// The completion style of an assessment's probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePattern {
    /// Outcome is derived from driver state that is already known.
    Immediate,
    /// Driver is started and the first update decides the outcome.
    SingleCallback,
    /// First occurrence of a system lifecycle event passes the assessment.
    EventTrigger(SystemTrigger),
    /// A full-screen test surface is presented and reports the outcome.
    Surface(Surface),
    /// Driver plays a random number of trials; the user types back the count.
    CountConfirmation,
    /// Like `SingleCallback`, but typed failure payloads become errors.
    FailureSensitive,
}

/// System lifecycle transitions some assessments wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemTrigger {
    DidEnterBackground,
    WillEnterForeground,
    OrientationChanged,
}

/// Dedicated full-screen test surfaces presented by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Camera,
    Touchscreen,
    Deadpixel,
    Multitouch,
    Compass,
}

impl Surface {
    /// The assessment this surface reports for.
    pub const fn assessment(self) -> Assessment {
        match self {
            Self::Camera => Assessment::Camera,
            Self::Touchscreen => Assessment::Touchscreen,
            Self::Deadpixel => Assessment::Deadpixel,
            Self::Multitouch => Assessment::Multitouch,
            Self::Compass => Assessment::Compass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_surface_round_trips_through_its_assessment() {
        for surface in [
            Surface::Camera,
            Surface::Touchscreen,
            Surface::Deadpixel,
            Surface::Multitouch,
            Surface::Compass,
        ] {
            assert_eq!(surface.assessment().pattern(), ProbePattern::Surface(surface));
        }
    }
}
