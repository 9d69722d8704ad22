//! Observable orchestrator state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::assessment::{Assessment, PassedAssessments, Surface};
use crate::error::AssessmentError;

/// The assessment the UI is focused on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrentAssessment {
    pub assessment: Assessment,
    /// Preparing, with a testing message to show.
    pub is_testing: bool,
    /// A probe for it is in flight.
    pub is_running: bool,
}

impl CurrentAssessment {
    pub fn started(assessment: Assessment) -> Self {
        Self {
            assessment,
            is_testing: assessment.has_testing_message(),
            is_running: true,
        }
    }

    pub fn finished(assessment: Assessment) -> Self {
        Self {
            assessment,
            is_testing: false,
            is_running: false,
        }
    }
}

/// Top-level run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Idle,
    RunningSingle { assessment: Assessment },
    RunningSerial {
        /// Position in the enabled ordering.
        index: usize,
        awaiting_confirmation: bool,
    },
}

impl RunMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Everything the UI renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrchestratorState {
    pub current: Option<CurrentAssessment>,
    pub mode: RunMode,
    pub passed: PassedAssessments,
    /// Why the last attempt of an assessment failed, when it failed with an error.
    pub failures: BTreeMap<Assessment, AssessmentError>,
    /// Assessment waiting for the user's go-ahead.
    pub awaiting_confirmation: Option<Assessment>,
    /// Test surface currently on screen.
    pub presented: Option<Surface>,
    /// Assessment whose trial count the user should type back.
    pub count_entry: Option<Assessment>,
    /// Serial progress indicator, advanced after each serial step.
    pub scroll_index: f64,
}

impl OrchestratorState {
    pub fn is_idle(&self) -> bool {
        self.mode.is_idle()
    }

    /// Drop every run flag, keeping recorded results.
    pub(crate) fn reset_run(&mut self) {
        self.mode = RunMode::Idle;
        if let Some(current) = self.current.as_mut() {
            current.is_testing = false;
            current.is_running = false;
        }
        self.awaiting_confirmation = None;
        self.presented = None;
        self.count_entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_uses_testing_message() {
        assert!(CurrentAssessment::started(Assessment::Camera).is_testing);
        assert!(!CurrentAssessment::started(Assessment::Cpu).is_testing);
        assert!(CurrentAssessment::started(Assessment::Cpu).is_running);
    }

    #[test]
    fn reset_run_keeps_results() {
        let mut state = OrchestratorState {
            current: Some(CurrentAssessment::started(Assessment::Compass)),
            mode: RunMode::RunningSerial {
                index: 3,
                awaiting_confirmation: true,
            },
            awaiting_confirmation: Some(Assessment::Compass),
            presented: Some(Surface::Compass),
            ..OrchestratorState::default()
        };
        state.passed.record(Assessment::Cpu, true);

        state.reset_run();

        assert!(state.is_idle());
        assert_eq!(state.current, Some(CurrentAssessment::finished(Assessment::Compass)));
        assert_eq!(state.awaiting_confirmation, None);
        assert_eq!(state.presented, None);
        assert_eq!(state.passed.get(Assessment::Cpu), Some(true));
    }

    #[test]
    fn run_mode_serializes_with_tag() {
        let json = serde_json::to_string(&RunMode::RunningSingle {
            assessment: Assessment::Gps,
        })
        .unwrap();
        assert_eq!(json, r#"{"mode":"running_single","assessment":"gps"}"#);
    }
}
