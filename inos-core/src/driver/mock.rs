//! Mock driver for testing
//!
//! MockDriver answers snapshot queries from preset maps and replays
//! scripted updates when an assessment is started, enabling fast,
//! deterministic orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::measurement::Measurement;
use super::traits::{AssessmentDriver, DriverKind, ProbeSender, ProbeUpdate};
use crate::assessment::Assessment;

/// A call received by a [`MockDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCall {
    Start(Assessment),
    Stop(Assessment),
}

/// What a started assessment does with its sender.
#[derive(Debug, Clone)]
enum Behavior {
    /// Send these updates in order, then drop the sender.
    Script(Vec<ProbeUpdate>),
    /// Record an outcome and complete.
    Outcome(bool),
    /// Keep the sender alive and never report.
    Silent,
    /// Drop the sender without reporting.
    Close,
}

#[derive(Default)]
struct MockState {
    passed: HashMap<Assessment, bool>,
    measurements: HashMap<Assessment, Measurement>,
    behaviors: HashMap<Assessment, Behavior>,
    calls: Vec<MockCall>,
    held: HashMap<Assessment, ProbeSender>,
}

/// Scriptable implementation of AssessmentDriver
///
/// Unscripted assessments complete immediately with whatever the preset
/// `has_passed` map holds.
pub struct MockDriver {
    kind: DriverKind,
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new(kind: DriverKind) -> Self {
        Self {
            kind,
            state: Mutex::new(MockState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preset an outcome visible before any probe runs.
    #[must_use]
    pub fn with_passed(self, assessment: Assessment, passed: bool) -> Self {
        self.lock().passed.insert(assessment, passed);
        self
    }

    /// Preset a payload visible before any probe runs.
    #[must_use]
    pub fn with_measurement(self, assessment: Assessment, measurement: Measurement) -> Self {
        self.lock().measurements.insert(assessment, measurement);
        self
    }

    /// Record `passed` and complete when `assessment` starts.
    #[must_use]
    pub fn with_outcome(self, assessment: Assessment, passed: bool) -> Self {
        self.lock()
            .behaviors
            .insert(assessment, Behavior::Outcome(passed));
        self
    }

    /// Send `updates` when `assessment` starts.
    #[must_use]
    pub fn with_script(self, assessment: Assessment, updates: Vec<ProbeUpdate>) -> Self {
        self.lock()
            .behaviors
            .insert(assessment, Behavior::Script(updates));
        self
    }

    /// Never report for `assessment`.
    #[must_use]
    pub fn with_silent(self, assessment: Assessment) -> Self {
        self.lock().behaviors.insert(assessment, Behavior::Silent);
        self
    }

    /// Drop the sender for `assessment` without reporting.
    #[must_use]
    pub fn with_closed(self, assessment: Assessment) -> Self {
        self.lock().behaviors.insert(assessment, Behavior::Close);
        self
    }

    pub fn set_passed(&self, assessment: Assessment, passed: bool) {
        self.lock().passed.insert(assessment, passed);
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Assessments started, in order.
    pub fn started(&self) -> Vec<Assessment> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Start(assessment) => Some(*assessment),
                MockCall::Stop(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, assessment: Assessment) -> bool {
        self.started().contains(&assessment)
    }

    pub fn was_stopped(&self, assessment: Assessment) -> bool {
        self.lock().calls.contains(&MockCall::Stop(assessment))
    }

    /// Assessments told to stay silent.
    pub fn silent_assessments(&self) -> HashSet<Assessment> {
        self.lock()
            .behaviors
            .iter()
            .filter(|(_, behavior)| matches!(behavior, Behavior::Silent))
            .map(|(assessment, _)| *assessment)
            .collect()
    }
}

impl AssessmentDriver for MockDriver {
    fn kind(&self) -> DriverKind {
        self.kind
    }

    fn start(&self, assessment: Assessment, updates: ProbeSender) {
        let mut state = self.lock();
        state.calls.push(MockCall::Start(assessment));
        match state.behaviors.get(&assessment).cloned() {
            Some(Behavior::Script(script)) => {
                for update in script {
                    if let ProbeUpdate::Reported(measurement) = &update {
                        state.measurements.insert(assessment, measurement.clone());
                    }
                    let _ = updates.send(update);
                }
            }
            Some(Behavior::Outcome(passed)) => {
                state.passed.insert(assessment, passed);
                let _ = updates.send(ProbeUpdate::Completed);
            }
            Some(Behavior::Silent) => {
                state.held.insert(assessment, updates);
            }
            Some(Behavior::Close) => drop(updates),
            None => {
                let _ = updates.send(ProbeUpdate::Completed);
            }
        }
    }

    fn stop(&self, assessment: Assessment) {
        let mut state = self.lock();
        state.calls.push(MockCall::Stop(assessment));
        state.held.remove(&assessment);
    }

    fn has_passed(&self) -> HashMap<Assessment, bool> {
        self.lock().passed.clone()
    }

    fn measurements(&self) -> HashMap<Assessment, Measurement> {
        self.lock().measurements.clone()
    }
}
