//! AssessmentDriver trait and probe plumbing
//!
//! A driver owns the probing for one group of related assessments. Probes
//! are asynchronous: `start` returns immediately and progress is reported
//! through a [`ProbeSender`]. Outcomes and payloads are read back through
//! the `has_passed` and `measurements` snapshots.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::measurement::Measurement;
use crate::assessment::Assessment;

/// The four driver groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Device,
    Connectivity,
    Physical,
    Power,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Device => "device",
            Self::Connectivity => "connectivity",
            Self::Physical => "physical",
            Self::Power => "power",
        };
        f.write_str(name)
    }
}

/// Progress signal from a running probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeUpdate {
    /// The probe finished; read the outcome from the driver snapshots.
    Completed,
    /// The probe produced a payload ahead of completion.
    Reported(Measurement),
}

/// Channel a probe reports through. Dropping every sender without sending
/// an update closes the probe.
pub type ProbeSender = mpsc::UnboundedSender<ProbeUpdate>;

/// Receiving half of a [`ProbeSender`].
pub type ProbeReceiver = mpsc::UnboundedReceiver<ProbeUpdate>;

/// Create a probe channel.
pub fn probe_channel() -> (ProbeSender, ProbeReceiver) {
    mpsc::unbounded_channel()
}

/// Trait for assessment drivers
///
/// Implementations must be cheap to call from the orchestrator: `start`
/// spawns whatever work it needs and never blocks, and `stop` is
/// idempotent.
pub trait AssessmentDriver: Send + Sync {
    /// The group this driver serves.
    fn kind(&self) -> DriverKind;

    /// Begin probing `assessment`. May report zero, one, or many updates.
    fn start(&self, assessment: Assessment, updates: ProbeSender);

    /// Release timers and subscriptions held for `assessment`.
    fn stop(&self, assessment: Assessment);

    /// Snapshot of outcomes known so far.
    fn has_passed(&self) -> HashMap<Assessment, bool>;

    /// Snapshot of the last payload measured per assessment.
    fn measurements(&self) -> HashMap<Assessment, Measurement>;
}
