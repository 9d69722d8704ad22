//! Accumulated pass/fail outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Assessment;

/// Mapping of assessment to its last pass/fail outcome.
///
/// A key is present iff the assessment has been attempted since the map
/// was last cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassedAssessments(BTreeMap<Assessment, bool>);

impl PassedAssessments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, replacing any earlier one.
    pub fn record(&mut self, assessment: Assessment, passed: bool) {
        self.0.insert(assessment, passed);
    }

    pub fn get(&self, assessment: Assessment) -> Option<bool> {
        self.0.get(&assessment).copied()
    }

    pub fn contains(&self, assessment: Assessment) -> bool {
        self.0.contains_key(&assessment)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outcomes in assessment declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Assessment, bool)> + '_ {
        self.0.iter().map(|(assessment, passed)| (*assessment, *passed))
    }

    /// Number of recorded passes.
    pub fn passed_count(&self) -> usize {
        self.0.values().filter(|passed| **passed).count()
    }
}

impl FromIterator<(Assessment, bool)> for PassedAssessments {
    fn from_iter<I: IntoIterator<Item = (Assessment, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_replaces_previous_outcome() {
        let mut passed = PassedAssessments::new();
        passed.record(Assessment::Wifi, false);
        passed.record(Assessment::Wifi, true);
        assert_eq!(passed.len(), 1);
        assert_eq!(passed.get(Assessment::Wifi), Some(true));
    }

    #[test]
    fn unattempted_assessment_is_absent() {
        let passed = PassedAssessments::new();
        assert!(!passed.contains(Assessment::Gps));
        assert_eq!(passed.get(Assessment::Gps), None);
    }

    #[test]
    fn iter_follows_declaration_order() {
        let passed: PassedAssessments = [
            (Assessment::Microphone, true),
            (Assessment::Cpu, false),
            (Assessment::Camera, true),
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = passed.iter().map(|(a, _)| a).collect();
        assert_eq!(order, vec![Assessment::Cpu, Assessment::Camera, Assessment::Microphone]);
        assert_eq!(passed.passed_count(), 2);
    }
}
