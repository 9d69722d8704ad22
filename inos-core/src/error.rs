//! Error types for inos-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assessment::Assessment;
use crate::driver::{Permission, SensorFailureReason};

/// Top-level error type for inos-core
#[derive(Error, Debug)]
pub enum InosError {
    #[error("Assessment error: {0}")]
    Assessment(#[from] AssessmentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure of a single assessment run.
///
/// Every variant is recoverable at the assessment level: the orchestrator
/// records the assessment as failed and moves on. `Cancelled` is the one
/// exception and is never recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentError {
    #[error("{permission} access denied for {assessment}")]
    PermissionDenied {
        assessment: Assessment,
        permission: Permission,
    },

    #[error("{assessment} sensor unavailable: {reason}")]
    SensorUnavailable {
        assessment: Assessment,
        reason: SensorFailureReason,
    },

    #[error("Assessment run cancelled")]
    Cancelled,

    #[error("Probe for {assessment} closed without reporting")]
    ProbeClosed { assessment: Assessment },
}

impl AssessmentError {
    /// Whether this error stems from the run being abandoned rather than
    /// from the device.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors from the persistent key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== AssessmentError Tests ====================

    #[test]
    fn permission_denied_displays_resource_and_assessment() {
        let error = AssessmentError::PermissionDenied {
            assessment: Assessment::Microphone,
            permission: Permission::Microphone,
        };
        let text = error.to_string();
        assert!(text.contains("microphone access denied"));
        assert!(text.contains("for microphone"));
    }

    #[test]
    fn sensor_unavailable_displays_reason() {
        let error = AssessmentError::SensorUnavailable {
            assessment: Assessment::Biometric,
            reason: SensorFailureReason::LockedOut,
        };
        assert!(error.to_string().contains("biometric sensor unavailable"));
        assert!(error.to_string().contains("locked out"));
    }

    #[test]
    fn only_cancelled_reports_is_cancelled() {
        assert!(AssessmentError::Cancelled.is_cancelled());
        assert!(
            !AssessmentError::ProbeClosed {
                assessment: Assessment::Gps
            }
            .is_cancelled()
        );
    }

    #[test]
    fn assessment_error_serializes_with_kind_tag() {
        let error = AssessmentError::SensorUnavailable {
            assessment: Assessment::Biometric,
            reason: SensorFailureReason::NotEnrolled,
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"kind\":\"sensor_unavailable\""));
        let parsed: AssessmentError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, error);
    }

    // ==================== Conversion Tests ====================

    #[test]
    fn inos_error_converts_from_assessment_error() {
        let error: InosError = AssessmentError::Cancelled.into();
        assert!(matches!(error, InosError::Assessment(_)));
        assert!(error.to_string().contains("Assessment error"));
    }

    #[test]
    fn inos_error_converts_from_store_error() {
        let error: InosError = StoreError::Backend("offline".to_string()).into();
        assert!(matches!(error, InosError::Store(_)));
        assert!(error.to_string().contains("offline"));
    }

    #[test]
    fn store_error_converts_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: StoreError = io.into();
        assert!(matches!(error, StoreError::Io(_)));
    }
}
