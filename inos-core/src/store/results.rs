//! Pass/fail result persistence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::kv::KeyValueStore;
use crate::assessment::{Assessment, PassedAssessments};
use crate::error::StoreError;

/// Key the results snapshot is stored under.
pub const PASSED_ASSESSMENTS_KEY: &str = "passed_assessments";

/// One stored outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub assessment_key: String,
    pub is_passed: bool,
}

/// Loads and saves [`PassedAssessments`] snapshots.
#[derive(Clone)]
pub struct ResultStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ResultStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the stored snapshot. Records for unknown assessments are skipped.
    pub async fn load(&self) -> Result<PassedAssessments, StoreError> {
        let Some(raw) = self.kv.get(PASSED_ASSESSMENTS_KEY).await? else {
            return Ok(PassedAssessments::new());
        };
        let records: Vec<ResultRecord> = serde_json::from_str(&raw)?;
        Ok(decode(records))
    }

    /// Replace the stored snapshot.
    pub async fn save(&self, passed: &PassedAssessments) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&encode(passed))?;
        self.kv.set(PASSED_ASSESSMENTS_KEY, raw).await?;
        debug!(count = passed.len(), "Saved assessment results");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.kv.remove(PASSED_ASSESSMENTS_KEY).await?;
        Ok(())
    }
}

pub fn encode(passed: &PassedAssessments) -> Vec<ResultRecord> {
    passed
        .iter()
        .map(|(assessment, is_passed)| ResultRecord {
            assessment_key: assessment.key().to_string(),
            is_passed,
        })
        .collect()
}

pub fn decode(records: Vec<ResultRecord>) -> PassedAssessments {
    records
        .into_iter()
        .filter_map(|record| match record.assessment_key.parse::<Assessment>() {
            Ok(assessment) => Some((assessment, record.is_passed)),
            Err(e) => {
                warn!(error = %e, "Skipping stored result");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyValueStore;

    fn store() -> (ResultStore, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        (ResultStore::new(kv.clone()), kv)
    }

    #[tokio::test]
    async fn empty_store_loads_empty_map() {
        let (results, _) = store();
        assert!(results.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_returns_same_map() {
        let (results, _) = store();
        let passed: PassedAssessments = [
            (Assessment::Cpu, true),
            (Assessment::Biometric, false),
            (Assessment::WirelessCharging, true),
        ]
        .into_iter()
        .collect();

        results.save(&passed).await.unwrap();
        assert_eq!(results.load().await.unwrap(), passed);
    }

    #[tokio::test]
    async fn records_use_camel_case_fields() {
        let (results, kv) = store();
        let passed: PassedAssessments = [(Assessment::VolumeUp, true)].into_iter().collect();
        results.save(&passed).await.unwrap();

        let raw = kv.get(PASSED_ASSESSMENTS_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"[{"assessmentKey":"volumeUp","isPassed":true}]"#);
    }

    #[tokio::test]
    async fn unknown_keys_are_skipped() {
        let (results, kv) = store();
        kv.set(
            PASSED_ASSESSMENTS_KEY,
            r#"[{"assessmentKey":"nfc","isPassed":true},{"assessmentKey":"gps","isPassed":false}]"#
                .to_string(),
        )
        .await
        .unwrap();

        let loaded = results.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(Assessment::Gps), Some(false));
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let (results, _) = store();
        let passed: PassedAssessments = [(Assessment::Wifi, true)].into_iter().collect();
        results.save(&passed).await.unwrap();
        results.clear().await.unwrap();
        assert!(results.load().await.unwrap().is_empty());
    }
}
