//! JSON file backed key-value store

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use super::kv::KeyValueStore;
use crate::error::StoreError;

/// Key-value store persisted as a single JSON object.
///
/// The whole file is rewritten on every change.
pub struct FileKeyValueStore {
    values: RwLock<BTreeMap<String, String>>,
    file_path: PathBuf,
}

impl FileKeyValueStore {
    /// Load the store from `file_path`, starting empty if the file is missing.
    pub async fn load(file_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file_path = file_path.into();

        let values = match fs::read_to_string(&file_path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %file_path.display(), keys = values.len(), "Loaded key-value store");

        Ok(Self {
            values: RwLock::new(values),
            file_path,
        })
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.file_path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut values = self.values.write().await;
        let removed = values.remove(key).is_some();
        if removed {
            self.persist(&values).await?;
        }
        Ok(removed)
    }
}
