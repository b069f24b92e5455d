//! User preferences.
//!
//! Only booleans are needed so far; the auto-sync switch is the main one.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::client::storage;
use crate::shared::error::StorageError;

/// Whether the background sync loop may upload drafts.
pub const AUTO_SYNC_ENABLED: &str = "autoSyncEnabled";

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored value of `key`, or `fallback` when unset or unreadable.
    async fn bool_with_fallback(&self, key: &str, fallback: bool) -> bool;

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StorageError>;
}

/// Preferences kept in one JSON object on disk.
#[derive(Debug)]
pub struct JsonPreferences {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonPreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        Ok(storage::read_json_opt(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferences {
    async fn bool_with_fallback(&self, key: &str, fallback: bool) -> bool {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(values) => values.get(key).and_then(|v| v.as_bool()).unwrap_or(fallback),
            Err(e) => {
                tracing::warn!("[PREFS] Unreadable preferences, using default: {}", e);
                fallback
            }
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        // A corrupt file is replaced rather than blocking the write.
        let mut values = self.load().await.unwrap_or_default();
        values.insert(key.to_string(), serde_json::Value::Bool(value));
        storage::write_json_atomic(&self.path, &values).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn bool_with_fallback(&self, key: &str, fallback: bool) -> bool {
        self.values.lock().await.get(key).copied().unwrap_or(fallback)
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StorageError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
