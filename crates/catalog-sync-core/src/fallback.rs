use catalog_sync_config::PathManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("fallback store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("fallback store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid bucket name: {0}")]
    InvalidBucket(String),
}

/// Durable key/value storage on the local device, keyed by bucket.
///
/// Only consulted on error paths: when the remote catalog cannot be loaded
/// and when restoring an admin session.
pub trait FallbackStore: Send + Sync {
    fn get(&self, bucket: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, bucket: &str, value: &Value) -> Result<(), StoreError>;
    fn remove(&self, bucket: &str) -> Result<(), StoreError>;
}

/// Read and decode a bucket. Failures are logged and read as missing.
pub fn load_bucket<T: DeserializeOwned>(store: &dyn FallbackStore, bucket: &str) -> Option<T> {
    match store.get(bucket) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Fallback bucket {} has unexpected shape: {}", bucket, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read fallback bucket {}: {}", bucket, e);
            None
        }
    }
}

pub fn save_bucket<T: Serialize>(store: &dyn FallbackStore, bucket: &str, data: &T) -> Result<(), StoreError> {
    let value = serde_json::to_value(data)?;
    store.set(bucket, &value)
}

/// One pretty-printed JSON file per bucket.
#[derive(Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(path_manager: &PathManager) -> Result<Self, StoreError> {
        Self::at(path_manager.fallback_dir())
    }

    pub fn at(dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        let valid = !bucket.is_empty()
            && bucket
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidBucket(bucket.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", bucket)))
    }
}

impl FallbackStore for JsonFileStore {
    fn get(&self, bucket: &str) -> Result<Option<Value>, StoreError> {
        let path = self.bucket_path(bucket)?;

        if !path.exists() {
            debug!("Fallback miss: {} (file does not exist)", bucket);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&content) {
            Ok(value) => {
                info!("Fallback hit: {}", bucket);
                Ok(Some(value))
            }
            Err(e) => {
                warn!(
                    "Fallback corruption detected for {}: {}. Deleting corrupted file.",
                    bucket, e
                );
                if let Err(rm_err) = std::fs::remove_file(&path) {
                    warn!("Failed to delete corrupted fallback file: {}", rm_err);
                }
                Ok(None)
            }
        }
    }

    fn set(&self, bucket: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.bucket_path(bucket)?;
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(value)?;
        // Write to a sibling then rename so a crash never leaves half a file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Fallback saved: {}", bucket);
        Ok(())
    }

    fn remove(&self, bucket: &str) -> Result<(), StoreError> {
        let path = self.bucket_path(bucket)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, for tests and sessions that must not touch disk.
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(bucket)
    }
}

impl FallbackStore for MemoryStore {
    fn get(&self, bucket: &str) -> Result<Option<Value>, StoreError> {
        let buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(buckets.get(bucket).cloned())
    }

    fn set(&self, bucket: &str, value: &Value) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buckets.insert(bucket.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, bucket: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buckets.remove(bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::at(dir.path().join("fallback")).unwrap();

        assert!(store.get("movies").unwrap().is_none());
        store.set("movies", &json!([{ "id": 1 }])).unwrap();
        assert_eq!(store.get("movies").unwrap(), Some(json!([{ "id": 1 }])));

        store.remove("movies").unwrap();
        assert!(store.get("movies").unwrap().is_none());
        // Removing again is fine
        store.remove("movies").unwrap();
    }

    #[test]
    fn test_json_file_store_drops_corrupted_bucket() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::at(dir.path().to_path_buf()).unwrap();
        let path = dir.path().join("shows.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(store.get("shows").unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_json_file_store_rejects_path_like_buckets() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::at(dir.path().to_path_buf()).unwrap();
        assert!(matches!(store.get("../etc"), Err(StoreError::InvalidBucket(_))));
    }

    #[test]
    fn test_typed_buckets() {
        let store = MemoryStore::new();
        save_bucket(&store, "names", &vec!["a".to_string(), "b".to_string()]).unwrap();

        let names: Option<Vec<String>> = load_bucket(&store, "names");
        assert_eq!(names, Some(vec!["a".to_string(), "b".to_string()]));

        // Wrong shape reads as missing
        let wrong: Option<Vec<u32>> = load_bucket(&store, "names");
        assert!(wrong.is_none());
        assert!(store.contains("names"));
    }
}
