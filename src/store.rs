//! Key-value persistence backends.
//!
//! The telemetry engine only needs asynchronous `get`/`set` of one JSON value
//! by key. [`MemoryStore`] keeps values in process memory; [`FileStore`] keeps
//! one JSON document per key in a directory.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Result, TelemetryError};

/// Asynchronous key-value service used for snapshot persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: Value) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Directory-backed store writing `<dir>/<key>.json`.
///
/// Each write goes to its own temporary sibling file that is then renamed
/// over the target, so readers never observe a half-written document and
/// concurrent writes of the same key do not interfere. The last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.contains('\0')
        {
            return Err(TelemetryError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), "loaded value");
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(&value)?;
        let len = bytes.len();

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_replace(&dir, &target, &bytes))
            .await
            .map_err(|e| TelemetryError::Storage(format!("write task failed: {}", e)))??;
        debug!(path = %path.display(), bytes = len, "stored value");
        Ok(())
    }
}

/// Writes `bytes` to a fresh temp file in `dir` and renames it onto `path`.
fn write_replace(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_set_get() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryStore::new();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_with_entry() {
        let store = MemoryStore::with_entry("performanceMetrics", json!({"searchCount": 7}));
        let value = store.get("performanceMetrics").await.unwrap().unwrap();
        assert_eq!(value["searchCount"], json!(7));
    }

    #[tokio::test]
    async fn test_file_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("performanceMetrics").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let value = json!({"searchCount": 3, "errorCounts": {"google:timeout": 1}});

        store.set("performanceMetrics", value.clone()).await.unwrap();
        assert_eq!(store.get("performanceMetrics").await.unwrap(), Some(value));
        // no temp files left behind
        let names: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("performanceMetrics.json")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));

        for round in 0..20 {
            let writes: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move { store.set("k", json!({"round": round, "i": i})).await })
                })
                .collect();
            for write in writes {
                write.await.unwrap().unwrap();
            }

            let stored = store.get("k").await.unwrap().unwrap();
            assert_eq!(stored["round"], round);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_file_store_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("k", json!({"v": 1})).await.unwrap();
        store.set("k", json!({"v": 2})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_file_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.set("../x", json!(1)).await.unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidKey(_)));
        assert!(matches!(
            store.get("a/b").await,
            Err(TelemetryError::InvalidKey(_))
        ));
        assert!(matches!(store.get("").await, Err(TelemetryError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("k.json"), b"{not json").unwrap();
        let store = FileStore::new(dir.path());
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, TelemetryError::Serialization(_)));
    }

    #[test]
    fn test_file_store_dir() {
        let store = FileStore::new("/tmp/telemetry");
        assert_eq!(store.dir(), Path::new("/tmp/telemetry"));
    }
}
