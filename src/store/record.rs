//! Key/value persistence for submission records.
//!
//! Keys follow the `<namespace>:<name>` convention (`resume:<id>`); values are
//! opaque strings (JSON in practice).

use super::{is_valid_segment, write_atomic};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key/value persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// All keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

// ── Filesystem backend ───────────────────────────────────────────────────

/// One JSON file per key: `resume:<id>` lives at `<root>/resume/<id>.json`.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

const RECORD_EXT: &str = "json";

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let invalid = || StoreError::InvalidPath(key.to_string());
        match key.split_once(':') {
            Some((ns, name)) => {
                if !is_valid_segment(ns) || !is_valid_segment(name) || name.contains(':') {
                    return Err(invalid());
                }
                Ok(self.root.join(ns).join(format!("{name}.{RECORD_EXT}")))
            }
            None => {
                if !is_valid_segment(key) {
                    return Err(invalid());
                }
                Ok(self.root.join(format!("{key}.{RECORD_EXT}")))
            }
        }
    }

    /// Names of `*.json` files directly inside `dir` (without extension).
    async fn record_names(dir: &Path) -> Result<Vec<String>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(io_err(e)),
        };

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        write_atomic(&path, value.as_bytes()).await?;
        debug!("Record {} written ({} bytes)", key, value.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io { path, source: e }),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Self::record_names(&self.root).await?;

        let io_err = |source| StoreError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(e)),
        };

        if let Some(entries) = entries.as_mut() {
            while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
                let is_dir = entry.file_type().await.map_err(io_err)?.is_dir();
                let ns = entry.file_name().to_string_lossy().to_string();
                if !is_dir || !is_valid_segment(&ns) {
                    continue;
                }
                for name in Self::record_names(&entry.path()).await? {
                    keys.push(format!("{ns}:{name}"));
                }
            }
        }

        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

// ── In-memory backend ────────────────────────────────────────────────────

/// Map-backed record store that also keeps an ordered log of every write.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryRecords>,
}

#[derive(Debug, Default)]
struct MemoryRecords {
    values: BTreeMap<String, String>,
    writes: Vec<(String, String)>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(key, value)` passed to `set`, oldest first.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRecords> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes.push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().values.get(key).cloned())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_logs_every_write() {
        let store = MemoryRecordStore::new();
        store.set("resume:a", "1").await.unwrap();
        store.set("resume:a", "2").await.unwrap();

        assert_eq!(store.get("resume:a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.writes().len(), 2);
        assert_eq!(store.list("resume:").await.unwrap(), vec!["resume:a"]);
    }

    #[tokio::test]
    async fn fs_store_maps_namespace_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());

        store.set("resume:abc", r#"{"id":"abc"}"#).await.unwrap();
        assert!(dir.path().join("resume").join("abc.json").exists());
        assert_eq!(
            store.get("resume:abc").await.unwrap().as_deref(),
            Some(r#"{"id":"abc"}"#)
        );
        assert_eq!(store.get("resume:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn fs_store_lists_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());

        store.set("resume:b", "{}").await.unwrap();
        store.set("resume:a", "{}").await.unwrap();
        store.set("other:z", "{}").await.unwrap();
        store.set("plain", "{}").await.unwrap();

        assert_eq!(
            store.list("resume:").await.unwrap(),
            vec!["resume:a", "resume:b"]
        );
        assert_eq!(store.list("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn fs_store_list_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path().join("never-created"));
        assert!(store.list("resume:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fs_store_rejects_bad_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRecordStore::new(dir.path());
        assert!(store.set("resume:../x", "{}").await.is_err());
        assert!(store.set("a:b:c", "{}").await.is_err());
        assert!(store.set(":x", "{}").await.is_err());
    }
}
