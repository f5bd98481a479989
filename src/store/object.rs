//! Blob storage: the [`ObjectStore`] capability and its two backends.

use super::{checked_segments, write_atomic};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// A named document or image held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
    /// File name, possibly prefixed with directories (`<id>/resume.pdf`).
    pub name: String,
    /// MIME type, e.g. `application/pdf`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Blob {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Build a blob whose content type is sniffed from its magic bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = sniff_content_type(&bytes).to_string();
        Self::new(name, content_type, bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` when the bytes start with the `%PDF` signature.
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    /// `true` for PNG or JPEG content.
    pub fn is_image(&self) -> bool {
        matches!(sniff_content_type(&self.bytes), "image/png" | "image/jpeg")
    }

    /// The last path segment of [`Blob::name`].
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Same content under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Blob {
        Blob {
            name: name.into(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Guess a MIME type from the first bytes of a document.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        "application/pdf"
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

/// Reference to a blob that has been stored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredObject {
    /// Store-relative path, the value persisted in records.
    pub path: String,
    pub size: u64,
}

/// Path-addressable blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `blob` under its name and return where it landed.
    async fn upload(&self, blob: &Blob) -> Result<StoredObject, StoreError>;

    /// Fetch a previously uploaded blob.
    async fn read(&self, path: &str) -> Result<Blob, StoreError>;
}

// ── Filesystem backend ───────────────────────────────────────────────────

/// Stores blobs as plain files below a root directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<(String, PathBuf), StoreError> {
        let segments = checked_segments(path)?;
        let full = segments.iter().fold(self.root.clone(), |acc, s| acc.join(s));
        Ok((segments.join("/"), full))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, blob: &Blob) -> Result<StoredObject, StoreError> {
        let (rel, full) = self.resolve(&blob.name)?;
        write_atomic(&full, &blob.bytes).await?;
        debug!("Stored {} ({} bytes) at {}", rel, blob.len(), full.display());

        Ok(StoredObject {
            path: rel,
            size: blob.len() as u64,
        })
    }

    async fn read(&self, path: &str) -> Result<Blob, StoreError> {
        let (rel, full) = self.resolve(path)?;
        let bytes = tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(rel.clone())
            } else {
                StoreError::Io {
                    path: full.clone(),
                    source: e,
                }
            }
        })?;
        Ok(Blob::from_bytes(rel, bytes))
    }
}

// ── In-memory backend ────────────────────────────────────────────────────

/// Keeps blobs in a map; remembers the order of uploads.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    inner: Mutex<MemoryObjects>,
}

#[derive(Debug, Default)]
struct MemoryObjects {
    blobs: BTreeMap<String, Blob>,
    uploads: Vec<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every upload so far, oldest first.
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.lock().uploads.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryObjects> {
        // A poisoned map is still consistent: every mutation is a single insert.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, blob: &Blob) -> Result<StoredObject, StoreError> {
        let rel = checked_segments(&blob.name)?.join("/");
        let mut inner = self.lock();
        inner.blobs.insert(rel.clone(), blob.renamed(rel.clone()));
        inner.uploads.push(rel.clone());

        Ok(StoredObject {
            path: rel,
            size: blob.len() as u64,
        })
    }

    async fn read(&self, path: &str) -> Result<Blob, StoreError> {
        let rel = checked_segments(path)?.join("/");
        self.lock()
            .blobs
            .get(&rel)
            .cloned()
            .ok_or(StoreError::NotFound(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_blob(name: &str) -> Blob {
        Blob::from_bytes(name, b"%PDF-1.7 minimal".to_vec())
    }

    #[test]
    fn sniffs_common_types() {
        assert_eq!(sniff_content_type(b"%PDF-1.4"), "application/pdf");
        assert_eq!(sniff_content_type(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_content_type(b"hello"), "application/octet-stream");
    }

    #[test]
    fn file_name_strips_directories() {
        let blob = pdf_blob("abc/def/resume.pdf");
        assert_eq!(blob.file_name(), "resume.pdf");
        assert!(blob.is_pdf());
        assert!(!blob.is_image());
    }

    #[tokio::test]
    async fn memory_store_roundtrips_and_records_order() {
        let store = MemoryObjectStore::new();
        let a = store.upload(&pdf_blob("id1/resume.pdf")).await.unwrap();
        let b = store.upload(&pdf_blob("/id1/resume.png")).await.unwrap();

        assert_eq!(a.path, "id1/resume.pdf");
        assert_eq!(b.path, "id1/resume.png");
        assert_eq!(store.uploaded_paths(), vec![a.path.clone(), b.path]);

        let back = store.read(&a.path).await.unwrap();
        assert_eq!(back.bytes, b"%PDF-1.7 minimal");
    }

    #[tokio::test]
    async fn memory_store_missing_path_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.read("nope/x.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn fs_store_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());

        let stored = store.upload(&pdf_blob("id9/resume.pdf")).await.unwrap();
        assert_eq!(stored.path, "id9/resume.pdf");
        assert_eq!(stored.size, 16);
        assert!(dir.path().join("id9").join("resume.pdf").exists());
        assert!(!dir.path().join("id9").join("resume.pdf.tmp").exists());

        let back = store.read("id9/resume.pdf").await.unwrap();
        assert_eq!(back.content_type, "application/pdf");
        assert_eq!(back.file_name(), "resume.pdf");
    }

    #[tokio::test]
    async fn fs_store_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store.upload(&pdf_blob("../outside.pdf")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }
}
