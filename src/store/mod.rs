//! Storage collaborators: blobs go to an [`ObjectStore`], submission records
//! to a [`RecordStore`].
//!
//! Both are capability traits so the pipeline never knows which backend it
//! talks to. Two backends ship with the crate:
//!
//! | Backend | Object store | Record store |
//! |---------|--------------|--------------|
//! | filesystem | [`FsObjectStore`] | [`FsRecordStore`] |
//! | in-memory  | [`MemoryObjectStore`] | [`MemoryRecordStore`] |
//!
//! The filesystem layout under a storage directory is:
//!
//! ```text
//! storage_dir/
//!  ├─ files/<id>/resume.pdf
//!  ├─ files/<id>/resume.png
//!  └─ records/resume/<id>.json
//! ```

pub mod object;
pub mod record;

pub use object::{Blob, FsObjectStore, MemoryObjectStore, ObjectStore, StoredObject};
pub use record::{FsRecordStore, MemoryRecordStore, RecordStore};

use crate::error::StoreError;
use std::path::Path;

/// Split a store-relative path into validated segments.
///
/// Rejects empty paths, `.`/`..` segments, backslashes and NUL bytes so a
/// path can never leave the store root. A single leading `/` is tolerated.
pub(crate) fn checked_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    for seg in &segments {
        if !is_valid_segment(seg) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments)
}

/// A single path component that is safe to use as a file or directory name.
pub(crate) fn is_valid_segment(seg: &str) -> bool {
    !seg.is_empty()
        && seg != "."
        && seg != ".."
        && !seg.contains('\\')
        && !seg.contains('\0')
        && !seg.contains('/')
}

/// Write `bytes` to `path` atomically (temp file + rename), creating parents.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(io_err)?;
    Ok(())
}
