//! Building blocks of the submission pipeline.
//!
//! The orchestration itself lives in [`crate::submit`]; the submodules here
//! each implement one transformation step so they can be tested alone.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ render ──▶ encode ──▶ upload ──▶ draft ──▶ analyze ──▶ feedback ──▶ final
//! (path/URL)          (pdfium)   (PNG)                  (kv)     (LLM)       (JSON)        (kv)
//! ```
//!
//! 1. [`input`]    — resolve a user-supplied path or URL to an in-memory document
//! 2. [`render`]   — rasterise the first PDF page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]   — PNG-encode the preview and base64-wrap it for the LLM
//! 4. [`feedback`] — turn the model's raw answer into a JSON document

pub mod encode;
pub mod feedback;
pub mod input;
pub mod render;

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of one submission, in the order they are visited.
///
/// Every non-terminal stage is gated on the success of the one before it;
/// a failure anywhere jumps straight to [`Stage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    UploadingDocument,
    ConvertingDocument,
    UploadingImage,
    PersistingDraft,
    Analyzing,
    PersistingFinal,
    Succeeded,
    Failed,
}

impl Stage {
    /// Status shown to the user when the stage begins.
    ///
    /// `PersistingFinal` has no status of its own; it runs under
    /// "Analyzing resume..." and is followed by the completion message.
    pub fn status_text(self) -> Option<&'static str> {
        match self {
            Stage::UploadingDocument => Some("Uploading the file..."),
            Stage::ConvertingDocument => Some("Converting to image..."),
            Stage::UploadingImage => Some("Uploading the image..."),
            Stage::PersistingDraft => Some("Preparing data..."),
            Stage::Analyzing => Some("Analyzing resume..."),
            Stage::Succeeded => Some("Analysis complete..."),
            Stage::Idle | Stage::PersistingFinal | Stage::Failed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_texts() {
        assert_eq!(
            Stage::UploadingDocument.status_text(),
            Some("Uploading the file...")
        );
        assert_eq!(Stage::Analyzing.status_text(), Some("Analyzing resume..."));
        assert_eq!(Stage::PersistingFinal.status_text(), None);
    }
}
