//! Error types for the resume-feedback library.
//!
//! Two kinds of failure exist and they are kept apart on purpose:
//!
//! * [`ReviewError`] — **Fatal**: the library cannot be set up or a document
//!   cannot even be loaded (bad path, provider not configured, pdfium missing).
//!   Returned as `Err(ReviewError)` from constructors and loaders.
//!
//! * [`SubmissionFailure`] — **Terminal for one submission**: a stage of the
//!   pipeline failed. It never escapes [`crate::ResumePipeline::submit`] as an
//!   `Err`; it is reported inside [`crate::SubmissionOutcome::Failed`] and its
//!   `Display` text is exactly what the status sink shows the user.
//!
//! Collaborators report their own errors ([`StoreError`], [`AnalysisError`]);
//! the pipeline maps them onto the stage that was running.

use crate::pipeline::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Generic message used when the converter fails without saying why.
pub const DEFAULT_CONVERSION_ERROR: &str = "Failed to convert PDF to image";

/// All fatal errors returned by the resume-feedback library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Document file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// A store could not be opened or read.
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors reported by the object and record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("Storage I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path or key would escape the store root or is otherwise unusable.
    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    /// Nothing is stored under the given path.
    #[error("Nothing stored at '{0}'")]
    NotFound(String),

    /// A stored record exists but does not deserialise.
    #[error("Record '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Catch-all for backends that only report a message.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors reported by an [`crate::AnalysisService`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The referenced document could not be fetched from the object store.
    #[error("Could not read document '{path}': {source}")]
    DocumentUnavailable {
        path: String,
        #[source]
        source: StoreError,
    },

    /// The document is neither a PDF nor a PNG/JPEG image.
    #[error("Unsupported document type for '{path}'")]
    UnsupportedDocument { path: String },

    /// The document could not be turned into an image for the model.
    #[error("Could not prepare '{path}' for analysis: {detail}")]
    Preparation { path: String, detail: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    Llm { message: String },

    /// The LLM call did not finish in time.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Why one submission stopped.
///
/// The `Display` text is the user-visible status string shown as the last
/// status of a failed submission.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum SubmissionFailure {
    /// The original document could not be stored.
    #[error("Error: Failed to upload file")]
    DocumentUpload,

    /// The converter reported a failure or produced no usable image.
    /// Holds the converter's own message (or the generic fallback).
    #[error("{0}")]
    Conversion(String),

    /// The rendered preview image could not be stored.
    #[error("Error: Failed to upload image")]
    ImageUpload,

    /// The draft record could not be written.
    #[error("Error: Failed to save resume data")]
    DraftPersist,

    /// The analysis service failed or returned nothing.
    #[error("Error: Failed to analyze resume")]
    Analysis,

    /// The analysis text is not valid structured feedback.
    #[error("Error: Failed to parse analysis feedback")]
    FeedbackParse { detail: String },

    /// The final record could not be written.
    #[error("Error: Failed to save analysis feedback")]
    FinalPersist,

    /// A stage faulted in a way no branch handles.
    #[error("Unexpected error occurred")]
    Unexpected { detail: String },
}

impl SubmissionFailure {
    /// The stage that was running when the submission failed.
    ///
    /// Unexpected faults report [`Stage::Failed`] because the fault is caught
    /// outside any single stage.
    pub fn stage(&self) -> Stage {
        match self {
            SubmissionFailure::DocumentUpload => Stage::UploadingDocument,
            SubmissionFailure::Conversion(_) => Stage::ConvertingDocument,
            SubmissionFailure::ImageUpload => Stage::UploadingImage,
            SubmissionFailure::DraftPersist => Stage::PersistingDraft,
            SubmissionFailure::Analysis => Stage::Analyzing,
            SubmissionFailure::FeedbackParse { .. } | SubmissionFailure::FinalPersist => {
                Stage::PersistingFinal
            }
            SubmissionFailure::Unexpected { .. } => Stage::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failure_displays_converter_message_verbatim() {
        let e = SubmissionFailure::Conversion("corrupt file".into());
        assert_eq!(e.to_string(), "corrupt file");
        assert_eq!(e.stage(), Stage::ConvertingDocument);
    }

    #[test]
    fn unexpected_failure_hides_detail() {
        let e = SubmissionFailure::Unexpected {
            detail: "index out of bounds".into(),
        };
        assert_eq!(e.to_string(), "Unexpected error occurred");
    }

    #[test]
    fn feedback_failures_belong_to_final_stage() {
        let parse = SubmissionFailure::FeedbackParse {
            detail: "expected value".into(),
        };
        assert_eq!(parse.stage(), Stage::PersistingFinal);
        assert_eq!(SubmissionFailure::FinalPersist.stage(), Stage::PersistingFinal);
    }

    #[test]
    fn store_error_wraps_into_review_error() {
        let e: ReviewError = StoreError::NotFound("abc/resume.pdf".into()).into();
        assert!(e.to_string().contains("abc/resume.pdf"), "got: {e}");
    }

    #[test]
    fn timeout_display() {
        let e = AnalysisError::Timeout { secs: 90 };
        assert!(e.to_string().contains("90s"));
    }
}
