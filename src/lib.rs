//! # resume-feedback
//!
//! Submit a résumé together with the job it targets, get back structured ATS
//! feedback from a vision language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! résumé (PDF) + company / job title / job description
//!  │
//!  ├─ 1. Upload    store the original under <id>/<name>
//!  ├─ 2. Convert   rasterise page 1 via pdfium (spawn_blocking)
//!  ├─ 3. Upload    store the PNG preview
//!  ├─ 4. Draft     write resume:<id> with empty feedback
//!  ├─ 5. Analyze   send preview + instructions to gpt-4.1-nano / claude / …
//!  └─ 6. Final     parse the JSON answer, rewrite resume:<id>
//! ```
//!
//! Each step runs only after the previous one succeeded. Any failure stops
//! the submission with a single user-facing message, see
//! [`SubmissionFailure`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_feedback::{ResumePipeline, ReviewConfig, SubmissionOutcome, SubmissionRequest};
//! use resume_feedback::store::Blob;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let pipeline = ResumePipeline::from_config(&ReviewConfig::default())?;
//!     let document = Blob::from_bytes("resume.pdf", std::fs::read("resume.pdf")?);
//!     let request = SubmissionRequest::new("Acme", "Engineer", "Build things", document);
//!
//!     match pipeline.submit(request).await {
//!         SubmissionOutcome::Succeeded(record) => println!("{}", record.to_json()),
//!         SubmissionOutcome::Failed(failure) => eprintln!("{failure}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-feedback` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume-feedback = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod store;
pub mod stream;
pub mod submit;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{AnalysisResponse, AnalysisService, LlmAnalysisService};
pub use config::{ReviewConfig, ReviewConfigBuilder};
pub use convert::{ConversionResult, DocumentConverter, PdfiumConverter};
pub use error::{AnalysisError, ReviewError, StoreError, SubmissionFailure};
pub use pipeline::input::load_document;
pub use pipeline::Stage;
pub use progress::{
    NoopProgressCallback, ProgressCallback, SubmissionProgressCallback, SubmissionStatus,
    WatchProgress,
};
pub use record::{ResumeFeedback, SubmissionId, SubmissionRecord};
pub use stream::{submit_stream, StatusEvent, StatusStream};
pub use submit::{ResumePipeline, SubmissionForm, SubmissionOutcome, SubmissionRequest};
