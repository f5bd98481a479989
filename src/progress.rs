//! Progress reporting for submissions.
//!
//! The pipeline keeps no UI state of its own. It reports to an
//! [`Arc<dyn SubmissionProgressCallback>`], either the one configured via
//! [`crate::config::ReviewConfigBuilder::progress_callback`] or one passed to
//! [`crate::ResumePipeline::submit_with`].
//!
//! For every submission the callback sees, in order:
//!
//! 1. `on_processing_changed(true)`
//! 2. `on_status` once per stage that has a status text, then once more with
//!    either the completion text or the failure text
//! 3. `on_processing_changed(false)` once no submission of the pipeline is
//!    still running; the flag is pipeline-wide, so an observer shared by
//!    overlapping submissions sees `false` only after the last one ends
//! 4. `on_outcome` with the terminal outcome
//!
//! # Example
//!
//! ```rust
//! use resume_feedback::{SubmissionProgressCallback, ReviewConfig, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStatus;
//!
//! impl SubmissionProgressCallback for PrintStatus {
//!     fn on_status(&self, _stage: Stage, text: &str) {
//!         eprintln!("{text}");
//!     }
//! }
//!
//! let config = ReviewConfig::builder()
//!     .progress_callback(Arc::new(PrintStatus) as Arc<dyn SubmissionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::Stage;
use crate::submit::SubmissionOutcome;
use std::sync::Arc;
use tokio::sync::watch;

/// Receives events as a submission moves through its stages.
///
/// Implementations must be `Send + Sync`: several submissions may run at
/// once and report from different tasks. All methods default to no-ops.
pub trait SubmissionProgressCallback: Send + Sync {
    /// The submission started (`true`) or ended (`false`).
    fn on_processing_changed(&self, processing: bool) {
        let _ = processing;
    }

    /// A human-readable status line.
    ///
    /// # Arguments
    /// * `stage`: stage being entered, or `Succeeded` / `Failed`
    /// * `text`: the text to display
    fn on_status(&self, stage: Stage, text: &str) {
        let _ = (stage, text);
    }

    /// The submission finished; called after processing has been cleared.
    fn on_outcome(&self, outcome: &SubmissionOutcome) {
        let _ = outcome;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SubmissionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReviewConfig`].
pub type ProgressCallback = Arc<dyn SubmissionProgressCallback>;

/// Snapshot of what a UI shows for a submission form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub processing: bool,
    pub status_text: String,
}

/// Publishes the latest [`SubmissionStatus`] on a `tokio::sync::watch`
/// channel, for observers that only care about the current state.
pub struct WatchProgress {
    tx: watch::Sender<SubmissionStatus>,
}

impl WatchProgress {
    pub fn new() -> (Self, watch::Receiver<SubmissionStatus>) {
        let (tx, rx) = watch::channel(SubmissionStatus::default());
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.tx.subscribe()
    }

    /// The status as of now.
    pub fn current(&self) -> SubmissionStatus {
        self.tx.borrow().clone()
    }
}

impl SubmissionProgressCallback for WatchProgress {
    fn on_processing_changed(&self, processing: bool) {
        self.tx.send_modify(|s| s.processing = processing);
    }

    fn on_status(&self, _stage: Stage, text: &str) {
        self.tx.send_modify(|s| s.status_text = text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallback {
        statuses: AtomicUsize,
        toggles: AtomicUsize,
    }

    impl SubmissionProgressCallback for CountingCallback {
        fn on_processing_changed(&self, _processing: bool) {
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }

        fn on_status(&self, _stage: Stage, _text: &str) {
            self.statuses.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_processing_changed(true);
        cb.on_status(Stage::UploadingDocument, "Uploading the file...");
        cb.on_processing_changed(false);
    }

    #[test]
    fn counting_callback_receives_events() {
        let cb = CountingCallback {
            statuses: AtomicUsize::new(0),
            toggles: AtomicUsize::new(0),
        };
        cb.on_processing_changed(true);
        cb.on_status(Stage::UploadingDocument, "a");
        cb.on_status(Stage::ConvertingDocument, "b");
        cb.on_processing_changed(false);

        assert_eq!(cb.statuses.load(Ordering::SeqCst), 2);
        assert_eq!(cb.toggles.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn watch_progress_tracks_latest_state() {
        let (progress, rx) = WatchProgress::new();
        progress.on_processing_changed(true);
        progress.on_status(Stage::Analyzing, "Analyzing resume...");
        assert_eq!(
            *rx.borrow(),
            SubmissionStatus {
                processing: true,
                status_text: "Analyzing resume...".into()
            }
        );

        progress.on_processing_changed(false);
        assert!(!progress.current().processing);
        assert_eq!(progress.current().status_text, "Analyzing resume...");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_status(Stage::Succeeded, "Analysis complete...");
    }
}
