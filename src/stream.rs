//! Streaming submission API: emit status events as they happen.
//!
//! [`submit_stream`] runs a submission on its own task and yields the same
//! events a [`SubmissionProgressCallback`] would receive, in the same order,
//! ending with [`StatusEvent::Finished`]. Useful for pushing progress to a
//! client (SSE, websocket) without implementing the callback trait.

use crate::pipeline::Stage;
use crate::progress::SubmissionProgressCallback;
use crate::submit::{ResumePipeline, SubmissionOutcome, SubmissionRequest};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

/// One event of a running submission.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    ProcessingChanged(bool),
    Status { stage: Stage, text: String },
    Finished(SubmissionOutcome),
}

/// A boxed stream of status events.
pub type StatusStream = Pin<Box<dyn Stream<Item = StatusEvent> + Send>>;

/// Forwards callback events into a channel.
struct ChannelProgress {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelProgress {
    fn send(&self, event: StatusEvent) {
        // The receiver is gone when the caller dropped the stream; the
        // submission still runs to completion.
        if self.tx.send(event).is_err() {
            debug!("Status stream dropped; event discarded");
        }
    }
}

impl SubmissionProgressCallback for ChannelProgress {
    fn on_processing_changed(&self, processing: bool) {
        self.send(StatusEvent::ProcessingChanged(processing));
    }

    fn on_status(&self, stage: Stage, text: &str) {
        self.send(StatusEvent::Status {
            stage,
            text: text.to_string(),
        });
    }

    fn on_outcome(&self, outcome: &SubmissionOutcome) {
        self.send(StatusEvent::Finished(outcome.clone()));
    }
}

/// Start a submission and stream its events.
///
/// Must be called within a Tokio runtime. The stream ends after
/// [`StatusEvent::Finished`].
///
/// # Example
/// ```rust,no_run
/// use resume_feedback::{submit_stream, ResumePipeline, ReviewConfig, StatusEvent, SubmissionRequest};
/// use resume_feedback::store::Blob;
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Arc::new(ResumePipeline::from_config(&ReviewConfig::default())?);
/// let document = Blob::from_bytes("resume.pdf", std::fs::read("resume.pdf")?);
/// let request = SubmissionRequest::new("Acme", "Engineer", "Build things", document);
///
/// let mut events = submit_stream(pipeline, request);
/// while let Some(event) = events.next().await {
///     if let StatusEvent::Status { text, .. } = event {
///         println!("{text}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn submit_stream(pipeline: Arc<ResumePipeline>, request: SubmissionRequest) -> StatusStream {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let progress = ChannelProgress { tx };
        pipeline.submit_with(request, &progress).await;
    });
    Box::pin(UnboundedReceiverStream::new(rx))
}
