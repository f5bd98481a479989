//! The submission pipeline: one résumé in, one persisted review out.
//!
//! ## Stages
//!
//! ```text
//! Idle ─▶ UploadingDocument ─▶ ConvertingDocument ─▶ UploadingImage
//!      ─▶ PersistingDraft ─▶ Analyzing ─▶ PersistingFinal ─▶ Succeeded
//!                       (any failure) ─▶ Failed
//! ```
//!
//! Each stage awaits the previous one; there is no parallelism inside a
//! submission, no retry and no resume. A failed submission is re-run from
//! the start with a fresh id.
//!
//! ## Two-phase record
//!
//! The draft record (feedback `""`) is written before the analysis call and
//! the final record after it, both under `resume:<id>`. A failed or
//! abandoned analysis therefore leaves a readable draft behind instead of
//! nothing.
//!
//! ## Exit paths
//!
//! Stage failures become [`SubmissionOutcome::Failed`]; a panic in any stage
//! is caught once here and reported as "Unexpected error occurred". The
//! processing flag is held by a guard, so it is cleared on every path.

use crate::analysis::{AnalysisService, LlmAnalysisService};
use crate::config::ReviewConfig;
use crate::convert::{DocumentConverter, PdfiumConverter};
use crate::error::{ReviewError, StoreError, SubmissionFailure};
use crate::pipeline::Stage;
use crate::progress::{NoopProgressCallback, ProgressCallback, SubmissionProgressCallback};
use crate::prompts::prepare_instructions;
use crate::record::{list_records, load_record, SubmissionId, SubmissionRecord};
use crate::store::{is_valid_segment, Blob, FsObjectStore, FsRecordStore, ObjectStore, RecordStore, StoredObject};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A résumé plus the job it is being submitted for.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub document: Blob,
}

impl SubmissionRequest {
    pub fn new(
        company_name: impl Into<String>,
        job_title: impl Into<String>,
        job_description: impl Into<String>,
        document: Blob,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            job_title: job_title.into(),
            job_description: job_description.into(),
            document,
        }
    }
}

/// What a submission form holds; the file may not have been chosen yet.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: Option<Blob>,
}

/// Terminal state of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Succeeded(SubmissionRecord),
    Failed(SubmissionFailure),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded(_))
    }

    pub fn record(&self) -> Option<&SubmissionRecord> {
        match self {
            SubmissionOutcome::Succeeded(record) => Some(record),
            SubmissionOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SubmissionFailure> {
        match self {
            SubmissionOutcome::Succeeded(_) => None,
            SubmissionOutcome::Failed(failure) => Some(failure),
        }
    }

    /// The last status text shown for this outcome.
    pub fn status_text(&self) -> String {
        match self {
            SubmissionOutcome::Succeeded(_) => Stage::Succeeded
                .status_text()
                .unwrap_or_default()
                .to_string(),
            SubmissionOutcome::Failed(failure) => failure.to_string(),
        }
    }
}

/// Data carried from one stage to the next.
enum Step {
    UploadDocument,
    ConvertDocument {
        resume: StoredObject,
    },
    UploadImage {
        resume: StoredObject,
        image: Blob,
    },
    PersistDraft {
        resume: StoredObject,
        image: StoredObject,
    },
    Analyze {
        draft: SubmissionRecord,
        resume: StoredObject,
    },
    PersistFinal {
        draft: SubmissionRecord,
        answer: String,
    },
    Done(SubmissionRecord),
}

impl Step {
    fn stage(&self) -> Stage {
        match self {
            Step::UploadDocument => Stage::UploadingDocument,
            Step::ConvertDocument { .. } => Stage::ConvertingDocument,
            Step::UploadImage { .. } => Stage::UploadingImage,
            Step::PersistDraft { .. } => Stage::PersistingDraft,
            Step::Analyze { .. } => Stage::Analyzing,
            Step::PersistFinal { .. } => Stage::PersistingFinal,
            Step::Done(_) => Stage::Succeeded,
        }
    }
}

/// Marks a submission as in flight for as long as it lives.
///
/// The flag reported to observers is pipeline-wide: `true` while any
/// submission runs, `false` only once the last one has finished.
struct ProcessingGuard<'a> {
    in_flight: &'a AtomicUsize,
    progress: &'a dyn SubmissionProgressCallback,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(in_flight: &'a AtomicUsize, progress: &'a dyn SubmissionProgressCallback) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        progress.on_processing_changed(true);
        Self { in_flight, progress }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.progress.on_processing_changed(false);
        }
    }
}

/// Orchestrates upload, conversion, persistence and analysis of résumés.
pub struct ResumePipeline {
    objects: Arc<dyn ObjectStore>,
    converter: Arc<dyn DocumentConverter>,
    analysis: Arc<dyn AnalysisService>,
    records: Arc<dyn RecordStore>,
    response_format: String,
    progress: ProgressCallback,
    in_flight: AtomicUsize,
}

impl ResumePipeline {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        converter: Arc<dyn DocumentConverter>,
        analysis: Arc<dyn AnalysisService>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            objects,
            converter,
            analysis,
            records,
            response_format: "json".to_string(),
            progress: Arc::new(NoopProgressCallback),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Wire the default collaborators: filesystem stores under
    /// `config.storage_dir`, pdfium conversion, and an LLM analysis service.
    pub fn from_config(config: &ReviewConfig) -> Result<Self, ReviewError> {
        let provider = crate::analysis::resolve_provider(config)?;

        let objects: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(config.files_dir()));
        let records: Arc<dyn RecordStore> = Arc::new(FsRecordStore::new(config.records_dir()));
        let converter: Arc<dyn DocumentConverter> = Arc::new(PdfiumConverter::new(
            config.max_rendered_pixels,
            config.pdfium_lib_path.clone(),
        ));
        let analysis: Arc<dyn AnalysisService> = Arc::new(LlmAnalysisService::new(
            provider,
            Arc::clone(&objects),
            Arc::clone(&converter),
            config,
        ));

        let mut pipeline = Self::new(objects, converter, analysis, records)
            .with_response_format(config.response_format.clone());
        if let Some(ref cb) = config.progress_callback {
            pipeline = pipeline.with_progress(Arc::clone(cb));
        }
        Ok(pipeline)
    }

    /// Default observer used by [`ResumePipeline::submit`].
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Format requested from the model ("json" by default).
    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = format.into();
        self
    }

    /// `true` while at least one submission is running.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Read back one submission.
    pub async fn load(&self, id: &SubmissionId) -> Result<Option<SubmissionRecord>, StoreError> {
        load_record(self.records.as_ref(), id).await
    }

    /// Read back every submission.
    pub async fn list(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        list_records(self.records.as_ref()).await
    }

    /// Form entry point: does nothing without a file, or while another
    /// submission is in flight.
    pub async fn handle_submit(&self, form: SubmissionForm) -> Option<SubmissionOutcome> {
        let Some(document) = form.file else {
            debug!("Submit ignored: no file selected");
            return None;
        };
        if self.is_processing() {
            debug!("Submit ignored: a submission is already in flight");
            return None;
        }

        let request = SubmissionRequest {
            company_name: form.company_name,
            job_title: form.job_title,
            job_description: form.job_description,
            document,
        };
        Some(self.submit(request).await)
    }

    /// Run one submission, reporting to the configured observer.
    pub async fn submit(&self, request: SubmissionRequest) -> SubmissionOutcome {
        let progress = Arc::clone(&self.progress);
        self.submit_with(request, progress.as_ref()).await
    }

    /// Run one submission, reporting to `progress`.
    ///
    /// Never fails: every error ends up in the returned outcome.
    pub async fn submit_with(
        &self,
        request: SubmissionRequest,
        progress: &dyn SubmissionProgressCallback,
    ) -> SubmissionOutcome {
        let start = Instant::now();
        let id = SubmissionId::generate();
        info!(
            "Submission {} started: {} ({} bytes) for '{}' at '{}'",
            id,
            request.document.name,
            request.document.len(),
            request.job_title,
            request.company_name
        );

        let outcome = {
            let _guard = ProcessingGuard::acquire(&self.in_flight, progress);

            let result = AssertUnwindSafe(self.run(id, &request, progress))
                .catch_unwind()
                .await;

            let outcome = match result {
                Ok(Ok(record)) => SubmissionOutcome::Succeeded(record),
                Ok(Err(failure)) => {
                    warn!(
                        "Submission {} failed while {}: {}",
                        id,
                        failure.stage(),
                        failure
                    );
                    SubmissionOutcome::Failed(failure)
                }
                Err(panic) => {
                    let detail = panic_detail(panic.as_ref());
                    error!("Submission {} hit an unexpected fault: {}", id, detail);
                    SubmissionOutcome::Failed(SubmissionFailure::Unexpected { detail })
                }
            };

            let final_stage = if outcome.is_success() {
                Stage::Succeeded
            } else {
                Stage::Failed
            };
            progress.on_status(final_stage, &outcome.status_text());
            outcome
        };

        info!(
            "Submission {} finished in {}ms: {}",
            id,
            start.elapsed().as_millis(),
            outcome.status_text()
        );
        progress.on_outcome(&outcome);
        outcome
    }

    /// Drive the stages from `UploadingDocument` to a finished record.
    async fn run(
        &self,
        id: SubmissionId,
        request: &SubmissionRequest,
        progress: &dyn SubmissionProgressCallback,
    ) -> Result<SubmissionRecord, SubmissionFailure> {
        let mut step = Step::UploadDocument;
        loop {
            step = match step {
                Step::Done(record) => return Ok(record),
                step => {
                    let stage = step.stage();
                    if let Some(text) = stage.status_text() {
                        progress.on_status(stage, text);
                    }
                    debug!("Submission {}: {}", id, stage);
                    self.advance(id, request, step).await?
                }
            };
        }
    }

    /// Perform the action of `step`'s stage and return the next step.
    async fn advance(
        &self,
        id: SubmissionId,
        request: &SubmissionRequest,
        step: Step,
    ) -> Result<Step, SubmissionFailure> {
        match step {
            Step::UploadDocument => {
                let blob = request
                    .document
                    .renamed(scoped_name(&id, request.document.file_name(), "resume.pdf"));
                let resume = self.objects.upload(&blob).await.map_err(|e| {
                    warn!("Upload of {} failed: {}", blob.name, e);
                    SubmissionFailure::DocumentUpload
                })?;
                Ok(Step::ConvertDocument { resume })
            }

            Step::ConvertDocument { resume } => {
                let image = self
                    .converter
                    .convert(&request.document)
                    .await
                    .into_image()
                    .map_err(|message| {
                        warn!("Conversion of {} failed: {}", request.document.name, message);
                        SubmissionFailure::Conversion(message)
                    })?;
                Ok(Step::UploadImage { resume, image })
            }

            Step::UploadImage { resume, image } => {
                let blob = image.renamed(scoped_name(&id, image.file_name(), "resume.png"));
                let image = self.objects.upload(&blob).await.map_err(|e| {
                    warn!("Upload of {} failed: {}", blob.name, e);
                    SubmissionFailure::ImageUpload
                })?;
                Ok(Step::PersistDraft { resume, image })
            }

            Step::PersistDraft { resume, image } => {
                let draft = SubmissionRecord::draft(
                    id,
                    resume.path.clone(),
                    image.path,
                    request.company_name.clone(),
                    request.job_title.clone(),
                    request.job_description.clone(),
                );
                self.records
                    .set(&draft.key(), &draft.to_json())
                    .await
                    .map_err(|e| {
                        warn!("Draft write for {} failed: {}", id, e);
                        SubmissionFailure::DraftPersist
                    })?;
                Ok(Step::Analyze { draft, resume })
            }

            Step::Analyze { draft, resume } => {
                let instructions = prepare_instructions(
                    &request.job_title,
                    &request.job_description,
                    &self.response_format,
                );
                let answer = match self.analysis.feedback(&resume, &instructions).await {
                    Ok(Some(response)) => response.into_text(),
                    Ok(None) => None,
                    Err(e) => {
                        warn!("Analysis of {} failed: {}", resume.path, e);
                        None
                    }
                };
                let answer = answer.ok_or(SubmissionFailure::Analysis)?;
                Ok(Step::PersistFinal { draft, answer })
            }

            Step::PersistFinal { draft, answer } => {
                let record = draft.with_feedback(&answer).map_err(|failure| {
                    if let SubmissionFailure::FeedbackParse { ref detail } = failure {
                        warn!("Feedback for {} is not valid JSON: {}", id, detail);
                    }
                    failure
                })?;
                self.records
                    .set(&record.key(), &record.to_json())
                    .await
                    .map_err(|e| {
                        warn!("Final write for {} failed: {}", id, e);
                        SubmissionFailure::FinalPersist
                    })?;
                Ok(Step::Done(record))
            }

            Step::Done(record) => Ok(Step::Done(record)),
        }
    }
}

/// `<id>/<name>`, falling back to `<id>/<fallback>` for unusable names.
fn scoped_name(id: &SubmissionId, name: &str, fallback: &str) -> String {
    let name = if is_valid_segment(name) { name } else { fallback };
    format!("{id}/{name}")
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn scoped_names_live_under_the_id() {
        let id = SubmissionId::generate();
        assert_eq!(scoped_name(&id, "cv.pdf", "resume.pdf"), format!("{id}/cv.pdf"));
        assert_eq!(scoped_name(&id, "..", "resume.pdf"), format!("{id}/resume.pdf"));
        assert_eq!(scoped_name(&id, "", "resume.png"), format!("{id}/resume.png"));
    }

    #[test]
    fn panic_detail_reads_both_payload_kinds() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_detail(a.as_ref()), "boom");
        assert_eq!(panic_detail(b.as_ref()), "bang");
        assert_eq!(panic_detail(c.as_ref()), "unknown panic");
    }

    #[derive(Default)]
    struct Toggles(Mutex<Vec<bool>>);

    impl SubmissionProgressCallback for Toggles {
        fn on_processing_changed(&self, processing: bool) {
            self.0.lock().unwrap().push(processing);
        }
    }

    #[test]
    fn guard_clears_flag_on_drop() {
        let counter = AtomicUsize::new(0);
        let toggles = Toggles::default();
        {
            let _guard = ProcessingGuard::acquire(&counter, &toggles);
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(*toggles.0.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn overlapping_guards_report_idle_only_after_the_last() {
        let counter = AtomicUsize::new(0);
        let toggles = Toggles::default();

        let first = ProcessingGuard::acquire(&counter, &toggles);
        let second = ProcessingGuard::acquire(&counter, &toggles);
        drop(first);
        assert_eq!(*toggles.0.lock().unwrap(), vec![true, true]);

        drop(second);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(*toggles.0.lock().unwrap(), vec![true, true, false]);
    }

    #[test]
    fn outcome_status_texts() {
        let ok = SubmissionOutcome::Succeeded(SubmissionRecord::draft(
            SubmissionId::generate(),
            "a",
            "b",
            "",
            "",
            "",
        ));
        assert_eq!(ok.status_text(), "Analysis complete...");
        let failed = SubmissionOutcome::Failed(SubmissionFailure::ImageUpload);
        assert_eq!(failed.status_text(), "Error: Failed to upload image");
        assert!(failed.record().is_none());
    }
}
