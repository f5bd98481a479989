//! Submission records: identity, shape, and read-back.
//!
//! A [`SubmissionRecord`] is persisted twice per successful submission under
//! the key `resume:<id>`: once as a draft before analysis (feedback `""`),
//! once more with the parsed feedback attached. The JSON field names are
//! camelCase so records stay readable by any other client of the same store.

use crate::error::{StoreError, SubmissionFailure};
use crate::pipeline::feedback::parse_feedback;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Fixed namespace of record keys.
pub const RECORD_NAMESPACE: &str = "resume";

/// Unique identifier of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// A fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The record-store key for this submission: `resume:<id>`.
    pub fn record_key(&self) -> String {
        format!("{RECORD_NAMESPACE}:{self}")
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SubmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// The persisted unit of state for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// `""` until analysis completes, then the parsed feedback document.
    #[serde(default = "empty_feedback")]
    pub feedback: Value,
}

fn empty_feedback() -> Value {
    Value::String(String::new())
}

impl SubmissionRecord {
    /// The pre-analysis snapshot: every field set, feedback empty.
    pub fn draft(
        id: SubmissionId,
        resume_path: impl Into<String>,
        image_path: impl Into<String>,
        company_name: impl Into<String>,
        job_title: impl Into<String>,
        job_description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            resume_path: resume_path.into(),
            image_path: image_path.into(),
            company_name: company_name.into(),
            job_title: job_title.into(),
            job_description: job_description.into(),
            feedback: empty_feedback(),
        }
    }

    /// The post-analysis snapshot built from the model's raw answer.
    pub fn with_feedback(mut self, raw: &str) -> Result<Self, SubmissionFailure> {
        self.feedback = parse_feedback(raw)?;
        Ok(self)
    }

    pub fn key(&self) -> String {
        self.id.record_key()
    }

    /// `false` for drafts (and for feedback that parsed to an empty value).
    pub fn has_feedback(&self) -> bool {
        match &self.feedback {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// The feedback read as the schema requested by
    /// [`crate::prompts::prepare_instructions`], when it matches.
    pub fn resume_feedback(&self) -> Option<ResumeFeedback> {
        if !self.has_feedback() {
            return None;
        }
        serde_json::from_value(self.feedback.clone()).ok()
    }

    pub fn to_json(&self) -> String {
        // Serialising plain strings and a `Value` cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ── Typed feedback view ──────────────────────────────────────────────────

/// Structured review of a résumé against a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFeedback {
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: CategoryFeedback,
    pub tone_and_style: CategoryFeedback,
    pub content: CategoryFeedback,
    pub structure: CategoryFeedback,
    pub skills: CategoryFeedback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub score: u32,
    #[serde(default)]
    pub tips: Vec<FeedbackTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

impl ResumeFeedback {
    /// Categories in display order with their labels.
    pub fn categories(&self) -> [(&'static str, &CategoryFeedback); 5] {
        [
            ("ATS", &self.ats),
            ("Tone & Style", &self.tone_and_style),
            ("Content", &self.content),
            ("Structure", &self.structure),
            ("Skills", &self.skills),
        ]
    }
}

// ── Read-back ────────────────────────────────────────────────────────────

/// Load the record of one submission.
pub async fn load_record(
    store: &dyn RecordStore,
    id: &SubmissionId,
) -> Result<Option<SubmissionRecord>, StoreError> {
    let key = id.record_key();
    match store.get(&key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { key, source }),
        None => Ok(None),
    }
}

/// Load every submission record, skipping (and logging) unreadable ones.
pub async fn list_records(store: &dyn RecordStore) -> Result<Vec<SubmissionRecord>, StoreError> {
    let prefix = format!("{RECORD_NAMESPACE}:");
    let mut records = Vec::new();

    for key in store.list(&prefix).await? {
        let Some(raw) = store.get(&key).await? else {
            continue;
        };
        match serde_json::from_str::<SubmissionRecord>(&raw) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping corrupt record {}: {}", key, e),
        }
    }

    Ok(records)
}
