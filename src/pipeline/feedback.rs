//! Feedback parsing: the model's raw answer → a JSON document.
//!
//! Models asked for "JSON only" still sometimes wrap the answer in a
//! ```` ```json ```` fence. The fence is stripped before parsing; anything
//! else that is not valid JSON fails the submission rather than being stored
//! as a string.

use crate::error::SubmissionFailure;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

/// Remove a single Markdown code fence wrapping the whole answer.
pub fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Parse the analysis answer as structured feedback.
pub fn parse_feedback(raw: &str) -> Result<Value, SubmissionFailure> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| SubmissionFailure::FeedbackParse {
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_parses_unchanged() {
        assert_eq!(parse_feedback(r#"{"score":80}"#).unwrap(), json!({"score": 80}));
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"score\": 91}\n```";
        assert_eq!(parse_feedback(raw).unwrap(), json!({"score": 91}));

        let bare = "```\n[1, 2]\n```\n";
        assert_eq!(parse_feedback(bare).unwrap(), json!([1, 2]));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_feedback("  \n{\"a\":1}\n ").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn prose_is_rejected() {
        let err = parse_feedback("Here is my review: looks good").unwrap_err();
        assert!(matches!(err, SubmissionFailure::FeedbackParse { .. }));
    }

    #[test]
    fn strip_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("{\"x\":1}"), "{\"x\":1}");
    }
}
