//! Configuration for the résumé feedback service.
//!
//! Everything that wires the default collaborators together is controlled
//! through [`ReviewConfig`], built via its [`ReviewConfigBuilder`]. Callers
//! set only what they care about and rely on documented defaults for the rest.

use crate::error::ReviewError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for [`crate::ResumePipeline::from_config`].
///
/// # Example
/// ```rust
/// use resume_feedback::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .storage_dir("/var/lib/resume-feedback")
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// Root directory of the filesystem stores. Default: `./resume-data`.
    ///
    /// Uploaded files go to `files/`, records to `records/`.
    pub storage_dir: PathBuf,

    /// Longest edge of the rendered preview in pixels. Default: 2000.
    ///
    /// Large enough for a model to read 9 pt text on a letter-size page,
    /// small enough to stay well under vision API upload limits.
    pub max_rendered_pixels: u32,

    /// Explicit path to the pdfium shared library. If None, the system
    /// library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses the default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps scores stable between two runs on the same
    /// résumé.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A full five-category review with explanations runs 1 500–2 500 tokens;
    /// truncation produces unparsable JSON, so leave headroom.
    pub max_tokens: usize,

    /// Timeout of one analysis call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL documents in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Format the model is asked to answer in. Default: "json".
    pub response_format: String,

    /// Default observer for [`crate::ResumePipeline::submit`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("resume-data"),
            max_rendered_pixels: 2000,
            pdfium_lib_path: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            response_format: "json".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("storage_dir", &self.storage_dir)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("response_format", &self.response_format)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SubmissionProgressCallback>"),
            )
            .finish()
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn files_dir(&self) -> PathBuf {
        self.storage_dir.join("files")
    }

    pub fn records_dir(&self) -> PathBuf {
        self.storage_dir.join("records")
    }
}

/// Builder for [`ReviewConfig`].
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl fmt::Debug for ReviewConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReviewConfigBuilder {
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = dir.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn response_format(mut self, format: impl Into<String>) -> Self {
        self.config.response_format = format.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ReviewError> {
        let c = &self.config;
        if c.storage_dir.as_os_str().is_empty() {
            return Err(ReviewError::InvalidConfig(
                "storage directory must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ReviewError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(ReviewError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.response_format.trim().is_empty() {
            return Err(ReviewError::InvalidConfig(
                "response format must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ReviewConfig::default();
        assert_eq!(c.max_rendered_pixels, 2000);
        assert_eq!(c.response_format, "json");
        assert_eq!(c.files_dir(), PathBuf::from("resume-data/files"));
        assert_eq!(c.records_dir(), PathBuf::from("resume-data/records"));
    }

    #[test]
    fn builder_clamps_ranges() {
        let c = ReviewConfig::builder()
            .temperature(5.0)
            .max_rendered_pixels(10)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(ReviewConfig::builder().max_tokens(0).build().is_err());
        assert!(ReviewConfig::builder().api_timeout_secs(0).build().is_err());
        assert!(ReviewConfig::builder().storage_dir("").build().is_err());
        assert!(ReviewConfig::builder().response_format(" ").build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let s = format!("{:?}", ReviewConfig::default());
        assert!(s.contains("storage_dir"));
        assert!(s.contains("provider: None"));
    }
}
