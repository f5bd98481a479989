//! Résumé analysis: the [`AnalysisService`] capability and its LLM backend.
//!
//! The pipeline hands the service a stored-document reference plus an
//! instruction text and gets back a chat-style response whose content is
//! either a plain string or a list of content blocks. [`MessageContent`]
//! models both shapes; [`AnalysisResponse::into_text`] resolves them once,
//! at the boundary, so nothing downstream branches on shape.

use crate::config::ReviewConfig;
use crate::convert::DocumentConverter;
use crate::error::{AnalysisError, ReviewError};
use crate::pipeline::encode;
use crate::prompts::ANALYST_SYSTEM_PROMPT;
use crate::store::{ObjectStore, StoredObject};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Response of an analysis call: `{ message: { content } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub message: AnalysisMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMessage {
    pub content: MessageContent,
}

/// Message content: a plain string or a sequence of content blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: Some(text.into()),
        }
    }
}

impl AnalysisResponse {
    /// A response carrying plain string content.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: AnalysisMessage {
                content: MessageContent::Text(content.into()),
            },
        }
    }

    /// A response carrying content blocks.
    pub fn blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            message: AnalysisMessage {
                content: MessageContent::Blocks(blocks),
            },
        }
    }

    /// The textual answer: the string itself, or the text of the first
    /// block. `None` when there is no first block or it carries no text.
    pub fn into_text(self) -> Option<String> {
        match self.message.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks.into_iter().next().and_then(|b| b.text),
        }
    }
}

/// Produces feedback for a stored résumé.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// `Ok(None)` means the service answered with nothing usable.
    async fn feedback(
        &self,
        document: &StoredObject,
        instructions: &str,
    ) -> Result<Option<AnalysisResponse>, AnalysisError>;
}

// ── LLM backend ──────────────────────────────────────────────────────────

/// Sends the résumé (as an image) and the instructions to a vision LLM.
///
/// PDFs are rasterised through the configured [`DocumentConverter`]; PNG and
/// JPEG documents are sent as they are.
pub struct LlmAnalysisService {
    provider: Arc<dyn LLMProvider>,
    store: Arc<dyn ObjectStore>,
    converter: Arc<dyn DocumentConverter>,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl LlmAnalysisService {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        store: Arc<dyn ObjectStore>,
        converter: Arc<dyn DocumentConverter>,
        config: &ReviewConfig,
    ) -> Self {
        Self {
            provider,
            store,
            converter,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }

    /// Fetch the document and return PNG/JPEG bytes plus their MIME type.
    async fn document_image(&self, path: &str) -> Result<(Vec<u8>, String), AnalysisError> {
        let blob = self
            .store
            .read(path)
            .await
            .map_err(|source| AnalysisError::DocumentUnavailable {
                path: path.to_string(),
                source,
            })?;

        if blob.is_image() {
            let mime = blob.content_type.clone();
            return Ok((blob.bytes, mime));
        }
        if !blob.is_pdf() {
            return Err(AnalysisError::UnsupportedDocument {
                path: path.to_string(),
            });
        }

        let image = self
            .converter
            .convert(&blob)
            .await
            .into_image()
            .map_err(|detail| AnalysisError::Preparation {
                path: path.to_string(),
                detail,
            })?;
        Ok((image.bytes, image.content_type))
    }
}

#[async_trait]
impl AnalysisService for LlmAnalysisService {
    async fn feedback(
        &self,
        document: &StoredObject,
        instructions: &str,
    ) -> Result<Option<AnalysisResponse>, AnalysisError> {
        let start = Instant::now();
        let (bytes, mime) = self.document_image(&document.path).await?;

        let messages = vec![
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user_with_images(instructions, vec![encode::image_data(&bytes, &mime)]),
        ];
        let options = self.build_options();

        let call = self.provider.chat(&messages, Some(&options));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| AnalysisError::Timeout {
                secs: self.timeout_secs,
            })?
            .map_err(|e| AnalysisError::Llm {
                message: e.to_string(),
            })?;

        debug!(
            "Analysis of {}: {} input tokens, {} output tokens, {:?}",
            document.path,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(AnalysisResponse::text(response.content)))
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReviewError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. pre-built provider in the config
/// 2. named provider (+ model, default `gpt-4.1-nano`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set
/// 4. `OPENAI_API_KEY` present → OpenAI
/// 5. full auto-detection from the environment
pub fn resolve_provider(config: &ReviewConfig) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReviewError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    info!("Auto-detected LLM provider");
    Ok(llm_provider)
}
