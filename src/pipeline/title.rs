//! Title resolution: read a section title off the citing work's first page.
//!
//! ## Source
//!
//! Citing works are scanned theses, conference papers and book chapters; the
//! PDF metadata title is usually empty or wrong and the text layer is often
//! missing. The first page image is the only reliable source, so it is sent
//! to a multimodal model with a short "return only the main heading"
//! instruction.
//!
//! ## Failure Policy
//!
//! A title is never fatal. Missing provider, API errors after retries,
//! timeouts and empty answers all produce the deterministic fallback title
//! `"<title unavailable> - <file name>"`, so a report always completes.
//!
//! ## Retry Strategy
//!
//! API errors are retried with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`). A timeout is not retried.

use crate::config::{ReportConfig, TitleMode};
use crate::error::TitleError;
use crate::labels::ReportLabels;
use crate::model::{PageImage, TitleSource};
use crate::pipeline::{encode, postprocess};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Anything that can answer "what is the heading on this page?".
///
/// The returned text is the raw answer; cleanup happens in the resolver.
pub trait VisionModel: Send + Sync {
    fn extract<'a>(
        &'a self,
        image: &'a PageImage,
        instruction: &'a str,
    ) -> BoxFuture<'a, Result<String, TitleError>>;
}

/// [`VisionModel`] backed by an `edgequake-llm` chat provider.
pub struct LlmVisionModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmVisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ReportConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl VisionModel for LlmVisionModel {
    fn extract<'a>(
        &'a self,
        image: &'a PageImage,
        instruction: &'a str,
    ) -> BoxFuture<'a, Result<String, TitleError>> {
        Box::pin(async move {
            // Instruction and image travel in one user turn.
            let messages = vec![ChatMessage::user_with_images(
                instruction,
                vec![encode::to_image_data(image)],
            )];
            let options = self.options();

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| TitleError::Api(e.to_string()))?;

            debug!(
                "Title request: {} input tokens, {} output tokens",
                response.prompt_tokens, response.completion_tokens
            );
            Ok(response.content)
        })
    }
}

/// A section title and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub title: String,
    pub source: TitleSource,
}

/// Turns a citing work's first page into a section title.
pub struct TitleResolver {
    mode: TitleMode,
    model: Option<Arc<dyn VisionModel>>,
    instruction: String,
    labels: ReportLabels,
    timeout_ms: u64,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl TitleResolver {
    /// Build a resolver around an explicit model (or none).
    pub fn new(model: Option<Arc<dyn VisionModel>>, config: &ReportConfig) -> Self {
        Self {
            mode: config.title_mode,
            model,
            instruction: config.instruction().to_string(),
            labels: config.labels(),
            timeout_ms: config.request_timeout_ms,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Build a resolver, resolving the model from `config` and the environment.
    ///
    /// A provider that cannot be created is logged and the resolver degrades
    /// to fallback titles.
    pub fn from_config(config: &ReportConfig) -> Self {
        let model = match config.title_mode {
            TitleMode::Resolve => resolve_vision_model(config),
            TitleMode::Fallback | TitleMode::FileName => None,
        };
        Self::new(model, config)
    }

    /// Whether [`Self::resolve`] will look at the page image at all.
    ///
    /// Lets the caller skip the detection render entirely.
    pub fn wants_image(&self) -> bool {
        self.mode == TitleMode::Resolve && self.model.is_some()
    }

    /// Title for the pair named `name`, using `image` when available.
    pub async fn resolve(&self, image: Option<&PageImage>, name: &str) -> ResolvedTitle {
        if self.mode == TitleMode::FileName {
            return ResolvedTitle {
                title: name.to_string(),
                source: TitleSource::FileName,
            };
        }

        if self.mode == TitleMode::Resolve {
            match image {
                Some(image) => match self.extract(image).await {
                    Ok(title) => {
                        info!("'{}': title resolved → {}", name, title);
                        return ResolvedTitle {
                            title,
                            source: TitleSource::Model,
                        };
                    }
                    Err(e) => warn!("'{}': title unavailable: {}", name, e),
                },
                None => warn!("'{}': title unavailable: first page did not render", name),
            }
        }

        ResolvedTitle {
            title: self.labels.fallback_title(name),
            source: TitleSource::Fallback,
        }
    }

    /// Ask the model, with timeout and retries, and clean the answer.
    pub async fn extract(&self, image: &PageImage) -> Result<String, TitleError> {
        let model = self.model.as_ref().ok_or(TitleError::NotConfigured)?;
        let mut last_err = TitleError::NotConfigured;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "Title: retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let call = model.extract(image, &self.instruction);
            match tokio::time::timeout(Duration::from_millis(self.timeout_ms), call).await {
                Err(_) => {
                    return Err(TitleError::Timeout {
                        ms: self.timeout_ms,
                    })
                }
                Ok(Ok(raw)) => return postprocess::clean_title(&raw),
                Ok(Err(e)) => {
                    warn!("Title: attempt {} failed: {}", attempt + 1, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// Resolve the vision model, from most-specific to least-specific:
///
/// 1. `config.vision_model`
/// 2. `config.provider`
/// 3. `config.provider_name` + `config.model` (default [`DEFAULT_MODEL`])
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set
/// 5. `OPENAI_API_KEY` → OpenAI
/// 6. [`ProviderFactory::from_env`] auto-detection
pub fn resolve_vision_model(config: &ReportConfig) -> Option<Arc<dyn VisionModel>> {
    if let Some(model) = &config.vision_model {
        return Some(Arc::clone(model));
    }

    match resolve_provider(config) {
        Ok(provider) => {
            info!("Title resolution enabled");
            Some(Arc::new(LlmVisionModel::new(provider, config)))
        }
        Err(e) => {
            warn!("No vision model available, using fallback titles: {}", e);
            None
        }
    }
}

fn resolve_provider(config: &ReportConfig) -> Result<Arc<dyn LLMProvider>, String> {
    if let Some(provider) = &config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(name) = &config.provider_name {
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

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    ProviderFactory::from_env()
        .map(|(llm, _embedding)| llm)
        .map_err(|e| format!("no provider could be auto-detected: {e}"))
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, String> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| format!("{name}/{model}: {e}"))
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, saturating.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}
