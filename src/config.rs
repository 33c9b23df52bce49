//! Configuration types for report generation.
//!
//! All run behaviour is controlled through [`ReportConfig`], built via its
//! [`ReportConfigBuilder`]. The detection/display scales and the title mode
//! are plain fields rather than separate code paths, so every entry point
//! (library, stream, CLI) runs the same assembler.

use crate::assemble::CancelFlag;
use crate::error::ReportError;
use crate::labels::ReportLabels;
use crate::pipeline::title::VisionModel;
use crate::progress::ProgressCallback;
use crate::prompts;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Largest accepted render scale. A4 at 8× is already ~4 800 × 6 700 px.
const MAX_SCALE: f32 = 8.0;

/// Configuration for one report run.
///
/// # Example
/// ```rust
/// use citation_report::{ExportFormat, ReportConfig};
///
/// let config = ReportConfig::builder()
///     .display_scale(2.0)
///     .use_title_resolution(false)
///     .format(ExportFormat::Pdf)
///     .build()
///     .unwrap();
/// assert_eq!(config.display_scale, 2.0);
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// How each section's title is obtained. Default: [`TitleMode::Resolve`].
    pub title_mode: TitleMode,

    /// Scale for the citing page 1 render sent to the vision model. Default: 1.5.
    ///
    /// Only the model sees this image, so it favours a small upload over
    /// fidelity.
    pub detection_scale: f32,

    /// Scale for every image that ends up in the document. Default: 1.8.
    pub display_scale: f32,

    /// Per-call timeout for the title model, in milliseconds. Default: 30 000.
    pub request_timeout_ms: u64,

    /// Retries on a vision-model API error (timeouts are not retried). Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// JPEG quality for rasterised pages (1–100). Default: 85.
    pub jpeg_quality: u8,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed vision model. Takes precedence over every provider field.
    pub vision_model: Option<Arc<dyn VisionModel>>,

    /// Custom title-extraction instruction. If None, uses the language default.
    pub title_instruction: Option<String>,

    /// Sampling temperature for the title request. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens for the title answer. Default: 256.
    pub max_tokens: usize,

    /// Language of headings, placeholders, fallback titles and the default
    /// instruction. Default: [`ReportLanguage::English`].
    pub language: ReportLanguage,

    /// Output container. Default: [`ExportFormat::Docx`].
    pub format: ExportFormat,

    /// Optional progress sink.
    pub progress_callback: Option<ProgressCallback>,

    /// Optional cancellation flag, checked between citation pairs.
    pub cancel: Option<CancelFlag>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title_mode: TitleMode::default(),
            detection_scale: 1.5,
            display_scale: 1.8,
            request_timeout_ms: 30_000,
            max_retries: 2,
            retry_backoff_ms: 500,
            jpeg_quality: 85,
            model: None,
            provider_name: None,
            provider: None,
            vision_model: None,
            title_instruction: None,
            temperature: 0.0,
            max_tokens: 256,
            language: ReportLanguage::default(),
            format: ExportFormat::default(),
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("title_mode", &self.title_mode)
            .field("detection_scale", &self.detection_scale)
            .field("display_scale", &self.display_scale)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "vision_model",
                &self.vision_model.as_ref().map(|_| "<dyn VisionModel>"),
            )
            .field("language", &self.language)
            .field("format", &self.format)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    /// User-visible strings for the configured language.
    pub fn labels(&self) -> ReportLabels {
        ReportLabels::for_language(self.language)
    }

    /// The instruction sent with every title request.
    pub fn instruction(&self) -> &str {
        self.title_instruction
            .as_deref()
            .unwrap_or_else(|| prompts::title_instruction(self.language))
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn title_mode(mut self, mode: TitleMode) -> Self {
        self.config.title_mode = mode;
        self
    }

    /// `true` → [`TitleMode::Resolve`], `false` → [`TitleMode::Fallback`].
    pub fn use_title_resolution(mut self, enabled: bool) -> Self {
        self.config.title_mode = if enabled {
            TitleMode::Resolve
        } else {
            TitleMode::Fallback
        };
        self
    }

    pub fn detection_scale(mut self, scale: f32) -> Self {
        self.config.detection_scale = scale;
        self
    }

    pub fn display_scale(mut self, scale: f32) -> Self {
        self.config.display_scale = scale;
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
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

    pub fn vision_model(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.config.vision_model = Some(model);
        self
    }

    pub fn title_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.title_instruction = Some(instruction.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn language(mut self, language: ReportLanguage) -> Self {
        self.config.language = language;
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel(mut self, flag: CancelFlag) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        for (name, scale) in [
            ("detection_scale", c.detection_scale),
            ("display_scale", c.display_scale),
        ] {
            if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
                return Err(ReportError::InvalidConfig(format!(
                    "{name} must be in (0, {MAX_SCALE}], got {scale}"
                )));
            }
        }
        if c.request_timeout_ms == 0 {
            return Err(ReportError::InvalidConfig(
                "request_timeout_ms must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where section titles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TitleMode {
    /// Ask the vision model; fall back to `"[Title unavailable] - <name>"`. (default)
    #[default]
    Resolve,
    /// Never call the model; every section uses the fallback form.
    Fallback,
    /// Never call the model; every section uses the bare file name.
    FileName,
}

/// Output container for the finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Office Open XML word-processing document. (default)
    #[default]
    Docx,
    /// Portable Document Format, A4.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// MIME type for HTTP responses and downloads.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(ExportFormat::Docx),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Docx => f.write_str("DOCX"),
            ExportFormat::Pdf => f.write_str("PDF"),
        }
    }
}

/// Language of every user-visible string in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportLanguage {
    #[default]
    English,
    /// The wording used by Turkish academic-promotion citation reports.
    Turkish,
}
