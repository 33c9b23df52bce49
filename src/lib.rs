//! # citation-report
//!
//! Assemble citation verification reports from pairs of PDFs.
//!
//! Each citation is evidenced by two files: the *citing work* (an excerpt of
//! the paper or thesis that cites you) and a *publication-info sheet* (the
//! page of the cited publication). Files are paired by natural filename
//! order, the relevant pages are rasterised, the citing work's title is read
//! off its first page by a vision model, and everything is laid out as a
//! Word or PDF document with a numbered summary and one section per pair.
//!
//! ## Pipeline Overview
//!
//! ```text
//! citing/*.pdf   publication/*.pdf
//!  │
//!  ├─ 1. Input    read files, directories or URLs, check %PDF magic
//!  ├─ 2. Pair     natural sort both lists, zip by position
//!  ├─ 3. Title    citing p.1 → vision model → cleaned title (or fallback)
//!  ├─ 4. Select   page count → citation pages + bibliography pages
//!  ├─ 5. Render   rasterise via pdfium (spawn_blocking) → JPEG
//!  ├─ 6. Layout   headings, numbering, placeholders for missing images
//!  └─ 7. Export   DOCX (zip + WordprocessingML) or PDF (lopdf)
//! ```
//!
//! A page that cannot be rendered, or a title the model cannot read, never
//! fails the run: the slot becomes a placeholder and the title falls back to
//! `"[Title unavailable] - <file name>"`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use citation_report::{generate_report_to_file, load_pdfs, ExportFormat, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReportConfig::builder().format(ExportFormat::Docx).build()?;
//!     let citing = load_pdfs(&["citing/".to_string()], 60).await?;
//!     let publication = load_pdfs(&["publication/".to_string()], 60).await?;
//!     let (path, report) = generate_report_to_file(
//!         citing, publication, "My Book", "12345", None, &config,
//!     ).await?;
//!     eprintln!("{} sections → {}", report.stats.counts.sections, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `citation-report` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! citation-report = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Title Model
//!
//! Title extraction sends one small image per pair, so a cheap model is enough.
//!
//! | Model | Notes |
//! |-------|-------|
//! | `gpt-4.1-nano` | Default, fast, cheap |
//! | `gpt-4.1-mini` | Better on cluttered cover pages |
//! | `gemini-2.0-flash` | Alternative cheap option |
//! | `llava` (ollama) | Local, no API key |
//!
//! Without any provider the run still succeeds with fallback titles.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assemble;
pub mod config;
pub mod error;
pub mod labels;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assemble::{
    generate_report, generate_report_sync, generate_report_to_file, generate_report_with,
    write_report, CancelFlag, ReportAssembler,
};
pub use config::{ExportFormat, ReportConfig, ReportConfigBuilder, ReportLanguage, TitleMode};
pub use error::{RenderError, ReportError, TitleError};
pub use labels::ReportLabels;
pub use layout::Layout;
pub use model::{
    CitationPair, GeneratedReport, NamedPdf, PageImage, PageSlot, ReportCounts, ReportDocument,
    ReportSection, ReportStats, TitleSource,
};
pub use pipeline::input::load_pdfs;
pub use pipeline::pairing::{natural_cmp, pair_inputs};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use pipeline::select::PageSelection;
pub use pipeline::title::{LlmVisionModel, TitleResolver, VisionModel};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback};
pub use stream::{assemble_stream, stream_report, SectionStream};
pub use writer::{default_file_name, writer_for, DocumentWriter};
