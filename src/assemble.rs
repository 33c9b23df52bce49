//! Report assembly: the top-level pipeline from PDFs to a finished document.
//!
//! ## Flow per citation pair
//!
//! ```text
//! citing p.1 @ detection scale ──▶ TitleResolver ──▶ title
//! publication p.1 ┐
//! citing p.1      ┴ @ display scale, joined concurrently
//! citing page count ──▶ PageSelection ──▶ citation pages, bibliography pages
//!                                          (one ordered batch)
//! ```
//!
//! Pairs are processed strictly one after another so section indices and
//! the summary list at the top of the report follow input order, and so at
//! most one decoded document is alive at a time.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::layout::Layout;
use crate::model::{
    CitationPair, GeneratedReport, NamedPdf, PageSlot, ReportDocument, ReportSection, ReportStats,
};
use crate::pipeline::pairing::pair_inputs;
use crate::pipeline::render::{self, PageRenderer, PdfiumRenderer};
use crate::pipeline::select::{PageSelection, TITLE_PAGE};
use crate::pipeline::title::TitleResolver;
use crate::writer::{self, DocumentWriter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared flag that stops a run between two citation pairs.
///
/// Clones share the same flag, so one can be handed to a Ctrl-C handler
/// while another sits in the [`ReportConfig`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The pair in progress still completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Orchestrates renderer, title resolver and page selector for a run.
pub struct ReportAssembler {
    renderer: Arc<dyn PageRenderer>,
    resolver: TitleResolver,
    config: ReportConfig,
}

impl ReportAssembler {
    pub fn new(renderer: Arc<dyn PageRenderer>, resolver: TitleResolver, config: ReportConfig) -> Self {
        Self {
            renderer,
            resolver,
            config,
        }
    }

    /// Bind pdfium and resolve the title model from `config`.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        let renderer: Arc<dyn PageRenderer> = Arc::new(PdfiumRenderer::new()?);
        let resolver = TitleResolver::from_config(config);
        Ok(Self::new(renderer, resolver, config.clone()))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Build the whole [`ReportDocument`], one section per pair in order.
    pub async fn assemble(
        &self,
        pairs: &[CitationPair],
        title: &str,
        document_id: &str,
    ) -> Result<ReportDocument, ReportError> {
        let total = pairs.len();
        info!("Assembling report '{}' ({} citation pairs)", title, total);
        if let Some(cb) = &self.config.progress_callback {
            cb.on_run_start(total);
        }

        let mut document = ReportDocument::new(title, document_id);
        for (i, pair) in pairs.iter().enumerate() {
            self.check_cancelled(i, total)?;
            let section = self.assemble_section(i + 1, total, pair).await;
            document.push_section(section);
        }

        let counts = document.counts();
        info!(
            "Assembled {} sections: {} images, {} placeholders, {} fallback titles",
            counts.sections, counts.rendered_pages, counts.unavailable_pages, counts.fallback_titles
        );
        if let Some(cb) = &self.config.progress_callback {
            cb.on_run_complete(total, counts.unavailable_pages);
        }
        Ok(document)
    }

    pub(crate) fn check_cancelled(&self, completed: usize, total: usize) -> Result<(), ReportError> {
        match &self.config.cancel {
            Some(flag) if flag.is_cancelled() => {
                warn!("Run cancelled after {}/{} pairs", completed, total);
                Err(ReportError::Cancelled { completed, total })
            }
            _ => Ok(()),
        }
    }

    /// Process one pair. Never fails: every problem becomes a placeholder or
    /// a fallback title.
    pub async fn assemble_section(&self, index: usize, total: usize, pair: &CitationPair) -> ReportSection {
        let cfg = &self.config;
        let cb = cfg.progress_callback.as_ref();
        debug!("Pair {}/{}: '{}'", index, total, pair.name);
        if let Some(cb) = cb {
            cb.on_pair_start(index, total, &pair.name);
        }

        // ── Title ────────────────────────────────────────────────────────
        let detection = if self.resolver.wants_image() {
            Some(
                render::rasterize(
                    &self.renderer,
                    &pair.citing.bytes,
                    TITLE_PAGE,
                    cfg.detection_scale,
                    cfg.jpeg_quality,
                )
                .await,
            )
        } else {
            None
        };
        let resolved = self
            .resolver
            .resolve(detection.as_ref().and_then(PageSlot::image), &pair.name)
            .await;
        drop(detection);
        if let Some(cb) = cb {
            cb.on_title_resolved(index, &resolved.title, resolved.source);
        }

        // ── Title pages ──────────────────────────────────────────────────
        let (publication_title_page, citing_title_page) = tokio::join!(
            render::rasterize(
                &self.renderer,
                &pair.publication.bytes,
                TITLE_PAGE,
                cfg.display_scale,
                cfg.jpeg_quality,
            ),
            render::rasterize(
                &self.renderer,
                &pair.citing.bytes,
                TITLE_PAGE,
                cfg.display_scale,
                cfg.jpeg_quality,
            ),
        );

        // ── Citation + bibliography pages ────────────────────────────────
        let page_count = match render::page_count(&self.renderer, &pair.citing.bytes).await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("'{}': page count unavailable: {}", pair.name, e);
                None
            }
        };
        let selection = page_count.map(PageSelection::for_page_count);

        let (citation_pages, bibliography_pages) = match &selection {
            Some(sel) => {
                let mut body = render::rasterize_pages(
                    &self.renderer,
                    &pair.citing.bytes,
                    &sel.body_pages(),
                    cfg.display_scale,
                    cfg.jpeg_quality,
                )
                .await;
                let bibliography = body.split_off(sel.citation_pages.len().min(body.len()));
                (body, bibliography)
            }
            None => (Vec::new(), Vec::new()),
        };

        let section = ReportSection {
            index,
            title: resolved.title,
            title_source: resolved.source,
            citing_name: pair.name.clone(),
            page_count,
            selection,
            publication_title_page,
            citing_title_page,
            citation_pages,
            bibliography_pages,
        };

        let mut unavailable = 0;
        for slot in section.slots() {
            if let PageSlot::Unavailable { page, reason } = slot {
                unavailable += 1;
                warn!("'{}': page {} unavailable: {}", pair.name, page, reason);
                if let Some(cb) = cb {
                    cb.on_page_unavailable(index, *page, reason);
                }
            }
        }
        if page_count.is_none() {
            // Citation and bibliography blocks both become placeholders.
            unavailable += 2;
        }
        if let Some(cb) = cb {
            cb.on_pair_complete(index, total, unavailable);
        }

        section
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Generate a report from two unsorted PDF lists.
///
/// The lists are validated and paired before pdfium is bound or any
/// provider is contacted, so a count mismatch costs nothing.
///
/// # Errors
/// Input-shape errors, [`ReportError::PdfiumBindingFailed`],
/// [`ReportError::Cancelled`] and [`ReportError::ExportFailed`]. Page and
/// title failures are never errors.
pub async fn generate_report(
    citing: Vec<NamedPdf>,
    publication: Vec<NamedPdf>,
    title: &str,
    document_id: &str,
    config: &ReportConfig,
) -> Result<GeneratedReport, ReportError> {
    let pairs = pair_inputs(citing, publication)?;
    let assembler = ReportAssembler::from_config(config)?;
    export(&assembler, &pairs, title, document_id).await
}

/// [`generate_report`] with an explicit assembler (custom renderer or model).
///
/// The lists are paired here, so an input-shape error is returned before
/// the assembler's renderer or model is touched.
pub async fn generate_report_with(
    assembler: &ReportAssembler,
    citing: Vec<NamedPdf>,
    publication: Vec<NamedPdf>,
    title: &str,
    document_id: &str,
) -> Result<GeneratedReport, ReportError> {
    let pairs = pair_inputs(citing, publication)?;
    export(assembler, &pairs, title, document_id).await
}

async fn export(
    assembler: &ReportAssembler,
    pairs: &[CitationPair],
    title: &str,
    document_id: &str,
) -> Result<GeneratedReport, ReportError> {
    let start = Instant::now();
    let config = assembler.config();

    let document = assembler.assemble(pairs, title, document_id).await?;
    let assemble_duration = start.elapsed();

    let export_start = Instant::now();
    let layout = Layout::build(&document, &config.labels());
    let bytes = writer::writer_for(config.format)
        .write(&layout)
        .map_err(|detail| {
            warn!("{} export failed: {}", config.format, detail);
            ReportError::ExportFailed {
                format: config.format,
                detail,
            }
        })?;
    let export_duration = export_start.elapsed();

    let stats = ReportStats {
        counts: document.counts(),
        assemble_duration_ms: assemble_duration.as_millis() as u64,
        export_duration_ms: export_duration.as_millis() as u64,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Exported {} ({} bytes) in {}ms",
        config.format,
        bytes.len(),
        stats.total_duration_ms
    );

    Ok(GeneratedReport {
        format: config.format,
        bytes,
        document,
        stats,
    })
}

/// Generate a report and write it to `output`.
///
/// When `output` is `None` or an existing directory, the file is named
/// after the report title (see [`writer::default_file_name`]). The write is
/// atomic: a temp file in the target directory is persisted over the target.
pub async fn generate_report_to_file(
    citing: Vec<NamedPdf>,
    publication: Vec<NamedPdf>,
    title: &str,
    document_id: &str,
    output: Option<&Path>,
    config: &ReportConfig,
) -> Result<(PathBuf, GeneratedReport), ReportError> {
    let report = generate_report(citing, publication, title, document_id, config).await?;
    let path = writer::resolve_output_path(output, title, config.format, config.language);
    write_report(&report, &path).await?;
    Ok((path, report))
}

/// Write finished report bytes to `path` atomically.
pub async fn write_report(report: &GeneratedReport, path: &Path) -> Result<(), ReportError> {
    let target = path.to_path_buf();
    let bytes = report.bytes.clone();

    tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
        .await
        .map_err(|e| ReportError::Internal(format!("write task failed: {e}")))??;

    info!("Wrote {}", path.display());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let write_err = |source: std::io::Error| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_report_sync(
    citing: Vec<NamedPdf>,
    publication: Vec<NamedPdf>,
    title: &str,
    document_id: &str,
    config: &ReportConfig,
) -> Result<GeneratedReport, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(citing, publication, title, document_id, config))
}
