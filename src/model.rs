//! Data model of a report run.
//!
//! Inputs ([`NamedPdf`], [`CitationPair`]) are immutable byte buffers shared
//! through `Arc` so blocking render tasks can hold them without copying.
//! Outputs ([`ReportSection`], [`ReportDocument`]) keep every image slot in
//! place: a page that failed to render is an explicit
//! [`PageSlot::Unavailable`], never a missing entry.

use crate::config::ExportFormat;
use crate::pipeline::select::PageSelection;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// A PDF file held in memory together with its original file name.
#[derive(Clone)]
pub struct NamedPdf {
    pub file_name: String,
    pub bytes: Arc<[u8]>,
}

impl NamedPdf {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl std::fmt::Debug for NamedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedPdf")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One unit of work: a citing work and the matching publication-info sheet.
#[derive(Debug, Clone)]
pub struct CitationPair {
    pub citing: NamedPdf,
    pub publication: NamedPdf,
    /// Citing file name with its extension removed.
    pub name: String,
}

impl CitationPair {
    pub fn new(citing: NamedPdf, publication: NamedPdf) -> Self {
        let name = display_name(&citing.file_name);
        Self {
            citing,
            publication,
            name,
        }
    }
}

/// File name without directories and without its last extension.
pub fn display_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// A rasterised page, JPEG-encoded.
///
/// Only the rasteriser constructs these, and only from a non-empty bitmap.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub jpeg: Arc<[u8]>,
}

impl PageImage {
    /// Size of the encoded payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.jpeg.len()
    }

    /// Height / width, used by writers to keep the page proportions.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PageImage({}x{}, {} bytes)",
            self.width,
            self.height,
            self.jpeg.len()
        )
    }
}

/// One image position in a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageSlot {
    Rendered { page: usize, image: PageImage },
    Unavailable { page: usize, reason: String },
}

impl PageSlot {
    /// 1-based page number this slot was meant to show.
    pub fn page(&self) -> usize {
        match self {
            PageSlot::Rendered { page, .. } | PageSlot::Unavailable { page, .. } => *page,
        }
    }

    pub fn image(&self) -> Option<&PageImage> {
        match self {
            PageSlot::Rendered { image, .. } => Some(image),
            PageSlot::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PageSlot::Rendered { .. })
    }
}

/// Where a section title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    /// Answer of the vision model, after cleanup.
    Model,
    /// Deterministic `"[Title unavailable] - <name>"` form.
    Fallback,
    /// Bare file name.
    FileName,
}

/// One citation pair's contribution to the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    /// 1-based, equal to the pair's position after sorting.
    pub index: usize,
    pub title: String,
    pub title_source: TitleSource,
    pub citing_name: String,
    /// Citing-document page count; `None` when the document could not be opened.
    pub page_count: Option<usize>,
    pub selection: Option<PageSelection>,
    pub publication_title_page: PageSlot,
    pub citing_title_page: PageSlot,
    pub citation_pages: Vec<PageSlot>,
    pub bibliography_pages: Vec<PageSlot>,
}

impl ReportSection {
    /// All slots in document order.
    pub fn slots(&self) -> impl Iterator<Item = &PageSlot> {
        [&self.publication_title_page, &self.citing_title_page]
            .into_iter()
            .chain(self.citation_pages.iter())
            .chain(self.bibliography_pages.iter())
    }

    /// `true` for each slot in document order; compares runs without pixels.
    pub fn availability(&self) -> Vec<bool> {
        self.slots().map(PageSlot::is_available).collect()
    }
}

/// The whole assembled report, before serialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub document_id: String,
    /// Section titles in section order; rendered as the summary list.
    pub titles: Vec<String>,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            document_id: document_id.into(),
            titles: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Append a section, keeping the summary list in step.
    pub fn push_section(&mut self, section: ReportSection) {
        self.titles.push(section.title.clone());
        self.sections.push(section);
    }

    /// Slot and title counters.
    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts {
            sections: self.sections.len(),
            ..Default::default()
        };
        for section in &self.sections {
            match section.title_source {
                TitleSource::Model => counts.resolved_titles += 1,
                TitleSource::Fallback | TitleSource::FileName => counts.fallback_titles += 1,
            }
            for slot in section.slots() {
                if slot.is_available() {
                    counts.rendered_pages += 1;
                } else {
                    counts.unavailable_pages += 1;
                }
            }
        }
        counts
    }
}

/// Counters derived from a [`ReportDocument`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub sections: usize,
    pub rendered_pages: usize,
    pub unavailable_pages: usize,
    pub resolved_titles: usize,
    pub fallback_titles: usize,
}

/// Timing and counters of a full `generate_report` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportStats {
    #[serde(flatten)]
    pub counts: ReportCounts,
    pub assemble_duration_ms: u64,
    pub export_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A serialised report plus the model it was built from.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub document: ReportDocument,
    pub stats: ReportStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> PageImage {
        PageImage {
            width: 10,
            height: 20,
            jpeg: Arc::from(vec![1u8, 2, 3]),
        }
    }

    fn section(index: usize, source: TitleSource) -> ReportSection {
        ReportSection {
            index,
            title: format!("Title {index}"),
            title_source: source,
            citing_name: format!("c{index}"),
            page_count: Some(2),
            selection: Some(PageSelection::for_page_count(2)),
            publication_title_page: PageSlot::Rendered {
                page: 1,
                image: image(),
            },
            citing_title_page: PageSlot::Unavailable {
                page: 1,
                reason: "broken".into(),
            },
            citation_pages: vec![PageSlot::Rendered {
                page: 1,
                image: image(),
            }],
            bibliography_pages: vec![PageSlot::Rendered {
                page: 2,
                image: image(),
            }],
        }
    }

    #[test]
    fn display_name_strips_extension_only() {
        assert_eq!(display_name("f10.pdf"), "f10");
        assert_eq!(display_name("smith.et.al.pdf"), "smith.et.al");
        assert_eq!(display_name("dir/a.PDF"), "a");
        assert_eq!(display_name("noext"), "noext");
    }

    #[test]
    fn push_section_keeps_summary_in_order() {
        let mut doc = ReportDocument::new("Book", "42");
        doc.push_section(section(1, TitleSource::Model));
        doc.push_section(section(2, TitleSource::Fallback));
        assert_eq!(doc.titles, vec!["Title 1", "Title 2"]);
        let counts = doc.counts();
        assert_eq!(counts.sections, 2);
        assert_eq!(counts.rendered_pages, 6);
        assert_eq!(counts.unavailable_pages, 2);
        assert_eq!(counts.resolved_titles, 1);
        assert_eq!(counts.fallback_titles, 1);
    }

    #[test]
    fn availability_follows_document_order() {
        let s = section(1, TitleSource::Model);
        assert_eq!(s.availability(), vec![true, false, true, true]);
        let pages: Vec<usize> = s.slots().map(PageSlot::page).collect();
        assert_eq!(pages, vec![1, 1, 1, 2]);
    }

    #[test]
    fn slot_serialises_without_pixels() {
        let json = serde_json::to_string(&PageSlot::Rendered {
            page: 3,
            image: image(),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"rendered\""));
        assert!(json.contains("\"width\":10"));
        assert!(!json.contains("jpeg"));
    }
}
