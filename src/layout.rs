//! Writer-neutral document layout.
//!
//! [`Layout::build`] fixes everything about the report except its container
//! format: the wording, block order, numbering and which image slots turn
//! into placeholders. The DOCX and PDF writers only decide how a heading or
//! an image looks on the page.
//!
//! ```text
//! <title>
//! <document id label>: <id>
//! <summary heading>
//!   1. <section 1 title>
//!   2. ...
//! ── page break ──
//! 1. <section 1 title>
//!   A1. <publication title page>   image | placeholder
//!   A1. <citing title page>        image | placeholder
//!   A1. <citation page(s)>         image(s) | placeholder
//!   A1. <bibliography page(s)>     image(s) | placeholder
//! ── page break ──
//! ```

use crate::labels::ReportLabels;
use crate::model::{PageImage, PageSlot, ReportDocument, ReportSection};

/// One entry under a block heading.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    Image(PageImage),
    Placeholder(String),
}

/// A labelled group of page images, e.g. "A2. Bibliography Page".
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBlock {
    pub heading: String,
    pub items: Vec<LayoutItem>,
}

/// One citation pair: a heading and its four blocks, always in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSection {
    pub heading: String,
    pub blocks: Vec<LayoutBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: String,
    pub id_line: String,
    pub summary_heading: String,
    /// `"1. <title>"`, `"2. <title>"`, … in section order.
    pub summary: Vec<String>,
    pub sections: Vec<LayoutSection>,
}

impl Layout {
    pub fn build(document: &ReportDocument, labels: &ReportLabels) -> Self {
        Self {
            title: document.title.clone(),
            id_line: format!("{}: {}", labels.document_id, document.document_id),
            summary_heading: labels.summary_heading.to_string(),
            summary: document
                .titles
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. {}", i + 1, t))
                .collect(),
            sections: document
                .sections
                .iter()
                .map(|s| build_section(s, labels))
                .collect(),
        }
    }

    /// Every embedded image in document order.
    pub fn images(&self) -> impl Iterator<Item = &PageImage> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .flat_map(|b| b.items.iter())
            .filter_map(|item| match item {
                LayoutItem::Image(image) => Some(image),
                LayoutItem::Placeholder(_) => None,
            })
    }
}

fn build_section(section: &ReportSection, labels: &ReportLabels) -> LayoutSection {
    let i = section.index;
    let heading = |label: &str| format!("A{i}. {label}");
    let known_count = section.selection.is_some();

    LayoutSection {
        heading: format!("{}. {}", i, section.title),
        blocks: vec![
            LayoutBlock {
                heading: heading(labels.publication_title_page),
                items: vec![slot_item(&section.publication_title_page, labels)],
            },
            LayoutBlock {
                heading: heading(labels.citing_title_page),
                items: vec![slot_item(&section.citing_title_page, labels)],
            },
            LayoutBlock {
                heading: heading(labels.citation_pages),
                items: page_list(&section.citation_pages, known_count, labels),
            },
            LayoutBlock {
                heading: heading(labels.bibliography_pages),
                items: page_list(&section.bibliography_pages, known_count, labels),
            },
        ],
    }
}

fn slot_item(slot: &PageSlot, labels: &ReportLabels) -> LayoutItem {
    match slot.image() {
        Some(image) => LayoutItem::Image(image.clone()),
        None => LayoutItem::Placeholder(labels.image_unavailable.to_string()),
    }
}

/// An empty list means "rule selected nothing" only when the page count was known.
fn page_list(slots: &[PageSlot], known_count: bool, labels: &ReportLabels) -> Vec<LayoutItem> {
    if slots.is_empty() {
        let text = if known_count {
            labels.no_matching_page
        } else {
            labels.image_unavailable
        };
        return vec![LayoutItem::Placeholder(text.to_string())];
    }
    slots.iter().map(|slot| slot_item(slot, labels)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TitleSource;
    use crate::pipeline::select::PageSelection;
    use std::sync::Arc;

    fn rendered(page: usize) -> PageSlot {
        PageSlot::Rendered {
            page,
            image: PageImage {
                width: 8,
                height: 11,
                jpeg: Arc::from(vec![0xFFu8, 0xD8, page as u8]),
            },
        }
    }

    fn section(index: usize, total: Option<usize>) -> ReportSection {
        let selection = total.map(PageSelection::for_page_count);
        let (citation_pages, bibliography_pages) = match &selection {
            Some(s) => (
                s.citation_pages.iter().map(|&p| rendered(p)).collect(),
                s.bibliography_pages.iter().map(|&p| rendered(p)).collect(),
            ),
            None => (vec![], vec![]),
        };
        ReportSection {
            index,
            title: format!("Work {index}"),
            title_source: TitleSource::Model,
            citing_name: format!("c{index}"),
            page_count: total,
            selection,
            publication_title_page: rendered(1),
            citing_title_page: PageSlot::Unavailable {
                page: 1,
                reason: "broken".into(),
            },
            citation_pages,
            bibliography_pages,
        }
    }

    fn texts(block: &LayoutBlock) -> Vec<String> {
        block
            .items
            .iter()
            .map(|i| match i {
                LayoutItem::Image(img) => format!("img{}", img.jpeg[2]),
                LayoutItem::Placeholder(t) => t.clone(),
            })
            .collect()
    }

    #[test]
    fn front_matter_and_headings() {
        let mut doc = ReportDocument::new("Book", "12345");
        doc.push_section(section(1, Some(4)));
        doc.push_section(section(2, Some(2)));
        let layout = Layout::build(&doc, &ReportLabels::ENGLISH);

        assert_eq!(layout.id_line, "Document ID: 12345");
        assert_eq!(layout.summary, vec!["1. Work 1", "2. Work 2"]);
        assert_eq!(layout.sections[1].heading, "2. Work 2");
        let headings: Vec<&str> = layout.sections[1]
            .blocks
            .iter()
            .map(|b| b.heading.as_str())
            .collect();
        assert_eq!(
            headings,
            vec![
                "A2. Title Page of the Publication",
                "A2. Title Page of the Citing Work",
                "A2. Page of the First Citation",
                "A2. Bibliography Page",
            ]
        );
    }

    #[test]
    fn slots_become_images_or_placeholders() {
        let mut doc = ReportDocument::new("Book", "1");
        doc.push_section(section(1, Some(4)));
        let layout = Layout::build(&doc, &ReportLabels::ENGLISH);
        let blocks = &layout.sections[0].blocks;
        assert_eq!(texts(&blocks[0]), vec!["img1"]);
        assert_eq!(texts(&blocks[1]), vec!["[Image could not be processed]"]);
        assert_eq!(texts(&blocks[2]), vec!["img2", "img3"]);
        assert_eq!(texts(&blocks[3]), vec!["img4"]);
        assert_eq!(layout.images().count(), 4);
    }

    #[test]
    fn one_page_document_uses_no_match_placeholder() {
        let mut doc = ReportDocument::new("Kitap", "1");
        doc.push_section(section(1, Some(1)));
        let layout = Layout::build(&doc, &ReportLabels::TURKISH);
        let blocks = &layout.sections[0].blocks;
        assert_eq!(blocks[2].heading, "A1. Eserde ilk atıf yapılan sayfa");
        assert_eq!(texts(&blocks[2]), vec!["[Kurala uygun ek sayfa bulunmuyor.]"]);
        assert_eq!(texts(&blocks[3]), vec!["[Kurala uygun ek sayfa bulunmuyor.]"]);
        assert_eq!(layout.id_line, "YÖK ID: 1");
    }

    #[test]
    fn unknown_page_count_uses_unavailable_placeholder() {
        let mut doc = ReportDocument::new("Book", "1");
        doc.push_section(section(1, None));
        let layout = Layout::build(&doc, &ReportLabels::ENGLISH);
        let blocks = &layout.sections[0].blocks;
        assert_eq!(texts(&blocks[2]), vec!["[Image could not be processed]"]);
        assert_eq!(texts(&blocks[3]), vec!["[Image could not be processed]"]);
    }
}
