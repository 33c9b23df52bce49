//! User-visible strings of the generated report.
//!
//! The section layout is fixed; only its wording changes with
//! [`ReportLanguage`]. Headings carry the `A{n}.` prefix used by citation
//! verification files so each block can be referenced from a cover letter.

use crate::config::ReportLanguage;

/// Every heading, placeholder and fallback string used by the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLabels {
    /// Prefix of the document-identifier line, e.g. `"Document ID"`.
    pub document_id: &'static str,
    /// Heading above the numbered title summary.
    pub summary_heading: &'static str,
    /// Block 1: page 1 of the publication-info PDF.
    pub publication_title_page: &'static str,
    /// Block 2: page 1 of the citing work.
    pub citing_title_page: &'static str,
    /// Block 3: the page(s) where the citation is made.
    pub citation_pages: &'static str,
    /// Block 4: the bibliography page(s).
    pub bibliography_pages: &'static str,
    /// Shown instead of an image that could not be rendered.
    pub image_unavailable: &'static str,
    /// Shown when the page-count rule selects no page for a block.
    pub no_matching_page: &'static str,
    /// Prefix of the deterministic fallback title.
    pub title_unavailable: &'static str,
    /// Base of the default output file name (`<title>_<suffix>.<ext>`).
    pub file_suffix: &'static str,
}

impl ReportLabels {
    pub const ENGLISH: ReportLabels = ReportLabels {
        document_id: "Document ID",
        summary_heading: "Citations",
        publication_title_page: "Title Page of the Publication",
        citing_title_page: "Title Page of the Citing Work",
        citation_pages: "Page of the First Citation",
        bibliography_pages: "Bibliography Page",
        image_unavailable: "[Image could not be processed]",
        no_matching_page: "[No additional page matches the rule]",
        title_unavailable: "[Title unavailable]",
        file_suffix: "Report",
    };

    pub const TURKISH: ReportLabels = ReportLabels {
        document_id: "YÖK ID",
        summary_heading: "Atıflar",
        publication_title_page: "Yayının Ünvan Sayfası",
        citing_title_page: "Eserin Başlık Sayfası",
        citation_pages: "Eserde ilk atıf yapılan sayfa",
        bibliography_pages: "Kaynakça Sayfası",
        image_unavailable: "[Görsel işlenemedi]",
        no_matching_page: "[Kurala uygun ek sayfa bulunmuyor.]",
        title_unavailable: "[Başlık Alınamadı]",
        file_suffix: "Raporu",
    };

    pub fn for_language(language: ReportLanguage) -> Self {
        match language {
            ReportLanguage::English => Self::ENGLISH,
            ReportLanguage::Turkish => Self::TURKISH,
        }
    }

    /// `"<prefix> - <name>"`, the title used when no model answer is available.
    pub fn fallback_title(&self, name: &str) -> String {
        format!("{} - {}", self.title_unavailable, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_fallback_title() {
        assert_eq!(
            ReportLabels::ENGLISH.fallback_title("smith2020"),
            "[Title unavailable] - smith2020"
        );
    }

    #[test]
    fn turkish_fallback_title() {
        assert_eq!(
            ReportLabels::for_language(ReportLanguage::Turkish).fallback_title("atif 3"),
            "[Başlık Alınamadı] - atif 3"
        );
    }
}
