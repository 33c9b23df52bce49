//! Page selection: which citing-document pages go into each report block.
//!
//! Citation files are trimmed excerpts: page 1 is the title page, then come
//! the page(s) with the citation, then the bibliography. Short excerpts reuse
//! page 1 as citation evidence; longer ones give two pages to each part and
//! ignore everything after page 5.
//!
//! | pages | citation | bibliography |
//! |-------|----------|--------------|
//! | 1     | none     | none         |
//! | 2     | 1        | 2            |
//! | 3     | 2        | 3            |
//! | 4     | 2, 3     | 4            |
//! | ≥ 5   | 2, 3     | 4, 5         |

use serde::Serialize;

/// The title page is always page 1.
pub const TITLE_PAGE: usize = 1;

/// `(citation, bibliography)` pages indexed by `min(total, 5) - 1`.
const SELECTION_TABLE: [(&[usize], &[usize]); 5] = [
    (&[], &[]),
    (&[1], &[2]),
    (&[2], &[3]),
    (&[2, 3], &[4]),
    (&[2, 3], &[4, 5]),
];

/// The pages used from one citing document, all 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSelection {
    pub title_page: usize,
    pub citation_pages: Vec<usize>,
    pub bibliography_pages: Vec<usize>,
}

impl PageSelection {
    /// Select pages for a document with `total_pages` pages.
    ///
    /// A zero count is treated like a one-page document: no citation or
    /// bibliography pages.
    pub fn for_page_count(total_pages: usize) -> Self {
        let band = total_pages.clamp(1, SELECTION_TABLE.len());
        let (citation, bibliography) = SELECTION_TABLE[band - 1];
        Self {
            title_page: TITLE_PAGE,
            citation_pages: citation.to_vec(),
            bibliography_pages: bibliography.to_vec(),
        }
    }

    /// Citation pages followed by bibliography pages, the order they are rendered in.
    pub fn body_pages(&self) -> Vec<usize> {
        self.citation_pages
            .iter()
            .chain(self.bibliography_pages.iter())
            .copied()
            .collect()
    }
}
