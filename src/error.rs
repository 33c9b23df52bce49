//! Error types for the citation-report library.
//!
//! Three error types mirror the three failure classes of a report run:
//!
//! * [`ReportError`]: **Fatal**: the run cannot start or cannot deliver a
//!   document (mismatched input lists, unreadable input file, pdfium missing,
//!   export failed). Returned as `Err(ReportError)` from the entry points.
//!
//! * [`RenderError`]: **Recovered per page**: one page could not be
//!   rasterised. The assembler turns it into a
//!   [`crate::model::PageSlot::Unavailable`] marker and keeps going.
//!
//! * [`TitleError`]: **Recovered per title**: the vision model was
//!   unreachable, timed out, or answered with nothing usable. The resolver
//!   substitutes the deterministic fallback title.

use crate::config::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the citation-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input shape ───────────────────────────────────────────────────────
    /// No citing or no publication-info PDFs were supplied.
    #[error("No {which} PDFs were supplied.\nProvide at least one citation pair.")]
    EmptyInput { which: &'static str },

    /// The two input lists have different lengths, so they cannot be paired.
    #[error(
        "Count mismatch: {citing} citing PDF(s) but {publication} publication-info PDF(s).\n\
Both lists must contain the same number of files."
    )]
    CountMismatch { citing: usize, publication: usize },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a file, a directory or an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file, a directory or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium-directory, place libpdfium next to the\n\
executable, or install it in a system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Export errors ─────────────────────────────────────────────────────
    /// The report was assembled but the document writer could not serialise it.
    #[error("Export to {format} failed: {detail}")]
    ExportFailed { format: ExportFormat, detail: String },

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Run control ───────────────────────────────────────────────────────
    /// The run was cancelled between two citation pairs.
    #[error("Report generation cancelled after {completed} of {total} citation pairs")]
    Cancelled { completed: usize, total: usize },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// `true` when the caller supplied input of the wrong shape, as opposed
    /// to the report not being generated or exported.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::EmptyInput { .. }
                | ReportError::CountMismatch { .. }
                | ReportError::FileNotFound { .. }
                | ReportError::PermissionDenied { .. }
                | ReportError::InvalidInput { .. }
                | ReportError::DownloadFailed { .. }
                | ReportError::DownloadTimeout { .. }
                | ReportError::NotAPdf { .. }
        )
    }
}

/// A non-fatal rasterisation failure for one page.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Page numbers are 1-based; 0 never names a page.
    #[error("page {page} is not a valid 1-based page number")]
    InvalidPage { page: usize },

    /// The document has fewer pages than requested.
    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The PDF bytes could not be opened.
    #[error("could not open PDF: {0}")]
    Decode(String),

    /// pdfium failed while rendering the page.
    #[error("page {page}: rendering failed: {detail}")]
    Render { page: usize, detail: String },

    /// The rendered bitmap could not be encoded.
    #[error("page {page}: image encoding failed: {detail}")]
    Encode { page: usize, detail: String },

    /// The blocking render task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(String),
}

/// A non-fatal failure to obtain a title from the vision model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TitleError {
    /// No vision model is configured or none could be resolved.
    #[error("no vision model is configured")]
    NotConfigured,

    /// The call did not finish within the request timeout.
    #[error("title request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The provider returned an error.
    #[error("vision model error: {0}")]
    Api(String),

    /// The response contained no usable text after cleanup.
    #[error("vision model returned no usable title")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_mismatch_display() {
        let e = ReportError::CountMismatch {
            citing: 3,
            publication: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 citing"), "got: {msg}");
        assert!(msg.contains("2 publication-info"), "got: {msg}");
    }

    #[test]
    fn input_errors_are_classified() {
        assert!(ReportError::CountMismatch {
            citing: 1,
            publication: 0
        }
        .is_input_error());
        assert!(ReportError::EmptyInput { which: "citing" }.is_input_error());
        assert!(!ReportError::ExportFailed {
            format: ExportFormat::Docx,
            detail: "zip".into()
        }
        .is_input_error());
        assert!(!ReportError::Cancelled {
            completed: 1,
            total: 2
        }
        .is_input_error());
    }

    #[test]
    fn export_failed_names_format() {
        let e = ReportError::ExportFailed {
            format: ExportFormat::Pdf,
            detail: "boom".into(),
        };
        assert!(e.to_string().contains("PDF"));
    }

    #[test]
    fn out_of_range_display() {
        let e = RenderError::PageOutOfRange { page: 7, total: 4 };
        assert!(e.to_string().contains("page 7"));
        assert!(e.to_string().contains("4 pages"));
    }

    #[test]
    fn timeout_display() {
        let e = TitleError::Timeout { ms: 1500 };
        assert!(e.to_string().contains("1500ms"));
    }
}
