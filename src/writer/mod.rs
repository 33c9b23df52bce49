//! Document writers: serialise a [`Layout`] into a container format.
//!
//! Both writers are pure `&Layout → bytes` functions with no I/O; the file
//! write lives in [`crate::assemble::write_report`] so a failed export never
//! leaves a half-written file behind.

pub mod docx;
pub mod pdf;

use crate::config::{ExportFormat, ReportLanguage};
use crate::labels::ReportLabels;
use crate::layout::Layout;
use std::path::{Path, PathBuf};

pub use docx::DocxWriter;
pub use pdf::PdfWriter;

/// Serialises a finished layout.
///
/// Errors are plain messages; the caller wraps them in
/// [`crate::error::ReportError::ExportFailed`].
pub trait DocumentWriter: Send + Sync {
    fn format(&self) -> ExportFormat;
    fn write(&self, layout: &Layout) -> Result<Vec<u8>, String>;
}

pub fn writer_for(format: ExportFormat) -> Box<dyn DocumentWriter> {
    match format {
        ExportFormat::Docx => Box::new(DocxWriter::default()),
        ExportFormat::Pdf => Box::new(PdfWriter::default()),
    }
}

/// `<title>_<suffix>.<ext>` with characters that are invalid in file names
/// removed and whitespace runs replaced by `_`.
pub fn default_file_name(title: &str, format: ExportFormat, language: ReportLanguage) -> String {
    let suffix = ReportLabels::for_language(language).file_suffix;
    let stem = sanitize_file_stem(title);
    if stem.is_empty() {
        format!("{}.{}", suffix, format.extension())
    } else {
        format!("{}_{}.{}", stem, suffix, format.extension())
    }
}

fn sanitize_file_stem(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Where a report should be written.
///
/// `None` → default name in the current directory; an existing directory →
/// default name inside it; anything else is used as given.
pub fn resolve_output_path(
    output: Option<&Path>,
    title: &str,
    format: ExportFormat,
    language: ReportLanguage,
) -> PathBuf {
    let name = || default_file_name(title, format, language);
    match output {
        None => PathBuf::from(name()),
        Some(path) if path.is_dir() => path.join(name()),
        Some(path) => path.to_path_buf(),
    }
}

/// Escape text for XML content and attribute values.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}
