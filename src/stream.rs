//! Streaming assembly API: emit report sections as they complete.
//!
//! Sections arrive strictly in pair order; the next pair is not started
//! until the previous section has been yielded. Dropping the stream stops
//! the run between pairs.

use crate::assemble::ReportAssembler;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::{CitationPair, NamedPdf, ReportSection};
use crate::pipeline::pairing::pair_inputs;
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of report sections in pair order.
///
/// Yields at most one `Err`, [`ReportError::Cancelled`], and then ends.
pub type SectionStream = Pin<Box<dyn Stream<Item = Result<ReportSection, ReportError>> + Send>>;

/// Stream the sections of already-paired input.
pub fn assemble_stream(assembler: Arc<ReportAssembler>, pairs: Vec<CitationPair>) -> SectionStream {
    let total = pairs.len();
    info!("Streaming {} citation pairs", total);

    let state = (assembler, pairs.into_iter().enumerate(), false);
    Box::pin(stream::unfold(
        state,
        move |(assembler, mut pairs, stopped)| async move {
            if stopped {
                return None;
            }
            let (i, pair) = pairs.next()?;
            if let Err(e) = assembler.check_cancelled(i, total) {
                return Some((Err(e), (assembler, pairs, true)));
            }
            let section = assembler.assemble_section(i + 1, total, &pair).await;
            Some((Ok(section), (assembler, pairs, false)))
        },
    ))
}

/// Pair the two lists, bind pdfium and resolve the title model, then stream.
///
/// # Returns
/// - `Ok(SectionStream)`
/// - `Err(ReportError)`: input shape or pdfium binding failed; nothing
///   was rendered
pub fn stream_report(
    citing: Vec<NamedPdf>,
    publication: Vec<NamedPdf>,
    config: &ReportConfig,
) -> Result<SectionStream, ReportError> {
    let pairs = pair_inputs(citing, publication)?;
    let assembler = Arc::new(ReportAssembler::from_config(config)?);
    Ok(assemble_stream(assembler, pairs))
}
