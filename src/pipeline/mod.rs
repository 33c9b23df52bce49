//! Pipeline stages for citation-report generation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the rendering backend or the title model can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pairing ──▶ select ──▶ render ──▶ encode ──▶ title ──▶ postprocess
//! (paths)   (sort+zip)  (table)   (pdfium)   (JPEG)     (VLM)     (cleanup)
//! ```
//!
//! 1. [`input`]: read paths, directories or URLs into memory, check `%PDF`
//! 2. [`pairing`]: natural filename order, positional pairing, count check
//! 3. [`select`]: fixed page-count → page-number table
//! 4. [`render`]: rasterise pages in `spawn_blocking`; failures become
//!    placeholders
//! 5. [`encode`]: JPEG-encode bitmaps; wrap them for multimodal requests
//! 6. [`title`]: ask the vision model for the heading, with timeout and
//!    retry; the only stage with network I/O besides URL inputs
//! 7. [`postprocess`]: deterministic cleanup of the model's answer

pub mod encode;
pub mod input;
pub mod pairing;
pub mod postprocess;
pub mod render;
pub mod select;
pub mod title;
