//! PDF rasterisation: render single pages to JPEG [`PageImage`]s.
//!
//! ## Threading
//!
//! pdfium is a C++ library with process-global state. All calls run on
//! tokio's blocking pool, and [`PdfiumRenderer`] holds a mutex for the
//! lifetime of each bound library instance.
//!
//! ## Output size
//!
//! A page is rendered at `round(width_pt × scale) × round(height_pt × scale)`
//! pixels, i.e. scale 1.0 maps one PDF point to one pixel.
//!
//! ## Failure policy
//!
//! The async entry points never fail: any decode, range, render or encode
//! error becomes a [`PageSlot::Unavailable`] so one bad page cannot abort the
//! run. Callers log the slot with their own context.

use crate::error::{RenderError, ReportError};
use crate::model::{PageImage, PageSlot};
use crate::pipeline::encode;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Blocking PDF rendering capability.
///
/// Implementations must be deterministic for identical `(bytes, page, scale)`.
pub trait PageRenderer: Send + Sync {
    /// Total number of pages in the document.
    fn page_count(&self, pdf: &[u8]) -> Result<usize, RenderError>;

    /// Render one 1-based page.
    fn render_page(&self, pdf: &[u8], page: usize, scale: f32)
        -> Result<DynamicImage, RenderError>;

    /// Render several pages in the given order.
    ///
    /// The default opens the document once per page; implementations that
    /// can keep a decoded handle should override it and release the handle
    /// before returning.
    fn render_pages(
        &self,
        pdf: &[u8],
        pages: &[usize],
        scale: f32,
    ) -> Vec<Result<DynamicImage, RenderError>> {
        pages
            .iter()
            .map(|&page| self.render_page(pdf, page, scale))
            .collect()
    }
}

/// Pixel size of a page of `width_pt × height_pt` points at `scale`.
pub fn target_size(width_pt: f32, height_pt: f32, scale: f32) -> (u32, u32) {
    let px = |v: f32| (v * scale).round().max(1.0) as u32;
    (px(width_pt), px(height_pt))
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// [`PageRenderer`] backed by a dynamically loaded pdfium library.
///
/// Library lookup order: the explicit directory (or `PDFIUM_LIB_PATH`), the
/// current directory, then the system library path.
pub struct PdfiumRenderer {
    library_dir: Option<PathBuf>,
    lock: Mutex<()>,
}

impl PdfiumRenderer {
    /// Bind using `PDFIUM_LIB_PATH` when set, otherwise `./` then the system.
    pub fn new() -> Result<Self, ReportError> {
        Self::with_library_dir(std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from))
    }

    /// Bind to the pdfium library in `dir` (or the default lookup when `None`).
    ///
    /// Binds once up front so a missing library is reported before any
    /// citation pair is processed.
    pub fn with_library_dir(dir: Option<PathBuf>) -> Result<Self, ReportError> {
        let renderer = Self {
            library_dir: dir,
            lock: Mutex::new(()),
        };
        renderer.bind().map_err(ReportError::PdfiumBindingFailed)?;
        info!(
            "pdfium bound ({})",
            renderer
                .library_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "default lookup".into())
        );
        Ok(renderer)
    }

    fn bind(&self) -> Result<Pdfium, String> {
        let bindings = match &self.library_dir {
            Some(dir) => {
                let dir = dir.to_string_lossy().into_owned();
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| format!("{e:?}"))?;

        Ok(Pdfium::new(bindings))
    }

    /// Run `f` with a freshly bound pdfium while holding the library lock.
    fn with_pdfium<T>(&self, f: impl FnOnce(&Pdfium) -> Result<T, RenderError>) -> Result<T, RenderError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| RenderError::Task("pdfium lock poisoned".into()))?;
        let pdfium = self.bind().map_err(RenderError::Decode)?;
        f(&pdfium)
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, RenderError> {
        self.with_pdfium(|pdfium| {
            let document = open(pdfium, pdf)?;
            Ok(document.pages().len() as usize)
        })
    }

    fn render_page(
        &self,
        pdf: &[u8],
        page: usize,
        scale: f32,
    ) -> Result<DynamicImage, RenderError> {
        self.with_pdfium(|pdfium| {
            let document = open(pdfium, pdf)?;
            render_from(&document, page, scale)
        })
    }

    fn render_pages(
        &self,
        pdf: &[u8],
        pages: &[usize],
        scale: f32,
    ) -> Vec<Result<DynamicImage, RenderError>> {
        let batch = self.with_pdfium(|pdfium| {
            // One document handle for the whole batch, dropped on return.
            let document = open(pdfium, pdf)?;
            Ok(pages
                .iter()
                .map(|&page| render_from(&document, page, scale))
                .collect::<Vec<_>>())
        });

        match batch {
            Ok(results) => results,
            Err(e) => pages.iter().map(|_| Err(e.clone())).collect(),
        }
    }
}

fn open<'a>(pdfium: &'a Pdfium, pdf: &'a [u8]) -> Result<PdfDocument<'a>, RenderError> {
    pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| RenderError::Decode(format!("{e:?}")))
}

fn render_from(
    document: &PdfDocument<'_>,
    page: usize,
    scale: f32,
) -> Result<DynamicImage, RenderError> {
    let pages = document.pages();
    let total = pages.len() as usize;
    if page == 0 {
        return Err(RenderError::InvalidPage { page });
    }
    if page > total {
        return Err(RenderError::PageOutOfRange { page, total });
    }

    let pdf_page = pages
        .get((page - 1) as u16)
        .map_err(|e| RenderError::Render {
            page,
            detail: format!("{e:?}"),
        })?;

    let (width, height) = target_size(pdf_page.width().value, pdf_page.height().value, scale);
    let config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_target_height(height as i32);

    let bitmap = pdf_page
        .render_with_config(&config)
        .map_err(|e| RenderError::Render {
            page,
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} at {:.2}× → {}x{} px",
        page,
        scale,
        image.width(),
        image.height()
    );
    Ok(image)
}

// ── Async rasterise contract ─────────────────────────────────────────────

/// Total page count, off the async executor.
pub async fn page_count(
    renderer: &Arc<dyn PageRenderer>,
    pdf: &Arc<[u8]>,
) -> Result<usize, RenderError> {
    let renderer = Arc::clone(renderer);
    let pdf = Arc::clone(pdf);
    tokio::task::spawn_blocking(move || renderer.page_count(&pdf))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

/// Rasterise one page → `Rendered` or `Unavailable`.
pub async fn rasterize(
    renderer: &Arc<dyn PageRenderer>,
    pdf: &Arc<[u8]>,
    page: usize,
    scale: f32,
    jpeg_quality: u8,
) -> PageSlot {
    rasterize_pages(renderer, pdf, &[page], scale, jpeg_quality)
        .await
        .into_iter()
        .next()
        .unwrap_or_else(|| PageSlot::Unavailable {
            page,
            reason: "renderer returned no result".into(),
        })
}

/// Rasterise `pages` in order inside one blocking task.
///
/// The result has exactly one slot per requested page, in the same order.
pub async fn rasterize_pages(
    renderer: &Arc<dyn PageRenderer>,
    pdf: &Arc<[u8]>,
    pages: &[usize],
    scale: f32,
    jpeg_quality: u8,
) -> Vec<PageSlot> {
    if pages.is_empty() {
        return Vec::new();
    }

    let renderer = Arc::clone(renderer);
    let pdf = Arc::clone(pdf);
    let wanted = pages.to_vec();

    let task = tokio::task::spawn_blocking(move || {
        let rendered = renderer.render_pages(&pdf, &wanted, scale);
        wanted
            .iter()
            .enumerate()
            .map(|(i, &page)| {
                let result = match rendered.get(i) {
                    Some(Ok(img)) => to_page_image(img, page, jpeg_quality),
                    Some(Err(e)) => Err(e.clone()),
                    None => Err(RenderError::Task("renderer returned too few pages".into())),
                };
                into_slot(page, result)
            })
            .collect::<Vec<_>>()
    })
    .await;

    match task {
        Ok(slots) => slots,
        Err(e) => pages
            .iter()
            .map(|&page| into_slot(page, Err(RenderError::Task(e.to_string()))))
            .collect(),
    }
}

fn to_page_image(img: &DynamicImage, page: usize, quality: u8) -> Result<PageImage, RenderError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(RenderError::Render {
            page,
            detail: "empty bitmap".into(),
        });
    }
    encode::encode_jpeg(img, quality).map_err(|e| RenderError::Encode {
        page,
        detail: e.to_string(),
    })
}

fn into_slot(page: usize, result: Result<PageImage, RenderError>) -> PageSlot {
    match result {
        Ok(image) => PageSlot::Rendered { page, image },
        Err(e) => PageSlot::Unavailable {
            page,
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// Fake document: `pdf[0]` is the page count; pages are 10×20 pt.
    struct Fake;

    impl PageRenderer for Fake {
        fn page_count(&self, pdf: &[u8]) -> Result<usize, RenderError> {
            pdf.first()
                .map(|&n| n as usize)
                .ok_or_else(|| RenderError::Decode("empty".into()))
        }

        fn render_page(
            &self,
            pdf: &[u8],
            page: usize,
            scale: f32,
        ) -> Result<DynamicImage, RenderError> {
            let total = self.page_count(pdf)?;
            if page == 0 {
                return Err(RenderError::InvalidPage { page });
            }
            if page > total {
                return Err(RenderError::PageOutOfRange { page, total });
            }
            let (w, h) = target_size(10.0, 20.0, scale);
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                w,
                h,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    fn fake() -> Arc<dyn PageRenderer> {
        Arc::new(Fake)
    }

    #[test]
    fn target_size_rounds() {
        assert_eq!(target_size(595.0, 842.0, 1.0), (595, 842));
        assert_eq!(target_size(595.0, 842.0, 1.5), (893, 1263));
        assert_eq!(target_size(612.0, 792.0, 1.8), (1102, 1426));
        assert_eq!(target_size(0.1, 0.1, 1.0), (1, 1));
    }

    #[tokio::test]
    async fn out_of_range_is_unavailable() {
        let pdf: Arc<[u8]> = Arc::from(vec![2u8]);
        let slot = rasterize(&fake(), &pdf, 3, 1.0, 85).await;
        match slot {
            PageSlot::Unavailable { page, reason } => {
                assert_eq!(page, 3);
                assert!(reason.contains("out of range"), "got: {reason}");
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rendered_size_follows_scale() {
        let pdf: Arc<[u8]> = Arc::from(vec![1u8]);
        let slot = rasterize(&fake(), &pdf, 1, 2.0, 85).await;
        let image = slot.image().expect("page 1 renders");
        assert_eq!((image.width, image.height), (20, 40));
    }

    #[tokio::test]
    async fn batch_keeps_order_and_positions() {
        let pdf: Arc<[u8]> = Arc::from(vec![3u8]);
        let slots = rasterize_pages(&fake(), &pdf, &[2, 0, 5, 3], 1.0, 85).await;
        let pages: Vec<usize> = slots.iter().map(PageSlot::page).collect();
        assert_eq!(pages, vec![2, 0, 5, 3]);
        let ok: Vec<bool> = slots.iter().map(PageSlot::is_available).collect();
        assert_eq!(ok, vec![true, false, false, true]);
    }

    #[tokio::test]
    async fn undecodable_document_has_no_page_count() {
        let pdf: Arc<[u8]> = Arc::from(Vec::<u8>::new());
        assert!(matches!(
            page_count(&fake(), &pdf).await,
            Err(RenderError::Decode(_))
        ));
    }
}
