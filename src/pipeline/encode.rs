//! Image encoding: `DynamicImage` → JPEG [`PageImage`] → base64 `ImageData`.
//!
//! Pages are stored as JPEG because they are embedded in the final document
//! as-is; a 1.8× A4 page is ~1 070 × 1 515 px, which is several megabytes as
//! PNG but a few hundred kilobytes as JPEG at quality 85. The same bytes are
//! sent to the vision model, so nothing is encoded twice.

use crate::model::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

/// Encode a rendered page as JPEG. Alpha is dropped; JPEG has none.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<PageImage, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
    debug!(
        "Encoded {}x{} page → {} bytes JPEG",
        rgb.width(),
        rgb.height(),
        buf.len()
    );

    Ok(PageImage {
        width: rgb.width(),
        height: rgb.height(),
        jpeg: Arc::from(buf),
    })
}

/// Wrap a page image for a multimodal chat request.
///
/// `detail: "high"` keeps small title fonts legible to GPT-4-class models,
/// which otherwise downsample to a single 512 px tile.
pub fn to_image_data(image: &PageImage) -> ImageData {
    let b64 = STANDARD.encode(&image.jpeg[..]);
    ImageData::new(b64, "image/jpeg").with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 7, Rgba([255, 0, 0, 128])));
        let page = encode_jpeg(&img, 85).expect("encode should succeed");
        assert_eq!((page.width, page.height), (12, 7));
        // JPEG SOI marker
        assert_eq!(&page.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn image_data_is_base64_jpeg() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let page = encode_jpeg(&img, 50).unwrap();
        let data = to_image_data(&page);
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, page.jpeg.to_vec());
    }
}
