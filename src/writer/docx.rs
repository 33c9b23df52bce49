//! WordprocessingML (`.docx`) writer.
//!
//! A `.docx` is a zip of XML parts. Only the parts Word needs to open the
//! file are written:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml              title metadata
//! word/document.xml              body
//! word/styles.xml                Title, Heading1–3, ListParagraph, Placeholder
//! word/_rels/document.xml.rels   styles + one relationship per image
//! word/media/imageN.jpeg         page images, stored uncompressed
//! ```
//!
//! Images are inline drawings, 530 px wide (shrunk further if the page would
//! overflow). Every section heading starts a new page; block headings keep
//! with the following paragraph so an image never lands on a page without
//! its label.

use super::{xml_escape, DocumentWriter};
use crate::config::ExportFormat;
use crate::layout::{Layout, LayoutItem};
use crate::model::PageImage;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// English Metric Units per pixel at 96 dpi.
const EMU_PER_PX: u64 = 9525;

const NS_DECL: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

/// DOCX output options.
#[derive(Debug, Clone)]
pub struct DocxWriter {
    /// Image width in pixels (96 dpi).
    pub image_width_px: u32,
    /// Tallest image in pixels; wider images are shrunk to respect it.
    pub max_image_height_px: u32,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self {
            image_width_px: 530,
            max_image_height_px: 850,
        }
    }
}

impl DocxWriter {
    /// Display size in pixels, keeping the page's aspect ratio.
    fn display_size(&self, image: &PageImage) -> (u64, u64) {
        let ratio = image.aspect_ratio();
        let mut w = self.image_width_px as f64;
        let mut h = w * ratio;
        let max_h = self.max_image_height_px as f64;
        if h > max_h {
            h = max_h;
            w = h / ratio;
        }
        (w.round().max(1.0) as u64, h.round().max(1.0) as u64)
    }

    fn document_xml(&self, layout: &Layout) -> String {
        let mut body = String::new();

        paragraph(&mut body, Some("Title"), "", &layout.title);
        paragraph(&mut body, None, "", &layout.id_line);
        paragraph(&mut body, Some("Heading1"), "", &layout.summary_heading);
        for line in &layout.summary {
            paragraph(&mut body, Some("ListParagraph"), "", line);
        }

        let mut image_no = 0usize;
        for section in &layout.sections {
            paragraph(
                &mut body,
                Some("Heading2"),
                "<w:pageBreakBefore/><w:keepNext/>",
                &section.heading,
            );
            for block in &section.blocks {
                paragraph(&mut body, Some("Heading3"), "<w:keepNext/>", &block.heading);
                for item in &block.items {
                    match item {
                        LayoutItem::Image(image) => {
                            image_no += 1;
                            self.image_paragraph(&mut body, image, image_no);
                        }
                        LayoutItem::Placeholder(text) => {
                            paragraph(&mut body, Some("Placeholder"), "<w:keepLines/>", text);
                        }
                    }
                }
            }
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {NS_DECL}><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/></w:sectPr></w:body></w:document>"#
        )
    }

    fn image_paragraph(&self, out: &mut String, image: &PageImage, n: usize) {
        let (w, h) = self.display_size(image);
        let (cx, cy) = (w * EMU_PER_PX, h * EMU_PER_PX);
        let _ = write!(
            out,
            concat!(
                r#"<w:p><w:pPr><w:keepLines/><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="image{n}.jpeg"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="rIdImg{n}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            ),
            cx = cx,
            cy = cy,
            n = n,
        );
    }
}

fn paragraph(out: &mut String, style: Option<&str>, extra_props: &str, text: &str) {
    out.push_str("<w:p>");
    if style.is_some() || !extra_props.is_empty() {
        out.push_str("<w:pPr>");
        if let Some(style) = style {
            let _ = write!(out, r#"<w:pStyle w:val="{style}"/>"#);
        }
        out.push_str(extra_props);
        out.push_str("</w:pPr>");
    }
    let _ = write!(
        out,
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_escape(text)
    );
}

fn content_types() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#
}

fn package_rels() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#
}

fn core_props(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
        xml_escape(title)
    )
}

fn document_rels(image_count: usize) -> String {
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );
    for n in 1..=image_count {
        let _ = write!(
            rels,
            r#"<Relationship Id="rIdImg{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{n}.jpeg"/>"#
        );
    }
    rels.push_str("</Relationships>");
    rels
}

fn styles() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:cs="Times New Roman"/><w:sz w:val="24"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="36"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="720"/></w:pPr></w:style><w:style w:type="paragraph" w:styleId="Placeholder"><w:name w:val="Placeholder"/><w:basedOn w:val="Normal"/><w:rPr><w:i/><w:color w:val="7F7F7F"/></w:rPr></w:style></w:styles>"#
}

impl DocumentWriter for DocxWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn write(&self, layout: &Layout) -> Result<Vec<u8>, String> {
        let images: Vec<&PageImage> = layout.images().collect();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut put = |name: String, options: SimpleFileOptions, data: &[u8]| -> Result<(), String> {
            zip.start_file(name.as_str(), options)
                .map_err(|e| format!("{name}: {e}"))?;
            zip.write_all(data).map_err(|e| format!("{name}: {e}"))
        };

        put("[Content_Types].xml".into(), xml, content_types().as_bytes())?;
        put("_rels/.rels".into(), xml, package_rels().as_bytes())?;
        put("docProps/core.xml".into(), xml, core_props(&layout.title).as_bytes())?;
        put("word/document.xml".into(), xml, self.document_xml(layout).as_bytes())?;
        put("word/styles.xml".into(), xml, styles().as_bytes())?;
        put(
            "word/_rels/document.xml.rels".into(),
            xml,
            document_rels(images.len()).as_bytes(),
        )?;
        for (i, image) in images.iter().enumerate() {
            put(format!("word/media/image{}.jpeg", i + 1), stored, &image.jpeg[..])?;
        }

        let cursor = zip.finish().map_err(|e| format!("finish: {e}"))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutBlock, LayoutSection};
    use std::io::Read;
    use std::sync::Arc;

    fn image(w: u32, h: u32) -> PageImage {
        PageImage {
            width: w,
            height: h,
            jpeg: Arc::from(vec![0xFFu8, 0xD8, 0xFF, 0xD9]),
        }
    }

    fn layout() -> Layout {
        Layout {
            title: "Book & Co".into(),
            id_line: "Document ID: 7".into(),
            summary_heading: "Citations".into(),
            summary: vec!["1. First".into()],
            sections: vec![LayoutSection {
                heading: "1. First".into(),
                blocks: vec![
                    LayoutBlock {
                        heading: "A1. Title Page of the Publication".into(),
                        items: vec![LayoutItem::Image(image(100, 141))],
                    },
                    LayoutBlock {
                        heading: "A1. Bibliography Page".into(),
                        items: vec![
                            LayoutItem::Image(image(100, 141)),
                            LayoutItem::Placeholder("[Image could not be processed]".into()),
                        ],
                    },
                ],
            }],
        }
    }

    fn entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn package_contains_required_parts() {
        let bytes = DocxWriter::default().write(&layout()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "word/media/image1.jpeg",
            "word/media/image2.jpeg",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
    }

    #[test]
    fn body_has_text_images_and_breaks() {
        let bytes = DocxWriter::default().write(&layout()).unwrap();
        let doc = entry(&bytes, "word/document.xml");
        assert!(doc.contains("Book &amp; Co"));
        assert!(doc.contains("A1. Bibliography Page"));
        assert!(doc.contains("[Image could not be processed]"));
        assert!(doc.contains(r#"r:embed="rIdImg2""#));
        assert_eq!(doc.matches("<w:pageBreakBefore/>").count(), 1);

        let rels = entry(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains("media/image2.jpeg"));
    }

    #[test]
    fn images_fit_width_and_height() {
        let w = DocxWriter::default();
        assert_eq!(w.display_size(&image(1000, 1414)), (530, 749));
        // Very tall page: height capped, width shrinks.
        let (dw, dh) = w.display_size(&image(100, 400));
        assert_eq!(dh, 850);
        assert!(dw < 530);
    }
}
