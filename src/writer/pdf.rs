//! PDF writer built on `lopdf`.
//!
//! The output uses only the standard Type 1 fonts (Times-Roman and
//! Times-Bold), so nothing is embedded except the page JPEGs, which go in
//! unchanged as `DCTDecode` image XObjects.
//!
//! ## Page flow
//!
//! * The front matter (title, identifier line, summary list) starts on page 1
//!   and wraps onto further pages if the list is long.
//! * Every section starts on a new page.
//! * A block heading is never left at the bottom of a page: if the heading
//!   and its first item do not fit, both move to the next page.
//! * Images are scaled to the printable width, capped so that a heading and
//!   the image always fit on one page together.
//!
//! ## Text encoding
//!
//! The standard fonts use WinAnsiEncoding. Letters outside it (e.g. Turkish
//! `ş`, `ğ`, `ı`) are folded to their base letter; anything else becomes `?`.

use super::DocumentWriter;
use crate::config::ExportFormat;
use crate::layout::{Layout, LayoutItem};
use crate::model::PageImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const A4_WIDTH: f32 = 595.0;
const A4_HEIGHT: f32 = 842.0;
/// 15 mm.
const MARGIN: f32 = 42.5;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BLOCK_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const LEADING: f32 = 1.35;
const GAP: f32 = 8.0;
/// Absorbs float rounding in the fit checks.
const SLACK: f32 = 2.0;

/// PDF output options.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: MARGIN,
        }
    }
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Mutable state while pages are being laid out.
struct PageFlow<'w> {
    writer: &'w PdfWriter,
    doc: Document,
    pages_id: ObjectId,
    fonts: Dictionary,
    page_ids: Vec<ObjectId>,
    ops: Vec<Operation>,
    xobjects: Dictionary,
    /// Baseline cursor, measured from the bottom of the page.
    y: f32,
    image_no: usize,
    page_open: bool,
}

impl<'w> PageFlow<'w> {
    fn new(writer: &'w PdfWriter) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(standard_font("Times-Roman"));
        let bold = doc.add_object(standard_font("Times-Bold"));
        let mut fonts = Dictionary::new();
        fonts.set(Font::Regular.resource(), Object::Reference(regular));
        fonts.set(Font::Bold.resource(), Object::Reference(bold));

        Self {
            writer,
            doc,
            pages_id,
            fonts,
            page_ids: Vec::new(),
            ops: Vec::new(),
            xobjects: Dictionary::new(),
            y: 0.0,
            image_no: 0,
            page_open: false,
        }
    }

    fn top(&self) -> f32 {
        self.writer.page_height - self.writer.margin
    }

    fn bottom(&self) -> f32 {
        self.writer.margin
    }

    fn content_width(&self) -> f32 {
        self.writer.page_width - 2.0 * self.writer.margin
    }

    fn content_height(&self) -> f32 {
        self.top() - self.bottom()
    }

    fn new_page(&mut self) -> Result<(), String> {
        self.finish_page()?;
        self.page_open = true;
        self.y = self.top();
        Ok(())
    }

    fn ensure_page(&mut self) -> Result<(), String> {
        if !self.page_open {
            self.new_page()?;
        }
        Ok(())
    }

    /// Whether the current page has room for `height` more points.
    fn fits(&self, height: f32) -> bool {
        self.page_open && self.y - height >= self.bottom()
    }

    fn finish_page(&mut self) -> Result<(), String> {
        if !self.page_open {
            return Ok(());
        }
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let bytes = content.encode().map_err(|e| format!("content stream: {e}"))?;
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, bytes)));

        let resources = dictionary! {
            "Font" => Object::Dictionary(self.fonts.clone()),
            "XObject" => Object::Dictionary(std::mem::take(&mut self.xobjects)),
        };
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                real(0.0),
                real(0.0),
                real(self.writer.page_width),
                real(self.writer.page_height),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        self.page_open = false;
        Ok(())
    }

    fn line_height(size: f32) -> f32 {
        size * LEADING
    }

    /// Wrapped text; starts a new page whenever a line does not fit.
    fn text(&mut self, text: &str, font: Font, size: f32) -> Result<(), String> {
        self.ensure_page()?;
        for line in wrap(text, font, size, self.content_width()) {
            let h = Self::line_height(size);
            if !self.fits(h) {
                self.new_page()?;
            }
            self.y -= h;
            self.ops.push(Operation::new("BT", vec![]));
            self.ops.push(Operation::new(
                "Tf",
                vec![Object::Name(font.resource().as_bytes().to_vec()), real(size)],
            ));
            self.ops
                .push(Operation::new("Td", vec![real(self.writer.margin), real(self.y)]));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::String(to_win_ansi(&line), StringFormat::Literal)],
            ));
            self.ops.push(Operation::new("ET", vec![]));
        }
        Ok(())
    }

    /// Size an image gets on the page: full width, capped so a section
    /// heading and a block heading fit above it.
    fn image_size(&self, image: &PageImage) -> (f32, f32) {
        let max_w = self.content_width();
        let max_h = self.content_height()
            - Self::line_height(HEADING_SIZE)
            - Self::line_height(BLOCK_SIZE)
            - 2.0 * GAP
            - SLACK;
        let scale = (max_w / image.width as f32).min(max_h / image.height as f32);
        (image.width as f32 * scale, image.height as f32 * scale)
    }

    fn item_height(&self, item: &LayoutItem) -> f32 {
        match item {
            LayoutItem::Image(image) => self.image_size(image).1 + GAP,
            LayoutItem::Placeholder(_) => Self::line_height(BODY_SIZE),
        }
    }

    fn image(&mut self, image: &PageImage) -> Result<(), String> {
        let (w, h) = self.image_size(image);
        if !self.fits(h + GAP) {
            self.new_page()?;
        }

        self.image_no += 1;
        let name = format!("Im{}", self.image_no);
        let xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg.to_vec(),
        );
        let id = self.doc.add_object(Object::Stream(xobject));
        self.xobjects.set(name.as_str(), Object::Reference(id));

        let x = self.writer.margin + (self.content_width() - w) / 2.0;
        self.y -= h + GAP;
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![real(w), real(0.0), real(0.0), real(h), real(x), real(self.y)],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(mut self, title: &str) -> Result<Vec<u8>, String> {
        self.finish_page()?;

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let info_id = self.doc.add_object(dictionary! {
            "Title" => text_string(title),
            "Producer" => Object::string_literal("citation-report"),
        });
        self.doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| format!("save: {e}"))?;
        Ok(buf)
    }
}

impl DocumentWriter for PdfWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn write(&self, layout: &Layout) -> Result<Vec<u8>, String> {
        let mut flow = PageFlow::new(self);

        flow.text(&layout.title, Font::Bold, TITLE_SIZE)?;
        flow.skip(GAP);
        flow.text(&layout.id_line, Font::Regular, BODY_SIZE)?;
        flow.skip(GAP * 2.0);
        flow.text(&layout.summary_heading, Font::Bold, HEADING_SIZE)?;
        for line in &layout.summary {
            flow.text(line, Font::Regular, BODY_SIZE)?;
        }

        for section in &layout.sections {
            flow.new_page()?;
            flow.text(&section.heading, Font::Bold, HEADING_SIZE)?;
            flow.skip(GAP);

            for block in &section.blocks {
                let first = block.items.first().map(|i| flow.item_height(i)).unwrap_or(0.0);
                if !flow.fits(PageFlow::line_height(BLOCK_SIZE) + first) {
                    flow.new_page()?;
                }
                flow.text(&block.heading, Font::Bold, BLOCK_SIZE)?;
                for item in &block.items {
                    match item {
                        LayoutItem::Image(image) => flow.image(image)?,
                        LayoutItem::Placeholder(text) => flow.text(text, Font::Regular, BODY_SIZE)?,
                    }
                }
                flow.skip(GAP);
            }
        }

        flow.finish(&layout.title)
    }
}

fn standard_font(base: &str) -> Object {
    Object::Dictionary(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

/// PDF text string: plain bytes when ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

// ── WinAnsi ──────────────────────────────────────────────────────────────

/// The 0x80–0x9F block of WinAnsiEncoding; elsewhere it matches Latin-1.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('€', 0x80), ('‚', 0x82), ('ƒ', 0x83), ('„', 0x84), ('…', 0x85), ('†', 0x86),
    ('‡', 0x87), ('ˆ', 0x88), ('‰', 0x89), ('Š', 0x8A), ('‹', 0x8B), ('Œ', 0x8C),
    ('Ž', 0x8E), ('‘', 0x91), ('’', 0x92), ('“', 0x93), ('”', 0x94), ('•', 0x95),
    ('–', 0x96), ('—', 0x97), ('˜', 0x98), ('™', 0x99), ('š', 0x9A), ('›', 0x9B),
    ('œ', 0x9C), ('ž', 0x9E), ('Ÿ', 0x9F),
];

fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|&(_, b)| b),
    }
}

fn fold_char(c: char) -> u8 {
    if let Some(b) = win_ansi_byte(c) {
        return b;
    }
    match c {
        'ı' => b'i',
        '\t' | '\n' | '\r' => b' ',
        _ => c
            .nfd()
            .find(|d| !is_combining_mark(*d))
            .and_then(win_ansi_byte)
            .unwrap_or(b'?'),
    }
}

fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars().map(fold_char).collect()
}

// ── Line wrapping ────────────────────────────────────────────────────────

/// Approximate advance width in em; the standard fonts carry no metrics here.
fn char_em(c: char, font: Font) -> f32 {
    let base = if c == ' ' {
        0.25
    } else if c.is_uppercase() {
        0.68
    } else if c.is_ascii_digit() {
        0.5
    } else {
        0.46
    };
    match font {
        Font::Regular => base,
        Font::Bold => base * 1.06,
    }
}

fn text_width(s: &str, font: Font, size: f32) -> f32 {
    s.chars().map(|c| char_em(c, font)).sum::<f32>() * size
}

/// Greedy word wrap; words longer than a line are split by character.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
