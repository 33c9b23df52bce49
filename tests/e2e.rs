//! End-to-end tests against a real pdfium library.
//!
//! Input PDFs are generated with lopdf, so no fixture files are needed, but
//! a libpdfium must be loadable (`PDFIUM_LIB_PATH`, the current directory or
//! the system library path). The tests are gated behind `E2E_ENABLED`; the
//! title-model test additionally needs `OPENAI_API_KEY`.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/opt/pdfium/lib cargo test --test e2e -- --nocapture

use citation_report::{
    generate_report_to_file, NamedPdf, PageRenderer, PdfiumRenderer, ReportConfig, ReportLanguage,
    TitleMode, TitleSource,
};
use citation_report::{ExportFormat, PageSlot};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Read;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route pipeline logs to the test output; `RUST_LOG` picks the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Skip this test unless E2E_ENABLED is set and pdfium can be bound.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_tracing();
        match PdfiumRenderer::new() {
            Ok(renderer) => renderer,
            Err(e) => {
                println!("SKIP: pdfium not available: {e}");
                return;
            }
        }
    }};
}

/// An A4 PDF with `pages` pages; page 1 shows `heading` in large type,
/// every other page a "Page N" line.
fn make_pdf(heading: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 1..=pages {
        let (size, text) = if n == 1 {
            (24, heading.to_string())
        } else {
            (12, format!("Page {n}"))
        };
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), size.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save PDF");
    bytes
}

fn inputs() -> (Vec<NamedPdf>, Vec<NamedPdf>) {
    let citing = vec![
        NamedPdf::new("10.pdf", make_pdf("Soil Moisture Estimation", 2)),
        NamedPdf::new("2.pdf", make_pdf("Deep Learning for Crop Yield", 6)),
        NamedPdf::new("1.pdf", make_pdf("A Single Page Note", 1)),
    ];
    let publication = vec![
        NamedPdf::new("pub-1.pdf", make_pdf("Publication Info 1", 1)),
        NamedPdf::new("pub-2.pdf", make_pdf("Publication Info 2", 1)),
        NamedPdf::new("pub-10.pdf", make_pdf("Publication Info 10", 1)),
    ];
    (citing, publication)
}

// ── Renderer ─────────────────────────────────────────────────────────────────

#[test]
fn test_pdfium_page_count_and_size() {
    let renderer = e2e_skip_unless_ready!();
    let pdf = make_pdf("Heading", 4);

    assert_eq!(renderer.page_count(&pdf).unwrap(), 4);

    let image = renderer.render_page(&pdf, 2, 1.0).unwrap();
    assert_eq!((image.width(), image.height()), (595, 842));
    let image = renderer.render_page(&pdf, 1, 0.5).unwrap();
    assert_eq!((image.width(), image.height()), (298, 421));

    assert!(renderer.render_page(&pdf, 5, 1.0).is_err());
    assert!(renderer.render_page(&pdf, 0, 1.0).is_err());
    assert!(renderer.page_count(b"%PDF-1.4 truncated").is_err());
}

#[test]
fn test_pdfium_batch_keeps_order() {
    let renderer = e2e_skip_unless_ready!();
    let pdf = make_pdf("Heading", 3);

    let results = renderer.render_pages(&pdf, &[3, 1, 7], 0.25);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
}

// ── Full runs ────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_report_docx_with_fallback_titles() {
    let _renderer = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let (citing, publication) = inputs();

    let config = ReportConfig::builder()
        .title_mode(TitleMode::Fallback)
        .display_scale(0.5)
        .build()
        .unwrap();
    let (path, report) = generate_report_to_file(
        citing,
        publication,
        "Crop Science",
        "98765",
        Some(dir.path()),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(path, dir.path().join("Crop_Science_Report.docx"));
    assert!(path.exists());

    let doc = &report.document;
    let names: Vec<&str> = doc.sections.iter().map(|s| s.citing_name.as_str()).collect();
    assert_eq!(names, vec!["1", "2", "10"]);

    // 1 page: title pages only. 6 pages: 2,3 / 4,5. 2 pages: 1 / 2.
    assert!(doc.sections[0].citation_pages.is_empty());
    let pages = |slots: &[PageSlot]| slots.iter().map(PageSlot::page).collect::<Vec<_>>();
    assert_eq!(pages(&doc.sections[1].citation_pages), vec![2, 3]);
    assert_eq!(pages(&doc.sections[1].bibliography_pages), vec![4, 5]);
    assert_eq!(pages(&doc.sections[2].citation_pages), vec![1]);
    assert_eq!(report.stats.counts.unavailable_pages, 0);
    assert_eq!(report.stats.counts.rendered_pages, 2 + 6 + 4);
    assert_eq!(doc.sections[1].title, "[Title unavailable] - 2");

    let file = std::fs::File::open(&path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut xml = String::new();
    zip.by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains("Document ID: 98765"));
    assert!(xml.contains("A3. Bibliography Page"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_pdf_turkish() {
    let _renderer = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let (citing, publication) = inputs();
    let output = dir.path().join("rapor.pdf");

    let config = ReportConfig::builder()
        .title_mode(TitleMode::FileName)
        .language(ReportLanguage::Turkish)
        .format(ExportFormat::Pdf)
        .display_scale(0.5)
        .build()
        .unwrap();
    let (path, report) = generate_report_to_file(
        citing,
        publication,
        "Tarım Bilimi",
        "1",
        Some(&output),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(path, output);
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let doc = Document::load_mem(&bytes).unwrap();
    assert!(doc.get_pages().len() >= 4);
    assert_eq!(report.document.titles, vec!["1", "2", "10"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_title_resolution_with_live_model() {
    let _renderer = e2e_skip_unless_ready!();
    if std::env::var("OPENAI_API_KEY").is_err() {
        println!("SKIP: OPENAI_API_KEY not set");
        return;
    }
    let citing = vec![NamedPdf::new(
        "c.pdf",
        make_pdf("Deep Learning for Crop Yield", 3),
    )];
    let publication = vec![NamedPdf::new("p.pdf", make_pdf("Info", 1))];

    let config = ReportConfig::builder().build().unwrap();
    let report =
        citation_report::generate_report(citing, publication, "Book", "1", &config)
            .await
            .unwrap();

    let section = &report.document.sections[0];
    assert_eq!(section.title_source, TitleSource::Model);
    assert!(
        section.title.to_lowercase().contains("crop"),
        "unexpected title: {}",
        section.title
    );
}
