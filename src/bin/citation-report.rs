//! citation-report CLI: build a citation verification report from two sets of PDFs.
//!
//! Usage: citation-report --citing DIR --publication DIR --title T --id ID [OPTIONS]

use anyhow::{Context, Result};
use citation_report::{
    generate_report_to_file, load_pdfs, CancelFlag, ExportFormat, ProgressCallback, ReportConfig,
    ReportLanguage, ReportProgressCallback, TitleMode, TitleSource,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Keep log lines on one terminal row.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────

/// One progress bar over citation pairs plus a log line per finished pair.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    titles: Mutex<HashMap<usize, (String, TitleSource)>>,
}

impl CliProgressCallback {
    /// The bar starts as a spinner; `on_run_start` gives it a length.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Pairing inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            titles: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pairs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Assembling");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pairs: usize) {
        self.activate_bar(total_pairs);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Assembling {total_pairs} citation pairs…"))
        ));
    }

    fn on_pair_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_title_resolved(&self, index: usize, title: &str, source: TitleSource) {
        if let Ok(mut m) = self.titles.lock() {
            m.insert(index, (title.to_string(), source));
        }
    }

    fn on_page_unavailable(&self, index: usize, page: usize, reason: &str) {
        self.bar.println(format!(
            "      {} pair {index}, page {page}: {}",
            red("✗"),
            red(&truncate(reason, 80)),
        ));
    }

    fn on_pair_complete(&self, index: usize, total: usize, unavailable: usize) {
        let secs = self.elapsed_secs(index);
        let (title, source) = self
            .titles
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .unwrap_or_else(|| (String::new(), TitleSource::Fallback));

        let mark = if unavailable > 0 {
            yellow("⚠")
        } else {
            green("✓")
        };
        let title = truncate(&title, 60);
        let title = match source {
            TitleSource::Model => title,
            TitleSource::Fallback | TitleSource::FileName => dim(&title),
        };
        self.bar.println(format!(
            "  {mark} {:>3}/{:<3}  {}  {}",
            index,
            total,
            title,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pairs: usize, unavailable_pages: usize) {
        self.bar.finish_and_clear();
        if unavailable_pages == 0 {
            eprintln!(
                "{} {} citation pairs assembled",
                green("✔"),
                bold(&total_pairs.to_string())
            );
        } else {
            eprintln!(
                "{} {} citation pairs assembled  ({} image(s) unavailable)",
                yellow("⚠"),
                bold(&total_pairs.to_string()),
                red(&unavailable_pages.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Directories of citing works and publication-info sheets
  citation-report --citing citing/ --publication publication/ \
      --title "Deep Learning for Crops" --id 123456

  # PDF output, Turkish wording
  citation-report --citing citing/ --publication publication/ \
      --title "Tarım" --id 123456 --language tr -o rapor.pdf

  # No API key: titles become "[Title unavailable] - <file>"
  citation-report --citing citing/ --publication publication/ \
      --title T --id 1 --no-title-resolution

  # Individual files are paired in natural order (f2 before f10)
  citation-report --citing c/f1.pdf c/f2.pdf --publication p/1.pdf p/2.pdf \
      --title T --id 1

PAIRING:
  Both lists are sorted by natural filename order and zipped by position.
  They must contain the same number of files.

PAGES PER PAIR:
  Publication page 1, citing page 1, then the citation page(s) and the
  bibliography page(s) chosen from the citing work's page count:
    1 page: none      2 pages: 1 / 2      3 pages: 2 / 3
    4 pages: 2,3 / 4    5+ pages: 2,3 / 4,5

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
"#;

/// Build citation verification reports (DOCX or PDF) from paired PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "citation-report",
    version,
    about = "Build citation verification reports (DOCX or PDF) from paired PDFs",
    long_about = "Pair citing-work PDFs with publication-info PDFs by natural filename order, \
render the relevant pages, read each citing work's title with a vision model, and export \
everything as one Word or PDF report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Citing-work PDFs: files, directories or HTTP/HTTPS URLs.
    #[arg(long, required = true, num_args = 1..)]
    citing: Vec<String>,

    /// Publication-info PDFs: files, directories or HTTP/HTTPS URLs.
    #[arg(long, required = true, num_args = 1..)]
    publication: Vec<String>,

    /// Report title (the publication being cited).
    #[arg(long, env = "CITREP_TITLE")]
    title: String,

    /// Document identifier printed under the title.
    #[arg(long, env = "CITREP_ID")]
    id: String,

    /// Output file or directory. Default: "<title>_Report.<ext>" in the current directory.
    #[arg(short, long, env = "CITREP_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Inferred from the --output extension when omitted.
    #[arg(long, env = "CITREP_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Language of headings, placeholders and fallback titles.
    #[arg(long, env = "CITREP_LANGUAGE", value_enum, default_value = "en")]
    language: LanguageArg,

    /// Skip the vision model; titles use the "[Title unavailable] - <file>" form.
    #[arg(long, env = "CITREP_NO_TITLE_RESOLUTION", conflicts_with = "filename_titles")]
    no_title_resolution: bool,

    /// Skip the vision model; titles are the citing file names.
    #[arg(long, env = "CITREP_FILENAME_TITLES")]
    filename_titles: bool,

    /// Render scale for the page sent to the vision model.
    #[arg(long, env = "CITREP_DETECTION_SCALE", default_value_t = 1.5)]
    detection_scale: f32,

    /// Render scale for images embedded in the report.
    #[arg(long, env = "CITREP_DISPLAY_SCALE", default_value_t = 1.8)]
    display_scale: f32,

    /// Per-request vision model timeout in milliseconds.
    #[arg(long, env = "CITREP_REQUEST_TIMEOUT_MS", default_value_t = 30_000)]
    request_timeout_ms: u64,

    /// Retries per title on a vision model API error.
    #[arg(long, env = "CITREP_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Vision model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "CITREP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print a JSON summary (sections, titles, stats) to stdout.
    #[arg(long, env = "CITREP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CITREP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CITREP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CITREP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Docx => ExportFormat::Docx,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LanguageArg {
    En,
    Tr,
}

impl From<LanguageArg> for ReportLanguage {
    fn from(v: LanguageArg) -> Self {
        match v {
            LanguageArg::En => ReportLanguage::English,
            LanguageArg::Tr => ReportLanguage::Turkish,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-pair outcomes, so library logs
    // stay at ERROR while it is visible.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ctrl-C stops the run between two pairs ───────────────────────────
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    // ── Load inputs ──────────────────────────────────────────────────────
    let citing = load_pdfs(&cli.citing, cli.download_timeout)
        .await
        .context("Failed to load citing PDFs")?;
    let publication = load_pdfs(&cli.publication, cli.download_timeout)
        .await
        .context("Failed to load publication-info PDFs")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, cancel, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let (path, report) = generate_report_to_file(
        citing,
        publication,
        &cli.title,
        &cli.id,
        cli.output.as_deref(),
        &config,
    )
    .await
    .context("Report generation failed")?;

    if cli.json {
        let summary = serde_json::json!({
            "output": path,
            "format": report.format,
            "bytes": report.bytes.len(),
            "stats": report.stats,
            "document": report.document,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        let counts = report.stats.counts;
        eprintln!(
            "{}  {} sections  {} images  {}ms  →  {}",
            if counts.unavailable_pages == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            counts.sections,
            counts.rendered_pages,
            report.stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        if counts.unavailable_pages > 0 || counts.fallback_titles > 0 {
            eprintln!(
                "   {} placeholder image(s)  /  {} fallback title(s)",
                dim(&counts.unavailable_pages.to_string()),
                dim(&counts.fallback_titles.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ReportConfig`.
fn build_config(
    cli: &Cli,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
) -> Result<ReportConfig> {
    let title_mode = if cli.filename_titles {
        TitleMode::FileName
    } else if cli.no_title_resolution {
        TitleMode::Fallback
    } else {
        TitleMode::Resolve
    };

    let mut builder = ReportConfig::builder()
        .title_mode(title_mode)
        .detection_scale(cli.detection_scale)
        .display_scale(cli.display_scale)
        .request_timeout_ms(cli.request_timeout_ms)
        .max_retries(cli.max_retries)
        .language(cli.language.into())
        .format(resolve_format(cli.format, cli.output.as_deref()))
        .cancel(cancel);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `--format` wins; otherwise the output extension; otherwise DOCX.
fn resolve_format(format: Option<FormatArg>, output: Option<&Path>) -> ExportFormat {
    format
        .map(ExportFormat::from)
        .or_else(|| {
            output
                .and_then(|p| p.extension())
                .and_then(|ext| ExportFormat::from_extension(&ext.to_string_lossy()))
        })
        .unwrap_or_default()
}
