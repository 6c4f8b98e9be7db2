//! CLI binary for pdf-translate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_translate::{
    translate_document, translate_to_file, ProgressCallback, TranslationConfig,
    TranslationProgressCallback, TranslationResult, TranslationStats, TranslationStatus,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per finished page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.set_message("starting browser…");
        self.bar.reset_eta();
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("page {}", index + 1));
    }

    fn on_page_complete(&self, result: &TranslationResult, total: usize) {
        let (mark, detail) = match result.status {
            TranslationStatus::Ok => (
                green("✓"),
                dim(&format!("{:>5} chars", result.text.chars().count())),
            ),
            TranslationStatus::TimedOut => (
                yellow("⌛"),
                yellow(&format!(
                    "timed out, kept {} chars",
                    result.text.chars().count()
                )),
            ),
            TranslationStatus::Empty => (dim("·"), dim("blank page")),
            TranslationStatus::Failed => {
                let msg = result
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                (red("✗"), red(&truncate(&msg, 80)))
            }
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            mark,
            result.index + 1,
            total,
            detail,
            dim(&format!("{:.1}s", result.duration_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_compose_start(&self, _total_pages: usize) {
        self.bar.set_prefix("Composing");
        self.bar.set_message("writing document…");
    }

    fn on_run_complete(&self, total_pages: usize, translated_pages: usize) {
        self.bar.finish_and_clear();
        let missing = total_pages.saturating_sub(translated_pages);
        if missing == 0 {
            eprintln!(
                "{} {} pages translated",
                green("✔"),
                bold(&translated_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages translated  ({} blank or failed)",
                cyan("⚠"),
                bold(&translated_pages.to_string()),
                total_pages,
                missing,
            );
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars - 1).collect();
    format!("{head}\u{2026}")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate to <name>_translated.docx on the Desktop
  pdf-translate lecture.pdf

  # Explicit output file, no visible browser window
  pdf-translate lecture.pdf -o out/lecture_fa.docx --headless

  # Strip a running header from every page before translating
  pdf-translate book.pdf --strip 'Chapter \d+ Review' --strip 'Industry 4\.0'

  # Slower connection: wait longer for the translation to settle
  pdf-translate slides.pdf --convergence-timeout-ms 30000 --stability-window-ms 8000

  # Per-page results as JSON
  pdf-translate lecture.pdf --json > results.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (otherwise ./ then the system library)
  RUST_LOG          Override the log filter (e.g. pdf_translate=debug)

TIMING:
  Each page: the output area is first given up to --clear-timeout-ms to empty,
  then polled every --poll-interval-ms until its text has not changed for
  --stability-window-ms, or --convergence-timeout-ms elapses (the last text
  seen is kept and the page is reported as timed out).
"#;

/// Translate PDF documents through a web translation UI into a .docx.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-translate",
    version,
    about = "Translate a PDF page by page and write a .docx pairing each page with its translation",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the document to this file instead of <output-dir>/<name>_translated.docx.
    #[arg(short, long, env = "PDF_TRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory for the translated document (default: Desktop).
    #[arg(long, env = "PDF_TRANSLATE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Run Chrome without a visible window.
    #[arg(long, env = "PDF_TRANSLATE_HEADLESS")]
    headless: bool,

    /// Chrome/Chromium executable.
    #[arg(long, env = "CHROME")]
    chrome_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_TRANSLATE_PASSWORD")]
    password: Option<String>,

    /// Regex removed from every page before translation (repeatable).
    #[arg(long = "strip", value_name = "REGEX")]
    strip: Vec<String>,

    /// Max wait for the previous translation to clear, in ms.
    #[arg(long, default_value_t = 5000)]
    clear_timeout_ms: u64,

    /// Max wait for a translation to settle, in ms.
    #[arg(long, default_value_t = 15000)]
    convergence_timeout_ms: u64,

    /// How long the output must stay unchanged to count as final, in ms.
    #[arg(long, default_value_t = 5000)]
    stability_window_ms: u64,

    /// Interval between reads of the output area, in ms.
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF_TRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print per-page results as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_TRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_TRANSLATE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run translation ──────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = translate_to_file(&cli.input, output_path, &config)
            .await
            .context("Translation failed")?;
        if !cli.quiet {
            print_summary(&stats, &output_path.display().to_string());
        }
    } else {
        let output = translate_document(&cli.input, &config)
            .await
            .context("Translation failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else if !cli.quiet {
            print_summary(&output.stats, &output.output_path.display().to_string());
            let failed = output.failed_indices();
            if !failed.is_empty() {
                let pages: Vec<String> = failed.iter().map(|i| (i + 1).to_string()).collect();
                eprintln!("   {} {}", red("failed pages:"), pages.join(", "));
            }
        }
    }

    Ok(())
}

fn print_summary(stats: &TranslationStats, destination: &str) {
    eprintln!(
        "{}  {}/{} pages  {} timed out  {} blank  {} failed  {}ms  →  {}",
        if stats.failed_pages == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.translated_pages,
        stats.total_pages,
        stats.timed_out_pages,
        stats.empty_pages,
        stats.failed_pages,
        stats.total_duration_ms,
        bold(destination),
    );
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .headless(cli.headless)
        .strip_patterns(cli.strip.clone())
        .clear_timeout_ms(cli.clear_timeout_ms)
        .convergence_timeout_ms(cli.convergence_timeout_ms)
        .stability_window_ms(cli.stability_window_ms)
        .poll_interval_ms(cli.poll_interval_ms)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.chrome_path {
        builder = builder.chrome_path(path);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["pdf-translate", "doc.pdf"]);
        let config = build_config(&cli, None).unwrap();
        let defaults = TranslationConfig::default();
        assert_eq!(config.stability, defaults.stability);
        assert!(!config.headless);
    }

    #[test]
    fn repeated_strip_flags_collect() {
        let cli = Cli::parse_from(["pdf-translate", "doc.pdf", "--strip", "a", "--strip", "b+"]);
        assert_eq!(cli.strip, vec!["a".to_string(), "b+".to_string()]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.strip_patterns.len(), 2);
    }

    #[test]
    fn truncate_keeps_short_and_cuts_long() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("abcdef", 4), "abc\u{2026}");
    }
}
