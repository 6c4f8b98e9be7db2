//! Document-level entry points.
//!
//! ```text
//! resolve ──▶ extract ──▶ normalize ──▶ translate ──▶ compose
//! (path/URL)  (pdfium)    (cleanup)     (browser)     (.docx)
//! ```
//!
//! Only the first stage is async I/O. Extraction, the browser session and
//! composition are blocking and run under `spawn_blocking`.

use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::output::{Page, TranslationOutput, TranslationStats};
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::run::TranslationPipeline;
use crate::pipeline::session::ChromeSession;
use crate::pipeline::{compose, extract, input};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Translate a PDF file or URL and write `<stem>_translated.docx` to the
/// configured output directory.
///
/// # Returns
/// `Ok(TranslationOutput)` once the document is written, even if some pages
/// failed (see `output.stats.failed_pages`, or call
/// [`TranslationOutput::into_result`] to treat that as an error).
///
/// # Errors
/// Only fatal errors: unreadable input, a PDF pdfium cannot open, a browser
/// session that cannot be started, or an output that cannot be written.
///
/// # Example
/// ```rust,no_run
/// use pdf_translate::{translate_document, TranslationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TranslationConfig::builder().headless(true).build()?;
/// let output = translate_document("lecture.pdf", &config).await?;
/// println!("{} → {}", output.stats.translated_pages, output.output_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn translate_document(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    translate_into(input_str.as_ref(), None, config).await
}

/// Translate a PDF and write the document to `output_path`.
pub async fn translate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &TranslationConfig,
) -> Result<TranslationStats, TranslateError> {
    let output = translate_into(input_str.as_ref(), Some(output_path.as_ref()), config).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`translate_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_document_sync(
    input_str: impl AsRef<str>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(translate_document(input_str, config))
}

async fn translate_into(
    input_str: &str,
    output_path: Option<&Path>,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let total_start = Instant::now();
    info!("Starting translation: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();
    let output_path: PathBuf = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_path_for(&pdf_path));

    // ── Step 2: Extract and clean page text ──────────────────────────────
    let normalizer = Normalizer::new(&config.strip_patterns)?;
    let extract_start = Instant::now();
    let raw = extract::extract_pages(&pdf_path, config.password.as_deref()).await?;
    let pages = Page::from_texts(raw.iter().map(|t| normalizer.normalize(t)));
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let total_pages = pages.len();
    info!("PDF has {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_pages);
    }

    // ── Step 3: Translate page by page ───────────────────────────────────
    let translate_start = Instant::now();
    let pipeline =
        TranslationPipeline::new(config.stability).progress(config.progress_callback.clone());
    let session_config = config.clone();
    let results = tokio::task::spawn_blocking(move || {
        pipeline.run(|| ChromeSession::open(&session_config), &pages)
    })
    .await
    .map_err(|e| TranslateError::Internal(format!("Translation task panicked: {}", e)))??;
    let translate_duration_ms = translate_start.elapsed().as_millis() as u64;

    // ── Step 4: Compose the output document ──────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_compose_start(total_pages);
    }
    let compose_start = Instant::now();
    let written = compose::compose(&pdf_path, &results, &output_path, config).await?;
    let compose_duration_ms = compose_start.elapsed().as_millis() as u64;

    let stats = TranslationStats {
        extract_duration_ms,
        translate_duration_ms,
        compose_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ..TranslationStats::tally(&results)
    };

    info!(
        "Translation complete: {}/{} pages ({} timed out, {} failed), {}ms total",
        stats.translated_pages,
        stats.total_pages,
        stats.timed_out_pages,
        stats.failed_pages,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_pages, stats.translated_pages + stats.timed_out_pages);
    }

    Ok(TranslationOutput {
        output_path: written,
        results,
        stats,
    })
}
