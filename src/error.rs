//! Error types for the pdf-translate library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranslateError`] — **Fatal**: the run cannot proceed at all (missing
//!   input, unreadable PDF, browser session could not be started, output
//!   could not be written). Returned as `Err(TranslateError)` from the
//!   top-level `translate*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be translated
//!   (the translation UI changed, the browser misbehaved mid-page) but the
//!   other pages are fine. Stored inside [`crate::output::TranslationResult`]
//!   so one bad page never costs the whole document.
//!
//! A convergence timeout is neither: it is a degraded success reported
//! through [`crate::output::TranslationStatus::TimedOut`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not rasterise a page for the output document.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Session errors ────────────────────────────────────────────────────
    /// The browser could not be launched or the translation UI did not load.
    #[error("Could not start the translation browser session: {reason}\nIs Chrome or Chromium installed? Point --chrome-path at it if it is not on PATH.")]
    SessionStart { reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Assembling the output document failed.
    #[error("Failed to compose document '{path}': {detail}")]
    Compose { path: PathBuf, detail: String },

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// At least one page failed to translate.
    ///
    /// Returned by [`crate::output::TranslationOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed to translate")]
    PartialFailure {
        translated: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored on [`crate::output::TranslationResult`] when a page is `Failed`.
/// The run always continues with the next page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// An expected element of the translation UI is missing or has changed.
    #[error("locator '{locator}' not found: {detail}")]
    LocatorNotFound { locator: String, detail: String },

    /// The browser rejected an interaction (dead tab, script error, …).
    #[error("browser interaction failed: {detail}")]
    Browser { detail: String },

    /// A panic escaped the page's processing and was contained.
    #[error("page processing panicked: {detail}")]
    Panicked { detail: String },
}

impl PageError {
    pub(crate) fn browser(detail: impl std::fmt::Display) -> Self {
        PageError::Browser {
            detail: detail.to_string(),
        }
    }
}
