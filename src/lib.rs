//! # pdf-translate
//!
//! Translate PDF documents page by page through a web translation UI and
//! assemble a Word document that pairs every page image with its translation.
//!
//! ## How it works
//!
//! The translation site offers no API; it shows a text box and re-renders its
//! output while the translation streams in. This crate drives that page in a
//! Chrome session, submits one page of cleaned text at a time, and watches the
//! output until it stops changing for a stability window (or a timeout hits).
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text via pdfium (spawn_blocking)
//!  ├─ 3. Normalize  join soft wraps, strip boilerplate, split bullets
//!  ├─ 4. Translate  one Chrome session, pages strictly in order,
//!  │                each page isolated from the others' failures
//!  └─ 5. Compose    page image + right-to-left translation per page (.docx)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_translate::{translate_document, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranslationConfig::builder().headless(true).build()?;
//!     let output = translate_document("lecture.pdf", &config).await?;
//!     eprintln!(
//!         "{}/{} pages translated → {}",
//!         output.stats.translated_pages,
//!         output.stats.total_pages,
//!         output.output_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a browser
//!
//! [`TranslationPipeline`] is generic over [`TranslationSession`] and takes an
//! injectable [`Clock`]; pair a scripted session with [`ManualClock`] to run
//! convergence scenarios instantly.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-translate` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{translated_file_name, StabilityTimings, TranslationConfig, TranslationConfigBuilder};
pub use error::{PageError, TranslateError};
pub use output::{Page, TranslationOutput, TranslationResult, TranslationStats, TranslationStatus};
pub use pipeline::normalize::{normalize, Normalizer};
pub use pipeline::run::TranslationPipeline;
pub use pipeline::session::{ChromeSession, TranslationSession};
pub use pipeline::stability::{Clock, ManualClock, StabilityDetector, StableText, SystemClock};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use translate::{translate_document, translate_document_sync, translate_to_file};
