//! Progress-callback trait for per-page translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the document. Events are advisory:
//! nothing in the pipeline depends on what the callback does.
//!
//! # Example
//!
//! ```rust
//! use pdf_translate::{TranslationConfig, TranslationProgressCallback, TranslationResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl TranslationProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, result: &TranslationResult, total_pages: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total_pages}: page {} {:?}", result.index + 1, result.status);
//!     }
//! }
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::TranslationResult;
use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// Pages are translated sequentially, so events for one run never overlap;
/// the trait is still `Send + Sync` because the pipeline runs on a blocking
/// worker thread. All methods default to no-ops.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once after text extraction, before the browser is launched.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is submitted (or skipped, if blank).
    ///
    /// # Arguments
    /// * `index`       — 0-based page index
    /// * `total_pages` — pages in this run
    fn on_page_start(&self, index: usize, total_pages: usize) {
        let _ = (index, total_pages);
    }

    /// Called with the finished result of every page, whatever its status.
    ///
    /// `result.duration_ms` holds the page's elapsed time.
    fn on_page_complete(&self, result: &TranslationResult, total_pages: usize) {
        let _ = (result, total_pages);
    }

    /// Called before the output document is assembled.
    fn on_compose_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called once after the output document has been written.
    ///
    /// # Arguments
    /// * `total_pages`      — pages in the document
    /// * `translated_pages` — pages with usable translated text
    fn on_run_complete(&self, total_pages: usize, translated_pages: usize) {
        let _ = (total_pages, translated_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TranslationStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        failed: AtomicUsize,
        completes: AtomicUsize,
        translated_total: AtomicUsize,
    }

    impl TranslationProgressCallback for TrackingCallback {
        fn on_page_start(&self, _index: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, result: &TranslationResult, _total_pages: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if result.status == TranslationStatus::Failed {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_run_complete(&self, _total_pages: usize, translated_pages: usize) {
            self.translated_total.store(translated_pages, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_page_start(0, 5);
        cb.on_page_complete(&TranslationResult::empty(0), 5);
        cb.on_compose_start(5);
        cb.on_run_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(0, 2);
        tracker.on_page_complete(&TranslationResult::empty(0), 2);
        tracker.on_page_start(1, 2);
        tracker.on_page_complete(
            &TranslationResult::failed(1, crate::error::PageError::browser("gone"), 10),
            2,
        );
        tracker.on_run_complete(2, 0);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.translated_total.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_page_start(0, 10);
    }
}
