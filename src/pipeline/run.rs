//! Sequencing pages through one translation session.
//!
//! Pages are processed strictly one at a time: the translation UI has a
//! single input box and a single output region, so concurrent submissions
//! could not be told apart. Each page's failure is contained; the session is
//! closed exactly once whatever happens.

use super::session::TranslationSession;
use super::stability::{Clock, StabilityDetector, StabilityTimings, StableText, SystemClock};
use crate::error::{PageError, TranslateError};
use crate::output::{Page, TranslationResult, TranslationStatus};
use crate::progress::ProgressCallback;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives pages through a [`TranslationSession`].
pub struct TranslationPipeline {
    timings: StabilityTimings,
    clock: Arc<dyn Clock>,
    progress: Option<ProgressCallback>,
}

impl TranslationPipeline {
    /// Pipeline on the wall clock.
    pub fn new(timings: StabilityTimings) -> Self {
        Self::with_clock(timings, Arc::new(SystemClock))
    }

    /// Pipeline on an injected clock (e.g. [`super::stability::ManualClock`]).
    pub fn with_clock(timings: StabilityTimings, clock: Arc<dyn Clock>) -> Self {
        Self {
            timings,
            clock,
            progress: None,
        }
    }

    pub fn progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Translate `pages` in order.
    ///
    /// `open` is invoked once to create the session. If it fails the run is
    /// aborted with that error and no results. Otherwise exactly one result
    /// is returned per page, in input order, each carrying its page's index.
    pub fn run<S, F>(&self, open: F, pages: &[Page]) -> Result<Vec<TranslationResult>, TranslateError>
    where
        S: TranslationSession,
        F: FnOnce() -> Result<S, TranslateError>,
    {
        let total = pages.len();
        let mut guard = SessionGuard { session: open()? };
        let mut results = Vec::with_capacity(total);

        for page in pages {
            if let Some(ref cb) = self.progress {
                cb.on_page_start(page.index, total);
            }
            let result = self.translate_page(&mut guard.session, page);
            info!(
                page = page.index + 1,
                total,
                status = ?result.status,
                elapsed_ms = result.duration_ms,
                "Page processed"
            );
            if let Some(ref cb) = self.progress {
                cb.on_page_complete(&result, total);
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Translate one page, never failing past this call.
    pub fn translate_page<S>(&self, session: &mut S, page: &Page) -> TranslationResult
    where
        S: TranslationSession + ?Sized,
    {
        if page.is_blank() {
            return TranslationResult::empty(page.index);
        }

        let start = Instant::now();
        let detector = StabilityDetector::new(self.timings, self.clock.as_ref());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<StableText, PageError> {
            session.submit(&page.source_text)?;
            detector.await_stable_text(session)
        }));
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(stable)) => TranslationResult {
                index: page.index,
                text: stable.text,
                status: if stable.timed_out {
                    TranslationStatus::TimedOut
                } else {
                    TranslationStatus::Ok
                },
                duration_ms,
                error: None,
            },
            Ok(Err(e)) => {
                warn!(page = page.index + 1, "Translation failed: {e}");
                TranslationResult::failed(page.index, e, duration_ms)
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                warn!(page = page.index + 1, "Translation panicked: {detail}");
                TranslationResult::failed(page.index, PageError::Panicked { detail }, duration_ms)
            }
        }
    }
}

/// Closes the session when the run ends, including by unwinding.
struct SessionGuard<S: TranslationSession> {
    session: S,
}

impl<S: TranslationSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stability::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the submitted text back as its "translation".
    #[derive(Default)]
    struct EchoSession {
        submitted: Vec<String>,
        current: Option<String>,
        closes: Arc<AtomicUsize>,
    }

    impl TranslationSession for EchoSession {
        fn submit(&mut self, text: &str) -> Result<(), PageError> {
            self.submitted.push(text.to_string());
            self.current = Some(text.to_uppercase());
            Ok(())
        }

        fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
            Ok(self.current.iter().cloned().collect())
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pipeline() -> TranslationPipeline {
        TranslationPipeline::with_clock(StabilityTimings::default(), Arc::new(ManualClock::new()))
    }

    #[test]
    fn blank_page_skips_session() {
        let mut session = EchoSession::default();
        let result = pipeline().translate_page(&mut session, &Page::new(3, "  \n "));
        assert_eq!(result.status, TranslationStatus::Empty);
        assert_eq!(result.index, 3);
        assert_eq!(result.text, "");
        assert!(session.submitted.is_empty());
    }

    #[test]
    fn translated_page_is_ok() {
        let mut session = EchoSession::default();
        let result = pipeline().translate_page(&mut session, &Page::new(0, "hello"));
        assert_eq!(result.status, TranslationStatus::Ok);
        assert_eq!(result.text, "HELLO");
        assert!(result.error.is_none());
    }

    #[test]
    fn panic_is_recorded_as_failed() {
        struct Exploding;
        impl TranslationSession for Exploding {
            fn submit(&mut self, _text: &str) -> Result<(), PageError> {
                panic!("selector engine blew up");
            }
            fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
                Ok(vec![])
            }
            fn close(&mut self) {}
        }

        let result = pipeline().translate_page(&mut Exploding, &Page::new(1, "text"));
        assert_eq!(result.status, TranslationStatus::Failed);
        assert_eq!(
            result.error,
            Some(PageError::Panicked {
                detail: "selector engine blew up".into()
            })
        );
    }

    #[test]
    fn open_failure_aborts_without_results() {
        let outcome = pipeline().run(
            || -> Result<EchoSession, TranslateError> {
                Err(TranslateError::SessionStart {
                    reason: "no chrome".into(),
                })
            },
            &Page::from_texts(["a"]),
        );
        assert!(matches!(outcome, Err(TranslateError::SessionStart { .. })));
    }

    #[test]
    fn run_closes_session_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let session = EchoSession {
            closes: Arc::clone(&closes),
            ..Default::default()
        };
        let results = pipeline()
            .run(move || Ok(session), &Page::from_texts(["one", "", "three"]))
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_message_extracts_strings() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
