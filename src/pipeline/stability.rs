//! Convergence detection for an incrementally rendered translation.
//!
//! The translation UI gives no completion signal: after a submission it first
//! clears the previous output, then streams fragments in, sometimes
//! re-rendering them several times. The only robust proxy for "done" is a
//! settle window with no observed change.
//!
//! The detector is an explicit state machine:
//!
//! ```text
//! Idle ──▶ Clearing ──▶ Converging ──▶ Stable
//!            │  (region empty, or        │
//!            │   clear timeout elapsed)  └──▶ TimedOut (overall timeout)
//! ```
//!
//! Time is read through [`Clock`] so tests can drive the machine with a
//! [`ManualClock`] instead of sleeping.

use super::session::TranslationSession;
use crate::error::PageError;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tunable timings of the stability protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityTimings {
    /// Upper bound on waiting for the previous output to disappear. Default: 5 s.
    pub clear_timeout: Duration,
    /// Poll interval during the clear phase. Default: 250 ms.
    pub clear_poll_interval: Duration,
    /// Upper bound on the convergence phase. Default: 15 s.
    pub convergence_timeout: Duration,
    /// How long the output must stay unchanged to be accepted. Default: 5 s.
    ///
    /// Long enough to absorb staggered re-renders, short enough to keep
    /// per-page latency bounded.
    pub stability_window: Duration,
    /// Poll interval during the convergence phase. Default: 500 ms.
    pub poll_interval: Duration,
}

impl Default for StabilityTimings {
    fn default() -> Self {
        Self {
            clear_timeout: Duration::from_secs(5),
            clear_poll_interval: Duration::from_millis(250),
            convergence_timeout: Duration::from_secs(15),
            stability_window: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Source of time for the detector.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock; sleeps block the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: `sleep` advances time instantly.
///
/// Used to test timing behaviour without real waits.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// Time advanced since construction.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Final value reported by [`StabilityDetector::await_stable_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableText {
    /// Fragments joined with `\n`.
    pub text: String,
    /// `true` when the overall timeout elapsed before convergence.
    pub timed_out: bool,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Clearing {
        deadline: Instant,
    },
    Converging {
        deadline: Instant,
        last: String,
        changed_at: Instant,
    },
    Stable(String),
    TimedOut(String),
}

/// Polls a session's output region until it settles.
pub struct StabilityDetector<'a> {
    timings: StabilityTimings,
    clock: &'a dyn Clock,
}

impl<'a> StabilityDetector<'a> {
    pub fn new(timings: StabilityTimings, clock: &'a dyn Clock) -> Self {
        Self { timings, clock }
    }

    /// Wait for the translated text to converge.
    ///
    /// Returns no later than `clear_timeout + convergence_timeout` after the
    /// call. A read failure aborts the wait with the session's error.
    ///
    /// Blank output never counts as converged, even after a full stability
    /// window: a region that stays empty (or whitespace only) ends in
    /// `timed_out` with whatever was last read. The text is returned as
    /// read: fragments joined by `\n`, not trimmed.
    pub fn await_stable_text<S>(&self, session: &mut S) -> Result<StableText, PageError>
    where
        S: TranslationSession + ?Sized,
    {
        let mut phase = Phase::Idle;
        loop {
            phase = match phase {
                Phase::Idle => Phase::Clearing {
                    deadline: self.clock.now() + self.timings.clear_timeout,
                },

                Phase::Clearing { deadline } => {
                    let now = self.clock.now();
                    if now >= deadline {
                        // Leftover output from the previous page never
                        // disappeared; proceed anyway.
                        debug!("clear phase timed out, converging on current output");
                        self.begin_converging(now)
                    } else if read_text(session)?.trim().is_empty() {
                        self.begin_converging(now)
                    } else {
                        self.sleep_until(self.timings.clear_poll_interval, deadline);
                        Phase::Clearing { deadline }
                    }
                }

                Phase::Converging {
                    deadline,
                    last,
                    changed_at,
                } => {
                    let now = self.clock.now();
                    if now >= deadline {
                        Phase::TimedOut(last)
                    } else {
                        let text = read_text(session)?;
                        if text != last {
                            self.sleep_until(self.timings.poll_interval, deadline);
                            Phase::Converging {
                                deadline,
                                last: text,
                                changed_at: now,
                            }
                        } else if !text.trim().is_empty()
                            && now.duration_since(changed_at) >= self.timings.stability_window
                        {
                            Phase::Stable(text)
                        } else {
                            self.sleep_until(self.timings.poll_interval, deadline);
                            Phase::Converging {
                                deadline,
                                last,
                                changed_at,
                            }
                        }
                    }
                }

                Phase::Stable(text) => {
                    return Ok(StableText {
                        text,
                        timed_out: false,
                    })
                }

                Phase::TimedOut(text) => {
                    warn!(
                        chars = text.chars().count(),
                        "translation did not settle within {:?}",
                        self.timings.convergence_timeout
                    );
                    return Ok(StableText {
                        text,
                        timed_out: true,
                    });
                }
            };
        }
    }

    fn begin_converging(&self, now: Instant) -> Phase {
        Phase::Converging {
            deadline: now + self.timings.convergence_timeout,
            last: String::new(),
            changed_at: now,
        }
    }

    /// Sleep for `interval`, but never past `deadline`.
    fn sleep_until(&self, interval: Duration, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(self.clock.now());
        self.clock.sleep(interval.min(remaining));
    }
}

fn read_text<S>(session: &mut S) -> Result<String, PageError>
where
    S: TranslationSession + ?Sized,
{
    Ok(session.read_fragments()?.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Output region whose content is a function of elapsed clock time.
    struct ScriptedOutput<F: FnMut(Duration) -> Vec<String>> {
        clock: Arc<ManualClock>,
        script: F,
        reads: usize,
    }

    impl<F: FnMut(Duration) -> Vec<String>> TranslationSession for ScriptedOutput<F> {
        fn submit(&mut self, _text: &str) -> Result<(), PageError> {
            Ok(())
        }

        fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
            self.reads += 1;
            Ok((self.script)(self.clock.elapsed()))
        }

        fn close(&mut self) {}
    }

    fn scripted<F: FnMut(Duration) -> Vec<String>>(
        clock: &Arc<ManualClock>,
        script: F,
    ) -> ScriptedOutput<F> {
        ScriptedOutput {
            clock: Arc::clone(clock),
            script,
            reads: 0,
        }
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn converges_one_window_after_last_change() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |t| {
            if t < secs(1.0) {
                vec![]
            } else if t < secs(2.0) {
                vec!["سل".to_string()]
            } else {
                vec!["سلام".to_string(), "دنیا".to_string()]
            }
        });

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert_eq!(result.text, "سلام\nدنیا");
        assert!(!result.timed_out);
        // Final value first seen at t=2.0; accepted once 5 s have passed.
        let elapsed = clock.elapsed();
        assert!(elapsed >= secs(7.0), "returned too early: {elapsed:?}");
        assert!(elapsed <= secs(7.5), "returned too late: {elapsed:?}");
    }

    #[test]
    fn never_settling_output_times_out_at_deadline() {
        let clock = Arc::new(ManualClock::new());
        let mut n = 0usize;
        let mut output = scripted(&clock, move |_| {
            n += 1;
            if n == 1 {
                vec![]
            } else {
                vec![format!("draft {n}")]
            }
        });

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert!(result.timed_out);
        assert!(result.text.starts_with("draft "));
        assert_eq!(clock.elapsed(), secs(15.0));
    }

    #[test]
    fn stale_output_falls_through_after_clear_timeout() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |_| vec!["previous page".to_string()]);

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert_eq!(result.text, "previous page");
        assert!(!result.timed_out);
        // 5 s clear timeout, then 5 s stability window.
        assert_eq!(clock.elapsed(), secs(10.0));
    }

    #[test]
    fn empty_output_is_never_accepted_as_stable() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |_| vec![]);

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert!(result.timed_out);
        assert_eq!(result.text, "");
        assert_eq!(clock.elapsed(), secs(15.0));
    }

    #[test]
    fn fragments_are_joined_untrimmed() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |t| {
            if t < secs(1.0) {
                vec![]
            } else {
                vec![" سلام".to_string(), "دنیا ".to_string()]
            }
        });

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert_eq!(result.text, " سلام\nدنیا ");
        assert!(!result.timed_out);
    }

    #[test]
    fn whitespace_only_output_is_not_stable() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |_| vec![" ".to_string()]);

        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert!(result.timed_out);
        assert_eq!(result.text, " ");
        assert_eq!(clock.elapsed(), secs(15.0));
    }

    #[test]
    fn custom_timings_are_honoured() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |t| {
            if t.is_zero() {
                vec![]
            } else {
                vec!["ok".to_string()]
            }
        });
        let timings = StabilityTimings {
            clear_timeout: secs(1.0),
            clear_poll_interval: secs(0.1),
            convergence_timeout: secs(3.0),
            stability_window: secs(1.0),
            poll_interval: secs(0.2),
        };

        let detector = StabilityDetector::new(timings, clock.as_ref());
        let result = detector.await_stable_text(&mut output).unwrap();

        assert_eq!(result.text, "ok");
        assert!(!result.timed_out);
        assert!(clock.elapsed() <= secs(1.4));
    }

    #[test]
    fn read_failure_propagates() {
        struct Broken;
        impl TranslationSession for Broken {
            fn submit(&mut self, _text: &str) -> Result<(), PageError> {
                Ok(())
            }
            fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
                Err(PageError::browser("tab crashed"))
            }
            fn close(&mut self) {}
        }

        let clock = ManualClock::new();
        let detector = StabilityDetector::new(StabilityTimings::default(), &clock);
        let err = detector.await_stable_text(&mut Broken).unwrap_err();
        assert_eq!(err, PageError::browser("tab crashed"));
    }

    #[test]
    fn polls_at_configured_interval() {
        let clock = Arc::new(ManualClock::new());
        let mut output = scripted(&clock, |_| vec![]);
        let detector = StabilityDetector::new(StabilityTimings::default(), clock.as_ref());
        detector.await_stable_text(&mut output).unwrap();
        // One clear-phase read, then reads at 0.0, 0.5, …, 14.5.
        assert_eq!(output.reads, 1 + 30);
    }
}
