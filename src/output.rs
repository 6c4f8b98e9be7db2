//! Data model shared by the pipeline stages and returned to callers.

use crate::error::{PageError, TranslateError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One page of cleaned source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index in the source document.
    pub index: usize,
    /// Cleaned text; may be empty or whitespace-only.
    pub source_text: String,
}

impl Page {
    pub fn new(index: usize, source_text: impl Into<String>) -> Self {
        Self {
            index,
            source_text: source_text.into(),
        }
    }

    /// Blank pages are never sent to the translation service.
    pub fn is_blank(&self) -> bool {
        self.source_text.trim().is_empty()
    }

    /// Wrap a sequence of texts as pages indexed `0..n`.
    pub fn from_texts<I, S>(texts: I) -> Vec<Page>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page::new(index, text))
            .collect()
    }
}

/// Outcome class of one page's translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationStatus {
    /// The displayed translation converged.
    Ok,
    /// The source page was blank; nothing was submitted.
    Empty,
    /// The output never settled; `text` is the last value observed.
    TimedOut,
    /// The page could not be processed; see `error`.
    Failed,
}

/// Translation of a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    /// 0-based index of the source page.
    pub index: usize,
    /// Translated text (fragments joined by `\n`). Empty for `Empty`/`Failed`.
    pub text: String,
    pub status: TranslationStatus,
    /// Wall-clock time spent on this page in milliseconds.
    pub duration_ms: u64,
    /// Set when `status == Failed`.
    pub error: Option<PageError>,
}

impl TranslationResult {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            status: TranslationStatus::Empty,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn failed(index: usize, error: PageError, duration_ms: u64) -> Self {
        Self {
            index,
            text: String::new(),
            status: TranslationStatus::Failed,
            duration_ms,
            error: Some(error),
        }
    }

    /// `Ok` and `TimedOut` both carry usable text.
    pub fn has_text(&self) -> bool {
        matches!(
            self.status,
            TranslationStatus::Ok | TranslationStatus::TimedOut
        ) && !self.text.is_empty()
    }
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationStats {
    pub total_pages: usize,
    pub translated_pages: usize,
    pub timed_out_pages: usize,
    pub empty_pages: usize,
    pub failed_pages: usize,
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub translate_duration_ms: u64,
    pub compose_duration_ms: u64,
}

impl TranslationStats {
    /// Count statuses; durations are filled in by the caller.
    pub fn tally(results: &[TranslationResult]) -> Self {
        let count = |s: TranslationStatus| results.iter().filter(|r| r.status == s).count();
        Self {
            total_pages: results.len(),
            translated_pages: count(TranslationStatus::Ok),
            timed_out_pages: count(TranslationStatus::TimedOut),
            empty_pages: count(TranslationStatus::Empty),
            failed_pages: count(TranslationStatus::Failed),
            ..Default::default()
        }
    }
}

/// Everything produced by a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// Where the composed document was written.
    pub output_path: PathBuf,
    /// One result per page, in page order.
    pub results: Vec<TranslationResult>,
    pub stats: TranslationStats,
}

impl TranslationOutput {
    /// Indices of pages that failed, for a targeted re-run.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.status == TranslationStatus::Failed)
            .map(|r| r.index)
            .collect()
    }

    /// Treat any failed page as an error.
    pub fn into_result(self) -> Result<Self, TranslateError> {
        if self.stats.failed_pages == 0 {
            return Ok(self);
        }
        Err(TranslateError::PartialFailure {
            translated: self.stats.translated_pages + self.stats.timed_out_pages,
            failed: self.stats.failed_pages,
            total: self.stats.total_pages,
        })
    }
}
