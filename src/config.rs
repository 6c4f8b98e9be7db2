//! Configuration types for PDF translation.
//!
//! All behaviour is controlled through [`TranslationConfig`], built via its
//! [`TranslationConfigBuilder`]. The defaults reproduce the tool's original
//! behaviour: English to Persian, a visible browser window, a 5 s clear
//! phase, a 15 s convergence bound with a 5 s stability window, and output
//! written to the user's Desktop.

use crate::error::TranslateError;
use crate::pipeline::normalize::compile_strip_patterns;
use crate::pipeline::session::{default_service_url, DEFAULT_USER_AGENT};
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::pipeline::stability::StabilityTimings;

/// Configuration for a PDF translation run.
///
/// Built via [`TranslationConfig::builder()`] or using
/// [`TranslationConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_translate::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .headless(true)
///     .stability_window_ms(3000)
///     .strip_pattern(r"Chapter \d+ Review")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    // ── Browser ──────────────────────────────────────────────────────────
    /// Run Chrome without a window. Default: false.
    ///
    /// The translation site is friendlier to a visible browser; headless is
    /// useful on servers and in CI.
    pub headless: bool,

    /// Chrome/Chromium binary. If None, the usual install locations are searched.
    pub chrome_path: Option<PathBuf>,

    /// Window position in screen pixels. Default: (768, 10).
    pub window_position: (i32, i32),

    /// Window size in pixels. Default: (768, 864).
    pub window_size: (u32, u32),

    /// User agent presented to the site.
    pub user_agent: String,

    /// Translation UI URL, with the language pair preselected.
    pub service_url: String,

    /// Bound on launching Chrome and loading the UI, in seconds. Default: 30.
    pub startup_timeout_secs: u64,

    /// Bound on locating the input box for each page, in seconds. Default: 15.
    pub element_timeout_secs: u64,

    // ── Convergence ──────────────────────────────────────────────────────
    /// Clear/convergence timings. See [`StabilityTimings`].
    pub stability: StabilityTimings,

    // ── Source ───────────────────────────────────────────────────────────
    /// Extra boilerplate removed from every page before translation
    /// (regular expressions, e.g. running headers). Default: none.
    pub strip_patterns: Vec<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    // ── Output ───────────────────────────────────────────────────────────
    /// Longest edge of each rendered page image, in pixels. Default: 1600.
    pub max_rendered_pixels: u32,

    /// Width of each page image in the document, in inches. Default: 6.0.
    pub image_width_inches: f32,

    /// Directory for `<name>_translated.docx`. If None, the Desktop.
    pub output_dir: Option<PathBuf>,

    /// Receives per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            window_position: (768, 10),
            window_size: (768, 864),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            service_url: default_service_url(),
            startup_timeout_secs: 30,
            element_timeout_secs: 15,
            stability: StabilityTimings::default(),
            strip_patterns: Vec::new(),
            password: None,
            download_timeout_secs: 120,
            max_rendered_pixels: 1600,
            image_width_inches: 6.0,
            output_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("headless", &self.headless)
            .field("chrome_path", &self.chrome_path)
            .field("window_position", &self.window_position)
            .field("window_size", &self.window_size)
            .field("service_url", &self.service_url)
            .field("startup_timeout_secs", &self.startup_timeout_secs)
            .field("element_timeout_secs", &self.element_timeout_secs)
            .field("stability", &self.stability)
            .field("strip_patterns", &self.strip_patterns)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("image_width_inches", &self.image_width_inches)
            .field("output_dir", &self.output_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn TranslationProgressCallback>"),
            )
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory the output document is written to.
    ///
    /// Falls back from the Desktop to the home directory to the current
    /// directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::desktop_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// `<output dir>/<stem>_translated.docx` for the given source PDF.
    pub fn output_path_for(&self, source: &Path) -> PathBuf {
        self.resolved_output_dir().join(translated_file_name(source))
    }
}

/// `<stem>_translated.docx`.
pub fn translated_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}_translated.docx")
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn window_position(mut self, x: i32, y: i32) -> Self {
        self.config.window_position = (x, y);
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.window_size = (width.max(320), height.max(240));
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.config.service_url = url.into();
        self
    }

    pub fn startup_timeout_secs(mut self, secs: u64) -> Self {
        self.config.startup_timeout_secs = secs.max(1);
        self
    }

    pub fn element_timeout_secs(mut self, secs: u64) -> Self {
        self.config.element_timeout_secs = secs.max(1);
        self
    }

    pub fn stability(mut self, timings: StabilityTimings) -> Self {
        self.config.stability = timings;
        self
    }

    pub fn clear_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stability.clear_timeout = Duration::from_millis(ms);
        self
    }

    pub fn convergence_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stability.convergence_timeout = Duration::from_millis(ms);
        self
    }

    pub fn stability_window_ms(mut self, ms: u64) -> Self {
        self.config.stability.stability_window = Duration::from_millis(ms);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.stability.poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn strip_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.strip_patterns.push(pattern.into());
        self
    }

    pub fn strip_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.strip_patterns = patterns;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn image_width_inches(mut self, inches: f32) -> Self {
        self.config.image_width_inches = inches.clamp(1.0, 8.5);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslateError> {
        let s = &self.config.stability;
        if s.poll_interval.is_zero() || s.clear_poll_interval.is_zero() {
            return Err(TranslateError::InvalidConfig(
                "Poll intervals must be > 0".into(),
            ));
        }
        if s.stability_window >= s.convergence_timeout {
            return Err(TranslateError::InvalidConfig(format!(
                "Stability window ({:?}) must be shorter than the convergence timeout ({:?})",
                s.stability_window, s.convergence_timeout
            )));
        }
        if !self.config.service_url.starts_with("http://")
            && !self.config.service_url.starts_with("https://")
        {
            return Err(TranslateError::InvalidConfig(format!(
                "Service URL must be http(s), got '{}'",
                self.config.service_url
            )));
        }
        compile_strip_patterns(&self.config.strip_patterns)?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_timings() {
        let c = TranslationConfig::default();
        assert_eq!(c.stability.clear_timeout, Duration::from_secs(5));
        assert_eq!(c.stability.convergence_timeout, Duration::from_secs(15));
        assert_eq!(c.stability.stability_window, Duration::from_secs(5));
        assert_eq!(c.stability.poll_interval, Duration::from_millis(500));
        assert_eq!(c.element_timeout_secs, 15);
        assert!(c.service_url.contains("tl=fa"));
    }

    #[test]
    fn window_must_be_shorter_than_timeout() {
        let err = TranslationConfig::builder()
            .stability_window_ms(20_000)
            .build()
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidConfig(_)));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        assert!(TranslationConfig::builder().poll_interval_ms(0).build().is_err());
    }

    #[test]
    fn bad_strip_pattern_rejected() {
        let err = TranslationConfig::builder()
            .strip_pattern("(unclosed")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("(unclosed"), "got: {err}");
    }

    #[test]
    fn non_http_service_url_rejected() {
        assert!(TranslationConfig::builder()
            .service_url("file:///tmp/x.html")
            .build()
            .is_err());
    }

    #[test]
    fn output_name_derives_from_stem() {
        assert_eq!(
            translated_file_name(Path::new("/tmp/Lecture 3.pdf")),
            "Lecture 3_translated.docx"
        );
        assert_eq!(translated_file_name(Path::new("")), "document_translated.docx");

        let c = TranslationConfig::builder()
            .output_dir("/srv/out")
            .build()
            .unwrap();
        assert_eq!(
            c.output_path_for(Path::new("/in/book.pdf")),
            PathBuf::from("/srv/out/book_translated.docx")
        );
    }

    #[test]
    fn password_redacted_in_debug() {
        let c = TranslationConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
    }
}
