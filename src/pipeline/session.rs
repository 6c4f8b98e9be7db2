//! Browser session bound to the translation web UI.
//!
//! The translation service is a human-facing website, not an API. Everything
//! that depends on its markup (URL, selectors, how text is entered) lives in
//! this module behind the narrow [`TranslationSession`] trait, so the
//! stability and pipeline logic never touch the DOM and can be tested with a
//! mock session.
//!
//! [`ChromeSession`] drives a real Chrome/Chromium through the DevTools
//! protocol. Calls block the current thread; run it under `spawn_blocking`
//! from async code.

use crate::config::TranslationConfig;
use crate::error::{PageError, TranslateError};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source language code passed to the translation UI.
pub const SOURCE_LANG: &str = "en";

/// Target language code passed to the translation UI.
pub const TARGET_LANG: &str = "fa";

/// The source-text input box.
pub const SOURCE_TEXT_SELECTOR: &str = "textarea[aria-label='Source text']";

/// One fragment of the rendered translation.
pub const TRANSLATED_FRAGMENT_SELECTOR: &str = "span[jsname='W297wb']";

/// Desktop Chrome user agent presented instead of the automation default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// URL of the translation UI with the language pair preselected.
pub fn default_service_url() -> String {
    format!(
        "https://translate.google.com/?sl={}&tl={}&op=translate",
        SOURCE_LANG, TARGET_LANG
    )
}

/// The operations the pipeline needs from a live translation session.
///
/// Implementations own exactly one browser page. `close` is called exactly
/// once per opened session by the pipeline, on every exit path.
pub trait TranslationSession {
    /// Replace the input with `text` and trigger translation.
    fn submit(&mut self, text: &str) -> Result<(), PageError>;

    /// Current text of every translated fragment, in document order.
    ///
    /// An empty vector means the output region is currently empty.
    fn read_fragments(&mut self) -> Result<Vec<String>, PageError>;

    /// Release the browser session.
    fn close(&mut self);
}

impl<S: TranslationSession + ?Sized> TranslationSession for Box<S> {
    fn submit(&mut self, text: &str) -> Result<(), PageError> {
        (**self).submit(text)
    }

    fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
        (**self).read_fragments()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Registered before navigation so it runs ahead of the page's own scripts.
const HIDE_WEBDRIVER_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined })";

/// headless_chrome default switches that advertise automation.
const IGNORED_DEFAULT_ARGS: &[&str] = &["--enable-automation"];

/// Empties a textarea and lets the page's listeners see the change.
const CLEAR_INPUT_JS: &str = "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }";

/// A Chrome instance pointed at the translation UI.
pub struct ChromeSession {
    // Dropped after the tab; dropping the Browser terminates Chrome.
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    element_timeout: Duration,
}

impl ChromeSession {
    /// Launch Chrome and load the translation UI.
    ///
    /// # Errors
    /// [`TranslateError::SessionStart`] if Chrome cannot be launched or the
    /// input box does not appear within `startup_timeout_secs`.
    pub fn open(config: &TranslationConfig) -> Result<Self, TranslateError> {
        let start_err = |stage: &str, e: &dyn std::fmt::Display| TranslateError::SessionStart {
            reason: format!("{stage}: {e}"),
        };

        let args = launch_args(config);
        let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
        let options =
            launch_options(config, &args).map_err(|e| start_err("invalid launch options", &e))?;

        info!(
            headless = config.headless,
            url = %config.service_url,
            "Launching translation browser"
        );
        let browser = Browser::new(options).map_err(|e| start_err("launch failed", &e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| start_err("could not open tab", &e))?;

        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: HIDE_WEBDRIVER_JS.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .map_err(|e| start_err("could not mask navigator.webdriver", &e))?;

        tab.set_default_timeout(startup_timeout);
        tab.navigate_to(&config.service_url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| start_err("navigation failed", &e))?;
        tab.wait_for_element_with_custom_timeout(SOURCE_TEXT_SELECTOR, startup_timeout)
            .map_err(|e| start_err("translation UI did not load", &e))?;

        let element_timeout = Duration::from_secs(config.element_timeout_secs);
        tab.set_default_timeout(element_timeout);
        debug!("Translation UI ready");

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            element_timeout,
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>, PageError> {
        self.tab
            .as_ref()
            .ok_or_else(|| PageError::browser("session already closed"))
    }
}

/// Extra Chrome switches: private profile, no automation banner or
/// `AutomationControlled` blink feature, fixed window placement and a desktop
/// user agent.
fn launch_args(config: &TranslationConfig) -> Vec<String> {
    let (x, y) = config.window_position;
    vec![
        "--incognito".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--window-position={x},{y}"),
        format!("--user-agent={}", config.user_agent),
    ]
}

fn launch_options<'a>(
    config: &TranslationConfig,
    args: &'a [String],
) -> Result<LaunchOptions<'a>, String> {
    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    // The DevTools connection must outlive the longest per-page wait.
    let idle_timeout = startup_timeout
        + config.stability.clear_timeout
        + config.stability.convergence_timeout
        + Duration::from_secs(config.element_timeout_secs)
        + Duration::from_secs(60);

    LaunchOptions::default_builder()
        .headless(config.headless)
        .window_size(Some(config.window_size))
        .idle_browser_timeout(idle_timeout)
        .path(config.chrome_path.clone())
        .args(args.iter().map(OsStr::new).collect())
        .ignore_default_args(IGNORED_DEFAULT_ARGS.iter().map(OsStr::new).collect())
        .build()
        .map_err(|e| e.to_string())
}

impl TranslationSession for ChromeSession {
    fn submit(&mut self, text: &str) -> Result<(), PageError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let tab = self.tab()?;
        let input = tab
            .wait_for_element_with_custom_timeout(SOURCE_TEXT_SELECTOR, self.element_timeout)
            .map_err(|e| {
                warn!("Source text box not found: {e}");
                PageError::LocatorNotFound {
                    locator: SOURCE_TEXT_SELECTOR.to_string(),
                    detail: e.to_string(),
                }
            })?;

        input
            .call_js_fn(CLEAR_INPUT_JS, vec![], false)
            .map_err(PageError::browser)?;
        input.type_into(text).map_err(PageError::browser)?;
        tab.press_key("Enter").map_err(PageError::browser)?;
        debug!(chars = text.chars().count(), "Submitted page text");
        Ok(())
    }

    fn read_fragments(&mut self) -> Result<Vec<String>, PageError> {
        let tab = self.tab()?;
        // No match is reported as an error; it means the region is empty.
        let elements = match tab.find_elements(TRANSLATED_FRAGMENT_SELECTOR) {
            Ok(elements) => elements,
            Err(e) => {
                debug!("No translated fragments: {e}");
                return Ok(Vec::new());
            }
        };
        elements
            .iter()
            .map(|el| el.get_inner_text().map_err(PageError::browser))
            .collect()
    }

    fn close(&mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                debug!("Tab close failed: {e}");
            }
        }
        if self.browser.take().is_some() {
            info!("Translation browser closed");
        }
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}
