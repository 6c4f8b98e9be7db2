//! Page text source: the raw text layer of every page, via pdfium.

use super::render::{bind_pdfium, load_document};
use crate::error::TranslateError;
use std::path::Path;
use tracing::{info, warn};

/// Extract the text of every page, in page order.
///
/// Runs inside `spawn_blocking`. A page whose text layer cannot be read
/// yields an empty string (it will be reported as `Empty`), not an error.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, TranslateError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| TranslateError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_pages`].
pub fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, TranslateError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(text) => texts.push(text.all()),
            Err(e) => {
                warn!("Page {}: no readable text layer ({:?})", idx + 1, e);
                texts.push(String::new());
            }
        }
    }

    info!("Extracted text from {} pages", texts.len());
    Ok(texts)
}
