//! Document composition: page images interleaved with their translations.
//!
//! For every source page, in order: the rendered page image, then its
//! translation block (empty when the page has no usable text), then a page
//! break unless it is the last page. Results are matched to pages by
//! `index`, never by position, so a sparse or reordered result list still
//! lands on the right pages.
//!
//! The archive is built in a temporary file next to the destination and
//! renamed into place on success; a failure part-way leaves no file behind.

use super::docx::{TranslatedDocument, EMU_PER_INCH};
use super::render::{bind_pdfium, load_document, render_config, render_page, RenderedPage};
use crate::config::TranslationConfig;
use crate::error::TranslateError;
use crate::output::TranslationResult;
use std::collections::HashMap;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Compose the output document on a blocking thread.
pub async fn compose(
    pdf_path: &Path,
    results: &[TranslationResult],
    output_path: &Path,
    config: &TranslationConfig,
) -> Result<PathBuf, TranslateError> {
    let pdf_path = pdf_path.to_path_buf();
    let results = results.to_vec();
    let output_path = output_path.to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        compose_blocking(&pdf_path, &results, &output_path, &config)
    })
    .await
    .map_err(|e| TranslateError::Internal(format!("Compose task panicked: {}", e)))?
}

/// Blocking implementation of [`compose`].
pub fn compose_blocking(
    pdf_path: &Path,
    results: &[TranslationResult],
    output_path: &Path,
    config: &TranslationConfig,
) -> Result<PathBuf, TranslateError> {
    let write_err = |source: std::io::Error| TranslateError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;
    let mut staging = NamedTempFile::new_in(&parent).map_err(write_err)?;

    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, config.password.as_deref())?;
    let render_cfg = render_config(config.max_rendered_pixels);
    let width_emu = (config.image_width_inches as f64 * EMU_PER_INCH as f64).round() as u64;

    let rendered = document
        .pages()
        .iter()
        .enumerate()
        .map(|(idx, page)| render_page(&page, idx, &render_cfg));
    let summary = write_document(
        staging.as_file_mut(),
        rendered,
        results,
        width_emu,
        output_path,
    )?;

    staging.as_file().sync_all().map_err(write_err)?;
    staging
        .persist(output_path)
        .map_err(|e| write_err(e.error))?;

    info!(
        "Wrote {} ({} pages, {} with translations)",
        output_path.display(),
        summary.pages,
        summary.with_text
    );
    Ok(output_path.to_path_buf())
}

/// Page counts from [`write_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComposeSummary {
    pub pages: usize,
    pub with_text: usize,
}

/// Lay out `pages` (rendered source pages, in page order) with the matching
/// entries of `results` and write the package to `out`. `dest` only labels
/// errors.
pub(crate) fn write_document<W, I>(
    out: W,
    pages: I,
    results: &[TranslationResult],
    width_emu: u64,
    dest: &Path,
) -> Result<ComposeSummary, TranslateError>
where
    W: Write + Seek,
    I: IntoIterator<Item = Result<RenderedPage, TranslateError>>,
{
    let by_index: HashMap<usize, &TranslationResult> =
        results.iter().map(|r| (r.index, r)).collect();

    let mut doc = TranslatedDocument::new(width_emu);
    let mut summary = ComposeSummary {
        pages: 0,
        with_text: 0,
    };
    let mut pages = pages.into_iter().enumerate().peekable();
    while let Some((idx, page)) = pages.next() {
        let page = page?;
        doc = doc.add_page_image(&page.png, page.width, page.height);

        let text = match by_index.get(&idx) {
            Some(result) if result.has_text() => {
                summary.with_text += 1;
                result.text.as_str()
            }
            _ => "",
        };
        doc = doc.add_translation(text);

        if pages.peek().is_some() {
            doc = doc.add_page_break();
        }
        summary.pages += 1;
        debug!("Composed page {}", idx + 1);
    }

    doc.write(out).map_err(|e| TranslateError::Compose {
        path: dest.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::output::TranslationStatus;
    use crate::pipeline::docx::tests::{body_outline, document_xml, png};
    use std::io::Cursor;

    const SIX_INCHES: u64 = 6 * EMU_PER_INCH;

    fn page(width: u32, height: u32) -> Result<RenderedPage, TranslateError> {
        Ok(RenderedPage {
            png: png(width, height),
            width,
            height,
        })
    }

    fn result(index: usize, text: &str, status: TranslationStatus) -> TranslationResult {
        TranslationResult {
            index,
            text: text.into(),
            status,
            duration_ms: 0,
            error: None,
        }
    }

    fn compose_outline(
        pages: Vec<Result<RenderedPage, TranslateError>>,
        results: &[TranslationResult],
    ) -> (ComposeSummary, Vec<String>) {
        let mut out = Cursor::new(Vec::new());
        let summary =
            write_document(&mut out, pages, results, SIX_INCHES, Path::new("out.docx")).unwrap();
        (summary, body_outline(&document_xml(&out.into_inner())))
    }

    #[test]
    fn translations_land_on_their_pages_by_index() {
        // Three pages of distinct shapes; results out of order, page 1 missing.
        let pages = vec![page(10, 10), page(20, 10), page(10, 20)];
        let results = [
            result(2, "سه", TranslationStatus::Ok),
            result(0, "یک\nدو", TranslationStatus::Ok),
        ];
        let (summary, outline) = compose_outline(pages, &results);

        assert_eq!(
            outline,
            [
                "image 5486400x5486400",
                "rtl:یک\nدو",
                "break",
                "image 5486400x2743200",
                "rtl:",
                "break",
                "image 4114800x8229600",
                "rtl:سه",
            ]
        );
        assert_eq!(
            summary,
            ComposeSummary {
                pages: 3,
                with_text: 2
            }
        );
    }

    #[test]
    fn failed_and_empty_pages_get_an_empty_block() {
        let pages = vec![page(10, 10), page(10, 10), page(10, 10)];
        let mut failed = TranslationResult::failed(
            1,
            PageError::LocatorNotFound {
                locator: "textarea".into(),
                detail: "gone".into(),
            },
            0,
        );
        failed.text = "partial".into();
        let results = [
            TranslationResult::empty(0),
            failed,
            result(2, "", TranslationStatus::TimedOut),
        ];
        let (summary, outline) = compose_outline(pages, &results);

        let blocks: Vec<&str> = outline
            .iter()
            .filter(|e| e.starts_with("rtl:"))
            .map(String::as_str)
            .collect();
        assert_eq!(blocks, ["rtl:", "rtl:", "rtl:"]);
        assert_eq!(summary.with_text, 0);
    }

    #[test]
    fn last_page_has_no_trailing_break() {
        let (_, outline) = compose_outline(vec![page(10, 10)], &[]);
        assert_eq!(outline, ["image 5486400x5486400", "rtl:"]);

        let (_, outline) = compose_outline(vec![page(10, 10), page(10, 10)], &[]);
        assert_eq!(outline.iter().filter(|e| *e == "break").count(), 1);
        assert_eq!(outline.last().map(String::as_str), Some("rtl:"));
    }

    #[test]
    fn render_failure_aborts_composition() {
        let pages = vec![
            page(10, 10),
            Err(TranslateError::Internal("render failed".into())),
        ];
        let mut out = Cursor::new(Vec::new());
        let err = write_document(&mut out, pages, &[], SIX_INCHES, Path::new("out.docx"))
            .unwrap_err();
        assert!(matches!(err, TranslateError::Internal(_)));
    }
}
