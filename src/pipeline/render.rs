//! pdfium access: binding the library, opening documents, rasterising pages.
//!
//! pdfium wraps a C++ library with thread-local state and is not safe to call
//! from async contexts, so every caller of this module runs on a blocking
//! thread (`tokio::task::spawn_blocking`).
//!
//! Page images are capped by pixel count rather than DPI: page sizes vary
//! wildly and the image only has to be legible next to its translation.

use crate::error::TranslateError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// A rasterised page ready to embed.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the
/// system library.
pub fn bind_pdfium() -> Result<Pdfium, TranslateError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| TranslateError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium's errors onto the fatal error taxonomy.
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, TranslateError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                TranslateError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                TranslateError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            TranslateError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Render settings capping the longest edge at `max_pixels`.
pub fn render_config(max_pixels: u32) -> PdfRenderConfig {
    PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32)
}

/// Rasterise one page to PNG.
///
/// `index` is 0-based and only used for error reporting.
pub fn render_page(
    page: &PdfPage,
    index: usize,
    config: &PdfRenderConfig,
) -> Result<RenderedPage, TranslateError> {
    let bitmap = page
        .render_with_config(config)
        .map_err(|e| TranslateError::RenderFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    let png = encode_png(&image).map_err(|e| TranslateError::RenderFailed {
        page: index + 1,
        detail: format!("PNG encoding failed: {}", e),
    })?;
    debug!(
        "Rendered page {} → {}x{} px, {} bytes",
        index + 1,
        image.width(),
        image.height(),
        png.len()
    );

    Ok(RenderedPage {
        png,
        width: image.width(),
        height: image.height(),
    })
}

/// Encode an image as PNG. Lossless, so rendered text stays crisp.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}
