//! Input resolution: turn the user's path or URL into a local PDF file.
//!
//! pdfium opens documents from the file system, so URL inputs are downloaded
//! into a `TempDir` that lives as long as the [`ResolvedInput`]. Both paths
//! check the `%PDF` magic bytes up front so a stray HTML page or image is
//! rejected with [`TranslateError::NotAPdf`] instead of a pdfium error.

use crate::error::TranslateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on local disk, possibly backed by a temporary download.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is removed when this value is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TranslateError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(trimmed) {
        download_url(trimmed, timeout_secs).await
    } else {
        resolve_local(Path::new(trimmed))
    }
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, TranslateError> {
    let path = path.to_path_buf();
    if !path.exists() {
        return Err(TranslateError::SourceNotFound { path });
    }
    if path.is_dir() {
        return Err(TranslateError::InvalidInput {
            input: path.display().to_string(),
        });
    }

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(PDF_MAGIC.len() as u64)
                .read_to_end(&mut head)
                .map_err(|e| TranslateError::CorruptPdf {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TranslateError::PermissionDenied { path });
        }
        Err(_) => return Err(TranslateError::SourceNotFound { path }),
    }
    check_magic(&path, &head)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Reject anything that does not start with `%PDF`.
fn check_magic(path: &Path, head: &[u8]) -> Result<(), TranslateError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(TranslateError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, TranslateError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| TranslateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let temp_dir = TempDir::new().map_err(|e| TranslateError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            TranslateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;
    check_magic(&file_path, &bytes)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| TranslateError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment if it names a `.pdf`, else `downloaded.pdf`. The name
/// feeds the output file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| last.to_ascii_lowercase().ends_with(".pdf") && last.len() > 4)
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_prefers_pdf_segment() {
        assert_eq!(filename_from_url("https://x.org/a/lecture.pdf"), "lecture.pdf");
        assert_eq!(filename_from_url("https://x.org/a/LECTURE.PDF?dl=1"), "LECTURE.PDF");
        assert_eq!(filename_from_url("https://x.org/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://x.org/"), "downloaded.pdf");
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let err = tokio_test::block_on(resolve_input("/definitely/not/here.pdf", 5)).unwrap_err();
        assert!(matches!(err, TranslateError::SourceNotFound { .. }));
    }

    #[test]
    fn blank_input_is_invalid() {
        let err = tokio_test::block_on(resolve_input("   ", 5)).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidInput { .. }));
    }

    #[test]
    fn non_pdf_is_rejected_with_magic() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"<html>not a pdf</html>").unwrap();
        let err = resolve_local(f.path()).unwrap_err();
        match err {
            TranslateError::NotAPdf { magic, .. } => assert_eq!(&magic, b"<htm"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn short_file_is_not_a_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        assert!(matches!(
            resolve_local(f.path()),
            Err(TranslateError::NotAPdf { .. })
        ));
    }

    #[test]
    fn pdf_magic_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_local(f.path()).unwrap();
        assert_eq!(resolved.path(), f.path());
    }

    #[test]
    fn directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_local(dir.path()),
            Err(TranslateError::InvalidInput { .. })
        ));
    }
}
