//! Input loading: turn user-supplied paths, directories and URLs into
//! in-memory [`NamedPdf`]s.
//!
//! Citation files are small (trimmed excerpts of a few pages), so each one is
//! read fully into memory and shared as `Arc<[u8]>`; pdfium opens them from
//! the byte slice. Every buffer is checked for the `%PDF` magic bytes here so
//! callers get an input error up front instead of a page of placeholders.

use crate::error::ReportError;
use crate::model::NamedPdf;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load every input in order. A directory contributes all of its `*.pdf`
/// files (not recursive); order does not matter because pairing sorts.
pub async fn load_pdfs(inputs: &[String], timeout_secs: u64) -> Result<Vec<NamedPdf>, ReportError> {
    let mut pdfs = Vec::new();
    for input in inputs {
        if is_url(input) {
            pdfs.push(download_url(input, timeout_secs).await?);
            continue;
        }
        if input.trim().is_empty() || input.contains("://") {
            return Err(ReportError::InvalidInput {
                input: input.clone(),
            });
        }
        let path = PathBuf::from(input);
        if path.is_dir() {
            for file in list_pdfs(&path)? {
                pdfs.push(read_local(&file).await?);
            }
        } else {
            pdfs.push(read_local(&path).await?);
        }
    }
    debug!("Loaded {} PDFs from {} inputs", pdfs.len(), inputs.len());
    Ok(pdfs)
}

/// `*.pdf` entries of `dir` (case-insensitive extension), sorted by path.
fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn io_error(path: &Path, e: std::io::Error) -> ReportError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReportError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ReportError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

async fn read_local(path: &Path) -> Result<NamedPdf, ReportError> {
    if !path.exists() {
        return Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    check_magic(&name, &bytes)?;
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(NamedPdf::new(name, bytes))
}

/// Reject buffers that do not start with `%PDF`.
pub fn check_magic(name: &str, bytes: &[u8]) -> Result<(), ReportError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(ReportError::NotAPdf {
        name: name.to_string(),
        magic,
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<NamedPdf, ReportError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReportError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReportError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReportError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReportError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = file_name_from_url(url);
    check_magic(&name, &bytes)?;
    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(NamedPdf::new(name, bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
