//! Input resolution: normalise a user-supplied path or URL to local bytes.
//!
//! URL inputs are downloaded into a `TempDir`-backed scratch file so the
//! rest of the pipeline sees one shape, and cleanup happens automatically
//! when `ResolvedInput` is dropped, even if the process panics. Formats
//! with a fixed signature are validated before dispatch so callers get a
//! meaningful error rather than a parser crash deep in a backend.

use crate::error::ConvertError;
use crate::format::Format;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; file downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until the
    /// conversion completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the input file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// Basename used for allow-list checks and output-filename inference.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
/// When `expected` is given, its magic bytes (if any) are verified before
/// returning; `None` skips the check (used by inspect, which detects the
/// format from the bytes afterwards).
pub async fn resolve(
    input: &str,
    expected: Option<Format>,
    timeout_secs: u64,
) -> Result<ResolvedInput, ConvertError> {
    if is_url(input) {
        download_url(input, expected, timeout_secs).await
    } else {
        resolve_local(input, expected)
    }
}

/// Resolve a local file path, validating existence and magic bytes.
fn resolve_local(path_str: &str, expected: Option<Format>) -> Result<ResolvedInput, ConvertError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ConvertError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut head = [0u8; 4];
            let n = f.read(&mut head).unwrap_or(0);
            if let Some(format) = expected {
                check_magic(&head[..n], format, &path)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound { path });
        }
    }

    debug!("Resolved local input: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(
    url: &str,
    expected: Option<Format>,
    timeout_secs: u64,
) -> Result<ResolvedInput, ConvertError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url, expected);

    let temp_dir = TempDir::new().map_err(|e| ConvertError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(format) = expected {
        check_magic(&bytes[..bytes.len().min(4)], format, &file_path)?;
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Verify leading bytes against the format's signature, when it has one.
pub(crate) fn check_magic(head: &[u8], expected: Format, path: &Path) -> Result<(), ConvertError> {
    let Some(signature) = expected.magic() else {
        return Ok(());
    };
    if head.len() >= signature.len() && &head[..signature.len()] == signature {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    magic[..head.len().min(4)].copy_from_slice(&head[..head.len().min(4)]);
    Err(ConvertError::FormatMismatch {
        path: path.to_path_buf(),
        expected: expected.extension(),
        magic,
    })
}

/// Extract a reasonable filename from the URL, falling back to a generic
/// name with the expected extension.
fn extract_filename(url: &str, expected: Option<Format>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    let ext = expected.map(|f| f.extension()).unwrap_or("bin");
    format!("downloaded.{}", ext)
}
