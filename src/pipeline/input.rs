//! Document input: turn a user-supplied path or URL into a [`Blob`].
//!
//! This is the caller-side half of a submission. The pipeline itself accepts
//! any document and leaves validation to its caller; the CLI uses this loader
//! so a missing file is reported before a submission even starts.

use crate::error::ReviewError;
use crate::store::Blob;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a document from a local path or an HTTP/HTTPS URL.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<Blob, ReviewError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Blob, ReviewError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReviewError::PermissionDenied { path: path.clone() },
        _ => ReviewError::FileNotFound { path: path.clone() },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resume.pdf".to_string());

    debug!("Loaded local document {} ({} bytes)", path.display(), bytes.len());
    Ok(Blob::from_bytes(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Blob, ReviewError> {
    info!("Downloading document from: {}", url);

    let failed = |reason: String| ReviewError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReviewError::DownloadTimeout {
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

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    let name = file_name_from_url(url);

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(Blob::from_bytes(name, bytes.to_vec()))
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

    "resume.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.pdf"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url("cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn file_name_from_url_prefers_last_segment() {
        assert_eq!(file_name_from_url("https://x.io/files/jane.pdf"), "jane.pdf");
        assert_eq!(file_name_from_url("https://x.io/download"), "resume.pdf");
        assert_eq!(file_name_from_url("not a url"), "resume.pdf");
    }

    #[tokio::test]
    async fn local_file_is_loaded_with_sniffed_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.pdf");
        std::fs::write(&path, b"%PDF-1.5\n").unwrap();

        let blob = load_document(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(blob.name, "cv.pdf");
        assert_eq!(blob.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_local_file_is_reported() {
        let err = load_document("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, ReviewError::FileNotFound { .. }));
    }
}
