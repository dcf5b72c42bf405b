//! Input resolution: turn a request into a local file the converter can open.
//!
//! Remote inputs are downloaded into a private temp directory owned by the
//! returned [`ResolvedInput`]. The orchestrator releases it once the
//! converter has finished; if the pipeline unwinds first, the
//! [`TempResource`] guard removes it on drop.

use crate::error::MarkdownifyError;
use crate::pipeline::temp::{self, TempResource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Extensions kept when inferring a download's type from its URL.
pub const KNOWN_EXTENSIONS: [&str; 11] = [
    "pdf", "docx", "xlsx", "pptx", "jpg", "jpeg", "png", "gif", "mp3", "wav", "mp4",
];

/// Extension for downloads whose type could not be inferred.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Extension for `url` requests that are not PDFs.
pub const WEBPAGE_EXTENSION: &str = "html";

/// Limits applied to a single download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadPolicy {
    /// Whole-request deadline (headers and body).
    pub timeout: Duration,
    /// Payloads above this size log a warning; they are never rejected.
    pub warn_size_bytes: u64,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::config::DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            warn_size_bytes: crate::config::DEFAULT_WARN_SIZE_BYTES,
        }
    }
}

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file. Nothing is owned.
    Local(PathBuf),
    /// Input was a URL; `path` sits inside the owned temp directory.
    Downloaded { path: PathBuf, temp_dir: TempResource },
}

impl ResolvedInput {
    /// Get the path to the input file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// Remove any owned temp directory. A no-op for local inputs.
    pub async fn release(self) {
        if let ResolvedInput::Downloaded { temp_dir, .. } = self {
            temp_dir.release().await;
        }
    }
}

/// Check if the input string is an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    (input.starts_with("http://") || input.starts_with("https://"))
        && reqwest::Url::parse(input).is_ok()
}

/// Extension for a `url` request: `pdf` when the URL ends in `.pdf`, else `html`.
pub fn webpage_extension(url: &str) -> &'static str {
    let path_ends_in_pdf = reqwest::Url::parse(url)
        .map(|u| u.path().ends_with(".pdf"))
        .unwrap_or(false);
    if path_ends_in_pdf || url.ends_with(".pdf") {
        "pdf"
    } else {
        WEBPAGE_EXTENSION
    }
}

/// Extension of the URL path's last segment, if it is one we recognise.
pub fn infer_extension(url: &str) -> Option<&'static str> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    KNOWN_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

/// Download `url` into a fresh temp directory as `download.<ext>`.
///
/// `extension` overrides inference; `None` uses [`infer_extension`] with a
/// `bin` fallback. Scheme validation happens before any directory is created
/// or connection opened. Once the directory exists, every failure removes it
/// before the error is returned.
pub async fn download_to_temp(
    url: &str,
    extension: Option<&str>,
    policy: DownloadPolicy,
) -> Result<ResolvedInput, MarkdownifyError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| MarkdownifyError::invalid_input(format!("Invalid URL provided: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(MarkdownifyError::invalid_input(format!(
            "Only HTTP and HTTPS protocols are allowed, got '{}'",
            parsed.scheme()
        )));
    }

    let temp_dir = temp::create_temp_dir().await?;
    let ext = extension
        .map(|e| e.trim_start_matches('.').to_string())
        .unwrap_or_else(|| infer_extension(url).unwrap_or(FALLBACK_EXTENSION).to_string());
    let file_path = temp_dir.path().join(format!("download.{ext}"));

    info!("Downloading {} to {}", url, file_path.display());

    let fetched = tokio::time::timeout(policy.timeout, fetch_into(parsed, &file_path, policy))
        .await
        .unwrap_or_else(|_| {
            Err(MarkdownifyError::DownloadTimeout {
                url: url.to_string(),
                secs: policy.timeout.as_secs(),
            })
        });

    match fetched {
        Ok(bytes) => {
            debug!("Downloaded {} bytes from {}", bytes, url);
            Ok(ResolvedInput::Downloaded {
                path: file_path,
                temp_dir,
            })
        }
        Err(e) => {
            temp_dir.release().await;
            Err(e)
        }
    }
}

/// Stream the response body for `url` into `dest`. Returns the byte count.
async fn fetch_into(
    url: reqwest::Url,
    dest: &Path,
    policy: DownloadPolicy,
) -> Result<u64, MarkdownifyError> {
    let url_str = url.to_string();
    let failed = |reason: String| MarkdownifyError::DownloadFailed {
        url: url_str.clone(),
        reason,
    };

    let mut response = reqwest::get(url.clone())
        .await
        .map_err(|e| failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )));
    }

    if let Some(declared) = response.content_length() {
        if declared > policy.warn_size_bytes {
            warn!(
                "Large file detected: {}MB. This may take longer to process.",
                declared / 1024 / 1024
            );
        }
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| MarkdownifyError::Io {
            context: "Failed to create download file",
            path: dest.to_path_buf(),
            source,
        })?;

    let write_err = |source: std::io::Error| MarkdownifyError::Io {
        context: "Failed to write download file",
        path: dest.to_path_buf(),
        source,
    };

    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_err)?;

    if written > policy.warn_size_bytes {
        warn!("Large file processed: {}MB.", written / 1024 / 1024);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("ftp://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url("https://"));
        assert!(!is_url(""));
    }

    #[test]
    fn webpage_extension_prefers_pdf() {
        assert_eq!(webpage_extension("https://example.com/paper.pdf"), "pdf");
        assert_eq!(webpage_extension("https://example.com/paper.pdf?dl=1"), "pdf");
        assert_eq!(webpage_extension("https://example.com/blog/post"), "html");
        assert_eq!(webpage_extension("https://example.com/sheet.xlsx"), "html");
    }

    #[test]
    fn infer_extension_uses_allow_list() {
        assert_eq!(infer_extension("https://x.org/a/report.PDF"), Some("pdf"));
        assert_eq!(infer_extension("https://x.org/deck.pptx?v=2"), Some("pptx"));
        assert_eq!(infer_extension("https://x.org/song.mp3"), Some("mp3"));
        assert_eq!(infer_extension("https://x.org/script.sh"), None);
        assert_eq!(infer_extension("https://x.org/"), None);
        assert_eq!(infer_extension("https://x.org/README"), None);
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected_before_network() {
        let err = download_to_temp("ftp://example.com/a.pdf", None, DownloadPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("Only HTTP and HTTPS"));
    }

    #[tokio::test]
    async fn unparseable_url_is_invalid_input() {
        let err = download_to_temp("not a url", None, DownloadPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn local_release_is_noop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let resolved = ResolvedInput::Local(file.path().to_path_buf());
        resolved.release().await;
        assert!(file.path().exists());
    }
}
