//! Temporary files and directories with guaranteed, exactly-once cleanup.
//!
//! Downloads land in a private temp directory and converted Markdown is
//! persisted to a temp file. Whatever a pipeline creates it must remove on
//! every exit path, and a failed removal must never replace the pipeline's
//! real result or error.
//!
//! [`TempResource`] is the scoped owner: call [`TempResource::release`] on
//! the normal path (async, logged). If the owner is dropped without releasing
//! (an early `?`, a panic, a cancelled future) `Drop` removes the path
//! synchronously instead. The `released` flag makes the two mutually
//! exclusive.

use crate::error::MarkdownifyError;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Prefix of per-download temp directories.
pub const TEMP_DIR_PREFIX: &str = "markdownify-";

/// Prefix of persisted conversion outputs.
pub const OUTPUT_FILE_PREFIX: &str = "markdown_output_";

/// A temp file or directory owned by one pipeline run.
#[derive(Debug)]
pub struct TempResource {
    path: PathBuf,
    recursive: bool,
    released: bool,
}

impl TempResource {
    /// Take ownership of a directory; release removes the whole tree.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
            released: false,
        }
    }

    /// Take ownership of a single file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Give up ownership; the path will not be removed.
    pub fn keep(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }

    /// Remove the resource. Errors are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        cleanup(&self.path, self.recursive).await;
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let result = if self.recursive {
            std::fs::remove_dir_all(&self.path)
        } else {
            std::fs::remove_file(&self.path)
        };
        match result {
            Ok(()) => debug!("Dropped temp resource {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => warn!(
                "{}",
                MarkdownifyError::CleanupFailed {
                    path: self.path.clone(),
                    source,
                }
            ),
        }
    }
}

/// Remove `path` (a directory tree if `recursive`).
///
/// A path that is already gone counts as cleaned. Any other failure is logged
/// as a cleanup failure and swallowed.
pub async fn cleanup(path: &Path, recursive: bool) {
    let result = if recursive {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => debug!("Cleaned up {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Nothing to clean up at {}", path.display())
        }
        Err(source) => warn!(
            "{}",
            MarkdownifyError::CleanupFailed {
                path: path.to_path_buf(),
                source,
            }
        ),
    }
}

/// Write `content` to a fresh file in the system temp directory.
///
/// The name is `markdown_output_<unix-millis>_<random>.<extension>`; the
/// file is created with `O_EXCL` semantics, so concurrent calls in the same
/// millisecond still get distinct files. The caller owns the returned path.
pub async fn create_temp_file(
    content: impl AsRef<[u8]>,
    extension: &str,
) -> Result<PathBuf, MarkdownifyError> {
    let temp_root = std::env::temp_dir();
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let named = tempfile::Builder::new()
        .prefix(&format!("{OUTPUT_FILE_PREFIX}{millis}_"))
        .suffix(&format!(".{}", extension.trim_start_matches('.')))
        .rand_bytes(6)
        .tempfile_in(&temp_root)
        .map_err(|source| MarkdownifyError::Io {
            context: "Failed to create temp file in",
            path: temp_root.clone(),
            source,
        })?;

    let (file, path) = named.keep().map_err(|e| MarkdownifyError::Io {
        context: "Failed to keep temp file",
        path: e.file.path().to_path_buf(),
        source: e.error,
    })?;

    // Own the file until the write succeeds so a failed write leaves nothing behind.
    let guard = TempResource::file(&path);
    let mut file = tokio::fs::File::from_std(file);
    let written = async {
        file.write_all(content.as_ref()).await?;
        file.flush().await
    }
    .await;

    match written {
        Ok(()) => {
            debug!("Saved output to {}", path.display());
            Ok(guard.keep())
        }
        Err(source) => {
            drop(file);
            guard.release().await;
            Err(MarkdownifyError::Io {
                context: "Failed to write temp file",
                path,
                source,
            })
        }
    }
}

/// Create a uniquely named directory (`markdownify-XXXXXX`) under the
/// canonicalised system temp directory.
pub async fn create_temp_dir() -> Result<TempResource, MarkdownifyError> {
    let raw = std::env::temp_dir();
    let base = tokio::fs::canonicalize(&raw).await.unwrap_or(raw);

    let dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir_in(&base)
        .map_err(|source| MarkdownifyError::Io {
            context: "Failed to create temp directory in",
            path: base.clone(),
            source,
        })?;

    let path = dir.keep();
    debug!("Created temp directory {}", path.display());
    Ok(TempResource::dir(path))
}
