//! Error types for the markdownify library.
//!
//! Every public operation returns [`MarkdownifyError`]. Two helpers sit on
//! top of it:
//!
//! * [`Stage`] — where in the `convert` pipeline a failure happened. The
//!   orchestrator wraps stage failures in [`MarkdownifyError::Conversion`] so
//!   the message always names the stage and keeps the cause's text.
//!
//! * [`ErrorKind`] — the coarse category callers branch on. For a wrapped
//!   error it reports the *cause's* category, so an empty request still
//!   reads as [`ErrorKind::InvalidInput`] after wrapping.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the markdownify library.
#[derive(Debug, Error)]
pub enum MarkdownifyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Malformed or missing request fields, or a URL with a disallowed scheme.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A local input or read-back file does not exist.
    #[error("File does not exist: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The runtime executable could not be located.
    #[error("{0}")]
    ExecutableNotFound(#[from] uv_locate::LocateError),

    /// Read-back refused because the file is not Markdown.
    #[error("Required file is not a Markdown file: '{path}'")]
    UnsupportedType { path: PathBuf },

    /// Read-back refused because the file lies outside the sandbox root.
    #[error("Only files in {root} are allowed")]
    AccessDenied { path: PathBuf, root: PathBuf },

    // ── Download errors ───────────────────────────────────────────────────
    /// Network failure or non-success HTTP status.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout and was cancelled.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The converter wrote to standard error, or could not be started.
    #[error("Error executing command: {stderr}")]
    ConverterFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The converter's Python environment is missing packages.
    #[error(
        "Python dependencies not found!\n\n\
Please run the following commands:\n  \
cd {project_root}\n  \
uv sync\n\n\
This will install the required Python packages including markitdown."
    )]
    DependencyMissing { project_root: PathBuf },

    // ── Pipeline wrapper ──────────────────────────────────────────────────
    /// A `convert` stage failed; `source` holds the original cause.
    #[error("Error processing to Markdown ({stage}): {source}")]
    Conversion {
        stage: Stage,
        #[source]
        source: Box<MarkdownifyError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Filesystem operation failed.
    #[error("{context} '{path}': {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing a temp resource failed. Only ever logged.
    #[error("Failed to cleanup temporary files at '{path}': {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    UnsupportedType,
    AccessDenied,
    DownloadFailure,
    ConversionError,
    /// Never returned from a public operation; cleanup failures are logged.
    CleanupFailure,
    Io,
    Config,
}

impl MarkdownifyError {
    /// Category of this error, looking through [`MarkdownifyError::Conversion`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::FileNotFound { .. } | Self::ExecutableNotFound(_) => ErrorKind::NotFound,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::DownloadFailed { .. } | Self::DownloadTimeout { .. } => {
                ErrorKind::DownloadFailure
            }
            Self::ConverterFailed { .. } | Self::DependencyMissing { .. } => {
                ErrorKind::ConversionError
            }
            Self::Conversion { source, .. } => match source.kind() {
                ErrorKind::Io => ErrorKind::ConversionError,
                other => other,
            },
            Self::CleanupFailed { .. } => ErrorKind::CleanupFailure,
            Self::Io { .. } => ErrorKind::Io,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::ConversionError,
        }
    }

    /// Pipeline stage this error was wrapped at, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Conversion { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Wrap `self` as a failure of `stage`.
    pub(crate) fn at(self, stage: Stage) -> Self {
        Self::Conversion {
            stage,
            source: Box::new(self),
        }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// States of the `convert` pipeline that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveInput,
    Acquire,
    LocateExecutable,
    Convert,
    PersistOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::ResolveInput => "resolving input",
            Stage::Acquire => "acquiring input",
            Stage::LocateExecutable => "locating executable",
            Stage::Convert => "running converter",
            Stage::PersistOutput => "saving output",
        };
        f.write_str(s)
    }
}
