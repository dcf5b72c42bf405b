//! Request and result types for the two public operations.
//!
//! All four types derive serde so the protocol layer can pass JSON straight
//! through. Field aliases accept the camelCase names tool clients send.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Input to [`crate::convert`].
///
/// Exactly one of `file_path` / `url` should be set. A `file_path` that is
/// itself an `http(s)://` URL is downloaded like `url`, but keeps the file
/// extension inferred from the URL instead of the webpage fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    #[serde(default, alias = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Directory passed to `uv run --project`. Falls back to the config.
    #[serde(default, alias = "projectRoot", skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    /// Explicit runtime executable, skipping discovery.
    #[serde(
        default,
        alias = "executablePath",
        alias = "uvPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub executable_path: Option<PathBuf>,
}

impl ConversionRequest {
    /// Request converting a local file (or a URL given as a path).
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Request converting a web page or remote document.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_executable(mut self, exe: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(exe.into());
        self
    }
}

/// Output of [`crate::convert`]: the Markdown text plus the temp file it was saved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub path: PathBuf,
    pub text: String,
}

/// Input to [`crate::read`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    #[serde(alias = "filePath")]
    pub file_path: String,
}

impl ReadRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
        }
    }
}

/// Output of [`crate::read`]. `path` echoes the caller's input unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    pub path: String,
    pub text: String,
}
