//! Configuration types for conversions and read-back.
//!
//! Everything the pipeline needs beyond the request itself lives in
//! [`ConversionConfig`], built via [`ConversionConfigBuilder`] or loaded with
//! [`ConversionConfig::from_env`].
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MD_SHARE_DIR` | `sandbox_root` |
//! | `MARKDOWNIFY_UV_PATH` | `executable_path` |
//! | `MARKDOWNIFY_PROJECT_ROOT` | `project_root` |
//! | `MARKDOWNIFY_DOWNLOAD_TIMEOUT_SECS` | `download_timeout_secs` |

use crate::error::MarkdownifyError;
use std::path::PathBuf;

/// Default download timeout (30 s).
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Downloads above this size log a warning but still proceed (50 MiB).
pub const DEFAULT_WARN_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Converter command run through `uv run`.
pub const DEFAULT_CONVERTER_COMMAND: &str = "markitdown";

pub const ENV_SANDBOX_ROOT: &str = "MD_SHARE_DIR";
pub const ENV_EXECUTABLE: &str = "MARKDOWNIFY_UV_PATH";
pub const ENV_PROJECT_ROOT: &str = "MARKDOWNIFY_PROJECT_ROOT";
pub const ENV_DOWNLOAD_TIMEOUT: &str = "MARKDOWNIFY_DOWNLOAD_TIMEOUT_SECS";

/// Configuration shared by every pipeline run.
///
/// # Example
/// ```rust
/// use markdownify::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .sandbox_root("/srv/md")
///     .download_timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, 10);
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Directory `read` is confined to. `None` means unrestricted.
    pub sandbox_root: Option<PathBuf>,

    /// Runtime executable used when the request has none. `None` means discover `uv`.
    pub executable_path: Option<PathBuf>,

    /// Project directory for `uv run --project`. `None` means the current directory.
    pub project_root: Option<PathBuf>,

    /// Converter command name. Default: `markitdown`.
    pub converter_command: String,

    /// Download timeout for URL inputs in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Size above which a download logs a warning. Default: 50 MiB.
    ///
    /// Large files are never rejected; the converter can take a while on them
    /// and the warning tells the operator why.
    pub warn_size_bytes: u64,

    /// Extra environment for the converter process, layered over the
    /// encoding overrides.
    pub extra_env: Vec<(String, String)>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sandbox_root: None,
            executable_path: None,
            project_root: None,
            converter_command: DEFAULT_CONVERTER_COMMAND.to_string(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            warn_size_bytes: DEFAULT_WARN_SIZE_BYTES,
            extra_env: Vec::new(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Turn an existing config back into a builder, e.g. to layer CLI flags
    /// over [`from_env`](Self::from_env).
    pub fn into_builder(self) -> ConversionConfigBuilder {
        ConversionConfigBuilder { config: self }
    }

    /// Load configuration from the process environment.
    ///
    /// Empty variables count as unset. A malformed timeout is an error rather
    /// than a silent fallback.
    pub fn from_env() -> Result<Self, MarkdownifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MarkdownifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(root) = get(ENV_SANDBOX_ROOT) {
            builder = builder.sandbox_root(root);
        }
        if let Some(exe) = get(ENV_EXECUTABLE) {
            builder = builder.executable_path(exe);
        }
        if let Some(root) = get(ENV_PROJECT_ROOT) {
            builder = builder.project_root(root);
        }
        if let Some(raw) = get(ENV_DOWNLOAD_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                MarkdownifyError::InvalidConfig(format!(
                    "{ENV_DOWNLOAD_TIMEOUT} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            builder = builder.download_timeout_secs(secs);
        }

        builder.build()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn sandbox_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.sandbox_root = Some(root.into());
        self
    }

    pub fn executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.executable_path = Some(path.into());
        self
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.project_root = Some(root.into());
        self
    }

    pub fn converter_command(mut self, command: impl Into<String>) -> Self {
        self.config.converter_command = command.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn warn_size_bytes(mut self, bytes: u64) -> Self {
        self.config.warn_size_bytes = bytes;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.extra_env.push((key.into(), value.into()));
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MarkdownifyError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(MarkdownifyError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.converter_command.trim().is_empty() {
            return Err(MarkdownifyError::InvalidConfig(
                "Converter command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.download_timeout_secs, 30);
        assert_eq!(c.warn_size_bytes, 50 * 1024 * 1024);
        assert_eq!(c.converter_command, "markitdown");
        assert!(c.sandbox_root.is_none());
    }

    #[test]
    fn reads_environment() {
        let c = ConversionConfig::from_lookup(lookup(&[
            ("MD_SHARE_DIR", "/srv/md"),
            ("MARKDOWNIFY_UV_PATH", "/opt/uv"),
            ("MARKDOWNIFY_DOWNLOAD_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        assert_eq!(c.sandbox_root, Some(PathBuf::from("/srv/md")));
        assert_eq!(c.executable_path, Some(PathBuf::from("/opt/uv")));
        assert_eq!(c.download_timeout_secs, 12);
        assert!(c.project_root.is_none());
    }

    #[test]
    fn blank_variables_are_unset() {
        let c = ConversionConfig::from_lookup(lookup(&[("MD_SHARE_DIR", "  ")])).unwrap();
        assert!(c.sandbox_root.is_none());
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ConversionConfig::from_lookup(lookup(&[(
            "MARKDOWNIFY_DOWNLOAD_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn into_builder_keeps_fields() {
        let c = ConversionConfig::builder()
            .sandbox_root("/srv/md")
            .build()
            .unwrap()
            .into_builder()
            .download_timeout_secs(5)
            .build()
            .unwrap();
        assert_eq!(c.sandbox_root, Some(PathBuf::from("/srv/md")));
        assert_eq!(c.download_timeout_secs, 5);
    }

    #[test]
    fn builder_validates() {
        assert!(ConversionConfig::builder()
            .download_timeout_secs(0)
            .build()
            .is_err());
        assert!(ConversionConfig::builder()
            .converter_command(" ")
            .build()
            .is_err());
    }
}
