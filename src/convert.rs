//! The two public operations: [`convert`] and [`read`].
//!
//! `convert` runs one pipeline per call:
//!
//! ```text
//! ResolveInput → Acquire → LocateExecutable → Convert → PersistOutput → Cleanup → Done
//!        └───────────┴──────────┴──────────────┴────────────┴──▶ Failed (cleanup still runs)
//! ```
//!
//! Whatever `Acquire` downloads is owned by the pipeline and released exactly
//! once after the remaining stages finish, whether they succeeded or not.
//! Concurrent calls share nothing but the cached `uv` location.

use crate::config::ConversionConfig;
use crate::error::{MarkdownifyError, Stage};
use crate::output::{ConversionRequest, ConversionResult, ReadRequest, ReadResult};
use crate::pipeline::input::{self, DownloadPolicy, ResolvedInput};
use crate::pipeline::invoke::{self, ConverterInvocation};
use crate::pipeline::{sandbox, temp};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What the request asks to convert, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source<'a> {
    /// `url` field: fetched with the pdf/html extension rule.
    Webpage(&'a str),
    /// `file_path` holding a URL: fetched with extension inference.
    RemoteFile(&'a str),
    Local(&'a str),
}

/// Convert a local file or URL to Markdown.
///
/// The Markdown is also saved to a new temp file (`markdown_output_*.md`)
/// whose path is returned alongside the text; that file belongs to the
/// caller.
///
/// # Errors
/// Every failure is a [`MarkdownifyError::Conversion`] naming the stage. Use
/// [`MarkdownifyError::kind`] to branch on the underlying cause.
///
/// # Example
/// ```rust,no_run
/// use markdownify::{convert, ConversionConfig, ConversionRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::from_env()?;
/// let result = convert(&ConversionRequest::url("https://example.com"), &config).await?;
/// println!("{}", result.text);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionResult, MarkdownifyError> {
    let start = Instant::now();

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let source = classify(request).map_err(|e| e.at(Stage::ResolveInput))?;
    info!("Starting conversion: {:?}", source);

    // ── Step 2: Acquire ──────────────────────────────────────────────────
    let resolved = acquire(source, config)
        .await
        .map_err(|e| e.at(Stage::Acquire))?;

    // ── Steps 3–5: Locate, convert, persist ──────────────────────────────
    let outcome = convert_resolved(resolved.path(), request, config).await;

    // ── Step 6: Cleanup ──────────────────────────────────────────────────
    resolved.release().await;

    if let Ok(ref result) = outcome {
        info!(
            "Conversion complete: {} chars → {} in {}ms",
            result.text.len(),
            result.path.display(),
            start.elapsed().as_millis()
        );
    }
    outcome
}

/// Blocking wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionResult, MarkdownifyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MarkdownifyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(request, config))
}

/// Read back an existing Markdown file.
///
/// Refuses anything that is not `.md`/`.markdown`, and anything outside
/// `config.sandbox_root` when one is set, before touching the disk.
pub async fn read(
    request: &ReadRequest,
    config: &ConversionConfig,
) -> Result<ReadResult, MarkdownifyError> {
    let resolved = sandbox::resolve(&request.file_path);
    debug!("Read request {} → {}", request.file_path, resolved.display());

    sandbox::check_extension(&resolved)?;
    if let Some(root) = &config.sandbox_root {
        sandbox::check_root(&resolved, root)?;
    }

    let text = match tokio::fs::read_to_string(&resolved).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MarkdownifyError::FileNotFound { path: resolved });
        }
        Err(source) => {
            return Err(MarkdownifyError::Io {
                context: "Failed to read",
                path: resolved,
                source,
            });
        }
    };

    Ok(ReadResult {
        path: request.file_path.clone(),
        text,
    })
}

/// The runtime `convert` would use for `config`: the configured override
/// (home-expanded), or the discovered `uv`.
pub async fn locate_executable(config: &ConversionConfig) -> Result<PathBuf, MarkdownifyError> {
    resolve_executable(None, config).await
}

/// Resolve the runtime and confirm the converter's Python environment is set up.
pub async fn check_dependencies(config: &ConversionConfig) -> Result<PathBuf, MarkdownifyError> {
    let runtime = resolve_executable(None, config).await?;
    let root = project_root(None, config)?;
    invoke::check_dependencies(&runtime, &root, &config.converter_command).await?;
    Ok(runtime)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn classify(request: &ConversionRequest) -> Result<Source<'_>, MarkdownifyError> {
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    match (present(&request.url), present(&request.file_path)) {
        (Some(_), Some(_)) => Err(MarkdownifyError::invalid_input(
            "Only one of file_path or url may be provided",
        )),
        (Some(url), None) => Ok(Source::Webpage(url)),
        (None, Some(path)) if input::is_url(path) => Ok(Source::RemoteFile(path)),
        (None, Some(path)) => Ok(Source::Local(path)),
        (None, None) => Err(MarkdownifyError::invalid_input(
            "Either file_path or url must be provided",
        )),
    }
}

async fn acquire(
    source: Source<'_>,
    config: &ConversionConfig,
) -> Result<ResolvedInput, MarkdownifyError> {
    let policy = DownloadPolicy {
        timeout: Duration::from_secs(config.download_timeout_secs),
        warn_size_bytes: config.warn_size_bytes,
    };

    match source {
        Source::Webpage(url) => {
            input::download_to_temp(url, Some(input::webpage_extension(url)), policy).await
        }
        Source::RemoteFile(url) => input::download_to_temp(url, None, policy).await,
        Source::Local(path) => Ok(ResolvedInput::Local(PathBuf::from(path))),
    }
}

async fn convert_resolved(
    input_path: &Path,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionResult, MarkdownifyError> {
    let runtime = resolve_executable(request.executable_path.as_deref(), config)
        .await
        .map_err(|e| e.at(Stage::LocateExecutable))?;
    let root = project_root(request.project_root.as_deref(), config)
        .map_err(|e| e.at(Stage::Convert))?;

    let text = ConverterInvocation::new(&runtime, &root, &config.converter_command, input_path)
        .envs(config.extra_env.iter().cloned())
        .run()
        .await
        .map_err(|e| e.at(Stage::Convert))?;

    let path = temp::create_temp_file(&text, "md")
        .await
        .map_err(|e| e.at(Stage::PersistOutput))?;

    Ok(ConversionResult { path, text })
}

/// Request override, then config override, then discovery.
///
/// Bare names like `uv` stay bare so the OS resolves them against `PATH`.
async fn resolve_executable(
    requested: Option<&Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, MarkdownifyError> {
    let explicit = requested.or(config.executable_path.as_deref());
    let path = match explicit {
        Some(p) => sandbox::resolve_program(&p.to_string_lossy()),
        None => uv_locate::locate_uv().await?,
    };
    debug!("Using runtime executable {}", path.display());
    Ok(path)
}

fn project_root(
    requested: Option<&Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, MarkdownifyError> {
    match requested.or(config.project_root.as_deref()) {
        Some(p) => Ok(sandbox::normalize(&sandbox::expand_home(
            &p.to_string_lossy(),
        ))),
        None => std::env::current_dir().map_err(|source| MarkdownifyError::Io {
            context: "Failed to read current directory",
            path: PathBuf::from("."),
            source,
        }),
    }
}
