//! Run the external converter as `<uv> run --project <root> <command> <input>`.
//!
//! The converter is opaque: a file path goes in, Markdown comes out on stdout,
//! diagnostics come out on stderr. Success is decided by stderr being empty,
//! not by the exit code. A converter that prints warnings on stderr during an
//! otherwise good run is therefore reported as a failure.
//!
//! There is no timeout on the child. Callers that need bounded latency must
//! wrap [`ConverterInvocation::run`] in their own `tokio::time::timeout`.

use crate::error::MarkdownifyError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};
use uv_locate::Platform;

/// A fully described converter run. Nothing global is mutated to build or run it.
#[derive(Debug, Clone)]
pub struct ConverterInvocation {
    runtime: PathBuf,
    args: Vec<OsString>,
    env: Vec<(String, String)>,
}

impl ConverterInvocation {
    /// `<runtime> run --project <project_root> <command> <input>` with the
    /// current platform's encoding overrides.
    pub fn new(runtime: &Path, project_root: &Path, command: &str, input: &Path) -> Self {
        Self::with_args(runtime, project_root, command, [input.as_os_str().to_owned()])
    }

    fn with_args<I>(runtime: &Path, project_root: &Path, command: &str, tail: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut args: Vec<OsString> = vec![
            "run".into(),
            "--project".into(),
            project_root.as_os_str().to_owned(),
            command.into(),
        ];
        args.extend(tail);
        Self {
            runtime: runtime.to_path_buf(),
            args,
            env: encoding_overrides(Platform::current()),
        }
    }

    /// Layer extra environment over the encoding overrides.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn runtime(&self) -> &Path {
        &self.runtime
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Shell-style rendering for logs and errors. Segments containing
    /// whitespace are double-quoted.
    ///
    /// The process itself is spawned from the argument vector, never through
    /// a shell, so this string is display-only.
    pub fn command_line(&self) -> String {
        std::iter::once(self.runtime.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| quote_if_spaced(&s.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.runtime);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_failed(&self, e: &std::io::Error) -> MarkdownifyError {
        MarkdownifyError::ConverterFailed {
            command: self.command_line(),
            exit_code: None,
            stderr: format!("failed to start '{}': {e}", self.runtime.display()),
        }
    }

    /// Spawn the converter and wait for it.
    ///
    /// Returns stdout on success. Any stderr output, even with exit code 0,
    /// is a [`MarkdownifyError::ConverterFailed`].
    pub async fn run(&self) -> Result<String, MarkdownifyError> {
        let command_line = self.command_line();
        info!("Running converter: {}", command_line);

        let output = self
            .command()
            .output()
            .await
            .map_err(|e| self.spawn_failed(&e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            return Err(MarkdownifyError::ConverterFailed {
                command: command_line,
                exit_code: output.status.code(),
                stderr: stderr.into_owned(),
            });
        }

        debug!(
            "Converter exited with {:?}, {} bytes on stdout",
            output.status.code(),
            output.stdout.len()
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Per-invocation environment forcing UTF-8 output from the Python converter.
///
/// `PYTHONUTF8=1` everywhere; Windows additionally gets
/// `PYTHONIOENCODING=utf-8` because its console code page would otherwise
/// mangle non-ASCII stdout.
pub fn encoding_overrides(platform: Platform) -> Vec<(String, String)> {
    let mut env = vec![("PYTHONUTF8".to_string(), "1".to_string())];
    if platform.is_windows() {
        env.push(("PYTHONIOENCODING".to_string(), "utf-8".to_string()));
    }
    env
}

/// Double-quote `segment` if it contains whitespace.
pub fn quote_if_spaced(segment: &str) -> String {
    if segment.chars().any(char::is_whitespace) {
        format!("\"{segment}\"")
    } else {
        segment.to_string()
    }
}

/// Check that `<command>` is installed in the project's environment.
///
/// Runs `<runtime> run --project <root> <command> --help`. A
/// `ModuleNotFoundError` anywhere in the output means `uv sync` has not been
/// run; any other failure is returned as-is.
pub async fn check_dependencies(
    runtime: &Path,
    project_root: &Path,
    command: &str,
) -> Result<(), MarkdownifyError> {
    let probe =
        ConverterInvocation::with_args(runtime, project_root, command, [OsString::from("--help")]);
    debug!("Checking converter dependencies: {}", probe.command_line());

    let output = probe
        .command()
        .output()
        .await
        .map_err(|e| probe.spawn_failed(&e))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stdout.contains("ModuleNotFoundError") || stderr.contains("ModuleNotFoundError") {
        return Err(MarkdownifyError::DependencyMissing {
            project_root: project_root.to_path_buf(),
        });
    }
    if !output.status.success() {
        return Err(MarkdownifyError::ConverterFailed {
            command: probe.command_line(),
            exit_code: output.status.code(),
            stderr: stderr.into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_order_matches_uv_contract() {
        let inv = ConverterInvocation::new(
            Path::new("/usr/bin/uv"),
            Path::new("/opt/proj"),
            "markitdown",
            Path::new("/tmp/in.pdf"),
        );
        let args: Vec<String> = inv
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["run", "--project", "/opt/proj", "markitdown", "/tmp/in.pdf"]);
    }

    #[test]
    fn command_line_quotes_spaced_segments() {
        let inv = ConverterInvocation::new(
            Path::new("/Users/Ada Lovelace/.local/bin/uv"),
            Path::new("/opt/proj"),
            "markitdown",
            Path::new("/tmp/my report.pdf"),
        );
        assert_eq!(
            inv.command_line(),
            "\"/Users/Ada Lovelace/.local/bin/uv\" run --project /opt/proj markitdown \"/tmp/my report.pdf\""
        );
    }

    #[test]
    fn encoding_overrides_are_platform_conditioned() {
        let unix = encoding_overrides(Platform::Linux);
        assert_eq!(unix, vec![("PYTHONUTF8".to_string(), "1".to_string())]);

        let win = encoding_overrides(Platform::Windows);
        assert!(win.contains(&("PYTHONIOENCODING".into(), "utf-8".into())));
        assert!(win.contains(&("PYTHONUTF8".into(), "1".into())));
    }

    #[test]
    fn extra_env_layers_on_top() {
        let inv = ConverterInvocation::new(
            Path::new("uv"),
            Path::new("."),
            "markitdown",
            Path::new("a.pdf"),
        )
        .envs([("MARKITDOWN_FLAG", "on")]);
        assert_eq!(
            inv.env().last(),
            Some(&("MARKITDOWN_FLAG".to_string(), "on".to_string()))
        );
    }

    #[test]
    fn invocation_leaves_process_env_alone() {
        let before = std::env::var_os("PYTHONIOENCODING");
        let _ = ConverterInvocation::new(
            Path::new("uv"),
            Path::new("."),
            "markitdown",
            Path::new("a.pdf"),
        );
        assert_eq!(std::env::var_os("PYTHONIOENCODING"), before);
    }

    #[tokio::test]
    async fn missing_runtime_is_conversion_error() {
        let inv = ConverterInvocation::new(
            Path::new("/definitely/not/here/uv"),
            Path::new("."),
            "markitdown",
            Path::new("a.pdf"),
        );
        let err = inv.run().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConversionError);
        assert!(err.to_string().contains("failed to start"));
    }
}
