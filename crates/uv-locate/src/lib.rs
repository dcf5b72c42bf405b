//! # uv-locate
//!
//! Locate the [`uv`](https://docs.astral.sh/uv/) executable (or any other
//! command-line tool installed the same way) on the current machine.
//!
//! ## How it works
//!
//! On a call to [`locate`]:
//!
//! 1. Searches `PATH` with the [`which`] crate (honouring `PATHEXT` on
//!    Windows).
//! 2. Otherwise walks a fixed list of well-known install directories (see
//!    [`candidate_paths`]) and returns the first regular file found.
//! 3. Otherwise fails with [`LocateError::NotFound`], whose message carries
//!    install instructions for the current platform.
//!
//! [`locate_uv`] first honours `UV_LOCATE_PATH` when it names an existing
//! file, then memoises the result in a process-wide cache so concurrent
//! callers share one read-only resolution.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), uv_locate::LocateError> {
//! let uv = uv_locate::locate_uv().await?;
//! println!("uv lives at {}", uv.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Search order
//!
//! | Platform | Candidates after PATH |
//! |----------|-----------------------|
//! | all      | `~/.local/bin`, `<data dir>/markdownify/bin` |
//! | Windows  | `%APPDATA%\Python\Scripts`, `%LOCALAPPDATA%\Programs\Python\Scripts` |
//! | Unix     | `/usr/local/bin`, `/usr/bin`, `/opt/homebrew/bin` |

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that short-circuits [`locate_uv`].
pub const OVERRIDE_ENV: &str = "UV_LOCATE_PATH";

/// Application name used for the per-user data directory candidate.
pub const APP_DIR_NAME: &str = "markdownify";

const UNIX_INSTALL: &str = "Linux/Mac:\n  curl -LsSf https://astral.sh/uv/install.sh | sh";
const WINDOWS_INSTALL: &str =
    "Windows (PowerShell):\n  powershell -c \"irm https://astral.sh/uv/install.ps1 | iex\"";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by uv-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The tool is neither on PATH nor in any well-known install directory.
    #[error(
        "{tool} not found!\n\n\
Please install uv first:\n{instructions}\n\n\
After installation, run:\n  \
uv sync  (to install Python dependencies)\n  \
uv run --project . markitdown --help  (to verify)\n\n\
Searched: {searched}\n\
For more info: https://docs.astral.sh/uv/getting-started/installation/"
    )]
    NotFound {
        tool: String,
        instructions: &'static str,
        searched: String,
    },
}

// ── Platform detection ───────────────────────────────────────────────────────

/// Operating-system families with distinct install layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    /// BSDs and other Unix-likes; searched like Linux.
    OtherUnix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::OtherUnix,
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    /// Install instructions shown in [`LocateError::NotFound`].
    pub fn install_instructions(self) -> &'static str {
        if self.is_windows() {
            WINDOWS_INSTALL
        } else {
            UNIX_INSTALL
        }
    }
}

/// Executable file name for `tool` on `platform` (`uv` → `uv.exe` on Windows).
pub fn executable_name(tool: &str, platform: Platform) -> String {
    if platform.is_windows() && !tool.ends_with(".exe") {
        format!("{tool}.exe")
    } else {
        tool.to_string()
    }
}

// ── Candidate directories ────────────────────────────────────────────────────

/// Base directories feeding [`candidate_paths`].
///
/// Kept separate from discovery so candidate order can be checked without
/// touching the real home directory.
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
    pub home: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    /// `%APPDATA%` (roaming).
    pub app_data: Option<PathBuf>,
    /// `%LOCALAPPDATA%`.
    pub local_app_data: Option<PathBuf>,
}

impl SearchRoots {
    /// Roots for the current user, read from `dirs` and the environment.
    pub fn from_env() -> Self {
        Self {
            home: dirs::home_dir(),
            data_dir: dirs::data_dir(),
            app_data: std::env::var_os("APPDATA").map(PathBuf::from),
            local_app_data: std::env::var_os("LOCALAPPDATA").map(PathBuf::from),
        }
    }
}

/// Ordered list of well-known locations for `tool`. First existing file wins.
pub fn candidate_paths(tool: &str, platform: Platform, roots: &SearchRoots) -> Vec<PathBuf> {
    let exe = executable_name(tool, platform);
    let mut paths = Vec::new();

    if let Some(home) = &roots.home {
        paths.push(home.join(".local").join("bin").join(&exe));
    }
    if let Some(data) = &roots.data_dir {
        paths.push(data.join(APP_DIR_NAME).join("bin").join(&exe));
    }

    if platform.is_windows() {
        let roaming = roots
            .app_data
            .clone()
            .or_else(|| roots.home.as_ref().map(|h| h.join("AppData").join("Roaming")));
        let local = roots
            .local_app_data
            .clone()
            .or_else(|| roots.home.as_ref().map(|h| h.join("AppData").join("Local")));
        if let Some(roaming) = roaming {
            paths.push(roaming.join("Python").join("Scripts").join(&exe));
        }
        if let Some(local) = local {
            paths.push(
                local
                    .join("Programs")
                    .join("Python")
                    .join("Scripts")
                    .join(&exe),
            );
        }
    } else {
        for dir in ["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"] {
            paths.push(Path::new(dir).join(&exe));
        }
    }

    paths
}

/// Returns the first candidate that is an existing regular file.
pub fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_UV: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Locate `uv`, caching the answer for the rest of the process.
///
/// Safe to call from many tasks at once; a race only means two lookups run,
/// and both store the same answer.
pub async fn locate_uv() -> Result<PathBuf, LocateError> {
    if let Some(path) = override_path(std::env::var_os(OVERRIDE_ENV)) {
        return Ok(path);
    }
    if let Some(path) = RESOLVED_UV.get() {
        return Ok(path.clone());
    }

    let path = locate("uv").await?;
    let _ = RESOLVED_UV.set(path.clone());
    Ok(path)
}

/// Locate `tool` without caching.
pub async fn locate(tool: &str) -> Result<PathBuf, LocateError> {
    let platform = Platform::current();

    if let Some(found) = lookup_in_path(tool, platform).await {
        return Ok(found);
    }

    let candidates = candidate_paths(tool, platform, &SearchRoots::from_env());
    if let Some(found) = first_existing(&candidates) {
        return Ok(found);
    }

    Err(LocateError::NotFound {
        tool: tool.to_string(),
        instructions: platform.install_instructions(),
        searched: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// `UV_LOCATE_PATH` value, if it names an existing file. A stale value is
/// ignored so discovery still runs.
fn override_path(value: Option<OsString>) -> Option<PathBuf> {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_file())
}

/// Search `PATH` for `tool`. Any failure means "not on PATH".
async fn lookup_in_path(tool: &str, platform: Platform) -> Option<PathBuf> {
    let exe = executable_name(tool, platform);
    let path_var = std::env::var_os("PATH");
    tokio::task::spawn_blocking(move || lookup_in(&exe, path_var))
        .await
        .ok()
        .flatten()
}

/// Search the directories of a `PATH`-style value for an executable `exe`.
fn lookup_in(exe: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(exe, path_var, cwd).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
