//! Read-back authorisation: extension allow-list and optional root confinement.
//!
//! Paths are normalised lexically (absolute, `.`/`..` folded) rather than
//! canonicalised, so the checks behave the same whether or not the file
//! exists. Symlinks are not resolved: a link inside the root that points
//! outside it is allowed through.

use crate::error::MarkdownifyError;
use std::path::{Component, Path, PathBuf};

/// Extensions `read` will serve.
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else if let Some(rest) = path.strip_prefix("~/") {
        Some(rest)
    } else if cfg!(windows) {
        path.strip_prefix("~\\")
    } else {
        None
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Absolute form of `path` with `.` and `..` removed, without touching the disk.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root.
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `expand_home` followed by `normalize`.
pub fn resolve(path: &str) -> PathBuf {
    normalize(&expand_home(path))
}

/// Resolve an executable given by the user.
///
/// A bare program name (`uv`) is returned unchanged so spawning searches
/// `PATH`; anything with a directory part is resolved like [`resolve`].
pub fn resolve_program(program: &str) -> PathBuf {
    let expanded = expand_home(program);
    let mut components = expanded.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => expanded,
        _ => normalize(&expanded),
    }
}

/// Fail with `UnsupportedType` unless `path` ends in `.md` or `.markdown`.
pub fn check_extension(path: &Path) -> Result<(), MarkdownifyError> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.contains(&e));
    if ok {
        Ok(())
    } else {
        Err(MarkdownifyError::UnsupportedType {
            path: path.to_path_buf(),
        })
    }
}

/// Fail with `AccessDenied` unless normalised `path` lies under normalised `root`.
pub fn check_root(path: &Path, root: &Path) -> Result<(), MarkdownifyError> {
    let root = normalize(&expand_home(&root.to_string_lossy()));
    let path = normalize(path);
    if path.starts_with(&root) {
        Ok(())
    } else {
        Err(MarkdownifyError::AccessDenied { path, root })
    }
}
