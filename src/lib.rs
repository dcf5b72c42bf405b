//! # markdownify
//!
//! Convert documents and web pages to Markdown by driving
//! [markitdown](https://github.com/microsoft/markitdown) through
//! [`uv`](https://docs.astral.sh/uv/), and read finished Markdown back under
//! an optional sandbox.
//!
//! The converter itself is a black box: this crate finds it, feeds it a
//! local file, and collects what it prints. The interesting work is around
//! it: fetching untrusted URLs with a deadline, never leaking a temp file,
//! and refusing read-back outside an allowed directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Resolve   validate: exactly one of file_path / url
//!  ├─ 2. Acquire   local path, or download into a private temp dir
//!  ├─ 3. Locate    explicit uv path, or PATH / well-known install dirs
//!  ├─ 4. Convert   uv run --project <root> markitdown <input>
//!  ├─ 5. Persist   save Markdown to markdown_output_*.md
//!  └─ 6. Cleanup   remove the temp dir from step 2 (always, exactly once)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markdownify::{convert, read, ConversionConfig, ConversionRequest, ReadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // MD_SHARE_DIR confines `read`; MARKDOWNIFY_UV_PATH skips discovery.
//!     let config = ConversionConfig::from_env()?;
//!
//!     let result = convert(&ConversionRequest::file("report.docx"), &config).await?;
//!     println!("saved to {}", result.path.display());
//!
//!     let back = read(&ReadRequest::new(result.path.to_string_lossy()), &config).await?;
//!     assert_eq!(back.text, result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markdownify` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! markdownify = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{check_dependencies, convert, convert_sync, locate_executable, read};
pub use error::{ErrorKind, MarkdownifyError, Stage};
pub use output::{ConversionRequest, ConversionResult, ReadRequest, ReadResult};
pub use uv_locate::{locate_uv, LocateError};
