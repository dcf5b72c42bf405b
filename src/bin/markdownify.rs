//! CLI binary for markdownify.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / requests and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use markdownify::{
    check_dependencies, convert, locate_executable, read, ConversionConfig, ConversionRequest,
    ReadRequest,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a local document (Markdown on stdout)
  markdownify convert report.docx

  # Convert a web page; .pdf URLs are fetched as PDF, anything else as HTML
  markdownify convert --url https://example.com/article

  # Download a remote file and keep its own type
  markdownify convert https://example.com/slides.pptx

  # Result as JSON ({"path": ..., "text": ...})
  markdownify convert --json notes.pdf

  # Read back a Markdown file, confined to a share directory
  MD_SHARE_DIR=~/shared markdownify read ~/shared/notes.md

  # Where is uv, and is markitdown installed?
  markdownify locate
  markdownify check --project-root .

ENVIRONMENT VARIABLES:
  MD_SHARE_DIR                       Directory `read` is confined to
  MARKDOWNIFY_UV_PATH                Explicit uv executable (skips discovery)
  MARKDOWNIFY_PROJECT_ROOT           Project passed to `uv run --project`
  MARKDOWNIFY_DOWNLOAD_TIMEOUT_SECS  URL download timeout (default 30)
  UV_LOCATE_PATH                     Override used by uv discovery itself
  RUST_LOG                           Log filter, e.g. markdownify=debug

SETUP:
  1. Install uv:      curl -LsSf https://astral.sh/uv/install.sh | sh
  2. Install deps:    uv sync
  3. Verify:          markdownify check
"#;

/// Convert documents and web pages to Markdown with markitdown.
#[derive(Parser, Debug)]
#[command(
    name = "markdownify",
    version,
    about = "Convert documents and web pages to Markdown with markitdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MARKDOWNIFY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MARKDOWNIFY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local file or URL to Markdown.
    Convert {
        /// Local path, or HTTP/HTTPS URL to download.
        input: String,

        /// Treat INPUT as a web page URL (pdf/html extension rule).
        #[arg(long)]
        url: bool,

        /// Project passed to `uv run --project`.
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Explicit uv executable.
        #[arg(long)]
        uv_path: Option<PathBuf>,

        /// HTTP download timeout in seconds.
        #[arg(long)]
        download_timeout: Option<u64>,

        /// Print `{"path", "text"}` JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Print an existing Markdown file.
    Read {
        /// Path to a `.md` / `.markdown` file.
        path: String,

        /// Print `{"path", "text"}` JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Print the uv executable that would be used.
    Locate,

    /// Verify uv and the markitdown environment.
    Check {
        /// Project passed to `uv run --project`.
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ConversionConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Convert {
            input,
            url,
            project_root,
            uv_path,
            download_timeout,
            json,
        } => {
            let config = match download_timeout {
                Some(secs) => config
                    .into_builder()
                    .download_timeout_secs(secs)
                    .build()
                    .context("Invalid configuration")?,
                None => config,
            };
            let mut request = if url {
                ConversionRequest::url(input)
            } else {
                ConversionRequest::file(input)
            };
            request.project_root = project_root;
            request.executable_path = uv_path;

            let result = convert(&request, &config)
                .await
                .context("Conversion failed")?;

            if json {
                let json =
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                write_markdown(&result.text)?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {} chars  →  {}",
                        green("✔"),
                        result.text.len(),
                        bold(&result.path.display().to_string())
                    );
                }
            }
        }

        Command::Read { path, json } => {
            let result = read(&ReadRequest::new(path), &config)
                .await
                .context("Read failed")?;
            if json {
                let json =
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
                println!("{json}");
            } else {
                write_markdown(&result.text)?;
            }
        }

        Command::Locate => {
            let path = locate_executable(&config)
                .await
                .context("uv discovery failed")?;
            println!("{}", path.display());
        }

        Command::Check { project_root } => {
            let config = match project_root {
                Some(root) => config
                    .into_builder()
                    .project_root(root)
                    .build()
                    .context("Invalid configuration")?,
                None => config,
            };
            let uv = check_dependencies(&config)
                .await
                .context("Dependency check failed")?;
            if !cli.quiet {
                eprintln!(
                    "{} markitdown is available via {}",
                    green("✔"),
                    dim(&uv.display().to_string())
                );
            }
        }
    }

    Ok(())
}

fn write_markdown(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
