//! Pipeline stages for acquisition and conversion.
//!
//! Each submodule owns exactly one concern so it can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ invoke ──▶ temp
//! (URL/path)  (uv run markitdown)  (persist + cleanup)
//!
//! sandbox ──▶ fs          (read-back)
//! ```
//!
//! 1. [`input`]   — download remote inputs into an owned temp directory
//! 2. [`invoke`]  — build and run the converter process, classify its output
//! 3. [`temp`]    — persist outputs, release temp resources exactly once
//! 4. [`sandbox`] — extension and root checks for reading Markdown back

pub mod input;
pub mod invoke;
pub mod sandbox;
pub mod temp;
