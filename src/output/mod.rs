//! Output module for rendering scrape results
//!
//! This module handles:
//! - The JSON envelope returned to callers (`{result, usage}` or `{error}`)
//! - Human-readable markdown reports of a scraped page
//! - Writing either to a file

mod json;
mod markdown;

pub use json::{render_error_json, render_json, render_outcome_json};
pub use markdown::{format_markdown, write_markdown};

use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes rendered output to `path`, replacing any existing file
pub fn write_output(content: &str, output_path: &Path) -> OutputResult<()> {
    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    Ok(())
}
