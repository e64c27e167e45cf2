//! Output module for persisting and displaying scan reports
//!
//! This module handles:
//! - Writing reports as pretty-printed JSON files
//! - Rendering a human-readable terminal summary

mod json;
mod summary;

pub use json::{report_file_name, save_report};
pub use summary::{render_summary, MAX_SUMMARY_EMAILS};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid report file name: {0}")]
    InvalidName(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
