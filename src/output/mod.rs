//! Output module for the scraped datasets and run reports
//!
//! This module handles:
//! - Accumulating per-match outcomes in match id order
//! - Writing the player and game CSV datasets
//! - Building the run report and its markdown summary

mod aggregator;
pub mod csv;
mod markdown;
mod report;

pub use aggregator::{Aggregator, MatchResult};
pub use markdown::{format_markdown_summary, write_markdown_summary};
pub use report::{print_report, FailedMatch, RunReport};

use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
