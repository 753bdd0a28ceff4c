//! Courtside: a polite basketball box-score scraper
//!
//! This crate fetches the statistics page of every match in a contiguous
//! identifier range, parses the per-player box scores, and consolidates them
//! into CSV datasets plus a run report.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod url;

use thiserror::Error;

/// Main error type for Courtside operations
///
/// Only fatal conditions end up here. Per-match failures are contained in
/// the [`output::RunReport`] instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Run ended with {recorded} outcomes for {expected} matches")]
    IncompleteRun { expected: u64, recorded: u64 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Courtside operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::ScrapeConfig;
pub use output::RunReport;
pub use pipeline::{run_scrape, Coordinator};
