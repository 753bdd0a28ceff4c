//! Configuration module for Courtside
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use courtside::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scraping {} matches", config.match_count());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ScrapeConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_CONCURRENCY, MAX_SECONDS};
