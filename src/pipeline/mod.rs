//! Scrape pipeline: pacing, fetching, parsing and coordination
//!
//! This module contains the core scraping logic, including:
//! - A global FIFO rate limiter shared by every request
//! - HTTP fetching with fixed-delay retry
//! - Box-score parsing into player records
//! - The coordinator running a bounded pool of workers over the id range

mod coordinator;
mod fetcher;
mod parser;
mod rate_limiter;

pub use coordinator::{process_job, run_scrape, Coordinator};
pub use fetcher::{
    build_http_client, classify_status, FetchError, FetchOutcome, Fetcher, MatchJob, RetryPolicy,
};
pub use parser::{parse_match, parse_stats, GameRecord, MatchSheet, StatRecord};
pub use rate_limiter::RateLimiter;
