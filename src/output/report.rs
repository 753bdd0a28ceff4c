//! Run report returned to the caller once a scrape completes

use crate::pipeline::FetchError;
use chrono::{DateTime, Utc};

/// A match that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMatch {
    pub match_id: u32,
    pub cause: FetchError,
    pub attempts: u32,
}

/// Outcome counts for one run
///
/// `attempted == succeeded + failed` always holds, and every identifier of
/// the configured range appears exactly once across `succeeded` and
/// `failures`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,

    /// Failed matches, ascending by id
    pub failures: Vec<FailedMatch>,

    /// Matches fetched without a box score, ascending by id
    pub empty_matches: Vec<u32>,

    /// Player rows written to the stat dataset
    pub records_written: u64,

    /// Rows written to the game dataset
    pub games_written: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Hash of the configuration file, when known
    pub config_hash: Option<String>,
}

impl RunReport {
    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.attempted as f64) * 100.0
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Returns true when every attempted match failed
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }

    /// Match ids of the failures
    pub fn failed_ids(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.match_id).collect()
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &RunReport) {
    println!("=== Scrape Report ===\n");

    println!("Overview:");
    println!("  Matches attempted: {}", report.attempted);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed);
    println!("  Without box score: {}", report.empty_matches.len());
    println!("  Player rows written: {}", report.records_written);
    println!("  Game rows written: {}", report.games_written);
    println!(
        "  Duration: {:.1}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    if !report.failures.is_empty() {
        println!("Failed Matches ({}):", report.failures.len());
        for failure in &report.failures {
            println!(
                "  - {}: {} [{}, {} attempt(s)]",
                failure.match_id,
                failure.cause,
                failure.cause.category(),
                failure.attempts
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} matches fetched)",
        report.success_rate(),
        report.succeeded,
        report.attempted
    );
}
