//! Accumulation of per-match outcomes into the final datasets
//!
//! The [`Aggregator`] is owned by the coordinator's receive loop, so results
//! are appended from a single task and no locking is needed. Entries are
//! keyed by match id, which gives the dataset its ascending order no matter
//! in which order workers finish.

use crate::config::ScrapeConfig;
use crate::output::csv::write_csv_file;
use crate::output::markdown::write_markdown_summary;
use crate::output::report::{FailedMatch, RunReport};
use crate::output::OutputResult;
use crate::pipeline::{FetchError, GameRecord, MatchSheet, StatRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;

/// The processed outcome of one match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The page was fetched; `sheet` is `None` when it held no box score
    Scraped {
        match_id: u32,
        sheet: Option<MatchSheet>,
        attempts: u32,
    },

    /// The page could not be fetched
    Failed {
        match_id: u32,
        cause: FetchError,
        attempts: u32,
    },
}

impl MatchResult {
    pub fn match_id(&self) -> u32 {
        match self {
            Self::Scraped { match_id, .. } | Self::Failed { match_id, .. } => *match_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scraped { .. })
    }
}

/// Accumulates outcomes for every match in a run
#[derive(Debug)]
pub struct Aggregator {
    outcomes: BTreeMap<u32, MatchResult>,
    duplicates: u64,
    started_at: DateTime<Utc>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            outcomes: BTreeMap::new(),
            duplicates: 0,
            started_at: Utc::now(),
        }
    }

    /// Records the outcome of one match
    ///
    /// A second outcome for the same match is ignored and counted; the
    /// coordinator treats any duplicate as an accounting failure.
    pub fn record(&mut self, result: MatchResult) {
        let match_id = result.match_id();
        if self.outcomes.contains_key(&match_id) {
            tracing::error!("Duplicate outcome for match {}, ignoring", match_id);
            self.duplicates += 1;
            return;
        }
        self.outcomes.insert(match_id, result);
    }

    /// Number of distinct matches recorded
    pub fn recorded(&self) -> u64 {
        self.outcomes.len() as u64
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn succeeded(&self) -> u64 {
        self.outcomes.values().filter(|r| r.is_success()).count() as u64
    }

    pub fn failed(&self) -> u64 {
        self.recorded() - self.succeeded()
    }

    /// All player records, by match id then page order
    pub fn records(&self) -> impl Iterator<Item = &StatRecord> {
        self.sheets().flat_map(|sheet| sheet.records.iter())
    }

    /// One game row per match that had a box score, by match id
    pub fn games(&self) -> Vec<GameRecord> {
        self.sheets().map(MatchSheet::game_record).collect()
    }

    fn sheets(&self) -> impl Iterator<Item = &MatchSheet> {
        self.outcomes.values().filter_map(|result| match result {
            MatchResult::Scraped {
                sheet: Some(sheet), ..
            } => Some(sheet),
            _ => None,
        })
    }

    /// Builds the run report without writing anything
    pub fn report(&self) -> RunReport {
        let failures = self
            .outcomes
            .values()
            .filter_map(|result| match result {
                MatchResult::Failed {
                    match_id,
                    cause,
                    attempts,
                } => Some(FailedMatch {
                    match_id: *match_id,
                    cause: cause.clone(),
                    attempts: *attempts,
                }),
                MatchResult::Scraped { .. } => None,
            })
            .collect();

        let empty_matches = self
            .outcomes
            .values()
            .filter_map(|result| match result {
                MatchResult::Scraped { match_id, sheet, .. }
                    if sheet.as_ref().map_or(true, |s| s.records.is_empty()) =>
                {
                    Some(*match_id)
                }
                _ => None,
            })
            .collect();

        RunReport {
            attempted: self.recorded(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            failures,
            empty_matches,
            records_written: 0,
            games_written: 0,
            started_at: self.started_at,
            finished_at: Utc::now(),
            config_hash: None,
        }
    }

    /// Writes the datasets and returns the final report
    ///
    /// The stat and game CSVs are written once each, followed by the
    /// markdown summary when one is configured.
    pub fn finalize(
        self,
        config: &ScrapeConfig,
        config_hash: Option<String>,
    ) -> OutputResult<RunReport> {
        let mut report = self.report();
        report.config_hash = config_hash;

        report.records_written = write_csv_file(Path::new(&config.output_file), self.records())? as u64;
        tracing::info!(
            "Wrote {} player rows to {}",
            report.records_written,
            config.output_file
        );

        let games = self.games();
        report.games_written = write_csv_file(Path::new(&config.output_file_game), &games)? as u64;
        tracing::info!(
            "Wrote {} game rows to {}",
            report.games_written,
            config.output_file_game
        );

        report.finished_at = Utc::now();

        if let Some(summary_path) = &config.summary_file {
            write_markdown_summary(&report, Path::new(summary_path))?;
            tracing::info!("Wrote run summary to {}", summary_path);
        }

        Ok(report)
    }
}
