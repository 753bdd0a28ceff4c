//! Scrape coordinator - main orchestration logic
//!
//! This module contains the run loop that coordinates a scrape:
//! - Enumerating one job per match identifier
//! - Feeding jobs to a bounded pool of workers over a channel
//! - Fetching and parsing in the workers
//! - Collecting every outcome and handing the aggregate to the writers

use crate::config::{validate, ScrapeConfig};
use crate::output::{Aggregator, MatchResult, RunReport};
use crate::pipeline::fetcher::{FetchOutcome, Fetcher, MatchJob};
use crate::pipeline::parser::parse_match;
use crate::url::resolve_match_url;
use crate::ScrapeError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Completed matches between two progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Main scrape coordinator structure
pub struct Coordinator {
    config: Arc<ScrapeConfig>,
    fetcher: Arc<Fetcher>,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The configuration is validated here, so an invalid range or
    /// destination is rejected before any request is made.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapeError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        validate(&config)?;
        let fetcher = Fetcher::from_config(&config)?;
        Ok(Self::assemble(config, fetcher))
    }

    /// Creates a coordinator around an existing fetcher
    ///
    /// The configuration is validated the same way as in [`Coordinator::new`].
    pub fn with_fetcher(config: ScrapeConfig, fetcher: Fetcher) -> Result<Self, ScrapeError> {
        validate(&config)?;
        Ok(Self::assemble(config, fetcher))
    }

    fn assemble(config: ScrapeConfig, fetcher: Fetcher) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            config_hash: None,
        }
    }

    /// Attaches the configuration file hash to the run report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Enumerates one job per identifier, ascending
    ///
    /// Jobs are built lazily as the iterator advances.
    pub fn jobs(&self) -> impl Iterator<Item = Result<MatchJob, ScrapeError>> + '_ {
        match_jobs(&self.config)
    }

    /// Runs the scrape to completion
    ///
    /// Every identifier produces exactly one outcome; per-match failures are
    /// reported, never fatal. Only output errors, a panicked worker, or a
    /// broken outcome count end the run with an error.
    pub async fn run(self) -> Result<RunReport, ScrapeError> {
        let expected = self.config.match_count();
        let workers = u64::from(self.config.concurrency.max(1)).min(expected) as usize;

        tracing::info!(
            "Scraping matches {}..={} ({} jobs, {} workers, {:?} between requests)",
            self.config.start_id,
            self.config.end_id,
            expected,
            workers,
            self.fetcher.limiter().interval()
        );

        let start_time = Instant::now();
        let (job_tx, job_rx) = mpsc::channel::<MatchJob>(workers);
        let (result_tx, mut result_rx) = mpsc::channel::<MatchResult>(workers);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                worker_loop(worker_id, fetcher, job_rx, result_tx).await;
            });
        }
        drop(result_tx);

        let config = Arc::clone(&self.config);
        let producer = tokio::spawn(async move {
            for job in match_jobs(&config) {
                if job_tx.send(job?).await.is_err() {
                    tracing::error!("All workers stopped before the job queue drained");
                    break;
                }
            }
            Ok::<(), ScrapeError>(())
        });

        let mut aggregator = Aggregator::new();
        while let Some(result) = result_rx.recv().await {
            match &result {
                MatchResult::Scraped {
                    match_id,
                    sheet: Some(sheet),
                    ..
                } => tracing::info!(
                    "Match {}: {} vs {}, {} player rows",
                    match_id,
                    sheet.home_team,
                    sheet.away_team,
                    sheet.record_count()
                ),
                MatchResult::Scraped { match_id, .. } => {
                    tracing::info!("Match {}: no box score on page", match_id)
                }
                MatchResult::Failed {
                    match_id,
                    cause,
                    attempts,
                } => tracing::warn!(
                    "Match {}: failed after {} attempt(s): {}",
                    match_id,
                    attempts,
                    cause
                ),
            }

            aggregator.record(result);

            let done = aggregator.recorded();
            if done % PROGRESS_INTERVAL == 0 && done < expected {
                let rate = done as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} matches, {} failed, {:.2} matches/sec",
                    done,
                    expected,
                    aggregator.failed(),
                    rate
                );
            }
        }

        producer.await??;
        while let Some(joined) = tasks.join_next().await {
            joined?;
        }

        if aggregator.recorded() != expected || aggregator.duplicates() > 0 {
            return Err(ScrapeError::IncompleteRun {
                expected,
                recorded: aggregator.recorded() + aggregator.duplicates(),
            });
        }

        if aggregator.failed() == expected {
            tracing::warn!(
                "Every one of the {} matches failed; the site or base URL may be broken",
                expected
            );
        }

        let report = aggregator.finalize(&self.config, self.config_hash)?;

        tracing::info!(
            "Scrape completed: {} succeeded, {} failed, {} player rows in {:?}",
            report.succeeded,
            report.failed,
            report.records_written,
            start_time.elapsed()
        );

        Ok(report)
    }
}

/// Lazily builds the job for every identifier in the configured range
fn match_jobs(config: &ScrapeConfig) -> impl Iterator<Item = Result<MatchJob, ScrapeError>> + '_ {
    (config.start_id..=config.end_id).map(move |match_id| {
        let url = resolve_match_url(&config.base_url, match_id)?;
        Ok(MatchJob { match_id, url })
    })
}

/// Pulls jobs until the queue closes, sending one result per job
async fn worker_loop(
    worker_id: usize,
    fetcher: Arc<Fetcher>,
    jobs: Arc<Mutex<mpsc::Receiver<MatchJob>>>,
    results: mpsc::Sender<MatchResult>,
) {
    loop {
        // Lock scope ends before the fetch, other workers keep pulling
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        tracing::debug!("Worker {} fetching match {}", worker_id, job.match_id);
        let result = process_job(&fetcher, job).await;

        if results.send(result).await.is_err() {
            tracing::error!("Worker {}: result channel closed", worker_id);
            break;
        }
    }
}

/// Fetches and parses one match
pub async fn process_job(fetcher: &Fetcher, job: MatchJob) -> MatchResult {
    match fetcher.fetch(job).await {
        FetchOutcome::Success {
            match_id,
            body,
            attempts,
        } => MatchResult::Scraped {
            match_id,
            sheet: parse_match(&body, match_id),
            attempts,
        },
        FetchOutcome::Failure {
            match_id,
            cause,
            attempts,
        } => MatchResult::Failed {
            match_id,
            cause,
            attempts,
        },
    }
}

/// Runs a complete scrape
///
/// This is the main entry point for the pipeline. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client and rate limiter
/// 3. Fetch and parse every match in the range
/// 4. Write the datasets and return the run report
pub async fn run_scrape(config: ScrapeConfig) -> Result<RunReport, ScrapeError> {
    Coordinator::new(config)?.run().await
}
