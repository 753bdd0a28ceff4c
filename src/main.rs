//! Courtside main entry point
//!
//! This is the command-line interface for the Courtside box-score scraper.

use anyhow::Context;
use clap::Parser;
use courtside::config::{load_config_with_hash, ScrapeConfig};
use courtside::output::print_report;
use courtside::url::resolve_match_url;
use courtside::Coordinator;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Courtside: a polite basketball box-score scraper
///
/// Courtside fetches the statistics page of every match in a range of
/// identifiers, pacing and retrying requests, and writes the player box
/// scores and a per-match table as CSV.
#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(version = "1.0.0")]
#[command(about = "A polite basketball box-score scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without any request
    #[arg(long)]
    dry_run: bool,

    /// Directory for the run's log file
    #[arg(long, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = if cli.no_log_file || cli.dry_run {
        None
    } else {
        Some(create_log_file(&cli.log_dir)?)
    };

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, log_file);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_scrape(config, config_hash).await
    }
}

/// Creates `logs/scraper_<timestamp>.log`
fn create_log_file(log_dir: &Path) -> anyhow::Result<File> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let name = format!(
        "scraper_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = log_dir.join(name);
    File::create(&path).with_context(|| format!("cannot create log file {}", path.display()))
}

/// Sets up the logging/tracing subscriber
///
/// The console honours the verbosity flags; the log file, when present,
/// always records debug output for the crate.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let console_filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("courtside=info,warn"),
            1 => EnvFilter::new("courtside=debug,info"),
            2 => EnvFilter::new("courtside=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(console_filter);

    let file = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(EnvFilter::new("courtside=debug,info"))
    });

    tracing_subscriber::registry().with(console).with(file).init();
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &ScrapeConfig) -> anyhow::Result<()> {
    println!("=== Courtside Dry Run ===\n");

    println!("Range:");
    println!("  Matches: {}..={}", config.start_id, config.end_id);
    println!("  Total: {}", config.match_count());
    println!(
        "  First URL: {}",
        resolve_match_url(&config.base_url, config.start_id)?
    );
    println!(
        "  Last URL: {}",
        resolve_match_url(&config.base_url, config.end_id)?
    );

    println!("\nRequests:");
    println!("  User agent: {}", config.user_agent);
    println!("  Workers: {}", config.concurrency);
    println!("  Rate limit: {:?} between requests", config.rate_limit());
    println!(
        "  Retries: {} (every {:?})",
        config.max_retries,
        config.retry_delay()
    );
    println!("  Timeout: {:?}", config.request_timeout());

    println!("\nOutput:");
    println!("  Player stats: {}", config.output_file);
    println!("  Games: {}", config.output_file_game);
    if let Some(summary) = &config.summary_file {
        println!("  Summary: {}", summary);
    }

    let worst_case_requests = config.match_count() * u64::from(config.max_retries.saturating_add(1));
    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would issue between {} and {} requests",
        config.match_count(),
        worst_case_requests
    );

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: ScrapeConfig, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Starting scrape of {} matches ({}..={})",
        config.match_count(),
        config.start_id,
        config.end_id
    );

    let coordinator = Coordinator::new(config)?.with_config_hash(config_hash);

    match coordinator.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
