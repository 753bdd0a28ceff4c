use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.acb.com/partido/estadisticas/id/";
pub const DEFAULT_USER_AGENT: &str = "BasketballStatsScraper/1.0";

/// Main configuration structure for a scrape run
///
/// Durations are expressed in seconds in the TOML file and exposed as
/// [`Duration`] through accessor methods.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// First match identifier (inclusive)
    pub start_id: u32,

    /// Last match identifier (inclusive)
    pub end_id: u32,

    /// URL template; `{id}` is substituted, otherwise the id is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Destination of the per-player statistics CSV
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Destination of the per-match CSV
    #[serde(default = "default_output_file_game")]
    pub output_file_game: String,

    /// Optional markdown summary of the run
    #[serde(default)]
    pub summary_file: Option<String>,

    /// Additional attempts after the first one for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts (seconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum spacing between two outbound requests (seconds)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f64,
}

impl ScrapeConfig {
    /// Creates a configuration for the given range with every other field
    /// at its default value
    pub fn for_range(start_id: u32, end_id: u32) -> Self {
        Self {
            start_id,
            end_id,
            base_url: default_base_url(),
            output_file: default_output_file(),
            output_file_game: default_output_file_game(),
            summary_file: None,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            user_agent: default_user_agent(),
            rate_limit: default_rate_limit(),
            concurrency: default_concurrency(),
            request_timeout: default_request_timeout(),
        }
    }

    /// Number of identifiers in the configured range
    pub fn match_count(&self) -> u64 {
        if self.end_id < self.start_id {
            return 0;
        }
        u64::from(self.end_id - self.start_id) + 1
    }

    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay)
    }

    pub fn rate_limit(&self) -> Duration {
        seconds(self.rate_limit)
    }

    pub fn request_timeout(&self) -> Duration {
        seconds(self.request_timeout)
    }
}

/// Converts validated seconds into a Duration, clamping invalid input to zero
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_output_file() -> String {
    "estadisticas_todos_partidos.csv".to_string()
}

fn default_output_file_game() -> String {
    "estadisticas_partidos.csv".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> f64 {
    5.0
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_rate_limit() -> f64 {
    1.0
}

fn default_concurrency() -> u32 {
    4
}

fn default_request_timeout() -> f64 {
    30.0
}
