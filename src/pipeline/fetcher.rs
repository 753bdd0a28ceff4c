//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests for match pages
//! - Fixed-delay retry of transient failures
//! - Error classification

use crate::config::ScrapeConfig;
use crate::pipeline::rate_limiter::RateLimiter;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a match page
const MAX_REDIRECTS: usize = 10;

/// A single match to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchJob {
    /// The match identifier
    pub match_id: u32,

    /// Resolved URL of the match page
    pub url: Url,
}

/// Why a fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    #[error("Empty response body")]
    EmptyBody,

    #[error("Request rejected: HTTP {status}")]
    PermanentRequest { status: u16 },

    #[error("Unexpected status: HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Redirect error: {0}")]
    Redirect(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns true if retrying may resolve the failure
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::TransientNetwork(_) | Self::ServerError { .. } | Self::EmptyBody
        )
    }

    /// Short category name used in reports
    pub fn category(&self) -> &'static str {
        if self.is_transient() {
            "transient"
        } else {
            "permanent"
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_redirect() {
            FetchError::Redirect(e.to_string())
        } else if e.is_builder() {
            FetchError::InvalidRequest(e.to_string())
        } else if e.is_connect() {
            FetchError::TransientNetwork(format!("Connection failed: {}", e))
        } else {
            FetchError::TransientNetwork(e.to_string())
        }
    }
}

/// Result of fetching one match page
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was fetched
    Success {
        match_id: u32,
        /// Page body content
        body: String,
        /// Number of attempts used, including the successful one
        attempts: u32,
    },

    /// The page could not be fetched
    Failure {
        match_id: u32,
        /// Cause of the last attempt
        cause: FetchError,
        /// Number of attempts made
        attempts: u32,
    },
}

impl FetchOutcome {
    pub fn match_id(&self) -> u32 {
        match self {
            Self::Success { match_id, .. } | Self::Failure { match_id, .. } => *match_id,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }
}

/// Retry behaviour for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,

    /// Fixed pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Classifies a response status
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | `None` (success) |
/// | 4xx | `PermanentRequest`, not retried |
/// | 5xx | `ServerError`, retried |
/// | anything else | `UnexpectedStatus`, not retried |
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
    let code = status.as_u16();
    if status.is_success() {
        None
    } else if status.is_client_error() {
        Some(FetchError::PermanentRequest { status: code })
    } else if status.is_server_error() {
        Some(FetchError::ServerError { status: code })
    } else {
        Some(FetchError::UnexpectedStatus { status: code })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Total per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches match pages with pacing and retry
///
/// The fetcher never applies its own pacing: every attempt, retries
/// included, takes one slot from the shared [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            policy,
        }
    }

    /// Builds a fetcher and its rate limiter from a validated configuration
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.request_timeout())?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        let policy = RetryPolicy {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
        };
        Ok(Self::new(client, limiter, policy))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches one match page
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx, non-empty body | Success |
    /// | 2xx, empty body | Retry |
    /// | HTTP 5xx | Retry |
    /// | Timeout / network error | Retry |
    /// | HTTP 4xx | Immediate failure |
    /// | Other status, redirect error | Immediate failure |
    ///
    /// Retries wait a fixed `delay` and stop after `1 + max_retries`
    /// attempts, returning the last cause.
    pub async fn fetch(&self, job: MatchJob) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;

            match self.attempt(&job.url).await {
                Ok(body) => {
                    tracing::debug!(
                        "Match {}: fetched {} bytes (attempt {})",
                        job.match_id,
                        body.len(),
                        attempt
                    );
                    return FetchOutcome::Success {
                        match_id: job.match_id,
                        body,
                        attempts: attempt,
                    };
                }
                Err(cause) if cause.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        "Match {}: attempt {}/{} failed ({}), retrying in {:?}",
                        job.match_id,
                        attempt,
                        max_attempts,
                        cause,
                        self.policy.delay
                    );
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
                Err(cause) => {
                    tracing::debug!(
                        "Match {}: giving up after {} attempt(s): {}",
                        job.match_id,
                        attempt,
                        cause
                    );
                    return FetchOutcome::Failure {
                        match_id: job.match_id,
                        cause,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    /// Performs a single GET request
    async fn attempt(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        if let Some(error) = classify_status(response.status()) {
            return Err(error);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body)
    }
}
