use crate::config::types::ScrapeConfig;
use crate::url::resolve_match_url;
use crate::ConfigError;
use std::path::Path;
use std::time::Duration;

/// Upper bound on the worker pool size
pub const MAX_CONCURRENCY: u32 = 100;

/// Upper bound on any delay or timeout, one day
pub const MAX_SECONDS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_range(config)?;
    validate_timing(config)?;
    validate_request(config)?;
    validate_outputs(config)?;
    Ok(())
}

/// Validates the identifier range
fn validate_range(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.start_id > config.end_id {
        return Err(ConfigError::Validation(format!(
            "start_id ({}) must not be greater than end_id ({})",
            config.start_id, config.end_id
        )));
    }

    Ok(())
}

/// Validates delays, timeouts and pool size
fn validate_timing(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_seconds("retry_delay", config.retry_delay)?;
    validate_seconds("rate_limit", config.rate_limit)?;
    validate_seconds("request_timeout", config.request_timeout)?;

    if config.request_timeout == 0.0 {
        return Err(ConfigError::Validation(
            "request_timeout must be greater than zero".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, value
        )));
    }

    if value > MAX_SECONDS || Duration::try_from_secs_f64(value).is_err() {
        return Err(ConfigError::Validation(format!(
            "{} must be at most {} seconds, got {}",
            name, MAX_SECONDS, value
        )));
    }

    Ok(())
}

/// Validates the base URL template and user agent
fn validate_request(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.base_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "base_url cannot be empty".to_string(),
        ));
    }

    resolve_match_url(&config.base_url, config.start_id)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.user_agent.chars().any(char::is_control) {
        return Err(ConfigError::Validation(
            "user_agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates output destinations
fn validate_outputs(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_output_path("output_file", &config.output_file)?;
    validate_output_path("output_file_game", &config.output_file_game)?;

    if config.output_file == config.output_file_game {
        return Err(ConfigError::Validation(format!(
            "output_file and output_file_game must differ, both are '{}'",
            config.output_file
        )));
    }

    if let Some(summary) = &config.summary_file {
        validate_output_path("summary_file", summary)?;
    }

    Ok(())
}

fn validate_output_path(name: &str, path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }

    // The dataset is written once at the end; catch a missing directory
    // before any request goes out
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ConfigError::Validation(format!(
                "{} directory '{}' does not exist",
                name,
                parent.display()
            )));
        }
    }

    Ok(())
}
