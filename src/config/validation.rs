use crate::config::types::{Config, CrawlerConfig, InputConfig, QueueConfig, UserAgentConfig};
use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Slowest accepted explicit rate: one request every ~17 minutes
pub const MIN_RATE_LIMIT: f64 = 0.001;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    if let Some(base_url) = &config.site.base_url {
        validate_base_url(base_url)?;
    }
    validate_queue_config(&config.queues)?;

    if config.output.top_words < 1 {
        return Err(ConfigError::Validation(
            "top_words must be >= 1".to_string(),
        ));
    }

    if config.extraction.selectors.is_empty() {
        return Err(ConfigError::Validation(
            "at least one content selector is required".to_string(),
        ));
    }

    Ok(())
}

/// Checks that both input files are configured and exist on disk
///
/// Kept separate from [`validate`] so that configuration files can be
/// validated on machines that do not have the inputs.
pub fn validate_input_files(input: &InputConfig) -> Result<(), ConfigError> {
    let urls_file = input
        .urls_file
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("urls_file is required".to_string()))?;
    let wordbank_file = input
        .wordbank_file
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("wordbank_file is required".to_string()))?;

    ensure_exists(urls_file)?;
    ensure_exists(wordbank_file)?;
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ConfigError::MissingFile(path.to_path_buf()))
    }
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be positive, got {}",
            config.workers
        )));
    }

    if !config.rate_limit.is_finite() || config.rate_limit < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate_limit must be non-negative (0 = no limit), got {}",
            config.rate_limit
        )));
    }

    if config.rate_limit > 0.0 && config.rate_limit < MIN_RATE_LIMIT {
        return Err(ConfigError::Validation(format!(
            "rate_limit must be 0 (no limit) or at least {}, got {}",
            MIN_RATE_LIMIT, config.rate_limit
        )));
    }

    if config.burst == Some(0) {
        return Err(ConfigError::Validation(
            "burst must be >= 1 when set".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) cannot exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates the target site base URL
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

/// Validates queue capacities
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    for (name, capacity) in [
        ("urls", config.urls),
        ("fetched", config.fetched),
        ("texts", config.texts),
        ("counts", config.counts),
        ("errors", config.errors),
    ] {
        if capacity < 1 {
            return Err(ConfigError::Validation(format!(
                "queue capacity '{}' must be >= 1",
                name
            )));
        }
    }
    Ok(())
}
