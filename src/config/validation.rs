use crate::config::types::{AdmissionConfig, Config, CrawlerConfig, FetchConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on simultaneous fetches per phase
const MAX_CONCURRENCY: u32 = 128;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_admission_config(&config.admission)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates traversal configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.text_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "text_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.binary_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "binary_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates link admissibility rules
fn validate_admission_config(config: &AdmissionConfig) -> Result<(), ConfigError> {
    if config.domain_marker.is_empty() {
        return Err(ConfigError::Validation(
            "domain_marker cannot be empty".to_string(),
        ));
    }

    if config.pdf_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "pdf_suffix cannot be empty".to_string(),
        ));
    }

    // An empty entry matches every href
    if config.excluded_substrings.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation(
            "excluded_substrings cannot contain an empty entry".to_string(),
        ));
    }

    for ext in &config.excluded_extensions {
        if ext.is_empty() {
            return Err(ConfigError::Validation(
                "excluded_extensions cannot contain an empty entry".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.table_path.is_empty() {
        return Err(ConfigError::Validation(
            "table_path cannot be empty".to_string(),
        ));
    }

    if config.download_folder.is_empty() {
        return Err(ConfigError::Validation(
            "download_folder cannot be empty".to_string(),
        ));
    }

    Ok(())
}
