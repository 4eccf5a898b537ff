use super::{types::Config, ConfigError, MAX_DETAILS_BATCH};

/// Validate configuration
/// Currently validates:
/// - Details batch size is within the endpoint limit
/// - Endpoint URL and user agent are set
/// - Timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.details.batch_size == 0 || config.details.batch_size > MAX_DETAILS_BATCH {
        return Err(ConfigError::ValidationError(format!(
            "details.batch_size must be between 1 and {}",
            MAX_DETAILS_BATCH
        )));
    }

    if config.details.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "details.url cannot be empty".to_string(),
        ));
    }

    if config.crawler.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "crawler.user_agent cannot be empty".to_string(),
        ));
    }

    if config.crawler.timeout_secs == 0 || config.details.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
