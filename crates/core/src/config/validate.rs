use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port and upload limit are not 0
/// - Storage and transcoder URLs are http(s) URLs
/// - Timeouts and the watch interval are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }
    if config.server.max_upload_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_mb cannot be 0".to_string(),
        ));
    }

    validate_url("storage.portal_url", &config.storage.portal_url)?;
    validate_url("storage.download_base_url", &config.storage.download_base_url)?;
    validate_url("transcoder.base_url", &config.transcoder.base_url)?;

    if config.storage.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "storage.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.transcoder.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.watch.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "watch.interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "{} must start with http:// or https:// (got '{}')",
            field, value
        )));
    }
    Ok(())
}
