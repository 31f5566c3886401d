//! Configuration validation

use super::*;
use crate::error::{AdapterError, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_embedding_config(&config.embedding)?;
    validate_chat_config(&config.chat)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validate embedding configuration
pub fn validate_embedding_config(config: &EmbeddingConfig) -> Result<()> {
    validate_url("Embedding", &config.base_url)?;

    if config.model.trim().is_empty() {
        return Err(AdapterError::Config(
            "Embedding model cannot be empty".to_string()
        ));
    }

    if config.max_token_size == 0 {
        return Err(AdapterError::Config(
            "Embedding max_token_size must be greater than 0".to_string()
        ));
    }

    validate_timeout("Embedding", config.timeout_secs)?;
    validate_retry_config("Embedding", &config.retry)?;

    Ok(())
}

/// Validate chat configuration
pub fn validate_chat_config(config: &ChatConfig) -> Result<()> {
    validate_url("Chat", &config.base_url)?;

    if let Some(model) = &config.model {
        if model.trim().is_empty() {
            return Err(AdapterError::Config(
                "Chat model cannot be empty when set".to_string()
            ));
        }
    }

    validate_timeout("Chat", config.timeout_secs)?;
    validate_retry_config("Chat", &config.retry)?;

    Ok(())
}

/// Validate retry settings
pub fn validate_retry_config(section: &str, config: &RetryConfig) -> Result<()> {
    if config.max_attempts == 0 {
        return Err(AdapterError::Config(
            format!("{} retry max_attempts must be at least 1", section)
        ));
    }

    if config.max_attempts > 10 {
        return Err(AdapterError::Config(
            format!("{} retry max_attempts too large (max: 10)", section)
        ));
    }

    let waits = [config.multiplier_secs, config.min_wait_secs, config.max_wait_secs];
    if waits.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AdapterError::Config(
            format!("{} retry waits must be finite and non-negative", section)
        ));
    }

    if config.min_wait_secs > config.max_wait_secs {
        return Err(AdapterError::Config(
            format!(
                "{} retry min_wait_secs ({}) exceeds max_wait_secs ({})",
                section, config.min_wait_secs, config.max_wait_secs
            )
        ));
    }

    Ok(())
}

/// Validate logging configuration
pub fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    match config.format.as_str() {
        "json" | "compact" | "pretty" => Ok(()),
        other => Err(AdapterError::Config(
            format!("Unknown log format '{}' (expected json, compact or pretty)", other)
        )),
    }
}

fn validate_url(section: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(AdapterError::Config(
            format!("{} base URL cannot be empty", section)
        ));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(AdapterError::Config(
            format!("{} base URL must start with http:// or https://", section)
        ));
    }

    Ok(())
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        return Err(AdapterError::Config(
            format!("{} timeout must be greater than 0", section)
        ));
    }

    if timeout_secs > 3600 {
        return Err(AdapterError::Config(
            format!("{} timeout too large (max: 3600 seconds)", section)
        ));
    }

    Ok(())
}
