//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest confirmation-token lifetime accepted (one hour).
const MAX_TOKEN_TTL_SECS: u64 = 3600;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_gateway(config)?;
    validate_classifier(config)?;
    validate_engine(config)?;
    validate_sampling(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_gateway(config: &Config) -> ConfigResult<()> {
    let ttl = config.gateway.token_ttl_secs;
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
        return Err(invalid(
            "gateway.token_ttl_secs",
            format!("token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}, got {ttl}"),
        ));
    }
    Ok(())
}

fn validate_classifier(config: &Config) -> ConfigResult<()> {
    let keywords = &config.classifier.keywords;
    if keywords.is_empty() {
        return Err(invalid(
            "classifier.keywords",
            "at least one destructive keyword is required",
        ));
    }
    if let Some(bad) = keywords
        .iter()
        .find(|k| k.is_empty() || !k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    {
        return Err(invalid(
            "classifier.keywords",
            format!("keyword '{bad}' must be a non-empty identifier"),
        ));
    }
    Ok(())
}

fn validate_engine(config: &Config) -> ConfigResult<()> {
    if config.engine.binary.trim().is_empty() {
        return Err(invalid("engine.binary", "engine binary must not be empty"));
    }
    if config.engine.format.trim().is_empty() {
        return Err(invalid("engine.format", "output format must not be empty"));
    }
    Ok(())
}

fn validate_sampling(config: &Config) -> ConfigResult<()> {
    if config.sampling.max_tokens == 0 {
        return Err(invalid("sampling.max_tokens", "max_tokens must be positive"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
