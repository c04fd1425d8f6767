//! Configuration validation utilities.

use super::schema::{LogOutput, LoggingConfig, RuntimeConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::host::HostSettings;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
///
/// Rules are not checked here; they are checked when bound to actions.
pub fn validate_config(config: &RuntimeConfig) -> RuntimeResult<()> {
    validate_logging_config(&config.logging)?;
    validate_host_settings(&HostSettings::from_map(&config.engine.host_settings))?;
    Ok(())
}

fn validate_log_level(level: &str) -> RuntimeResult<()> {
    if !VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(RuntimeError::validation(format!(
            "Invalid log level: {level}. Valid values are: {VALID_LOG_LEVELS:?}"
        )));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> RuntimeResult<()> {
    validate_log_level(&logging.level)?;

    for (target, level) in &logging.filters {
        if target.is_empty() {
            return Err(RuntimeError::validation("Log filter target must not be empty"));
        }
        validate_log_level(level)?;
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(RuntimeError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_host_settings(host: &HostSettings) -> RuntimeResult<()> {
    match host.url() {
        None => Ok(()),
        Some(serde_json::Value::String(url))
            if url.starts_with("http://") || url.starts_with("https://") =>
        {
            Ok(())
        }
        Some(url) => Err(RuntimeError::validation(format!(
            "Invalid widget url: {url} - must start with http:// or https://"
        ))),
    }
}
