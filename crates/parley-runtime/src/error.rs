//! Runtime error types.

use std::path::PathBuf;

use parley_core::ConfigError;
use parley_framework::CallbackError;
use thiserror::Error;

/// Errors that can occur while loading configuration or booting a widget.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The layered configuration could not be read or extracted.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    /// Missing required field.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// The engine rejected its configuration.
    #[error(transparent)]
    Engine(#[from] ConfigError),

    /// The widget loader failed.
    #[error("Widget loader failed: {0}")]
    Loader(#[source] CallbackError),
}

impl RuntimeError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
