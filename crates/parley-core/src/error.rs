//! Configuration error types.

use serde_json::Value;
use thiserror::Error;

/// Fatal configuration errors, raised at construction time only.
///
/// Problems with individual rules are not errors; they are logged as
/// warnings and the rule is kept.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration value is not a structured object.
    #[error("engine is missing a config object (got {found})")]
    NotAnObject {
        /// JSON kind of the rejected value.
        found: &'static str,
    },

    /// No handler was supplied.
    #[error("engine config requires a handler function or a list of rules")]
    MissingHandler,

    /// The handler is neither a function nor a list of rules.
    #[error("engine config requires a handler function or a list of rules (got {found})")]
    InvalidHandler {
        /// JSON kind of the rejected value.
        found: &'static str,
    },

    /// A settings field has the wrong type.
    #[error("invalid engine settings: {reason}")]
    InvalidSettings {
        /// Deserializer message.
        reason: String,
    },

    /// A direct handler names an action nobody registered.
    #[error("handler action '{name}' is not registered")]
    UnknownAction {
        /// The missing action name.
        name: String,
    },

    /// A declared rule could not be read at all.
    #[error("invalid rule at index {index}: {reason}")]
    InvalidRule {
        /// Position of the rule in its list.
        index: usize,
        /// Reason for failure.
        reason: String,
    },

    /// A pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid rule error.
    pub fn invalid_rule(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            index,
            reason: reason.into(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}

/// Returns a short name for the JSON kind of `value`, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
