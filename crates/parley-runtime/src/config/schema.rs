//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use parley_framework::{
    ActionRegistry, DeclaredRule, EngineConfig, EngineSettings, rules_from_declared,
};

use crate::error::RuntimeResult;

/// Root configuration structure.
///
/// ```toml
/// [engine]
/// process_when_closed = true
/// log = true
///
/// [engine.host_settings]
/// bot_id = "my-bot"
///
/// [logging]
/// level = "debug"
///
/// [[rules]]
/// text = "hello"
/// action = "greet"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Engine policy flags and host settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared rules, bound to actions by name.
    #[serde(default)]
    pub rules: Vec<DeclaredRule>,
}

impl RuntimeConfig {
    /// Builds an engine configuration whose handler is the declared rule list.
    pub fn engine_config(&self, actions: &ActionRegistry) -> RuntimeResult<EngineConfig> {
        let rules = rules_from_declared(&self.rules, actions)?;
        Ok(EngineConfig::with_settings(self.engine.clone()).handler(rules))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Show thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Show file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target levels, e.g. `"parley::engine" = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}
