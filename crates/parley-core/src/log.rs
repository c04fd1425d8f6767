//! Engine diagnostics.
//!
//! The engine reports what it does (skipped rules, dropped events, missing
//! matches) through a [`Logger`]. Where those reports go is decided once, at
//! construction, by a [`LogSink`]:
//!
//! - [`LogSink::Disabled`]: nowhere.
//! - [`LogSink::Default`]: the `tracing` macro for the event's level, under
//!   the `parley::engine` target.
//! - [`LogSink::Custom`]: a caller function, called as `sink(level, message, metadata)`.
//!
//! No level filtering happens here. Every emitted event reaches the sink;
//! filtering the default sink is the subscriber's job.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target used by the default sink.
pub const ENGINE_LOG_TARGET: &str = "parley::engine";

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Matcher-skip tracing and dropped events.
    Debug,
    /// Match engine outcomes.
    Info,
    /// Malformed rules and unknown test kinds.
    Warn,
    /// Reserved for embedding hosts.
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-supplied log function.
pub type LogFn = Arc<dyn Fn(LogLevel, &str, &Value) + Send + Sync>;

/// Where engine diagnostics are sent.
#[derive(Clone, Default)]
pub enum LogSink {
    /// Diagnostics are discarded.
    #[default]
    Disabled,
    /// Diagnostics go to `tracing`.
    Default,
    /// Diagnostics go to a caller function.
    Custom(LogFn),
}

impl LogSink {
    /// Wraps a function as a custom sink.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(LogLevel, &str, &Value) + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for LogSink {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Default } else { Self::Disabled }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Default => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Routes leveled diagnostics to a [`LogSink`].
#[derive(Debug, Clone, Default)]
pub struct Logger {
    sink: LogSink,
}

impl Logger {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    /// Returns the configured sink.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_enabled()
    }

    /// Emits one diagnostic whose metadata is built only if a sink will see it.
    pub fn emit_with<F>(&self, level: LogLevel, message: &str, metadata: F)
    where
        F: FnOnce() -> Value,
    {
        if self.is_enabled() {
            self.emit(level, message, metadata());
        }
    }

    /// Emits one diagnostic.
    pub fn emit(&self, level: LogLevel, message: &str, metadata: Value) {
        match &self.sink {
            LogSink::Disabled => {}
            LogSink::Default => emit_default(level, message, &metadata),
            LogSink::Custom(f) => f(level, message, &metadata),
        }
    }

    pub fn debug(&self, message: &str, metadata: Value) {
        self.emit(LogLevel::Debug, message, metadata);
    }

    pub fn info(&self, message: &str, metadata: Value) {
        self.emit(LogLevel::Info, message, metadata);
    }

    pub fn warn(&self, message: &str, metadata: Value) {
        self.emit(LogLevel::Warn, message, metadata);
    }

    pub fn error(&self, message: &str, metadata: Value) {
        self.emit(LogLevel::Error, message, metadata);
    }
}

fn emit_default(level: LogLevel, message: &str, metadata: &Value) {
    match level {
        LogLevel::Debug => {
            tracing::debug!(target: ENGINE_LOG_TARGET, metadata = %metadata, "{message}");
        }
        LogLevel::Info => {
            tracing::info!(target: ENGINE_LOG_TARGET, metadata = %metadata, "{message}");
        }
        LogLevel::Warn => {
            tracing::warn!(target: ENGINE_LOG_TARGET, metadata = %metadata, "{message}");
        }
        LogLevel::Error => {
            tracing::error!(target: ENGINE_LOG_TARGET, metadata = %metadata, "{message}");
        }
    }
}
