//! Engine configuration.
//!
//! Configuration is split in two:
//!
//! - [`EngineSettings`]: plain data (policy flags, the boolean log switch,
//!   opaque host settings). Serializable, so it can come from a file, the
//!   environment or a JSON value handed over by the host.
//! - [`EngineConfig`]: the settings plus what cannot be data, namely the
//!   [`Handler`] and an optional custom [`LogSink`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parley_core::{ConfigError, ConfigResult, LogSink, value_kind};

use crate::declarative::{ActionRegistry, handler_from_value};
use crate::handler::Handler;

/// Alternative spellings accepted for [`EngineSettings`] keys, paired with
/// the canonical key. Mirrors the serde aliases below.
pub const ENGINE_KEY_ALIASES: &[(&str, &str)] = &[
    ("processBotEvents", "process_bot_events"),
    ("handleBotEvents", "process_bot_events"),
    ("processUserEvents", "process_user_events"),
    ("handleUserEvents", "process_user_events"),
    ("processWhenClosed", "process_when_closed"),
    ("handleWhenClosed", "process_when_closed"),
    ("logger", "log"),
    ("logSink", "log"),
    ("hostSettings", "host_settings"),
];

/// Serializable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Handle bot-authored events.
    #[serde(alias = "processBotEvents", alias = "handleBotEvents")]
    pub process_bot_events: bool,

    /// Handle user-authored events.
    #[serde(alias = "processUserEvents", alias = "handleUserEvents")]
    pub process_user_events: bool,

    /// Handle events while the widget is closed.
    #[serde(alias = "processWhenClosed", alias = "handleWhenClosed")]
    pub process_when_closed: bool,

    /// Send engine diagnostics to `tracing` when no custom sink is supplied.
    #[serde(alias = "logger", alias = "logSink")]
    pub log: bool,

    /// Opaque settings passed through to the widget.
    #[serde(alias = "hostSettings")]
    pub host_settings: Map<String, Value>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            process_bot_events: true,
            process_user_events: true,
            process_when_closed: false,
            log: false,
            host_settings: Map::new(),
        }
    }
}

impl EngineSettings {
    /// Reads settings from a dynamically typed value.
    ///
    /// Anything other than a JSON object is rejected. Unknown keys (such as
    /// `handler`) are ignored.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        if !value.is_object() {
            return Err(ConfigError::NotAnObject {
                found: value_kind(value),
            });
        }
        serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidSettings {
            reason: e.to_string(),
        })
    }
}

/// Everything needed to build a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub settings: EngineSettings,
    /// Overrides `settings.log` when set.
    pub log_sink: Option<LogSink>,
    pub handler: Option<Handler>,
}

impl EngineConfig {
    /// Creates a configuration with default settings and no handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from existing settings.
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Reads a full configuration from a dynamically typed value.
    ///
    /// The value must be an object. Its `handler` field must be either a list
    /// of declared rules or an `{ "action": name }` object naming a direct
    /// handler in `actions`.
    pub fn from_value(value: &Value, actions: &ActionRegistry) -> ConfigResult<Self> {
        let settings = EngineSettings::from_value(value)?;
        let handler = match value.get("handler") {
            None | Some(Value::Null) => return Err(ConfigError::MissingHandler),
            Some(raw) => handler_from_value(raw, actions)?,
        };
        Ok(Self::with_settings(settings).handler(handler))
    }

    pub fn handler(mut self, handler: impl Into<Handler>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn process_bot_events(mut self, enabled: bool) -> Self {
        self.settings.process_bot_events = enabled;
        self
    }

    pub fn process_user_events(mut self, enabled: bool) -> Self {
        self.settings.process_user_events = enabled;
        self
    }

    pub fn process_when_closed(mut self, enabled: bool) -> Self {
        self.settings.process_when_closed = enabled;
        self
    }

    /// Sets the log sink. `true`/`false` select the default or no sink.
    pub fn log_sink(mut self, sink: impl Into<LogSink>) -> Self {
        self.log_sink = Some(sink.into());
        self
    }

    pub fn host_settings(mut self, host_settings: Map<String, Value>) -> Self {
        self.settings.host_settings = host_settings;
        self
    }

    /// Returns the sink the engine will log to.
    pub fn effective_log_sink(&self) -> LogSink {
        self.log_sink
            .clone()
            .unwrap_or_else(|| LogSink::from(self.settings.log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_aliases_match_serde_aliases() {
        let defaults = serde_json::to_value(EngineSettings::default()).unwrap();
        for (alias, canonical) in ENGINE_KEY_ALIASES {
            let value = match &defaults[*canonical] {
                Value::Bool(b) => json!(!b),
                _ => json!({ "botId": "b" }),
            };
            let via_alias = EngineSettings::from_value(&json!({ *alias: value.clone() })).unwrap();
            let direct = EngineSettings::from_value(&json!({ *canonical: value })).unwrap();
            assert_eq!(via_alias, direct, "{alias}");
            assert_ne!(direct, EngineSettings::default(), "{canonical}");
        }
    }

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert!(settings.process_bot_events);
        assert!(settings.process_user_events);
        assert!(!settings.process_when_closed);
        assert!(!settings.log);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        for value in [Value::Null, json!("foo"), json!(1), json!([]), json!(true)] {
            let err = EngineSettings::from_value(&value).unwrap_err();
            assert!(matches!(err, ConfigError::NotAnObject { .. }));
            assert!(err.to_string().contains("missing a config"));
        }
    }

    #[test]
    fn test_from_value_accepts_aliases() {
        let settings = EngineSettings::from_value(&json!({
            "handleWhenClosed": true,
            "processUserEvents": false,
            "logger": true,
            "hostSettings": { "botId": "abc" }
        }))
        .unwrap();

        assert!(settings.process_when_closed);
        assert!(!settings.process_user_events);
        assert!(settings.process_bot_events);
        assert!(settings.log);
        assert_eq!(settings.host_settings["botId"], "abc");
    }

    #[test]
    fn test_from_value_reports_type_errors() {
        let err = EngineSettings::from_value(&json!({ "log": "yes" })).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings { .. }));
    }

    #[test]
    fn test_effective_log_sink() {
        let from_flag = EngineConfig::with_settings(EngineSettings {
            log: true,
            ..Default::default()
        });
        assert!(matches!(from_flag.effective_log_sink(), LogSink::Default));

        let overridden = from_flag.log_sink(false);
        assert!(matches!(overridden.effective_log_sink(), LogSink::Disabled));
    }

    #[test]
    fn test_full_config_requires_handler() {
        let actions = ActionRegistry::new();
        for value in [json!({}), json!({ "handler": null })] {
            let err = EngineConfig::from_value(&value, &actions).unwrap_err();
            assert!(matches!(err, ConfigError::MissingHandler));
            assert!(err.to_string().contains("requires a handler"));
        }
        for value in [json!({ "handler": "foo" }), json!({ "handler": 1 })] {
            let err = EngineConfig::from_value(&value, &actions).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidHandler { .. }));
            assert!(err.to_string().contains("requires a handler"));
        }
    }
}
