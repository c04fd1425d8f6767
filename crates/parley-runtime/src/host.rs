//! The boundary with the chat widget.
//!
//! [`InteractiveBot::create`] builds a [`Dispatcher`] from an engine
//! configuration and hands a [`BoundHostSettings`] to a [`WidgetLoader`].
//! The bound settings carry the caller's host settings plus three composed
//! hooks. Each composed hook runs the engine's hook first and then the
//! caller's hook of the same name, so caller hooks are never replaced.
//!
//! How the widget is actually injected and booted is up to the loader.
//!
//! ```rust,ignore
//! use parley_runtime::host::{HostHooks, InteractiveBot};
//!
//! let bot = InteractiveBot::create(
//!     engine_config,
//!     HostHooks::new().on_open(|| tracing::info!("widget opened")),
//!     &my_loader,
//! )?;
//!
//! // Later, from the host's event callbacks:
//! bot.host().on_open();
//! bot.host().on_message(&payload)?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use parley_core::RawPayload;
use parley_framework::{CallbackError, Dispatcher, EngineConfig, Outcome};

use crate::error::{RuntimeError, RuntimeResult};

/// Widget URL used when the host settings do not name one.
pub const DEFAULT_WIDGET_URL: &str = "https://rundexter.com/webwidget";

/// Viewports narrower than this are treated as fullscreen.
pub const FULLSCREEN_BREAKPOINT: u32 = 600;

/// Keys the bot id may be given under.
const BOT_ID_KEYS: [&str; 2] = ["botId", "bot_id"];

/// The caller's host settings, kept exactly as given.
///
/// The engine reads `botId` (or `bot_id`) and `url` from the map but never
/// re-keys it, so the widget receives the same map the caller wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostSettings {
    raw: Map<String, Value>,
}

impl HostSettings {
    /// Wraps the engine's opaque map.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self { raw: map.clone() }
    }

    /// The bot id as given, of any type.
    pub fn bot_id(&self) -> Option<&Value> {
        BOT_ID_KEYS.iter().find_map(|key| self.raw.get(*key))
    }

    /// Returns the bot id, failing when it is absent or falsy
    /// (`null`, `false`, `""` or `0`).
    pub fn require_bot_id(&self) -> RuntimeResult<&Value> {
        match self.bot_id() {
            Some(id) if is_truthy(id) => Ok(id),
            _ => Err(RuntimeError::missing_field("host_settings.bot_id")),
        }
    }

    /// The raw `url` entry, if any.
    pub fn url(&self) -> Option<&Value> {
        self.raw.get("url")
    }

    /// The widget URL, or [`DEFAULT_WIDGET_URL`] when no string is given.
    pub fn widget_url(&self) -> &str {
        self.url()
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_WIDGET_URL)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Settings as the widget receives them.
    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn bot_id_label(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A lifecycle hook supplied by the host.
pub type HostHook = Arc<dyn Fn() + Send + Sync>;

/// A message hook supplied by the host.
pub type HostMessageHook = Arc<dyn Fn(&RawPayload) + Send + Sync>;

/// Host-side hooks to run after the engine's own.
#[derive(Clone, Default)]
pub struct HostHooks {
    on_open: Option<HostHook>,
    on_close: Option<HostHook>,
    on_message: Option<HostMessageHook>,
}

impl HostHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&RawPayload) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for HostHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

/// Host settings with the engine's hooks composed in.
#[derive(Clone)]
pub struct BoundHostSettings {
    settings: HostSettings,
    dispatcher: Arc<Dispatcher>,
    hooks: HostHooks,
}

impl BoundHostSettings {
    pub fn new(settings: HostSettings, dispatcher: Arc<Dispatcher>, hooks: HostHooks) -> Self {
        Self {
            settings,
            dispatcher,
            hooks,
        }
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Settings as the widget receives them.
    pub fn to_value(&self) -> Value {
        self.settings.to_value()
    }

    /// Widget opened: engine hook, then the host's.
    pub fn on_open(&self) {
        self.dispatcher.on_open();
        if let Some(hook) = &self.hooks.on_open {
            hook();
        }
    }

    /// Widget closed: engine hook, then the host's.
    pub fn on_close(&self) {
        self.dispatcher.on_close();
        if let Some(hook) = &self.hooks.on_close {
            hook();
        }
    }

    /// Message arrived: engine hook, then the host's.
    ///
    /// A callback error stops here and the host hook does not run.
    pub fn on_message(&self, payload: &RawPayload) -> Result<Outcome, CallbackError> {
        let outcome = self.dispatcher.on_message(payload)?;
        if let Some(hook) = &self.hooks.on_message {
            hook(payload);
        }
        Ok(outcome)
    }
}

impl fmt::Debug for BoundHostSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHostSettings")
            .field("settings", &self.settings)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Injects and boots the widget.
pub trait WidgetLoader {
    /// Loads the widget from `url` with the bound settings.
    fn load(&self, url: &str, settings: &BoundHostSettings) -> Result<(), CallbackError>;
}

impl<F> WidgetLoader for F
where
    F: Fn(&str, &BoundHostSettings) -> Result<(), CallbackError>,
{
    fn load(&self, url: &str, settings: &BoundHostSettings) -> Result<(), CallbackError> {
        self(url, settings)
    }
}

/// A running engine attached to a widget.
#[derive(Debug, Clone)]
pub struct InteractiveBot {
    url: String,
    host: BoundHostSettings,
}

impl InteractiveBot {
    /// Builds the engine and boots the widget through `loader`.
    ///
    /// Fails when `host_settings.bot_id` is missing or empty, when the engine
    /// configuration is invalid, or when the loader fails.
    pub fn create(
        config: EngineConfig,
        hooks: HostHooks,
        loader: &dyn WidgetLoader,
    ) -> RuntimeResult<Self> {
        let settings = HostSettings::from_map(&config.settings.host_settings);
        let bot_id = bot_id_label(settings.require_bot_id()?);

        let dispatcher = Arc::new(Dispatcher::new(config)?);
        let url = settings.widget_url().to_string();
        let host = BoundHostSettings::new(settings, dispatcher, hooks);

        debug!(bot_id = %bot_id, url = %url, "Loading widget");
        loader.load(&url, &host).map_err(RuntimeError::Loader)?;
        info!(bot_id = %bot_id, "Interactive bot ready");

        Ok(Self { url, host })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &BoundHostSettings {
        &self.host
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.host.dispatcher()
    }
}

/// Widget viewport size as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostViewport {
    pub width: u32,
}

impl HostViewport {
    pub fn new(width: u32) -> Self {
        Self { width }
    }

    /// Narrow viewports show the widget fullscreen.
    pub fn is_fullscreen(&self) -> bool {
        self.width < FULLSCREEN_BREAKPOINT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use parley_core::ConfigError;
    use parley_framework::{Handler, catch_all};
    use serde_json::json;

    fn host_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn noop_loader(_: &str, _: &BoundHostSettings) -> Result<(), CallbackError> {
        Ok(())
    }

    #[test]
    fn test_requires_bot_id() {
        for settings in [json!({}), json!({ "botId": "" })] {
            let config = EngineConfig::new()
                .handler(Handler::direct(|_| Ok(())))
                .host_settings(host_map(settings));
            let err = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap_err();
            assert!(
                matches!(err, RuntimeError::MissingField { ref field } if field == "host_settings.bot_id")
            );
        }
    }

    #[test]
    fn test_engine_errors_propagate() {
        let config = EngineConfig::new().host_settings(host_map(json!({ "botId": "b" })));
        let err = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap_err();
        assert!(matches!(err, RuntimeError::Engine(ConfigError::MissingHandler)));
    }

    #[test]
    fn test_loader_receives_url_and_settings() {
        let seen = Arc::new(Mutex::new(None));
        let tap = Arc::clone(&seen);
        let loader = move |url: &str, host: &BoundHostSettings| -> Result<(), CallbackError> {
            *tap.lock() = Some((url.to_string(), host.to_value()));
            Ok(())
        };
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(json!({ "botId": "b", "theme": "dark" })));

        let bot = InteractiveBot::create(config, HostHooks::new(), &loader).unwrap();

        assert_eq!(bot.url(), DEFAULT_WIDGET_URL);
        let (url, settings) = seen.lock().clone().unwrap();
        assert_eq!(url, DEFAULT_WIDGET_URL);
        assert_eq!(settings, json!({ "botId": "b", "theme": "dark" }));
    }

    #[test]
    fn test_settings_pass_through_unchanged() {
        let given = json!({ "botId": "demo", "url": "https://example.test/w", "nested": { "a": [1] } });
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(given.clone()));
        let bot = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap();
        assert_eq!(bot.host().to_value(), given);
        assert_eq!(bot.host().settings().as_map(), &host_map(given));
    }

    #[test]
    fn test_numeric_bot_id() {
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(json!({ "bot_id": 12345 })));
        let bot = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap();
        assert_eq!(bot.host().settings().bot_id(), Some(&json!(12345)));
        assert_eq!(bot.host().to_value(), json!({ "bot_id": 12345 }));
    }

    #[test]
    fn test_falsy_bot_ids_are_rejected() {
        for id in [json!(null), json!(false), json!(""), json!(0), json!(0.0)] {
            let settings = HostSettings::from_map(&host_map(json!({ "botId": id })));
            assert!(matches!(
                settings.require_bot_id(),
                Err(RuntimeError::MissingField { .. })
            ));
        }
        for id in [json!(true), json!("x"), json!(7), json!([])] {
            let settings = HostSettings::from_map(&host_map(json!({ "botId": id })));
            assert!(settings.require_bot_id().is_ok());
        }
    }

    #[test]
    fn test_custom_url() {
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(json!({ "bot_id": "b", "url": "https://example.test/w" })));
        let bot = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap();
        assert_eq!(bot.url(), "https://example.test/w");
    }

    #[test]
    fn test_loader_failure() {
        let loader = |_: &str, _: &BoundHostSettings| -> Result<(), CallbackError> {
            Err("no network".into())
        };
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(json!({ "botId": "b" })));
        let err = InteractiveBot::create(config, HostHooks::new(), &loader).unwrap_err();
        assert!(matches!(err, RuntimeError::Loader(_)));
    }

    #[test]
    fn test_hooks_compose_engine_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2, o3, o4) = (
            Arc::clone(&order),
            Arc::clone(&order),
            Arc::clone(&order),
            Arc::clone(&order),
        );

        let config = EngineConfig::new()
            .handler(vec![catch_all().on_match(move |_| {
                o1.lock().push("engine:message");
                Ok(())
            })])
            .host_settings(host_map(json!({ "botId": "b" })));
        let hooks = HostHooks::new()
            .on_open(move || o2.lock().push("host:open"))
            .on_close(move || o3.lock().push("host:close"))
            .on_message(move |_| o4.lock().push("host:message"));

        let bot = InteractiveBot::create(config, hooks, &noop_loader).unwrap();
        let host = bot.host();

        host.on_open();
        assert!(bot.dispatcher().is_open());
        let outcome = host.on_message(&RawPayload::bot("hi")).unwrap();
        assert_eq!(outcome, Outcome::Matched { index: 0 });
        host.on_close();
        assert!(!bot.dispatcher().is_open());

        assert_eq!(
            *order.lock(),
            ["host:open", "engine:message", "host:message", "host:close"]
        );
    }

    #[test]
    fn test_hooks_without_host_side() {
        let config = EngineConfig::new()
            .handler(Handler::direct(|_| Ok(())))
            .host_settings(host_map(json!({ "botId": "b" })));
        let bot = InteractiveBot::create(config, HostHooks::new(), &noop_loader).unwrap();

        bot.host().on_open();
        assert_eq!(
            bot.host().on_message(&RawPayload::user("x")).unwrap(),
            Outcome::Handled
        );
    }

    #[test]
    fn test_callback_error_skips_host_hook() {
        let called = Arc::new(Mutex::new(false));
        let tap = Arc::clone(&called);
        let config = EngineConfig::new()
            .process_when_closed(true)
            .handler(Handler::direct(|_| Err("boom".into())))
            .host_settings(host_map(json!({ "botId": "b" })));
        let hooks = HostHooks::new().on_message(move |_| *tap.lock() = true);
        let bot = InteractiveBot::create(config, hooks, &noop_loader).unwrap();

        assert!(bot.host().on_message(&RawPayload::bot("x")).is_err());
        assert!(!*called.lock());
    }

    #[test]
    fn test_viewport() {
        assert!(HostViewport::new(599).is_fullscreen());
        assert!(!HostViewport::new(600).is_fullscreen());
        assert!(!HostViewport::new(1280).is_fullscreen());
    }
}
