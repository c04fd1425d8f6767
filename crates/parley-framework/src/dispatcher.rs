//! Event dispatcher for the Parley engine.
//!
//! The [`Dispatcher`] owns the configuration, the logger and the lifecycle
//! gate, and exposes the three host hooks: [`on_open`](Dispatcher::on_open),
//! [`on_close`](Dispatcher::on_close) and
//! [`on_message`](Dispatcher::on_message).
//!
//! For each message:
//!
//! 1. The [`LifecycleGate`] decides whether the event is admitted
//! 2. `(direction, text, metadata)` is extracted from the payload
//! 3. The direct handler, or the first passing rule's callback, is invoked
//!
//! ```rust,ignore
//! use parley_framework::{Dispatcher, EngineConfig, on_contains};
//!
//! let dispatcher = Dispatcher::new(
//!     EngineConfig::new()
//!         .process_when_closed(true)
//!         .handler(vec![on_contains("bar").on_match(reply)]),
//! )?;
//!
//! dispatcher.on_message(&RawPayload::bot("Hello bar"))?;
//! ```
//!
//! Dispatch runs to completion inside the calling thread. Hosts that deliver
//! events concurrently must serialize them ahead of the dispatcher.

use serde_json::json;
use tracing::{Level, span};

use parley_core::{ConfigResult, ExtractedContext, LogLevel, Logger, RawPayload};

use crate::config::{EngineConfig, EngineSettings};
use crate::gate::{DropReason, GatePolicy, LifecycleGate};
use crate::handler::{CallbackError, Handler, MessageEvent};
use crate::matcher::select;
use crate::validation::validate_config;

/// What happened to one message. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gate refused the event.
    Dropped(DropReason),
    /// The direct handler was invoked.
    Handled,
    /// The rule at `index` was selected and its callback invoked.
    Matched { index: usize },
    /// The rule at `index` was selected but has no callback.
    MatchedWithoutCallback { index: usize },
    /// No rule passed.
    NoMatch,
}

impl Outcome {
    /// Returns `true` when a callback ran.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Handled | Self::Matched { .. })
    }
}

/// The central event dispatcher.
///
/// `Dispatcher` is `Send + Sync`; the open flag is the only state the hooks
/// mutate.
pub struct Dispatcher {
    settings: EngineSettings,
    logger: Logger,
    gate: LifecycleGate,
    handler: Handler,
}

impl Dispatcher {
    /// Validates `config` and builds a dispatcher.
    ///
    /// Fails only when no handler was supplied. Rule problems are logged as
    /// warnings.
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        let logger = Logger::new(config.effective_log_sink());
        let handler = validate_config(&config, &logger)?.clone();
        let settings = config.settings;
        let gate = LifecycleGate::new(GatePolicy::from(&settings));

        logger.debug(
            "Dispatcher initialized",
            json!({
                "handler": handler.kind(),
                "rules": handler.as_rules().map(<[_]>::len),
                "process_bot_events": settings.process_bot_events,
                "process_user_events": settings.process_user_events,
                "process_when_closed": settings.process_when_closed,
            }),
        );

        Ok(Self {
            settings,
            logger,
            gate,
            handler,
        })
    }

    /// Host hook: the widget opened.
    pub fn on_open(&self) {
        self.gate.open();
    }

    /// Host hook: the widget closed.
    pub fn on_close(&self) {
        self.gate.close();
    }

    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Host hook: a message arrived.
    ///
    /// Engine-side anomalies never fail this call. An error returned by a
    /// callback is passed back unchanged.
    pub fn on_message(&self, payload: &RawPayload) -> Result<Outcome, CallbackError> {
        let span = span!(Level::DEBUG, "dispatch", direction = %payload.direction);
        let _enter = span.enter();

        if let Err(reason) = self.gate.admit(&payload.direction) {
            self.logger.emit_with(LogLevel::Debug, reason.message(), || {
                serde_json::to_value(payload).unwrap_or_default()
            });
            return Ok(Outcome::Dropped(reason));
        }

        let ctx = ExtractedContext::from_payload(payload);
        let event = MessageEvent {
            direction: &ctx.direction,
            text: &ctx.text,
            metadata: &ctx.metadata,
            payload,
        };

        match &self.handler {
            Handler::Direct(callback) => {
                callback(&event)?;
                Ok(Outcome::Handled)
            }
            Handler::RuleBased(rules) => match select(rules, &ctx, &self.logger) {
                Some((index, rule)) => match rule.callback() {
                    Some(callback) => {
                        self.logger.emit_with(LogLevel::Info, "Matched rule", || {
                            json!({ "index": index, "rule": rule.describe() })
                        });
                        callback(&event)?;
                        Ok(Outcome::Matched { index })
                    }
                    None => {
                        self.logger.emit_with(
                            LogLevel::Warn,
                            "Matched rule has no on_match callback",
                            || json!({ "index": index, "rule": rule.describe() }),
                        );
                        Ok(Outcome::MatchedWithoutCallback { index })
                    }
                },
                None => {
                    self.logger.emit_with(LogLevel::Info, "Failed to find a match", || {
                        json!({
                            "direction": ctx.direction.as_str(),
                            "text": ctx.text,
                            "metadata": ctx.metadata,
                            "payload": payload,
                        })
                    });
                    Ok(Outcome::NoMatch)
                }
            },
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler", &self.handler)
            .field("embed_open", &self.gate.is_open())
            .field("policy", &self.gate.policy())
            .finish()
    }
}
