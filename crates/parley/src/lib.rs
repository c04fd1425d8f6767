//! # Parley
//!
//! A rule-driven event engine for embedded chat widgets.
//!
//! ## Overview
//!
//! A host (typically a web chat widget) reports three kinds of events: the
//! widget opened, the widget closed, and a message went by. Parley decides
//! which messages to act on and which of your callbacks to run.
//!
//! ```text
//! ┌────────┐    ┌────────────────┐    ┌──────────────┐    ┌────────────────────┐
//! │  Host  │───▶│ Lifecycle gate │───▶│  Extractor   │───▶│ Direct handler, or │
//! │ hooks  │    │ open? allowed? │    │ dir/text/meta│    │ first passing rule │
//! └────────┘    └────────────────┘    └──────────────┘    └────────────────────┘
//! ```
//!
//! - **Gate**: drops events while the widget is closed, and events from a
//!   direction that is switched off
//! - **Rules**: ordered; the first rule whose direction, text and metadata
//!   tests all pass wins
//! - **Callbacks**: receive the direction, text, metadata list and raw payload
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! let dispatcher = Dispatcher::new(
//!     EngineConfig::new().handler(vec![
//!         on_contains("hello").on_match(|event| {
//!             tracing::info!(text = event.text, "greeted");
//!             Ok(())
//!         }),
//!         Rule::new()
//!             .meta("0.intent", MetaTest::equals("order"))
//!             .on_match(|_| Ok(())),
//!     ]),
//! )?;
//!
//! dispatcher.on_open();
//! dispatcher.on_message(&RawPayload::bot("hello there"))?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Payloads
    pub use parley_core::{Direction, RawPayload};

    // Diagnostics
    pub use parley_core::{LogLevel, LogSink};

    // Engine
    pub use parley_framework::{
        ActionRegistry, CallbackError, CallbackResult, Dispatcher, DropReason, EngineConfig,
        EngineSettings, Handler, MessageEvent, Outcome,
    };

    // Rules
    pub use parley_framework::{MetaTest, Rule, TextTest, catch_all, on_bot, on_contains, on_user};

    // Runtime
    pub use parley_runtime::{
        ConfigLoader, HostHooks, InteractiveBot, RuntimeConfig, WidgetLoader, init_from_config,
    };
}
