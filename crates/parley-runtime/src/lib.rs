//! Parley Runtime - configuration, logging and widget wiring.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `RuntimeConfig`)
//! - Logging configuration (`LoggingBuilder`, `init_from_config`)
//! - The widget host boundary (`InteractiveBot`, `BoundHostSettings`,
//!   `WidgetLoader`)
//!
//! ```ignore
//! use parley_framework::ActionRegistry;
//! use parley_runtime::{ConfigLoader, HostHooks, InteractiveBot, logging, validate_config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     validate_config(&config)?;
//!     logging::init_from_config(&config.logging);
//!
//!     let actions = ActionRegistry::new().with("greet", |event| {
//!         tracing::info!(text = event.text, "greeting");
//!         Ok(())
//!     });
//!
//!     let bot = InteractiveBot::create(
//!         config.engine_config(&actions)?,
//!         HostHooks::new(),
//!         &my_loader,
//!     )?;
//!     bot.host().on_open();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod logging;

// Re-exports
pub use config::{
    ConfigLoader, LogFormat, LogOutput, LoggingConfig, Profile, RuntimeConfig, load_config,
    load_config_from_file, validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use host::{
    BoundHostSettings, DEFAULT_WIDGET_URL, HostHooks, HostSettings, HostViewport, InteractiveBot,
    WidgetLoader,
};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
