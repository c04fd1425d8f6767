//! Configuration for the Parley runtime.
//!
//! Layered loading with figment, plus validation of the loaded values.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{LogFormat, LogOutput, LoggingConfig, RuntimeConfig, SpanEventConfig};
pub use validation::validate_config;
