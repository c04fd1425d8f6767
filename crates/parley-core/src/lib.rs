//! # Parley Core
//!
//! Building blocks shared by the rest of the workspace:
//!
//! - [`RawPayload`] and [`Direction`]: the inbound event as the widget sends it
//! - [`extract`]: pure extraction of `(direction, text, metadata)`
//! - [`MetaPath`]: total, segmented lookups into extracted metadata
//! - [`Logger`] and [`LogSink`]: leveled engine diagnostics
//! - [`ConfigError`]: fatal construction-time errors

pub mod error;
pub mod extract;
pub mod log;
pub mod path;
pub mod payload;

pub use error::{ConfigError, ConfigResult, value_kind};
pub use extract::ExtractedContext;
pub use log::{ENGINE_LOG_TARGET, LogFn, LogLevel, LogSink, Logger};
pub use path::MetaPath;
pub use payload::{DIRECTION_BOT, DIRECTION_USER, Direction, RawPayload};
