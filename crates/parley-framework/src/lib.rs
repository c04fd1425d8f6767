//! # Parley Framework
//!
//! The event engine built on top of `parley-core`.
//!
//! This layer provides:
//! - [`Rule`]s with text, metadata and direction tests
//! - The first-match engine in [`matcher`]
//! - [`Handler`]: a direct callback or an ordered rule list
//! - [`EngineConfig`] and its construction-time validation
//! - The [`LifecycleGate`] and the [`Dispatcher`] that exposes the host hooks
//! - Rules declared as data and bound to an [`ActionRegistry`]

pub mod config;
pub mod declarative;
pub mod dispatcher;
pub mod gate;
pub mod handler;
pub mod matcher;
pub mod rule;
pub mod validation;

pub use config::{ENGINE_KEY_ALIASES, EngineConfig, EngineSettings};
pub use declarative::{
    ActionRegistry, DeclaredRule, handler_from_value, meta_test_from_value, rules_from_declared,
    rules_from_value, text_test_from_value,
};
pub use dispatcher::{Dispatcher, Outcome};
pub use gate::{DropReason, GatePolicy, LifecycleGate};
pub use handler::{CallbackError, CallbackResult, Handler, MatchCallback, MessageEvent};
pub use matcher::select;
pub use rule::{
    MetaPredicate, MetaTest, Rule, TextPredicate, TextTest, catch_all, compile_pattern, on_bot,
    on_contains, on_user,
};
pub use validation::{validate_config, validate_rules};
