//! Callbacks and the handler union.
//!
//! The engine hands every admitted event to exactly one of two places:
//!
//! - a [`Handler::Direct`] callback, which sees every event, or
//! - the first matching rule of a [`Handler::RuleBased`] list.
//!
//! Either way the callback receives a [`MessageEvent`], which borrows the
//! extracted triple and the raw payload for the duration of the call.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use parley_core::{Direction, RawPayload};

use crate::rule::Rule;

/// Error returned by a callback. The engine never inspects or swallows it.
pub type CallbackError = Box<dyn Error + Send + Sync>;

/// Result type for callbacks.
pub type CallbackResult = Result<(), CallbackError>;

/// A type-erased event callback, shared by direct handlers and rules.
pub type MatchCallback = Arc<dyn Fn(&MessageEvent<'_>) -> CallbackResult + Send + Sync>;

/// The view of one event passed to callbacks.
#[derive(Debug, Clone, Copy)]
pub struct MessageEvent<'a> {
    /// Direction marker, unchanged from the payload.
    pub direction: &'a Direction,
    /// Message text, `""` when the payload had none.
    pub text: &'a str,
    /// Inner mappings of the payload's metadata fragments.
    pub metadata: &'a [Value],
    /// The payload exactly as the host delivered it.
    pub payload: &'a RawPayload,
}

/// How admitted events are handled.
#[derive(Clone)]
pub enum Handler {
    /// One callback receives every admitted event.
    Direct(MatchCallback),
    /// The first passing rule's callback receives the event.
    RuleBased(Arc<[Rule]>),
}

impl Handler {
    /// Wraps a closure as a direct handler.
    pub fn direct<F>(f: F) -> Self
    where
        F: Fn(&MessageEvent<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        Self::Direct(Arc::new(f))
    }

    /// Wraps an ordered rule list.
    pub fn rules(rules: impl Into<Arc<[Rule]>>) -> Self {
        Self::RuleBased(rules.into())
    }

    /// Returns the rule list, if this is a rule-based handler.
    pub fn as_rules(&self) -> Option<&[Rule]> {
        match self {
            Self::Direct(_) => None,
            Self::RuleBased(rules) => Some(rules),
        }
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::RuleBased(_) => "rules",
        }
    }
}

impl From<Vec<Rule>> for Handler {
    fn from(rules: Vec<Rule>) -> Self {
        Self::rules(rules)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Direct(..)"),
            Self::RuleBased(rules) => f.debug_tuple("RuleBased").field(&rules.len()).finish(),
        }
    }
}
