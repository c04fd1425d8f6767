//! Rules: declarative tests paired with a callback.
//!
//! A [`Rule`] carries up to three tests, evaluated in this order by the
//! match engine:
//!
//! 1. a direction filter,
//! 2. a [`TextTest`] against the message text,
//! 3. a [`MetaTest`] against the metadata value found at a [`MetaPath`].
//!
//! A rule with neither a text test nor a meta test passes every event, which
//! makes it a catch-all. Put catch-alls last.
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_framework::{MetaTest, Rule, TextTest};
//!
//! let rules = vec![
//!     Rule::new()
//!         .name("greeting")
//!         .text(TextTest::contains("hello"))
//!         .on_match(|event| {
//!             tracing::info!(text = event.text, "greeted");
//!             Ok(())
//!         }),
//!     Rule::new()
//!         .meta("0.intent", MetaTest::equals("order"))
//!         .on_match(start_order),
//!     catch_all().on_match(fallback),
//! ];
//! ```

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::{Value, json};

use parley_core::{ConfigError, ConfigResult, Direction, MetaPath};

use crate::handler::{CallbackResult, MatchCallback, MessageEvent};

/// A predicate over message text.
pub type TextPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A predicate over a resolved metadata value (`None` when the path is absent).
pub type MetaPredicate = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Compiles a pattern, optionally case-insensitive.
pub fn compile_pattern(source: &str, ignore_case: bool) -> ConfigResult<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| ConfigError::invalid_pattern(source, e))
}

// ============================================================================
// TextTest
// ============================================================================

/// A test against message text.
#[derive(Clone)]
pub enum TextTest {
    /// Passes when the text contains the substring.
    Contains(String),
    /// Passes when the pattern matches anywhere in the text.
    Pattern(Regex),
    /// Passes when the predicate returns `true`.
    Predicate(TextPredicate),
    /// A declared test of a shape the engine does not know. Never passes.
    Unsupported(Value),
}

impl TextTest {
    pub fn contains(needle: impl Into<String>) -> Self {
        Self::Contains(needle.into())
    }

    /// Compiles `source` into a pattern test.
    pub fn pattern(source: &str) -> ConfigResult<Self> {
        compile_pattern(source, false).map(Self::Pattern)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Contains(_) => "contains",
            Self::Pattern(_) => "pattern",
            Self::Predicate(_) => "predicate",
            Self::Unsupported(_) => "unsupported",
        }
    }

    /// JSON description used in log metadata.
    pub fn describe(&self) -> Value {
        match self {
            Self::Contains(needle) => json!({ "contains": needle }),
            Self::Pattern(re) => json!({ "pattern": re.as_str() }),
            Self::Predicate(_) => json!("predicate"),
            Self::Unsupported(raw) => json!({ "unsupported": raw }),
        }
    }
}

impl From<Regex> for TextTest {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl From<&str> for TextTest {
    fn from(needle: &str) -> Self {
        Self::contains(needle)
    }
}

impl fmt::Debug for TextTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextTest({})", self.describe())
    }
}

// ============================================================================
// MetaTest
// ============================================================================

/// A test against a resolved metadata value.
#[derive(Clone)]
pub enum MetaTest {
    /// Passes when the value is a string the pattern matches. Non-string
    /// values never pass.
    Pattern(Regex),
    /// Passes when the predicate returns `true`.
    Predicate(MetaPredicate),
    /// Passes when the value is present and equal to the literal.
    Equals(Value),
}

impl MetaTest {
    pub fn equals(literal: impl Into<Value>) -> Self {
        Self::Equals(literal.into())
    }

    /// Compiles `source` into a pattern test.
    pub fn pattern(source: &str) -> ConfigResult<Self> {
        compile_pattern(source, false).map(Self::Pattern)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pattern(_) => "pattern",
            Self::Predicate(_) => "predicate",
            Self::Equals(_) => "equals",
        }
    }

    /// JSON description used in log metadata.
    pub fn describe(&self) -> Value {
        match self {
            Self::Pattern(re) => json!({ "pattern": re.as_str() }),
            Self::Predicate(_) => json!("predicate"),
            Self::Equals(literal) => json!({ "equals": literal }),
        }
    }
}

impl From<Regex> for MetaTest {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl fmt::Debug for MetaTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetaTest({})", self.describe())
    }
}

// ============================================================================
// Rule
// ============================================================================

/// One entry of an ordered rule list.
///
/// Rules are plain data. They are checked by
/// [`select`](crate::matcher::select) and never mutated by the engine.
#[derive(Clone, Default)]
pub struct Rule {
    name: Option<String>,
    direction: Option<Direction>,
    text: Option<TextTest>,
    meta_path: Option<MetaPath>,
    meta: Option<MetaTest>,
    on_match: Option<MatchCallback>,
}

impl Rule {
    /// Creates a rule with no tests and no callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a name for this rule (useful for debugging).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the rule to one direction.
    pub fn direction(mut self, direction: impl Into<Direction>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    /// Sets the text test.
    pub fn text(mut self, test: impl Into<TextTest>) -> Self {
        self.text = Some(test.into());
        self
    }

    /// Sets the metadata path without touching the meta test.
    pub fn meta_path(mut self, path: impl Into<MetaPath>) -> Self {
        self.meta_path = Some(path.into());
        self
    }

    /// Sets the meta test without touching the path.
    pub fn meta_test(mut self, test: impl Into<MetaTest>) -> Self {
        self.meta = Some(test.into());
        self
    }

    /// Sets both the metadata path and the meta test.
    pub fn meta(self, path: impl Into<MetaPath>, test: impl Into<MetaTest>) -> Self {
        self.meta_path(path).meta_test(test)
    }

    /// Sets the callback invoked when this rule is selected.
    pub fn on_match<F>(mut self, f: F) -> Self
    where
        F: Fn(&MessageEvent<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.on_match = Some(Arc::new(f));
        self
    }

    /// Sets a pre-built callback.
    pub fn on_match_boxed(mut self, callback: MatchCallback) -> Self {
        self.on_match = Some(callback);
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn direction_filter(&self) -> Option<&Direction> {
        self.direction.as_ref()
    }

    pub fn text_test(&self) -> Option<&TextTest> {
        self.text.as_ref()
    }

    pub fn get_meta_path(&self) -> Option<&MetaPath> {
        self.meta_path.as_ref()
    }

    pub fn get_meta_test(&self) -> Option<&MetaTest> {
        self.meta.as_ref()
    }

    pub fn callback(&self) -> Option<&MatchCallback> {
        self.on_match.as_ref()
    }

    /// Returns `true` when the rule has neither a text nor a meta test.
    pub fn is_catch_all(&self) -> bool {
        self.text.is_none() && self.meta.is_none()
    }

    /// JSON description used in log metadata.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "direction": self.direction.as_ref().map(Direction::as_str),
            "text": self.text.as_ref().map(TextTest::describe),
            "meta_path": self.meta_path.as_ref().map(MetaPath::as_str),
            "meta": self.meta.as_ref().map(MetaTest::describe),
            "on_match": self.on_match.is_some(),
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("text", &self.text)
            .field("meta_path", &self.meta_path)
            .field("meta", &self.meta)
            .field("on_match", &self.on_match.is_some())
            .finish()
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Creates a rule that passes every event.
pub fn catch_all() -> Rule {
    Rule::new().name("catch_all")
}

/// Creates a rule restricted to bot-authored events.
pub fn on_bot() -> Rule {
    Rule::new().direction(Direction::Bot)
}

/// Creates a rule restricted to user-authored events.
pub fn on_user() -> Rule {
    Rule::new().direction(Direction::User)
}

/// Creates a rule whose text must contain `needle`.
pub fn on_contains(needle: impl Into<String>) -> Rule {
    Rule::new().text(TextTest::contains(needle))
}
