//! Rules declared as data.
//!
//! Callbacks cannot live in a config file, so declared rules name an
//! *action* instead, and an [`ActionRegistry`] maps action names to
//! callbacks when the rules are built.
//!
//! # Format
//!
//! ```toml
//! [[rules]]
//! name = "greeting"
//! direction = "BOT"
//! text = "hello"                         # bare string: substring test
//! action = "greet"
//!
//! [[rules]]
//! text = { pattern = "^/help", ignore_case = true }
//! action = "help"
//!
//! [[rules]]
//! meta_path = "0.intent"
//! meta = { equals = "order" }            # any other literal also means equals
//! action = "order"
//! ```
//!
//! Malformed tests follow the engine's usual split: a pattern that does not
//! compile is fatal, while a text test of an unknown shape and an action
//! nobody registered are kept, warned about by the validator, and simply
//! never fire.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parley_core::{ConfigError, ConfigResult, Direction, value_kind};

use crate::handler::{CallbackResult, Handler, MatchCallback, MessageEvent};
use crate::rule::{MetaTest, Rule, TextTest, compile_pattern};

/// Named callbacks that declared rules can refer to.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, MatchCallback>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MessageEvent<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(f));
        self
    }

    /// Registers a callback (builder pattern).
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&MessageEvent<'_>) -> CallbackResult + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<MatchCallback> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

/// One declared rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeclaredRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        alias = "type",
        alias = "directionFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub direction: Option<Direction>,

    #[serde(default, alias = "textTest", skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,

    #[serde(default, alias = "metaPath", skip_serializing_if = "Option::is_none")]
    pub meta_path: Option<String>,

    #[serde(default, alias = "metaTest", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    #[serde(default, alias = "onMatch", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl DeclaredRule {
    /// Builds the rule, binding its action through `actions`.
    pub fn build(&self, actions: &ActionRegistry) -> ConfigResult<Rule> {
        let mut rule = Rule::new();
        if let Some(name) = &self.name {
            rule = rule.name(name.clone());
        }
        if let Some(direction) = &self.direction {
            rule = rule.direction(direction.clone());
        }
        if let Some(text) = &self.text {
            rule = rule.text(text_test_from_value(text)?);
        }
        if let Some(path) = &self.meta_path {
            rule = rule.meta_path(path.as_str());
        }
        if let Some(meta) = &self.meta {
            rule = rule.meta_test(meta_test_from_value(meta)?);
        }
        if let Some(callback) = self.action.as_deref().and_then(|name| actions.get(name)) {
            rule = rule.on_match_boxed(callback);
        }
        Ok(rule)
    }
}

/// Reads a pattern object: `{ "pattern": "...", "ignore_case": bool }`.
fn pattern_from_object(map: &Map<String, Value>) -> Option<ConfigResult<regex::Regex>> {
    let source = map.get("pattern")?.as_str()?;
    let ignore_case = map
        .get("ignore_case")
        .or_else(|| map.get("ignoreCase"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(compile_pattern(source, ignore_case))
}

/// Converts a declared text test.
///
/// Unknown shapes become [`TextTest::Unsupported`] instead of failing.
pub fn text_test_from_value(value: &Value) -> ConfigResult<TextTest> {
    match value {
        Value::String(needle) => Ok(TextTest::contains(needle.clone())),
        Value::Object(map) => {
            if let Some(pattern) = pattern_from_object(map) {
                return pattern.map(TextTest::Pattern);
            }
            match map.get("contains") {
                Some(Value::String(needle)) => Ok(TextTest::contains(needle.clone())),
                _ => Ok(TextTest::Unsupported(value.clone())),
            }
        }
        other => Ok(TextTest::Unsupported(other.clone())),
    }
}

/// Converts a declared meta test. Anything that is not a pattern or an
/// explicit `{ "equals": ... }` is an equality literal.
pub fn meta_test_from_value(value: &Value) -> ConfigResult<MetaTest> {
    if let Value::Object(map) = value {
        if let Some(pattern) = pattern_from_object(map) {
            return pattern.map(MetaTest::Pattern);
        }
        if map.len() == 1
            && let Some(literal) = map.get("equals")
        {
            return Ok(MetaTest::Equals(literal.clone()));
        }
    }
    Ok(MetaTest::Equals(value.clone()))
}

/// Binds declared rules to `actions`, keeping their order.
pub fn rules_from_declared(
    declared: &[DeclaredRule],
    actions: &ActionRegistry,
) -> ConfigResult<Vec<Rule>> {
    declared
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            rule.build(actions).map_err(|e| match e {
                ConfigError::InvalidPattern { pattern, reason } => {
                    ConfigError::invalid_rule(index, format!("pattern {pattern:?}: {reason}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Builds rules from a JSON array of declared rules.
///
/// Anything other than an array is an invalid handler.
pub fn rules_from_value(value: &Value, actions: &ActionRegistry) -> ConfigResult<Vec<Rule>> {
    let Value::Array(items) = value else {
        return Err(ConfigError::InvalidHandler {
            found: value_kind(value),
        });
    };
    let declared = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<DeclaredRule>(item.clone())
                .map_err(|e| ConfigError::invalid_rule(index, e.to_string()))
        })
        .collect::<ConfigResult<Vec<_>>>()?;
    rules_from_declared(&declared, actions)
}

/// Reads a handler from data: a rule array, or `{ "action": name }` for a
/// direct handler.
pub fn handler_from_value(value: &Value, actions: &ActionRegistry) -> ConfigResult<Handler> {
    if let Some(name) = value
        .as_object()
        .and_then(|map| map.get("action"))
        .and_then(Value::as_str)
    {
        let callback = actions.get(name).ok_or_else(|| ConfigError::UnknownAction {
            name: name.to_string(),
        })?;
        return Ok(Handler::Direct(callback));
    }
    rules_from_value(value, actions).map(Handler::from)
}
