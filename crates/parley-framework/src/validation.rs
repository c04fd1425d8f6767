//! Construction-time checks.
//!
//! Only a missing handler is fatal. Problems with individual rules are
//! reported as warnings and the rule is kept as-is.

use serde_json::json;

use parley_core::{ConfigError, ConfigResult, Direction, Logger};

use crate::config::EngineConfig;
use crate::handler::Handler;
use crate::rule::{Rule, TextTest};

/// Validates an engine configuration, warning about questionable rules.
///
/// Returns the handler the configuration carries.
pub fn validate_config<'a>(
    config: &'a EngineConfig,
    logger: &Logger,
) -> ConfigResult<&'a Handler> {
    let handler = config.handler.as_ref().ok_or(ConfigError::MissingHandler)?;
    if let Handler::RuleBased(rules) = handler {
        validate_rules(rules, logger);
    }
    Ok(handler)
}

/// Warns about each questionable rule. Returns the number of warnings.
pub fn validate_rules(rules: &[Rule], logger: &Logger) -> usize {
    let mut warnings = 0;
    let mut warn = |message: &str, index: usize, rule: &Rule| {
        warnings += 1;
        logger.warn(message, json!({ "index": index, "rule": rule.describe() }));
    };

    for (index, rule) in rules.iter().enumerate() {
        if let Some(Direction::Other(_)) = rule.direction_filter() {
            warn("Unknown direction filter in rule", index, rule);
        }
        if rule.is_catch_all() {
            warn("Missing a test in rule", index, rule);
        }
        if let Some(TextTest::Unsupported(_)) = rule.text_test() {
            warn("Invalid text test in rule", index, rule);
        }
        if rule.get_meta_test().is_some() && rule.get_meta_path().is_none() {
            warn("Missing meta_path for meta test in rule", index, rule);
        }
        if rule.callback().is_none() {
            warn("Invalid on_match callback in rule", index, rule);
        }
    }

    warnings
}
