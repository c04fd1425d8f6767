//! The match engine.
//!
//! [`select`] walks a rule list in declaration order and returns the first
//! rule whose configured tests all pass. Each rule is checked with
//! short-circuiting, in this order:
//!
//! 1. direction filter
//! 2. text test
//! 3. meta test, against the value at the rule's metadata path
//!
//! Nothing here fails. A test that cannot apply (an unknown test kind, a
//! pattern against a non-string value, a missing path) simply does not pass,
//! and the reason is reported through the [`Logger`].

use serde_json::{Number, Value, json};

use parley_core::{ExtractedContext, Logger, MetaPath};

use crate::rule::{MetaTest, Rule, TextTest};

/// Returns the first rule that passes, with its index.
pub fn select<'r>(
    rules: &'r [Rule],
    ctx: &ExtractedContext,
    logger: &Logger,
) -> Option<(usize, &'r Rule)> {
    rules
        .iter()
        .enumerate()
        .find(|(index, rule)| check_rule(*index, rule, ctx, logger))
}

/// Checks one rule against an extracted event.
pub fn check_rule(index: usize, rule: &Rule, ctx: &ExtractedContext, logger: &Logger) -> bool {
    if let Some(expected) = rule.direction_filter()
        && *expected != ctx.direction
    {
        logger.debug(
            "Skipping rule due to direction mismatch",
            json!({
                "index": index,
                "expected": expected.as_str(),
                "direction": ctx.direction.as_str(),
            }),
        );
        return false;
    }

    if let Some(test) = rule.text_test() {
        if !check_text(test, &ctx.text, logger) {
            return false;
        }
        logger.debug(
            "Rule passed text test",
            json!({ "index": index, "test": test.describe(), "text": ctx.text }),
        );
    }

    if let Some(test) = rule.get_meta_test() {
        let path = rule.get_meta_path();
        let value = path.and_then(|p| p.resolve(&ctx.metadata));
        if !check_meta(test, path, value, logger) {
            return false;
        }
        logger.debug(
            "Rule passed metadata test",
            json!({
                "index": index,
                "test": test.describe(),
                "path": path.map(MetaPath::as_str),
                "value": value,
            }),
        );
    }

    true
}

/// Evaluates a text test.
pub fn check_text(test: &TextTest, text: &str, logger: &Logger) -> bool {
    let (passed, mismatch) = match test {
        TextTest::Contains(needle) => (
            text.contains(needle.as_str()),
            "Skipping rule due to text contains test mismatch",
        ),
        TextTest::Pattern(re) => (
            re.is_match(text),
            "Skipping rule due to text pattern test mismatch",
        ),
        TextTest::Predicate(f) => (f(text), "Skipping rule due to text predicate test mismatch"),
        TextTest::Unsupported(raw) => {
            logger.warn(
                "Skipping rule due to unknown test type",
                json!({ "test": raw, "text": text }),
            );
            return false;
        }
    };

    if !passed {
        logger.debug(mismatch, json!({ "test": test.describe(), "text": text }));
    }
    passed
}

/// Evaluates a meta test against an already resolved value.
pub fn check_meta(
    test: &MetaTest,
    path: Option<&MetaPath>,
    value: Option<&Value>,
    logger: &Logger,
) -> bool {
    let path = path.map(MetaPath::as_str);
    let (passed, mismatch) = match test {
        MetaTest::Pattern(re) => {
            let Some(Value::String(s)) = value else {
                logger.debug(
                    "Skipping rule due to a non-string value in a pattern test",
                    json!({ "test": test.describe(), "path": path, "value": value }),
                );
                return false;
            };
            (
                re.is_match(s),
                "Skipping rule due to metadata pattern test mismatch",
            )
        }
        MetaTest::Predicate(f) => (
            f(value),
            "Skipping rule due to metadata predicate test mismatch",
        ),
        MetaTest::Equals(literal) => (
            value.is_some_and(|v| strict_equals(v, literal)),
            "Skipping rule due to metadata value test mismatch",
        ),
    };

    if !passed {
        logger.debug(
            mismatch,
            json!({ "test": test.describe(), "path": path, "value": value }),
        );
    }
    passed
}

/// Equality in the `===` sense for data: numbers compare by value, so `1`
/// equals `1.0`. Containers compare element by element.
fn strict_equals(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| strict_equals(x, y)))
        }
        _ => value == literal,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{catch_all, on_contains};
    use parking_lot::Mutex;
    use parley_core::{Direction, LogLevel, LogSink, RawPayload};
    use std::sync::Arc;

    type Captured = Arc<Mutex<Vec<(LogLevel, String)>>>;

    fn capturing_logger() -> (Logger, Captured) {
        let seen: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let logger = Logger::new(LogSink::custom(move |level, msg, _| {
            sink_seen.lock().push((level, msg.to_string()));
        }));
        (logger, seen)
    }

    /// The fixture from the widget's own rule examples.
    fn fixture_rules() -> Vec<Rule> {
        vec![
            Rule::new().text(TextTest::Pattern(crate::rule::compile_pattern("foo", true).unwrap())),
            Rule::new().text(TextTest::contains("bar")),
            Rule::new().text(TextTest::predicate(|t| t.contains("complicated"))),
            Rule::new().meta("0.a.0", MetaTest::equals("a")),
            Rule::new().meta("1.b.1", MetaTest::equals("b")),
            Rule::new().meta(
                "2.c",
                MetaTest::predicate(|v| {
                    v.and_then(Value::as_str)
                        .is_some_and(|s| s.contains("complicated"))
                }),
            ),
            Rule::new().meta("3.d", MetaTest::pattern("a{3,}").unwrap()),
        ]
    }

    fn fixture_payload(text: &str) -> RawPayload {
        RawPayload::bot(text).with_metadata([
            json!({ "a": ["x"] }),
            json!({ "b": ["x", "b"] }),
            json!({ "c": "Something complicated" }),
            json!({ "d": "Aaaaaaah!" }),
        ])
    }

    fn selected(rules: &[Rule], payload: &RawPayload) -> Option<usize> {
        let ctx = ExtractedContext::from_payload(payload);
        select(rules, &ctx, &Logger::default()).map(|(i, _)| i)
    }

    #[test]
    fn test_matches_plain_text() {
        assert_eq!(selected(&fixture_rules(), &fixture_payload("Hello bar")), Some(1));
    }

    #[test]
    fn test_matches_text_pattern() {
        assert_eq!(selected(&fixture_rules(), &fixture_payload("Hello Foo")), Some(0));
    }

    #[test]
    fn test_matches_text_predicate() {
        assert_eq!(
            selected(&fixture_rules(), &fixture_payload("Something complicated")),
            Some(2)
        );
    }

    #[test]
    fn test_matches_metadata_value() {
        assert_eq!(selected(&fixture_rules(), &fixture_payload("Hello baz")), Some(4));
    }

    #[test]
    fn test_matches_metadata_predicate() {
        let payload = RawPayload::bot("Hello baz").with_metadata([
            json!({ "a": ["x"] }),
            json!({}),
            json!({ "c": "Something complicated" }),
            json!({ "d": "Aaaaaaah!" }),
        ]);
        assert_eq!(selected(&fixture_rules(), &payload), Some(5));
    }

    #[test]
    fn test_matches_metadata_pattern() {
        let payload = RawPayload::bot("Hello baz").with_metadata([
            json!({ "a": ["x"] }),
            json!({}),
            json!({}),
            json!({ "d": "Aaaaaaah!" }),
        ]);
        assert_eq!(selected(&fixture_rules(), &payload), Some(6));
    }

    #[test]
    fn test_no_match_without_metadata() {
        let payload = RawPayload::bot("Hello baz").with_attachments(json!({}));
        assert_eq!(selected(&fixture_rules(), &payload), None);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            on_contains("Hello"),
            on_contains("bar"),
            catch_all(),
        ];
        assert_eq!(selected(&rules, &RawPayload::bot("Hello bar")), Some(0));
        assert_eq!(selected(&rules, &RawPayload::bot("just bar")), Some(1));
        assert_eq!(selected(&rules, &RawPayload::bot("nothing")), Some(2));
    }

    #[test]
    fn test_catch_all_passes_anything() {
        let rules = vec![catch_all()];
        assert_eq!(selected(&rules, &RawPayload::new(Direction::User)), Some(0));
        assert_eq!(
            selected(&rules, &RawPayload::new("SYSTEM").with_text("x")),
            Some(0)
        );
    }

    #[test]
    fn test_direction_filter() {
        let rules = vec![
            on_contains("hi").direction(Direction::User),
            on_contains("hi"),
        ];
        assert_eq!(selected(&rules, &RawPayload::user("hi")), Some(0));
        assert_eq!(selected(&rules, &RawPayload::bot("hi")), Some(1));
    }

    #[test]
    fn test_meta_equals() {
        let rules = vec![Rule::new().meta("0.a.0", MetaTest::equals("a"))];
        let hit = RawPayload::bot("").with_metadata([json!({ "a": ["a"] })]);
        let miss = RawPayload::bot("").with_metadata([json!({ "a": ["x"] })]);
        assert_eq!(selected(&rules, &hit), Some(0));
        assert_eq!(selected(&rules, &miss), None);
    }

    #[test]
    fn test_meta_pattern_against_non_string_fails_quietly() {
        let (logger, seen) = capturing_logger();
        let rules = vec![Rule::new().meta("0.n", MetaTest::pattern("1").unwrap())];
        let payload = RawPayload::bot("").with_metadata([json!({ "n": 1 })]);
        let ctx = ExtractedContext::from_payload(&payload);

        assert!(select(&rules, &ctx, &logger).is_none());
        let seen = seen.lock();
        assert!(seen.iter().any(|(level, msg)| {
            *level == LogLevel::Debug && msg.contains("non-string value")
        }));
    }

    #[test]
    fn test_meta_without_path_sees_absent_value() {
        let seen = Arc::new(Mutex::new(None));
        let tap = Arc::clone(&seen);
        let rules = vec![Rule::new().meta_test(MetaTest::predicate(move |v| {
            *tap.lock() = Some(v.cloned());
            true
        }))];
        let payload = RawPayload::bot("").with_metadata([json!({ "a": 1 })]);

        assert_eq!(selected(&rules, &payload), Some(0));
        assert_eq!(*seen.lock(), Some(None));
    }

    #[test]
    fn test_unsupported_text_test_warns_and_fails() {
        let (logger, seen) = capturing_logger();
        let rules = vec![Rule::new().text(TextTest::Unsupported(json!(42)))];
        let ctx = ExtractedContext::from_payload(&RawPayload::bot("42"));

        assert!(select(&rules, &ctx, &logger).is_none());
        assert!(
            seen.lock()
                .iter()
                .any(|(level, msg)| *level == LogLevel::Warn && msg.contains("unknown test type"))
        );
    }

    #[test]
    fn test_equals_falsy_literal_is_still_a_test() {
        let rules = vec![Rule::new().meta("0.flag", MetaTest::equals(false))];
        let off = RawPayload::bot("").with_metadata([json!({ "flag": false })]);
        let missing = RawPayload::bot("").with_metadata([json!({})]);
        assert_eq!(selected(&rules, &off), Some(0));
        assert_eq!(selected(&rules, &missing), None);
    }

    #[test]
    fn test_meta_equals_compares_numbers_by_value() {
        let float_literal = vec![Rule::new().meta("0.score", MetaTest::equals(1.0))];
        let int_literal = vec![Rule::new().meta("0.score", MetaTest::equals(1))];
        let int_value = RawPayload::bot("").with_metadata([json!({ "score": 1 })]);
        let float_value = RawPayload::bot("").with_metadata([json!({ "score": 1.0 })]);
        let other = RawPayload::bot("").with_metadata([json!({ "score": 1.5 })]);
        let text = RawPayload::bot("").with_metadata([json!({ "score": "1" })]);

        assert_eq!(selected(&float_literal, &int_value), Some(0));
        assert_eq!(selected(&int_literal, &float_value), Some(0));
        assert_eq!(selected(&float_literal, &other), None);
        assert_eq!(selected(&int_literal, &text), None);
    }

    #[test]
    fn test_strict_equals_nested() {
        assert!(strict_equals(&json!({ "a": [1, 2.0] }), &json!({ "a": [1.0, 2] })));
        assert!(!strict_equals(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!strict_equals(&json!({ "a": 1 }), &json!({ "b": 1 })));
        assert!(strict_equals(&json!(-3), &json!(-3.0)));
        assert!(!strict_equals(&json!(u64::MAX), &json!(-1)));
    }
}
