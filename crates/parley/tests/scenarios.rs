//! End-to-end behaviour through the public facade.

use std::sync::Arc;

use parking_lot::Mutex;
use parley::core::ConfigError;
use parley::prelude::*;
use parley::runtime::{BoundHostSettings, RuntimeError};
use serde_json::{Value, json};

type Seen = Arc<Mutex<Vec<(String, String, Vec<Value>)>>>;

fn recording_actions() -> (ActionRegistry, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let mut actions = ActionRegistry::new();
    for name in ["f", "g"] {
        let sink = Arc::clone(&seen);
        actions.register(name, move |event| {
            sink.lock().push((
                name.to_string(),
                event.text.to_string(),
                event.metadata.to_vec(),
            ));
            Ok(())
        });
    }
    (actions, seen)
}

fn log_capture() -> (LogSink, Arc<Mutex<Vec<(LogLevel, String)>>>) {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let sink_logs = Arc::clone(&logs);
    let sink = LogSink::custom(move |level, message, _| {
        sink_logs.lock().push((level, message.to_string()));
    });
    (sink, logs)
}

#[test]
fn construction_rejects_non_objects_and_bad_handlers() {
    let actions = ActionRegistry::new();
    for value in [json!(null), json!("config"), json!(3), json!([])] {
        assert!(matches!(
            EngineConfig::from_value(&value, &actions),
            Err(ConfigError::NotAnObject { .. })
        ));
    }
    assert!(matches!(
        EngineConfig::from_value(&json!({}), &actions),
        Err(ConfigError::MissingHandler)
    ));
    for handler in [json!("f"), json!(7), json!(true)] {
        assert!(matches!(
            EngineConfig::from_value(&json!({ "handler": handler }), &actions),
            Err(ConfigError::InvalidHandler { .. })
        ));
    }
}

#[test]
fn contains_rule_fires_and_misses_log_info() {
    let (actions, seen) = recording_actions();
    let (sink, logs) = log_capture();
    let config = EngineConfig::from_value(
        &json!({
            "handler": [{ "text": "bar", "onMatch": "f" }],
            "processWhenClosed": true
        }),
        &actions,
    )
    .unwrap()
    .log_sink(sink);
    let dispatcher = Dispatcher::new(config).unwrap();

    let hit = dispatcher.on_message(&RawPayload::bot("Hello bar")).unwrap();
    assert_eq!(hit, Outcome::Matched { index: 0 });
    assert_eq!(
        seen.lock().as_slice(),
        [("f".to_string(), "Hello bar".to_string(), Vec::new())]
    );

    let miss = dispatcher.on_message(&RawPayload::bot("Hello baz")).unwrap();
    assert_eq!(miss, Outcome::NoMatch);
    assert_eq!(seen.lock().len(), 1);
    assert!(
        logs.lock()
            .iter()
            .any(|(level, msg)| *level == LogLevel::Info && msg == "Failed to find a match")
    );
}

#[test]
fn metadata_equality_through_a_path() {
    let (actions, seen) = recording_actions();
    let config = EngineConfig::from_value(
        &json!({
            "handler": [{ "metaPath": "0.a.0", "meta": "a", "action": "g" }],
            "processWhenClosed": true
        }),
        &actions,
    )
    .unwrap();
    let dispatcher = Dispatcher::new(config).unwrap();

    let payload = |inner: Value| RawPayload::bot("").with_metadata([inner]);
    assert_eq!(
        dispatcher.on_message(&payload(json!({ "a": ["x"] }))).unwrap(),
        Outcome::NoMatch
    );
    assert_eq!(
        dispatcher.on_message(&payload(json!({ "a": ["a"] }))).unwrap(),
        Outcome::Matched { index: 0 }
    );
    assert_eq!(seen.lock()[0].2, vec![json!({ "a": ["a"] })]);
}

#[test]
fn first_passing_rule_wins_and_catch_all_takes_the_rest() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let rule = |label: &'static str, rule: Rule| {
        let order = Arc::clone(&order);
        rule.on_match(move |_| {
            order.lock().push(label);
            Ok(())
        })
    };
    let dispatcher = Dispatcher::new(
        EngineConfig::new().process_when_closed(true).handler(vec![
            rule("user", on_user()),
            rule("hello", on_contains("hello")),
            rule("hello-again", on_contains("hello")),
            rule("rest", catch_all()),
        ]),
    )
    .unwrap();

    for payload in [
        RawPayload::bot("hello"),
        RawPayload::user("hello"),
        RawPayload::bot("bye"),
        RawPayload::new(Direction::Bot),
    ] {
        dispatcher.on_message(&payload).unwrap();
    }

    assert_eq!(*order.lock(), ["hello", "user", "rest", "rest"]);
}

#[test]
fn payload_without_metadata_structure_is_not_an_error() {
    let dispatcher = Dispatcher::new(
        EngineConfig::new().process_when_closed(true).handler(vec![
            Rule::new()
                .meta("0.a", MetaTest::equals("a"))
                .on_match(|_| Ok(())),
        ]),
    )
    .unwrap();

    let payload: RawPayload = serde_json::from_value(json!({
        "type": "BOT",
        "text": "hi",
        "attachments": { "metadata": "not a list" }
    }))
    .unwrap();
    assert_eq!(dispatcher.on_message(&payload).unwrap(), Outcome::NoMatch);
}

#[test]
fn closed_widget_blocks_dispatch_until_opened() {
    let (actions, seen) = recording_actions();
    let config =
        EngineConfig::from_value(&json!({ "handler": { "action": "f" } }), &actions).unwrap();
    let dispatcher = Dispatcher::new(config).unwrap();

    assert_eq!(
        dispatcher.on_message(&RawPayload::bot("early")).unwrap(),
        Outcome::Dropped(DropReason::Closed)
    );
    dispatcher.on_open();
    assert_eq!(
        dispatcher.on_message(&RawPayload::bot("late")).unwrap(),
        Outcome::Handled
    );
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(seen.lock()[0].1, "late");
}

#[test]
fn interactive_bot_composes_host_hooks() {
    let (actions, seen) = recording_actions();
    let host_messages = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&host_messages);

    let config = EngineConfig::from_value(
        &json!({
            "handler": [{ "text": "bar", "action": "f" }],
            "hostSettings": { "botId": "demo", "greeting": "hi" }
        }),
        &actions,
    )
    .unwrap();
    let loaded = Arc::new(Mutex::new(None));
    let tap = Arc::clone(&loaded);
    let loader = move |url: &str, host: &BoundHostSettings| -> Result<(), CallbackError> {
        *tap.lock() = Some((url.to_string(), host.to_value()));
        Ok(())
    };

    let bot = InteractiveBot::create(
        config,
        HostHooks::new().on_message(move |_| *counter.lock() += 1),
        &loader,
    )
    .unwrap();

    let (url, settings) = loaded.lock().clone().unwrap();
    assert_eq!(url, "https://rundexter.com/webwidget");
    assert_eq!(settings, json!({ "botId": "demo", "greeting": "hi" }));

    bot.host().on_message(&RawPayload::bot("bar")).unwrap();
    bot.host().on_open();
    bot.host().on_message(&RawPayload::bot("bar")).unwrap();

    assert_eq!(*host_messages.lock(), 2);
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn interactive_bot_requires_bot_id() {
    let config = EngineConfig::new().handler(Handler::direct(|_| Ok(())));
    let loader = |_: &str, _: &BoundHostSettings| -> Result<(), CallbackError> { Ok(()) };
    assert!(matches!(
        InteractiveBot::create(config, HostHooks::new(), &loader),
        Err(RuntimeError::MissingField { .. })
    ));
}
