//! Scheduled events and time advance.

mod common;

use serde_json::json;
use skirmish_core::clock::ScheduledEvent;
use skirmish_core::testing::{assert_ok, assert_rejected, skirmish_fixture, TestHarness};
use skirmish_core::{EngineError, EventPayload, RulesConfig, World};
use std::sync::{Arc, Mutex};

fn midnight(max_events: usize) -> TestHarness {
    common::init_tracing();
    let rules = RulesConfig {
        start_time_min: 0,
        max_events_per_advance: max_events,
        seed: Some(11),
        ..RulesConfig::default()
    };
    TestHarness::with_config(skirmish_fixture().with_rules(rules))
}

#[test]
fn test_ambush_fires_at_ten() {
    let mut h = midnight(32);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    h.world.on_event("ambush", move |world: &mut World, _event: &ScheduledEvent| {
        log.lock().unwrap().push(world.now());
        Ok(vec!["Bandits leap from the ditch.".to_string()])
    });

    assert_ok(&h.call("schedule_event", json!({"name": "ambush", "at_min": 10})));
    let result = h.call("advance_time", json!({"mins": 15}));
    assert_ok(&result);

    assert_eq!(*seen.lock().unwrap(), vec![10]);
    assert_eq!(h.world.now(), 15);
    assert_eq!(result.metadata["fired"][0]["at_min"], 10);
    assert!(result.text_blocks.iter().any(|t| t.contains("Bandits")));
}

#[test]
fn test_fire_order_is_non_decreasing() {
    let mut h = midnight(32);
    for (name, at) in [("c", 30), ("a", 10), ("b", 10), ("d", 25), ("later", 90)] {
        h.world.schedule_event(name, at, EventPayload::default()).unwrap();
    }
    let result = h.world.advance_time(60).unwrap();
    let fired: Vec<(&str, u32)> = result
        .outcome
        .fired
        .iter()
        .map(|e| (e.name.as_str(), e.at_min))
        .collect();
    assert_eq!(fired, vec![("a", 10), ("b", 10), ("d", 25), ("c", 30)]);
    assert_eq!(h.world.snapshot().pending_events.len(), 1);
}

#[test]
fn test_chained_events_fire_in_the_same_advance() {
    let mut h = midnight(32);
    h.world.on_event("horn", |world: &mut World, event: &ScheduledEvent| {
        let payload = EventPayload::default()
            .with_data(json!({"from": event.name}));
        world.schedule_event("riders", event.at_min + 5, payload)?;
        Ok(Vec::new())
    });
    h.world.on_event("riders", |world: &mut World, event: &ScheduledEvent| {
        world.add_mark(&format!("riders answered the {}", event.payload.data["from"].as_str().unwrap_or("?")))?;
        Ok(Vec::new())
    });
    h.world.schedule_event("horn", 20, EventPayload::default()).unwrap();

    let result = h.world.advance_time(30).unwrap();
    assert_eq!(result.outcome.fired.len(), 2);
    assert_eq!(result.outcome.fired[1].at_min, 25);
    assert_eq!(h.world.state().mood().marks(), &["riders answered the horn".to_string()]);

    // Follow-ups past the target stay queued
    h.world.schedule_event("horn", 58, EventPayload::default()).unwrap();
    let result = h.world.advance_time(30).unwrap();
    assert_eq!(result.outcome.fired.len(), 1);
    assert_eq!(h.world.state().clock().pending()[0].at_min, 63);
}

#[test]
fn test_event_budget_overrun_rolls_back() {
    let mut h = midnight(4);
    h.world.on_event("flood", |world: &mut World, event: &ScheduledEvent| {
        world.apply_damage("Brann", 1, "rising water")?;
        world.schedule_event("flood", event.at_min, EventPayload::default())?;
        Ok(Vec::new())
    });
    h.world.schedule_event("flood", 5, EventPayload::default()).unwrap();
    let before = h.world.snapshot();

    let err = h.world.advance_time(10).unwrap_err();
    assert_eq!(err, EngineError::EventBudgetExceeded { limit: 4 });
    assert_eq!(h.world.snapshot(), before);

    let result = h.call("advance_time", json!({"mins": 10}));
    assert_rejected(&result, "EventBudgetExceeded");
}

#[test]
fn test_payload_commands_report_each_result() {
    let mut h = midnight(32);
    let result = h.call(
        "schedule_event",
        json!({
            "name": "wolf returns",
            "at_min": 40,
            "payload": {"commands": [
                {"tool": "set_position", "args": {"actor": "Wolf", "x": 1, "y": 1}},
                {"tool": "apply_damage", "args": {"target": "Ghost", "amount": 3}},
                {"tool": "add_objective", "args": {"label": "Drive off the wolf"}}
            ]}
        }),
    );
    assert_ok(&result);
    assert_eq!(result.metadata["seq"], 0);

    let result = h.call("advance_time", json!({"mins": 45}));
    assert_ok(&result);
    let reports = result.metadata["fired"][0]["results"].as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0]["ok"], true);
    assert_eq!(reports[1]["error_reason"], "UnknownActor");
    assert_eq!(reports[2]["ok"], true);
    assert!(h.world.state().objectives().contains("Drive off the wolf"));
}

#[test]
fn test_nested_advance_from_payload_is_rejected() {
    let mut h = midnight(32);
    let payload = EventPayload::default()
        .with_command(skirmish_core::Command::from_call("advance_time", &json!({"mins": 100})).unwrap());
    h.world.schedule_event("sleep", 1, payload).unwrap();

    let result = h.world.advance_time(5).unwrap();
    let report = &result.outcome.fired[0].results[0];
    assert_eq!(report.error_reason.as_deref(), Some("InvalidArgument"));
    assert_eq!(h.world.now(), 5);
}

#[test]
fn test_clock_label_in_snapshot() {
    let mut h = TestHarness::new();
    assert_eq!(h.world.snapshot().clock_label, "08:00");
    h.world.advance_time(95).unwrap();
    assert_eq!(h.world.snapshot().clock_label, "09:35");
}
