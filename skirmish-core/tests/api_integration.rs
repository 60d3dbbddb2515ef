//! World construction from JSON and the tool dispatch surface.

mod common;

use serde_json::json;
use skirmish_core::dispatch::{AdjustTensionArgs, PerformSkillCheckArgs};
use skirmish_core::testing::{assert_hp, assert_ok, assert_rejected, ScriptedDice, TestHarness};
use skirmish_core::{tool_specs, Advantage, Command, ConfigError, World, WorldConfig};
use std::collections::BTreeSet;

const CAMP: &str = r#"{
    "include_standard_weapons": true,
    "actors": [
        {
            "name": "Amiya",
            "abilities": {"STR": 8, "DEX": 14, "CON": 12, "INT": 10, "WIS": 14, "CHA": 10},
            "ac": 13,
            "max_hp": 14,
            "proficient_skills": ["stealth", "Sleight of Hand"],
            "proficient_saves": ["DEX"],
            "position": [0, 0],
            "inventory": {"dagger": 1, "rations": 3}
        },
        {
            "name": "Cato",
            "armor_class": 11,
            "max_hp": 9,
            "hp": 4,
            "position": [2, 2]
        }
    ],
    "relations": [{"a": "Amiya", "b": "Cato", "value": 12}],
    "objectives": ["Find the ford", "Keep Cato alive"],
    "scene": {"name": "Riverside camp", "weather": "drizzle"},
    "rules": {"seed": 42, "start_time_min": 1200}
}"#;

fn camp() -> World {
    common::init_tracing();
    World::new(WorldConfig::from_json_str(CAMP).unwrap()).unwrap()
}

#[test]
fn test_world_from_json() {
    let world = camp();
    let snapshot = world.snapshot();
    assert_eq!(snapshot.clock_label, "20:00");
    assert_eq!(snapshot.actor("Cato").unwrap().hp, 4);
    assert_eq!(snapshot.actor("Cato").unwrap().ac, 11);
    assert_eq!(snapshot.relation("Amiya", "Cato"), 12);
    assert_eq!(snapshot.inventory["Amiya"]["rations"], 3);
    assert_eq!(snapshot.objectives.len(), 2);
    assert_eq!(snapshot.scene.weather.as_deref(), Some("drizzle"));
    assert!(!snapshot.in_combat);
}

#[test]
fn test_invalid_configs_abort_construction() {
    let duplicate = CAMP.replace("\"Cato\",\n            \"armor_class\"", "\"Amiya\",\n            \"armor_class\"");
    let config = WorldConfig::from_json_str(&duplicate).unwrap();
    assert!(matches!(World::new(config), Err(ConfigError::DuplicateActor(name)) if name == "Amiya"));

    let bad_skill = CAMP.replace("\"stealth\"", "\"knitting\"");
    let config = WorldConfig::from_json_str(&bad_skill).unwrap();
    assert!(matches!(World::new(config), Err(ConfigError::UnknownSkill { .. })));

    assert!(matches!(
        WorldConfig::from_json_str("{\"actors\": 3}"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_tool_listing_is_complete() {
    let names: BTreeSet<&str> = tool_specs().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), tool_specs().len());
    for expected in [
        "roll_dice",
        "perform_skill_check",
        "perform_attack",
        "advance_position",
        "adjust_relation",
        "transfer_item",
        "set_protection",
        "clear_protection",
        "schedule_event",
        "advance_time",
        "add_objective",
        "complete_objective",
        "block_objective",
        "get_snapshot",
    ] {
        assert!(names.contains(expected), "missing tool {expected}");
    }
    for spec in tool_specs() {
        assert_eq!(spec.input_schema["type"], "object");
        assert!(!spec.description.is_empty(), "{} has no description", spec.name);
    }
}

#[test]
fn test_perception_check_through_dispatch() {
    let mut world = camp().with_dice(ScriptedDice::new([15]));
    let command = Command::PerformSkillCheck(PerformSkillCheckArgs {
        actor: "Amiya".into(),
        skill_or_save: "perception".into(),
        dc: 12,
        advantage: Some(Advantage::from_flag(false)),
    });
    let result = world.execute(command);
    assert_ok(&result);
    assert_eq!(result.metadata["total"], 17);
    assert_eq!(result.metadata["success"], true);
    assert_eq!(result.metadata["rolls"], json!([15]));
}

#[test]
fn test_inventory_transfers() {
    let mut world = camp();
    let result = world.call(
        "transfer_item",
        &json!({"target": "Cato", "item": "rations", "count": 2, "from": "Amiya", "reason": "sharing"}),
    );
    assert_ok(&result);
    assert_eq!(world.actor("Amiya").unwrap().item_count("rations"), 1);
    assert_eq!(world.actor("Cato").unwrap().item_count("rations"), 2);

    let before = world.snapshot();
    let result = world.call(
        "transfer_item",
        &json!({"target": "Cato", "item": "rations", "count": 5, "from": "Amiya"}),
    );
    assert_rejected(&result, "InsufficientItems");
    assert_eq!(world.snapshot(), before);

    let result = world.call("transfer_item", &json!({"target": "Amiya", "item": "rations", "count": -1}));
    assert_ok(&result);
    assert!(!world.snapshot().inventory["Amiya"].contains_key("rations"));
}

#[test]
fn test_objectives_through_dispatch() {
    let mut world = camp();
    assert_ok(&world.call("complete_objective", &json!({"label": "Find the ford", "note": "east bend"})));
    assert_ok(&world.call("complete_objective", &json!({"label": "Find the ford"})));
    assert_rejected(
        &world.call("block_objective", &json!({"label": "Find the ford", "reason": "flooded"})),
        "ObjectiveClosed",
    );
    assert_rejected(&world.call("complete_objective", &json!({"label": "Slay the dragon"})), "UnknownObjective");

    let result = world.call("block_objective", &json!({"label": "Keep Cato alive", "reason": "he wandered off"}));
    assert_ok(&result);
    assert_eq!(result.metadata["all_resolved"], true);

    let snapshot = world.snapshot();
    assert_eq!(snapshot.objectives[0].note.as_deref(), Some("east bend"));
    assert!(snapshot.objectives_resolved);
}

#[test]
fn test_mood_and_scene() {
    let mut world = camp();
    world.execute(Command::AdjustTension(AdjustTensionArgs { delta: 4 }));
    assert_ok(&world.call("add_mark", &json!({"text": "an owl went silent"})));
    assert_ok(&world.call("set_scene", &json!({"name": "Ford crossing"})));

    let snapshot = world.snapshot();
    assert_eq!(snapshot.tension, 5);
    assert_eq!(snapshot.tension_band.to_string(), "oppressive");
    assert_eq!(snapshot.marks.len(), 1);
    assert_eq!(snapshot.scene.name, "Ford crossing");
    assert!(snapshot.scene.weather.is_none());
}

#[test]
fn test_roll_dice_tool() {
    let mut h = TestHarness::new();
    h.rolls([6, 6]);
    let result = h.call("roll_dice", json!({"notation": "2d6+STR", "actor": "Brann", "purpose": "lift the gate"}));
    assert_ok(&result);
    assert_eq!(result.metadata["total"], 15);

    assert_rejected(&h.call("roll_dice", json!({"expression": "2d6+LUCK"})), "MalformedExpression");
    assert_rejected(&h.call("roll_dice", json!({"expression": "0d6"})), "MalformedExpression");
    assert_rejected(&h.call("teleport", json!({})), "UnknownTool");
}

#[test]
fn test_commands_round_trip_as_json() {
    let command = Command::from_call(
        "perform_attack",
        &json!({"attacker": "Brann", "defender": "Wolf", "weapon": "longsword", "advantage": "advantage"}),
    )
    .unwrap();
    let value = serde_json::to_value(&command).unwrap();
    assert_eq!(value["tool"], "perform_attack");
    assert_eq!(value["args"]["weapon_id"], "longsword");
    let back: Command = serde_json::from_value(value).unwrap();
    assert_eq!(back, command);
}

#[test]
fn test_extreme_numbers_come_back_as_results() {
    let mut h = TestHarness::new();
    assert_ok(&h.call("apply_damage", json!({"target": "Brann", "amount": 5})));
    let result = h.call("heal", json!({"target": "Brann", "amount": i32::MAX}));
    assert_ok(&result);
    assert_eq!(result.metadata["change"], 5);
    assert_hp(&h, "Brann", 24, 24);

    h.rolls([10]);
    let result = h.call(
        "perform_skill_check",
        json!({"actor": "Amiya", "skill": "stealth", "dc": i32::MIN}),
    );
    assert_ok(&result);
    assert_eq!(result.metadata["margin"], i32::MAX);

    let result = h.call("roll_dice", json!({"expression": "2147483647+1"}));
    assert_rejected(&result, "MalformedExpression");
}
