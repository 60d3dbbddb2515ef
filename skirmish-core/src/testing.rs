//! Testing utilities.
//!
//! This module provides tools for deterministic scenario tests:
//! - `ScriptedDice` for fixing die results
//! - `skirmish_fixture` for a small ready-made roster
//! - `TestHarness` plus assertion helpers for driving a world by tool name

use crate::config::{ActorConfig, WeaponConfig, WorldConfig};
use crate::dice::{DieSource, SeededDice};
use crate::dispatch::ToolResult;
use crate::position::GridPos;
use crate::world::World;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Script {
    queue: VecDeque<u32>,
    fallback: SeededDice,
}

/// Dice that return queued values in order.
///
/// Each value is clamped to the die being rolled. Once the queue is empty,
/// rolls come from a fixed-seed generator. Clones share the same queue, so
/// rolls can be queued after the dice were handed to a world.
#[derive(Clone)]
pub struct ScriptedDice {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                queue: rolls.into_iter().collect(),
                fallback: SeededDice::from_seed(0),
            })),
        }
    }

    pub fn push(&self, rolls: impl IntoIterator<Item = u32>) {
        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        script.queue.extend(rolls);
    }

    /// Values still queued.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .queue
            .len()
    }
}

impl DieSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let mut script = self.script.lock().unwrap_or_else(|p| p.into_inner());
        match script.queue.pop_front() {
            Some(value) => value.clamp(1, sides.max(1)),
            None => script.fallback.roll_die(sides),
        }
    }
}

impl std::fmt::Debug for ScriptedDice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedDice")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Three actors on the old road: Amiya the scout, Brann guarding her, and a
/// hostile wolf three steps away.
pub fn skirmish_fixture() -> WorldConfig {
    WorldConfig::new()
        .with_standard_weapons()
        .with_weapon(WeaponConfig::new("bite", 1, "STR", "2d4+STR").proficient_by_default())
        .with_actor(
            ActorConfig::new("Amiya", 14, 13)
                .with_abilities(crate::actor::AbilityScores::new(8, 14, 12, 10, 14, 10))
                .proficient_in("stealth")
                .proficient_save("DEX")
                .with_weapon_proficiency("simple")
                .with_item("dagger", 1)
                .with_item("shortbow", 1)
                .at(0, 0),
        )
        .with_actor(
            ActorConfig::new("Brann", 24, 16)
                .with_abilities(crate::actor::AbilityScores::new(16, 10, 14, 10, 10, 10))
                .proficient_in("athletics")
                .proficient_save("STR")
                .proficient_save("CON")
                .with_weapon_proficiency("simple")
                .with_weapon_proficiency("martial")
                .with_item("longsword", 1)
                .at(1, 0),
        )
        .with_actor(
            ActorConfig::new("Wolf", 11, 13)
                .with_abilities(crate::actor::AbilityScores::new(12, 15, 12, 3, 12, 6))
                .with_move_speed(8)
                .with_item("bite", 1)
                .hostile()
                .at(3, 0),
        )
        .with_relation("Amiya", "Brann", 40)
        .with_relation("Brann", "Amiya", 35)
        .with_guardian("Brann", "Amiya")
        .with_objective("Reach the ford")
        .with_scene("Old road", Some("overcast".to_string()))
        .with_seed(7)
}

/// A world driven by tool name with scripted dice.
pub struct TestHarness {
    pub world: World,
    pub dice: ScriptedDice,
}

impl TestHarness {
    /// Harness over [`skirmish_fixture`].
    pub fn new() -> Self {
        Self::with_config(skirmish_fixture())
    }

    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn with_config(config: WorldConfig) -> Self {
        let dice = ScriptedDice::new([]);
        let world = match World::new(config) {
            Ok(world) => world.with_dice(dice.clone()),
            Err(err) => panic!("invalid test configuration: {err}"),
        };
        Self { world, dice }
    }

    /// Queue die results for the next rolls.
    pub fn rolls(&mut self, rolls: impl IntoIterator<Item = u32>) -> &mut Self {
        self.dice.push(rolls);
        self
    }

    pub fn call(&mut self, tool: &str, args: Value) -> ToolResult {
        self.world.call(tool, &args)
    }

    pub fn hp(&self, actor: &str) -> Option<(i32, i32)> {
        self.world
            .actor(actor)
            .map(|a| (a.hit_points.current, a.hit_points.maximum))
    }

    pub fn position(&self, actor: &str) -> Option<GridPos> {
        self.world.actor(actor).and_then(|a| a.position)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

#[track_caller]
pub fn assert_ok(result: &ToolResult) {
    assert!(
        result.ok,
        "Expected success, got {:?}: {}",
        result.error_reason,
        result.text()
    );
}

#[track_caller]
pub fn assert_rejected(result: &ToolResult, reason: &str) {
    assert!(!result.ok, "Expected {reason}, got success: {}", result.text());
    assert_eq!(result.error_reason.as_deref(), Some(reason));
}

#[track_caller]
pub fn assert_hp(harness: &TestHarness, actor: &str, current: i32, max: i32) {
    assert_eq!(
        harness.hp(actor),
        Some((current, max)),
        "Expected {actor} at {current}/{max} HP"
    );
}

#[track_caller]
pub fn assert_position(harness: &TestHarness, actor: &str, x: i32, y: i32) {
    assert_eq!(
        harness.position(actor),
        Some(GridPos::new(x, y)),
        "Expected {actor} at ({x}, {y})"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scripted_dice_clamp_and_fallback() {
        let mut dice = ScriptedDice::new([25, 0, 4]);
        assert_eq!(dice.roll_die(20), 20);
        assert_eq!(dice.roll_die(6), 1);
        assert_eq!(dice.roll_die(6), 4);
        assert_eq!(dice.remaining(), 0);
        let fallback = dice.roll_die(8);
        assert!((1..=8).contains(&fallback));
    }

    #[test]
    fn test_clones_share_queue() {
        let dice = ScriptedDice::new([]);
        let mut handle = dice.clone();
        dice.push([3, 5]);
        assert_eq!(handle.roll_die(6), 3);
        assert_eq!(dice.remaining(), 1);
    }

    #[test]
    fn test_fixture_builds() {
        let harness = TestHarness::new();
        assert_hp(&harness, "Brann", 24, 24);
        assert_position(&harness, "Wolf", 3, 0);
        assert!(harness.world.in_combat());
    }

    #[test]
    fn test_harness_queues_rolls() {
        let mut harness = TestHarness::new();
        harness.rolls([15]);
        let result = harness.call(
            "perform_skill_check",
            json!({"actor": "Amiya", "skill": "perception", "dc": 12}),
        );
        assert_ok(&result);
        assert_eq!(result.metadata["total"], 17);
    }
}
