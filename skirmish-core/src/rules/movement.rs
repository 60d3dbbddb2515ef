//! Movement along the grid.
//!
//! Actors move in straight Chebyshev steps toward a target cell, spending
//! their per-round budget of `move_speed` steps. There is no pathfinding and
//! no collision.

use super::{Effect, Resolution};
use crate::error::EngineError;
use crate::position::GridPos;
use crate::world::{World, WorldState};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub actor: String,
    pub from: GridPos,
    pub to: GridPos,
    pub target: GridPos,
    pub steps_taken: u32,
    pub steps_left: u32,
    pub distance_remaining: u32,
}

impl MoveOutcome {
    pub fn arrived(&self) -> bool {
        self.distance_remaining == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOutcome {
    pub actor: String,
    pub position: Option<GridPos>,
}

pub fn resolve_advance_position(
    state: &WorldState,
    actor: &str,
    target: GridPos,
    requested_steps: Option<u32>,
) -> Result<Resolution<MoveOutcome>, EngineError> {
    let actor = state.actor(actor)?;
    if actor.is_dead() {
        return Err(EngineError::ActorDead(actor.name.clone()));
    }
    if !actor.is_up() {
        return Err(EngineError::ActorDown(actor.name.clone()));
    }
    let from = actor
        .position
        .ok_or_else(|| EngineError::NotPositioned(actor.name.clone()))?;

    let remaining = actor.steps_left();
    let distance = from.distance(target);

    if distance == 0 {
        return Ok(Resolution::new(MoveOutcome {
            actor: actor.name.clone(),
            from,
            to: from,
            target,
            steps_taken: 0,
            steps_left: remaining,
            distance_remaining: 0,
        })
        .narrate(format!("{} is already at {target}.", actor.name)));
    }
    if remaining == 0 {
        return Err(EngineError::NoMovementLeft(actor.name.clone()));
    }

    let steps = requested_steps.unwrap_or(u32::MAX).min(remaining).min(distance);
    let to = from.step_toward(target, steps);
    let outcome = MoveOutcome {
        actor: actor.name.clone(),
        from,
        to,
        target,
        steps_taken: steps,
        steps_left: remaining - steps,
        distance_remaining: to.distance(target),
    };

    let narrative = if outcome.arrived() {
        format!("{} moves {steps} steps to {to}.", actor.name)
    } else {
        format!(
            "{} moves {steps} steps to {to}, {} short of {target}.",
            actor.name, outcome.distance_remaining
        )
    };

    let mut resolution = Resolution::new(outcome).narrate(narrative);
    if steps > 0 {
        resolution = resolution.with_effect(Effect::Moved {
            actor: actor.name.clone(),
            from,
            to,
            steps,
        });
    }
    Ok(resolution)
}

pub fn resolve_set_position(
    state: &WorldState,
    actor: &str,
    position: Option<GridPos>,
) -> Result<Resolution<PlaceOutcome>, EngineError> {
    let actor = state.actor(actor)?;
    let narrative = match position {
        Some(pos) => format!("{} is placed at {pos}.", actor.name),
        None => format!("{} leaves the field.", actor.name),
    };
    Ok(Resolution::new(PlaceOutcome {
        actor: actor.name.clone(),
        position,
    })
    .with_effect(Effect::Placed {
        actor: actor.name.clone(),
        position,
    })
    .narrate(narrative))
}

impl World {
    /// Move toward `target`, spending at most `requested_steps` of the round's budget.
    pub fn advance_position(
        &mut self,
        actor: &str,
        target: GridPos,
        requested_steps: Option<u32>,
    ) -> Result<Resolution<MoveOutcome>, EngineError> {
        let resolution = resolve_advance_position(&self.state, actor, target, requested_steps)?;
        debug!(
            actor,
            to = %resolution.outcome.to,
            steps = resolution.outcome.steps_taken,
            "position advanced"
        );
        Ok(self.commit(resolution))
    }

    /// Place an actor without spending movement; `None` takes them off the field.
    pub fn set_position(
        &mut self,
        actor: &str,
        position: Option<GridPos>,
    ) -> Result<Resolution<PlaceOutcome>, EngineError> {
        let resolution = resolve_set_position(&self.state, actor, position)?;
        Ok(self.commit(resolution))
    }

    pub fn get_position(&self, actor: &str) -> Result<Option<GridPos>, EngineError> {
        self.state.position_of(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActorConfig, WorldConfig};

    fn walker(speed: u32) -> World {
        let config = WorldConfig::new()
            .with_actor(ActorConfig::new("Amiya", 10, 12).at(0, 0).with_move_speed(speed))
            .with_actor(ActorConfig::new("Ghost", 10, 12));
        World::new(config).unwrap()
    }

    #[test]
    fn test_move_capped_by_budget() {
        let mut world = walker(4);
        let result = world.advance_position("Amiya", GridPos::new(10, 2), None).unwrap();
        assert_eq!(result.outcome.steps_taken, 4);
        assert_eq!(result.outcome.to, GridPos::new(4, 2));
        assert_eq!(result.outcome.steps_left, 0);
        assert_eq!(world.actor("Amiya").unwrap().turn.steps_spent, 4);

        let err = world
            .advance_position("Amiya", GridPos::new(10, 2), None)
            .unwrap_err();
        assert_eq!(err, EngineError::NoMovementLeft("Amiya".into()));
    }

    #[test]
    fn test_requested_steps_respected() {
        let mut world = walker(6);
        let result = world
            .advance_position("Amiya", GridPos::new(5, 0), Some(2))
            .unwrap();
        assert_eq!(result.outcome.to, GridPos::new(2, 0));
        assert_eq!(result.outcome.distance_remaining, 3);
        assert!(!result.outcome.arrived());
    }

    #[test]
    fn test_move_to_own_cell_is_noop_even_without_budget() {
        let mut world = walker(0);
        let result = world.advance_position("Amiya", GridPos::new(0, 0), None).unwrap();
        assert!(result.effects.is_empty());
        assert!(result.outcome.arrived());
    }

    #[test]
    fn test_round_resets_budget() {
        let mut world = walker(3);
        world.advance_position("Amiya", GridPos::new(3, 0), None).unwrap();
        world.begin_round();
        let result = world.advance_position("Amiya", GridPos::new(6, 0), None).unwrap();
        assert_eq!(result.outcome.steps_taken, 3);
    }

    #[test]
    fn test_off_field_actor() {
        let mut world = walker(6);
        assert_eq!(world.get_position("Ghost").unwrap(), None);
        let err = world.advance_position("Ghost", GridPos::new(1, 1), None).unwrap_err();
        assert_eq!(err.reason(), "NotPositioned");

        world.set_position("Ghost", Some(GridPos::new(5, 5))).unwrap();
        assert_eq!(world.get_position("Ghost").unwrap(), Some(GridPos::new(5, 5)));
        assert_eq!(world.actor("Ghost").unwrap().turn.steps_spent, 0);
    }
}
