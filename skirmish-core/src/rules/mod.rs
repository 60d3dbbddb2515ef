//! Intent resolution.
//!
//! Every operation is resolved in two phases. A resolver inspects an
//! immutable [`WorldState`], rolls whatever dice it needs and produces a
//! [`Resolution`]: a typed outcome plus the list of [`Effect`]s it implies.
//! Only a resolver that returned `Ok` has its effects applied, so a rejected
//! operation never leaves partial changes behind.

pub mod checks;
pub mod combat;
pub mod movement;
pub mod social;
pub mod time;

use crate::actor::{ActionKind, TurnState, Vitality};
use crate::clock::EventPayload;
use crate::objective::ObjectiveStatus;
use crate::position::GridPos;
use crate::world::WorldState;
use serde::{Deserialize, Serialize};

/// The outcome of a resolved operation, with the effects that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution<T> {
    pub outcome: T,
    pub effects: Vec<Effect>,
    pub narrative: Vec<String>,
}

impl<T> Resolution<T> {
    pub fn new(outcome: T) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
            narrative: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn narrate(mut self, line: impl Into<String>) -> Self {
        self.narrative.push(line.into());
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        Resolution {
            outcome: f(self.outcome),
            effects: self.effects,
            narrative: self.narrative,
        }
    }
}

/// A concrete state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Dice were rolled; no state change.
    DiceRolled { purpose: String, total: i32 },

    Moved {
        actor: String,
        from: GridPos,
        to: GridPos,
        steps: u32,
    },

    Placed {
        actor: String,
        position: Option<GridPos>,
    },

    HpChanged {
        target: String,
        amount: i32,
        new_current: i32,
        new_max: i32,
        dropped_to_zero: bool,
    },

    VitalityChanged { target: String, vitality: Vitality },

    ResourceSpent { actor: String, kind: ActionKind },

    TurnReset { actor: String },

    RelationSet {
        from: String,
        to: String,
        old: i32,
        new: i32,
        reason: String,
    },

    InventoryChanged {
        actor: String,
        item: String,
        new_count: u32,
    },

    GuardianSet { guardian: String, protectee: String },

    GuardianCleared { protectee: String },

    ObjectiveAdded { label: String },

    ObjectiveStatusChanged {
        label: String,
        status: ObjectiveStatus,
        note: Option<String>,
    },

    TensionChanged { tension: i32 },

    MarkAdded { text: String },

    SceneChanged { name: String, weather: Option<String> },

    EventScheduled {
        name: String,
        at_min: u32,
        seq: u64,
        payload: EventPayload,
    },

    RoundStarted { round: u32 },

    CombatChanged {
        in_combat: bool,
        round: u32,
        participants: Vec<String>,
    },
}

pub fn apply_effects(state: &mut WorldState, effects: &[Effect]) {
    for effect in effects {
        apply_effect(state, effect);
    }
}

/// Apply a single effect. Effects naming actors that no longer exist are ignored.
pub fn apply_effect(state: &mut WorldState, effect: &Effect) {
    match effect {
        Effect::DiceRolled { .. } => {}

        Effect::Moved {
            actor, to, steps, ..
        } => {
            if let Some(actor) = state.actors.get_mut(actor) {
                actor.position = Some(*to);
                actor.turn.steps_spent = actor.turn.steps_spent.saturating_add(*steps);
            }
        }

        Effect::Placed { actor, position } => {
            if let Some(actor) = state.actors.get_mut(actor) {
                actor.position = *position;
            }
        }

        Effect::HpChanged {
            target,
            new_current,
            new_max,
            ..
        } => {
            if let Some(actor) = state.actors.get_mut(target) {
                actor.hit_points.maximum = *new_max;
                actor.hit_points.current = (*new_current).clamp(0, *new_max);
            }
        }

        Effect::VitalityChanged { target, vitality } => {
            if let Some(actor) = state.actors.get_mut(target) {
                actor.vitality = *vitality;
            }
        }

        Effect::ResourceSpent { actor, kind } => {
            if let Some(actor) = state.actors.get_mut(actor) {
                actor.turn.spend(*kind);
            }
        }

        Effect::TurnReset { actor } => {
            if let Some(actor) = state.actors.get_mut(actor) {
                actor.turn = TurnState::fresh();
            }
        }

        Effect::RelationSet {
            from,
            to,
            new,
            reason,
            ..
        } => {
            state.relations.set(from, to, *new, reason);
        }

        Effect::InventoryChanged {
            actor,
            item,
            new_count,
        } => {
            if let Some(actor) = state.actors.get_mut(actor) {
                if *new_count == 0 {
                    actor.inventory.remove(item);
                } else {
                    actor.inventory.insert(item.clone(), *new_count);
                }
            }
        }

        Effect::GuardianSet {
            guardian,
            protectee,
        } => {
            state.guardians.set(guardian, protectee);
        }

        Effect::GuardianCleared { protectee } => {
            state.guardians.remove(protectee);
        }

        Effect::ObjectiveAdded { label } => {
            state.objectives.add(label);
        }

        Effect::ObjectiveStatusChanged {
            label,
            status,
            note,
        } => {
            // Transitions were checked during resolution.
            let _ = state.objectives.set_status(label, *status, note.clone());
        }

        Effect::TensionChanged { tension } => state.mood.set_tension(*tension),

        Effect::MarkAdded { text } => state.mood.add_mark(text.clone()),

        Effect::SceneChanged { name, weather } => {
            state.scene.name = name.clone();
            state.scene.weather = weather.clone();
        }

        Effect::EventScheduled {
            name,
            at_min,
            payload,
            ..
        } => {
            state.clock.schedule(name, *at_min, payload.clone());
        }

        Effect::RoundStarted { round } => state.combat.round = *round,

        Effect::CombatChanged {
            in_combat,
            round,
            participants,
        } => {
            state.combat.in_combat = *in_combat;
            state.combat.round = *round;
            state.combat.participants = participants.clone();
        }
    }
}
