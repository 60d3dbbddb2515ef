//! Engine error types.

use crate::actor::ActionKind;
use crate::dice::DiceError;
use thiserror::Error;

/// A rejected operation. The world is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Unknown actor: {0}")]
    UnknownActor(String),

    #[error("{0} is down and cannot act")]
    ActorDown(String),

    #[error("{0} is dead")]
    ActorDead(String),

    #[error("{0} is not on the field")]
    NotPositioned(String),

    #[error("{actor} does not hold {weapon}")]
    WeaponNotHeld { actor: String, weapon: String },

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("{defender} is out of range of {attacker} ({distance} steps, reach {reach})")]
    OutOfRange {
        attacker: String,
        defender: String,
        distance: u32,
        reach: u32,
    },

    #[error("{0} has no movement left this round")]
    NoMovementLeft(String),

    #[error("Unknown skill or save: {0}")]
    UnknownSkill(String),

    #[error("Unknown objective: {0}")]
    UnknownObjective(String),

    #[error("Objective is already done: {0}")]
    ObjectiveClosed(String),

    #[error("{actor} holds {held} {item}, needs {needed}")]
    InsufficientItems {
        actor: String,
        item: String,
        held: u32,
        needed: u32,
    },

    #[error("{actor} has already used their {kind} this round")]
    ActionUnavailable { actor: String, kind: ActionKind },

    #[error("Malformed dice expression: {0}")]
    MalformedExpression(#[from] DiceError),

    #[error("More than {limit} events fired in one time advance")]
    EventBudgetExceeded { limit: usize },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// Stable code reported as `error_reason` in tool results.
    pub fn reason(&self) -> &'static str {
        match self {
            EngineError::UnknownActor(_) => "UnknownActor",
            EngineError::ActorDown(_) => "ActorDown",
            EngineError::ActorDead(_) => "ActorDead",
            EngineError::NotPositioned(_) => "NotPositioned",
            EngineError::WeaponNotHeld { .. } => "WeaponNotHeld",
            EngineError::UnknownItem(_) => "UnknownItem",
            EngineError::OutOfRange { .. } => "OutOfRange",
            EngineError::NoMovementLeft(_) => "NoMovementLeft",
            EngineError::UnknownSkill(_) => "UnknownSkill",
            EngineError::UnknownObjective(_) => "UnknownObjective",
            EngineError::ObjectiveClosed(_) => "ObjectiveClosed",
            EngineError::InsufficientItems { .. } => "InsufficientItems",
            EngineError::ActionUnavailable { .. } => "ActionUnavailable",
            EngineError::MalformedExpression(_) => "MalformedExpression",
            EngineError::EventBudgetExceeded { .. } => "EventBudgetExceeded",
            EngineError::UnknownTool(_) => "UnknownTool",
            EngineError::InvalidArgument(_) => "InvalidArgument",
        }
    }

    /// Snake-case variant of [`reason`](Self::reason), e.g. `weapon_not_held`.
    pub fn error_type(&self) -> String {
        let mut out = String::new();
        for (i, c) in self.reason().chars().enumerate() {
            if c.is_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        let err = EngineError::WeaponNotHeld {
            actor: "A".into(),
            weapon: "w".into(),
        };
        assert_eq!(err.reason(), "WeaponNotHeld");
        assert_eq!(err.error_type(), "weapon_not_held");
        assert_eq!(err.to_string(), "A does not hold w");
    }

    #[test]
    fn test_dice_error_converts() {
        let err: EngineError = DiceError::NoDice.into();
        assert_eq!(err.reason(), "MalformedExpression");
    }
}
