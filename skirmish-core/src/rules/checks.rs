//! Skill checks, saving throws and free-form dice rolls.

use super::{Effect, Resolution};
use crate::actor::{Ability, Skill};
use crate::dice::{roll_d20, Advantage, DiceExpression, DieSource, RollResult};
use crate::error::EngineError;
use crate::world::{World, WorldState};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// What a d20 check tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum CheckKind {
    Skill(Skill),
    Save(Ability),
    /// A raw ability check, never proficient.
    Ability(Ability),
}

impl CheckKind {
    /// Parse `perception`, `dex save`, `wisdom_save`, `save:CON` or a bare ability.
    pub fn parse(s: &str) -> Option<CheckKind> {
        let lowered = s.trim().to_lowercase();

        let save_of = lowered
            .strip_prefix("save:")
            .or_else(|| lowered.strip_suffix(" saving throw"))
            .or_else(|| lowered.strip_suffix(" save"))
            .or_else(|| lowered.strip_suffix("_save"));
        if let Some(ability) = save_of {
            return Ability::parse(ability).map(CheckKind::Save);
        }

        Skill::parse(&lowered)
            .map(CheckKind::Skill)
            .or_else(|| Ability::parse(&lowered).map(CheckKind::Ability))
    }

    pub fn ability(&self) -> Ability {
        match self {
            CheckKind::Skill(skill) => skill.ability(),
            CheckKind::Save(ability) | CheckKind::Ability(ability) => *ability,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Skill(skill) => write!(f, "{skill}"),
            CheckKind::Save(ability) => write!(f, "{} save", ability.name()),
            CheckKind::Ability(ability) => write!(f, "{} check", ability.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub actor: String,
    pub check: CheckKind,
    pub label: String,
    pub rolls: Vec<u32>,
    pub kept: u32,
    pub advantage: Advantage,
    pub modifier: i32,
    pub proficiency_bonus: i32,
    pub total: i32,
    pub difficulty: i32,
    pub success: bool,
    pub margin: i32,
}

pub fn resolve_check<D: DieSource + ?Sized>(
    state: &WorldState,
    dice: &mut D,
    actor: &str,
    skill_or_save: &str,
    difficulty: i32,
    advantage: Advantage,
) -> Result<Resolution<CheckOutcome>, EngineError> {
    let actor = state.actor(actor)?;
    let check = CheckKind::parse(skill_or_save)
        .ok_or_else(|| EngineError::UnknownSkill(skill_or_save.to_string()))?;

    let proficient = match check {
        CheckKind::Skill(skill) => actor.is_proficient_in(skill),
        CheckKind::Save(ability) => actor.is_proficient_save(ability),
        CheckKind::Ability(_) => false,
    };
    let modifier = actor.modifier(check.ability());
    let proficiency_bonus = if proficient {
        state.rules.proficiency_bonus
    } else {
        0
    };

    let roll = roll_d20(dice, advantage);
    let total = (roll.kept as i32)
        .saturating_add(modifier)
        .saturating_add(proficiency_bonus);
    let success = total >= difficulty;

    let outcome = CheckOutcome {
        actor: actor.name.clone(),
        check,
        label: check.to_string(),
        rolls: roll.rolls.clone(),
        kept: roll.kept,
        advantage,
        modifier,
        proficiency_bonus,
        total,
        difficulty,
        success,
        margin: total.saturating_sub(difficulty),
    };

    debug!(
        actor = %outcome.actor,
        check = %outcome.label,
        total,
        difficulty,
        success,
        "check resolved"
    );

    let verdict = if success { "success" } else { "failure" };
    Ok(Resolution::new(outcome)
        .with_effect(Effect::DiceRolled {
            purpose: check.to_string(),
            total,
        })
        .narrate(format!(
            "{} rolls {check}: {total} vs DC {difficulty}, {verdict}.",
            actor.name
        )))
}

pub fn resolve_roll<D: DieSource + ?Sized>(
    state: &WorldState,
    dice: &mut D,
    expression: &str,
    actor: Option<&str>,
    purpose: Option<&str>,
) -> Result<Resolution<RollResult>, EngineError> {
    let expr = DiceExpression::parse(expression)?;
    let result = match actor {
        Some(name) => expr.evaluate(dice, &state.actor(name)?.abilities),
        None => expr.evaluate(dice, &()),
    };
    let purpose = purpose.unwrap_or("roll").to_string();
    let line = format!("{purpose}: {result}");
    Ok(Resolution::new(result.clone())
        .with_effect(Effect::DiceRolled {
            purpose,
            total: result.total,
        })
        .narrate(line))
}

impl World {
    /// Roll a d20 skill check, saving throw or ability check against `difficulty`.
    pub fn check(
        &mut self,
        actor: &str,
        skill_or_save: &str,
        difficulty: i32,
        advantage: Advantage,
    ) -> Result<Resolution<CheckOutcome>, EngineError> {
        resolve_check(
            &self.state,
            self.dice.as_mut(),
            actor,
            skill_or_save,
            difficulty,
            advantage,
        )
    }

    /// Evaluate a dice expression; ability tokens use `actor`'s modifiers.
    pub fn roll_dice(
        &mut self,
        expression: &str,
        actor: Option<&str>,
        purpose: Option<&str>,
    ) -> Result<Resolution<RollResult>, EngineError> {
        resolve_roll(&self.state, self.dice.as_mut(), expression, actor, purpose)
    }
}
