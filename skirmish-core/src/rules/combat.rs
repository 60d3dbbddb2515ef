//! Attacks, damage, healing and round boundaries.

use super::movement::MoveOutcome;
use super::{Effect, Resolution};
use crate::actor::{ActionKind, Actor, Vitality};
use crate::catalog::WeaponDef;
use crate::config::RulesConfig;
use crate::dice::{roll_d20, Advantage, D20Roll, DieSource, RollResult};
use crate::error::EngineError;
use crate::position::GridPos;
use crate::world::{World, WorldState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A guardian stepping in front of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interception {
    pub guardian: String,
    pub protectee: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker: String,
    /// Who actually took the attack.
    pub defender: String,
    /// Who the attacker aimed at.
    pub intended_defender: String,
    pub weapon_id: String,
    pub guard: Option<Interception>,
    pub attack_roll: D20Roll,
    pub attack_modifier: i32,
    pub proficiency_bonus: i32,
    pub attack_total: i32,
    pub target_ac: i32,
    pub hit: bool,
    pub critical: bool,
    pub damage: Option<RollResult>,
    pub damage_total: i32,
    pub hp_before: i32,
    pub hp_after: i32,
    pub vitality: Vitality,
    pub distance: u32,
    pub reach: u32,
    pub reach_ok: bool,
    pub in_combat: bool,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngageOutcome {
    pub movement: Option<MoveOutcome>,
    pub attack: AttackOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpOutcome {
    pub target: String,
    /// Damage dealt (negative) or healing received (positive).
    pub change: i32,
    pub hp_before: i32,
    pub hp_after: i32,
    pub max_hp: i32,
    pub vitality: Vitality,
    pub dying_turns_left: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub actor: String,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub in_combat: bool,
    pub participants: Vec<String>,
    /// Actors whose dying countdown ran out this round.
    pub deaths: Vec<String>,
}

// ============================================================================
// Combat flags
// ============================================================================

fn on_field_and_up(actor: &Actor) -> bool {
    actor.position.is_some() && actor.hit_points.current > 0 && !actor.is_dead()
}

/// Whether any hostile actor is still standing on the field.
pub fn hostiles_present(state: &WorldState) -> bool {
    let threshold = state.rules.hostility_threshold;
    let standing: Vec<&Actor> = state.actors().filter(|a| on_field_and_up(a)).collect();
    standing.iter().any(|actor| {
        actor.hostile
            || standing.iter().any(|other| {
                other.name != actor.name
                    && state
                        .relations
                        .hostile_between(&actor.name, &other.name, threshold)
            })
    })
}

/// Default participant order: standing, positioned actors in roster order.
pub fn default_participants(state: &WorldState) -> Vec<String> {
    state
        .actors()
        .filter(|a| on_field_and_up(a))
        .map(|a| a.name.clone())
        .collect()
}

/// The combat flag change implied by the current state, if any.
pub fn combat_flags(state: &WorldState) -> Option<Effect> {
    let current = &state.combat;
    let in_combat = hostiles_present(state);

    let (round, participants) = if in_combat {
        let participants = if current.participants.is_empty() {
            default_participants(state)
        } else {
            current.participants.clone()
        };
        (current.round.max(1), participants)
    } else {
        (0, Vec::new())
    };

    if in_combat == current.in_combat
        && round == current.round
        && participants == current.participants
    {
        return None;
    }
    Some(Effect::CombatChanged {
        in_combat,
        round,
        participants,
    })
}

// ============================================================================
// Damage
// ============================================================================

/// Effects of `amount` damage landing on `target`.
///
/// A dying target loses a turn of its countdown per hit, two on a critical.
pub fn damage_effects(
    target: &Actor,
    amount: i32,
    critical: bool,
    rules: &RulesConfig,
) -> (Vec<Effect>, HpOutcome) {
    let mut hp = target.hit_points;
    let before = hp.current;
    let result = hp.take_damage(amount);

    let mut effects = vec![Effect::HpChanged {
        target: target.name.clone(),
        amount: -result.damage_taken,
        new_current: hp.current,
        new_max: hp.maximum,
        dropped_to_zero: result.dropped_to_zero,
    }];

    let vitality = match target.vitality {
        Vitality::Up if hp.current == 0 => {
            if rules.dying_turns == 0 {
                Vitality::Dead
            } else {
                Vitality::Dying {
                    turns_left: rules.dying_turns,
                }
            }
        }
        Vitality::Dying { turns_left } if amount > 0 => {
            let loss = if critical { 2 } else { 1 };
            match turns_left.saturating_sub(loss) {
                0 => Vitality::Dead,
                left => Vitality::Dying { turns_left: left },
            }
        }
        unchanged => unchanged,
    };

    if vitality != target.vitality {
        effects.push(Effect::VitalityChanged {
            target: target.name.clone(),
            vitality,
        });
    }

    let outcome = HpOutcome {
        target: target.name.clone(),
        change: -result.damage_taken,
        hp_before: before,
        hp_after: hp.current,
        max_hp: hp.maximum,
        vitality,
        dying_turns_left: vitality.dying_turns_left(),
    };
    (effects, outcome)
}

fn hp_narrative(outcome: &HpOutcome) -> String {
    match outcome.vitality {
        Vitality::Dead => format!("{} is dead.", outcome.target),
        Vitality::Dying { turns_left } => {
            format!("{} is down and dying ({turns_left} rounds left).", outcome.target)
        }
        Vitality::Up => {
            let ratio = outcome.hp_after as f32 / outcome.max_hp.max(1) as f32;
            let status = if ratio <= 0.25 {
                " and is critically wounded"
            } else if ratio <= 0.5 {
                " and is bloodied"
            } else {
                ""
            };
            format!(
                "{} has {}/{} HP{status}.",
                outcome.target, outcome.hp_after, outcome.max_hp
            )
        }
    }
}

// ============================================================================
// Attacks
// ============================================================================

/// Everything checked before an attack roll, except range.
struct AttackPlan<'a> {
    attacker: &'a Actor,
    attacker_pos: GridPos,
    defender: &'a Actor,
    defender_pos: GridPos,
    weapon: &'a WeaponDef,
}

fn plan_attack<'a>(
    state: &'a WorldState,
    attacker: &str,
    defender: &str,
    weapon_id: &str,
) -> Result<AttackPlan<'a>, EngineError> {
    let attacker = state.actor(attacker)?;
    let defender = state.actor(defender)?;

    if attacker.is_dead() {
        return Err(EngineError::ActorDead(attacker.name.clone()));
    }
    if !attacker.is_up() {
        return Err(EngineError::ActorDown(attacker.name.clone()));
    }
    if defender.is_dead() {
        return Err(EngineError::ActorDead(defender.name.clone()));
    }
    if attacker.name == defender.name {
        return Err(EngineError::InvalidArgument(format!(
            "{} cannot attack themselves",
            attacker.name
        )));
    }

    let attacker_pos = attacker
        .position
        .ok_or_else(|| EngineError::NotPositioned(attacker.name.clone()))?;
    let defender_pos = defender
        .position
        .ok_or_else(|| EngineError::NotPositioned(defender.name.clone()))?;

    if !attacker.holds(weapon_id) {
        return Err(EngineError::WeaponNotHeld {
            actor: attacker.name.clone(),
            weapon: weapon_id.to_string(),
        });
    }
    let weapon = state
        .catalog
        .get(weapon_id)
        .ok_or_else(|| EngineError::UnknownItem(weapon_id.to_string()))?;

    Ok(AttackPlan {
        attacker,
        attacker_pos,
        defender,
        defender_pos,
        weapon,
    })
}

/// The guardian who takes the attack instead of `defender`, if any.
fn interceptor<'a>(
    state: &'a WorldState,
    attacker: &Actor,
    attacker_pos: GridPos,
    defender: &Actor,
    defender_pos: GridPos,
    reach: u32,
) -> Option<(&'a Actor, GridPos)> {
    let name = state.guardians.guardian_of(&defender.name)?;
    if name == defender.name || name == attacker.name {
        return None;
    }
    let guardian = state.find_actor(name)?;
    let guardian_pos = guardian.position?;
    let eligible = guardian.is_up()
        && guardian.turn.reaction_available
        && guardian_pos.distance(defender_pos) <= 1
        && attacker_pos.distance(guardian_pos) <= reach;
    eligible.then_some((guardian, guardian_pos))
}

/// Roll an attack from `from` against the planned defender.
fn strike<D: DieSource + ?Sized>(
    state: &WorldState,
    dice: &mut D,
    plan: &AttackPlan<'_>,
    from: GridPos,
    advantage: Advantage,
) -> Resolution<AttackOutcome> {
    let attacker = plan.attacker;
    let weapon = plan.weapon;
    let mut effects = Vec::new();
    let mut narrative = Vec::new();

    let (target, target_pos, guard) =
        match interceptor(state, attacker, from, plan.defender, plan.defender_pos, weapon.reach) {
            Some((guardian, pos)) => {
                effects.push(Effect::ResourceSpent {
                    actor: guardian.name.clone(),
                    kind: ActionKind::Reaction,
                });
                narrative.push(format!(
                    "{} steps in front of {} and takes the attack!",
                    guardian.name, plan.defender.name
                ));
                let guard = Interception {
                    guardian: guardian.name.clone(),
                    protectee: plan.defender.name.clone(),
                };
                (guardian, pos, Some(guard))
            }
            None => (plan.defender, plan.defender_pos, None),
        };

    let roll = roll_d20(dice, advantage);
    let attack_modifier = attacker.modifier(weapon.ability);
    let proficiency_bonus = if weapon.is_proficient(attacker) {
        state.rules.proficiency_bonus
    } else {
        0
    };
    let attack_total = roll.kept as i32 + attack_modifier + proficiency_bonus;
    let critical = roll.natural_20();
    let hit = critical || (!roll.natural_1() && attack_total >= target.armor_class);

    effects.push(Effect::DiceRolled {
        purpose: format!("attack roll ({})", weapon.id),
        total: attack_total,
    });

    narrative.push(format!(
        "{} attacks {} with {} (roll: {} vs AC {})",
        attacker.name, target.name, weapon.label, attack_total, target.armor_class
    ));

    let hp_before = target.hit_points.current;
    let mut outcome = AttackOutcome {
        attacker: attacker.name.clone(),
        defender: target.name.clone(),
        intended_defender: plan.defender.name.clone(),
        weapon_id: weapon.id.clone(),
        guard,
        attack_roll: roll.clone(),
        attack_modifier,
        proficiency_bonus,
        attack_total,
        target_ac: target.armor_class,
        hit,
        critical,
        damage: None,
        damage_total: 0,
        hp_before,
        hp_after: hp_before,
        vitality: target.vitality,
        distance: from.distance(target_pos),
        reach: weapon.reach,
        reach_ok: true,
        in_combat: state.combat.in_combat,
        round: state.combat.round,
    };

    if hit {
        let damage = if critical {
            weapon.damage.evaluate_critical(dice, &attacker.abilities)
        } else {
            weapon.damage.evaluate(dice, &attacker.abilities)
        };
        let amount = damage.total.max(0);
        effects.push(Effect::DiceRolled {
            purpose: format!("damage ({})", weapon.id),
            total: amount,
        });

        let (hp_effects, hp) = damage_effects(target, amount, critical, &state.rules);
        effects.extend(hp_effects);

        if critical {
            narrative.push(format!("Critical hit! {amount} damage ({damage})."));
        } else {
            narrative.push(format!("Hit! {amount} damage ({damage})."));
        }
        narrative.push(hp_narrative(&hp));

        outcome.damage = Some(damage);
        outcome.damage_total = amount;
        outcome.hp_after = hp.hp_after;
        outcome.vitality = hp.vitality;
    } else if roll.natural_1() {
        narrative.push("Natural 1, the attack goes wide.".to_string());
    } else {
        narrative.push("Miss!".to_string());
    }

    debug!(
        attacker = %outcome.attacker,
        defender = %outcome.defender,
        weapon = %outcome.weapon_id,
        hit = outcome.hit,
        damage = outcome.damage_total,
        hp_before = outcome.hp_before,
        hp_after = outcome.hp_after,
        "attack resolved"
    );

    Resolution {
        outcome,
        effects,
        narrative,
    }
}

pub fn resolve_attack<D: DieSource + ?Sized>(
    state: &WorldState,
    dice: &mut D,
    attacker: &str,
    defender: &str,
    weapon_id: &str,
    advantage: Advantage,
) -> Result<Resolution<AttackOutcome>, EngineError> {
    let plan = plan_attack(state, attacker, defender, weapon_id)?;
    let distance = plan.attacker_pos.distance(plan.defender_pos);
    if distance > plan.weapon.reach {
        return Err(EngineError::OutOfRange {
            attacker: plan.attacker.name.clone(),
            defender: plan.defender.name.clone(),
            distance,
            reach: plan.weapon.reach,
        });
    }
    Ok(strike(state, dice, &plan, plan.attacker_pos, advantage))
}

/// Close to weapon reach with the remaining movement, then attack.
pub fn resolve_auto_engage<D: DieSource + ?Sized>(
    state: &WorldState,
    dice: &mut D,
    attacker: &str,
    defender: &str,
    weapon_id: &str,
    advantage: Advantage,
) -> Result<Resolution<EngageOutcome>, EngineError> {
    let plan = plan_attack(state, attacker, defender, weapon_id)?;
    let distance = plan.attacker_pos.distance(plan.defender_pos);
    let reach = plan.weapon.reach;

    if distance <= reach {
        return Ok(strike(state, dice, &plan, plan.attacker_pos, advantage)
            .map(|attack| EngageOutcome {
                movement: None,
                attack,
            }));
    }

    let needed = distance - reach;
    let budget = plan.attacker.steps_left();
    if needed > budget {
        return Err(EngineError::OutOfRange {
            attacker: plan.attacker.name.clone(),
            defender: plan.defender.name.clone(),
            distance,
            reach,
        });
    }

    let from = plan.attacker_pos;
    let to = from.step_toward(plan.defender_pos, needed);
    let movement = MoveOutcome {
        actor: plan.attacker.name.clone(),
        from,
        to,
        target: plan.defender_pos,
        steps_taken: needed,
        steps_left: budget - needed,
        distance_remaining: to.distance(plan.defender_pos),
    };
    let moved = Effect::Moved {
        actor: plan.attacker.name.clone(),
        from,
        to,
        steps: needed,
    };

    let attack = strike(state, dice, &plan, to, advantage);
    let mut narrative = vec![format!(
        "{} closes {needed} steps on {}.",
        plan.attacker.name, plan.defender.name
    )];
    narrative.extend(attack.narrative.iter().cloned());

    let mut effects = vec![moved];
    effects.extend(attack.effects.iter().cloned());

    Ok(Resolution {
        outcome: EngageOutcome {
            movement: Some(movement),
            attack: attack.outcome,
        },
        effects,
        narrative,
    })
}

pub fn resolve_damage(
    state: &WorldState,
    target: &str,
    amount: i32,
    source: &str,
) -> Result<Resolution<HpOutcome>, EngineError> {
    if amount <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "damage must be positive, got {amount}"
        )));
    }
    let actor = state.actor(target)?;
    if actor.is_dead() {
        return Err(EngineError::ActorDead(actor.name.clone()));
    }

    let (effects, outcome) = damage_effects(actor, amount, false, &state.rules);
    let mut narrative = vec![format!("{} takes {amount} damage from {source}.", actor.name)];
    narrative.push(hp_narrative(&outcome));
    Ok(Resolution {
        outcome,
        effects,
        narrative,
    })
}

pub fn resolve_heal(
    state: &WorldState,
    target: &str,
    amount: i32,
    source: &str,
) -> Result<Resolution<HpOutcome>, EngineError> {
    if amount <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "healing must be positive, got {amount}"
        )));
    }
    let actor = state.actor(target)?;
    if actor.is_dead() {
        return Err(EngineError::ActorDead(actor.name.clone()));
    }

    let mut hp = actor.hit_points;
    let before = hp.current;
    let healed = hp.heal(amount);

    let mut effects = vec![Effect::HpChanged {
        target: actor.name.clone(),
        amount: healed,
        new_current: hp.current,
        new_max: hp.maximum,
        dropped_to_zero: false,
    }];

    let vitality = if actor.is_dying() && hp.current > 0 {
        effects.push(Effect::VitalityChanged {
            target: actor.name.clone(),
            vitality: Vitality::Up,
        });
        Vitality::Up
    } else {
        actor.vitality
    };

    let outcome = HpOutcome {
        target: actor.name.clone(),
        change: healed,
        hp_before: before,
        hp_after: hp.current,
        max_hp: hp.maximum,
        vitality,
        dying_turns_left: vitality.dying_turns_left(),
    };
    let mut narrative = vec![format!("{} regains {healed} HP from {source}.", actor.name)];
    narrative.push(hp_narrative(&outcome));
    Ok(Resolution {
        outcome,
        effects,
        narrative,
    })
}

// ============================================================================
// Turn resources and rounds
// ============================================================================

pub fn resolve_use_action(
    state: &WorldState,
    actor: &str,
    kind: ActionKind,
) -> Result<Resolution<ActionOutcome>, EngineError> {
    let actor = state.actor(actor)?;
    if actor.is_dead() {
        return Err(EngineError::ActorDead(actor.name.clone()));
    }
    if !actor.is_up() {
        return Err(EngineError::ActorDown(actor.name.clone()));
    }
    if !actor.turn.available(kind) {
        return Err(EngineError::ActionUnavailable {
            actor: actor.name.clone(),
            kind,
        });
    }
    Ok(Resolution::new(ActionOutcome {
        actor: actor.name.clone(),
        kind,
    })
    .with_effect(Effect::ResourceSpent {
        actor: actor.name.clone(),
        kind,
    })
    .narrate(format!("{} uses their {kind}.", actor.name)))
}

/// Start the next round: reset every actor's turn and tick dying countdowns.
pub fn resolve_begin_round(state: &WorldState) -> Resolution<Vec<String>> {
    let round = state.combat.round + 1;
    let mut effects = vec![Effect::RoundStarted { round }];
    let mut deaths = Vec::new();
    let mut narrative = vec![format!("Round {round} begins.")];

    for actor in state.actors() {
        effects.push(Effect::TurnReset {
            actor: actor.name.clone(),
        });
        if let Vitality::Dying { turns_left } = actor.vitality {
            let vitality = match turns_left.saturating_sub(1) {
                0 => {
                    deaths.push(actor.name.clone());
                    narrative.push(format!("{} succumbs to their wounds.", actor.name));
                    Vitality::Dead
                }
                left => Vitality::Dying { turns_left: left },
            };
            effects.push(Effect::VitalityChanged {
                target: actor.name.clone(),
                vitality,
            });
        }
    }

    Resolution {
        outcome: deaths,
        effects,
        narrative,
    }
}

pub fn resolve_start_combat(
    state: &WorldState,
    participants: Option<Vec<String>>,
) -> Result<Resolution<Vec<String>>, EngineError> {
    let participants = match participants {
        Some(names) => {
            for name in &names {
                state.actor(name)?;
            }
            names
        }
        None => default_participants(state),
    };

    let mut effects: Vec<Effect> = state
        .actors()
        .map(|a| Effect::TurnReset {
            actor: a.name.clone(),
        })
        .collect();
    effects.push(Effect::CombatChanged {
        in_combat: state.combat.in_combat,
        round: 1,
        participants: participants.clone(),
    });

    let narrative = vec![format!("Combat begins: {}.", participants.join(", "))];
    Ok(Resolution {
        outcome: participants,
        effects,
        narrative,
    })
}

// ============================================================================
// World operations
// ============================================================================

impl World {
    /// Attack `defender` with a held weapon.
    pub fn perform_attack(
        &mut self,
        attacker: &str,
        defender: &str,
        weapon_id: &str,
        advantage: Advantage,
    ) -> Result<Resolution<AttackOutcome>, EngineError> {
        let resolution = resolve_attack(
            &self.state,
            self.dice.as_mut(),
            attacker,
            defender,
            weapon_id,
            advantage,
        )?;
        Ok(self.commit(resolution))
    }

    /// Move into reach if the movement budget allows, then attack.
    pub fn auto_engage(
        &mut self,
        attacker: &str,
        defender: &str,
        weapon_id: &str,
        advantage: Advantage,
    ) -> Result<Resolution<EngageOutcome>, EngineError> {
        let resolution = resolve_auto_engage(
            &self.state,
            self.dice.as_mut(),
            attacker,
            defender,
            weapon_id,
            advantage,
        )?;
        Ok(self.commit(resolution))
    }

    pub fn apply_damage(
        &mut self,
        target: &str,
        amount: i32,
        source: &str,
    ) -> Result<Resolution<HpOutcome>, EngineError> {
        let resolution = resolve_damage(&self.state, target, amount, source)?;
        debug!(target, amount, source, "damage applied");
        Ok(self.commit(resolution))
    }

    pub fn heal(
        &mut self,
        target: &str,
        amount: i32,
        source: &str,
    ) -> Result<Resolution<HpOutcome>, EngineError> {
        let resolution = resolve_heal(&self.state, target, amount, source)?;
        debug!(target, amount, source, "healing applied");
        Ok(self.commit(resolution))
    }

    /// Spend an action, bonus action or reaction.
    pub fn use_action(
        &mut self,
        actor: &str,
        kind: ActionKind,
    ) -> Result<Resolution<ActionOutcome>, EngineError> {
        let resolution = resolve_use_action(&self.state, actor, kind)?;
        Ok(self.commit(resolution))
    }

    /// Reset one actor's turn resources at the start of their turn.
    pub fn reset_actor_turn(&mut self, actor: &str) -> Result<Resolution<RoundOutcome>, EngineError> {
        let actor = self.state.actor(actor)?.name.clone();
        let resolution = Resolution::new(())
            .with_effect(Effect::TurnReset {
                actor: actor.clone(),
            })
            .narrate(format!("{actor}'s turn."));
        let resolution = self.commit(resolution);
        Ok(self.close_boundary(resolution, Vec::new()))
    }

    pub fn begin_round(&mut self) -> Resolution<RoundOutcome> {
        let resolution = self.commit(resolve_begin_round(&self.state));
        info!(round = self.state.combat.round, "round started");
        let deaths = resolution.outcome.clone();
        self.close_boundary(resolution.map(|_| ()), deaths)
    }

    /// Set the participant order and start at round 1.
    pub fn start_combat(
        &mut self,
        participants: Option<Vec<String>>,
    ) -> Result<Resolution<RoundOutcome>, EngineError> {
        let resolution = resolve_start_combat(&self.state, participants)?;
        let resolution = self.commit(resolution).map(|_| ());
        Ok(self.close_boundary(resolution, Vec::new()))
    }

    /// Recompute combat flags at a turn boundary and report them.
    fn close_boundary(
        &mut self,
        mut resolution: Resolution<()>,
        deaths: Vec<String>,
    ) -> Resolution<RoundOutcome> {
        if let Some(effect) = self.refresh_combat() {
            if !self.state.combat.in_combat {
                resolution.narrative.push("No hostiles remain standing; combat ends.".to_string());
            }
            resolution.effects.push(effect);
        }
        let combat = &self.state.combat;
        let outcome = RoundOutcome {
            round: combat.round,
            in_combat: combat.in_combat,
            participants: combat.participants.clone(),
            deaths,
        };
        resolution.map(|_| outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActorConfig, WeaponConfig, WorldConfig};
    use crate::testing::ScriptedDice;

    fn duel(rolls: impl IntoIterator<Item = u32>) -> World {
        let config = WorldConfig::new()
            .with_actor(
                ActorConfig::new("Brann", 20, 16)
                    .with_abilities(crate::actor::AbilityScores::new(16, 10, 14, 10, 10, 10))
                    .at(0, 0)
                    .with_item("longsword", 1)
                    .with_weapon_proficiency("martial"),
            )
            .with_actor(ActorConfig::new("Wolf", 11, 13).hostile().at(1, 0).with_item("bite", 1))
            .with_weapon(WeaponConfig::new("longsword", 1, "STR", "1d8+STR").with_class("martial"))
            .with_weapon(WeaponConfig::new("bite", 1, "STR", "2d4+STR").proficient_by_default());
        World::new(config).unwrap().with_dice(ScriptedDice::new(rolls))
    }

    #[test]
    fn test_attack_hits_and_deals_damage() {
        // d20 = 12, +3 STR +2 proficiency = 17 vs AC 13; damage 1d8 = 5 +3
        let mut world = duel([12, 5]);
        let result = world
            .perform_attack("Brann", "Wolf", "longsword", Advantage::Normal)
            .unwrap();
        let attack = &result.outcome;
        assert!(attack.hit);
        assert_eq!(attack.attack_total, 17);
        assert_eq!(attack.proficiency_bonus, 2);
        assert_eq!(attack.damage_total, 8);
        assert_eq!(attack.hp_after, 3);
        assert_eq!(world.actor("Wolf").unwrap().hit_points.current, 3);
    }

    #[test]
    fn test_natural_one_always_misses() {
        let mut world = duel([1]);
        let result = world
            .perform_attack("Brann", "Wolf", "longsword", Advantage::Normal)
            .unwrap();
        assert!(!result.outcome.hit);
        assert_eq!(world.actor("Wolf").unwrap().hit_points.current, 11);
    }

    #[test]
    fn test_natural_twenty_doubles_dice() {
        let mut world = duel([20, 4, 6]);
        let result = world
            .perform_attack("Brann", "Wolf", "longsword", Advantage::Normal)
            .unwrap();
        assert!(result.outcome.critical);
        assert_eq!(result.outcome.damage_total, 4 + 6 + 3);
        assert_eq!(result.outcome.hp_after, 0);
        assert_eq!(
            world.actor("Wolf").unwrap().vitality,
            Vitality::Dying { turns_left: 3 }
        );
    }

    #[test]
    fn test_damage_clamps_and_dying_countdown() {
        let mut world = duel([]);
        let result = world.apply_damage("Wolf", 50, "a falling rock").unwrap();
        assert_eq!(result.outcome.hp_after, 0);
        assert_eq!(result.outcome.dying_turns_left, Some(3));

        world.apply_damage("Wolf", 1, "spite").unwrap();
        assert_eq!(world.actor("Wolf").unwrap().vitality.dying_turns_left(), Some(2));

        world.begin_round();
        world.begin_round();
        assert!(world.actor("Wolf").unwrap().is_dead());
        assert_eq!(
            world.apply_damage("Wolf", 1, "spite").unwrap_err().reason(),
            "ActorDead"
        );
    }

    #[test]
    fn test_heal_clamps_and_stabilizes() {
        let mut world = duel([]);
        world.apply_damage("Wolf", 11, "trap").unwrap();
        let healed = world.heal("Wolf", 100, "a potion").unwrap();
        assert_eq!(healed.outcome.hp_after, 11);
        assert_eq!(healed.outcome.vitality, Vitality::Up);
        assert!(world.heal("Wolf", 0, "nothing").is_err());
    }

    #[test]
    fn test_defeating_last_hostile_ends_combat_at_boundary() {
        let mut world = duel([]);
        assert!(world.in_combat());
        world.apply_damage("Wolf", 11, "a falling rock").unwrap();
        // Still flagged until a boundary recomputes it.
        assert!(world.in_combat());
        let round = world.begin_round();
        assert!(!round.outcome.in_combat);
        assert_eq!(world.round(), 0);
        assert!(world.participants().is_empty());
    }

    #[test]
    fn test_use_action_once_per_round() {
        let mut world = duel([]);
        world.use_action("Brann", ActionKind::Action).unwrap();
        let err = world.use_action("Brann", ActionKind::Action).unwrap_err();
        assert_eq!(err.reason(), "ActionUnavailable");
        world.reset_actor_turn("Brann").unwrap();
        assert!(world.use_action("Brann", ActionKind::Action).is_ok());
    }

    #[test]
    fn test_start_combat_with_explicit_order() {
        let mut world = duel([]);
        let result = world
            .start_combat(Some(vec!["Wolf".into(), "Brann".into()]))
            .unwrap();
        assert_eq!(result.outcome.participants, vec!["Wolf".to_string(), "Brann".to_string()]);
        assert_eq!(result.outcome.round, 1);
        assert!(world.start_combat(Some(vec!["Ghost".into()])).is_err());
    }

    #[test]
    fn test_zero_dying_turns_means_instant_death() {
        let config = WorldConfig::new()
            .with_actor(ActorConfig::new("A", 5, 10).at(0, 0))
            .with_rules(RulesConfig {
                dying_turns: 0,
                ..RulesConfig::default()
            });
        let mut world = World::new(config).unwrap();
        let result = world.apply_damage("A", 9, "fall").unwrap();
        assert_eq!(result.outcome.vitality, Vitality::Dead);
    }
}
