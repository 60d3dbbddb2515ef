//! Relations, inventory, guardians, objectives and mood.
//!
//! None of these roll dice. Each validates against the current state and
//! yields the effects to apply.

use super::{Effect, Resolution};
use crate::error::EngineError;
use crate::mood::TensionBand;
use crate::objective::ObjectiveStatus;
use crate::relation::Stance;
use crate::world::{World, WorldState};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOutcome {
    pub from: String,
    pub to: String,
    pub old: i32,
    pub new: i32,
    pub stance: Stance,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub target: String,
    pub item: String,
    pub delta: i32,
    pub new_count: u32,
    pub from: Option<String>,
    pub from_count: Option<u32>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardPair {
    pub guardian: String,
    pub protectee: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionOutcome {
    pub guardian: String,
    pub protectee: String,
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearProtectionOutcome {
    pub removed: Vec<GuardPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveOutcome {
    pub label: String,
    pub status: ObjectiveStatus,
    pub changed: bool,
    pub all_resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensionOutcome {
    pub old: i32,
    pub tension: i32,
    pub band: TensionBand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOutcome {
    pub mark: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneOutcome {
    pub name: String,
    pub weather: Option<String>,
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

// ============================================================================
// Relations and inventory
// ============================================================================

/// Set the directed relation `from -> to`.
pub fn resolve_adjust_relation(
    state: &WorldState,
    from: &str,
    to: &str,
    value: i32,
    reason: &str,
) -> Result<Resolution<RelationOutcome>, EngineError> {
    let a = state.actor(from)?;
    let b = state.actor(to)?;
    if a.name == b.name {
        return Err(EngineError::InvalidArgument(format!(
            "{} cannot hold a relation with themselves",
            a.name
        )));
    }
    let old = state.relations.get(&a.name, &b.name);
    let stance = Stance::of(value);
    let outcome = RelationOutcome {
        from: a.name.clone(),
        to: b.name.clone(),
        old,
        new: value,
        stance,
        reason: reason.to_string(),
    };
    Ok(Resolution::new(outcome)
        .with_effect(Effect::RelationSet {
            from: a.name.clone(),
            to: b.name.clone(),
            old,
            new: value,
            reason: reason.to_string(),
        })
        .narrate(format!(
            "{} now regards {} as {stance} ({old} -> {value}).",
            a.name, b.name
        )))
}

/// Add `count` of `item` to `target`, optionally taking it from `from`.
///
/// Negative counts remove items and need the target to hold enough of them.
pub fn resolve_transfer_item(
    state: &WorldState,
    target: &str,
    item: &str,
    count: i32,
    reason: &str,
    from: Option<&str>,
) -> Result<Resolution<TransferOutcome>, EngineError> {
    let item = non_empty(item, "item id")?;
    if count == 0 {
        return Err(EngineError::InvalidArgument(
            "transfer count must not be zero".to_string(),
        ));
    }
    let target_actor = state.actor(target)?;
    let held = target_actor.item_count(item);
    let mut effects = Vec::new();

    let (from_name, from_count) = match from {
        Some(source) => {
            let source = state.actor(source)?;
            if source.name == target_actor.name {
                return Err(EngineError::InvalidArgument(format!(
                    "{} cannot transfer items to themselves",
                    source.name
                )));
            }
            if count < 0 {
                return Err(EngineError::InvalidArgument(
                    "transfers between actors need a positive count".to_string(),
                ));
            }
            let available = source.item_count(item);
            if available < count.unsigned_abs() {
                return Err(EngineError::InsufficientItems {
                    actor: source.name.clone(),
                    item: item.to_string(),
                    held: available,
                    needed: count.unsigned_abs(),
                });
            }
            let left = available - count.unsigned_abs();
            effects.push(Effect::InventoryChanged {
                actor: source.name.clone(),
                item: item.to_string(),
                new_count: left,
            });
            (Some(source.name.clone()), Some(left))
        }
        None => (None, None),
    };

    let new_count = if count < 0 {
        let needed = count.unsigned_abs();
        if held < needed {
            return Err(EngineError::InsufficientItems {
                actor: target_actor.name.clone(),
                item: item.to_string(),
                held,
                needed,
            });
        }
        held - needed
    } else {
        held.saturating_add(count.unsigned_abs())
    };
    effects.push(Effect::InventoryChanged {
        actor: target_actor.name.clone(),
        item: item.to_string(),
        new_count,
    });

    let narrative = match (&from_name, count > 0) {
        (Some(source), _) => format!("{source} hands {count} {item} to {}.", target_actor.name),
        (None, true) => format!("{} gains {count} {item}.", target_actor.name),
        (None, false) => format!("{} loses {} {item}.", target_actor.name, count.unsigned_abs()),
    };

    Ok(Resolution {
        outcome: TransferOutcome {
            target: target_actor.name.clone(),
            item: item.to_string(),
            delta: count,
            new_count,
            from: from_name,
            from_count,
            reason: reason.to_string(),
        },
        effects,
        narrative: vec![narrative],
    })
}

// ============================================================================
// Protection
// ============================================================================

pub fn resolve_set_protection(
    state: &WorldState,
    guardian: &str,
    protectee: &str,
) -> Result<Resolution<ProtectionOutcome>, EngineError> {
    let guardian = state.actor(guardian)?;
    let protectee = state.actor(protectee)?;
    if guardian.name == protectee.name {
        return Err(EngineError::InvalidArgument(format!(
            "{} cannot guard themselves",
            guardian.name
        )));
    }
    let replaced = state
        .guardians
        .guardian_of(&protectee.name)
        .filter(|previous| *previous != guardian.name)
        .map(str::to_string);

    Ok(Resolution::new(ProtectionOutcome {
        guardian: guardian.name.clone(),
        protectee: protectee.name.clone(),
        replaced,
    })
    .with_effect(Effect::GuardianSet {
        guardian: guardian.name.clone(),
        protectee: protectee.name.clone(),
    })
    .narrate(format!("{} guards {}.", guardian.name, protectee.name)))
}

/// Remove guardian assignments matching every given name.
pub fn resolve_clear_protection(
    state: &WorldState,
    guardian: Option<&str>,
    protectee: Option<&str>,
) -> Result<Resolution<ClearProtectionOutcome>, EngineError> {
    for name in guardian.iter().chain(protectee.iter()) {
        state.actor(name)?;
    }
    let removed: Vec<GuardPair> = state
        .guardians
        .matching(guardian, protectee)
        .into_iter()
        .map(|(guardian, protectee)| GuardPair {
            guardian,
            protectee,
        })
        .collect();

    let effects = removed
        .iter()
        .map(|pair| Effect::GuardianCleared {
            protectee: pair.protectee.clone(),
        })
        .collect::<Vec<_>>();
    let narrative = removed
        .iter()
        .map(|pair| format!("{} stops guarding {}.", pair.guardian, pair.protectee))
        .collect();

    Ok(Resolution {
        outcome: ClearProtectionOutcome { removed },
        effects,
        narrative,
    })
}

// ============================================================================
// Objectives
// ============================================================================

pub fn resolve_add_objective(
    state: &WorldState,
    label: &str,
) -> Result<Resolution<ObjectiveOutcome>, EngineError> {
    let label = non_empty(label, "objective label")?;
    if let Some(existing) = state.objectives.get(label) {
        return Ok(Resolution::new(ObjectiveOutcome {
            label: label.to_string(),
            status: existing.status,
            changed: false,
            all_resolved: state.objectives.all_resolved(),
        }));
    }
    Ok(Resolution::new(ObjectiveOutcome {
        label: label.to_string(),
        status: ObjectiveStatus::Pending,
        changed: true,
        all_resolved: false,
    })
    .with_effect(Effect::ObjectiveAdded {
        label: label.to_string(),
    })
    .narrate(format!("New objective: {label}.")))
}

pub fn resolve_objective_status(
    state: &WorldState,
    label: &str,
    status: ObjectiveStatus,
    note: Option<&str>,
) -> Result<Resolution<ObjectiveOutcome>, EngineError> {
    let label = label.trim();
    let current = state.objectives.check_transition(label, status)?;
    if current == status && status == ObjectiveStatus::Done {
        return Ok(Resolution::new(ObjectiveOutcome {
            label: label.to_string(),
            status,
            changed: false,
            all_resolved: state.objectives.all_resolved(),
        }));
    }

    let all_resolved = state
        .objectives
        .iter()
        .all(|o| o.label == label || o.status != ObjectiveStatus::Pending);
    let line = match (status, note) {
        (ObjectiveStatus::Done, Some(note)) => format!("Objective complete: {label} ({note})."),
        (ObjectiveStatus::Done, None) => format!("Objective complete: {label}."),
        (_, Some(note)) => format!("Objective blocked: {label} ({note})."),
        (_, None) => format!("Objective blocked: {label}."),
    };

    Ok(Resolution::new(ObjectiveOutcome {
        label: label.to_string(),
        status,
        changed: true,
        all_resolved,
    })
    .with_effect(Effect::ObjectiveStatusChanged {
        label: label.to_string(),
        status,
        note: note.map(str::to_string),
    })
    .narrate(line))
}

// ============================================================================
// Mood and scene
// ============================================================================

pub fn resolve_adjust_tension(state: &WorldState, delta: i32) -> Resolution<TensionOutcome> {
    let old = state.mood.tension;
    let tension = state.mood.adjusted(delta);
    let band = TensionBand::of(tension);
    Resolution::new(TensionOutcome { old, tension, band })
        .with_effect(Effect::TensionChanged { tension })
        .narrate(format!("Tension {old} -> {tension} ({band})."))
}

pub fn resolve_add_mark(state: &WorldState, text: &str) -> Result<Resolution<MarkOutcome>, EngineError> {
    let text = non_empty(text, "mark")?;
    Ok(Resolution::new(MarkOutcome {
        mark: text.to_string(),
        count: state.mood.marks().len() + 1,
    })
    .with_effect(Effect::MarkAdded {
        text: text.to_string(),
    }))
}

pub fn resolve_set_scene(name: &str, weather: Option<&str>) -> Result<Resolution<SceneOutcome>, EngineError> {
    let name = non_empty(name, "scene name")?;
    let weather = weather.map(str::trim).filter(|w| !w.is_empty()).map(str::to_string);
    let line = match &weather {
        Some(weather) => format!("Scene: {name} ({weather})."),
        None => format!("Scene: {name}."),
    };
    Ok(Resolution::new(SceneOutcome {
        name: name.to_string(),
        weather: weather.clone(),
    })
    .with_effect(Effect::SceneChanged {
        name: name.to_string(),
        weather,
    })
    .narrate(line))
}

// ============================================================================
// World operations
// ============================================================================

impl World {
    pub fn adjust_relation(
        &mut self,
        from: &str,
        to: &str,
        value: i32,
        reason: &str,
    ) -> Result<Resolution<RelationOutcome>, EngineError> {
        let resolution = resolve_adjust_relation(&self.state, from, to, value, reason)?;
        debug!(from, to, value, reason, "relation set");
        Ok(self.commit(resolution))
    }

    pub fn transfer_item(
        &mut self,
        target: &str,
        item: &str,
        count: i32,
        reason: &str,
        from: Option<&str>,
    ) -> Result<Resolution<TransferOutcome>, EngineError> {
        let resolution = resolve_transfer_item(&self.state, target, item, count, reason, from)?;
        debug!(target, item, count, reason, "inventory changed");
        Ok(self.commit(resolution))
    }

    pub fn set_protection(
        &mut self,
        guardian: &str,
        protectee: &str,
    ) -> Result<Resolution<ProtectionOutcome>, EngineError> {
        let resolution = resolve_set_protection(&self.state, guardian, protectee)?;
        Ok(self.commit(resolution))
    }

    pub fn clear_protection(
        &mut self,
        guardian: Option<&str>,
        protectee: Option<&str>,
    ) -> Result<Resolution<ClearProtectionOutcome>, EngineError> {
        let resolution = resolve_clear_protection(&self.state, guardian, protectee)?;
        Ok(self.commit(resolution))
    }

    pub fn add_objective(&mut self, label: &str) -> Result<Resolution<ObjectiveOutcome>, EngineError> {
        let resolution = resolve_add_objective(&self.state, label)?;
        Ok(self.commit(resolution))
    }

    pub fn complete_objective(
        &mut self,
        label: &str,
        note: Option<&str>,
    ) -> Result<Resolution<ObjectiveOutcome>, EngineError> {
        let resolution = resolve_objective_status(&self.state, label, ObjectiveStatus::Done, note)?;
        Ok(self.commit(resolution))
    }

    pub fn block_objective(
        &mut self,
        label: &str,
        reason: Option<&str>,
    ) -> Result<Resolution<ObjectiveOutcome>, EngineError> {
        let resolution =
            resolve_objective_status(&self.state, label, ObjectiveStatus::Blocked, reason)?;
        Ok(self.commit(resolution))
    }

    pub fn adjust_tension(&mut self, delta: i32) -> Resolution<TensionOutcome> {
        let resolution = resolve_adjust_tension(&self.state, delta);
        self.commit(resolution)
    }

    pub fn add_mark(&mut self, text: &str) -> Result<Resolution<MarkOutcome>, EngineError> {
        let resolution = resolve_add_mark(&self.state, text)?;
        Ok(self.commit(resolution))
    }

    pub fn set_scene(
        &mut self,
        name: &str,
        weather: Option<&str>,
    ) -> Result<Resolution<SceneOutcome>, EngineError> {
        let resolution = resolve_set_scene(name, weather)?;
        Ok(self.commit(resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActorConfig, WorldConfig};

    fn camp() -> World {
        let config = WorldConfig::new()
            .with_actor(ActorConfig::new("Amiya", 12, 13).with_item("rope", 2))
            .with_actor(ActorConfig::new("Brann", 20, 16))
            .with_actor(ActorConfig::new("Cato", 9, 11))
            .with_objective("Make camp");
        World::new(config).unwrap()
    }

    #[test]
    fn test_adjust_relation_sets_value() {
        let mut world = camp();
        world.adjust_relation("Amiya", "Brann", 15, "shared rations").unwrap();
        let result = world.adjust_relation("Amiya", "Brann", 45, "saved her life").unwrap();
        assert_eq!(result.outcome.old, 15);
        assert_eq!(result.outcome.stance, Stance::CloseCompanion);
        assert_eq!(world.relation("Amiya", "Brann"), 45);
        assert_eq!(world.relation("Brann", "Amiya"), 0);
        assert_eq!(world.state().relations().history().len(), 2);
    }

    #[test]
    fn test_self_relation_rejected() {
        let mut world = camp();
        assert_eq!(
            world.adjust_relation("Amiya", "Amiya", 5, "vanity").unwrap_err().reason(),
            "InvalidArgument"
        );
    }

    #[test]
    fn test_remove_items_needs_enough() {
        let mut world = camp();
        let err = world.transfer_item("Amiya", "rope", -3, "climb", None).unwrap_err();
        assert_eq!(err.reason(), "InsufficientItems");
        assert_eq!(world.actor("Amiya").unwrap().item_count("rope"), 2);

        world.transfer_item("Amiya", "rope", -2, "climb", None).unwrap();
        assert!(!world.actor("Amiya").unwrap().inventory.contains_key("rope"));
    }

    #[test]
    fn test_transfer_between_actors() {
        let mut world = camp();
        let result = world
            .transfer_item("Brann", "rope", 1, "sharing", Some("Amiya"))
            .unwrap();
        assert_eq!(result.outcome.new_count, 1);
        assert_eq!(result.outcome.from_count, Some(1));
        assert_eq!(world.actor("Brann").unwrap().item_count("rope"), 1);

        let err = world
            .transfer_item("Brann", "torch", 1, "sharing", Some("Cato"))
            .unwrap_err();
        assert_eq!(err.reason(), "InsufficientItems");
        assert!(world.transfer_item("Brann", "torch", 0, "nothing", None).is_err());
    }

    #[test]
    fn test_protection_replace_and_clear() {
        let mut world = camp();
        world.set_protection("Brann", "Amiya").unwrap();
        let result = world.set_protection("Cato", "Amiya").unwrap();
        assert_eq!(result.outcome.replaced.as_deref(), Some("Brann"));
        world.set_protection("Cato", "Brann").unwrap();

        let cleared = world.clear_protection(Some("Cato"), None).unwrap();
        assert_eq!(cleared.outcome.removed.len(), 2);
        assert!(world.state().guardians().is_empty());
        assert!(world.clear_protection(Some("Ghost"), None).is_err());
    }

    #[test]
    fn test_objective_flow() {
        let mut world = camp();
        assert!(!world.add_objective("Make camp").unwrap().outcome.changed);
        world.add_objective("Light a fire").unwrap();
        world.block_objective("Light a fire", Some("the wood is wet")).unwrap();
        let done = world.complete_objective("Make camp", None).unwrap();
        assert!(done.outcome.all_resolved);
        assert!(world.state().objectives().all_resolved());

        let again = world.complete_objective("Make camp", Some("again")).unwrap();
        assert!(!again.outcome.changed);
        assert_eq!(
            world.block_objective("Make camp", None).unwrap_err().reason(),
            "ObjectiveClosed"
        );
        assert_eq!(
            world.complete_objective("Find water", None).unwrap_err().reason(),
            "UnknownObjective"
        );
    }

    #[test]
    fn test_objective_labels_are_trimmed() {
        let mut world = camp();
        world.add_objective("  Scout the ridge ").unwrap();
        let done = world.complete_objective("  Scout the ridge ", None).unwrap();
        assert_eq!(done.outcome.label, "Scout the ridge");
        assert_eq!(done.outcome.status, ObjectiveStatus::Done);
        assert_eq!(
            world.block_objective("Scout the ridge\t", None).unwrap_err().reason(),
            "ObjectiveClosed"
        );

        let config = WorldConfig::new()
            .with_actor(ActorConfig::new("Amiya", 12, 13))
            .with_objective(" Make camp ");
        let mut world = World::new(config).unwrap();
        assert!(world.state().objectives().contains("Make camp"));
        assert!(world.complete_objective("Make camp", None).is_ok());
    }

    #[test]
    fn test_tension_marks_and_scene() {
        let mut world = camp();
        assert_eq!(world.state().mood().tension, 1);
        let result = world.adjust_tension(3);
        assert_eq!(result.outcome.band, TensionBand::Oppressive);
        world.adjust_tension(-10);
        assert_eq!(world.state().mood().tension, 0);

        world.add_mark("the wolves howled").unwrap();
        assert!(world.add_mark("   ").is_err());
        assert_eq!(world.state().mood().marks().len(), 1);

        world.set_scene("Riverbank", Some("drizzle")).unwrap();
        assert_eq!(world.state().scene().weather.as_deref(), Some("drizzle"));
    }
}
