//! Read-only projection of the world.
//!
//! A [`Snapshot`] owns all of its data; nothing in it points back into the
//! world it was taken from.

use crate::actor::Vitality;
use crate::clock::{clock_label, PendingEvent};
use crate::mood::{Scene, TensionBand};
use crate::objective::Objective;
use crate::position::GridPos;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    pub vitality: Vitality,
    pub dying_turns_left: Option<u32>,
    pub condition: String,
    pub hostile: bool,
    pub reaction_available: bool,
    pub steps_left: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Positions of actors on the field.
    pub positions: BTreeMap<String, GridPos>,
    /// `from -> to -> value` for every relation ever set.
    pub relations: BTreeMap<String, BTreeMap<String, i32>>,
    /// In roster order.
    pub actors: Vec<ActorSummary>,
    pub inventory: BTreeMap<String, BTreeMap<String, u32>>,
    /// protectee -> guardian
    pub guardians: BTreeMap<String, String>,
    pub objectives: Vec<Objective>,
    pub objectives_resolved: bool,
    pub tension: i32,
    pub tension_band: TensionBand,
    pub marks: Vec<String>,
    pub in_combat: bool,
    pub round: u32,
    pub participants: Vec<String>,
    pub clock_min: u32,
    pub clock_label: String,
    pub scene: Scene,
    pub pending_events: Vec<PendingEvent>,
}

impl Snapshot {
    pub fn actor(&self, name: &str) -> Option<&ActorSummary> {
        self.actors.iter().find(|a| a.name == name)
    }

    pub fn position(&self, name: &str) -> Option<GridPos> {
        self.positions.get(name).copied()
    }

    pub fn relation(&self, from: &str, to: &str) -> i32 {
        self.relations
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl World {
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let actors: Vec<_> = state.actors().collect();

        Snapshot {
            positions: actors
                .iter()
                .filter_map(|a| a.position.map(|pos| (a.name.clone(), pos)))
                .collect(),
            relations: state.relations.as_map().clone(),
            actors: actors
                .iter()
                .map(|a| ActorSummary {
                    name: a.name.clone(),
                    hp: a.hit_points.current,
                    max_hp: a.hit_points.maximum,
                    ac: a.armor_class,
                    vitality: a.vitality,
                    dying_turns_left: a.vitality.dying_turns_left(),
                    condition: a.condition_label().to_string(),
                    hostile: a.hostile,
                    reaction_available: a.turn.reaction_available,
                    steps_left: a.steps_left(),
                })
                .collect(),
            inventory: actors
                .iter()
                .map(|a| (a.name.clone(), a.inventory.clone()))
                .collect(),
            guardians: state.guardians.as_map().clone(),
            objectives: state.objectives.iter().cloned().collect(),
            objectives_resolved: state.objectives.all_resolved(),
            tension: state.mood.tension,
            tension_band: state.mood.band(),
            marks: state.mood.marks().to_vec(),
            in_combat: state.combat.in_combat,
            round: state.combat.round,
            participants: state.combat.participants.clone(),
            clock_min: state.clock.now(),
            clock_label: clock_label(state.clock.now()),
            scene: state.scene.clone(),
            pending_events: state.clock.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::EventPayload;
    use crate::testing::skirmish_fixture;
    use crate::world::World;

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut world = World::new(skirmish_fixture()).unwrap();
        let before = world.snapshot();

        world.transfer_item("Amiya", "torch", 2, "found", None).unwrap();
        world.apply_damage("Brann", 5, "fall").unwrap();

        assert!(!before.inventory["Amiya"].contains_key("torch"));
        assert_eq!(before.actor("Brann").unwrap().hp, 24);
        let after = world.snapshot();
        assert_eq!(after.inventory["Amiya"]["torch"], 2);
        assert_eq!(after.actor("Brann").unwrap().hp, 19);
    }

    #[test]
    fn test_snapshot_fields() {
        let mut world = World::new(skirmish_fixture()).unwrap();
        world.schedule_event("dusk", world.now() + 600, EventPayload::default()).unwrap();
        world.add_mark("smoke on the ridge").unwrap();

        let snapshot = world.snapshot();
        assert_eq!(snapshot.clock_label, "08:00");
        assert_eq!(snapshot.position("Wolf").map(|p| (p.x, p.y)), Some((3, 0)));
        assert_eq!(snapshot.guardians.get("Amiya").map(String::as_str), Some("Brann"));
        assert_eq!(snapshot.relation("Amiya", "Brann"), 40);
        assert_eq!(snapshot.pending_events[0].name, "dusk");
        assert_eq!(snapshot.marks, vec!["smoke on the ridge".to_string()]);
        assert!(snapshot.in_combat);
        assert_eq!(snapshot.round, 1);

        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains("\"tension_band\""));
    }
}
