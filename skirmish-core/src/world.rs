//! The world: one session's complete state plus its dice.
//!
//! [`WorldState`] is plain data and cheap to clone. [`World`] adds the die
//! source and registered event handlers, and is the only way to mutate state.

use crate::actor::Actor;
use crate::catalog::WeaponCatalog;
use crate::clock::{EventClock, ScheduledEvent};
use crate::config::{ConfigError, RulesConfig, WorldConfig};
use crate::dice::{DieSource, SeededDice};
use crate::error::EngineError;
use crate::mood::{Mood, Scene};
use crate::objective::ObjectiveTracker;
use crate::position::GridPos;
use crate::protection::Guardians;
use crate::relation::RelationGraph;
use crate::rules::{self, Effect, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Combat bookkeeping. `in_combat` is derived, see [`rules::combat::combat_flags`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatFlags {
    pub in_combat: bool,
    pub round: u32,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WorldState {
    pub(crate) actors: BTreeMap<String, Actor>,
    /// Actor names in configuration order.
    pub(crate) roster: Vec<String>,
    pub(crate) catalog: WeaponCatalog,
    pub(crate) relations: RelationGraph,
    pub(crate) guardians: Guardians,
    pub(crate) objectives: ObjectiveTracker,
    pub(crate) mood: Mood,
    pub(crate) scene: Scene,
    pub(crate) clock: EventClock,
    pub(crate) combat: CombatFlags,
    pub(crate) rules: RulesConfig,
}

impl WorldState {
    pub fn actor(&self, name: &str) -> Result<&Actor, EngineError> {
        self.actors
            .get(name)
            .ok_or_else(|| EngineError::UnknownActor(name.to_string()))
    }

    pub fn find_actor(&self, name: &str) -> Option<&Actor> {
        self.actors.get(name)
    }

    /// Actors in configuration order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.roster.iter().filter_map(|name| self.actors.get(name))
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn guardians(&self) -> &Guardians {
        &self.guardians
    }

    pub fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    pub fn mood(&self) -> &Mood {
        &self.mood
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn clock(&self) -> &EventClock {
        &self.clock
    }

    pub fn combat(&self) -> &CombatFlags {
        &self.combat
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    pub fn position_of(&self, name: &str) -> Result<Option<GridPos>, EngineError> {
        Ok(self.actor(name)?.position)
    }
}

/// Custom logic run when a named event fires.
///
/// Handlers get the whole world and may mutate it or schedule further
/// events. Returned lines are added to the event's report.
pub trait EventHandler: Send + Sync {
    fn handle(&self, world: &mut World, event: &ScheduledEvent) -> Result<Vec<String>, EngineError>;
}

impl<F> EventHandler for F
where
    F: Fn(&mut World, &ScheduledEvent) -> Result<Vec<String>, EngineError> + Send + Sync,
{
    fn handle(&self, world: &mut World, event: &ScheduledEvent) -> Result<Vec<String>, EngineError> {
        self(world, event)
    }
}

pub struct World {
    pub(crate) state: WorldState,
    pub(crate) dice: Box<dyn DieSource>,
    pub(crate) handlers: BTreeMap<String, Arc<dyn EventHandler>>,
    /// Set while `advance_time` is firing events.
    pub(crate) advancing: bool,
}

impl World {
    /// Build a world from validated configuration.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut catalog = if config.include_standard_weapons {
            WeaponCatalog::standard()?
        } else {
            WeaponCatalog::new()
        };
        for weapon in &config.weapons {
            catalog.insert(crate::catalog::WeaponDef::from_config(weapon)?)?;
        }

        let mut actors = BTreeMap::new();
        let mut roster = Vec::with_capacity(config.actors.len());
        for actor_config in &config.actors {
            let actor = actor_config.build(&config.rules)?;
            roster.push(actor.name.clone());
            actors.insert(actor.name.clone(), actor);
        }

        let mut relations = RelationGraph::new();
        for seed in &config.relations {
            relations.set(&seed.from, &seed.to, seed.value, "initial");
        }

        let mut guardians = Guardians::new();
        for seed in &config.guardians {
            guardians.set(&seed.guardian, &seed.protectee);
        }

        let mut objectives = ObjectiveTracker::new();
        for label in &config.objectives {
            objectives.add(label.trim());
        }

        let dice: Box<dyn DieSource> = match config.rules.seed {
            Some(seed) => Box::new(SeededDice::from_seed(seed)),
            None => Box::new(SeededDice::from_entropy()),
        };

        let state = WorldState {
            actors,
            roster,
            catalog,
            relations,
            guardians,
            objectives,
            mood: Mood::new(config.tension),
            scene: Scene {
                name: config.scene.name.clone(),
                weather: config.scene.weather.clone(),
            },
            clock: EventClock::new(config.rules.start_time_min),
            combat: CombatFlags::default(),
            rules: config.rules,
        };

        info!(
            actors = state.actors.len(),
            weapons = state.catalog.len(),
            clock = state.clock.now(),
            "world constructed"
        );

        let mut world = World {
            state,
            dice,
            handlers: BTreeMap::new(),
            advancing: false,
        };
        world.refresh_combat();
        Ok(world)
    }

    /// Replace the die source, e.g. with scripted dice in tests.
    pub fn with_dice(mut self, dice: impl DieSource + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn set_dice(&mut self, dice: impl DieSource + 'static) {
        self.dice = Box::new(dice);
    }

    /// Register a closure for events with the given name, replacing any previous handler.
    pub fn on_event<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut World, &ScheduledEvent) -> Result<Vec<String>, EngineError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.state.find_actor(name)
    }

    pub fn now(&self) -> u32 {
        self.state.now()
    }

    pub fn in_combat(&self) -> bool {
        self.state.combat.in_combat
    }

    pub fn round(&self) -> u32 {
        self.state.combat.round
    }

    pub fn participants(&self) -> &[String] {
        &self.state.combat.participants
    }

    pub fn relation(&self, from: &str, to: &str) -> i32 {
        self.state.relations.get(from, to)
    }

    /// Apply a resolution's effects and hand it back.
    pub(crate) fn commit<T>(&mut self, resolution: Resolution<T>) -> Resolution<T> {
        for effect in &resolution.effects {
            trace!(?effect, "applying effect");
        }
        rules::apply_effects(&mut self.state, &resolution.effects);
        resolution
    }

    /// Recompute combat flags, returning the change if there was one.
    pub(crate) fn refresh_combat(&mut self) -> Option<Effect> {
        let effect = rules::combat::combat_flags(&self.state)?;
        if let Effect::CombatChanged {
            in_combat, round, ..
        } = &effect
        {
            if *in_combat != self.state.combat.in_combat {
                info!(in_combat, round, "combat state changed");
            } else {
                debug!(round, "combat participants updated");
            }
        }
        rules::apply_effect(&mut self.state, &effect);
        Some(effect)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("state", &self.state)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("advancing", &self.advancing)
            .finish()
    }
}
