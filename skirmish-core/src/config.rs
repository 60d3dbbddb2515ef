//! World configuration.
//!
//! Configuration arrives as JSON and is parsed into these typed structures.
//! [`WorldConfig::validate`] rejects anything the engine cannot run with, so
//! a bad roster or weapon table never produces a half-built world.

use crate::actor::{Ability, AbilityScores, Actor, HitPoints, Skill, TurnState, Vitality};
use crate::dice::DiceError;
use crate::position::GridPos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Error type for world construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Actor names must not be empty")]
    EmptyName,

    #[error("Duplicate actor name: {0}")]
    DuplicateActor(String),

    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),

    #[error("Duplicate objective: {0}")]
    DuplicateObjective(String),

    #[error("Objective labels must not be empty")]
    EmptyObjective,

    #[error("Unknown skill or save {value} for {actor}")]
    UnknownSkill { actor: String, value: String },

    #[error("Unknown ability {value} in {context}")]
    UnknownAbility { context: String, value: String },

    #[error("Malformed damage expression for {weapon}: {source}")]
    Damage {
        weapon: String,
        #[source]
        source: DiceError,
    },

    #[error("{actor}: {message}")]
    InvalidStat { actor: String, message: String },

    #[error("{context} names unknown actor {name}")]
    UnknownActor { context: String, name: String },

    #[error("Invalid rules: {0}")]
    InvalidRules(String),
}

// ============================================================================
// Rules
// ============================================================================

fn default_proficiency_bonus() -> i32 {
    2
}

fn default_dying_turns() -> u32 {
    3
}

fn default_max_events() -> usize {
    256
}

fn default_hostility_threshold() -> i32 {
    -10
}

fn default_start_time() -> u32 {
    8 * 60
}

fn default_move_speed() -> u32 {
    6
}

fn default_tension() -> i32 {
    1
}

/// Tunable rule constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_proficiency_bonus")]
    pub proficiency_bonus: i32,
    /// Rounds a dying actor survives before dying outright.
    #[serde(default = "default_dying_turns")]
    pub dying_turns: u32,
    #[serde(default = "default_max_events")]
    pub max_events_per_advance: usize,
    /// Relations at or below this make a pair hostile.
    #[serde(default = "default_hostility_threshold")]
    pub hostility_threshold: i32,
    /// Clock value in minutes when the session starts.
    #[serde(default = "default_start_time")]
    pub start_time_min: u32,
    #[serde(default = "default_move_speed")]
    pub default_move_speed: u32,
    /// Fixed RNG seed; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            proficiency_bonus: default_proficiency_bonus(),
            dying_turns: default_dying_turns(),
            max_events_per_advance: default_max_events(),
            hostility_threshold: default_hostility_threshold(),
            start_time_min: default_start_time(),
            default_move_speed: default_move_speed(),
            seed: None,
        }
    }
}

// ============================================================================
// Actors and weapons
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub name: String,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(alias = "armor_class")]
    pub ac: i32,
    pub max_hp: i32,
    /// Starting hit points; defaults to `max_hp`.
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub move_speed: Option<u32>,
    #[serde(default)]
    pub proficient_skills: Vec<String>,
    #[serde(default)]
    pub proficient_saves: Vec<String>,
    #[serde(default)]
    pub weapon_proficiencies: Vec<String>,
    #[serde(default)]
    pub position: Option<GridPos>,
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    #[serde(default)]
    pub hostile: bool,
}

impl ActorConfig {
    pub fn new(name: impl Into<String>, max_hp: i32, ac: i32) -> Self {
        Self {
            name: name.into(),
            abilities: AbilityScores::default(),
            ac,
            max_hp,
            hp: None,
            move_speed: None,
            proficient_skills: Vec::new(),
            proficient_saves: Vec::new(),
            weapon_proficiencies: Vec::new(),
            position: None,
            inventory: BTreeMap::new(),
            hostile: false,
        }
    }

    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Some(GridPos::new(x, y));
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = Some(hp);
        self
    }

    pub fn with_move_speed(mut self, steps: u32) -> Self {
        self.move_speed = Some(steps);
        self
    }

    pub fn with_item(mut self, item: impl Into<String>, count: u32) -> Self {
        self.inventory.insert(item.into(), count);
        self
    }

    pub fn proficient_in(mut self, skill: impl Into<String>) -> Self {
        self.proficient_skills.push(skill.into());
        self
    }

    pub fn proficient_save(mut self, ability: impl Into<String>) -> Self {
        self.proficient_saves.push(ability.into());
        self
    }

    pub fn with_weapon_proficiency(mut self, weapon_or_class: impl Into<String>) -> Self {
        self.weapon_proficiencies.push(weapon_or_class.into());
        self
    }

    pub fn hostile(mut self) -> Self {
        self.hostile = true;
        self
    }

    /// Build the runtime actor, checking stats and proficiencies.
    pub fn build(&self, rules: &RulesConfig) -> Result<Actor, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidStat {
            actor: self.name.clone(),
            message,
        };

        if self.max_hp <= 0 {
            return Err(invalid(format!("max_hp must be positive, got {}", self.max_hp)));
        }
        let current = self.hp.unwrap_or(self.max_hp);
        if !(0..=self.max_hp).contains(&current) {
            return Err(invalid(format!(
                "hp {current} outside 0..={}",
                self.max_hp
            )));
        }

        let proficient_skills = self
            .proficient_skills
            .iter()
            .map(|s| {
                Skill::parse(s).ok_or_else(|| ConfigError::UnknownSkill {
                    actor: self.name.clone(),
                    value: s.clone(),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let proficient_saves = self
            .proficient_saves
            .iter()
            .map(|s| {
                Ability::parse(s).ok_or_else(|| ConfigError::UnknownAbility {
                    context: format!("saves of {}", self.name),
                    value: s.clone(),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        // Zero counts read as "not held"; keep the inventory free of them.
        let inventory = self
            .inventory
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(item, count)| (item.clone(), *count))
            .collect();

        Ok(Actor {
            name: self.name.clone(),
            abilities: self.abilities.clone(),
            armor_class: self.ac,
            hit_points: HitPoints {
                current,
                maximum: self.max_hp,
            },
            move_speed: self.move_speed.unwrap_or(rules.default_move_speed),
            proficient_skills,
            proficient_saves,
            weapon_proficiencies: self.weapon_proficiencies.iter().cloned().collect(),
            vitality: match (current, rules.dying_turns) {
                (0, 0) => Vitality::Dead,
                (0, turns_left) => Vitality::Dying { turns_left },
                _ => Vitality::Up,
            },
            hostile: self.hostile,
            position: self.position,
            inventory,
            turn: TurnState::fresh(),
        })
    }
}

fn default_reach() -> u32 {
    1
}

fn default_weapon_ability() -> String {
    "STR".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_reach", alias = "reach")]
    pub reach_steps: u32,
    #[serde(default = "default_weapon_ability")]
    pub ability: String,
    #[serde(alias = "damage")]
    pub damage_expr: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub proficient_default: bool,
}

impl WeaponConfig {
    pub fn new(id: impl Into<String>, reach_steps: u32, ability: &str, damage_expr: &str) -> Self {
        Self {
            id: id.into(),
            label: None,
            reach_steps,
            ability: ability.to_string(),
            damage_expr: damage_expr.to_string(),
            class: None,
            proficient_default: false,
        }
    }

    pub fn proficient_by_default(mut self) -> Self {
        self.proficient_default = true;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

// ============================================================================
// World
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSeed {
    #[serde(alias = "a")]
    pub from: String,
    #[serde(alias = "b")]
    pub to: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSeed {
    pub guardian: String,
    pub protectee: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weather: Option<String>,
}

/// Everything needed to construct a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub actors: Vec<ActorConfig>,
    #[serde(default)]
    pub weapons: Vec<WeaponConfig>,
    /// Add the built-in weapon table before `weapons`.
    #[serde(default)]
    pub include_standard_weapons: bool,
    #[serde(default)]
    pub relations: Vec<RelationSeed>,
    #[serde(default)]
    pub guardians: Vec<GuardianSeed>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default = "default_tension")]
    pub tension: i32,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            weapons: Vec::new(),
            include_standard_weapons: false,
            relations: Vec::new(),
            guardians: Vec::new(),
            objectives: Vec::new(),
            scene: SceneConfig::default(),
            tension: default_tension(),
            rules: RulesConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_actor(mut self, actor: ActorConfig) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponConfig) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_standard_weapons(mut self) -> Self {
        self.include_standard_weapons = true;
        self
    }

    pub fn with_relation(mut self, from: impl Into<String>, to: impl Into<String>, value: i32) -> Self {
        self.relations.push(RelationSeed {
            from: from.into(),
            to: to.into(),
            value,
        });
        self
    }

    pub fn with_guardian(mut self, guardian: impl Into<String>, protectee: impl Into<String>) -> Self {
        self.guardians.push(GuardianSeed {
            guardian: guardian.into(),
            protectee: protectee.into(),
        });
        self
    }

    pub fn with_objective(mut self, label: impl Into<String>) -> Self {
        self.objectives.push(label.into());
        self
    }

    pub fn with_scene(mut self, name: impl Into<String>, weather: Option<String>) -> Self {
        self.scene = SceneConfig {
            name: name.into(),
            weather,
        };
        self
    }

    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rules.seed = Some(seed);
        self
    }

    /// Cross-reference checks that serde cannot express.
    ///
    /// Weapon expressions and actor stats are checked when they are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.max_events_per_advance == 0 {
            return Err(ConfigError::InvalidRules(
                "max_events_per_advance must be at least 1".to_string(),
            ));
        }
        if self.rules.proficiency_bonus < 0 {
            return Err(ConfigError::InvalidRules(format!(
                "proficiency_bonus must not be negative, got {}",
                self.rules.proficiency_bonus
            )));
        }
        if self.tension < 0 {
            return Err(ConfigError::InvalidRules(format!(
                "tension must not be negative, got {}",
                self.tension
            )));
        }

        let mut names = BTreeSet::new();
        for actor in &self.actors {
            if actor.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !names.insert(actor.name.as_str()) {
                return Err(ConfigError::DuplicateActor(actor.name.clone()));
            }
        }

        let known = |context: &str, name: &str| -> Result<(), ConfigError> {
            if names.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::UnknownActor {
                    context: context.to_string(),
                    name: name.to_string(),
                })
            }
        };

        for seed in &self.relations {
            known("relation", &seed.from)?;
            known("relation", &seed.to)?;
        }
        for seed in &self.guardians {
            known("guardian", &seed.guardian)?;
            known("guardian", &seed.protectee)?;
            if seed.guardian == seed.protectee {
                return Err(ConfigError::InvalidStat {
                    actor: seed.guardian.clone(),
                    message: "cannot guard itself".to_string(),
                });
            }
        }

        let mut labels = BTreeSet::new();
        for label in &self.objectives {
            let label = label.trim();
            if label.is_empty() {
                return Err(ConfigError::EmptyObjective);
            }
            if !labels.insert(label) {
                return Err(ConfigError::DuplicateObjective(label.to_string()));
            }
        }

        Ok(())
    }
}
