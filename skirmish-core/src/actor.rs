//! Actors and their attributes.
//!
//! An actor is identified by its unique name. Everything the rules need to
//! know about one participant lives here: ability scores, hit points, the
//! dying countdown, proficiencies, position, inventory and the per-round
//! turn resources.

use crate::position::GridPos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Match a three-letter token such as `STR` or `wis`.
    pub fn from_abbreviation(token: &str) -> Option<Ability> {
        Ability::all()
            .into_iter()
            .find(|a| a.abbreviation().eq_ignore_ascii_case(token))
    }

    /// Match an abbreviation or a full name.
    pub fn parse(s: &str) -> Option<Ability> {
        let s = s.trim();
        Ability::from_abbreviation(s).or_else(|| {
            Ability::all()
                .into_iter()
                .find(|a| a.name().eq_ignore_ascii_case(s))
        })
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for Ability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ability::parse(s).ok_or_else(|| s.to_string())
    }
}

fn default_score() -> u8 {
    10
}

/// Ability scores container.
///
/// Deserializes from either the long field names or `STR`/`DEX`/... keys;
/// missing scores default to 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(default = "default_score", alias = "STR", alias = "str")]
    pub strength: u8,
    #[serde(default = "default_score", alias = "DEX", alias = "dex")]
    pub dexterity: u8,
    #[serde(default = "default_score", alias = "CON", alias = "con")]
    pub constitution: u8,
    #[serde(default = "default_score", alias = "INT", alias = "int")]
    pub intelligence: u8,
    #[serde(default = "default_score", alias = "WIS", alias = "wis")]
    pub wisdom: u8,
    #[serde(default = "default_score", alias = "CHA", alias = "cha")]
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    /// Score 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
    pub fn modifier(&self, ability: Ability) -> i8 {
        let score = self.get(ability) as i16;
        (score - 10).div_euclid(2) as i8
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Skills
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn all() -> [Skill; 18] {
        [
            Skill::Athletics,
            Skill::Acrobatics,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Arcana,
            Skill::History,
            Skill::Investigation,
            Skill::Nature,
            Skill::Religion,
            Skill::AnimalHandling,
            Skill::Insight,
            Skill::Medicine,
            Skill::Perception,
            Skill::Survival,
            Skill::Deception,
            Skill::Intimidation,
            Skill::Performance,
            Skill::Persuasion,
        ]
    }

    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }

    /// Case-insensitive; spaces, underscores and hyphens are ignored.
    pub fn parse(s: &str) -> Option<Skill> {
        let wanted = normalize(s);
        Skill::all()
            .into_iter()
            .find(|skill| normalize(skill.name()) == wanted)
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Hit Points and Vitality
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Subtract damage, never going below zero.
    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        let before = self.current;
        self.current = self.current.saturating_sub(amount.max(0)).max(0);
        DamageResult {
            damage_taken: before - self.current,
            dropped_to_zero: before > 0 && self.current == 0,
        }
    }

    /// Restore hit points up to the maximum, returning the amount healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = self.current.saturating_add(amount.max(0)).min(self.maximum);
        self.current - old
    }

    pub fn is_down(&self) -> bool {
        self.current <= 0
    }

    pub fn ratio(&self) -> f32 {
        if self.maximum <= 0 {
            return 0.0;
        }
        (self.current as f32 / self.maximum as f32).max(0.0)
    }
}

/// Result of taking damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub damage_taken: i32,
    pub dropped_to_zero: bool,
}

/// Whether an actor is standing, bleeding out, or gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Vitality {
    #[default]
    Up,
    Dying {
        turns_left: u32,
    },
    Dead,
}

impl Vitality {
    pub fn dying_turns_left(&self) -> Option<u32> {
        match self {
            Vitality::Dying { turns_left } => Some(*turns_left),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vitality::Up => "up",
            Vitality::Dying { .. } => "dying",
            Vitality::Dead => "dead",
        }
    }
}

// ============================================================================
// Turn Resources
// ============================================================================

/// A per-round resource spent by acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Action,
    Bonus,
    Reaction,
}

impl ActionKind {
    pub fn parse(s: &str) -> Option<ActionKind> {
        match normalize(s).as_str() {
            "action" => Some(ActionKind::Action),
            "bonus" | "bonusaction" => Some(ActionKind::Bonus),
            "reaction" => Some(ActionKind::Reaction),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Action => "action",
            ActionKind::Bonus => "bonus action",
            ActionKind::Reaction => "reaction",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What an actor has left this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub steps_spent: u32,
    pub action_available: bool,
    pub bonus_available: bool,
    pub reaction_available: bool,
}

impl TurnState {
    pub fn fresh() -> Self {
        Self {
            steps_spent: 0,
            action_available: true,
            bonus_available: true,
            reaction_available: true,
        }
    }

    pub fn available(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Action => self.action_available,
            ActionKind::Bonus => self.bonus_available,
            ActionKind::Reaction => self.reaction_available,
        }
    }

    pub fn spend(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Action => self.action_available = false,
            ActionKind::Bonus => self.bonus_available = false,
            ActionKind::Reaction => self.reaction_available = false,
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::fresh()
    }
}

// ============================================================================
// Actor
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub abilities: AbilityScores,
    pub armor_class: i32,
    pub hit_points: HitPoints,
    /// Steps per round.
    pub move_speed: u32,
    pub proficient_skills: BTreeSet<Skill>,
    pub proficient_saves: BTreeSet<Ability>,
    /// Weapon ids or weapon classes the actor is proficient with.
    pub weapon_proficiencies: BTreeSet<String>,
    pub vitality: Vitality,
    pub hostile: bool,
    /// `None` while the actor is off the field.
    pub position: Option<GridPos>,
    pub inventory: BTreeMap<String, u32>,
    pub turn: TurnState,
}

impl Actor {
    pub fn new(name: impl Into<String>, max_hp: i32, armor_class: i32) -> Self {
        Self {
            name: name.into(),
            abilities: AbilityScores::default(),
            armor_class,
            hit_points: HitPoints::new(max_hp),
            move_speed: 6,
            proficient_skills: BTreeSet::new(),
            proficient_saves: BTreeSet::new(),
            weapon_proficiencies: BTreeSet::new(),
            vitality: Vitality::Up,
            hostile: false,
            position: None,
            inventory: BTreeMap::new(),
            turn: TurnState::fresh(),
        }
    }

    /// Conscious with hit points to spare.
    pub fn is_up(&self) -> bool {
        self.vitality == Vitality::Up && self.hit_points.current > 0
    }

    pub fn is_dead(&self) -> bool {
        self.vitality == Vitality::Dead
    }

    pub fn is_dying(&self) -> bool {
        matches!(self.vitality, Vitality::Dying { .. })
    }

    pub fn steps_left(&self) -> u32 {
        self.move_speed.saturating_sub(self.turn.steps_spent)
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn holds(&self, item: &str) -> bool {
        self.item_count(item) > 0
    }

    pub fn is_proficient_in(&self, skill: Skill) -> bool {
        self.proficient_skills.contains(&skill)
    }

    pub fn is_proficient_save(&self, ability: Ability) -> bool {
        self.proficient_saves.contains(&ability)
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        i32::from(self.abilities.modifier(ability))
    }

    /// Short health description for narration.
    pub fn condition_label(&self) -> &'static str {
        match self.vitality {
            Vitality::Dead => "dead",
            Vitality::Dying { .. } => "dying",
            Vitality::Up => {
                let ratio = self.hit_points.ratio();
                if ratio <= 0.25 {
                    "critically wounded"
                } else if ratio <= 0.5 {
                    "bloodied"
                } else if ratio < 1.0 {
                    "wounded"
                } else {
                    "unhurt"
                }
            }
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (HP {}/{}, AC {})",
            self.name, self.hit_points.current, self.hit_points.maximum, self.armor_class
        )
    }
}
