//! Weapon definitions keyed by item id.

use crate::actor::{Ability, Actor};
use crate::config::{ConfigError, WeaponConfig};
use crate::dice::DiceExpression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An immutable weapon definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub id: String,
    pub label: String,
    /// Reach in grid steps.
    pub reach: u32,
    /// Ability added to attack rolls.
    pub ability: Ability,
    pub damage: DiceExpression,
    /// Weapon family, e.g. "simple" or "martial".
    pub class: Option<String>,
    pub proficient_default: bool,
}

impl WeaponDef {
    pub fn from_config(config: &WeaponConfig) -> Result<Self, ConfigError> {
        let ability = Ability::parse(&config.ability).ok_or_else(|| ConfigError::UnknownAbility {
            context: format!("weapon {}", config.id),
            value: config.ability.clone(),
        })?;
        let damage =
            DiceExpression::parse(&config.damage_expr).map_err(|source| ConfigError::Damage {
                weapon: config.id.clone(),
                source,
            })?;
        Ok(WeaponDef {
            id: config.id.clone(),
            label: config.label.clone().unwrap_or_else(|| config.id.clone()),
            reach: config.reach_steps,
            ability,
            damage,
            class: config.class.clone(),
            proficient_default: config.proficient_default,
        })
    }

    /// Proficiency comes from the weapon itself, its id, or its class.
    pub fn is_proficient(&self, actor: &Actor) -> bool {
        self.proficient_default
            || actor.weapon_proficiencies.contains(&self.id)
            || self
                .class
                .as_ref()
                .is_some_and(|class| actor.weapon_proficiencies.contains(class))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaponCatalog {
    weapons: BTreeMap<String, WeaponDef>,
}

impl WeaponCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every definition, failing on the first bad one.
    pub fn from_configs<'a>(
        configs: impl IntoIterator<Item = &'a WeaponConfig>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = WeaponCatalog::new();
        for config in configs {
            catalog.insert(WeaponDef::from_config(config)?)?;
        }
        Ok(catalog)
    }

    /// The built-in weapon table.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::from_configs(STANDARD_WEAPONS.iter())
    }

    pub fn insert(&mut self, weapon: WeaponDef) -> Result<(), ConfigError> {
        if self.weapons.contains_key(&weapon.id) {
            return Err(ConfigError::DuplicateItem(weapon.id));
        }
        self.weapons.insert(weapon.id.clone(), weapon);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.weapons.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponDef> {
        self.weapons.values()
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}

fn standard(id: &str, label: &str, reach: u32, ability: &str, damage: &str, class: &str) -> WeaponConfig {
    WeaponConfig {
        id: id.to_string(),
        label: Some(label.to_string()),
        reach_steps: reach,
        ability: ability.to_string(),
        damage_expr: damage.to_string(),
        class: Some(class.to_string()),
        proficient_default: false,
    }
}

lazy_static::lazy_static! {
    /// Built-in weapons, available with `include_standard_weapons`.
    pub static ref STANDARD_WEAPONS: Vec<WeaponConfig> = vec![
        WeaponConfig {
            proficient_default: true,
            ..standard("unarmed", "Unarmed Strike", 1, "STR", "1+STR", "natural")
        },
        standard("club", "Club", 1, "STR", "1d4+STR", "simple"),
        standard("dagger", "Dagger", 1, "DEX", "1d4+DEX", "simple"),
        standard("mace", "Mace", 1, "STR", "1d6+STR", "simple"),
        standard("spear", "Spear", 1, "STR", "1d6+STR", "simple"),
        standard("quarterstaff", "Quarterstaff", 1, "STR", "1d6+STR", "simple"),
        standard("shortbow", "Shortbow", 16, "DEX", "1d6+DEX", "simple"),
        standard("light_crossbow", "Light Crossbow", 16, "DEX", "1d8+DEX", "simple"),
        standard("shortsword", "Shortsword", 1, "DEX", "1d6+DEX", "martial"),
        standard("longsword", "Longsword", 1, "STR", "1d8+STR", "martial"),
        standard("rapier", "Rapier", 1, "DEX", "1d8+DEX", "martial"),
        standard("battleaxe", "Battleaxe", 1, "STR", "1d8+STR", "martial"),
        standard("greataxe", "Greataxe", 1, "STR", "1d12+STR", "martial"),
        standard("greatsword", "Greatsword", 1, "STR", "2d6+STR", "martial"),
        standard("glaive", "Glaive", 2, "STR", "1d10+STR", "martial"),
        standard("halberd", "Halberd", 2, "STR", "1d10+STR", "martial"),
        standard("longbow", "Longbow", 30, "DEX", "1d8+DEX", "martial"),
    ];
}
