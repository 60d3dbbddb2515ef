//! Tactical world-state and rules engine for turn-based narrative sessions.
//!
//! This crate provides:
//! - Dice expressions with ability tokens, checks and saving throws
//! - Grid movement, weapon attacks with reach, guardians who intercept
//! - Relations, inventory, objectives, mood markers and a scheduled event clock
//! - A tool dispatch surface with typed commands and a uniform result envelope
//!
//! Every operation validates against the current state before anything is
//! changed, so a rejected call leaves the world exactly as it was.
//!
//! # Quick Start
//!
//! ```ignore
//! use skirmish_core::{World, WorldConfig};
//! use serde_json::json;
//!
//! let config = WorldConfig::from_json_str(include_str!("scene.json"))?;
//! let mut world = World::new(config)?;
//!
//! let result = world.call(
//!     "perform_attack",
//!     &json!({"attacker": "Brann", "defender": "Wolf", "weapon_id": "longsword"}),
//! );
//! println!("{}", result.text());
//!
//! let snapshot = world.snapshot();
//! println!("{}", snapshot.to_json_pretty()?);
//! ```

extern crate self as skirmish_core;

pub mod actor;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dice;
pub mod dispatch;
pub mod error;
pub mod mood;
pub mod objective;
pub mod position;
pub mod protection;
pub mod relation;
pub mod rules;
pub mod snapshot;
pub mod testing;
pub mod world;

// Re-export for convenience
pub use skirmish_macros::Tool;

// Primary public API
pub use clock::EventPayload;
pub use config::{ActorConfig, ConfigError, RulesConfig, WeaponConfig, WorldConfig};
pub use dice::{Advantage, DiceExpression, DieSource, SeededDice};
pub use dispatch::{tool_specs, Command, ToolResult, ToolSpec};
pub use error::EngineError;
pub use position::GridPos;
pub use rules::{Effect, Resolution};
pub use snapshot::Snapshot;
pub use testing::{ScriptedDice, TestHarness};
pub use world::{EventHandler, World, WorldState};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    /// Look around for trouble
    #[derive(Tool, Deserialize)]
    #[tool(name = "scan_area")]
    struct ScanArea {
        /// Actor doing the looking
        actor: String,
        /// How far to look, in steps
        radius: Option<u32>,
        /// Search style
        #[tool(one_of = "quick, thorough")]
        style: String,
    }

    #[test]
    fn test_tool_derive() {
        assert_eq!(ScanArea::tool_name(), "scan_area");
        assert_eq!(ScanArea::tool_description(), "Look around for trouble");
    }

    #[test]
    fn test_tool_schema() {
        let schema = ScanArea::input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["actor"]["type"], "string");
        assert_eq!(schema["properties"]["radius"]["type"], "integer");
        assert_eq!(schema["properties"]["radius"]["minimum"], 0);
        assert_eq!(schema["properties"]["style"]["enum"][1], "thorough");

        // actor and style are required, radius is not (it's Option)
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "actor"));
        assert!(required.iter().any(|v| v == "style"));
        assert!(!required.iter().any(|v| v == "radius"));
    }

    #[test]
    fn test_tool_as_tool() {
        let tool = ScanArea::as_tool();
        assert_eq!(tool.name, "scan_area");
        assert!(!tool.description.is_empty());
    }
}
