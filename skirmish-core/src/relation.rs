//! Directed relation values between actors.
//!
//! An edge `a -> b` is how `a` regards `b`. Missing edges read as 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One recorded change to an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationChange {
    pub from: String,
    pub to: String,
    pub old: i32,
    pub new: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraph {
    edges: BTreeMap<String, BTreeMap<String, i32>>,
    history: Vec<RelationChange>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, from: &str, to: &str) -> i32 {
        self.edges
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0)
    }

    /// Set `from -> to`, returning the previous value.
    pub fn set(&mut self, from: &str, to: &str, value: i32, reason: &str) -> i32 {
        let slot = self
            .edges
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_insert(0);
        let old = *slot;
        *slot = value;
        self.history.push(RelationChange {
            from: from.to_string(),
            to: to.to_string(),
            old,
            new: value,
            reason: reason.to_string(),
        });
        old
    }

    /// Every explicitly created edge as `(from, to, value)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, i32)> {
        self.edges.iter().flat_map(|(from, row)| {
            row.iter()
                .map(move |(to, value)| (from.as_str(), to.as_str(), *value))
        })
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, i32>> {
        &self.edges
    }

    pub fn history(&self) -> &[RelationChange] {
        &self.history
    }

    /// Either direction between the two is at or below `threshold`.
    pub fn hostile_between(&self, a: &str, b: &str, threshold: i32) -> bool {
        self.get(a, b) <= threshold || self.get(b, a) <= threshold
    }
}

/// Coarse reading of a relation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    MortalEnemy,
    Hostile,
    Antagonistic,
    Neutral,
    Ally,
    CloseCompanion,
    SwornFriend,
}

impl Stance {
    pub fn of(value: i32) -> Stance {
        match value {
            v if v >= 60 => Stance::SwornFriend,
            v if v >= 40 => Stance::CloseCompanion,
            v if v >= 10 => Stance::Ally,
            v if v <= -60 => Stance::MortalEnemy,
            v if v <= -40 => Stance::Hostile,
            v if v <= -10 => Stance::Antagonistic,
            _ => Stance::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stance::MortalEnemy => "mortal enemy",
            Stance::Hostile => "hostile",
            Stance::Antagonistic => "antagonistic",
            Stance::Neutral => "neutral",
            Stance::Ally => "ally",
            Stance::CloseCompanion => "close companion",
            Stance::SwornFriend => "sworn friend",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_edge_is_zero_and_directed() {
        let mut graph = RelationGraph::new();
        assert_eq!(graph.get("Amiya", "Brann"), 0);
        graph.set("Amiya", "Brann", 25, "shared a meal");
        assert_eq!(graph.get("Amiya", "Brann"), 25);
        assert_eq!(graph.get("Brann", "Amiya"), 0);
    }

    #[test]
    fn test_set_records_history() {
        let mut graph = RelationGraph::new();
        graph.set("A", "B", 10, "first");
        let old = graph.set("A", "B", -30, "betrayal");
        assert_eq!(old, 10);
        assert_eq!(graph.history().len(), 2);
        assert_eq!(graph.history()[1].reason, "betrayal");
        assert_eq!(graph.edges().count(), 1);
    }

    #[test]
    fn test_hostile_either_direction() {
        let mut graph = RelationGraph::new();
        graph.set("Wolf", "Amiya", -40, "hungry");
        assert!(graph.hostile_between("Amiya", "Wolf", -10));
        assert!(!graph.hostile_between("Amiya", "Brann", -10));
    }

    #[test]
    fn test_stance_bands() {
        assert_eq!(Stance::of(75), Stance::SwornFriend);
        assert_eq!(Stance::of(40), Stance::CloseCompanion);
        assert_eq!(Stance::of(9), Stance::Neutral);
        assert_eq!(Stance::of(-10), Stance::Antagonistic);
        assert_eq!(Stance::of(-45), Stance::Hostile);
        assert_eq!(Stance::of(-60).label(), "mortal enemy");
    }
}
