//! Guardian assignments.
//!
//! Each protectee has at most one guardian. Assignments persist until they
//! are cleared; intercepting an attack costs the guardian's reaction, not the
//! assignment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardians {
    /// protectee -> guardian
    by_protectee: BTreeMap<String, String>,
}

impl Guardians {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a guardian, returning the one it replaced.
    pub fn set(&mut self, guardian: &str, protectee: &str) -> Option<String> {
        self.by_protectee
            .insert(protectee.to_string(), guardian.to_string())
    }

    pub fn remove(&mut self, protectee: &str) -> Option<String> {
        self.by_protectee.remove(protectee)
    }

    pub fn guardian_of(&self, protectee: &str) -> Option<&str> {
        self.by_protectee.get(protectee).map(String::as_str)
    }

    /// Pairs `(guardian, protectee)` matching the filters; `None` matches anything.
    pub fn matching(&self, guardian: Option<&str>, protectee: Option<&str>) -> Vec<(String, String)> {
        self.by_protectee
            .iter()
            .filter(|(p, g)| {
                guardian.map_or(true, |want| want == g.as_str())
                    && protectee.map_or(true, |want| want == p.as_str())
            })
            .map(|(p, g)| (g.clone(), p.clone()))
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.by_protectee
    }

    pub fn len(&self) -> usize {
        self.by_protectee.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_protectee.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_guardian_per_protectee() {
        let mut guardians = Guardians::new();
        assert_eq!(guardians.set("Brann", "Amiya"), None);
        assert_eq!(guardians.set("Cato", "Amiya"), Some("Brann".to_string()));
        assert_eq!(guardians.guardian_of("Amiya"), Some("Cato"));
        assert_eq!(guardians.len(), 1);
    }

    #[test]
    fn test_matching_with_wildcards() {
        let mut guardians = Guardians::new();
        guardians.set("Brann", "Amiya");
        guardians.set("Brann", "Cato");
        guardians.set("Dara", "Eli");

        assert_eq!(guardians.matching(Some("Brann"), None).len(), 2);
        assert_eq!(guardians.matching(None, Some("Eli")), vec![("Dara".to_string(), "Eli".to_string())]);
        assert_eq!(guardians.matching(Some("Dara"), Some("Amiya")).len(), 0);
        assert_eq!(guardians.matching(None, None).len(), 3);
    }
}
