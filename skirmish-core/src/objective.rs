//! Scene objectives.
//!
//! Objectives keep their insertion order. `done` is terminal: completing a
//! done objective again is a no-op and it can no longer be blocked.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveStatus {
    #[default]
    Pending,
    Done,
    Blocked,
}

impl fmt::Display for ObjectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectiveStatus::Pending => "pending",
            ObjectiveStatus::Done => "done",
            ObjectiveStatus::Blocked => "blocked",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub label: String,
    pub status: ObjectiveStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveTracker {
    entries: Vec<Objective>,
}

impl ObjectiveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&Objective> {
        self.entries.iter().find(|o| o.label == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Insert a pending objective. Returns false if the label already exists.
    pub fn add(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.entries.push(Objective {
            label: label.to_string(),
            status: ObjectiveStatus::Pending,
            note: None,
        });
        true
    }

    /// Check that `label` may move to `status`, returning its current status.
    pub fn check_transition(
        &self,
        label: &str,
        status: ObjectiveStatus,
    ) -> Result<ObjectiveStatus, EngineError> {
        let current = self
            .get(label)
            .ok_or_else(|| EngineError::UnknownObjective(label.to_string()))?
            .status;
        if current == ObjectiveStatus::Done && status != ObjectiveStatus::Done {
            return Err(EngineError::ObjectiveClosed(label.to_string()));
        }
        Ok(current)
    }

    pub fn set_status(
        &mut self,
        label: &str,
        status: ObjectiveStatus,
        note: Option<String>,
    ) -> Result<(), EngineError> {
        self.check_transition(label, status)?;
        if let Some(entry) = self.entries.iter_mut().find(|o| o.label == label) {
            entry.status = status;
            if note.is_some() {
                entry.note = note;
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// At least one objective exists and none is pending.
    pub fn all_resolved(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|o| o.status != ObjectiveStatus::Pending)
    }
}
