//! Tension, story marks and the current scene.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensionBand {
    Calm,
    Tightening,
    Oppressive,
}

impl TensionBand {
    pub fn of(tension: i32) -> TensionBand {
        match tension {
            t if t <= 1 => TensionBand::Calm,
            t if t <= 3 => TensionBand::Tightening,
            _ => TensionBand::Oppressive,
        }
    }
}

impl fmt::Display for TensionBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TensionBand::Calm => "calm",
            TensionBand::Tightening => "tightening",
            TensionBand::Oppressive => "oppressive",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mood {
    pub tension: i32,
    /// Append-only.
    marks: Vec<String>,
}

impl Mood {
    pub fn new(tension: i32) -> Self {
        Self {
            tension: tension.max(0),
            marks: Vec::new(),
        }
    }

    /// Tension after applying `delta`, floored at zero.
    pub fn adjusted(&self, delta: i32) -> i32 {
        self.tension.saturating_add(delta).max(0)
    }

    pub fn set_tension(&mut self, tension: i32) {
        self.tension = tension.max(0);
    }

    pub fn add_mark(&mut self, mark: impl Into<String>) {
        self.marks.push(mark.into());
    }

    pub fn marks(&self) -> &[String] {
        &self.marks
    }

    pub fn band(&self) -> TensionBand {
        TensionBand::of(self.tension)
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::new(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub weather: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tension_floor_and_band() {
        let mut mood = Mood::default();
        assert_eq!(mood.band(), TensionBand::Calm);
        assert_eq!(mood.adjusted(-5), 0);
        mood.set_tension(mood.adjusted(2));
        assert_eq!(mood.tension, 3);
        assert_eq!(mood.band(), TensionBand::Tightening);
        mood.set_tension(4);
        assert_eq!(mood.band().to_string(), "oppressive");
    }

    #[test]
    fn test_marks_append() {
        let mut mood = Mood::default();
        mood.add_mark("the bridge burned");
        mood.add_mark("Eli lied");
        assert_eq!(mood.marks(), &["the bridge burned".to_string(), "Eli lied".to_string()]);
    }
}
