//! Grid positions and distance.
//!
//! Distance is Chebyshev: a diagonal step costs the same as an orthogonal one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the integer grid. Serializes as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Steps between two cells.
    pub fn distance(self, other: GridPos) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.max(dy).min(u64::from(u32::MAX)) as u32
    }

    /// Walk up to `steps` straight steps toward `target`.
    ///
    /// Each step moves one cell along every axis that still differs, so the
    /// distance to `target` shrinks by exactly one per step.
    pub fn step_toward(self, target: GridPos, steps: u32) -> GridPos {
        let steps = i64::from(steps.min(self.distance(target)));
        let advance = |from: i32, to: i32| -> i32 {
            let delta = i64::from(to) - i64::from(from);
            (i64::from(from) + delta.signum() * delta.abs().min(steps)) as i32
        };
        GridPos {
            x: advance(self.x, target.x),
            y: advance(self.y, target.y),
        }
    }

    pub fn is_adjacent(self, other: GridPos) -> bool {
        self.distance(other) <= 1
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        GridPos { x, y }
    }
}

impl From<GridPos> for (i32, i32) {
    fn from(pos: GridPos) -> Self {
        (pos.x, pos.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
