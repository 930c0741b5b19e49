//! Physical qubits placed on the 2-D grid.

use std::fmt::{self, Display};

use qlc_core::Shift2D;
use serde::{Deserialize, Serialize};

/// Physical qubit identified by its integer grid coordinates.
///
/// Qubits are ordered by `(x, y)`; this ordering is the canonical key used to
/// number qubits in compiled circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridQubit {
    /// Column coordinate.
    pub x: i64,
    /// Row coordinate.
    pub y: i64,
}

impl GridQubit {
    /// Creates a qubit at `(x, y)`.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the qubit translated by `shift`.
    pub fn shifted(&self, shift: Shift2D) -> Self {
        Self::new(self.x + shift.x, self.y + shift.y)
    }

    /// Returns the Manhattan distance between two qubits.
    pub fn manhattan_distance(&self, other: &Self) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Display for GridQubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q[{}, {}]", self.x, self.y)
    }
}
