//! Pauli bases used for stabilizers, resets and measurements.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Single-qubit Pauli basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Basis {
    /// Pauli X.
    X,
    /// Pauli Z.
    Z,
}

impl Basis {
    /// Returns the other basis.
    pub fn flipped(&self) -> Self {
        match self {
            Basis::X => Basis::Z,
            Basis::Z => Basis::X,
        }
    }
}

impl Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::X => f.write_str("X"),
            Basis::Z => f.write_str("Z"),
        }
    }
}
