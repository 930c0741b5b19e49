//! Canonical numbering of physical qubits.

use std::collections::BTreeMap;

use qlc_core::{ErrorInfo, QlcError};
use serde::{Deserialize, Serialize};

use crate::qubit::GridQubit;
use crate::wire::{Circuit, Operation};

/// Bijection between integer indices and grid qubits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QubitMap {
    by_index: BTreeMap<usize, GridQubit>,
    by_qubit: BTreeMap<GridQubit, usize>,
}

impl QubitMap {
    /// Numbers the provided qubits in `(x, y)` order, ignoring duplicates.
    pub fn from_qubits<I: IntoIterator<Item = GridQubit>>(qubits: I) -> Self {
        let mut sorted: Vec<GridQubit> = qubits.into_iter().collect();
        sorted.sort();
        sorted.dedup();
        let by_index: BTreeMap<usize, GridQubit> = sorted.into_iter().enumerate().collect();
        let by_qubit = by_index.iter().map(|(i, q)| (*q, *i)).collect();
        Self { by_index, by_qubit }
    }

    /// Index of `qubit`.
    pub fn index_of(&self, qubit: &GridQubit) -> Result<usize, QlcError> {
        self.by_qubit.get(qubit).copied().ok_or_else(|| {
            QlcError::Precondition(
                ErrorInfo::new("unknown-qubit", "qubit is absent from the qubit map")
                    .with_context("qubit", qubit.to_string()),
            )
        })
    }

    /// Qubit at `index`.
    pub fn qubit(&self, index: usize) -> Option<GridQubit> {
        self.by_index.get(&index).copied()
    }

    /// `(index, qubit)` pairs by increasing index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, GridQubit)> + '_ {
        self.by_index.iter().map(|(i, q)| (*i, *q))
    }

    /// Number of qubits.
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Returns `true` when the map is empty.
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// `QUBIT_COORDS` preamble declaring every qubit.
    pub fn to_qubit_coords_circuit(&self) -> Circuit {
        let mut circuit = Circuit::new();
        for (index, qubit) in self.iter() {
            circuit.push(Operation::QubitCoords {
                index,
                x: qubit.x,
                y: qubit.y,
            });
        }
        circuit
    }
}
