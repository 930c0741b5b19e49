//! Plaquettes and indexed plaquette collections.

use std::collections::{BTreeMap, BTreeSet};

use qlc_circuit::{GridQubit, ScheduledCircuit};
use qlc_core::Basis;
use serde::{Deserialize, Serialize};

/// Name of the plaquette without any qubit nor operation.
pub const EMPTY_PLAQUETTE_NAME: &str = "empty";

/// Small circuit implementing one stabilizer round around a syndrome qubit.
///
/// Qubits are local: the syndrome qubit of a full plaquette sits at `(0, 0)`
/// and data qubits at `(±1, ±1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaquette {
    name: String,
    syndrome_qubits: Vec<GridQubit>,
    data_qubits: Vec<GridQubit>,
    circuit: ScheduledCircuit,
    debug_basis: Option<Basis>,
}

impl Plaquette {
    /// Creates a plaquette.
    pub fn new(
        name: impl Into<String>,
        syndrome_qubits: Vec<GridQubit>,
        data_qubits: Vec<GridQubit>,
        circuit: ScheduledCircuit,
        debug_basis: Option<Basis>,
    ) -> Self {
        Self {
            name: name.into(),
            syndrome_qubits,
            data_qubits,
            circuit,
            debug_basis,
        }
    }

    /// Plaquette without qubits nor operations.
    pub fn empty() -> Self {
        Self::new(
            EMPTY_PLAQUETTE_NAME,
            Vec::new(),
            Vec::new(),
            ScheduledCircuit::default(),
            None,
        )
    }

    /// Canonical name, unique per distinct circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local circuit.
    pub fn circuit(&self) -> &ScheduledCircuit {
        &self.circuit
    }

    /// Syndrome qubits in local coordinates.
    pub fn syndrome_qubits(&self) -> &[GridQubit] {
        &self.syndrome_qubits
    }

    /// Data qubits in local coordinates, drawing order.
    pub fn data_qubits(&self) -> &[GridQubit] {
        &self.data_qubits
    }

    /// All qubits of the plaquette.
    pub fn qubits(&self) -> BTreeSet<GridQubit> {
        self.syndrome_qubits
            .iter()
            .chain(&self.data_qubits)
            .copied()
            .collect()
    }

    /// Stabilizer basis, used for drawing.
    pub fn debug_basis(&self) -> Option<Basis> {
        self.debug_basis
    }

    /// Number of measurements performed by one round.
    pub fn num_measurements(&self) -> usize {
        self.circuit.num_measurements()
    }

    /// Returns `true` when the plaquette has no operation.
    pub fn is_empty(&self) -> bool {
        self.circuit.is_empty()
    }
}

/// Collection of plaquettes indexed by template indices.
///
/// Indices without an entry (index `0` in particular) resolve to the empty
/// plaquette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaquettes {
    collection: BTreeMap<usize, Plaquette>,
    #[serde(skip, default = "Plaquette::empty")]
    empty: Plaquette,
}

impl Default for Plaquettes {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl Plaquettes {
    /// Wraps an index to plaquette mapping.
    pub fn new(collection: BTreeMap<usize, Plaquette>) -> Self {
        Self {
            collection,
            empty: Plaquette::empty(),
        }
    }

    /// Plaquette at `index`, the empty plaquette if absent.
    pub fn get(&self, index: usize) -> &Plaquette {
        self.collection.get(&index).unwrap_or(&self.empty)
    }

    /// Returns `true` when `index` has an explicit entry.
    pub fn contains(&self, index: usize) -> bool {
        self.collection.contains_key(&index)
    }

    /// Explicit entries by increasing index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Plaquette)> {
        self.collection.iter().map(|(index, plaquette)| (*index, plaquette))
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Returns `true` without explicit entries.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Copy without the entries at `indices`.
    pub fn without_plaquettes(&self, indices: &BTreeSet<usize>) -> Self {
        Self::new(
            self.collection
                .iter()
                .filter(|(index, _)| !indices.contains(index))
                .map(|(index, plaquette)| (*index, plaquette.clone()))
                .collect(),
        )
    }

    /// Copy where `updates` overrides existing entries.
    pub fn with_updated_plaquettes(&self, updates: BTreeMap<usize, Plaquette>) -> Self {
        let mut collection = self.collection.clone();
        collection.extend(updates);
        Self::new(collection)
    }

    /// Copy with indices renamed through `mapping`; unmapped entries are dropped.
    pub fn with_mapped_indices(&self, mapping: &BTreeMap<usize, usize>) -> Self {
        Self::new(
            self.collection
                .iter()
                .filter_map(|(index, plaquette)| {
                    mapping.get(index).map(|mapped| (*mapped, plaquette.clone()))
                })
                .collect(),
        )
    }

    /// Name of each explicit entry, the canonical description of the collection.
    pub fn names(&self) -> BTreeMap<usize, String> {
        self.collection
            .iter()
            .map(|(index, plaquette)| (*index, plaquette.name().to_string()))
            .collect()
    }
}
