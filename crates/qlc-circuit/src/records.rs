//! Global measurement offsets indexed by qubit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::qubit::GridQubit;
use crate::scheduled::ScheduledCircuit;

/// Maps `(qubit, per-qubit offset)` to the global negative offset of a
/// measurement.
///
/// The most recent measurement overall has global offset `-1`. For each qubit
/// offsets are stored from the oldest to the most recent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeasurementRecordsMap {
    records: BTreeMap<GridQubit, Vec<i64>>,
    num_measurements: usize,
}

impl MeasurementRecordsMap {
    /// Records for the measurements of `circuit`.
    pub fn from_scheduled_circuit(circuit: &ScheduledCircuit) -> Self {
        Self::from_measured_qubits(&circuit.measured_qubits())
    }

    /// Records for measurements performed on `qubits`, in time order.
    pub fn from_measured_qubits(qubits: &[GridQubit]) -> Self {
        let total = qubits.len() as i64;
        let mut records: BTreeMap<GridQubit, Vec<i64>> = BTreeMap::new();
        for (index, qubit) in qubits.iter().enumerate() {
            records.entry(*qubit).or_default().push(index as i64 - total);
        }
        Self {
            records,
            num_measurements: qubits.len(),
        }
    }

    /// Appends the measurements of `newer`, which happen after every
    /// measurement already recorded.
    pub fn with_added_measurements(&self, newer: &MeasurementRecordsMap) -> Self {
        let shift = newer.num_measurements as i64;
        let mut records: BTreeMap<GridQubit, Vec<i64>> = self
            .records
            .iter()
            .map(|(qubit, offsets)| (*qubit, offsets.iter().map(|o| o - shift).collect()))
            .collect();
        for (qubit, offsets) in &newer.records {
            records
                .entry(*qubit)
                .or_default()
                .extend(offsets.iter().copied());
        }
        Self {
            records,
            num_measurements: self.num_measurements + newer.num_measurements,
        }
    }

    /// Global offset of the measurement of `qubit` at `per_qubit_offset`
    /// (`-1` being the latest measurement of that qubit).
    pub fn get(&self, qubit: &GridQubit, per_qubit_offset: i64) -> Option<i64> {
        if per_qubit_offset >= 0 {
            return None;
        }
        let offsets = self.records.get(qubit)?;
        let index = offsets.len() as i64 + per_qubit_offset;
        usize::try_from(index)
            .ok()
            .and_then(|index| offsets.get(index))
            .copied()
    }

    /// Returns `true` when `qubit` has at least one recorded measurement.
    pub fn contains(&self, qubit: &GridQubit) -> bool {
        self.records.contains_key(qubit)
    }

    /// Offsets recorded for `qubit`, oldest first.
    pub fn offsets(&self, qubit: &GridQubit) -> &[i64] {
        self.records.get(qubit).map_or(&[], Vec::as_slice)
    }

    /// Total number of recorded measurements.
    pub fn num_measurements(&self) -> usize {
        self.num_measurements
    }

    /// Measured qubits.
    pub fn qubits(&self) -> impl Iterator<Item = &GridQubit> {
        self.records.keys()
    }
}
