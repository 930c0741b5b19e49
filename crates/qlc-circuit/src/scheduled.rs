//! Circuits whose moments are pinned to explicit schedule slots.

use std::collections::{BTreeMap, BTreeSet};

use qlc_core::{ErrorInfo, QlcError, Shift2D};
use serde::{Deserialize, Serialize};

use crate::gate::{Instruction, Moment};
use crate::qubit::GridQubit;

/// Sequence of moments with a strictly increasing schedule.
///
/// Slot `schedule[i]` holds `moments[i]`; slots absent from the schedule are
/// idle moments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduledCircuit {
    moments: Vec<Moment>,
    schedule: Vec<usize>,
}

impl ScheduledCircuit {
    /// Creates a scheduled circuit.
    pub fn new(moments: Vec<Moment>, schedule: Vec<usize>) -> Result<Self, QlcError> {
        if moments.len() != schedule.len() {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "schedule-length-mismatch",
                    "one schedule slot is required per moment",
                )
                .with_context("moments", moments.len().to_string())
                .with_context("schedule", schedule.len().to_string()),
            ));
        }
        if schedule.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(QlcError::Construction(
                ErrorInfo::new("non-increasing-schedule", "schedule must be strictly increasing")
                    .with_context("schedule", format!("{schedule:?}")),
            ));
        }
        Ok(Self { moments, schedule })
    }

    /// Schedules `moments` on consecutive slots starting at 0.
    pub fn from_moments(moments: Vec<Moment>) -> Self {
        let schedule = (0..moments.len()).collect();
        Self { moments, schedule }
    }

    /// Scheduled moments.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Slot of each scheduled moment.
    pub fn schedule(&self) -> &[usize] {
        &self.schedule
    }

    /// Number of slots spanned by the circuit, idle ones included.
    pub fn num_moments(&self) -> usize {
        self.schedule.last().map_or(0, |last| last + 1)
    }

    /// Returns `true` when no instruction is scheduled.
    pub fn is_empty(&self) -> bool {
        self.moments.iter().all(Moment::is_empty)
    }

    /// Dense list of moments where idle slots are filled with empty moments.
    pub fn dense_moments(&self) -> Vec<Moment> {
        let mut dense = vec![Moment::empty(); self.num_moments()];
        for (moment, slot) in self.moments.iter().zip(&self.schedule) {
            dense[*slot] = moment.clone();
        }
        dense
    }

    /// Every qubit used by the circuit.
    pub fn qubits(&self) -> BTreeSet<GridQubit> {
        self.moments.iter().flat_map(Moment::qubits).collect()
    }

    /// Measured qubits in time order, one entry per measurement.
    pub fn measured_qubits(&self) -> Vec<GridQubit> {
        self.moments
            .iter()
            .flat_map(|moment| moment.measured_qubits().collect::<Vec<_>>())
            .collect()
    }

    /// Number of measurements performed by the circuit.
    pub fn num_measurements(&self) -> usize {
        self.measured_qubits().len()
    }

    /// Returns the circuit with every qubit translated by `shift`.
    pub fn shifted(&self, shift: Shift2D) -> Self {
        Self {
            moments: self.moments.iter().map(|m| m.shifted(shift)).collect(),
            schedule: self.schedule.clone(),
        }
    }
}

/// Merges circuits slot by slot.
///
/// Moments sharing a slot are unioned; identical resets or measurements on a
/// shared qubit collapse, any other overlap is a `moment-qubit-collision`.
pub fn merge_scheduled_circuits(
    circuits: &[ScheduledCircuit],
) -> Result<ScheduledCircuit, QlcError> {
    let mut slots: BTreeMap<usize, Vec<Instruction>> = BTreeMap::new();
    for circuit in circuits {
        for (moment, slot) in circuit.moments.iter().zip(&circuit.schedule) {
            slots
                .entry(*slot)
                .or_default()
                .extend(moment.instructions().iter().cloned());
        }
    }
    let mut moments = Vec::with_capacity(slots.len());
    let mut schedule = Vec::with_capacity(slots.len());
    for (slot, instructions) in slots {
        moments.push(
            Moment::new(instructions)
                .map_err(|err| with_slot_context(err, slot))?,
        );
        schedule.push(slot);
    }
    ScheduledCircuit::new(moments, schedule)
}

fn with_slot_context(err: QlcError, slot: usize) -> QlcError {
    match err {
        QlcError::Construction(info) => {
            QlcError::Construction(info.with_context("slot", slot.to_string()))
        }
        other => other,
    }
}
