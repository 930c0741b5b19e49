//! Wire-format circuit: qubit indices, explicit `TICK` barriers, `REPEAT`
//! blocks and annotations, rendered as stim text.

use std::fmt::{self, Display, Write as _};

use itertools::Itertools;
use qlc_core::{Basis, QlcError};
use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::qubit_map::QubitMap;
use crate::scheduled::ScheduledCircuit;

/// Non-control-flow instruction of a wire-format circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Gate broadcast over targets (pairs for two-qubit gates).
    Gate {
        /// Applied gate.
        gate: Gate,
        /// Qubit indices.
        targets: Vec<usize>,
    },
    /// Coordinate declaration of one qubit.
    QubitCoords {
        /// Qubit index.
        index: usize,
        /// Column.
        x: i64,
        /// Row.
        y: i64,
    },
    /// Parity check over past measurements.
    Detector {
        /// Space-time coordinates.
        coords: Vec<i64>,
        /// Negative measurement offsets.
        records: Vec<i64>,
    },
    /// Contribution of past measurements to a logical observable.
    ObservableInclude {
        /// Observable index.
        index: usize,
        /// Negative measurement offsets.
        records: Vec<i64>,
    },
    /// Shift applied to the coordinates of subsequent detectors.
    ShiftCoords(Vec<i64>),
    /// Drawing hint for one plaquette.
    Polygon {
        /// Stabilizer basis, selects the colour.
        basis: Basis,
        /// Qubit indices of the polygon corners.
        targets: Vec<usize>,
    },
}

/// Element of a wire-format circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitItem {
    /// Plain instruction.
    Operation(Operation),
    /// Moment barrier.
    Tick,
    /// Body executed `count` times.
    Repeat {
        /// Number of repetitions.
        count: u64,
        /// Repeated body.
        body: Circuit,
    },
}

/// Ordered list of wire-format items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Circuit {
    items: Vec<CircuitItem>,
}

impl Circuit {
    /// Empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates a scheduled circuit, one `TICK` between consecutive slots.
    pub fn from_scheduled(
        circuit: &ScheduledCircuit,
        qubit_map: &QubitMap,
    ) -> Result<Self, QlcError> {
        let mut result = Circuit::new();
        for (slot, moment) in circuit.dense_moments().iter().enumerate() {
            if slot > 0 {
                result.append_tick();
            }
            for (gate, group) in &moment
                .instructions()
                .iter()
                .group_by(|instruction| instruction.gate)
            {
                let mut targets = Vec::new();
                for instruction in group {
                    for qubit in &instruction.qubits {
                        targets.push(qubit_map.index_of(qubit)?);
                    }
                }
                result.push(Operation::Gate { gate, targets });
            }
        }
        Ok(result)
    }

    /// Items of the circuit.
    pub fn items(&self) -> &[CircuitItem] {
        &self.items
    }

    /// Returns `true` when the circuit has no item.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an operation.
    pub fn push(&mut self, operation: Operation) {
        self.items.push(CircuitItem::Operation(operation));
    }

    /// Appends a `TICK`.
    pub fn append_tick(&mut self) {
        self.items.push(CircuitItem::Tick);
    }

    /// Appends every item of `other`.
    pub fn extend(&mut self, other: Circuit) {
        self.items.extend(other.items);
    }

    /// Appends `body` wrapped in a `REPEAT count` block.
    pub fn push_repeat(&mut self, count: u64, body: Circuit) {
        self.items.push(CircuitItem::Repeat { count, body });
    }

    /// Number of measurements executed, repetitions included.
    pub fn num_measurements(&self) -> u64 {
        self.fold_count(&|operation| match operation {
            Operation::Gate { gate, targets } if gate.is_measurement() => targets.len() as u64,
            _ => 0,
        })
    }

    /// Number of detectors declared, repetitions included.
    pub fn num_detectors(&self) -> u64 {
        self.fold_count(&|operation| u64::from(matches!(operation, Operation::Detector { .. })))
    }

    /// Number of distinct observables: one more than the largest index.
    pub fn num_observables(&self) -> usize {
        self.flattened()
            .items
            .iter()
            .filter_map(|item| match item {
                CircuitItem::Operation(Operation::ObservableInclude { index, .. }) => {
                    Some(index + 1)
                }
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Number of `TICK`s executed, repetitions included.
    pub fn num_ticks(&self) -> u64 {
        self.items
            .iter()
            .map(|item| match item {
                CircuitItem::Tick => 1,
                CircuitItem::Operation(_) => 0,
                CircuitItem::Repeat { count, body } => count * body.num_ticks(),
            })
            .sum()
    }

    /// Circuit with every `REPEAT` block unrolled.
    pub fn flattened(&self) -> Circuit {
        let mut result = Circuit::new();
        for item in &self.items {
            match item {
                CircuitItem::Repeat { count, body } => {
                    let body = body.flattened();
                    for _ in 0..*count {
                        result.items.extend(body.items.iter().cloned());
                    }
                }
                other => result.items.push(other.clone()),
            }
        }
        result
    }

    fn fold_count(&self, count: &dyn Fn(&Operation) -> u64) -> u64 {
        self.items
            .iter()
            .map(|item| match item {
                CircuitItem::Operation(operation) => count(operation),
                CircuitItem::Tick => 0,
                CircuitItem::Repeat { count: reps, body } => reps * body.fold_count(count),
            })
            .sum()
    }

    fn render(&self, out: &mut String, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        for item in &self.items {
            match item {
                CircuitItem::Tick => writeln!(out, "{pad}TICK")?,
                CircuitItem::Operation(operation) => writeln!(out, "{pad}{operation}")?,
                CircuitItem::Repeat { count, body } => {
                    writeln!(out, "{pad}REPEAT {count} {{")?;
                    body.render(out, indent + 4)?;
                    writeln!(out, "{pad}}}")?;
                }
            }
        }
        Ok(())
    }
}

fn join<T: Display>(values: &[T], separator: &str) -> String {
    values.iter().map(ToString::to_string).join(separator)
}

fn records(values: &[i64]) -> String {
    values.iter().map(|offset| format!(" rec[{offset}]")).join("")
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate { gate, targets } => write!(f, "{gate} {}", join(targets, " ")),
            Operation::QubitCoords { index, x, y } => write!(f, "QUBIT_COORDS({x}, {y}) {index}"),
            Operation::Detector { coords, records: recs } => {
                write!(f, "DETECTOR({}){}", join(coords, ", "), records(recs))
            }
            Operation::ObservableInclude { index, records: recs } => {
                write!(f, "OBSERVABLE_INCLUDE({index}){}", records(recs))
            }
            Operation::ShiftCoords(shift) => write!(f, "SHIFT_COORDS({})", join(shift, ", ")),
            Operation::Polygon { basis, targets } => {
                let colour = match basis {
                    Basis::X => "1,0,0,0.25",
                    Basis::Z => "0,0,1,0.25",
                };
                write!(f, "#!pragma POLYGON({colour}) {}", join(targets, " "))
            }
        }
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out, 0)?;
        f.write_str(&out)
    }
}
