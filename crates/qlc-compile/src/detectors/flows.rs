//! GF(2) flow analysis of small Clifford circuits.
//!
//! Every measured observable is propagated backwards to the start of the
//! analysed window. On its way it may hit:
//!
//! * a reset: the commuting component is absorbed, the anticommuting one makes
//!   the outcome random and sets a marker column;
//! * an earlier measurement: the commuting component is replaced by that
//!   measurement record, the anticommuting one sets a marker column.
//!
//! A set of measurements is a detector when the XOR of their rows has no
//! residual Pauli at the window start and no marker set.
//!
//! Resets whose qubit is not measured again inside the same slice create
//! stabilizers that outlive the slice. Their absorptions are tracked in
//! "soft" columns so that detectors relying on measurements of earlier slices
//! are preferred over detectors relying on those resets.

use std::collections::{BTreeMap, BTreeSet};

use bitvec::prelude::*;
use qlc_circuit::{Circuit, CircuitItem, Gate, GridQubit, Instruction, Moment, Operation, QubitMap};
use qlc_core::{Basis, ErrorInfo, QlcError};

/// Measurement performed by an analysed circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementEvent {
    /// Measured qubit.
    pub qubit: GridQubit,
    /// Index of the moment performing the measurement.
    pub moment: usize,
    /// Index of the slice containing the moment.
    pub slice: usize,
}

/// Backward-propagated rows of every measurement of a circuit.
///
/// Row layout: `[residual x/z per qubit | markers | soft | measurements]`.
#[derive(Debug, Clone)]
pub struct FlowAnalysis {
    measurements: Vec<MeasurementEvent>,
    mandatory: usize,
    soft: usize,
    rows: Vec<BitVec>,
}

#[derive(Default)]
struct Columns {
    qubits: BTreeMap<GridQubit, usize>,
    markers: BTreeMap<(usize, GridQubit), usize>,
    soft: BTreeMap<(usize, GridQubit), usize>,
    measurements: BTreeMap<(usize, GridQubit), usize>,
}

struct Pauli {
    x: BitVec,
    z: BitVec,
}

impl FlowAnalysis {
    /// Analyses `moments` as a single slice.
    pub fn new(moments: &[Moment]) -> Result<Self, QlcError> {
        Self::from_slices(&[moments.to_vec()])
    }

    /// Analyses consecutive slices of moments, oldest first.
    pub fn from_slices(slices: &[Vec<Moment>]) -> Result<Self, QlcError> {
        let moments: Vec<&Moment> = slices.iter().flatten().collect();
        let slice_of: Vec<usize> = slices
            .iter()
            .enumerate()
            .flat_map(|(slice, moments)| std::iter::repeat(slice).take(moments.len()))
            .collect();

        let mut columns = Columns::default();
        let mut measurements = Vec::new();
        for (index, moment) in moments.iter().enumerate() {
            for qubit in moment.qubits() {
                let next = columns.qubits.len();
                columns.qubits.entry(qubit).or_insert(next);
            }
            for instruction in moment.instructions() {
                let is_reset = instruction.gate.reset_basis().is_some();
                if !is_reset && !instruction.gate.is_measurement() {
                    continue;
                }
                for qubit in &instruction.qubits {
                    let next = columns.markers.len();
                    columns.markers.insert((index, *qubit), next);
                }
            }
            for qubit in moment.measured_qubits() {
                columns.measurements.insert((index, qubit), measurements.len());
                measurements.push(MeasurementEvent {
                    qubit,
                    moment: index,
                    slice: slice_of[index],
                });
            }
        }
        for (index, moment) in moments.iter().enumerate() {
            for instruction in moment.instructions() {
                if instruction.gate.reset_basis().is_none() {
                    continue;
                }
                for qubit in &instruction.qubits {
                    let measured_later = measurements.iter().any(|event| {
                        event.qubit == *qubit
                            && event.moment > index
                            && event.slice == slice_of[index]
                    });
                    if !measured_later {
                        let next = columns.soft.len();
                        columns.soft.insert((index, *qubit), next);
                    }
                }
            }
        }

        let num_qubits = columns.qubits.len();
        let mandatory = 2 * num_qubits + columns.markers.len();
        let soft = columns.soft.len();
        let width = mandatory + soft + measurements.len();
        let mut rows = Vec::with_capacity(measurements.len());
        for (index, event) in measurements.iter().enumerate() {
            let basis = measurement_basis(&moments, event)?;
            rows.push(propagate(
                &moments, &columns, event, basis, index, mandatory, soft, width,
            )?);
        }
        Ok(Self {
            measurements,
            mandatory,
            soft,
            rows,
        })
    }

    /// Measurements in time order.
    pub fn measurements(&self) -> &[MeasurementEvent] {
        &self.measurements
    }

    /// Number of soft columns.
    pub fn num_soft_columns(&self) -> usize {
        self.soft
    }

    /// Returns `true` when the parity of `measurements` is deterministic.
    pub fn is_deterministic(&self, measurements: &[usize]) -> bool {
        if measurements.is_empty() || measurements.iter().any(|m| *m >= self.rows.len()) {
            return false;
        }
        let offset = self.mandatory + self.soft;
        let wanted: BTreeSet<usize> = measurements.iter().copied().collect();
        let mut sum = BitVec::<usize, Lsb0>::repeat(false, offset + self.rows.len());
        // Rows are triangular: row `j` only involves records up to `j`.
        for index in (0..self.rows.len()).rev() {
            if sum[offset + index] != wanted.contains(&index) {
                xor_into(&mut sum, &self.rows[index]);
            }
        }
        sum[..self.mandatory].not_any()
    }

    /// Basis of the deterministic measurement parities.
    ///
    /// Returned vectors span `[soft | measurements]`. Each one has a distinct
    /// latest measurement, so they are linearly independent.
    pub fn kernel(&self) -> Vec<BitVec> {
        let mut basis: Vec<(usize, BitVec)> = Vec::new();
        let mut kernel = Vec::new();
        for row in &self.rows {
            let mut row = row.clone();
            for (pivot, vector) in &basis {
                if row[*pivot] {
                    xor_into(&mut row, vector);
                }
            }
            match row[..self.mandatory].first_one() {
                Some(pivot) => basis.push((pivot, row)),
                None => kernel.push(row[self.mandatory..].to_bitvec()),
            }
        }
        kernel
    }
}

/// XORs `source` into the first `source.len()` bits of `target`.
pub(crate) fn xor_into(target: &mut BitVec, source: &BitSlice) {
    for index in source.iter_ones() {
        let bit = target[index];
        target.set(index, !bit);
    }
}

fn measurement_basis(moments: &[&Moment], event: &MeasurementEvent) -> Result<Basis, QlcError> {
    moments[event.moment]
        .instructions()
        .iter()
        .find(|instruction| instruction.qubits.contains(&event.qubit))
        .and_then(|instruction| instruction.gate.measurement_basis())
        .ok_or_else(|| {
            QlcError::Construction(
                ErrorInfo::new("missing-measurement", "measurement event without gate")
                    .with_context("qubit", event.qubit.to_string()),
            )
        })
}

#[allow(clippy::too_many_arguments)]
fn propagate(
    moments: &[&Moment],
    columns: &Columns,
    event: &MeasurementEvent,
    basis: Basis,
    index: usize,
    mandatory: usize,
    soft: usize,
    width: usize,
) -> Result<BitVec, QlcError> {
    let num_qubits = columns.qubits.len();
    let mut pauli = Pauli {
        x: BitVec::repeat(false, num_qubits),
        z: BitVec::repeat(false, num_qubits),
    };
    let mut row = BitVec::repeat(false, width);
    let measurement_column = |position: usize| mandatory + soft + position;
    row.set(measurement_column(index), true);

    let start = qubit_index(columns, &event.qubit)?;
    match basis {
        Basis::Z => pauli.z.set(start, true),
        Basis::X => pauli.x.set(start, true),
    }

    for moment in (0..event.moment).rev() {
        for instruction in moments[moment].instructions() {
            apply_backwards(
                instruction,
                moment,
                columns,
                &mut pauli,
                &mut row,
                mandatory,
                soft,
            )?;
        }
    }
    for position in 0..num_qubits {
        row.set(2 * position, pauli.x[position]);
        row.set(2 * position + 1, pauli.z[position]);
    }
    Ok(row)
}

fn apply_backwards(
    instruction: &Instruction,
    moment: usize,
    columns: &Columns,
    pauli: &mut Pauli,
    row: &mut BitVec,
    mandatory: usize,
    soft: usize,
) -> Result<(), QlcError> {
    let markers = 2 * columns.qubits.len();
    match instruction.gate {
        Gate::R | Gate::RX | Gate::M | Gate::MX => {
            let qubit = instruction.qubits[0];
            let position = qubit_index(columns, &qubit)?;
            let (commuting, anticommuting) = match instruction.gate {
                Gate::R | Gate::M => (pauli.z[position], pauli.x[position]),
                _ => (pauli.x[position], pauli.z[position]),
            };
            if anticommuting {
                if let Some(marker) = columns.markers.get(&(moment, qubit)) {
                    toggle(row, markers + marker);
                }
            }
            if commuting {
                if instruction.gate.is_measurement() {
                    if let Some(record) = columns.measurements.get(&(moment, qubit)) {
                        toggle(row, mandatory + soft + record);
                    }
                } else if let Some(column) = columns.soft.get(&(moment, qubit)) {
                    toggle(row, mandatory + column);
                }
            }
            pauli.x.set(position, false);
            pauli.z.set(position, false);
        }
        Gate::H => {
            let position = qubit_index(columns, &instruction.qubits[0])?;
            let (x, z) = (pauli.x[position], pauli.z[position]);
            pauli.x.set(position, z);
            pauli.z.set(position, x);
        }
        Gate::CX => {
            let control = qubit_index(columns, &instruction.qubits[0])?;
            let target = qubit_index(columns, &instruction.qubits[1])?;
            let x_target = pauli.x[target] ^ pauli.x[control];
            let z_control = pauli.z[control] ^ pauli.z[target];
            pauli.x.set(target, x_target);
            pauli.z.set(control, z_control);
        }
        Gate::CZ => {
            let a = qubit_index(columns, &instruction.qubits[0])?;
            let b = qubit_index(columns, &instruction.qubits[1])?;
            let z_a = pauli.z[a] ^ pauli.x[b];
            let z_b = pauli.z[b] ^ pauli.x[a];
            pauli.z.set(a, z_a);
            pauli.z.set(b, z_b);
        }
    }
    Ok(())
}

fn toggle(row: &mut BitVec, column: usize) {
    let bit = row[column];
    row.set(column, !bit);
}

fn qubit_index(columns: &Columns, qubit: &GridQubit) -> Result<usize, QlcError> {
    columns.qubits.get(qubit).copied().ok_or_else(|| {
        QlcError::Construction(
            ErrorInfo::new("unknown-qubit", "qubit missing from the analysed circuit")
                .with_context("qubit", qubit.to_string()),
        )
    })
}

/// Detectors and observables of a wire-format circuit, with the flows needed
/// to check them.
#[derive(Debug, Clone)]
pub struct CircuitFlows {
    /// Flows of the unrolled circuit.
    pub flows: FlowAnalysis,
    /// Absolute measurement indices of each `DETECTOR`.
    pub detectors: Vec<Vec<usize>>,
    /// Absolute measurement indices included in each observable.
    pub observables: BTreeMap<usize, Vec<usize>>,
}

impl CircuitFlows {
    /// Indices of the detectors whose parity is not deterministic.
    pub fn non_deterministic_detectors(&self) -> Vec<usize> {
        self.detectors
            .iter()
            .enumerate()
            .filter(|(_, records)| !self.flows.is_deterministic(records))
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns `true` when observable `index` is a deterministic parity.
    pub fn is_observable_deterministic(&self, index: usize) -> bool {
        self.observables
            .get(&index)
            .is_some_and(|records| self.flows.is_deterministic(records))
    }
}

/// Unrolls `circuit` and analyses its flows.
///
/// `qubit_map` translates the wire-format qubit indices back to grid qubits.
pub fn analyse_circuit(circuit: &Circuit, qubit_map: &QubitMap) -> Result<CircuitFlows, QlcError> {
    let flat = circuit.flattened();
    let mut moments = Vec::new();
    let mut current = Vec::new();
    let mut measured = 0usize;
    let mut detectors = Vec::new();
    let mut observables: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for item in flat.items() {
        match item {
            CircuitItem::Tick => moments.push(Moment::new(std::mem::take(&mut current))?),
            CircuitItem::Repeat { .. } => {
                return Err(QlcError::Construction(ErrorInfo::new(
                    "unexpected-repeat",
                    "flattened circuits contain no repeat block",
                )))
            }
            CircuitItem::Operation(Operation::Gate { gate, targets }) => {
                for group in targets.chunks(gate.arity()) {
                    let qubits = group
                        .iter()
                        .map(|index| {
                            qubit_map.qubit(*index).ok_or_else(|| {
                                QlcError::Precondition(
                                    ErrorInfo::new(
                                        "unknown-qubit-index",
                                        "gate target missing from the qubit map",
                                    )
                                    .with_context("index", index.to_string()),
                                )
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    current.push(Instruction::new(*gate, qubits)?);
                }
                if gate.is_measurement() {
                    measured += targets.len();
                }
            }
            CircuitItem::Operation(Operation::Detector { records, .. }) => {
                detectors.push(absolute_records(records, measured)?);
            }
            CircuitItem::Operation(Operation::ObservableInclude { index, records }) => {
                let entry = observables.entry(*index).or_default();
                for record in absolute_records(records, measured)? {
                    // Repeated inclusions cancel.
                    if !entry.insert(record) {
                        entry.remove(&record);
                    }
                }
            }
            CircuitItem::Operation(_) => {}
        }
    }
    if !current.is_empty() {
        moments.push(Moment::new(current)?);
    }
    Ok(CircuitFlows {
        flows: FlowAnalysis::new(&moments)?,
        detectors,
        observables: observables
            .into_iter()
            .map(|(index, records)| (index, records.into_iter().collect()))
            .collect(),
    })
}

fn absolute_records(records: &[i64], measured: usize) -> Result<Vec<usize>, QlcError> {
    records
        .iter()
        .map(|record| {
            usize::try_from(measured as i64 + record).map_err(|_| {
                QlcError::Lookback(
                    ErrorInfo::new("record-before-start", "record precedes the first measurement")
                        .with_context("record", record.to_string()),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(x: i64, y: i64) -> GridQubit {
        GridQubit::new(x, y)
    }

    fn moment(instructions: Vec<Instruction>) -> Moment {
        Moment::new(instructions).unwrap()
    }

    #[test]
    fn reset_then_measure_is_deterministic() {
        let moments = vec![
            moment(vec![Instruction::single(Gate::R, q(0, 0))]),
            moment(vec![Instruction::single(Gate::M, q(0, 0))]),
        ];
        let analysis = FlowAnalysis::new(&moments).unwrap();
        assert!(analysis.is_deterministic(&[0]));
        assert_eq!(analysis.kernel().len(), 1);
    }

    #[test]
    fn basis_mismatch_is_random() {
        let moments = vec![
            moment(vec![Instruction::single(Gate::RX, q(0, 0))]),
            moment(vec![Instruction::single(Gate::M, q(0, 0))]),
        ];
        let analysis = FlowAnalysis::new(&moments).unwrap();
        assert!(!analysis.is_deterministic(&[0]));
        assert!(analysis.kernel().is_empty());
    }

    #[test]
    fn repeated_measurements_compare() {
        let moments = vec![
            moment(vec![Instruction::single(Gate::M, q(0, 0))]),
            moment(vec![Instruction::single(Gate::M, q(0, 0))]),
        ];
        let analysis = FlowAnalysis::new(&moments).unwrap();
        assert!(!analysis.is_deterministic(&[0]));
        assert!(!analysis.is_deterministic(&[1]));
        assert!(analysis.is_deterministic(&[0, 1]));
    }

    #[test]
    fn bell_pair_parities() {
        let a = q(0, 0);
        let b = q(2, 0);
        let moments = vec![
            moment(vec![Instruction::single(Gate::R, a), Instruction::single(Gate::R, b)]),
            moment(vec![Instruction::single(Gate::H, a)]),
            moment(vec![Instruction::pair(Gate::CX, a, b).unwrap()]),
            moment(vec![Instruction::single(Gate::M, a), Instruction::single(Gate::M, b)]),
        ];
        let analysis = FlowAnalysis::new(&moments).unwrap();
        assert!(!analysis.is_deterministic(&[0]));
        assert!(!analysis.is_deterministic(&[1]));
        assert!(analysis.is_deterministic(&[0, 1]));
    }

    #[test]
    fn soft_columns_track_resets_outliving_the_slice() {
        let data = q(1, 1);
        let syndrome = q(0, 0);
        let slice = vec![
            moment(vec![
                Instruction::single(Gate::R, data),
                Instruction::single(Gate::R, syndrome),
            ]),
            moment(vec![Instruction::pair(Gate::CX, data, syndrome).unwrap()]),
            moment(vec![Instruction::single(Gate::M, syndrome)]),
        ];
        let analysis = FlowAnalysis::from_slices(&[slice]).unwrap();
        assert_eq!(analysis.num_soft_columns(), 1);
        let kernel = analysis.kernel();
        assert_eq!(kernel.len(), 1);
        assert!(kernel[0][0]);
    }
}
