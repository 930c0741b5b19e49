//! Gates, instructions and moments.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use qlc_core::{Basis, ErrorInfo, QlcError, Shift2D};
use serde::{Deserialize, Serialize};

use crate::qubit::GridQubit;

/// Gate set understood by the compiler.
///
/// The declaration order is the order in which gates are emitted inside a
/// normalized moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gate {
    /// Reset in the Z basis.
    R,
    /// Reset in the X basis.
    RX,
    /// Hadamard.
    H,
    /// Controlled-X, targets are `(control, target)`.
    CX,
    /// Controlled-Z.
    CZ,
    /// Measurement in the Z basis.
    M,
    /// Measurement in the X basis.
    MX,
}

impl Gate {
    /// Wire-format name of the gate.
    pub fn name(&self) -> &'static str {
        match self {
            Gate::R => "R",
            Gate::RX => "RX",
            Gate::H => "H",
            Gate::CX => "CX",
            Gate::CZ => "CZ",
            Gate::M => "M",
            Gate::MX => "MX",
        }
    }

    /// Number of qubits the gate acts on.
    pub fn arity(&self) -> usize {
        match self {
            Gate::CX | Gate::CZ => 2,
            _ => 1,
        }
    }

    /// Reset gate in `basis`.
    pub fn reset(basis: Basis) -> Self {
        match basis {
            Basis::X => Gate::RX,
            Basis::Z => Gate::R,
        }
    }

    /// Measurement gate in `basis`.
    pub fn measurement(basis: Basis) -> Self {
        match basis {
            Basis::X => Gate::MX,
            Basis::Z => Gate::M,
        }
    }

    /// Basis of a reset gate.
    pub fn reset_basis(&self) -> Option<Basis> {
        match self {
            Gate::R => Some(Basis::Z),
            Gate::RX => Some(Basis::X),
            _ => None,
        }
    }

    /// Basis of a measurement gate.
    pub fn measurement_basis(&self) -> Option<Basis> {
        match self {
            Gate::M => Some(Basis::Z),
            Gate::MX => Some(Basis::X),
            _ => None,
        }
    }

    /// Returns `true` for measurements.
    pub fn is_measurement(&self) -> bool {
        self.measurement_basis().is_some()
    }

    /// Identical mergeable instructions coming from different plaquettes on
    /// the same qubit collapse into a single instruction.
    ///
    /// Data-qubit resets, measurements and basis changes are listed by every
    /// plaquette touching the qubit.
    pub fn is_mergeable(&self) -> bool {
        self.reset_basis().is_some() || self.is_measurement() || matches!(self, Gate::H)
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One application of a gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instruction {
    /// Applied gate.
    pub gate: Gate,
    /// Qubits, `gate.arity()` of them.
    pub qubits: Vec<GridQubit>,
}

impl Instruction {
    /// Creates an instruction, checking the number and distinctness of qubits.
    pub fn new(gate: Gate, qubits: Vec<GridQubit>) -> Result<Self, QlcError> {
        let distinct: BTreeSet<_> = qubits.iter().collect();
        if qubits.len() != gate.arity() || distinct.len() != qubits.len() {
            return Err(QlcError::Construction(
                ErrorInfo::new("invalid-instruction", "wrong number of distinct qubits")
                    .with_context("gate", gate.name())
                    .with_context("qubits", qubits.len().to_string()),
            ));
        }
        Ok(Self { gate, qubits })
    }

    /// Single-qubit instruction.
    pub fn single(gate: Gate, qubit: GridQubit) -> Self {
        Self {
            gate,
            qubits: vec![qubit],
        }
    }

    /// Two-qubit instruction with distinct qubits.
    pub fn pair(gate: Gate, first: GridQubit, second: GridQubit) -> Result<Self, QlcError> {
        Self::new(gate, vec![first, second])
    }

    /// Returns the instruction with every qubit translated by `shift`.
    pub fn shifted(&self, shift: Shift2D) -> Self {
        Self {
            gate: self.gate,
            qubits: self.qubits.iter().map(|q| q.shifted(shift)).collect(),
        }
    }
}

/// Set of instructions executed in parallel, acting on disjoint qubits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Moment {
    instructions: Vec<Instruction>,
}

impl Moment {
    /// Builds a normalized moment, collapsing identical mergeable instructions.
    ///
    /// Fails when two non-identical instructions touch the same qubit.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, QlcError> {
        let mut unique = Vec::with_capacity(instructions.len());
        let mut merged = BTreeSet::new();
        for instruction in instructions {
            if instruction.gate.is_mergeable() && !merged.insert(instruction.clone()) {
                continue;
            }
            unique.push(instruction);
        }
        unique.sort();
        let mut seen = BTreeSet::new();
        for instruction in &unique {
            for qubit in &instruction.qubits {
                if !seen.insert(*qubit) {
                    return Err(QlcError::Construction(
                        ErrorInfo::new(
                            "moment-qubit-collision",
                            "two instructions in the same moment act on one qubit",
                        )
                        .with_context("qubit", qubit.to_string())
                        .with_context("gate", instruction.gate.name()),
                    ));
                }
            }
        }
        Ok(Self {
            instructions: unique,
        })
    }

    /// Empty moment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Instructions sorted by gate then qubits.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns `true` when the moment contains no instruction.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Qubits measured in this moment, in emission order.
    pub fn measured_qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.instructions
            .iter()
            .filter(|instruction| instruction.gate.is_measurement())
            .flat_map(|instruction| instruction.qubits.iter().copied())
    }

    /// Every qubit touched by the moment.
    pub fn qubits(&self) -> impl Iterator<Item = GridQubit> + '_ {
        self.instructions
            .iter()
            .flat_map(|instruction| instruction.qubits.iter().copied())
    }

    /// Returns the moment with every qubit translated by `shift`.
    pub fn shifted(&self, shift: Shift2D) -> Self {
        let mut instructions: Vec<_> = self
            .instructions
            .iter()
            .map(|instruction| instruction.shifted(shift))
            .collect();
        instructions.sort();
        Self { instructions }
    }
}
