#![deny(missing_docs)]
#![doc = "Circuit model of the QLC block compiler: grid qubits, scheduled moments, measurement records and the stim-compatible wire format."]

pub mod gate;
pub mod qubit;
pub mod qubit_map;
pub mod records;
pub mod scheduled;
pub mod wire;

pub use gate::{Gate, Instruction, Moment};
pub use qubit::GridQubit;
pub use qubit_map::QubitMap;
pub use records::MeasurementRecordsMap;
pub use scheduled::{merge_scheduled_circuits, ScheduledCircuit};
pub use wire::{Circuit, CircuitItem, Operation};
