//! Detectors expressed through per-qubit measurement offsets.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use qlc_circuit::GridQubit;
use qlc_core::{ErrorInfo, QlcError, Shift2D};
use serde::{Deserialize, Serialize};

/// One measurement of `qubit`, `offset` counting back from the most recent
/// measurement of that qubit (`-1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Measurement {
    qubit: GridQubit,
    offset: i64,
}

impl Measurement {
    /// Creates a measurement reference; `offset` must be negative.
    pub fn new(qubit: GridQubit, offset: i64) -> Result<Self, QlcError> {
        if offset >= 0 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "non-negative-offset",
                    "measurement offsets count backwards and must be negative",
                )
                .with_context("qubit", qubit.to_string())
                .with_context("offset", offset.to_string()),
            ));
        }
        Ok(Self { qubit, offset })
    }

    /// Measured qubit.
    pub fn qubit(&self) -> GridQubit {
        self.qubit
    }

    /// Per-qubit offset.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Same measurement on the qubit translated by `shift`.
    pub fn offset_spatially_by(&self, shift: Shift2D) -> Self {
        Self {
            qubit: self.qubit.shifted(shift),
            offset: self.offset,
        }
    }
}

impl Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}[{}]", self.qubit, self.offset)
    }
}

/// Set of measurements whose parity is deterministic, with the space-time
/// coordinates `(x, y, t)` it is reported at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Detector {
    measurements: BTreeSet<Measurement>,
    coordinates: [i64; 3],
}

impl Detector {
    /// Creates a detector from a non-empty set of measurements.
    pub fn new(
        measurements: BTreeSet<Measurement>,
        coordinates: [i64; 3],
    ) -> Result<Self, QlcError> {
        if measurements.is_empty() {
            return Err(QlcError::Construction(
                ErrorInfo::new("empty-detector", "a detector needs at least one measurement")
                    .with_context("coordinates", format!("{coordinates:?}")),
            ));
        }
        Ok(Self {
            measurements,
            coordinates,
        })
    }

    /// Measurements whose parity is checked.
    pub fn measurements(&self) -> &BTreeSet<Measurement> {
        &self.measurements
    }

    /// `(x, y, t)` coordinates.
    pub fn coordinates(&self) -> [i64; 3] {
        self.coordinates
    }

    /// Same detector with qubits and spatial coordinates translated by `shift`.
    pub fn offset_spatially_by(&self, shift: Shift2D) -> Self {
        let [x, y, t] = self.coordinates;
        Self {
            measurements: self
                .measurements
                .iter()
                .map(|measurement| measurement.offset_spatially_by(shift))
                .collect(),
            coordinates: [x + shift.x, y + shift.y, t],
        }
    }
}

impl Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let measurements: Vec<String> = self.measurements.iter().map(ToString::to_string).collect();
        write!(f, "D{:?}{{{}}}", self.coordinates, measurements.join(", "))
    }
}

/// Detectors of one situation, in canonical order.
pub type Detectors = BTreeSet<Detector>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_rejects_non_negative_offsets() {
        let err = Measurement::new(GridQubit::new(0, 0), 0).unwrap_err();
        assert_eq!(err.code(), "non-negative-offset");
        assert!(Measurement::new(GridQubit::new(0, 0), -1).is_ok());
    }

    #[test]
    fn shifting_moves_qubits_and_coordinates() {
        let measurement = Measurement::new(GridQubit::new(1, 1), -2).unwrap();
        let detector = Detector::new(BTreeSet::from([measurement]), [0, 0, 0]).unwrap();
        let shifted = detector.offset_spatially_by(Shift2D::new(4, -2));
        assert_eq!(shifted.coordinates(), [4, -2, 0]);
        let moved = shifted.measurements().iter().next().unwrap();
        assert_eq!(moved.qubit(), GridQubit::new(5, -1));
        assert_eq!(moved.offset(), -2);
    }

    #[test]
    fn empty_detectors_are_rejected() {
        let err = Detector::new(BTreeSet::new(), [0, 0, 0]).unwrap_err();
        assert!(matches!(err, QlcError::Construction(_)));
    }
}
