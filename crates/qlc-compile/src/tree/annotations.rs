//! Values attached to tree nodes for one value of `k`.

use qlc_circuit::{GridQubit, MeasurementRecordsMap, Operation, QubitMap, ScheduledCircuit};
use qlc_core::{Basis, ErrorInfo, QlcError};
use serde::{Deserialize, Serialize};

use crate::detectors::Detector;

/// Everything needed to emit one `DETECTOR` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorAnnotation {
    coordinates: [i64; 3],
    measurement_offsets: Vec<i64>,
}

impl DetectorAnnotation {
    /// Creates an annotation over strictly negative global offsets.
    pub fn new(coordinates: [i64; 3], measurement_offsets: Vec<i64>) -> Result<Self, QlcError> {
        check_offsets(&measurement_offsets, "detector")?;
        Ok(Self {
            coordinates,
            measurement_offsets,
        })
    }

    /// Resolves every measurement of `detector` in `records`.
    ///
    /// A measurement missing from `records` happened before the lookback
    /// window and is reported as a [`QlcError::Lookback`] error.
    pub fn from_detector(
        detector: &Detector,
        records: &MeasurementRecordsMap,
    ) -> Result<Self, QlcError> {
        let mut offsets = Vec::with_capacity(detector.measurements().len());
        for measurement in detector.measurements() {
            let Some(offset) = records.get(&measurement.qubit(), measurement.offset()) else {
                return Err(QlcError::Lookback(
                    ErrorInfo::new(
                        "measurement-outside-window",
                        "a detector references a measurement older than the lookback window",
                    )
                    .with_context("qubit", measurement.qubit().to_string())
                    .with_context("offset", measurement.offset().to_string())
                    .with_context(
                        "recorded",
                        records.offsets(&measurement.qubit()).len().to_string(),
                    )
                    .with_hint("increase the lookback depth"),
                ));
            };
            offsets.push(offset);
        }
        offsets.sort_unstable();
        Self::new(detector.coordinates(), offsets)
    }

    /// `(x, y, t)` coordinates.
    pub fn coordinates(&self) -> [i64; 3] {
        self.coordinates
    }

    /// Global measurement offsets.
    pub fn measurement_offsets(&self) -> &[i64] {
        &self.measurement_offsets
    }

    /// Wire-format instruction.
    pub fn to_operation(&self) -> Operation {
        Operation::Detector {
            coords: self.coordinates.to_vec(),
            records: self.measurement_offsets.clone(),
        }
    }
}

/// Everything needed to emit one `OBSERVABLE_INCLUDE` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservableAnnotation {
    observable_index: usize,
    measurement_offsets: Vec<i64>,
}

impl ObservableAnnotation {
    /// Creates an annotation over strictly negative global offsets.
    pub fn new(
        observable_index: usize,
        mut measurement_offsets: Vec<i64>,
    ) -> Result<Self, QlcError> {
        check_offsets(&measurement_offsets, "observable")?;
        measurement_offsets.sort_unstable();
        Ok(Self {
            observable_index,
            measurement_offsets,
        })
    }

    /// Index of the logical observable.
    pub fn observable_index(&self) -> usize {
        self.observable_index
    }

    /// Global measurement offsets.
    pub fn measurement_offsets(&self) -> &[i64] {
        &self.measurement_offsets
    }

    /// Wire-format instruction.
    pub fn to_operation(&self) -> Operation {
        Operation::ObservableInclude {
            index: self.observable_index,
            records: self.measurement_offsets.clone(),
        }
    }
}

fn check_offsets(offsets: &[i64], kind: &str) -> Result<(), QlcError> {
    if offsets.is_empty() {
        return Err(QlcError::Construction(
            ErrorInfo::new("empty-annotation", "an annotation needs at least one measurement")
                .with_context("kind", kind),
        ));
    }
    if let Some(offset) = offsets.iter().find(|offset| **offset >= 0) {
        return Err(QlcError::Construction(
            ErrorInfo::new(
                "non-negative-offset",
                "measurement offsets count backwards and must be negative",
            )
            .with_context("kind", kind)
            .with_context("offset", offset.to_string()),
        ));
    }
    Ok(())
}

/// Outline of one plaquette, for drawing only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    /// Measured stabilizer basis.
    pub basis: Basis,
    /// Corners in drawing order.
    pub qubits: Vec<GridQubit>,
}

impl Polygon {
    /// Wire-format instruction with qubits numbered by `qubit_map`.
    pub fn to_operation(&self, qubit_map: &QubitMap) -> Result<Operation, QlcError> {
        let targets = self
            .qubits
            .iter()
            .map(|qubit| qubit_map.index_of(qubit))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Operation::Polygon {
            basis: self.basis,
            targets,
        })
    }
}

/// Per-`k` annotations of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerNodeAnnotations {
    /// Circuit of a leaf, in absolute qubit coordinates.
    pub circuit: Option<ScheduledCircuit>,
    /// Detectors ending in the leaf.
    pub detectors: Vec<DetectorAnnotation>,
    /// Observable contributions of the leaf.
    pub observables: Vec<ObservableAnnotation>,
    /// Drawing hints of the leaf.
    pub polygons: Vec<Polygon>,
}

/// Per-`k` annotations of a whole tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerTreeAnnotations {
    /// Numbering of every qubit of the tree.
    pub qubit_map: Option<QubitMap>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::detectors::Measurement;

    #[test]
    fn offsets_must_be_negative_and_present() {
        assert_eq!(
            DetectorAnnotation::new([0, 0, 0], vec![-1, 0]).unwrap_err().code(),
            "non-negative-offset"
        );
        assert_eq!(
            ObservableAnnotation::new(0, vec![]).unwrap_err().code(),
            "empty-annotation"
        );
        let observable = ObservableAnnotation::new(1, vec![-1, -4, -2]).unwrap();
        assert_eq!(observable.measurement_offsets(), &[-4, -2, -1]);
    }

    #[test]
    fn resolving_outside_the_window_is_a_lookback_error() {
        let q = GridQubit::new(1, 1);
        let records = MeasurementRecordsMap::from_measured_qubits(&[q, GridQubit::new(3, 1)]);
        let recent = Measurement::new(q, -1).unwrap();
        let detector = Detector::new(BTreeSet::from([recent]), [2, 0, 0]).unwrap();
        let annotation = DetectorAnnotation::from_detector(&detector, &records).unwrap();
        assert_eq!(annotation.measurement_offsets(), &[-2]);

        let old = Measurement::new(q, -2).unwrap();
        let detector = Detector::new(BTreeSet::from([old]), [2, 0, 0]).unwrap();
        let err = DetectorAnnotation::from_detector(&detector, &records).unwrap_err();
        assert!(matches!(err, QlcError::Lookback(_)));
    }
}
