//! Detector search for one local situation.
//!
//! The circuit of a `(2r + 1) x (2r + 1)` window is analysed slice by slice
//! and the deterministic parities are attributed to the plaquette at the
//! centre of the window. A parity belongs to the centre when it involves the
//! last syndrome measurement of the centre and no other measurement of the
//! last slice outside of the centre plaquette qubits. Parities involving the
//! last syndrome measurements of several plaquettes have no owner and are
//! dropped.

use std::collections::BTreeSet;

use bitvec::prelude::*;
use qlc_circuit::{GridQubit, Moment};
use qlc_core::{ErrorInfo, QlcError, Shift2D};
use qlc_plaquette::{generate_circuit_from_instantiation, Plaquettes, SubTemplate3D};
use tracing::debug;

use crate::blocks::SPATIAL_BORDER_WIDTH;
use crate::detectors::detector::{Detector, Detectors, Measurement};
use crate::detectors::engine::DetectorSearch;
use crate::detectors::flows::{xor_into, FlowAnalysis, MeasurementEvent};

/// Flow-based [`DetectorSearch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowDetectorSearch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Role {
    Foreign,
    Centre,
    Local,
    Soft,
    Earlier,
}

impl DetectorSearch for FlowDetectorSearch {
    fn search(
        &self,
        subtemplate: &SubTemplate3D,
        plaquettes: &[Plaquettes],
    ) -> Result<Detectors, QlcError> {
        let slices = subtemplate.slices();
        if slices.len() != plaquettes.len() {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "slice-count-mismatch",
                    "one plaquette collection is needed per time slice",
                )
                .with_context("slices", slices.len().to_string())
                .with_context("plaquettes", plaquettes.len().to_string()),
            ));
        }
        let centre_index = subtemplate.last_centre();
        let Some(last_plaquettes) = plaquettes.last() else {
            return Ok(Detectors::new());
        };
        let centre = last_plaquettes.get(centre_index);
        if centre_index == 0 || centre.num_measurements() == 0 {
            return Ok(Detectors::new());
        }

        let first = slices
            .iter()
            .position(|grid| !grid.is_all_zero())
            .unwrap_or(slices.len());
        let radius = subtemplate.radius() as i64;
        let to_centre = Shift2D::new(
            -radius * SPATIAL_BORDER_WIDTH,
            -radius * SPATIAL_BORDER_WIDTH,
        );
        let increments = Shift2D::new(SPATIAL_BORDER_WIDTH, SPATIAL_BORDER_WIDTH);
        let mut moments: Vec<Vec<Moment>> = Vec::with_capacity(slices.len() - first);
        for (grid, slice_plaquettes) in slices[first..].iter().zip(&plaquettes[first..]) {
            let circuit = generate_circuit_from_instantiation(grid, slice_plaquettes, increments)?
                .shifted(to_centre);
            moments.push(circuit.dense_moments());
        }

        let analysis = FlowAnalysis::from_slices(&moments)?;
        let events = analysis.measurements();
        let last_slice = moments.len() - 1;
        let centre_qubits = centre.qubits();
        let Some(centre_measurement) = events.iter().rposition(|event| {
            event.slice == last_slice && centre.syndrome_qubits().contains(&event.qubit)
        }) else {
            return Ok(Detectors::new());
        };

        let soft = analysis.num_soft_columns();
        let role_of = |index: usize, event: &MeasurementEvent| {
            if event.slice != last_slice {
                Role::Earlier
            } else if index == centre_measurement {
                Role::Centre
            } else if centre_qubits.contains(&event.qubit) {
                Role::Local
            } else {
                Role::Foreign
            }
        };
        let mut columns: Vec<(Role, usize)> = (0..soft).map(|c| (Role::Soft, c)).collect();
        columns.extend(
            events
                .iter()
                .enumerate()
                .map(|(index, event)| (role_of(index, event), soft + index)),
        );
        columns.sort();

        let reduced = row_echelon(analysis.kernel(), &columns);
        let role_of_column = |column: usize| {
            if column < soft {
                Role::Soft
            } else {
                role_of(column - soft, &events[column - soft])
            }
        };
        let Some(owned) = reduced
            .iter()
            .find(|(pivot, _)| role_of_column(*pivot) == Role::Centre)
            .map(|(_, row)| row.clone())
        else {
            return Ok(Detectors::new());
        };

        let mut parities = vec![owned.clone()];
        let local = local_parity(
            &reduced,
            events,
            soft,
            last_slice,
            &centre_qubits,
            centre_measurement,
            &role_of_column,
        );
        if let Some(local) = local {
            let mut combined = local;
            xor_into(&mut combined, &owned);
            parities.push(combined);
        }
        let reference: Vec<&BitVec> = reduced
            .iter()
            .filter(|(pivot, row)| role_of_column(*pivot) >= Role::Soft && row[..soft].not_any())
            .map(|(_, row)| row)
            .collect();

        let mut detectors = Detectors::new();
        for mut parity in parities {
            sparsify(&mut parity, &reference, soft);
            detectors.insert(to_detector(&parity, events, soft)?);
        }
        debug!(
            centre = centre.name(),
            slices = moments.len(),
            detectors = detectors.len(),
            "searched detectors"
        );
        Ok(detectors)
    }
}

/// Reduced row echelon form with pivots chosen following `columns`.
fn row_echelon(mut rows: Vec<BitVec>, columns: &[(Role, usize)]) -> Vec<(usize, BitVec)> {
    let mut pivots = Vec::new();
    let mut rank = 0;
    for (_, column) in columns {
        let Some(found) = (rank..rows.len()).find(|r| rows[*r][*column]) else {
            continue;
        };
        rows.swap(rank, found);
        let pivot = rows[rank].clone();
        for (index, row) in rows.iter_mut().enumerate() {
            if index != rank && row[*column] {
                xor_into(row, &pivot);
            }
        }
        pivots.push(*column);
        rank += 1;
    }
    pivots.into_iter().zip(rows).collect()
}

/// Parity over every last-slice measurement of the centre plaquette data
/// qubits, if one exists.
#[allow(clippy::too_many_arguments)]
fn local_parity(
    reduced: &[(usize, BitVec)],
    events: &[MeasurementEvent],
    soft: usize,
    last_slice: usize,
    centre_qubits: &BTreeSet<GridQubit>,
    centre_measurement: usize,
    role_of_column: &dyn Fn(usize) -> Role,
) -> Option<BitVec> {
    let wanted: BTreeSet<usize> = events
        .iter()
        .enumerate()
        .filter(|(index, event)| {
            *index != centre_measurement
                && event.slice == last_slice
                && centre_qubits.contains(&event.qubit)
        })
        .map(|(index, _)| soft + index)
        .collect();
    if wanted.is_empty() {
        return None;
    }
    let mut parity: Option<BitVec> = None;
    for (pivot, row) in reduced {
        if role_of_column(*pivot) == Role::Local && wanted.contains(pivot) {
            match parity.as_mut() {
                Some(parity) => xor_into(parity, row),
                None => parity = Some(row.clone()),
            }
        }
    }
    let parity = parity?;
    let support: BTreeSet<usize> = parity
        .iter_ones()
        .filter(|column| *column >= soft && events[column - soft].slice == last_slice)
        .collect();
    (support == wanted).then_some(parity)
}

/// Greedily lowers the number of measurements of `parity` with reference
/// parities that only involve earlier slices.
fn sparsify(parity: &mut BitVec, reference: &[&BitVec], soft: usize) {
    let weight = |row: &BitSlice| row[soft..].count_ones();
    loop {
        let current = weight(parity);
        let improvement = reference.iter().find(|candidate| {
            let mut trial = parity.clone();
            xor_into(&mut trial, candidate);
            weight(&trial) < current
        });
        match improvement {
            Some(candidate) => xor_into(parity, candidate),
            None => break,
        }
    }
}

fn to_detector(
    parity: &BitVec,
    events: &[MeasurementEvent],
    soft: usize,
) -> Result<Detector, QlcError> {
    let mut measurements = BTreeSet::new();
    for column in parity[soft..].iter_ones() {
        let event = &events[column];
        let later = events[column + 1..]
            .iter()
            .filter(|other| other.qubit == event.qubit)
            .count() as i64;
        measurements.insert(Measurement::new(event.qubit, -(later + 1))?);
    }
    Detector::new(measurements, [0, 0, 0])
}
