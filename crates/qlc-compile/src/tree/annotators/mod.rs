//! Walkers filling the per-`k` annotations of a layer tree.

pub mod circuit;
pub mod detectors;
pub mod observables;
pub mod polygons;
pub mod qubit_map;

use std::collections::BTreeMap;

use qlc_circuit::GridQubit;
use qlc_core::{Basis, QlcError, Shift2D};
use qlc_plaquette::{Plaquette, Template};

use crate::blocks::{LayoutLayer, SPATIAL_BORDER_WIDTH};

pub use circuit::AnnotateCircuitOnLayoutNode;
pub use detectors::AnnotateDetectorsOnLayoutNode;
pub use observables::AnnotateObservablesOnLayoutNode;
pub use polygons::AnnotatePolygonOnLayoutNode;
pub use qubit_map::CollectQubitsOnLayoutNode;

/// Non-empty plaquettes of `layout` at `k`, each with the absolute position
/// of its syndrome qubit.
pub(crate) fn placed_plaquettes(
    layout: &LayoutLayer,
    k: u32,
) -> Result<Vec<(Shift2D, Plaquette)>, QlcError> {
    let (template, plaquettes) = layout.to_template_and_plaquettes()?;
    let origin = layout.frame_origin(k);
    let grid = template.instantiate(k);
    Ok(grid
        .iter()
        .filter(|(_, _, index)| *index != 0)
        .map(|(row, col, index)| (row, col, plaquettes.get(index)))
        .filter(|(_, _, plaquette)| !plaquette.is_empty())
        .map(|(row, col, plaquette)| {
            let cell = Shift2D::new(
                SPATIAL_BORDER_WIDTH * col as i64,
                SPATIAL_BORDER_WIDTH * row as i64,
            );
            (origin + cell, plaquette.clone())
        })
        .collect())
}

/// Basis measured by every absolute syndrome qubit of `layout` at `k`.
pub(crate) fn stabilizer_bases(
    layout: &LayoutLayer,
    k: u32,
) -> Result<BTreeMap<GridQubit, Basis>, QlcError> {
    let mut bases = BTreeMap::new();
    for (shift, plaquette) in placed_plaquettes(layout, k)? {
        let Some(basis) = plaquette.debug_basis() else {
            continue;
        };
        for qubit in plaquette.syndrome_qubits() {
            bases.insert(qubit.shifted(shift), basis);
        }
    }
    Ok(bases)
}
