//! Detectors of a whole round from its local situations.

use qlc_core::{ErrorInfo, QlcError, Shift2D};
use qlc_plaquette::{get_spatially_distinct_3d_subtemplates, PlaquetteGrid, Plaquettes, Template};
use tracing::debug;

use crate::detectors::detector::Detectors;
use crate::detectors::engine::DetectorEngine;

/// Detectors ending in the last of the superimposed `templates`.
///
/// Each template is instantiated at `k` and filled with the matching entry of
/// `plaquettes`. Every distinct `(2 * radius + 1)`-wide neighbourhood is
/// resolved once through `engine`, then its detectors are moved to every
/// cell where it occurs. Qubits are relative to the template origin.
pub fn compute_detectors_for_fixed_radius<T: Template>(
    templates: &[T],
    k: u32,
    plaquettes: &[Plaquettes],
    radius: usize,
    engine: &DetectorEngine,
) -> Result<Detectors, QlcError> {
    if templates.len() != plaquettes.len() {
        return Err(QlcError::Construction(
            ErrorInfo::new(
                "template-plaquettes-mismatch",
                "one plaquette collection is needed per template",
            )
            .with_context("templates", templates.len().to_string())
            .with_context("plaquettes", plaquettes.len().to_string()),
        ));
    }
    let Some(last) = templates.last() else {
        return Ok(Detectors::new());
    };
    let increments = last.increments();
    let grids: Vec<PlaquetteGrid> = templates.iter().map(|t| t.instantiate(k)).collect();
    let unique = get_spatially_distinct_3d_subtemplates(&grids, radius)?;

    let mut detectors = Detectors::new();
    for (subtemplate, cells) in &unique {
        let local = engine.detectors_for(subtemplate, plaquettes)?;
        for (row, col) in cells {
            let shift = Shift2D::new(*col as i64 * increments.x, *row as i64 * increments.y);
            detectors.extend(local.iter().map(|d| d.offset_spatially_by(shift)));
        }
    }
    debug!(
        k,
        radius,
        situations = unique.len(),
        detectors = detectors.len(),
        "computed round detectors"
    );
    Ok(detectors)
}
