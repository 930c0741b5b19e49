//! Translation of instantiated templates into scheduled circuits.

use qlc_circuit::{merge_scheduled_circuits, ScheduledCircuit};
use qlc_core::{QlcError, Shift2D};

use crate::plaquette::Plaquettes;
use crate::template::{PlaquetteGrid, Template};

/// Circuit of `template` instantiated at `k` with `plaquettes`.
///
/// Qubit coordinates are relative to the template origin: the syndrome qubit of
/// the plaquette at `(row, col)` sits at `(col * increments.x, row * increments.y)`.
pub fn generate_circuit(
    template: &dyn Template,
    k: u32,
    plaquettes: &Plaquettes,
) -> Result<ScheduledCircuit, QlcError> {
    generate_circuit_from_instantiation(&template.instantiate(k), plaquettes, template.increments())
}

/// Circuit obtained by placing `plaquettes` on an already instantiated grid.
pub fn generate_circuit_from_instantiation(
    grid: &PlaquetteGrid,
    plaquettes: &Plaquettes,
    increments: Shift2D,
) -> Result<ScheduledCircuit, QlcError> {
    let circuits: Vec<ScheduledCircuit> = grid
        .iter()
        .filter(|(_, _, index)| *index != 0)
        .map(|(row, col, index)| (row, col, plaquettes.get(index)))
        .filter(|(_, _, plaquette)| !plaquette.is_empty())
        .map(|(row, col, plaquette)| {
            plaquette.circuit().shifted(Shift2D::new(
                col as i64 * increments.x,
                row as i64 * increments.y,
            ))
        })
        .collect();
    merge_scheduled_circuits(&circuits)
}
