//! Drawing hints for the plaquettes of every leaf.

use qlc_circuit::GridQubit;
use qlc_core::QlcError;
use tracing::debug;

use crate::blocks::Layer;
use crate::tree::annotations::Polygon;
use crate::tree::annotators::placed_plaquettes;
use crate::tree::node::{LayerNode, NodeWalker};

/// Stores one polygon per non-empty plaquette with a known basis.
///
/// Layouts made of raw circuits have no plaquettes and get no polygon.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatePolygonOnLayoutNode {
    k: u32,
}

impl AnnotatePolygonOnLayoutNode {
    /// Walker for scale `k`.
    pub fn new(k: u32) -> Self {
        Self { k }
    }
}

impl NodeWalker for AnnotatePolygonOnLayoutNode {
    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        let Some(layout) = node.layout() else {
            return Ok(());
        };
        if layout.layers().values().any(|layer| matches!(layer, Layer::Raw(_))) {
            return Ok(());
        }
        let mut polygons = Vec::new();
        for (shift, plaquette) in placed_plaquettes(layout, self.k)? {
            let Some(basis) = plaquette.debug_basis() else {
                continue;
            };
            let mut qubits = plaquette.data_qubits().to_vec();
            qubits.sort_by_key(clockwise_rank);
            polygons.push(Polygon {
                basis,
                qubits: qubits.iter().map(|qubit| qubit.shifted(shift)).collect(),
            });
        }
        debug!(k = self.k, polygons = polygons.len(), "annotated polygons");
        node.annotations_mut(self.k).polygons = polygons;
        Ok(())
    }
}

// Corners around the syndrome qubit, clockwise from the top left.
fn clockwise_rank(qubit: &GridQubit) -> u8 {
    match (qubit.x > 0, qubit.y > 0) {
        (false, false) => 0,
        (true, false) => 1,
        (true, true) => 2,
        (false, true) => 3,
    }
}
