//! Realises the circuit of every leaf.

use qlc_core::QlcError;
use tracing::debug;

use crate::tree::node::{LayerNode, NodeWalker};

/// Stores the absolute-coordinate circuit of each layout leaf at `k`.
#[derive(Debug, Clone, Copy)]
pub struct AnnotateCircuitOnLayoutNode {
    k: u32,
}

impl AnnotateCircuitOnLayoutNode {
    /// Walker for scale `k`.
    pub fn new(k: u32) -> Self {
        Self { k }
    }
}

impl NodeWalker for AnnotateCircuitOnLayoutNode {
    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        let Some(layout) = node.layout() else {
            return Ok(());
        };
        let circuit = layout.to_circuit(self.k)?;
        debug!(
            k = self.k,
            moments = circuit.num_moments(),
            measurements = circuit.num_measurements(),
            "annotated leaf circuit"
        );
        node.annotations_mut(self.k).circuit = Some(circuit);
        Ok(())
    }
}
