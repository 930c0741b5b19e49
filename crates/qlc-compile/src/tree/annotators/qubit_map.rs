//! Collects the qubits of every leaf into one canonical numbering.

use std::collections::BTreeSet;

use qlc_circuit::{GridQubit, QubitMap};
use qlc_core::{ErrorInfo, QlcError};

use crate::tree::node::{LayerNode, NodeWalker};

/// Unions the qubits of the leaf circuits annotated at `k`.
#[derive(Debug, Clone, Default)]
pub struct CollectQubitsOnLayoutNode {
    k: u32,
    qubits: BTreeSet<GridQubit>,
}

impl CollectQubitsOnLayoutNode {
    /// Walker for scale `k`.
    pub fn new(k: u32) -> Self {
        Self {
            k,
            qubits: BTreeSet::new(),
        }
    }

    /// Qubits numbered in `(x, y)` order.
    pub fn into_qubit_map(self) -> QubitMap {
        QubitMap::from_qubits(self.qubits)
    }
}

impl NodeWalker for CollectQubitsOnLayoutNode {
    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        if !node.is_leaf() {
            return Ok(());
        }
        let Some(circuit) = node.annotations(self.k).and_then(|a| a.circuit.as_ref()) else {
            return Err(QlcError::Precondition(
                ErrorInfo::new(
                    "missing-circuit",
                    "leaf circuits must be annotated before collecting qubits",
                )
                .with_context("k", self.k.to_string()),
            ));
        };
        self.qubits.extend(circuit.qubits());
        Ok(())
    }
}
