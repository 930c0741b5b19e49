//! Attaches the measurements of one logical observable to the leaves.

use std::collections::{BTreeMap, BTreeSet};

use qlc_circuit::MeasurementRecordsMap;
use qlc_core::{ErrorInfo, QlcError};
use tracing::debug;

use crate::observables::{
    compute_observable_qubits, AbstractObservable, ObservableBuilder, ObservableComponent,
};
use crate::tree::annotations::ObservableAnnotation;
use crate::tree::annotators::stabilizer_bases;
use crate::tree::node::{LayerNode, NodeWalker};

/// Adds the `OBSERVABLE_INCLUDE` of one observable to the leaves where its
/// measurements happen.
///
/// Each child of the root is one z-slice of the computation: bottom
/// stabilizers are read in its first leaf and top readouts in its last one.
/// Slices closed by a realignment round read their top readouts in the leaf
/// before it and the realignment component in that round.
#[derive(Debug)]
pub struct AnnotateObservablesOnLayoutNode<'a> {
    k: u32,
    observable: &'a AbstractObservable,
    observable_index: usize,
    builder: &'a dyn ObservableBuilder,
    leaf_z: Vec<i64>,
    bottom: BTreeSet<usize>,
    top: BTreeSet<usize>,
    realignment: BTreeSet<usize>,
    next_leaf: usize,
}

impl<'a> AnnotateObservablesOnLayoutNode<'a> {
    /// Walker for the tree rooted at `root`, whose root children sit at the
    /// heights listed in `z_levels`. Slices at `realigned` heights end with a
    /// realignment round.
    pub fn new(
        k: u32,
        root: &LayerNode,
        z_levels: &[i64],
        realigned: &BTreeSet<i64>,
        observable: &'a AbstractObservable,
        observable_index: usize,
        builder: &'a dyn ObservableBuilder,
    ) -> Result<Self, QlcError> {
        let slices: Vec<&LayerNode> = if root.is_leaf() || root.is_repeated() {
            vec![root]
        } else {
            root.children().iter().collect()
        };
        let mut leaf_z = Vec::new();
        let mut bottom = BTreeSet::new();
        let mut top = BTreeSet::new();
        let mut realignment = BTreeSet::new();
        for (index, slice) in slices.iter().enumerate() {
            let z = z_levels.get(index).copied().unwrap_or(index as i64);
            let count = slice.leaves().len();
            if count == 0 {
                continue;
            }
            let first = leaf_z.len();
            let last = first + count - 1;
            if first == last {
                return Err(QlcError::Construction(
                    ErrorInfo::new(
                        "overlapping-observable-orders",
                        "bottom and top measurements of a slice fall in the same round",
                    )
                    .with_context("z", z.to_string())
                    .with_context("observable", observable_index.to_string()),
                ));
            }
            bottom.insert(first);
            if realigned.contains(&z) {
                if last - 1 == first {
                    return Err(QlcError::Construction(
                        ErrorInfo::new(
                            "overlapping-observable-orders",
                            "a realigned slice needs a round between its first one and the realignment",
                        )
                        .with_context("z", z.to_string())
                        .with_context("observable", observable_index.to_string()),
                    ));
                }
                top.insert(last - 1);
            } else {
                top.insert(last);
            }
            realignment.insert(last);
            leaf_z.extend(std::iter::repeat(z).take(count));
        }
        Ok(Self {
            k,
            observable,
            observable_index,
            builder,
            leaf_z,
            bottom,
            top,
            realignment,
            next_leaf: 0,
        })
    }
}

impl NodeWalker for AnnotateObservablesOnLayoutNode<'_> {
    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        let Some(layout) = node.layout() else {
            return Ok(());
        };
        let order = self.next_leaf;
        self.next_leaf += 1;
        let Some(z) = self.leaf_z.get(order).copied() else {
            return Ok(());
        };
        let mut components = Vec::new();
        if self.bottom.contains(&order) {
            components.push(ObservableComponent::BottomStabilizers);
        }
        if self.top.contains(&order) {
            components.push(ObservableComponent::TopReadouts);
        }
        if self.realignment.contains(&order) {
            components.push(ObservableComponent::Realignment);
        }
        let slice = self.observable.slice_at_z(z);
        if components.is_empty() || slice.is_empty() {
            return Ok(());
        }
        let Some(circuit) = node.annotations(self.k).and_then(|a| a.circuit.as_ref()) else {
            return Err(QlcError::Precondition(
                ErrorInfo::new(
                    "missing-circuit",
                    "leaf circuits must be annotated before observables",
                )
                .with_context("k", self.k.to_string()),
            ));
        };
        let records = MeasurementRecordsMap::from_scheduled_circuit(circuit);
        let element = layout.element_shape().to_shape_2d(self.k);

        let mut annotations = Vec::new();
        for component in components {
            let needs_bases = match component {
                ObservableComponent::BottomStabilizers => slice.has_bottom_stabilizers(),
                ObservableComponent::TopReadouts => !slice.top_readout_spatial_cubes.is_empty(),
                ObservableComponent::Realignment => false,
            };
            let bases = if needs_bases {
                stabilizer_bases(layout, self.k)?
            } else {
                BTreeMap::new()
            };
            let qubits =
                compute_observable_qubits(&slice, component, element, self.builder, &bases)?;
            let offsets: Vec<i64> = qubits
                .iter()
                .filter_map(|qubit| records.get(qubit, -1))
                .collect();
            if offsets.is_empty() {
                debug!(k = self.k, z, ?component, "no measurement for observable component");
                continue;
            }
            annotations.push(ObservableAnnotation::new(self.observable_index, offsets)?);
        }
        debug!(
            k = self.k,
            z,
            observable = self.observable_index,
            annotations = annotations.len(),
            "annotated observable"
        );
        node.annotations_mut(self.k).observables.extend(annotations);
        Ok(())
    }
}
