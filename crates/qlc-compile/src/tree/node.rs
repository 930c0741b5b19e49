//! Nodes of a layer tree and the walker interface used to annotate them.

use std::collections::BTreeMap;

use qlc_circuit::{Circuit, Operation, QubitMap};
use qlc_core::{ErrorInfo, LinearFunction, QlcError};
use serde_json::{json, Value};

use crate::blocks::{Layer, LayoutLayer};
use crate::tree::annotations::LayerNodeAnnotations;

/// Callbacks invoked by [`LayerNode::walk`].
///
/// For each node: `enter_node`, `visit_node`, the children in time order,
/// then `exit_node`.
pub trait NodeWalker {
    /// Called before anything else on `node`.
    fn enter_node(&mut self, _node: &mut LayerNode) -> Result<(), QlcError> {
        Ok(())
    }

    /// Called before the children of `node`.
    fn visit_node(&mut self, _node: &mut LayerNode) -> Result<(), QlcError> {
        Ok(())
    }

    /// Called after the children of `node`.
    fn exit_node(&mut self, _node: &mut LayerNode) -> Result<(), QlcError> {
        Ok(())
    }
}

/// Node owning one layout layer (leaf) or one composed layer.
#[derive(Debug, Clone)]
pub struct LayerNode {
    layer: Layer,
    children: Vec<LayerNode>,
    annotations: BTreeMap<u32, LayerNodeAnnotations>,
}

impl LayerNode {
    /// Builds the subtree of `layer`.
    ///
    /// Sequenced layers get one child per entry and repeated layers one child
    /// for their body. Plaquette and raw layers must have been assembled into
    /// layouts beforehand.
    pub fn new(layer: Layer) -> Result<Self, QlcError> {
        let children = match &layer {
            Layer::Layout(_) => Vec::new(),
            Layer::Sequenced(sequenced) => sequenced
                .layers()
                .iter()
                .cloned()
                .map(LayerNode::new)
                .collect::<Result<_, _>>()?,
            Layer::Repeated(repeated) => vec![LayerNode::new(repeated.body().clone())?],
            Layer::Plaquette(_) | Layer::Raw(_) => {
                return Err(QlcError::Unsupported(
                    ErrorInfo::new(
                        "unsupported-tree-layer",
                        "every leaf of a layer tree must be a layout layer",
                    )
                    .with_context("layer", layer.type_name())
                    .with_hint("merge block layers into layout layers first"),
                ))
            }
        };
        Ok(Self {
            layer,
            children,
            annotations: BTreeMap::new(),
        })
    }

    /// Layer represented by the node.
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    /// Children in time order.
    pub fn children(&self) -> &[LayerNode] {
        &self.children
    }

    /// Layout of a leaf.
    pub fn layout(&self) -> Option<&LayoutLayer> {
        match &self.layer {
            Layer::Layout(layout) => Some(layout),
            _ => None,
        }
    }

    /// Returns `true` for layout layers.
    pub fn is_leaf(&self) -> bool {
        matches!(self.layer, Layer::Layout(_))
    }

    /// Returns `true` for repeated layers.
    pub fn is_repeated(&self) -> bool {
        matches!(self.layer, Layer::Repeated(_))
    }

    /// Repetitions of a repeated layer.
    pub fn repetitions(&self) -> Option<LinearFunction> {
        match &self.layer {
            Layer::Repeated(repeated) => Some(repeated.repetitions()),
            _ => None,
        }
    }

    /// Number of repetitions at `k`, which must be at least one.
    pub(crate) fn repetitions_at(&self, k: u32) -> Result<u64, QlcError> {
        let Some(repetitions) = self.repetitions() else {
            return Ok(1);
        };
        let count = repetitions.integer_eval(k);
        u64::try_from(count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or_else(|| {
                QlcError::Construction(
                    ErrorInfo::new("invalid-repetitions", "a repeat block runs at least once")
                        .with_context("repetitions", repetitions.to_string())
                        .with_context("k", k.to_string())
                        .with_context("count", count.to_string()),
                )
            })
    }

    /// Annotations computed at `k`, if any.
    pub fn annotations(&self, k: u32) -> Option<&LayerNodeAnnotations> {
        self.annotations.get(&k)
    }

    /// Annotations at `k`, created empty on first access.
    pub fn annotations_mut(&mut self, k: u32) -> &mut LayerNodeAnnotations {
        self.annotations.entry(k).or_default()
    }

    /// Leaves of the subtree in time order.
    pub fn leaves(&self) -> Vec<&LayerNode> {
        if self.is_leaf() {
            return vec![self];
        }
        self.children.iter().flat_map(LayerNode::leaves).collect()
    }

    /// Depth-first walk of the subtree.
    pub fn walk(&mut self, walker: &mut dyn NodeWalker) -> Result<(), QlcError> {
        walker.enter_node(self)?;
        walker.visit_node(self)?;
        for child in &mut self.children {
            child.walk(walker)?;
        }
        walker.exit_node(self)
    }

    /// Wire-format circuit of the subtree at `k`.
    ///
    /// Leaves emit their circuit, a `SHIFT_COORDS(0, 0, 1)` and their
    /// annotations. Consecutive children are separated by a `TICK`, which a
    /// repeated child carries at the start of its body instead.
    pub fn generate_circuit(
        &self,
        k: u32,
        qubit_map: &QubitMap,
        add_polygons: bool,
    ) -> Result<Circuit, QlcError> {
        match &self.layer {
            Layer::Layout(_) => self.generate_leaf_circuit(k, qubit_map, add_polygons),
            Layer::Repeated(_) => {
                let mut result = Circuit::new();
                let body_node = self.children.first();
                if add_polygons {
                    if let Some(first) = body_node.and_then(|body| body.leaves().first().copied()) {
                        first.push_polygons(k, qubit_map, &mut result)?;
                    }
                }
                let mut body = Circuit::new();
                body.append_tick();
                if let Some(body_node) = body_node {
                    body.extend(body_node.generate_circuit(k, qubit_map, false)?);
                }
                result.push_repeat(self.repetitions_at(k)?, body);
                Ok(result)
            }
            _ => {
                let mut result = Circuit::new();
                for (index, child) in self.children.iter().enumerate() {
                    result.extend(child.generate_circuit(k, qubit_map, add_polygons)?);
                    if let Some(next) = self.children.get(index + 1) {
                        if !next.is_repeated() {
                            result.append_tick();
                        }
                    }
                }
                Ok(result)
            }
        }
    }

    fn generate_leaf_circuit(
        &self,
        k: u32,
        qubit_map: &QubitMap,
        add_polygons: bool,
    ) -> Result<Circuit, QlcError> {
        let Some(circuit) = self.annotations(k).and_then(|a| a.circuit.as_ref()) else {
            return Err(QlcError::Precondition(
                ErrorInfo::new(
                    "missing-circuit",
                    "leaf circuits must be annotated before assembling the circuit",
                )
                .with_context("k", k.to_string()),
            ));
        };
        let mut result = Circuit::new();
        if add_polygons {
            self.push_polygons(k, qubit_map, &mut result)?;
        }
        result.extend(Circuit::from_scheduled(circuit, qubit_map)?);
        result.push(Operation::ShiftCoords(vec![0, 0, 1]));
        if let Some(annotations) = self.annotations(k) {
            for detector in &annotations.detectors {
                result.push(detector.to_operation());
            }
            for observable in &annotations.observables {
                result.push(observable.to_operation());
            }
        }
        Ok(result)
    }

    fn push_polygons(
        &self,
        k: u32,
        qubit_map: &QubitMap,
        out: &mut Circuit,
    ) -> Result<(), QlcError> {
        if let Some(annotations) = self.annotations(k) {
            for polygon in &annotations.polygons {
                out.push(polygon.to_operation(qubit_map)?);
            }
        }
        Ok(())
    }

    /// Serialisable description of the subtree and of its annotations.
    pub fn to_dict(&self) -> Result<Value, QlcError> {
        let children = self
            .children
            .iter()
            .map(LayerNode::to_dict)
            .collect::<Result<Vec<_>, _>>()?;
        let mut annotations = serde_json::Map::new();
        for (k, annotation) in &self.annotations {
            let circuit = match &annotation.circuit {
                Some(circuit) => {
                    let local = QubitMap::from_qubits(circuit.qubits());
                    Value::String(Circuit::from_scheduled(circuit, &local)?.to_string())
                }
                None => Value::Null,
            };
            annotations.insert(
                k.to_string(),
                json!({
                    "circuit": circuit,
                    "detectors": to_value(&annotation.detectors)?,
                    "observables": to_value(&annotation.observables)?,
                    "polygons": to_value(&annotation.polygons)?,
                }),
            );
        }
        Ok(json!({
            "layer": self.layer.type_name(),
            "children": children,
            "annotations": annotations,
        }))
    }
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, QlcError> {
    serde_json::to_value(value)
        .map_err(|err| QlcError::Serde(ErrorInfo::new("tree-serialize", err.to_string())))
}
