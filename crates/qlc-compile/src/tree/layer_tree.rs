//! Root of the layer tree and the full compilation pipeline for one `k`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use qlc_circuit::{Circuit, QubitMap};
use qlc_core::{ErrorInfo, QlcError};
use serde_json::{json, Value};
use tracing::info;

use crate::blocks::{Layer, SequencedLayers};
use crate::config::CompileConfig;
use crate::detectors::DetectorEngine;
use crate::observables::{AbstractObservable, ObservableBuilder, SurfaceCodeObservableBuilder};
use crate::tree::annotations::LayerTreeAnnotations;
use crate::tree::annotators::{
    AnnotateCircuitOnLayoutNode, AnnotateDetectorsOnLayoutNode, AnnotateObservablesOnLayoutNode,
    AnnotatePolygonOnLayoutNode, CollectQubitsOnLayoutNode,
};
use crate::tree::node::{to_value, LayerNode, NodeWalker};

/// Layer tree of a whole computation.
///
/// The root is a temporal sequence whose children are the z-slices of the
/// computation, listed bottom to top.
#[derive(Debug, Clone)]
pub struct LayerTree {
    root: LayerNode,
    z_levels: Vec<i64>,
    realignment_levels: BTreeSet<i64>,
    observables: Vec<AbstractObservable>,
    observable_builder: Arc<dyn ObservableBuilder>,
    annotations: BTreeMap<u32, LayerTreeAnnotations>,
}

impl LayerTree {
    /// Tree over `root`; slice `i` is assumed to sit at `z = i`.
    pub fn new(root: SequencedLayers) -> Result<Self, QlcError> {
        Self::from_layer(Layer::Sequenced(root))
    }

    /// Tree over an arbitrary layer.
    pub fn from_layer(root: Layer) -> Result<Self, QlcError> {
        Ok(Self {
            root: LayerNode::new(root)?,
            z_levels: Vec::new(),
            realignment_levels: BTreeSet::new(),
            observables: Vec::new(),
            observable_builder: Arc::new(SurfaceCodeObservableBuilder),
            annotations: BTreeMap::new(),
        })
    }

    /// Heights of the root children.
    pub fn with_z_levels(mut self, z_levels: Vec<i64>) -> Self {
        self.z_levels = z_levels;
        self
    }

    /// Heights whose slice ends with an extra realignment round.
    pub fn with_realignment_levels(mut self, levels: BTreeSet<i64>) -> Self {
        self.realignment_levels = levels;
        self
    }

    /// Observables to annotate, numbered in order.
    pub fn with_observables(
        mut self,
        observables: Vec<AbstractObservable>,
        builder: Arc<dyn ObservableBuilder>,
    ) -> Self {
        self.observables = observables;
        self.observable_builder = builder;
        self
    }

    /// Root node.
    pub fn root(&self) -> &LayerNode {
        &self.root
    }

    /// Heights of the root children.
    pub fn z_levels(&self) -> &[i64] {
        &self.z_levels
    }

    /// Heights whose slice ends with an extra realignment round.
    pub fn realignment_levels(&self) -> &BTreeSet<i64> {
        &self.realignment_levels
    }

    /// Observables annotated by [`Self::annotate_observables`].
    pub fn observables(&self) -> &[AbstractObservable] {
        &self.observables
    }

    /// Qubit numbering computed at `k`.
    pub fn qubit_map(&self, k: u32) -> Option<&QubitMap> {
        self.annotations.get(&k).and_then(|a| a.qubit_map.as_ref())
    }

    /// Realises the circuit of every leaf.
    pub fn annotate_circuits(&mut self, k: u32) -> Result<(), QlcError> {
        self.root.walk(&mut AnnotateCircuitOnLayoutNode::new(k))
    }

    /// Numbers every qubit used by the leaf circuits.
    pub fn annotate_qubit_map(&mut self, k: u32) -> Result<(), QlcError> {
        let mut collector = CollectQubitsOnLayoutNode::new(k);
        self.root.walk(&mut collector)?;
        self.annotations.entry(k).or_default().qubit_map = Some(collector.into_qubit_map());
        Ok(())
    }

    /// Adds drawing hints to every leaf.
    pub fn annotate_polygons(&mut self, k: u32) -> Result<(), QlcError> {
        self.root.walk(&mut AnnotatePolygonOnLayoutNode::new(k))
    }

    /// Computes the detectors ending in every leaf.
    pub fn annotate_detectors(
        &mut self,
        k: u32,
        manhattan_radius: usize,
        lookback: usize,
        engine: &DetectorEngine,
    ) -> Result<(), QlcError> {
        let mut walker = AnnotateDetectorsOnLayoutNode::new(k, manhattan_radius, lookback, engine)?;
        self.root.walk(&mut walker)
    }

    /// Attaches every observable of the tree to the leaves measuring it.
    pub fn annotate_observables(&mut self, k: u32) -> Result<(), QlcError> {
        self.root.walk(&mut ClearObservables { k })?;
        for (index, observable) in self.observables.iter().enumerate() {
            let mut walker = AnnotateObservablesOnLayoutNode::new(
                k,
                &self.root,
                &self.z_levels,
                &self.realignment_levels,
                observable,
                index,
                self.observable_builder.as_ref(),
            )?;
            self.root.walk(&mut walker)?;
        }
        Ok(())
    }

    /// Concatenates the annotated leaves behind a `QUBIT_COORDS` preamble.
    pub fn assemble_circuit(&self, k: u32, add_polygons: bool) -> Result<Circuit, QlcError> {
        let Some(qubit_map) = self.qubit_map(k) else {
            return Err(QlcError::Precondition(
                ErrorInfo::new(
                    "missing-qubit-map",
                    "the qubit map must be annotated before assembling the circuit",
                )
                .with_context("k", k.to_string()),
            ));
        };
        let mut circuit = qubit_map.to_qubit_coords_circuit();
        circuit.extend(self.root.generate_circuit(k, qubit_map, add_polygons)?);
        Ok(circuit)
    }

    /// Runs every annotation pass at `k` and assembles the final circuit.
    pub fn generate_circuit(
        &mut self,
        k: u32,
        config: &CompileConfig,
        engine: &DetectorEngine,
    ) -> Result<Circuit, QlcError> {
        config.validate()?;
        info!(k, "annotating leaf circuits");
        self.annotate_circuits(k)?;
        self.annotate_qubit_map(k)?;
        if config.add_polygons {
            self.annotate_polygons(k)?;
        }
        info!(
            k,
            lookback = config.lookback,
            radius = config.manhattan_radius,
            "annotating detectors"
        );
        self.annotate_detectors(k, config.manhattan_radius, config.lookback, engine)?;
        info!(k, observables = self.observables.len(), "annotating observables");
        self.annotate_observables(k)?;
        let circuit = self.assemble_circuit(k, config.add_polygons)?;
        info!(
            k,
            qubits = self.qubit_map(k).map_or(0, QubitMap::len),
            detectors = circuit.num_detectors(),
            observables = circuit.num_observables(),
            "assembled circuit"
        );
        Ok(circuit)
    }

    /// Serialisable description of the tree and of its annotations.
    pub fn to_dict(&self) -> Result<Value, QlcError> {
        let mut qubit_maps = serde_json::Map::new();
        for (k, annotations) in &self.annotations {
            if let Some(qubit_map) = &annotations.qubit_map {
                let qubits: Vec<[i64; 3]> = qubit_map
                    .iter()
                    .map(|(index, qubit)| [index as i64, qubit.x, qubit.y])
                    .collect();
                qubit_maps.insert(k.to_string(), to_value(&qubits)?);
            }
        }
        Ok(json!({
            "root": self.root.to_dict()?,
            "z_levels": self.z_levels,
            "realignment_levels": self.realignment_levels,
            "observables": to_value(&self.observables)?,
            "qubit_maps": qubit_maps,
        }))
    }
}

struct ClearObservables {
    k: u32,
}

impl NodeWalker for ClearObservables {
    fn visit_node(&mut self, node: &mut LayerNode) -> Result<(), QlcError> {
        if node.is_leaf() {
            node.annotations_mut(self.k).observables.clear();
        }
        Ok(())
    }
}
