//! Cubes and pipes placed in space-time, turned into a layer tree.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use qlc_circuit::Circuit;
use qlc_core::{
    BlockPosition3D, Direction3D, ErrorInfo, LinearFunction, QlcError, Scalable2D,
    SignedDirection3D,
};
use tracing::{debug, info};

use crate::blocks::{
    border_from_signed_direction, merge_parallel_block_layers, Block, BlockBorder, BlockBounds,
    Layer, LayoutPosition2D, LayoutPosition3D, SequencedLayers, SpatialBlockBorder,
    TemporalBlockBorder, TemporalReplacements, SPATIAL_BORDER_WIDTH,
};
use crate::config::CompileConfig;
use crate::detectors::DetectorEngine;
use crate::observables::{AbstractObservable, ObservableBuilder, SurfaceCodeObservableBuilder};
use crate::tree::LayerTree;

#[derive(Debug, Clone)]
struct SpatialPipe {
    u: BlockPosition3D,
    v: BlockPosition3D,
    direction: Direction3D,
    block: Block,
}

/// Graph of blocks placed at integer space-time positions.
///
/// Blocks are stored as given. Border trimming and temporal substitutions
/// implied by the pipes are applied by [`Self::to_layer_tree`], so cubes and
/// pipes may be added in any order.
///
/// A temporal pipe provides the last round of its source cube and the first
/// round of its sink. Any round in between is appended to the slice of the
/// source, after every block of that slice has finished.
#[derive(Debug, Clone)]
pub struct TopologicalComputationGraph {
    scalable_qubit_shape: Scalable2D,
    element_shape: Scalable2D,
    cubes: BTreeMap<BlockPosition3D, Block>,
    spatial_pipes: BTreeMap<LayoutPosition3D, SpatialPipe>,
    temporal_pipes: BTreeMap<BlockPosition3D, (BlockPosition3D, Block)>,
    observables: Vec<AbstractObservable>,
    observable_builder: Arc<dyn ObservableBuilder>,
}

fn element_extent(qubits: LinearFunction) -> Result<LinearFunction, QlcError> {
    (qubits - LinearFunction::constant(1)).exact_integer_div(SPATIAL_BORDER_WIDTH)
}

impl TopologicalComputationGraph {
    /// Empty graph whose cubes all have `scalable_qubit_shape` qubits.
    pub fn new(scalable_qubit_shape: Scalable2D) -> Result<Self, QlcError> {
        let element_shape = Scalable2D::new(
            element_extent(scalable_qubit_shape.x)?,
            element_extent(scalable_qubit_shape.y)?,
        );
        Ok(Self {
            scalable_qubit_shape,
            element_shape,
            cubes: BTreeMap::new(),
            spatial_pipes: BTreeMap::new(),
            temporal_pipes: BTreeMap::new(),
            observables: Vec::new(),
            observable_builder: Arc::new(SurfaceCodeObservableBuilder),
        })
    }

    /// Plaquette shape of one cube.
    pub fn element_shape(&self) -> Scalable2D {
        self.element_shape
    }

    /// Number of cubes.
    pub fn num_cubes(&self) -> usize {
        self.cubes.len()
    }

    /// Number of pipes.
    pub fn num_pipes(&self) -> usize {
        self.spatial_pipes.len() + self.temporal_pipes.len()
    }

    /// Places a cube.
    pub fn add_cube(&mut self, position: BlockPosition3D, block: Block) -> Result<(), QlcError> {
        if !block.is_cube() {
            return Err(QlcError::Construction(
                ErrorInfo::new("not-a-cube", "the block does not scale along every axis")
                    .with_context("position", position.to_string()),
            ));
        }
        if block.scalable_shape() != self.scalable_qubit_shape {
            return Err(QlcError::Construction(
                ErrorInfo::new("cube-shape-mismatch", "all cubes must share one footprint")
                    .with_context("position", position.to_string())
                    .with_context("expected", self.scalable_qubit_shape.to_string())
                    .with_context("actual", block.scalable_shape().to_string()),
            ));
        }
        if self.cubes.contains_key(&position) {
            return Err(QlcError::Construction(
                ErrorInfo::new("duplicate-cube", "a cube already occupies this position")
                    .with_context("position", position.to_string()),
            ));
        }
        debug!(%position, "added cube");
        self.cubes.insert(position, block);
        Ok(())
    }

    /// Places a pipe from `source` to `sink`, its neighbour in the positive
    /// direction.
    pub fn add_pipe(
        &mut self,
        source: BlockPosition3D,
        sink: BlockPosition3D,
        block: Block,
    ) -> Result<(), QlcError> {
        let direction = Direction3D::from_neighbouring_positions(&source, &sink)?;
        if sink != source.shift_in_direction(direction, 1) {
            return Err(pipe_error(
                "reversed-pipe",
                "the sink must follow the source",
                source,
                sink,
            ));
        }
        if let Some(missing) = [source, sink].into_iter().find(|p| !self.cubes.contains_key(p)) {
            return Err(QlcError::Construction(
                ErrorInfo::new("missing-pipe-endpoint", "pipes join two existing cubes")
                    .with_context("position", missing.to_string()),
            ));
        }
        if !block.is_pipe() {
            return Err(pipe_error(
                "not-a-pipe",
                "the block has no constant dimension",
                source,
                sink,
            ));
        }
        if direction == Direction3D::Z {
            if !block.is_temporal_pipe() {
                return Err(pipe_error(
                    "pipe-direction-mismatch",
                    "a temporal pipe must have a constant duration",
                    source,
                    sink,
                ));
            }
            if self.temporal_pipes.contains_key(&source) {
                return Err(duplicate_pipe(source, sink));
            }
            self.temporal_pipes.insert(source, (sink, block));
        } else {
            if block.spatial_pipe_direction() != Some(direction) {
                return Err(pipe_error(
                    "pipe-direction-mismatch",
                    "the pipe block is not oriented along its cubes",
                    source,
                    sink,
                ));
            }
            let position = LayoutPosition3D::from_pipe_position(source, sink)?;
            if self.spatial_pipes.contains_key(&position) {
                return Err(duplicate_pipe(source, sink));
            }
            self.spatial_pipes.insert(
                position,
                SpatialPipe {
                    u: source,
                    v: sink,
                    direction,
                    block,
                },
            );
        }
        debug!(%source, %sink, %direction, "added pipe");
        Ok(())
    }

    /// Observable annotated in every compiled circuit, numbered in insertion
    /// order.
    pub fn add_observable(&mut self, observable: AbstractObservable) {
        self.observables.push(observable);
    }

    /// Geometry used to place observables.
    pub fn with_observable_builder(mut self, builder: Arc<dyn ObservableBuilder>) -> Self {
        self.observable_builder = builder;
        self
    }

    /// Observables of the graph.
    pub fn observables(&self) -> &[AbstractObservable] {
        &self.observables
    }

    fn cube_replacements(&self) -> BTreeMap<BlockPosition3D, TemporalReplacements> {
        let mut replacements: BTreeMap<BlockPosition3D, TemporalReplacements> = BTreeMap::new();
        for (source, (sink, pipe)) in &self.temporal_pipes {
            replacements.entry(*source).or_default().insert(
                TemporalBlockBorder::ZPositive,
                Some(pipe.get_atomic_temporal_border(TemporalBlockBorder::ZNegative).clone()),
            );
            replacements.entry(*sink).or_default().insert(
                TemporalBlockBorder::ZNegative,
                Some(pipe.get_atomic_temporal_border(TemporalBlockBorder::ZPositive).clone()),
            );
        }
        replacements
    }

    fn resolved_cube(
        &self,
        position: BlockPosition3D,
        block: &Block,
        replacements: &BTreeMap<BlockPosition3D, TemporalReplacements>,
    ) -> Result<Block, QlcError> {
        let block = match replacements.get(&position) {
            Some(replacement) => block
                .with_temporal_borders_replaced(replacement)?
                .ok_or_else(|| emptied_block(position))?,
            None => block.clone(),
        };
        let mut trimmed = BTreeSet::new();
        for pipe in self.spatial_pipes.values() {
            if pipe.u == position {
                trimmed.insert(spatial_border(pipe.direction, true)?);
            }
            if pipe.v == position {
                trimmed.insert(spatial_border(pipe.direction, false)?);
            }
        }
        if trimmed.is_empty() {
            return Ok(block);
        }
        block.with_spatial_borders_trimmed(&trimmed)
    }

    // Layers of a temporal pipe between its two borders run after the source
    // cube, in an extra round of its slice.
    fn realignments(&self) -> Result<BTreeMap<i64, BTreeMap<LayoutPosition2D, Block>>, QlcError> {
        let mut realignments: BTreeMap<i64, BTreeMap<LayoutPosition2D, Block>> = BTreeMap::new();
        for (source, (sink, pipe)) in &self.temporal_pipes {
            let layers = pipe.layers();
            if layers.len() <= 2 {
                continue;
            }
            if self
                .spatial_pipes
                .values()
                .any(|spatial| spatial.u == *source || spatial.v == *source)
            {
                return Err(QlcError::Unsupported(
                    ErrorInfo::new(
                        "realignment-beside-spatial-pipe",
                        "a temporal pipe with inner rounds cannot leave a cube with spatial pipes",
                    )
                    .with_context("source", source.to_string())
                    .with_context("sink", sink.to_string()),
                ));
            }
            let inner = Block::new(layers[1..layers.len() - 1].to_vec())?;
            debug!(%source, layers = inner.layers().len(), "realigning temporal pipe");
            realignments
                .entry(source.z)
                .or_default()
                .insert(LayoutPosition2D::from_block_position(source.as_2d()), inner);
        }
        Ok(realignments)
    }

    /// One sequence of merged layouts per height, bottom to top.
    pub fn to_layer_tree(&self) -> Result<LayerTree, QlcError> {
        if self.cubes.is_empty() {
            return Err(QlcError::Construction(ErrorInfo::new(
                "empty-graph",
                "a computation needs at least one cube",
            )));
        }
        let positions: Vec<LayoutPosition2D> = self
            .cubes
            .keys()
            .map(|p| LayoutPosition2D::from_block_position(p.as_2d()))
            .collect();
        let bounds = BlockBounds::from_layout_positions(positions.iter())?;
        let replacements = self.cube_replacements();

        let mut slices: BTreeMap<i64, BTreeMap<LayoutPosition2D, Block>> = BTreeMap::new();
        for (position, block) in &self.cubes {
            slices.entry(position.z).or_default().insert(
                LayoutPosition2D::from_block_position(position.as_2d()),
                self.resolved_cube(*position, block, &replacements)?,
            );
        }
        for (position, pipe) in &self.spatial_pipes {
            slices
                .entry(position.z)
                .or_default()
                .insert(position.as_2d(), pipe.block.clone());
        }
        let realignments = self.realignments()?;

        let mut z_levels = Vec::with_capacity(slices.len());
        let mut layers = Vec::with_capacity(slices.len());
        for (z, blocks) in &slices {
            let mut merged = merge_parallel_block_layers(blocks, self.element_shape, bounds)?;
            if let Some(inner) = realignments.get(z) {
                merged.extend(merge_parallel_block_layers(inner, self.element_shape, bounds)?);
            }
            debug!(z, blocks = blocks.len(), layers = merged.len(), "merged slice");
            layers.push(Layer::Sequenced(SequencedLayers::new(merged)?));
            z_levels.push(*z);
        }
        Ok(LayerTree::new(SequencedLayers::new(layers)?)?
            .with_z_levels(z_levels)
            .with_realignment_levels(realignments.keys().copied().collect())
            .with_observables(self.observables.clone(), Arc::clone(&self.observable_builder)))
    }

    /// Compiles the graph at `k`.
    pub fn generate_circuit(
        &self,
        k: u32,
        config: &CompileConfig,
        engine: &DetectorEngine,
    ) -> Result<Circuit, QlcError> {
        info!(
            k,
            cubes = self.cubes.len(),
            pipes = self.num_pipes(),
            "compiling computation graph"
        );
        self.to_layer_tree()?.generate_circuit(k, config, engine)
    }
}

fn spatial_border(
    direction: Direction3D,
    towards_positive: bool,
) -> Result<SpatialBlockBorder, QlcError> {
    let signed = SignedDirection3D::new(direction, towards_positive);
    match border_from_signed_direction(signed) {
        BlockBorder::Spatial(border) => Ok(border),
        BlockBorder::Temporal(_) => Err(QlcError::Construction(
            ErrorInfo::new("temporal-border", "expected a spatial direction")
                .with_context("direction", signed.to_string()),
        )),
    }
}

fn pipe_error(
    code: &str,
    message: &str,
    source: BlockPosition3D,
    sink: BlockPosition3D,
) -> QlcError {
    QlcError::Construction(
        ErrorInfo::new(code, message)
            .with_context("source", source.to_string())
            .with_context("sink", sink.to_string()),
    )
}

fn duplicate_pipe(source: BlockPosition3D, sink: BlockPosition3D) -> QlcError {
    pipe_error("duplicate-pipe", "a pipe already joins these cubes", source, sink)
}

fn emptied_block(position: BlockPosition3D) -> QlcError {
    QlcError::Construction(
        ErrorInfo::new("empty-block", "replacing temporal borders removed every layer")
            .with_context("position", position.to_string()),
    )
}
