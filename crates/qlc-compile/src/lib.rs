#![deny(missing_docs)]
#![doc = "Block compilation engine of QLC: composable layers, layout merging, the annotated layer tree, the cached detector engine and logical observables."]

pub mod batch;
pub mod blocks;
pub mod compile;
pub mod config;
pub mod detectors;
pub mod graph;
pub mod observables;
pub mod specs;
pub mod tree;

pub use batch::compile_many;
pub use blocks::{
    merge_parallel_block_layers, Block, BlockBounds, Layer, LayoutLayer, LayoutPosition2D,
    LayoutPosition3D, PlaquetteLayer, RawCircuitLayer, RepeatedLayer, SequencedLayers,
};
pub use compile::{compile_block_graph, BlockGraph};
pub use config::{CompileConfig, DatabaseConfig, PersistedDatabase, DATABASE_PATH_ENV};
pub use detectors::{
    analyse_circuit, compute_detectors_for_fixed_radius, DatabaseFormat, DetectorDatabase,
    DetectorEngine, DetectorSearch, DetectorStore, FlowDetectorSearch, LookbackStack,
};
pub use graph::TopologicalComputationGraph;
pub use observables::{
    AbstractObservable, ObservableBuilder, ObservableCube, ObservablePipe,
    SurfaceCodeObservableBuilder,
};
pub use specs::{BlockBuilder, CubeKind, CubeSpec, PipeSpec, SpatialArms, StandardBlockBuilder};
pub use tree::{LayerNode, LayerTree, NodeWalker};
