//! Blocks, the layers they are made of and their assembly into layouts.

pub mod block;
pub mod enums;
pub mod layers;
pub mod layout_template;
pub mod merge;
pub mod positioning;

/// Number of qubit rows or columns between two neighbouring plaquettes.
///
/// Shapes, frame origins and template increments all derive from this value.
pub const SPATIAL_BORDER_WIDTH: i64 = 2;

pub use block::Block;
pub use enums::{border_from_signed_direction, BlockBorder, SpatialBlockBorder, TemporalBlockBorder};
pub use layers::{
    CircuitFactory, Layer, LayoutLayer, PlaquetteLayer, RawCircuitLayer, RepeatedLayer,
    SequencedLayers, TemporalReplacements,
};
pub use layout_template::{LayoutTemplate, TemplatePlacement};
pub use merge::merge_parallel_block_layers;
pub use positioning::{BlockBounds, LayoutPosition2D, LayoutPosition3D};
