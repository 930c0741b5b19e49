//! Layer tree: nodes, their per-`k` annotations and the walkers computing
//! them.

pub mod annotations;
pub mod annotators;
pub mod layer_tree;
pub mod node;

pub use annotations::{
    DetectorAnnotation, LayerNodeAnnotations, LayerTreeAnnotations, ObservableAnnotation, Polygon,
};
pub use layer_tree::LayerTree;
pub use node::{LayerNode, NodeWalker};
