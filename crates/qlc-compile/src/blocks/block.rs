//! Cubes and pipes as stacks of layers.

use std::collections::BTreeSet;

use qlc_core::{Direction3D, LinearFunction, QlcError, Scalable2D};

use crate::blocks::enums::{SpatialBlockBorder, TemporalBlockBorder};
use crate::blocks::layers::{check_same_shape, Layer, SequencedLayers, TemporalReplacements};

/// Time-ordered layers sharing one footprint.
///
/// Cubes scale along the three axes. Spatial pipes have one constant spatial
/// dimension, temporal pipes a constant duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    layers: Vec<Layer>,
}

impl Block {
    /// Creates a block from non-empty layers sharing one shape.
    pub fn new(layers: Vec<Layer>) -> Result<Self, QlcError> {
        check_same_shape(&layers)?;
        Ok(Self { layers })
    }

    /// Layers, earliest first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Footprint in qubits.
    pub fn scalable_shape(&self) -> Scalable2D {
        self.layers[0].scalable_shape()
    }

    /// Duration in time steps.
    pub fn scalable_timesteps(&self) -> LinearFunction {
        self.layers.iter().map(Layer::scalable_timesteps).sum()
    }

    /// Duration of each layer.
    pub fn schedule(&self) -> Vec<LinearFunction> {
        self.layers.iter().map(Layer::scalable_timesteps).collect()
    }

    /// `(x, y, z)` extents.
    pub fn dimensions(&self) -> (LinearFunction, LinearFunction, LinearFunction) {
        let shape = self.scalable_shape();
        (shape.x, shape.y, self.scalable_timesteps())
    }

    /// Returns `true` when every dimension scales.
    pub fn is_cube(&self) -> bool {
        let (x, y, z) = self.dimensions();
        x.is_scalable() && y.is_scalable() && z.is_scalable()
    }

    /// Returns `true` when exactly one dimension is constant.
    pub fn is_pipe(&self) -> bool {
        let (x, y, z) = self.dimensions();
        [x, y, z].iter().filter(|d| d.is_constant()).count() == 1
    }

    /// Returns `true` for pipes with a constant duration.
    pub fn is_temporal_pipe(&self) -> bool {
        self.is_pipe() && self.scalable_timesteps().is_constant()
    }

    /// Axis along which a spatial pipe joins its cubes.
    pub fn spatial_pipe_direction(&self) -> Option<Direction3D> {
        if !self.is_pipe() {
            return None;
        }
        let (x, y, _) = self.dimensions();
        if x.is_constant() {
            Some(Direction3D::X)
        } else if y.is_constant() {
            Some(Direction3D::Y)
        } else {
            None
        }
    }

    /// Spatial borders trimmed from any plaquette layer of the block.
    pub fn trimmed_spatial_borders(&self) -> BTreeSet<SpatialBlockBorder> {
        let mut borders = BTreeSet::new();
        let mut stack: Vec<&Layer> = self.layers.iter().collect();
        while let Some(layer) = stack.pop() {
            match layer {
                Layer::Plaquette(plaquette) => {
                    borders.extend(plaquette.trimmed_spatial_borders().iter().copied());
                }
                Layer::Layout(_) | Layer::Raw(_) => {}
                Layer::Sequenced(sequenced) => stack.extend(sequenced.layers()),
                Layer::Repeated(repeated) => stack.push(repeated.body()),
            }
        }
        borders
    }

    /// Atomic layer executed at `border`.
    pub fn get_atomic_temporal_border(&self, border: TemporalBlockBorder) -> &Layer {
        let layer = match border {
            TemporalBlockBorder::ZNegative => &self.layers[0],
            TemporalBlockBorder::ZPositive => &self.layers[self.layers.len() - 1],
        };
        layer.temporal_layer_on_border(border)
    }

    /// Copy without the plaquettes on `borders`.
    pub fn with_spatial_borders_trimmed(
        &self,
        borders: &BTreeSet<SpatialBlockBorder>,
    ) -> Result<Self, QlcError> {
        let layers = self
            .layers
            .iter()
            .map(|layer| layer.with_spatial_borders_trimmed(borders))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(layers)
    }

    /// Copy with its temporal borders replaced, `None` when nothing remains.
    pub fn with_temporal_borders_replaced(
        &self,
        replacements: &TemporalReplacements,
    ) -> Result<Option<Self>, QlcError> {
        let sequence = SequencedLayers::new(self.layers.clone())?;
        let replaced = match sequence.with_temporal_borders_replaced(replacements)? {
            None => return Ok(None),
            Some(Layer::Sequenced(sequence)) => sequence.into_layers(),
            Some(layer) => vec![layer],
        };
        Ok(Some(Self::new(replaced)?))
    }
}
