use std::collections::BTreeSet;

use qlc_core::{ErrorInfo, LinearFunction, QlcError, Scalable2D};

use super::{Layer, TemporalReplacements};
use crate::blocks::enums::{SpatialBlockBorder, TemporalBlockBorder};

/// Layers executed one after the other on a shared footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedLayers {
    layers: Vec<Layer>,
}

impl SequencedLayers {
    /// Sequences `layers`, which must be non-empty and share one shape.
    pub fn new(layers: Vec<Layer>) -> Result<Self, QlcError> {
        check_same_shape(&layers)?;
        Ok(Self { layers })
    }

    /// Sequenced layers, earliest first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Consumes the sequence.
    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Shared footprint.
    pub fn scalable_shape(&self) -> Scalable2D {
        // Non-emptiness is checked at construction.
        self.layers[0].scalable_shape()
    }

    /// Sum of the time steps of every layer.
    pub fn scalable_timesteps(&self) -> LinearFunction {
        self.layers.iter().map(Layer::scalable_timesteps).sum()
    }

    /// Time steps of each layer.
    pub fn schedule(&self) -> Vec<LinearFunction> {
        self.layers.iter().map(Layer::scalable_timesteps).collect()
    }

    /// Copy with `borders` trimmed from every layer.
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

    /// Replaces the first layer for `-Z` and the last one for `+Z`.
    pub fn with_temporal_borders_replaced(
        &self,
        replacements: &TemporalReplacements,
    ) -> Result<Option<Layer>, QlcError> {
        if replacements.is_empty() {
            return Ok(Some(Layer::Sequenced(self.clone())));
        }
        if self.layers.len() == 1 {
            return self.layers[0].with_temporal_borders_replaced(replacements);
        }
        let last = self.layers.len() - 1;
        let mut layers: Vec<Option<Layer>> = self.layers.iter().cloned().map(Some).collect();
        for (border, replacement) in replacements {
            let (index, border_only) = match border {
                TemporalBlockBorder::ZNegative => (0, *border),
                TemporalBlockBorder::ZPositive => (last, *border),
            };
            let single = TemporalReplacements::from([(border_only, replacement.clone())]);
            layers[index] = self.layers[index].with_temporal_borders_replaced(&single)?;
        }
        let layers: Vec<Layer> = layers.into_iter().flatten().collect();
        if layers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Layer::Sequenced(Self::new(layers)?)))
    }

    /// Atomic layer executed at `border`.
    pub fn temporal_layer_on_border(&self, border: TemporalBlockBorder) -> &Layer {
        let layer = match border {
            TemporalBlockBorder::ZNegative => &self.layers[0],
            TemporalBlockBorder::ZPositive => &self.layers[self.layers.len() - 1],
        };
        layer.temporal_layer_on_border(border)
    }
}

/// Fails unless `layers` is non-empty and every layer has the same shape.
pub(crate) fn check_same_shape(layers: &[Layer]) -> Result<Scalable2D, QlcError> {
    let Some(first) = layers.first() else {
        return Err(QlcError::Construction(ErrorInfo::new(
            "empty-composition",
            "at least one layer is required",
        )));
    };
    let shape = first.scalable_shape();
    if let Some((index, other)) = layers
        .iter()
        .enumerate()
        .find(|(_, layer)| layer.scalable_shape() != shape)
    {
        return Err(QlcError::Construction(
            ErrorInfo::new("shape-mismatch", "layers must share one scalable shape")
                .with_context("expected", shape.to_string())
                .with_context("found", other.scalable_shape().to_string())
                .with_context("index", index.to_string()),
        ));
    }
    Ok(shape)
}
