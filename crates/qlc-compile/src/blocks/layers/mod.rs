//! Layers: what happens on a block footprint during one or several rounds.
//!
//! Atomic layers ([`PlaquetteLayer`], [`LayoutLayer`], [`RawCircuitLayer`])
//! span exactly one time step. Composed layers ([`SequencedLayers`],
//! [`RepeatedLayer`]) arrange other layers in time. Every operation dispatches
//! on the closed [`Layer`] enum, so an operation that makes no sense for one
//! kind fails with [`QlcError::Unsupported`] instead of being silently ignored.

mod layout;
mod plaquette;
mod raw;
mod repeated;
mod sequenced;

use std::collections::{BTreeMap, BTreeSet};

use qlc_core::{ErrorInfo, LinearFunction, QlcError, Scalable2D};

pub use layout::LayoutLayer;
pub use plaquette::PlaquetteLayer;
pub use raw::{CircuitFactory, RawCircuitLayer};
pub use repeated::RepeatedLayer;
pub use sequenced::SequencedLayers;

pub(crate) use sequenced::check_same_shape;

use crate::blocks::enums::{SpatialBlockBorder, TemporalBlockBorder};

/// Replacement of temporal borders; `None` removes the border layer.
pub type TemporalReplacements = BTreeMap<TemporalBlockBorder, Option<Layer>>;

/// Any layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Template and plaquettes of one block.
    Plaquette(PlaquetteLayer),
    /// Assembled layout of every block active during one time step.
    Layout(LayoutLayer),
    /// Injected circuit.
    Raw(RawCircuitLayer),
    /// Layers executed one after the other.
    Sequenced(SequencedLayers),
    /// Layer executed a scalable number of times.
    Repeated(RepeatedLayer),
}

impl Layer {
    /// Name of the layer kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Layer::Plaquette(_) => "PlaquetteLayer",
            Layer::Layout(_) => "LayoutLayer",
            Layer::Raw(_) => "RawCircuitLayer",
            Layer::Sequenced(_) => "SequencedLayers",
            Layer::Repeated(_) => "RepeatedLayer",
        }
    }

    /// Returns `true` for layers spanning a single time step.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Layer::Plaquette(_) | Layer::Layout(_) | Layer::Raw(_))
    }

    /// Footprint in qubits.
    pub fn scalable_shape(&self) -> Scalable2D {
        match self {
            Layer::Plaquette(layer) => layer.scalable_shape(),
            Layer::Layout(layer) => layer.scalable_shape(),
            Layer::Raw(layer) => layer.scalable_shape(),
            Layer::Sequenced(layer) => layer.scalable_shape(),
            Layer::Repeated(layer) => layer.scalable_shape(),
        }
    }

    /// Number of time steps.
    pub fn scalable_timesteps(&self) -> LinearFunction {
        match self {
            Layer::Plaquette(_) | Layer::Layout(_) | Layer::Raw(_) => LinearFunction::constant(1),
            Layer::Sequenced(layer) => layer.scalable_timesteps(),
            Layer::Repeated(layer) => layer.scalable_timesteps(),
        }
    }

    /// Number of time steps at `k`.
    pub fn timesteps(&self, k: u32) -> i64 {
        self.scalable_timesteps().integer_eval(k)
    }

    /// Copy without the plaquettes on `borders`.
    pub fn with_spatial_borders_trimmed(
        &self,
        borders: &BTreeSet<SpatialBlockBorder>,
    ) -> Result<Layer, QlcError> {
        match self {
            Layer::Plaquette(layer) => {
                Ok(Layer::Plaquette(layer.with_spatial_borders_trimmed(borders)?))
            }
            Layer::Layout(_) | Layer::Raw(_) => Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "unsupported-spatial-trim",
                    "spatial borders cannot be trimmed from this layer",
                )
                .with_context("layer", self.type_name())
                .with_hint("trim the per-block layers before assembling them"),
            )),
            Layer::Sequenced(layer) => {
                Ok(Layer::Sequenced(layer.with_spatial_borders_trimmed(borders)?))
            }
            Layer::Repeated(layer) => {
                Ok(Layer::Repeated(layer.with_spatial_borders_trimmed(borders)?))
            }
        }
    }

    /// Copy with the layers at the temporal borders replaced.
    ///
    /// Returns `None` when every time step has been removed.
    pub fn with_temporal_borders_replaced(
        &self,
        replacements: &TemporalReplacements,
    ) -> Result<Option<Layer>, QlcError> {
        match self {
            Layer::Plaquette(_) | Layer::Layout(_) | Layer::Raw(_) => {
                replace_atomic_temporal_borders(self, replacements)
            }
            Layer::Sequenced(layer) => layer.with_temporal_borders_replaced(replacements),
            Layer::Repeated(layer) => layer.with_temporal_borders_replaced(replacements),
        }
    }

    /// Copy without the layers at `borders`.
    pub fn with_temporal_borders_trimmed(
        &self,
        borders: &BTreeSet<TemporalBlockBorder>,
    ) -> Result<Option<Layer>, QlcError> {
        let replacements = borders.iter().map(|border| (*border, None)).collect();
        self.with_temporal_borders_replaced(&replacements)
    }

    /// Atomic layers in time order at `k`.
    pub fn all_layers(&self, k: u32) -> Vec<Layer> {
        match self {
            Layer::Plaquette(_) | Layer::Layout(_) | Layer::Raw(_) => vec![self.clone()],
            Layer::Sequenced(layer) => layer
                .layers()
                .iter()
                .flat_map(|inner| inner.all_layers(k))
                .collect(),
            Layer::Repeated(layer) => {
                let body = layer.body().all_layers(k);
                let repetitions =
                    usize::try_from(layer.repetitions().integer_eval(k)).unwrap_or(0);
                let mut layers = Vec::with_capacity(body.len() * repetitions);
                for _ in 0..repetitions {
                    layers.extend(body.iter().cloned());
                }
                layers
            }
        }
    }

    /// Atomic layer executed at `border`.
    pub fn temporal_layer_on_border(&self, border: TemporalBlockBorder) -> &Layer {
        match self {
            Layer::Plaquette(_) | Layer::Layout(_) | Layer::Raw(_) => self,
            Layer::Sequenced(layer) => layer.temporal_layer_on_border(border),
            Layer::Repeated(layer) => layer.body().temporal_layer_on_border(border),
        }
    }
}

impl From<PlaquetteLayer> for Layer {
    fn from(layer: PlaquetteLayer) -> Self {
        Layer::Plaquette(layer)
    }
}

impl From<LayoutLayer> for Layer {
    fn from(layer: LayoutLayer) -> Self {
        Layer::Layout(layer)
    }
}

impl From<RawCircuitLayer> for Layer {
    fn from(layer: RawCircuitLayer) -> Self {
        Layer::Raw(layer)
    }
}

impl From<SequencedLayers> for Layer {
    fn from(layer: SequencedLayers) -> Self {
        Layer::Sequenced(layer)
    }
}

impl From<RepeatedLayer> for Layer {
    fn from(layer: RepeatedLayer) -> Self {
        Layer::Repeated(layer)
    }
}

// An atomic layer is its own first and last time step, so at most one border
// may receive an actual layer.
fn replace_atomic_temporal_borders(
    layer: &Layer,
    replacements: &TemporalReplacements,
) -> Result<Option<Layer>, QlcError> {
    if replacements.is_empty() {
        return Ok(Some(layer.clone()));
    }
    if replacements.len() > 1 && replacements.values().any(Option::is_some) {
        return Err(QlcError::Construction(
            ErrorInfo::new(
                "ambiguous-temporal-replacement",
                "an atomic layer cannot receive two different temporal replacements",
            )
            .with_context("layer", layer.type_name()),
        ));
    }
    Ok(replacements.values().next().cloned().flatten())
}
