//! Merging of the layers of blocks executed in parallel.
//!
//! Blocks active during the same span of time are merged slot by slot into
//! [`LayoutLayer`]s. Composed layers are merged recursively, which requires
//! their inner structure to be aligned first.

use std::collections::{BTreeMap, BTreeSet};

use qlc_core::{lcm, ErrorInfo, LinearFunction, QlcError, Scalable2D};
use tracing::debug;

use crate::blocks::block::Block;
use crate::blocks::layers::{Layer, LayoutLayer, RepeatedLayer, SequencedLayers};
use crate::blocks::positioning::{BlockBounds, LayoutPosition2D};

/// Merges blocks executed in parallel into one layer per schedule slot.
///
/// Every block must have the same schedule. `element_shape` is the plaquette
/// shape of a cube and `bounds` the frame shared by all produced layouts.
pub fn merge_parallel_block_layers(
    blocks: &BTreeMap<LayoutPosition2D, Block>,
    element_shape: Scalable2D,
    bounds: BlockBounds,
) -> Result<Vec<Layer>, QlcError> {
    let schedules: BTreeSet<Vec<LinearFunction>> =
        blocks.values().map(Block::schedule).collect();
    if schedules.len() > 1 {
        return Err(QlcError::Construction(
            ErrorInfo::new(
                "schedule-mismatch",
                "blocks executed in parallel must share one schedule",
            )
            .with_context("schedules", format_schedules(schedules.iter())),
        ));
    }
    let Some(schedule) = schedules.into_iter().next() else {
        return Ok(Vec::new());
    };
    debug!(
        blocks = blocks.len(),
        slots = schedule.len(),
        "merging parallel blocks"
    );
    let merger = Merger {
        element_shape,
        bounds,
    };
    (0..schedule.len())
        .map(|slot| {
            let layers = blocks
                .iter()
                .map(|(position, block)| (*position, block.layers()[slot].clone()))
                .collect();
            merger.merge_slot(layers)
        })
        .collect()
}

struct Merger {
    element_shape: Scalable2D,
    bounds: BlockBounds,
}

impl Merger {
    fn merge_slot(&self, layers: BTreeMap<LayoutPosition2D, Layer>) -> Result<Layer, QlcError> {
        if layers.values().all(Layer::is_atomic) {
            return self.merge_atomic(layers);
        }
        if layers.values().all(|layer| !layer.is_atomic()) {
            return self.merge_composed(layers);
        }
        Err(QlcError::Construction(
            ErrorInfo::new(
                "mixed-layer-kinds",
                "atomic and composed layers cannot be merged in the same slot",
            )
            .with_context(
                "layers",
                layers.values().map(Layer::type_name).collect::<Vec<_>>().join(","),
            ),
        ))
    }

    fn merge_atomic(&self, layers: BTreeMap<LayoutPosition2D, Layer>) -> Result<Layer, QlcError> {
        Ok(Layer::Layout(LayoutLayer::new(
            layers,
            self.element_shape,
            self.bounds,
        )?))
    }

    fn merge_composed(
        &self,
        layers: BTreeMap<LayoutPosition2D, Layer>,
    ) -> Result<Layer, QlcError> {
        let timesteps: BTreeSet<LinearFunction> =
            layers.values().map(Layer::scalable_timesteps).collect();
        if timesteps.len() > 1 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "timesteps-mismatch",
                    "composed layers merged together must last the same time",
                )
                .with_context(
                    "timesteps",
                    timesteps.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
                ),
            ));
        }
        let repeated = layers
            .values()
            .filter(|layer| matches!(layer, Layer::Repeated(_)))
            .count();
        if repeated == layers.len() {
            self.merge_repeated(layers)
        } else if repeated == 0 {
            self.merge_sequenced(layers)
        } else {
            self.merge_repeated_and_sequenced(layers)
        }
    }

    fn merge_repeated(&self, layers: BTreeMap<LayoutPosition2D, Layer>) -> Result<Layer, QlcError> {
        let mut bodies = BTreeMap::new();
        let mut total = LinearFunction::constant(0);
        for (position, layer) in &layers {
            let Layer::Repeated(repeated) = layer else {
                continue;
            };
            let body_timesteps = repeated.body().scalable_timesteps();
            let Some(duration) = body_timesteps.as_constant() else {
                return Err(QlcError::Unsupported(
                    ErrorInfo::new(
                        "scalable-repeated-body",
                        "cannot merge repeated layers whose body has a scalable duration",
                    )
                    .with_context("position", position.to_string())
                    .with_context("body", body_timesteps.to_string()),
                ));
            };
            // A constant body unrolls identically at any k.
            bodies.insert(*position, (duration, repeated.body().all_layers(1)));
            total = repeated.scalable_timesteps();
        }
        let period = lcm(bodies.values().map(|(duration, _)| *duration));
        let repetitions = total.exact_integer_div(period)?;
        let period = usize::try_from(period).unwrap_or(0);
        let mut slots = Vec::with_capacity(period);
        for slot in 0..period {
            let at_slot = bodies
                .iter()
                .map(|(position, (_, sequence))| {
                    (*position, sequence[slot % sequence.len()].clone())
                })
                .collect();
            slots.push(self.merge_atomic(at_slot)?);
        }
        let body = if slots.len() == 1 {
            slots.remove(0)
        } else {
            Layer::Sequenced(SequencedLayers::new(slots)?)
        };
        Ok(Layer::Repeated(RepeatedLayer::new(body, repetitions)?))
    }

    fn merge_sequenced(
        &self,
        layers: BTreeMap<LayoutPosition2D, Layer>,
    ) -> Result<Layer, QlcError> {
        let mut sequences = BTreeMap::new();
        for (position, layer) in layers {
            if let Layer::Sequenced(sequence) = layer {
                sequences.insert(position, sequence);
            }
        }
        let schedules: BTreeSet<Vec<LinearFunction>> =
            sequences.values().map(SequencedLayers::schedule).collect();
        if schedules.len() != 1 {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "schedule-mismatch",
                    "only sequences with matching schedules can be merged",
                )
                .with_context("schedules", format_schedules(schedules.iter())),
            ));
        }
        let length = sequences.values().map(|s| s.layers().len()).max().unwrap_or(0);
        let mut merged = Vec::with_capacity(length);
        for slot in 0..length {
            let at_slot = sequences
                .iter()
                .map(|(position, sequence)| (*position, sequence.layers()[slot].clone()))
                .collect();
            merged.push(self.merge_slot(at_slot)?);
        }
        Ok(Layer::Sequenced(SequencedLayers::new(merged)?))
    }

    fn merge_repeated_and_sequenced(
        &self,
        layers: BTreeMap<LayoutPosition2D, Layer>,
    ) -> Result<Layer, QlcError> {
        let schedules: BTreeSet<Vec<LinearFunction>> = layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Sequenced(sequence) => Some(sequence.schedule()),
                _ => None,
            })
            .collect();
        if schedules.len() != 1 {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "schedule-mismatch",
                    "sequences merged with repeated layers must share one schedule",
                )
                .with_context("schedules", format_schedules(schedules.iter())),
            ));
        }
        let schedule: Vec<LinearFunction> = schedules.into_iter().next().unwrap_or_default();
        let mut aligned = BTreeMap::new();
        for (position, layer) in layers {
            let sequence = match layer {
                Layer::Repeated(repeated) => {
                    Layer::Sequenced(repeated.to_sequenced_layer_with_schedule(&schedule)?)
                }
                other => other,
            };
            aligned.insert(position, sequence);
        }
        self.merge_sequenced(aligned)
    }
}

fn format_schedules<'a, I>(schedules: I) -> String
where
    I: Iterator<Item = &'a Vec<LinearFunction>>,
{
    schedules
        .map(|schedule| {
            let entries: Vec<String> = schedule.iter().map(ToString::to_string).collect();
            format!("[{}]", entries.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
