use std::collections::BTreeMap;

use qlc_circuit::{merge_scheduled_circuits, ScheduledCircuit};
use qlc_core::{
    BlockPosition2D, Direction3D, ErrorInfo, LinearFunction, QlcError, Scalable2D, Shift2D,
};
use qlc_plaquette::{generate_circuit, Plaquette, Plaquettes, Template, TemplateBorder};

use super::Layer;
use crate::blocks::layout_template::{out_of_bounds, LayoutTemplate, TemplatePlacement};
use crate::blocks::positioning::{BlockBounds, LayoutPosition2D};
use crate::blocks::SPATIAL_BORDER_WIDTH;

/// Every atomic layer active during one time step, keyed by layout position.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLayer {
    layers: BTreeMap<LayoutPosition2D, Layer>,
    element_shape: Scalable2D,
    bounds: BlockBounds,
}

impl LayoutLayer {
    /// Assembles `layers` inside `bounds`.
    ///
    /// `element_shape` is the plaquette shape of one cube; all layouts of a
    /// computation share the same `bounds` so that they share a qubit frame.
    pub fn new(
        layers: BTreeMap<LayoutPosition2D, Layer>,
        element_shape: Scalable2D,
        bounds: BlockBounds,
    ) -> Result<Self, QlcError> {
        if layers.is_empty() {
            return Err(QlcError::Construction(ErrorInfo::new(
                "empty-composition",
                "a layout layer needs at least one entry",
            )));
        }
        for (position, layer) in &layers {
            if !layer.is_atomic() {
                return Err(QlcError::Construction(
                    ErrorInfo::new("non-atomic-layout-entry", "layout entries must be atomic")
                        .with_context("position", position.to_string())
                        .with_context("layer", layer.type_name()),
                ));
            }
            let blocks = match position {
                LayoutPosition2D::Cube { .. } => {
                    let block = position.to_block_position()?;
                    [block, block]
                }
                LayoutPosition2D::Pipe { .. } => {
                    let (u, v) = position.to_pipe()?;
                    [u, v]
                }
            };
            if let Some(block) = blocks.into_iter().find(|block| !bounds.contains(*block)) {
                return Err(out_of_bounds(block, &bounds));
            }
        }
        Ok(Self {
            layers,
            element_shape,
            bounds,
        })
    }

    /// Assembles `layers` inside their own bounding box.
    pub fn from_layers(
        layers: BTreeMap<LayoutPosition2D, Layer>,
        element_shape: Scalable2D,
    ) -> Result<Self, QlcError> {
        let bounds = BlockBounds::from_layout_positions(layers.keys())?;
        Self::new(layers, element_shape, bounds)
    }

    /// Entries by position.
    pub fn layers(&self) -> &BTreeMap<LayoutPosition2D, Layer> {
        &self.layers
    }

    /// Plaquette shape of one cube.
    pub fn element_shape(&self) -> Scalable2D {
        self.element_shape
    }

    /// Blocks spanned by the layout frame.
    pub fn bounds(&self) -> BlockBounds {
        self.bounds
    }

    /// Footprint in qubits of the whole frame.
    pub fn scalable_shape(&self) -> Scalable2D {
        let plaquettes = self
            .element_shape
            .scaled(self.bounds.width(), self.bounds.height());
        Scalable2D::new(
            plaquettes.x * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
            plaquettes.y * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
        )
    }

    /// Qubit coordinates of the top-left syndrome qubit of the frame at `k`.
    pub fn frame_origin(&self, k: u32) -> Shift2D {
        let element = self.element_shape.to_shape_2d(k);
        Shift2D::new(
            SPATIAL_BORDER_WIDTH * self.bounds.min.x * element.x,
            SPATIAL_BORDER_WIDTH * self.bounds.min.y * element.y,
        )
    }

    /// Single template covering every cube, with the plaquettes of each pipe
    /// written on the borders of the two cubes it joins.
    ///
    /// Indices of the returned plaquettes are global to the template.
    pub fn to_template_and_plaquettes(&self) -> Result<(LayoutTemplate, Plaquettes), QlcError> {
        let mut cubes = BTreeMap::new();
        for (position, layer) in &self.layers {
            if let LayoutPosition2D::Cube { .. } = position {
                let Layer::Plaquette(cube) = layer else {
                    return Err(not_a_plaquette_layer(position, layer));
                };
                cubes.insert(
                    position.to_block_position()?,
                    (cube.template(), cube.plaquettes().clone()),
                );
            }
        }

        let mut updates: BTreeMap<BlockPosition2D, BTreeMap<usize, Plaquette>> = BTreeMap::new();
        for (position, layer) in &self.layers {
            let Some(direction) = position.pipe_direction() else {
                continue;
            };
            let Layer::Plaquette(pipe) = layer else {
                return Err(not_a_plaquette_layer(position, layer));
            };
            let (u, v) = position.to_pipe()?;
            let sides = match direction {
                Direction3D::X => [
                    (u, TemplateBorder::Left, TemplateBorder::Right),
                    (v, TemplateBorder::Right, TemplateBorder::Left),
                ],
                _ => [
                    (u, TemplateBorder::Top, TemplateBorder::Bottom),
                    (v, TemplateBorder::Bottom, TemplateBorder::Top),
                ],
            };
            for (block, pipe_side, cube_side) in sides {
                let Some((cube_template, _)) = cubes.get(&block) else {
                    return Err(QlcError::Construction(
                        ErrorInfo::new(
                            "missing-pipe-endpoint",
                            "a pipe needs both of its cubes in the same layout layer",
                        )
                        .with_context("pipe", position.to_string())
                        .with_context("block", block.to_string()),
                    ));
                };
                let mapping = pipe
                    .template()
                    .border_indices(pipe_side)?
                    .to(&cube_template.border_indices(cube_side)?);
                let slot = updates.entry(block).or_default();
                for (pipe_index, cube_index) in mapping {
                    if !pipe.plaquettes().contains(pipe_index) {
                        continue;
                    }
                    let plaquette = pipe.plaquettes().get(pipe_index);
                    match slot.get(&cube_index) {
                        Some(existing) if existing != plaquette => {
                            return Err(QlcError::Unsupported(
                                ErrorInfo::new(
                                    "overlapping-pipes",
                                    "two pipes write different plaquettes on one cube corner",
                                )
                                .with_context("block", block.to_string())
                                .with_context("index", cube_index.to_string()),
                            ));
                        }
                        _ => {
                            slot.insert(cube_index, plaquette.clone());
                        }
                    }
                }
            }
        }

        let mut offset = 0;
        let mut placements = Vec::with_capacity(cubes.len());
        let mut collection = BTreeMap::new();
        for (block, (template, plaquettes)) in cubes {
            let plaquettes = match updates.remove(&block) {
                Some(update) => plaquettes.with_updated_plaquettes(update),
                None => plaquettes,
            };
            let count = template.expected_plaquettes_number();
            let indices = (1..=count)
                .map(|local| if plaquettes.contains(local) { offset + local } else { 0 })
                .collect();
            for (local, plaquette) in plaquettes.iter() {
                if (1..=count).contains(&local) {
                    collection.insert(offset + local, plaquette.clone());
                }
            }
            placements.push(TemplatePlacement {
                block,
                template,
                indices,
            });
            offset += count;
        }
        let template = LayoutTemplate::new(self.element_shape, self.bounds, placements)?;
        Ok((template, Plaquettes::new(collection)))
    }

    /// Circuit of the time step at `k`, in absolute qubit coordinates.
    ///
    /// Raw entries are placed at the origin of their cube.
    pub fn to_circuit(&self, k: u32) -> Result<ScheduledCircuit, QlcError> {
        let has_raw = self.layers.values().any(|layer| matches!(layer, Layer::Raw(_)));
        if !has_raw {
            let (template, plaquettes) = self.to_template_and_plaquettes()?;
            return Ok(generate_circuit(&template, k, &plaquettes)?.shifted(self.frame_origin(k)));
        }
        let element = self.element_shape.to_shape_2d(k);
        let mut circuits = Vec::with_capacity(self.layers.len());
        for (position, layer) in &self.layers {
            let Layer::Raw(raw) = layer else {
                return Err(QlcError::Unsupported(
                    ErrorInfo::new(
                        "mixed-raw-layout",
                        "raw circuits cannot share a layout layer with plaquette layers",
                    )
                    .with_context("position", position.to_string()),
                ));
            };
            let block = position.to_block_position()?;
            let origin = Shift2D::new(
                SPATIAL_BORDER_WIDTH * block.x * element.x,
                SPATIAL_BORDER_WIDTH * block.y * element.y,
            );
            circuits.push(raw.to_circuit(k)?.shifted(origin));
        }
        merge_scheduled_circuits(&circuits)
    }
}

fn not_a_plaquette_layer(position: &LayoutPosition2D, layer: &Layer) -> QlcError {
    QlcError::Unsupported(
        ErrorInfo::new(
            "not-a-plaquette-layer",
            "only plaquette layers can be turned into a template",
        )
        .with_context("position", position.to_string())
        .with_context("layer", layer.type_name()),
    )
}
