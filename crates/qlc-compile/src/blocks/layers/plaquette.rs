use std::collections::BTreeSet;

use qlc_circuit::ScheduledCircuit;
use qlc_core::{ErrorInfo, LinearFunction, QlcError, Scalable2D, Shift2D};
use qlc_plaquette::{generate_circuit, Plaquettes, RectangularTemplate, Template, TemplateBorder};

use crate::blocks::enums::SpatialBlockBorder;
use crate::blocks::SPATIAL_BORDER_WIDTH;

/// One round of plaquettes laid on a rectangular template.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaquetteLayer {
    template: RectangularTemplate,
    plaquettes: Plaquettes,
    trimmed_spatial_borders: BTreeSet<SpatialBlockBorder>,
}

impl PlaquetteLayer {
    /// Creates an untrimmed layer.
    pub fn new(template: RectangularTemplate, plaquettes: Plaquettes) -> Result<Self, QlcError> {
        Self::with_trimmed_borders(template, plaquettes, BTreeSet::new())
    }

    /// Creates a layer whose `trimmed_spatial_borders` are already removed.
    pub fn with_trimmed_borders(
        template: RectangularTemplate,
        plaquettes: Plaquettes,
        trimmed_spatial_borders: BTreeSet<SpatialBlockBorder>,
    ) -> Result<Self, QlcError> {
        let increments = template.increments();
        if increments != Shift2D::new(SPATIAL_BORDER_WIDTH, SPATIAL_BORDER_WIDTH) {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "unexpected-increments",
                    "template increments must match the spatial border width",
                )
                .with_context("template", template.name())
                .with_context("increments", format!("({}, {})", increments.x, increments.y)),
            ));
        }
        let layer = Self {
            template,
            plaquettes,
            trimmed_spatial_borders,
        };
        let shape = layer.trimmed_plaquette_shape();
        let at_one = shape.to_shape_2d(1);
        if shape.x.slope < 0 || shape.y.slope < 0 || at_one.x <= 0 || at_one.y <= 0 {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "empty-trimmed-shape",
                    "trimming removed every plaquette of the template",
                )
                .with_context("template", layer.template.name())
                .with_context("shape", shape.to_string()),
            ));
        }
        Ok(layer)
    }

    /// Underlying template.
    pub fn template(&self) -> RectangularTemplate {
        self.template
    }

    /// Plaquettes, without the ones on trimmed borders.
    pub fn plaquettes(&self) -> &Plaquettes {
        &self.plaquettes
    }

    /// Borders removed so far.
    pub fn trimmed_spatial_borders(&self) -> &BTreeSet<SpatialBlockBorder> {
        &self.trimmed_spatial_borders
    }

    fn trimmed_plaquette_shape(&self) -> Scalable2D {
        let (mut dx, mut dy) = (0, 0);
        for border in &self.trimmed_spatial_borders {
            match border.to_template_border() {
                TemplateBorder::Left | TemplateBorder::Right => dx += 1,
                TemplateBorder::Top | TemplateBorder::Bottom => dy += 1,
            }
        }
        self.template.scalable_shape()
            - Scalable2D::new(LinearFunction::constant(dx), LinearFunction::constant(dy))
    }

    /// Footprint in qubits, trimmed borders excluded.
    pub fn scalable_shape(&self) -> Scalable2D {
        let plaquettes = self.trimmed_plaquette_shape();
        Scalable2D::new(
            plaquettes.x * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
            plaquettes.y * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
        )
    }

    /// Copy without the plaquettes on `borders`.
    pub fn with_spatial_borders_trimmed(
        &self,
        borders: &BTreeSet<SpatialBlockBorder>,
    ) -> Result<Self, QlcError> {
        let mut removed = BTreeSet::new();
        for border in borders {
            let indices = self.template.border_indices(border.to_template_border())?;
            removed.extend(indices.as_array());
        }
        let trimmed = self
            .trimmed_spatial_borders
            .union(borders)
            .copied()
            .collect();
        Self::with_trimmed_borders(
            self.template,
            self.plaquettes.without_plaquettes(&removed),
            trimmed,
        )
    }

    /// Copy with plaquettes replaced.
    pub fn with_plaquettes(&self, plaquettes: Plaquettes) -> Self {
        Self {
            template: self.template,
            plaquettes,
            trimmed_spatial_borders: self.trimmed_spatial_borders.clone(),
        }
    }

    /// Circuit of one round at `k`, in template-local coordinates.
    pub fn to_circuit(&self, k: u32) -> Result<ScheduledCircuit, QlcError> {
        generate_circuit(&self.template, k, &self.plaquettes)
    }
}
