//! Template made of several cube templates laid out on the block grid.

use qlc_core::{BlockPosition2D, ErrorInfo, QlcError, Scalable2D, Shift2D};
use qlc_plaquette::{BorderIndices, PlaquetteGrid, RectangularTemplate, Template, TemplateBorder};

use crate::blocks::positioning::BlockBounds;
use crate::blocks::SPATIAL_BORDER_WIDTH;

/// One cube template placed on the block grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePlacement {
    /// Block occupied by the template.
    pub block: BlockPosition2D,
    /// Placed template.
    pub template: RectangularTemplate,
    /// Global index used in place of local index `i + 1`; `0` for no plaquette.
    pub indices: Vec<usize>,
}

/// Juxtaposition of cube templates, each offset by `block * element_shape`
/// plaquettes from the top-left block of `bounds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTemplate {
    element_shape: Scalable2D,
    bounds: BlockBounds,
    placements: Vec<TemplatePlacement>,
    expected_plaquettes: usize,
}

impl LayoutTemplate {
    /// Lays out `placements`, every template having `element_shape` plaquettes.
    pub fn new(
        element_shape: Scalable2D,
        bounds: BlockBounds,
        placements: Vec<TemplatePlacement>,
    ) -> Result<Self, QlcError> {
        let mut expected_plaquettes = 0;
        for placement in &placements {
            if placement.template.scalable_shape() != element_shape {
                return Err(QlcError::Construction(
                    ErrorInfo::new(
                        "shape-mismatch",
                        "every template of a layout must have the element shape",
                    )
                    .with_context("block", placement.block.to_string())
                    .with_context("expected", element_shape.to_string())
                    .with_context("found", placement.template.scalable_shape().to_string()),
                ));
            }
            if !bounds.contains(placement.block) {
                return Err(out_of_bounds(placement.block, &bounds));
            }
            if placement.indices.len() != placement.template.expected_plaquettes_number() {
                return Err(QlcError::Construction(
                    ErrorInfo::new(
                        "missing-template-indices",
                        "one global index is required per template index",
                    )
                    .with_context("block", placement.block.to_string())
                    .with_context("provided", placement.indices.len().to_string()),
                ));
            }
            expected_plaquettes = placement
                .indices
                .iter()
                .copied()
                .fold(expected_plaquettes, usize::max);
        }
        Ok(Self {
            element_shape,
            bounds,
            placements,
            expected_plaquettes,
        })
    }

    /// Placed templates.
    pub fn placements(&self) -> &[TemplatePlacement] {
        &self.placements
    }

    /// Blocks covered by the layout.
    pub fn bounds(&self) -> BlockBounds {
        self.bounds
    }

    /// Shape of one block in plaquettes.
    pub fn element_shape(&self) -> Scalable2D {
        self.element_shape
    }

    /// Plaquette offset `(x, y)` of `block` from the layout origin at `k`.
    pub fn block_origin(&self, block: BlockPosition2D, k: u32) -> Shift2D {
        let element = self.element_shape.to_shape_2d(k);
        Shift2D::new(
            (block.x - self.bounds.min.x) * element.x,
            (block.y - self.bounds.min.y) * element.y,
        )
    }

    fn try_instantiate(&self, k: u32) -> Result<PlaquetteGrid, QlcError> {
        let shape = self.shape(k);
        let mut grid = PlaquetteGrid::zeros(shape.y as usize, shape.x as usize);
        for placement in &self.placements {
            let local = placement
                .template
                .instantiate_with_indices(k, &placement.indices)?;
            let origin = self.block_origin(placement.block, k);
            for (row, col, index) in local.iter() {
                grid.set(origin.y as usize + row, origin.x as usize + col, index);
            }
        }
        Ok(grid)
    }
}

impl Template for LayoutTemplate {
    fn instantiate(&self, k: u32) -> PlaquetteGrid {
        // Placements are validated at construction.
        self.try_instantiate(k)
            .unwrap_or_else(|_| PlaquetteGrid::zeros(0, 0))
    }

    fn scalable_shape(&self) -> Scalable2D {
        self.element_shape
            .scaled(self.bounds.width(), self.bounds.height())
    }

    fn expected_plaquettes_number(&self) -> usize {
        self.expected_plaquettes
    }

    fn border_indices(&self, border: TemplateBorder) -> Result<BorderIndices, QlcError> {
        Err(QlcError::Unsupported(
            ErrorInfo::new(
                "no-repeating-border",
                "a layout template has no repeating border indices",
            )
            .with_context("border", format!("{border:?}")),
        ))
    }

    fn increments(&self) -> Shift2D {
        Shift2D::new(SPATIAL_BORDER_WIDTH, SPATIAL_BORDER_WIDTH)
    }

    fn name(&self) -> String {
        "LayoutTemplate".to_string()
    }
}

pub(crate) fn out_of_bounds(block: BlockPosition2D, bounds: &BlockBounds) -> QlcError {
    QlcError::Construction(
        ErrorInfo::new("position-out-of-bounds", "block lies outside of the layout bounds")
            .with_context("block", block.to_string())
            .with_context("min", bounds.min.to_string())
            .with_context("max", bounds.max.to_string()),
    )
}
