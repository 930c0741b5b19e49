//! Extraction of the distinct local neighbourhoods of stacked instantiations.

use std::collections::BTreeMap;

use qlc_core::{ErrorInfo, QlcError};
use serde::{Deserialize, Serialize};

use crate::template::PlaquetteGrid;

/// `(2r + 1) x (2r + 1)` window around one cell, one slice per time step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubTemplate3D {
    radius: usize,
    slices: Vec<PlaquetteGrid>,
}

impl SubTemplate3D {
    /// Window radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Time slices, oldest first.
    pub fn slices(&self) -> &[PlaquetteGrid] {
        &self.slices
    }

    /// Index of the central cell of the last slice.
    pub fn last_centre(&self) -> usize {
        self.slices
            .last()
            .map_or(0, |slice| slice.get(self.radius, self.radius))
    }
}

/// Distinct sub-templates and the `(row, col)` cells where each one occurs.
pub type UniqueSubTemplates3D = BTreeMap<SubTemplate3D, Vec<(usize, usize)>>;

/// Groups every cell of the stacked `grids` by its 3-D neighbourhood.
///
/// Slices are padded with `radius` zeros on each side. Cells whose central
/// index in the last slice is `0` carry no plaquette and are skipped.
pub fn get_spatially_distinct_3d_subtemplates(
    grids: &[PlaquetteGrid],
    radius: usize,
) -> Result<UniqueSubTemplates3D, QlcError> {
    let Some(last) = grids.last() else {
        return Err(QlcError::Construction(ErrorInfo::new(
            "empty-composition",
            "at least one instantiation is needed to extract sub-templates",
        )));
    };
    if let Some(other) = grids.iter().find(|grid| grid.shape() != last.shape()) {
        return Err(QlcError::Construction(
            ErrorInfo::new(
                "shape-mismatch",
                "stacked instantiations must share the same shape",
            )
            .with_context("expected", format!("{:?}", last.shape()))
            .with_context("found", format!("{:?}", other.shape())),
        ));
    }
    let size = 2 * radius + 1;
    let r = radius as i64;
    let mut unique = UniqueSubTemplates3D::new();
    for row in 0..last.rows() {
        for col in 0..last.cols() {
            if last.get(row, col) == 0 {
                continue;
            }
            let slices = grids
                .iter()
                .map(|grid| {
                    let mut window = PlaquetteGrid::zeros(size, size);
                    for dr in 0..size {
                        for dc in 0..size {
                            let index = grid.get_or_zero(
                                row as i64 + dr as i64 - r,
                                col as i64 + dc as i64 - r,
                            );
                            window.set(dr, dc, index);
                        }
                    }
                    window
                })
                .collect();
            unique
                .entry(SubTemplate3D { radius, slices })
                .or_default()
                .push((row, col));
        }
    }
    Ok(unique)
}
