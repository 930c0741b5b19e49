//! Templates: scalable 2-D arrangements of plaquette indices.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

use qlc_core::{ErrorInfo, LinearFunction, QlcError, Scalable2D, Shape2D, Shift2D};
use serde::{Deserialize, Serialize};

/// One side of a rectangular template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateBorder {
    /// First row.
    Top,
    /// Last row.
    Bottom,
    /// First column.
    Left,
    /// Last column.
    Right,
}

/// Plaquette indices found along one border of a rectangular template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderIndices {
    /// Non-repeating index at the top or left end of the border.
    pub top_left_corner: usize,
    /// First repeating index of the border bulk.
    pub first_repeating: usize,
    /// Second repeating index of the border bulk.
    pub second_repeating: usize,
    /// Non-repeating index at the bottom or right end of the border.
    pub bottom_right_corner: usize,
}

impl BorderIndices {
    /// Creates border indices.
    pub const fn new(
        top_left_corner: usize,
        first_repeating: usize,
        second_repeating: usize,
        bottom_right_corner: usize,
    ) -> Self {
        Self {
            top_left_corner,
            first_repeating,
            second_repeating,
            bottom_right_corner,
        }
    }

    /// The four indices, corners first and last.
    pub fn as_array(&self) -> [usize; 4] {
        [
            self.top_left_corner,
            self.first_repeating,
            self.second_repeating,
            self.bottom_right_corner,
        ]
    }

    /// Maps each index of `self` to the index at the same place in `other`.
    pub fn to(&self, other: &BorderIndices) -> BTreeMap<usize, usize> {
        self.as_array().into_iter().zip(other.as_array()).collect()
    }
}

/// Instantiated template: plaquette index per cell, `0` for "no plaquette".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaquetteGrid {
    rows: usize,
    cols: usize,
    cells: Vec<usize>,
}

impl PlaquetteGrid {
    /// Grid filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Builds a grid from its rows, which must all have the same length.
    pub fn from_rows(rows: Vec<Vec<usize>>) -> Result<Self, QlcError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(QlcError::Construction(ErrorInfo::new(
                "ragged-grid",
                "every row of a plaquette grid must have the same length",
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `(x = columns, y = rows)`.
    pub fn shape(&self) -> Shape2D {
        Shape2D::new(self.cols as i64, self.rows as i64)
    }

    /// Index at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.cols + col]
    }

    /// Index at a possibly out-of-bounds position, `0` outside the grid.
    pub fn get_or_zero(&self, row: i64, col: i64) -> usize {
        if row < 0 || col < 0 || row >= self.rows as i64 || col >= self.cols as i64 {
            return 0;
        }
        self.get(row as usize, col as usize)
    }

    /// Writes `index` at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, index: usize) {
        self.cells[row * self.cols + col] = index;
    }

    /// Returns `true` when every cell is `0`.
    pub fn is_all_zero(&self) -> bool {
        self.cells.iter().all(|index| *index == 0)
    }

    /// Iterates over `(row, col, index)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, index)| (i / self.cols.max(1), i % self.cols.max(1), *index))
    }

    /// Replaces every index through `mapping`; missing entries become `0`.
    pub fn remapped(&self, mapping: &BTreeMap<usize, usize>) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            cells: self
                .cells
                .iter()
                .map(|index| mapping.get(index).copied().unwrap_or(0))
                .collect(),
        }
    }
}

impl Display for PlaquetteGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line: Vec<String> = (0..self.cols)
                .map(|col| format!("{:>3}", self.get(row, col)))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Scalable arrangement of plaquette indices.
pub trait Template: Debug + Send + Sync {
    /// Instantiates the template at `k` with indices `1..=expected_plaquettes_number()`.
    fn instantiate(&self, k: u32) -> PlaquetteGrid;

    /// Shape in plaquette units.
    fn scalable_shape(&self) -> Scalable2D;

    /// Number of distinct indices used by [`Template::instantiate`].
    fn expected_plaquettes_number(&self) -> usize;

    /// Indices on the provided border.
    fn border_indices(&self, border: TemplateBorder) -> Result<BorderIndices, QlcError>;

    /// Qubit displacement between two neighbouring plaquettes.
    fn increments(&self) -> Shift2D {
        Shift2D::new(2, 2)
    }

    /// Shape in plaquette units at `k`.
    fn shape(&self, k: u32) -> Shape2D {
        self.scalable_shape().to_shape_2d(k)
    }

    /// Human readable name, used in canonical keys and diagnostics.
    fn name(&self) -> String;
}

/// Built-in rectangular templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RectangularTemplate {
    /// Square logical qubit, 14 indices.
    ///
    /// ```text
    ///  1  5  6  5  6  2
    ///  7  9 10  9 10 11
    ///  8 10  9 10  9 12
    ///  7  9 10  9 10 11
    ///  8 10  9 10  9 12
    ///  3 13 14 13 14  4
    /// ```
    Qubit,
    /// Square logical qubit whose four corner bulk cells carry their own
    /// indices 15 to 18, so that they can be repaired where spatial pipes meet.
    ///
    /// ```text
    ///  1  5  6  5  6  2
    ///  7 15 10  9 16 11
    ///  8 10  9 10  9 12
    ///  7  9 10  9 10 11
    ///  8 17  9 10 18 12
    ///  3 13 14 13 14  4
    /// ```
    SpatialQubit,
    /// Two vertical sides of neighbouring qubits glued together, 8 indices.
    VerticalBorders,
    /// Two horizontal sides of neighbouring qubits glued together, 8 indices.
    HorizontalBorders,
}

impl RectangularTemplate {
    /// Instantiates the template at `k`, using `indices[i]` in place of `i + 1`.
    pub fn instantiate_with_indices(
        &self,
        k: u32,
        indices: &[usize],
    ) -> Result<PlaquetteGrid, QlcError> {
        if indices.len() < self.expected_plaquettes_number() {
            return Err(QlcError::Construction(
                ErrorInfo::new("missing-template-indices", "not enough indices provided")
                    .with_context("template", self.name())
                    .with_context("provided", indices.len().to_string()),
            ));
        }
        let shape = self.shape(k);
        let (rows, cols) = (shape.y as usize, shape.x as usize);
        let mut grid = PlaquetteGrid::zeros(rows, cols);
        let (last_row, last_col) = (rows - 1, cols - 1);
        grid.set(0, 0, indices[0]);
        grid.set(0, last_col, indices[1]);
        grid.set(last_row, 0, indices[2]);
        grid.set(last_row, last_col, indices[3]);
        match self {
            RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit => {
                for col in 1..last_col {
                    let alternate = if col % 2 == 1 { 0 } else { 1 };
                    grid.set(0, col, indices[4 + alternate]);
                    grid.set(last_row, col, indices[12 + alternate]);
                }
                for row in 1..last_row {
                    let alternate = if row % 2 == 1 { 0 } else { 1 };
                    grid.set(row, 0, indices[6 + alternate]);
                    grid.set(row, last_col, indices[10 + alternate]);
                    for col in 1..last_col {
                        let bulk = if (row + col) % 2 == 0 { 8 } else { 9 };
                        grid.set(row, col, indices[bulk]);
                    }
                }
                if *self == RectangularTemplate::SpatialQubit && rows >= 4 {
                    grid.set(1, 1, indices[14]);
                    grid.set(1, last_col - 1, indices[15]);
                    grid.set(last_row - 1, 1, indices[16]);
                    grid.set(last_row - 1, last_col - 1, indices[17]);
                }
            }
            RectangularTemplate::VerticalBorders => {
                for row in 1..last_row {
                    let alternate = if row % 2 == 1 { 0 } else { 1 };
                    grid.set(row, 0, indices[4 + alternate]);
                    grid.set(row, last_col, indices[6 + alternate]);
                }
            }
            RectangularTemplate::HorizontalBorders => {
                for col in 1..last_col {
                    let alternate = if col % 2 == 1 { 0 } else { 1 };
                    grid.set(0, col, indices[4 + alternate]);
                    grid.set(last_row, col, indices[6 + alternate]);
                }
            }
        }
        Ok(grid)
    }

    fn missing_border(&self, border: TemplateBorder) -> QlcError {
        QlcError::Unsupported(
            ErrorInfo::new(
                "no-repeating-border",
                "template has no repeating elements on this border",
            )
            .with_context("template", self.name())
            .with_context("border", format!("{border:?}")),
        )
    }
}

impl Template for RectangularTemplate {
    fn instantiate(&self, k: u32) -> PlaquetteGrid {
        let indices: Vec<usize> = (1..=self.expected_plaquettes_number()).collect();
        match self.instantiate_with_indices(k, &indices) {
            Ok(grid) => grid,
            Err(_) => PlaquetteGrid::zeros(0, 0),
        }
    }

    fn scalable_shape(&self) -> Scalable2D {
        let scalable = LinearFunction::new(2, 2);
        let fixed = LinearFunction::constant(2);
        match self {
            RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit => {
                Scalable2D::new(scalable, scalable)
            }
            RectangularTemplate::VerticalBorders => Scalable2D::new(fixed, scalable),
            RectangularTemplate::HorizontalBorders => Scalable2D::new(scalable, fixed),
        }
    }

    fn expected_plaquettes_number(&self) -> usize {
        match self {
            RectangularTemplate::Qubit => 14,
            RectangularTemplate::SpatialQubit => 18,
            RectangularTemplate::VerticalBorders | RectangularTemplate::HorizontalBorders => 8,
        }
    }

    fn border_indices(&self, border: TemplateBorder) -> Result<BorderIndices, QlcError> {
        use TemplateBorder::*;
        match (self, border) {
            (RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit, Top) => {
                Ok(BorderIndices::new(1, 5, 6, 2))
            }
            (RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit, Bottom) => {
                Ok(BorderIndices::new(3, 13, 14, 4))
            }
            (RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit, Left) => {
                Ok(BorderIndices::new(1, 7, 8, 3))
            }
            (RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit, Right) => {
                Ok(BorderIndices::new(2, 11, 12, 4))
            }
            (RectangularTemplate::VerticalBorders, Left) => Ok(BorderIndices::new(1, 5, 6, 3)),
            (RectangularTemplate::VerticalBorders, Right) => Ok(BorderIndices::new(2, 7, 8, 4)),
            (RectangularTemplate::HorizontalBorders, Top) => Ok(BorderIndices::new(1, 5, 6, 2)),
            (RectangularTemplate::HorizontalBorders, Bottom) => {
                Ok(BorderIndices::new(3, 7, 8, 4))
            }
            (template, border) => Err(template.missing_border(border)),
        }
    }

    fn name(&self) -> String {
        match self {
            RectangularTemplate::Qubit => "QubitTemplate",
            RectangularTemplate::SpatialQubit => "SpatialQubitTemplate",
            RectangularTemplate::VerticalBorders => "QubitVerticalBorders",
            RectangularTemplate::HorizontalBorders => "QubitHorizontalBorders",
        }
        .to_string()
    }
}
