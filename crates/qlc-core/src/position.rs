//! Typed 2-D and 3-D integer coordinates.
//!
//! Every coordinate carries the system it lives in (block grid, plaquette grid
//! or physical qubits) in its type so that `(x, y)` and `(row, column)`
//! conventions never get mixed up.

use std::fmt::{self, Display};
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, QlcError};

/// Translation applied to physical-qubit or plaquette coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Shift2D {
    /// Shift along x.
    pub x: i64,
    /// Shift along y.
    pub y: i64,
}

impl Shift2D {
    /// Creates a new shift.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Add for Shift2D {
    type Output = Shift2D;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<i64> for Shift2D {
    type Output = Shift2D;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Position of a block on the 2-dimensional block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPosition2D {
    /// Column of the block.
    pub x: i64,
    /// Row of the block.
    pub y: i64,
}

impl BlockPosition2D {
    /// Creates a new block position.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both positions are at Manhattan distance 1.
    pub fn is_neighbour(&self, other: &Self) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }

    /// Extends the position with a time coordinate.
    pub fn to_3d(&self, z: i64) -> BlockPosition3D {
        BlockPosition3D::new(self.x, self.y, z)
    }
}

impl Display for BlockPosition2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Axis of the 3-dimensional space-time diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction3D {
    /// First spatial axis.
    X,
    /// Second spatial axis.
    Y,
    /// Time.
    Z,
}

impl Direction3D {
    /// All directions in axis order.
    pub const ALL: [Direction3D; 3] = [Direction3D::X, Direction3D::Y, Direction3D::Z];

    /// Returns `true` for the two spatial axes.
    pub fn is_spatial(&self) -> bool {
        !matches!(self, Direction3D::Z)
    }

    /// Returns the direction joining two neighbouring positions.
    pub fn from_neighbouring_positions(
        source: &BlockPosition3D,
        sink: &BlockPosition3D,
    ) -> Result<Self, QlcError> {
        if !source.is_neighbour(sink) {
            return Err(QlcError::Construction(
                ErrorInfo::new("not-neighbours", "positions are not neighbours")
                    .with_context("source", source.to_string())
                    .with_context("sink", sink.to_string()),
            ));
        }
        Ok(if source.x != sink.x {
            Direction3D::X
        } else if source.y != sink.y {
            Direction3D::Y
        } else {
            Direction3D::Z
        })
    }
}

impl Display for Direction3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction3D::X => "X",
            Direction3D::Y => "Y",
            Direction3D::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Direction together with an orientation along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignedDirection3D {
    /// Axis.
    pub direction: Direction3D,
    /// `true` when pointing towards increasing coordinates.
    pub towards_positive: bool,
}

impl SignedDirection3D {
    /// Creates a new signed direction.
    pub const fn new(direction: Direction3D, towards_positive: bool) -> Self {
        Self {
            direction,
            towards_positive,
        }
    }

    /// Returns the opposite direction on the same axis.
    pub fn reversed(&self) -> Self {
        Self::new(self.direction, !self.towards_positive)
    }
}

impl Display for SignedDirection3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.towards_positive { '+' } else { '-' };
        write!(f, "{sign}{}", self.direction)
    }
}

/// Position of a block in the 3-dimensional space-time diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPosition3D {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Time.
    pub z: i64,
}

impl BlockPosition3D {
    /// Creates a new 3-D block position.
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Returns `true` when both positions are at Manhattan distance 1.
    pub fn is_neighbour(&self, other: &Self) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs() == 1
    }

    /// Drops the time coordinate.
    pub fn as_2d(&self) -> BlockPosition2D {
        BlockPosition2D::new(self.x, self.y)
    }

    /// Moves the position by `shift` along `direction`.
    pub fn shift_in_direction(&self, direction: Direction3D, shift: i64) -> Self {
        match direction {
            Direction3D::X => Self::new(self.x + shift, self.y, self.z),
            Direction3D::Y => Self::new(self.x, self.y + shift, self.z),
            Direction3D::Z => Self::new(self.x, self.y, self.z + shift),
        }
    }
}

impl Display for BlockPosition3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}
