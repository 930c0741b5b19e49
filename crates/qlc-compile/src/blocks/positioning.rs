//! Positions of cubes and pipes in the assembled layout.
//!
//! Layout positions live on a grid twice as fine as block positions: cube
//! `(x, y)` sits at `(2x, 2y)` and the pipe between two neighbouring cubes sits
//! at the odd coordinate in between.

use std::fmt::{self, Display};

use qlc_core::{
    BlockPosition2D, BlockPosition3D, Direction3D, ErrorInfo, QlcError, SignedDirection3D,
};
use serde::{Deserialize, Serialize};

/// Cube or pipe position in the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayoutPosition2D {
    /// Cube, both coordinates even.
    Cube {
        /// Column, even.
        x: i64,
        /// Row, even.
        y: i64,
    },
    /// Pipe, exactly one coordinate odd.
    Pipe {
        /// Column.
        x: i64,
        /// Row.
        y: i64,
    },
}

impl LayoutPosition2D {
    /// Layout position of the cube at `position`.
    pub fn from_block_position(position: BlockPosition2D) -> Self {
        LayoutPosition2D::Cube {
            x: 2 * position.x,
            y: 2 * position.y,
        }
    }

    /// Layout position of the pipe between `u` and `v`, in any order.
    pub fn from_pipe_position(u: BlockPosition2D, v: BlockPosition2D) -> Result<Self, QlcError> {
        if !u.is_neighbour(&v) {
            return Err(QlcError::Construction(
                ErrorInfo::new("not-neighbours", "a pipe must join two neighbouring blocks")
                    .with_context("u", u.to_string())
                    .with_context("v", v.to_string()),
            ));
        }
        let (u, v) = if u < v { (u, v) } else { (v, u) };
        Ok(LayoutPosition2D::Pipe {
            x: 2 * u.x + i64::from(u.x != v.x),
            y: 2 * u.y + i64::from(u.y != v.y),
        })
    }

    /// Layout grid coordinates.
    pub fn coordinates(&self) -> (i64, i64) {
        match self {
            LayoutPosition2D::Cube { x, y } | LayoutPosition2D::Pipe { x, y } => (*x, *y),
        }
    }

    /// Returns `true` for cube positions.
    pub fn is_cube(&self) -> bool {
        matches!(self, LayoutPosition2D::Cube { .. })
    }

    /// Block position of a cube.
    pub fn to_block_position(&self) -> Result<BlockPosition2D, QlcError> {
        match self {
            LayoutPosition2D::Cube { x, y } => Ok(BlockPosition2D::new(x / 2, y / 2)),
            LayoutPosition2D::Pipe { .. } => Err(QlcError::Unsupported(
                ErrorInfo::new("pipe-has-no-block-position", "pipes join two blocks")
                    .with_context("position", self.to_string()),
            )),
        }
    }

    /// The two blocks joined by a pipe, smallest first.
    pub fn to_pipe(&self) -> Result<(BlockPosition2D, BlockPosition2D), QlcError> {
        match self {
            LayoutPosition2D::Pipe { x, y } => {
                let u = BlockPosition2D::new(x.div_euclid(2), y.div_euclid(2));
                let v = if x.rem_euclid(2) == 1 {
                    BlockPosition2D::new(u.x + 1, u.y)
                } else {
                    BlockPosition2D::new(u.x, u.y + 1)
                };
                Ok((u, v))
            }
            LayoutPosition2D::Cube { .. } => Err(QlcError::Unsupported(
                ErrorInfo::new("cube-is-not-a-pipe", "cube positions do not join blocks")
                    .with_context("position", self.to_string()),
            )),
        }
    }

    /// Direction of a pipe.
    pub fn pipe_direction(&self) -> Option<Direction3D> {
        match self {
            LayoutPosition2D::Pipe { x, .. } if x.rem_euclid(2) == 1 => Some(Direction3D::X),
            LayoutPosition2D::Pipe { .. } => Some(Direction3D::Y),
            LayoutPosition2D::Cube { .. } => None,
        }
    }
}

impl Display for LayoutPosition2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutPosition2D::Cube { x, y } => write!(f, "cube({x},{y})"),
            LayoutPosition2D::Pipe { x, y } => write!(f, "pipe({x},{y})"),
        }
    }
}

/// Layout position together with a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayoutPosition3D {
    /// Spatial part.
    pub position: LayoutPosition2D,
    /// Time coordinate of the block.
    pub z: i64,
}

impl LayoutPosition3D {
    /// Position of the cube at `position`.
    pub fn from_block_position(position: BlockPosition3D) -> Self {
        Self {
            position: LayoutPosition2D::from_block_position(position.as_2d()),
            z: position.z,
        }
    }

    /// Position of the spatial pipe between `u` and `v`.
    pub fn from_pipe_position(u: BlockPosition3D, v: BlockPosition3D) -> Result<Self, QlcError> {
        if u.z != v.z {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "temporal-pipe-position",
                    "temporal pipes do not have a layout position of their own",
                )
                .with_context("u", u.to_string())
                .with_context("v", v.to_string()),
            ));
        }
        Ok(Self {
            position: LayoutPosition2D::from_pipe_position(u.as_2d(), v.as_2d())?,
            z: u.z,
        })
    }

    /// Position of the spatial pipe leaving `block` towards `direction`.
    pub fn from_block_and_signed_direction(
        block: BlockPosition3D,
        direction: SignedDirection3D,
    ) -> Result<Self, QlcError> {
        let shift = if direction.towards_positive { 1 } else { -1 };
        let other = block.shift_in_direction(direction.direction, shift);
        Self::from_pipe_position(block, other)
    }

    /// Spatial part.
    pub fn as_2d(&self) -> LayoutPosition2D {
        self.position
    }
}

impl Display for LayoutPosition3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.position, self.z)
    }
}

/// Inclusive bounding box of block positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockBounds {
    /// Smallest corner.
    pub min: BlockPosition2D,
    /// Largest corner.
    pub max: BlockPosition2D,
}

impl BlockBounds {
    /// Bounding box of a single block.
    pub fn single(position: BlockPosition2D) -> Self {
        Self {
            min: position,
            max: position,
        }
    }

    /// Bounding box of the blocks touched by `positions`; pipes contribute
    /// both endpoints.
    pub fn from_layout_positions<'a, I>(positions: I) -> Result<Self, QlcError>
    where
        I: IntoIterator<Item = &'a LayoutPosition2D>,
    {
        let mut bounds: Option<BlockBounds> = None;
        for position in positions {
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
            for block in blocks {
                bounds = Some(match bounds {
                    Some(existing) => existing.including(block),
                    None => BlockBounds::single(block),
                });
            }
        }
        bounds.ok_or_else(|| {
            QlcError::Construction(ErrorInfo::new(
                "empty-composition",
                "cannot bound an empty set of positions",
            ))
        })
    }

    /// Smallest bounds containing `self` and `position`.
    pub fn including(&self, position: BlockPosition2D) -> Self {
        Self {
            min: BlockPosition2D::new(self.min.x.min(position.x), self.min.y.min(position.y)),
            max: BlockPosition2D::new(self.max.x.max(position.x), self.max.y.max(position.y)),
        }
    }

    /// Number of block columns.
    pub fn width(&self) -> i64 {
        self.max.x - self.min.x + 1
    }

    /// Number of block rows.
    pub fn height(&self) -> i64 {
        self.max.y - self.min.y + 1
    }

    /// Returns `true` when `position` lies inside the bounds.
    pub fn contains(&self, position: BlockPosition2D) -> bool {
        (self.min.x..=self.max.x).contains(&position.x)
            && (self.min.y..=self.max.y).contains(&position.y)
    }
}
