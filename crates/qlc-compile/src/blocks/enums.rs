//! Borders of a block.

use std::fmt::{self, Display};

use qlc_core::{Direction3D, SignedDirection3D};
use qlc_plaquette::TemplateBorder;
use serde::{Deserialize, Serialize};

/// Spatial side of a block, named after the direction it faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpatialBlockBorder {
    /// Faces `-X`.
    XNegative,
    /// Faces `+X`.
    XPositive,
    /// Faces `-Y`.
    YNegative,
    /// Faces `+Y`.
    YPositive,
}

impl SpatialBlockBorder {
    /// All spatial borders.
    pub const ALL: [SpatialBlockBorder; 4] = [
        SpatialBlockBorder::XNegative,
        SpatialBlockBorder::XPositive,
        SpatialBlockBorder::YNegative,
        SpatialBlockBorder::YPositive,
    ];

    /// Border of the underlying template.
    ///
    /// The `y` axis points downwards, so `-Y` is the top of the template.
    pub fn to_template_border(&self) -> TemplateBorder {
        match self {
            SpatialBlockBorder::XNegative => TemplateBorder::Left,
            SpatialBlockBorder::XPositive => TemplateBorder::Right,
            SpatialBlockBorder::YNegative => TemplateBorder::Top,
            SpatialBlockBorder::YPositive => TemplateBorder::Bottom,
        }
    }

    /// Direction the border faces.
    pub fn signed_direction(&self) -> SignedDirection3D {
        match self {
            SpatialBlockBorder::XNegative => SignedDirection3D::new(Direction3D::X, false),
            SpatialBlockBorder::XPositive => SignedDirection3D::new(Direction3D::X, true),
            SpatialBlockBorder::YNegative => SignedDirection3D::new(Direction3D::Y, false),
            SpatialBlockBorder::YPositive => SignedDirection3D::new(Direction3D::Y, true),
        }
    }

    /// Border facing the other way.
    pub fn opposite(&self) -> Self {
        match self {
            SpatialBlockBorder::XNegative => SpatialBlockBorder::XPositive,
            SpatialBlockBorder::XPositive => SpatialBlockBorder::XNegative,
            SpatialBlockBorder::YNegative => SpatialBlockBorder::YPositive,
            SpatialBlockBorder::YPositive => SpatialBlockBorder::YNegative,
        }
    }
}

impl Display for SpatialBlockBorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signed_direction())
    }
}

/// Temporal side of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemporalBlockBorder {
    /// First time step.
    ZNegative,
    /// Last time step.
    ZPositive,
}

impl Display for TemporalBlockBorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalBlockBorder::ZNegative => f.write_str("-Z"),
            TemporalBlockBorder::ZPositive => f.write_str("+Z"),
        }
    }
}

/// Any border of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockBorder {
    /// Spatial side.
    Spatial(SpatialBlockBorder),
    /// Temporal side.
    Temporal(TemporalBlockBorder),
}

/// Border of a block facing `direction`.
pub fn border_from_signed_direction(direction: SignedDirection3D) -> BlockBorder {
    let positive = direction.towards_positive;
    match direction.direction {
        Direction3D::X if positive => BlockBorder::Spatial(SpatialBlockBorder::XPositive),
        Direction3D::X => BlockBorder::Spatial(SpatialBlockBorder::XNegative),
        Direction3D::Y if positive => BlockBorder::Spatial(SpatialBlockBorder::YPositive),
        Direction3D::Y => BlockBorder::Spatial(SpatialBlockBorder::YNegative),
        Direction3D::Z if positive => BlockBorder::Temporal(TemporalBlockBorder::ZPositive),
        Direction3D::Z => BlockBorder::Temporal(TemporalBlockBorder::ZNegative),
    }
}
