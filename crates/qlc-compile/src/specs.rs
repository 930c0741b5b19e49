//! Kinds of cubes and pipes, and the builders turning them into blocks.

use std::fmt::{self, Display};
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use qlc_core::{
    Basis, BlockPosition3D, Direction3D, ErrorInfo, LinearFunction, QlcError, Scalable2D,
};
use qlc_plaquette::{
    patch_plaquettes, Corner, PatchBases, PatchLayout, RectangularTemplate, RoundKind, Template,
};
use serde::{Deserialize, Serialize};

use crate::blocks::{Block, Layer, PlaquetteLayer, RepeatedLayer, SPATIAL_BORDER_WIDTH};

/// Boundary bases of a cube.
///
/// `x` is the basis of the stabilizers on the walls facing `±X`, `y` the one
/// on the walls facing `±Y` and `z` the basis data qubits are initialised and
/// measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CubeKind {
    /// Basis of the `±X` walls.
    pub x: Basis,
    /// Basis of the `±Y` walls.
    pub y: Basis,
    /// Basis of the temporal faces.
    pub z: Basis,
}

impl CubeKind {
    /// Creates a cube kind; the three bases cannot all be equal.
    ///
    /// Kinds whose two spatial walls share a basis are spatial cubes: they
    /// host junctions between spatial pipes and carry no logical qubit of
    /// their own.
    pub fn new(x: Basis, y: Basis, z: Basis) -> Result<Self, QlcError> {
        if x == y && y == z {
            return Err(QlcError::Construction(
                ErrorInfo::new("invalid-cube-kind", "a cube needs two distinct bases")
                    .with_context("kind", format!("{x}{y}{z}")),
            ));
        }
        Ok(Self { x, y, z })
    }

    /// Returns `true` for spatial cubes.
    pub fn is_spatial(&self) -> bool {
        self.x == self.y
    }

    /// Basis of the walls crossed when moving along `direction`.
    pub fn basis_along(&self, direction: Direction3D) -> Basis {
        match direction {
            Direction3D::X => self.x,
            Direction3D::Y => self.y,
            Direction3D::Z => self.z,
        }
    }
}

impl Display for CubeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.x, self.y, self.z)
    }
}

impl FromStr for CubeKind {
    type Err = QlcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parse = |c: char| match c.to_ascii_uppercase() {
            'X' => Some(Basis::X),
            'Z' => Some(Basis::Z),
            _ => None,
        };
        let bases: Vec<Option<Basis>> = value.chars().map(parse).collect();
        match bases.as_slice() {
            [Some(x), Some(y), Some(z)] => Self::new(*x, *y, *z),
            _ => Err(QlcError::Construction(
                ErrorInfo::new("invalid-cube-kind", "expected three X/Z letters")
                    .with_context("kind", value),
            )),
        }
    }
}

/// Set of in-plane directions in which spatial pipes leave a cube.
///
/// `UP` points towards negative `y`, the top of the drawn patch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpatialArms(u8);

impl SpatialArms {
    /// No arm.
    pub const NONE: SpatialArms = SpatialArms(0);
    /// Towards `-Y`.
    pub const UP: SpatialArms = SpatialArms(1);
    /// Towards `+X`.
    pub const RIGHT: SpatialArms = SpatialArms(2);
    /// Towards `+Y`.
    pub const DOWN: SpatialArms = SpatialArms(4);
    /// Towards `-X`.
    pub const LEFT: SpatialArms = SpatialArms(8);

    const SINGLE: [(SpatialArms, &'static str); 4] = [
        (SpatialArms::UP, "UP"),
        (SpatialArms::RIGHT, "RIGHT"),
        (SpatialArms::DOWN, "DOWN"),
        (SpatialArms::LEFT, "LEFT"),
    ];

    /// Arm leading from `from` to its in-plane neighbour `to`.
    pub fn towards(from: &BlockPosition3D, to: &BlockPosition3D) -> Option<SpatialArms> {
        if from.z != to.z {
            return None;
        }
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(SpatialArms::UP),
            (1, 0) => Some(SpatialArms::RIGHT),
            (0, 1) => Some(SpatialArms::DOWN),
            (-1, 0) => Some(SpatialArms::LEFT),
            _ => None,
        }
    }

    /// Single arms of the set, clockwise from `UP`.
    pub fn iter(&self) -> impl Iterator<Item = SpatialArms> + '_ {
        Self::SINGLE
            .iter()
            .map(|(arm, _)| *arm)
            .filter(move |arm| self.contains(*arm))
    }

    /// Returns `true` when every arm of `other` is in `self`.
    pub fn contains(&self, other: SpatialArms) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when `self` and `other` share an arm.
    pub fn intersects(&self, other: SpatialArms) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` without arms.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of arms.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl BitOr for SpatialArms {
    type Output = SpatialArms;

    fn bitor(self, rhs: SpatialArms) -> SpatialArms {
        SpatialArms(self.0 | rhs.0)
    }
}

impl BitOrAssign for SpatialArms {
    fn bitor_assign(&mut self, rhs: SpatialArms) {
        self.0 |= rhs.0;
    }
}

impl Display for SpatialArms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::SINGLE
            .iter()
            .filter(|(arm, _)| self.contains(*arm))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Cube to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeSpec {
    /// Kind of the cube.
    pub kind: CubeKind,
    /// Spatial pipes leaving the cube at its height.
    pub arms: SpatialArms,
    /// Basis of the bulk stabilizers on even cells of the global checkerboard.
    pub even_basis: Basis,
}

impl CubeSpec {
    /// Isolated cube with its default checkerboard.
    pub fn new(kind: CubeKind) -> Self {
        let even_basis = if kind.is_spatial() { kind.x } else { kind.y };
        Self {
            kind,
            arms: SpatialArms::NONE,
            even_basis,
        }
    }

    /// Sets the spatial pipes leaving the cube.
    pub fn with_arms(mut self, arms: SpatialArms) -> Self {
        self.arms = arms;
        self
    }

    /// Sets the checkerboard.
    pub fn with_even_basis(mut self, even_basis: Basis) -> Self {
        self.even_basis = even_basis;
        self
    }

    fn bases(&self) -> PatchBases {
        PatchBases {
            even: self.even_basis,
            vertical_walls: self.kind.x,
            horizontal_walls: self.kind.y,
        }
    }
}

/// Pipe to build, between the cubes `cubes.0` (lower position) and
/// `cubes.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipeSpec {
    /// Joined cubes.
    pub cubes: (CubeSpec, CubeSpec),
    /// Axis of the pipe.
    pub direction: Direction3D,
}

impl PipeSpec {
    /// Pipe between `u` and `v` along `direction`.
    pub fn new(u: CubeSpec, v: CubeSpec, direction: Direction3D) -> Self {
        Self {
            cubes: (u, v),
            direction,
        }
    }

    /// Kinds of the joined cubes.
    pub fn kinds(&self) -> (CubeKind, CubeKind) {
        (self.cubes.0.kind, self.cubes.1.kind)
    }

    /// Returns `true` for a temporal pipe exchanging the spatial walls of its
    /// cubes with a transversal Hadamard.
    pub fn has_hadamard(&self) -> bool {
        let (u, v) = self.kinds();
        is_hadamard_pair(u, v, self.direction)
    }

    /// Checks that two cube kinds can be joined along `direction`.
    ///
    /// Spatial pipes need agreeing faces on both axes they do not cross.
    /// Temporal pipes either keep both spatial walls or swap them.
    pub fn check_kinds(u: CubeKind, v: CubeKind, direction: Direction3D) -> Result<(), QlcError> {
        if is_hadamard_pair(u, v, direction) {
            return Ok(());
        }
        let shared: &[Direction3D] = match direction {
            Direction3D::X => &[Direction3D::Y, Direction3D::Z],
            Direction3D::Y => &[Direction3D::X, Direction3D::Z],
            Direction3D::Z => &[Direction3D::X, Direction3D::Y],
        };
        if let Some(face) = shared
            .iter()
            .find(|face| u.basis_along(**face) != v.basis_along(**face))
        {
            return Err(QlcError::Construction(
                ErrorInfo::new("incompatible-pipe", "joined cubes disagree on a shared face")
                    .with_context("source", u.to_string())
                    .with_context("sink", v.to_string())
                    .with_context("pipe", direction.to_string())
                    .with_context("face", face.to_string()),
            ));
        }
        Ok(())
    }

    /// Checks the kinds of the joined cubes and that their checkerboards
    /// line up across the pipe.
    pub fn validate(&self) -> Result<(), QlcError> {
        let (u, v) = self.cubes;
        Self::check_kinds(u.kind, v.kind, self.direction)?;
        let expected = if self.has_hadamard() {
            u.even_basis.flipped()
        } else {
            u.even_basis
        };
        if v.even_basis != expected {
            return Err(QlcError::Construction(
                ErrorInfo::new(
                    "checkerboard-mismatch",
                    "joined cubes disagree on the stabilizer checkerboard",
                )
                .with_context("source", u.kind.to_string())
                .with_context("sink", v.kind.to_string())
                .with_context("pipe", self.direction.to_string()),
            ));
        }
        Ok(())
    }

    fn layout(&self) -> PatchLayout {
        let (u, v) = self.cubes;
        let mut layout = PatchLayout::new(u.bases());
        let spatial_arm = |cube: &CubeSpec, arm: SpatialArms| {
            cube.kind.is_spatial() && cube.arms.contains(arm)
        };
        let junctions = match self.direction {
            Direction3D::X => [
                (Corner::TopLeft, spatial_arm(&u, SpatialArms::UP)),
                (Corner::BottomLeft, spatial_arm(&u, SpatialArms::DOWN)),
                (Corner::TopRight, spatial_arm(&v, SpatialArms::UP)),
                (Corner::BottomRight, spatial_arm(&v, SpatialArms::DOWN)),
            ],
            _ => [
                (Corner::TopLeft, spatial_arm(&u, SpatialArms::LEFT)),
                (Corner::TopRight, spatial_arm(&u, SpatialArms::RIGHT)),
                (Corner::BottomLeft, spatial_arm(&v, SpatialArms::LEFT)),
                (Corner::BottomRight, spatial_arm(&v, SpatialArms::RIGHT)),
            ],
        };
        for (corner, joined) in junctions {
            if joined {
                layout = layout.with_junction(corner);
            }
        }
        layout
    }
}

fn is_hadamard_pair(u: CubeKind, v: CubeKind, direction: Direction3D) -> bool {
    direction == Direction3D::Z && !u.is_spatial() && u.x == v.y && u.y == v.x
}

/// Turns cube and pipe descriptions into blocks.
pub trait BlockBuilder: fmt::Debug + Send + Sync {
    /// Footprint of every cube, in qubits.
    fn cube_shape(&self) -> Scalable2D;

    /// Block implementing `spec`.
    fn build_cube(&self, spec: &CubeSpec) -> Result<Block, QlcError>;

    /// Block implementing `spec`.
    fn build_pipe(&self, spec: &PipeSpec) -> Result<Block, QlcError>;
}

/// Rotated surface-code blocks.
///
/// Cubes run an initialisation round, `2k - 1` memory rounds and a
/// measurement round. Spatial pipes follow the same schedule on their border
/// templates. Temporal pipes are two memory rounds, the first one ending with
/// a transversal Hadamard when the pipe swaps the walls of its cubes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBlockBuilder;

impl StandardBlockBuilder {
    fn round(
        template: RectangularTemplate,
        layout: &PatchLayout,
        round: RoundKind,
    ) -> Result<Layer, QlcError> {
        let plaquettes = patch_plaquettes(template, layout, round)?;
        Ok(Layer::Plaquette(PlaquetteLayer::new(template, plaquettes)?))
    }

    /// One round of `round` on the cube described by `spec`.
    pub fn cube_round(spec: &CubeSpec, round: RoundKind) -> Result<Layer, QlcError> {
        let mut layout = PatchLayout::new(spec.bases());
        if !spec.kind.is_spatial() {
            return Self::round(RectangularTemplate::Qubit, &layout, round);
        }
        for (corner, arms) in [
            (Corner::TopLeft, SpatialArms::UP | SpatialArms::LEFT),
            (Corner::TopRight, SpatialArms::UP | SpatialArms::RIGHT),
            (Corner::BottomLeft, SpatialArms::DOWN | SpatialArms::LEFT),
            (Corner::BottomRight, SpatialArms::DOWN | SpatialArms::RIGHT),
        ] {
            if spec.arms.intersects(arms) {
                layout = layout.with_junction(corner);
            }
        }
        Self::round(RectangularTemplate::SpatialQubit, &layout, round)
    }

    fn lifetime(
        template: RectangularTemplate,
        layout: &PatchLayout,
        basis: Basis,
    ) -> Result<Block, QlcError> {
        let memory = Self::round(template, layout, RoundKind::Memory)?;
        Block::new(vec![
            Self::round(template, layout, RoundKind::Initialization(basis))?,
            Layer::Repeated(RepeatedLayer::new(memory, LinearFunction::new(2, -1))?),
            Self::round(template, layout, RoundKind::Measurement(basis))?,
        ])
    }
}

impl BlockBuilder for StandardBlockBuilder {
    fn cube_shape(&self) -> Scalable2D {
        let plaquettes = RectangularTemplate::Qubit.scalable_shape();
        Scalable2D::new(
            plaquettes.x * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
            plaquettes.y * SPATIAL_BORDER_WIDTH + LinearFunction::constant(1),
        )
    }

    fn build_cube(&self, spec: &CubeSpec) -> Result<Block, QlcError> {
        let memory = Self::cube_round(spec, RoundKind::Memory)?;
        Block::new(vec![
            Self::cube_round(spec, RoundKind::Initialization(spec.kind.z))?,
            Layer::Repeated(RepeatedLayer::new(memory, LinearFunction::new(2, -1))?),
            Self::cube_round(spec, RoundKind::Measurement(spec.kind.z))?,
        ])
    }

    fn build_pipe(&self, spec: &PipeSpec) -> Result<Block, QlcError> {
        spec.validate()?;
        let (u, v) = spec.cubes;
        match spec.direction {
            Direction3D::X => {
                Self::lifetime(RectangularTemplate::VerticalBorders, &spec.layout(), u.kind.z)
            }
            Direction3D::Y => {
                Self::lifetime(RectangularTemplate::HorizontalBorders, &spec.layout(), u.kind.z)
            }
            Direction3D::Z => {
                let first = if spec.has_hadamard() {
                    RoundKind::Hadamard
                } else {
                    RoundKind::Memory
                };
                Block::new(vec![
                    Self::cube_round(&u, first)?,
                    Self::cube_round(&v, RoundKind::Memory)?,
                ])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use qlc_plaquette::Plaquettes;

    use super::*;

    fn spec(kind: &str) -> CubeSpec {
        CubeSpec::new(kind.parse().unwrap())
    }

    fn plaquettes_of(layer: &Layer) -> &Plaquettes {
        match layer {
            Layer::Plaquette(layer) => layer.plaquettes(),
            other => panic!("expected plaquettes, got {other:?}"),
        }
    }

    #[test]
    fn cube_kinds_parse_and_print() {
        let kind: CubeKind = "zxz".parse().unwrap();
        assert_eq!(kind, CubeKind::new(Basis::Z, Basis::X, Basis::Z).unwrap());
        assert_eq!(kind.to_string(), "ZXZ");
        assert!(!kind.is_spatial());
        assert!("ZZX".parse::<CubeKind>().unwrap().is_spatial());
        assert_eq!("ZZZ".parse::<CubeKind>().unwrap_err().code(), "invalid-cube-kind");
        assert_eq!("ZX".parse::<CubeKind>().unwrap_err().code(), "invalid-cube-kind");
    }

    #[test]
    fn arms_combine_and_print() {
        let arms = SpatialArms::LEFT | SpatialArms::DOWN;
        assert_eq!(arms.len(), 2);
        assert!(arms.contains(SpatialArms::DOWN));
        assert!(!arms.contains(SpatialArms::DOWN | SpatialArms::UP));
        assert!(arms.intersects(SpatialArms::DOWN | SpatialArms::UP));
        assert_eq!(arms.to_string(), "DOWN|LEFT");
        assert_eq!(SpatialArms::NONE.to_string(), "NONE");
        let origin = BlockPosition3D::new(1, 1, 0);
        assert_eq!(
            SpatialArms::towards(&origin, &BlockPosition3D::new(1, 0, 0)),
            Some(SpatialArms::UP)
        );
        assert_eq!(SpatialArms::towards(&origin, &BlockPosition3D::new(1, 1, 1)), None);
    }

    #[test]
    fn standard_blocks_have_expected_dimensions() {
        let builder = StandardBlockBuilder;
        let cube = builder.build_cube(&spec("ZXZ")).unwrap();
        assert!(cube.is_cube());
        assert_eq!(cube.scalable_shape(), builder.cube_shape());
        assert_eq!(cube.scalable_timesteps(), LinearFunction::new(2, 1));

        let spatial = builder
            .build_pipe(&PipeSpec::new(spec("ZXZ"), spec("ZXZ"), Direction3D::X))
            .unwrap();
        assert_eq!(spatial.spatial_pipe_direction(), Some(Direction3D::X));

        let temporal = builder
            .build_pipe(&PipeSpec::new(spec("ZXZ"), spec("ZXX"), Direction3D::Z))
            .unwrap();
        assert!(temporal.is_temporal_pipe());
    }

    #[test]
    fn mismatched_pipes_are_rejected() {
        let spec_pipe = PipeSpec::new(spec("ZXZ"), spec("ZXX"), Direction3D::X);
        assert_eq!(spec_pipe.validate().unwrap_err().code(), "incompatible-pipe");
        let shifted = PipeSpec::new(
            spec("ZXZ"),
            spec("ZXZ").with_even_basis(Basis::Z),
            Direction3D::X,
        );
        assert_eq!(shifted.validate().unwrap_err().code(), "checkerboard-mismatch");
    }

    #[test]
    fn hadamard_pipes_swap_walls_and_checkerboard() {
        let hadamard = PipeSpec::new(spec("ZXZ"), spec("XZX"), Direction3D::Z);
        assert!(hadamard.has_hadamard());
        hadamard.validate().unwrap();
        let kept = PipeSpec::new(
            spec("ZXZ"),
            spec("XZX").with_even_basis(Basis::X),
            Direction3D::Z,
        );
        assert_eq!(kept.validate().unwrap_err().code(), "checkerboard-mismatch");
        assert!(!PipeSpec::new(spec("ZXZ"), spec("XZX"), Direction3D::X).has_hadamard());

        let block = StandardBlockBuilder.build_pipe(&hadamard).unwrap();
        let first = plaquettes_of(&block.layers()[0]);
        assert!(first.iter().all(|(_, p)| p.name().contains("hadamard")));
        let second = plaquettes_of(&block.layers()[1]);
        assert!(second.iter().all(|(_, p)| p.name().contains("memory")));
    }

    #[test]
    fn spatial_cubes_keep_corners_next_to_their_arms() {
        let cube = spec("ZZX").with_arms(SpatialArms::RIGHT);
        let layer = StandardBlockBuilder::cube_round(&cube, RoundKind::Memory).unwrap();
        let plaquettes = plaquettes_of(&layer);
        // Even cells measure Z like the walls: the corners away from the arm are cut.
        assert_eq!(plaquettes.get(15).data_qubits().len(), 3);
        assert_eq!(plaquettes.get(18).data_qubits().len(), 4);
        assert_eq!(plaquettes.get(16).debug_basis(), Some(Basis::X));
    }
}
