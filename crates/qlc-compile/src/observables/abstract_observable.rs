//! Location of the measurements of a logical observable in the block graph.

use std::collections::BTreeSet;

use qlc_core::{Basis, BlockPosition3D, Direction3D, QlcError};
use serde::{Deserialize, Serialize};

use crate::specs::{CubeKind, SpatialArms};

/// Cube taking part in an observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservableCube {
    /// Position of the cube.
    pub position: BlockPosition3D,
    /// Kind of the cube.
    pub kind: CubeKind,
}

/// Pipe taking part in an observable, `u` being the lower endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservablePipe {
    /// Lower endpoint.
    pub u: ObservableCube,
    /// Upper endpoint.
    pub v: ObservableCube,
}

impl ObservablePipe {
    /// Axis of the pipe.
    pub fn direction(&self) -> Result<Direction3D, QlcError> {
        Direction3D::from_neighbouring_positions(&self.u.position, &self.v.position)
    }
}

/// Measurements making up one logical observable.
///
/// * `top_readout_cubes`: a line of data-qubit readouts on the top face of
///   each cube;
/// * `top_readout_pipes`: the data qubit at the interface of two cubes, read
///   out on the top face;
/// * `bottom_stabilizer_pipes`: stabilizers measured on the bottom face of
///   the region joined by each pipe;
/// * `top_readout_spatial_cubes`: readouts on the top face of a spatial cube,
///   along the arms the observable goes through;
/// * `bottom_stabilizer_cubes`: every stabilizer of the cube basis measured
///   on the bottom face of a cube;
/// * `temporal_hadamard_pipes`: qubits included in the realignment round of a
///   temporal Hadamard pipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractObservable {
    /// Logical basis of the observable, when known.
    pub basis: Option<Basis>,
    /// Cubes read out on their top face.
    pub top_readout_cubes: BTreeSet<ObservableCube>,
    /// Pipes read out on their top face.
    pub top_readout_pipes: BTreeSet<ObservablePipe>,
    /// Pipes whose bottom stabilizers are included.
    pub bottom_stabilizer_pipes: BTreeSet<ObservablePipe>,
    /// Spatial cubes read out on their top face, with the arms crossed.
    #[serde(default)]
    pub top_readout_spatial_cubes: BTreeSet<(ObservableCube, SpatialArms)>,
    /// Cubes whose bottom stabilizers are included.
    #[serde(default)]
    pub bottom_stabilizer_cubes: BTreeSet<ObservableCube>,
    /// Temporal Hadamard pipes whose realignment qubits are included.
    #[serde(default)]
    pub temporal_hadamard_pipes: BTreeSet<ObservablePipe>,
}

impl AbstractObservable {
    /// Observable read out on the top face of a single cube.
    pub fn cube_readout(cube: ObservableCube) -> Self {
        Self {
            basis: Some(cube.kind.z),
            top_readout_cubes: BTreeSet::from([cube]),
            ..Self::default()
        }
    }

    /// Part of the observable located at height `z`.
    pub fn slice_at_z(&self, z: i64) -> Self {
        Self {
            basis: self.basis,
            top_readout_cubes: self
                .top_readout_cubes
                .iter()
                .filter(|cube| cube.position.z == z)
                .copied()
                .collect(),
            top_readout_pipes: self
                .top_readout_pipes
                .iter()
                .filter(|pipe| pipe.u.position.z == z)
                .copied()
                .collect(),
            bottom_stabilizer_pipes: self
                .bottom_stabilizer_pipes
                .iter()
                .filter(|pipe| pipe.u.position.z == z)
                .copied()
                .collect(),
            top_readout_spatial_cubes: self
                .top_readout_spatial_cubes
                .iter()
                .filter(|(cube, _)| cube.position.z == z)
                .copied()
                .collect(),
            bottom_stabilizer_cubes: self
                .bottom_stabilizer_cubes
                .iter()
                .filter(|cube| cube.position.z == z)
                .copied()
                .collect(),
            temporal_hadamard_pipes: self
                .temporal_hadamard_pipes
                .iter()
                .filter(|pipe| pipe.u.position.z == z)
                .copied()
                .collect(),
        }
    }

    /// Returns `true` when some component is read on the bottom face.
    pub fn has_bottom_stabilizers(&self) -> bool {
        !self.bottom_stabilizer_pipes.is_empty() || !self.bottom_stabilizer_cubes.is_empty()
    }

    /// Returns `true` when no measurement is involved.
    pub fn is_empty(&self) -> bool {
        self.top_readout_cubes.is_empty()
            && self.top_readout_pipes.is_empty()
            && self.bottom_stabilizer_pipes.is_empty()
            && self.top_readout_spatial_cubes.is_empty()
            && self.bottom_stabilizer_cubes.is_empty()
            && self.temporal_hadamard_pipes.is_empty()
    }
}
