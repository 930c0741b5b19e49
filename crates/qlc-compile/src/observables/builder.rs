//! Physical qubits measured to form each part of an observable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::Range;

use qlc_circuit::GridQubit;
use qlc_core::{Basis, Direction3D, ErrorInfo, QlcError, Shape2D, Shift2D};

use crate::blocks::SPATIAL_BORDER_WIDTH;
use crate::observables::abstract_observable::{AbstractObservable, ObservableCube, ObservablePipe};
use crate::specs::SpatialArms;

/// Maps observable components to qubits.
///
/// Every method works on one element of `shape` plaquettes and returns
/// qubits relative to the origin of the cube at `cube.position` (for pipes,
/// of the lower endpoint `u`).
pub trait ObservableBuilder: Debug + Send + Sync {
    /// Data qubits read out on the top face of `cube`.
    fn cube_top_readouts(&self, shape: Shape2D, cube: &ObservableCube) -> Vec<GridQubit>;

    /// Data qubits read out on the top face of `pipe`.
    fn pipe_top_readouts(
        &self,
        shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<GridQubit>, QlcError>;

    /// Syndrome qubits, with the basis they must measure, included from the
    /// bottom face of `pipe`.
    fn pipe_bottom_stabilizers(
        &self,
        shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<(GridQubit, Basis)>, QlcError>;

    /// Data qubits read out on the top face of the spatial `cube`, for an
    /// observable crossing it through `arms`. `even_basis` is the basis of
    /// the bulk stabilizers on even cells of the cube.
    fn spatial_cube_top_readouts(
        &self,
        shape: Shape2D,
        cube: &ObservableCube,
        arms: SpatialArms,
        even_basis: Basis,
    ) -> Result<Vec<GridQubit>, QlcError>;

    /// Syndrome qubits, with the basis they must measure, included from the
    /// bottom face of `cube`.
    fn cube_bottom_stabilizers(
        &self,
        shape: Shape2D,
        cube: &ObservableCube,
    ) -> Result<Vec<(GridQubit, Basis)>, QlcError>;

    /// Qubits measured in the realignment round of the temporal Hadamard
    /// `pipe`.
    fn pipe_temporal_hadamard_realignment(
        &self,
        shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<GridQubit>, QlcError>;
}

/// Observable geometry of the rotated surface-code blocks.
///
/// A cube is read out along a horizontal data line through its middle when
/// its `x` and `z` bases agree and along a vertical line otherwise. Spatial
/// cubes are read out along the half lines leading to the arms crossed by the
/// observable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceCodeObservableBuilder;

fn middle(extent: i64) -> i64 {
    extent / 2 * 2 - 1
}

fn spatial_direction(pipe: &ObservablePipe) -> Result<Direction3D, QlcError> {
    let direction = pipe.direction()?;
    if !direction.is_spatial() {
        return Err(QlcError::Unsupported(
            ErrorInfo::new(
                "temporal-observable-pipe",
                "only spatial pipes contribute to observables",
            )
            .with_context("u", pipe.u.position.to_string())
            .with_context("v", pipe.v.position.to_string()),
        ));
    }
    Ok(direction)
}

// Cells of `u` and `v` along the pipe axis whose stabilizers join the
// observable: the halves facing the pipe, or the whole of a spatial cube.
fn covered(pipe: &ObservablePipe, extent: i64) -> (Range<i64>, Range<i64>) {
    let u = if pipe.u.kind.is_spatial() { 0 } else { extent / 2 };
    let v = if pipe.v.kind.is_spatial() { extent } else { extent / 2 };
    (u..extent, 0..v)
}

// Data qubits of the middle line of a cube, from the centre out to `arm`.
fn half_line(shape: Shape2D, arm: SpatialArms, with_centre: bool) -> Vec<GridQubit> {
    let (h_x, h_y) = (shape.x / 2, shape.y / 2);
    let (row, col) = (2 * h_y - 1, 2 * h_x - 1);
    let first = if with_centre { 0 } else { 1 };
    let steps = |centre: i64, sign: i64| (first..centre).map(move |step| centre + sign * step);
    if arm == SpatialArms::LEFT {
        steps(h_x, -1).map(|i| GridQubit::new(2 * i - 1, row)).collect()
    } else if arm == SpatialArms::RIGHT {
        steps(h_x, 1).map(|i| GridQubit::new(2 * i - 1, row)).collect()
    } else if arm == SpatialArms::UP {
        steps(h_y, -1).map(|j| GridQubit::new(col, 2 * j - 1)).collect()
    } else {
        steps(h_y, 1).map(|j| GridQubit::new(col, 2 * j - 1)).collect()
    }
}

impl ObservableBuilder for SurfaceCodeObservableBuilder {
    fn cube_top_readouts(&self, shape: Shape2D, cube: &ObservableCube) -> Vec<GridQubit> {
        if cube.kind.x == cube.kind.z {
            let y = middle(shape.y);
            (1..shape.x).map(|i| GridQubit::new(2 * i - 1, y)).collect()
        } else {
            let x = middle(shape.x);
            (1..shape.y).map(|j| GridQubit::new(x, 2 * j - 1)).collect()
        }
    }

    fn pipe_top_readouts(
        &self,
        shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<GridQubit>, QlcError> {
        Ok(match spatial_direction(pipe)? {
            Direction3D::X => vec![GridQubit::new(2 * shape.x - 1, middle(shape.y))],
            _ => vec![GridQubit::new(middle(shape.x), 2 * shape.y - 1)],
        })
    }

    fn pipe_bottom_stabilizers(
        &self,
        shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<(GridQubit, Basis)>, QlcError> {
        let direction = spatial_direction(pipe)?;
        let mut qubits = Vec::new();
        match direction {
            Direction3D::X => {
                let u_basis = pipe.u.kind.basis_along(Direction3D::Y);
                let v_basis = pipe.v.kind.basis_along(Direction3D::Y);
                let (u_cols, v_cols) = covered(pipe, shape.x);
                for row in 0..shape.y {
                    for col in u_cols.clone() {
                        qubits.push((GridQubit::new(2 * col, 2 * row), u_basis));
                    }
                    for col in v_cols.clone() {
                        qubits.push((GridQubit::new(2 * (col + shape.x), 2 * row), v_basis));
                    }
                }
            }
            _ => {
                let u_basis = pipe.u.kind.basis_along(Direction3D::X);
                let v_basis = pipe.v.kind.basis_along(Direction3D::X);
                let (u_rows, v_rows) = covered(pipe, shape.y);
                for col in 0..shape.x {
                    for row in u_rows.clone() {
                        qubits.push((GridQubit::new(2 * col, 2 * row), u_basis));
                    }
                    for row in v_rows.clone() {
                        qubits.push((GridQubit::new(2 * col, 2 * (row + shape.y)), v_basis));
                    }
                }
            }
        }
        Ok(qubits)
    }

    fn spatial_cube_top_readouts(
        &self,
        shape: Shape2D,
        cube: &ObservableCube,
        arms: SpatialArms,
        even_basis: Basis,
    ) -> Result<Vec<GridQubit>, QlcError> {
        let horizontal = SpatialArms::LEFT | SpatialArms::RIGHT;
        let vertical = SpatialArms::UP | SpatialArms::DOWN;
        let mut qubits = Vec::new();
        if arms == horizontal || arms == vertical {
            let (first, second) = if arms == horizontal {
                (SpatialArms::LEFT, SpatialArms::RIGHT)
            } else {
                (SpatialArms::UP, SpatialArms::DOWN)
            };
            qubits.extend(half_line(shape, first, true));
            qubits.extend(half_line(shape, second, false));
        } else if arms == horizontal | vertical {
            qubits.extend(half_line(shape, SpatialArms::LEFT, false));
            qubits.extend(half_line(shape, SpatialArms::RIGHT, false));
            qubits.extend(half_line(shape, SpatialArms::UP, false));
            qubits.extend(half_line(shape, SpatialArms::DOWN, false));
        } else if arms.len() == 2 {
            // The centre is read out when the plaquettes on the inner and
            // outer corners of the bend measure the readout basis.
            let diagonal = arms == SpatialArms::LEFT | SpatialArms::UP
                || arms == SpatialArms::RIGHT | SpatialArms::DOWN;
            let corner_basis = if diagonal {
                even_basis
            } else {
                even_basis.flipped()
            };
            let through = corner_basis == cube.kind.z;
            let mut bent = arms.iter();
            if let (Some(first), Some(second)) = (bent.next(), bent.next()) {
                qubits.extend(half_line(shape, first, through));
                qubits.extend(half_line(shape, second, false));
            }
        } else {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "ambiguous-spatial-readout",
                    "an observable crosses a spatial cube through exactly two or four arms",
                )
                .with_context("cube", cube.position.to_string())
                .with_context("arms", arms.to_string()),
            ));
        }
        Ok(qubits)
    }

    fn cube_bottom_stabilizers(
        &self,
        shape: Shape2D,
        cube: &ObservableCube,
    ) -> Result<Vec<(GridQubit, Basis)>, QlcError> {
        let basis = cube.kind.x;
        Ok((0..shape.y)
            .flat_map(|row| (0..shape.x).map(move |col| (GridQubit::new(2 * col, 2 * row), basis)))
            .collect())
    }

    fn pipe_temporal_hadamard_realignment(
        &self,
        _shape: Shape2D,
        pipe: &ObservablePipe,
    ) -> Result<Vec<GridQubit>, QlcError> {
        if pipe.direction()? != Direction3D::Z {
            return Err(QlcError::Unsupported(
                ErrorInfo::new(
                    "spatial-hadamard-pipe",
                    "only temporal pipes carry a Hadamard realignment",
                )
                .with_context("u", pipe.u.position.to_string())
                .with_context("v", pipe.v.position.to_string()),
            ));
        }
        // The rotated blocks keep every data qubit in place across the
        // Hadamard round, leaving nothing to realign.
        Ok(Vec::new())
    }
}

/// Which faces of a z-slice are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservableComponent {
    /// Data-qubit readouts on the top faces.
    TopReadouts,
    /// Stabilizer measurements on the bottom faces.
    BottomStabilizers,
    /// Measurements of the realignment round closing a slice.
    Realignment,
}

/// Absolute qubits measured by the `component` part of `slice` at `k`.
///
/// `stabilizer_bases` maps the absolute syndrome qubits of the round to the
/// basis they measure; stabilizers of another basis are left out. Readouts of
/// spatial cubes also read their checkerboard from it.
pub fn compute_observable_qubits(
    slice: &AbstractObservable,
    component: ObservableComponent,
    element: Shape2D,
    builder: &dyn ObservableBuilder,
    stabilizer_bases: &BTreeMap<GridQubit, Basis>,
) -> Result<BTreeSet<GridQubit>, QlcError> {
    let origin = |cube: &ObservableCube| {
        Shift2D::new(
            SPATIAL_BORDER_WIDTH * cube.position.x * element.x,
            SPATIAL_BORDER_WIDTH * cube.position.y * element.y,
        )
    };
    let mut qubits = BTreeSet::new();
    match component {
        ObservableComponent::TopReadouts => {
            for cube in &slice.top_readout_cubes {
                let shift = origin(cube);
                qubits.extend(
                    builder
                        .cube_top_readouts(element, cube)
                        .iter()
                        .map(|qubit| qubit.shifted(shift)),
                );
            }
            for pipe in &slice.top_readout_pipes {
                let shift = origin(&pipe.u);
                qubits.extend(
                    builder
                        .pipe_top_readouts(element, pipe)?
                        .iter()
                        .map(|qubit| qubit.shifted(shift)),
                );
            }
            for (cube, arms) in &slice.top_readout_spatial_cubes {
                let shift = origin(cube);
                let corner = GridQubit::new(2, 2).shifted(shift);
                let Some(even_basis) = stabilizer_bases.get(&corner) else {
                    return Err(QlcError::Precondition(
                        ErrorInfo::new(
                            "unknown-checkerboard",
                            "no stabilizer measured next to the corner of the spatial cube",
                        )
                        .with_context("cube", cube.position.to_string()),
                    ));
                };
                qubits.extend(
                    builder
                        .spatial_cube_top_readouts(element, cube, *arms, *even_basis)?
                        .iter()
                        .map(|qubit| qubit.shifted(shift)),
                );
            }
        }
        ObservableComponent::BottomStabilizers => {
            let mut candidates = Vec::new();
            for pipe in &slice.bottom_stabilizer_pipes {
                let shift = origin(&pipe.u);
                for (qubit, basis) in builder.pipe_bottom_stabilizers(element, pipe)? {
                    candidates.push((qubit.shifted(shift), basis));
                }
            }
            for cube in &slice.bottom_stabilizer_cubes {
                let shift = origin(cube);
                for (qubit, basis) in builder.cube_bottom_stabilizers(element, cube)? {
                    candidates.push((qubit.shifted(shift), basis));
                }
            }
            qubits.extend(
                candidates
                    .into_iter()
                    .filter(|(qubit, basis)| stabilizer_bases.get(qubit) == Some(basis))
                    .map(|(qubit, _)| qubit),
            );
        }
        ObservableComponent::Realignment => {
            for pipe in &slice.temporal_hadamard_pipes {
                let shift = origin(&pipe.u);
                qubits.extend(
                    builder
                        .pipe_temporal_hadamard_realignment(element, pipe)?
                        .iter()
                        .map(|qubit| qubit.shifted(shift)),
                );
            }
        }
    }
    Ok(qubits)
}
