//! Compilation of a graph of cube and pipe kinds.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use qlc_core::{Basis, BlockPosition3D, Direction3D, ErrorInfo, QlcError};
use tracing::{debug, info};

use crate::graph::TopologicalComputationGraph;
use crate::observables::{AbstractObservable, ObservableCube, ObservablePipe};
use crate::specs::{BlockBuilder, CubeKind, CubeSpec, PipeSpec, SpatialArms};

/// Cubes and the pipes joining them, described by their kinds only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockGraph {
    cubes: BTreeMap<BlockPosition3D, CubeKind>,
    pipes: BTreeSet<(BlockPosition3D, BlockPosition3D)>,
}

impl BlockGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a cube of `kind`.
    pub fn add_cube(&mut self, position: BlockPosition3D, kind: CubeKind) -> Result<(), QlcError> {
        if self.cubes.contains_key(&position) {
            return Err(QlcError::Construction(
                ErrorInfo::new("duplicate-cube", "a cube already occupies this position")
                    .with_context("position", position.to_string()),
            ));
        }
        self.cubes.insert(position, kind);
        Ok(())
    }

    /// Joins two neighbouring cubes; the endpoints may be given in any order.
    pub fn add_pipe(&mut self, a: BlockPosition3D, b: BlockPosition3D) -> Result<(), QlcError> {
        Direction3D::from_neighbouring_positions(&a, &b)?;
        let (u, v) = if a < b { (a, b) } else { (b, a) };
        let pipe = self.pipe(u, v)?;
        PipeSpec::check_kinds(pipe.u.kind, pipe.v.kind, pipe.direction()?)?;
        self.pipes.insert((u, v));
        Ok(())
    }

    /// Cubes by position.
    pub fn cubes(&self) -> &BTreeMap<BlockPosition3D, CubeKind> {
        &self.cubes
    }

    /// Pipes as `(lower, upper)` endpoints.
    pub fn pipes(&self) -> &BTreeSet<(BlockPosition3D, BlockPosition3D)> {
        &self.pipes
    }

    /// Kind of the cube at `position`.
    pub fn cube(&self, position: BlockPosition3D) -> Result<ObservableCube, QlcError> {
        let kind = self.cubes.get(&position).ok_or_else(|| {
            QlcError::Construction(
                ErrorInfo::new("missing-cube", "no cube at this position")
                    .with_context("position", position.to_string()),
            )
        })?;
        Ok(ObservableCube {
            position,
            kind: *kind,
        })
    }

    /// Pipe between `u` and its upper neighbour `v`.
    pub fn pipe(&self, u: BlockPosition3D, v: BlockPosition3D) -> Result<ObservablePipe, QlcError> {
        Ok(ObservablePipe {
            u: self.cube(u)?,
            v: self.cube(v)?,
        })
    }

    /// Spatial pipes leaving the cube at `position`.
    pub fn arms(&self, position: BlockPosition3D) -> SpatialArms {
        let mut arms = SpatialArms::NONE;
        for (u, v) in &self.pipes {
            let arm = if *u == position {
                SpatialArms::towards(u, v)
            } else if *v == position {
                SpatialArms::towards(v, u)
            } else {
                None
            };
            if let Some(arm) = arm {
                arms |= arm;
            }
        }
        arms
    }

    fn neighbours(&self) -> BTreeMap<BlockPosition3D, Vec<(BlockPosition3D, bool)>> {
        let mut neighbours: BTreeMap<BlockPosition3D, Vec<(BlockPosition3D, bool)>> =
            BTreeMap::new();
        for (u, v) in &self.pipes {
            let direction = Direction3D::from_neighbouring_positions(u, v);
            let flips = match (self.cubes.get(u), self.cubes.get(v), direction) {
                (Some(ku), Some(kv), Ok(direction)) => {
                    PipeSpec::new(CubeSpec::new(*ku), CubeSpec::new(*kv), direction)
                        .has_hadamard()
                }
                _ => false,
            };
            neighbours.entry(*u).or_default().push((*v, flips));
            neighbours.entry(*v).or_default().push((*u, flips));
        }
        neighbours
    }

    /// Basis of the bulk stabilizers on even cells, for every cube.
    ///
    /// Cubes joined by a pipe share their checkerboard, except across a
    /// Hadamard pipe which swaps it. Each connected component starts from its
    /// first regular cube, whose `±Y` walls then sit on even cells.
    pub fn checkerboards(&self) -> Result<BTreeMap<BlockPosition3D, Basis>, QlcError> {
        let neighbours = self.neighbours();
        let mut assigned: BTreeMap<BlockPosition3D, Basis> = BTreeMap::new();
        for start in self.cubes.keys() {
            if assigned.contains_key(start) {
                continue;
            }
            let mut component = vec![*start];
            let mut queue = VecDeque::from([*start]);
            let mut seen = BTreeSet::from([*start]);
            while let Some(current) = queue.pop_front() {
                for (next, _) in neighbours.get(&current).into_iter().flatten() {
                    if seen.insert(*next) {
                        component.push(*next);
                        queue.push_back(*next);
                    }
                }
            }
            component.sort();
            let seed = component
                .iter()
                .find(|p| self.cubes.get(p).is_some_and(|kind| !kind.is_spatial()))
                .copied()
                .unwrap_or(*start);
            let seed_basis = match self.cubes.get(&seed) {
                Some(kind) if kind.is_spatial() => kind.x,
                Some(kind) => kind.y,
                None => continue,
            };
            assigned.insert(seed, seed_basis);
            let mut queue = VecDeque::from([seed]);
            while let Some(current) = queue.pop_front() {
                let Some(basis) = assigned.get(&current).copied() else {
                    continue;
                };
                for (next, flips) in neighbours.get(&current).into_iter().flatten() {
                    let expected = if *flips { basis.flipped() } else { basis };
                    match assigned.get(next) {
                        Some(found) if *found != expected => {
                            return Err(QlcError::Construction(
                                ErrorInfo::new(
                                    "checkerboard-conflict",
                                    "pipes imply two checkerboards for one cube",
                                )
                                .with_context("position", next.to_string()),
                            ));
                        }
                        Some(_) => {}
                        None => {
                            assigned.insert(*next, expected);
                            queue.push_back(*next);
                        }
                    }
                }
            }
            debug!(seed = %seed, cubes = component.len(), basis = %seed_basis, "assigned checkerboard");
        }
        Ok(assigned)
    }

    fn cube_spec(
        &self,
        position: BlockPosition3D,
        checkerboards: &BTreeMap<BlockPosition3D, Basis>,
    ) -> Result<CubeSpec, QlcError> {
        let kind = self.cube(position)?.kind;
        let mut spec = CubeSpec::new(kind).with_arms(self.arms(position));
        if let Some(basis) = checkerboards.get(&position) {
            spec = spec.with_even_basis(*basis);
        }
        Ok(spec)
    }

    fn pipe_spec(
        &self,
        u: BlockPosition3D,
        v: BlockPosition3D,
        checkerboards: &BTreeMap<BlockPosition3D, Basis>,
    ) -> Result<PipeSpec, QlcError> {
        let spec = PipeSpec::new(
            self.cube_spec(u, checkerboards)?,
            self.cube_spec(v, checkerboards)?,
            Direction3D::from_neighbouring_positions(&u, &v)?,
        );
        if spec.has_hadamard() {
            if let Some(position) = [u, v].into_iter().find(|p| !self.arms(*p).is_empty()) {
                return Err(QlcError::Unsupported(
                    ErrorInfo::new(
                        "hadamard-beside-spatial-pipe",
                        "a cube ending in a Hadamard pipe cannot have spatial pipes",
                    )
                    .with_context("position", position.to_string()),
                ));
            }
        }
        Ok(spec)
    }

    /// Observable read out on the top face of the cube at `position`.
    pub fn cube_readout(&self, position: BlockPosition3D) -> Result<AbstractObservable, QlcError> {
        Ok(AbstractObservable::cube_readout(self.cube(position)?))
    }
}

/// Builds every block of `graph` with `builder` and places them.
///
/// Temporal pipes are added after the spatial ones, so that the graph
/// substitutes their borders on already known neighbours.
pub fn compile_block_graph(
    graph: &BlockGraph,
    builder: &dyn BlockBuilder,
    observables: Vec<AbstractObservable>,
) -> Result<TopologicalComputationGraph, QlcError> {
    let checkerboards = graph.checkerboards()?;
    let mut computation = TopologicalComputationGraph::new(builder.cube_shape())?;
    for position in graph.cubes().keys() {
        let spec = graph.cube_spec(*position, &checkerboards)?;
        computation.add_cube(*position, builder.build_cube(&spec)?)?;
    }
    for (u, v) in graph.pipes() {
        let spec = graph.pipe_spec(*u, *v, &checkerboards)?;
        computation.add_pipe(*u, *v, builder.build_pipe(&spec)?)?;
    }
    for observable in observables {
        computation.add_observable(observable);
    }
    info!(
        cubes = computation.num_cubes(),
        pipes = computation.num_pipes(),
        observables = computation.observables().len(),
        "built computation graph"
    );
    Ok(computation)
}
