use std::collections::BTreeSet;

use qlc_circuit::Circuit;
use qlc_compile::{
    analyse_circuit, compile_block_graph, compile_many, AbstractObservable, Block, BlockBuilder,
    BlockGraph, CompileConfig, CubeSpec, DetectorEngine, LayerTree, PipeSpec, SpatialArms,
    StandardBlockBuilder, TopologicalComputationGraph,
};
use qlc_core::{BlockPosition3D, Direction3D, QlcError, Scalable2D};
use qlc_plaquette::RoundKind;

fn position(x: i64, y: i64, z: i64) -> BlockPosition3D {
    BlockPosition3D::new(x, y, z)
}

fn memory_graph() -> BlockGraph {
    let mut graph = BlockGraph::new();
    graph.add_cube(position(0, 0, 0), "ZXZ".parse().unwrap()).unwrap();
    graph
}

fn tree_of(graph: &BlockGraph, observed: &[BlockPosition3D]) -> LayerTree {
    let observables = observed
        .iter()
        .map(|p| graph.cube_readout(*p).unwrap())
        .collect();
    compile_block_graph(graph, &StandardBlockBuilder, observables)
        .unwrap()
        .to_layer_tree()
        .unwrap()
}

#[test]
fn memory_experiment_has_deterministic_detectors_and_observable() {
    let graph = memory_graph();
    let mut tree = tree_of(&graph, &[position(0, 0, 0)]);
    let engine = DetectorEngine::in_memory();
    let circuit = tree
        .generate_circuit(1, &CompileConfig::default(), &engine)
        .unwrap();
    assert!(circuit.num_detectors() > 0);
    assert_eq!(circuit.num_observables(), 1);
    assert!(circuit.to_string().contains("REPEAT"));

    let flows = analyse_circuit(&circuit, tree.qubit_map(1).unwrap()).unwrap();
    assert!(flows.non_deterministic_detectors().is_empty());
    assert!(flows.is_observable_deterministic(0));
}

#[test]
fn temporally_stacked_cubes_carry_the_memory_forward() {
    let mut graph = memory_graph();
    graph.add_cube(position(0, 0, 1), "ZXZ".parse().unwrap()).unwrap();
    graph.add_pipe(position(0, 0, 0), position(0, 0, 1)).unwrap();
    let mut tree = tree_of(&graph, &[position(0, 0, 1)]);
    let engine = DetectorEngine::in_memory();
    let circuit = tree
        .generate_circuit(1, &CompileConfig::default(), &engine)
        .unwrap();

    let single = tree_of(&memory_graph(), &[])
        .generate_circuit(1, &CompileConfig::default(), &engine)
        .unwrap();
    assert!(circuit.num_detectors() > single.num_detectors());
    assert_eq!(tree.root().children().len(), 2);

    let flows = analyse_circuit(&circuit, tree.qubit_map(1).unwrap()).unwrap();
    assert!(flows.non_deterministic_detectors().is_empty());
    assert!(flows.is_observable_deterministic(0));
}

#[test]
fn spatially_joined_cubes_compile_into_one_patch() {
    let mut graph = memory_graph();
    graph.add_cube(position(1, 0, 0), "ZXZ".parse().unwrap()).unwrap();
    graph.add_pipe(position(0, 0, 0), position(1, 0, 0)).unwrap();
    let mut tree = tree_of(&graph, &[]);
    let engine = DetectorEngine::in_memory();
    let circuit = tree
        .generate_circuit(1, &CompileConfig::default(), &engine)
        .unwrap();

    let qubit_map = tree.qubit_map(1).unwrap();
    assert!(qubit_map.len() > 2 * 17);
    assert!(circuit.num_detectors() > 0);
    let flows = analyse_circuit(&circuit, qubit_map).unwrap();
    assert!(flows.non_deterministic_detectors().is_empty());
}

#[test]
fn several_scales_compile_against_one_database() {
    let graph = memory_graph();
    let engine = DetectorEngine::in_memory();
    let config = CompileConfig::default();
    let circuits = compile_many(
        || {
            Ok(compile_block_graph(&graph, &StandardBlockBuilder, Vec::new())?
                .to_layer_tree()?)
        },
        &[2, 1, 2],
        &config,
        &engine,
    )
    .unwrap();
    assert_eq!(circuits.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert!(circuits[&2].num_detectors() > circuits[&1].num_detectors());
}

type Coords = (i64, i64, i64);

fn graph_of(cubes: &[(Coords, &str)], pipes: &[(Coords, Coords)]) -> BlockGraph {
    let mut graph = BlockGraph::new();
    for ((x, y, z), kind) in cubes {
        graph.add_cube(position(*x, *y, *z), kind.parse().unwrap()).unwrap();
    }
    for ((ux, uy, uz), (vx, vy, vz)) in pipes {
        graph
            .add_pipe(position(*ux, *uy, *uz), position(*vx, *vy, *vz))
            .unwrap();
    }
    graph
}

fn compile_at_one(
    graph: &BlockGraph,
    builder: &dyn BlockBuilder,
    observables: Vec<AbstractObservable>,
) -> (LayerTree, Circuit) {
    let mut tree = compile_block_graph(graph, builder, observables)
        .unwrap()
        .to_layer_tree()
        .unwrap();
    let circuit = tree
        .generate_circuit(1, &CompileConfig::default(), &DetectorEngine::in_memory())
        .unwrap();
    (tree, circuit)
}

fn deterministic_observables(tree: &LayerTree, circuit: &Circuit) -> Vec<bool> {
    let flows = analyse_circuit(circuit, tree.qubit_map(1).unwrap()).unwrap();
    assert!(flows.non_deterministic_detectors().is_empty());
    (0..circuit.num_observables())
        .map(|index| flows.is_observable_deterministic(index))
        .collect()
}

#[test]
fn spatially_joined_cubes_read_out_through_their_pipe() {
    let graph = graph_of(
        &[((0, 0, 0), "ZXZ"), ((1, 0, 0), "ZXZ")],
        &[((0, 0, 0), (1, 0, 0))],
    );
    let left = graph.cube(position(0, 0, 0)).unwrap();
    let right = graph.cube(position(1, 0, 0)).unwrap();
    let pipe = graph.pipe(left.position, right.position).unwrap();
    let through = AbstractObservable {
        top_readout_cubes: BTreeSet::from([left, right]),
        top_readout_pipes: BTreeSet::from([pipe]),
        ..Default::default()
    };
    let cubes_only = AbstractObservable {
        top_readout_cubes: BTreeSet::from([left, right]),
        ..Default::default()
    };
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![through, cubes_only]);
    assert_eq!(circuit.num_observables(), 2);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true, false]);
}

#[test]
fn merging_two_patches_measures_their_joint_parity() {
    let graph = graph_of(
        &[
            ((0, 0, 0), "ZXX"),
            ((0, 1, 0), "ZXX"),
            ((0, 0, 1), "ZXZ"),
            ((0, 1, 1), "ZXZ"),
        ],
        &[
            ((0, 0, 0), (0, 0, 1)),
            ((0, 1, 0), (0, 1, 1)),
            ((0, 0, 1), (0, 1, 1)),
        ],
    );
    let a = graph.cube(position(0, 0, 1)).unwrap();
    let b = graph.cube(position(0, 1, 1)).unwrap();
    let merge = graph.pipe(a.position, b.position).unwrap();
    let parity = AbstractObservable {
        top_readout_cubes: BTreeSet::from([a, b]),
        bottom_stabilizer_pipes: BTreeSet::from([merge]),
        ..Default::default()
    };
    let readouts_only = AbstractObservable {
        top_readout_cubes: BTreeSet::from([a, b]),
        ..Default::default()
    };
    let (tree, circuit) =
        compile_at_one(&graph, &StandardBlockBuilder, vec![parity, readouts_only]);
    assert_eq!(tree.z_levels(), &[0, 1]);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true, false]);
}

#[test]
fn lattice_surgery_cnot_keeps_the_control_readout() {
    let graph = graph_of(
        &[
            ((0, 0, 0), "ZXZ"),
            ((0, 0, 1), "ZXX"),
            ((0, 0, 2), "ZXZ"),
            ((0, 0, 3), "ZXZ"),
            ((0, 1, 1), "ZXX"),
            ((0, 1, 2), "ZXZ"),
            ((1, 1, 0), "ZXZ"),
            ((1, 1, 1), "ZXZ"),
            ((1, 1, 2), "ZXZ"),
            ((1, 1, 3), "ZXZ"),
        ],
        &[
            ((0, 0, 0), (0, 0, 1)),
            ((0, 0, 1), (0, 0, 2)),
            ((0, 0, 2), (0, 0, 3)),
            ((0, 0, 1), (0, 1, 1)),
            ((0, 1, 1), (0, 1, 2)),
            ((0, 1, 2), (1, 1, 2)),
            ((1, 1, 0), (1, 1, 1)),
            ((1, 1, 1), (1, 1, 2)),
            ((1, 1, 2), (1, 1, 3)),
        ],
    );
    assert_eq!(graph.cubes().len(), 10);
    assert_eq!(graph.pipes().len(), 9);
    let control = graph.cube_readout(position(0, 0, 3)).unwrap();
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![control]);
    assert_eq!(tree.z_levels(), &[0, 1, 2, 3]);
    assert!(circuit.num_detectors() > 0);
    assert_eq!(circuit.num_observables(), 1);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true]);
}

#[test]
fn stability_experiment_reads_the_bottom_stabilizers() {
    let graph = graph_of(&[((0, 0, 0), "ZZX")], &[]);
    let cube = graph.cube(position(0, 0, 0)).unwrap();
    let stability = AbstractObservable {
        bottom_stabilizer_cubes: BTreeSet::from([cube]),
        ..Default::default()
    };
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![stability]);
    assert_eq!(circuit.num_observables(), 1);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true]);
}

#[test]
fn bent_observable_crosses_a_spatial_junction() {
    let graph = graph_of(
        &[((0, 0, 0), "ZZX"), ((1, 0, 0), "XZX"), ((0, 1, 0), "ZXX")],
        &[((0, 0, 0), (1, 0, 0)), ((0, 0, 0), (0, 1, 0))],
    );
    let junction = graph.cube(position(0, 0, 0)).unwrap();
    let right = graph.cube(position(1, 0, 0)).unwrap();
    let down = graph.cube(position(0, 1, 0)).unwrap();
    assert_eq!(
        graph.arms(junction.position),
        SpatialArms::RIGHT | SpatialArms::DOWN
    );
    let bent = AbstractObservable {
        top_readout_cubes: BTreeSet::from([right, down]),
        top_readout_pipes: BTreeSet::from([
            graph.pipe(junction.position, right.position).unwrap(),
            graph.pipe(junction.position, down.position).unwrap(),
        ]),
        top_readout_spatial_cubes: BTreeSet::from([(
            junction,
            SpatialArms::RIGHT | SpatialArms::DOWN,
        )]),
        ..Default::default()
    };
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![bent]);
    assert!(circuit.num_detectors() > 0);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true]);
}

#[test]
fn straight_observable_crosses_a_t_junction() {
    let graph = graph_of(
        &[
            ((0, 0, 0), "XZX"),
            ((1, 0, 0), "ZZX"),
            ((2, 0, 0), "XZX"),
            ((1, 1, 0), "ZXX"),
        ],
        &[
            ((0, 0, 0), (1, 0, 0)),
            ((1, 0, 0), (2, 0, 0)),
            ((1, 0, 0), (1, 1, 0)),
        ],
    );
    let left = graph.cube(position(0, 0, 0)).unwrap();
    let junction = graph.cube(position(1, 0, 0)).unwrap();
    let right = graph.cube(position(2, 0, 0)).unwrap();
    let straight = AbstractObservable {
        top_readout_cubes: BTreeSet::from([left, right]),
        top_readout_pipes: BTreeSet::from([
            graph.pipe(left.position, junction.position).unwrap(),
            graph.pipe(junction.position, right.position).unwrap(),
        ]),
        top_readout_spatial_cubes: BTreeSet::from([(
            junction,
            SpatialArms::LEFT | SpatialArms::RIGHT,
        )]),
        ..Default::default()
    };
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![straight]);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true]);
}

#[test]
fn hadamard_pipe_carries_the_state_into_the_rotated_patch() {
    let graph = graph_of(
        &[((0, 0, 0), "ZXZ"), ((0, 0, 1), "XZX")],
        &[((0, 0, 0), (0, 0, 1))],
    );
    let readout = graph.cube_readout(position(0, 0, 1)).unwrap();
    let (tree, circuit) = compile_at_one(&graph, &StandardBlockBuilder, vec![readout]);
    assert!(circuit
        .to_string()
        .lines()
        .any(|line| line.trim_start().starts_with("H ")));
    assert!(tree.realignment_levels().is_empty());
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true]);
}

/// Temporal Hadamard pipes spread over three rounds: the Hadamard runs in a
/// round of its own between the two cubes.
#[derive(Debug)]
struct SlowHadamardBuilder;

impl BlockBuilder for SlowHadamardBuilder {
    fn cube_shape(&self) -> Scalable2D {
        StandardBlockBuilder.cube_shape()
    }

    fn build_cube(&self, spec: &CubeSpec) -> Result<Block, QlcError> {
        StandardBlockBuilder.build_cube(spec)
    }

    fn build_pipe(&self, spec: &PipeSpec) -> Result<Block, QlcError> {
        if !spec.has_hadamard() {
            return StandardBlockBuilder.build_pipe(spec);
        }
        let (u, v) = spec.cubes;
        Block::new(vec![
            StandardBlockBuilder::cube_round(&u, RoundKind::Memory)?,
            StandardBlockBuilder::cube_round(&u, RoundKind::Hadamard)?,
            StandardBlockBuilder::cube_round(&v, RoundKind::Memory)?,
        ])
    }
}

#[test]
fn inner_hadamard_rounds_close_the_slice_of_their_source() {
    let graph = graph_of(
        &[((0, 0, 0), "ZXZ"), ((0, 0, 1), "XZX"), ((2, 0, 0), "ZXZ")],
        &[((0, 0, 0), (0, 0, 1))],
    );
    let rotated = graph.cube_readout(position(0, 0, 1)).unwrap();
    let beside = graph.cube_readout(position(2, 0, 0)).unwrap();
    let (tree, circuit) = compile_at_one(&graph, &SlowHadamardBuilder, vec![rotated, beside]);
    assert_eq!(tree.realignment_levels(), &BTreeSet::from([0]));
    assert_eq!(circuit.num_observables(), 2);
    assert_eq!(deterministic_observables(&tree, &circuit), vec![true, true]);
}

#[test]
fn inner_hadamard_rounds_cannot_leave_a_joined_cube() {
    let graph = graph_of(
        &[((0, 0, 0), "ZXZ"), ((0, 0, 1), "XZX"), ((1, 0, 0), "ZXZ")],
        &[((0, 0, 0), (0, 0, 1)), ((0, 0, 0), (1, 0, 0))],
    );
    let err = compile_block_graph(&graph, &SlowHadamardBuilder, Vec::new()).unwrap_err();
    assert_eq!(err.code(), "hadamard-beside-spatial-pipe");

    let regular = CubeSpec::new("ZXZ".parse().unwrap());
    let rotated = CubeSpec::new("XZX".parse().unwrap());
    let builder = SlowHadamardBuilder;
    let mut computation = TopologicalComputationGraph::new(builder.cube_shape()).unwrap();
    for (at, spec) in [
        (position(0, 0, 0), regular),
        (position(0, 0, 1), rotated),
        (position(1, 0, 0), regular),
    ] {
        computation.add_cube(at, builder.build_cube(&spec).unwrap()).unwrap();
    }
    let slow = builder
        .build_pipe(&PipeSpec::new(regular, rotated, Direction3D::Z))
        .unwrap();
    assert_eq!(slow.layers().len(), 3);
    computation
        .add_pipe(position(0, 0, 0), position(0, 0, 1), slow)
        .unwrap();
    let side = builder
        .build_pipe(&PipeSpec::new(regular, regular, Direction3D::X))
        .unwrap();
    computation
        .add_pipe(position(0, 0, 0), position(1, 0, 0), side)
        .unwrap();
    let err = computation.to_layer_tree().unwrap_err();
    assert_eq!(err.code(), "realignment-beside-spatial-pipe");
}
