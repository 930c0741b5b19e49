use std::collections::BTreeMap;

use qlc_compile::{
    merge_parallel_block_layers, Block, BlockBounds, BlockBuilder, CubeKind, CubeSpec, Layer,
    LayoutLayer, LayoutPosition2D, PipeSpec, StandardBlockBuilder,
};
use qlc_core::{BlockPosition2D, Direction3D, LinearFunction, QlcError, Scalable2D, Shift2D};
use qlc_plaquette::get_spatially_distinct_3d_subtemplates;

fn element_shape() -> Scalable2D {
    Scalable2D::new(LinearFunction::new(2, 2), LinearFunction::new(2, 2))
}

fn kind() -> CubeKind {
    "ZXZ".parse().expect("kind")
}

fn cube() -> Block {
    StandardBlockBuilder
        .build_cube(&CubeSpec::new(kind()))
        .expect("cube")
}

fn cube_at(x: i64, y: i64) -> LayoutPosition2D {
    LayoutPosition2D::from_block_position(BlockPosition2D::new(x, y))
}

#[test]
fn layout_positions_interleave_cubes_and_pipes() {
    let pipe = LayoutPosition2D::from_pipe_position(
        BlockPosition2D::new(1, 0),
        BlockPosition2D::new(0, 0),
    )
    .unwrap();
    assert_eq!(pipe, LayoutPosition2D::Pipe { x: 1, y: 0 });
    assert_eq!(pipe.pipe_direction(), Some(Direction3D::X));
    assert_eq!(cube_at(1, 2), LayoutPosition2D::Cube { x: 2, y: 4 });
    let err = LayoutPosition2D::from_pipe_position(
        BlockPosition2D::new(0, 0),
        BlockPosition2D::new(2, 0),
    )
    .unwrap_err();
    assert_eq!(err.code(), "not-neighbours");
}

#[test]
fn empty_compositions_are_rejected() {
    let bounds = BlockBounds::single(BlockPosition2D::new(0, 0));
    let err = LayoutLayer::new(BTreeMap::new(), element_shape(), bounds).unwrap_err();
    assert!(matches!(err, QlcError::Construction(_)));
    assert_eq!(err.code(), "empty-composition");

    let err = get_spatially_distinct_3d_subtemplates(&[], 1).unwrap_err();
    assert_eq!(err.code(), "empty-composition");
}

#[test]
fn merging_a_single_cube_keeps_its_structure() {
    let blocks = BTreeMap::from([(cube_at(0, 0), cube())]);
    let bounds = BlockBounds::single(BlockPosition2D::new(0, 0));
    let layers = merge_parallel_block_layers(&blocks, element_shape(), bounds).unwrap();
    assert_eq!(layers.len(), 3);
    assert!(matches!(layers[0], Layer::Layout(_)));
    assert!(matches!(layers[1], Layer::Repeated(_)));
    assert!(matches!(layers[2], Layer::Layout(_)));
    assert_eq!(layers[1].timesteps(2), 3);
}

#[test]
fn single_cube_layout_matches_the_plain_memory_round() {
    let blocks = BTreeMap::from([(cube_at(0, 0), cube())]);
    let bounds = BlockBounds::single(BlockPosition2D::new(0, 0));
    let layers = merge_parallel_block_layers(&blocks, element_shape(), bounds).unwrap();
    let Layer::Layout(init) = &layers[0] else {
        panic!("expected a layout");
    };
    let circuit = init.to_circuit(1).unwrap();
    // Distance 3: nine data qubits and eight syndrome qubits.
    assert_eq!(circuit.qubits().len(), 17);
    assert_eq!(circuit.num_measurements(), 8);
}

#[test]
fn spatially_joined_cubes_share_one_frame() {
    let builder = StandardBlockBuilder;
    let pipe = builder
        .build_pipe(&PipeSpec::new(
            CubeSpec::new(kind()),
            CubeSpec::new(kind()),
            Direction3D::X,
        ))
        .unwrap();
    let blocks = BTreeMap::from([
        (cube_at(0, 0), cube()),
        (cube_at(1, 0), cube()),
        (
            LayoutPosition2D::from_pipe_position(
                BlockPosition2D::new(0, 0),
                BlockPosition2D::new(1, 0),
            )
            .unwrap(),
            pipe,
        ),
    ]);
    let bounds = BlockBounds::from_layout_positions(blocks.keys()).unwrap();
    assert_eq!(bounds.width(), 2);
    let layers = merge_parallel_block_layers(&blocks, element_shape(), bounds).unwrap();
    let Layer::Layout(layout) = &layers[0] else {
        panic!("expected a layout");
    };
    assert_eq!(layout.layers().len(), 3);
    assert_eq!(layout.frame_origin(1), Shift2D::new(0, 0));
    let circuit = layout.to_circuit(1).unwrap();
    assert!(circuit.qubits().len() > 2 * 17);
}

#[test]
fn frame_origin_follows_the_bounds() {
    let blocks = BTreeMap::from([(cube_at(1, 2), cube())]);
    let bounds = BlockBounds::single(BlockPosition2D::new(1, 2));
    let layers = merge_parallel_block_layers(&blocks, element_shape(), bounds).unwrap();
    let Layer::Layout(layout) = &layers[0] else {
        panic!("expected a layout");
    };
    assert_eq!(layout.frame_origin(1), Shift2D::new(8, 16));
    let circuit = layout.to_circuit(1).unwrap();
    assert!(circuit.qubits().iter().all(|qubit| qubit.x >= 8 && qubit.y >= 16));
}

#[test]
fn blocks_with_different_schedules_cannot_be_merged() {
    let builder = StandardBlockBuilder;
    let temporal = builder
        .build_pipe(&PipeSpec::new(
            CubeSpec::new(kind()),
            CubeSpec::new(kind()),
            Direction3D::Z,
        ))
        .unwrap();
    let blocks = BTreeMap::from([(cube_at(0, 0), cube()), (cube_at(1, 0), temporal)]);
    let bounds = BlockBounds::from_layout_positions(blocks.keys()).unwrap();
    let err = merge_parallel_block_layers(&blocks, element_shape(), bounds).unwrap_err();
    assert_eq!(err.code(), "schedule-mismatch");
}
