use qlc_core::{LinearFunction, QlcError, Shape2D};
use qlc_plaquette::{
    get_spatially_distinct_3d_subtemplates, BorderIndices, PlaquetteGrid, RectangularTemplate,
    Template, TemplateBorder,
};

fn rows(grid: &PlaquetteGrid) -> Vec<Vec<usize>> {
    (0..grid.rows())
        .map(|row| (0..grid.cols()).map(|col| grid.get(row, col)).collect())
        .collect()
}

#[test]
fn qubit_template_matches_reference_layout() {
    let grid = RectangularTemplate::Qubit.instantiate(2);
    assert_eq!(
        rows(&grid),
        vec![
            vec![1, 5, 6, 5, 6, 2],
            vec![7, 9, 10, 9, 10, 11],
            vec![8, 10, 9, 10, 9, 12],
            vec![7, 9, 10, 9, 10, 11],
            vec![8, 10, 9, 10, 9, 12],
            vec![3, 13, 14, 13, 14, 4],
        ]
    );
}

#[test]
fn spatial_qubit_template_numbers_its_corner_cells() {
    let grid = RectangularTemplate::SpatialQubit.instantiate(2);
    assert_eq!(
        rows(&grid),
        vec![
            vec![1, 5, 6, 5, 6, 2],
            vec![7, 15, 10, 9, 16, 11],
            vec![8, 10, 9, 10, 9, 12],
            vec![7, 9, 10, 9, 10, 11],
            vec![8, 17, 9, 10, 18, 12],
            vec![3, 13, 14, 13, 14, 4],
        ]
    );
    for border in [
        TemplateBorder::Top,
        TemplateBorder::Bottom,
        TemplateBorder::Left,
        TemplateBorder::Right,
    ] {
        assert_eq!(
            RectangularTemplate::SpatialQubit.border_indices(border).expect("border"),
            RectangularTemplate::Qubit.border_indices(border).expect("border"),
        );
    }
}

#[test]
fn border_templates_match_reference_layouts() {
    let vertical = RectangularTemplate::VerticalBorders.instantiate(2);
    assert_eq!(
        rows(&vertical),
        vec![
            vec![1, 2],
            vec![5, 7],
            vec![6, 8],
            vec![5, 7],
            vec![6, 8],
            vec![3, 4],
        ]
    );
    let horizontal = RectangularTemplate::HorizontalBorders.instantiate(2);
    assert_eq!(
        rows(&horizontal),
        vec![vec![1, 5, 6, 5, 6, 2], vec![3, 7, 8, 7, 8, 4]]
    );
}

#[test]
fn scalable_shapes_scale_in_the_expected_axes() {
    let scalable = LinearFunction::new(2, 2);
    let fixed = LinearFunction::constant(2);
    assert_eq!(RectangularTemplate::Qubit.scalable_shape().x, scalable);
    assert_eq!(RectangularTemplate::VerticalBorders.scalable_shape().x, fixed);
    assert_eq!(RectangularTemplate::HorizontalBorders.scalable_shape().y, fixed);
    assert_eq!(RectangularTemplate::Qubit.shape(1), Shape2D::new(4, 4));
}

#[test]
fn border_indices_map_between_templates() {
    let cube_right = RectangularTemplate::Qubit
        .border_indices(TemplateBorder::Right)
        .expect("qubit has a right border");
    let pipe_left = RectangularTemplate::VerticalBorders
        .border_indices(TemplateBorder::Left)
        .expect("vertical borders have a left border");
    assert_eq!(cube_right, BorderIndices::new(2, 11, 12, 4));
    let mapping = cube_right.to(&pipe_left);
    assert_eq!(mapping.get(&11), Some(&5));
    assert_eq!(mapping.get(&4), Some(&3));
}

#[test]
fn border_templates_reject_non_repeating_borders() {
    let err = RectangularTemplate::VerticalBorders
        .border_indices(TemplateBorder::Top)
        .expect_err("no repeating element on top");
    match err {
        QlcError::Unsupported(info) => assert_eq!(info.code, "no-repeating-border"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(RectangularTemplate::HorizontalBorders
        .border_indices(TemplateBorder::Left)
        .is_err());
}

#[test]
fn subtemplates_group_identical_neighbourhoods() {
    let grid = RectangularTemplate::Qubit.instantiate(2);
    let unique = get_spatially_distinct_3d_subtemplates(&[grid.clone()], 1).expect("one slice");
    let occurrences: usize = unique.values().map(Vec::len).sum();
    assert_eq!(occurrences, 36);
    // The bulk 4x4 region holds two 3x3 patterns, the remaining cells touch a side.
    assert!(unique.len() < 36);
    for (subtemplate, cells) in &unique {
        assert_eq!(subtemplate.slices().len(), 1);
        for (row, col) in cells {
            assert_eq!(subtemplate.last_centre(), grid.get(*row, *col));
        }
    }
}

#[test]
fn subtemplates_skip_empty_centres_and_require_equal_shapes() {
    let mut sparse = PlaquetteGrid::zeros(3, 3);
    sparse.set(1, 1, 4);
    let unique = get_spatially_distinct_3d_subtemplates(&[sparse.clone(), sparse], 2)
        .expect("same shapes");
    assert_eq!(unique.len(), 1);
    let (subtemplate, cells) = unique.iter().next().expect("one entry");
    assert_eq!(cells, &vec![(1, 1)]);
    assert_eq!(subtemplate.slices()[0].rows(), 5);

    let err = get_spatially_distinct_3d_subtemplates(
        &[PlaquetteGrid::zeros(2, 2), PlaquetteGrid::zeros(3, 3)],
        1,
    )
    .expect_err("different shapes");
    assert_eq!(err.code(), "shape-mismatch");
    assert!(get_spatially_distinct_3d_subtemplates(&[], 1).is_err());
}
