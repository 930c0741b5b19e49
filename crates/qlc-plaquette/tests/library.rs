use qlc_circuit::GridQubit;
use qlc_core::Basis;
use qlc_circuit::Gate;
use qlc_plaquette::{
    css_plaquette, css_plaquette_on, generate_circuit, patch_plaquettes, surface_code_plaquettes,
    Corner, PatchBases, PatchLayout, RectangularTemplate, RoundKind,
};

fn data_count(plaquettes: &qlc_plaquette::Plaquettes, index: usize) -> usize {
    plaquettes.get(index).data_qubits().len()
}

#[test]
fn css_plaquette_round_has_six_moments() {
    let plaquette = css_plaquette(Basis::Z, &Corner::ALL, RoundKind::Memory).expect("plaquette");
    assert_eq!(plaquette.circuit().num_moments(), 6);
    assert_eq!(plaquette.num_measurements(), 1);
    assert_eq!(plaquette.qubits().len(), 5);
    assert_eq!(plaquette.name(), "css-Z-TL.TR.BL.BR-memory");
    assert_eq!(plaquette.debug_basis(), Some(Basis::Z));
}

#[test]
fn half_plaquettes_skip_missing_corners() {
    let plaquette = css_plaquette(
        Basis::X,
        &[Corner::BottomRight, Corner::BottomLeft],
        RoundKind::Measurement(Basis::Z),
    )
    .expect("plaquette");
    let moments = plaquette.circuit().dense_moments();
    assert!(moments[1].is_empty());
    assert!(moments[2].is_empty());
    assert!(!moments[3].is_empty());
    assert_eq!(plaquette.num_measurements(), 3);
    assert_eq!(
        plaquette.data_qubits(),
        &[GridQubit::new(1, 1), GridQubit::new(-1, 1)]
    );
}

#[test]
fn round_kind_is_part_of_the_name() {
    let init = css_plaquette(Basis::X, &Corner::ALL, RoundKind::Initialization(Basis::Z))
        .expect("init");
    let memory = css_plaquette(Basis::X, &Corner::ALL, RoundKind::Memory).expect("memory");
    assert_ne!(init.name(), memory.name());
}

#[test]
fn distance_three_memory_round() {
    let plaquettes =
        surface_code_plaquettes(RectangularTemplate::Qubit, Basis::Z, RoundKind::Memory)
            .expect("plaquettes");
    let circuit =
        generate_circuit(&RectangularTemplate::Qubit, 1, &plaquettes).expect("no collision");
    assert_eq!(circuit.qubits().len(), 17);
    assert_eq!(circuit.num_measurements(), 8);
    assert_eq!(circuit.num_moments(), 6);
}

#[test]
fn distance_five_measurement_round_measures_every_data_qubit() {
    let plaquettes = surface_code_plaquettes(
        RectangularTemplate::Qubit,
        Basis::X,
        RoundKind::Measurement(Basis::Z),
    )
    .expect("plaquettes");
    let circuit =
        generate_circuit(&RectangularTemplate::Qubit, 2, &plaquettes).expect("no collision");
    // 24 syndrome measurements and 25 data measurements.
    assert_eq!(circuit.num_measurements(), 49);
}

#[test]
fn border_templates_generate_collision_free_rounds() {
    for template in [
        RectangularTemplate::VerticalBorders,
        RectangularTemplate::HorizontalBorders,
    ] {
        let plaquettes = surface_code_plaquettes(template, Basis::Z, RoundKind::Memory)
            .expect("plaquettes");
        let circuit = generate_circuit(&template, 2, &plaquettes).expect("no collision");
        assert!(circuit.num_measurements() > 0);
    }
}

#[test]
fn hadamard_rounds_rotate_owned_data_only() {
    let plaquette = css_plaquette_on(
        Basis::X,
        &Corner::ALL,
        &[Corner::TopRight, Corner::BottomRight],
        RoundKind::Hadamard,
    )
    .expect("plaquette");
    let last = &plaquette.circuit().dense_moments()[5];
    let rotated: Vec<GridQubit> = last
        .instructions()
        .iter()
        .filter(|instruction| instruction.gate == Gate::H)
        .map(|instruction| instruction.qubits[0])
        .collect();
    assert_eq!(rotated, vec![GridQubit::new(1, -1), GridQubit::new(1, 1)]);
    assert_eq!(plaquette.num_measurements(), 1);
    assert_eq!(plaquette.name(), "css-X-TL.TR.BL.BR-hadamard@TR.BR");
}

#[test]
fn ownership_does_not_rename_memory_rounds() {
    let owned = css_plaquette_on(Basis::Z, &Corner::ALL, &[Corner::TopLeft], RoundKind::Memory)
        .expect("plaquette");
    let whole = css_plaquette(Basis::Z, &Corner::ALL, RoundKind::Memory).expect("plaquette");
    assert_eq!(owned.name(), whole.name());
}

#[test]
fn pipe_plaquettes_leave_cube_data_to_the_cubes() {
    let plaquettes = surface_code_plaquettes(
        RectangularTemplate::VerticalBorders,
        Basis::Z,
        RoundKind::Measurement(Basis::Z),
    )
    .expect("plaquettes");
    // First column bulk cell: syndrome plus the two data qubits of its right side.
    assert_eq!(plaquettes.get(5).num_measurements(), 3);
    assert_eq!(plaquettes.get(7).num_measurements(), 3);
    // Wall halves only own the single interior data qubit.
    assert_eq!(plaquettes.get(2).num_measurements(), 2);
}

#[test]
fn oriented_layout_matches_the_square_patch() {
    let layout = PatchLayout::new(PatchBases::oriented(Basis::X));
    for template in [
        RectangularTemplate::Qubit,
        RectangularTemplate::VerticalBorders,
        RectangularTemplate::HorizontalBorders,
    ] {
        let direct = surface_code_plaquettes(template, Basis::X, RoundKind::Memory)
            .expect("plaquettes");
        let through_layout =
            patch_plaquettes(template, &layout, RoundKind::Memory).expect("plaquettes");
        assert_eq!(direct.names(), through_layout.names());
    }
}

#[test]
fn rotated_checkerboard_moves_the_walls() {
    let bases = PatchBases {
        even: Basis::Z,
        vertical_walls: Basis::X,
        horizontal_walls: Basis::Z,
    };
    let plaquettes = patch_plaquettes(
        RectangularTemplate::Qubit,
        &PatchLayout::new(bases),
        RoundKind::Memory,
    )
    .expect("plaquettes");
    let indices: Vec<usize> = plaquettes.iter().map(|(index, _)| index).collect();
    assert_eq!(indices, vec![6, 7, 9, 10, 12, 13]);
    assert_eq!(plaquettes.get(6).debug_basis(), Some(Basis::Z));
    assert_eq!(plaquettes.get(9).debug_basis(), Some(Basis::Z));
    let circuit =
        generate_circuit(&RectangularTemplate::Qubit, 1, &plaquettes).expect("no collision");
    assert_eq!(circuit.num_measurements(), 8);
}

#[test]
fn spatial_cubes_cut_corners_between_equal_walls() {
    let bases = PatchBases {
        even: Basis::Z,
        vertical_walls: Basis::Z,
        horizontal_walls: Basis::Z,
    };
    let plaquettes = patch_plaquettes(
        RectangularTemplate::SpatialQubit,
        &PatchLayout::new(bases),
        RoundKind::Memory,
    )
    .expect("plaquettes");
    assert_eq!(data_count(&plaquettes, 15), 3);
    assert_eq!(data_count(&plaquettes, 18), 3);
    assert_eq!(data_count(&plaquettes, 16), 4);
    assert_eq!(data_count(&plaquettes, 17), 4);
    assert_eq!(plaquettes.get(16).debug_basis(), Some(Basis::X));
    generate_circuit(&RectangularTemplate::SpatialQubit, 2, &plaquettes).expect("no collision");

    let joined = patch_plaquettes(
        RectangularTemplate::SpatialQubit,
        &PatchLayout::new(bases).with_junction(Corner::TopLeft),
        RoundKind::Memory,
    )
    .expect("plaquettes");
    assert_eq!(data_count(&joined, 15), 4);
    assert_eq!(data_count(&joined, 18), 3);
}

#[test]
fn pipe_junctions_follow_the_checkerboard() {
    let bases = PatchBases {
        even: Basis::Z,
        vertical_walls: Basis::Z,
        horizontal_walls: Basis::Z,
    };
    let layout = PatchLayout::new(bases)
        .with_junction(Corner::TopLeft)
        .with_junction(Corner::TopRight);
    let plaquettes = patch_plaquettes(RectangularTemplate::VerticalBorders, &layout, RoundKind::Memory)
        .expect("plaquettes");
    // The odd concave cell measures X and cannot sit between Z walls.
    assert!(!plaquettes.contains(1));
    // The even one becomes a weight-three Z plaquette replacing the wall half.
    assert_eq!(data_count(&plaquettes, 2), 3);
    assert_eq!(plaquettes.get(2).debug_basis(), Some(Basis::Z));
    assert!(!plaquettes.get(2).data_qubits().contains(&Corner::TopLeft.qubit()));
}
