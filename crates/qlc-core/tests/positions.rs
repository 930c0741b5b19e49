use qlc_core::{Basis, BlockPosition3D, Direction3D, SchemaVersion};

#[test]
fn neighbouring_positions_give_their_direction() {
    let origin = BlockPosition3D::new(0, 0, 0);
    let above = origin.shift_in_direction(Direction3D::Z, 1);
    assert_eq!(
        Direction3D::from_neighbouring_positions(&origin, &above).expect("neighbours"),
        Direction3D::Z
    );
    let right = origin.shift_in_direction(Direction3D::X, 1);
    assert_eq!(
        Direction3D::from_neighbouring_positions(&origin, &right).expect("neighbours"),
        Direction3D::X
    );
    let far = BlockPosition3D::new(2, 0, 0);
    assert!(Direction3D::from_neighbouring_positions(&origin, &far).is_err());
}

#[test]
fn basis_flips() {
    assert_eq!(Basis::X.flipped(), Basis::Z);
    assert_eq!(Basis::Z.flipped().flipped(), Basis::Z);
}

#[test]
fn schema_compatibility_requires_same_major() {
    let current = SchemaVersion::new(1, 2, 0);
    assert!(current.is_compatible_with(&SchemaVersion::new(1, 1, 7)));
    assert!(!current.is_compatible_with(&SchemaVersion::new(2, 0, 0)));
    assert!(!current.is_compatible_with(&SchemaVersion::new(1, 3, 0)));
    assert_eq!(SchemaVersion::default().to_string(), "1.0.0");
}
