use proptest::prelude::*;
use qlc_core::scale::{gcd, lcm, LinearFunction, Scalable2D, Shape2D};
use qlc_core::QlcError;

#[test]
fn display_renders_affine_form() {
    assert_eq!(LinearFunction::new(2, 1).to_string(), "2k + 1");
    assert_eq!(LinearFunction::new(2, -1).to_string(), "2k - 1");
    assert_eq!(LinearFunction::new(4, 0).to_string(), "4k");
    assert_eq!(LinearFunction::constant(3).to_string(), "3");
}

#[test]
fn compatibility_is_symbolic() {
    let scalable = LinearFunction::new(2, 2);
    let constant = LinearFunction::constant(4);
    assert_eq!(scalable.integer_eval(1), constant.integer_eval(1));
    assert_ne!(scalable, constant);
}

#[test]
fn inexact_division_is_rejected() {
    let err = LinearFunction::new(3, 1)
        .exact_integer_div(2)
        .expect_err("3k + 1 is not divisible by 2");
    match err {
        QlcError::Construction(info) => assert_eq!(info.code, "inexact-division"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        LinearFunction::new(4, 2).exact_integer_div(2).expect("exact"),
        LinearFunction::new(2, 1)
    );
}

#[test]
fn quadratic_products_are_rejected() {
    let lhs = LinearFunction::new(2, -1);
    assert!(lhs.checked_mul(&LinearFunction::new(1, 0)).is_err());
    assert_eq!(
        lhs.checked_mul(&LinearFunction::constant(3)).expect("linear"),
        LinearFunction::new(6, -3)
    );
}

#[test]
fn scalable_2d_evaluates_both_axes() {
    let shape = Scalable2D::new(LinearFunction::new(4, 5), LinearFunction::constant(3));
    assert_eq!(shape.to_shape_2d(2), Shape2D::new(13, 3));
}

#[test]
fn lcm_of_empty_is_one() {
    assert_eq!(lcm(Vec::new()), 1);
    assert_eq!(lcm([4, 6]), 12);
    assert_eq!(gcd(12, 18), 6);
}

proptest! {
    #[test]
    fn addition_is_pointwise(
        a in -20i64..20,
        b in -20i64..20,
        c in -20i64..20,
        d in -20i64..20,
        k in 0u32..64,
    ) {
        let lhs = LinearFunction::new(a, b);
        let rhs = LinearFunction::new(c, d);
        prop_assert_eq!((lhs + rhs).integer_eval(k), lhs.integer_eval(k) + rhs.integer_eval(k));
        prop_assert_eq!((lhs - rhs).integer_eval(k), lhs.integer_eval(k) - rhs.integer_eval(k));
    }

    #[test]
    fn scaling_is_pointwise(a in -20i64..20, b in -20i64..20, factor in -5i64..5, k in 0u32..64) {
        let f = LinearFunction::new(a, b);
        prop_assert_eq!((f * factor).integer_eval(k), f.integer_eval(k) * factor);
    }

    #[test]
    fn lcm_is_divisible_by_every_input(values in proptest::collection::vec(1i64..30, 0..5)) {
        let result = lcm(values.iter().copied());
        for value in values {
            prop_assert_eq!(result % value, 0);
        }
    }
}
