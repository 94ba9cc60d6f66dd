//! Lattice laws checked over a pooled set of elements.

mod common;
use common::*;

use classflow::{Nullability, PrimitiveType, Session, TypeElement, TypeRef};
use once_cell::sync::Lazy;
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 512;

static SESSION: Lazy<Session> = Lazy::new(sample_session);

/// Draw elements from a fixed pool instead of generating structures:
/// the interesting cases are the kind combinations, and a pool keeps
/// shrinking readable.
fn element_pool() -> Vec<TypeElement> {
    let session = &*SESSION;
    let class = |name: &str, nullability: Nullability| {
        TypeElement::class_type(session, named(session, name), nullability)
    };
    let array = |base: TypeRef, dimensions: usize, nullability: Nullability| {
        let mut ty = base;
        for _ in 0..dimensions {
            ty = TypeRef::array(ty);
        }
        TypeElement::from_type_ref(session, &ty, nullability)
    };

    let mut pool = vec![
        TypeElement::BOTTOM,
        TypeElement::TOP,
        TypeElement::NULL,
        TypeElement::INT,
        TypeElement::FLOAT,
        TypeElement::CHAR,
        TypeElement::LONG,
        TypeElement::DOUBLE,
        TypeElement::SINGLE,
        TypeElement::WIDE,
    ];
    for nullability in [Nullability::DefinitelyNotNull, Nullability::MaybeNull] {
        for name in [
            "java.lang.Object",
            "java.lang.String",
            "java.lang.StringBuffer",
            "java.lang.Throwable",
            "java.lang.Exception",
            "java.lang.RuntimeException",
            "java.util.ArrayList",
            "java.util.LinkedList",
            "java.util.List",
            "java.util.Collection",
        ] {
            pool.push(class(name, nullability));
        }
    }
    pool.push(class("java.lang.String", Nullability::DefinitelyNull));
    pool.push(array(
        TypeRef::Primitive(PrimitiveType::Int),
        1,
        Nullability::DefinitelyNotNull,
    ));
    pool.push(array(
        TypeRef::Primitive(PrimitiveType::Int),
        2,
        Nullability::MaybeNull,
    ));
    pool.push(array(
        TypeRef::class(named(session, "java.lang.String")),
        1,
        Nullability::MaybeNull,
    ));
    pool.push(array(
        TypeRef::class(named(session, "java.lang.Exception")),
        2,
        Nullability::DefinitelyNotNull,
    ));
    pool
}

fn arb_element() -> impl Strategy<Value = TypeElement> {
    prop::sample::select(element_pool())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn join_is_commutative(a in arb_element(), b in arb_element()) {
        let session = &*SESSION;
        prop_assert_eq!(a.join(session, &b), b.join(session, &a));
    }

    #[test]
    fn join_is_associative(a in arb_element(), b in arb_element(), c in arb_element()) {
        let session = &*SESSION;
        prop_assert_eq!(
            a.join(session, &b).join(session, &c),
            a.join(session, &b.join(session, &c))
        );
    }

    #[test]
    fn join_is_idempotent(a in arb_element()) {
        let session = &*SESSION;
        prop_assert_eq!(a.join(session, &a), a);
    }

    #[test]
    fn bottom_is_the_join_identity(a in arb_element()) {
        let session = &*SESSION;
        prop_assert_eq!(TypeElement::BOTTOM.join(session, &a), a.clone());
        prop_assert_eq!(a.join(session, &TypeElement::BOTTOM), a);
    }

    #[test]
    fn top_absorbs_every_join(a in arb_element()) {
        let session = &*SESSION;
        prop_assert_eq!(TypeElement::TOP.join(session, &a), TypeElement::TOP);
        prop_assert_eq!(a.join(session, &TypeElement::TOP), TypeElement::TOP);
    }

    #[test]
    fn join_is_an_upper_bound_of_both_sides(a in arb_element(), b in arb_element()) {
        let session = &*SESSION;
        let joined = a.join(session, &b);
        prop_assert!(a.less_than_or_equal(session, &joined));
        prop_assert!(b.less_than_or_equal(session, &joined));
    }

    #[test]
    fn ordering_chains_through_repeated_joins(
        a in arb_element(),
        x in arb_element(),
        y in arb_element(),
    ) {
        let session = &*SESSION;
        let b = a.join(session, &x);
        let c = b.join(session, &y);
        prop_assert!(a.less_than_or_equal(session, &b));
        prop_assert!(b.less_than_or_equal(session, &c));
        prop_assert!(a.less_than_or_equal(session, &c));
    }

    #[test]
    fn masking_nullability_preserves_the_shape(a in arb_element()) {
        let session = &*SESSION;
        let masked = a.as_maybe_null(session);
        prop_assert!(a.equal_up_to_nullability(&masked));
        prop_assert!(a.less_than_or_equal_up_to_nullability(session, &masked));
        prop_assert!(masked.less_than_or_equal_up_to_nullability(session, &a));
    }

    #[test]
    fn meet_with_not_null_moves_down_and_is_idempotent(a in arb_element()) {
        let session = &*SESSION;
        let met = a.as_meet_with_not_null(session);
        prop_assert!(met.less_than_or_equal(session, &a));
        prop_assert_eq!(met.as_meet_with_not_null(session), met.clone());
        if met.is_reference() {
            prop_assert_eq!(met.nullability(), Nullability::DefinitelyNotNull);
        }
    }
}
