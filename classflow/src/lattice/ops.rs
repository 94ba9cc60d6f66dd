//! Join, derived ordering and meet over the type lattice.
//!
//! `join` is the authoritative operation; the partial order is read off it
//! (`a ⊑ b` iff `a == b` or `join(a, b) == b`) so the two can never drift
//! apart. Meet exists only in the one form the analysis needs, removing
//! null from a reference type.
//!
//! Reference joins decompose per dimension: the class anchors meet along
//! the superclass chain, the interface sets through their colored walk, the
//! nullabilities in their own three-point lattice. Per-file sessions skip
//! the hierarchy entirely and collapse distinct references to the root.

use crate::hierarchy::lub::compute_least_upper_bound_of_classes;
use crate::lattice::interfaces::compute_least_upper_bound_of_interfaces;
use crate::lattice::nullability::Nullability;
use crate::lattice::types::{ArrayType, ClassType, PrimitiveType, TypeElement};
use crate::session::Session;

impl TypeElement {
    /// Least upper bound of two lattice elements.
    pub fn join(&self, session: &Session, other: &TypeElement) -> TypeElement {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (TypeElement::Bottom, _) => other.clone(),
            (_, TypeElement::Bottom) => self.clone(),
            (TypeElement::Top, _) | (_, TypeElement::Top) => TypeElement::Top,
            (TypeElement::Primitive(a), TypeElement::Primitive(b)) => join_primitives(*a, *b),
            // Primitive against reference: no common value exists.
            (TypeElement::Primitive(_), _) | (_, TypeElement::Primitive(_)) => TypeElement::Top,
            (TypeElement::Null, _) => other.join_nullability(session, Nullability::DefinitelyNull),
            (_, TypeElement::Null) => self.join_nullability(session, Nullability::DefinitelyNull),
            (TypeElement::Array(a), TypeElement::Array(b)) => join_arrays(session, a, b),
            (TypeElement::Class(c), TypeElement::Array(a))
            | (TypeElement::Array(a), TypeElement::Class(c)) => {
                join_class_and_array(session, c, a)
            }
            (TypeElement::Class(a), TypeElement::Class(b)) => join_classes(session, a, b),
        }
    }

    /// Fold of [`TypeElement::join`] over any number of elements, starting
    /// from `bottom`.
    pub fn join_many<'a, I>(session: &Session, elements: I) -> TypeElement
    where
        I: IntoIterator<Item = &'a TypeElement>,
    {
        elements
            .into_iter()
            .fold(TypeElement::Bottom, |acc, e| acc.join(session, e))
    }

    pub fn less_than_or_equal(&self, session: &Session, other: &TypeElement) -> bool {
        self == other || self.join(session, other) == *other
    }

    pub fn strictly_less_than(&self, session: &Session, other: &TypeElement) -> bool {
        self != other && self.join(session, other) == *other
    }

    /// Structural equality with top-level nullability masked out. Array
    /// members are stored maybe-null, so no recursion is needed.
    pub fn equal_up_to_nullability(&self, other: &TypeElement) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (TypeElement::Class(a), TypeElement::Class(b)) => {
                a.class_ref() == b.class_ref() && a.interfaces() == b.interfaces()
            }
            (TypeElement::Array(a), TypeElement::Array(b)) => a.member() == b.member(),
            _ => false,
        }
    }

    pub fn less_than_or_equal_up_to_nullability(
        &self,
        session: &Session,
        other: &TypeElement,
    ) -> bool {
        self.as_maybe_null(session)
            .less_than_or_equal(session, &other.as_maybe_null(session))
    }

    /// Meet with the set of non-null values: `null` collapses to `bottom`,
    /// references lose their null case, everything else is unaffected.
    pub fn as_meet_with_not_null(&self, session: &Session) -> TypeElement {
        match self {
            TypeElement::Null => TypeElement::Bottom,
            TypeElement::Class(_) | TypeElement::Array(_) => {
                match self.nullability().meet(Nullability::DefinitelyNotNull) {
                    Some(n) => self.get_or_create_variant(session, n),
                    None => TypeElement::Bottom,
                }
            }
            _ => self.clone(),
        }
    }
}

fn join_primitives(a: PrimitiveType, b: PrimitiveType) -> TypeElement {
    debug_assert_ne!(a, b);
    if a.is_single_slot() && b.is_single_slot() {
        TypeElement::SINGLE
    } else if a.is_wide_slot() && b.is_wide_slot() {
        TypeElement::WIDE
    } else {
        TypeElement::Top
    }
}

fn join_arrays(session: &Session, a: &ArrayType, b: &ArrayType) -> TypeElement {
    let nullability = a.nullability().join(b.nullability());
    let a_member = a.member();
    let b_member = b.member();
    if a_member == b_member {
        return TypeElement::Array(session.intern_array_type(a_member.clone(), nullability));
    }
    if a_member.is_primitive() || b_member.is_primitive() {
        // Distinct primitive elements (or a primitive against a reference)
        // share no array supertype, only the root plus the array marker
        // interfaces.
        return object_with_array_interfaces(session, nullability);
    }
    let member = a_member.join(session, b_member);
    TypeElement::array_type(session, member, nullability)
}

fn join_class_and_array(session: &Session, c: &ClassType, a: &ArrayType) -> TypeElement {
    let nullability = c.nullability().join(a.nullability());
    let interfaces = compute_least_upper_bound_of_interfaces(
        session,
        c.interfaces(),
        session.array_interfaces(),
    );
    TypeElement::Class(session.intern_class_type(
        session.graph().object(),
        interfaces,
        nullability,
    ))
}

fn join_classes(session: &Session, a: &ClassType, b: &ClassType) -> TypeElement {
    let nullability = a.nullability().join(b.nullability());
    if !session.whole_program() {
        // Per-file elements never carry interface sets, see class_type.
        debug_assert!(a.interfaces().is_empty() && b.interfaces().is_empty());
        let anchor = if a.class_ref() == b.class_ref() {
            a.class_ref()
        } else {
            session.graph().object()
        };
        return TypeElement::Class(session.intern_class_type(
            anchor,
            a.interfaces().clone(),
            nullability,
        ));
    }
    let anchor =
        compute_least_upper_bound_of_classes(session.graph(), a.class_ref(), b.class_ref());
    let interfaces = if a.interfaces() == b.interfaces() {
        a.interfaces().clone()
    } else {
        compute_least_upper_bound_of_interfaces(session, a.interfaces(), b.interfaces())
    };
    TypeElement::Class(session.intern_class_type(anchor, interfaces, nullability))
}

fn object_with_array_interfaces(session: &Session, nullability: Nullability) -> TypeElement {
    TypeElement::Class(session.intern_class_type(
        session.graph().object(),
        session.array_interfaces().clone(),
        nullability,
    ))
}
