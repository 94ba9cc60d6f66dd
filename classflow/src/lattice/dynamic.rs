//! Dynamic types: what a value can be at runtime, as opposed to the static
//! lattice element its definition guarantees.
//!
//! A dynamic type is an interval. The upper bound is a [`TypeElement`] the
//! value is known to stay within; the optional lower bound promises the
//! value is at least that specific, and `lower == upper` means the runtime
//! type is known exactly. Degenerate intervals collapse into canonical
//! carriers, so there is exactly one representation per fact:
//!
//! ```text
//!   upper bottom            -> Bottom       (no value)
//!   upper top               -> Unknown      (no information)
//!   upper null              -> ExactlyNull
//!   "not null, type untracked" -> NotNull
//!   anything else           -> Bounded { upper, lower }
//! ```

use crate::hierarchy::graph::ClassRef;
use crate::lattice::nullability::Nullability;
use crate::lattice::types::TypeElement;
use crate::session::Session;

/// Bounds of a non-degenerate dynamic type. Both bounds carry the same
/// nullability, and the lower bound lies within the upper.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DynamicBounds {
    upper: TypeElement,
    lower: Option<TypeElement>,
}

impl DynamicBounds {
    pub fn upper(&self) -> &TypeElement {
        &self.upper
    }

    pub fn lower(&self) -> Option<&TypeElement> {
        self.lower.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DynamicType {
    Bottom,
    Unknown,
    /// Definitely not null, with no usable type bound.
    NotNull,
    ExactlyNull,
    Bounded(DynamicBounds),
}

impl DynamicType {
    /// Dynamic type of a value about which only its static type is known.
    ///
    /// A class type whose anchor is effectively final already pins the
    /// runtime type down, so it canonicalizes to its exact form.
    pub fn create(session: &Session, static_type: &TypeElement) -> DynamicType {
        let final_class = static_type
            .as_class()
            .is_some_and(|c| session.graph().is_effectively_final(c.class_ref()));
        if final_class {
            DynamicType::exact(session, static_type)
        } else {
            DynamicType::make(session, static_type.clone(), None)
        }
    }

    /// Dynamic type of a value whose runtime type is exactly `element`.
    pub fn exact(session: &Session, element: &TypeElement) -> DynamicType {
        match element {
            TypeElement::Bottom | TypeElement::Top | TypeElement::Null => {
                DynamicType::make(session, element.clone(), None)
            }
            _ => DynamicType::make(session, element.clone(), Some(element.clone())),
        }
    }

    /// General constructor; degenerate uppers collapse to their canonical
    /// carrier and drop the lower bound.
    pub fn with_bounds(
        session: &Session,
        upper: TypeElement,
        lower: Option<TypeElement>,
    ) -> DynamicType {
        DynamicType::make(session, upper, lower)
    }

    fn make(session: &Session, upper: TypeElement, lower: Option<TypeElement>) -> DynamicType {
        match upper {
            TypeElement::Bottom => DynamicType::Bottom,
            TypeElement::Top => DynamicType::Unknown,
            TypeElement::Null => DynamicType::ExactlyNull,
            _ => {
                if let Some(l) = &lower {
                    debug_assert!(
                        l.less_than_or_equal_up_to_nullability(session, &upper),
                        "lower bound outside the upper bound"
                    );
                    debug_assert_eq!(l.nullability(), upper.nullability());
                }
                DynamicType::Bounded(DynamicBounds { upper, lower })
            }
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, DynamicType::Bottom)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DynamicType::Unknown)
    }

    pub fn is_not_null(&self) -> bool {
        matches!(self, DynamicType::NotNull)
    }

    pub fn is_exactly_null(&self) -> bool {
        matches!(self, DynamicType::ExactlyNull)
    }

    pub fn as_bounds(&self) -> Option<&DynamicBounds> {
        match self {
            DynamicType::Bounded(b) => Some(b),
            _ => None,
        }
    }

    /// True when the runtime type is pinned down to one element.
    pub fn is_exact(&self) -> bool {
        match self {
            DynamicType::ExactlyNull => true,
            DynamicType::Bounded(b) => b.lower.as_ref() == Some(&b.upper),
            _ => false,
        }
    }

    /// Upper bound as a lattice element, given the static type of the
    /// value this dynamic type describes.
    pub fn dynamic_upper_bound(
        &self,
        session: &Session,
        static_type: &TypeElement,
    ) -> TypeElement {
        match self {
            DynamicType::Bottom => TypeElement::Bottom,
            DynamicType::Unknown => static_type.clone(),
            DynamicType::NotNull => static_type.as_meet_with_not_null(session),
            DynamicType::ExactlyNull => TypeElement::NULL,
            DynamicType::Bounded(b) => b.upper.clone(),
        }
    }

    pub fn dynamic_lower_bound(&self) -> Option<&TypeElement> {
        match self {
            DynamicType::Bounded(b) => b.lower.as_ref(),
            _ => None,
        }
    }

    /// Least upper bound of two dynamic types.
    pub fn join(&self, session: &Session, other: &DynamicType) -> DynamicType {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (DynamicType::Bottom, _) => other.clone(),
            (_, DynamicType::Bottom) => self.clone(),
            (DynamicType::Unknown, _) | (_, DynamicType::Unknown) => DynamicType::Unknown,
            (DynamicType::NotNull, _) => join_not_null(other),
            (_, DynamicType::NotNull) => join_not_null(self),
            (DynamicType::ExactlyNull, DynamicType::ExactlyNull) => DynamicType::ExactlyNull,
            (DynamicType::ExactlyNull, DynamicType::Bounded(b))
            | (DynamicType::Bounded(b), DynamicType::ExactlyNull) => {
                // Either null or within the bounds: both bounds pick up the
                // null case.
                let upper = b.upper.join_nullability(session, Nullability::DefinitelyNull);
                let lower = b
                    .lower
                    .as_ref()
                    .map(|l| l.join_nullability(session, Nullability::DefinitelyNull));
                DynamicType::make(session, upper, lower)
            }
            (DynamicType::Bounded(a), DynamicType::Bounded(b)) => {
                if self.strictly_less_than(session, other) {
                    return other.clone();
                }
                if other.strictly_less_than(session, self) {
                    return self.clone();
                }
                // Incomparable: join the uppers, the lower bounds cannot be
                // combined and are dropped.
                DynamicType::make(session, a.upper.join(session, &b.upper), None)
            }
        }
    }

    /// Partial order used by `join` to decide whether one operand subsumes
    /// the other. Bounded types compare only when their upper bounds agree;
    /// a wider (or absent) lower bound is the bigger type.
    pub fn strictly_less_than(&self, session: &Session, other: &DynamicType) -> bool {
        if self == other {
            return false;
        }
        match (self, other) {
            (DynamicType::Bottom, _) => true,
            (_, DynamicType::Bottom) => false,
            (_, DynamicType::Unknown) => true,
            (DynamicType::Unknown, _) => false,
            (DynamicType::Bounded(a), DynamicType::Bounded(b)) => {
                if a.upper != b.upper {
                    return false;
                }
                match (&a.lower, &b.lower) {
                    (Some(_), None) => true,
                    (Some(l1), Some(l2)) => l2.strictly_less_than(session, l1),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Rewrites class refs in the bounds through `mapping`, preserving the
    /// value untouched (and its interned instances) under an identity
    /// mapping.
    pub fn rewritten_with<F>(&self, session: &Session, mapping: &F) -> DynamicType
    where
        F: Fn(ClassRef) -> ClassRef,
    {
        match self {
            DynamicType::Bounded(b) => {
                let upper = b.upper.fixup_class_refs(session, mapping);
                let lower = b
                    .lower
                    .as_ref()
                    .map(|l| l.fixup_class_refs(session, mapping));
                let unchanged = upper.ptr_eq(&b.upper)
                    && match (&lower, &b.lower) {
                        (Some(new), Some(old)) => new.ptr_eq(old),
                        (None, None) => true,
                        _ => false,
                    };
                if unchanged {
                    self.clone()
                } else {
                    DynamicType::make(session, upper, lower)
                }
            }
            _ => self.clone(),
        }
    }
}

fn join_not_null(other: &DynamicType) -> DynamicType {
    let other_definitely_not_null = match other {
        DynamicType::NotNull => true,
        DynamicType::Bounded(b) => b.upper.nullability().is_definitely_not_null(),
        _ => false,
    };
    if other_definitely_not_null {
        DynamicType::NotNull
    } else {
        DynamicType::Unknown
    }
}
