//! The nullability sub-lattice.
//!
//! Reference-typed values carry one of three points describing what is
//! provable about null-ness at a program point:
//!
//! ```text
//!          MaybeNull
//!          /       \
//!   DefinitelyNull  DefinitelyNotNull
//! ```
//!
//! There is no bottom point: a refinement that would contradict itself
//! (provably null and provably not null at once) degrades the whole type
//! element to `TypeElement::Bottom`, which is why [`Nullability::meet`]
//! returns an `Option`.

use serde::{Deserialize, Serialize};

/// What is provable about a reference value's null-ness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nullability {
    /// The value is null on every path reaching this point.
    DefinitelyNull,
    /// The value is non-null on every path reaching this point.
    DefinitelyNotNull,
    /// Neither fact is provable.
    MaybeNull,
}

impl Nullability {
    /// Least upper bound: unequal points always merge to [`MaybeNull`].
    ///
    /// [`MaybeNull`]: Nullability::MaybeNull
    pub fn join(self, other: Nullability) -> Nullability {
        if self == other {
            self
        } else {
            Nullability::MaybeNull
        }
    }

    /// Greatest lower bound, or `None` when the two points contradict each
    /// other (definitely null against definitely not null).
    pub fn meet(self, other: Nullability) -> Option<Nullability> {
        use Nullability::*;
        match (self, other) {
            // MaybeNull is the identity element for meet.
            (MaybeNull, x) | (x, MaybeNull) => Some(x),
            (DefinitelyNull, DefinitelyNull) => Some(DefinitelyNull),
            (DefinitelyNotNull, DefinitelyNotNull) => Some(DefinitelyNotNull),
            (DefinitelyNull, DefinitelyNotNull) | (DefinitelyNotNull, DefinitelyNull) => None,
        }
    }

    /// Partial order derived from `join`: `a ⊑ b` iff `join(a, b) == b`.
    pub fn less_than_or_equal(self, other: Nullability) -> bool {
        self.join(other) == other
    }

    pub fn is_definitely_null(self) -> bool {
        self == Nullability::DefinitelyNull
    }

    pub fn is_definitely_not_null(self) -> bool {
        self == Nullability::DefinitelyNotNull
    }

    pub fn is_maybe_null(self) -> bool {
        self == Nullability::MaybeNull
    }

    /// True unless the value is provably non-null.
    pub fn is_nullable(self) -> bool {
        self != Nullability::DefinitelyNotNull
    }
}

impl std::fmt::Display for Nullability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nullability::DefinitelyNull => write!(f, "@Null"),
            Nullability::DefinitelyNotNull => write!(f, "@NotNull"),
            Nullability::MaybeNull => write!(f, "@Nullable"),
        }
    }
}
