//! Lattice-based value model for type flow.
//!
//! Every SSA value is abstracted by a point in a finite-height lattice that
//! tracks four things at once: the kind of value (primitive width, class,
//! array), how precisely the class is known, the set of interfaces the
//! value implements, and whether it can be null. The analysis in
//! `crate::analysis` moves values up and down this lattice; the modules
//! here define the points and the moves.
//!
//! # Module structure
//!
//! - `nullability`: the three-point null-ness sub-lattice
//! - `types`: lattice elements (`TypeElement`) and declared types (`TypeRef`)
//! - `ops`: join, the derived ordering, and the not-null meet
//! - `interfaces`: interface sets and their least upper bound
//! - `dynamic`: runtime-type intervals layered on top of the static lattice
//! - `widening`: constants controlling the widening machinery

pub mod dynamic;
pub mod interfaces;
pub mod nullability;
pub mod ops;
pub mod types;
pub mod widening;

pub use dynamic::{DynamicBounds, DynamicType};
pub use interfaces::{compute_least_upper_bound_of_interfaces, InterfaceSet};
pub use nullability::Nullability;
pub use types::{ArrayType, ClassType, PrimitiveType, TypeElement, TypeRef};
pub use widening::{
    CLASS_CHAIN_INLINE_CAPACITY, CLASS_CHAIN_SET_PROMOTION_THRESHOLD,
    WORKLIST_GROWTH_SANITY_FACTOR,
};
