//! The class universe: interned class refs, their definitions, and the
//! superclass walk behind reference joins.
//!
//! # Module structure
//!
//! - `graph`: [`ClassGraph`] and its builder, subtyping and gap queries
//! - `lub`: least upper bound of two classes along the superclass chain

pub mod graph;
pub mod lub;

pub use graph::{ClassDef, ClassGraph, ClassGraphBuilder, ClassRef, WellKnownRefs};
pub use lub::compute_least_upper_bound_of_classes;
