//! Flow analyses over method bodies.
//!
//! # Module structure
//!
//! - [`type_analysis`]: the widening/narrowing worklist solver
//! - [`phi_repair`]: phi cycle recovery after a class mapping rewrite

pub mod phi_repair;
pub mod type_analysis;

pub use phi_repair::repair_phi_cycles;
pub use type_analysis::{is_at_fixed_point, TypeAnalysis};
