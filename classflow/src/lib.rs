// Prevent accidental debug output in library code.
// Diagnostics go through the collector in diagnostics.rs instead.
#![deny(clippy::print_stderr)]

// Core modules
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod lattice;
pub mod session;

// SSA method bodies and their construction
pub mod ir;

// Worklist solver and phi cycle repair
pub mod analysis;

// Serializable per-method typing summary
pub mod report;

#[cfg(test)]
mod test_fixtures;

pub use analysis::{is_at_fixed_point, repair_phi_cycles, TypeAnalysis};
pub use error::{GraphError, IrError};
pub use hierarchy::{
    compute_least_upper_bound_of_classes, ClassDef, ClassGraph, ClassGraphBuilder, ClassRef,
};
pub use ir::{
    InstrKind, MethodBody, MethodBodyBuilder, MethodSignature, PhiId, ValueDef, ValueId,
};
pub use lattice::{
    compute_least_upper_bound_of_interfaces, DynamicType, InterfaceSet, Nullability, PrimitiveType,
    TypeElement, TypeRef,
};
pub use report::{TypeReport, ValueReport};
pub use session::{Options, Session};
