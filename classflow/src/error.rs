//! Errors reported by the construction-time validators.
//!
//! Analysis itself is infallible: an incomplete class universe is modeled by
//! the `is_based_on_missing_class` predicate, and lattice invariant
//! violations are debug assertions. The fallible surface is limited to
//! building a [`crate::hierarchy::ClassGraph`] and a
//! [`crate::ir::MethodBody`], where a malformed input is a caller bug that
//! should be reported eagerly instead of producing garbage types.

use thiserror::Error;

/// Errors from [`crate::hierarchy::ClassGraphBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The same class name was defined twice.
    #[error("duplicate definition of class '{name}'")]
    DuplicateClass { name: String },
}

/// Errors from [`crate::ir::MethodBodyBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    /// An instruction was appended after the block's terminator.
    #[error("block b{block} is already terminated")]
    BlockTerminated { block: u32 },

    /// A block reached `finish` without a terminator.
    #[error("block b{block} has no terminator")]
    MissingTerminator { block: u32 },

    /// A branch targets a block id that was never created.
    #[error("branch in block b{block} targets unknown block b{target}")]
    UnknownBlock { block: u32, target: u32 },

    /// An operand refers to a value id that was never created.
    #[error("unknown value v{value}")]
    UnknownValue { value: u32 },

    /// `set_phi_operands` was called on a value not defined by a phi.
    #[error("value v{value} is not a phi")]
    NotAPhi { value: u32 },

    /// An instruction received the wrong number of operands.
    #[error("{kind} takes {expected} operand(s), got {found}")]
    OperandCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// A phi's operand count does not match its block's predecessor count.
    #[error("phi in block b{block} has {operands} operand(s) but the block has {predecessors} predecessor(s)")]
    PhiArity {
        block: u32,
        operands: usize,
        predecessors: usize,
    },

    /// A phi placeholder was never given operands before `finish`.
    #[error("phi in block b{block} was never given operands")]
    UnsetPhi { block: u32 },
}
