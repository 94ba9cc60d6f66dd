//! Tuning constants for the widening machinery.
//!
//! These are behavioral knobs, not correctness knobs: changing them affects
//! how much the solver allocates and how early a runaway analysis trips a
//! debug assertion, never which types it computes.

/// Inline capacity of the superclass-chain buffer used by the class least
/// upper bound. Chains at most this long live entirely on the stack.
pub const CLASS_CHAIN_INLINE_CAPACITY: usize = 10;

/// Chain length past which the first-walk buffer is promoted to a hash set.
/// Linear scans beat hashing below this size; real-world hierarchies rarely
/// get anywhere near it.
pub const CLASS_CHAIN_SET_PROMOTION_THRESHOLD: usize = 20;

/// Debug-build ceiling on worklist activity, expressed as a multiple of the
/// method's value count. A monotone analysis re-enqueues each value a small
/// number of times; blowing through this bound means a transfer function is
/// oscillating.
pub const WORKLIST_GROWTH_SANITY_FACTOR: usize = 256;
