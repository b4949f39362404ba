//! Centralized limits and thresholds.
//!
//! The constants here bound recursive queries, the iterative algorithms
//! (worklists and hierarchy walks) and pre-allocation.

// =============================================================================
// Recursion Limits
// =============================================================================

/// Maximum nesting of one assignability query.
pub const MAX_ASSIGNABILITY_DEPTH: u32 = 100;

/// Maximum number of sub-queries one top-level assignability query may run.
///
/// Type arguments and bounds fan out, so a query over deeply parameterized
/// types can revisit the same pairs many times without ever nesting deeply.
pub const MAX_ASSIGNABILITY_ITERATIONS: u32 = 100_000;

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Maximum number of worklist steps the constraint solver performs before it
/// stops propagating and moves on to verification.
///
/// Every step either settles an edge or narrows a free variable's estimate, and
/// estimates only move up a finite supertype lattice, so well-formed graphs
/// converge far below this. The cap protects against pathological inputs such
/// as thousands of mutually dependent free variables.
pub const MAX_PROPAGATION_STEPS: usize = 200_000;

/// Maximum number of types visited by a single supertype-closure walk.
///
/// Class hierarchies in real programs have a handful of levels; the walk also
/// follows substituted generic supertypes, so a malformed descriptor set with
/// expanding parameterizations (`class A<T> extends A<List<T>>`) would
/// otherwise never terminate.
pub const MAX_SUPERTYPE_WALK: usize = 4_096;

/// Maximum nesting of array dimensions accepted from descriptors.
///
/// The JVM limits arrays to 255 dimensions.
pub const MAX_ARRAY_DIMENSIONS: u32 = 255;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Inline capacity for short type lists (type arguments, bounds, direct
/// supertypes) before they spill to the heap.
pub const TYPE_LIST_INLINE: usize = 4;
