//! Type-Constraint Solver
//!
//! This crate implements the type side of the tycon engine:
//!
//! - **Type environment**: interned nominal types (`TypeId` handles) for
//!   primitives, classes, parameterized types, arrays, type variables,
//!   wildcards and captures
//! - **Assignability**: subtyping with generics, wildcard containment and
//!   raw/unchecked conversion
//! - **Constraints**: one variable per program slot, `<=`/`<`/`=` edges and
//!   disjunctions for casts and overloads
//! - **Solver**: union-find (Ena) over equality classes, then worklist
//!   propagation of bounds into free variables
//!
//! Key properties:
//! - O(1) type equality via interning
//! - Cyclic bounds terminate through the recursion guard
//! - Deterministic results: constraints are solved in a canonical order
mod assign;
pub mod builder;
pub mod constraints;
pub mod descriptor;
pub mod environment;
pub mod error;
mod explain;
mod format;
mod hierarchy;
mod query_trace;
mod recursion;
mod solver;
pub mod types;
pub mod variables;
mod widening;

pub use assign::{AssignabilityChecker, can_assign_to};
pub use builder::{ConstraintBuilder, ParameterSite, Site, SiteSource, SlotRef};
pub use constraints::{
    CompositeOr, Constraint, ConstraintGraph, ConstraintOperator, SimpleConstraint,
};
pub use descriptor::{ClassDescriptor, TypeDescriptor, TypeParameterDescriptor};
pub use environment::{EnvironmentConfig, RootPolicy, TypeEnvironment};
pub use error::EnvironmentError;
pub use explain::{AssignabilityFailure, explain_assignability};
pub use format::TypeFormatter;
pub use solver::{
    Assignment, Conflict, ConstraintSolver, SolverOptions, SolverState, UnsatisfiableReport,
    solve,
};
pub use types::{ClassKind, PrimitiveKind, TypeData, TypeId, TypeKind};
pub use variables::{
    ConstraintVariable, ConstraintVariableFactory, SideTable, SiteId, VariableFactory, VariableId,
    VariableSite,
};
