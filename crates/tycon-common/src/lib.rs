//! Common types and utilities for the tycon type-constraint engine.
//!
//! This crate provides foundational pieces shared by the solver and the CLI:
//! - String interning (`Atom`, `Interner`)
//! - Centralized limits for propagation and hierarchy walks

// String interning for declaration names, member keys and binding keys
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;
