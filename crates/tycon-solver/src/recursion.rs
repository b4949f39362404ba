//! Re-entry and work limits for recursive type queries.
//!
//! Assignability recurses through bounds, type arguments and array
//! components. Malformed bounds (`<T extends U, U extends T>`) can make a
//! query re-enter itself, so every nested pair passes through a
//! [`RecursionGuard`] first. The guard refuses a pair that is already being
//! answered and gives up on a query that nests or fans out past its limits.
//! In debug builds a guard dropped with pairs still entered panics.

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tycon_common::limits::{MAX_ASSIGNABILITY_DEPTH, MAX_ASSIGNABILITY_ITERATIONS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RecursionLimits {
    pub(crate) max_depth: u32,
    pub(crate) max_iterations: u32,
}

impl RecursionLimits {
    pub(crate) const ASSIGNABILITY: RecursionLimits = RecursionLimits {
        max_depth: MAX_ASSIGNABILITY_DEPTH,
        max_iterations: MAX_ASSIGNABILITY_ITERATIONS,
    };
}

/// Outcome of [`RecursionGuard::enter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RecursionResult {
    Entered,
    /// The key is already being answered further up.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    pub(crate) fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

pub(crate) struct RecursionGuard<K: Hash + Eq + Copy> {
    entered: FxHashSet<K>,
    iterations: u32,
    limits: RecursionLimits,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub(crate) fn new(limits: RecursionLimits) -> Self {
        RecursionGuard {
            entered: FxHashSet::default(),
            iterations: 0,
            limits,
            exceeded: false,
        }
    }

    /// Enter `key`. Only [`RecursionResult::Entered`] must be paired with a
    /// [`leave`](Self::leave).
    pub(crate) fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.limits.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.entered.len() >= self.limits.max_depth as usize {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if self.entered.insert(key) {
            RecursionResult::Entered
        } else {
            RecursionResult::Cycle
        }
    }

    pub(crate) fn leave(&mut self, key: K) {
        let removed = self.entered.remove(&key);
        debug_assert!(removed, "RecursionGuard::leave() without a matching enter()");
    }

    /// Whether any `enter` since the last reset hit a limit.
    pub(crate) fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub(crate) fn reset(&mut self) {
        self.entered.clear();
        self.iterations = 0;
        self.exceeded = false;
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.entered.is_empty() {
            panic!("RecursionGuard dropped with {} keys still entered", self.entered.len());
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
