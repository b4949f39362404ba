//! Assignability: can a value of type `source` be used where `target` is
//! expected?
//!
//! The relation answers reference-type compatibility for the generics model:
//! no numeric widening and no boxing. It is not symmetric, and transitivity is
//! a property of the rules rather than something the algorithm assumes.
//!
//! Rules applied before the per-kind dispatch:
//! - `void` on either side is never assignable, not even to itself.
//! - identical handles are assignable.
//! - `null` is assignable to every reference type.
//!
//! The dispatch is on the target kind first, with the source kind as a
//! sub-dispatch. Sources that stand for "some type below a bound" (type
//! variables, captures, wildcards) succeed when any of their upper bounds
//! succeeds.

use crate::environment::TypeEnvironment;
use crate::query_trace;
use crate::recursion::{RecursionGuard, RecursionLimits, RecursionResult};
use crate::types::{TypeData, TypeId, TypeListBuffer};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Answers assignability queries against one environment.
///
/// Holds the recursion guard for the queries it runs; create one per
/// top-level query or reuse it for a batch.
pub struct AssignabilityChecker<'env> {
    env: &'env TypeEnvironment,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'env> AssignabilityChecker<'env> {
    pub fn new(env: &'env TypeEnvironment) -> Self {
        AssignabilityChecker {
            env,
            guard: RecursionGuard::new(RecursionLimits::ASSIGNABILITY),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_limits(env: &'env TypeEnvironment, limits: RecursionLimits) -> Self {
        AssignabilityChecker {
            env,
            guard: RecursionGuard::new(limits),
        }
    }

    pub fn env(&self) -> &'env TypeEnvironment {
        self.env
    }

    /// Top-level query. Resets the work budget of the guard.
    ///
    /// A query cut off by the recursion limits answers `false`.
    pub fn can_assign(&mut self, source: TypeId, target: TypeId) -> bool {
        self.guard.reset();
        let assignable = self.is_assignable(source, target);
        if self.guard.is_exceeded() {
            debug!(?source, ?target, assignable, "assignability query cut off by recursion limits");
        }
        assignable
    }

    /// Whether the last query hit a recursion limit.
    pub fn was_cut_off(&self) -> bool {
        self.guard.is_exceeded()
    }

    pub(crate) fn reset(&mut self) {
        self.guard.reset();
    }

    pub(crate) fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == TypeId::VOID || target == TypeId::VOID {
            return false;
        }
        if source == target {
            return true;
        }

        let source_data = self.env.lookup(source);
        let target_data = self.env.lookup(target);
        if source == TypeId::NULL {
            return target_data.is_reference();
        }

        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {
                let result = self.dispatch(source, &source_data, target, &target_data);
                self.guard.leave((source, target));
                result
            }
            denied if denied.is_exceeded() => {
                trace!(?source, ?target, ?denied, "assignability recursion limit");
                false
            }
            _ => {
                trace!(?source, ?target, "assignability cycle");
                false
            }
        }
    }

    fn dispatch(
        &mut self,
        source: TypeId,
        source_data: &TypeData,
        target: TypeId,
        target_data: &TypeData,
    ) -> bool {
        match target_data {
            TypeData::Void | TypeData::Null | TypeData::Primitive(_) => false,
            TypeData::Array { .. } => match source_data {
                TypeData::Array { .. } => self.array_to_array(source, target),
                _ => self.through_source_bounds(source, source_data, target),
            },
            TypeData::Standard(_) | TypeData::Parameterized { .. } | TypeData::Raw(_) => {
                match source_data {
                    TypeData::Standard(_)
                    | TypeData::Parameterized { .. }
                    | TypeData::Raw(_)
                    | TypeData::Array { .. } => self.class_like(source, target, target_data),
                    _ => self.through_source_bounds(source, source_data, target),
                }
            }
            TypeData::TypeVariable(param) => {
                let bounds = self.env.type_parameter_bounds(*param);
                if bounds.is_empty() {
                    return self.reaches_top(source, source_data);
                }
                bounds.iter().all(|&bound| self.is_assignable(source, bound))
            }
            TypeData::UnboundWildcard => source_data.is_reference(),
            TypeData::ExtendsWildcard(bound) => self.is_assignable(source, *bound),
            TypeData::SuperWildcard(bound) => match source_data {
                TypeData::SuperWildcard(source_bound) => {
                    self.is_assignable(*bound, *source_bound)
                }
                TypeData::UnboundWildcard | TypeData::ExtendsWildcard(_) => false,
                _ => self.is_assignable(*bound, source),
            },
            TypeData::Capture(capture) => {
                let lower = self
                    .env
                    .capture_info(*capture)
                    .map(|info| info.lower_bound)
                    .unwrap_or(TypeId::NULL);
                if lower == TypeId::NULL {
                    // Only `null` fits below a capture without a lower bound,
                    // and `null` was accepted before dispatch.
                    return false;
                }
                self.is_assignable(source, lower)
            }
        }
    }

    /// Type variables, captures and wildcards as source: any upper bound that
    /// fits makes the source fit.
    fn through_source_bounds(
        &mut self,
        source: TypeId,
        source_data: &TypeData,
        target: TypeId,
    ) -> bool {
        match self.source_upper_bounds(source_data) {
            Some(bounds) if bounds.is_empty() => {
                // Bounded by the top type only.
                match self.env.require_top() {
                    Some(top) => top != source && self.is_assignable(top, target),
                    None => false,
                }
            }
            Some(bounds) => bounds.iter().any(|&bound| self.is_assignable(bound, target)),
            None => false,
        }
    }

    /// Upper bounds of a source that stands for an unknown type. `None` for
    /// kinds that are not bounded stand-ins.
    fn source_upper_bounds(&self, source_data: &TypeData) -> Option<TypeListBuffer> {
        match source_data {
            TypeData::TypeVariable(param) => Some(self.env.type_parameter_bounds(*param)),
            TypeData::Capture(capture) => Some(
                self.env
                    .capture_info(*capture)
                    .map(|info| info.upper_bounds)
                    .unwrap_or_default(),
            ),
            TypeData::ExtendsWildcard(bound) => Some(smallvec::smallvec![*bound]),
            TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => Some(TypeListBuffer::new()),
            _ => None,
        }
    }

    /// Whether a reference source is compatible with "bounded by the top
    /// type". An unknown top type is treated as compatible.
    fn reaches_top(&mut self, source: TypeId, source_data: &TypeData) -> bool {
        if !source_data.is_reference() {
            return false;
        }
        match self.env.require_top() {
            Some(top) => self.is_assignable(source, top),
            None => true,
        }
    }

    /// Arrays recurse through their component types. Primitive components
    /// are not covariant and must match exactly.
    fn array_to_array(&mut self, source: TypeId, target: TypeId) -> bool {
        let (Some(source_component), Some(target_component)) = (
            self.env.component_type(source),
            self.env.component_type(target),
        ) else {
            return false;
        };
        let source_primitive = !self.env.lookup(source_component).is_reference();
        let target_primitive = !self.env.lookup(target_component).is_reference();
        if source_primitive || target_primitive {
            return source_component == target_component;
        }
        self.is_assignable(source_component, target_component)
    }

    /// Class-like and array sources against a class-like target.
    fn class_like(&mut self, source: TypeId, target: TypeId, target_data: &TypeData) -> bool {
        if self.env.is_top(target) {
            return true;
        }
        let Some(decl) = target_data.declaration() else {
            return false;
        };
        let Some(instantiated) = self.env.instantiate_as_supertype(source, decl) else {
            return false;
        };

        let TypeData::Parameterized {
            arguments: target_args,
            ..
        } = target_data
        else {
            // Raw and non-generic targets ignore type arguments.
            return true;
        };

        match self.env.lookup(instantiated) {
            TypeData::Parameterized {
                arguments: source_args,
                ..
            } => {
                let target_args = self.env.type_list(*target_args);
                let source_args = self.env.type_list(source_args);
                target_args.len() == source_args.len()
                    && target_args
                        .iter()
                        .zip(source_args.iter())
                        .all(|(&t, &s)| self.contains(t, s))
            }
            // Unchecked conversion from the raw type.
            _ => true,
        }
    }

    /// Type-argument containment: does target argument `target` contain
    /// source argument `source`?
    pub(crate) fn contains(&mut self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        let source_data = self.env.lookup(source);
        match self.env.lookup(target) {
            TypeData::UnboundWildcard => true,
            TypeData::ExtendsWildcard(bound) => match source_data {
                TypeData::ExtendsWildcard(source_bound) => self.is_assignable(source_bound, bound),
                TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => {
                    match self.env.require_top() {
                        Some(top) => bound == top,
                        None => false,
                    }
                }
                _ => self.is_assignable(source, bound),
            },
            TypeData::SuperWildcard(bound) => match source_data {
                TypeData::SuperWildcard(source_bound) => self.is_assignable(bound, source_bound),
                TypeData::UnboundWildcard | TypeData::ExtendsWildcard(_) => false,
                _ => self.is_assignable(bound, source),
            },
            // Concrete arguments are invariant.
            _ => false,
        }
    }
}

/// Memoized top-level queries, for callers that ask the same pairs many
/// times (the solver re-checks bounds on every propagation step).
pub(crate) struct CachedAssignability<'env> {
    checker: AssignabilityChecker<'env>,
    cache: FxHashMap<(TypeId, TypeId), bool>,
}

impl<'env> CachedAssignability<'env> {
    pub(crate) fn new(env: &'env TypeEnvironment) -> Self {
        CachedAssignability {
            checker: AssignabilityChecker::new(env),
            cache: FxHashMap::default(),
        }
    }

    pub(crate) fn env(&self) -> &'env TypeEnvironment {
        self.checker.env()
    }

    pub(crate) fn can_assign(&mut self, source: TypeId, target: TypeId) -> bool {
        if let Some(&cached) = self.cache.get(&(source, target)) {
            return cached;
        }
        let result = self.checker.can_assign(source, target);
        self.cache.insert((source, target), result);
        result
    }
}

/// Can a value of type `source` be used where `target` is expected?
///
/// Never panics for handles of `env` and never errors: pairs the rules do not
/// cover are not assignable.
pub fn can_assign_to(env: &TypeEnvironment, source: TypeId, target: TypeId) -> bool {
    if !query_trace::enabled() {
        return AssignabilityChecker::new(env).can_assign(source, target);
    }
    let query_id = query_trace::next_query_id();
    query_trace::relation_start(query_id, "can_assign_to", source, target);
    let result = AssignabilityChecker::new(env).can_assign(source, target);
    query_trace::relation_end(query_id, "can_assign_to", result);
    result
}

#[cfg(test)]
#[path = "../tests/assign_tests.rs"]
mod tests;
