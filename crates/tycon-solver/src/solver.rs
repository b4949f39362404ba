//! Constraint solving.
//!
//! 1. Equality edges are unified with a union-find table. A class is free when
//!    any member is free; every member of a free class shares the class
//!    solution. Members of a fixed class keep their own resolved types, with
//!    unresolved members taking the class seed. A class holding a fixed
//!    `ResolvedType` member is pinned: that member keeps its type, and the
//!    class solution must equal it while staying within the supertype closure
//!    of the seed.
//! 2. Subtype edges between different classes are propagated with a worklist:
//!    the estimate of the left side becomes a lower bound of a free right
//!    class, and the type of a fixed right side an upper bound of a free left
//!    class. Bounds are stored per edge so a changed estimate replaces its old
//!    contribution. A class whose solution changes re-enqueues its edges.
//! 3. Every constraint is verified against the final estimates in structural
//!    order. Edges with an unresolved endpoint are skipped. A Composite-Or
//!    holds when any member holds and is vacuous when every member is
//!    skipped.
//!
//! Composite-Or members do not propagate bounds; they are only verified.

use crate::assign::CachedAssignability;
use crate::constraints::{Constraint, ConstraintGraph, ConstraintOperator, SimpleConstraint};
use crate::explain::{AssignabilityFailure, explain_assignability};
use crate::query_trace;
use crate::types::TypeId;
use crate::variables::{SideTable, VariableId, VariableSite};
use crate::widening::{self, Bound};
use ena::unify::{InPlaceUnificationTable, NoError, UnifyKey, UnifyValue};
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, debug_span, trace, warn};
use tycon_common::limits::MAX_PROPAGATION_STEPS;

// =============================================================================
// Union-find keys
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ClassKey(u32);

/// Per-class data merged by the union-find table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClassValue {
    seed: Option<TypeId>,
    free: bool,
    /// Type of a `ResolvedType` member.
    pinned: Option<TypeId>,
}

impl UnifyKey for ClassKey {
    type Value = ClassValue;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        ClassKey(u)
    }

    fn tag() -> &'static str {
        "ClassKey"
    }
}

impl UnifyValue for ClassValue {
    type Error = NoError;

    fn unify_values(a: &Self, b: &Self) -> Result<Self, Self::Error> {
        // The seed of a free member wins; otherwise the first seed wins.
        let seed = match (a.free, b.free) {
            (true, _) if a.seed.is_some() => a.seed,
            (_, true) if b.seed.is_some() => b.seed,
            _ => a.seed.or(b.seed),
        };
        Ok(ClassValue {
            seed,
            free: a.free || b.free,
            pinned: a.pinned.or(b.pinned),
        })
    }
}

// =============================================================================
// Public types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    Unsolved,
    Propagating,
    Solved,
    Unsatisfiable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverOptions {
    /// Upper limit on processed worklist entries.
    pub max_steps: usize,
    /// Attach an [`AssignabilityFailure`] to every conflict.
    pub explain_conflicts: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_steps: MAX_PROPAGATION_STEPS,
            explain_conflicts: true,
        }
    }
}

impl SolverOptions {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_explanations(mut self, explain: bool) -> Self {
        self.explain_conflicts = explain;
        self
    }
}

/// The type chosen for every resolved variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    types: SideTable<TypeId>,
}

impl Assignment {
    pub fn get(&self, var: VariableId) -> Option<TypeId> {
        self.types.get(var).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, TypeId)> + '_ {
        self.types.iter().map(|(var, &ty)| (var, ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A constraint that does not hold under the final assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub constraint: Constraint,
    /// The failing edge; for a Composite-Or, its first failing member.
    pub edge: SimpleConstraint,
    pub left_type: TypeId,
    pub right_type: TypeId,
    pub failure: Option<AssignabilityFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{} unsatisfiable constraint(s), first: {first}", .conflicts.len())]
pub struct UnsatisfiableReport {
    /// The first conflicting edge in structural order.
    pub first: SimpleConstraint,
    pub conflicts: Vec<Conflict>,
    /// The assignment the solver settled on despite the conflicts.
    pub partial: Assignment,
}

// =============================================================================
// Solver
// =============================================================================

#[derive(Default)]
struct ClassBounds {
    lower: IndexMap<usize, Bound>,
    upper: IndexMap<usize, Bound>,
    solution: Option<TypeId>,
}

enum EdgeCheck {
    Holds,
    Skipped,
    Fails(TypeId, TypeId),
}

pub struct ConstraintSolver<'g, 'env> {
    graph: &'g ConstraintGraph<'env>,
    options: SolverOptions,
    state: SolverState,
    table: InPlaceUnificationTable<ClassKey>,
    /// Indexed by class root.
    classes: Vec<ClassBounds>,
    /// Simple edges that cross two classes, in structural order.
    edges: Vec<SimpleConstraint>,
    /// Edge indices by class root.
    edges_by_class: Vec<Vec<usize>>,
    relation: CachedAssignability<'env>,
    assignment: Assignment,
    conflicts: Vec<Conflict>,
}

impl<'g, 'env> ConstraintSolver<'g, 'env> {
    pub fn new(graph: &'g ConstraintGraph<'env>) -> Self {
        Self::with_options(graph, SolverOptions::default())
    }

    pub fn with_options(graph: &'g ConstraintGraph<'env>, options: SolverOptions) -> Self {
        ConstraintSolver {
            graph,
            options,
            state: SolverState::Unsolved,
            table: InPlaceUnificationTable::new(),
            classes: Vec::new(),
            edges: Vec::new(),
            edges_by_class: Vec::new(),
            relation: CachedAssignability::new(graph.env()),
            assignment: Assignment::default(),
            conflicts: Vec::new(),
        }
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Solve the graph. Running a finished solver again is a no-op.
    pub fn run(&mut self) -> SolverState {
        if self.state != SolverState::Unsolved {
            return self.state;
        }
        self.state = SolverState::Propagating;

        self.unify_equalities();
        self.collect_edges();
        self.propagate();
        self.assignment = self.final_assignment();
        self.verify();

        self.state = if self.conflicts.is_empty() {
            SolverState::Solved
        } else {
            SolverState::Unsatisfiable
        };
        debug!(state = ?self.state, conflicts = self.conflicts.len(), "solver finished");
        self.state
    }

    /// Consume the solver into its result.
    pub fn into_result(mut self) -> Result<Assignment, UnsatisfiableReport> {
        self.run();
        match self.conflicts.first() {
            None => Ok(self.assignment),
            Some(first) => Err(UnsatisfiableReport {
                first: first.edge,
                conflicts: self.conflicts,
                partial: self.assignment,
            }),
        }
    }

    /// Every type `var` could be given without breaking the edges that cross
    /// its class: the supertype closure of its resolved type, filtered by the
    /// final estimates on the other side of those edges. Most specific first.
    pub fn valid_widenings(&mut self, var: VariableId) -> Vec<TypeId> {
        self.run();
        let Some(seed) = self.graph.variable(var).ty else {
            return Vec::new();
        };

        let class = self.root(var);
        let (mut lower, mut upper) = (Vec::new(), Vec::new());
        if let Some(pinned) = self.pinned_type(class) {
            lower.push(Bound::new(pinned, false));
            upper.push(Bound::new(pinned, false));
        }
        for index in self.edges_by_class[class].clone() {
            let edge = self.edges[index];
            let strict = edge.op == ConstraintOperator::StrictSubtype;
            if self.root(edge.right) == class
                && let Some(ty) = self.estimate(edge.left)
            {
                lower.push(Bound::new(ty, strict));
            }
            if self.root(edge.left) == class
                && let Some(ty) = self.estimate(edge.right)
            {
                upper.push(Bound::new(ty, strict));
            }
        }

        let graph = self.graph;
        widening::candidates(&self.relation, seed, |ty| graph.observation_index(ty))
            .into_iter()
            .filter(|&candidate| widening::satisfies(&mut self.relation, candidate, &lower, &upper))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    fn unify_equalities(&mut self) {
        let graph = self.graph;
        for variable in graph.variables() {
            let pinned = match variable.site {
                VariableSite::ResolvedType(ty) => Some(ty),
                _ => None,
            };
            let key = self.table.new_key(ClassValue {
                seed: variable.ty,
                free: graph.is_free(variable.id),
                pinned,
            });
            debug_assert_eq!(key.0, variable.id.raw_index());
        }
        for constraint in graph.constraints() {
            if let Constraint::Simple(edge) = constraint
                && edge.op == ConstraintOperator::Equal
            {
                self.table
                    .union(ClassKey(edge.left.raw_index()), ClassKey(edge.right.raw_index()));
            }
        }

        let count = graph.variables().len();
        self.classes = (0..count).map(|_| ClassBounds::default()).collect();
        self.edges_by_class = vec![Vec::new(); count];
        for variable in graph.variables() {
            let index = variable.id.index();
            let value = self.table.probe_value(ClassKey(index as u32));
            if !value.free || self.root(variable.id) != index {
                continue;
            }
            if value.pinned.is_some() {
                self.resolve_class(index);
            } else {
                self.classes[index].solution = value.seed;
            }
        }
    }

    fn collect_edges(&mut self) {
        let graph = self.graph;
        for constraint in graph.canonical_constraints() {
            let Constraint::Simple(edge) = constraint else {
                continue;
            };
            if edge.op == ConstraintOperator::Equal {
                continue;
            }
            let (left, right) = (self.root(edge.left), self.root(edge.right));
            if left == right {
                continue;
            }
            let index = self.edges.len();
            self.edges.push(*edge);
            self.edges_by_class[left].push(index);
            self.edges_by_class[right].push(index);
        }
    }

    fn propagate(&mut self) {
        let mut queue: VecDeque<usize> = (0..self.edges.len()).collect();
        let mut queued = vec![true; self.edges.len()];
        let mut steps = 0usize;

        while let Some(index) = queue.pop_front() {
            queued[index] = false;
            steps += 1;
            if steps > self.options.max_steps {
                warn!(
                    max_steps = self.options.max_steps,
                    "propagation step limit reached, verifying current estimates"
                );
                break;
            }

            let edge = self.edges[index];
            let strict = edge.op == ConstraintOperator::StrictSubtype;
            let (left, right) = (self.root(edge.left), self.root(edge.right));

            let mut changed = Vec::new();
            if self.is_free_class(right) {
                let bound = self.estimate(edge.left).map(|ty| Bound::new(ty, strict));
                if set_contribution(&mut self.classes[right].lower, index, bound) {
                    changed.push(right);
                }
            }
            // A free right side can still grow, so only fixed or pinned types
            // bound a class from above.
            if self.is_free_class(left) && self.bounds_from_above(right) {
                let bound = self.estimate(edge.right).map(|ty| Bound::new(ty, strict));
                if set_contribution(&mut self.classes[left].upper, index, bound) {
                    changed.push(left);
                }
            }

            for class in changed {
                if self.resolve_class(class) {
                    for &dependent in &self.edges_by_class[class] {
                        if !queued[dependent] {
                            queued[dependent] = true;
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }
        trace!(steps, "propagation finished");
    }

    /// Recompute the solution of a free class. Returns whether it changed.
    fn resolve_class(&mut self, class: usize) -> bool {
        let value = self.table.probe_value(ClassKey(class as u32));
        let mut lower: Vec<Bound> = self.classes[class].lower.values().copied().collect();
        let mut upper: Vec<Bound> = self.classes[class].upper.values().copied().collect();
        let graph = self.graph;
        let observed = |ty: TypeId| graph.observation_index(ty);
        let solution = match value.pinned {
            // The pinned type must be matched exactly, from the seed's closure.
            Some(pinned) => {
                lower.push(Bound::new(pinned, false));
                upper.push(Bound::new(pinned, false));
                let base = value.seed.unwrap_or(pinned);
                Some(widening::select_within(&mut self.relation, base, &lower, &upper, observed))
            }
            None => widening::select(&mut self.relation, value.seed, &lower, &upper, observed),
        };

        let previous = std::mem::replace(&mut self.classes[class].solution, solution);
        if previous != solution {
            trace!(class, ?previous, ?solution, "class solution changed");
        }
        previous != solution
    }

    fn final_assignment(&mut self) -> Assignment {
        let graph = self.graph;
        let mut types = SideTable::with_capacity(graph.variables().len());
        for variable in graph.variables() {
            if let Some(ty) = self.estimate(variable.id) {
                types.insert(variable.id, ty);
            }
        }
        Assignment { types }
    }

    fn verify(&mut self) {
        let graph = self.graph;
        for constraint in graph.canonical_constraints() {
            let mut first_failure = None;
            let mut any_holds = false;
            for &edge in constraint.edges() {
                match self.check_edge(edge) {
                    EdgeCheck::Holds => {
                        any_holds = true;
                        break;
                    }
                    EdgeCheck::Skipped => {}
                    EdgeCheck::Fails(left, right) => {
                        if first_failure.is_none() {
                            first_failure = Some((edge, left, right));
                        }
                    }
                }
            }
            if any_holds {
                continue;
            }
            // All members skipped: vacuous.
            let Some((edge, left_type, right_type)) = first_failure else {
                continue;
            };

            let failure = if self.options.explain_conflicts {
                explain_assignability(graph.env(), left_type, right_type)
            } else {
                None
            };
            debug!(
                constraint = %constraint,
                left = %graph.describe(edge.left),
                right = %graph.describe(edge.right),
                "constraint conflict"
            );
            self.conflicts.push(Conflict {
                constraint: constraint.clone(),
                edge,
                left_type,
                right_type,
                failure,
            });
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn root(&mut self, var: VariableId) -> usize {
        self.table.find(ClassKey(var.raw_index())).0 as usize
    }

    fn bounds_from_above(&mut self, class: usize) -> bool {
        let value = self.table.probe_value(ClassKey(class as u32));
        !value.free || value.pinned.is_some()
    }

    fn pinned_type(&mut self, class: usize) -> Option<TypeId> {
        self.table.probe_value(ClassKey(class as u32)).pinned
    }

    fn is_free_class(&mut self, class: usize) -> bool {
        self.table.probe_value(ClassKey(class as u32)).free
    }

    /// Current type of `var`.
    fn estimate(&mut self, var: VariableId) -> Option<TypeId> {
        let graph = self.graph;
        let variable = graph.variable(var);
        if let VariableSite::ResolvedType(ty) = variable.site {
            return Some(ty);
        }
        let class = self.root(var);
        let value = self.table.probe_value(ClassKey(class as u32));
        if value.free {
            return self.classes[class].solution;
        }
        variable.ty.or(value.seed)
    }

    fn check_edge(&mut self, edge: SimpleConstraint) -> EdgeCheck {
        let (Some(left), Some(right)) = (self.estimate(edge.left), self.estimate(edge.right)) else {
            return EdgeCheck::Skipped;
        };
        let holds = match edge.op {
            ConstraintOperator::Equal => left == right || self.relation.can_assign(left, right),
            ConstraintOperator::Subtype => self.relation.can_assign(left, right),
            ConstraintOperator::StrictSubtype => {
                left != right && self.relation.can_assign(left, right)
            }
        };
        if holds {
            EdgeCheck::Holds
        } else {
            EdgeCheck::Fails(left, right)
        }
    }
}

/// Replace the bound edge `index` contributes. Returns whether it changed.
fn set_contribution(bounds: &mut IndexMap<usize, Bound>, index: usize, bound: Option<Bound>) -> bool {
    match bound {
        Some(bound) => bounds.insert(index, bound) != Some(bound),
        None => bounds.shift_remove(&index).is_some(),
    }
}

/// Solve `graph` with default options.
pub fn solve(graph: &ConstraintGraph<'_>) -> Result<Assignment, UnsatisfiableReport> {
    let _span = debug_span!(
        "solve",
        variables = graph.variables().len(),
        constraints = graph.constraint_count()
    )
    .entered();

    let query_id = query_trace::enabled().then(query_trace::next_query_id);
    let result = ConstraintSolver::new(graph).into_result();
    if let Some(query_id) = query_id {
        let conflicts = result.as_ref().err().map_or(0, |report| report.conflicts.len());
        query_trace::solve_end(
            query_id,
            graph.variables().len(),
            graph.constraint_count(),
            conflicts,
        );
    }
    result
}

#[cfg(test)]
#[path = "../tests/solver_tests.rs"]
mod tests;
