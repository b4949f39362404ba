//! Constraints and the constraint graph.
//!
//! A constraint is either a simple edge `left <op> right` between two
//! variables or a Composite-Or, which holds when any of its members holds.
//!
//! Constraints are totally ordered by their structure: operator, then left
//! variable, then right variable, with simple edges before composites and
//! composites compared member by member. Two constraints compare equal exactly
//! when they are structurally identical, so sorting never merges distinct
//! constraints.

use crate::descriptor::TypeDescriptor;
use crate::environment::TypeEnvironment;
use crate::types::TypeId;
use crate::variables::{
    ConstraintVariable, ConstraintVariableFactory, SiteId, VariableFactory, VariableId,
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOperator {
    /// `left <= right`: left is assignable to right.
    Subtype,
    /// `left < right`: left is assignable to right and differs from it.
    StrictSubtype,
    /// `left = right`.
    Equal,
}

impl ConstraintOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOperator::Subtype => "<=",
            ConstraintOperator::StrictSubtype => "<",
            ConstraintOperator::Equal => "=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimpleConstraint {
    pub op: ConstraintOperator,
    pub left: VariableId,
    pub right: VariableId,
}

impl SimpleConstraint {
    pub fn new(left: VariableId, op: ConstraintOperator, right: VariableId) -> Self {
        SimpleConstraint { op, left, right }
    }

    pub fn subtype(left: VariableId, right: VariableId) -> Self {
        Self::new(left, ConstraintOperator::Subtype, right)
    }

    pub fn equal(left: VariableId, right: VariableId) -> Self {
        Self::new(left, ConstraintOperator::Equal, right)
    }

    /// `v <= v` and `v = v` always hold.
    pub fn is_trivial(&self) -> bool {
        self.left == self.right && self.op != ConstraintOperator::StrictSubtype
    }

    pub fn mentions(&self, var: VariableId) -> bool {
        self.left == var || self.right == var
    }
}

impl fmt::Display for SimpleConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.symbol(), self.right)
    }
}

/// A disjunction of simple constraints: sorted, deduplicated and with at
/// least two members.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeOr {
    members: Vec<SimpleConstraint>,
}

impl CompositeOr {
    /// Canonicalize a disjunction. Nested composites are flattened, members
    /// are sorted and deduplicated, and a single remaining member collapses
    /// to a simple constraint. `None` for an empty disjunction.
    pub fn build(members: impl IntoIterator<Item = Constraint>) -> Option<Constraint> {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Constraint::Simple(simple) => flat.push(simple),
                Constraint::Or(nested) => flat.extend(nested.members),
            }
        }
        flat.sort();
        flat.dedup();

        match flat.len() {
            0 => None,
            1 => Some(Constraint::Simple(flat[0])),
            _ => Some(Constraint::Or(CompositeOr { members: flat })),
        }
    }

    pub fn members(&self) -> &[SimpleConstraint] {
        &self.members
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    Simple(SimpleConstraint),
    Or(CompositeOr),
}

impl Constraint {
    /// The simple edges of this constraint, one for a simple constraint.
    pub fn edges(&self) -> &[SimpleConstraint] {
        match self {
            Constraint::Simple(simple) => std::slice::from_ref(simple),
            Constraint::Or(or) => &or.members,
        }
    }
}

impl From<SimpleConstraint> for Constraint {
    fn from(simple: SimpleConstraint) -> Self {
        Constraint::Simple(simple)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Simple(simple) => simple.fmt(f),
            Constraint::Or(or) => {
                f.write_str("(")?;
                for (i, member) in or.members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    member.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

// =============================================================================
// ConstraintGraph
// =============================================================================

/// Variables and constraints of one program, bound to one environment.
pub struct ConstraintGraph<'env> {
    variables: VariableFactory<'env>,
    constraints: IndexSet<Constraint>,
    free: IndexSet<VariableId>,
}

impl<'env> ConstraintGraph<'env> {
    pub fn new(env: &'env TypeEnvironment) -> Self {
        ConstraintGraph {
            variables: VariableFactory::new(env),
            constraints: IndexSet::new(),
            free: IndexSet::new(),
        }
    }

    pub fn env(&self) -> &'env TypeEnvironment {
        self.variables.env()
    }

    pub fn factory(&self) -> &VariableFactory<'env> {
        &self.variables
    }

    /// Add `left <op> right`. Returns `false` when the edge is trivial or
    /// already present.
    pub fn add_simple(&mut self, left: VariableId, op: ConstraintOperator, right: VariableId) -> bool {
        self.variables.check(left);
        self.variables.check(right);
        let constraint = SimpleConstraint::new(left, op, right);
        if constraint.is_trivial() {
            return false;
        }
        let added = self.constraints.insert(Constraint::Simple(constraint));
        if added {
            trace!(%constraint, "constraint added");
        }
        added
    }

    pub fn add_subtype(&mut self, left: VariableId, right: VariableId) -> bool {
        self.add_simple(left, ConstraintOperator::Subtype, right)
    }

    pub fn add_equal(&mut self, left: VariableId, right: VariableId) -> bool {
        self.add_simple(left, ConstraintOperator::Equal, right)
    }

    /// Add the disjunction of `members`. A disjunction containing a trivial
    /// member always holds and is dropped.
    pub fn add_or(&mut self, members: impl IntoIterator<Item = Constraint>) -> bool {
        let Some(constraint) = CompositeOr::build(members) else {
            return false;
        };
        for edge in constraint.edges() {
            self.variables.check(edge.left);
            self.variables.check(edge.right);
        }
        if constraint.edges().iter().any(SimpleConstraint::is_trivial) {
            return false;
        }
        let added = self.constraints.insert(constraint);
        if added && let Some(last) = self.constraints.last() {
            trace!(constraint = %last, "constraint added");
        }
        added
    }

    /// Make `var`'s type a solver unknown; its resolved type becomes a seed.
    pub fn mark_free(&mut self, var: VariableId) {
        self.variables.check(var);
        self.free.insert(var);
    }

    pub fn is_free(&self, var: VariableId) -> bool {
        self.variables.check(var);
        self.free.contains(&var)
    }

    pub fn free_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.free.iter().copied()
    }

    pub fn variable(&self, id: VariableId) -> &ConstraintVariable {
        self.variables.variable(id)
    }

    pub fn variables(&self) -> &[ConstraintVariable] {
        self.variables.variables()
    }

    pub fn find_binding(&self, binding: &str) -> Option<VariableId> {
        self.variables.find_binding(binding)
    }

    pub fn describe(&self, id: VariableId) -> String {
        self.variables.describe(id)
    }

    pub fn observation_index(&self, ty: TypeId) -> Option<usize> {
        self.variables.observation_index(ty)
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Constraints in their structural order.
    pub fn canonical_constraints(&self) -> Vec<&Constraint> {
        let mut sorted: Vec<&Constraint> = self.constraints.iter().collect();
        sorted.sort();
        sorted
    }
}

impl ConstraintVariableFactory for ConstraintGraph<'_> {
    fn expression_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variables.expression_variable(site, ty)
    }

    fn type_use_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variables.type_use_variable(site, ty)
    }

    fn declaring_type_variable(&mut self, member: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variables.declaring_type_variable(member, ty)
    }

    fn parameter_variable(
        &mut self,
        method: &str,
        index: u32,
        ty: Option<&TypeDescriptor>,
    ) -> VariableId {
        self.variables.parameter_variable(method, index, ty)
    }

    fn return_type_variable(&mut self, method: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variables.return_type_variable(method, ty)
    }

    fn raw_binding_variable(&mut self, binding: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variables.raw_binding_variable(binding, ty)
    }

    fn resolved_type_variable(&mut self, ty: TypeId) -> VariableId {
        self.variables.resolved_type_variable(ty)
    }
}

#[cfg(test)]
#[path = "../tests/constraints_tests.rs"]
mod tests;
