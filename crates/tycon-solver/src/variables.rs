//! Constraint variables: one node per typed program slot.
//!
//! A variable is keyed by its [`VariableSite`]; asking for the same site twice
//! yields the same [`VariableId`]. The resolved type is fixed when the variable
//! is first given one and never changes afterwards. A variable whose type
//! descriptor does not resolve stays unresolved; the solver treats it as a
//! no-op node.

use crate::descriptor::TypeDescriptor;
use crate::environment::TypeEnvironment;
use crate::format::TypeFormatter;
use crate::types::TypeId;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::debug;
use tycon_common::Atom;

/// Program position handed in by the collaborator.
pub type SiteId = u32;

/// Handle of a constraint variable, stamped with the environment whose
/// factory created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    index: u32,
    env: u32,
}

impl VariableId {
    pub(crate) const fn new(env: u32, index: u32) -> Self {
        VariableId { index, env }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn raw_index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

/// What a variable stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableSite {
    /// The value of the expression at a site.
    Expression(SiteId),
    /// A written type at a site (declared type, cast type).
    TypeUse(SiteId),
    /// The declaring type of a member.
    DeclaringType(Atom),
    /// Parameter `index` of a method.
    Parameter { method: Atom, index: u32 },
    /// The return type of a method.
    ReturnType(Atom),
    /// A variable, field or parameter binding.
    RawBinding(Atom),
    /// A fixed type, independent of any program site.
    ResolvedType(TypeId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintVariable {
    pub id: VariableId,
    pub site: VariableSite,
    /// `None` for unresolved variables.
    pub ty: Option<TypeId>,
}

impl ConstraintVariable {
    pub fn is_resolved(&self) -> bool {
        self.ty.is_some()
    }
}

/// One constructor per kind of program site.
///
/// Every constructor caches by site. A descriptor that fails to resolve
/// yields an unresolved variable.
pub trait ConstraintVariableFactory {
    fn expression_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId;

    fn type_use_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId;

    fn declaring_type_variable(&mut self, member: &str, ty: Option<&TypeDescriptor>) -> VariableId;

    fn parameter_variable(
        &mut self,
        method: &str,
        index: u32,
        ty: Option<&TypeDescriptor>,
    ) -> VariableId;

    fn return_type_variable(&mut self, method: &str, ty: Option<&TypeDescriptor>) -> VariableId;

    fn raw_binding_variable(&mut self, binding: &str, ty: Option<&TypeDescriptor>) -> VariableId;

    fn resolved_type_variable(&mut self, ty: TypeId) -> VariableId;
}

/// The default factory, backed by one environment.
pub struct VariableFactory<'env> {
    env: &'env TypeEnvironment,
    variables: Vec<ConstraintVariable>,
    by_site: FxHashMap<VariableSite, VariableId>,
    /// Resolved types in the order they were first seen.
    observed: IndexSet<TypeId>,
}

impl<'env> VariableFactory<'env> {
    pub fn new(env: &'env TypeEnvironment) -> Self {
        VariableFactory {
            env,
            variables: Vec::new(),
            by_site: FxHashMap::default(),
            observed: IndexSet::new(),
        }
    }

    pub fn env(&self) -> &'env TypeEnvironment {
        self.env
    }

    /// Get or create the variable for `site`.
    ///
    /// An existing unresolved variable takes `ty` if one is given; a resolved
    /// variable keeps its type.
    pub fn variable_with_type(&mut self, site: VariableSite, ty: Option<TypeId>) -> VariableId {
        if let Some(ty) = ty {
            self.observed.insert(ty);
        }
        if let Some(&id) = self.by_site.get(&site) {
            let variable = &mut self.variables[id.index()];
            if variable.ty.is_none() {
                variable.ty = ty;
            }
            return id;
        }

        let id = VariableId::new(self.env.stamp(), self.variables.len() as u32);
        self.variables.push(ConstraintVariable { id, site, ty });
        self.by_site.insert(site, id);
        id
    }

    fn resolve(&self, site: VariableSite, descriptor: Option<&TypeDescriptor>) -> Option<TypeId> {
        let descriptor = descriptor?;
        match self.env.get_or_create(descriptor) {
            Ok(ty) => Some(ty),
            Err(err) => {
                debug!(?site, %err, "type does not resolve, variable stays unresolved");
                None
            }
        }
    }

    fn variable_for(&mut self, site: VariableSite, descriptor: Option<&TypeDescriptor>) -> VariableId {
        let ty = self.resolve(site, descriptor);
        self.variable_with_type(site, ty)
    }

    pub fn find(&self, site: VariableSite) -> Option<VariableId> {
        self.by_site.get(&site).copied()
    }

    /// The variable of a binding, if any site mentioned it.
    pub fn find_binding(&self, binding: &str) -> Option<VariableId> {
        let atom = self.env.intern_string(binding);
        self.find(VariableSite::RawBinding(atom))
    }

    /// Panics if `id` was created for a different environment.
    pub fn variable(&self, id: VariableId) -> &ConstraintVariable {
        self.check(id);
        &self.variables[id.index()]
    }

    pub(crate) fn check(&self, id: VariableId) {
        assert_eq!(
            id.env,
            self.env.stamp(),
            "variable {id} belongs to another TypeEnvironment"
        );
    }

    pub fn variables(&self) -> &[ConstraintVariable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Position of `ty` in first-observation order.
    pub fn observation_index(&self, ty: TypeId) -> Option<usize> {
        self.observed.get_index_of(&ty)
    }

    pub fn observed_types(&self) -> &IndexSet<TypeId> {
        &self.observed
    }

    /// Human-readable name of a variable's site, e.g. `x`, `[site 4]` or
    /// `return(Dog.bark)`.
    pub fn describe(&self, id: VariableId) -> String {
        let resolve = |atom: Atom| self.env.resolve_atom(atom);
        match self.variable(id).site {
            VariableSite::Expression(site) => format!("[site {site}]"),
            VariableSite::TypeUse(site) => format!("type-use({site})"),
            VariableSite::DeclaringType(member) => format!("declaring({})", resolve(member)),
            VariableSite::Parameter { method, index } => {
                format!("param({}#{index})", resolve(method))
            }
            VariableSite::ReturnType(method) => format!("return({})", resolve(method)),
            VariableSite::RawBinding(binding) => resolve(binding).to_string(),
            VariableSite::ResolvedType(ty) => TypeFormatter::new(self.env).format(ty),
        }
    }
}

impl ConstraintVariableFactory for VariableFactory<'_> {
    fn expression_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variable_for(VariableSite::Expression(site), ty)
    }

    fn type_use_variable(&mut self, site: SiteId, ty: Option<&TypeDescriptor>) -> VariableId {
        self.variable_for(VariableSite::TypeUse(site), ty)
    }

    fn declaring_type_variable(&mut self, member: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        let member = self.env.intern_string(member);
        self.variable_for(VariableSite::DeclaringType(member), ty)
    }

    fn parameter_variable(
        &mut self,
        method: &str,
        index: u32,
        ty: Option<&TypeDescriptor>,
    ) -> VariableId {
        let method = self.env.intern_string(method);
        self.variable_for(VariableSite::Parameter { method, index }, ty)
    }

    fn return_type_variable(&mut self, method: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        let method = self.env.intern_string(method);
        self.variable_for(VariableSite::ReturnType(method), ty)
    }

    fn raw_binding_variable(&mut self, binding: &str, ty: Option<&TypeDescriptor>) -> VariableId {
        let binding = self.env.intern_string(binding);
        self.variable_for(VariableSite::RawBinding(binding), ty)
    }

    fn resolved_type_variable(&mut self, ty: TypeId) -> VariableId {
        self.variable_with_type(VariableSite::ResolvedType(ty), Some(ty))
    }
}

// =============================================================================
// Side tables
// =============================================================================

/// Per-variable data owned by one analysis, keyed by [`VariableId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideTable<T> {
    slots: Vec<Option<(VariableId, T)>>,
}

impl<T> Default for SideTable<T> {
    fn default() -> Self {
        SideTable { slots: Vec::new() }
    }
}

impl<T> SideTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(variables: usize) -> Self {
        SideTable {
            slots: Vec::with_capacity(variables),
        }
    }

    pub fn get(&self, id: VariableId) -> Option<&T> {
        match self.slots.get(id.index()) {
            Some(Some((key, value))) if *key == id => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: VariableId) -> Option<&mut T> {
        match self.slots.get_mut(id.index()) {
            Some(Some((key, value))) if *key == id => Some(value),
            _ => None,
        }
    }

    /// Store `value` for `id`, returning the previous value.
    pub fn insert(&mut self, id: VariableId, value: T) -> Option<T> {
        let index = id.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index]
            .replace((id, value))
            .and_then(|(key, previous)| (key == id).then_some(previous))
    }

    pub fn remove(&mut self, id: VariableId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.as_ref().is_some_and(|(key, _)| *key == id) {
            slot.take().map(|(_, value)| value)
        } else {
            None
        }
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.get(id).is_some()
    }

    /// Entries in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &T)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|(id, value)| (*id, value)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/variables_tests.rs"]
mod tests;
