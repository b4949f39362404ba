//! Supertype walks, substitution and erasure.
//!
//! Direct supertypes are computed per kind and cached per handle:
//!
//! - `Standard`: the declared superclass and interfaces, or the top type when
//!   the declaration names none.
//! - `Parameterized`: the declared supertypes with the declaration's type
//!   parameters replaced by the type arguments.
//! - `Raw`: the erasures of the declared supertypes (rawness is preserved
//!   along the walk).
//! - `Array`: arrays of the element's supertypes at the same dimensions; an
//!   array of the top type or of a primitive has the top type and the
//!   configured array interfaces one dimension up.
//! - type variables and captures: their upper bounds, or the top type.

use crate::environment::TypeEnvironment;
use crate::error::EnvironmentError;
use crate::types::{DeclId, TypeData, TypeId, TypeListBuffer, TypeParamId};
use indexmap::IndexMap;
use tracing::{debug, warn};
use tycon_common::limits::MAX_SUPERTYPE_WALK;

impl TypeEnvironment {
    /// Immediate supertypes of `ty`.
    pub fn direct_supertypes(&self, ty: TypeId) -> TypeListBuffer {
        if let Some(cached) = self.supertype_cache.borrow().get(&ty) {
            return cached.clone();
        }

        let supertypes = self.compute_direct_supertypes(ty);

        // Until the top type is known the implicit supertypes are incomplete.
        if self.top_type().is_some() {
            self.supertype_cache
                .borrow_mut()
                .insert(ty, supertypes.clone());
        }
        supertypes
    }

    fn compute_direct_supertypes(&self, ty: TypeId) -> TypeListBuffer {
        match self.lookup(ty) {
            TypeData::Primitive(_) | TypeData::Void | TypeData::Null => TypeListBuffer::new(),
            TypeData::Standard(decl) => self.declaration_supertypes(decl, ty),
            TypeData::Parameterized {
                declaration,
                arguments,
            } => {
                let params = self.declaration_type_parameters(declaration);
                let args = self.type_list(arguments);
                self.declaration_supertypes(declaration, ty)
                    .into_iter()
                    .map(|s| self.substitute(s, &params, &args))
                    .collect()
            }
            TypeData::Raw(decl) => {
                let mut out = TypeListBuffer::new();
                for s in self.declaration_supertypes(decl, ty) {
                    if let Ok(erased) = self.erasure(s)
                        && !out.contains(&erased)
                    {
                        out.push(erased);
                    }
                }
                out
            }
            TypeData::Array {
                element,
                dimensions,
            } => self.array_supertypes(element, dimensions),
            TypeData::TypeVariable(param) => {
                self.bounds_or_top(self.type_parameter_bounds(param))
            }
            TypeData::Capture(capture) => {
                let bounds = self
                    .capture_info(capture)
                    .map(|info| info.upper_bounds)
                    .unwrap_or_default();
                self.bounds_or_top(bounds)
            }
            TypeData::ExtendsWildcard(bound) => smallvec::smallvec![bound],
            TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => {
                self.bounds_or_top(TypeListBuffer::new())
            }
        }
    }

    fn bounds_or_top(&self, bounds: TypeListBuffer) -> TypeListBuffer {
        if !bounds.is_empty() {
            return bounds;
        }
        self.require_top().into_iter().collect()
    }

    /// Declared supertypes plus the implicit top type.
    fn declaration_supertypes(&self, decl: DeclId, ty: TypeId) -> TypeListBuffer {
        let mut supertypes = match self.declared_supertypes(decl) {
            Ok(supertypes) => supertypes,
            Err(err) => {
                warn!(
                    declaration = %self.declaration_name(decl),
                    %err,
                    "unresolvable supertypes, treating as none"
                );
                TypeListBuffer::new()
            }
        };

        if self.has_implicit_supertype(decl)
            && let Some(top) = self.require_top()
            && top != ty
            && !supertypes.contains(&top)
        {
            supertypes.insert(0, top);
        }
        supertypes
    }

    fn array_supertypes(&self, element: TypeId, dimensions: u32) -> TypeListBuffer {
        let element_data = self.lookup(element);
        let element_is_root = self.is_top(element) || !element_data.is_reference();

        if !element_is_root {
            return self
                .direct_supertypes(element)
                .into_iter()
                .filter_map(|s| self.array_of(s, dimensions).ok())
                .collect();
        }

        let mut roots = TypeListBuffer::new();
        roots.extend(self.require_top());
        for name in &self.config().array_supertypes {
            if self.lookup_declaration(name).is_some()
                && let Ok(ty) = self.class_type(name)
                && !roots.contains(&ty)
            {
                roots.push(ty);
            }
        }

        if dimensions == 1 {
            return roots;
        }
        roots
            .into_iter()
            .filter_map(|r| self.array_of(r, dimensions - 1).ok())
            .collect()
    }

    /// Breadth-first supertype closure of `ty`, including `ty` itself at
    /// distance 0. Iteration order is discovery order.
    pub fn supertype_closure(&self, ty: TypeId) -> IndexMap<TypeId, u32> {
        let mut closure = IndexMap::new();
        closure.insert(ty, 0);

        let mut cursor = 0;
        while let Some((&current, &distance)) = closure.get_index(cursor) {
            cursor += 1;
            for s in self.direct_supertypes(current) {
                if closure.len() >= MAX_SUPERTYPE_WALK {
                    debug!(start = ?ty, "supertype walk truncated");
                    return closure;
                }
                closure.entry(s).or_insert(distance + 1);
            }
        }
        closure
    }

    /// The first supertype of `ty` (in breadth-first order) declared by
    /// `decl`, with type arguments substituted along the path.
    pub fn instantiate_as_supertype(&self, ty: TypeId, decl: DeclId) -> Option<TypeId> {
        if self.lookup(ty).declaration() == Some(decl) {
            return Some(ty);
        }
        self.supertype_closure(ty)
            .into_keys()
            .find(|&s| self.lookup(s).declaration() == Some(decl))
    }

    /// Replace occurrences of `params` in `ty` with the matching `args`.
    pub fn substitute(&self, ty: TypeId, params: &[TypeParamId], args: &[TypeId]) -> TypeId {
        if params.is_empty() {
            return ty;
        }
        match self.lookup(ty) {
            TypeData::TypeVariable(param) => params
                .iter()
                .position(|&p| p == param)
                .and_then(|i| args.get(i).copied())
                .unwrap_or(ty),
            TypeData::Parameterized {
                declaration,
                arguments,
            } => {
                let old = self.type_list(arguments);
                let new: Vec<TypeId> = old
                    .iter()
                    .map(|&a| self.substitute(a, params, args))
                    .collect();
                if new.as_slice() == &*old {
                    return ty;
                }
                let arguments = self.intern_type_list(new);
                self.intern(TypeData::Parameterized {
                    declaration,
                    arguments,
                })
            }
            TypeData::Array {
                element,
                dimensions,
            } => {
                let replaced = self.substitute(element, params, args);
                if replaced == element {
                    return ty;
                }
                // A wildcard argument cannot be an array element; use its
                // upper bound instead.
                let element = self.wildcard_upper_bound(replaced).unwrap_or(replaced);
                self.array_of(element, dimensions).unwrap_or(ty)
            }
            TypeData::ExtendsWildcard(bound) => {
                let replaced = self.substitute(bound, params, args);
                match self.lookup(replaced) {
                    TypeData::ExtendsWildcard(_) => replaced,
                    TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => {
                        TypeId::UNBOUND_WILDCARD
                    }
                    _ => self.intern(TypeData::ExtendsWildcard(replaced)),
                }
            }
            TypeData::SuperWildcard(bound) => {
                let replaced = self.substitute(bound, params, args);
                match self.lookup(replaced) {
                    TypeData::SuperWildcard(_) => replaced,
                    TypeData::UnboundWildcard | TypeData::ExtendsWildcard(_) => {
                        TypeId::UNBOUND_WILDCARD
                    }
                    _ => self.intern(TypeData::SuperWildcard(replaced)),
                }
            }
            TypeData::Primitive(_)
            | TypeData::Void
            | TypeData::Null
            | TypeData::Standard(_)
            | TypeData::Raw(_)
            | TypeData::UnboundWildcard
            | TypeData::Capture(_) => ty,
        }
    }

    /// Upper bound of a wildcard: its `extends` bound, otherwise the top type.
    /// `None` for non-wildcards.
    pub fn wildcard_upper_bound(&self, ty: TypeId) -> Option<TypeId> {
        match self.lookup(ty) {
            TypeData::ExtendsWildcard(bound) => Some(bound),
            TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => self.require_top(),
            _ => None,
        }
    }

    /// The generic-parameter-stripped form of `ty`.
    pub fn erasure(&self, ty: TypeId) -> Result<TypeId, EnvironmentError> {
        match self.lookup(ty) {
            TypeData::Parameterized { declaration, .. } => Ok(self.intern(TypeData::Raw(declaration))),
            TypeData::Array {
                element,
                dimensions,
            } => {
                let erased = self.erasure(element)?;
                self.array_of(erased, dimensions)
            }
            TypeData::TypeVariable(param) => {
                let bounds = self.type_parameter_bounds(param);
                match bounds.first() {
                    Some(&bound) => self.erasure(bound),
                    None => self.require_top().ok_or(EnvironmentError::TopTypeUnknown),
                }
            }
            TypeData::Capture(capture) => {
                let first = self
                    .capture_info(capture)
                    .and_then(|info| info.upper_bounds.first().copied());
                match first {
                    Some(bound) => self.erasure(bound),
                    None => self.require_top().ok_or(EnvironmentError::TopTypeUnknown),
                }
            }
            TypeData::ExtendsWildcard(bound) => self.erasure(bound),
            TypeData::UnboundWildcard | TypeData::SuperWildcard(_) => {
                self.require_top().ok_or(EnvironmentError::TopTypeUnknown)
            }
            TypeData::Primitive(_)
            | TypeData::Void
            | TypeData::Null
            | TypeData::Standard(_)
            | TypeData::Raw(_) => Ok(ty),
        }
    }

    /// Capture conversion: replace every wildcard argument of a parameterized
    /// type with a fresh capture at `site`.
    ///
    /// The capture of argument `i` is additionally bounded by the declared
    /// bounds of type parameter `i`, substituted with the original arguments.
    /// Declared bounds that would substitute to a bare wildcard are dropped.
    pub fn capture_conversion(&self, ty: TypeId, site: u32) -> Result<TypeId, EnvironmentError> {
        let TypeData::Parameterized {
            declaration,
            arguments,
        } = self.lookup(ty)
        else {
            return Ok(ty);
        };

        let args = self.type_list(arguments);
        if !args.iter().any(|&a| self.lookup(a).is_wildcard()) {
            return Ok(ty);
        }

        let params = self.declaration_type_parameters(declaration);
        let mut captured = Vec::with_capacity(args.len());
        for (i, &arg) in args.iter().enumerate() {
            if !self.lookup(arg).is_wildcard() {
                captured.push(arg);
                continue;
            }
            let formal: TypeListBuffer = params
                .get(i)
                .map(|&p| self.type_parameter_bounds(p))
                .unwrap_or_default()
                .into_iter()
                .map(|b| self.substitute(b, &params, &args))
                .filter(|&b| !self.lookup(b).is_wildcard())
                .collect();
            captured.push(self.capture_with_bounds(arg, site, &formal)?);
        }

        let arguments = self.intern_type_list(captured);
        Ok(self.intern(TypeData::Parameterized {
            declaration,
            arguments,
        }))
    }
}

#[cfg(test)]
#[path = "../tests/hierarchy_tests.rs"]
mod tests;
