//! Type environment: the interning factory for one analysis session.
//!
//! The environment owns an arena of [`TypeData`] nodes and hands out
//! [`TypeId`] handles. Structurally identical descriptors always produce the
//! same handle, so type equality is handle equality.
//!
//! Declarations are registered up front and resolved lazily: supertypes and
//! type-parameter bounds are only interned on the first hierarchy query that
//! needs them, which lets descriptors forward-reference each other.
//!
//! The environment uses `RefCell` interior mutability so that the assignability
//! engine and constraint graphs can share it by `&` reference while still
//! interning derived types (substituted supertypes, captures, erasures).
//! Borrows are kept short and never held across a recursive call.

use crate::descriptor::{ClassDescriptor, TypeDescriptor, TypeParameterDescriptor};
use crate::error::EnvironmentError;
use crate::types::{
    CaptureId, CaptureInfo, ClassKind, DeclId, PrimitiveKind, TypeData, TypeId, TypeListBuffer,
    TypeListId, TypeParamId, TypeParamInfo,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};
use tycon_common::limits::MAX_ARRAY_DIMENSIONS;
use tycon_common::{Atom, Interner};

/// Stamps handed to environments. `0` is reserved for intrinsic types.
static NEXT_ENVIRONMENT_STAMP: AtomicU32 = AtomicU32::new(1);

pub const DEFAULT_ROOT: &str = "java.lang.Object";
pub const DEFAULT_ARRAY_SUPERTYPES: [&str; 2] = ["java.lang.Cloneable", "java.io.Serializable"];

// =============================================================================
// Configuration
// =============================================================================

/// How the environment decides which class is the top type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootPolicy {
    /// The named class is the top type. A declaration is synthesized for it
    /// when none is registered.
    Named(String),
    /// The first interned non-generic class with no explicit supertypes
    /// becomes the top type.
    FirstSeen,
}

impl Default for RootPolicy {
    fn default() -> Self {
        RootPolicy::Named(DEFAULT_ROOT.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct EnvironmentConfig {
    pub root: RootPolicy,
    /// Interfaces every array type implements. Names that are never declared
    /// are ignored.
    pub array_supertypes: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            root: RootPolicy::default(),
            array_supertypes: DEFAULT_ARRAY_SUPERTYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EnvironmentConfig {
    pub fn with_root_policy(mut self, root: RootPolicy) -> Self {
        self.root = root;
        self
    }

    pub fn with_array_supertypes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.array_supertypes = names.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// Storage
// =============================================================================

struct SliceInterner<T> {
    items: Vec<Rc<[T]>>,
    map: FxHashMap<Rc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        let empty: Rc<[T]> = Rc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: Vec<T>) -> u32 {
        if items.is_empty() {
            return 0;
        }

        if let Some(&id) = self.map.get(items.as_slice()) {
            return id;
        }

        let rc: Rc<[T]> = items.into();
        let id = self.items.len() as u32;
        self.items.push(rc.clone());
        self.map.insert(rc, id);
        id
    }

    fn get(&self, id: u32) -> Rc<[T]> {
        self.items
            .get(id as usize)
            .cloned()
            .unwrap_or_else(|| self.items[0].clone())
    }
}

#[derive(Default)]
struct TypeStore {
    data: Vec<TypeData>,
    map: FxHashMap<TypeData, u32>,
}

struct DeclInfo {
    name: Atom,
    kind: ClassKind,
    descriptor: Rc<ClassDescriptor>,
    type_params: SmallVec<[TypeParamId; 2]>,
    /// Resolved `superclass` followed by `interfaces`, without the implicit top.
    supertypes: Option<TypeListBuffer>,
    synthesized: bool,
}

struct TypeParamRecord {
    info: TypeParamInfo,
    bound_descriptors: Rc<[TypeDescriptor]>,
    bounds: Option<TypeListBuffer>,
}

#[derive(Default)]
struct ParamStore {
    records: Vec<TypeParamRecord>,
    by_name: FxHashMap<(Atom, Atom), TypeParamId>,
}

#[derive(Default)]
struct CaptureStore {
    records: Vec<CaptureInfo>,
    by_key: FxHashMap<(TypeId, u32, TypeListId), CaptureId>,
}

// =============================================================================
// TypeEnvironment
// =============================================================================

/// Interning factory and cache for one analysis session.
pub struct TypeEnvironment {
    stamp: u32,
    config: EnvironmentConfig,
    strings: RefCell<Interner>,
    types: RefCell<TypeStore>,
    lists: RefCell<SliceInterner<TypeId>>,
    decls: RefCell<IndexMap<Atom, DeclInfo>>,
    params: RefCell<ParamStore>,
    captures: RefCell<CaptureStore>,
    pub(crate) supertype_cache: RefCell<FxHashMap<TypeId, TypeListBuffer>>,
    top: Cell<Option<TypeId>>,
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::with_config(EnvironmentConfig::default())
    }

    pub fn with_config(config: EnvironmentConfig) -> Self {
        let mut strings = Interner::new();
        strings.intern_common();
        TypeEnvironment {
            stamp: NEXT_ENVIRONMENT_STAMP.fetch_add(1, Ordering::Relaxed),
            config,
            strings: RefCell::new(strings),
            types: RefCell::new(TypeStore::default()),
            lists: RefCell::new(SliceInterner::new()),
            decls: RefCell::new(IndexMap::new()),
            params: RefCell::new(ParamStore::default()),
            captures: RefCell::new(CaptureStore::default()),
            supertype_cache: RefCell::new(FxHashMap::default()),
            top: Cell::new(None),
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Number of non-intrinsic types interned so far.
    pub fn type_count(&self) -> usize {
        self.types.borrow().data.len()
    }

    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------

    pub fn intern_string(&self, s: &str) -> Atom {
        self.strings.borrow_mut().intern(s)
    }

    /// Stamp carried by every handle this environment hands out.
    pub(crate) fn stamp(&self) -> u32 {
        self.stamp
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.strings.borrow().resolve_shared(atom)
    }

    // -------------------------------------------------------------------------
    // Raw interning
    // -------------------------------------------------------------------------

    /// Intern already-validated type data.
    pub(crate) fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = intrinsic_id(&data) {
            return id;
        }

        let mut store = self.types.borrow_mut();
        if let Some(&index) = store.map.get(&data) {
            return TypeId {
                env: self.stamp,
                index,
            };
        }

        let index = TypeId::FIRST_USER + store.data.len() as u32;
        trace!(index, kind = ?data.kind(), "intern type");
        store.data.push(data.clone());
        store.map.insert(data, index);
        TypeId {
            env: self.stamp,
            index,
        }
    }

    /// Look up the structure behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was created by a different environment.
    pub fn lookup(&self, id: TypeId) -> TypeData {
        if let Some(data) = intrinsic_data(id) {
            return data;
        }
        assert_eq!(
            id.env, self.stamp,
            "TypeId {id:?} belongs to another TypeEnvironment"
        );
        let store = self.types.borrow();
        let slot = id
            .index
            .checked_sub(TypeId::FIRST_USER)
            .and_then(|index| store.data.get(index as usize));
        match slot {
            Some(data) => data.clone(),
            None => panic!("TypeId {id:?} is out of range for this TypeEnvironment"),
        }
    }

    pub fn intern_type_list(&self, members: Vec<TypeId>) -> TypeListId {
        TypeListId(self.lists.borrow_mut().intern(members))
    }

    pub fn type_list(&self, id: TypeListId) -> Rc<[TypeId]> {
        self.lists.borrow().get(id.0)
    }

    /// Type arguments of a parameterized type; empty for everything else.
    pub fn type_arguments(&self, ty: TypeId) -> Rc<[TypeId]> {
        match self.lookup(ty) {
            TypeData::Parameterized { arguments, .. } => self.type_list(arguments),
            _ => self.type_list(TypeListId::EMPTY),
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// Register a class or interface declaration.
    ///
    /// Supertypes and bounds are not resolved here; they may name declarations
    /// that are registered later.
    pub fn declare_class(&self, descriptor: ClassDescriptor) -> Result<DeclId, EnvironmentError> {
        let name = self.intern_string(&descriptor.name);

        let existing = self
            .decls
            .borrow()
            .get_full(&name)
            .map(|(index, _, info)| (index, info.synthesized));
        if let Some((_, false)) = existing {
            return Err(EnvironmentError::DuplicateDeclaration(descriptor.name));
        }

        let type_params = match existing {
            // A synthesized root keeps the parameters it was created with.
            Some((index, true)) => self.decls.borrow()[index].type_params.clone(),
            _ => {
                let ids =
                    self.declare_type_parameters(&descriptor.name, &descriptor.type_parameters)?;
                ids.into_iter().collect()
            }
        };

        debug!(name = %descriptor.name, kind = ?descriptor.kind, "declare class");
        let info = DeclInfo {
            name,
            kind: descriptor.kind,
            descriptor: Rc::new(descriptor),
            type_params,
            supertypes: None,
            synthesized: false,
        };

        let mut decls = self.decls.borrow_mut();
        let (index, _) = decls.insert_full(name, info);
        Ok(DeclId(index as u32))
    }

    /// Register the type parameters of `owner` (a class name or a method key).
    pub fn declare_type_parameters(
        &self,
        owner: &str,
        parameters: &[TypeParameterDescriptor],
    ) -> Result<Vec<TypeParamId>, EnvironmentError> {
        let owner_atom = self.intern_string(owner);
        let names: Vec<Atom> = parameters
            .iter()
            .map(|p| self.intern_string(&p.name))
            .collect();

        let mut params = self.params.borrow_mut();
        for (i, name) in names.iter().enumerate() {
            if params.by_name.contains_key(&(owner_atom, *name)) || names[..i].contains(name) {
                return Err(EnvironmentError::DuplicateTypeParameter {
                    owner: owner.to_string(),
                    name: parameters[i].name.clone(),
                });
            }
        }

        let mut ids = Vec::with_capacity(parameters.len());
        for (index, (parameter, name)) in parameters.iter().zip(names).enumerate() {
            let id = TypeParamId(params.records.len() as u32);
            params.records.push(TypeParamRecord {
                info: TypeParamInfo {
                    name,
                    owner: owner_atom,
                    index: index as u32,
                },
                bound_descriptors: parameter.bounds.clone().into(),
                bounds: None,
            });
            params.by_name.insert((owner_atom, name), id);
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn lookup_declaration(&self, name: &str) -> Option<DeclId> {
        let atom = self.strings.borrow().get(name)?;
        self.decls
            .borrow()
            .get_index_of(&atom)
            .map(|index| DeclId(index as u32))
    }

    pub fn declaration_name(&self, decl: DeclId) -> Arc<str> {
        let name = self
            .decls
            .borrow()
            .get_index(decl.0 as usize)
            .map(|(_, info)| info.name)
            .unwrap_or(Atom::NONE);
        self.resolve_atom(name)
    }

    pub fn declaration_kind(&self, decl: DeclId) -> ClassKind {
        self.decls
            .borrow()
            .get_index(decl.0 as usize)
            .map(|(_, info)| info.kind)
            .unwrap_or_default()
    }

    pub fn declaration_type_parameters(&self, decl: DeclId) -> SmallVec<[TypeParamId; 2]> {
        self.decls
            .borrow()
            .get_index(decl.0 as usize)
            .map(|(_, info)| info.type_params.clone())
            .unwrap_or_default()
    }

    pub fn type_parameter_info(&self, param: TypeParamId) -> Option<TypeParamInfo> {
        self.params
            .borrow()
            .records
            .get(param.0 as usize)
            .map(|record| record.info.clone())
    }

    /// Number of registered declarations, including synthesized ones.
    pub fn declaration_count(&self) -> usize {
        self.decls.borrow().len()
    }

    /// The resolved superclass and interfaces of a declaration, excluding the
    /// implicit top type. Resolved on first call and cached.
    pub fn declared_supertypes(&self, decl: DeclId) -> Result<TypeListBuffer, EnvironmentError> {
        let descriptor = {
            let decls = self.decls.borrow();
            let Some((_, info)) = decls.get_index(decl.0 as usize) else {
                return Ok(TypeListBuffer::new());
            };
            if let Some(supertypes) = &info.supertypes {
                return Ok(supertypes.clone());
            }
            info.descriptor.clone()
        };

        let mut supertypes = TypeListBuffer::new();
        for super_descriptor in descriptor.superclass.iter().chain(&descriptor.interfaces) {
            let ty = self.get_or_create(super_descriptor)?;
            if !self.lookup(ty).is_class_like() {
                return Err(EnvironmentError::InvalidSupertype {
                    name: descriptor.name.clone(),
                    supertype: self.describe_descriptor(super_descriptor),
                });
            }
            if !supertypes.contains(&ty) {
                supertypes.push(ty);
            }
        }

        if let Some((_, info)) = self.decls.borrow_mut().get_index_mut(decl.0 as usize) {
            info.supertypes = Some(supertypes.clone());
        }
        Ok(supertypes)
    }

    /// Whether the top type is an implicit direct supertype: classes without
    /// a superclass and interfaces without superinterfaces.
    pub(crate) fn has_implicit_supertype(&self, decl: DeclId) -> bool {
        self.decls
            .borrow()
            .get_index(decl.0 as usize)
            .is_some_and(|(_, info)| match info.kind {
                ClassKind::Class => info.descriptor.superclass.is_none(),
                ClassKind::Interface => info.descriptor.interfaces.is_empty(),
            })
    }

    fn has_no_explicit_supertypes(&self, decl: DeclId) -> bool {
        self.decls
            .borrow()
            .get_index(decl.0 as usize)
            .is_some_and(|(_, info)| info.descriptor.has_no_explicit_supertypes())
    }

    /// Resolve every declaration's supertypes and bounds, reporting the first
    /// malformed descriptor.
    pub fn resolve_declarations(&self) -> Result<(), EnvironmentError> {
        let count = self.decls.borrow().len();
        for index in 0..count {
            self.declared_supertypes(DeclId(index as u32))?;
        }
        let params = self.params.borrow().records.len();
        for index in 0..params {
            self.try_type_parameter_bounds(TypeParamId(index as u32))?;
        }
        Ok(())
    }

    /// Bounds of a type parameter; empty means bounded by the top type.
    ///
    /// Malformed bound descriptors are logged and treated as no bounds.
    pub fn type_parameter_bounds(&self, param: TypeParamId) -> TypeListBuffer {
        match self.try_type_parameter_bounds(param) {
            Ok(bounds) => bounds,
            Err(err) => {
                debug!(param = param.0, %err, "unresolvable type parameter bound");
                TypeListBuffer::new()
            }
        }
    }

    fn try_type_parameter_bounds(
        &self,
        param: TypeParamId,
    ) -> Result<TypeListBuffer, EnvironmentError> {
        let (name, descriptors) = {
            let params = self.params.borrow();
            let Some(record) = params.records.get(param.0 as usize) else {
                return Ok(TypeListBuffer::new());
            };
            if let Some(bounds) = &record.bounds {
                return Ok(bounds.clone());
            }
            (record.info.name, record.bound_descriptors.clone())
        };

        let mut bounds = TypeListBuffer::new();
        for descriptor in descriptors.iter() {
            let bound = self.get_or_create(descriptor)?;
            let data = self.lookup(bound);
            if !data.is_reference() || data.is_wildcard() || bound == TypeId::NULL {
                return Err(EnvironmentError::InvalidTypeParameterBound {
                    name: self.resolve_atom(name).to_string(),
                    reason: "bounds must be reference types",
                });
            }
            if Some(bound) != self.top.get() && !bounds.contains(&bound) {
                bounds.push(bound);
            }
        }

        if let Some(record) = self.params.borrow_mut().records.get_mut(param.0 as usize) {
            record.bounds = Some(bounds.clone());
        }
        Ok(bounds)
    }

    // -------------------------------------------------------------------------
    // Top type
    // -------------------------------------------------------------------------

    /// The top type, or `None` while it is not yet known.
    pub fn top_type(&self) -> Option<TypeId> {
        self.top.get()
    }

    /// The top type, interning it first under [`RootPolicy::Named`].
    pub fn require_top(&self) -> Option<TypeId> {
        if let Some(top) = self.top.get() {
            return Some(top);
        }
        match &self.config.root {
            RootPolicy::Named(name) => Some(self.intern_named_root(name)),
            RootPolicy::FirstSeen => None,
        }
    }

    pub fn is_top(&self, ty: TypeId) -> bool {
        self.top.get() == Some(ty)
    }

    fn intern_named_root(&self, name: &str) -> TypeId {
        let decl = match self.lookup_declaration(name) {
            Some(decl) => decl,
            None => {
                let atom = self.intern_string(name);
                debug!(name, "synthesize root declaration");
                let mut decls = self.decls.borrow_mut();
                let (index, _) = decls.insert_full(
                    atom,
                    DeclInfo {
                        name: atom,
                        kind: ClassKind::Class,
                        descriptor: Rc::new(ClassDescriptor::class(name)),
                        type_params: SmallVec::new(),
                        supertypes: Some(TypeListBuffer::new()),
                        synthesized: true,
                    },
                );
                DeclId(index as u32)
            }
        };
        let data = if self.declaration_type_parameters(decl).is_empty() {
            TypeData::Standard(decl)
        } else {
            TypeData::Raw(decl)
        };
        let top = self.intern(data);
        self.top.set(Some(top));
        top
    }

    /// Top-type bookkeeping after a class-like type has been interned.
    fn note_class_type(&self, decl: DeclId, ty: TypeId) {
        if self.top.get().is_some() {
            return;
        }
        match &self.config.root {
            RootPolicy::Named(name) => {
                if self.has_implicit_supertype(decl) {
                    self.intern_named_root(name);
                }
            }
            RootPolicy::FirstSeen => {
                if self.has_no_explicit_supertypes(decl)
                    && matches!(self.lookup(ty), TypeData::Standard(_))
                    && self.declaration_kind(decl) == ClassKind::Class
                {
                    debug!(name = %self.declaration_name(decl), "top type fixed by first root class");
                    self.top.set(Some(ty));
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Descriptor resolution
    // -------------------------------------------------------------------------

    /// Canonical handle for a descriptor.
    ///
    /// Deterministic and idempotent: structurally identical descriptors yield
    /// the same handle. Malformed descriptors are rejected and nothing derived
    /// from them is interned.
    pub fn get_or_create(&self, descriptor: &TypeDescriptor) -> Result<TypeId, EnvironmentError> {
        match descriptor {
            TypeDescriptor::Primitive { name } => Ok(name.to_type_id()),
            TypeDescriptor::Void => Ok(TypeId::VOID),
            TypeDescriptor::Null => Ok(TypeId::NULL),
            TypeDescriptor::Array {
                element,
                dimensions,
            } => {
                let element = self.get_or_create(element)?;
                self.array_of(element, *dimensions)
            }
            TypeDescriptor::Class {
                name,
                type_arguments,
            } => self.class_descriptor(name, type_arguments),
            TypeDescriptor::TypeVariable { owner, name } => {
                let key = (self.intern_string(owner), self.intern_string(name));
                let id = self.params.borrow().by_name.get(&key).copied();
                match id {
                    Some(id) => Ok(self.intern(TypeData::TypeVariable(id))),
                    None => Err(EnvironmentError::UnknownTypeVariable {
                        owner: owner.clone(),
                        name: name.clone(),
                    }),
                }
            }
            TypeDescriptor::UnboundWildcard => Ok(TypeId::UNBOUND_WILDCARD),
            TypeDescriptor::ExtendsWildcard { bound } => {
                let bound = self.wildcard_bound(bound)?;
                Ok(self.intern(TypeData::ExtendsWildcard(bound)))
            }
            TypeDescriptor::SuperWildcard { bound } => {
                let bound = self.wildcard_bound(bound)?;
                Ok(self.intern(TypeData::SuperWildcard(bound)))
            }
            TypeDescriptor::Capture { wildcard, site } => {
                let wildcard = self.get_or_create(wildcard)?;
                self.capture(wildcard, *site)
            }
        }
    }

    /// Convenience: the type of a non-generic class or the raw type of a
    /// generic one.
    pub fn class_type(&self, name: &str) -> Result<TypeId, EnvironmentError> {
        self.class_descriptor(name, &[])
    }

    fn class_descriptor(
        &self,
        name: &str,
        arguments: &[TypeDescriptor],
    ) -> Result<TypeId, EnvironmentError> {
        let decl = match self.lookup_declaration(name) {
            Some(decl) => decl,
            None => match &self.config.root {
                RootPolicy::Named(root) if root == name => {
                    let top = self.intern_named_root(root);
                    return if arguments.is_empty() {
                        Ok(top)
                    } else {
                        Err(EnvironmentError::ArgumentCountMismatch {
                            name: name.to_string(),
                            expected: 0,
                            found: arguments.len(),
                        })
                    };
                }
                _ => return Err(EnvironmentError::UnknownDeclaration(name.to_string())),
            },
        };

        let mut resolved = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let ty = self.get_or_create(argument)?;
            let data = self.lookup(ty);
            if !data.is_reference() {
                return Err(EnvironmentError::InvalidTypeArgument {
                    name: name.to_string(),
                    reason: "type arguments must be reference types",
                });
            }
            if ty == TypeId::NULL {
                return Err(EnvironmentError::InvalidTypeArgument {
                    name: name.to_string(),
                    reason: "the null type is not a valid type argument",
                });
            }
            resolved.push(ty);
        }

        let expected = self.declaration_type_parameters(decl).len();
        let data = match (expected, resolved.len()) {
            (0, 0) => TypeData::Standard(decl),
            (_, 0) => TypeData::Raw(decl),
            (expected, found) if expected == found => TypeData::Parameterized {
                declaration: decl,
                arguments: self.intern_type_list(resolved),
            },
            (expected, found) => {
                return Err(EnvironmentError::ArgumentCountMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                });
            }
        };

        let ty = self.intern(data);
        self.note_class_type(decl, ty);
        Ok(ty)
    }

    fn wildcard_bound(&self, bound: &TypeDescriptor) -> Result<TypeId, EnvironmentError> {
        let bound = self.get_or_create(bound)?;
        let data = self.lookup(bound);
        if !data.is_reference() {
            return Err(EnvironmentError::InvalidWildcardBound(
                "wildcard bounds must be reference types",
            ));
        }
        if data.is_wildcard() {
            return Err(EnvironmentError::InvalidWildcardBound(
                "wildcard bounds cannot be wildcards",
            ));
        }
        if bound == TypeId::NULL {
            return Err(EnvironmentError::InvalidWildcardBound(
                "the null type is not a valid wildcard bound",
            ));
        }
        Ok(bound)
    }

    // -------------------------------------------------------------------------
    // Arrays
    // -------------------------------------------------------------------------

    /// `element` with `dimensions` more array levels. Nested arrays are
    /// flattened so the stored element is never itself an array.
    pub fn array_of(&self, element: TypeId, dimensions: u32) -> Result<TypeId, EnvironmentError> {
        if dimensions == 0 {
            return Err(EnvironmentError::ZeroArrayDimensions);
        }
        let (element, dimensions) = match self.lookup(element) {
            TypeData::Array {
                element: inner,
                dimensions: inner_dims,
            } => (inner, inner_dims.saturating_add(dimensions)),
            TypeData::Void => return Err(EnvironmentError::InvalidArrayElement("void")),
            TypeData::Null => return Err(EnvironmentError::InvalidArrayElement("the null type")),
            data if data.is_wildcard() => {
                return Err(EnvironmentError::InvalidArrayElement("a wildcard"));
            }
            _ => (element, dimensions),
        };
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(EnvironmentError::TooManyArrayDimensions(dimensions));
        }
        Ok(self.intern(TypeData::Array {
            element,
            dimensions,
        }))
    }

    /// The component type of an array: one dimension less, or the element.
    pub fn component_type(&self, array: TypeId) -> Option<TypeId> {
        match self.lookup(array) {
            TypeData::Array {
                element,
                dimensions: 1,
            } => Some(element),
            TypeData::Array {
                element,
                dimensions,
            } => Some(self.intern(TypeData::Array {
                element,
                dimensions: dimensions - 1,
            })),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Captures
    // -------------------------------------------------------------------------

    /// The capture of `wildcard` at `site`.
    pub fn capture(&self, wildcard: TypeId, site: u32) -> Result<TypeId, EnvironmentError> {
        self.capture_with_bounds(wildcard, site, &[])
    }

    /// The capture of `wildcard` at `site` with additional upper bounds
    /// contributed by the declared type parameter it stands for.
    pub(crate) fn capture_with_bounds(
        &self,
        wildcard: TypeId,
        site: u32,
        formal_bounds: &[TypeId],
    ) -> Result<TypeId, EnvironmentError> {
        let (lower_bound, mut upper_bounds) = match self.lookup(wildcard) {
            TypeData::UnboundWildcard => (TypeId::NULL, TypeListBuffer::new()),
            TypeData::ExtendsWildcard(bound) => (TypeId::NULL, smallvec::smallvec![bound]),
            TypeData::SuperWildcard(bound) => (bound, TypeListBuffer::new()),
            _ => return Err(EnvironmentError::CaptureOfNonWildcard),
        };
        for &bound in formal_bounds {
            if !upper_bounds.contains(&bound) && !self.is_top(bound) {
                upper_bounds.push(bound);
            }
        }

        let extra = self.intern_type_list(formal_bounds.to_vec());
        let key = (wildcard, site, extra);
        let existing = self.captures.borrow().by_key.get(&key).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                let mut captures = self.captures.borrow_mut();
                let id = CaptureId(captures.records.len() as u32);
                captures.records.push(CaptureInfo {
                    wildcard,
                    lower_bound,
                    upper_bounds,
                    site,
                });
                captures.by_key.insert(key, id);
                id
            }
        };
        Ok(self.intern(TypeData::Capture(id)))
    }

    pub fn capture_info(&self, capture: CaptureId) -> Option<CaptureInfo> {
        self.captures
            .borrow()
            .records
            .get(capture.0 as usize)
            .cloned()
    }

    /// Short human-readable form of a descriptor, for error messages.
    fn describe_descriptor(&self, descriptor: &TypeDescriptor) -> String {
        match descriptor {
            TypeDescriptor::Class { name, .. } => name.clone(),
            TypeDescriptor::Primitive { name } => name.name().to_string(),
            TypeDescriptor::TypeVariable { name, .. } => name.clone(),
            other => format!("{other:?}"),
        }
    }
}

// =============================================================================
// Intrinsics
// =============================================================================

fn intrinsic_id(data: &TypeData) -> Option<TypeId> {
    match data {
        TypeData::Primitive(kind) => Some(kind.to_type_id()),
        TypeData::Void => Some(TypeId::VOID),
        TypeData::Null => Some(TypeId::NULL),
        TypeData::UnboundWildcard => Some(TypeId::UNBOUND_WILDCARD),
        _ => None,
    }
}

fn intrinsic_data(id: TypeId) -> Option<TypeData> {
    if !id.is_intrinsic() {
        return None;
    }
    let data = match id {
        TypeId::VOID => TypeData::Void,
        TypeId::NULL => TypeData::Null,
        TypeId::UNBOUND_WILDCARD => TypeData::UnboundWildcard,
        other => {
            let kind = PrimitiveKind::ALL
                .into_iter()
                .find(|kind| kind.to_type_id() == other)?;
            TypeData::Primitive(kind)
        }
    };
    Some(data)
}

#[cfg(test)]
#[path = "../tests/environment_tests.rs"]
mod tests;
