//! Type representation for the nominal type model.
//!
//! Types are interned: every distinct structure is stored once in a
//! [`crate::TypeEnvironment`] and referred to through a [`TypeId`] handle.
//! Equality of handles is equality of types.
//!
//! Data that can be recursive (a class's declared supertypes, the bounds of a
//! type variable, the bounds of a capture) lives in side tables keyed by
//! [`DeclId`], [`TypeParamId`] and [`CaptureId`], which keeps [`TypeData`]
//! itself hashable and acyclic.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tycon_common::limits::TYPE_LIST_INLINE;

/// Short list of types, inline up to [`TYPE_LIST_INLINE`] entries.
pub type TypeListBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

// =============================================================================
// TypeId
// =============================================================================

/// Handle to an interned type.
///
/// The `env` half stamps the handle with the environment that created it.
/// Intrinsic types (primitives, `void`, `null`, `?`) carry the stamp `0` and
/// are valid in every environment.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId {
    pub(crate) env: u32,
    pub(crate) index: u32,
}

impl TypeId {
    pub const BOOLEAN: TypeId = TypeId::intrinsic(1);
    pub const BYTE: TypeId = TypeId::intrinsic(2);
    pub const CHAR: TypeId = TypeId::intrinsic(3);
    pub const SHORT: TypeId = TypeId::intrinsic(4);
    pub const INT: TypeId = TypeId::intrinsic(5);
    pub const LONG: TypeId = TypeId::intrinsic(6);
    pub const FLOAT: TypeId = TypeId::intrinsic(7);
    pub const DOUBLE: TypeId = TypeId::intrinsic(8);
    pub const VOID: TypeId = TypeId::intrinsic(9);
    pub const NULL: TypeId = TypeId::intrinsic(10);
    pub const UNBOUND_WILDCARD: TypeId = TypeId::intrinsic(11);

    /// First index available to environment-allocated types.
    pub const FIRST_USER: u32 = 16;

    const fn intrinsic(index: u32) -> Self {
        TypeId { env: 0, index }
    }

    #[inline]
    pub fn is_intrinsic(self) -> bool {
        self.index < Self::FIRST_USER
    }

    /// Raw arena index, for diagnostics and JSON output.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_intrinsic() {
            write!(f, "TypeId({})", self.index)
        } else {
            write!(f, "TypeId({}@{})", self.index, self.env)
        }
    }
}

// =============================================================================
// Side-table identifiers
// =============================================================================

/// Identifier of a class or interface declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Identifier of a declared type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// Identifier of a capture variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureId(pub u32);

/// Identifier of an interned type-argument list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeListId(pub u32);

impl TypeListId {
    pub const EMPTY: TypeListId = TypeListId(0);
}

// =============================================================================
// PrimitiveKind
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub const fn to_type_id(self) -> TypeId {
        match self {
            PrimitiveKind::Boolean => TypeId::BOOLEAN,
            PrimitiveKind::Byte => TypeId::BYTE,
            PrimitiveKind::Char => TypeId::CHAR,
            PrimitiveKind::Short => TypeId::SHORT,
            PrimitiveKind::Int => TypeId::INT,
            PrimitiveKind::Long => TypeId::LONG,
            PrimitiveKind::Float => TypeId::FLOAT,
            PrimitiveKind::Double => TypeId::DOUBLE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

// =============================================================================
// ClassKind
// =============================================================================

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

// =============================================================================
// TypeData
// =============================================================================

/// The closed set of type kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Primitive(PrimitiveKind),
    Void,
    Null,
    /// `element` is never an array; `dimensions >= 1`.
    Array { element: TypeId, dimensions: u32 },
    /// A non-generic class or interface.
    Standard(DeclId),
    /// A generic declaration applied to type arguments.
    Parameterized {
        declaration: DeclId,
        arguments: TypeListId,
    },
    /// A generic declaration used without type arguments.
    Raw(DeclId),
    TypeVariable(TypeParamId),
    UnboundWildcard,
    ExtendsWildcard(TypeId),
    SuperWildcard(TypeId),
    Capture(CaptureId),
}

/// Coarse classification of [`TypeData`], used for tracing and explanations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Primitive,
    Void,
    Null,
    Array,
    Standard,
    Parameterized,
    Raw,
    TypeVariable,
    UnboundWildcard,
    ExtendsWildcard,
    SuperWildcard,
    Capture,
}

impl TypeData {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeData::Primitive(_) => TypeKind::Primitive,
            TypeData::Void => TypeKind::Void,
            TypeData::Null => TypeKind::Null,
            TypeData::Array { .. } => TypeKind::Array,
            TypeData::Standard(_) => TypeKind::Standard,
            TypeData::Parameterized { .. } => TypeKind::Parameterized,
            TypeData::Raw(_) => TypeKind::Raw,
            TypeData::TypeVariable(_) => TypeKind::TypeVariable,
            TypeData::UnboundWildcard => TypeKind::UnboundWildcard,
            TypeData::ExtendsWildcard(_) => TypeKind::ExtendsWildcard,
            TypeData::SuperWildcard(_) => TypeKind::SuperWildcard,
            TypeData::Capture(_) => TypeKind::Capture,
        }
    }

    /// The generic or plain declaration behind a class-like type.
    pub fn declaration(&self) -> Option<DeclId> {
        match self {
            TypeData::Standard(decl)
            | TypeData::Raw(decl)
            | TypeData::Parameterized {
                declaration: decl, ..
            } => Some(*decl),
            _ => None,
        }
    }

    pub fn is_class_like(&self) -> bool {
        self.declaration().is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(
            self,
            TypeData::UnboundWildcard | TypeData::ExtendsWildcard(_) | TypeData::SuperWildcard(_)
        )
    }

    /// Whether values of this type are references (everything except
    /// primitives and `void`).
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeData::Primitive(_) | TypeData::Void)
    }
}

// =============================================================================
// Side-table records
// =============================================================================

/// Resolved information about a type parameter.
#[derive(Clone, Debug)]
pub struct TypeParamInfo {
    pub name: tycon_common::Atom,
    /// Owner key: the declaring class name, or a method key for generic methods.
    pub owner: tycon_common::Atom,
    /// Position within the owner's parameter list.
    pub index: u32,
}

/// A capture variable: the stand-in for one wildcard at one use site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureInfo {
    pub wildcard: TypeId,
    /// `TypeId::NULL` when the wildcard has no lower bound.
    pub lower_bound: TypeId,
    /// Empty means "bounded by the top type".
    pub upper_bounds: TypeListBuffer,
    pub site: u32,
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
