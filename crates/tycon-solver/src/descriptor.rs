//! Nominal descriptors handed in by the binding collaborator.
//!
//! Descriptors are plain data: they name declarations by their qualified name
//! and nest structurally. The environment turns them into canonical
//! [`TypeId`](crate::TypeId)s.

use crate::types::{ClassKind, PrimitiveKind};
use serde::{Deserialize, Serialize};

/// Structural description of a type use.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive {
        name: PrimitiveKind,
    },
    Void,
    Null,
    Array {
        element: Box<TypeDescriptor>,
        #[serde(default = "one")]
        dimensions: u32,
    },
    /// A class or interface. No arguments on a generic declaration means the
    /// raw type.
    Class {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_arguments: Vec<TypeDescriptor>,
    },
    TypeVariable {
        owner: String,
        name: String,
    },
    UnboundWildcard,
    ExtendsWildcard {
        bound: Box<TypeDescriptor>,
    },
    SuperWildcard {
        bound: Box<TypeDescriptor>,
    },
    /// The capture of `wildcard` at use site `site`.
    Capture {
        wildcard: Box<TypeDescriptor>,
        site: u32,
    },
}

fn one() -> u32 {
    1
}

impl TypeDescriptor {
    pub fn primitive(name: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive { name }
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeDescriptor::Class {
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    pub fn parameterized(name: impl Into<String>, type_arguments: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Class {
            name: name.into(),
            type_arguments,
        }
    }

    pub fn array(element: TypeDescriptor, dimensions: u32) -> Self {
        TypeDescriptor::Array {
            element: Box::new(element),
            dimensions,
        }
    }

    pub fn type_variable(owner: impl Into<String>, name: impl Into<String>) -> Self {
        TypeDescriptor::TypeVariable {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn extends(bound: TypeDescriptor) -> Self {
        TypeDescriptor::ExtendsWildcard {
            bound: Box::new(bound),
        }
    }

    pub fn super_of(bound: TypeDescriptor) -> Self {
        TypeDescriptor::SuperWildcard {
            bound: Box::new(bound),
        }
    }

    pub fn capture(wildcard: TypeDescriptor, site: u32) -> Self {
        TypeDescriptor::Capture {
            wildcard: Box::new(wildcard),
            site,
        }
    }
}

/// A declared type parameter: its name and the bound descriptors after
/// `extends` (`A & B & C`). No bounds means bounded by the top type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParameterDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<TypeDescriptor>,
}

impl TypeParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn with_bound(mut self, bound: TypeDescriptor) -> Self {
        self.bounds.push(bound);
        self
    }
}

/// A class or interface declaration.
///
/// Supertype descriptors may refer to the declaration's own type parameters
/// through `TypeVariable { owner: <this name>, .. }` and may forward-reference
/// declarations that are registered later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<TypeParameterDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeDescriptor>,
}

impl ClassDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::class(name)
        }
    }

    pub fn with_type_parameter(mut self, parameter: TypeParameterDescriptor) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn extends(mut self, superclass: TypeDescriptor) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeDescriptor) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Whether the declaration names no supertype at all.
    pub fn has_no_explicit_supertypes(&self) -> bool {
        self.superclass.is_none() && self.interfaces.is_empty()
    }
}
