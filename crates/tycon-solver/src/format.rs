//! Java-like display of types, for reports and debugging.

use crate::environment::TypeEnvironment;
use crate::types::{DeclId, TypeData, TypeId};
use std::fmt::Write;

pub struct TypeFormatter<'env> {
    env: &'env TypeEnvironment,
    qualified: bool,
}

impl<'env> TypeFormatter<'env> {
    pub fn new(env: &'env TypeEnvironment) -> Self {
        TypeFormatter {
            env,
            qualified: false,
        }
    }

    /// Print fully qualified declaration names instead of simple names.
    pub fn with_qualified_names(mut self, qualified: bool) -> Self {
        self.qualified = qualified;
        self
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        match self.env.lookup(ty) {
            TypeData::Primitive(kind) => out.push_str(kind.name()),
            TypeData::Void => out.push_str("void"),
            TypeData::Null => out.push_str("null"),
            TypeData::Array {
                element,
                dimensions,
            } => {
                self.write_type(out, element);
                for _ in 0..dimensions {
                    out.push_str("[]");
                }
            }
            TypeData::Standard(decl) | TypeData::Raw(decl) => {
                out.push_str(&self.declaration(decl));
            }
            TypeData::Parameterized {
                declaration,
                arguments,
            } => {
                out.push_str(&self.declaration(declaration));
                out.push('<');
                for (i, &arg) in self.env.type_list(arguments).iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, arg);
                }
                out.push('>');
            }
            TypeData::TypeVariable(param) => match self.env.type_parameter_info(param) {
                Some(info) => out.push_str(&self.env.resolve_atom(info.name)),
                None => out.push_str("<unknown type variable>"),
            },
            TypeData::UnboundWildcard => out.push('?'),
            TypeData::ExtendsWildcard(bound) => {
                out.push_str("? extends ");
                self.write_type(out, bound);
            }
            TypeData::SuperWildcard(bound) => {
                out.push_str("? super ");
                self.write_type(out, bound);
            }
            TypeData::Capture(capture) => match self.env.capture_info(capture) {
                Some(info) => {
                    let _ = write!(out, "capture#{} of ", info.site);
                    self.write_type(out, info.wildcard);
                }
                None => out.push_str("<unknown capture>"),
            },
        }
    }

    fn declaration(&self, decl: DeclId) -> String {
        let name = self.env.declaration_name(decl);
        if self.qualified {
            return name.to_string();
        }
        match name.rsplit_once('.') {
            Some((_, simple)) => simple.to_string(),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
