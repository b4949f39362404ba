//! Constraint generation from program sites.
//!
//! The collaborator that owns the syntax tree hands in an ordered list of
//! [`Site`]s. Each site is translated into edges between constraint
//! variables; notation below is `[s]` for the expression at site `s` and
//! `Binding(b)` for a variable, field or parameter binding.
//!
//! | Site | Constraints |
//! |------|-------------|
//! | `Declaration` | `TypeUse(site) = Binding(b)`, `[init] <= Binding(b)` |
//! | `Reference` | `[site] = Binding(b)` |
//! | `Assignment` | `[value] <= [target]` |
//! | `Method` | `Binding(p_i) = Param(m, i)`, per override `m'`: `Param(m, i) = Param(m', i)`, `Return(m) <= Return(m')`, `Declaring(m) <= Declaring(m')` |
//! | `Return` | `[value] <= Return(m)` |
//! | `Invocation` | `[receiver] <= Declaring(m)`, `[arg_i] <= Param(m, i)`, `[site] = Return(m)`; one disjunction per position when there are several candidates |
//! | `FieldAccess` | `[receiver] <= Declaring(f)`, `[site] = Binding(f)` |
//! | `Conditional` | `[branch] <= [site]` |
//! | `Cast` | `[operand] <= TypeUse(site)` or `TypeUse(site) <= [operand]`, `TypeUse(site) = [site]` |
//! | `Requirement` | `[subject] <op> expected` |

use crate::constraints::{Constraint, ConstraintGraph, ConstraintOperator, SimpleConstraint};
use crate::descriptor::TypeDescriptor;
use crate::environment::TypeEnvironment;
use crate::variables::{ConstraintVariableFactory, SiteId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSite {
    pub binding: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

/// Either an expression site or a named binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRef {
    Site(SiteId),
    Binding(String),
}

/// One program position of interest, in traversal order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Site {
    /// `T b = init;` at `site`. `declaring` names the enclosing class for
    /// fields.
    Declaration {
        binding: String,
        site: SiteId,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
        #[serde(default)]
        initializer: Option<SiteId>,
        #[serde(default)]
        declaring: Option<String>,
    },
    /// An expression whose type the collaborator already knows.
    Expression {
        site: SiteId,
        #[serde(rename = "type", default)]
        ty: Option<TypeDescriptor>,
    },
    Reference {
        site: SiteId,
        binding: String,
    },
    Assignment {
        target: SiteId,
        value: SiteId,
    },
    Method {
        method: String,
        declaring: String,
        #[serde(default)]
        parameters: Vec<ParameterSite>,
        #[serde(default)]
        return_type: Option<TypeDescriptor>,
        #[serde(default)]
        overrides: Vec<String>,
    },
    Return {
        method: String,
        value: SiteId,
    },
    Invocation {
        site: SiteId,
        candidates: Vec<String>,
        #[serde(default)]
        receiver: Option<SiteId>,
        #[serde(default)]
        arguments: Vec<SiteId>,
    },
    FieldAccess {
        site: SiteId,
        #[serde(default)]
        receiver: Option<SiteId>,
        field: String,
    },
    Conditional {
        site: SiteId,
        branches: Vec<SiteId>,
    },
    Cast {
        site: SiteId,
        operand: SiteId,
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
    /// An externally imposed relation, e.g. "x must be assignable to
    /// `Animal`".
    Requirement {
        subject: SlotRef,
        expected: TypeDescriptor,
        #[serde(default = "default_relation")]
        relation: ConstraintOperator,
    },
}

fn default_relation() -> ConstraintOperator {
    ConstraintOperator::Subtype
}

/// Supplies the sites of one program in traversal order.
pub trait SiteSource {
    fn sites(&self) -> &[Site];
}

impl SiteSource for [Site] {
    fn sites(&self) -> &[Site] {
        self
    }
}

impl SiteSource for Vec<Site> {
    fn sites(&self) -> &[Site] {
        self
    }
}

/// Translates sites into a [`ConstraintGraph`].
#[derive(Clone, Debug, Default)]
pub struct ConstraintBuilder {
    free_bindings: IndexSet<String>,
}

impl ConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the solver choose the type of `binding` instead of keeping its
    /// declared type.
    pub fn with_free_binding(mut self, binding: impl Into<String>) -> Self {
        self.free_bindings.insert(binding.into());
        self
    }

    pub fn with_free_bindings<I, S>(mut self, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.free_bindings
            .extend(bindings.into_iter().map(Into::into));
        self
    }

    pub fn build<'env, S>(&self, env: &'env TypeEnvironment, source: &S) -> ConstraintGraph<'env>
    where
        S: SiteSource + ?Sized,
    {
        let mut graph = ConstraintGraph::new(env);
        for site in source.sites() {
            self.add_site(&mut graph, site);
        }
        for binding in &self.free_bindings {
            match graph.find_binding(binding) {
                Some(var) => graph.mark_free(var),
                None => warn!(binding = %binding, "free binding is not mentioned by any site"),
            }
        }
        debug!(
            variables = graph.variables().len(),
            constraints = graph.constraint_count(),
            "constraint graph built"
        );
        graph
    }

    pub fn add_site(&self, graph: &mut ConstraintGraph<'_>, site: &Site) {
        match site {
            Site::Declaration {
                binding,
                site,
                ty,
                initializer,
                declaring,
            } => {
                let declared = graph.type_use_variable(*site, Some(ty));
                let var = graph.raw_binding_variable(binding, Some(ty));
                graph.add_equal(declared, var);
                if let Some(init) = initializer {
                    let init = graph.expression_variable(*init, None);
                    graph.add_subtype(init, var);
                }
                if let Some(owner) = declaring {
                    graph.declaring_type_variable(binding, Some(&TypeDescriptor::class(owner)));
                }
            }
            Site::Expression { site, ty } => {
                graph.expression_variable(*site, ty.as_ref());
            }
            Site::Reference { site, binding } => {
                let var = graph.raw_binding_variable(binding, None);
                let expr = graph.expression_variable(*site, None);
                graph.add_equal(expr, var);
            }
            Site::Assignment { target, value } => {
                let target = graph.expression_variable(*target, None);
                let value = graph.expression_variable(*value, None);
                graph.add_subtype(value, target);
            }
            Site::Method {
                method,
                declaring,
                parameters,
                return_type,
                overrides,
            } => self.add_method(graph, method, declaring, parameters, return_type.as_ref(), overrides),
            Site::Return { method, value } => {
                let value = graph.expression_variable(*value, None);
                let ret = graph.return_type_variable(method, None);
                graph.add_subtype(value, ret);
            }
            Site::Invocation {
                site,
                candidates,
                receiver,
                arguments,
            } => self.add_invocation(graph, *site, candidates, *receiver, arguments),
            Site::FieldAccess {
                site,
                receiver,
                field,
            } => {
                if let Some(receiver) = receiver {
                    let receiver = graph.expression_variable(*receiver, None);
                    let declaring = graph.declaring_type_variable(field, None);
                    graph.add_subtype(receiver, declaring);
                }
                let var = graph.raw_binding_variable(field, None);
                let expr = graph.expression_variable(*site, None);
                graph.add_equal(expr, var);
            }
            Site::Conditional { site, branches } => {
                let result = graph.expression_variable(*site, None);
                for branch in branches {
                    let branch = graph.expression_variable(*branch, None);
                    graph.add_subtype(branch, result);
                }
            }
            Site::Cast { site, operand, ty } => {
                let cast = graph.type_use_variable(*site, Some(ty));
                let operand = graph.expression_variable(*operand, None);
                graph.add_or([
                    SimpleConstraint::subtype(operand, cast).into(),
                    SimpleConstraint::subtype(cast, operand).into(),
                ]);
                let expr = graph.expression_variable(*site, None);
                graph.add_equal(cast, expr);
            }
            Site::Requirement {
                subject,
                expected,
                relation,
            } => {
                let subject = match subject {
                    SlotRef::Site(site) => graph.expression_variable(*site, None),
                    SlotRef::Binding(binding) => graph.raw_binding_variable(binding, None),
                };
                match graph.env().get_or_create(expected) {
                    Ok(ty) => {
                        let expected = graph.resolved_type_variable(ty);
                        graph.add_simple(subject, *relation, expected);
                    }
                    Err(err) => debug!(%err, "requirement type does not resolve, skipped"),
                }
            }
        }
    }

    fn add_method(
        &self,
        graph: &mut ConstraintGraph<'_>,
        method: &str,
        declaring: &str,
        parameters: &[ParameterSite],
        return_type: Option<&TypeDescriptor>,
        overrides: &[String],
    ) {
        let owner = graph.declaring_type_variable(method, Some(&TypeDescriptor::class(declaring)));
        let ret = graph.return_type_variable(method, return_type);

        let mut params = Vec::with_capacity(parameters.len());
        for (i, parameter) in parameters.iter().enumerate() {
            let param = graph.parameter_variable(method, i as u32, Some(&parameter.ty));
            let binding = graph.raw_binding_variable(&parameter.binding, Some(&parameter.ty));
            graph.add_equal(binding, param);
            params.push(param);
        }

        for overridden in overrides {
            for (i, &param) in params.iter().enumerate() {
                let other = graph.parameter_variable(overridden, i as u32, None);
                graph.add_equal(param, other);
            }
            let other_ret = graph.return_type_variable(overridden, None);
            graph.add_subtype(ret, other_ret);
            let other_owner = graph.declaring_type_variable(overridden, None);
            graph.add_subtype(owner, other_owner);
        }
    }

    fn add_invocation(
        &self,
        graph: &mut ConstraintGraph<'_>,
        site: SiteId,
        candidates: &[String],
        receiver: Option<SiteId>,
        arguments: &[SiteId],
    ) {
        if candidates.is_empty() {
            debug!(site, "invocation without candidates, skipped");
            return;
        }
        let result = graph.expression_variable(site, None);

        if let Some(receiver) = receiver {
            let receiver = graph.expression_variable(receiver, None);
            let members = per_candidate(graph, candidates, |graph, method| {
                SimpleConstraint::subtype(receiver, graph.declaring_type_variable(method, None))
            });
            graph.add_or(members);
        }

        for (i, &argument) in arguments.iter().enumerate() {
            let argument = graph.expression_variable(argument, None);
            let members = per_candidate(graph, candidates, |graph, method| {
                SimpleConstraint::subtype(argument, graph.parameter_variable(method, i as u32, None))
            });
            graph.add_or(members);
        }

        let members = per_candidate(graph, candidates, |graph, method| {
            SimpleConstraint::equal(result, graph.return_type_variable(method, None))
        });
        graph.add_or(members);
    }
}

/// One member per candidate method. A single candidate yields a single
/// member, which [`ConstraintGraph::add_or`] adds as a simple constraint.
fn per_candidate(
    graph: &mut ConstraintGraph<'_>,
    candidates: &[String],
    mut edge: impl FnMut(&mut ConstraintGraph<'_>, &str) -> SimpleConstraint,
) -> Vec<Constraint> {
    let mut members = Vec::with_capacity(candidates.len());
    for method in candidates {
        members.push(Constraint::Simple(edge(graph, method)));
    }
    members
}

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod tests;
