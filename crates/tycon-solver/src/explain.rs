//! Structured reasons for failed assignability checks.
//!
//! This is the slow path: it is only taken after `can_assign_to` answered
//! `false`, to tell a conflict report *why*.

use crate::assign::AssignabilityChecker;
use crate::environment::TypeEnvironment;
use crate::format::TypeFormatter;
use crate::types::{TypeData, TypeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignabilityFailure {
    /// `void` appeared on either side.
    VoidInvolved,
    /// A primitive was compared with a reference type.
    NotAReference,
    /// Two different primitives.
    PrimitiveMismatch,
    /// The source never reaches the target declaration.
    UnrelatedTypes,
    /// The source reaches the target declaration but argument `index` is not
    /// contained by the target's argument.
    TypeArgumentMismatch { index: usize },
    /// Array components are not assignable.
    ArrayComponentMismatch,
    /// The source does not satisfy the target type variable's bound.
    BoundViolation { bound: TypeId },
    /// The target is a capture whose lower bound does not accept the source.
    CaptureLowerBound,
    /// The source is outside the target wildcard's bound.
    WildcardBound,
}

impl AssignabilityFailure {
    pub fn message(&self, formatter: &TypeFormatter<'_>) -> String {
        match self {
            AssignabilityFailure::VoidInvolved => "void is not assignable".to_string(),
            AssignabilityFailure::NotAReference => {
                "primitive and reference types are not interchangeable".to_string()
            }
            AssignabilityFailure::PrimitiveMismatch => "different primitive types".to_string(),
            AssignabilityFailure::UnrelatedTypes => "types are unrelated".to_string(),
            AssignabilityFailure::TypeArgumentMismatch { index } => {
                format!("type argument {} is not contained", index + 1)
            }
            AssignabilityFailure::ArrayComponentMismatch => {
                "array component types are incompatible".to_string()
            }
            AssignabilityFailure::BoundViolation { bound } => {
                format!("bound `{}` is not satisfied", formatter.format(*bound))
            }
            AssignabilityFailure::CaptureLowerBound => {
                "capture lower bound does not accept the type".to_string()
            }
            AssignabilityFailure::WildcardBound => "outside the wildcard bound".to_string(),
        }
    }
}

/// `None` when `source` is assignable to `target`, otherwise the reason it
/// is not.
pub fn explain_assignability(
    env: &TypeEnvironment,
    source: TypeId,
    target: TypeId,
) -> Option<AssignabilityFailure> {
    let mut checker = AssignabilityChecker::new(env);
    if checker.can_assign(source, target) {
        return None;
    }
    Some(classify_failure(&mut checker, source, target))
}

fn classify_failure(
    checker: &mut AssignabilityChecker<'_>,
    source: TypeId,
    target: TypeId,
) -> AssignabilityFailure {
    let env = checker.env();
    if source == TypeId::VOID || target == TypeId::VOID {
        return AssignabilityFailure::VoidInvolved;
    }

    let source_data = env.lookup(source);
    let target_data = env.lookup(target);
    match (&source_data, &target_data) {
        (TypeData::Primitive(_), TypeData::Primitive(_)) => AssignabilityFailure::PrimitiveMismatch,
        (TypeData::Primitive(_), _) | (_, TypeData::Primitive(_)) => {
            AssignabilityFailure::NotAReference
        }
        (TypeData::Array { .. }, TypeData::Array { .. }) => {
            AssignabilityFailure::ArrayComponentMismatch
        }
        (_, TypeData::Parameterized {
            declaration,
            arguments,
        }) => {
            let instantiated = env.instantiate_as_supertype(source, *declaration);
            let Some(TypeData::Parameterized {
                arguments: source_args,
                ..
            }) = instantiated.map(|ty| env.lookup(ty))
            else {
                return AssignabilityFailure::UnrelatedTypes;
            };
            let target_args = env.type_list(*arguments);
            let source_args = env.type_list(source_args);
            let failing = target_args.iter().zip(source_args.iter()).position(|(&t, &s)| {
                checker.reset();
                !checker.contains(t, s)
            });
            match failing {
                Some(index) => AssignabilityFailure::TypeArgumentMismatch { index },
                None => AssignabilityFailure::UnrelatedTypes,
            }
        }
        (_, TypeData::TypeVariable(param)) => {
            let bounds = env.type_parameter_bounds(*param);
            let failing = bounds.iter().copied().find(|&bound| {
                checker.reset();
                !checker.is_assignable(source, bound)
            });
            match failing.or_else(|| env.require_top()) {
                Some(bound) => AssignabilityFailure::BoundViolation { bound },
                None => AssignabilityFailure::UnrelatedTypes,
            }
        }
        (_, TypeData::Capture(_)) => AssignabilityFailure::CaptureLowerBound,
        (
            _,
            TypeData::UnboundWildcard | TypeData::ExtendsWildcard(_) | TypeData::SuperWildcard(_),
        ) => AssignabilityFailure::WildcardBound,
        _ => AssignabilityFailure::UnrelatedTypes,
    }
}

#[cfg(test)]
#[path = "../tests/explain_tests.rs"]
mod tests;
