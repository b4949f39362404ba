//! Candidate selection for free variables.
//!
//! The candidates for a variable are the supertype closure of a base type,
//! least specific last: ordered by distance from the base, then by the order
//! in which the builder first observed each type, then by discovery order.
//! The first candidate that fits between the lower and upper bounds wins, so
//! with several lower bounds the choice is their least common supertype on
//! the closure of the first one.

use crate::assign::CachedAssignability;
use crate::types::TypeId;

/// A bound contributed by one constraint edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bound {
    pub(crate) ty: TypeId,
    /// From a `<` edge: the candidate must also differ from `ty`.
    pub(crate) strict: bool,
}

impl Bound {
    pub(crate) fn new(ty: TypeId, strict: bool) -> Self {
        Bound { ty, strict }
    }
}

/// Supertype closure of `base`, in candidate order.
pub(crate) fn candidates(
    relation: &CachedAssignability<'_>,
    base: TypeId,
    observation_index: impl Fn(TypeId) -> Option<usize>,
) -> Vec<TypeId> {
    let closure = relation.env().supertype_closure(base);
    let mut ordered: Vec<(TypeId, u32)> = closure.into_iter().collect();
    // Stable: ties keep their breadth-first discovery order.
    ordered.sort_by_key(|&(ty, distance)| (distance, observation_index(ty).unwrap_or(usize::MAX)));
    ordered.into_iter().map(|(ty, _)| ty).collect()
}

/// Does `candidate` fit between the bounds?
pub(crate) fn satisfies(
    relation: &mut CachedAssignability<'_>,
    candidate: TypeId,
    lower: &[Bound],
    upper: &[Bound],
) -> bool {
    lower
        .iter()
        .all(|b| !(b.strict && b.ty == candidate) && relation.can_assign(b.ty, candidate))
        && upper
            .iter()
            .all(|b| !(b.strict && b.ty == candidate) && relation.can_assign(candidate, b.ty))
}

/// The type a free class settles on.
///
/// The base is the first lower bound other than `null`, else the seed, else
/// the first upper bound. When no candidate fits, the base is returned and
/// verification reports the conflict.
pub(crate) fn select(
    relation: &mut CachedAssignability<'_>,
    seed: Option<TypeId>,
    lower: &[Bound],
    upper: &[Bound],
    observation_index: impl Fn(TypeId) -> Option<usize>,
) -> Option<TypeId> {
    let base = lower
        .iter()
        .map(|b| b.ty)
        .find(|&ty| ty != TypeId::NULL)
        .or(seed)
        .or_else(|| upper.first().map(|b| b.ty))
        .or_else(|| lower.first().map(|b| b.ty))?;

    if lower.is_empty() && upper.is_empty() {
        return Some(base);
    }
    Some(select_within(relation, base, lower, upper, observation_index))
}

/// The first candidate of `base`'s closure that fits, else `base`.
pub(crate) fn select_within(
    relation: &mut CachedAssignability<'_>,
    base: TypeId,
    lower: &[Bound],
    upper: &[Bound],
    observation_index: impl Fn(TypeId) -> Option<usize>,
) -> TypeId {
    candidates(relation, base, observation_index)
        .into_iter()
        .find(|&candidate| satisfies(relation, candidate, lower, upper))
        .unwrap_or(base)
}

#[cfg(test)]
#[path = "../tests/widening_tests.rs"]
mod tests;
