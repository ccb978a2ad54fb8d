//! Absorption tracking: mass on states satisfying a target predicate.

use std::hash::Hash;

use crate::types::{neumaier_sum, Distribution, TrialModel};

/// Σ m(s) over every state `s` in `dist` for which `predicate(s)` holds.
///
/// Read-only: calling it repeatedly on the same distribution gives the same value.
pub fn absorbed_mass<S, P>(dist: &Distribution<S>, predicate: P) -> f64
where
    S: Eq + Hash,
    P: Fn(&S) -> bool,
{
    neumaier_sum(dist.iter().filter(|(s, _)| predicate(s)).map(|(_, m)| m))
}

/// Absorbed mass under the model's own absorption predicate.
pub fn model_absorbed_mass<M: TrialModel>(model: &M, dist: &Distribution<M::State>) -> f64 {
    absorbed_mass(dist, |s| model.is_absorbed(s))
}
