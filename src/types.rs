//! Core data structures: distributions, transitions, observations, and the model trait.
//!
//! The central abstraction is [`TrialModel`], which bundles a trial probability
//! source, a transition generator, and an absorption predicate for one state
//! type. The propagator ([`crate::density::forward`]) and the iteration driver
//! ([`crate::driver`]) are generic over it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

use crate::constants::{DEFAULT_MAX_STEPS, DEFAULT_THRESHOLD};
use crate::error::EngineError;

/// A single weighted successor: from the current state to `next_state` with probability `prob`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub next_state: S,
    pub prob: f64,
}

/// One trial's worth of behavior for a family of discrete states.
///
/// Implementations must enumerate every structurally distinct outcome of a
/// trial in [`TrialModel::outcomes`]; the probabilities returned for one state
/// must sum to 1. The propagator checks this and fails on violation.
pub trait TrialModel: Sync {
    /// Immutable value type, compared and hashed by full structural content.
    type State: Clone + Eq + Hash + Debug + Send + Sync;

    /// The fully-unabsorbed state at step 0.
    fn initial_state(&self) -> Self::State;

    /// All successors of `state` under one trial, with their probabilities.
    fn outcomes(&self, state: &Self::State) -> Result<Vec<Transition<Self::State>>, EngineError>;

    /// Absorption predicate. Fixed for the lifetime of the model.
    fn is_absorbed(&self, state: &Self::State) -> bool;

    /// Conserved quantity carried by every reachable state, if the model has one.
    ///
    /// When `Some`, the propagator rejects successors whose population differs
    /// from their source's.
    fn population(&self, _state: &Self::State) -> Option<u64> {
        None
    }
}

/// Probability mass over mutually exclusive states.
///
/// Each state appears at most once; mass for a state accumulates additively
/// from every contribution. A distribution is never mutated after it has been
/// produced: propagation builds a fresh successor.
#[derive(Debug, Clone)]
pub struct Distribution<S> {
    mass: HashMap<S, f64>,
}

impl<S: Eq + Hash> Distribution<S> {
    /// Point mass: probability 1.0 on `state`.
    pub fn point(state: S) -> Self {
        let mut mass = HashMap::with_capacity(1);
        mass.insert(state, 1.0);
        Self { mass }
    }

    pub(crate) fn from_map(mass: HashMap<S, f64>) -> Self {
        Self { mass }
    }

    /// Number of distinct states carrying mass.
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Mass on `state` (0.0 if absent).
    pub fn mass(&self, state: &S) -> f64 {
        self.mass.get(state).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, f64)> {
        self.mass.iter().map(|(s, &m)| (s, m))
    }

    pub(crate) fn entries(&self) -> &HashMap<S, f64> {
        &self.mass
    }

    /// Total mass, with compensated summation.
    pub fn total_mass(&self) -> f64 {
        neumaier_sum(self.mass.values().copied())
    }

    /// Collapse the distribution onto a key, summing mass per key.
    pub fn marginal<K, F>(&self, key: F) -> HashMap<K, f64>
    where
        K: Eq + Hash,
        F: Fn(&S) -> K,
    {
        let mut out: HashMap<K, f64> = HashMap::new();
        for (state, &m) in &self.mass {
            *out.entry(key(state)).or_insert(0.0) += m;
        }
        out
    }

    /// Entries sorted by state, for stable export.
    pub fn to_sorted_vec(&self) -> Vec<(S, f64)>
    where
        S: Ord + Clone,
    {
        let mut entries: Vec<(S, f64)> = self.mass.iter().map(|(s, &m)| (s.clone(), m)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Whether every state carries the same mass (within `tol`) in both distributions.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        let covered = self
            .mass
            .iter()
            .all(|(s, &m)| (m - other.mass(s)).abs() <= tol);
        let extra = other
            .mass
            .iter()
            .filter(|(s, _)| !self.mass.contains_key(*s))
            .all(|(_, &m)| m.abs() <= tol);
        covered && extra
    }
}

/// Neumaier compensated sum.
///
/// Keeps total-mass checks meaningful when a distribution holds many tiny
/// masses next to a few large ones.
pub fn neumaier_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut sum = 0.0f64;
    let mut comp = 0.0f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            comp += (sum - t) + v;
        } else {
            comp += (v - t) + sum;
        }
        sum = t;
    }
    sum + comp
}

/// One (step, cumulative absorbed probability) record emitted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub step: usize,
    pub prob: f64,
}

/// Stopping criteria for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Stop as soon as the absorbed mass reaches this value.
    pub threshold: f64,
    /// Stop after this many steps regardless of the absorbed mass.
    pub max_steps: usize,
    /// Retain every step's distribution for inspection.
    pub keep_history: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_steps: DEFAULT_MAX_STEPS,
            keep_history: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_mass() {
        let d = Distribution::point(7u32);
        assert_eq!(d.len(), 1);
        assert_eq!(d.mass(&7), 1.0);
        assert_eq!(d.mass(&3), 0.0);
        assert!((d.total_mass() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_marginal_sums_per_key() {
        let mut map = HashMap::new();
        map.insert((0u32, 1u32), 0.25);
        map.insert((0, 2), 0.25);
        map.insert((1, 1), 0.5);
        let d = Distribution::from_map(map);

        let by_first = d.marginal(|&(a, _)| a);
        assert!((by_first[&0] - 0.5).abs() < 1e-12);
        assert!((by_first[&1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_neumaier_recovers_small_terms() {
        let mut values = vec![1.0];
        values.extend(std::iter::repeat(1e-17).take(1000));
        let naive: f64 = values.iter().sum();
        let compensated = neumaier_sum(values);
        assert_eq!(naive, 1.0);
        assert!((compensated - (1.0 + 1e-14)).abs() < 1e-16);
    }

    #[test]
    fn test_approx_eq_detects_extra_states() {
        let a = Distribution::point(1u8);
        let mut map = HashMap::new();
        map.insert(1u8, 0.9);
        map.insert(2u8, 0.1);
        let b = Distribution::from_map(map);
        assert!(!a.approx_eq(&b, 1e-6));
        assert!(a.approx_eq(&a.clone(), 0.0));
    }

    #[test]
    fn test_run_config_defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.max_steps, DEFAULT_MAX_STEPS);
        assert!(!cfg.keep_history);
    }
}
