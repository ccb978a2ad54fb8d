//! Forward propagation: push a distribution through one trial.
//!
//! For every state s with mass m(s) and every outcome o with probability
//! p(o|s), the pair contributes m(s)·p(o|s) to the successor T(s, o). The input
//! distribution is read-only; the result is a fresh mapping.
//!
//! Large distributions run as a rayon map-reduce: each worker folds its share
//! of source states into a private successor map, and the maps are merged
//! pairwise. Contributions are additive, so no ordering between (state, outcome)
//! pairs matters beyond floating-point rounding.

use std::collections::HashMap;
use std::hash::Hash;

use rayon::prelude::*;

use crate::constants::{OUTCOME_TOLERANCE, PAR_MIN_STATES};
use crate::error::{DomainError, EngineError};
use crate::types::{neumaier_sum, Distribution, Transition, TrialModel};

/// Propagate one trial, choosing the serial or parallel path by distribution size.
pub fn propagate<M: TrialModel>(
    model: &M,
    dist: &Distribution<M::State>,
) -> Result<Distribution<M::State>, EngineError> {
    if dist.len() < PAR_MIN_STATES {
        propagate_serial(model, dist)
    } else {
        propagate_parallel(model, dist)
    }
}

/// Single-threaded propagation.
pub fn propagate_serial<M: TrialModel>(
    model: &M,
    dist: &Distribution<M::State>,
) -> Result<Distribution<M::State>, EngineError> {
    let mut next = HashMap::with_capacity(dist.len());
    for (state, &mass) in dist.entries() {
        accumulate(model, state, mass, &mut next)?;
    }
    Ok(Distribution::from_map(next))
}

/// Rayon map-reduce propagation.
pub fn propagate_parallel<M: TrialModel>(
    model: &M,
    dist: &Distribution<M::State>,
) -> Result<Distribution<M::State>, EngineError> {
    let next = dist
        .entries()
        .par_iter()
        .try_fold(HashMap::new, |mut acc, (state, &mass)| {
            accumulate(model, state, mass, &mut acc)?;
            Ok::<_, EngineError>(acc)
        })
        .try_reduce(HashMap::new, |a, b| Ok(merge(a, b)))?;
    Ok(Distribution::from_map(next))
}

/// Verify the outcomes of one state before they are used.
///
/// Fails if the probabilities do not sum to 1 within [`OUTCOME_TOLERANCE`], or
/// if the model declares a conserved population and a successor breaks it.
pub fn check_outcomes<M: TrialModel>(
    model: &M,
    state: &M::State,
    outcomes: &[Transition<M::State>],
) -> Result<(), EngineError> {
    let sum = neumaier_sum(outcomes.iter().map(|t| t.prob));
    // Negated so that a NaN sum fails too.
    if !((sum - 1.0).abs() <= OUTCOME_TOLERANCE) {
        return Err(EngineError::IncompleteOutcomes {
            state: format!("{state:?}"),
            sum,
        });
    }
    if let Some(expected) = model.population(state) {
        for t in outcomes {
            let got = model.population(&t.next_state).unwrap_or(expected);
            if got != expected {
                return Err(DomainError::PopulationChanged { expected, got }.into());
            }
        }
    }
    Ok(())
}

fn accumulate<M: TrialModel>(
    model: &M,
    state: &M::State,
    mass: f64,
    acc: &mut HashMap<M::State, f64>,
) -> Result<(), EngineError> {
    let outcomes = model.outcomes(state)?;
    check_outcomes(model, state, &outcomes)?;
    for t in outcomes {
        let contribution = mass * t.prob;
        if contribution > 0.0 {
            *acc.entry(t.next_state).or_insert(0.0) += contribution;
        }
    }
    Ok(())
}

/// Additive merge, folding the smaller map into the larger.
fn merge<S: Eq + Hash>(mut a: HashMap<S, f64>, mut b: HashMap<S, f64>) -> HashMap<S, f64> {
    if a.len() < b.len() {
        std::mem::swap(&mut a, &mut b);
    }
    for (state, mass) in b {
        *a.entry(state).or_insert(0.0) += mass;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Random walk on 0..=n, reflecting at both ends.
    struct Walk {
        n: u32,
    }

    impl TrialModel for Walk {
        type State = u32;

        fn initial_state(&self) -> u32 {
            0
        }

        fn outcomes(&self, &s: &u32) -> Result<Vec<Transition<u32>>, EngineError> {
            let down = if s == 0 { 1 } else { s - 1 };
            let up = if s == self.n { s - 1 } else { s + 1 };
            Ok(vec![
                Transition {
                    next_state: down,
                    prob: 0.5,
                },
                Transition {
                    next_state: up,
                    prob: 0.5,
                },
            ])
        }

        fn is_absorbed(&self, &s: &u32) -> bool {
            s == self.n
        }
    }

    /// Leaks mass: outcome probabilities sum to 0.9.
    struct Leaky;

    impl TrialModel for Leaky {
        type State = u8;

        fn initial_state(&self) -> u8 {
            0
        }

        fn outcomes(&self, _: &u8) -> Result<Vec<Transition<u8>>, EngineError> {
            Ok(vec![Transition {
                next_state: 1,
                prob: 0.9,
            }])
        }

        fn is_absorbed(&self, _: &u8) -> bool {
            false
        }
    }

    #[test]
    fn test_contributions_accumulate_on_shared_successor() {
        let walk = Walk { n: 4 };
        let d1 = propagate(&walk, &Distribution::point(0)).unwrap();
        // Reflecting at 0: both outcomes land on 1.
        assert_eq!(d1.len(), 1);
        assert!((d1.mass(&1) - 1.0).abs() < 1e-15);

        let d2 = propagate(&walk, &d1).unwrap();
        assert!((d2.mass(&0) - 0.5).abs() < 1e-15);
        assert!((d2.mass(&2) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_input_is_not_modified() {
        let walk = Walk { n: 4 };
        let d = Distribution::point(2);
        let _ = propagate(&walk, &d).unwrap();
        assert_eq!(d.len(), 1);
        assert_eq!(d.mass(&2), 1.0);
    }

    #[test]
    fn test_incomplete_outcomes_fail_loudly() {
        let err = propagate(&Leaky, &Distribution::point(0)).unwrap_err();
        match err {
            EngineError::IncompleteOutcomes { sum, .. } => assert!((sum - 0.9).abs() < 1e-12),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let walk = Walk { n: 2000 };
        let mut d = Distribution::point(0);
        for _ in 0..600 {
            d = propagate_serial(&walk, &d).unwrap();
        }
        assert!(d.len() >= PAR_MIN_STATES / 2);

        let serial = propagate_serial(&walk, &d).unwrap();
        let parallel = propagate_parallel(&walk, &d).unwrap();
        assert_eq!(serial.len(), parallel.len());
        assert!(serial.approx_eq(&parallel, 1e-14));
        assert!((parallel.total_mass() - 1.0).abs() < 1e-9);
    }
}
