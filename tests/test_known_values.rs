//! Known probabilities and cross-checks between propagation and closed forms.

use exact_odds::combinatorics::{closed_form_distribution, convolve_power, shared_slot_probability};
use exact_odds::driver::{run_to_end, Run, RunOutcome, RunPhase};
use exact_odds::error::EngineError;
use exact_odds::models::birthday::BirthdayModel;
use exact_odds::models::hit_streak::{hits_marginal, season_summaries, summarize, HitStreakModel};
use exact_odds::probability::binomial_pmf;
use exact_odds::types::{RunConfig, Transition, TrialModel};

fn config(threshold: f64, max_steps: usize, keep_history: bool) -> RunConfig {
    RunConfig {
        threshold,
        max_steps,
        keep_history,
    }
}

#[test]
fn test_birthday_crosses_half_at_23() {
    let model = BirthdayModel::new(365, 2).unwrap();
    let report = run_to_end(&model, RunConfig::default()).unwrap();
    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.observations.len(), 23);

    let p22 = report.observations[21].prob;
    let p23 = report.observations[22].prob;
    assert!(p22 < 0.5, "p22={p22}");
    assert!(p23 >= 0.5, "p23={p23}");
    assert!((p22 - 0.475_695_307_7).abs() < 1e-9, "p22={p22}");
    assert!((p23 - 0.507_297_234_3).abs() < 1e-9, "p23={p23}");
    assert_eq!(report.drift_warnings, 0);
}

#[test]
fn test_birthday_triple_crosses_half_at_88() {
    let model = BirthdayModel::new(365, 3).unwrap();
    let report = run_to_end(&model, RunConfig::default()).unwrap();
    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.observations.last().unwrap().step, 88);
    assert!(report.observations[86].prob < 0.5);
}

#[test]
fn test_propagation_matches_closed_form_distribution() {
    for target in 1..=3 {
        let model = BirthdayModel::new(5, target).unwrap();
        let report = run_to_end(&model, config(2.0, 10, true)).unwrap();
        assert_eq!(report.history.len(), 11);

        for (people, dist) in report.history.iter().enumerate() {
            let closed = closed_form_distribution(people as u32, 5, target).unwrap();
            assert!(
                dist.approx_eq(&closed, 1e-6),
                "target={target} people={people}: {:?} vs {:?}",
                dist.to_sorted_vec(),
                closed.to_sorted_vec()
            );
        }
        for obs in &report.observations {
            let closed = shared_slot_probability(obs.step as u32, 5, target).unwrap();
            assert!((obs.prob - closed).abs() < 1e-6, "step {}", obs.step);
        }
    }
}

#[test]
fn test_unreachable_threshold_stops_at_step_bound() {
    let model = BirthdayModel::new(365, 2).unwrap();
    let report = run_to_end(&model, config(2.0, 30, false)).unwrap();
    assert_eq!(report.outcome, RunOutcome::StepLimitReached);
    assert_eq!(report.observations.len(), 30);
    let steps: Vec<usize> = report.observations.iter().map(|o| o.step).collect();
    assert_eq!(steps, (1..=30).collect::<Vec<_>>());
}

#[test]
fn test_two_game_streak_sequence() {
    // One fair at-bat per game, streak of two.
    let model = HitStreakModel::new(1, 0.5, 2).unwrap();
    let report = run_to_end(&model, config(0.5, 100, false)).unwrap();
    let probs: Vec<f64> = report.observations.iter().map(|o| o.prob).collect();
    assert_eq!(probs, vec![0.0, 0.25, 0.375, 0.5]);
    assert_eq!(report.outcome, RunOutcome::Converged);
}

#[test]
fn test_hits_marginal_is_binomial() {
    let model = HitStreakModel::new(4, 0.3, 3).unwrap();
    let games = 6;
    let report = run_to_end(&model, config(2.0, games, false)).unwrap();
    let marginal = hits_marginal(&report.final_distribution);
    let convolved = convolve_power(model.hits_per_game().as_slice(), games);
    assert_eq!(marginal.len(), convolved.len());
    for (k, (&m, &c)) in marginal.iter().zip(&convolved).enumerate() {
        let exact = binomial_pmf(24, 0.3, k as u32);
        assert!((m - c).abs() < 1e-12, "k={k}");
        assert!((m - exact).abs() < 1e-12, "k={k}");
    }
}

#[test]
fn test_summary_after_one_game() {
    let model = HitStreakModel::new(4, 0.35, 56).unwrap();
    let report = run_to_end(&model, config(2.0, 1, false)).unwrap();
    let summary = summarize(&report.final_distribution, 1, 4, 0.35);
    // BA ≥ .350 over 4 at-bats needs at least 2 hits.
    let expected: f64 = (2..=4).map(|k| binomial_pmf(4, 0.35, k)).sum();
    assert!((summary.batting_average - expected).abs() < 1e-12);
    assert_eq!(summary.streak, 0.0);
    assert_eq!(summary.both, 0.0);
}

#[test]
fn test_hundreds_of_at_bats_per_game() {
    // C(1100, 550) overflows f64; the pmf must not.
    let model = HitStreakModel::new(1100, 0.5, 3).unwrap();
    let report = run_to_end(&model, config(2.0, 2, false)).unwrap();
    assert_eq!(report.outcome, RunOutcome::StepLimitReached);
    assert_eq!(report.drift_warnings, 0);
    assert!((report.final_distribution.total_mass() - 1.0).abs() < 1e-9);
}

#[test]
fn test_checkpoints_after_the_streak_is_likely() {
    // The streak probability crosses 0.5 at game 26; later checkpoints still count.
    let model = HitStreakModel::new(4, 0.35, 10).unwrap();
    let summaries = season_summaries(&model, 60, &[20, 40, 60], 0.35).unwrap();
    assert_eq!(summaries.len(), 3);
    assert!(summaries[0].streak < 0.5);
    assert!(summaries[1].streak > 0.5);
    assert!(summaries.windows(2).all(|w| w[1].streak >= w[0].streak));
    assert!(summaries.iter().all(|s| s.batting_average > 0.0));
}

/// Outcome probabilities short of 1 by 10%.
struct Short;

impl TrialModel for Short {
    type State = u32;

    fn initial_state(&self) -> u32 {
        0
    }

    fn outcomes(&self, state: &u32) -> Result<Vec<Transition<u32>>, EngineError> {
        Ok(vec![Transition {
            next_state: state + 1,
            prob: 0.9,
        }])
    }

    fn is_absorbed(&self, _: &u32) -> bool {
        false
    }
}

#[test]
fn test_incomplete_outcomes_fail_the_run() {
    let mut run = Run::new(&Short, config(0.5, 10, false));
    match run.next() {
        Some(Err(EngineError::IncompleteOutcomes { sum, .. })) => {
            assert!((sum - 0.9).abs() < 1e-12)
        }
        other => panic!("expected IncompleteOutcomes, got {other:?}"),
    }
    assert_eq!(run.phase(), RunPhase::Failed);
    assert!(run.next().is_none());
    assert!(run_to_end(&Short, config(0.5, 10, false)).is_err());
}
