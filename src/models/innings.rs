//! Extra-innings win probability.
//!
//! A team bats each inning until it makes three outs. With on-base probability
//! s per plate appearance, the number of non-out appearances K in one inning
//! is negative binomial, P(K = k) = C(k+2, 2)·(1−s)³·sᵏ, and the runs scored
//! are max(0, K − offset) where `offset` is the number of runners an inning
//! typically strands.
//!
//! Regulation is `baseline_innings` innings per side, the sum of independent
//! per-inning runs. A tie after regulation is decided one extra inning at a
//! time. As a [`TrialModel`], step 1 plays regulation and every later step one
//! extra inning, so the driver's absorbed mass is the probability the game has
//! been decided.

use serde::Serialize;

use crate::combinatorics::convolve_power;
use crate::constants::OUTCOME_TOLERANCE;
use crate::driver::{Run, RunOutcome};
use crate::error::{DomainError, EngineError};
use crate::probability::binomial_coefficient;
use crate::types::{neumaier_sum, RunConfig, Transition, TrialModel};

/// Run-scoring rate of one lineup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lineup {
    /// Probability that a plate appearance does not make an out.
    pub on_base_prob: f64,
    /// Runners stranded per inning.
    pub offset: u32,
}

impl Lineup {
    pub fn runs_per_inning(&self, max_runs: u32) -> Result<Vec<f64>, DomainError> {
        runs_per_inning(self.on_base_prob, self.offset, max_runs)
    }
}

/// Pmf of runs scored in one inning, indexed by runs.
///
/// Mass for more than `max_runs` runs is folded onto `max_runs`, so the pmf
/// sums to 1. Fails unless `on_base_prob` is in [0, 1).
pub fn runs_per_inning(
    on_base_prob: f64,
    offset: u32,
    max_runs: u32,
) -> Result<Vec<f64>, DomainError> {
    if !(0.0..1.0).contains(&on_base_prob) {
        return Err(DomainError::InvalidParameter {
            name: "on_base_prob",
            reason: format!("{on_base_prob} is outside [0, 1)"),
        });
    }
    let three_outs = (1.0 - on_base_prob).powi(3);
    let mut pmf = vec![0.0; max_runs as usize + 1];
    // Every k at or past this index scores at least `max_runs`.
    for k in 0..max_runs + offset {
        let runs = k.saturating_sub(offset) as usize;
        pmf[runs] += binomial_coefficient(k + 2, 2) * three_outs * on_base_prob.powi(k as i32);
    }
    let tail = 1.0 - neumaier_sum(pmf.iter().copied());
    pmf[max_runs as usize] += tail.max(0.0);
    Ok(pmf)
}

/// Outcome probabilities of one contest, from the first team's side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProb {
    pub win: f64,
    pub tie: f64,
    pub loss: f64,
}

/// (Σ a[i]·P(B < i), Σ a[i]·b[i]).
fn beats(a: &[f64], b: &[f64]) -> (f64, f64) {
    let mut below = 0.0;
    let mut wins = Vec::with_capacity(a.len());
    let mut ties = Vec::with_capacity(a.len());
    for (i, &pa) in a.iter().enumerate() {
        let at = b.get(i).copied().unwrap_or(0.0);
        wins.push(pa * below);
        ties.push(pa * at);
        below += at;
    }
    (neumaier_sum(wins), neumaier_sum(ties))
}

/// Win, tie and loss probability for independent run totals with pmfs `team`
/// and `opponent`.
pub fn compare(team: &[f64], opponent: &[f64]) -> WinProb {
    let (win, tie) = beats(team, opponent);
    let (loss, _) = beats(opponent, team);
    WinProb { win, tie, loss }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameState {
    Regulation,
    Tied,
    Won,
    Lost,
}

#[derive(Debug, Clone)]
pub struct InningsModel {
    regulation: WinProb,
    extra: WinProb,
    baseline_innings: u32,
}

impl InningsModel {
    /// Build from per-inning run pmfs. Fails if either pmf does not sum to 1
    /// or `baseline_innings` is zero.
    pub fn from_pmfs(
        team: &[f64],
        opponent: &[f64],
        baseline_innings: u32,
    ) -> Result<Self, DomainError> {
        if baseline_innings == 0 {
            return Err(DomainError::InvalidParameter {
                name: "baseline_innings",
                reason: "a game has at least one inning".to_string(),
            });
        }
        for (name, pmf) in [("team", team), ("opponent", opponent)] {
            let sum = neumaier_sum(pmf.iter().copied());
            if !((sum - 1.0).abs() <= OUTCOME_TOLERANCE) {
                return Err(DomainError::InvalidParameter {
                    name,
                    reason: format!("runs pmf sums to {sum}"),
                });
            }
        }
        let n = baseline_innings as usize;
        Ok(Self {
            regulation: compare(&convolve_power(team, n), &convolve_power(opponent, n)),
            extra: compare(team, opponent),
            baseline_innings,
        })
    }

    pub fn from_lineups(
        team: Lineup,
        opponent: Lineup,
        baseline_innings: u32,
        max_runs: u32,
    ) -> Result<Self, DomainError> {
        Self::from_pmfs(
            &team.runs_per_inning(max_runs)?,
            &opponent.runs_per_inning(max_runs)?,
            baseline_innings,
        )
    }

    pub fn regulation(&self) -> WinProb {
        self.regulation
    }

    /// Outcome of a single extra inning.
    pub fn extra_inning(&self) -> WinProb {
        self.extra
    }

    pub fn baseline_innings(&self) -> u32 {
        self.baseline_innings
    }
}

fn split(p: WinProb) -> Vec<Transition<GameState>> {
    vec![
        Transition {
            next_state: GameState::Won,
            prob: p.win,
        },
        Transition {
            next_state: GameState::Tied,
            prob: p.tie,
        },
        Transition {
            next_state: GameState::Lost,
            prob: p.loss,
        },
    ]
}

impl TrialModel for InningsModel {
    type State = GameState;

    fn initial_state(&self) -> GameState {
        GameState::Regulation
    }

    fn outcomes(&self, state: &GameState) -> Result<Vec<Transition<GameState>>, EngineError> {
        Ok(match state {
            GameState::Regulation => split(self.regulation),
            GameState::Tied => split(self.extra),
            decided => vec![Transition {
                next_state: *decided,
                prob: 1.0,
            }],
        })
    }

    fn is_absorbed(&self, state: &GameState) -> bool {
        matches!(state, GameState::Won | GameState::Lost)
    }
}

/// Cumulative outcome after a given number of innings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InningsRow {
    pub innings: u32,
    pub win: f64,
    pub tie: f64,
    pub loss: f64,
}

impl InningsRow {
    /// Win probability among decided games, `None` while nothing is decided.
    pub fn relative_win(&self) -> Option<f64> {
        let decided = self.win + self.loss;
        (decided > 0.0).then(|| self.win / decided)
    }
}

/// Play regulation, then extra innings until the tie probability is at most
/// `tie_tolerance` or `max_extra` extra innings have been played.
pub fn play_to_decision(
    model: &InningsModel,
    tie_tolerance: f64,
    max_extra: usize,
) -> Result<(Vec<InningsRow>, RunOutcome), EngineError> {
    let config = RunConfig {
        threshold: 1.0 - tie_tolerance,
        max_steps: max_extra + 1,
        keep_history: false,
    };
    let mut run = Run::new(model, config);
    let mut rows = Vec::new();
    while let Some(obs) = run.next() {
        let obs = obs?;
        let dist = run.distribution();
        rows.push(InningsRow {
            innings: model.baseline_innings + obs.step as u32 - 1,
            win: dist.mass(&GameState::Won),
            tie: dist.mass(&GameState::Tied),
            loss: dist.mass(&GameState::Lost),
        });
    }
    let outcome = run.outcome().unwrap_or(RunOutcome::StepLimitReached);
    Ok((rows, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_per_inning_values() {
        // s = 0.5: P(K = 0) = 1/8, P(K = 1) = 3/16, P(K = 2) = 3/16.
        let pmf = runs_per_inning(0.5, 0, 20).unwrap();
        assert!((pmf[0] - 0.125).abs() < 1e-15);
        assert!((pmf[1] - 0.1875).abs() < 1e-15);
        assert!((pmf[2] - 0.1875).abs() < 1e-15);
        assert!((pmf.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        // Offset 1: zero runs when K ∈ {0, 1}.
        let stranded = runs_per_inning(0.5, 1, 20).unwrap();
        assert!((stranded[0] - 0.3125).abs() < 1e-15);
        assert!((stranded[1] - 0.1875).abs() < 1e-15);
    }

    #[test]
    fn test_runs_per_inning_mean() {
        // Negative binomial mean: 3s / (1 − s).
        let pmf = runs_per_inning(0.3, 0, 200).unwrap();
        let mean: f64 = pmf.iter().enumerate().map(|(k, p)| k as f64 * p).sum();
        assert!((mean - 0.9 / 0.7).abs() < 1e-9, "mean={mean}");
    }

    #[test]
    fn test_runs_per_inning_folds_tail() {
        let pmf = runs_per_inning(0.9, 0, 3).unwrap();
        assert_eq!(pmf.len(), 4);
        assert!((pmf.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(pmf[3] > 0.9);
        assert!(runs_per_inning(1.0, 0, 3).is_err());
    }

    #[test]
    fn test_compare_hand_values() {
        let p = compare(&[0.5, 0.5], &[1.0]);
        assert_eq!(p, WinProb { win: 0.5, tie: 0.5, loss: 0.0 });

        let p = compare(&[0.25, 0.75], &[0.25, 0.75]);
        assert!((p.tie - 0.625).abs() < 1e-15);
        assert!((p.win - 0.1875).abs() < 1e-15);
        assert!((p.loss - 0.1875).abs() < 1e-15);
    }

    #[test]
    fn test_one_inning_coin_flip_decides_geometrically() {
        // Tie halves every inning: decided once 2^-n ≤ 1e-6, at n = 20.
        let model = InningsModel::from_pmfs(&[0.5, 0.5], &[1.0], 1).unwrap();
        let (rows, outcome) = play_to_decision(&model, 1e-6, 100).unwrap();
        assert_eq!(outcome, RunOutcome::Converged);
        assert_eq!(rows.len(), 20);
        assert_eq!(
            rows[0],
            InningsRow {
                innings: 1,
                win: 0.5,
                tie: 0.5,
                loss: 0.0
            }
        );
        let last = rows[19];
        assert_eq!(last.innings, 20);
        assert_eq!(last.tie, 0.5f64.powi(20));
        assert_eq!(last.loss, 0.0);
        assert_eq!(last.relative_win(), Some(1.0));
    }

    #[test]
    fn test_shutout_ties_forever() {
        let model = InningsModel::from_pmfs(&[1.0], &[1.0], 9).unwrap();
        let (rows, outcome) = play_to_decision(&model, 1e-6, 5).unwrap();
        assert_eq!(outcome, RunOutcome::StepLimitReached);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].innings, 14);
        assert_eq!(rows[5].tie, 1.0);
        assert_eq!(rows[5].relative_win(), None);
    }

    #[test]
    fn test_extra_innings_match_geometric_series() {
        let team = Lineup {
            on_base_prob: 0.35,
            offset: 2,
        };
        let opponent = Lineup {
            on_base_prob: 0.3,
            offset: 2,
        };
        let model = InningsModel::from_lineups(team, opponent, 9, 20).unwrap();
        let (rows, outcome) = play_to_decision(&model, 1e-9, 10_000).unwrap();
        assert_eq!(outcome, RunOutcome::Converged);

        // win = reg.win + reg.tie · extra.win / (1 − extra.tie)
        let (reg, extra) = (model.regulation(), model.extra_inning());
        let expected = reg.win + reg.tie * extra.win / (1.0 - extra.tie);
        let last = rows.last().unwrap();
        assert!((last.win - expected).abs() < 1e-8, "{} vs {expected}", last.win);
        assert!(last.win > last.loss);
        assert!((last.win + last.tie + last.loss - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_even_lineups_split_evenly() {
        let lineup = Lineup {
            on_base_prob: 0.33,
            offset: 1,
        };
        let model = InningsModel::from_lineups(lineup, lineup, 9, 20).unwrap();
        let (rows, _) = play_to_decision(&model, 1e-6, 1000).unwrap();
        for row in &rows {
            assert!((row.win - row.loss).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_unnormalized_pmf() {
        assert!(InningsModel::from_pmfs(&[0.5, 0.4], &[1.0], 9).is_err());
        assert!(InningsModel::from_pmfs(&[1.0], &[1.0], 0).is_err());
    }
}
