//! Hit-streak model.
//!
//! A batter takes `m` independent at-bats per game, each a hit with
//! probability p, so the hits in one game follow Binomial(m, p). The state
//! after g games is (total hits, current streak of games with a hit, whether
//! the streak target has ever been reached). The run is absorbed once the
//! streak has reached `streak_target` games.
//!
//! Besides the streak, per-game summaries report the probability of finishing
//! with a batting average at or above a target, and of both at once.

use serde::Serialize;

use crate::density::absorption::absorbed_mass;
use crate::driver::Run;
use crate::error::{DomainError, EngineError};
use crate::probability::BinomialTable;
use crate::transitions::{hit_streak_advance, HitState};
use crate::types::{Distribution, Observation, RunConfig, Transition, TrialModel};

#[derive(Debug, Clone)]
pub struct HitStreakModel {
    table: BinomialTable,
    streak_target: u32,
}

impl HitStreakModel {
    /// Fails if `hit_prob` is not a probability or `streak_target` is zero.
    pub fn new(at_bats: u32, hit_prob: f64, streak_target: u32) -> Result<Self, DomainError> {
        if streak_target == 0 {
            return Err(DomainError::InvalidParameter {
                name: "streak_target",
                reason: "the streak must be at least one game".to_string(),
            });
        }
        Ok(Self {
            table: BinomialTable::new(at_bats, hit_prob)?,
            streak_target,
        })
    }

    pub fn at_bats(&self) -> u32 {
        self.table.trials()
    }

    pub fn hit_prob(&self) -> f64 {
        self.table.success_prob()
    }

    pub fn streak_target(&self) -> u32 {
        self.streak_target
    }

    /// Per-game hit pmf.
    pub fn hits_per_game(&self) -> &BinomialTable {
        &self.table
    }
}

impl TrialModel for HitStreakModel {
    type State = HitState;

    fn initial_state(&self) -> HitState {
        HitState::default()
    }

    fn outcomes(&self, state: &HitState) -> Result<Vec<Transition<HitState>>, EngineError> {
        Ok((0..=self.table.trials())
            .map(|k| Transition {
                next_state: hit_streak_advance(*state, k, self.streak_target),
                prob: self.table.prob(k),
            })
            .collect())
    }

    fn is_absorbed(&self, state: &HitState) -> bool {
        state.reached
    }
}

// ── Seasons ─────────────────────────────────────────────────────────────────

/// Play every one of `games` games, calling `on_game` with the distribution
/// after each game, game 0 included.
///
/// Reaching the streak target does not end the season: the batting-average
/// figures keep changing after the streak probability saturates.
pub fn play_season<F, E>(
    model: &HitStreakModel,
    games: usize,
    mut on_game: F,
) -> Result<Vec<Observation>, E>
where
    F: FnMut(usize, &Distribution<HitState>) -> Result<(), E>,
    E: From<EngineError>,
{
    let config = RunConfig {
        threshold: f64::INFINITY,
        max_steps: games,
        keep_history: false,
    };
    let mut run = Run::new(model, config);
    on_game(0, run.distribution())?;

    let mut observations = Vec::with_capacity(games);
    while let Some(obs) = run.next() {
        let obs = obs?;
        on_game(obs.step, run.distribution())?;
        observations.push(obs);
    }
    Ok(observations)
}

/// Summaries at each game in `checkpoints` that the season reaches, in game order.
pub fn season_summaries(
    model: &HitStreakModel,
    games: usize,
    checkpoints: &[usize],
    ba_target: f64,
) -> Result<Vec<HitSummary>, EngineError> {
    let mut checkpoints = checkpoints.to_vec();
    checkpoints.sort_unstable();
    checkpoints.dedup();

    let mut summaries = Vec::with_capacity(checkpoints.len());
    play_season(model, games, |game, dist| {
        if checkpoints.binary_search(&game).is_ok() {
            summaries.push(summarize(dist, game, model.at_bats(), ba_target));
        }
        Ok::<_, EngineError>(())
    })?;
    Ok(summaries)
}

// ── Summaries ───────────────────────────────────────────────────────────────

/// Batting average after `games` games of `at_bats` at-bats, if any were taken.
pub fn batting_average(state: &HitState, games: usize, at_bats: u32) -> Option<f64> {
    let total_ab = games as u64 * at_bats as u64;
    if total_ab == 0 {
        return None;
    }
    Some(state.hits as f64 / total_ab as f64)
}

/// Target probabilities for one game checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitSummary {
    pub games: usize,
    /// P(streak target reached).
    pub streak: f64,
    /// P(batting average ≥ target).
    pub batting_average: f64,
    /// P(both).
    pub both: f64,
}

/// Summarize a distribution observed after `games` games.
pub fn summarize(
    dist: &Distribution<HitState>,
    games: usize,
    at_bats: u32,
    ba_target: f64,
) -> HitSummary {
    let reaches_ba =
        |s: &HitState| batting_average(s, games, at_bats).is_some_and(|ba| ba >= ba_target);
    HitSummary {
        games,
        streak: absorbed_mass(dist, |s| s.reached),
        batting_average: absorbed_mass(dist, reaches_ba),
        both: absorbed_mass(dist, |s| s.reached && reaches_ba(s)),
    }
}

/// Pmf over total hits, indexed by hit count.
pub fn hits_marginal(dist: &Distribution<HitState>) -> Vec<f64> {
    let by_hits = dist.marginal(|s| s.hits);
    let max_hits = by_hits.keys().copied().max().unwrap_or(0) as usize;
    let mut pmf = vec![0.0; max_hits + 1];
    for (hits, mass) in by_hits {
        pmf[hits as usize] += mass;
    }
    pmf
}

/// One exported row of the full state table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateRow {
    pub games: usize,
    pub hits: u32,
    pub current_streak: u32,
    pub did_reach_streak_target: u8,
    pub prob: f64,
    pub total_ab: u64,
    /// `None` before the first game.
    pub ba: Option<f64>,
}

/// Rows for every state of `dist`, sorted by state.
pub fn state_rows(dist: &Distribution<HitState>, games: usize, at_bats: u32) -> Vec<StateRow> {
    dist.to_sorted_vec()
        .into_iter()
        .map(|(s, prob)| StateRow {
            games,
            hits: s.hits,
            current_streak: s.current_streak,
            did_reach_streak_target: s.reached_flag(),
            prob,
            total_ab: games as u64 * at_bats as u64,
            ba: batting_average(&s, games, at_bats),
        })
        .collect()
}
