//! Run defaults, numerical tolerances, and model defaults.
//!
//! Tolerances are absolute on a total mass of 1.0, so they double as relative
//! tolerances for the conservation check:
//! - per-state outcome sums must be within [`OUTCOME_TOLERANCE`] of 1
//! - per-step total mass within [`MASS_TOLERANCE`] is silent
//! - drift above [`MASS_TOLERANCE`] is a warning, above [`DRIFT_CEILING`] it is fatal

/// Default stopping threshold on cumulative absorbed mass.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Default step bound. Large but finite, so every run terminates.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Allowed deviation of Σ p(o|s) from 1 for the outcomes of a single state.
pub const OUTCOME_TOLERANCE: f64 = 1e-9;

/// Allowed deviation of a distribution's total mass from 1 before a warning is raised.
pub const MASS_TOLERANCE: f64 = 1e-9;

/// Hard ceiling on total-mass drift (1% relative). Beyond this the run aborts.
pub const DRIFT_CEILING: f64 = 1e-2;

/// Distributions with fewer entries than this are propagated on the calling thread.
pub const PAR_MIN_STATES: usize = 512;

/// Largest sub-trial count for which the binomial pmf is evaluated as a plain
/// product. C(512, 256) ≈ 4.7e152 still fits comfortably in f64.
pub const BINOMIAL_DIRECT_MAX_TRIALS: u32 = 512;

/// Error budget, in ulps per log-gamma term, assumed when a log-space
/// multinomial is exponentiated and rounded to an integer.
///
/// The absolute error of `exp(ln_value)` is roughly
/// `value · Σ|lgamma terms| · ROUNDING_ULPS · ε`. Rounding is exact only while
/// that bound stays below 0.5; above it the rounded value may be off by one or
/// more and the rounded multinomial reports `PrecisionExceeded` instead.
pub const ROUNDING_ULPS: f64 = 4.0;

// ── Shared-birthday defaults ────────────────────────────────────────────────

/// Number of slots (days in a year).
pub const DEFAULT_SLOTS: u32 = 365;

/// Number of people that must share one slot.
pub const DEFAULT_SHARED_TARGET: u32 = 2;

// ── Hit-streak defaults ─────────────────────────────────────────────────────

/// Per-at-bat hit probability.
pub const DEFAULT_HIT_PROB: f64 = 0.35;

/// At-bats (independent sub-trials) per game.
pub const DEFAULT_AT_BATS: u32 = 4;

/// Batting-average target for the per-game summaries.
pub const DEFAULT_BA_TARGET: f64 = 0.35;

/// Consecutive games with at least one hit.
pub const DEFAULT_STREAK_TARGET: u32 = 56;

/// Game checkpoints reported by the hit-streak front end.
pub const DEFAULT_GAME_CHECKS: [usize; 2] = [60, 162];

// ── Extra-innings defaults ──────────────────────────────────────────────────

/// Innings per side before extra innings.
pub const DEFAULT_BASELINE_INNINGS: u32 = 9;

/// Runs per inning tracked exactly; larger totals are folded onto this one.
pub const DEFAULT_MAX_INNING_RUNS: u32 = 20;

/// Extra innings stop once the tie probability is at most this.
pub const DEFAULT_TIE_TOLERANCE: f64 = 1e-6;

/// Bound on extra innings played.
pub const DEFAULT_MAX_EXTRA_INNINGS: usize = 10_000;
