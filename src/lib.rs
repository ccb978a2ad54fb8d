//! # Exact Odds: exact probability propagation over discrete trial state spaces
//!
//! Computes the exact probability that a process evolving one independent trial
//! at a time reaches a target condition: "at least two of N people share a
//! birthday", "a batter hits in 56 straight games", "the home team wins,
//! extra innings included", and the like.
//!
//! ## Algorithm overview
//!
//! | Stage | Rust module | Description |
//! |-------|-------------|-------------|
//! | Trial probabilities | [`probability`] | Occupancy fan-out cᵢ/Σc, precomputed binomial pmf |
//! | Transitions | [`transitions`] | Deterministic successor per (state, outcome): bucket advance with saturation, hit-streak advance with a latched flag |
//! | Propagation | [`density::forward`] | D′[T(s,o)] += m(s)·p(o\|s), serial or rayon map-reduce |
//! | Absorption | [`density::absorption`] | Σ m(s) over states satisfying the target predicate |
//! | Iteration | [`driver`] | Lazy observation stream, stops at a probability threshold or a step bound |
//! | Cross-check | [`combinatorics`] | Closed-form multinomial × arrangement count over occupancy partitions |
//!
//! Concrete models live in [`models`]; each implements [`types::TrialModel`].
//!
//! ## Invariants
//!
//! - Every distribution's total mass is 1 within 1e-9. Drift beyond that is
//!   logged as a warning; beyond 1% the run aborts.
//! - The outcome probabilities generated for any state sum to 1. A violation is
//!   a model bug and fails the step; it is never renormalized away.
//! - A distribution is never mutated once produced. Each step builds a fresh one.
//!
//! ## Example
//!
//! ```rust
//! use exact_odds::driver::{run_to_end, RunOutcome};
//! use exact_odds::models::birthday::BirthdayModel;
//! use exact_odds::types::RunConfig;
//!
//! let model = BirthdayModel::new(365, 2).unwrap();
//! let report = run_to_end(&model, RunConfig::default()).unwrap();
//! assert_eq!(report.outcome, RunOutcome::Converged);
//! assert_eq!(report.observations.last().unwrap().step, 23);
//! ```

pub mod combinatorics;
pub mod constants;
pub mod density;
pub mod driver;
pub mod env_config;
pub mod error;
pub mod models;
pub mod probability;
pub mod report;
pub mod transitions;
pub mod types;

pub use error::{DomainError, EngineError};
