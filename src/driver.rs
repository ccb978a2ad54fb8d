//! Iteration driver: step a model until absorption crosses a threshold or a step bound.
//!
//! ```text
//! INITIALIZING → STEPPING → { CONVERGED, STEP_LIMIT_REACHED }
//!                    ↘ FAILED (fatal error)
//! ```
//!
//! [`Run`] is a lazy, one-pass iterator of [`Observation`]s. Each call to
//! `next` performs exactly one propagation step, so a caller can stop between
//! steps at any point simply by not pulling further. Only the latest
//! distribution is kept unless [`RunConfig::keep_history`] is set.

use log::{debug, info, warn};

use crate::constants::{DRIFT_CEILING, MASS_TOLERANCE};
use crate::density::absorption::model_absorbed_mass;
use crate::density::forward::propagate;
use crate::error::EngineError;
use crate::types::{Distribution, Observation, RunConfig, TrialModel};

/// Driver state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initializing,
    Stepping,
    Converged,
    StepLimitReached,
    /// A fatal error was returned; no further steps run.
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::StepLimitReached | Self::Failed)
    }
}

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Absorbed mass reached the threshold.
    Converged,
    /// The step bound was hit first.
    StepLimitReached,
}

/// Lazy stepping over one model.
pub struct Run<'m, M: TrialModel> {
    model: &'m M,
    config: RunConfig,
    phase: RunPhase,
    step: usize,
    dist: Distribution<M::State>,
    history: Vec<Distribution<M::State>>,
    drift_warnings: usize,
}

impl<'m, M: TrialModel> Run<'m, M> {
    pub fn new(model: &'m M, config: RunConfig) -> Self {
        Self {
            dist: Distribution::point(model.initial_state()),
            model,
            config,
            phase: RunPhase::Initializing,
            step: 0,
            history: Vec::new(),
            drift_warnings: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Steps completed so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// The latest distribution.
    pub fn distribution(&self) -> &Distribution<M::State> {
        &self.dist
    }

    /// Every distribution from step 0 onward, when history is kept.
    pub fn history(&self) -> &[Distribution<M::State>] {
        &self.history
    }

    /// Steps whose total mass drifted past tolerance without aborting.
    pub fn drift_warnings(&self) -> usize {
        self.drift_warnings
    }

    /// Terminal outcome, once the run has ended without error.
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.phase {
            RunPhase::Converged => Some(RunOutcome::Converged),
            RunPhase::StepLimitReached => Some(RunOutcome::StepLimitReached),
            _ => None,
        }
    }

    fn initialize(&mut self) {
        info!(
            "run start: threshold={}, max_steps={}",
            self.config.threshold, self.config.max_steps
        );
        self.step = 0;
        self.dist = Distribution::point(self.model.initial_state());
        if self.config.keep_history {
            self.history.push(self.dist.clone());
        }
        self.phase = if self.config.max_steps == 0 {
            RunPhase::StepLimitReached
        } else {
            RunPhase::Stepping
        };
    }

    fn advance(&mut self) -> Result<Observation, EngineError> {
        self.step += 1;
        let next = propagate(self.model, &self.dist)?;
        self.check_conservation(&next)?;

        let prob = model_absorbed_mass(self.model, &next);
        debug!(
            "step {}: {} states, absorbed={:.6e}",
            self.step,
            next.len(),
            prob
        );

        if self.config.keep_history {
            self.history.push(next.clone());
        }
        self.dist = next;

        if prob >= self.config.threshold {
            self.phase = RunPhase::Converged;
            info!("converged at step {} (absorbed={prob})", self.step);
        } else if self.step >= self.config.max_steps {
            self.phase = RunPhase::StepLimitReached;
            info!(
                "step limit {} reached (absorbed={prob})",
                self.config.max_steps
            );
        }
        Ok(Observation {
            step: self.step,
            prob,
        })
    }

    fn check_conservation(&mut self, dist: &Distribution<M::State>) -> Result<(), EngineError> {
        let total_mass = dist.total_mass();
        let drift = (total_mass - 1.0).abs();
        if !(drift <= DRIFT_CEILING) {
            return Err(EngineError::NumericalInstability {
                step: self.step,
                total_mass,
            });
        }
        if drift > MASS_TOLERANCE {
            self.drift_warnings += 1;
            warn!(
                "numerical instability at step {}: total mass = {total_mass:.12}",
                self.step
            );
        }
        Ok(())
    }
}

impl<M: TrialModel> Iterator for Run<'_, M> {
    type Item = Result<Observation, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase == RunPhase::Initializing {
            self.initialize();
        }
        if self.phase != RunPhase::Stepping {
            return None;
        }
        match self.advance() {
            Ok(obs) => Some(Ok(obs)),
            Err(err) => {
                self.phase = RunPhase::Failed;
                Some(Err(err))
            }
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport<S> {
    pub outcome: RunOutcome,
    pub observations: Vec<Observation>,
    pub final_distribution: Distribution<S>,
    /// Populated only when history was kept.
    pub history: Vec<Distribution<S>>,
    pub drift_warnings: usize,
}

/// Drive `model` to a terminal state, collecting every observation.
pub fn run_to_end<M: TrialModel>(
    model: &M,
    config: RunConfig,
) -> Result<RunReport<M::State>, EngineError> {
    let mut run = Run::new(model, config);
    let observations = run.by_ref().collect::<Result<Vec<_>, _>>()?;
    // Without an error the iterator only stops in a terminal outcome.
    let outcome = run.outcome().unwrap_or(RunOutcome::StepLimitReached);
    Ok(RunReport {
        outcome,
        observations,
        drift_warnings: run.drift_warnings,
        history: run.history,
        final_distribution: run.dist,
    })
}
