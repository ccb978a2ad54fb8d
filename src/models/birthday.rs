//! Shared-birthday model.
//!
//! `slots` equally likely slots (days) receive one person per trial. The state
//! tracks how many slots hold 0, 1, …, target−1 people, and how many hold
//! `target` or more in the saturating last bucket. The run is absorbed once any
//! slot reaches the target.
//!
//! Each trial picks an occupied bucket k with probability cₖ / slots and moves
//! one slot from bucket k to k+1. The number of slots is conserved.

use crate::error::{DomainError, EngineError};
use crate::probability::occupancy_probabilities;
use crate::transitions::{bucket_advance, BucketState};
use crate::types::{Transition, TrialModel};

#[derive(Debug, Clone)]
pub struct BirthdayModel {
    slots: u32,
    target: u32,
    initial: BucketState,
}

impl BirthdayModel {
    /// Fails unless both `slots` and `target` are at least 1.
    pub fn new(slots: u32, target: u32) -> Result<Self, DomainError> {
        if slots == 0 {
            return Err(DomainError::InvalidParameter {
                name: "slots",
                reason: "at least one slot is required".to_string(),
            });
        }
        if target == 0 {
            return Err(DomainError::InvalidParameter {
                name: "target",
                reason: "the shared count must be at least 1".to_string(),
            });
        }
        let initial = BucketState::initial(slots, target as usize + 1)?;
        Ok(Self {
            slots,
            target,
            initial,
        })
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn target(&self) -> u32 {
        self.target
    }
}

impl TrialModel for BirthdayModel {
    type State = BucketState;

    fn initial_state(&self) -> BucketState {
        self.initial.clone()
    }

    fn outcomes(&self, state: &BucketState) -> Result<Vec<Transition<BucketState>>, EngineError> {
        let mut out = Vec::with_capacity(state.num_buckets());
        for (bucket, prob) in occupancy_probabilities(state.counts())? {
            out.push(Transition {
                next_state: bucket_advance(state, bucket)?,
                prob,
            });
        }
        Ok(out)
    }

    fn is_absorbed(&self, state: &BucketState) -> bool {
        state.saturated() > 0
    }

    fn population(&self, state: &BucketState) -> Option<u64> {
        Some(state.population())
    }
}
