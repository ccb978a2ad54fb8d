//! State transition generators.
//!
//! Pure, deterministic successor functions. Each takes a state and one
//! observed trial outcome and returns exactly one successor.
//!
//! - [`bucket_advance`]: move one unit from bucket i to bucket min(i+1, last),
//!   saturating in the last bucket
//! - [`hit_streak_advance`]: accumulate hits, extend or reset the streak, and
//!   latch the reached flag

use std::fmt;

use crate::error::DomainError;

// ── Occupancy buckets ───────────────────────────────────────────────────────

/// Occupancy state: `counts[k]` is the number of slots in bucket k.
///
/// For the shared-birthday model, bucket k < last holds slots with exactly k
/// occupants and the last bucket holds slots at or above the target. The sum of
/// counts (the population) is conserved by [`bucket_advance`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketState {
    counts: Box<[u32]>,
}

impl BucketState {
    /// Build a state from bucket counts. Fails if there are no buckets.
    pub fn new(counts: Vec<u32>) -> Result<Self, DomainError> {
        if counts.is_empty() {
            return Err(DomainError::NoBuckets);
        }
        Ok(Self {
            counts: counts.into_boxed_slice(),
        })
    }

    /// `population` units in bucket 0, every other bucket empty.
    pub fn initial(population: u32, num_buckets: usize) -> Result<Self, DomainError> {
        if num_buckets == 0 {
            return Err(DomainError::NoBuckets);
        }
        let mut counts = vec![0u32; num_buckets];
        counts[0] = population;
        Self::new(counts)
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn num_buckets(&self) -> usize {
        self.counts.len()
    }

    /// Index of the saturating bucket.
    pub fn last_index(&self) -> usize {
        self.counts.len() - 1
    }

    /// Count in the saturating bucket.
    pub fn saturated(&self) -> u32 {
        self.counts[self.last_index()]
    }

    /// Sum of all bucket counts.
    pub fn population(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

impl fmt::Debug for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.counts)
    }
}

/// Move one unit out of `bucket` into `min(bucket + 1, last)`.
///
/// Advancing the last bucket returns an identical state: the unit is already at
/// the highest tracked multiplicity. Fails if `bucket` is out of range or empty.
pub fn bucket_advance(state: &BucketState, bucket: usize) -> Result<BucketState, DomainError> {
    let len = state.num_buckets();
    if bucket >= len {
        return Err(DomainError::BucketOutOfRange { bucket, len });
    }
    if state.counts[bucket] == 0 {
        return Err(DomainError::EmptyBucket { bucket });
    }
    let target = (bucket + 1).min(len - 1);
    let mut counts = state.counts.to_vec();
    counts[bucket] -= 1;
    counts[target] += 1;
    Ok(BucketState {
        counts: counts.into_boxed_slice(),
    })
}

// ── Hit streaks ─────────────────────────────────────────────────────────────

/// Hit-streak state after some number of games.
///
/// `reached` is monotone: once the streak target has been met it stays set,
/// even after the streak resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitState {
    pub hits: u32,
    pub current_streak: u32,
    pub reached: bool,
}

impl HitState {
    pub fn new(hits: u32, current_streak: u32, reached: bool) -> Self {
        Self {
            hits,
            current_streak,
            reached,
        }
    }

    /// The reached flag as 0/1, the way exports encode it.
    pub fn reached_flag(&self) -> u8 {
        self.reached as u8
    }
}

/// Advance a hit state by one game with `hits` successes.
///
/// - hits accumulate
/// - the streak resets on a hitless game, otherwise grows by one
/// - the flag is set once the streak reaches `streak_target` and never cleared
pub fn hit_streak_advance(state: HitState, hits: u32, streak_target: u32) -> HitState {
    let current_streak = if hits == 0 {
        0
    } else {
        state.current_streak + 1
    };
    HitState {
        hits: state.hits + hits,
        current_streak,
        reached: state.reached || current_streak >= streak_target,
    }
}
