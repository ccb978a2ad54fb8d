//! Error types for state construction, propagation, and closed-form counting.

use thiserror::Error;

/// Malformed states and invalid model parameters.
///
/// Always fatal. These indicate a caller bug or a transition-generator bug and
/// are reproducible, never transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Every bucket of an occupancy state is zero.
    #[error("Degenerate state: all buckets are zero")]
    DegenerateState,

    /// A state with no buckets at all.
    #[error("State must have at least one bucket")]
    NoBuckets,

    /// An advance was requested from a bucket holding no units.
    #[error("Bucket {bucket} is empty and cannot advance")]
    EmptyBucket { bucket: usize },

    /// Bucket index past the end of the state.
    #[error("Bucket {bucket} out of range for {len} buckets")]
    BucketOutOfRange { bucket: usize, len: usize },

    /// A successor does not carry the same conserved population as its source.
    #[error("Population changed from {expected} to {got}")]
    PopulationChanged { expected: u64, got: u64 },

    /// A model parameter outside its valid range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors surfaced by the propagation engine and the multiplicity calculator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The outcomes generated for one state do not sum to 1.
    ///
    /// This is a bug in the model's outcome enumeration. The propagator never
    /// renormalizes to hide it.
    #[error("Outcome probabilities for state {state} sum to {sum} (expected 1.0)")]
    IncompleteOutcomes { state: String, sum: f64 },

    /// Total mass drifted past the hard ceiling.
    #[error("Numerical instability at step {step}: total mass = {total_mass} (expected 1.0)")]
    NumericalInstability { step: usize, total_mass: f64 },

    /// A rounded multinomial is too large to round-trip through f64 exactly.
    #[error("Multinomial with ln value {ln_value} exceeds the exact rounding boundary")]
    PrecisionExceeded { ln_value: f64 },
}
