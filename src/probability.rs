//! Trial probability sources.
//!
//! Two variants:
//! - **Occupancy fan-out**: advance bucket i with probability cᵢ / Σc
//! - **Binomial trial**: k successes out of m sub-trials, C(m,k)·p^k·(1−p)^(m−k)
//!
//! The binomial pmf is evaluated once per (m, p) into a [`BinomialTable`] and
//! indexed by k afterwards. The domain is k ∈ [0, m], so the table is the whole
//! cache and never grows.
//!
//! Up to [`BINOMIAL_DIRECT_MAX_TRIALS`] sub-trials the pmf is the plain product.
//! Past that C(m,k) overflows f64 long before the pmf itself gets small, so it
//! is evaluated in log space instead.

use crate::combinatorics::ln_factorial;
use crate::constants::BINOMIAL_DIRECT_MAX_TRIALS;
use crate::error::DomainError;

/// Probability of advancing each non-empty bucket: `(bucket, cᵢ / Σc)`.
///
/// Empty buckets are skipped since they cannot advance. Fails on a degenerate
/// state where every count is zero.
pub fn occupancy_probabilities(counts: &[u32]) -> Result<Vec<(usize, f64)>, DomainError> {
    if counts.is_empty() {
        return Err(DomainError::NoBuckets);
    }
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return Err(DomainError::DegenerateState);
    }
    let total = total as f64;
    Ok(counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(i, &c)| (i, c as f64 / total))
        .collect())
}

/// Binomial coefficient C(n, k) as f64, multiplicative form.
///
/// Exact while the intermediate products stay below 2^53.
pub fn binomial_coefficient(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut c = 1.0f64;
    for i in 0..k {
        c = c * (n - i) as f64 / (i + 1) as f64;
    }
    c.round()
}

/// Binomial pmf: P(K = k) for K ~ Binomial(m, p).
///
/// Returns 0 for k outside [0, m] rather than failing.
pub fn binomial_pmf(m: u32, p: f64, k: u32) -> f64 {
    if k > m {
        return 0.0;
    }
    if m <= BINOMIAL_DIRECT_MAX_TRIALS {
        return binomial_coefficient(m, k) * p.powi(k as i32) * (1.0 - p).powi((m - k) as i32);
    }
    // ln p or ln(1 − p) is −∞ here; the pmf is a point mass.
    if p == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if k == m { 1.0 } else { 0.0 };
    }
    let ln_choose =
        ln_factorial(m as u64) - ln_factorial(k as u64) - ln_factorial((m - k) as u64);
    (ln_choose + k as f64 * p.ln() + (m - k) as f64 * (-p).ln_1p()).exp()
}

/// Precomputed `Binomial(m, p)` pmf over k = 0..=m.
#[derive(Debug, Clone, PartialEq)]
pub struct BinomialTable {
    trials: u32,
    success_prob: f64,
    pmf: Vec<f64>,
}

impl BinomialTable {
    /// Tabulate the pmf. Fails if `success_prob` is not a probability.
    pub fn new(trials: u32, success_prob: f64) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&success_prob) {
            return Err(DomainError::InvalidParameter {
                name: "success_prob",
                reason: format!("{success_prob} is outside [0, 1]"),
            });
        }
        let pmf = (0..=trials)
            .map(|k| binomial_pmf(trials, success_prob, k))
            .collect();
        Ok(Self {
            trials,
            success_prob,
            pmf,
        })
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    pub fn success_prob(&self) -> f64 {
        self.success_prob
    }

    /// P(K = k); 0 outside [0, m].
    #[inline]
    pub fn prob(&self, k: u32) -> f64 {
        self.pmf.get(k as usize).copied().unwrap_or(0.0)
    }

    /// The full pmf, indexed by success count.
    pub fn as_slice(&self) -> &[f64] {
        &self.pmf
    }
}
