//! Closed-form multiplicity counting: the cross-check for propagated distributions.
//!
//! After n people have each picked one of s slots, the sample space has s^n
//! equally likely assignments. Group them by the occupancy partition, the
//! multiset of non-zero slot occupancies sorted descending. For a partition
//! λ = (λ₁ ≥ λ₂ ≥ … ≥ λⱼ):
//!
//! - **multinomial coefficient** n! / Π λᵢ!: orderings of the n people
//!   consistent with one fixed slot assignment
//! - **arrangement count** s! / Π aₖ!: ways to assign the occupancies to slots,
//!   where aₖ is the number of slots holding exactly k people (including a₀)
//!
//! The product counts the assignments with occupancy λ, and summing it over all
//! partitions of n gives s^n. Normalizing by that sum gives the exact
//! probability of λ with no iteration.
//!
//! Everything is computed in log space through log-gamma. The rounded integer
//! forms are only returned while the rounding error bound stays below 0.5.

use std::collections::HashMap;

use crate::constants::ROUNDING_ULPS;
use crate::error::{DomainError, EngineError};
use crate::transitions::BucketState;
use crate::types::{neumaier_sum, Distribution};

/// ln(n!).
#[inline]
pub fn ln_factorial(n: u64) -> f64 {
    libm::lgamma(n as f64 + 1.0)
}

/// ln((Σcᵢ)! / Π cᵢ!).
pub fn ln_multinomial(counts: &[u32]) -> f64 {
    let n: u64 = counts.iter().map(|&c| c as u64).sum();
    ln_factorial(n) - counts.iter().map(|&c| ln_factorial(c as u64)).sum::<f64>()
}

/// (Σcᵢ)! / Π cᵢ! as an exact integer.
///
/// Computed as `exp(ln_multinomial)` then rounded. Each log-gamma term carries a
/// small relative error, so the absolute error of the exponentiated value grows
/// with both the value and the size of the terms. When the estimated error
/// could reach 0.5 the rounded result is no longer trustworthy and this returns
/// [`EngineError::PrecisionExceeded`]; use [`ln_multinomial`] instead.
pub fn multinomial_coefficient(counts: &[u32]) -> Result<u64, EngineError> {
    let n: u64 = counts.iter().map(|&c| c as u64).sum();
    let ln_value = ln_multinomial(counts);
    let term_magnitude =
        ln_factorial(n) + counts.iter().map(|&c| ln_factorial(c as u64)).sum::<f64>();
    let value = ln_value.exp();
    let error_bound = value * (term_magnitude * ROUNDING_ULPS + 1.0) * f64::EPSILON;
    if !(error_bound < 0.5) || value >= u64::MAX as f64 {
        return Err(EngineError::PrecisionExceeded { ln_value });
    }
    Ok(value.round() as u64)
}

/// Slot counts per occupancy level: `out[k]` = number of slots holding exactly k.
///
/// `parts` are the non-zero occupancies. Fails if there are more parts than slots.
pub fn occupancy_levels(parts: &[u32], slots: u32) -> Result<Vec<u32>, DomainError> {
    if parts.len() > slots as usize {
        return Err(DomainError::InvalidParameter {
            name: "parts",
            reason: format!("{} occupied slots exceed {} slots", parts.len(), slots),
        });
    }
    let max = parts.iter().copied().max().unwrap_or(0) as usize;
    let mut levels = vec![0u32; max + 1];
    levels[0] = slots - parts.len() as u32;
    for &p in parts {
        levels[p as usize] += 1;
    }
    Ok(levels)
}

/// ln of the number of ways to assign the occupancies `parts` to `slots` slots.
pub fn ln_arrangement_count(parts: &[u32], slots: u32) -> Result<f64, DomainError> {
    Ok(ln_multinomial(&occupancy_levels(parts, slots)?))
}

/// Number of ways to assign the occupancies `parts` to `slots` slots, rounded.
pub fn arrangement_count(parts: &[u32], slots: u32) -> Result<u64, EngineError> {
    multinomial_coefficient(&occupancy_levels(parts, slots)?)
}

/// All partitions of `n` into at most `max_parts` parts, each sorted descending.
///
/// Emitted in reverse lexicographic order, starting with `[n]`. `n = 0` yields
/// the single empty partition.
pub fn partitions(n: u32, max_parts: usize) -> Vec<Vec<u32>> {
    fn fill(
        remaining: u32,
        max_part: u32,
        max_parts: usize,
        current: &mut Vec<u32>,
        out: &mut Vec<Vec<u32>>,
    ) {
        if remaining == 0 {
            out.push(current.clone());
            return;
        }
        if current.len() == max_parts {
            return;
        }
        for part in (1..=remaining.min(max_part)).rev() {
            current.push(part);
            fill(remaining - part, part, max_parts, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    fill(n, n, max_parts, &mut Vec::new(), &mut out);
    out
}

/// Exact probability of one occupancy partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionMass {
    /// Non-zero occupancies, descending.
    pub parts: Vec<u32>,
    /// ln(n! / Π λᵢ!).
    pub ln_multinomial: f64,
    /// ln(s! / Π aₖ!).
    pub ln_arrangements: f64,
    /// Normalized probability.
    pub prob: f64,
}

/// Closed-form probability of every occupancy partition of `people` over `slots`.
///
/// Normalizes by the sum of multinomial × arrangements over all partitions,
/// taken with a max-shift so nothing overflows.
pub fn partition_masses(people: u32, slots: u32) -> Result<Vec<PartitionMass>, DomainError> {
    if slots == 0 {
        return Err(DomainError::InvalidParameter {
            name: "slots",
            reason: "at least one slot is required".to_string(),
        });
    }
    let mut masses = partitions(people, slots as usize)
        .into_iter()
        .map(|parts| {
            let ln_arrangements = ln_arrangement_count(&parts, slots)?;
            Ok(PartitionMass {
                ln_multinomial: ln_multinomial(&parts),
                ln_arrangements,
                parts,
                prob: 0.0,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    let ln_weight = |m: &PartitionMass| m.ln_multinomial + m.ln_arrangements;
    let shift = masses
        .iter()
        .map(ln_weight)
        .fold(f64::NEG_INFINITY, f64::max);
    let total = neumaier_sum(masses.iter().map(|m| (ln_weight(m) - shift).exp()));
    for m in &mut masses {
        m.prob = (ln_weight(m) - shift).exp() / total;
    }
    Ok(masses)
}

/// Closed-form probability that the occupancy partition satisfies `predicate`.
pub fn closed_form_mass<P>(people: u32, slots: u32, predicate: P) -> Result<f64, DomainError>
where
    P: Fn(&[u32]) -> bool,
{
    let masses = partition_masses(people, slots)?;
    Ok(neumaier_sum(
        masses
            .iter()
            .filter(|m| predicate(&m.parts))
            .map(|m| m.prob),
    ))
}

/// Closed-form probability that some slot holds at least `target` of `people`.
pub fn shared_slot_probability(people: u32, slots: u32, target: u32) -> Result<f64, DomainError> {
    closed_form_mass(people, slots, |parts| {
        parts.first().is_some_and(|&largest| largest >= target)
    })
}

/// Bucket state reached by an occupancy partition, saturating at `target`.
pub fn partition_to_buckets(
    parts: &[u32],
    slots: u32,
    target: u32,
) -> Result<BucketState, DomainError> {
    let levels = occupancy_levels(parts, slots)?;
    let mut counts = vec![0u32; target as usize + 1];
    for (level, &n) in levels.iter().enumerate() {
        counts[level.min(target as usize)] += n;
    }
    BucketState::new(counts)
}

/// Closed-form distribution over bucket states after `people` trials of the
/// shared-slot model with saturation at `target`.
pub fn closed_form_distribution(
    people: u32,
    slots: u32,
    target: u32,
) -> Result<Distribution<BucketState>, DomainError> {
    let mut mass: HashMap<BucketState, f64> = HashMap::new();
    for m in partition_masses(people, slots)? {
        let state = partition_to_buckets(&m.parts, slots, target)?;
        *mass.entry(state).or_insert(0.0) += m.prob;
    }
    Ok(Distribution::from_map(mass))
}

// ── Convolution ─────────────────────────────────────────────────────────────

/// Discrete convolution of two pmfs indexed from 0.
///
/// `out[k] = Σ_{i+j=k} a[i]·b[j]`: the pmf of the sum of two independent
/// variables.
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &pa) in a.iter().enumerate() {
        if pa == 0.0 {
            continue;
        }
        for (j, &pb) in b.iter().enumerate() {
            out[i + j] += pa * pb;
        }
    }
    out
}

/// n-fold convolution of `base` with itself. `n = 0` is the point mass at 0.
pub fn convolve_power(base: &[f64], n: usize) -> Vec<f64> {
    (0..n).fold(vec![1.0], |acc, _| convolve(&acc, base))
}
