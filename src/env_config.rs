//! Shared environment configuration for the command-line front ends.
//!
//! Consolidates `RUST_LOG`, `RAYON_NUM_THREADS` and `EXACT_ODDS_MAX_STEPS`
//! reads shared by both binaries.

use crate::constants::DEFAULT_MAX_STEPS;

/// Install `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`) and build the rayon
/// global pool. Tolerates an already-initialized pool. Returns the thread count.
///
/// Without either variable, rayon's own default (one per logical CPU) is used.
pub fn init_rayon_threads() -> usize {
    let requested = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse::<usize>().ok());
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = requested {
        builder = builder.num_threads(n);
    }
    if builder.build_global().is_err() {
        log::debug!("rayon global pool already initialized");
    }
    let threads = rayon::current_num_threads();
    log::info!("rayon threads: {threads}");
    threads
}

/// Step bound from `EXACT_ODDS_MAX_STEPS`, or [`DEFAULT_MAX_STEPS`].
pub fn default_max_steps() -> usize {
    std::env::var("EXACT_ODDS_MAX_STEPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_STEPS)
}
