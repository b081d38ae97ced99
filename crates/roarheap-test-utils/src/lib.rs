//! Shared fixtures and helpers for roarheap tests and benchmarks.
//!
//! - [`fixtures`]: fixed value sets used across the test suites.
//! - [`park_miller_values`] / [`chacha_values`]: deterministic random sets.
//! - [`init_tracing`]: opt-in log output for a test run.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::BTreeSet;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Seed of the reference benchmark's value generator.
pub const PARK_MILLER_SEED: u64 = 18_397_123;

/// `count` distinct values from the Park–Miller minimal-standard generator,
/// each masked with `mask`, in generation order.
///
/// Reproduces the reference benchmark set: `park_miller_values(400_000,
/// 0xff_ffff, PARK_MILLER_SEED)`. `count` must not exceed `mask + 1`.
pub fn park_miller_values(count: usize, mask: u32, seed: u64) -> Vec<u32> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(count);
    let mut state = seed;
    while out.len() < count {
        state = (state * 16_807) % 2_147_483_647;
        let value = (state as u32) & mask;
        if seen.insert(value) {
            out.push(value);
        }
    }
    out
}

/// `count` values (duplicates allowed) from a seeded ChaCha8 stream,
/// each masked with `mask`.
pub fn chacha_values(count: usize, mask: u32, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.next_u32() & mask).collect()
}

/// Sorted, deduplicated copy of `values`.
pub fn sorted_distinct(values: &[u32]) -> Vec<u32> {
    values
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`. Safe to call from
/// every test; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
