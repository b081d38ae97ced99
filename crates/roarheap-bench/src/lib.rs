//! Benchmark profiles for roarheap.
//!
//! - [`reference_values`]: the 400 000-value, 24-bit random set used by the
//!   reference add/serialize/deserialize benchmark.
//! - [`populated_heap`]: a heap holding one bitmap built from a value set.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use roarheap_arena::ArenaConfig;
use roarheap_bitmap::{BitmapError, BitmapHandle, BitmapHeap};
use roarheap_test_utils::{park_miller_values, PARK_MILLER_SEED};

/// Number of values in the reference set.
pub const REFERENCE_COUNT: usize = 400_000;

/// Mask applied to every reference value.
pub const REFERENCE_MASK: u32 = 0x00ff_ffff;

/// The reference set: distinct Park–Miller values masked to 24 bits.
pub fn reference_values() -> Vec<u32> {
    park_miller_values(REFERENCE_COUNT, REFERENCE_MASK, PARK_MILLER_SEED)
}

/// Arena sizing that fits the reference set and its encodings without
/// growth during a measurement.
pub fn bench_config() -> ArenaConfig {
    ArenaConfig::new().with_initial_bytes(16 << 20)
}

/// A heap with one bitmap holding `values`.
pub fn populated_heap(values: &[u32]) -> Result<(BitmapHeap, BitmapHandle), BitmapError> {
    let mut heap = BitmapHeap::new(bench_config())?;
    let handle = BitmapHandle::from_values(&mut heap, values.iter().copied());
    Ok((heap, handle))
}
