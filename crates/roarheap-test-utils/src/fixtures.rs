//! Fixed value sets shared by the bitmap test suites.

/// The thirteen-value set whose serialized size must match its output both
/// before and after `optimize`. Spans the low containers, `i32::MAX` and
/// the top of the `u32` range.
pub const SCENARIO_VALUES: [u32; 13] = [
    1, 2, 3, 4, 5, 6, 100, 101, 105, 109, 0x7fff_ffff, 0xffff_fffe, 0xffff_ffff,
];

/// Small mixed set for round-trip tests, including both ends of the range.
pub const ROUND_TRIP_VALUES: [u32; 9] = [
    0, 1, 2, 3, 1_000, 65_535, 65_536, 0x7fff_ffff, 0xffff_ffff,
];

/// A dense run that the engine stores as a bitset container.
pub fn dense_block(key: u16, count: u32) -> Vec<u32> {
    let base = u32::from(key) << 16;
    (0..count.min(1 << 16)).map(|low| base | low).collect()
}

/// Every `stride`-th value below `limit`.
pub fn strided(limit: u32, stride: u32) -> Vec<u32> {
    (0..limit).step_by(stride.max(1) as usize).collect()
}
