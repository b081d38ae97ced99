//! Arena-specific error types.

use std::fmt;

/// The kind of resource a generational handle referred to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A byte allocation (typed view) inside the arena.
    Allocation,
    /// A bitmap registered alongside the arena.
    Bitmap,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation => f.write_str("allocation"),
            Self::Bitmap => f.write_str("bitmap"),
        }
    }
}

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// A view length whose byte size overflows `usize`, or a slice whose
    /// length does not match the view.
    #[error("invalid length: {len} elements of {width} bytes cannot be allocated")]
    InvalidLength {
        /// Requested element count.
        len: usize,
        /// Element width in bytes.
        width: usize,
    },
    /// Element access outside `[0, len)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the view.
        len: usize,
    },
    /// The arena cannot grow far enough to satisfy an allocation.
    ///
    /// The arena itself stays usable; smaller requests may still succeed.
    #[error("out of memory: requested {requested} bytes, capacity {capacity} bytes")]
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
        /// Maximum region size allowed by the configuration.
        capacity: usize,
    },
    /// Access through a handle whose resource has already been disposed.
    #[error("use after dispose: {kind} slot {index} (generation {generation})")]
    UseAfterDispose {
        /// What the handle pointed at.
        kind: ResourceKind,
        /// Slot index encoded in the handle.
        index: u32,
        /// Generation encoded in the handle.
        generation: u32,
    },
    /// Disposal of a handle whose resource is already gone.
    #[error("double free: {kind} slot {index} (generation {generation})")]
    DoubleFree {
        /// What the handle pointed at.
        kind: ResourceKind,
        /// Slot index encoded in the handle.
        index: u32,
        /// Generation encoded in the handle.
        generation: u32,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) that violates its documented constraints.
    #[error("invalid arena config: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

impl ArenaError {
    /// Whether retrying after releasing other resources might succeed.
    ///
    /// Only [`ArenaError::OutOfMemory`] qualifies; every other kind is a
    /// contract violation by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}
