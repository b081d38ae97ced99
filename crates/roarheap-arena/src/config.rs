//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the arena allocator.
///
/// Controls the initial region size, the growth ceiling, and allocation
/// alignment. Validated by [`Arena::new`](crate::Arena::new); all values are
/// immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the region when the arena is created, in bytes.
    ///
    /// Default: 65_536 (64KB). Must be at least `alignment` and at most
    /// `max_bytes`.
    pub initial_bytes: usize,

    /// Largest size the region may grow to, in bytes.
    ///
    /// Default: 1GB. Allocations that would need more fail with
    /// [`ArenaError::OutOfMemory`].
    pub max_bytes: usize,

    /// Alignment of every non-empty allocation, in bytes.
    ///
    /// Default: 8, the widest element. Must be a power of two. The first
    /// `alignment` bytes of the region are reserved so that offset 0 is
    /// never handed out for a non-empty allocation.
    pub alignment: usize,
}

impl ArenaConfig {
    /// Default initial region size: 64KB.
    pub const DEFAULT_INITIAL_BYTES: usize = 64 * 1024;

    /// Default growth ceiling: 1GB.
    pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024 * 1024;

    /// Default allocation alignment.
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            initial_bytes: Self::DEFAULT_INITIAL_BYTES,
            max_bytes: Self::DEFAULT_MAX_BYTES,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Set the initial region size.
    pub fn with_initial_bytes(mut self, initial_bytes: usize) -> Self {
        self.initial_bytes = initial_bytes;
        self
    }

    /// Set the growth ceiling.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the allocation alignment.
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Check the documented constraints.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "alignment must be a power of two (got {})",
                    self.alignment
                ),
            });
        }
        if self.initial_bytes < self.alignment {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_bytes must be >= alignment (got {} < {})",
                    self.initial_bytes, self.alignment
                ),
            });
        }
        if self.initial_bytes > self.max_bytes {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_bytes must be <= max_bytes (got {} > {})",
                    self.initial_bytes, self.max_bytes
                ),
            });
        }
        if self.max_bytes > isize::MAX as usize {
            return Err(ArenaError::InvalidConfig {
                reason: format!("max_bytes must be <= isize::MAX (got {})", self.max_bytes),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
