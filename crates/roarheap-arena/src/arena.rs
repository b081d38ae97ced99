//! The growable byte region and its allocation table.
//!
//! [`Arena`] owns one contiguous `Vec<u8>`. Allocations are byte ranges in
//! it, identified by generation-checked [`AllocId`]s. When no free range
//! fits a request the region is grown (at least doubled, capped at
//! [`ArenaConfig::max_bytes`]); growth reallocates the vector, which is
//! why callers only ever see offsets and short-lived slices.

use tracing::{debug, trace};

use crate::alloc::FreeList;
use crate::config::ArenaConfig;
use crate::error::{ArenaError, ResourceKind};
use crate::slot::{SlotId, SlotTable};

/// Identifies one allocation in an [`Arena`].
pub type AllocId = SlotId;

/// A live allocation: its id and the byte range it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Generation-checked id, used to free the range.
    pub id: AllocId,
    /// Byte offset of the range within the region. Zero for empty allocations.
    pub offset: usize,
    /// Requested length in bytes.
    pub len: usize,
}

/// Bookkeeping for a live allocation.
#[derive(Clone, Copy, Debug)]
struct Reservation {
    offset: usize,
    /// Requested length in bytes.
    len: usize,
    /// Bytes actually taken from the free list (`len` rounded up to alignment).
    reserved: usize,
}

/// A single growable region with explicit allocate/free.
///
/// Nothing is reclaimed implicitly: an allocation stays live until
/// [`Arena::free`] is called with its id. Dropping the arena releases the
/// whole region at once.
pub struct Arena {
    /// The region. Reallocated on growth.
    data: Vec<u8>,
    /// Unused byte ranges of `data`.
    free: FreeList,
    /// Live allocations.
    reservations: SlotTable<Reservation>,
    /// Arena configuration.
    config: ArenaConfig,
    /// Incremented every time `data` is reallocated.
    growth_generation: u64,
    /// Sum of `reserved` over live allocations.
    used_bytes: usize,
}

impl Arena {
    /// Create an arena with a region of `config.initial_bytes`.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if the config violates its
    /// documented constraints, or `Err(ArenaError::OutOfMemory)` if the host
    /// cannot provide the initial region.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;

        let mut data = Vec::new();
        data.try_reserve_exact(config.initial_bytes)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: config.initial_bytes,
                capacity: config.max_bytes,
            })?;
        data.resize(config.initial_bytes, 0);

        // The first `alignment` bytes are never handed out, keeping offset 0
        // free to mean "no bytes".
        let mut free = FreeList::new();
        free.release(config.alignment, config.initial_bytes - config.alignment);

        Ok(Self {
            data,
            free,
            reservations: SlotTable::new(),
            config,
            growth_generation: 0,
            used_bytes: 0,
        })
    }

    /// Create an arena with [`ArenaConfig::default`].
    pub fn with_defaults() -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::default())
    }

    /// Allocate `nbytes` zero-initialised bytes.
    ///
    /// Zero-byte requests always succeed, reserve nothing, and report
    /// offset 0. Other requests are aligned to `config.alignment` and may
    /// grow the region.
    ///
    /// Returns `Err(ArenaError::OutOfMemory)` if the region cannot grow far
    /// enough. The arena is unchanged in that case.
    pub fn allocate(&mut self, nbytes: usize) -> Result<Allocation, ArenaError> {
        if nbytes == 0 {
            let id = self.reservations.insert(Reservation {
                offset: 0,
                len: 0,
                reserved: 0,
            });
            trace!(%id, "allocated empty range");
            return Ok(Allocation {
                id,
                offset: 0,
                len: 0,
            });
        }

        let reserved = self.round_up(nbytes).ok_or(ArenaError::OutOfMemory {
            requested: nbytes,
            capacity: self.config.max_bytes,
        })?;

        let offset = match self.free.take(reserved) {
            Some(offset) => offset,
            None => {
                self.grow(reserved)?;
                self.free.take(reserved).ok_or(ArenaError::OutOfMemory {
                    requested: nbytes,
                    capacity: self.config.max_bytes,
                })?
            }
        };

        // Freed ranges keep stale bytes; zero on the way out.
        self.data[offset..offset + reserved].fill(0);
        self.used_bytes += reserved;

        let id = self.reservations.insert(Reservation {
            offset,
            len: nbytes,
            reserved,
        });
        trace!(%id, offset, nbytes, "allocated range");
        Ok(Allocation {
            id,
            offset,
            len: nbytes,
        })
    }

    /// Release an allocation.
    ///
    /// Every copy of `id` becomes stale. Returns
    /// `Err(ArenaError::DoubleFree)` if `id` was already freed (or never
    /// issued by this arena).
    pub fn free(&mut self, id: AllocId) -> Result<(), ArenaError> {
        let reservation = self
            .reservations
            .remove(id)
            .ok_or(ArenaError::DoubleFree {
                kind: ResourceKind::Allocation,
                index: id.index(),
                generation: id.generation(),
            })?;
        self.free.release(reservation.offset, reservation.reserved);
        self.used_bytes -= reservation.reserved;
        trace!(%id, offset = reservation.offset, "freed range");
        Ok(())
    }

    /// Describe a live allocation.
    pub fn allocation(&self, id: AllocId) -> Result<Allocation, ArenaError> {
        let r = self.reservation(id)?;
        Ok(Allocation {
            id,
            offset: r.offset,
            len: r.len,
        })
    }

    /// Borrow the bytes of a live allocation.
    pub fn bytes(&self, id: AllocId) -> Result<&[u8], ArenaError> {
        let r = *self.reservation(id)?;
        Ok(&self.data[r.offset..r.offset + r.len])
    }

    /// Borrow the bytes of a live allocation mutably.
    pub fn bytes_mut(&mut self, id: AllocId) -> Result<&mut [u8], ArenaError> {
        let r = *self.reservation(id)?;
        Ok(&mut self.data[r.offset..r.offset + r.len])
    }

    /// Copy the bytes of one live allocation into another of equal length.
    ///
    /// The ranges never overlap (distinct live allocations), so this is a
    /// plain move within the region with no temporary buffer.
    pub fn copy_bytes(&mut self, src: AllocId, dst: AllocId) -> Result<(), ArenaError> {
        let from = *self.reservation(src)?;
        let to = *self.reservation(dst)?;
        if from.len != to.len {
            return Err(ArenaError::IndexOutOfRange {
                index: from.len,
                len: to.len,
            });
        }
        self.data
            .copy_within(from.offset..from.offset + from.len, to.offset);
        Ok(())
    }

    /// Whether `id` refers to a live allocation.
    pub fn is_live(&self, id: AllocId) -> bool {
        self.reservations.contains(id)
    }

    /// Address of the region's first byte.
    ///
    /// Only meaningful until the next allocation that grows the region;
    /// compare [`Arena::growth_generation`] to detect that.
    pub fn current_base(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Current region size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of times the region has been reallocated.
    pub fn growth_generation(&self) -> u64 {
        self.growth_generation
    }

    /// Bytes held by live allocations (after alignment).
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Bytes available without growing.
    pub fn free_bytes(&self) -> usize {
        self.free.free_bytes()
    }

    /// Number of live allocations, including empty ones.
    pub fn live_allocations(&self) -> usize {
        self.reservations.len()
    }

    /// The arena configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    fn reservation(&self, id: AllocId) -> Result<&Reservation, ArenaError> {
        self.reservations
            .get(id)
            .ok_or(ArenaError::UseAfterDispose {
                kind: ResourceKind::Allocation,
                index: id.index(),
                generation: id.generation(),
            })
    }

    fn round_up(&self, nbytes: usize) -> Option<usize> {
        let mask = self.config.alignment - 1;
        nbytes.checked_add(mask).map(|n| n & !mask)
    }

    /// Grow the region so that a free range of at least `reserved` bytes exists.
    fn grow(&mut self, reserved: usize) -> Result<(), ArenaError> {
        let size = self.data.len();
        let tail = self.free.free_tail(size);
        let oom = ArenaError::OutOfMemory {
            requested: reserved,
            capacity: self.config.max_bytes,
        };

        let needed = size
            .checked_add(reserved.saturating_sub(tail))
            .ok_or_else(|| oom.clone())?;
        if needed > self.config.max_bytes {
            return Err(oom);
        }
        let target = size.saturating_mul(2).max(needed).min(self.config.max_bytes);

        self.data
            .try_reserve_exact(target - size)
            .map_err(|_| oom)?;
        self.data.resize(target, 0);
        self.free.release(size, target - size);
        self.growth_generation += 1;

        debug!(
            old_size = size,
            new_size = target,
            growth_generation = self.growth_generation,
            "arena region grew"
        );
        Ok(())
    }
}
