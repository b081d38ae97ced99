//! Free-range bookkeeping for the arena region.
//!
//! A [`FreeList`] tracks the unused byte ranges of the region, keyed by
//! offset. Allocation is first-fit; releasing a range merges it with its
//! free neighbours so adjacent holes never stay split.

use std::collections::BTreeMap;

/// Coalescing first-fit free list over `[offset, offset + len)` ranges.
#[derive(Clone, Debug, Default)]
pub struct FreeList {
    /// Free ranges: offset → length in bytes. Never overlapping, never adjacent.
    ranges: BTreeMap<usize, usize>,
}

impl FreeList {
    /// Create an empty free list.
    pub fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Take `len` bytes from the lowest-addressed range that fits.
    ///
    /// Returns the offset of the taken range, or `None` if no single free
    /// range is large enough. `len` must be non-zero.
    pub fn take(&mut self, len: usize) -> Option<usize> {
        let (&offset, &available) = self.ranges.iter().find(|(_, &size)| size >= len)?;
        self.ranges.remove(&offset);
        if available > len {
            self.ranges.insert(offset + len, available - len);
        }
        Some(offset)
    }

    /// Return a range to the free list, merging it with free neighbours.
    pub fn release(&mut self, offset: usize, len: usize) {
        if len == 0 {
            return;
        }
        let mut start = offset;
        let mut end = offset + len;

        // Merge with the preceding range if it ends exactly at `offset`.
        if let Some((&prev_off, &prev_len)) = self.ranges.range(..offset).next_back() {
            debug_assert!(prev_off + prev_len <= offset, "released range overlaps a free range");
            if prev_off + prev_len == offset {
                self.ranges.remove(&prev_off);
                start = prev_off;
            }
        }

        // Merge with the following range if it starts exactly at `end`.
        if let Some(next_len) = self.ranges.remove(&end) {
            end += next_len;
        }

        self.ranges.insert(start, end - start);
    }

    /// Length of the free range that ends exactly at `end`, if any.
    ///
    /// Used by growth to count the free tail of the region toward a request.
    pub fn free_tail(&self, end: usize) -> usize {
        match self.ranges.range(..end).next_back() {
            Some((&off, &len)) if off + len == end => len,
            _ => 0,
        }
    }

    /// Total free bytes.
    pub fn free_bytes(&self) -> usize {
        self.ranges.values().sum()
    }

    /// Size of the largest free range.
    pub fn largest(&self) -> usize {
        self.ranges.values().copied().max().unwrap_or(0)
    }

    /// Number of disjoint free ranges.
    pub fn fragment_count(&self) -> usize {
        self.ranges.len()
    }
}
