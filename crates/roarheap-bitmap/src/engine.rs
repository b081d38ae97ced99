//! The compressed-bitmap engine seam.
//!
//! Container selection, container internals and set algebra are not
//! implemented here; they belong to an engine behind [`BitmapEngine`].
//! The default engine is [`roaring::RoaringBitmap`]. The heap, handles
//! and codec only ever talk to the trait.

use std::io;

use roaring::RoaringBitmap;

/// Primitives the heap and codec need from a compressed-bitmap engine.
pub trait BitmapEngine: Sized {
    /// Create an empty bitmap.
    fn create() -> Self;

    /// Insert one value. Returns `true` if it was not already present.
    fn insert(&mut self, value: u32) -> bool;

    /// Insert many values. Duplicates are ignored.
    fn insert_many<I: IntoIterator<Item = u32>>(&mut self, values: I);

    /// Remove one value. Returns `true` if it was present.
    fn remove(&mut self, value: u32) -> bool;

    /// Membership test.
    fn contains(&self, value: u32) -> bool;

    /// Number of distinct members.
    fn cardinality(&self) -> u64;

    /// Smallest member.
    fn minimum(&self) -> Option<u32>;

    /// Largest member.
    fn maximum(&self) -> Option<u32>;

    /// Member at ascending position `rank` (0-based).
    fn select(&self, rank: u64) -> Option<u32>;

    /// Members in ascending order.
    fn values(&self) -> Box<dyn Iterator<Item = u32> + '_>;

    /// Remove every member.
    fn clear(&mut self);

    /// Exact size of the portable encoding in bytes.
    fn portable_size(&self) -> usize;

    /// Write the portable encoding into `out`, which is exactly
    /// [`portable_size`](BitmapEngine::portable_size) bytes long.
    fn serialize_portable_into(&self, out: &mut [u8]) -> io::Result<()>;

    /// Read a portable encoding.
    fn deserialize_portable(bytes: &[u8]) -> io::Result<Self>;

    /// Repack containers for minimal size without changing membership,
    /// turning dense ranges into run containers where that is smaller.
    ///
    /// Returns `true` if the representation changed.
    fn optimize(&mut self) -> bool;
}

impl BitmapEngine for RoaringBitmap {
    fn create() -> Self {
        RoaringBitmap::new()
    }

    fn insert(&mut self, value: u32) -> bool {
        RoaringBitmap::insert(self, value)
    }

    fn insert_many<I: IntoIterator<Item = u32>>(&mut self, values: I) {
        self.extend(values);
    }

    fn remove(&mut self, value: u32) -> bool {
        RoaringBitmap::remove(self, value)
    }

    fn contains(&self, value: u32) -> bool {
        RoaringBitmap::contains(self, value)
    }

    fn cardinality(&self) -> u64 {
        self.len()
    }

    fn minimum(&self) -> Option<u32> {
        self.min()
    }

    fn maximum(&self) -> Option<u32> {
        self.max()
    }

    fn select(&self, rank: u64) -> Option<u32> {
        RoaringBitmap::select(self, u32::try_from(rank).ok()?)
    }

    fn values(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        Box::new(self.iter())
    }

    fn clear(&mut self) {
        RoaringBitmap::clear(self)
    }

    fn portable_size(&self) -> usize {
        self.serialized_size()
    }

    fn serialize_portable_into(&self, mut out: &mut [u8]) -> io::Result<()> {
        self.serialize_into(&mut out)
    }

    fn deserialize_portable(bytes: &[u8]) -> io::Result<Self> {
        RoaringBitmap::deserialize_from(bytes)
    }

    fn optimize(&mut self) -> bool {
        RoaringBitmap::optimize(self)
    }
}
