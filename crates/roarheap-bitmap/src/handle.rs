//! `BitmapHandle`: the copyable, generation-checked name of a bitmap
//! registered in a [`BitmapHeap`].
//!
//! Every operation takes the heap explicitly. A handle whose bitmap has
//! been disposed fails with `UseAfterDispose`; disposing it again fails
//! with `DoubleFree`.

use std::fmt;

use roarheap_arena::{ArenaError, Dispose, Element, SlotId, TypedView};
use tracing::warn;

use crate::codec::{self, DecodeMode, Format, FrozenBitmap};
use crate::engine::BitmapEngine;
use crate::error::BitmapError;
use crate::heap::{BitmapHeap, Provenance};

/// Maximum repack rounds performed by [`BitmapHandle::optimize`].
pub const OPTIMIZE_ROUNDS: usize = 4;

/// Handle to a bitmap registered in a [`BitmapHeap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct BitmapHandle {
    id: SlotId,
}

impl fmt::Display for BitmapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitmapHandle({})", self.id)
    }
}

impl BitmapHandle {
    // ── Construction ────────────────────────────────────────────

    /// Register a new empty bitmap.
    pub fn empty<E: BitmapEngine>(heap: &mut BitmapHeap<E>) -> Self {
        Self {
            id: heap.register(Provenance::Owning(E::create())),
        }
    }

    /// Register a bitmap holding `values`. Duplicates are ignored.
    pub fn from_values<E, I>(heap: &mut BitmapHeap<E>, values: I) -> Self
    where
        E: BitmapEngine,
        I: IntoIterator<Item = u32>,
    {
        let mut engine = E::create();
        engine.insert_many(values);
        Self {
            id: heap.register(Provenance::Owning(engine)),
        }
    }

    /// Register a bitmap holding the elements of a `u32` view.
    pub fn from_view<E: BitmapEngine>(
        heap: &mut BitmapHeap<E>,
        view: &TypedView<u32>,
    ) -> Result<Self, BitmapError> {
        let data = view.as_bytes(heap.arena())?;
        let mut engine = E::create();
        engine.insert_many(data.chunks_exact(4).map(u32::read_le));
        Ok(Self {
            id: heap.register(Provenance::Owning(engine)),
        })
    }

    /// Decode a serialized bitmap held in the arena.
    ///
    /// With [`DecodeMode::Copy`] the handle owns an independent copy. With
    /// [`DecodeMode::Frozen`] the handle aliases `bytes`: queries read the
    /// buffer as it is at call time, the buffer must outlive the handle, and
    /// disposing the handle leaves the buffer allocated. Either way the input
    /// is validated up front and nothing is registered on failure.
    pub fn deserialize<E: BitmapEngine>(
        heap: &mut BitmapHeap<E>,
        bytes: &TypedView<u8>,
        format: Format,
        mode: DecodeMode,
    ) -> Result<Self, BitmapError> {
        let data = bytes.as_bytes(heap.arena())?;
        let provenance = match mode {
            DecodeMode::Copy => Provenance::Owning(codec::decode(data, format)?),
            DecodeMode::Frozen => {
                FrozenBitmap::parse_checked(data, format)?;
                Provenance::Frozen {
                    bytes: *bytes,
                    format,
                }
            }
        };
        Ok(Self {
            id: heap.register(provenance),
        })
    }

    /// Decode a serialized bitmap from host memory into an owning copy.
    pub fn deserialize_slice<E: BitmapEngine>(
        heap: &mut BitmapHeap<E>,
        bytes: &[u8],
        format: Format,
    ) -> Result<Self, BitmapError> {
        let engine = codec::decode(bytes, format)?;
        Ok(Self {
            id: heap.register(Provenance::Owning(engine)),
        })
    }

    /// Replace this bitmap's contents with a decoded stream. On failure the
    /// bitmap is left exactly as it was. A frozen handle becomes owning.
    pub fn replace_from<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
        bytes: &[u8],
        format: Format,
    ) -> Result<(), BitmapError> {
        heap.is_frozen(self.id)?;
        let engine = codec::decode(bytes, format)?;
        heap.replace(self.id, engine)
    }

    // ── Identity ────────────────────────────────────────────────

    /// The registry slot backing this handle.
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Whether the handle still names a registered bitmap.
    pub fn is_live<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> bool {
        heap.contains_bitmap(self.id)
    }

    /// Whether the handle aliases a caller's buffer.
    pub fn is_frozen<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<bool, BitmapError> {
        heap.is_frozen(self.id)
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Number of distinct members.
    pub fn cardinality<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<u64, BitmapError> {
        Ok(heap.resolve(self.id)?.cardinality())
    }

    /// Whether the bitmap has no members.
    pub fn is_empty<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<bool, BitmapError> {
        Ok(self.cardinality(heap)? == 0)
    }

    /// Membership test.
    pub fn contains<E: BitmapEngine>(
        &self,
        heap: &BitmapHeap<E>,
        value: u32,
    ) -> Result<bool, BitmapError> {
        Ok(heap.resolve(self.id)?.contains(value))
    }

    /// Smallest member. Fails with [`BitmapError::EmptySet`] when empty.
    pub fn minimum<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<u32, BitmapError> {
        heap.resolve(self.id)?
            .minimum()
            .ok_or(BitmapError::EmptySet)
    }

    /// Largest member. Fails with [`BitmapError::EmptySet`] when empty.
    pub fn maximum<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<u32, BitmapError> {
        heap.resolve(self.id)?
            .maximum()
            .ok_or(BitmapError::EmptySet)
    }

    /// Member at ascending position `rank`, if there is one.
    pub fn select<E: BitmapEngine>(
        &self,
        heap: &BitmapHeap<E>,
        rank: u64,
    ) -> Result<Option<u32>, BitmapError> {
        Ok(heap.resolve(self.id)?.select(rank))
    }

    /// Members in ascending order.
    pub fn to_vec<E: BitmapEngine>(&self, heap: &BitmapHeap<E>) -> Result<Vec<u32>, BitmapError> {
        Ok(heap.resolve(self.id)?.values().collect())
    }

    /// Members in ascending order, copied into a new arena view.
    pub fn to_view<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
    ) -> Result<TypedView<u32>, BitmapError> {
        let values = self.to_vec(heap)?;
        Ok(TypedView::from_slice(heap.arena_mut(), &values)?)
    }

    // ── Mutation ────────────────────────────────────────────────
    //
    // Every mutator promotes a frozen handle to owning storage first.

    /// Insert `value`. Returns `true` if it was not already a member.
    pub fn add<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
        value: u32,
    ) -> Result<bool, BitmapError> {
        Ok(heap.owning_mut(self.id)?.insert(value))
    }

    /// Remove `value`. Returns `true` if it was a member.
    pub fn remove<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
        value: u32,
    ) -> Result<bool, BitmapError> {
        Ok(heap.owning_mut(self.id)?.remove(value))
    }

    /// Insert many values in one batch.
    pub fn add_many<E, I>(&self, heap: &mut BitmapHeap<E>, values: I) -> Result<(), BitmapError>
    where
        E: BitmapEngine,
        I: IntoIterator<Item = u32>,
    {
        heap.owning_mut(self.id)?.insert_many(values);
        Ok(())
    }

    /// Insert every element of a `u32` view.
    pub fn add_many_view<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
        view: &TypedView<u32>,
    ) -> Result<(), BitmapError> {
        heap.extend_from_view(self.id, view)
    }

    /// Remove every member. A frozen handle becomes an empty owning bitmap
    /// without decoding its buffer.
    pub fn clear<E: BitmapEngine>(&self, heap: &mut BitmapHeap<E>) -> Result<(), BitmapError> {
        if heap.is_frozen(self.id)? {
            return heap.replace(self.id, E::create());
        }
        heap.owning_mut(self.id)?.clear();
        Ok(())
    }

    /// Repack containers for minimal size. Membership is unchanged and a
    /// second call reports no change. Returns whether anything changed.
    pub fn optimize<E: BitmapEngine>(&self, heap: &mut BitmapHeap<E>) -> Result<bool, BitmapError> {
        let engine = heap.owning_mut(self.id)?;
        let mut changed = false;
        for _ in 0..OPTIMIZE_ROUNDS {
            if !engine.optimize() {
                break;
            }
            changed = true;
        }
        Ok(changed)
    }

    // ── Serialization ───────────────────────────────────────────

    /// Exact number of bytes [`serialize`](Self::serialize) will produce.
    pub fn serialization_size<E: BitmapEngine>(
        &self,
        heap: &BitmapHeap<E>,
        format: Format,
    ) -> Result<usize, BitmapError> {
        heap.with_engine(self.id, |engine| codec::serialized_size(engine, format))
    }

    /// Serialize into a new arena view owned by the caller. On failure the
    /// view is released before returning.
    pub fn serialize<E: BitmapEngine>(
        &self,
        heap: &mut BitmapHeap<E>,
        format: Format,
    ) -> Result<TypedView<u8>, BitmapError> {
        let size = self.serialization_size(heap, format)?;
        let out = TypedView::<u8>::with_len(heap.arena_mut(), size)?;
        match heap.encode_into_view(self.id, format, out) {
            Ok(_) => Ok(out),
            Err(e) => {
                if let Err(cleanup) = out.dispose(heap.arena_mut()) {
                    warn!(error = %cleanup, "releasing a failed serialization buffer failed");
                }
                Err(e)
            }
        }
    }

    /// Serialize into host memory.
    pub fn serialize_to_vec<E: BitmapEngine>(
        &self,
        heap: &BitmapHeap<E>,
        format: Format,
    ) -> Result<Vec<u8>, BitmapError> {
        heap.with_engine(self.id, |engine| codec::encode_to_vec(engine, format))?
    }

    // ── Disposal ────────────────────────────────────────────────

    /// Unregister the bitmap. Owning storage is dropped; a frozen handle's
    /// buffer is left to its owner.
    pub fn dispose<E: BitmapEngine>(self, heap: &mut BitmapHeap<E>) -> Result<(), BitmapError> {
        heap.unregister(self.id)
    }
}

impl<E: BitmapEngine> Dispose<BitmapHeap<E>> for BitmapHandle {
    type Error = BitmapError;

    fn dispose(self, heap: &mut BitmapHeap<E>) -> Result<(), BitmapError> {
        BitmapHandle::dispose(self, heap)
    }
}

impl<T: Element, E: BitmapEngine> Dispose<BitmapHeap<E>> for TypedView<T> {
    type Error = ArenaError;

    fn dispose(self, heap: &mut BitmapHeap<E>) -> Result<(), ArenaError> {
        TypedView::dispose(self, heap.arena_mut())
    }
}
