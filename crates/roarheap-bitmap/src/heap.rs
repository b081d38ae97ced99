//! The bitmap heap: one arena plus the table of registered bitmaps.
//!
//! A registered bitmap is either *owning* (an engine bitmap held by the
//! table) or *frozen* (a typed byte view into the arena that is re-parsed
//! on every query). Disposal dispatches on that tag: owning entries drop
//! their engine bitmap, frozen entries are only unregistered and their
//! byte view stays with whoever allocated it.

use roaring::RoaringBitmap;
use roarheap_arena::{
    Arena, ArenaConfig, ArenaError, Element, ResourceKind, SlotId, SlotTable, TypedView,
};
use tracing::{debug, trace};

use crate::codec::{self, Format, FrozenBitmap};
use crate::engine::BitmapEngine;
use crate::error::BitmapError;

/// Where a registered bitmap's members live.
pub(crate) enum Provenance<E> {
    /// An engine bitmap owned by the heap.
    Owning(E),
    /// Serialized bytes owned by the caller, aliased read-only.
    Frozen {
        bytes: TypedView<u8>,
        format: Format,
    },
}

/// A resolved, read-only view of one registered bitmap.
#[derive(Debug)]
pub(crate) enum BitmapRef<'h, E> {
    Owning(&'h E),
    Frozen(FrozenBitmap<'h>),
}

impl<'h, E: BitmapEngine> BitmapRef<'h, E> {
    pub(crate) fn cardinality(&self) -> u64 {
        match self {
            Self::Owning(e) => e.cardinality(),
            Self::Frozen(f) => f.cardinality(),
        }
    }

    pub(crate) fn contains(&self, value: u32) -> bool {
        match self {
            Self::Owning(e) => e.contains(value),
            Self::Frozen(f) => f.contains(value),
        }
    }

    pub(crate) fn minimum(&self) -> Option<u32> {
        match self {
            Self::Owning(e) => e.minimum(),
            Self::Frozen(f) => f.minimum(),
        }
    }

    pub(crate) fn maximum(&self) -> Option<u32> {
        match self {
            Self::Owning(e) => e.maximum(),
            Self::Frozen(f) => f.maximum(),
        }
    }

    pub(crate) fn select(&self, rank: u64) -> Option<u32> {
        match self {
            Self::Owning(e) => e.select(rank),
            Self::Frozen(f) => f.select(rank),
        }
    }

    pub(crate) fn values(&self) -> Box<dyn Iterator<Item = u32> + 'h> {
        match self {
            Self::Owning(e) => {
                let e: &'h E = *e;
                e.values()
            }
            Self::Frozen(f) => f.iter(),
        }
    }
}

fn stale(id: SlotId) -> BitmapError {
    ArenaError::UseAfterDispose {
        kind: ResourceKind::Bitmap,
        index: id.index(),
        generation: id.generation(),
    }
    .into()
}

/// An [`Arena`] together with every bitmap registered against it.
///
/// Generic over the bitmap engine; the default is [`RoaringBitmap`].
pub struct BitmapHeap<E: BitmapEngine = RoaringBitmap> {
    arena: Arena,
    bitmaps: SlotTable<Provenance<E>>,
}

impl<E: BitmapEngine> BitmapHeap<E> {
    /// Create a heap over a fresh arena built from `config`.
    pub fn new(config: ArenaConfig) -> Result<Self, BitmapError> {
        Ok(Self::from_arena(Arena::new(config)?))
    }

    /// Create a heap over an arena with [`ArenaConfig::default`].
    pub fn with_defaults() -> Result<Self, BitmapError> {
        Self::new(ArenaConfig::default())
    }

    /// Wrap an existing arena. Views already allocated in it stay valid.
    pub fn from_arena(arena: Arena) -> Self {
        Self {
            arena,
            bitmaps: SlotTable::new(),
        }
    }

    /// The backing arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The backing arena, for allocating and writing typed views.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Number of bitmaps registered and not yet disposed.
    pub fn live_bitmaps(&self) -> usize {
        self.bitmaps.len()
    }

    /// Number of live bitmaps still aliasing a caller's buffer.
    pub fn frozen_bitmaps(&self) -> usize {
        self.bitmaps
            .iter()
            .filter(|(_, p)| matches!(p, Provenance::Frozen { .. }))
            .count()
    }

    // ── Registry ────────────────────────────────────────────────

    pub(crate) fn register(&mut self, provenance: Provenance<E>) -> SlotId {
        let frozen = matches!(provenance, Provenance::Frozen { .. });
        let id = self.bitmaps.insert(provenance);
        trace!(bitmap = %id, frozen, "bitmap registered");
        id
    }

    pub(crate) fn unregister(&mut self, id: SlotId) -> Result<(), BitmapError> {
        match self.bitmaps.remove(id) {
            Some(provenance) => {
                let frozen = matches!(provenance, Provenance::Frozen { .. });
                trace!(bitmap = %id, frozen, "bitmap disposed");
                Ok(())
            }
            None => Err(ArenaError::DoubleFree {
                kind: ResourceKind::Bitmap,
                index: id.index(),
                generation: id.generation(),
            }
            .into()),
        }
    }

    pub(crate) fn contains_bitmap(&self, id: SlotId) -> bool {
        self.bitmaps.contains(id)
    }

    pub(crate) fn is_frozen(&self, id: SlotId) -> Result<bool, BitmapError> {
        let provenance = self.bitmaps.get(id).ok_or_else(|| stale(id))?;
        Ok(matches!(provenance, Provenance::Frozen { .. }))
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Resolve a handle for reading. Frozen bitmaps are parsed from the
    /// arena bytes as they are now.
    pub(crate) fn resolve(&self, id: SlotId) -> Result<BitmapRef<'_, E>, BitmapError> {
        match self.bitmaps.get(id).ok_or_else(|| stale(id))? {
            Provenance::Owning(engine) => Ok(BitmapRef::Owning(engine)),
            Provenance::Frozen { bytes, format } => {
                let data = bytes.as_bytes(&self.arena)?;
                Ok(BitmapRef::Frozen(FrozenBitmap::parse(data, *format)?))
            }
        }
    }

    /// Run `f` against an engine bitmap holding the handle's members,
    /// decoding a temporary copy for frozen handles.
    pub(crate) fn with_engine<R>(
        &self,
        id: SlotId,
        f: impl FnOnce(&E) -> R,
    ) -> Result<R, BitmapError> {
        match self.bitmaps.get(id).ok_or_else(|| stale(id))? {
            Provenance::Owning(engine) => Ok(f(engine)),
            Provenance::Frozen { bytes, format } => {
                let temp: E = codec::decode(bytes.as_bytes(&self.arena)?, *format)?;
                Ok(f(&temp))
            }
        }
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Mutable access to the engine bitmap, promoting a frozen entry to an
    /// owning copy first. A failed promotion leaves the entry frozen.
    pub(crate) fn owning_mut(&mut self, id: SlotId) -> Result<&mut E, BitmapError> {
        let Self { arena, bitmaps } = self;
        let entry = bitmaps.get_mut(id).ok_or_else(|| stale(id))?;
        if let Provenance::Frozen { bytes, format } = &*entry {
            let promoted: E = codec::decode(bytes.as_bytes(arena)?, *format)?;
            debug!(
                bitmap = %id,
                buffer = %bytes.id(),
                cardinality = promoted.cardinality(),
                "frozen bitmap promoted to owning storage"
            );
            *entry = Provenance::Owning(promoted);
        }
        match entry {
            Provenance::Owning(engine) => Ok(engine),
            Provenance::Frozen { .. } => Err(stale(id)),
        }
    }

    /// Swap in a new owning engine bitmap, whatever the entry held before.
    pub(crate) fn replace(&mut self, id: SlotId, engine: E) -> Result<(), BitmapError> {
        let entry = self.bitmaps.get_mut(id).ok_or_else(|| stale(id))?;
        if matches!(entry, Provenance::Frozen { .. }) {
            debug!(bitmap = %id, "frozen bitmap replaced by owning storage");
        }
        *entry = Provenance::Owning(engine);
        Ok(())
    }

    /// Insert the `u32` elements of `view` into the handle's bitmap.
    pub(crate) fn extend_from_view(
        &mut self,
        id: SlotId,
        view: &TypedView<u32>,
    ) -> Result<(), BitmapError> {
        // Fail on a dead view before a frozen entry is promoted.
        view.as_bytes(&self.arena)?;
        self.owning_mut(id)?;
        let Self { arena, bitmaps } = self;
        let data = view.as_bytes(arena)?;
        match bitmaps.get_mut(id) {
            Some(Provenance::Owning(engine)) => {
                engine.insert_many(data.chunks_exact(4).map(u32::read_le));
                Ok(())
            }
            _ => Err(stale(id)),
        }
    }

    /// Encode the handle's bitmap into `out`, an arena view of exactly the
    /// serialized size.
    pub(crate) fn encode_into_view(
        &mut self,
        id: SlotId,
        format: Format,
        out: TypedView<u8>,
    ) -> Result<usize, BitmapError> {
        let temp: E;
        let Self { arena, bitmaps } = self;
        let engine = match bitmaps.get(id).ok_or_else(|| stale(id))? {
            Provenance::Owning(engine) => engine,
            Provenance::Frozen { bytes, format: stored } => {
                temp = codec::decode(bytes.as_bytes(arena)?, *stored)?;
                &temp
            }
        };
        codec::encode_into(engine, format, out.as_bytes_mut(arena)?)
    }
}
