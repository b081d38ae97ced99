//! roarheap: compressed bitmaps over a manually managed byte arena.
//!
//! This is the facade crate. It re-exports the arena and bitmap crates and
//! offers a [`prelude`] with the types most programs need.
//!
//! # Quick start
//!
//! ```rust
//! use roarheap::prelude::*;
//!
//! # fn main() -> Result<(), BitmapError> {
//! let mut heap: BitmapHeap = BitmapHeap::with_defaults()?;
//!
//! let bitmap = BitmapHandle::from_values(&mut heap, [5, 1, 3, 1]);
//! assert_eq!(bitmap.to_vec(&heap)?, vec![1, 3, 5]);
//!
//! // Serialize into an arena buffer, then decode it without copying.
//! let bytes = bitmap.serialize(&mut heap, Format::Native)?;
//! let frozen = BitmapHandle::deserialize(&mut heap, &bytes, Format::Native, DecodeMode::Frozen)?;
//! assert!(frozen.contains(&heap, 3)?);
//!
//! // Nothing is freed implicitly.
//! frozen.dispose(&mut heap)?;
//! bytes.dispose(heap.arena_mut())?;
//! bitmap.dispose(&mut heap)?;
//! assert_eq!(heap.arena().live_allocations(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `roarheap-arena` | `Arena`, `TypedView`, `SlotTable`, `Dispose`, `using` |
//! | [`bitmap`] | `roarheap-bitmap` | `BitmapHeap`, `BitmapHandle`, codec, `FrozenBitmap` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Byte arena, typed views and explicit disposal (`roarheap-arena`).
///
/// [`arena::TypedView`] is the unit of manually managed memory; every
/// view is released with an explicit `dispose`.
pub use roarheap_arena as arena;

/// Arena-registered bitmaps and their wire formats (`roarheap-bitmap`).
///
/// [`bitmap::codec`] holds the portable and native layouts and the
/// zero-copy [`bitmap::FrozenBitmap`].
pub use roarheap_bitmap as bitmap;

/// Common imports for typical roarheap usage.
///
/// ```rust
/// use roarheap::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use roarheap_arena::{using, Arena, ArenaConfig, Dispose, Element, TypedView};

    // Bitmaps
    pub use roarheap_bitmap::{
        BitmapEngine, BitmapHandle, BitmapHeap, DecodeMode, Format, FrozenBitmap, RoaringBitmap,
    };

    // Errors
    pub use roarheap_arena::{ArenaError, ResourceKind};
    pub use roarheap_bitmap::BitmapError;
}
