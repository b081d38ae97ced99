//! Compressed bitmaps registered against a byte arena, with portable,
//! native and frozen (zero-copy) serialization.
//!
//! Bitmaps are created, queried, mutated and disposed through
//! [`BitmapHandle`]s that name entries in a [`BitmapHeap`]. Serialized
//! bytes travel as arena-backed [`TypedView<u8>`](roarheap_arena::TypedView)s
//! or plain slices.
//!
//! # Architecture
//!
//! ```text
//! BitmapHeap<E: BitmapEngine>
//! ├── Arena                        (typed views, serialized buffers)
//! └── SlotTable<Provenance<E>>
//!     ├── Owning(E)                (engine bitmap, dropped on dispose)
//!     └── Frozen { TypedView<u8> } (aliased buffer, never freed by the handle)
//!
//! codec
//! ├── portable   (cookie 12346 / 12347 roaring layout, read-only parser)
//! ├── native     (tag 1 flat array | tag 2 portable)
//! └── frozen     (FrozenBitmap: queries over borrowed bytes)
//! ```
//!
//! # Frozen handles
//!
//! A handle decoded with [`DecodeMode::Frozen`] reads its buffer at query
//! time, so writes to the buffer are visible through the handle. Any
//! mutation (`add`, `remove`, `add_many`, `clear`, `optimize`) first
//! promotes the handle to an owning copy; from then on the buffer is no
//! longer read.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod engine;
pub mod error;
pub mod handle;
pub mod heap;

// Public re-exports for the primary API surface.
pub use codec::{DecodeMode, Format, FrozenBitmap};
pub use engine::BitmapEngine;
pub use error::BitmapError;
pub use handle::BitmapHandle;
pub use heap::BitmapHeap;
pub use roaring::RoaringBitmap;
