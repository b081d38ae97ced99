//! Contiguous byte arena with generational allocations and typed views.
//!
//! Every buffer handed out by this crate is a byte range inside a single
//! growable region owned by an [`Arena`]. Buffers are never reclaimed
//! implicitly: each one is released by an explicit `dispose` call, and a
//! released handle (or any copy of it) is detected on the next access.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── Vec<u8>                 (the region; reallocated on growth)
//! ├── FreeList                (coalescing first-fit over free byte ranges)
//! └── SlotTable<Reservation>  (AllocId → live byte range, generation-checked)
//!
//! TypedView<T: Element>       (Copy handle: AllocId + offset + element count)
//! ```
//!
//! # Addressing
//!
//! Growth moves the region, so nothing in this crate stores a raw address.
//! Handles carry `(generation, offset)` and slices are resolved through a
//! borrow of the arena for exactly as long as they are used; the borrow
//! checker rejects any attempt to hold a slice across a call that might
//! grow the region.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod arena;
pub mod config;
pub mod dispose;
pub mod element;
pub mod error;
pub mod slot;
pub mod view;

// Public re-exports for the primary API surface.
pub use arena::{AllocId, Allocation, Arena};
pub use config::ArenaConfig;
pub use dispose::{using, Dispose};
pub use element::Element;
pub use error::{ArenaError, ResourceKind};
pub use slot::{SlotId, SlotTable};
pub use view::TypedView;
