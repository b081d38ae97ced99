//! Typed, disposable views over arena allocations.
//!
//! A [`TypedView<T>`] is a small `Copy` handle naming an allocation and
//! interpreting its bytes as `len` little-endian elements of type `T`.
//! Copies of a view are aliases: disposing any one of them invalidates all
//! of them, and every later access reports
//! [`ArenaError::UseAfterDispose`].

use std::fmt;
use std::marker::PhantomData;

use crate::arena::{AllocId, Arena};
use crate::element::Element;
use crate::error::ArenaError;

/// An array of `T` living in an [`Arena`].
///
/// The view owns its allocation until [`TypedView::dispose`] is called.
/// Nothing frees it implicitly; dropping the handle without disposing it
/// leaks the range until the arena itself is dropped.
#[must_use]
pub struct TypedView<T: Element> {
    /// Allocation backing this view.
    id: AllocId,
    /// Byte offset of element 0. Zero for empty views.
    byte_offset: usize,
    /// Number of elements.
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element> Clone for TypedView<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for TypedView<T> {}

impl<T: Element> PartialEq for TypedView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: Element> Eq for TypedView<T> {}

impl<T: Element> fmt::Debug for TypedView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedView")
            .field("id", &self.id)
            .field("byte_offset", &self.byte_offset)
            .field("len", &self.len)
            .field("width", &T::WIDTH)
            .finish()
    }
}

impl<T: Element> TypedView<T> {
    /// Width of one element in bytes.
    pub const BYTES_PER_ELEMENT: usize = T::WIDTH;

    /// Allocate `len` zero-initialised elements.
    ///
    /// Returns `Err(ArenaError::InvalidLength)` if `len * WIDTH` overflows,
    /// and `Err(ArenaError::OutOfMemory)` if the arena cannot grow far
    /// enough, including requests above its maximum size.
    pub fn with_len(arena: &mut Arena, len: usize) -> Result<Self, ArenaError> {
        let byte_len = Self::checked_byte_len(len)?;
        let allocation = arena.allocate(byte_len)?;
        Ok(Self {
            id: allocation.id,
            byte_offset: allocation.offset,
            len,
            _marker: PhantomData,
        })
    }

    /// Allocate a view holding a copy of `values`, in order.
    pub fn from_slice(arena: &mut Arena, values: &[T]) -> Result<Self, ArenaError> {
        let view = Self::with_len(arena, values.len())?;
        let bytes = arena.bytes_mut(view.id)?;
        for (chunk, &value) in bytes.chunks_exact_mut(T::WIDTH).zip(values) {
            value.write_le(chunk);
        }
        Ok(view)
    }

    /// Allocate a view holding the values of `iter`, in order.
    pub fn from_values<I>(arena: &mut Arena, iter: I) -> Result<Self, ArenaError>
    where
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = iter.into_iter().collect();
        Self::from_slice(arena, &values)
    }

    /// Allocate an independent copy of another view.
    ///
    /// Fails with `UseAfterDispose` (and allocates nothing) if `source` has
    /// been disposed.
    pub fn copy_of(arena: &mut Arena, source: &TypedView<T>) -> Result<Self, ArenaError> {
        arena.allocation(source.id)?;
        let view = Self::with_len(arena, source.len)?;
        if let Err(e) = arena.copy_bytes(source.id, view.id) {
            arena.free(view.id)?;
            return Err(e);
        }
        Ok(view)
    }

    /// Allocate a copy of a view of a narrower element type, widening each value.
    pub fn convert_from<S>(arena: &mut Arena, source: &TypedView<S>) -> Result<Self, ArenaError>
    where
        S: Element + Into<T>,
    {
        let values: Vec<T> = source
            .to_vec(arena)?
            .into_iter()
            .map(Into::into)
            .collect();
        Self::from_slice(arena, &values)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length in bytes (`len * WIDTH`).
    pub fn byte_len(&self) -> usize {
        self.len * T::WIDTH
    }

    /// Byte offset of element 0 within the arena region.
    ///
    /// Stays valid across growth; the address it corresponds to does not.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Width of one element in bytes.
    pub fn element_width(&self) -> usize {
        T::WIDTH
    }

    /// The allocation backing this view.
    pub fn id(&self) -> AllocId {
        self.id
    }

    /// Whether the backing allocation is still live.
    pub fn is_live(&self, arena: &Arena) -> bool {
        arena.is_live(self.id)
    }

    /// Read the element at `index`.
    pub fn get(&self, arena: &Arena, index: usize) -> Result<T, ArenaError> {
        let bytes = arena.bytes(self.id)?;
        let range = self.element_range(index)?;
        Ok(T::read_le(&bytes[range]))
    }

    /// Overwrite the element at `index`.
    pub fn set(&self, arena: &mut Arena, index: usize, value: T) -> Result<(), ArenaError> {
        let range = self.element_range(index)?;
        let bytes = arena.bytes_mut(self.id)?;
        value.write_le(&mut bytes[range]);
        Ok(())
    }

    /// Snapshot every element, in order.
    pub fn to_vec(&self, arena: &Arena) -> Result<Vec<T>, ArenaError> {
        let bytes = arena.bytes(self.id)?;
        Ok(bytes.chunks_exact(T::WIDTH).map(T::read_le).collect())
    }

    /// Set every element to `value`.
    pub fn fill(&self, arena: &mut Arena, value: T) -> Result<(), ArenaError> {
        let bytes = arena.bytes_mut(self.id)?;
        for chunk in bytes.chunks_exact_mut(T::WIDTH) {
            value.write_le(chunk);
        }
        Ok(())
    }

    /// Overwrite every element from `values`, which must have the same length.
    pub fn copy_from_slice(&self, arena: &mut Arena, values: &[T]) -> Result<(), ArenaError> {
        if values.len() != self.len {
            return Err(ArenaError::InvalidLength {
                len: values.len(),
                width: T::WIDTH,
            });
        }
        let bytes = arena.bytes_mut(self.id)?;
        for (chunk, &value) in bytes.chunks_exact_mut(T::WIDTH).zip(values) {
            value.write_le(chunk);
        }
        Ok(())
    }

    /// Borrow the raw little-endian bytes.
    pub fn as_bytes<'a>(&self, arena: &'a Arena) -> Result<&'a [u8], ArenaError> {
        arena.bytes(self.id)
    }

    /// Borrow the raw little-endian bytes mutably.
    pub fn as_bytes_mut<'a>(&self, arena: &'a mut Arena) -> Result<&'a mut [u8], ArenaError> {
        arena.bytes_mut(self.id)
    }

    /// Release the allocation, invalidating this view and all of its copies.
    ///
    /// Returns `Err(ArenaError::DoubleFree)` if the view was already disposed.
    pub fn dispose(self, arena: &mut Arena) -> Result<(), ArenaError> {
        arena.free(self.id)
    }

    fn checked_byte_len(len: usize) -> Result<usize, ArenaError> {
        len.checked_mul(T::WIDTH).ok_or(ArenaError::InvalidLength {
            len,
            width: T::WIDTH,
        })
    }

    fn element_range(&self, index: usize) -> Result<std::ops::Range<usize>, ArenaError> {
        if index >= self.len {
            return Err(ArenaError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        let start = index * T::WIDTH;
        Ok(start..start + T::WIDTH)
    }
}
