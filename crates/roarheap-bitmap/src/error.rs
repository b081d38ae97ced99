//! Error types for bitmap handles and the codec.

use roarheap_arena::ArenaError;

/// Errors that can occur while building, querying or (de)serializing bitmaps.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    /// An arena-level failure: out of memory, a disposed view or handle,
    /// a double free, or a bad length.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// Serialized input could not be decoded (truncated or corrupt data).
    #[error("corrupt data: {detail}")]
    CorruptData {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// `minimum()` or `maximum()` on a bitmap with no members.
    #[error("bitmap is empty")]
    EmptySet,
    /// An output buffer whose length does not match the serialized size.
    #[error("output buffer is {actual} bytes, serialization needs {expected}")]
    BufferSize {
        /// Exact number of bytes required.
        expected: usize,
        /// Length of the buffer supplied.
        actual: usize,
    },
    /// The bitmap engine reported a failure while encoding.
    #[error("bitmap engine failure: {detail}")]
    Engine {
        /// Description from the engine.
        detail: String,
    },
}

impl BitmapError {
    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        Self::CorruptData {
            detail: detail.into(),
        }
    }

    /// Whether this is an access through a disposed view or handle.
    pub fn is_use_after_dispose(&self) -> bool {
        matches!(self, Self::Arena(ArenaError::UseAfterDispose { .. }))
    }

    /// Whether this is a second disposal of a view or handle.
    pub fn is_double_free(&self) -> bool {
        matches!(self, Self::Arena(ArenaError::DoubleFree { .. }))
    }
}
