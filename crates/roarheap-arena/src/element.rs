//! Fixed-width element types storable in a [`TypedView`](crate::TypedView).

use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width integer that a typed view can hold.
///
/// Elements are stored little-endian regardless of host byte order, so the
/// arena's bytes can be handed to a serializer unchanged. Implemented for
/// `u8 i8 u16 i16 u32 i32 u64 i64`; sealed.
pub trait Element: Copy + Default + PartialEq + Debug + sealed::Sealed + 'static {
    /// Width of one element in bytes (1, 2, 4 or 8).
    const WIDTH: usize;

    /// Decode one element from exactly `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode this element into exactly `WIDTH` bytes.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64);
