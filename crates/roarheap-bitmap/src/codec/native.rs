//! The compact native format: one tag byte, then either a flat array of
//! values or a full portable stream.
//!
//! ```text
//! tag 1 (array):       cardinality u32 | value u32 × cardinality
//! tag 2 (containers):  portable stream
//! ```
//!
//! The array layout is chosen whenever it is strictly smaller than the
//! portable stream and below [`MAX_NATIVE_ARRAY_BYTES`], which makes the
//! empty bitmap exactly `01 00 00 00 00`.

use super::bytes::{read_u32_le, read_u8, take};
use crate::error::BitmapError;

/// Tag byte of the flat-array layout.
pub const ARRAY_TAG: u8 = 1;
/// Tag byte of the embedded portable layout.
pub const CONTAINER_TAG: u8 = 2;
/// The array layout is only used below this many payload bytes.
pub const MAX_NATIVE_ARRAY_BYTES: u64 = 0x00FF_FFFF;

/// Payload size of the array layout for `cardinality` values.
pub(crate) fn array_payload_size(cardinality: u64) -> u64 {
    4 + 4 * cardinality
}

/// Whether the array layout wins over `portable_size` bytes of containers.
pub(crate) fn prefers_array(cardinality: u64, portable_size: usize) -> bool {
    let array = array_payload_size(cardinality);
    array < portable_size as u64 && array < MAX_NATIVE_ARRAY_BYTES
}

/// What a native stream holds once its tag has been read.
#[derive(Debug)]
pub(crate) enum NativeLayout<'a> {
    /// No members.
    Empty,
    /// Little-endian `u32` values, `4 × cardinality` bytes.
    Array(&'a [u8]),
    /// A portable stream following the tag byte.
    Containers(&'a [u8]),
}

/// Split a native stream by its tag. An empty input, a lone array tag and
/// an array with cardinality zero are all the empty bitmap.
pub(crate) fn split(data: &[u8]) -> Result<NativeLayout<'_>, BitmapError> {
    if data.is_empty() {
        return Ok(NativeLayout::Empty);
    }
    match read_u8(data, 0, "native tag")? {
        ARRAY_TAG if data.len() == 1 => Ok(NativeLayout::Empty),
        ARRAY_TAG => {
            let cardinality = read_u32_le(data, 1, "native cardinality")? as usize;
            if cardinality == 0 {
                return Ok(NativeLayout::Empty);
            }
            let len = cardinality.checked_mul(4).ok_or_else(|| {
                BitmapError::corrupt(format!("native cardinality {cardinality} overflows"))
            })?;
            Ok(NativeLayout::Array(take(data, 5, len, "native values")?))
        }
        CONTAINER_TAG => Ok(NativeLayout::Containers(&data[1..])),
        tag => Err(BitmapError::corrupt(format!("unknown native tag {tag}"))),
    }
}
