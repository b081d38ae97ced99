//! Bitmap serialization: the portable and native wire formats, copying
//! decode, and the zero-copy [`FrozenBitmap`].
//!
//! All integers are little-endian. The portable format is the standard
//! cross-implementation roaring layout; the native format wraps it behind
//! a tag byte and adds a flat-array shortcut for small sets.

pub(crate) mod bytes;
pub mod frozen;
pub mod native;
pub mod portable;

pub use frozen::FrozenBitmap;

use crate::engine::BitmapEngine;
use crate::error::BitmapError;

/// Wire format of a serialized bitmap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Standard roaring layout, readable by any compliant implementation.
    #[default]
    Portable,
    /// Compact tagged layout; smallest for empty and sparse sets.
    Native,
}

impl Format {
    /// Map the conventional `portable: bool` flag onto a format.
    pub fn from_portable_flag(portable: bool) -> Self {
        if portable {
            Self::Portable
        } else {
            Self::Native
        }
    }

    /// The inverse of [`from_portable_flag`](Self::from_portable_flag).
    pub fn is_portable(self) -> bool {
        self == Self::Portable
    }
}

/// How a decoded handle relates to its input buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Copy into an owning bitmap with an independent lifetime.
    #[default]
    Copy,
    /// Alias the input buffer; it must outlive the handle.
    ///
    /// Every query re-parses the container directory from the buffer so
    /// that writes to it are observed. That parse is linear in the number
    /// of containers and allocates once there are more than eight, so
    /// query-heavy callers with large bitmaps should decode with
    /// [`Copy`](Self::Copy) instead.
    Frozen,
}

/// Exact length of `bitmap` serialized in `format`.
pub fn serialized_size<E: BitmapEngine>(bitmap: &E, format: Format) -> usize {
    let portable = bitmap.portable_size();
    match format {
        Format::Portable => portable,
        Format::Native => {
            let cardinality = bitmap.cardinality();
            if native::prefers_array(cardinality, portable) {
                // Below MAX_NATIVE_ARRAY_BYTES, so it fits in usize.
                1 + native::array_payload_size(cardinality) as usize
            } else {
                1 + portable
            }
        }
    }
}

/// Serialize `bitmap` into `out`, which must be exactly
/// [`serialized_size`] bytes. Returns the number of bytes written.
pub fn encode_into<E: BitmapEngine>(
    bitmap: &E,
    format: Format,
    out: &mut [u8],
) -> Result<usize, BitmapError> {
    let expected = serialized_size(bitmap, format);
    if out.len() != expected {
        return Err(BitmapError::BufferSize {
            expected,
            actual: out.len(),
        });
    }
    let engine_err = |e: std::io::Error| BitmapError::Engine {
        detail: e.to_string(),
    };
    match format {
        Format::Portable => bitmap.serialize_portable_into(out).map_err(engine_err)?,
        Format::Native if native::prefers_array(bitmap.cardinality(), bitmap.portable_size()) => {
            out[0] = native::ARRAY_TAG;
            bytes::put_u32_le(out, 1, bitmap.cardinality() as u32);
            for (chunk, value) in out[5..].chunks_exact_mut(4).zip(bitmap.values()) {
                chunk.copy_from_slice(&value.to_le_bytes());
            }
        }
        Format::Native => {
            out[0] = native::CONTAINER_TAG;
            bitmap
                .serialize_portable_into(&mut out[1..])
                .map_err(engine_err)?;
        }
    }
    Ok(expected)
}

/// Serialize `bitmap` into a fresh vector.
pub fn encode_to_vec<E: BitmapEngine>(bitmap: &E, format: Format) -> Result<Vec<u8>, BitmapError> {
    let mut out = vec![0u8; serialized_size(bitmap, format)];
    encode_into(bitmap, format, &mut out)?;
    Ok(out)
}

/// Decode `bytes` into a new owning engine bitmap.
///
/// The input is validated in full first, so a corrupt stream never reaches
/// the engine half-read. A native flat array is inserted value by value,
/// so unsorted or repeated entries are accepted and collapse into a set.
pub fn decode<E: BitmapEngine>(bytes: &[u8], format: Format) -> Result<E, BitmapError> {
    let frozen = FrozenBitmap::parse(bytes, format)?;
    frozen.validate_containers()?;
    match frozen.portable_payload() {
        Some(payload) => E::deserialize_portable(payload)
            .map_err(|e| BitmapError::corrupt(format!("engine rejected portable stream: {e}"))),
        None => {
            let mut bitmap = E::create();
            bitmap.insert_many(frozen.iter());
            Ok(bitmap)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roaring::RoaringBitmap;

    use proptest::prelude::*;

    fn bitmap(values: &[u32]) -> RoaringBitmap {
        let mut b = RoaringBitmap::create();
        b.insert_many(values.iter().copied());
        b
    }

    #[test]
    fn canonical_empty_encodings() {
        let empty = RoaringBitmap::create();
        assert_eq!(serialized_size(&empty, Format::Native), 5);
        assert_eq!(
            encode_to_vec(&empty, Format::Native).unwrap(),
            [0x01, 0, 0, 0, 0]
        );
        assert_eq!(serialized_size(&empty, Format::Portable), 8);
        assert_eq!(
            encode_to_vec(&empty, Format::Portable).unwrap(),
            [0x3A, 0x30, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn portable_flag_mapping() {
        assert_eq!(Format::from_portable_flag(true), Format::Portable);
        assert_eq!(Format::from_portable_flag(false), Format::Native);
        assert!(!Format::Native.is_portable());
        assert_eq!(DecodeMode::default(), DecodeMode::Copy);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let b = bitmap(&[1, 2, 3]);
        let mut out = vec![0u8; serialized_size(&b, Format::Native) + 1];
        let err = encode_into(&b, Format::Native, &mut out).unwrap_err();
        assert!(matches!(err, BitmapError::BufferSize { .. }));
    }

    #[test]
    fn native_array_bytes() {
        let bytes = encode_to_vec(&bitmap(&[3, 1, 2]), Format::Native).unwrap();
        assert_eq!(
            bytes,
            [1, 3, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]
        );
    }

    #[test]
    fn decode_accepts_run_containers() {
        // One container, key 1, a single run 5..=9.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::from(portable::SERIAL_COOKIE).to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&5u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());

        let decoded: RoaringBitmap = decode(&bytes, Format::Portable).unwrap();
        let expected: Vec<u32> = (5..10).map(|v| (1 << 16) | v).collect();
        assert_eq!(decoded.values().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn unsorted_native_array_decodes_as_a_set() {
        let bytes = [1, 3, 0, 0, 0, 9, 0, 0, 0, 4, 0, 0, 0, 9, 0, 0, 0];
        let decoded: RoaringBitmap = decode(&bytes, Format::Native).unwrap();
        assert_eq!(decoded.values().collect::<Vec<_>>(), vec![4, 9]);
        assert!(FrozenBitmap::parse_checked(&bytes, Format::Native).is_err());
    }

    #[test]
    fn optimized_runs_round_trip_in_both_formats() {
        let mut b = bitmap(&(0..100_000u32).collect::<Vec<_>>());
        let before = serialized_size(&b, Format::Portable);
        assert!(BitmapEngine::optimize(&mut b));
        assert!(serialized_size(&b, Format::Portable) < before);

        for format in [Format::Portable, Format::Native] {
            let bytes = encode_to_vec(&b, format).unwrap();
            assert_eq!(bytes.len(), serialized_size(&b, format));
            let back: RoaringBitmap = decode(&bytes, format).unwrap();
            assert_eq!(back, b);
            let frozen = FrozenBitmap::parse_checked(&bytes, format).unwrap();
            assert_eq!(frozen.cardinality(), 100_000);
            assert!(frozen.contains(65_536));
        }
    }

    #[test]
    fn scenario_size_matches_output() {
        let values = [
            1, 2, 3, 4, 5, 6, 100, 101, 105, 109, 0x7fff_ffff, 0xffff_fffe, 0xffff_ffff,
        ];
        let mut b = bitmap(&values);
        for format in [Format::Portable, Format::Native] {
            assert_eq!(
                serialized_size(&b, format),
                encode_to_vec(&b, format).unwrap().len()
            );
        }
        BitmapEngine::optimize(&mut b);
        for format in [Format::Portable, Format::Native] {
            assert_eq!(
                serialized_size(&b, format),
                encode_to_vec(&b, format).unwrap().len()
            );
        }
    }

    proptest! {
        #[test]
        fn size_invariant_and_round_trip(
            values in proptest::collection::vec(any::<u32>(), 0..300),
            dense in proptest::collection::vec(0u32..70_000, 0..6_000),
            portable in any::<bool>(),
        ) {
            let format = Format::from_portable_flag(portable);
            let mut all = values;
            all.extend(dense);
            let b = bitmap(&all);

            let bytes = encode_to_vec(&b, format).unwrap();
            prop_assert_eq!(bytes.len(), serialized_size(&b, format));

            let back: RoaringBitmap = decode(&bytes, format).unwrap();
            all.sort_unstable();
            all.dedup();
            prop_assert_eq!(back.values().collect::<Vec<_>>(), all.clone());

            let frozen = FrozenBitmap::parse_checked(&bytes, format).unwrap();
            prop_assert_eq!(frozen.to_vec(), all);
        }
    }
}
