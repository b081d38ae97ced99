//! Bounds-checked little-endian reads over borrowed byte slices.
//!
//! The checked readers are used while a layout is being parsed and turn a
//! short read into [`BitmapError::CorruptData`]. The `*_at` readers are for
//! offsets a successful parse has already proven to be in range.

use crate::error::BitmapError;

// ── Checked readers ─────────────────────────────────────────────

/// Borrow `len` bytes at `offset`, naming `what` on a short read.
pub(crate) fn take<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8], BitmapError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            BitmapError::corrupt(format!(
                "truncated {what}: need {len} bytes at offset {offset}, have {}",
                data.len()
            ))
        })
}

/// Read a single byte.
pub(crate) fn read_u8(data: &[u8], offset: usize, what: &str) -> Result<u8, BitmapError> {
    Ok(take(data, offset, 1, what)?[0])
}

/// Read a little-endian u16.
pub(crate) fn read_u16_le(data: &[u8], offset: usize, what: &str) -> Result<u16, BitmapError> {
    let b = take(data, offset, 2, what)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read a little-endian u32.
pub(crate) fn read_u32_le(data: &[u8], offset: usize, what: &str) -> Result<u32, BitmapError> {
    let b = take(data, offset, 4, what)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

// ── Pre-validated readers ───────────────────────────────────────

#[inline]
pub(crate) fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
pub(crate) fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn u64_at(data: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(word)
}

// ── Writers ─────────────────────────────────────────────────────

/// Write a little-endian u32 at `offset`. The caller sizes `out`.
#[inline]
pub(crate) fn put_u32_le(out: &mut [u8], offset: usize, v: u32) {
    out[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}
