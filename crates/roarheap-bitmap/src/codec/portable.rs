//! Read-only layout of the portable (cross-implementation) roaring format.
//!
//! ```text
//! without runs:  cookie=12346 u32 | count u32 | (key u16, card-1 u16) × n
//!                | offset u32 × n | containers
//! with runs:     cookie=12347 | (n-1)<<16 as u32 | run flags ⌈n/8⌉ bytes
//!                | (key u16, card-1 u16) × n | offset u32 × n (only n ≥ 4)
//!                | containers
//!
//! array container   card × u16 ascending           (card ≤ 4096)
//! bitset container  1024 × u64 little-endian words  (card > 4096)
//! run container     n_runs u16 | (start u16, len-1 u16) × n_runs
//! ```
//!
//! Offsets are never trusted; container positions are recomputed from the
//! descriptive header so a layout that parses is fully in bounds.

use smallvec::SmallVec;

use super::bytes::{read_u16_le, read_u32_le, take, u16_at, u64_at};
use crate::error::BitmapError;

/// Cookie of a portable stream without run containers.
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
/// Low 16 bits of the cookie of a portable stream with run containers.
pub const SERIAL_COOKIE: u16 = 12347;
/// Run-format streams with fewer containers than this omit the offset table.
pub const NO_OFFSET_THRESHOLD: usize = 4;
/// Largest cardinality stored as an array container.
pub const ARRAY_CONTAINER_MAX: u32 = 4096;
/// Payload size of a bitset container.
pub const BITSET_CONTAINER_BYTES: usize = 8192;
/// One container per 16-bit key.
pub const MAX_CONTAINERS: usize = 1 << 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Array,
    Bitset,
    Run { runs: u16 },
}

/// Position of one container inside the stream. `offset` points at the
/// first value/word/run pair, past any run-count prefix.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContainerRef {
    pub(crate) key: u16,
    pub(crate) cardinality: u32,
    pub(crate) kind: ContainerKind,
    pub(crate) offset: usize,
}

impl ContainerRef {
    #[inline]
    fn high(&self) -> u32 {
        u32::from(self.key) << 16
    }

    fn contains(&self, data: &[u8], low: u16) -> bool {
        match self.kind {
            ContainerKind::Array => {
                let (mut lo, mut hi) = (0usize, self.cardinality as usize);
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    match u16_at(data, self.offset + 2 * mid).cmp(&low) {
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid,
                        std::cmp::Ordering::Equal => return true,
                    }
                }
                false
            }
            ContainerKind::Bitset => {
                let word = u64_at(data, self.offset + 8 * usize::from(low >> 6));
                word & (1u64 << (low & 63)) != 0
            }
            ContainerKind::Run { runs } => {
                for r in 0..usize::from(runs) {
                    let (start, end) = run_at(data, self.offset, r);
                    if u32::from(low) < start {
                        return false;
                    }
                    if u32::from(low) <= end {
                        return true;
                    }
                }
                false
            }
        }
    }

    fn minimum(&self, data: &[u8]) -> Option<u32> {
        let low = match self.kind {
            ContainerKind::Array if self.cardinality > 0 => u32::from(u16_at(data, self.offset)),
            ContainerKind::Array => return None,
            ContainerKind::Bitset => (0..1024).find_map(|w| {
                let word = u64_at(data, self.offset + 8 * w);
                (word != 0).then(|| (w as u32) * 64 + word.trailing_zeros())
            })?,
            ContainerKind::Run { runs: 0 } => return None,
            ContainerKind::Run { .. } => run_at(data, self.offset, 0).0,
        };
        Some(self.high() | low)
    }

    fn maximum(&self, data: &[u8]) -> Option<u32> {
        let low = match self.kind {
            ContainerKind::Array if self.cardinality > 0 => {
                u32::from(u16_at(data, self.offset + 2 * (self.cardinality as usize - 1)))
            }
            ContainerKind::Array => return None,
            ContainerKind::Bitset => (0..1024).rev().find_map(|w| {
                let word = u64_at(data, self.offset + 8 * w);
                (word != 0).then(|| (w as u32) * 64 + 63 - word.leading_zeros())
            })?,
            ContainerKind::Run { runs: 0 } => return None,
            ContainerKind::Run { runs } => run_at(data, self.offset, usize::from(runs) - 1).1,
        };
        Some(self.high() | low)
    }

    fn values<'a>(&self, data: &'a [u8]) -> Box<dyn Iterator<Item = u32> + 'a> {
        let high = self.high();
        let offset = self.offset;
        match self.kind {
            ContainerKind::Array => {
                let count = self.cardinality as usize;
                Box::new((0..count).map(move |i| high | u32::from(u16_at(data, offset + 2 * i))))
            }
            ContainerKind::Bitset => Box::new((0..1024usize).flat_map(move |w| {
                let mut word = u64_at(data, offset + 8 * w);
                std::iter::from_fn(move || {
                    if word == 0 {
                        return None;
                    }
                    let bit = word.trailing_zeros();
                    word &= word - 1;
                    Some(high | (w as u32 * 64 + bit))
                })
            })),
            ContainerKind::Run { runs } => Box::new((0..usize::from(runs)).flat_map(move |r| {
                let (start, end) = run_at(data, offset, r);
                (start..=end.min(0xFFFF)).map(move |low| high | low)
            })),
        }
    }

    /// Checks that go beyond structure: ascending arrays, well-formed runs
    /// and cardinalities that agree with the payload.
    fn validate_contents(&self, data: &[u8]) -> Result<(), BitmapError> {
        match self.kind {
            ContainerKind::Array => {
                let mut prev: Option<u16> = None;
                for i in 0..self.cardinality as usize {
                    let v = u16_at(data, self.offset + 2 * i);
                    if prev.is_some_and(|p| p >= v) {
                        return Err(BitmapError::corrupt(format!(
                            "array container {:#06x} is not strictly ascending",
                            self.key
                        )));
                    }
                    prev = Some(v);
                }
            }
            ContainerKind::Bitset => {
                let bits: u32 = (0..1024)
                    .map(|w| u64_at(data, self.offset + 8 * w).count_ones())
                    .sum();
                if bits != self.cardinality {
                    return Err(BitmapError::corrupt(format!(
                        "bitset container {:#06x} holds {bits} bits, header says {}",
                        self.key, self.cardinality
                    )));
                }
            }
            ContainerKind::Run { runs } => {
                let mut total = 0u32;
                let mut prev_end: Option<u32> = None;
                for r in 0..usize::from(runs) {
                    let (start, end) = run_at(data, self.offset, r);
                    if end > 0xFFFF || prev_end.is_some_and(|p| start <= p) {
                        return Err(BitmapError::corrupt(format!(
                            "run container {:#06x} has a malformed run at index {r}",
                            self.key
                        )));
                    }
                    total += end - start + 1;
                    prev_end = Some(end);
                }
                if total != self.cardinality {
                    return Err(BitmapError::corrupt(format!(
                        "run container {:#06x} covers {total} values, header says {}",
                        self.key, self.cardinality
                    )));
                }
            }
        }
        Ok(())
    }
}

/// `(start, inclusive end)` of run `r`, widened so `end` may exceed 0xFFFF
/// on corrupt input without overflowing.
#[inline]
fn run_at(data: &[u8], offset: usize, r: usize) -> (u32, u32) {
    let start = u32::from(u16_at(data, offset + 4 * r));
    let len = u32::from(u16_at(data, offset + 4 * r + 2));
    (start, start + len)
}

/// Parsed container directory of a portable stream.
#[derive(Clone, Debug)]
pub(crate) struct PortableLayout {
    containers: SmallVec<[ContainerRef; 8]>,
    end: usize,
}

impl PortableLayout {
    /// Parse the header and locate every container. Fails on a bad cookie,
    /// more than 65536 containers, non-ascending keys or any truncation.
    pub(crate) fn parse(data: &[u8]) -> Result<Self, BitmapError> {
        let cookie = read_u32_le(data, 0, "portable cookie")?;
        let (count, run_flags, mut pos) = if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
            let count = read_u32_le(data, 4, "container count")? as usize;
            (count, None, 8usize)
        } else if cookie & 0xFFFF == u32::from(SERIAL_COOKIE) {
            let count = (cookie >> 16) as usize + 1;
            let flags = take(data, 4, count.div_ceil(8), "run flags")?;
            (count, Some(flags), 4 + flags.len())
        } else {
            return Err(BitmapError::corrupt(format!(
                "unrecognised portable cookie {cookie:#010x}"
            )));
        };
        if count > MAX_CONTAINERS {
            return Err(BitmapError::corrupt(format!(
                "{count} containers exceeds the maximum of {MAX_CONTAINERS}"
            )));
        }

        let header = take(data, pos, count * 4, "container headers")?;
        pos += header.len();
        if run_flags.is_none() || count >= NO_OFFSET_THRESHOLD {
            pos += take(data, pos, count * 4, "container offsets")?.len();
        }

        let mut containers = SmallVec::with_capacity(count);
        let mut prev_key: Option<u16> = None;
        for i in 0..count {
            let key = u16_at(header, 4 * i);
            let cardinality = u32::from(u16_at(header, 4 * i + 2)) + 1;
            if prev_key.is_some_and(|p| p >= key) {
                return Err(BitmapError::corrupt(format!(
                    "container keys not strictly ascending at index {i}"
                )));
            }
            prev_key = Some(key);

            let is_run = run_flags.is_some_and(|f| f[i / 8] & (1 << (i % 8)) != 0);
            let (kind, offset, size) = if is_run {
                let runs = read_u16_le(data, pos, "run count")?;
                (ContainerKind::Run { runs }, pos + 2, 2 + 4 * usize::from(runs))
            } else if cardinality > ARRAY_CONTAINER_MAX {
                (ContainerKind::Bitset, pos, BITSET_CONTAINER_BYTES)
            } else {
                (ContainerKind::Array, pos, 2 * cardinality as usize)
            };
            take(data, pos, size, "container payload")?;
            pos += size;
            containers.push(ContainerRef {
                key,
                cardinality,
                kind,
                offset,
            });
        }

        Ok(Self {
            containers,
            end: pos,
        })
    }

    /// Content checks applied before trusting the stream for a copy.
    pub(crate) fn validate_contents(&self, data: &[u8]) -> Result<(), BitmapError> {
        self.containers
            .iter()
            .try_for_each(|c| c.validate_contents(data))
    }

    /// Bytes consumed by the stream.
    pub(crate) fn end(&self) -> usize {
        self.end
    }


    pub(crate) fn cardinality(&self) -> u64 {
        self.containers
            .iter()
            .map(|c| u64::from(c.cardinality))
            .sum()
    }

    pub(crate) fn contains(&self, data: &[u8], value: u32) -> bool {
        let key = (value >> 16) as u16;
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(i) => self.containers[i].contains(data, value as u16),
            Err(_) => false,
        }
    }

    pub(crate) fn minimum(&self, data: &[u8]) -> Option<u32> {
        self.containers.iter().find_map(|c| c.minimum(data))
    }

    pub(crate) fn maximum(&self, data: &[u8]) -> Option<u32> {
        self.containers.iter().rev().find_map(|c| c.maximum(data))
    }

    pub(crate) fn values<'a>(&self, data: &'a [u8]) -> Box<dyn Iterator<Item = u32> + 'a> {
        let containers = self.containers.clone();
        Box::new(containers.into_iter().flat_map(move |c| c.values(data)))
    }
}
