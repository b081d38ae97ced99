//! Zero-copy, read-only bitmaps over borrowed bytes.

use super::bytes::u32_at;
use super::native::{self, NativeLayout};
use super::portable::PortableLayout;
use super::Format;
use crate::error::BitmapError;

/// A bitmap that reads its members straight out of a serialized buffer.
///
/// Parsing checks the structure once (cookie, tag, header, every container
/// in bounds); queries then index the borrowed bytes without copying. The
/// borrow ties the view to the buffer, so the buffer cannot be freed or
/// mutated while the view exists.
///
/// Handles decoded with [`DecodeMode::Frozen`](super::DecodeMode::Frozen)
/// keep only the arena range and build a fresh `FrozenBitmap` per query, so
/// writes to the buffer between queries are observed.
#[derive(Clone, Debug)]
pub struct FrozenBitmap<'a> {
    repr: Repr<'a>,
}

#[derive(Clone, Debug)]
enum Repr<'a> {
    Empty,
    Array(&'a [u8]),
    Containers {
        data: &'a [u8],
        layout: PortableLayout,
    },
}

impl<'a> FrozenBitmap<'a> {
    /// Parse `bytes` in `format` without copying. Zero-length input is the
    /// empty bitmap in both formats.
    pub fn parse(bytes: &'a [u8], format: Format) -> Result<Self, BitmapError> {
        let containers = match format {
            Format::Portable if bytes.is_empty() => return Ok(Self { repr: Repr::Empty }),
            Format::Portable => bytes,
            Format::Native => match native::split(bytes)? {
                NativeLayout::Empty => return Ok(Self { repr: Repr::Empty }),
                NativeLayout::Array(values) => {
                    return Ok(Self {
                        repr: Repr::Array(values),
                    })
                }
                NativeLayout::Containers(data) => data,
            },
        };
        let layout = PortableLayout::parse(containers)?;
        Ok(Self {
            repr: Repr::Containers {
                data: containers,
                layout,
            },
        })
    }

    /// [`parse`](Self::parse) plus content checks: ascending native arrays,
    /// ascending array containers, well-formed runs and cardinalities that
    /// match their payloads.
    ///
    /// Binary search over a native array needs it strictly ascending, so
    /// this is the check a frozen handle gets. Copying decode only needs
    /// [`validate_containers`](Self::validate_containers).
    pub fn parse_checked(bytes: &'a [u8], format: Format) -> Result<Self, BitmapError> {
        let frozen = Self::parse(bytes, format)?;
        frozen.validate_containers()?;
        if let Repr::Array(values) = frozen.repr {
            let mut prev: Option<u32> = None;
            for (i, chunk) in values.chunks_exact(4).enumerate() {
                let v = u32_at(chunk, 0);
                if prev.is_some_and(|p| p >= v) {
                    return Err(BitmapError::corrupt(format!(
                        "native array not strictly ascending at index {i}"
                    )));
                }
                prev = Some(v);
            }
        }
        Ok(frozen)
    }

    /// Content checks on container streams. A native flat array passes as
    /// long as it is structurally whole; its values may come in any order
    /// and repeat.
    pub(crate) fn validate_containers(&self) -> Result<(), BitmapError> {
        match self.repr {
            Repr::Containers { data, ref layout } => layout.validate_contents(data),
            Repr::Empty | Repr::Array(_) => Ok(()),
        }
    }

    /// Number of members.
    pub fn cardinality(&self) -> u64 {
        match &self.repr {
            Repr::Empty => 0,
            Repr::Array(values) => (values.len() / 4) as u64,
            Repr::Containers { layout, .. } => layout.cardinality(),
        }
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    /// Membership test.
    pub fn contains(&self, value: u32) -> bool {
        match &self.repr {
            Repr::Empty => false,
            Repr::Array(values) => {
                let (mut lo, mut hi) = (0usize, values.len() / 4);
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    match u32_at(values, 4 * mid).cmp(&value) {
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid,
                        std::cmp::Ordering::Equal => return true,
                    }
                }
                false
            }
            Repr::Containers { data, layout } => layout.contains(data, value),
        }
    }

    /// Smallest member, if any.
    pub fn minimum(&self) -> Option<u32> {
        match &self.repr {
            Repr::Empty => None,
            Repr::Array(values) => (!values.is_empty()).then(|| u32_at(values, 0)),
            Repr::Containers { data, layout } => layout.minimum(data),
        }
    }

    /// Largest member, if any.
    pub fn maximum(&self) -> Option<u32> {
        match &self.repr {
            Repr::Empty => None,
            Repr::Array(values) => values
                .len()
                .checked_sub(4)
                .map(|last| u32_at(values, last)),
            Repr::Containers { data, layout } => layout.maximum(data),
        }
    }

    /// Member at ascending position `rank`.
    pub fn select(&self, rank: u64) -> Option<u32> {
        let rank = usize::try_from(rank).ok()?;
        self.iter().nth(rank)
    }

    /// Members in stored order, which is ascending for any input accepted
    /// by [`parse_checked`](Self::parse_checked).
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + 'a> {
        match self.repr {
            Repr::Empty => Box::new(std::iter::empty()),
            Repr::Array(values) => Box::new(values.chunks_exact(4).map(|c| u32_at(c, 0))),
            Repr::Containers { data, ref layout } => layout.values(data),
        }
    }

    /// Members as an ascending vector.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// The portable bytes of a container stream, ready for an engine.
    pub(crate) fn portable_payload(&self) -> Option<&'a [u8]> {
        match self.repr {
            Repr::Containers { data, ref layout } => Some(&data[..layout.end()]),
            _ => None,
        }
    }
}
