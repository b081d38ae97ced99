//! Generational slot table.
//!
//! A [`SlotTable`] stores values behind [`SlotId`]s. Removing a value bumps
//! the slot's generation, so every outstanding copy of the old id becomes
//! detectably stale in O(1) without a lookup structure. Vacated slots are
//! reused for later inserts.

use std::fmt;

/// Handle to a value in a [`SlotTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct SlotId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl SlotId {
    /// Create an id from raw parts.
    ///
    /// Mostly useful for tests; an id that was never issued simply fails
    /// every lookup.
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId(idx={}, gen={})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-checked storage with slot reuse.
pub struct SlotTable<T> {
    /// All slots (occupied and vacant).
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots available for reuse.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    live: usize,
}

impl<T> SlotTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Store a value, reusing a vacant slot if one exists.
    pub fn insert(&mut self, value: T) -> SlotId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return SlotId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotId {
            index,
            generation: 0,
        }
    }

    /// Look up a live value.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Look up a live value mutably.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Remove a live value and invalidate every copy of `id`.
    ///
    /// Returns `None` if `id` is stale or was never issued.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.live -= 1;
        Some(value)
    }

    /// Whether `id` refers to a live value.
    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the table holds no live values.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total slots (live + vacant).
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over live values with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    SlotId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let mut table = SlotTable::new();
        let id = table.insert("a");
        assert_eq!(table.get(id), Some(&"a"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removed_id_is_stale() {
        let mut table = SlotTable::new();
        let id = table.insert(1u32);
        assert_eq!(table.remove(id), Some(1));
        assert!(table.get(id).is_none());
        assert!(table.remove(id).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut table = SlotTable::new();
        let old = table.insert(1u32);
        table.remove(old);
        let new = table.insert(2u32);
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(table.get(old).is_none());
        assert_eq!(table.get(new), Some(&2));
        assert_eq!(table.total_slots(), 1);
    }

    #[test]
    fn never_issued_id_fails_lookup() {
        let table: SlotTable<u8> = SlotTable::new();
        assert!(table.get(SlotId::from_parts(5, 0)).is_none());
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut table = SlotTable::new();
        let a = table.insert('a');
        let _b = table.insert('b');
        table.remove(a);
        let live: Vec<char> = table.iter().map(|(_, v)| *v).collect();
        assert_eq!(live, vec!['b']);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn live_count_tracks_inserts_minus_removes(
                ops in proptest::collection::vec(any::<bool>(), 1..64),
            ) {
                let mut table = SlotTable::new();
                let mut ids = Vec::new();
                for (i, insert) in ops.into_iter().enumerate() {
                    if insert || ids.is_empty() {
                        ids.push(table.insert(i));
                    } else {
                        let id = ids.swap_remove(0);
                        prop_assert!(table.remove(id).is_some());
                    }
                }
                prop_assert_eq!(table.len(), ids.len());
                for id in ids {
                    prop_assert!(table.contains(id));
                }
            }
        }
    }
}
