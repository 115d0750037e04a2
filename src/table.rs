//! The open-addressed, block-sequential-probing hash table at the core of
//! [`crate::map`]. This module never looks at key values directly: it stores
//! `(hash, key_index)` pairs and asks its caller to resolve an index into a
//! real key equality check, which keeps it free of the typed key
//! specializations in [`crate::key`] (spec.md §2 "hash table" / "typed key
//! specializations" split).

use crate::hash::EMPTY_HASH;

/// Maximum ratio of populated slots to `table_size` (spec.md GLOSSARY).
pub(crate) const LOAD: f64 = 0.9;

/// Length of the in-block sequential probe run (spec.md GLOSSARY).
pub(crate) const SCAN: usize = 16;

#[derive(Clone, Copy, Debug)]
struct Slot {
    hash: i64,
    index: usize,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            hash: EMPTY_HASH,
            index: 0,
        }
    }
}

/// Outcome of probing the table for a hash/key pair.
pub(crate) enum Probe {
    /// A populated slot whose key matched; carries the key store index.
    Hit(usize),
    /// No matching key; carries the slot index at which to insert.
    Miss(usize),
}

/// Raised when the table's backing allocation cannot be grown. Mirrors
/// spec.md's `AllocationFailure` error kind, kept allocator-agnostic here so
/// [`crate::map`] can attach the offending key type.
#[derive(Debug)]
pub(crate) struct AllocError;

/// Smallest power of two `size` such that `needed as f64 <= size as f64 *
/// LOAD`, exactly the sizing rule from `original_source/automap.c`'s `new`
/// and `extend`, carried forward with the wider `LOAD`/`SCAN` spec.md calls
/// for.
#[must_use]
pub(crate) fn size_for(needed: usize) -> usize {
    let mut size = 1usize;
    while (size as f64) * LOAD <= needed as f64 {
        size <<= 1;
    }
    size
}

/// The table proper: `table_size + SCAN - 1` slots, the extra tail making
/// every block probe branch-free at the end of the array (spec.md §3
/// "Table").
#[derive(Clone, Debug)]
pub(crate) struct Table {
    slots: Vec<Slot>,
    table_size: usize,
}

impl Table {
    pub(crate) fn try_new(table_size: usize) -> Result<Self, AllocError> {
        debug_assert!(table_size.is_power_of_two());
        let len = table_size + SCAN - 1;
        let mut slots = Vec::new();
        slots.try_reserve_exact(len).map_err(|_| AllocError)?;
        slots.resize(len, Slot::default());
        Ok(Table { slots, table_size })
    }

    pub(crate) fn table_size(&self) -> usize {
        self.table_size
    }

    /// Maximum number of keys this table can hold before a grow is required
    /// (spec.md invariant 4).
    pub(crate) fn load_capacity(&self) -> usize {
        (self.table_size as f64 * LOAD) as usize
    }

    /// Runs the block-sequential probe described in spec.md §4.1: `SCAN`
    /// contiguous slots per block, then a jump seeded from progressively
    /// higher-order bits of `hash`.
    pub(crate) fn probe<F>(&self, hash: i64, mut key_eq: F) -> Probe
    where
        F: FnMut(usize) -> bool,
    {
        let mask = (self.table_size - 1) as i64;
        let mut mixin = hash.unsigned_abs();
        let mut block_start = hash & mask;
        loop {
            for offset in 0..SCAN {
                let idx = block_start as usize + offset;
                let slot = self.slots[idx];
                if slot.hash == EMPTY_HASH {
                    return Probe::Miss(idx);
                }
                if slot.hash == hash && key_eq(slot.index) {
                    return Probe::Hit(slot.index);
                }
            }
            mixin >>= 1;
            let next = 5i64
                .wrapping_mul(block_start)
                .wrapping_add(mixin as i64)
                .wrapping_add(1);
            block_start = next & mask;
        }
    }

    /// Populates a slot found by a prior `Miss` probe.
    pub(crate) fn place(&mut self, slot_idx: usize, hash: i64, key_index: usize) {
        self.slots[slot_idx] = Slot {
            hash,
            index: key_index,
        };
    }

    /// Inserts a `(hash, key_index)` pair known not to collide logically
    /// with anything already in the table (used only when reinserting
    /// during growth, where uniqueness was already established). Still
    /// walks past hash collisions from *different* keys.
    pub(crate) fn insert_unique(&mut self, hash: i64, key_index: usize) {
        let slot_idx = match self.probe(hash, |_| false) {
            Probe::Miss(idx) => idx,
            Probe::Hit(_) => unreachable!("insert_unique must never observe a hit"),
        };
        self.place(slot_idx, hash, key_index);
    }

    pub(crate) fn iter_occupied(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.hash != EMPTY_HASH)
            .map(|slot| (slot.hash, slot.index))
    }

    /// The stored hash of every slot, including empty ones, in physical
    /// order. Used by `FrozenAutoMap`'s `Hash` impl, which folds the whole
    /// table's layout rather than just its occupied keys (spec.md §4.8).
    pub(crate) fn iter_all_slots(&self) -> impl Iterator<Item = i64> + '_ {
        self.slots.iter().map(|slot| slot.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_for_is_power_of_two_and_respects_load() {
        for needed in 0..200 {
            let size = size_for(needed);
            assert!(size.is_power_of_two());
            assert!(needed as f64 <= size as f64 * LOAD);
        }
    }

    #[test]
    fn miss_on_empty_table_returns_initial_bucket() {
        let table = Table::try_new(1).unwrap();
        match table.probe(0, |_| false) {
            Probe::Miss(idx) => assert_eq!(idx, 0),
            Probe::Hit(_) => panic!("expected miss"),
        }
    }

    #[test]
    fn insert_and_find_roundtrip() {
        let mut table = Table::try_new(size_for(4)).unwrap();
        let hashes = [10i64, 20, 30, 40];
        for (i, &h) in hashes.iter().enumerate() {
            match table.probe(h, |_| false) {
                Probe::Miss(idx) => table.place(idx, h, i),
                Probe::Hit(_) => panic!("unexpected hit during setup"),
            }
        }
        for (i, &h) in hashes.iter().enumerate() {
            match table.probe(h, |idx| idx == i) {
                Probe::Hit(idx) => assert_eq!(idx, i),
                Probe::Miss(_) => panic!("expected hit for {h}"),
            }
        }
    }

    #[test]
    fn collisions_resolve_by_scanning_block() {
        // Force two keys into the same initial bucket by using hashes that
        // agree in the low bits of a tiny table.
        let mut table = Table::try_new(2).unwrap();
        let mask = 1i64;
        let h1 = 0i64;
        let h2 = 0i64 | (1 << 4); // differs in upper bits, same `& mask`
        assert_eq!(h1 & mask, h2 & mask);
        match table.probe(h1, |_| false) {
            Probe::Miss(idx) => table.place(idx, h1, 0),
            Probe::Hit(_) => panic!(),
        }
        match table.probe(h2, |_| false) {
            Probe::Miss(idx) => table.place(idx, h2, 1),
            Probe::Hit(_) => panic!(),
        }
        match table.probe(h2, |idx| idx == 1) {
            Probe::Hit(idx) => assert_eq!(idx, 1),
            Probe::Miss(_) => panic!("expected hit for h2"),
        }
    }
}
