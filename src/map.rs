//! `FrozenAutoMap<K>` and `AutoMap<K>`, the two mapping variants
//! (`[MODULE: map]` in SPEC_FULL.md, spec.md §3/§4.4-§4.9).
//!
//! Both wrap a [`MapInner`] holding the probing [`Table`] and a
//! [`KeyStore`]. `FrozenAutoMap` shares its inner state behind an `Arc` so
//! that cloning and the copy-construction path of §4.5 are cheap; `AutoMap`
//! owns its state outright so grow-only mutation (§4.6) can proceed without
//! an uncontended-clone check.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, trace};

use crate::coerce::CoerceKey;
use crate::error::AutoMapError;
use crate::hash::EMPTY_HASH;
use crate::key::{AutoMapKey, KeyStore};
use crate::table::{size_for, Probe, Table, LOAD};
use crate::view::{Items, Keys, Values};

pub(crate) struct MapInner<K> {
    table: Table,
    keys: KeyStore<K>,
}

impl<K: AutoMapKey> MapInner<K> {
    fn empty() -> Result<Self, AutoMapError<K>> {
        let table = Table::try_new(size_for(0)).map_err(|_| AutoMapError::AllocationFailure)?;
        Ok(MapInner {
            table,
            keys: KeyStore::Owned(Vec::new()),
        })
    }

    fn with_capacity(hint: usize) -> Result<Self, AutoMapError<K>> {
        let table =
            Table::try_new(size_for(hint)).map_err(|_| AutoMapError::AllocationFailure)?;
        Ok(MapInner {
            table,
            keys: KeyStore::Owned(Vec::with_capacity(hint)),
        })
    }

    fn from_borrowed(array: Arc<[K]>) -> Result<Self, AutoMapError<K>>
    where
        K: Clone,
    {
        let table = Table::try_new(size_for(array.len()))
            .map_err(|_| AutoMapError::AllocationFailure)?;
        let mut inner = MapInner {
            table,
            keys: KeyStore::Borrowed(Arc::clone(&array)),
        };
        // Populate the table separately from the (already-built) key store:
        // every element must still pass through the uniqueness check a
        // normal insert performs.
        for (index, key) in array.iter().enumerate() {
            let hash = key.insertion_hash();
            let existing = {
                let keys = inner.keys.as_slice();
                inner.table.probe(hash, |idx| &keys[idx] == key)
            };
            match existing {
                Probe::Hit(_) => return Err(AutoMapError::DuplicateKey(key.clone())),
                Probe::Miss(slot_idx) => inner.table.place(slot_idx, hash, index),
            }
        }
        Ok(inner)
    }

    /// Grows the table ahead of an insert if `additional` more keys would
    /// exceed the load factor (spec.md §4.2).
    fn grow_if_needed(&mut self, additional: usize) -> Result<(), AutoMapError<K>> {
        let needed = self.keys.len() + additional;
        if (needed as f64) <= self.table.table_size() as f64 * LOAD {
            return Ok(());
        }
        trace!(
            "growing automap table: {} keys, current table_size {}",
            self.keys.len(),
            self.table.table_size()
        );
        let new_size = size_for(needed);
        let mut new_table =
            Table::try_new(new_size).map_err(|_| AutoMapError::AllocationFailure)?;
        for (hash, index) in self.table.iter_occupied() {
            new_table.insert_unique(hash, index);
        }
        self.table = new_table;
        debug!("grew automap table to table_size {new_size}");
        Ok(())
    }

    /// Inserts `key`, failing with [`AutoMapError::DuplicateKey`] if it is
    /// already present and [`AutoMapError::TypeNotSupported`] if the key
    /// store cannot grow.
    fn insert_new(&mut self, key: K) -> Result<usize, AutoMapError<K>> {
        if !self.keys.is_growable() {
            return Err(AutoMapError::TypeNotSupported);
        }
        self.grow_if_needed(1)?;
        let hash = key.insertion_hash();
        let probe = {
            let keys = self.keys.as_slice();
            self.table.probe(hash, |idx| keys[idx] == key)
        };
        match probe {
            Probe::Hit(_) => Err(AutoMapError::DuplicateKey(key)),
            Probe::Miss(slot_idx) => {
                let key_index = self.keys.push(key);
                self.table.place(slot_idx, hash, key_index);
                Ok(key_index)
            }
        }
    }

    /// Appends `key` only if absent; returns its index either way. Used by
    /// the grow-only union operator, which never treats an already-present
    /// key as an error (spec.md Open Question, resolved in DESIGN.md).
    fn insert_or_get(&mut self, key: K) -> Result<usize, AutoMapError<K>>
    where
        K: Clone,
    {
        if let Some(index) = self.lookup(&key) {
            return Ok(index);
        }
        if !self.keys.is_growable() {
            return Err(AutoMapError::TypeNotSupported);
        }
        self.grow_if_needed(1)?;
        let hash = key.insertion_hash();
        let slot_idx = match {
            let keys = self.keys.as_slice();
            self.table.probe(hash, |idx| keys[idx] == key)
        } {
            Probe::Miss(idx) => idx,
            Probe::Hit(existing) => return Ok(existing),
        };
        let key_index = self.keys.push(key);
        self.table.place(slot_idx, hash, key_index);
        Ok(key_index)
    }

    pub(crate) fn lookup<Q>(&self, query: &Q) -> Option<usize>
    where
        Q: CoerceKey<K> + ?Sized,
    {
        let key = query.coerce()?;
        let hash = key.insertion_hash();
        let keys = self.keys.as_slice();
        match self.table.probe(hash, |idx| keys[idx] == key) {
            Probe::Hit(idx) => Some(idx),
            Probe::Miss(_) => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn as_slice(&self) -> &[K] {
        self.keys.as_slice()
    }
}

impl<K: AutoMapKey + Clone> Clone for MapInner<K> {
    fn clone(&self) -> Self {
        MapInner {
            table: self.table.clone(),
            keys: self.keys.clone(),
        }
    }
}

/// An immutable, insertion-ordered, unique-key mapping from keys of type
/// `K` to the dense auto-incremented index each key was inserted at.
///
/// Cloning a `FrozenAutoMap` is `O(1)`: the underlying table and key store
/// are shared behind an `Arc` (spec.md §4.5 "copy path").
pub struct FrozenAutoMap<K> {
    inner: Arc<MapInner<K>>,
}

impl<K: AutoMapKey> FrozenAutoMap<K> {
    /// An empty mapping.
    pub fn new() -> Result<Self, AutoMapError<K>> {
        Ok(FrozenAutoMap {
            inner: Arc::new(MapInner::empty()?),
        })
    }

    /// Builds a mapping from an immutable, shared typed buffer (the
    /// typed-array key store specialization, spec.md §3/§6). The buffer is
    /// never copied; growth is permanently unavailable afterward.
    pub fn from_borrowed(array: Arc<[K]>) -> Result<Self, AutoMapError<K>>
    where
        K: Clone,
    {
        Ok(FrozenAutoMap {
            inner: Arc::new(MapInner::from_borrowed(array)?),
        })
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Looks up `query`, coercing it against this mapping's stored key type
    /// (spec.md §4.3). Returns the key's auto-incremented insertion index.
    pub fn get<Q>(&self, query: &Q) -> Option<usize>
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query)
    }

    /// Like [`FrozenAutoMap::get`], substituting `default` on a miss.
    pub fn get_or<Q>(&self, query: &Q, default: usize) -> usize
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query).unwrap_or(default)
    }

    /// The panicking counterpart to [`FrozenAutoMap::get`]. `automap`'s
    /// values are always the key's own position, not separately stored
    /// data, so there is nothing for `std::ops::Index` to hand back a
    /// reference to; this free-standing method is the idiomatic substitute
    /// (see DESIGN.md).
    pub fn index_of<Q>(&self, query: &Q) -> usize
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner
            .lookup(query)
            .expect("key not found in FrozenAutoMap")
    }

    pub fn contains<Q>(&self, query: &Q) -> bool
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query).is_some()
    }

    #[must_use]
    pub fn keys(&self) -> Keys<'_, K> {
        Keys {
            inner: self.inner.as_ref(),
        }
    }

    #[must_use]
    pub fn values(&self) -> Values {
        Values { len: self.len() }
    }

    #[must_use]
    pub fn items(&self) -> Items<'_, K> {
        Items {
            keys: self.inner.keys.as_slice(),
        }
    }

    /// Unions `self` with `other`, appending `other`'s keys that are not
    /// already present and reassigning them fresh indices. Never fails on
    /// an overlapping key (spec.md Open Question, see DESIGN.md); only
    /// allocation failure is possible.
    pub fn union(&self, other: &FrozenAutoMap<K>) -> Result<FrozenAutoMap<K>, AutoMapError<K>>
    where
        K: Clone,
    {
        let mut merged = MapInner::with_capacity(self.len() + other.len())?;
        for key in self.inner.keys.as_slice() {
            merged.insert_or_get(key.clone())?;
        }
        for key in other.inner.keys.as_slice() {
            merged.insert_or_get(key.clone())?;
        }
        Ok(FrozenAutoMap {
            inner: Arc::new(merged),
        })
    }

    /// Builds a mapping from a 1-D sequence of keys given as rows of a
    /// slice-of-slices, rejecting any shape that isn't really 1-D. Mirrors
    /// the C extension's multi-dimension rejection on construction
    /// (spec.md §4.4): a single row is accepted regardless of its own
    /// length, but more than one row is only accepted if every row holds
    /// exactly one key.
    pub fn try_from_rows(rows: Vec<Vec<K>>) -> Result<Self, AutoMapError<K>>
    where
        K: Clone,
    {
        if rows.len() > 1 && rows.iter().any(|row| row.len() != 1) {
            return Err(AutoMapError::InvalidArgument(
                "expected a 1D sequence of keys, got a multi-dimensional shape".to_string(),
            ));
        }
        let flat: Vec<K> = rows.into_iter().flatten().collect();
        let mut inner = MapInner::with_capacity(flat.len())?;
        for key in flat {
            inner.insert_new(key)?;
        }
        Ok(FrozenAutoMap {
            inner: Arc::new(inner),
        })
    }
}

impl<K> Clone for FrozenAutoMap<K> {
    fn clone(&self) -> Self {
        FrozenAutoMap {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: AutoMapKey> From<&AutoMap<K>> for FrozenAutoMap<K>
where
    K: Clone,
{
    fn from(value: &AutoMap<K>) -> Self {
        FrozenAutoMap {
            inner: Arc::new(value.inner.clone()),
        }
    }
}

impl<K: AutoMapKey> PartialEq for FrozenAutoMap<K> {
    /// Two mappings compare equal when they hold the same keys in the same
    /// insertion order (spec.md §4.8): since values are synthesized
    /// positions, equal key sequences imply equal values.
    fn eq(&self, other: &Self) -> bool {
        self.inner.keys.as_slice() == other.inner.keys.as_slice()
    }
}

impl<K: AutoMapKey> Eq for FrozenAutoMap<K> {}

impl<K: AutoMapKey> Hash for FrozenAutoMap<K> {
    /// Folds every physical table slot's stored hash (including empty
    /// slots, with the `-1` sentinel remapped to `0`) as `h = h*3 +
    /// slot.hash`, so the result depends on `table_size`/layout, not just
    /// the occupied keys (spec.md §4.8 "Hash (frozen only)"). Only
    /// implemented for the frozen variant since `AutoMap` is mutable.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut h: i64 = 0;
        for slot_hash in self.inner.table.iter_all_slots() {
            let x = if slot_hash == EMPTY_HASH { 0 } else { slot_hash };
            h = h.wrapping_mul(3).wrapping_add(x);
        }
        state.write_i64(h);
    }
}

impl<K: AutoMapKey + fmt::Debug> fmt::Debug for FrozenAutoMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.keys.as_slice().iter().zip(0usize..))
            .finish()
    }
}

/// `iter(m)` iterates keys directly on the mapping; `.rev()` on the
/// resulting iterator gives `reversed(m)` (spec.md §4.10).
impl<'a, K: AutoMapKey> IntoIterator for &'a FrozenAutoMap<K> {
    type Item = &'a K;
    type IntoIter = crate::view::KeysIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys().iter()
    }
}

/// A mutable, insertion-ordered, unique-key mapping that supports
/// appending new keys (`add`/`extend`/`|=`) but never deletion (spec.md §1
/// Non-goals).
pub struct AutoMap<K> {
    inner: MapInner<K>,
}

impl<K: AutoMapKey> AutoMap<K> {
    pub fn new() -> Result<Self, AutoMapError<K>> {
        Ok(AutoMap {
            inner: MapInner::empty()?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn get<Q>(&self, query: &Q) -> Option<usize>
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query)
    }

    pub fn get_or<Q>(&self, query: &Q, default: usize) -> usize
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query).unwrap_or(default)
    }

    pub fn contains<Q>(&self, query: &Q) -> bool
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query).is_some()
    }

    #[must_use]
    pub fn keys(&self) -> Keys<'_, K> {
        Keys { inner: &self.inner }
    }

    #[must_use]
    pub fn values(&self) -> Values {
        Values { len: self.len() }
    }

    #[must_use]
    pub fn items(&self) -> Items<'_, K> {
        Items {
            keys: self.inner.keys.as_slice(),
        }
    }

    /// Appends `key`, failing on a duplicate or an allocation failure
    /// (spec.md §4.6). On `DuplicateKey`, the mapping is left exactly as it
    /// was before the call (spec.md §4.9 "Failed (transient)" rolls back to
    /// the prior Populated state).
    pub fn add(&mut self, key: K) -> Result<usize, AutoMapError<K>> {
        self.inner.insert_new(key)
    }

    /// Appends every key in `keys`. On the first duplicate, the whole call
    /// rolls back: the mapping is left exactly as it was before `extend`
    /// was called, including any keys from earlier in the same `keys`
    /// iterable (spec.md §4.9 "DuplicateKey" recovery: "the caller sees an
    /// unchanged mapping").
    pub fn extend<I>(&mut self, keys: I) -> Result<(), AutoMapError<K>>
    where
        I: IntoIterator<Item = K>,
        K: Clone,
    {
        let snapshot = self.inner.clone();
        for key in keys {
            if let Err(err) = self.inner.insert_new(key) {
                self.inner = snapshot;
                return Err(err);
            }
        }
        Ok(())
    }

    /// In-place union: appends `other`'s keys that are not already present.
    /// Never fails on an overlapping key (see [`FrozenAutoMap::union`]).
    pub fn union_in_place(&mut self, other: &FrozenAutoMap<K>) -> Result<(), AutoMapError<K>>
    where
        K: Clone,
    {
        self.inner.grow_if_needed(other.len())?;
        for key in other.inner.keys.as_slice() {
            self.inner.insert_or_get(key.clone())?;
        }
        Ok(())
    }

    /// Freezes this mapping, sharing its state behind an `Arc` (spec.md
    /// §4.9's "freeze" construction path).
    #[must_use]
    pub fn freeze(self) -> FrozenAutoMap<K> {
        FrozenAutoMap {
            inner: Arc::new(self.inner),
        }
    }
}

impl<K: AutoMapKey> PartialEq for AutoMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.keys.as_slice() == other.inner.keys.as_slice()
    }
}

impl<K: AutoMapKey> Eq for AutoMap<K> {}

impl<K: AutoMapKey + fmt::Debug> fmt::Debug for AutoMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.keys.as_slice().iter().zip(0usize..))
            .finish()
    }
}

impl<'a, K: AutoMapKey> IntoIterator for &'a AutoMap<K> {
    type Item = &'a K;
    type IntoIter = crate::view::KeysIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys().iter()
    }
}

impl<K: AutoMapKey + Clone> TryFrom<Vec<K>> for FrozenAutoMap<K> {
    type Error = AutoMapError<K>;

    /// Materializes and inserts `keys` in order; a duplicate aborts the
    /// whole construction (spec.md §4.4/§4.5).
    fn try_from(keys: Vec<K>) -> Result<Self, Self::Error> {
        let mut inner = MapInner::with_capacity(keys.len())?;
        for key in keys {
            inner.insert_new(key)?;
        }
        Ok(FrozenAutoMap {
            inner: Arc::new(inner),
        })
    }
}

impl<K: AutoMapKey + Clone> TryFrom<Vec<K>> for AutoMap<K> {
    type Error = AutoMapError<K>;

    fn try_from(keys: Vec<K>) -> Result<Self, Self::Error> {
        let mut inner = MapInner::with_capacity(keys.len())?;
        for key in keys {
            inner.insert_new(key)?;
        }
        Ok(AutoMap { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_has_no_entries() {
        let map: FrozenAutoMap<i64> = FrozenAutoMap::new().unwrap();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.get(&1i64), None);
    }

    #[test]
    fn construction_assigns_dense_indices_in_order() {
        let map: FrozenAutoMap<i64> = vec![10, 20, 30].try_into().unwrap();
        assert_eq!(map.get(&10i64), Some(0));
        assert_eq!(map.get(&20i64), Some(1));
        assert_eq!(map.get(&30i64), Some(2));
    }

    #[test]
    fn construction_rejects_duplicate_keys() {
        let result: Result<FrozenAutoMap<i64>, _> = vec![1, 2, 1].try_into();
        assert!(matches!(result, Err(AutoMapError::DuplicateKey(1))));
    }

    #[test]
    fn float_query_coerces_against_integer_keyed_map() {
        let map: FrozenAutoMap<i64> = vec![3, 4, 5].try_into().unwrap();
        assert_eq!(map.get(&3.0f64), Some(0));
        assert_eq!(map.get(&3.5f64), None);
    }

    #[test]
    fn add_rejects_duplicate_and_leaves_map_unchanged() {
        let mut map: AutoMap<i64> = AutoMap::new().unwrap();
        map.add(1).unwrap();
        map.add(2).unwrap();
        let err = map.add(1).unwrap_err();
        assert!(matches!(err, AutoMapError::DuplicateKey(1)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn union_merges_keys_without_erroring_on_overlap() {
        let a: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
        let b: FrozenAutoMap<i64> = vec![3, 4].try_into().unwrap();
        let merged = a.union(&b).unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.get(&1i64), Some(0));
        assert_eq!(merged.get(&4i64), Some(3));
    }

    #[test]
    fn frozen_map_clone_is_cheap_and_shares_state() {
        let a: FrozenAutoMap<i64> = vec![1, 2].try_into().unwrap();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.get(&1i64), Some(0));
    }

    #[test]
    fn borrowed_key_store_rejects_growth() {
        let array: Arc<[i64]> = Arc::from(vec![1, 2, 3]);
        let map = FrozenAutoMap::from_borrowed(array).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2i64), Some(1));
    }

    #[test]
    fn from_borrowed_rejects_duplicate_keys() {
        let array: Arc<[i64]> = Arc::from(vec![1, 2, 1]);
        let result = FrozenAutoMap::from_borrowed(array);
        assert!(matches!(result, Err(AutoMapError::DuplicateKey(1))));
    }

    #[test]
    fn extend_rolls_back_on_duplicate_leaving_map_unchanged() {
        let mut map: AutoMap<i64> = AutoMap::new().unwrap();
        map.extend(vec![1, 2, 3]).unwrap();
        let err = map.extend(vec![4, 2]).unwrap_err();
        assert!(matches!(err, AutoMapError::DuplicateKey(2)));
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&4i64), None);
        assert_eq!(map.get(&3i64), Some(2));
    }

    #[test]
    fn try_from_rows_accepts_single_row_of_any_length() {
        let map: FrozenAutoMap<i64> = FrozenAutoMap::try_from_rows(vec![vec![1, 2, 3]]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2i64), Some(1));
    }

    #[test]
    fn try_from_rows_accepts_multiple_single_key_rows() {
        let map: FrozenAutoMap<i64> =
            FrozenAutoMap::try_from_rows(vec![vec![1], vec![2], vec![3]]).unwrap();
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn try_from_rows_rejects_multi_dimensional_shape() {
        let result: Result<FrozenAutoMap<i64>, _> =
            FrozenAutoMap::try_from_rows(vec![vec![1, 2], vec![3, 4]]);
        assert!(matches!(result, Err(AutoMapError::InvalidArgument(_))));
    }

    #[test]
    fn iterating_directly_on_a_frozen_map_yields_keys_in_order_and_reverse() {
        let map: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
        let forward: Vec<_> = (&map).into_iter().copied().collect();
        assert_eq!(forward, vec![1, 2, 3]);
        let backward: Vec<_> = (&map).into_iter().rev().copied().collect();
        assert_eq!(backward, vec![3, 2, 1]);
    }
}
