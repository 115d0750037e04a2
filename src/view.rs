//! Keys/values/items views and their iterators (spec.md §4.7). Each view
//! pairs a thin handle with a `DoubleEndedIterator`/`ExactSizeIterator`/
//! `FusedIterator` implementation, and `Values`/`Items` add a set-algebra
//! surface (union, intersection, difference, symmetric difference,
//! disjointness, subset ordering) materialized over a `HashSet`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::ops::{BitAnd, BitOr, BitXor, Sub};

use crate::coerce::CoerceKey;
use crate::key::AutoMapKey;
use crate::map::MapInner;

/// A read-only view over a mapping's keys, in insertion order. Membership
/// delegates to the owning mapping's own lookup, so `contains` accepts the
/// same coercible queries `get` does.
#[derive(Clone, Copy)]
pub struct Keys<'a, K> {
    pub(crate) inner: &'a MapInner<K>,
}

impl<'a, K: AutoMapKey> Keys<'a, K> {
    #[must_use]
    pub fn iter(&self) -> KeysIter<'a, K> {
        KeysIter {
            inner: self.inner.as_slice().iter(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Whether `query` names a key in the owning mapping.
    pub fn contains<Q>(&self, query: &Q) -> bool
    where
        Q: CoerceKey<K> + ?Sized,
    {
        self.inner.lookup(query).is_some()
    }

    fn as_set(&self) -> HashSet<K>
    where
        K: Eq + Hash + Clone,
    {
        self.iter().cloned().collect()
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool
    where
        K: Eq + Hash + Clone,
    {
        self.as_set().is_disjoint(&other.as_set())
    }
}

impl<'a, K: AutoMapKey + fmt::Debug> fmt::Debug for Keys<'a, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> PartialEq for Keys<'a, K> {
    fn eq(&self, other: &Self) -> bool {
        self.as_set() == other.as_set()
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> Eq for Keys<'a, K> {}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> PartialOrd for Keys<'a, K> {
    /// Subset ordering, not a total order.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.as_set(), other.as_set());
        if a == b {
            Some(Ordering::Equal)
        } else if a.is_subset(&b) {
            Some(Ordering::Less)
        } else if b.is_subset(&a) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> BitOr for Keys<'a, K> {
    type Output = HashSet<K>;
    fn bitor(self, rhs: Self) -> HashSet<K> {
        self.as_set().union(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> BitAnd for Keys<'a, K> {
    type Output = HashSet<K>;
    fn bitand(self, rhs: Self) -> HashSet<K> {
        self.as_set().intersection(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> Sub for Keys<'a, K> {
    type Output = HashSet<K>;
    fn sub(self, rhs: Self) -> HashSet<K> {
        self.as_set().difference(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: AutoMapKey + Eq + Hash + Clone> BitXor for Keys<'a, K> {
    type Output = HashSet<K>;
    fn bitxor(self, rhs: Self) -> HashSet<K> {
        self.as_set()
            .symmetric_difference(&rhs.as_set())
            .cloned()
            .collect()
    }
}

impl<'a, K: AutoMapKey> IntoIterator for Keys<'a, K> {
    type Item = &'a K;
    type IntoIter = KeysIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`Keys`] view.
#[derive(Clone, Debug)]
pub struct KeysIter<'a, K> {
    inner: std::slice::Iter<'a, K>,
}

impl<'a, K> Iterator for KeysIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K> DoubleEndedIterator for KeysIter<'a, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, K> ExactSizeIterator for KeysIter<'a, K> {}
impl<'a, K> FusedIterator for KeysIter<'a, K> {}

/// A read-only view over a mapping's auto-assigned values, in insertion
/// order. Values are always the dense range `0..len`, so this view never
/// needs to borrow the mapping's internals beyond its length.
#[derive(Clone, Copy, Debug)]
pub struct Values {
    pub(crate) len: usize,
}

impl Values {
    #[must_use]
    pub fn iter(&self) -> ValuesIter {
        ValuesIter {
            inner: 0..self.len,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn as_set(&self) -> HashSet<usize> {
        self.iter().collect()
    }
}

impl IntoIterator for Values {
    type Item = usize;
    type IntoIter = ValuesIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`Values`] view.
#[derive(Clone, Debug)]
pub struct ValuesIter {
    inner: std::ops::Range<usize>,
}

impl Iterator for ValuesIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for ValuesIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for ValuesIter {}
impl FusedIterator for ValuesIter {}

macro_rules! impl_set_algebra {
    ($t:ty, $item:ty) => {
        impl PartialEq for $t {
            fn eq(&self, other: &Self) -> bool {
                self.as_set() == other.as_set()
            }
        }

        impl Eq for $t {}

        impl PartialOrd for $t {
            /// Subset ordering, not a total order: `is_subset` in both
            /// directions decides equality, one-directional subset decides
            /// `Less`/`Greater`, otherwise the sets are incomparable.
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                let (a, b) = (self.as_set(), other.as_set());
                if a == b {
                    Some(Ordering::Equal)
                } else if a.is_subset(&b) {
                    Some(Ordering::Less)
                } else if b.is_subset(&a) {
                    Some(Ordering::Greater)
                } else {
                    None
                }
            }
        }

        impl BitOr for $t {
            type Output = HashSet<$item>;
            fn bitor(self, rhs: Self) -> HashSet<$item> {
                self.as_set().union(&rhs.as_set()).cloned().collect()
            }
        }

        impl BitAnd for $t {
            type Output = HashSet<$item>;
            fn bitand(self, rhs: Self) -> HashSet<$item> {
                self.as_set().intersection(&rhs.as_set()).cloned().collect()
            }
        }

        impl Sub for $t {
            type Output = HashSet<$item>;
            fn sub(self, rhs: Self) -> HashSet<$item> {
                self.as_set().difference(&rhs.as_set()).cloned().collect()
            }
        }

        impl BitXor for $t {
            type Output = HashSet<$item>;
            fn bitxor(self, rhs: Self) -> HashSet<$item> {
                self.as_set()
                    .symmetric_difference(&rhs.as_set())
                    .cloned()
                    .collect()
            }
        }

        impl $t {
            #[must_use]
            pub fn is_disjoint(&self, other: &Self) -> bool {
                self.as_set().is_disjoint(&other.as_set())
            }
        }
    };
}

impl_set_algebra!(Values, usize);

/// A read-only view over a mapping's `(key, value)` pairs, in insertion
/// order.
#[derive(Clone, Copy, Debug)]
pub struct Items<'a, K> {
    pub(crate) keys: &'a [K],
}

impl<'a, K> Items<'a, K> {
    #[must_use]
    pub fn iter(&self) -> ItemsIter<'a, K> {
        ItemsIter {
            inner: self.keys.iter().enumerate(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a, K> IntoIterator for Items<'a, K> {
    type Item = (&'a K, usize);
    type IntoIter = ItemsIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`Items`] view.
#[derive(Clone, Debug)]
pub struct ItemsIter<'a, K> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, K>>,
}

impl<'a, K> Iterator for ItemsIter<'a, K> {
    type Item = (&'a K, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(idx, key)| (key, idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K> DoubleEndedIterator for ItemsIter<'a, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(idx, key)| (key, idx))
    }
}

impl<'a, K> ExactSizeIterator for ItemsIter<'a, K> {}
impl<'a, K> FusedIterator for ItemsIter<'a, K> {}

impl<'a, K: Eq + Hash + Clone> Items<'a, K> {
    fn as_set(&self) -> HashSet<(K, usize)> {
        self.iter().map(|(k, v)| (k.clone(), v)).collect()
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.as_set().is_disjoint(&other.as_set())
    }
}

impl<'a, K: Eq + Hash + Clone> PartialEq for Items<'a, K> {
    fn eq(&self, other: &Self) -> bool {
        self.as_set() == other.as_set()
    }
}

impl<'a, K: Eq + Hash + Clone> Eq for Items<'a, K> {}

impl<'a, K: Eq + Hash + Clone> PartialOrd for Items<'a, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (a, b) = (self.as_set(), other.as_set());
        if a == b {
            Some(Ordering::Equal)
        } else if a.is_subset(&b) {
            Some(Ordering::Less)
        } else if b.is_subset(&a) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl<'a, K: Eq + Hash + Clone> BitOr for Items<'a, K> {
    type Output = HashSet<(K, usize)>;
    fn bitor(self, rhs: Self) -> HashSet<(K, usize)> {
        self.as_set().union(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: Eq + Hash + Clone> BitAnd for Items<'a, K> {
    type Output = HashSet<(K, usize)>;
    fn bitand(self, rhs: Self) -> HashSet<(K, usize)> {
        self.as_set().intersection(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: Eq + Hash + Clone> Sub for Items<'a, K> {
    type Output = HashSet<(K, usize)>;
    fn sub(self, rhs: Self) -> HashSet<(K, usize)> {
        self.as_set().difference(&rhs.as_set()).cloned().collect()
    }
}

impl<'a, K: Eq + Hash + Clone> BitXor for Items<'a, K> {
    type Output = HashSet<(K, usize)>;
    fn bitxor(self, rhs: Self) -> HashSet<(K, usize)> {
        self.as_set()
            .symmetric_difference(&rhs.as_set())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_iter_preserves_insertion_order() {
        use crate::map::FrozenAutoMap;
        let map: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
        let collected: Vec<_> = map.keys().iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[test]
    fn keys_contains_delegates_to_mapping_membership() {
        use crate::map::FrozenAutoMap;
        let map: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
        assert!(map.keys().contains(&2i64));
        assert!(!map.keys().contains(&99i64));
    }

    #[test]
    fn keys_set_algebra_union_and_disjointness() {
        use crate::map::FrozenAutoMap;
        let a: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
        let b: FrozenAutoMap<i64> = vec![3, 4].try_into().unwrap();
        let union: HashSet<i64> = a.keys() | b.keys();
        assert_eq!(union, [1, 2, 3, 4].into_iter().collect());
        assert!(!a.keys().is_disjoint(&b.keys()));
        let c: FrozenAutoMap<i64> = vec![10, 20].try_into().unwrap();
        assert!(a.keys().is_disjoint(&c.keys()));
    }

    #[test]
    fn values_view_is_dense_range() {
        let view = Values { len: 4 };
        let collected: Vec<_> = view.iter().collect();
        assert_eq!(collected, vec![0, 1, 2, 3]);
    }

    #[test]
    fn values_set_algebra_union_and_intersection() {
        let a = Values { len: 3 }; // {0, 1, 2}
        let b = Values { len: 5 }; // {0, 1, 2, 3, 4}
        assert_eq!(a.clone().is_disjoint(&Values { len: 0 }), true);
        let union: HashSet<usize> = a.clone() | b.clone();
        assert_eq!(union, (0..5).collect());
        let intersection: HashSet<usize> = a | b;
        assert_eq!(intersection, (0..3).collect());
    }

    #[test]
    fn items_iter_pairs_keys_with_indices() {
        let keys = vec!["x".to_string(), "y".to_string()];
        let view = Items { keys: &keys };
        let collected: Vec<_> = view.iter().collect();
        assert_eq!(collected, vec![(&keys[0], 0), (&keys[1], 1)]);
    }
}
