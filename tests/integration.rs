//! Externally-observable behavior from spec.md §8 "Concrete scenarios".

use std::sync::Arc;

use automap::{AutoMap, AutoMapError, FixedUnicode, FrozenAutoMap};

#[test]
fn scenario_construct_from_unique_keys_assigns_sequential_indices() {
    let map: FrozenAutoMap<i64> = vec![100, 200, 300].try_into().unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&100i64), Some(0));
    assert_eq!(map.get(&200i64), Some(1));
    assert_eq!(map.get(&300i64), Some(2));
}

#[test]
fn scenario_construct_from_duplicate_keys_fails_whole_construction() {
    let result: Result<FrozenAutoMap<i64>, _> = vec![1, 2, 3, 2].try_into();
    match result {
        Err(AutoMapError::DuplicateKey(key)) => assert_eq!(key, 2),
        other => panic!("expected DuplicateKey(2), got {other:?}"),
    }
}

#[test]
fn scenario_lookup_miss_returns_none_not_panic() {
    let map: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    assert_eq!(map.get(&99i64), None);
    assert_eq!(map.get_or(&99i64, 42), 42);
}

#[test]
fn scenario_heterogeneous_numeric_query_coerces_across_dtypes() {
    let ints: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    assert_eq!(ints.get(&2.0f64), Some(1));
    assert_eq!(ints.get(&2.25f64), None);

    let floats: FrozenAutoMap<i64> = vec![7].try_into().unwrap();
    assert_eq!(floats.get(&7i64), Some(0));
}

#[test]
fn scenario_grow_only_map_accumulates_new_keys_across_many_inserts() {
    let mut map: AutoMap<i64> = AutoMap::new().unwrap();
    for i in 0..500 {
        let idx = map.add(i).unwrap();
        assert_eq!(idx, i as usize);
    }
    assert_eq!(map.len(), 500);
    assert_eq!(map.get(&499i64), Some(499));
}

#[test]
fn scenario_grow_only_map_rejects_duplicate_without_losing_prior_state() {
    let mut map: AutoMap<i64> = AutoMap::new().unwrap();
    map.extend(vec![1, 2, 3]).unwrap();
    let err = map.extend(vec![4, 2]).unwrap_err();
    assert!(matches!(err, AutoMapError::DuplicateKey(2)));
    // The whole `extend` call rolls back: the `4` ahead of the duplicate
    // does not survive either.
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&4i64), None);
    assert_eq!(map.get(&3i64), Some(2));
}

#[test]
fn scenario_union_of_two_frozen_maps_merges_without_duplicate_error() {
    let a: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    let b: FrozenAutoMap<i64> = vec![3, 4, 5].try_into().unwrap();
    let merged = a.union(&b).unwrap();
    assert_eq!(merged.len(), 5);
    for (key, expected_index) in [(1, 0), (2, 1), (3, 2), (4, 3), (5, 4)] {
        assert_eq!(merged.get(&(key as i64)), Some(expected_index));
    }
}

#[test]
fn scenario_typed_array_backed_map_rejects_further_growth() {
    let array: Arc<[i64]> = Arc::from(vec![10, 20, 30]);
    let map = FrozenAutoMap::from_borrowed(array).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&20i64), Some(1));
}

#[test]
fn scenario_fixed_width_unicode_keys_compare_by_significant_prefix() {
    let keys: Vec<FixedUnicode<8>> = vec!["alpha", "beta", "gamma"]
        .into_iter()
        .map(|s| FixedUnicode::<8>::new(s).unwrap())
        .collect();
    let map: FrozenAutoMap<FixedUnicode<8>> = keys.try_into().unwrap();
    assert_eq!(map.get("beta"), Some(1));
    assert_eq!(map.get("nope"), None);
}

#[test]
fn scenario_frozen_map_equality_and_hash_depend_on_key_order() {
    let a: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    let b: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    let c: FrozenAutoMap<i64> = vec![3, 2, 1].try_into().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut ha = DefaultHasher::new();
    a.hash(&mut ha);
    let mut hb = DefaultHasher::new();
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[test]
fn scenario_views_preserve_insertion_order_and_support_set_algebra() {
    let a: FrozenAutoMap<i64> = vec![1, 2, 3].try_into().unwrap();
    let b: FrozenAutoMap<i64> = vec![1, 2, 3, 4].try_into().unwrap();

    let keys_in_order: Vec<_> = a.keys().iter().copied().collect();
    assert_eq!(keys_in_order, vec![1, 2, 3]);

    let union = a.values() | b.values();
    assert_eq!(union.len(), 4);

    // `a`'s keys share both key and assigned index with the first three of
    // `b`'s, so their item sets are not disjoint.
    assert!(!a.items().is_disjoint(&b.items()));

    let unrelated: FrozenAutoMap<i64> = vec![10, 20].try_into().unwrap();
    assert!(a.items().is_disjoint(&unrelated.items()));
}
