//! View Tests
//!
//! Exercises the derived views end to end: liveness against the parent,
//! cached view identity, capability-preserving dispatch, ranged and
//! positional sub-views, and the bimap inverse.

use guarded_collections::prelude::*;
use guarded_collections::{Capability, CollectionView, MapView};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// ============================================================================
// Liveness
// ============================================================================

mod liveness {
    use super::*;

    #[test]
    fn test_map_views_track_the_parent() {
        let map = GuardedMap::wrap(HashMap::new());
        let keys = map.key_set();
        let values = map.values();
        let entries = map.entries();
        assert!(keys.is_empty());

        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(keys.len(), 2);
        assert_eq!(values.len(), 2);
        assert!(entries.contains(&"a", &1));

        // Mutation through a view lands in the parent and its siblings.
        assert!(keys.remove(&"a"));
        assert!(!map.contains_key(&"a"));
        assert_eq!(values.to_vec(), vec![2]);
    }

    #[test]
    fn test_ranged_set_narrowing() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([1, 3, 5, 7, 9]));
        let mid = set.range(Bounds::range(3, 8));
        assert_eq!(mid.to_vec(), vec![3, 5, 7]);

        // Views of views intersect their bounds.
        let inner = mid.range(Bounds::tail(5));
        assert_eq!(inner.to_vec(), vec![5, 7]);

        set.insert(6);
        assert_eq!(inner.to_vec(), vec![5, 6, 7]);

        inner.clear();
        assert_eq!(set.to_vec(), vec![1, 3, 9]);
    }

    #[test]
    fn test_disjoint_narrowing_yields_empty_view() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([1, 3, 5, 7, 9]));
        let view = set.range(Bounds::range(3, 8)).range(Bounds::tail(9));
        assert_eq!(view.len(), 0);
        assert!(view.is_empty());
        assert_eq!(view.to_vec(), Vec::<i32>::new());
        assert!(!view.contains(&9));
        assert_eq!(view.first(), None);

        let map = GuardedOrderedMap::wrap(BTreeMap::from([(1, "a"), (5, "b")]));
        let sub = map.range(Bounds::head(3)).range(Bounds::tail(5));
        assert_eq!(sub.len(), 0);
        assert_eq!(sub.entries_vec(), Vec::<(i32, &str)>::new());
    }

    #[test]
    fn test_sub_list_window_tracks_parent_length() {
        let list = GuardedList::wrap(vec![10, 20, 30, 40]);
        let window = list.sub_list(1, 3);
        assert_eq!(window.to_vec(), vec![20, 30]);

        window.set_at(0, 21);
        assert_eq!(list.to_vec(), vec![10, 21, 30, 40]);

        // Shrinking the parent clamps the window.
        list.remove_at(3);
        list.remove_at(2);
        assert_eq!(window.to_vec(), vec![21]);
    }

    #[test]
    fn test_multiset_element_set_drops_all_occurrences() {
        let counts = GuardedMultiset::wrap(HashMultiset::new());
        counts.add_count("a", 3);
        counts.add_count("b", 1);
        let elements = counts.element_set();
        assert_eq!(elements.len(), 2);
        assert!(elements.remove(&"a"));
        assert_eq!(counts.count(&"a"), 0);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_multimap_as_map_round_trip() {
        let mm = GuardedListMultimap::wrap(VecMultimap::new());
        mm.insert_all("k", vec![1, 2, 3]);
        let as_map = mm.as_map();
        let values = as_map.get("k").expect("key is bound");
        assert_eq!(values.to_vec(), vec![1, 2, 3]);
        values.as_list().expect("list capability").remove_at(1);
        assert_eq!(mm.get_vec(&"k"), vec![1, 3]);
    }
}

// ============================================================================
// View Identity
// ============================================================================

mod identity {
    use super::*;
    use guarded_collections::{BiMapValues, MapKeys, MultimapKeySet};

    #[test]
    fn test_map_view_identity_is_cached() {
        let map = GuardedMap::<&str, i32>::wrap(HashMap::new());
        assert!(MapKeys::ptr_eq(&map.key_set(), &map.key_set()));
        // Clones of the handle resolve to the same cached slots.
        let other = map.clone();
        assert!(MapKeys::ptr_eq(&map.key_set(), &other.key_set()));
    }

    #[test]
    fn test_distinct_wrappers_get_distinct_views() {
        let a = GuardedMap::<&str, i32>::wrap(HashMap::new());
        let b = GuardedMap::<&str, i32>::wrap(HashMap::new());
        assert!(!MapKeys::ptr_eq(&a.key_set(), &b.key_set()));
    }

    #[test]
    fn test_multimap_key_set_identity() {
        let mm = GuardedSetMultimap::<&str, i32>::wrap(HashMultimap::new());
        assert!(MultimapKeySet::ptr_eq(&mm.key_set(), &mm.key_set()));
    }

    #[test]
    fn test_bimap_inverse_round_trip() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        bimap.insert("one", 1);
        let inverse = bimap.inverse();
        assert_eq!(inverse.get(&1), Some("one"));

        // The inverse of the inverse is the original wrapper.
        let round_trip = inverse.inverse();
        assert!(GuardedBiMap::ptr_eq(&bimap, &round_trip));

        // Mutation through the inverse lands in the forward map.
        inverse.insert(2, "two");
        assert_eq!(bimap.get(&"two"), Some(2));

        let values = bimap.values();
        assert!(BiMapValues::ptr_eq(&values, &bimap.values()));
        assert!(values.contains(&1));
    }
}

// ============================================================================
// Capability Dispatch
// ============================================================================

mod capability {
    use super::*;

    #[test]
    fn test_collection_dispatch_is_resolved_at_wrap_time() {
        let ordered = CollectionView::from_ordered_set(BTreeSet::from([2, 1]), None);
        assert_eq!(ordered.capability(), Capability::OrderedSet);
        assert_eq!(
            ordered.as_ordered_set().expect("ordered").first(),
            Some(1)
        );

        let plain = CollectionView::from_set(HashSet::from([1]), None);
        assert_eq!(plain.capability(), Capability::Set);
        assert!(plain.as_ordered_set().is_none());

        let list = CollectionView::from_list(vec![1, 2], None);
        assert_eq!(list.capability(), Capability::RandomAccessList);
        assert_eq!(list.as_list().expect("list").get_at(1), Some(2));
    }

    #[test]
    fn test_map_dispatch() {
        let ordered = MapView::from_ordered_map(BTreeMap::from([(1, "a")]), None);
        assert_eq!(ordered.capability(), Capability::OrderedMap);
        assert_eq!(ordered.as_ordered().expect("ordered").first_key(), Some(1));

        let plain = MapView::from_map(HashMap::from([(1, "a")]), None);
        assert_eq!(plain.capability(), Capability::Map);
        assert!(plain.as_ordered().is_none());
    }

    #[test]
    fn test_specificity_ordering() {
        assert_eq!(
            Capability::Set.most_specific(Capability::OrderedSet),
            Capability::OrderedSet
        );
        assert_eq!(
            Capability::List.most_specific(Capability::Collection),
            Capability::List
        );
        assert!(Capability::OrderedMap.is_map_family());
        assert!(Capability::RandomAccessList.is_collection_family());
    }
}

// ============================================================================
// Unsupported Mutations and Bounds
// ============================================================================

mod rejections {
    use super::*;

    #[test]
    #[should_panic(expected = "key-set views do not support insertion")]
    fn test_key_set_insert_panics() {
        let map = GuardedMap::<&str, i32>::wrap(HashMap::new());
        map.key_set().insert("a");
    }

    #[test]
    #[should_panic(expected = "values views do not support insertion")]
    fn test_values_insert_panics() {
        let map = GuardedMap::<&str, i32>::wrap(HashMap::new());
        map.values().insert(1);
    }

    #[test]
    #[should_panic(expected = "element out of range for ranged set view")]
    fn test_ranged_set_rejects_out_of_bounds_insert() {
        let set = GuardedOrderedSet::wrap(BTreeSet::new());
        set.range(Bounds::range(0, 10)).insert(10);
    }

    #[test]
    #[should_panic(expected = "key out of range for ranged map view")]
    fn test_ranged_map_rejects_out_of_bounds_insert() {
        let map = GuardedOrderedMap::wrap(BTreeMap::new());
        map.range(Bounds::head(5)).insert(7, "x");
    }

    #[test]
    fn test_try_wrap_empty_rejects_populated_backings() {
        let mut seeded = HashBiMap::new();
        MapLike::insert(&mut seeded, "a", 1);
        let err = GuardedBiMap::try_wrap_empty(seeded, None).unwrap_err();
        assert!(err.is_non_empty_delegate());
        assert_eq!(err, Error::NonEmptyDelegate { len: 1 });
    }
}
