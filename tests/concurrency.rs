//! Concurrency Tests
//!
//! Exercises mutual exclusion across cloned handles, lock sharing between
//! structures, lock release after panicking closures, and snapshot
//! iteration against concurrent mutation.

use guarded_collections::prelude::*;
use guarded_collections::MapKeys;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

// ============================================================================
// Mutual Exclusion
// ============================================================================

mod mutual_exclusion {
    use super::*;

    #[test]
    fn test_concurrent_multiset_counts() {
        let counts = GuardedMultiset::wrap(HashMultiset::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counts = counts.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1_000 {
                    counts.add_count("hits", 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counts.count(&"hits"), 8_000);
        assert_eq!(counts.len(), 8_000);
    }

    #[test]
    fn test_concurrent_list_growth() {
        let list = GuardedList::wrap(Vec::new());
        let mut handles = Vec::new();
        for worker in 0..4_i32 {
            let list = list.clone();
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    list.insert(worker * 1_000 + i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 2_000);
    }

    #[test]
    fn test_compound_read_modify_write_is_atomic() {
        let map = GuardedMap::wrap(HashMap::new());
        map.insert("n", 0_u64);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let map = map.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1_000 {
                    // Lost updates would show up as a short final count.
                    map.with_delegate(|d| {
                        let current = d.get(&"n").unwrap_or(0);
                        d.insert("n", current + 1);
                    });
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.get(&"n"), Some(8_000));
    }

    #[test]
    fn test_concurrent_cas_admits_one_winner() {
        let counts = GuardedMultiset::wrap(HashMultiset::new());
        counts.add_count("slot", 1);
        let mut handles = Vec::new();
        for worker in 0..8_usize {
            let counts = counts.clone();
            handles.push(thread::spawn(move || {
                counts.try_set_count("slot", 1, 10 + worker)
            }));
        }
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(counts.count(&"slot") >= 10);
    }
}

// ============================================================================
// Shared Lock Identity
// ============================================================================

mod shared_identity {
    use super::*;

    #[test]
    fn test_wrap_with_shares_one_lock() {
        let primary = GuardedSet::wrap(std::collections::HashSet::<i32>::new());
        let secondary = GuardedList::wrap_with(Vec::<i32>::new(), Some(primary.mutex_identity()));
        assert!(Arc::ptr_eq(
            &primary.mutex_identity(),
            &secondary.mutex_identity()
        ));
    }

    #[test]
    fn test_shared_lock_structures_stay_consistent() {
        let set = GuardedSet::wrap(std::collections::HashSet::new());
        let log = GuardedList::wrap_with(Vec::new(), Some(set.mutex_identity()));
        let mut handles = Vec::new();
        for worker in 0..4_i32 {
            let set = set.clone();
            let log = log.clone();
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    let value = worker * 1_000 + i;
                    set.insert(value);
                    log.insert(value);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(set.len(), 1_000);
        assert_eq!(log.len(), 1_000);
    }

    #[test]
    fn test_view_slot_races_resolve_to_one_identity() {
        let map = GuardedMap::<i32, i32>::wrap(HashMap::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let map = map.clone();
            handles.push(thread::spawn(move || map.key_set()));
        }
        let views: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        // Whichever thread materialized the slot, every caller got the same
        // logical view.
        for view in &views[1..] {
            assert!(MapKeys::ptr_eq(&views[0], view));
        }
        assert!(MapKeys::ptr_eq(&views[0], &map.key_set()));
    }

    #[test]
    fn test_views_do_not_mint_new_locks() {
        let map = GuardedOrderedMap::wrap(std::collections::BTreeMap::new());
        map.insert(1, "a");
        let keys = map.key_set();
        let before = map.mutex_identity();
        keys.remove(&1);
        // View mutation went through the same lock token.
        assert!(Arc::ptr_eq(&before, &map.mutex_identity()));
        assert!(map.is_empty());
    }
}

// ============================================================================
// Panic Safety
// ============================================================================

mod panic_safety {
    use super::*;

    #[test]
    fn test_lock_released_after_panicking_closure() {
        let list = GuardedList::wrap(vec![1, 2, 3]);
        let result = catch_unwind(AssertUnwindSafe(|| {
            list.with_delegate(|_| panic!("boom"));
        }));
        assert!(result.is_err());
        // The lock is free again; the backing is unchanged.
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        assert!(list.insert(4));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_view_survives_panicking_retain() {
        let map = GuardedMap::wrap(HashMap::new());
        map.insert("a", 1);
        let entries = map.entries();
        let result = catch_unwind(AssertUnwindSafe(|| {
            entries.retain(|_, _| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(entries.len(), 1);
        assert!(map.contains_key(&"a"));
    }
}

// ============================================================================
// Snapshot Iteration
// ============================================================================

mod snapshot_iteration {
    use super::*;

    #[test]
    fn test_iterator_is_detached_from_mutation() {
        let set = GuardedSet::wrap(std::collections::HashSet::new());
        set.insert(1);
        set.insert(2);
        let snapshot = set.iter();
        set.clear();
        // The snapshot was projected before the clear.
        assert_eq!(snapshot.count(), 2);
        assert!(set.is_empty());
    }

    #[test]
    fn test_iteration_never_blocks_writers() {
        let list = GuardedList::wrap((0..100).collect::<Vec<i32>>());
        let reader = {
            let list = list.clone();
            thread::spawn(move || {
                let mut total = 0_i64;
                for _ in 0..100 {
                    for value in list.iter() {
                        total += i64::from(value);
                    }
                }
                total
            })
        };
        let writer = {
            let list = list.clone();
            thread::spawn(move || {
                for i in 100..200 {
                    list.insert(i);
                }
            })
        };
        writer.join().unwrap();
        let total = reader.join().unwrap();
        // Each pass summed a consistent snapshot of at least the seed data.
        assert!(total >= (0..100).map(i64::from).sum::<i64>() * 100);
        assert_eq!(list.len(), 200);
    }

    #[test]
    fn test_guarded_traversal_holds_the_lock() {
        let list = GuardedList::wrap(vec![1, 2, 3]);
        let mut seen = Vec::new();
        list.for_each(|value| seen.push(*value));
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
