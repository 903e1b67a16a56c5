//! Property Tests
//!
//! Checks the guarded wrappers against plain in-memory models over
//! arbitrary operation sequences, plus static thread-safety guarantees.

use guarded_collections::prelude::*;
use guarded_collections::{GuardedCollection, Iter, MapKeys, RangedSet};
use proptest::prelude::*;
use static_assertions::assert_impl_all;
use std::collections::HashMap;

// ============================================================================
// Thread Safety (compile-time)
// ============================================================================

assert_impl_all!(MutexIdentity: Send, Sync);
assert_impl_all!(GuardedCollection<i32>: Send, Sync, Clone);
assert_impl_all!(GuardedSet<String>: Send, Sync, Clone);
assert_impl_all!(GuardedOrderedSet<i32>: Send, Sync, Clone);
assert_impl_all!(GuardedList<i32>: Send, Sync, Clone);
assert_impl_all!(GuardedMap<String, i32>: Send, Sync, Clone);
assert_impl_all!(GuardedOrderedMap<i32, String>: Send, Sync, Clone);
assert_impl_all!(GuardedBiMap<String, i32>: Send, Sync, Clone);
assert_impl_all!(GuardedMultiset<String>: Send, Sync, Clone);
assert_impl_all!(GuardedListMultimap<String, i32>: Send, Sync, Clone);
assert_impl_all!(MapKeys<String, i32>: Send, Sync, Clone);
assert_impl_all!(RangedSet<i32>: Send, Sync, Clone);
assert_impl_all!(Iter<i32>: Send);

// ============================================================================
// List vs Vec Model
// ============================================================================

#[derive(Debug, Clone)]
enum ListOp {
    Insert(i32),
    InsertAt(usize, i32),
    SetAt(usize, i32),
    RemoveAt(usize),
    Remove(i32),
    Clear,
}

fn list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => any::<i32>().prop_map(ListOp::Insert),
        2 => (0..16_usize, any::<i32>()).prop_map(|(i, v)| ListOp::InsertAt(i, v)),
        2 => (0..16_usize, any::<i32>()).prop_map(|(i, v)| ListOp::SetAt(i, v)),
        2 => (0..16_usize).prop_map(ListOp::RemoveAt),
        1 => (0..8_i32).prop_map(ListOp::Remove),
        1 => Just(ListOp::Clear),
    ]
}

proptest! {
    #[test]
    fn guarded_list_matches_vec_model(ops in proptest::collection::vec(list_op(), 0..48)) {
        let guarded = GuardedList::wrap(Vec::new());
        let mut model: Vec<i32> = Vec::new();

        for op in ops {
            match op {
                ListOp::Insert(v) => {
                    guarded.insert(v);
                    model.push(v);
                }
                ListOp::InsertAt(i, v) => {
                    let accepted = guarded.insert_at(i, v);
                    prop_assert_eq!(accepted, i <= model.len());
                    if accepted {
                        model.insert(i, v);
                    }
                }
                ListOp::SetAt(i, v) => {
                    let previous = guarded.set_at(i, v);
                    if i < model.len() {
                        prop_assert_eq!(previous, Some(model[i]));
                        model[i] = v;
                    } else {
                        prop_assert_eq!(previous, None);
                    }
                }
                ListOp::RemoveAt(i) => {
                    let removed = guarded.remove_at(i);
                    if i < model.len() {
                        prop_assert_eq!(removed, Some(model.remove(i)));
                    } else {
                        prop_assert_eq!(removed, None);
                    }
                }
                ListOp::Remove(v) => {
                    let removed = guarded.remove(&v);
                    let position = model.iter().position(|x| *x == v);
                    prop_assert_eq!(removed, position.is_some());
                    if let Some(position) = position {
                        model.remove(position);
                    }
                }
                ListOp::Clear => {
                    guarded.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(guarded.len(), model.len());
        }
        prop_assert_eq!(guarded.to_vec(), model);
    }
}

// ============================================================================
// Multiset vs Count Model
// ============================================================================

#[derive(Debug, Clone)]
enum CountOp {
    Add(u8, usize),
    Remove(u8, usize),
    Set(u8, usize),
}

fn count_op() -> impl Strategy<Value = CountOp> {
    prop_oneof![
        3 => (any::<u8>(), 0..8_usize).prop_map(|(e, n)| CountOp::Add(e, n)),
        2 => (any::<u8>(), 0..8_usize).prop_map(|(e, n)| CountOp::Remove(e, n)),
        1 => (any::<u8>(), 0..8_usize).prop_map(|(e, n)| CountOp::Set(e, n)),
    ]
}

proptest! {
    #[test]
    fn guarded_multiset_matches_count_model(ops in proptest::collection::vec(count_op(), 0..48)) {
        let guarded = GuardedMultiset::wrap(HashMultiset::new());
        let mut model: HashMap<u8, usize> = HashMap::new();

        for op in ops {
            match op {
                CountOp::Add(e, n) => {
                    guarded.add_count(e, n);
                    if n > 0 {
                        *model.entry(e).or_insert(0) += n;
                    }
                }
                CountOp::Remove(e, n) => {
                    guarded.remove_count(&e, n);
                    if let Some(count) = model.get_mut(&e) {
                        *count = count.saturating_sub(n);
                        if *count == 0 {
                            model.remove(&e);
                        }
                    }
                }
                CountOp::Set(e, n) => {
                    guarded.set_count(e, n);
                    if n == 0 {
                        model.remove(&e);
                    } else {
                        model.insert(e, n);
                    }
                }
            }
        }

        prop_assert_eq!(guarded.len(), model.values().sum::<usize>());
        prop_assert_eq!(guarded.distinct_len(), model.len());
        let mut observed = guarded.counted_entries();
        observed.sort_unstable();
        let mut expected: Vec<(u8, usize)> = model.into_iter().collect();
        expected.sort_unstable();
        prop_assert_eq!(observed, expected);
    }
}

// ============================================================================
// Ordered Set Ranges vs BTreeSet
// ============================================================================

proptest! {
    #[test]
    fn ranged_views_match_btree_ranges(
        values in proptest::collection::btree_set(0..1_000_i32, 0..64),
        lo in 0..1_000_i32,
        width in 0..1_000_i32,
    ) {
        let hi = lo.saturating_add(width);
        let guarded = GuardedOrderedSet::wrap(values.clone());

        let expected: Vec<i32> = values.range(lo..hi).copied().collect();
        prop_assert_eq!(guarded.range_vec(&Bounds::range(lo, hi)), expected.clone());

        let view = guarded.range(Bounds::range(lo, hi));
        prop_assert_eq!(view.to_vec(), expected.clone());
        prop_assert_eq!(view.len(), expected.len());
        prop_assert_eq!(view.first(), expected.first().copied());
        prop_assert_eq!(view.last(), expected.last().copied());
    }
}

// ============================================================================
// Guarded vs Plain Equality Semantics
// ============================================================================

proptest! {
    #[test]
    fn multiset_equality_ignores_entry_order(entries in proptest::collection::vec((0..8_u8, 1..4_usize), 0..16)) {
        let a = GuardedMultiset::wrap(HashMultiset::new());
        let b = GuardedMultiset::wrap(HashMultiset::new());
        for (e, n) in &entries {
            a.add_count(*e, *n);
        }
        for (e, n) in entries.iter().rev() {
            b.add_count(*e, *n);
        }
        prop_assert_eq!(a, b);
    }
}
