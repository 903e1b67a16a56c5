//! Capability interfaces for the structures the guarded layer wraps.
//!
//! These traits are the interface boundary between the wrapper layer and the
//! backing data structures: the layer forwards to them, it does not implement
//! their algorithms. Each family adds operations on top of the one below it
//! (set semantics, ordered navigation, positional access, and so on), and
//! reports its own [`Capability`] so derived views can be re-wrapped at the
//! most specific level the underlying value supports.
//!
//! All traits are object safe (owned returns, no generic methods) so wrappers
//! can hold them as trait objects, and `Send` so guarded cells are `Sync`.

use crate::capability::Capability;
use std::ops::Bound;

/// Half-open range token for ordered sub-views: `[lower, upper)`.
///
/// Follows the sub-range convention of ordered sets and maps: the lower bound
/// is inclusive, the upper bound exclusive, and either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds<T> {
    lower: Option<T>,
    upper: Option<T>,
}

impl<T: Ord> Bounds<T> {
    /// Elements in `[from, to)`.
    pub fn range(from: T, to: T) -> Self {
        Bounds {
            lower: Some(from),
            upper: Some(to),
        }
    }

    /// Elements strictly below `to`.
    pub fn head(to: T) -> Self {
        Bounds {
            lower: None,
            upper: Some(to),
        }
    }

    /// Elements at or above `from`.
    pub fn tail(from: T) -> Self {
        Bounds {
            lower: Some(from),
            upper: None,
        }
    }

    /// The unbounded range.
    pub fn all() -> Self {
        Bounds {
            lower: None,
            upper: None,
        }
    }

    /// Whether `item` falls inside the range.
    pub fn contains(&self, item: &T) -> bool {
        if let Some(lower) = &self.lower {
            if item < lower {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            if item >= upper {
                return false;
            }
        }
        true
    }

    /// The overlap of two ranges: the tighter lower bound paired with the
    /// tighter upper bound. Used when a ranged view is narrowed again.
    pub fn intersect(&self, other: &Bounds<T>) -> Bounds<T>
    where
        T: Clone,
    {
        let lower = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) => Some(if a >= b { a.clone() } else { b.clone() }),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => Some(if a <= b { a.clone() } else { b.clone() }),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        // Disjoint ranges would invert; clamp to the empty range at the
        // lower bound so range queries stay well-formed.
        let upper = match (&lower, upper) {
            (Some(lo), Some(hi)) if hi < *lo => Some(lo.clone()),
            (_, hi) => hi,
        };
        Bounds { lower, upper }
    }

    /// Borrowed `std::ops::Bound` pair, usable with `BTreeSet::range` and
    /// `BTreeMap::range`.
    pub fn as_range_bounds(&self) -> (Bound<&T>, Bound<&T>) {
        let lower = match &self.lower {
            Some(l) => Bound::Included(l),
            None => Bound::Unbounded,
        };
        let upper = match &self.upper {
            Some(u) => Bound::Excluded(u),
            None => Bound::Unbounded,
        };
        (lower, upper)
    }
}

// ============================================================================
// Collection family
// ============================================================================

/// A mutable collection: membership, size, add/remove, bulk operations, and
/// an owned array projection.
pub trait CollectionLike<E>: Send {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether the collection holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test.
    fn contains(&self, item: &E) -> bool;

    /// Add one element; returns whether the collection changed.
    fn insert(&mut self, item: E) -> bool;

    /// Remove one occurrence of `item`; returns whether the collection changed.
    fn remove(&mut self, item: &E) -> bool;

    /// Remove every element.
    fn clear(&mut self);

    /// Keep only elements for which `keep` returns true.
    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool);

    /// Owned projection of the current elements.
    fn to_vec(&self) -> Vec<E>;

    /// The most specific capability this value supports.
    fn capability(&self) -> Capability {
        Capability::Collection
    }

    /// Add every element; returns whether the collection changed.
    fn insert_all(&mut self, items: Vec<E>) -> bool {
        let mut changed = false;
        for item in items {
            changed |= self.insert(item);
        }
        changed
    }

    /// Remove every occurrence of every listed element; returns whether the
    /// collection changed.
    fn remove_all(&mut self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        let before = self.len();
        self.retain(&mut |e| !items.contains(e));
        self.len() != before
    }

    /// Keep only the listed elements; returns whether the collection changed.
    fn retain_all(&mut self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        let before = self.len();
        self.retain(&mut |e| items.contains(e));
        self.len() != before
    }
}

/// A collection with set semantics: no duplicate elements.
pub trait SetLike<E>: CollectionLike<E> {}

/// A set maintaining its elements in `Ord` order, with navigation.
pub trait OrderedSetLike<E>: SetLike<E> {
    /// Smallest element.
    fn first(&self) -> Option<E>;

    /// Largest element.
    fn last(&self) -> Option<E>;

    /// Owned projection of the elements inside `bounds`, in order.
    fn range_vec(&self, bounds: &Bounds<E>) -> Vec<E>;

    /// Number of elements inside `bounds`.
    fn range_len(&self, bounds: &Bounds<E>) -> usize;
}

/// A positionally indexed collection.
pub trait ListLike<E>: CollectionLike<E> {
    /// Element at `index`.
    fn get_at(&self, index: usize) -> Option<E>;

    /// Replace the element at `index`, returning the previous element.
    /// Out-of-range indexes leave the list unchanged and return `None`.
    fn set_at(&mut self, index: usize, item: E) -> Option<E>;

    /// Insert at `index`, shifting later elements; returns false when the
    /// index is past the end.
    fn insert_at(&mut self, index: usize, item: E) -> bool;

    /// Remove and return the element at `index`.
    fn remove_at(&mut self, index: usize) -> Option<E>;

    /// First position of `item`.
    fn index_of(&self, item: &E) -> Option<usize>;

    /// Last position of `item`.
    fn last_index_of(&self, item: &E) -> Option<usize>;
}

// ============================================================================
// Map family
// ============================================================================

/// A mutable key-value map.
pub trait MapLike<K, V>: Send {
    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the map holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value bound to `key`, if any.
    fn get(&self, key: &K) -> Option<V>;

    /// Whether `key` is bound.
    fn contains_key(&self, key: &K) -> bool;

    /// Whether any key is bound to `value`.
    fn contains_value(&self, value: &V) -> bool;

    /// Bind `key` to `value`, returning the previously bound value.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Unbind `key`, returning the value it was bound to.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Remove the exact `(key, value)` entry; returns whether it was present.
    fn remove_entry(&mut self, key: &K, value: &V) -> bool;

    /// Remove one entry bound to `value`; returns whether the map changed.
    fn remove_value_once(&mut self, value: &V) -> bool;

    /// Remove every entry.
    fn clear(&mut self);

    /// Owned projection of the keys.
    fn keys_vec(&self) -> Vec<K>;

    /// Owned projection of the values.
    fn values_vec(&self) -> Vec<V>;

    /// Owned projection of the entries.
    fn entries_vec(&self) -> Vec<(K, V)>;

    /// The most specific capability this value supports.
    fn capability(&self) -> Capability {
        Capability::Map
    }

    /// Bind every listed entry.
    fn extend_entries(&mut self, entries: Vec<(K, V)>) {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }
}

/// A map maintaining its keys in `Ord` order, with navigation.
pub trait OrderedMapLike<K, V>: MapLike<K, V> {
    /// Smallest key.
    fn first_key(&self) -> Option<K>;

    /// Largest key.
    fn last_key(&self) -> Option<K>;

    /// Owned projection of the entries whose keys fall inside `bounds`,
    /// in key order.
    fn range_entries(&self, bounds: &Bounds<K>) -> Vec<(K, V)>;

    /// Number of entries whose keys fall inside `bounds`.
    fn range_len(&self, bounds: &Bounds<K>) -> usize;
}

/// A bidirectional map: values are unique and reverse lookup is supported.
///
/// The plain [`MapLike::insert`] on a bidirectional backing displaces any
/// binding that would break the bijection; `try_insert` is the checked form.
pub trait BiMapLike<K, V>: MapLike<K, V> {
    /// Bind `key` to `value` unless `value` is already bound to a different
    /// key.
    fn try_insert(&mut self, key: K, value: V) -> crate::error::Result<Option<V>>;

    /// Bind `key` to `value`, removing any existing binding of either.
    fn force_insert(&mut self, key: K, value: V) -> Option<V>;

    /// Key bound to `value`, if any.
    fn get_by_value(&self, value: &V) -> Option<K>;

    /// Unbind whatever key is bound to `value`, returning that key.
    fn remove_by_value(&mut self, value: &V) -> Option<K>;
}

// ============================================================================
// Multi-valued structures
// ============================================================================

/// A set with per-element counts.
///
/// The collection-level operations treat each occurrence as one element:
/// `len` is the sum of counts, `insert` adds one occurrence, `remove` drops
/// one occurrence.
pub trait MultisetLike<E>: CollectionLike<E> {
    /// Number of occurrences of `item`.
    fn count(&self, item: &E) -> usize;

    /// Add `n` occurrences; returns the count before the addition.
    fn add_count(&mut self, item: E, n: usize) -> usize;

    /// Remove up to `n` occurrences; returns the count before the removal.
    fn remove_count(&mut self, item: &E, n: usize) -> usize;

    /// Set the count of `item` to `n`; returns the count before the change.
    fn set_count(&mut self, item: E, n: usize) -> usize;

    /// Set the count of `item` to `n` only if the current count is
    /// `expected`; returns whether the change was applied.
    fn try_set_count(&mut self, item: E, expected: usize, n: usize) -> bool;

    /// Owned projection of the distinct elements.
    fn distinct_vec(&self) -> Vec<E>;

    /// Number of distinct elements.
    fn distinct_len(&self) -> usize;

    /// Owned projection of `(element, count)` pairs.
    fn counted_entries(&self) -> Vec<(E, usize)>;
}

/// A map from keys to collections of values.
///
/// `len` counts key-value pairs, not keys.
pub trait MultimapLike<K, V>: Send {
    /// Total number of key-value pairs.
    fn len(&self) -> usize;

    /// Whether the multimap holds no pairs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has at least one value.
    fn contains_key(&self, key: &K) -> bool;

    /// Whether any key holds `value`.
    fn contains_value(&self, value: &V) -> bool;

    /// Whether the exact `(key, value)` pair is present.
    fn contains_entry(&self, key: &K, value: &V) -> bool;

    /// Add one pair; returns whether the multimap changed.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Add every value under `key`; returns whether the multimap changed.
    fn insert_all(&mut self, key: K, values: Vec<V>) -> bool;

    /// Remove one exact pair; returns whether the multimap changed.
    fn remove_entry(&mut self, key: &K, value: &V) -> bool;

    /// Remove every value under `key`, returning them.
    fn remove_key(&mut self, key: &K) -> Vec<V>;

    /// Replace the values under `key`, returning the previous values.
    fn replace_values(&mut self, key: K, values: Vec<V>) -> Vec<V>;

    /// Remove every pair.
    fn clear(&mut self);

    /// Owned projection of the values under `key`.
    fn get_vec(&self, key: &K) -> Vec<V>;

    /// Number of values under `key`.
    fn key_len(&self, key: &K) -> usize;

    /// Owned projection of the distinct keys.
    fn distinct_keys_vec(&self) -> Vec<K>;

    /// Number of distinct keys.
    fn distinct_key_len(&self) -> usize;

    /// Owned projection of every key-value pair.
    fn entries_vec(&self) -> Vec<(K, V)>;

    /// Add every listed pair.
    fn extend_pairs(&mut self, pairs: Vec<(K, V)>) {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }
}

/// A multimap whose per-key values form a list (duplicates, positional
/// access).
pub trait ListMultimapLike<K, V>: MultimapLike<K, V> {
    /// Value at `index` under `key`.
    fn get_at(&self, key: &K, index: usize) -> Option<V>;

    /// Replace the value at `index` under `key`, returning the previous
    /// value.
    fn set_at(&mut self, key: &K, index: usize, value: V) -> Option<V>;

    /// Insert at `index` under `key`; returns false when the index is past
    /// the end.
    fn insert_at(&mut self, key: &K, index: usize, value: V) -> bool;

    /// Remove and return the value at `index` under `key`.
    fn remove_at(&mut self, key: &K, index: usize) -> Option<V>;
}

/// A multimap whose per-key values form a set (no duplicate pairs).
pub trait SetMultimapLike<K, V>: MultimapLike<K, V> {}

/// A set-valued multimap whose per-key values are kept in `Ord` order.
pub trait OrderedSetMultimapLike<K, V>: SetMultimapLike<K, V> {
    /// Smallest value under `key`.
    fn first_of(&self, key: &K) -> Option<V>;

    /// Largest value under `key`.
    fn last_of(&self, key: &K) -> Option<V>;

    /// Owned projection of the values under `key` inside `bounds`, in order.
    fn range_of(&self, key: &K, bounds: &Bounds<V>) -> Vec<V>;

    /// Number of values under `key` inside `bounds`.
    fn range_len_of(&self, key: &K, bounds: &Bounds<V>) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::range(2, 5);
        assert!(!b.contains(&1));
        assert!(b.contains(&2));
        assert!(b.contains(&4));
        assert!(!b.contains(&5));

        assert!(Bounds::head(3).contains(&2));
        assert!(!Bounds::head(3).contains(&3));
        assert!(Bounds::tail(3).contains(&3));
        assert!(!Bounds::tail(3).contains(&2));
        assert!(Bounds::all().contains(&i32::MIN));
    }

    #[test]
    fn test_bounds_intersect() {
        let outer = Bounds::range(0, 10);
        assert_eq!(outer.intersect(&Bounds::range(3, 20)), Bounds::range(3, 10));
        assert_eq!(outer.intersect(&Bounds::tail(5)), Bounds::range(5, 10));
        assert_eq!(Bounds::all().intersect(&Bounds::head(4)), Bounds::head(4));
    }

    #[test]
    fn test_bounds_intersect_disjoint_is_empty() {
        // Disjoint ranges clamp to an empty range instead of inverting.
        let empty = Bounds::range(0, 5).intersect(&Bounds::tail(9));
        assert_eq!(empty, Bounds::range(9, 9));
        assert!(!empty.contains(&9));
        assert!(!empty.contains(&4));

        let empty = Bounds::head(3).intersect(&Bounds::range(7, 10));
        assert_eq!(empty, Bounds::range(7, 7));
    }

    #[test]
    fn test_bounds_as_range_bounds() {
        use std::collections::BTreeSet;
        let set: BTreeSet<i32> = (0..10).collect();
        let b = Bounds::range(3, 7);
        let picked: Vec<i32> = set.range(b.as_range_bounds()).copied().collect();
        assert_eq!(picked, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_collection_bulk_defaults() {
        // Vec's CollectionLike impl lives in backends; defaults are exercised
        // through it.
        use crate::interfaces::CollectionLike;
        let mut v: Vec<i32> = vec![1, 2, 3];
        assert!(CollectionLike::insert_all(&mut v, vec![4, 5]));
        assert!(CollectionLike::remove_all(&mut v, &[1, 5]));
        assert_eq!(CollectionLike::to_vec(&v), vec![2, 3, 4]);
        assert!(CollectionLike::retain_all(&mut v, &[3]));
        assert_eq!(CollectionLike::to_vec(&v), vec![3]);
    }
}
