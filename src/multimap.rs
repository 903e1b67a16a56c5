//! Guarded wrappers for multimaps, with per-key live views.
//!
//! Four wrappers share one surface: the generic `GuardedMultimap` plus the
//! typed `GuardedListMultimap`, `GuardedSetMultimap`, and
//! `GuardedOrderedSetMultimap`. The typed wrappers serve per-key views at
//! the capability their backing promises (positional access for lists,
//! navigation for ordered sets), resolved once at the wrapper's type, never
//! per call.
//!
//! Whole-structure views (key set, key multiset, values, entries, as-map)
//! are lazy slots in the map-view style. All views are live and share the
//! parent's mutex identity.

use crate::collection::{unordered_eq, Iter};
use crate::error::{Error, Result};
use crate::guard::{materialize_slot, GuardCell, ViewIdentity};
use crate::identity::MutexIdentity;
use crate::interfaces::{
    Bounds, ListMultimapLike, MultimapLike, OrderedSetMultimapLike, SetMultimapLike,
};
use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

macro_rules! guarded_multimap {
    ($(#[$meta:meta])* $wrapper:ident, $inner:ident, $family:ident, $variant:ident, $label:literal) => {
        struct $inner<K, V> {
            cell: GuardCell<dyn $family<K, V>>,
            key_set: OnceCell<Arc<ViewIdentity>>,
            key_multiset: OnceCell<Arc<ViewIdentity>>,
            values: OnceCell<Arc<ViewIdentity>>,
            entries: OnceCell<Arc<ViewIdentity>>,
            as_map: OnceCell<Arc<ViewIdentity>>,
        }

        $(#[$meta])*
        pub struct $wrapper<K, V> {
            inner: Arc<$inner<K, V>>,
        }

        impl<K: 'static, V: 'static> $wrapper<K, V> {
            /// Wrap `delegate` with a fresh mutex identity.
            pub fn wrap(delegate: impl $family<K, V> + 'static) -> Self {
                Self::wrap_with(delegate, None)
            }

            /// Wrap `delegate`, sharing `mutex` when one is supplied.
            pub fn wrap_with(
                delegate: impl $family<K, V> + 'static,
                mutex: Option<Arc<MutexIdentity>>,
            ) -> Self {
                tracing::trace!(kind = $label, "wrapped multimap root");
                $wrapper {
                    inner: Arc::new($inner {
                        cell: GuardCell::new(Box::new(delegate), mutex),
                        key_set: OnceCell::new(),
                        key_multiset: OnceCell::new(),
                        values: OnceCell::new(),
                        entries: OnceCell::new(),
                        as_map: OnceCell::new(),
                    }),
                }
            }

            /// Wrap `delegate` after checking it is empty.
            ///
            /// Fails with [`Error::NonEmptyDelegate`] when the backing
            /// already holds pairs the wrapper did not see being added.
            pub fn try_wrap_empty(
                delegate: impl $family<K, V> + 'static,
                mutex: Option<Arc<MutexIdentity>>,
            ) -> Result<Self> {
                let len = delegate.len();
                if len != 0 {
                    return Err(Error::NonEmptyDelegate { len });
                }
                Ok(Self::wrap_with(delegate, mutex))
            }

            /// The lock token guarding this multimap.
            pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
                Arc::clone(self.inner.cell.mutex())
            }

            /// Whether two handles refer to the same guarded multimap.
            pub fn ptr_eq(a: &Self, b: &Self) -> bool {
                Arc::ptr_eq(&a.inner, &b.inner)
            }

            /// Total number of key-value pairs, under the lock.
            pub fn len(&self) -> usize {
                self.inner.cell.with(|d| d.len())
            }

            /// Whether the multimap holds no pairs, under the lock.
            pub fn is_empty(&self) -> bool {
                self.inner.cell.with(|d| d.is_empty())
            }

            /// Whether `key` has at least one value, under the lock.
            pub fn contains_key(&self, key: &K) -> bool {
                self.inner.cell.with(|d| d.contains_key(key))
            }

            /// Whether any key holds `value`, under the lock.
            pub fn contains_value(&self, value: &V) -> bool {
                self.inner.cell.with(|d| d.contains_value(value))
            }

            /// Whether the exact `(key, value)` pair is present, under the
            /// lock.
            pub fn contains_entry(&self, key: &K, value: &V) -> bool {
                self.inner.cell.with(|d| d.contains_entry(key, value))
            }

            /// Add one pair, under the lock.
            pub fn insert(&self, key: K, value: V) -> bool {
                self.inner.cell.with(|d| d.insert(key, value))
            }

            /// Add every value under `key` in one acquisition.
            pub fn insert_all(&self, key: K, values: Vec<V>) -> bool {
                self.inner.cell.with(|d| d.insert_all(key, values))
            }

            /// Add every listed pair in one acquisition.
            pub fn extend_pairs(&self, pairs: Vec<(K, V)>) {
                self.inner.cell.with(|d| d.extend_pairs(pairs))
            }

            /// Remove one exact pair, under the lock.
            pub fn remove_entry(&self, key: &K, value: &V) -> bool {
                self.inner.cell.with(|d| d.remove_entry(key, value))
            }

            /// Remove every value under `key`, returning them.
            pub fn remove_key(&self, key: &K) -> Vec<V> {
                self.inner.cell.with(|d| d.remove_key(key))
            }

            /// Replace the values under `key`, returning the previous
            /// values. Removal and insertion happen under one acquisition.
            pub fn replace_values(&self, key: K, values: Vec<V>) -> Vec<V> {
                self.inner.cell.with(|d| d.replace_values(key, values))
            }

            /// Remove every pair, under the lock.
            pub fn clear(&self) {
                self.inner.cell.with(|d| d.clear())
            }

            /// Owned projection of the values under `key`.
            pub fn get_vec(&self, key: &K) -> Vec<V> {
                self.inner.cell.with(|d| d.get_vec(key))
            }

            /// Number of values under `key`, under the lock.
            pub fn key_len(&self, key: &K) -> usize {
                self.inner.cell.with(|d| d.key_len(key))
            }

            /// Owned projection of the distinct keys.
            pub fn distinct_keys_vec(&self) -> Vec<K> {
                self.inner.cell.with(|d| d.distinct_keys_vec())
            }

            /// Number of distinct keys, under the lock.
            pub fn distinct_key_len(&self) -> usize {
                self.inner.cell.with(|d| d.distinct_key_len())
            }

            /// Owned projection of every key-value pair.
            pub fn entries_vec(&self) -> Vec<(K, V)> {
                self.inner.cell.with(|d| d.entries_vec())
            }

            /// Snapshot iterator over every key-value pair.
            pub fn iter(&self) -> Iter<(K, V)> {
                Iter::new(self.entries_vec())
            }

            /// Run a compound operation against the delegate under one
            /// acquisition.
            pub fn with_delegate<R>(
                &self,
                f: impl FnOnce(&mut (dyn $family<K, V> + 'static)) -> R,
            ) -> R {
                self.inner.cell.with(f)
            }

            /// The lazy distinct-key set view.
            pub fn key_set(&self) -> MultimapKeySet<K, V> {
                let identity =
                    materialize_slot(&self.inner.cell, &self.inner.key_set, "key_set");
                MultimapKeySet {
                    parent: MultimapHandle::$variant(self.clone()),
                    identity,
                }
            }

            /// The lazy key multiset view (keys with per-key multiplicity).
            pub fn keys(&self) -> MultimapKeyMultiset<K, V> {
                let identity =
                    materialize_slot(&self.inner.cell, &self.inner.key_multiset, "keys");
                MultimapKeyMultiset {
                    parent: MultimapHandle::$variant(self.clone()),
                    identity,
                }
            }

            /// The lazy values view (every value of every pair).
            pub fn values(&self) -> MultimapValues<K, V> {
                let identity =
                    materialize_slot(&self.inner.cell, &self.inner.values, "values");
                MultimapValues {
                    parent: MultimapHandle::$variant(self.clone()),
                    identity,
                }
            }

            /// The lazy entry view (every key-value pair).
            pub fn entries(&self) -> MultimapEntries<K, V> {
                let identity =
                    materialize_slot(&self.inner.cell, &self.inner.entries, "entries");
                MultimapEntries {
                    parent: MultimapHandle::$variant(self.clone()),
                    identity,
                }
            }

            /// The lazy as-map view (key to value-collection map surface).
            pub fn as_map(&self) -> GuardedAsMap<K, V> {
                let identity =
                    materialize_slot(&self.inner.cell, &self.inner.as_map, "as_map");
                GuardedAsMap {
                    parent: MultimapHandle::$variant(self.clone()),
                    identity,
                }
            }
        }

        impl<K, V> Clone for $wrapper<K, V> {
            fn clone(&self) -> Self {
                $wrapper {
                    inner: Arc::clone(&self.inner),
                }
            }
        }

        impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for $wrapper<K, V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($wrapper))
                    .field("entries", &self.entries_vec())
                    .finish()
            }
        }

        impl<K: PartialEq + 'static, V: PartialEq + 'static> PartialEq for $wrapper<K, V> {
            fn eq(&self, other: &Self) -> bool {
                if Self::ptr_eq(self, other) {
                    return true;
                }
                unordered_eq(&self.entries_vec(), &other.entries_vec())
            }
        }

        impl<K: Serialize + 'static, V: Serialize + 'static> Serialize for $wrapper<K, V> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                // Key to value-list map form, grouped under one acquisition.
                let grouped: Vec<(K, Vec<V>)> = self.inner.cell.with(|d| {
                    d.distinct_keys_vec()
                        .into_iter()
                        .map(|key| {
                            let values = d.get_vec(&key);
                            (key, values)
                        })
                        .collect()
                });
                serializer.collect_map(grouped)
            }
        }
    };
}

guarded_multimap!(
    /// A multimap guarded by a mutex identity, wrapped at the generic level.
    GuardedMultimap,
    MultimapInner,
    MultimapLike,
    Generic,
    "multimap"
);

guarded_multimap!(
    /// A list-valued multimap guarded by a mutex identity. Per-key views
    /// keep positional access.
    GuardedListMultimap,
    ListMultimapInner,
    ListMultimapLike,
    List,
    "list multimap"
);

guarded_multimap!(
    /// A set-valued multimap guarded by a mutex identity. Per-key views
    /// keep set semantics.
    GuardedSetMultimap,
    SetMultimapInner,
    SetMultimapLike,
    Set,
    "set multimap"
);

guarded_multimap!(
    /// An ordered-set-valued multimap guarded by a mutex identity. Per-key
    /// views keep navigation.
    GuardedOrderedSetMultimap,
    OrderedSetMultimapInner,
    OrderedSetMultimapLike,
    OrderedSet,
    "ordered set multimap"
);

impl<K: Clone + 'static, V: 'static> GuardedMultimap<K, V> {
    /// Live per-key value collection, sharing this multimap's lock.
    pub fn get(&self, key: K) -> KeyCollectionView<K, V> {
        KeyCollectionView {
            parent: self.clone(),
            key,
        }
    }
}

impl<K: Clone + 'static, V: 'static> GuardedListMultimap<K, V> {
    /// Live per-key value list, sharing this multimap's lock.
    pub fn get(&self, key: K) -> KeyListView<K, V> {
        KeyListView {
            parent: self.clone(),
            key,
        }
    }
}

impl<K: Clone + 'static, V: 'static> GuardedSetMultimap<K, V> {
    /// Live per-key value set, sharing this multimap's lock.
    pub fn get(&self, key: K) -> KeySetView<K, V> {
        KeySetView {
            parent: self.clone(),
            key,
        }
    }
}

impl<K: Clone + 'static, V: 'static> GuardedOrderedSetMultimap<K, V> {
    /// Live per-key ordered value set, sharing this multimap's lock.
    pub fn get(&self, key: K) -> KeyOrderedSetView<K, V> {
        KeyOrderedSetView {
            parent: self.clone(),
            key,
        }
    }

    /// Smallest value under `key`, under the lock.
    pub fn first_of(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.first_of(key))
    }

    /// Largest value under `key`, under the lock.
    pub fn last_of(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.last_of(key))
    }

    /// Owned in-order projection of the values under `key` inside `bounds`.
    pub fn range_of(&self, key: &K, bounds: &Bounds<V>) -> Vec<V> {
        self.inner.cell.with(|d| d.range_of(key, bounds))
    }

    /// Number of values under `key` inside `bounds`, under the lock.
    pub fn range_len_of(&self, key: &K, bounds: &Bounds<V>) -> usize {
        self.inner.cell.with(|d| d.range_len_of(key, bounds))
    }
}

/// Shared parent handle for the whole-structure multimap views. The typed
/// delegates upcast to the common multimap trait.
enum MultimapHandle<K, V> {
    Generic(GuardedMultimap<K, V>),
    List(GuardedListMultimap<K, V>),
    Set(GuardedSetMultimap<K, V>),
    OrderedSet(GuardedOrderedSetMultimap<K, V>),
}

impl<K: 'static, V: 'static> MultimapHandle<K, V> {
    fn with_mm<R>(&self, f: impl FnOnce(&mut (dyn MultimapLike<K, V> + 'static)) -> R) -> R {
        match self {
            MultimapHandle::Generic(m) => m.inner.cell.with(f),
            MultimapHandle::List(m) => m.inner.cell.with(|d| f(d)),
            MultimapHandle::Set(m) => m.inner.cell.with(|d| f(d)),
            MultimapHandle::OrderedSet(m) => m.inner.cell.with(|d| f(d)),
        }
    }
}

impl<K, V> Clone for MultimapHandle<K, V> {
    fn clone(&self) -> Self {
        match self {
            MultimapHandle::Generic(m) => MultimapHandle::Generic(m.clone()),
            MultimapHandle::List(m) => MultimapHandle::List(m.clone()),
            MultimapHandle::Set(m) => MultimapHandle::Set(m.clone()),
            MultimapHandle::OrderedSet(m) => MultimapHandle::OrderedSet(m.clone()),
        }
    }
}

/// Live distinct-key set view of a guarded multimap.
pub struct MultimapKeySet<K, V> {
    parent: MultimapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MultimapKeySet<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of distinct keys, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_mm(|d| d.distinct_key_len())
    }

    /// Whether the view holds no keys, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, key: &K) -> bool {
        self.parent.with_mm(|d| d.contains_key(key))
    }

    /// Unsupported: a key cannot be added through the key-set view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _key: K) -> bool {
        panic!("key-set views do not support insertion");
    }

    /// Remove every value under `key` from the parent multimap.
    pub fn remove(&self, key: &K) -> bool {
        self.parent.with_mm(|d| !d.remove_key(key).is_empty())
    }

    /// Remove every pair from the parent multimap.
    pub fn clear(&self) {
        self.parent.with_mm(|d| d.clear())
    }

    /// Owned projection of the distinct keys.
    pub fn to_vec(&self) -> Vec<K> {
        self.parent.with_mm(|d| d.distinct_keys_vec())
    }

    /// Snapshot iterator over the distinct keys.
    pub fn iter(&self) -> Iter<K> {
        Iter::new(self.to_vec())
    }
}

/// Live key multiset view of a guarded multimap: each key occurs once per
/// value it holds.
pub struct MultimapKeyMultiset<K, V> {
    parent: MultimapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MultimapKeyMultiset<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Total number of key occurrences (one per pair), under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_mm(|d| d.len())
    }

    /// Whether the view holds no occurrences, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of occurrences of `key` (its value count), under the lock.
    pub fn count(&self, key: &K) -> usize {
        self.parent.with_mm(|d| d.key_len(key))
    }

    /// Membership test, under the lock.
    pub fn contains(&self, key: &K) -> bool {
        self.parent.with_mm(|d| d.contains_key(key))
    }

    /// Unsupported: a key occurrence cannot be added through the view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _key: K) -> bool {
        panic!("key multiset views do not support insertion");
    }

    /// Remove one occurrence of `key` (one of its pairs), under one
    /// acquisition.
    pub fn remove(&self, key: &K) -> bool {
        self.parent.with_mm(|d| {
            let values = d.get_vec(key);
            match values.first() {
                Some(value) => d.remove_entry(key, value),
                None => false,
            }
        })
    }

    /// Remove up to `n` occurrences of `key`; returns the count before the
    /// removal.
    pub fn remove_count(&self, key: &K, n: usize) -> usize {
        self.parent.with_mm(|d| {
            let values = d.get_vec(key);
            for value in values.iter().take(n) {
                d.remove_entry(key, value);
            }
            values.len()
        })
    }

    /// Owned projection of the distinct keys.
    pub fn distinct_vec(&self) -> Vec<K> {
        self.parent.with_mm(|d| d.distinct_keys_vec())
    }

    /// Owned projection of `(key, count)` pairs, under one acquisition.
    pub fn counted_entries(&self) -> Vec<(K, usize)> {
        self.parent.with_mm(|d| {
            d.distinct_keys_vec()
                .into_iter()
                .map(|key| {
                    let count = d.key_len(&key);
                    (key, count)
                })
                .collect()
        })
    }

    /// Owned projection of every key occurrence.
    pub fn to_vec(&self) -> Vec<K> {
        self.parent
            .with_mm(|d| d.entries_vec().into_iter().map(|(k, _)| k).collect())
    }

    /// Snapshot iterator over every key occurrence.
    pub fn iter(&self) -> Iter<K> {
        Iter::new(self.to_vec())
    }

    /// Remove every pair from the parent multimap.
    pub fn clear(&self) {
        self.parent.with_mm(|d| d.clear())
    }
}

/// Live values view of a guarded multimap: every value of every pair.
pub struct MultimapValues<K, V> {
    parent: MultimapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MultimapValues<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Total number of values, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_mm(|d| d.len())
    }

    /// Whether the view holds no values, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, value: &V) -> bool {
        self.parent.with_mm(|d| d.contains_value(value))
    }

    /// Unsupported: a value cannot be added through the values view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _value: V) -> bool {
        panic!("values views do not support insertion");
    }

    /// Remove one pair holding `value`, under one acquisition.
    pub fn remove(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.parent.with_mm(|d| {
            for (key, candidate) in d.entries_vec() {
                if candidate == *value {
                    return d.remove_entry(&key, &candidate);
                }
            }
            false
        })
    }

    /// Remove every pair from the parent multimap.
    pub fn clear(&self) {
        self.parent.with_mm(|d| d.clear())
    }

    /// Owned projection of every value.
    pub fn to_vec(&self) -> Vec<V> {
        self.parent
            .with_mm(|d| d.entries_vec().into_iter().map(|(_, v)| v).collect())
    }

    /// Snapshot iterator over every value.
    pub fn iter(&self) -> Iter<V> {
        Iter::new(self.to_vec())
    }
}

/// Live entry view of a guarded multimap: every key-value pair.
pub struct MultimapEntries<K, V> {
    parent: MultimapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MultimapEntries<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Total number of pairs, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_mm(|d| d.len())
    }

    /// Whether the view holds no pairs, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the exact `(key, value)` pair is present, under the lock.
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.parent.with_mm(|d| d.contains_entry(key, value))
    }

    /// Unsupported: a pair cannot be added through the entry view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _key: K, _value: V) -> bool {
        panic!("entry views do not support insertion");
    }

    /// Remove the exact `(key, value)` pair from the parent multimap.
    pub fn remove(&self, key: &K, value: &V) -> bool {
        self.parent.with_mm(|d| d.remove_entry(key, value))
    }

    /// Keep only pairs for which `keep` returns true, under one
    /// acquisition.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.parent.with_mm(|d| {
            for (key, value) in d.entries_vec() {
                if !keep(&key, &value) {
                    d.remove_entry(&key, &value);
                }
            }
        })
    }

    /// Remove every pair from the parent multimap.
    pub fn clear(&self) {
        self.parent.with_mm(|d| d.clear())
    }

    /// Owned projection of every pair.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.parent.with_mm(|d| d.entries_vec())
    }

    /// Snapshot iterator over every pair.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.to_vec())
    }
}

/// Live map-surface view of a guarded multimap: distinct keys bound to
/// their value collections.
///
/// New keys cannot be bound through this view; mutation happens through the
/// per-key collections or the parent multimap.
pub struct GuardedAsMap<K, V> {
    parent: MultimapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> GuardedAsMap<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of distinct keys, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_mm(|d| d.distinct_key_len())
    }

    /// Whether the view holds no keys, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is bound, under the lock.
    pub fn contains_key(&self, key: &K) -> bool {
        self.parent.with_mm(|d| d.contains_key(key))
    }

    /// The live per-key value collection for `key`, at the capability the
    /// parent multimap promises, or `None` when `key` is absent.
    pub fn get(&self, key: K) -> Option<KeyValues<K, V>>
    where
        K: Clone,
    {
        if !self.contains_key(&key) {
            return None;
        }
        Some(match &self.parent {
            MultimapHandle::Generic(m) => KeyValues::Collection(m.get(key)),
            MultimapHandle::List(m) => KeyValues::List(m.get(key)),
            MultimapHandle::Set(m) => KeyValues::Set(m.get(key)),
            MultimapHandle::OrderedSet(m) => KeyValues::OrderedSet(m.get(key)),
        })
    }

    /// Unbind `key`, returning its values, or `None` when `key` was absent.
    pub fn remove(&self, key: &K) -> Option<Vec<V>> {
        self.parent.with_mm(|d| {
            if d.contains_key(key) {
                Some(d.remove_key(key))
            } else {
                None
            }
        })
    }

    /// Owned projection of the distinct keys.
    pub fn keys_vec(&self) -> Vec<K> {
        self.parent.with_mm(|d| d.distinct_keys_vec())
    }

    /// Owned projection of `(key, values)` entries, grouped under one
    /// acquisition.
    pub fn entries_vec(&self) -> Vec<(K, Vec<V>)> {
        self.parent.with_mm(|d| {
            d.distinct_keys_vec()
                .into_iter()
                .map(|key| {
                    let values = d.get_vec(&key);
                    (key, values)
                })
                .collect()
        })
    }

    /// Snapshot iterator over the grouped entries.
    pub fn iter(&self) -> Iter<(K, Vec<V>)> {
        Iter::new(self.entries_vec())
    }

    /// Remove every pair from the parent multimap.
    pub fn clear(&self) {
        self.parent.with_mm(|d| d.clear())
    }
}

macro_rules! view_clone {
    ($view:ident) => {
        impl<K, V> Clone for $view<K, V> {
            fn clone(&self) -> Self {
                $view {
                    parent: self.parent.clone(),
                    identity: Arc::clone(&self.identity),
                }
            }
        }
    };
}

view_clone!(MultimapKeySet);
view_clone!(MultimapKeyMultiset);
view_clone!(MultimapValues);
view_clone!(MultimapEntries);
view_clone!(GuardedAsMap);

/// Live per-key value collection of a generic guarded multimap.
#[derive(Clone)]
pub struct KeyCollectionView<K, V> {
    parent: GuardedMultimap<K, V>,
    key: K,
}

/// Live per-key value list of a guarded list multimap.
#[derive(Clone)]
pub struct KeyListView<K, V> {
    parent: GuardedListMultimap<K, V>,
    key: K,
}

/// Live per-key value set of a guarded set multimap.
#[derive(Clone)]
pub struct KeySetView<K, V> {
    parent: GuardedSetMultimap<K, V>,
    key: K,
}

/// Live per-key ordered value set of a guarded ordered-set multimap.
#[derive(Clone)]
pub struct KeyOrderedSetView<K, V> {
    parent: GuardedOrderedSetMultimap<K, V>,
    key: K,
}

/// Per-key view at the capability the parent multimap promises.
pub enum KeyValues<K, V> {
    /// Values behind a generic multimap.
    Collection(KeyCollectionView<K, V>),
    /// Values behind a list multimap.
    List(KeyListView<K, V>),
    /// Values behind a set multimap.
    Set(KeySetView<K, V>),
    /// Values behind an ordered-set multimap.
    OrderedSet(KeyOrderedSetView<K, V>),
}

impl<K: Clone + 'static, V: 'static> KeyValues<K, V> {
    /// Number of values under the key, under the lock.
    pub fn len(&self) -> usize {
        match self {
            KeyValues::Collection(v) => v.len(),
            KeyValues::List(v) => v.len(),
            KeyValues::Set(v) => v.len(),
            KeyValues::OrderedSet(v) => v.len(),
        }
    }

    /// Whether the key currently holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned projection of the values.
    pub fn to_vec(&self) -> Vec<V> {
        match self {
            KeyValues::Collection(v) => v.to_vec(),
            KeyValues::List(v) => v.to_vec(),
            KeyValues::Set(v) => v.to_vec(),
            KeyValues::OrderedSet(v) => v.to_vec(),
        }
    }

    /// Borrow the list view, when the parent was a list multimap.
    pub fn as_list(&self) -> Option<&KeyListView<K, V>> {
        match self {
            KeyValues::List(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the ordered-set view, when the parent was an ordered-set
    /// multimap.
    pub fn as_ordered_set(&self) -> Option<&KeyOrderedSetView<K, V>> {
        match self {
            KeyValues::OrderedSet(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! key_view_common {
    ($view:ident) => {
        impl<K: Clone + 'static, V: 'static> $view<K, V> {
            /// The key this view projects.
            pub fn key(&self) -> &K {
                &self.key
            }

            /// Number of values under the key, under the lock.
            pub fn len(&self) -> usize {
                self.parent.key_len(&self.key)
            }

            /// Whether the key currently holds no values.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Whether the key holds `value`, under the lock.
            pub fn contains(&self, value: &V) -> bool {
                self.parent.contains_entry(&self.key, value)
            }

            /// Add `value` under the key, under the lock.
            pub fn insert(&self, value: V) -> bool {
                self.parent.insert(self.key.clone(), value)
            }

            /// Remove one `(key, value)` pair, under the lock.
            pub fn remove(&self, value: &V) -> bool {
                self.parent.remove_entry(&self.key, value)
            }

            /// Remove every value under the key.
            pub fn clear(&self) {
                self.parent.remove_key(&self.key);
            }

            /// Owned projection of the values under the key.
            pub fn to_vec(&self) -> Vec<V> {
                self.parent.get_vec(&self.key)
            }

            /// Snapshot iterator over the values under the key.
            pub fn iter(&self) -> Iter<V> {
                Iter::new(self.to_vec())
            }
        }
    };
}

key_view_common!(KeyCollectionView);
key_view_common!(KeyListView);
key_view_common!(KeySetView);
key_view_common!(KeyOrderedSetView);

impl<K: Clone + 'static, V: 'static> KeyListView<K, V> {
    /// Value at `index` under the key, under the lock.
    pub fn get_at(&self, index: usize) -> Option<V> {
        self.parent.inner.cell.with(|d| d.get_at(&self.key, index))
    }

    /// Replace the value at `index`, returning the previous value.
    pub fn set_at(&self, index: usize, value: V) -> Option<V> {
        self.parent
            .inner
            .cell
            .with(|d| d.set_at(&self.key, index, value))
    }

    /// Insert at `index`, shifting later values; false when the index is
    /// past the end (or the key is absent).
    pub fn insert_at(&self, index: usize, value: V) -> bool {
        self.parent
            .inner
            .cell
            .with(|d| d.insert_at(&self.key, index, value))
    }

    /// Remove and return the value at `index`, under the lock.
    pub fn remove_at(&self, index: usize) -> Option<V> {
        self.parent.inner.cell.with(|d| d.remove_at(&self.key, index))
    }
}

impl<K: Clone + 'static, V: 'static> KeyOrderedSetView<K, V> {
    /// Smallest value under the key, under the lock.
    pub fn first(&self) -> Option<V> {
        self.parent.first_of(&self.key)
    }

    /// Largest value under the key, under the lock.
    pub fn last(&self) -> Option<V> {
        self.parent.last_of(&self.key)
    }

    /// Owned in-order projection of the values inside `bounds`.
    pub fn range_vec(&self, bounds: &Bounds<V>) -> Vec<V> {
        self.parent.range_of(&self.key, bounds)
    }

    /// Number of values inside `bounds`, under the lock.
    pub fn range_len(&self, bounds: &Bounds<V>) -> usize {
        self.parent.range_len_of(&self.key, bounds)
    }
}
