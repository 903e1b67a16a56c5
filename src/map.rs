//! Guarded wrappers for maps and ordered maps, with lazy collection views.
//!
//! The key-set, values, and entry-set views are materialized lazily, one
//! slot per map, while the graph mutex is held; repeated accessor calls
//! return handles to the same logical view (observable via `ptr_eq`). The
//! views are live: every operation re-enters the parent delegate under the
//! shared lock, so they never serve a stale projection.
//!
//! Ordered maps add key navigation and [`RangedMap`], a live sub-map view.

use crate::collection::{unordered_eq, Iter};
use crate::guard::{materialize_slot, GuardCell, ViewIdentity};
use crate::identity::MutexIdentity;
use crate::interfaces::{Bounds, MapLike, OrderedMapLike};
use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

struct MapInner<K, V> {
    cell: GuardCell<dyn MapLike<K, V>>,
    keys: OnceCell<Arc<ViewIdentity>>,
    values: OnceCell<Arc<ViewIdentity>>,
    entries: OnceCell<Arc<ViewIdentity>>,
}

/// A map guarded by a mutex identity.
pub struct GuardedMap<K, V> {
    inner: Arc<MapInner<K, V>>,
}

impl<K: 'static, V: 'static> GuardedMap<K, V> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl MapLike<K, V> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl MapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!(capability = ?delegate.capability(), "wrapped map root");
        GuardedMap {
            inner: Arc::new(MapInner {
                cell: GuardCell::new(Box::new(delegate), mutex),
                keys: OnceCell::new(),
                values: OnceCell::new(),
                entries: OnceCell::new(),
            }),
        }
    }

    /// The lock token guarding this map.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.inner.cell.mutex())
    }

    /// Whether two handles refer to the same guarded map.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of entries, under the lock.
    pub fn len(&self) -> usize {
        self.inner.cell.with(|d| d.len())
    }

    /// Whether the map holds no entries, under the lock.
    pub fn is_empty(&self) -> bool {
        self.inner.cell.with(|d| d.is_empty())
    }

    /// Value bound to `key`, under the lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.get(key))
    }

    /// Whether `key` is bound, under the lock.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.cell.with(|d| d.contains_key(key))
    }

    /// Whether any key is bound to `value`, under the lock.
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner.cell.with(|d| d.contains_value(value))
    }

    /// Bind `key` to `value`, returning the previously bound value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.cell.with(|d| d.insert(key, value))
    }

    /// Bind every listed entry under one acquisition.
    pub fn extend_entries(&self, entries: Vec<(K, V)>) {
        self.inner.cell.with(|d| d.extend_entries(entries))
    }

    /// Unbind `key`, returning the value it was bound to.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.remove(key))
    }

    /// Remove the exact `(key, value)` entry, under the lock.
    pub fn remove_entry(&self, key: &K, value: &V) -> bool {
        self.inner.cell.with(|d| d.remove_entry(key, value))
    }

    /// Remove every entry, under the lock.
    pub fn clear(&self) {
        self.inner.cell.with(|d| d.clear())
    }

    /// Owned projection of the keys, under one acquisition.
    pub fn keys_vec(&self) -> Vec<K> {
        self.inner.cell.with(|d| d.keys_vec())
    }

    /// Owned projection of the values, under one acquisition.
    pub fn values_vec(&self) -> Vec<V> {
        self.inner.cell.with(|d| d.values_vec())
    }

    /// Owned projection of the entries, under one acquisition.
    pub fn entries_vec(&self) -> Vec<(K, V)> {
        self.inner.cell.with(|d| d.entries_vec())
    }

    /// Snapshot iterator over the entries.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.entries_vec())
    }

    /// Visit every entry under a single acquisition.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        self.inner.cell.with(|d| {
            for (key, value) in d.entries_vec() {
                f(&key, &value);
            }
        })
    }

    /// Run a compound operation against the delegate under one acquisition.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn MapLike<K, V> + 'static)) -> R) -> R {
        self.inner.cell.with(f)
    }

    /// The lazy key-set view; first call materializes it under the lock.
    pub fn key_set(&self) -> MapKeys<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.keys, "key_set");
        MapKeys {
            parent: MapHandle::Plain(self.clone()),
            identity,
        }
    }

    /// The lazy values view; first call materializes it under the lock.
    pub fn values(&self) -> MapValues<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.values, "values");
        MapValues {
            parent: MapHandle::Plain(self.clone()),
            identity,
        }
    }

    /// The lazy entry-set view; first call materializes it under the lock.
    pub fn entries(&self) -> MapEntries<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.entries, "entries");
        MapEntries {
            parent: MapHandle::Plain(self.clone()),
            identity,
        }
    }
}

impl<K, V> Clone for GuardedMap<K, V> {
    fn clone(&self) -> Self {
        GuardedMap {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for GuardedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedMap")
            .field("entries", &self.entries_vec())
            .finish()
    }
}

impl<K: PartialEq + 'static, V: PartialEq + 'static> PartialEq for GuardedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        unordered_eq(&self.entries_vec(), &other.entries_vec())
    }
}

impl<K: Serialize + 'static, V: Serialize + 'static> Serialize for GuardedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries_vec())
    }
}

struct OrderedMapInner<K, V> {
    cell: GuardCell<dyn OrderedMapLike<K, V>>,
    keys: OnceCell<Arc<ViewIdentity>>,
    values: OnceCell<Arc<ViewIdentity>>,
    entries: OnceCell<Arc<ViewIdentity>>,
}

/// An ordered map guarded by a mutex identity.
pub struct GuardedOrderedMap<K, V> {
    inner: Arc<OrderedMapInner<K, V>>,
}

impl<K: 'static, V: 'static> GuardedOrderedMap<K, V> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl OrderedMapLike<K, V> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl OrderedMapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!(capability = ?delegate.capability(), "wrapped ordered map root");
        GuardedOrderedMap {
            inner: Arc::new(OrderedMapInner {
                cell: GuardCell::new(Box::new(delegate), mutex),
                keys: OnceCell::new(),
                values: OnceCell::new(),
                entries: OnceCell::new(),
            }),
        }
    }

    /// The lock token guarding this map.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.inner.cell.mutex())
    }

    /// Whether two handles refer to the same guarded map.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of entries, under the lock.
    pub fn len(&self) -> usize {
        self.inner.cell.with(|d| d.len())
    }

    /// Whether the map holds no entries, under the lock.
    pub fn is_empty(&self) -> bool {
        self.inner.cell.with(|d| d.is_empty())
    }

    /// Value bound to `key`, under the lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.get(key))
    }

    /// Whether `key` is bound, under the lock.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.cell.with(|d| d.contains_key(key))
    }

    /// Whether any key is bound to `value`, under the lock.
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner.cell.with(|d| d.contains_value(value))
    }

    /// Bind `key` to `value`, returning the previously bound value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.cell.with(|d| d.insert(key, value))
    }

    /// Bind every listed entry under one acquisition.
    pub fn extend_entries(&self, entries: Vec<(K, V)>) {
        self.inner.cell.with(|d| d.extend_entries(entries))
    }

    /// Unbind `key`, returning the value it was bound to.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.remove(key))
    }

    /// Remove the exact `(key, value)` entry, under the lock.
    pub fn remove_entry(&self, key: &K, value: &V) -> bool {
        self.inner.cell.with(|d| d.remove_entry(key, value))
    }

    /// Remove every entry, under the lock.
    pub fn clear(&self) {
        self.inner.cell.with(|d| d.clear())
    }

    /// Smallest key, under the lock.
    pub fn first_key(&self) -> Option<K> {
        self.inner.cell.with(|d| d.first_key())
    }

    /// Largest key, under the lock.
    pub fn last_key(&self) -> Option<K> {
        self.inner.cell.with(|d| d.last_key())
    }

    /// Owned in-key-order projection of the entries inside `bounds`.
    pub fn range_entries(&self, bounds: &Bounds<K>) -> Vec<(K, V)> {
        self.inner.cell.with(|d| d.range_entries(bounds))
    }

    /// Owned projection of the keys, in order, under one acquisition.
    pub fn keys_vec(&self) -> Vec<K> {
        self.inner.cell.with(|d| d.keys_vec())
    }

    /// Owned projection of the values, under one acquisition.
    pub fn values_vec(&self) -> Vec<V> {
        self.inner.cell.with(|d| d.values_vec())
    }

    /// Owned projection of the entries, in key order, under one acquisition.
    pub fn entries_vec(&self) -> Vec<(K, V)> {
        self.inner.cell.with(|d| d.entries_vec())
    }

    /// Snapshot iterator over the entries, in key order.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.entries_vec())
    }

    /// Live sub-map view over the keys inside `bounds`.
    pub fn range(&self, bounds: Bounds<K>) -> RangedMap<K, V> {
        RangedMap {
            parent: self.clone(),
            bounds,
        }
    }

    /// Run a compound operation against the delegate under one acquisition.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn OrderedMapLike<K, V> + 'static)) -> R) -> R {
        self.inner.cell.with(f)
    }

    /// The lazy key-set view; first call materializes it under the lock.
    pub fn key_set(&self) -> MapKeys<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.keys, "key_set");
        MapKeys {
            parent: MapHandle::Ordered(self.clone()),
            identity,
        }
    }

    /// The lazy values view; first call materializes it under the lock.
    pub fn values(&self) -> MapValues<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.values, "values");
        MapValues {
            parent: MapHandle::Ordered(self.clone()),
            identity,
        }
    }

    /// The lazy entry-set view; first call materializes it under the lock.
    pub fn entries(&self) -> MapEntries<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.entries, "entries");
        MapEntries {
            parent: MapHandle::Ordered(self.clone()),
            identity,
        }
    }
}

impl<K, V> Clone for GuardedOrderedMap<K, V> {
    fn clone(&self) -> Self {
        GuardedOrderedMap {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for GuardedOrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedOrderedMap")
            .field("entries", &self.entries_vec())
            .finish()
    }
}

impl<K: PartialEq + 'static, V: PartialEq + 'static> PartialEq for GuardedOrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        self.entries_vec() == other.entries_vec()
    }
}

impl<K: Serialize + 'static, V: Serialize + 'static> Serialize for GuardedOrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries_vec())
    }
}

/// Shared parent handle for the map views: plain or ordered, one scoped
/// acquisition per call through the common map surface (ordered delegates
/// upcast to the plain trait).
enum MapHandle<K, V> {
    Plain(GuardedMap<K, V>),
    Ordered(GuardedOrderedMap<K, V>),
}

impl<K: 'static, V: 'static> MapHandle<K, V> {
    fn with_map<R>(&self, f: impl FnOnce(&mut (dyn MapLike<K, V> + 'static)) -> R) -> R {
        match self {
            MapHandle::Plain(map) => map.inner.cell.with(f),
            MapHandle::Ordered(map) => map.inner.cell.with(|d| f(d)),
        }
    }
}

impl<K, V> Clone for MapHandle<K, V> {
    fn clone(&self) -> Self {
        match self {
            MapHandle::Plain(map) => MapHandle::Plain(map.clone()),
            MapHandle::Ordered(map) => MapHandle::Ordered(map.clone()),
        }
    }
}

/// Live key-set view of a guarded map.
///
/// Supports removal but not insertion (a key cannot be added without a
/// value).
pub struct MapKeys<K, V> {
    parent: MapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MapKeys<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of keys, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_map(|d| d.len())
    }

    /// Whether the view holds no keys, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, key: &K) -> bool {
        self.parent.with_map(|d| d.contains_key(key))
    }

    /// Unsupported: a key cannot be inserted through the key-set view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _key: K) -> bool {
        panic!("key-set views do not support insertion");
    }

    /// Remove `key`'s entry from the parent map.
    pub fn remove(&self, key: &K) -> bool {
        self.parent.with_map(|d| d.remove(key).is_some())
    }

    /// Remove every listed key's entry under one acquisition.
    pub fn remove_all(&self, keys: &[K]) -> bool {
        self.parent.with_map(|d| {
            let mut changed = false;
            for key in keys {
                changed |= d.remove(key).is_some();
            }
            changed
        })
    }

    /// Keep only the listed keys, under one acquisition.
    pub fn retain_all(&self, keys: &[K]) -> bool
    where
        K: PartialEq,
    {
        self.parent.with_map(|d| {
            let mut changed = false;
            for key in d.keys_vec() {
                if !keys.contains(&key) {
                    d.remove(&key);
                    changed = true;
                }
            }
            changed
        })
    }

    /// Remove every entry from the parent map.
    pub fn clear(&self) {
        self.parent.with_map(|d| d.clear())
    }

    /// Owned projection of the keys, under one acquisition.
    pub fn to_vec(&self) -> Vec<K> {
        self.parent.with_map(|d| d.keys_vec())
    }

    /// Snapshot iterator over the keys.
    pub fn iter(&self) -> Iter<K> {
        Iter::new(self.to_vec())
    }
}

impl<K, V> Clone for MapKeys<K, V> {
    fn clone(&self) -> Self {
        MapKeys {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<K: fmt::Debug + 'static, V: 'static> fmt::Debug for MapKeys<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapKeys").field("keys", &self.to_vec()).finish()
    }
}

/// Live values view of a guarded map.
///
/// Supports removal but not insertion.
pub struct MapValues<K, V> {
    parent: MapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MapValues<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of values, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_map(|d| d.len())
    }

    /// Whether the view holds no values, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, value: &V) -> bool {
        self.parent.with_map(|d| d.contains_value(value))
    }

    /// Unsupported: a value cannot be inserted through the values view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _value: V) -> bool {
        panic!("values views do not support insertion");
    }

    /// Remove one entry bound to `value`.
    pub fn remove(&self, value: &V) -> bool {
        self.parent.with_map(|d| d.remove_value_once(value))
    }

    /// Remove every entry bound to any listed value, under one acquisition.
    pub fn remove_all(&self, values: &[V]) -> bool
    where
        K: PartialEq,
        V: PartialEq,
    {
        self.parent.with_map(|d| {
            let mut changed = false;
            for (key, value) in d.entries_vec() {
                if values.contains(&value) {
                    changed |= d.remove_entry(&key, &value);
                }
            }
            changed
        })
    }

    /// Keep only entries bound to a listed value, under one acquisition.
    pub fn retain_all(&self, values: &[V]) -> bool
    where
        K: PartialEq,
        V: PartialEq,
    {
        self.parent.with_map(|d| {
            let mut changed = false;
            for (key, value) in d.entries_vec() {
                if !values.contains(&value) {
                    changed |= d.remove_entry(&key, &value);
                }
            }
            changed
        })
    }

    /// Remove every entry from the parent map.
    pub fn clear(&self) {
        self.parent.with_map(|d| d.clear())
    }

    /// Owned projection of the values, under one acquisition.
    pub fn to_vec(&self) -> Vec<V> {
        self.parent.with_map(|d| d.values_vec())
    }

    /// Snapshot iterator over the values.
    pub fn iter(&self) -> Iter<V> {
        Iter::new(self.to_vec())
    }
}

impl<K, V> Clone for MapValues<K, V> {
    fn clone(&self) -> Self {
        MapValues {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<K: 'static, V: fmt::Debug + 'static> fmt::Debug for MapValues<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapValues")
            .field("values", &self.to_vec())
            .finish()
    }
}

/// Live entry-set view of a guarded map.
pub struct MapEntries<K, V> {
    parent: MapHandle<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> MapEntries<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of entries, under the lock.
    pub fn len(&self) -> usize {
        self.parent.with_map(|d| d.len())
    }

    /// Whether the view holds no entries, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the exact `(key, value)` entry is present, under the lock.
    pub fn contains(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.parent.with_map(|d| d.get(key).as_ref() == Some(value))
    }

    /// Unsupported: an entry cannot be inserted through the entry-set view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _key: K, _value: V) -> bool {
        panic!("entry-set views do not support insertion");
    }

    /// Remove the exact `(key, value)` entry from the parent map.
    pub fn remove(&self, key: &K, value: &V) -> bool {
        self.parent.with_map(|d| d.remove_entry(key, value))
    }

    /// Keep only entries for which `keep` returns true, under one
    /// acquisition.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.parent.with_map(|d| {
            for (key, value) in d.entries_vec() {
                if !keep(&key, &value) {
                    d.remove_entry(&key, &value);
                }
            }
        })
    }

    /// Remove every entry from the parent map.
    pub fn clear(&self) {
        self.parent.with_map(|d| d.clear())
    }

    /// Owned projection of the entries, under one acquisition.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.parent.with_map(|d| d.entries_vec())
    }

    /// Snapshot iterator over the entries.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.to_vec())
    }
}

impl<K, V> Clone for MapEntries<K, V> {
    fn clone(&self) -> Self {
        MapEntries {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for MapEntries<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEntries")
            .field("entries", &self.to_vec())
            .finish()
    }
}

/// A live sub-map view of a [`GuardedOrderedMap`], covering the keys inside
/// a half-open range.
#[derive(Clone)]
pub struct RangedMap<K, V> {
    parent: GuardedOrderedMap<K, V>,
    bounds: Bounds<K>,
}

impl<K: Ord + 'static, V: 'static> RangedMap<K, V> {
    /// The key range this view projects.
    pub fn bounds(&self) -> &Bounds<K> {
        &self.bounds
    }

    /// Number of in-range entries, under the lock.
    pub fn len(&self) -> usize {
        let bounds = &self.bounds;
        self.parent.inner.cell.with(|d| d.range_len(bounds))
    }

    /// Whether the range holds no entries, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value bound to `key`; out-of-range keys are never present.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.bounds.contains(key) {
            return None;
        }
        self.parent.get(key)
    }

    /// In-range key membership test.
    pub fn contains_key(&self, key: &K) -> bool {
        self.bounds.contains(key) && self.parent.contains_key(key)
    }

    /// Bind `key` to `value` in the parent through the view.
    ///
    /// # Panics
    ///
    /// Panics when `key` falls outside the view's range.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        assert!(
            self.bounds.contains(&key),
            "key out of range for ranged map view"
        );
        self.parent.insert(key, value)
    }

    /// Unbind `key` when it is inside the range; out-of-range keys are left
    /// alone.
    pub fn remove(&self, key: &K) -> Option<V> {
        if !self.bounds.contains(key) {
            return None;
        }
        self.parent.remove(key)
    }

    /// Smallest in-range key, under the lock.
    pub fn first_key(&self) -> Option<K> {
        let bounds = &self.bounds;
        self.parent
            .inner
            .cell
            .with(|d| d.range_entries(bounds).into_iter().next().map(|(k, _)| k))
    }

    /// Largest in-range key, under the lock.
    pub fn last_key(&self) -> Option<K> {
        let bounds = &self.bounds;
        self.parent.inner.cell.with(|d| {
            d.range_entries(bounds)
                .into_iter()
                .next_back()
                .map(|(k, _)| k)
        })
    }

    /// Remove every in-range entry under one acquisition.
    pub fn clear(&self) {
        let bounds = &self.bounds;
        self.parent.inner.cell.with(|d| {
            for (key, _) in d.range_entries(bounds) {
                d.remove(&key);
            }
        })
    }

    /// Owned projection of the in-range entries, in key order.
    pub fn entries_vec(&self) -> Vec<(K, V)> {
        self.parent.range_entries(&self.bounds)
    }

    /// Owned projection of the in-range keys, in order.
    pub fn keys_vec(&self) -> Vec<K> {
        self.entries_vec().into_iter().map(|(k, _)| k).collect()
    }

    /// Owned projection of the in-range values, in key order.
    pub fn values_vec(&self) -> Vec<V> {
        self.entries_vec().into_iter().map(|(_, v)| v).collect()
    }

    /// Snapshot iterator over the in-range entries.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.entries_vec())
    }

    /// Narrow the view further; the result covers the overlap of the two
    /// ranges.
    pub fn range(&self, bounds: Bounds<K>) -> RangedMap<K, V>
    where
        K: Clone,
    {
        RangedMap {
            parent: self.parent.clone(),
            bounds: self.bounds.intersect(&bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_map_basics() {
        let map = GuardedMap::wrap(HashMap::new());
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("a", 2), Some(1));
        assert_eq!(map.get(&"a"), Some(2));
        assert!(map.contains_key(&"a"));
        assert!(map.contains_value(&2));
        assert_eq!(map.remove(&"a"), Some(2));
        assert!(map.is_empty());
    }

    #[test]
    fn test_extend_entries() {
        let map = GuardedMap::wrap(HashMap::new());
        map.extend_entries(vec![("a", 1), ("b", 2)]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_key_set_view_is_live() {
        let map = GuardedMap::wrap(HashMap::new());
        let keys = map.key_set();
        assert!(keys.is_empty());
        map.insert("a", 1);
        assert!(keys.contains(&"a"));
        assert!(keys.remove(&"a"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_view_identity_is_stable() {
        let map: GuardedMap<&str, i32> = GuardedMap::wrap(HashMap::new());
        assert!(MapKeys::ptr_eq(&map.key_set(), &map.key_set()));
        assert!(MapValues::ptr_eq(&map.values(), &map.values()));
        assert!(MapEntries::ptr_eq(&map.entries(), &map.entries()));
        // Distinct slots have distinct identities.
        assert!(!Arc::ptr_eq(&map.key_set().identity, &map.values().identity));
    }

    #[test]
    #[should_panic(expected = "do not support insertion")]
    fn test_key_set_insert_panics() {
        let map: GuardedMap<&str, i32> = GuardedMap::wrap(HashMap::new());
        map.key_set().insert("a");
    }

    #[test]
    fn test_values_view_removal() {
        let map = GuardedMap::wrap(HashMap::new());
        map.extend_entries(vec![("a", 1), ("b", 2), ("c", 1)]);
        let values = map.values();
        assert!(values.contains(&1));
        assert!(values.remove(&2));
        assert!(!map.contains_key(&"b"));
        assert!(values.remove_all(&[1]));
        assert!(map.is_empty());
    }

    #[test]
    fn test_entries_view_retain() {
        let map = GuardedMap::wrap(HashMap::new());
        map.extend_entries(vec![("a", 1), ("b", 2), ("c", 3)]);
        map.entries().retain(|_, v| *v >= 2);
        assert!(!map.contains_key(&"a"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_entries_view_exact_removal() {
        let map = GuardedMap::wrap(HashMap::from([("a", 1)]));
        let entries = map.entries();
        assert!(entries.contains(&"a", &1));
        assert!(!entries.remove(&"a", &2));
        assert!(entries.remove(&"a", &1));
        assert!(map.is_empty());
    }

    #[test]
    fn test_ordered_map_navigation() {
        let map = GuardedOrderedMap::wrap(BTreeMap::from([(3, "c"), (1, "a"), (2, "b")]));
        assert_eq!(map.first_key(), Some(1));
        assert_eq!(map.last_key(), Some(3));
        assert_eq!(
            map.range_entries(&Bounds::range(2, 4)),
            vec![(2, "b"), (3, "c")]
        );
    }

    #[test]
    fn test_ordered_map_views_share_surface() {
        let map = GuardedOrderedMap::wrap(BTreeMap::from([(1, "a"), (2, "b")]));
        let keys = map.key_set();
        assert_eq!(keys.to_vec(), vec![1, 2]);
        assert!(MapKeys::ptr_eq(&keys, &map.key_set()));
        map.insert(3, "c");
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_ranged_map_is_live() {
        let map = GuardedOrderedMap::wrap(BTreeMap::from([(1, "a"), (5, "e")]));
        let mid = map.range(Bounds::range(2, 9));
        assert_eq!(mid.len(), 1);
        map.insert(3, "c");
        assert_eq!(mid.len(), 2);
        assert_eq!(mid.first_key(), Some(3));
        assert_eq!(mid.last_key(), Some(5));
        assert_eq!(mid.get(&1), None);
        assert_eq!(mid.keys_vec(), vec![3, 5]);
    }

    #[test]
    fn test_ranged_map_mutation() {
        let map = GuardedOrderedMap::wrap(BTreeMap::from([(1, "a"), (3, "c")]));
        let mid = map.range(Bounds::range(2, 4));
        assert_eq!(mid.insert(2, "b"), None);
        assert!(map.contains_key(&2));
        assert_eq!(mid.remove(&1), None);
        assert!(map.contains_key(&1));
        mid.clear();
        assert_eq!(map.keys_vec(), vec![1]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_ranged_map_insert_out_of_range_panics() {
        let map = GuardedOrderedMap::wrap(BTreeMap::<i32, &str>::new());
        map.range(Bounds::range(2, 4)).insert(9, "x");
    }

    #[test]
    fn test_map_equality_and_serialization() {
        let a = GuardedMap::wrap(HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
        let b = GuardedMap::wrap(BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 1)]));
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::json!({"a": 1, "b": 2})
        );
    }
}
