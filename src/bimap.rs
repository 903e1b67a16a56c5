//! Guarded wrapper for bidirectional maps.
//!
//! `GuardedBiMap` forwards the map surface plus reverse lookup, and serves
//! [`GuardedBiMap::inverse`]: a lazily built guarded bimap over a
//! value-side delegate that re-enters this map's backing under the shared
//! lock. The forward map caches the inverse; the inverse holds a back
//! pointer to the forward map, so `a.inverse().inverse()` is the same
//! handle as `a` for as long as `a` is alive.
//!
//! The plain [`GuardedBiMap::insert`] has displacing semantics: any binding
//! that would break the bijection is removed. [`GuardedBiMap::try_insert`]
//! is the checked form.

use crate::collection::{unordered_eq, Iter};
use crate::error::{Error, Result};
use crate::guard::{materialize_slot, GuardCell, ViewIdentity};
use crate::identity::MutexIdentity;
use crate::interfaces::{BiMapLike, MapLike};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, Weak};

struct BiMapInner<K, V> {
    cell: Arc<GuardCell<dyn BiMapLike<K, V>>>,
    values: OnceCell<Arc<ViewIdentity>>,
    // Forward direction caches the inverse strongly; the inverse points back
    // weakly, so the pair never forms a reference cycle.
    inverse: OnceCell<Arc<BiMapInner<V, K>>>,
    back: Mutex<Weak<BiMapInner<V, K>>>,
}

/// A bidirectional map guarded by a mutex identity.
pub struct GuardedBiMap<K, V> {
    inner: Arc<BiMapInner<K, V>>,
}

impl<K: 'static, V: 'static> GuardedBiMap<K, V> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl BiMapLike<K, V> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl BiMapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!("wrapped bimap root");
        GuardedBiMap {
            inner: Arc::new(BiMapInner {
                cell: Arc::new(GuardCell::new(Box::new(delegate), mutex)),
                values: OnceCell::new(),
                inverse: OnceCell::new(),
                back: Mutex::new(Weak::new()),
            }),
        }
    }

    /// Wrap `delegate` after checking it is empty.
    ///
    /// Fails with [`Error::NonEmptyDelegate`] when the backing already holds
    /// entries the wrapper did not see being added.
    pub fn try_wrap_empty(
        delegate: impl BiMapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Result<Self> {
        let len = delegate.len();
        if len != 0 {
            return Err(Error::NonEmptyDelegate { len });
        }
        Ok(Self::wrap_with(delegate, mutex))
    }

    /// The lock token guarding this bimap.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.inner.cell.mutex())
    }

    /// Whether two handles refer to the same guarded bimap.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of bindings, under the lock.
    pub fn len(&self) -> usize {
        self.inner.cell.with(|d| d.len())
    }

    /// Whether the bimap holds no bindings, under the lock.
    pub fn is_empty(&self) -> bool {
        self.inner.cell.with(|d| d.is_empty())
    }

    /// Value bound to `key`, under the lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.get(key))
    }

    /// Key bound to `value`, under the lock.
    pub fn get_by_value(&self, value: &V) -> Option<K> {
        self.inner.cell.with(|d| d.get_by_value(value))
    }

    /// Whether `key` is bound, under the lock.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.cell.with(|d| d.contains_key(key))
    }

    /// Whether `value` is bound, under the lock.
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner.cell.with(|d| d.contains_value(value))
    }

    /// Bind `key` to `value`, displacing any binding that would break the
    /// bijection. Returns the value previously bound to `key`.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.cell.with(|d| d.insert(key, value))
    }

    /// Bind `key` to `value` unless `value` is already bound to a different
    /// key, failing with [`Error::ValueAlreadyBound`].
    pub fn try_insert(&self, key: K, value: V) -> Result<Option<V>> {
        self.inner.cell.with(|d| d.try_insert(key, value))
    }

    /// Bind `key` to `value`, removing any existing binding of either side.
    pub fn force_insert(&self, key: K, value: V) -> Option<V> {
        self.inner.cell.with(|d| d.force_insert(key, value))
    }

    /// Unbind `key`, returning the value it was bound to.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.cell.with(|d| d.remove(key))
    }

    /// Unbind whatever key is bound to `value`, returning that key.
    pub fn remove_by_value(&self, value: &V) -> Option<K> {
        self.inner.cell.with(|d| d.remove_by_value(value))
    }

    /// Remove the exact `(key, value)` binding, under the lock.
    pub fn remove_entry(&self, key: &K, value: &V) -> bool {
        self.inner.cell.with(|d| d.remove_entry(key, value))
    }

    /// Remove every binding, under the lock.
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

    /// Owned projection of the bindings, under one acquisition.
    pub fn entries_vec(&self) -> Vec<(K, V)> {
        self.inner.cell.with(|d| d.entries_vec())
    }

    /// Snapshot iterator over the bindings.
    pub fn iter(&self) -> Iter<(K, V)> {
        Iter::new(self.entries_vec())
    }

    /// Run a compound operation against the delegate under one acquisition.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn BiMapLike<K, V> + 'static)) -> R) -> R {
        self.inner.cell.with(f)
    }

    /// The lazy value-set view; first call materializes it under the lock.
    ///
    /// Values of a bimap form a set (the bijection makes them unique).
    pub fn values(&self) -> BiMapValues<K, V> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.values, "bimap_values");
        BiMapValues {
            parent: self.clone(),
            identity,
        }
    }
}

impl<K: 'static, V: PartialEq + 'static> GuardedBiMap<K, V> {
    /// The inverse bimap: a guarded view mapping values to keys over the
    /// same backing and the same lock.
    ///
    /// The first call materializes the inverse under the lock; later calls
    /// return the same handle, and `inverse()` of the inverse returns this
    /// map.
    pub fn inverse(&self) -> GuardedBiMap<V, K> {
        if let Some(forward) = self.inner.back.lock().upgrade() {
            return GuardedBiMap { inner: forward };
        }
        let inverse = {
            let _graph = self.inner.cell.mutex().acquire();
            Arc::clone(self.inner.inverse.get_or_init(|| {
                tracing::trace!("materialized inverse bimap");
                Arc::new(BiMapInner {
                    cell: Arc::new(GuardCell::new(
                        Box::new(InverseOf {
                            forward: Arc::clone(&self.inner.cell),
                        }),
                        Some(Arc::clone(self.inner.cell.mutex())),
                    )),
                    values: OnceCell::new(),
                    inverse: OnceCell::new(),
                    back: Mutex::new(Weak::new()),
                })
            }))
        };
        *inverse.back.lock() = Arc::downgrade(&self.inner);
        GuardedBiMap { inner: inverse }
    }
}

impl<K, V> Clone for GuardedBiMap<K, V> {
    fn clone(&self) -> Self {
        GuardedBiMap {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug + 'static, V: fmt::Debug + 'static> fmt::Debug for GuardedBiMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedBiMap")
            .field("entries", &self.entries_vec())
            .finish()
    }
}

impl<K: PartialEq + 'static, V: PartialEq + 'static> PartialEq for GuardedBiMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        unordered_eq(&self.entries_vec(), &other.entries_vec())
    }
}

impl<K: Serialize + 'static, V: Serialize + 'static> Serialize for GuardedBiMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries_vec())
    }
}

/// Value-side delegate backing an inverse bimap: every operation re-enters
/// the forward backing with the roles of key and value swapped.
///
/// Only ever called while the graph mutex is already held by the inverse
/// wrapper's scoped acquisition.
struct InverseOf<K, V> {
    forward: Arc<GuardCell<dyn BiMapLike<K, V>>>,
}

impl<K: 'static, V: PartialEq + 'static> MapLike<V, K> for InverseOf<K, V> {
    fn len(&self) -> usize {
        self.forward.with_unlocked(|d| d.len())
    }

    fn get(&self, key: &V) -> Option<K> {
        self.forward.with_unlocked(|d| d.get_by_value(key))
    }

    fn contains_key(&self, key: &V) -> bool {
        self.forward.with_unlocked(|d| d.contains_value(key))
    }

    fn contains_value(&self, value: &K) -> bool {
        self.forward.with_unlocked(|d| d.contains_key(value))
    }

    fn insert(&mut self, key: V, value: K) -> Option<K> {
        self.forward.with_unlocked(|d| {
            let previous = d.get_by_value(&key);
            d.force_insert(value, key);
            previous
        })
    }

    fn remove(&mut self, key: &V) -> Option<K> {
        self.forward.with_unlocked(|d| d.remove_by_value(key))
    }

    fn remove_entry(&mut self, key: &V, value: &K) -> bool {
        self.forward.with_unlocked(|d| d.remove_entry(value, key))
    }

    fn remove_value_once(&mut self, value: &K) -> bool {
        self.forward.with_unlocked(|d| d.remove(value).is_some())
    }

    fn clear(&mut self) {
        self.forward.with_unlocked(|d| d.clear())
    }

    fn keys_vec(&self) -> Vec<V> {
        self.forward.with_unlocked(|d| d.values_vec())
    }

    fn values_vec(&self) -> Vec<K> {
        self.forward.with_unlocked(|d| d.keys_vec())
    }

    fn entries_vec(&self) -> Vec<(V, K)> {
        self.forward
            .with_unlocked(|d| d.entries_vec().into_iter().map(|(k, v)| (v, k)).collect())
    }
}

impl<K: 'static, V: PartialEq + 'static> BiMapLike<V, K> for InverseOf<K, V> {
    fn try_insert(&mut self, key: V, value: K) -> Result<Option<K>> {
        self.forward.with_unlocked(|d| {
            if let Some(existing) = d.get(&value) {
                if existing != key {
                    return Err(Error::ValueAlreadyBound);
                }
            }
            let previous = d.get_by_value(&key);
            d.force_insert(value, key);
            Ok(previous)
        })
    }

    fn force_insert(&mut self, key: V, value: K) -> Option<K> {
        MapLike::insert(self, key, value)
    }

    fn get_by_value(&self, value: &K) -> Option<V> {
        self.forward.with_unlocked(|d| d.get(value))
    }

    fn remove_by_value(&mut self, value: &K) -> Option<V> {
        self.forward.with_unlocked(|d| d.remove(value))
    }
}

/// Live value-set view of a guarded bimap.
///
/// Supports removal but not insertion (a value cannot be bound without a
/// key).
pub struct BiMapValues<K, V> {
    parent: GuardedBiMap<K, V>,
    identity: Arc<ViewIdentity>,
}

impl<K: 'static, V: 'static> BiMapValues<K, V> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of values, under the lock.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the view holds no values, under the lock.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Membership test, under the lock.
    pub fn contains(&self, value: &V) -> bool {
        self.parent.contains_value(value)
    }

    /// Unsupported: a value cannot be inserted through the value-set view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _value: V) -> bool {
        panic!("value-set views do not support insertion");
    }

    /// Unbind whatever key holds `value`.
    pub fn remove(&self, value: &V) -> bool {
        self.parent.remove_by_value(value).is_some()
    }

    /// Remove every binding from the parent bimap.
    pub fn clear(&self) {
        self.parent.clear()
    }

    /// Owned projection of the values, under one acquisition.
    pub fn to_vec(&self) -> Vec<V> {
        self.parent.values_vec()
    }

    /// Snapshot iterator over the values.
    pub fn iter(&self) -> Iter<V> {
        Iter::new(self.to_vec())
    }
}

impl<K, V> Clone for BiMapValues<K, V> {
    fn clone(&self) -> Self {
        BiMapValues {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<K: 'static, V: fmt::Debug + 'static> fmt::Debug for BiMapValues<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiMapValues")
            .field("values", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::HashBiMap;

    #[test]
    fn test_basic_bindings() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        assert_eq!(bimap.insert("a", 1), None);
        assert_eq!(bimap.get(&"a"), Some(1));
        assert_eq!(bimap.get_by_value(&1), Some("a"));
        assert_eq!(bimap.remove(&"a"), Some(1));
        assert!(bimap.is_empty());
    }

    #[test]
    fn test_displacing_insert() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        bimap.insert("a", 1);
        bimap.insert("b", 1);
        assert_eq!(bimap.len(), 1);
        assert_eq!(bimap.get_by_value(&1), Some("b"));
        assert!(!bimap.contains_key(&"a"));
    }

    #[test]
    fn test_try_insert_checked() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        bimap.try_insert("a", 1).unwrap();
        assert_eq!(bimap.try_insert("b", 1), Err(Error::ValueAlreadyBound));
        assert_eq!(bimap.get(&"a"), Some(1));
    }

    #[test]
    fn test_try_wrap_empty() {
        let mut populated = HashBiMap::new();
        populated.try_insert("a", 1).unwrap();
        let err = GuardedBiMap::try_wrap_empty(populated, None).unwrap_err();
        assert_eq!(err, Error::NonEmptyDelegate { len: 1 });

        assert!(GuardedBiMap::<&str, i32>::try_wrap_empty(HashBiMap::new(), None).is_ok());
    }

    #[test]
    fn test_inverse_is_live_and_flipped() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        let inverse = bimap.inverse();
        bimap.insert("a", 1);
        assert_eq!(inverse.get(&1), Some("a"));
        assert_eq!(inverse.len(), 1);

        // Mutation through the inverse shows up in the forward map.
        inverse.insert(2, "b");
        assert_eq!(bimap.get(&"b"), Some(2));
        assert_eq!(inverse.remove(&1), Some("a"));
        assert!(!bimap.contains_key(&"a"));
    }

    #[test]
    fn test_inverse_round_trip_identity() {
        let bimap: GuardedBiMap<&str, i32> = GuardedBiMap::wrap(HashBiMap::new());
        let inverse = bimap.inverse();
        assert!(GuardedBiMap::ptr_eq(&inverse.inverse(), &bimap));
        assert!(GuardedBiMap::ptr_eq(&bimap.inverse(), &inverse));
    }

    #[test]
    fn test_inverse_shares_mutex_identity() {
        let bimap: GuardedBiMap<&str, i32> = GuardedBiMap::wrap(HashBiMap::new());
        assert!(Arc::ptr_eq(
            &bimap.mutex_identity(),
            &bimap.inverse().mutex_identity()
        ));
    }

    #[test]
    fn test_inverse_try_insert_conflict() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        bimap.insert("a", 1);
        let inverse = bimap.inverse();
        // In the inverse direction, "a" is a value already bound to key 1.
        assert_eq!(inverse.try_insert(2, "a"), Err(Error::ValueAlreadyBound));
        assert_eq!(inverse.try_insert(1, "a"), Ok(Some("a")));
    }

    #[test]
    fn test_values_view() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        let values = bimap.values();
        assert!(BiMapValues::ptr_eq(&values, &bimap.values()));
        bimap.insert("a", 1);
        assert!(values.contains(&1));
        assert!(values.remove(&1));
        assert!(bimap.is_empty());
    }

    #[test]
    #[should_panic(expected = "do not support insertion")]
    fn test_values_view_insert_panics() {
        let bimap: GuardedBiMap<&str, i32> = GuardedBiMap::wrap(HashBiMap::new());
        bimap.values().insert(1);
    }

    #[test]
    fn test_serialization() {
        let bimap = GuardedBiMap::wrap(HashBiMap::new());
        bimap.insert("a".to_string(), 1);
        assert_eq!(
            serde_json::to_value(&bimap).unwrap(),
            serde_json::json!({"a": 1})
        );
    }
}
