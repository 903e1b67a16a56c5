//! Reference backings for the capability interfaces.
//!
//! The wrapper layer treats backing structures as external collaborators; the
//! implementations here exist so the crate is usable out of the box and so
//! the tests have real backings. The std collections carry their natural
//! capabilities (`BTreeSet` is an ordered set, `Vec` a random-access list),
//! and the multi-valued structures are straightforward std compositions with
//! no algorithmic ambition.

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::interfaces::{
    BiMapLike, Bounds, CollectionLike, ListLike, ListMultimapLike, MapLike, MultimapLike,
    MultisetLike, OrderedMapLike, OrderedSetLike, OrderedSetMultimapLike, SetLike,
    SetMultimapLike,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

// ============================================================================
// std collections
// ============================================================================

impl<E: Clone + PartialEq + Send> CollectionLike<E> for Vec<E> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn contains(&self, item: &E) -> bool {
        self.iter().any(|e| e == item)
    }

    fn insert(&mut self, item: E) -> bool {
        self.push(item);
        true
    }

    fn remove(&mut self, item: &E) -> bool {
        match self.iter().position(|e| e == item) {
            Some(index) => {
                Vec::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool) {
        Vec::retain(self, |e| keep(e));
    }

    fn to_vec(&self) -> Vec<E> {
        self.clone()
    }

    fn capability(&self) -> Capability {
        Capability::RandomAccessList
    }
}

impl<E: Clone + PartialEq + Send> ListLike<E> for Vec<E> {
    fn get_at(&self, index: usize) -> Option<E> {
        self.get(index).cloned()
    }

    fn set_at(&mut self, index: usize, item: E) -> Option<E> {
        match self.get_mut(index) {
            Some(slot) => Some(std::mem::replace(slot, item)),
            None => None,
        }
    }

    fn insert_at(&mut self, index: usize, item: E) -> bool {
        if index > Vec::len(self) {
            return false;
        }
        Vec::insert(self, index, item);
        true
    }

    fn remove_at(&mut self, index: usize) -> Option<E> {
        if index < Vec::len(self) {
            Some(Vec::remove(self, index))
        } else {
            None
        }
    }

    fn index_of(&self, item: &E) -> Option<usize> {
        self.iter().position(|e| e == item)
    }

    fn last_index_of(&self, item: &E) -> Option<usize> {
        self.iter().rposition(|e| e == item)
    }
}

impl<E: Clone + PartialEq + Send> CollectionLike<E> for VecDeque<E> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn contains(&self, item: &E) -> bool {
        self.iter().any(|e| e == item)
    }

    fn insert(&mut self, item: E) -> bool {
        self.push_back(item);
        true
    }

    fn remove(&mut self, item: &E) -> bool {
        match self.iter().position(|e| e == item) {
            Some(index) => {
                VecDeque::remove(self, index);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        VecDeque::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool) {
        VecDeque::retain(self, |e| keep(e));
    }

    fn to_vec(&self) -> Vec<E> {
        self.iter().cloned().collect()
    }

    fn capability(&self) -> Capability {
        Capability::List
    }
}

impl<E: Clone + PartialEq + Send> ListLike<E> for VecDeque<E> {
    fn get_at(&self, index: usize) -> Option<E> {
        self.get(index).cloned()
    }

    fn set_at(&mut self, index: usize, item: E) -> Option<E> {
        match self.get_mut(index) {
            Some(slot) => Some(std::mem::replace(slot, item)),
            None => None,
        }
    }

    fn insert_at(&mut self, index: usize, item: E) -> bool {
        if index > VecDeque::len(self) {
            return false;
        }
        VecDeque::insert(self, index, item);
        true
    }

    fn remove_at(&mut self, index: usize) -> Option<E> {
        VecDeque::remove(self, index)
    }

    fn index_of(&self, item: &E) -> Option<usize> {
        self.iter().position(|e| e == item)
    }

    fn last_index_of(&self, item: &E) -> Option<usize> {
        self.iter().rposition(|e| e == item)
    }
}

impl<E: Clone + Eq + Hash + Send> CollectionLike<E> for HashSet<E> {
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn contains(&self, item: &E) -> bool {
        HashSet::contains(self, item)
    }

    fn insert(&mut self, item: E) -> bool {
        HashSet::insert(self, item)
    }

    fn remove(&mut self, item: &E) -> bool {
        HashSet::remove(self, item)
    }

    fn clear(&mut self) {
        HashSet::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool) {
        HashSet::retain(self, |e| keep(e));
    }

    fn to_vec(&self) -> Vec<E> {
        self.iter().cloned().collect()
    }

    fn capability(&self) -> Capability {
        Capability::Set
    }
}

impl<E: Clone + Eq + Hash + Send> SetLike<E> for HashSet<E> {}

impl<E: Clone + Ord + Send> CollectionLike<E> for BTreeSet<E> {
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn contains(&self, item: &E) -> bool {
        BTreeSet::contains(self, item)
    }

    fn insert(&mut self, item: E) -> bool {
        BTreeSet::insert(self, item)
    }

    fn remove(&mut self, item: &E) -> bool {
        BTreeSet::remove(self, item)
    }

    fn clear(&mut self) {
        BTreeSet::clear(self);
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool) {
        BTreeSet::retain(self, |e| keep(e));
    }

    fn to_vec(&self) -> Vec<E> {
        self.iter().cloned().collect()
    }

    fn capability(&self) -> Capability {
        Capability::OrderedSet
    }
}

impl<E: Clone + Ord + Send> SetLike<E> for BTreeSet<E> {}

impl<E: Clone + Ord + Send> OrderedSetLike<E> for BTreeSet<E> {
    fn first(&self) -> Option<E> {
        self.iter().next().cloned()
    }

    fn last(&self) -> Option<E> {
        self.iter().next_back().cloned()
    }

    fn range_vec(&self, bounds: &Bounds<E>) -> Vec<E> {
        self.range(bounds.as_range_bounds()).cloned().collect()
    }

    fn range_len(&self, bounds: &Bounds<E>) -> usize {
        self.range(bounds.as_range_bounds()).count()
    }
}

impl<K, V> MapLike<K, V> for HashMap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + PartialEq + Send,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn get(&self, key: &K) -> Option<V> {
        HashMap::get(self, key).cloned()
    }

    fn contains_key(&self, key: &K) -> bool {
        HashMap::contains_key(self, key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.values().any(|v| v == value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        HashMap::remove(self, key)
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        if HashMap::get(self, key) == Some(value) {
            HashMap::remove(self, key);
            true
        } else {
            false
        }
    }

    fn remove_value_once(&mut self, value: &V) -> bool {
        let key = self.iter().find(|(_, v)| *v == value).map(|(k, _)| k.clone());
        match key {
            Some(k) => {
                HashMap::remove(self, &k);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn keys_vec(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    fn values_vec(&self) -> Vec<V> {
        self.values().cloned().collect()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn capability(&self) -> Capability {
        Capability::Map
    }
}

impl<K, V> MapLike<K, V> for BTreeMap<K, V>
where
    K: Clone + Ord + Send,
    V: Clone + PartialEq + Send,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &K) -> Option<V> {
        BTreeMap::get(self, key).cloned()
    }

    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.values().any(|v| v == value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        if BTreeMap::get(self, key) == Some(value) {
            BTreeMap::remove(self, key);
            true
        } else {
            false
        }
    }

    fn remove_value_once(&mut self, value: &V) -> bool {
        let key = self.iter().find(|(_, v)| *v == value).map(|(k, _)| k.clone());
        match key {
            Some(k) => {
                BTreeMap::remove(self, &k);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn keys_vec(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    fn values_vec(&self) -> Vec<V> {
        self.values().cloned().collect()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn capability(&self) -> Capability {
        Capability::OrderedMap
    }
}

impl<K, V> OrderedMapLike<K, V> for BTreeMap<K, V>
where
    K: Clone + Ord + Send,
    V: Clone + PartialEq + Send,
{
    fn first_key(&self) -> Option<K> {
        self.keys().next().cloned()
    }

    fn last_key(&self) -> Option<K> {
        self.keys().next_back().cloned()
    }

    fn range_entries(&self, bounds: &Bounds<K>) -> Vec<(K, V)> {
        self.range(bounds.as_range_bounds())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn range_len(&self, bounds: &Bounds<K>) -> usize {
        self.range(bounds.as_range_bounds()).count()
    }
}

// ============================================================================
// Bidirectional map
// ============================================================================

/// Hash-based bidirectional map: values are unique, reverse lookup is O(1).
///
/// `insert` displaces any binding that would break the bijection;
/// [`BiMapLike::try_insert`] is the checked form.
#[derive(Debug, Clone, Default)]
pub struct HashBiMap<K, V> {
    forward: HashMap<K, V>,
    backward: HashMap<V, K>,
}

impl<K, V> HashBiMap<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    /// Create an empty bidirectional map.
    pub fn new() -> Self {
        HashBiMap {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<K, V> MapLike<K, V> for HashBiMap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Eq + Hash + Send,
{
    fn len(&self) -> usize {
        self.forward.len()
    }

    fn get(&self, key: &K) -> Option<V> {
        self.forward.get(key).cloned()
    }

    fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.backward.contains_key(value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.force_insert(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.forward.remove(key)?;
        self.backward.remove(&value);
        Some(value)
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        if self.forward.get(key) == Some(value) {
            MapLike::remove(self, key);
            true
        } else {
            false
        }
    }

    fn remove_value_once(&mut self, value: &V) -> bool {
        self.remove_by_value(value).is_some()
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }

    fn keys_vec(&self) -> Vec<K> {
        self.forward.keys().cloned().collect()
    }

    fn values_vec(&self) -> Vec<V> {
        self.forward.values().cloned().collect()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        self.forward
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> BiMapLike<K, V> for HashBiMap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Eq + Hash + Send,
{
    fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if let Some(bound) = self.backward.get(&value) {
            if *bound != key {
                return Err(Error::ValueAlreadyBound);
            }
        }
        Ok(self.force_insert(key, value))
    }

    fn force_insert(&mut self, key: K, value: V) -> Option<V> {
        // Displace whichever bindings would break the bijection. A re-bind
        // of the same pair displaces nothing; the forward entry must stay
        // so the prior value is reported below.
        if let Some(displaced_key) = self.backward.remove(&value) {
            if displaced_key != key {
                self.forward.remove(&displaced_key);
            }
        }
        let previous = self.forward.insert(key.clone(), value.clone());
        if let Some(prev_value) = &previous {
            self.backward.remove(prev_value);
        }
        self.backward.insert(value, key);
        previous
    }

    fn get_by_value(&self, value: &V) -> Option<K> {
        self.backward.get(value).cloned()
    }

    fn remove_by_value(&mut self, value: &V) -> Option<K> {
        let key = self.backward.remove(value)?;
        self.forward.remove(&key);
        Some(key)
    }
}

// ============================================================================
// Multiset
// ============================================================================

/// Hash-based multiset: per-element occurrence counts.
#[derive(Debug, Clone, Default)]
pub struct HashMultiset<E> {
    counts: HashMap<E, usize>,
    total: usize,
}

impl<E: Clone + Eq + Hash> HashMultiset<E> {
    /// Create an empty multiset.
    pub fn new() -> Self {
        HashMultiset {
            counts: HashMap::new(),
            total: 0,
        }
    }
}

impl<E: Clone + Eq + Hash + Send> CollectionLike<E> for HashMultiset<E> {
    fn len(&self) -> usize {
        self.total
    }

    fn contains(&self, item: &E) -> bool {
        self.counts.contains_key(item)
    }

    fn insert(&mut self, item: E) -> bool {
        self.add_count(item, 1);
        true
    }

    fn remove(&mut self, item: &E) -> bool {
        self.remove_count(item, 1) > 0
    }

    fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    fn retain(&mut self, keep: &mut dyn FnMut(&E) -> bool) {
        let mut dropped = 0;
        self.counts.retain(|e, n| {
            if keep(e) {
                true
            } else {
                dropped += *n;
                false
            }
        });
        self.total -= dropped;
    }

    fn to_vec(&self) -> Vec<E> {
        let mut out = Vec::with_capacity(self.total);
        for (e, n) in &self.counts {
            for _ in 0..*n {
                out.push(e.clone());
            }
        }
        out
    }
}

impl<E: Clone + Eq + Hash + Send> MultisetLike<E> for HashMultiset<E> {
    fn count(&self, item: &E) -> usize {
        self.counts.get(item).copied().unwrap_or(0)
    }

    fn add_count(&mut self, item: E, n: usize) -> usize {
        if n == 0 {
            return self.count(&item);
        }
        let slot = self.counts.entry(item).or_insert(0);
        let previous = *slot;
        *slot += n;
        self.total += n;
        previous
    }

    fn remove_count(&mut self, item: &E, n: usize) -> usize {
        let previous = self.count(item);
        let removed = previous.min(n);
        if removed > 0 {
            if previous == removed {
                self.counts.remove(item);
            } else if let Some(slot) = self.counts.get_mut(item) {
                *slot -= removed;
            }
            self.total -= removed;
        }
        previous
    }

    fn set_count(&mut self, item: E, n: usize) -> usize {
        let previous = self.count(&item);
        if n == 0 {
            self.counts.remove(&item);
        } else {
            self.counts.insert(item, n);
        }
        self.total = self.total - previous + n;
        previous
    }

    fn try_set_count(&mut self, item: E, expected: usize, n: usize) -> bool {
        if self.count(&item) != expected {
            return false;
        }
        self.set_count(item, n);
        true
    }

    fn distinct_vec(&self) -> Vec<E> {
        self.counts.keys().cloned().collect()
    }

    fn distinct_len(&self) -> usize {
        self.counts.len()
    }

    fn counted_entries(&self) -> Vec<(E, usize)> {
        self.counts.iter().map(|(e, n)| (e.clone(), *n)).collect()
    }
}

// ============================================================================
// Multimaps
// ============================================================================

/// List-valued multimap: per-key values keep insertion order and duplicates.
#[derive(Debug, Clone, Default)]
pub struct VecMultimap<K, V> {
    entries: HashMap<K, Vec<V>>,
    total: usize,
}

impl<K: Clone + Eq + Hash, V: Clone + PartialEq> VecMultimap<K, V> {
    /// Create an empty list-valued multimap.
    pub fn new() -> Self {
        VecMultimap {
            entries: HashMap::new(),
            total: 0,
        }
    }
}

impl<K, V> MultimapLike<K, V> for VecMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + PartialEq + Send,
{
    fn len(&self) -> usize {
        self.total
    }

    fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.entries.values().any(|vs| vs.contains(value))
    }

    fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.entries
            .get(key)
            .map(|vs| vs.contains(value))
            .unwrap_or(false)
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        self.entries.entry(key).or_default().push(value);
        self.total += 1;
        true
    }

    fn insert_all(&mut self, key: K, values: Vec<V>) -> bool {
        if values.is_empty() {
            return false;
        }
        self.total += values.len();
        self.entries.entry(key).or_default().extend(values);
        true
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(index) = values.iter().position(|v| v == value) else {
            return false;
        };
        values.remove(index);
        self.total -= 1;
        if values.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    fn remove_key(&mut self, key: &K) -> Vec<V> {
        let removed = self.entries.remove(key).unwrap_or_default();
        self.total -= removed.len();
        removed
    }

    fn replace_values(&mut self, key: K, values: Vec<V>) -> Vec<V> {
        let previous = self.remove_key(&key);
        self.insert_all(key, values);
        previous
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    fn get_vec(&self, key: &K) -> Vec<V> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn key_len(&self, key: &K) -> usize {
        self.entries.get(key).map(Vec::len).unwrap_or(0)
    }

    fn distinct_keys_vec(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    fn distinct_key_len(&self) -> usize {
        self.entries.len()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.total);
        for (k, vs) in &self.entries {
            for v in vs {
                out.push((k.clone(), v.clone()));
            }
        }
        out
    }
}

impl<K, V> ListMultimapLike<K, V> for VecMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + PartialEq + Send,
{
    fn get_at(&self, key: &K, index: usize) -> Option<V> {
        self.entries.get(key).and_then(|vs| vs.get(index)).cloned()
    }

    fn set_at(&mut self, key: &K, index: usize, value: V) -> Option<V> {
        let slot = self.entries.get_mut(key)?.get_mut(index)?;
        Some(std::mem::replace(slot, value))
    }

    fn insert_at(&mut self, key: &K, index: usize, value: V) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        if index > values.len() {
            return false;
        }
        values.insert(index, value);
        self.total += 1;
        true
    }

    fn remove_at(&mut self, key: &K, index: usize) -> Option<V> {
        let values = self.entries.get_mut(key)?;
        if index >= values.len() {
            return None;
        }
        let removed = values.remove(index);
        self.total -= 1;
        if values.is_empty() {
            self.entries.remove(key);
        }
        Some(removed)
    }
}

/// Set-valued multimap: no duplicate key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct HashMultimap<K, V> {
    entries: HashMap<K, HashSet<V>>,
    total: usize,
}

impl<K: Clone + Eq + Hash, V: Clone + Eq + Hash> HashMultimap<K, V> {
    /// Create an empty set-valued multimap.
    pub fn new() -> Self {
        HashMultimap {
            entries: HashMap::new(),
            total: 0,
        }
    }
}

impl<K, V> MultimapLike<K, V> for HashMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Eq + Hash + Send,
{
    fn len(&self) -> usize {
        self.total
    }

    fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.entries.values().any(|vs| vs.contains(value))
    }

    fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.entries
            .get(key)
            .map(|vs| vs.contains(value))
            .unwrap_or(false)
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        let added = self.entries.entry(key).or_default().insert(value);
        if added {
            self.total += 1;
        }
        added
    }

    fn insert_all(&mut self, key: K, values: Vec<V>) -> bool {
        let mut changed = false;
        for value in values {
            changed |= self.insert(key.clone(), value);
        }
        changed
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        if !values.remove(value) {
            return false;
        }
        self.total -= 1;
        if values.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    fn remove_key(&mut self, key: &K) -> Vec<V> {
        let removed: Vec<V> = self
            .entries
            .remove(key)
            .map(|vs| vs.into_iter().collect())
            .unwrap_or_default();
        self.total -= removed.len();
        removed
    }

    fn replace_values(&mut self, key: K, values: Vec<V>) -> Vec<V> {
        let previous = self.remove_key(&key);
        self.insert_all(key, values);
        previous
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    fn get_vec(&self, key: &K) -> Vec<V> {
        self.entries
            .get(key)
            .map(|vs| vs.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn key_len(&self, key: &K) -> usize {
        self.entries.get(key).map(HashSet::len).unwrap_or(0)
    }

    fn distinct_keys_vec(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    fn distinct_key_len(&self) -> usize {
        self.entries.len()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.total);
        for (k, vs) in &self.entries {
            for v in vs {
                out.push((k.clone(), v.clone()));
            }
        }
        out
    }
}

impl<K, V> SetMultimapLike<K, V> for HashMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Eq + Hash + Send,
{
}

/// Ordered-set-valued multimap: per-key values kept in `Ord` order.
#[derive(Debug, Clone, Default)]
pub struct SortedMultimap<K, V> {
    entries: HashMap<K, BTreeSet<V>>,
    total: usize,
}

impl<K: Clone + Eq + Hash, V: Clone + Ord> SortedMultimap<K, V> {
    /// Create an empty ordered-set-valued multimap.
    pub fn new() -> Self {
        SortedMultimap {
            entries: HashMap::new(),
            total: 0,
        }
    }
}

impl<K, V> MultimapLike<K, V> for SortedMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Ord + Send,
{
    fn len(&self) -> usize {
        self.total
    }

    fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool {
        self.entries.values().any(|vs| vs.contains(value))
    }

    fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.entries
            .get(key)
            .map(|vs| vs.contains(value))
            .unwrap_or(false)
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        let added = self.entries.entry(key).or_default().insert(value);
        if added {
            self.total += 1;
        }
        added
    }

    fn insert_all(&mut self, key: K, values: Vec<V>) -> bool {
        let mut changed = false;
        for value in values {
            changed |= self.insert(key.clone(), value);
        }
        changed
    }

    fn remove_entry(&mut self, key: &K, value: &V) -> bool {
        let Some(values) = self.entries.get_mut(key) else {
            return false;
        };
        if !values.remove(value) {
            return false;
        }
        self.total -= 1;
        if values.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    fn remove_key(&mut self, key: &K) -> Vec<V> {
        let removed: Vec<V> = self
            .entries
            .remove(key)
            .map(|vs| vs.into_iter().collect())
            .unwrap_or_default();
        self.total -= removed.len();
        removed
    }

    fn replace_values(&mut self, key: K, values: Vec<V>) -> Vec<V> {
        let previous = self.remove_key(&key);
        self.insert_all(key, values);
        previous
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.total = 0;
    }

    fn get_vec(&self, key: &K) -> Vec<V> {
        self.entries
            .get(key)
            .map(|vs| vs.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn key_len(&self, key: &K) -> usize {
        self.entries.get(key).map(BTreeSet::len).unwrap_or(0)
    }

    fn distinct_keys_vec(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    fn distinct_key_len(&self) -> usize {
        self.entries.len()
    }

    fn entries_vec(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.total);
        for (k, vs) in &self.entries {
            for v in vs {
                out.push((k.clone(), v.clone()));
            }
        }
        out
    }
}

impl<K, V> SetMultimapLike<K, V> for SortedMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Ord + Send,
{
}

impl<K, V> OrderedSetMultimapLike<K, V> for SortedMultimap<K, V>
where
    K: Clone + Eq + Hash + Send,
    V: Clone + Ord + Send,
{
    fn first_of(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|vs| vs.iter().next().cloned())
    }

    fn last_of(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .and_then(|vs| vs.iter().next_back().cloned())
    }

    fn range_of(&self, key: &K, bounds: &Bounds<V>) -> Vec<V> {
        self.entries
            .get(key)
            .map(|vs| vs.range(bounds.as_range_bounds()).cloned().collect())
            .unwrap_or_default()
    }

    fn range_len_of(&self, key: &K, bounds: &Bounds<V>) -> usize {
        self.entries
            .get(key)
            .map(|vs| vs.range(bounds.as_range_bounds()).count())
            .unwrap_or(0)
    }
}
