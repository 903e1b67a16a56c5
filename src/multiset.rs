//! Guarded wrapper for multisets (collections with per-element counts).
//!
//! Count mutations, including the compare-and-set form
//! [`GuardedMultiset::try_set_count`], run as single scoped acquisitions, so
//! the backing's check-then-act semantics hold across threads. The
//! element-set and counted-entry views are lazy slots in the map-view style.

use crate::collection::{unordered_eq, Iter};
use crate::error::{Error, Result};
use crate::guard::{materialize_slot, GuardCell, ViewIdentity};
use crate::identity::MutexIdentity;
use crate::interfaces::MultisetLike;
use once_cell::sync::OnceCell;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

struct MultisetInner<E> {
    cell: GuardCell<dyn MultisetLike<E>>,
    elements: OnceCell<Arc<ViewIdentity>>,
    entries: OnceCell<Arc<ViewIdentity>>,
}

/// A multiset guarded by a mutex identity.
pub struct GuardedMultiset<E> {
    inner: Arc<MultisetInner<E>>,
}

impl<E: 'static> GuardedMultiset<E> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl MultisetLike<E> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl MultisetLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!("wrapped multiset root");
        GuardedMultiset {
            inner: Arc::new(MultisetInner {
                cell: GuardCell::new(Box::new(delegate), mutex),
                elements: OnceCell::new(),
                entries: OnceCell::new(),
            }),
        }
    }

    /// Wrap `delegate` after checking it is empty.
    ///
    /// Fails with [`Error::NonEmptyDelegate`] when the backing already holds
    /// occurrences the wrapper did not see being added.
    pub fn try_wrap_empty(
        delegate: impl MultisetLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Result<Self> {
        let len = delegate.len();
        if len != 0 {
            return Err(Error::NonEmptyDelegate { len });
        }
        Ok(Self::wrap_with(delegate, mutex))
    }

    /// The lock token guarding this multiset.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.inner.cell.mutex())
    }

    /// Whether two handles refer to the same guarded multiset.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Total number of occurrences, under the lock.
    pub fn len(&self) -> usize {
        self.inner.cell.with(|d| d.len())
    }

    /// Whether the multiset holds no occurrences, under the lock.
    pub fn is_empty(&self) -> bool {
        self.inner.cell.with(|d| d.is_empty())
    }

    /// Membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool {
        self.inner.cell.with(|d| d.contains(item))
    }

    /// Number of occurrences of `item`, under the lock.
    pub fn count(&self, item: &E) -> usize {
        self.inner.cell.with(|d| d.count(item))
    }

    /// Add one occurrence, under the lock.
    pub fn insert(&self, item: E) -> bool {
        self.inner.cell.with(|d| d.insert(item))
    }

    /// Add every listed occurrence under one acquisition.
    pub fn insert_all(&self, items: Vec<E>) -> bool {
        self.inner.cell.with(|d| d.insert_all(items))
    }

    /// Remove one occurrence of `item`, under the lock.
    pub fn remove(&self, item: &E) -> bool {
        self.inner.cell.with(|d| d.remove(item))
    }

    /// Remove every occurrence of every listed element under one
    /// acquisition.
    pub fn remove_all(&self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        self.inner.cell.with(|d| d.remove_all(items))
    }

    /// Keep only elements for which `keep` returns true, dropping all
    /// occurrences of the rest, under one acquisition.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) {
        self.inner.cell.with(|d| d.retain(&mut keep))
    }

    /// Add `n` occurrences; returns the count before the addition.
    pub fn add_count(&self, item: E, n: usize) -> usize {
        self.inner.cell.with(|d| d.add_count(item, n))
    }

    /// Remove up to `n` occurrences; returns the count before the removal.
    pub fn remove_count(&self, item: &E, n: usize) -> usize {
        self.inner.cell.with(|d| d.remove_count(item, n))
    }

    /// Set the count of `item` to `n`; returns the count before the change.
    pub fn set_count(&self, item: E, n: usize) -> usize {
        self.inner.cell.with(|d| d.set_count(item, n))
    }

    /// Set the count of `item` to `n` only if the current count is
    /// `expected`. The comparison and the update happen under one
    /// acquisition.
    pub fn try_set_count(&self, item: E, expected: usize, n: usize) -> bool {
        self.inner.cell.with(|d| d.try_set_count(item, expected, n))
    }

    /// Remove every occurrence, under the lock.
    pub fn clear(&self) {
        self.inner.cell.with(|d| d.clear())
    }

    /// Owned projection of the distinct elements, under one acquisition.
    pub fn distinct_vec(&self) -> Vec<E> {
        self.inner.cell.with(|d| d.distinct_vec())
    }

    /// Number of distinct elements, under the lock.
    pub fn distinct_len(&self) -> usize {
        self.inner.cell.with(|d| d.distinct_len())
    }

    /// Owned projection of `(element, count)` pairs, under one acquisition.
    pub fn counted_entries(&self) -> Vec<(E, usize)> {
        self.inner.cell.with(|d| d.counted_entries())
    }

    /// Owned projection of every occurrence, under one acquisition.
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.cell.with(|d| d.to_vec())
    }

    /// Snapshot iterator over every occurrence.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }

    /// Visit every occurrence under a single acquisition.
    pub fn for_each(&self, mut f: impl FnMut(&E)) {
        self.inner.cell.with(|d| {
            for item in d.to_vec() {
                f(&item);
            }
        })
    }

    /// Run a compound operation against the delegate under one acquisition.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn MultisetLike<E> + 'static)) -> R) -> R {
        self.inner.cell.with(f)
    }

    /// The lazy element-set view; first call materializes it under the lock.
    pub fn element_set(&self) -> MultisetElements<E> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.elements, "element_set");
        MultisetElements {
            parent: self.clone(),
            identity,
        }
    }

    /// The lazy counted-entry view; first call materializes it under the
    /// lock.
    pub fn entry_set(&self) -> MultisetEntries<E> {
        let identity = materialize_slot(&self.inner.cell, &self.inner.entries, "entry_set");
        MultisetEntries {
            parent: self.clone(),
            identity,
        }
    }
}

impl<E> Clone for GuardedMultiset<E> {
    fn clone(&self) -> Self {
        GuardedMultiset {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for GuardedMultiset<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedMultiset")
            .field("counts", &self.counted_entries())
            .finish()
    }
}

impl<E: PartialEq + 'static> PartialEq for GuardedMultiset<E> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        unordered_eq(&self.counted_entries(), &other.counted_entries())
    }
}

impl<E: Serialize + 'static> Serialize for GuardedMultiset<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

/// Live element-set view of a guarded multiset: one entry per distinct
/// element, with set semantics.
///
/// Removal through the view drops every occurrence of the element.
pub struct MultisetElements<E> {
    parent: GuardedMultiset<E>,
    identity: Arc<ViewIdentity>,
}

impl<E: 'static> MultisetElements<E> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of distinct elements, under the lock.
    pub fn len(&self) -> usize {
        self.parent.distinct_len()
    }

    /// Whether the view holds no elements, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool {
        self.parent.contains(item)
    }

    /// Unsupported: an element cannot be added through the element-set view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _item: E) -> bool {
        panic!("element-set views do not support insertion");
    }

    /// Drop every occurrence of `item` from the parent multiset.
    pub fn remove(&self, item: &E) -> bool {
        self.parent
            .inner
            .cell
            .with(|d| d.remove_count(item, usize::MAX) > 0)
    }

    /// Remove every occurrence of every element from the parent multiset.
    pub fn clear(&self) {
        self.parent.clear()
    }

    /// Owned projection of the distinct elements.
    pub fn to_vec(&self) -> Vec<E> {
        self.parent.distinct_vec()
    }

    /// Snapshot iterator over the distinct elements.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }
}

impl<E> Clone for MultisetElements<E> {
    fn clone(&self) -> Self {
        MultisetElements {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for MultisetElements<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisetElements")
            .field("elements", &self.to_vec())
            .finish()
    }
}

/// Live counted-entry view of a guarded multiset: `(element, count)` pairs.
pub struct MultisetEntries<E> {
    parent: GuardedMultiset<E>,
    identity: Arc<ViewIdentity>,
}

impl<E: 'static> MultisetEntries<E> {
    /// Whether two handles refer to the same cached view.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.identity, &b.identity)
    }

    /// Number of distinct entries, under the lock.
    pub fn len(&self) -> usize {
        self.parent.distinct_len()
    }

    /// Whether the view holds no entries, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `item` currently occurs exactly `count` times.
    pub fn contains(&self, item: &E, count: usize) -> bool {
        count > 0 && self.parent.count(item) == count
    }

    /// Unsupported: an entry cannot be added through the entry view.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn insert(&self, _item: E, _count: usize) -> bool {
        panic!("counted-entry views do not support insertion");
    }

    /// Remove the exact `(item, count)` entry: drops every occurrence, but
    /// only when the current count matches.
    pub fn remove(&self, item: &E, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        self.parent.inner.cell.with(|d| {
            if d.count(item) != count {
                return false;
            }
            d.remove_count(item, count);
            true
        })
    }

    /// Remove every occurrence of every element from the parent multiset.
    pub fn clear(&self) {
        self.parent.clear()
    }

    /// Owned projection of the `(element, count)` pairs.
    pub fn to_vec(&self) -> Vec<(E, usize)> {
        self.parent.counted_entries()
    }

    /// Snapshot iterator over the `(element, count)` pairs.
    pub fn iter(&self) -> Iter<(E, usize)> {
        Iter::new(self.to_vec())
    }
}

impl<E> Clone for MultisetEntries<E> {
    fn clone(&self) -> Self {
        MultisetEntries {
            parent: self.parent.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for MultisetEntries<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultisetEntries")
            .field("entries", &self.to_vec())
            .finish()
    }
}
