//! Guarded wrapper for generic collections.
//!
//! `GuardedCollection` is the base of the wrapper family: it owns a
//! [`GuardCell`] around a `dyn CollectionLike` delegate and forwards every
//! operation as a single scoped acquisition. The more specific wrappers
//! (sets, lists, maps) follow the same shape and add their family's surface.
//!
//! # Thread Safety
//!
//! Every method acquires the graph mutex for exactly the duration of one
//! delegate call. [`GuardedCollection::iter`] is the documented exception:
//! it takes a point-in-time projection under the lock and traverses it
//! afterwards without the lock, so concurrent mutation is neither blocked
//! nor reflected mid-traversal. Use [`GuardedCollection::for_each`] or
//! [`GuardedCollection::with_delegate`] to traverse under the lock.

use crate::guard::GuardCell;
use crate::identity::MutexIdentity;
use crate::interfaces::CollectionLike;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Compare two projections as unordered multisets.
pub(crate) fn unordered_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut unmatched: Vec<&T> = b.iter().collect();
    for item in a {
        match unmatched.iter().position(|candidate| **candidate == *item) {
            Some(index) => {
                unmatched.swap_remove(index);
            }
            None => return false,
        }
    }
    true
}

/// Snapshot iterator over a guarded structure.
///
/// Holds no lock: the elements were projected out under one momentary
/// acquisition and are traversed independently of the live structure.
#[derive(Debug)]
pub struct Iter<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> Iter<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Iter {
            items: items.into_iter(),
        }
    }
}

impl<T> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.items.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<T> {}

/// A collection guarded by a mutex identity.
///
/// Cloning produces another handle to the same guarded collection; the
/// delegate and the lock are shared.
pub struct GuardedCollection<E> {
    cell: Arc<GuardCell<dyn CollectionLike<E>>>,
}

impl<E: 'static> GuardedCollection<E> {
    /// Wrap `delegate` with a fresh mutex identity.
    ///
    /// The caller must not touch `delegate` through any other path after
    /// wrapping; the wrapper is the sole entry point from here on.
    pub fn wrap(delegate: impl CollectionLike<E> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl CollectionLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!(capability = ?delegate.capability(), "wrapped collection root");
        GuardedCollection {
            cell: Arc::new(GuardCell::new(Box::new(delegate), mutex)),
        }
    }

    /// The lock token guarding this collection, for sharing with other roots.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.cell.mutex())
    }

    /// Whether two handles refer to the same guarded collection.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Number of elements, under the lock.
    pub fn len(&self) -> usize {
        self.cell.with(|d| d.len())
    }

    /// Whether the collection holds no elements, under the lock.
    pub fn is_empty(&self) -> bool {
        self.cell.with(|d| d.is_empty())
    }

    /// Membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool {
        self.cell.with(|d| d.contains(item))
    }

    /// Add one element, under the lock.
    pub fn insert(&self, item: E) -> bool {
        self.cell.with(|d| d.insert(item))
    }

    /// Add every element under one acquisition.
    pub fn insert_all(&self, items: Vec<E>) -> bool {
        self.cell.with(|d| d.insert_all(items))
    }

    /// Remove one occurrence of `item`, under the lock.
    pub fn remove(&self, item: &E) -> bool {
        self.cell.with(|d| d.remove(item))
    }

    /// Remove every occurrence of every listed element under one acquisition.
    pub fn remove_all(&self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        self.cell.with(|d| d.remove_all(items))
    }

    /// Keep only the listed elements, under one acquisition.
    pub fn retain_all(&self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        self.cell.with(|d| d.retain_all(items))
    }

    /// Keep only elements for which `keep` returns true, under one
    /// acquisition.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) {
        self.cell.with(|d| d.retain(&mut keep))
    }

    /// Remove every element, under the lock.
    pub fn clear(&self) {
        self.cell.with(|d| d.clear())
    }

    /// Owned projection of the current elements, under one acquisition.
    pub fn to_vec(&self) -> Vec<E> {
        self.cell.with(|d| d.to_vec())
    }

    /// Snapshot iterator: projects the elements under one momentary
    /// acquisition, then traverses without the lock.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }

    /// Visit every element under a single acquisition.
    pub fn for_each(&self, mut f: impl FnMut(&E)) {
        self.cell.with(|d| {
            for item in d.to_vec() {
                f(&item);
            }
        })
    }

    /// Run a compound operation against the delegate under one acquisition.
    ///
    /// This is the escape hatch for multi-step operations that must not
    /// interleave with other threads (check-then-act sequences and the like).
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn CollectionLike<E> + 'static)) -> R) -> R {
        self.cell.with(f)
    }
}

impl<E> Clone for GuardedCollection<E> {
    fn clone(&self) -> Self {
        GuardedCollection {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for GuardedCollection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.to_vec();
        f.debug_struct("GuardedCollection")
            .field("items", &items)
            .finish()
    }
}

impl<E: PartialEq + 'static> PartialEq for GuardedCollection<E> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        // Sequential, never nested, acquisitions.
        unordered_eq(&self.to_vec(), &other.to_vec())
    }
}

impl<E: Serialize + 'static> Serialize for GuardedCollection<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_mutate() {
        let col = GuardedCollection::wrap(Vec::<i32>::new());
        assert!(col.is_empty());
        assert!(col.insert(1));
        assert!(col.insert_all(vec![2, 3]));
        assert_eq!(col.len(), 3);
        assert!(col.contains(&2));
        assert!(col.remove(&2));
        assert!(!col.contains(&2));
    }

    #[test]
    fn test_clone_shares_state() {
        let a = GuardedCollection::wrap(Vec::new());
        let b = a.clone();
        a.insert("x");
        assert_eq!(b.len(), 1);
        assert!(GuardedCollection::ptr_eq(&a, &b));
    }

    #[test]
    fn test_bulk_operations() {
        let col = GuardedCollection::wrap(vec![1, 2, 3, 4]);
        assert!(col.remove_all(&[2, 4]));
        assert_eq!(col.to_vec(), vec![1, 3]);
        assert!(col.retain_all(&[3]));
        assert_eq!(col.to_vec(), vec![3]);
        col.retain(|_| false);
        assert!(col.is_empty());
    }

    #[test]
    fn test_iter_is_a_snapshot() {
        let col = GuardedCollection::wrap(vec![1, 2, 3]);
        let iter = col.iter();
        col.clear();
        assert_eq!(iter.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_for_each_under_lock() {
        let col = GuardedCollection::wrap(vec![1, 2, 3]);
        let mut sum = 0;
        col.for_each(|e| sum += e);
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_with_delegate_compound_op() {
        let col = GuardedCollection::wrap(vec![1, 2, 3]);
        // Check-then-act without interleaving.
        let inserted = col.with_delegate(|d| {
            if !d.contains(&4) {
                d.insert(4)
            } else {
                false
            }
        });
        assert!(inserted);
        assert_eq!(col.len(), 4);
    }

    #[test]
    fn test_equality() {
        let a = GuardedCollection::wrap(vec![1, 2, 2]);
        let b = GuardedCollection::wrap(vec![2, 1, 2]);
        let c = GuardedCollection::wrap(vec![1, 2]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_unordered_eq_counts_duplicates() {
        assert!(unordered_eq(&[1, 1, 2], &[2, 1, 1]));
        assert!(!unordered_eq(&[1, 1, 2], &[1, 2, 2]));
        assert!(!unordered_eq(&[1], &[1, 1]));
    }

    #[test]
    fn test_serialize_snapshot() {
        let col = GuardedCollection::wrap(vec![1, 2, 3]);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_debug_shows_items() {
        let col = GuardedCollection::wrap(vec![7]);
        assert!(format!("{:?}", col).contains('7'));
    }
}
