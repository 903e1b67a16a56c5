//! Guarded wrappers for sets and ordered sets.
//!
//! `GuardedSet` is the set-semantics counterpart of
//! [`GuardedCollection`](crate::collection::GuardedCollection);
//! `GuardedOrderedSet` adds `Ord` navigation and [`RangedSet`], a live
//! sub-range view sharing the parent's lock.
//!
//! # Thread Safety
//!
//! Same model as the collection wrapper: one scoped acquisition per public
//! call. A `RangedSet` operation acquires the graph mutex exactly once and
//! re-enters the parent delegate under it.

use crate::collection::{unordered_eq, Iter};
use crate::guard::GuardCell;
use crate::identity::MutexIdentity;
use crate::interfaces::{Bounds, OrderedSetLike, SetLike};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A set guarded by a mutex identity.
pub struct GuardedSet<E> {
    cell: Arc<GuardCell<dyn SetLike<E>>>,
}

impl<E: 'static> GuardedSet<E> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl SetLike<E> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(delegate: impl SetLike<E> + 'static, mutex: Option<Arc<MutexIdentity>>) -> Self {
        tracing::trace!(capability = ?delegate.capability(), "wrapped set root");
        GuardedSet {
            cell: Arc::new(GuardCell::new(Box::new(delegate), mutex)),
        }
    }

    /// The lock token guarding this set.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.cell.mutex())
    }

    /// Whether two handles refer to the same guarded set.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Number of elements, under the lock.
    pub fn len(&self) -> usize {
        self.cell.with(|d| d.len())
    }

    /// Whether the set holds no elements, under the lock.
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

    /// Remove `item`, under the lock.
    pub fn remove(&self, item: &E) -> bool {
        self.cell.with(|d| d.remove(item))
    }

    /// Remove every listed element under one acquisition.
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

    /// Snapshot iterator (projection taken under one momentary acquisition).
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
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn SetLike<E> + 'static)) -> R) -> R {
        self.cell.with(f)
    }
}

impl<E> Clone for GuardedSet<E> {
    fn clone(&self) -> Self {
        GuardedSet {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for GuardedSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedSet")
            .field("items", &self.to_vec())
            .finish()
    }
}

impl<E: PartialEq + 'static> PartialEq for GuardedSet<E> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        unordered_eq(&self.to_vec(), &other.to_vec())
    }
}

impl<E: Serialize + 'static> Serialize for GuardedSet<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

/// An ordered set guarded by a mutex identity.
///
/// Adds navigation over the set surface and [`GuardedOrderedSet::range`] for
/// live sub-range views.
pub struct GuardedOrderedSet<E> {
    cell: Arc<GuardCell<dyn OrderedSetLike<E>>>,
}

impl<E: 'static> GuardedOrderedSet<E> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl OrderedSetLike<E> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(
        delegate: impl OrderedSetLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        tracing::trace!(capability = ?delegate.capability(), "wrapped ordered set root");
        GuardedOrderedSet {
            cell: Arc::new(GuardCell::new(Box::new(delegate), mutex)),
        }
    }

    /// The lock token guarding this set.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.cell.mutex())
    }

    /// Whether two handles refer to the same guarded set.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Number of elements, under the lock.
    pub fn len(&self) -> usize {
        self.cell.with(|d| d.len())
    }

    /// Whether the set holds no elements, under the lock.
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

    /// Remove `item`, under the lock.
    pub fn remove(&self, item: &E) -> bool {
        self.cell.with(|d| d.remove(item))
    }

    /// Remove every listed element under one acquisition.
    pub fn remove_all(&self, items: &[E]) -> bool
    where
        E: PartialEq,
    {
        self.cell.with(|d| d.remove_all(items))
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

    /// Smallest element, under the lock.
    pub fn first(&self) -> Option<E> {
        self.cell.with(|d| d.first())
    }

    /// Largest element, under the lock.
    pub fn last(&self) -> Option<E> {
        self.cell.with(|d| d.last())
    }

    /// Owned in-order projection of the elements inside `bounds`.
    pub fn range_vec(&self, bounds: &Bounds<E>) -> Vec<E> {
        self.cell.with(|d| d.range_vec(bounds))
    }

    /// Owned in-order projection of all elements, under one acquisition.
    pub fn to_vec(&self) -> Vec<E> {
        self.cell.with(|d| d.to_vec())
    }

    /// Snapshot iterator in element order.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }

    /// Live sub-range view sharing this set's lock.
    ///
    /// The view reflects the parent at each call; it is never a snapshot.
    pub fn range(&self, bounds: Bounds<E>) -> RangedSet<E> {
        RangedSet {
            parent: self.clone(),
            bounds,
        }
    }

    /// Run a compound operation against the delegate under one acquisition.
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn OrderedSetLike<E> + 'static)) -> R) -> R {
        self.cell.with(f)
    }
}

impl<E> Clone for GuardedOrderedSet<E> {
    fn clone(&self) -> Self {
        GuardedOrderedSet {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for GuardedOrderedSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedOrderedSet")
            .field("items", &self.to_vec())
            .finish()
    }
}

impl<E: PartialEq + 'static> PartialEq for GuardedOrderedSet<E> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        // Ordered projections compare positionally.
        self.to_vec() == other.to_vec()
    }
}

impl<E: Serialize + 'static> Serialize for GuardedOrderedSet<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

/// A live sub-range view of a [`GuardedOrderedSet`].
///
/// Shares the parent's mutex identity; every operation is one scoped
/// acquisition against the live parent.
#[derive(Clone)]
pub struct RangedSet<E> {
    parent: GuardedOrderedSet<E>,
    bounds: Bounds<E>,
}

impl<E: Ord + 'static> RangedSet<E> {
    /// The range this view projects.
    pub fn bounds(&self) -> &Bounds<E> {
        &self.bounds
    }

    /// Number of in-range elements, under the lock.
    pub fn len(&self) -> usize {
        let bounds = &self.bounds;
        self.parent.cell.with(|d| d.range_len(bounds))
    }

    /// Whether the range holds no elements, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test; out-of-range items are never present.
    pub fn contains(&self, item: &E) -> bool {
        self.bounds.contains(item) && self.parent.contains(item)
    }

    /// Add one element to the parent through the view.
    ///
    /// # Panics
    ///
    /// Panics when `item` falls outside the view's range.
    pub fn insert(&self, item: E) -> bool {
        assert!(
            self.bounds.contains(&item),
            "element out of range for ranged set view"
        );
        self.parent.insert(item)
    }

    /// Remove `item` when it is inside the range; out-of-range items are
    /// left alone.
    pub fn remove(&self, item: &E) -> bool {
        self.bounds.contains(item) && self.parent.remove(item)
    }

    /// Remove every in-range element under one acquisition.
    pub fn clear(&self) {
        let bounds = &self.bounds;
        self.parent.cell.with(|d| {
            for item in d.range_vec(bounds) {
                d.remove(&item);
            }
        })
    }

    /// Smallest in-range element, under the lock.
    pub fn first(&self) -> Option<E> {
        let bounds = &self.bounds;
        self.parent
            .cell
            .with(|d| d.range_vec(bounds).into_iter().next())
    }

    /// Largest in-range element, under the lock.
    pub fn last(&self) -> Option<E> {
        let bounds = &self.bounds;
        self.parent
            .cell
            .with(|d| d.range_vec(bounds).into_iter().next_back())
    }

    /// Owned in-order projection of the in-range elements.
    pub fn to_vec(&self) -> Vec<E> {
        self.parent.range_vec(&self.bounds)
    }

    /// Snapshot iterator over the in-range elements, in order.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }

    /// Narrow the view further; the result covers the overlap of the two
    /// ranges.
    pub fn range(&self, bounds: Bounds<E>) -> RangedSet<E>
    where
        E: Clone,
    {
        RangedSet {
            parent: self.parent.clone(),
            bounds: self.bounds.intersect(&bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_set_deduplicates() {
        let set = GuardedSet::wrap(HashSet::new());
        assert!(set.insert(1));
        assert!(!set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ordered_navigation() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([5, 1, 3]));
        assert_eq!(set.first(), Some(1));
        assert_eq!(set.last(), Some(5));
        assert_eq!(set.to_vec(), vec![1, 3, 5]);
        assert_eq!(set.range_vec(&Bounds::range(2, 5)), vec![3]);
    }

    #[test]
    fn test_ranged_view_is_live() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([1, 5]));
        let mid = set.range(Bounds::range(2, 9));
        assert_eq!(mid.to_vec(), vec![5]);
        // Mutation through the parent is visible through the view.
        set.insert(4);
        assert_eq!(mid.to_vec(), vec![4, 5]);
        assert_eq!(mid.len(), 2);
        assert_eq!(mid.first(), Some(4));
        assert_eq!(mid.last(), Some(5));
    }

    #[test]
    fn test_ranged_view_mutates_parent() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([1, 3, 5]));
        let mid = set.range(Bounds::range(2, 4));
        assert!(mid.insert(2));
        assert!(set.contains(&2));
        assert!(mid.remove(&3));
        assert!(!set.contains(&3));
        // Out-of-range removal through the view leaves the parent alone.
        assert!(!mid.remove(&5));
        assert!(set.contains(&5));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_ranged_insert_out_of_range_panics() {
        let set = GuardedOrderedSet::wrap(BTreeSet::<i32>::new());
        set.range(Bounds::range(2, 4)).insert(9);
    }

    #[test]
    fn test_ranged_clear_spares_out_of_range() {
        let set = GuardedOrderedSet::wrap(BTreeSet::from([1, 3, 5]));
        set.range(Bounds::range(2, 4)).clear();
        assert_eq!(set.to_vec(), vec![1, 5]);
    }

    #[test]
    fn test_nested_range_narrows() {
        let set = GuardedOrderedSet::wrap((0..10).collect::<BTreeSet<_>>());
        let narrowed = set.range(Bounds::range(2, 8)).range(Bounds::range(5, 20));
        assert_eq!(narrowed.to_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn test_view_shares_mutex_identity() {
        let set = GuardedOrderedSet::wrap(BTreeSet::<i32>::new());
        let view = set.range(Bounds::tail(0));
        assert!(Arc::ptr_eq(
            &set.mutex_identity(),
            &view.parent.mutex_identity()
        ));
    }

    #[test]
    fn test_ordered_equality_is_positional() {
        let a = GuardedOrderedSet::wrap(BTreeSet::from([1, 2]));
        let b = GuardedOrderedSet::wrap(BTreeSet::from([2, 1]));
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::json!([1, 2]));
    }
}
