//! Guarded wrapper for lists, with positional access and sub-list views.
//!
//! `GuardedList` resolves its random-access marker once at wrap time from
//! the delegate's reported capability; the flag never changes and is never
//! re-checked per call. [`SubList`] is a live window view with fixed offsets
//! clamped to the parent's current length.

use crate::capability::Capability;
use crate::collection::Iter;
use crate::guard::GuardCell;
use crate::identity::MutexIdentity;
use crate::interfaces::ListLike;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A list guarded by a mutex identity.
pub struct GuardedList<E> {
    cell: Arc<GuardCell<dyn ListLike<E>>>,
    random_access: bool,
}

impl<E: 'static> GuardedList<E> {
    /// Wrap `delegate` with a fresh mutex identity.
    pub fn wrap(delegate: impl ListLike<E> + 'static) -> Self {
        Self::wrap_with(delegate, None)
    }

    /// Wrap `delegate`, sharing `mutex` when one is supplied.
    pub fn wrap_with(delegate: impl ListLike<E> + 'static, mutex: Option<Arc<MutexIdentity>>) -> Self {
        let random_access = delegate.capability() == Capability::RandomAccessList;
        tracing::trace!(random_access, "wrapped list root");
        GuardedList {
            cell: Arc::new(GuardCell::new(Box::new(delegate), mutex)),
            random_access,
        }
    }

    /// Whether the backing list reported cheap positional access at wrap
    /// time.
    pub fn is_random_access(&self) -> bool {
        self.random_access
    }

    /// The lock token guarding this list.
    pub fn mutex_identity(&self) -> Arc<MutexIdentity> {
        Arc::clone(self.cell.mutex())
    }

    /// Whether two handles refer to the same guarded list.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.cell, &b.cell)
    }

    /// Number of elements, under the lock.
    pub fn len(&self) -> usize {
        self.cell.with(|d| d.len())
    }

    /// Whether the list holds no elements, under the lock.
    pub fn is_empty(&self) -> bool {
        self.cell.with(|d| d.is_empty())
    }

    /// Membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool {
        self.cell.with(|d| d.contains(item))
    }

    /// Append one element, under the lock.
    pub fn insert(&self, item: E) -> bool {
        self.cell.with(|d| d.insert(item))
    }

    /// Append every element under one acquisition.
    pub fn insert_all(&self, items: Vec<E>) -> bool {
        self.cell.with(|d| d.insert_all(items))
    }

    /// Remove the first occurrence of `item`, under the lock.
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

    /// Keep only elements for which `keep` returns true, under one
    /// acquisition.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) {
        self.cell.with(|d| d.retain(&mut keep))
    }

    /// Remove every element, under the lock.
    pub fn clear(&self) {
        self.cell.with(|d| d.clear())
    }

    /// Element at `index`, under the lock.
    pub fn get_at(&self, index: usize) -> Option<E> {
        self.cell.with(|d| d.get_at(index))
    }

    /// Replace the element at `index`, returning the previous element.
    pub fn set_at(&self, index: usize, item: E) -> Option<E> {
        self.cell.with(|d| d.set_at(index, item))
    }

    /// Insert at `index`, shifting later elements; false when the index is
    /// past the end.
    pub fn insert_at(&self, index: usize, item: E) -> bool {
        self.cell.with(|d| d.insert_at(index, item))
    }

    /// Remove and return the element at `index`, under the lock.
    pub fn remove_at(&self, index: usize) -> Option<E> {
        self.cell.with(|d| d.remove_at(index))
    }

    /// First position of `item`, under the lock.
    pub fn index_of(&self, item: &E) -> Option<usize> {
        self.cell.with(|d| d.index_of(item))
    }

    /// Last position of `item`, under the lock.
    pub fn last_index_of(&self, item: &E) -> Option<usize> {
        self.cell.with(|d| d.last_index_of(item))
    }

    /// Owned projection of the current elements, under one acquisition.
    pub fn to_vec(&self) -> Vec<E> {
        self.cell.with(|d| d.to_vec())
    }

    /// Snapshot iterator in list order.
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
    pub fn with_delegate<R>(&self, f: impl FnOnce(&mut (dyn ListLike<E> + 'static)) -> R) -> R {
        self.cell.with(f)
    }

    /// Live window view over `[start, end)`, sharing this list's lock.
    ///
    /// The offsets are fixed; each operation clamps the window's end to the
    /// parent's current length.
    pub fn sub_list(&self, start: usize, end: usize) -> SubList<E> {
        SubList {
            parent: self.clone(),
            start,
            end,
        }
    }
}

impl<E> Clone for GuardedList<E> {
    fn clone(&self) -> Self {
        GuardedList {
            cell: Arc::clone(&self.cell),
            random_access: self.random_access,
        }
    }
}

impl<E: fmt::Debug + 'static> fmt::Debug for GuardedList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedList")
            .field("items", &self.to_vec())
            .field("random_access", &self.random_access)
            .finish()
    }
}

impl<E: PartialEq + 'static> PartialEq for GuardedList<E> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        self.to_vec() == other.to_vec()
    }
}

impl<E: Serialize + 'static> Serialize for GuardedList<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_vec())
    }
}

/// A live window view of a [`GuardedList`].
///
/// Window offsets are fixed at creation; the effective end clamps to the
/// live parent length at each call. Every operation is one scoped
/// acquisition against the parent.
#[derive(Clone)]
pub struct SubList<E> {
    parent: GuardedList<E>,
    start: usize,
    end: usize,
}

impl<E: 'static> SubList<E> {
    fn window(&self, parent_len: usize) -> std::ops::Range<usize> {
        let end = self.end.min(parent_len);
        let start = self.start.min(end);
        start..end
    }

    /// Number of elements inside the window, under the lock.
    pub fn len(&self) -> usize {
        self.parent.cell.with(|d| self.window(d.len()).len())
    }

    /// Whether the window holds no elements, under the lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at window-relative `index`, under the lock.
    pub fn get_at(&self, index: usize) -> Option<E> {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            let absolute = window.start.checked_add(index)?;
            if window.contains(&absolute) {
                d.get_at(absolute)
            } else {
                None
            }
        })
    }

    /// Replace the element at window-relative `index`, returning the
    /// previous element.
    pub fn set_at(&self, index: usize, item: E) -> Option<E> {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            let absolute = window.start.checked_add(index)?;
            if window.contains(&absolute) {
                d.set_at(absolute, item)
            } else {
                None
            }
        })
    }

    /// Insert at window-relative `index`, shifting later parent elements;
    /// false when the index is past the window's end.
    pub fn insert_at(&self, index: usize, item: E) -> bool {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            if index > window.len() {
                return false;
            }
            d.insert_at(window.start + index, item)
        })
    }

    /// Remove and return the element at window-relative `index`.
    pub fn remove_at(&self, index: usize) -> Option<E> {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            let absolute = window.start.checked_add(index)?;
            if window.contains(&absolute) {
                d.remove_at(absolute)
            } else {
                None
            }
        })
    }

    /// Append to the end of the window (inserting into the parent there).
    pub fn insert(&self, item: E) -> bool {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            d.insert_at(window.end, item)
        })
    }

    /// Remove the first in-window occurrence of `item`.
    pub fn remove(&self, item: &E) -> bool
    where
        E: PartialEq,
    {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            let items = d.to_vec();
            for absolute in window {
                if items[absolute] == *item {
                    d.remove_at(absolute);
                    return true;
                }
            }
            false
        })
    }

    /// In-window membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool
    where
        E: PartialEq,
    {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            d.to_vec()[window].contains(item)
        })
    }

    /// Window-relative first position of `item`.
    pub fn index_of(&self, item: &E) -> Option<usize>
    where
        E: PartialEq,
    {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            d.to_vec()[window].iter().position(|e| e == item)
        })
    }

    /// Window-relative last position of `item`.
    pub fn last_index_of(&self, item: &E) -> Option<usize>
    where
        E: PartialEq,
    {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            d.to_vec()[window].iter().rposition(|e| e == item)
        })
    }

    /// Remove every in-window element under one acquisition.
    pub fn clear(&self) {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            for _ in window.clone() {
                d.remove_at(window.start);
            }
        })
    }

    /// Owned projection of the in-window elements.
    pub fn to_vec(&self) -> Vec<E> {
        self.parent.cell.with(|d| {
            let window = self.window(d.len());
            let mut items = d.to_vec();
            items.truncate(window.end);
            items.split_off(window.start)
        })
    }

    /// Snapshot iterator over the in-window elements.
    pub fn iter(&self) -> Iter<E> {
        Iter::new(self.to_vec())
    }
}
