//! The guarded core: a backing delegate paired with a mutex identity.
//!
//! `GuardCell` is the single primitive every wrapper method is built on:
//! *scoped acquisition* runs one operation against the live delegate while
//! holding the graph lock, with release guaranteed on every exit path
//! (normal return or panic unwind).
//!
//! # Design
//!
//! The graph lock (the [`MutexIdentity`]) and the delegate cell are separate
//! mutexes. The cell mutex is only ever taken while the graph lock is held,
//! so it never contends; it exists so that independently constructed roots
//! can share one graph lock while each owning their own delegate, without
//! any `unsafe` cell access.
//!
//! View wrappers re-enter their parent's cell through [`GuardCell::with_unlocked`]
//! while the public operation already holds the graph lock; the acquisition
//! therefore happens exactly once per public call no matter how deep the
//! view chain is.

use crate::identity::MutexIdentity;
use parking_lot::Mutex;
use std::sync::Arc;

/// Identity token for a lazily materialized view.
///
/// View accessors cache one `Arc<ViewIdentity>` per slot and hand out view
/// handles carrying clones of it, so callers can observe that repeated
/// accessor calls yield the same logical view.
#[derive(Debug)]
pub(crate) struct ViewIdentity;

/// Materialize a lazy view slot. The slot transition from empty to ready
/// only ever happens while the graph mutex is held.
pub(crate) fn materialize_slot<T: ?Sized>(
    cell: &GuardCell<T>,
    slot: &once_cell::sync::OnceCell<Arc<ViewIdentity>>,
    view: &'static str,
) -> Arc<ViewIdentity> {
    let _graph = cell.mutex().acquire();
    Arc::clone(slot.get_or_init(|| {
        tracing::trace!(view, "materialized lazy view");
        Arc::new(ViewIdentity)
    }))
}

/// A backing delegate guarded by a shared mutex identity.
///
/// `T` is typically a capability trait object (`dyn MapLike<K, V>` etc.);
/// the box is the root's owned delegate or a view's live projection of its
/// parent.
pub(crate) struct GuardCell<T: ?Sized> {
    mutex: Arc<MutexIdentity>,
    cell: Mutex<Box<T>>,
}

impl<T: ?Sized> GuardCell<T> {
    /// Pair a delegate with a mutex identity, minting a fresh identity when
    /// the caller supplies none.
    pub(crate) fn new(delegate: Box<T>, mutex: Option<Arc<MutexIdentity>>) -> Self {
        GuardCell {
            mutex: mutex.unwrap_or_else(|| Arc::new(MutexIdentity::new())),
            cell: Mutex::new(delegate),
        }
    }

    /// The graph lock shared by every wrapper derived from this cell.
    pub(crate) fn mutex(&self) -> &Arc<MutexIdentity> {
        &self.mutex
    }

    /// Scoped acquisition: run `f` against the delegate under the graph lock.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _graph = self.mutex.acquire();
        let mut delegate = self.cell.lock();
        f(&mut **delegate)
    }

    /// Run `f` against the delegate without acquiring the graph lock.
    ///
    /// Callers must already hold the graph lock; this is the re-entry path
    /// used by view delegates while a public operation's scoped acquisition
    /// is in progress.
    pub(crate) fn with_unlocked<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut delegate = self.cell.lock();
        f(&mut **delegate)
    }
}

impl<T: ?Sized> std::fmt::Debug for GuardCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardCell").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_acquisition_returns_value() {
        let cell: GuardCell<Vec<i32>> = GuardCell::new(Box::new(vec![1, 2, 3]), None);
        let sum: i32 = cell.with(|v| v.iter().sum());
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_mutation_is_visible_to_later_calls() {
        let cell: GuardCell<Vec<i32>> = GuardCell::new(Box::new(Vec::new()), None);
        cell.with(|v| v.push(7));
        assert_eq!(cell.with(|v| v.len()), 1);
    }

    #[test]
    fn test_shared_identity() {
        let id = Arc::new(MutexIdentity::new());
        let a: GuardCell<Vec<i32>> = GuardCell::new(Box::new(Vec::new()), Some(Arc::clone(&id)));
        let b: GuardCell<Vec<i32>> = GuardCell::new(Box::new(Vec::new()), Some(Arc::clone(&id)));
        assert!(Arc::ptr_eq(a.mutex(), b.mutex()));
    }

    #[test]
    fn test_lock_released_after_panic() {
        let cell: Arc<GuardCell<Vec<i32>>> = Arc::new(GuardCell::new(Box::new(Vec::new()), None));
        let panicking = Arc::clone(&cell);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            panicking.with(|_| panic!("delegate failure"));
        }));
        assert!(result.is_err());
        // A subsequent scoped acquisition must not block.
        assert_eq!(cell.with(|v| v.len()), 0);
    }
}
