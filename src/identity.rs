//! The mutex identity: the single lock token shared by a wrapper graph.
//!
//! Every wrapper derived from one root holds a clone of the same
//! `Arc<MutexIdentity>`, so all guarded operations on the graph are totally
//! ordered by acquisition of this one lock. Identity is `Arc` identity:
//! two tokens are the same lock exactly when `Arc::ptr_eq` says so.
//!
//! Two independently built graphs may share a token (pass the first graph's
//! token to the second graph's constructor) and thereby serialize against
//! each other. No lock-ordering scheme is provided across graphs with
//! distinct tokens; composing such graphs is the caller's responsibility.

use parking_lot::{Mutex, MutexGuard};

/// Opaque lock token for a wrapper graph.
///
/// Constructed implicitly when a root wrapper is built without an explicit
/// token, or explicitly via [`MutexIdentity::new`] to share one lock across
/// several roots. The token carries no data; it exists for its identity.
pub struct MutexIdentity {
    raw: Mutex<()>,
}

impl MutexIdentity {
    /// Create a fresh lock token.
    pub fn new() -> Self {
        MutexIdentity { raw: Mutex::new(()) }
    }

    /// Acquire the graph lock, blocking until it is available.
    ///
    /// The guard releases on drop, including during a panic unwind
    /// (parking_lot mutexes do not poison).
    pub(crate) fn acquire(&self) -> IdentityGuard<'_> {
        IdentityGuard {
            _inner: self.raw.lock(),
        }
    }
}

impl Default for MutexIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MutexIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutexIdentity")
            .field("locked", &self.raw.is_locked())
            .finish()
    }
}

/// RAII guard for the graph lock.
pub(crate) struct IdentityGuard<'a> {
    _inner: MutexGuard<'a, ()>,
}
