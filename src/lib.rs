//! # Guarded Collections
//!
//! Mutex-guarded decorators for collection backings.
//!
//! Every wrapper owns (or shares) a [`MutexIdentity`] and routes each
//! operation through it, so any mix of handles, views, and view-of-view
//! chains built over one backing serializes on a single lock. The backings
//! themselves stay single-threaded; the wrappers make them safe to share.
//!
//! ## Quick Start
//!
//! ```
//! use guarded_collections::prelude::*;
//!
//! let set = GuardedOrderedSet::wrap(std::collections::BTreeSet::new());
//! set.insert(3);
//! set.insert(1);
//!
//! // Handles are cheap clones over the same guarded backing.
//! let other = set.clone();
//! assert!(other.contains(&1));
//!
//! // Views stay live and share the parent's lock.
//! let head = set.range(Bounds::head(3));
//! assert_eq!(head.to_vec(), vec![1]);
//! ```
//!
//! ## Wrappers
//!
//! - [`GuardedCollection`] - the generic unordered base
//! - [`GuardedSet`] / [`GuardedOrderedSet`] - sets, with navigation and
//!   ranged views on the ordered form
//! - [`GuardedList`] - positional access and sub-list views
//! - [`GuardedMap`] / [`GuardedOrderedMap`] - maps with key, value, and
//!   entry views
//! - [`GuardedBiMap`] - bijective maps with a mutually cached inverse
//! - [`GuardedMultiset`] - counted elements
//! - [`GuardedMultimap`] and its typed forms - one key to many values,
//!   with per-key views at the backing's capability
//!
//! ## Locking Discipline
//!
//! Wrapping resolves the lock once: pass an existing identity through the
//! `wrap_with` constructors to put several structures under one lock, or
//! let `wrap` mint a fresh one. Views never take a second lock; they run
//! against the parent's identity. Iterators are snapshots, so traversal
//! never holds the lock. For guarded traversal use `for_each` or
//! `with_delegate`, which keep the lock across the whole closure.

#![warn(missing_docs)]

mod backends;
mod bimap;
mod capability;
mod collection;
mod error;
mod guard;
mod identity;
mod interfaces;
mod list;
mod map;
mod multimap;
mod multiset;
mod set;

pub mod prelude;

// Guarded wrappers
pub use bimap::{BiMapValues, GuardedBiMap};
pub use collection::{GuardedCollection, Iter};
pub use list::{GuardedList, SubList};
pub use map::{GuardedMap, GuardedOrderedMap, MapEntries, MapKeys, MapValues, RangedMap};
pub use multimap::{
    GuardedAsMap, GuardedListMultimap, GuardedMultimap, GuardedOrderedSetMultimap,
    GuardedSetMultimap, KeyCollectionView, KeyListView, KeyOrderedSetView, KeySetView, KeyValues,
    MultimapEntries, MultimapKeyMultiset, MultimapKeySet, MultimapValues,
};
pub use multiset::{GuardedMultiset, MultisetElements, MultisetEntries};
pub use set::{GuardedOrderedSet, GuardedSet, RangedSet};

// Lock identity and capability dispatch
pub use capability::{Capability, CollectionView, MapView};
pub use identity::MutexIdentity;

// Backing interfaces and ready-made backings
pub use backends::{HashBiMap, HashMultimap, HashMultiset, SortedMultimap, VecMultimap};
pub use error::{Error, Result};
pub use interfaces::{
    BiMapLike, Bounds, CollectionLike, ListLike, ListMultimapLike, MapLike, MultimapLike,
    MultisetLike, OrderedMapLike, OrderedSetLike, OrderedSetMultimapLike, SetLike,
    SetMultimapLike,
};
