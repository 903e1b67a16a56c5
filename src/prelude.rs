//! Convenient imports for guarded collections.
//!
//! This module re-exports the most commonly used types so you can get
//! started with a single import:
//!
//! ```
//! use guarded_collections::prelude::*;
//!
//! let list = GuardedList::wrap(Vec::new());
//! list.insert(1);
//! assert_eq!(list.get_at(0), Some(1));
//! ```

// Guarded wrappers
pub use crate::bimap::GuardedBiMap;
pub use crate::collection::GuardedCollection;
pub use crate::list::GuardedList;
pub use crate::map::{GuardedMap, GuardedOrderedMap};
pub use crate::multimap::{
    GuardedListMultimap, GuardedMultimap, GuardedOrderedSetMultimap, GuardedSetMultimap,
};
pub use crate::multiset::GuardedMultiset;
pub use crate::set::{GuardedOrderedSet, GuardedSet};

// Lock identity
pub use crate::identity::MutexIdentity;

// Error handling
pub use crate::error::{Error, Result};

// Backing interfaces
pub use crate::interfaces::{
    BiMapLike, Bounds, CollectionLike, ListLike, MapLike, MultimapLike, MultisetLike,
    OrderedMapLike, OrderedSetLike, SetLike,
};

// Ready-made backings with no std equivalent
pub use crate::backends::{HashBiMap, HashMultimap, HashMultiset, SortedMultimap, VecMultimap};
