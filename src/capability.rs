//! Capability classification and dispatch for derived views.
//!
//! When the layer wraps a runtime value (a root delegate, a per-key
//! collection, a sub-map) it classifies the value once and selects the most
//! specific guarded wrapper the value supports, so an ordered set stays
//! navigable and a list stays positional instead of degrading to a generic
//! collection. Classification happens at wrap time only; it is never
//! re-evaluated per call.

use crate::collection::GuardedCollection;
use crate::identity::MutexIdentity;
use crate::interfaces::{CollectionLike, ListLike, MapLike, OrderedMapLike, OrderedSetLike, SetLike};
use crate::list::GuardedList;
use crate::map::{GuardedMap, GuardedOrderedMap};
use crate::set::{GuardedOrderedSet, GuardedSet};
use std::sync::Arc;

/// Static classification of a runtime value's operation family.
///
/// Collection-family capabilities order ordered-set > set > random-access
/// list > list > collection; map-family capabilities order ordered-map >
/// map. The first (most specific) matching capability wins at dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Set with `Ord` navigation (first/last/sub-range).
    OrderedSet,
    /// Plain set.
    Set,
    /// List with cheap positional access.
    RandomAccessList,
    /// Plain list.
    List,
    /// Generic collection.
    Collection,
    /// Map with `Ord` key navigation.
    OrderedMap,
    /// Plain map.
    Map,
}

impl Capability {
    /// Relative specificity within a family; higher wins at dispatch.
    pub fn specificity(self) -> u8 {
        match self {
            Capability::OrderedSet => 4,
            Capability::Set => 3,
            Capability::RandomAccessList => 2,
            Capability::List => 1,
            Capability::Collection => 0,
            Capability::OrderedMap => 1,
            Capability::Map => 0,
        }
    }

    /// Whether this is a collection-family capability.
    pub fn is_collection_family(self) -> bool {
        !self.is_map_family()
    }

    /// Whether this is a map-family capability.
    pub fn is_map_family(self) -> bool {
        matches!(self, Capability::OrderedMap | Capability::Map)
    }

    /// The more specific of two same-family capabilities.
    pub fn most_specific(self, other: Capability) -> Capability {
        if other.specificity() > self.specificity() {
            other
        } else {
            self
        }
    }
}

/// A collection-family value wrapped at its most specific capability.
///
/// Produced by the `from_*` classifiers and by derived-view accessors that
/// hand back live per-key or per-range collections.
pub enum CollectionView<E> {
    /// Ordered set with navigation operations.
    OrderedSet(GuardedOrderedSet<E>),
    /// Plain set.
    Set(GuardedSet<E>),
    /// List (positional access; random-access flag on the wrapper).
    List(GuardedList<E>),
    /// Generic collection.
    Collection(GuardedCollection<E>),
}

impl<E: 'static> CollectionView<E> {
    /// Classify and wrap an ordered-set-capable value.
    pub fn from_ordered_set(
        delegate: impl OrderedSetLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self
    where
        E: Ord,
    {
        match delegate.capability() {
            Capability::OrderedSet => {
                CollectionView::OrderedSet(GuardedOrderedSet::wrap_with(delegate, mutex))
            }
            _ => CollectionView::Set(GuardedSet::wrap_with(delegate, mutex)),
        }
    }

    /// Classify and wrap a set-capable value.
    pub fn from_set(
        delegate: impl SetLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        CollectionView::Set(GuardedSet::wrap_with(delegate, mutex))
    }

    /// Classify and wrap a list-capable value; the random-access marker is
    /// taken from the value's reported capability.
    pub fn from_list(
        delegate: impl ListLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        CollectionView::List(GuardedList::wrap_with(delegate, mutex))
    }

    /// Wrap a value at the generic collection level.
    pub fn from_collection(
        delegate: impl CollectionLike<E> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        CollectionView::Collection(GuardedCollection::wrap_with(delegate, mutex))
    }

    /// The capability this view was wrapped at.
    pub fn capability(&self) -> Capability {
        match self {
            CollectionView::OrderedSet(_) => Capability::OrderedSet,
            CollectionView::Set(_) => Capability::Set,
            CollectionView::List(list) => {
                if list.is_random_access() {
                    Capability::RandomAccessList
                } else {
                    Capability::List
                }
            }
            CollectionView::Collection(_) => Capability::Collection,
        }
    }

    /// Borrow the ordered-set wrapper, when the view preserved that
    /// capability.
    pub fn as_ordered_set(&self) -> Option<&GuardedOrderedSet<E>> {
        match self {
            CollectionView::OrderedSet(set) => Some(set),
            _ => None,
        }
    }

    /// Borrow the set wrapper, when the view preserved set semantics.
    pub fn as_set(&self) -> Option<&GuardedSet<E>> {
        match self {
            CollectionView::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Borrow the list wrapper, when the view preserved positional access.
    pub fn as_list(&self) -> Option<&GuardedList<E>> {
        match self {
            CollectionView::List(list) => Some(list),
            _ => None,
        }
    }

    /// Number of elements, under the lock.
    pub fn len(&self) -> usize {
        match self {
            CollectionView::OrderedSet(v) => v.len(),
            CollectionView::Set(v) => v.len(),
            CollectionView::List(v) => v.len(),
            CollectionView::Collection(v) => v.len(),
        }
    }

    /// Whether the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test, under the lock.
    pub fn contains(&self, item: &E) -> bool {
        match self {
            CollectionView::OrderedSet(v) => v.contains(item),
            CollectionView::Set(v) => v.contains(item),
            CollectionView::List(v) => v.contains(item),
            CollectionView::Collection(v) => v.contains(item),
        }
    }

    /// Add one element, under the lock.
    pub fn insert(&self, item: E) -> bool {
        match self {
            CollectionView::OrderedSet(v) => v.insert(item),
            CollectionView::Set(v) => v.insert(item),
            CollectionView::List(v) => v.insert(item),
            CollectionView::Collection(v) => v.insert(item),
        }
    }

    /// Remove one occurrence, under the lock.
    pub fn remove(&self, item: &E) -> bool {
        match self {
            CollectionView::OrderedSet(v) => v.remove(item),
            CollectionView::Set(v) => v.remove(item),
            CollectionView::List(v) => v.remove(item),
            CollectionView::Collection(v) => v.remove(item),
        }
    }

    /// Owned projection of the elements, under one momentary acquisition.
    pub fn to_vec(&self) -> Vec<E> {
        match self {
            CollectionView::OrderedSet(v) => v.to_vec(),
            CollectionView::Set(v) => v.to_vec(),
            CollectionView::List(v) => v.to_vec(),
            CollectionView::Collection(v) => v.to_vec(),
        }
    }
}

impl<E> Clone for CollectionView<E> {
    fn clone(&self) -> Self {
        match self {
            CollectionView::OrderedSet(s) => CollectionView::OrderedSet(s.clone()),
            CollectionView::Set(s) => CollectionView::Set(s.clone()),
            CollectionView::List(l) => CollectionView::List(l.clone()),
            CollectionView::Collection(c) => CollectionView::Collection(c.clone()),
        }
    }
}

impl<E: std::fmt::Debug + 'static> std::fmt::Debug for CollectionView<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionView::OrderedSet(s) => f.debug_tuple("OrderedSet").field(s).finish(),
            CollectionView::Set(s) => f.debug_tuple("Set").field(s).finish(),
            CollectionView::List(l) => f.debug_tuple("List").field(l).finish(),
            CollectionView::Collection(c) => f.debug_tuple("Collection").field(c).finish(),
        }
    }
}

/// A map-family value wrapped at its most specific capability.
pub enum MapView<K, V> {
    /// Ordered map with key navigation.
    Ordered(GuardedOrderedMap<K, V>),
    /// Plain map.
    Plain(GuardedMap<K, V>),
}

impl<K: 'static, V: 'static> MapView<K, V> {
    /// Classify and wrap an ordered-map-capable value.
    pub fn from_ordered_map(
        delegate: impl OrderedMapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self
    where
        K: Ord,
    {
        match delegate.capability() {
            Capability::OrderedMap => {
                MapView::Ordered(GuardedOrderedMap::wrap_with(delegate, mutex))
            }
            _ => MapView::Plain(GuardedMap::wrap_with(delegate, mutex)),
        }
    }

    /// Wrap a value at the plain map level.
    pub fn from_map(
        delegate: impl MapLike<K, V> + 'static,
        mutex: Option<Arc<MutexIdentity>>,
    ) -> Self {
        MapView::Plain(GuardedMap::wrap_with(delegate, mutex))
    }

    /// The capability this view was wrapped at.
    pub fn capability(&self) -> Capability {
        match self {
            MapView::Ordered(_) => Capability::OrderedMap,
            MapView::Plain(_) => Capability::Map,
        }
    }

    /// Borrow the ordered-map wrapper, when the view preserved navigation.
    pub fn as_ordered(&self) -> Option<&GuardedOrderedMap<K, V>> {
        match self {
            MapView::Ordered(map) => Some(map),
            _ => None,
        }
    }
}

impl<K, V> Clone for MapView<K, V> {
    fn clone(&self) -> Self {
        match self {
            MapView::Ordered(map) => MapView::Ordered(map.clone()),
            MapView::Plain(map) => MapView::Plain(map.clone()),
        }
    }
}

impl<K: std::fmt::Debug + 'static, V: std::fmt::Debug + 'static> std::fmt::Debug for MapView<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapView::Ordered(map) => f.debug_tuple("Ordered").field(map).finish(),
            MapView::Plain(map) => f.debug_tuple("Plain").field(map).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet, VecDeque};

    #[test]
    fn test_specificity_order() {
        assert!(Capability::OrderedSet.specificity() > Capability::Set.specificity());
        assert!(Capability::Set.specificity() > Capability::RandomAccessList.specificity());
        assert!(Capability::RandomAccessList.specificity() > Capability::List.specificity());
        assert!(Capability::List.specificity() > Capability::Collection.specificity());
        assert!(Capability::OrderedMap.specificity() > Capability::Map.specificity());
        assert_eq!(
            Capability::Set.most_specific(Capability::OrderedSet),
            Capability::OrderedSet
        );
    }

    #[test]
    fn test_family_predicates() {
        assert!(Capability::OrderedSet.is_collection_family());
        assert!(Capability::Map.is_map_family());
        assert!(!Capability::List.is_map_family());
    }

    #[test]
    fn test_dispatch_preserves_ordered_set() {
        let view = CollectionView::from_ordered_set(BTreeSet::from([3, 1, 2]), None);
        assert_eq!(view.capability(), Capability::OrderedSet);
        assert!(view.as_ordered_set().is_some());
        assert_eq!(view.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dispatch_plain_set_has_no_navigation() {
        let view = CollectionView::from_set(HashSet::from([1, 2]), None);
        assert_eq!(view.capability(), Capability::Set);
        assert!(view.as_ordered_set().is_none());
    }

    #[test]
    fn test_dispatch_random_access_marker() {
        let vec_view = CollectionView::from_list(vec![1, 2], None);
        assert_eq!(vec_view.capability(), Capability::RandomAccessList);

        let deque_view = CollectionView::from_list(VecDeque::from([1, 2]), None);
        assert_eq!(deque_view.capability(), Capability::List);
    }

    #[test]
    fn test_map_dispatch() {
        use std::collections::{BTreeMap, HashMap};
        let ordered = MapView::from_ordered_map(BTreeMap::from([(1, "a")]), None);
        assert_eq!(ordered.capability(), Capability::OrderedMap);
        assert!(ordered.as_ordered().is_some());

        let plain = MapView::from_map(HashMap::from([(1, "a")]), None);
        assert_eq!(plain.capability(), Capability::Map);
        assert!(plain.as_ordered().is_none());
    }
}
