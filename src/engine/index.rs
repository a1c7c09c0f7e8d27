//! Inverted component index.
//!
//! Maps each component type to the set of live entities currently holding it.
//! Multi-type queries intersect buckets starting from the smallest one, so
//! their cost follows the size of that bucket rather than the live entity
//! count.
//!
//! ## Ownership
//! The index is owned and mutated exclusively by the manager, either directly
//! while applying registry changes or through an [`EntityMut`] borrow handed
//! out by the manager. Collaborators never touch it.
//!
//! ## Invariants
//! * An entity appears in the bucket for `K` iff it is live and holds a `K`.
//! * Empty buckets are dropped.
//!
//! [`EntityMut`]: crate::EntityMut

use std::collections::{BTreeSet, HashMap};

use crate::engine::types::{ComponentKey, EntityId};


/// Component type → set of entities holding it.
#[derive(Debug, Default)]
pub struct ComponentIndex {
    buckets: HashMap<ComponentKey, BTreeSet<EntityId>>,
}

impl ComponentIndex {
    /// Creates an empty index.
    pub fn new() -> Self { Self::default() }

    /// Records that `entity` holds a component of type `key`.
    pub(crate) fn insert(&mut self, key: ComponentKey, entity: EntityId) {
        self.buckets.entry(key).or_default().insert(entity);
    }

    /// Records that `entity` no longer holds a component of type `key`.
    pub(crate) fn remove(&mut self, key: ComponentKey, entity: EntityId) {
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.remove(&entity);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Drops `entity` from every bucket.
    ///
    /// ## Complexity
    /// O(number of indexed component types).
    pub(crate) fn purge(&mut self, entity: EntityId) {
        self.buckets.retain(|_, bucket| {
            bucket.remove(&entity);
            !bucket.is_empty()
        });
    }

    /// Entities currently holding a `key`, in id order.
    pub fn bucket(&self, key: &ComponentKey) -> Option<&BTreeSet<EntityId>> {
        self.buckets.get(key)
    }

    /// Number of entities holding a `key`.
    pub fn bucket_len(&self, key: &ComponentKey) -> usize {
        self.buckets.get(key).map_or(0, BTreeSet::len)
    }

    /// Number of component types with at least one holder.
    pub fn type_count(&self) -> usize { self.buckets.len() }

    /// Entities holding every key in `keys`, in id order.
    ///
    /// ## Algorithm
    /// Buckets are ordered by size; the smallest is walked and each candidate
    /// is probed against the remaining buckets. A missing bucket short-circuits
    /// to an empty result.
    ///
    /// ## Notes
    /// An empty `keys` slice yields an empty result here; the manager maps the
    /// empty query to "all live entities" itself.
    ///
    /// ## Complexity
    /// O(s · k · log n) where `s` is the smallest bucket and `k` the number of
    /// keys.
    pub fn intersect(&self, keys: &[ComponentKey]) -> Vec<EntityId> {
        let mut buckets = Vec::with_capacity(keys.len());
        for key in keys {
            match self.buckets.get(key) {
                Some(bucket) => buckets.push(bucket),
                None => return Vec::new(),
            }
        }
        buckets.sort_by_key(|bucket| bucket.len());

        let Some((smallest, rest)) = buckets.split_first() else {
            return Vec::new();
        };

        smallest
            .iter()
            .copied()
            .filter(|entity| rest.iter().all(|bucket| bucket.contains(entity)))
            .collect()
    }
}
