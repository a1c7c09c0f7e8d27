//! # Deferred Registry Changes
//!
//! Structural changes to the manager's registries (entity add/remove, system
//! add/remove) are never applied at the call site. They are appended to a
//! [`Deferred`] pair of buffers and drained at the next synchronization point.
//!
//! ## Purpose
//! Any system may create or destroy entities, or register and unregister
//! systems, during its own `update` without invalidating the entity or system
//! enumeration that it, or any later system in the same tick, is walking.
//!
//! ## Invariants
//! - Both buffers are append-only between synchronization points.
//! - Draining takes both buffers at once; adds are applied before removes.
//! - Entries are applied in the order they were recorded.


/// Two append-only buffers of pending adds and pending removes.
#[derive(Debug)]
pub(crate) struct Deferred<A, R> {
    /// Pending additions, in call order.
    pub(crate) adds: Vec<A>,

    /// Pending removals, in call order.
    pub(crate) removes: Vec<R>,
}

impl<A, R> Deferred<A, R> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { adds: Vec::with_capacity(capacity), removes: Vec::with_capacity(capacity) }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }

    /// Takes both buffers, leaving empty ones with the same capacity hint.
    pub(crate) fn drain(&mut self) -> (Vec<A>, Vec<R>) {
        let add_capacity = self.adds.capacity();
        let remove_capacity = self.removes.capacity();
        let adds = std::mem::replace(&mut self.adds, Vec::with_capacity(add_capacity));
        let removes = std::mem::replace(&mut self.removes, Vec::with_capacity(remove_capacity));
        (adds, removes)
    }
}

/// Counts of the registry changes applied by one synchronization point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Entities moved from pending-add into the live set.
    pub entities_added: usize,

    /// Entities destroyed and removed from the live set.
    pub entities_removed: usize,

    /// Systems appended to the dispatch list.
    pub systems_added: usize,

    /// Systems removed from the dispatch list.
    pub systems_removed: usize,
}

impl SyncSummary {
    /// Returns `true` if nothing was applied.
    pub fn is_empty(&self) -> bool {
        self.entities_added == 0
            && self.entities_removed == 0
            && self.systems_added == 0
            && self.systems_removed == 0
    }
}
