//! Structural change notifications.
//!
//! Subscribers register a callback with the manager and receive every
//! [`ManagerEvent`] synchronously, on the calling thread, in subscription
//! order.
//!
//! * Entity and system add/remove events fire during synchronization, before
//!   any system's `update` for that tick.
//! * Component attach/detach events fire at the call site for entities held
//!   by a manager, and during synchronization for components detached by
//!   entity destruction.
//!
//! Callbacks receive no access to the manager, so they cannot mutate the
//! registries they are being notified about.

use crate::engine::types::{ComponentKey, EntityId, SystemId};


/// A structural change observed by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    /// An entity entered the live set.
    EntityAdded(EntityId),

    /// An entity was destroyed and left the live set.
    EntityRemoved(EntityId),

    /// A component was attached to a managed entity.
    ComponentAttached {
        /// Owning entity.
        entity: EntityId,
        /// Type of the attached component.
        component: ComponentKey,
    },

    /// A component was detached from a managed entity.
    ComponentDetached {
        /// Former owner.
        entity: EntityId,
        /// Type of the detached component.
        component: ComponentKey,
    },

    /// A system joined the end of the dispatch list.
    SystemAdded(SystemId),

    /// A system left the dispatch list.
    SystemRemoved(SystemId),
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ManagerEvent)>;

/// Ordered subscriber list.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub(crate) fn emit(&mut self, event: &ManagerEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize { self.subscribers.len() }
}
