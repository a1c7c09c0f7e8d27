//! Manager: registries, inverted index and the per-tick entry point.
//!
//! This module defines the central orchestration layer of the runtime,
//! responsible for:
//!
//! * owning the live entity set and the live system list,
//! * queueing every entity and system registry change until the next
//!   synchronization point,
//! * maintaining the inverted index (component type → entities) that backs
//!   multi-type queries,
//! * notifying subscribers of structural changes,
//! * dispatching systems once per tick.
//!
//! ## Synchronization algorithm
//!
//! [`Manager::synchronize`] runs once per tick, before dispatch:
//!
//! 1. Pending-add entities enter the live set; their components are indexed
//!    and `EntityAdded` is emitted.
//! 2. Each pending-remove entity has every component detached (firing
//!    `on_detached` and updating the index per component), leaves the live set
//!    and every index bucket, and `EntityRemoved` is emitted.
//! 3. The same add-then-remove pattern is applied to the system list. Systems
//!    that just became live are initialized when the configuration asks for it.
//!    Removed systems are held for [`Manager::take_removed_systems`] until the
//!    next synchronization point.
//!
//! [`Manager::dispatch`] then calls `update` on each live, enabled system in
//! registration order. While dispatch runs, a nested `synchronize` is refused,
//! so every system in the tick observes the same live set.
//!
//! ## Consistency model
//!
//! Entity and system registry changes are deferred. Component attach/detach
//! on a live entity is immediate: the index and subscribers are updated at the
//! call site through [`EntityMut`]. Components attached to a pending entity are
//! indexed when the entity goes live.
//!
//! ## Threading
//!
//! A manager is a single-threaded object. Systems read and write shared
//! entity state without synchronization; embedding it in a multi-threaded
//! program requires external mutual exclusion.

use std::collections::BTreeMap;

use crate::engine::commands::{Deferred, SyncSummary};
use crate::engine::component::ComponentTuple;
use crate::engine::config::ManagerConfig;
use crate::engine::entity::{Entity, EntityMut};
use crate::engine::error::OwnershipConflictError;
use crate::engine::events::{ManagerEvent, Observers, SubscriptionId};
use crate::engine::index::ComponentIndex;
use crate::engine::systems::{RemovedSystem, System, SystemSlot};
use crate::engine::types::{ComponentKey, EntityId, ManagerId, SystemId};


/// Owner of the entity and system registries.
///
/// ## Invariants
/// * `live` holds exactly the entities visible to queries and dispatch.
/// * `index` is consistent with the component ownership of `live` at the end
///   of every synchronization point, and after every component change made
///   through [`EntityMut`].
/// * `systems` is in dispatch order; each `SystemSlot` holds its system except
///   while that system is checked out for a call.

pub struct Manager {
    id: ManagerId,
    config: ManagerConfig,

    /// Live entities, keyed (and therefore ordered) by id.
    live: BTreeMap<EntityId, Entity>,

    /// Entities waiting to go live, and ids waiting to be removed.
    pending_entities: Deferred<Entity, EntityId>,

    index: ComponentIndex,

    /// Live systems in dispatch order.
    systems: Vec<SystemSlot>,

    pending_systems: Deferred<SystemSlot, SystemId>,

    /// Systems removed by the last synchronization point.
    removed_systems: Vec<RemovedSystem>,

    observers: Observers,

    next_system_id: u32,

    /// Completed `update` calls.
    tick: u64,

    /// Set while a system is checked out for `initialize` or `update`.
    busy: bool,
}

impl Manager {
    /// Creates a manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a manager with `config`.
    pub fn with_config(config: ManagerConfig) -> Self {
        let pending_capacity = config.pending_capacity;
        Self {
            id: ManagerId::allocate(),
            config,
            live: BTreeMap::new(),
            pending_entities: Deferred::with_capacity(pending_capacity),
            index: ComponentIndex::new(),
            systems: Vec::new(),
            pending_systems: Deferred::with_capacity(0),
            removed_systems: Vec::new(),
            observers: Observers::default(),
            next_system_id: 0,
            tick: 0,
            busy: false,
        }
    }

    /// Identifier of this manager.
    #[inline]
    pub fn id(&self) -> ManagerId { self.id }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &ManagerConfig { &self.config }

    /// Number of completed [`update`](Self::update) calls.
    #[inline]
    pub fn tick(&self) -> u64 { self.tick }

    /// Read-only view of the inverted index.
    #[inline]
    pub fn index(&self) -> &ComponentIndex { &self.index }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

impl Manager {
    /// Allocates an entity bound to this manager without enqueueing it.
    ///
    /// The returned value can be populated freely and handed to
    /// [`add_entity`](Self::add_entity) later. Any other manager refuses it.
    pub fn build_entity(&self) -> Entity {
        Entity::bound_to(self.id)
    }

    /// Allocates an entity bound to this manager and enqueues it.
    ///
    /// The id is allocated immediately, but the entity is not visible to
    /// [`get_entity`](Self::get_entity), [`get_entities`](Self::get_entities)
    /// or any query until the next synchronization point.
    pub fn create_entity(&mut self) -> EntityMut<'_> {
        let entity = self.build_entity();
        self.enqueue_entity(entity)
    }

    /// Enqueues an existing entity; same visibility rules as
    /// [`create_entity`](Self::create_entity).
    ///
    /// An unbound entity is bound to this manager. An entity that is already
    /// marked destroyed is also enqueued for removal.
    ///
    /// ## Errors
    /// [`OwnershipConflictError`] if the entity is bound to a different
    /// manager. The error hands the entity back.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<EntityId, OwnershipConflictError> {
        if let Some(owner) = entity.manager() {
            if owner != self.id {
                log::debug!("{} refused entity {} bound to {}", self.id, entity.id(), owner);
                return Err(OwnershipConflictError::new(entity, owner, self.id));
            }
        }

        entity.bind(self.id);
        let id = entity.id();
        self.enqueue_entity(entity);
        Ok(id)
    }

    fn enqueue_entity(&mut self, entity: Entity) -> EntityMut<'_> {
        if entity.is_destroyed() {
            self.pending_entities.removes.push(entity.id());
        }
        self.pending_entities.adds.push(entity);

        let last = self.pending_entities.adds.len() - 1;
        EntityMut::new(
            &mut self.pending_entities.adds[last],
            None,
            &mut self.pending_entities.removes,
            &mut self.observers,
        )
    }

    /// Marks the entity destroyed and enqueues it for removal.
    ///
    /// Works on live and pending entities; has no effect on any enumeration in
    /// progress. Returns `false` if the id is unknown.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        match self.entity_mut(id) {
            Some(mut entity) => {
                entity.destroy();
                true
            }
            None => false,
        }
    }

    /// Enqueues every live and pending entity for removal. Returns how many
    /// entities were newly marked.
    pub fn destroy_all(&mut self) -> usize {
        let removes = &mut self.pending_entities.removes;
        let mut marked = 0;
        for entity in self.live.values_mut().chain(self.pending_entities.adds.iter_mut()) {
            if entity.destroy() {
                removes.push(entity.id());
                marked += 1;
            }
        }
        marked
    }

    /// Looks up a live entity. Pending entities are not found.
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.live.get(&id)
    }

    /// Mutable access to a live or pending entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        if self.live.contains_key(&id) {
            let entity = self.live.get_mut(&id)?;
            return Some(EntityMut::new(
                entity,
                Some(&mut self.index),
                &mut self.pending_entities.removes,
                &mut self.observers,
            ));
        }

        let entity = self.pending_entities.adds.iter_mut().find(|entity| entity.id() == id)?;
        Some(EntityMut::new(
            entity,
            None,
            &mut self.pending_entities.removes,
            &mut self.observers,
        ))
    }

    /// Returns `true` if `id` is in the live set.
    #[inline]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    /// Returns `true` if `id` is waiting to go live.
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending_entities.adds.iter().any(|entity| entity.id() == id)
    }

    /// The live set, in id order. Pending adds are excluded and pending
    /// removals are still included until the next synchronization point.
    pub fn get_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.live.values()
    }

    /// Ids of the live set, in id order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.live.keys().copied().collect()
    }

    /// Size of the live set.
    #[inline]
    pub fn entity_count(&self) -> usize { self.live.len() }

    /// Number of entities waiting to go live.
    #[inline]
    pub fn pending_entity_count(&self) -> usize { self.pending_entities.adds.len() }

    /// Number of removals waiting for the next synchronization point.
    #[inline]
    pub fn pending_removal_count(&self) -> usize { self.pending_entities.removes.len() }

    /// Live, active entities holding every type in `keys`, in id order.
    ///
    /// An empty `keys` slice matches every live, active entity. Otherwise the
    /// result is the intersection of the index buckets, so the cost follows the
    /// smallest bucket rather than the live entity count.
    pub fn entities_with_components(&self, keys: &[ComponentKey]) -> Vec<EntityId> {
        if keys.is_empty() {
            return self
                .live
                .values()
                .filter(|entity| entity.is_active())
                .map(Entity::id)
                .collect();
        }

        self.index
            .intersect(keys)
            .into_iter()
            .filter(|id| self.live.get(id).is_some_and(Entity::is_active))
            .collect()
    }

    /// Typed form of [`entities_with_components`](Self::entities_with_components),
    /// e.g. `manager.entities_with::<(Position, Velocity)>()`.
    pub fn entities_with<Q: ComponentTuple>(&self) -> Vec<EntityId> {
        self.entities_with_components(&Q::keys())
    }

    /// Iterates the live, active entities holding every member of `Q`.
    pub fn query<Q: ComponentTuple>(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities_with::<Q>()
            .into_iter()
            .filter_map(move |id| self.live.get(&id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

impl Manager {
    /// Registers `system`; it joins the end of the dispatch list at the next
    /// synchronization point.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> SystemId {
        self.add_boxed_system(Box::new(system))
    }

    /// Registers an already boxed system.
    pub fn add_boxed_system(&mut self, system: Box<dyn System>) -> SystemId {
        let id = self.allocate_system_id();
        log::trace!("{} queued system {} ({})", self.id, id, system.name());
        self.pending_systems.adds.push(SystemSlot::new(id, system));
        id
    }

    /// Enqueues removal of a live or pending system. Returns `false` if the id
    /// is unknown.
    pub fn remove_system(&mut self, id: SystemId) -> bool {
        let known = self.systems.iter().any(|slot| slot.id == id)
            || self.pending_systems.adds.iter().any(|slot| slot.id == id);
        if known && !self.pending_systems.removes.contains(&id) {
            self.pending_systems.removes.push(id);
        }
        known
    }

    fn allocate_system_id(&mut self) -> SystemId {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;
        id
    }

    fn system_slot(&self, id: SystemId) -> Option<&SystemSlot> {
        self.systems
            .iter()
            .chain(self.pending_systems.adds.iter())
            .find(|slot| slot.id == id)
    }

    fn system_slot_mut(&mut self, id: SystemId) -> Option<&mut SystemSlot> {
        self.systems
            .iter_mut()
            .chain(self.pending_systems.adds.iter_mut())
            .find(|slot| slot.id == id)
    }

    /// Enables or disables a live or pending system. Disabled systems are
    /// skipped by dispatch. Returns `false` if the id is unknown.
    pub fn set_system_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        match self.system_slot_mut(id) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enabled flag of a live or pending system.
    pub fn is_system_enabled(&self, id: SystemId) -> Option<bool> {
        self.system_slot(id).map(|slot| slot.enabled)
    }

    /// Initialized flag of a live or pending system.
    pub fn is_system_initialized(&self, id: SystemId) -> Option<bool> {
        self.system_slot(id).map(|slot| slot.initialized)
    }

    /// Name of a live or pending system.
    pub fn system_name(&self, id: SystemId) -> Option<&str> {
        self.system_slot(id).map(|slot| slot.name.as_str())
    }

    /// Live systems in dispatch order.
    pub fn system_ids(&self) -> Vec<SystemId> {
        self.systems.iter().map(|slot| slot.id).collect()
    }

    /// Number of live systems.
    #[inline]
    pub fn system_count(&self) -> usize { self.systems.len() }

    /// Initializes every live system that has not been initialized yet, in
    /// dispatch order. Returns how many were initialized.
    ///
    /// Refused (returning 0) while a system is running.
    pub fn initialize_systems(&mut self) -> usize {
        if self.busy {
            log::warn!("{} refused initialize_systems while a system is running", self.id);
            return 0;
        }

        let mut initialized = 0;
        for position in 0..self.systems.len() {
            if !self.systems[position].initialized && self.initialize_at(position) {
                initialized += 1;
            }
        }
        initialized
    }

    /// Takes the systems removed by the last synchronization point, in
    /// removal order.
    ///
    /// Systems not taken are dropped at the next synchronization point.
    pub fn take_removed_systems(&mut self) -> Vec<RemovedSystem> {
        std::mem::take(&mut self.removed_systems)
    }

    /// Re-registers a removed system, keeping its enabled and initialized
    /// flags. It joins the end of the dispatch list at the next
    /// synchronization point.
    ///
    /// The previous id is kept unless the system came from another manager or
    /// the id is taken again, in which case a fresh one is allocated.
    pub fn restore_system(&mut self, removed: RemovedSystem) -> SystemId {
        let reusable = removed.manager() == self.id && self.system_slot(removed.id()).is_none();
        let id = if reusable { removed.id() } else { self.allocate_system_id() };
        let slot = removed.into_slot(id);
        log::trace!("{} queued restored system {} ({})", self.id, id, slot.name);
        self.pending_systems.adds.push(slot);
        id
    }

    fn initialize_at(&mut self, position: usize) -> bool {
        let Some(mut system) = self.systems[position].system.take() else {
            return false;
        };

        log::trace!("{} initializing {}", self.id, self.systems[position].name);
        let was_busy = std::mem::replace(&mut self.busy, true);
        system.initialize(self);
        self.busy = was_busy;

        let slot = &mut self.systems[position];
        slot.system = Some(system);
        slot.initialized = true;
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscribers
// ─────────────────────────────────────────────────────────────────────────────

impl Manager {
    /// Registers a callback for every [`ManagerEvent`].
    ///
    /// Callbacks run synchronously, in subscription order.
    pub fn subscribe(&mut self, callback: impl FnMut(&ManagerEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick
// ─────────────────────────────────────────────────────────────────────────────

impl Manager {
    /// Applies every queued registry change.
    ///
    /// ## Semantics
    /// This is the synchronization point described in the module docs. It is
    /// refused (and returns an empty summary) while a system is running, so
    /// changes queued during dispatch always wait for the next tick.
    pub fn synchronize(&mut self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        if self.busy {
            log::warn!("{} refused synchronize while a system is running", self.id);
            return summary;
        }

        self.removed_systems.clear();
        if self.pending_entities.is_empty() && self.pending_systems.is_empty() {
            return summary;
        }

        let (added, removed) = self.pending_entities.drain();

        for entity in added {
            let id = entity.id();
            for key in entity.component_keys() {
                self.index.insert(key, id);
            }
            self.live.insert(id, entity);
            summary.entities_added += 1;
            log::trace!("{} entity {} is live", self.id, id);
            self.observers.emit(&ManagerEvent::EntityAdded(id));
        }

        for id in removed {
            let Some(mut entity) = self.live.remove(&id) else {
                continue;
            };

            let index = &mut self.index;
            let observers = &mut self.observers;
            entity.on_destroy(|key| {
                index.remove(key, id);
                observers.emit(&ManagerEvent::ComponentDetached { entity: id, component: key });
            });
            self.index.purge(id);

            summary.entities_removed += 1;
            log::trace!("{} entity {} removed", self.id, id);
            self.observers.emit(&ManagerEvent::EntityRemoved(id));
        }

        let (added, removed) = self.pending_systems.drain();
        let mut fresh = Vec::with_capacity(added.len());

        for slot in added {
            let id = slot.id;
            log::trace!("{} system {} ({}) is live", self.id, id, slot.name);
            self.systems.push(slot);
            fresh.push(id);
            summary.systems_added += 1;
            self.observers.emit(&ManagerEvent::SystemAdded(id));
        }

        for id in removed {
            let Some(position) = self.systems.iter().position(|slot| slot.id == id) else {
                continue;
            };
            let slot = self.systems.remove(position);
            log::trace!("{} system {} ({}) removed", self.id, id, slot.name);
            self.removed_systems.extend(RemovedSystem::from_slot(self.id, slot));
            summary.systems_removed += 1;
            self.observers.emit(&ManagerEvent::SystemRemoved(id));
        }

        if self.config.initialize_systems_on_sync {
            for id in fresh {
                let position = self.systems.iter().position(|slot| slot.id == id);
                if let Some(position) = position {
                    if !self.systems[position].initialized {
                        self.initialize_at(position);
                    }
                }
            }
        }

        if self.config.log_sync_summary && !summary.is_empty() {
            log::debug!(
                "{} sync: +{} / -{} entities ({} live), +{} / -{} systems ({} live)",
                self.id,
                summary.entities_added,
                summary.entities_removed,
                self.live.len(),
                summary.systems_added,
                summary.systems_removed,
                self.systems.len(),
            );
        }

        summary
    }

    /// Calls `update` on each live, enabled, initialized system in
    /// registration order.
    ///
    /// Each system receives the live, active entities it is interested in,
    /// computed just before its call. Registry changes it queues are applied
    /// at the next synchronization point.
    pub fn dispatch(&mut self, delta: f32) {
        if self.busy {
            log::warn!("{} refused nested dispatch", self.id);
            return;
        }
        self.busy = true;

        for position in 0..self.systems.len() {
            let slot = &self.systems[position];
            if !slot.enabled {
                continue;
            }
            if !slot.initialized {
                log::trace!("{} skipping uninitialized system {}", self.id, slot.name);
                continue;
            }
            let Some(mut system) = self.systems[position].system.take() else {
                continue;
            };

            let entities: Vec<EntityId> = self
                .live
                .values()
                .filter(|entity| entity.is_active() && system.is_interested_in(entity))
                .map(Entity::id)
                .collect();

            log::trace!("{} dispatching {} over {} entities", self.id, system.name(), entities.len());
            system.update(self, &entities, delta);
            self.systems[position].system = Some(system);
        }

        self.busy = false;
    }

    /// Per-tick entry point for the driver: synchronize, then dispatch.
    ///
    /// A nested call from inside a running system does nothing and does not
    /// count as a tick.
    pub fn update(&mut self, delta: f32) -> SyncSummary {
        if self.busy {
            log::warn!("{} refused nested update", self.id);
            return SyncSummary::default();
        }

        let summary = self.synchronize();
        self.dispatch(delta);
        self.tick += 1;
        summary
    }
}

impl Default for Manager {
    fn default() -> Self { Self::new() }
}
