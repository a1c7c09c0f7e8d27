//! # Entities
//!
//! An [`Entity`] is an identity plus a type-keyed container holding at most
//! one component per type.
//!
//! ## Ownership model
//! * A standalone entity (from [`Entity::new`] or
//!   [`Manager::build_entity`](crate::Manager::build_entity)) is an owned value;
//!   its mutating methods act on the entity alone.
//! * Once handed to a manager, the entity is only reachable mutably through
//!   [`EntityMut`]. That borrow carries the manager's inverted index, deferred
//!   removal queue and subscriber list, so every component attach/detach on a
//!   live entity updates the index and notifies subscribers at the call site.
//!
//! ## Destruction
//! [`EntityMut::destroy`] only marks intent and enqueues the entity for
//! removal. The manager detaches every remaining component at the next
//! synchronization point (firing `on_detached` once each) and clears the
//! manager binding, so no owner reference survives removal.

use std::any::TypeId;
use std::fmt;
use std::ops::Deref;

use crate::engine::component::{
    unbox_component, Attachment, Component, ComponentMap, ComponentSlot, ComponentTuple,
};
use crate::engine::error::DuplicateComponentError;
use crate::engine::events::{ManagerEvent, Observers};
use crate::engine::index::ComponentIndex;
use crate::engine::types::{ComponentKey, EntityId, ManagerId};


/// Identity plus its attached components.
///
/// ## Invariants
/// * At most one component instance per type.
/// * Every stored slot records this entity as its owner.
/// * `manager` is `Some` from binding until the manager destroys the entity.

pub struct Entity {
    id: EntityId,
    manager: Option<ManagerId>,
    active: bool,
    destroyed: bool,
    components: ComponentMap,
    next_sequence: u64,
}

impl Entity {
    /// Creates a standalone entity that is not bound to any manager.
    pub fn new() -> Self {
        Self::with_binding(None)
    }

    pub(crate) fn bound_to(manager: ManagerId) -> Self {
        Self::with_binding(Some(manager))
    }

    fn with_binding(manager: Option<ManagerId>) -> Self {
        Self {
            id: EntityId::allocate(),
            manager,
            active: true,
            destroyed: false,
            components: ComponentMap::new(),
            next_sequence: 0,
        }
    }

    /// Stable identifier.
    #[inline]
    pub fn id(&self) -> EntityId { self.id }

    /// Manager this entity is bound to, if any.
    #[inline]
    pub fn manager(&self) -> Option<ManagerId> { self.manager }

    pub(crate) fn bind(&mut self, manager: ManagerId) {
        self.manager = Some(manager);
    }

    /// Inactive entities stay live but are excluded from system interest and
    /// component queries.
    #[inline]
    pub fn is_active(&self) -> bool { self.active }

    /// Sets the active flag.
    #[inline]
    pub fn set_active(&mut self, active: bool) { self.active = active; }

    /// Returns `true` once destruction has been requested.
    #[inline]
    pub fn is_destroyed(&self) -> bool { self.destroyed }

    /// Marks the entity destroyed. Idempotent.
    ///
    /// On a standalone entity this only sets the flag; a manager receiving a
    /// destroyed entity enqueues it for removal at its next synchronization
    /// point. Returns `true` if the flag was newly set.
    pub fn destroy(&mut self) -> bool {
        let newly = !self.destroyed;
        self.destroyed = true;
        newly
    }

    /// Attaches `component`.
    ///
    /// ## Errors
    /// [`DuplicateComponentError`] if a `T` is already attached. The existing
    /// component is left untouched and `component` is dropped without hooks.
    ///
    /// ## Complexity
    /// O(1) expected.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<&mut Self, DuplicateComponentError> {
        self.attach(ComponentKey::of::<T>(), Box::new(component))?;
        Ok(self)
    }

    pub(crate) fn attach(
        &mut self,
        key: ComponentKey,
        mut value: Box<dyn Component>,
    ) -> Result<(), DuplicateComponentError> {
        if self.components.contains_key(&key.type_id()) {
            log::debug!("entity {} rejected duplicate `{}`", self.id, key);
            return Err(DuplicateComponentError { entity: self.id, component: key });
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        value.on_attached(&Attachment::new(self.id, &self.components));
        self.components.insert(
            key.type_id(),
            ComponentSlot { key, owner: self.id, sequence, enabled: true, value },
        );
        Ok(())
    }

    /// Detaches and returns component `T`; `None` if absent.
    ///
    /// `on_detached` fires before the value is returned. The returned value is
    /// no longer owned by any entity.
    pub fn remove_component<T: Component>(&mut self) -> Option<T> {
        let (_, value) = self.detach(TypeId::of::<T>())?;
        unbox_component::<T>(value)
    }

    pub(crate) fn detach(&mut self, type_id: TypeId) -> Option<(ComponentKey, Box<dyn Component>)> {
        let mut slot = self.components.remove(&type_id)?;
        slot.value.on_detached(&Attachment::new(slot.owner, &self.components));
        Some((slot.key, slot.value))
    }

    /// Returns component `T`, if attached.
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components.get(&TypeId::of::<T>()).and_then(ComponentSlot::downcast_ref::<T>)
    }

    /// Returns component `T` mutably, if attached.
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components.get_mut(&TypeId::of::<T>()).and_then(ComponentSlot::downcast_mut::<T>)
    }

    /// Returns `true` if a `T` is attached.
    #[inline]
    pub fn has_component<T: Component>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    /// Returns `true` if a component with type key `key` is attached.
    #[inline]
    pub fn has_key(&self, key: &ComponentKey) -> bool {
        self.components.contains_key(&key.type_id())
    }

    /// Conjunction over `keys`: `true` if every key is attached.
    ///
    /// An empty key list is trivially satisfied.
    pub fn has_components(&self, keys: &[ComponentKey]) -> bool {
        keys.iter().all(|key| self.has_key(key))
    }

    /// Typed conjunction, e.g. `entity.has_all::<(Position, Velocity)>()`.
    #[inline]
    pub fn has_all<Q: ComponentTuple>(&self) -> bool {
        Q::all_present(self)
    }

    /// Type keys of every attached component, in attach order.
    pub fn component_keys(&self) -> Vec<ComponentKey> {
        let mut slots: Vec<&ComponentSlot> = self.components.values().collect();
        slots.sort_by_key(|slot| slot.sequence);
        slots.into_iter().map(|slot| slot.key).collect()
    }

    /// Number of attached components.
    #[inline]
    pub fn component_count(&self) -> usize { self.components.len() }

    /// Enabled flag of component `T`; `None` if absent.
    pub fn is_component_enabled<T: Component>(&self) -> Option<bool> {
        self.components.get(&TypeId::of::<T>()).map(|slot| slot.enabled)
    }

    /// Sets the enabled flag of component `T`. Returns `false` if absent.
    pub fn set_component_enabled<T: Component>(&mut self, enabled: bool) -> bool {
        match self.components.get_mut(&TypeId::of::<T>()) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Detaches every remaining component in reverse attach order, reporting
    /// each key to `detached`, then clears the manager binding.
    ///
    /// Only the manager calls this, while applying a removal.
    pub(crate) fn on_destroy(&mut self, mut detached: impl FnMut(ComponentKey)) {
        let mut order: Vec<(u64, TypeId)> = self
            .components
            .values()
            .map(|slot| (slot.sequence, slot.key.type_id()))
            .collect();
        order.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (_, type_id) in order {
            if let Some((key, _value)) = self.detach(type_id) {
                detached(key);
            }
        }

        self.components.clear();
        self.manager = None;
    }
}

impl Default for Entity {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("manager", &self.manager)
            .field("active", &self.active)
            .field("destroyed", &self.destroyed)
            .field("components", &self.component_keys())
            .finish()
    }
}

/// Mutable access to an entity held by a manager.
///
/// Obtained from [`Manager::create_entity`](crate::Manager::create_entity) or
/// [`Manager::entity_mut`](crate::Manager::entity_mut). Reads go through
/// `Deref<Target = Entity>`; every mutation that affects the index or the
/// registries goes through the methods below.

pub struct EntityMut<'a> {
    entity: &'a mut Entity,
    /// `None` while the entity is still pending; it is indexed when it goes live.
    index: Option<&'a mut ComponentIndex>,
    removals: &'a mut Vec<EntityId>,
    observers: &'a mut Observers,
}

impl<'a> EntityMut<'a> {
    pub(crate) fn new(
        entity: &'a mut Entity,
        index: Option<&'a mut ComponentIndex>,
        removals: &'a mut Vec<EntityId>,
        observers: &'a mut Observers,
    ) -> Self {
        Self { entity, index, removals, observers }
    }

    /// Returns `true` if the entity is in the manager's live set.
    #[inline]
    pub fn is_live(&self) -> bool { self.index.is_some() }

    /// Attaches `component`, indexing it immediately if the entity is live.
    ///
    /// ## Errors
    /// [`DuplicateComponentError`] if a `T` is already attached.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<&mut Self, DuplicateComponentError> {
        let key = ComponentKey::of::<T>();
        self.entity.attach(key, Box::new(component))?;

        let id = self.entity.id();
        if let Some(index) = self.index.as_deref_mut() {
            index.insert(key, id);
        }
        self.observers.emit(&ManagerEvent::ComponentAttached { entity: id, component: key });
        Ok(self)
    }

    /// Detaches and returns component `T`; `None` (and no notification) if
    /// absent.
    pub fn remove_component<T: Component>(&mut self) -> Option<T> {
        let (key, value) = self.entity.detach(TypeId::of::<T>())?;

        let id = self.entity.id();
        if let Some(index) = self.index.as_deref_mut() {
            index.remove(key, id);
        }
        self.observers.emit(&ManagerEvent::ComponentDetached { entity: id, component: key });
        unbox_component::<T>(value)
    }

    /// Returns component `T` mutably, if attached.
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.entity.get_component_mut::<T>()
    }

    /// Sets the active flag. Takes effect for queries immediately.
    pub fn set_active(&mut self, active: bool) {
        self.entity.set_active(active);
    }

    /// Sets the enabled flag of component `T`. Returns `false` if absent.
    pub fn set_component_enabled<T: Component>(&mut self, enabled: bool) -> bool {
        self.entity.set_component_enabled::<T>(enabled)
    }

    /// Marks the entity destroyed and enqueues it for removal at the next
    /// synchronization point. Idempotent.
    pub fn destroy(&mut self) {
        if self.entity.destroy() {
            self.removals.push(self.entity.id());
        }
    }
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity { &*self.entity }
}
