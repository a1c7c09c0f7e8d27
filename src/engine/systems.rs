//! System Abstractions
//!
//! This module defines the *system contract* used by the runtime.
//!
//! A **system** is a unit of logic that processes entities matching an
//! interest predicate over component types. Systems:
//! - are stateless between ticks as far as the runtime is concerned,
//! - declare interest through [`System::is_interested_in`], a pure predicate,
//! - are dispatched once per tick, in registration order, while enabled.
//!
//! ## Dispatch model
//!
//! On every tick the manager first applies deferred registry changes, then
//! walks its live system list. For each enabled, initialized system it builds
//! the list of live, active entities for which `is_interested_in` holds and
//! calls [`System::update`] with it.
//!
//! - Iteration order across entities follows entity id (creation order). A
//!   system that needs another order, for example by draw depth, must sort
//!   explicitly and document its tie-break.
//! - Entities or systems created or destroyed during `update` become visible
//!   only at the next synchronization point.
//! - The runtime does not catch panics raised inside `update`. Assuming a
//!   co-component that is absent is a caller contract violation.
//!
//! ## Access to the manager
//!
//! Systems never store a manager reference. The manager is passed as a
//! `&mut` parameter to [`System::initialize`] and [`System::update`].
//!
//! ## Function-backed Systems
//!
//! [`FnSystem`] wraps a closure together with a name and a fixed
//! [`ComponentSet`] interest, for systems that do not warrant their own type.

use std::any::type_name;

use crate::engine::component::ComponentSet;
use crate::engine::entity::Entity;
use crate::engine::manager::Manager;
use crate::engine::types::{EntityId, ManagerId, SystemId};


/// A unit of per-tick logic operating on entities it is interested in.
///
/// ## Example
/// ```ignore
/// struct Movement;
///
/// impl System for Movement {
///     fn is_interested_in(&self, entity: &Entity) -> bool {
///         entity.has_all::<(Position, Velocity)>()
///     }
///
///     fn update(&mut self, manager: &mut Manager, entities: &[EntityId], delta: f32) {
///         for &id in entities {
///             let Some(mut entity) = manager.entity_mut(id) else { continue };
///             let velocity = *entity.get_component::<Velocity>().unwrap();
///             let position = entity.get_component_mut::<Position>().unwrap();
///             position.x += velocity.dx * delta;
///         }
///     }
/// }
/// ```

pub trait System {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Called once before the first `update`.
    ///
    /// May acquire external resources or register entities; entity changes
    /// made here follow the usual deferred rules.
    fn initialize(&mut self, _manager: &mut Manager) {}

    /// Interest predicate. Must be pure and side-effect free.
    ///
    /// The canonical implementation is a conjunction over a fixed set of
    /// component types (`Entity::has_all` or `Entity::has_components`).
    fn is_interested_in(&self, entity: &Entity) -> bool;

    /// Runs the system for one tick.
    ///
    /// `entities` are the live, active entities this system is interested in,
    /// computed from the tick's snapshot just before the call.
    fn update(&mut self, manager: &mut Manager, entities: &[EntityId], delta: f32);
}

/// A concrete [`System`] backed by a closure.
///
/// `FnSystem` stores:
/// - a human-readable name,
/// - the component types an entity must hold to be of interest,
/// - the closure executed on every update.

pub struct FnSystem<F>
where
    F: FnMut(&mut Manager, &[EntityId], f32) + 'static,
{
    name: &'static str,
    interest: ComponentSet,
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut Manager, &[EntityId], f32) + 'static,
{
    /// Creates a new function-backed system.
    ///
    /// # Parameters
    /// - `name`: Human-readable name, useful for logs.
    /// - `interest`: Component types an entity must hold; an empty set matches
    ///   every live, active entity.
    /// - `f`: The closure executed when the system runs.
    pub fn new(name: &'static str, interest: ComponentSet, f: F) -> Self {
        Self { name, interest, f }
    }

    /// Returns the declared interest set.
    pub fn interest(&self) -> &ComponentSet {
        &self.interest
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut Manager, &[EntityId], f32) + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn is_interested_in(&self, entity: &Entity) -> bool {
        entity.has_components(self.interest.keys())
    }

    fn update(&mut self, manager: &mut Manager, entities: &[EntityId], delta: f32) {
        (self.f)(manager, entities, delta)
    }
}

/// A registered system and the flags the manager keeps about it.
///
/// `system` is `None` only while the system is checked out for a call to
/// `initialize` or `update`.

pub(crate) struct SystemSlot {
    pub(crate) id: SystemId,
    pub(crate) name: String,
    pub(crate) enabled: bool,
    pub(crate) initialized: bool,
    pub(crate) system: Option<Box<dyn System>>,
}

impl SystemSlot {
    pub(crate) fn new(id: SystemId, system: Box<dyn System>) -> Self {
        Self {
            id,
            name: system.name().to_owned(),
            enabled: true,
            initialized: false,
            system: Some(system),
        }
    }
}

/// A system taken off the dispatch list, handed back with its flags.
///
/// Obtained from [`Manager::take_removed_systems`]; pass it to
/// [`Manager::restore_system`] to re-register the same instance without
/// running `initialize` again.

pub struct RemovedSystem {
    manager: ManagerId,
    id: SystemId,
    name: String,
    enabled: bool,
    initialized: bool,
    system: Box<dyn System>,
}

impl RemovedSystem {
    /// Returns `None` for a slot whose system is checked out.
    pub(crate) fn from_slot(manager: ManagerId, slot: SystemSlot) -> Option<Self> {
        let SystemSlot { id, name, enabled, initialized, system } = slot;
        Some(Self { manager, id, name, enabled, initialized, system: system? })
    }

    /// Manager the system was removed from.
    #[inline]
    pub(crate) fn manager(&self) -> ManagerId { self.manager }

    pub(crate) fn into_slot(self, id: SystemId) -> SystemSlot {
        SystemSlot {
            id,
            name: self.name,
            enabled: self.enabled,
            initialized: self.initialized,
            system: Some(self.system),
        }
    }

    /// Id the system had while registered.
    #[inline]
    pub fn id(&self) -> SystemId { self.id }

    /// Name recorded at registration.
    pub fn name(&self) -> &str { &self.name }

    /// Returns `true` if `initialize` already ran for this instance.
    #[inline]
    pub fn is_initialized(&self) -> bool { self.initialized }

    /// Unwraps the system itself, dropping the flags.
    pub fn into_inner(self) -> Box<dyn System> {
        self.system
    }
}
