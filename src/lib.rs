//! # ECS Runtime
//!
//! Entity/component/system runtime for dynamically composed game objects.
//!
//! ## Design Goals
//! - Entities hold at most one component per type, accessed through typed
//!   accessors over type-erased storage
//! - Entity and system registry changes are deferred to a per-tick
//!   synchronization point, so systems may create and destroy freely while
//!   iterating
//! - An inverted index (component type → entities) answers multi-type
//!   queries in time proportional to the smallest matching bucket
//! - Single-threaded, synchronous dispatch in registration order
//!
//! ## Quick start
//! ```
//! use ecs_runtime::prelude::*;
//!
//! struct Position(f32);
//! impl Component for Position {}
//!
//! struct Velocity(f32);
//! impl Component for Velocity {}
//!
//! let mut manager = Manager::new();
//! let id = {
//!     let mut entity = manager.create_entity();
//!     entity.add_component(Position(0.0)).unwrap();
//!     entity.add_component(Velocity(2.0)).unwrap();
//!     entity.id()
//! };
//!
//! manager.add_system(FnSystem::new(
//!     "movement",
//!     ComponentSet::of::<(Position, Velocity)>(),
//!     |manager: &mut Manager, entities: &[EntityId], delta: f32| {
//!         for &id in entities {
//!             if let Some(mut entity) = manager.entity_mut(id) {
//!                 let speed = entity.get_component::<Velocity>().map_or(0.0, |v| v.0);
//!                 if let Some(position) = entity.get_component_mut::<Position>() {
//!                     position.0 += speed * delta;
//!                 }
//!             }
//!         }
//!     },
//! ));
//!
//! manager.update(0.5);
//! let position = manager.get_entity(id).and_then(|e| e.get_component::<Position>());
//! assert_eq!(position.map(|p| p.0), Some(1.0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::manager::Manager;

pub use engine::entity::{
    Entity,
    EntityMut,
};

pub use engine::component::{
    AsAny,
    Attachment,
    Component,
    ComponentSet,
    ComponentTuple,
};

pub use engine::index::ComponentIndex;

pub use engine::systems::{
    System,
    FnSystem,
    RemovedSystem,
};

pub use engine::commands::SyncSummary;

pub use engine::events::{
    ManagerEvent,
    SubscriptionId,
};

pub use engine::config::ManagerConfig;

pub use engine::error::{
    ConfigError,
    DuplicateComponentError,
    EcsError,
    EcsResult,
    OwnershipConflictError,
};

pub use engine::types::{
    ComponentKey,
    EntityId,
    ManagerId,
    SystemId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used runtime types.
///
/// Import with:
/// ```rust
/// use ecs_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Attachment,
        Component,
        ComponentKey,
        ComponentSet,
        EcsResult,
        Entity,
        EntityId,
        EntityMut,
        FnSystem,
        Manager,
        ManagerEvent,
        System,
        SystemId,
    };
}
