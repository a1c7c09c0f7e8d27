//! Error types for structural and ownership failures.
//!
//! This module declares focused error types for the two failure modes the
//! runtime reports at the call site, plus an aggregate [`EcsError`] that
//! callers can propagate with `?`.
//!
//! ## Goals
//! * **Specificity:** each error type models a single failure mode.
//! * **Actionability:** structured fields (offending entity, component type,
//!   managers involved) make log lines useful without reproducing the issue.
//! * **No silent loss:** an entity rejected by [`Manager::add_entity`] is
//!   handed back inside the error instead of being dropped.
//!
//! ## What is *not* an error
//! Lookup misses (`get_component`, `get_entity`) return `None`. Contract
//! violations inside a system's `update` (for example assuming a co-component
//! that is absent) are not detected by the runtime.
//!
//! ## Examples
//! Recovering a rejected entity:
//! ```ignore
//! match other_manager.add_entity(entity) {
//!     Ok(id) => { /* queued */ }
//!     Err(conflict) => {
//!         let entity = conflict.into_entity();
//!         home_manager.add_entity(entity)?;
//!     }
//! }
//! ```
//!
//! [`Manager::add_entity`]: crate::Manager::add_entity

use std::fmt;

use thiserror::Error;

use crate::engine::entity::Entity;
use crate::engine::types::{ComponentKey, EntityId, ManagerId};


/// Returned by `add_component` when a component of the same type is already
/// attached to the entity.
///
/// The existing attachment is left untouched; the caller must remove it
/// first. The rejected component value is dropped without firing any hook.
///
/// ### Fields
/// * `entity` — Entity the attach was attempted on.
/// * `component` — Type key of the duplicated component.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("entity {entity} already has a `{component}` component attached")]
pub struct DuplicateComponentError {
    /// Entity the attach was attempted on.
    pub entity: EntityId,

    /// Type key of the duplicated component.
    pub component: ComponentKey,
}

/// Returned by `add_entity` when the entity is bound to a different manager.
///
/// The rejected entity travels inside the error and can be recovered with
/// [`into_entity`](Self::into_entity).

#[derive(Error)]
#[error("entity {entity_id} is bound to {owner} and cannot be added to {requested}")]
pub struct OwnershipConflictError {
    /// Identifier of the rejected entity.
    pub entity_id: EntityId,

    /// Manager the entity is bound to.
    pub owner: ManagerId,

    /// Manager that refused the entity.
    pub requested: ManagerId,

    entity: Box<Entity>,
}

impl OwnershipConflictError {
    pub(crate) fn new(entity: Entity, owner: ManagerId, requested: ManagerId) -> Self {
        Self { entity_id: entity.id(), owner, requested, entity: Box::new(entity) }
    }

    /// Returns the rejected entity, components intact.
    pub fn into_entity(self) -> Entity {
        *self.entity
    }

    /// Borrows the rejected entity.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }
}

impl fmt::Debug for OwnershipConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipConflictError")
            .field("entity_id", &self.entity_id)
            .field("owner", &self.owner)
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

/// Errors raised while loading a [`ManagerConfig`](crate::ManagerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for `ManagerConfig`.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Aggregate error for callers that propagate any runtime failure with `?`.
#[derive(Debug, Error)]
pub enum EcsError {
    /// See [`DuplicateComponentError`].
    #[error(transparent)]
    DuplicateComponent(#[from] DuplicateComponentError),

    /// See [`OwnershipConflictError`].
    #[error(transparent)]
    OwnershipConflict(#[from] OwnershipConflictError),

    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience result alias over [`EcsError`].
pub type EcsResult<T> = Result<T, EcsError>;
