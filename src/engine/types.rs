//! Core Identifiers and Type Keys
//!
//! This module defines the small, copyable identifiers shared by every part of
//! the runtime: entities, managers, systems and component type keys.
//!
//! ## Identifier allocation
//!
//! - [`EntityId`] and [`ManagerId`] are drawn from process-wide monotonic
//!   counters. An entity therefore keeps the same identifier whether it was
//!   created by a manager or built standalone and handed to one later.
//! - [`SystemId`] values are allocated per manager, in registration order.
//!
//! Counters only hand out numbers; they hold no registry state, so every
//! manager remains an independent, explicitly constructed instance.
//!
//! ## Component keys
//!
//! A [`ComponentKey`] is the stable type identifier used to key per-entity
//! component storage and the manager's inverted index. It wraps a [`TypeId`]
//! and keeps the Rust type name around for diagnostics only.

use std::any::{type_name, TypeId};
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};


static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, stable identifier of an entity.
///
/// Identifiers are never reused within a process. Ordering follows allocation
/// order, which the manager uses to keep its live set in creation order.

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocates a fresh identifier.
    pub(crate) fn allocate() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[inline]
    pub fn raw(self) -> u64 { self.0 }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a [`Manager`](crate::Manager) instance.
///
/// Entities record the manager they are bound to; adding an entity to a
/// different manager is rejected with an ownership conflict.

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn allocate() -> Self {
        Self(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[inline]
    pub fn raw(self) -> u64 { self.0 }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manager-{}", self.0)
    }
}

/// Identifier of a registered system, unique within one manager.
///
/// Adding the same kind of system again yields a new identifier and places it
/// at the end of the dispatch order.

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SystemId(pub(crate) u32);

impl SystemId {
    /// Returns the raw numeric value.
    #[inline]
    pub fn raw(self) -> u32 { self.0 }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system-{}", self.0)
    }
}

/// Stable type identifier of a component type.
///
/// ## Invariants
/// Equality, hashing and ordering are defined by the wrapped [`TypeId`] alone.
/// The name is informational and never participates in comparisons.

#[derive(Clone, Copy)]
pub struct ComponentKey {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Returns the key for component type `T`.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), name: type_name::<T>() }
    }

    /// Returns the underlying [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId { self.type_id }

    /// Returns the Rust type name, for diagnostics.
    #[inline]
    pub fn name(&self) -> &'static str { self.name }

    /// Returns `true` if this key refers to type `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool { self.type_id == other.type_id }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) { self.type_id.hash(state); }
}

impl PartialOrd for ComponentKey {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> { Some(self.cmp(other)) }
}

impl Ord for ComponentKey {
    fn cmp(&self, other: &Self) -> CmpOrdering { self.type_id.cmp(&other.type_id) }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKey({})", self.name)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
