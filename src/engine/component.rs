//! # Component Contract
//!
//! This module defines what a component is, how it is stored on an entity, and
//! how sets of component types are described for interest predicates and
//! indexed queries.
//!
//! ## Contract
//! - A component is a data-only unit owned by exactly one entity.
//! - [`Component::on_attached`] fires exactly once per attach and
//!   [`Component::on_detached`] exactly once per detach, including detaches
//!   performed while the owning entity is destroyed.
//! - The owner is recorded before `on_attached` runs, so a hook may inspect
//!   sibling components through its [`Attachment`]. Such a same-entity
//!   dependency must be documented by the concrete component type; the runtime
//!   gives no ordering guarantee among independently attached components.
//!
//! ## Storage
//! Components are stored type-erased (`Box<dyn Component>`) in a map keyed by
//! [`TypeId`], one slot per type. Typed access downcasts at the boundary via
//! [`AsAny`]; the erased storage is never exposed.
//!
//! ## Describing interest
//! - [`ComponentTuple`] is implemented for tuples of up to eight component
//!   types and gives an allocation-free conjunction check
//!   (`entity.has_all::<(Position, Velocity)>()`).
//! - [`ComponentSet`] is a sorted, deduplicated set of [`ComponentKey`]s for
//!   interest sets built at runtime.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::engine::entity::Entity;
use crate::engine::types::{ComponentKey, EntityId};


/// Upcasting helper so type-erased components can be downcast.
///
/// Implemented for every `'static` type. Call it through the trait object
/// (`<dyn Component as AsAny>::as_any(value)`) so the blanket impl is never
/// picked for a `Box` or reference wrapper by accident.

pub trait AsAny: Any {
    /// Borrows `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Borrows `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts a boxed value into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any { self }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any { self }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> { self }
}

/// A data-only unit of state attachable to an [`Entity`].
///
/// Both hooks default to no-ops. Hooks must not assume that any sibling exists
/// unless the component documents that dependency.
///
/// ## Example
/// ```ignore
/// struct Health(u32);
/// impl Component for Health {}
///
/// struct Shield { absorbs: u32 }
/// impl Component for Shield {
///     // Requires `Health` to be attached first.
///     fn on_attached(&mut self, ctx: &Attachment<'_>) {
///         debug_assert!(ctx.has_sibling::<Health>());
///     }
/// }
/// ```

pub trait Component: AsAny {
    /// Called once, after the owner is recorded and before the component is
    /// visible through the entity.
    fn on_attached(&mut self, _ctx: &Attachment<'_>) {}

    /// Called once, after the component has been taken off the entity.
    fn on_detached(&mut self, _ctx: &Attachment<'_>) {}
}

/// Context handed to component lifecycle hooks.
///
/// Gives the owning entity's id and read-only access to the components still
/// attached to it. The component whose hook is running is not among them.

pub struct Attachment<'a> {
    owner: EntityId,
    siblings: &'a ComponentMap,
}

impl<'a> Attachment<'a> {
    pub(crate) fn new(owner: EntityId, siblings: &'a ComponentMap) -> Self {
        Self { owner, siblings }
    }

    /// Entity that owns (or, in `on_detached`, owned) the component.
    #[inline]
    pub fn owner(&self) -> EntityId { self.owner }

    /// Returns sibling component `T`, if attached.
    pub fn sibling<T: Component>(&self) -> Option<&'a T> {
        self.siblings.get(&TypeId::of::<T>()).and_then(|slot| slot.downcast_ref::<T>())
    }

    /// Returns `true` if sibling component `T` is attached.
    pub fn has_sibling<T: Component>(&self) -> bool {
        self.siblings.contains_key(&TypeId::of::<T>())
    }
}

/// Per-entity component storage, one slot per component type.
pub(crate) type ComponentMap = HashMap<TypeId, ComponentSlot>;

/// One attached component plus the bookkeeping the entity keeps about it.
///
/// ## Fields
/// * `key` — Type key of the stored value.
/// * `owner` — Entity the component is attached to.
/// * `sequence` — Attach order on the owning entity; destruction detaches in
///   reverse order.
/// * `enabled` — Flag interpreted by systems only.

pub(crate) struct ComponentSlot {
    pub(crate) key: ComponentKey,
    pub(crate) owner: EntityId,
    pub(crate) sequence: u64,
    pub(crate) enabled: bool,
    pub(crate) value: Box<dyn Component>,
}

impl ComponentSlot {
    #[inline]
    pub(crate) fn downcast_ref<T: Component>(&self) -> Option<&T> {
        <dyn Component as AsAny>::as_any(self.value.as_ref()).downcast_ref::<T>()
    }

    #[inline]
    pub(crate) fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        <dyn Component as AsAny>::as_any_mut(self.value.as_mut()).downcast_mut::<T>()
    }
}

/// Recovers a concrete component from its erased box.
pub(crate) fn unbox_component<T: Component>(value: Box<dyn Component>) -> Option<T> {
    <dyn Component as AsAny>::into_any(value).downcast::<T>().ok().map(|boxed| *boxed)
}

/// A statically typed group of component types.
///
/// Implemented for tuples `(A,)` through `(A, B, C, D, E, F, G, H)`.

pub trait ComponentTuple {
    /// Type keys of every member, in declaration order.
    fn keys() -> Vec<ComponentKey>;

    /// Returns `true` if `entity` holds every member type.
    fn all_present(entity: &Entity) -> bool;
}

macro_rules! impl_component_tuple {
    ($($member:ident),+) => {
        impl<$($member: Component),+> ComponentTuple for ($($member,)+) {
            fn keys() -> Vec<ComponentKey> {
                vec![$(ComponentKey::of::<$member>()),+]
            }

            #[inline]
            fn all_present(entity: &Entity) -> bool {
                $(entity.has_component::<$member>())&&+
            }
        }
    };
}

impl_component_tuple!(A);
impl_component_tuple!(A, B);
impl_component_tuple!(A, B, C);
impl_component_tuple!(A, B, C, D);
impl_component_tuple!(A, B, C, D, E);
impl_component_tuple!(A, B, C, D, E, F);
impl_component_tuple!(A, B, C, D, E, F, G);
impl_component_tuple!(A, B, C, D, E, F, G, H);

/// A runtime set of component type keys.
///
/// ## Invariants
/// Keys are kept sorted and free of duplicates, so two sets built from the
/// same types in any order compare equal.

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentSet {
    keys: Vec<ComponentKey>,
}

impl ComponentSet {
    /// Creates an empty set.
    pub fn new() -> Self { Self::default() }

    /// Creates a set from the members of a [`ComponentTuple`].
    pub fn of<Q: ComponentTuple>() -> Self {
        Self::from_keys(Q::keys())
    }

    /// Creates a set from arbitrary keys.
    pub fn from_keys(keys: impl IntoIterator<Item = ComponentKey>) -> Self {
        let mut keys: Vec<ComponentKey> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }

    /// Adds component type `T` (builder style).
    pub fn with<T: Component>(mut self) -> Self {
        self.insert(ComponentKey::of::<T>());
        self
    }

    /// Inserts a key; returns `false` if it was already present.
    pub fn insert(&mut self, key: ComponentKey) -> bool {
        match self.keys.binary_search(&key) {
            Ok(_) => false,
            Err(position) => {
                self.keys.insert(position, key);
                true
            }
        }
    }

    /// Returns `true` if `key` is a member.
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.keys.binary_search(key).is_ok()
    }

    /// Members as a sorted slice.
    #[inline]
    pub fn keys(&self) -> &[ComponentKey] { &self.keys }

    /// Number of member types.
    #[inline]
    pub fn len(&self) -> usize { self.keys.len() }

    /// Returns `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}
