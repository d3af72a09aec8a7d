//! Entity identity and per-entity component storage.
//!
//! An [`EntityId`] is a lightweight `u64` handle allocated by the owning
//! [`crate::Game`]; ids are monotonically increasing and never reused, even
//! after the entity is destroyed. The [`Entity`] itself is a kind-indexed
//! map of components and nothing more — behaviour lives in systems.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentKindId};

/// A unique entity identifier within one [`crate::Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity id from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity ids, starting at 1.
///
/// Ids are never recycled; [`IdSequence::was_allocated`] is how the game
/// tells "destroyed" apart from "never existed".
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub(crate) fn new() -> Self {
        Self { last: 0 }
    }

    pub(crate) fn allocate(&mut self) -> EntityId {
        self.last += 1;
        EntityId(self.last)
    }

    pub(crate) fn was_allocated(&self, id: EntityId) -> bool {
        id.0 >= 1 && id.0 <= self.last
    }
}

/// A game object: an id plus a kind-indexed mapping of components.
///
/// One component instance per kind per entity; adding a component of an
/// already-present kind overwrites the stored one. Component mutation fires
/// no events — only the [`crate::Game`] lifecycle operations are guarded.
pub struct Entity {
    id: EntityId,
    components: HashMap<ComponentKindId, Box<dyn Component>>,
}

impl Entity {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            components: HashMap::new(),
        }
    }

    /// This entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Store `component` keyed by its concrete kind, overwriting any existing
    /// component of the same kind. Returns `&mut self` for chaining during
    /// entity setup.
    pub fn add_component<T: Component>(&mut self, component: T) -> &mut Self {
        self.components
            .insert(ComponentKindId::of::<T>(), Box::new(component));
        self
    }

    pub(crate) fn insert_boxed(&mut self, component: Box<dyn Component>) {
        let kind = ComponentKindId::from_name(component.kind_name());
        self.components.insert(kind, component);
    }

    /// Returns `true` if a component of exact kind `T` is stored.
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.has_kind(ComponentKindId::of::<T>())
    }

    /// Returns `true` if a component of exact kind `kind` is stored.
    #[must_use]
    pub fn has_kind(&self, kind: ComponentKindId) -> bool {
        self.components.contains_key(&kind)
    }

    /// Fetch the component of exact kind `T`. Absence is a valid, non-failing
    /// outcome.
    #[must_use]
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .get(&ComponentKindId::of::<T>())
            .and_then(|boxed| {
                let any: &dyn Any = boxed.as_ref();
                any.downcast_ref::<T>()
            })
    }

    /// Mutable variant of [`Entity::component`].
    #[must_use]
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&ComponentKindId::of::<T>())
            .and_then(|boxed| {
                let any: &mut dyn Any = boxed.as_mut();
                any.downcast_mut::<T>()
            })
    }

    /// Remove the component of exact kind `T` if present; no-op otherwise.
    pub fn remove_component<T: Component>(&mut self) {
        self.components.remove(&ComponentKindId::of::<T>());
    }

    /// Every stored component whose kind is `kind` or whose capability set
    /// contains `kind`. This is a query, not an iteration contract: order is
    /// unspecified.
    #[must_use]
    pub fn super_components(&self, kind: ComponentKindId) -> Vec<&dyn Component> {
        self.components
            .values()
            .filter(|component| component.counts_as(kind))
            .map(|component| &**component)
            .collect()
    }

    /// Names of all stored component kinds, for diagnostics.
    #[must_use]
    pub fn component_names(&self) -> Vec<&'static str> {
        self.components
            .values()
            .map(|component| component.kind_name())
            .collect()
    }

    /// Number of stored components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn clear_components(&mut self) {
        self.components.clear();
    }

    pub(crate) fn clone_components(&self, target: EntityId) -> Vec<Box<dyn Component>> {
        self.components
            .values()
            .filter_map(|component| (**component).clone_into(target))
            .collect()
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("components", &self.component_names())
            .finish()
    }
}
