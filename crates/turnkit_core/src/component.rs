//! Core [`Component`] trait and kind identity.
//!
//! Every piece of data attached to an entity implements [`Component`]. Storage
//! is keyed by [`ComponentKindId`], a stable tag derived from the component's
//! **string name** with the FNV-1a 64-bit hash. Unlike `std::any::TypeId`,
//! a name hash is computable in `const` context, which lets component kinds
//! declare their capability sets as `&'static [ComponentKindId]` slices.

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A unique identifier for a component kind, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
///
/// The ID is deterministic across builds and platforms: any two call sites
/// hashing the same name agree on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentKindId(pub u64);

impl ComponentKindId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentKindId`] for a kind name.
    ///
    /// `const`, so capability sets can be built at compile time:
    ///
    /// ```
    /// use turnkit_core::ComponentKindId;
    ///
    /// const EQUIPMENT: ComponentKindId = ComponentKindId::from_name("Equipment");
    /// const CAPS: &[ComponentKindId] = &[EQUIPMENT];
    /// # let _ = CAPS;
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentKindId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// A typed unit of state attached to exactly one entity at a time.
///
/// An entity holds at most one component of a given concrete kind; adding a
/// second overwrites the first. The trait doubles as the seam for two
/// explicit capabilities that replace runtime subtype checks:
///
/// - [`Component::capabilities`] tags a kind with the base kinds it also
///   counts as, answering "all components that are also a K" queries.
/// - [`Component::clone_into`] opts a kind into entity copying; kinds that
///   keep the default are silently skipped by [`crate::Game::copy_entity`].
///
/// # Examples
///
/// ```
/// use turnkit_core::Component;
///
/// #[derive(Debug)]
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
///     fn kind_name(&self) -> &'static str { Self::type_name() }
/// }
/// # let _ = Health { current: 1, max: 2 };
/// ```
pub trait Component: Any {
    /// The canonical name for this component kind.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Instance mirror of [`Component::type_name`], callable on boxed values.
    fn kind_name(&self) -> &'static str;

    /// Base kinds this component also counts as in supertype queries.
    fn capabilities(&self) -> &'static [ComponentKindId] {
        &[]
    }

    /// Produce an independent copy of this component for `target`.
    ///
    /// Returning `None` (the default) marks the kind as not copyable. A copy
    /// must not alias mutable state with the original.
    fn clone_into(&self, target: EntityId) -> Option<Box<dyn Component>> {
        let _ = target;
        None
    }
}

impl dyn Component {
    /// The kind tag of this component instance.
    #[must_use]
    pub fn kind(&self) -> ComponentKindId {
        ComponentKindId::from_name(self.kind_name())
    }

    /// Returns `true` if this component's kind is `kind`, or its capability
    /// set contains it.
    #[must_use]
    pub fn counts_as(&self, kind: ComponentKindId) -> bool {
        self.kind() == kind || self.capabilities().contains(&kind)
    }
}
