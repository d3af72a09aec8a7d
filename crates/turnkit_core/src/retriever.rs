//! Typed component accessors.
//!
//! A retriever is a stateless, reusable handle bound to one component kind.
//! It packages the "look up kind T on some entity" pattern without any cast
//! at the call site, and is safe to share across entities, games and time.
//! Systems construct their retrievers explicitly, usually in their
//! constructors — there is no injection step, because a retriever carries no
//! per-game state.

use std::marker::PhantomData;

use crate::component::Component;
use crate::entity::EntityId;
use crate::error::GameError;
use crate::game::Game;

/// A typed accessor for component kind `T` on a given entity.
pub struct ComponentRetriever<T: Component> {
    _kind: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRetriever<T> {
    /// Create a retriever for kind `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self { _kind: PhantomData }
    }

    /// Whether `entity` is live and holds a component of kind `T`.
    #[must_use]
    pub fn has(&self, game: &Game, entity: EntityId) -> bool {
        game.entity(entity)
            .is_some_and(|entity| entity.has_component::<T>())
    }

    /// Fetch the component; absence is a valid, non-failing outcome.
    #[must_use]
    pub fn get<'g>(&self, game: &'g Game, entity: EntityId) -> Option<&'g T> {
        game.component::<T>(entity)
    }

    /// Mutable variant of [`ComponentRetriever::get`].
    #[must_use]
    pub fn get_mut<'g>(&self, game: &'g mut Game, entity: EntityId) -> Option<&'g mut T> {
        game.component_mut::<T>(entity)
    }

    /// Fetch the component, failing with a diagnostic error when absent.
    /// The error lists the entity's stored component kinds and whether the
    /// entity has been removed.
    pub fn required<'g>(&self, game: &'g Game, entity: EntityId) -> Result<&'g T, GameError> {
        match game.entity(entity) {
            Some(live) => live.component::<T>().ok_or_else(|| {
                let mut available = live.component_names();
                available.sort_unstable();
                GameError::ComponentNotFound {
                    kind: T::type_name(),
                    entity,
                    available: available.join(", "),
                    removed: false,
                }
            }),
            None => Err(GameError::ComponentNotFound {
                kind: T::type_name(),
                entity,
                available: String::new(),
                removed: game.was_removed(entity),
            }),
        }
    }
}

impl<T: Component> Default for ComponentRetriever<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> Clone for ComponentRetriever<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for ComponentRetriever<T> {}

/// A typed accessor for "the unique entity in the game holding kind `T`".
///
/// Resolution scans the whole game; zero or multiple holders is an
/// invalid-state failure, not an empty result.
pub struct SingletonRetriever<T: Component> {
    _kind: PhantomData<fn() -> T>,
}

impl<T: Component> SingletonRetriever<T> {
    /// Create a singleton retriever for kind `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self { _kind: PhantomData }
    }

    /// The unique holder's component.
    pub fn get<'g>(&self, game: &'g Game) -> Result<&'g T, GameError> {
        let mut found = None;
        let mut count = 0;
        for entity in game.entities() {
            if let Some(component) = entity.component::<T>() {
                count += 1;
                found = Some(component);
            }
        }
        match (count, found) {
            (1, Some(component)) => Ok(component),
            _ => Err(GameError::SingletonViolation {
                kind: T::type_name(),
                count,
            }),
        }
    }

    /// The unique holder's entity id.
    pub fn entity(&self, game: &Game) -> Result<EntityId, GameError> {
        let holders = game.entities_with_component::<T>();
        match holders.as_slice() {
            [only] => Ok(*only),
            _ => Err(GameError::SingletonViolation {
                kind: T::type_name(),
                count: holders.len(),
            }),
        }
    }

    /// Whether exactly one holder currently exists.
    #[must_use]
    pub fn has(&self, game: &Game) -> bool {
        self.entity(game).is_ok()
    }
}

impl<T: Component> Default for SingletonRetriever<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> Clone for SingletonRetriever<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for SingletonRetriever<T> {}
