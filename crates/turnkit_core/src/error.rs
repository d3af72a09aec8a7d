//! Core error types.
//!
//! Every variant here is a fail-fast programming error in the surrounding
//! game logic, not a transient condition: there is no retry or recovery path
//! inside the core. For cancellable events, cancellation — not an error — is
//! the sanctioned way to veto a proposed mutation.

use crate::entity::EntityId;

/// Errors raised by the entity-component runtime.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// `start_game` was called on a game that already left `NotStarted`.
    #[error("game is already started")]
    AlreadyStarted,

    /// The entity id was never allocated by this game.
    #[error("{0} not found in this game")]
    EntityNotFound(EntityId),

    /// The entity existed but has been destroyed; its id is never reused.
    #[error("{0} has been removed")]
    EntityRemoved(EntityId),

    /// A required component was absent. Carries a diagnostic listing of the
    /// entity's stored component kinds and whether the entity was removed.
    #[error("component '{kind}' not found on {entity} (removed: {removed}); stored components: [{available}]")]
    ComponentNotFound {
        /// Name of the requested component kind.
        kind: &'static str,
        /// The entity the lookup targeted.
        entity: EntityId,
        /// Comma-separated names of the components the entity does hold.
        available: String,
        /// Whether the entity has been destroyed.
        removed: bool,
    },

    /// A singleton lookup found zero or more than one holder of the kind.
    #[error("expected exactly one entity with component '{kind}', found {count}")]
    SingletonViolation {
        /// Name of the singleton component kind.
        kind: &'static str,
        /// Number of holders actually found.
        count: usize,
    },

    /// An event listener failed; the remaining dispatch was aborted.
    #[error("event listener failed: {0}")]
    Listener(anyhow::Error),
}
