//! Player elimination and finishing ranks.
//!
//! Players are eliminated one at a time in whatever order the game rules
//! decide, which is rarely rank order. Ranks are therefore claimed
//! opportunistically from the two ends of the ranking space inward: winners
//! take the lowest unclaimed rank (1 is best), losers the highest, skipping
//! ranks already claimed by earlier eliminations. Once every player is
//! eliminated, winners occupy the low numbers and losers the high ones.

use tracing::debug;
use turnkit_core::{
    CancellableEvent, ComponentRetriever, EntityId, Event, Game, GameError,
};

use crate::component::PlayerComponent;

/// Errors raised by player elimination.
#[derive(Debug, thiserror::Error)]
pub enum PlayersError {
    /// Elimination is terminal and one-way.
    #[error("player {entity} can't be eliminated more than once")]
    AlreadyEliminated {
        /// The player entity that was already eliminated.
        entity: EntityId,
    },

    /// A core runtime failure, e.g. the entity holds no player component.
    #[error(transparent)]
    Core(#[from] GameError),
}

/// Fired around the mutation that writes a player's finishing rank.
/// Cancelling leaves the player active; that is a veto, not an error.
#[derive(Debug)]
pub struct PlayerEliminatedEvent {
    /// The player entity being eliminated.
    pub entity: EntityId,
    /// Whether the player is going out as a winner.
    pub declared_winner: bool,
    /// The rank the player is about to claim (1 is best).
    pub result_position: u32,
    cancelled: bool,
}

impl PlayerEliminatedEvent {
    fn new(entity: EntityId, declared_winner: bool, result_position: u32) -> Self {
        Self {
            entity,
            declared_winner,
            result_position,
            cancelled: false,
        }
    }
}

impl Event for PlayerEliminatedEvent {}

impl CancellableEvent for PlayerEliminatedEvent {
    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Declare this player as having won the game.
pub fn win_game(game: &mut Game, entity: EntityId) -> Result<PlayerEliminatedEvent, PlayersError> {
    eliminate(game, entity, true)
}

/// Declare this player as having lost the game.
pub fn lose_game(game: &mut Game, entity: EntityId) -> Result<PlayerEliminatedEvent, PlayersError> {
    eliminate(game, entity, false)
}

/// Compute the next unclaimed rank for `entity` and assign it under a
/// cancellable [`PlayerEliminatedEvent`]. Returns the executed event so the
/// caller can observe a veto.
pub fn eliminate(
    game: &mut Game,
    entity: EntityId,
    winner: bool,
) -> Result<PlayerEliminatedEvent, PlayersError> {
    let retriever = ComponentRetriever::<PlayerComponent>::new();
    if retriever.required(game, entity)?.is_eliminated() {
        return Err(PlayersError::AlreadyEliminated { entity });
    }

    let mut players = game.entities_with_component::<PlayerComponent>();
    players.sort_by_key(|id| retriever.get(game, *id).map_or(u32::MAX, PlayerComponent::index));
    let count = players.len() as u32;

    // Winners scan 1, 2, 3, ... and losers scan N+1, N, N-1, ... for the
    // first rank no already-eliminated player holds. The entity being
    // eliminated is still unmarked, so it never blocks its own scan.
    let mut position = if winner { 0 } else { count + 2 };
    loop {
        position = if winner { position + 1 } else { position - 1 };
        let taken = players.iter().any(|id| {
            retriever
                .get(game, *id)
                .is_some_and(|player| player.is_eliminated() && player.result_position() == position)
        });
        if !taken {
            break;
        }
    }

    debug!(entity = entity.value(), winner, position, "eliminate player");
    let event = game.execute_cancellable_event(
        PlayerEliminatedEvent::new(entity, winner, position),
        move |game| {
            if let Some(player) = game.component_mut::<PlayerComponent>(entity) {
                player.mark_eliminated(position, winner);
            }
        },
    )?;
    Ok(event)
}
