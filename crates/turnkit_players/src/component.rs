//! The player component.

use serde::{Deserialize, Serialize};
use turnkit_core::Component;

/// Marks an entity as a player seat.
///
/// `index` is the stable seat/turn order, fixed at construction. The result
/// fields are written only by the elimination routine in this crate, under
/// event guard — callers observe them through the getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerComponent {
    index: u32,
    name: String,
    result_position: u32,
    winner_declaration: Option<bool>,
}

impl PlayerComponent {
    /// Create an active (not yet eliminated) player.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            result_position: 0,
            winner_declaration: None,
        }
    }

    /// Stable seat/turn order, assigned at construction.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the player.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The ranking the player got in this game; 1 is the top winner, 0 means
    /// not eliminated yet.
    #[must_use]
    pub fn result_position(&self) -> u32 {
        self.result_position
    }

    /// Whether this player has been declared as winning or losing the game.
    #[must_use]
    pub fn is_eliminated(&self) -> bool {
        self.result_position != 0
    }

    /// `Some(true)` if declared winner, `Some(false)` if declared loser,
    /// `None` while still active.
    #[must_use]
    pub fn winner_declaration(&self) -> Option<bool> {
        self.winner_declaration
    }

    pub(crate) fn mark_eliminated(&mut self, position: u32, winner: bool) {
        self.result_position = position;
        self.winner_declaration = Some(winner);
    }
}

impl Component for PlayerComponent {
    fn type_name() -> &'static str {
        "Player"
    }

    fn kind_name(&self) -> &'static str {
        Self::type_name()
    }
}
