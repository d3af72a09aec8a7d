//! # turnkit_players
//!
//! Player seats and finishing ranks on top of [`turnkit_core`]: a
//! [`PlayerComponent`] marking entities as players, and the elimination
//! routine that assigns each player a rank when it wins or loses, guarded by
//! the cancellable [`PlayerEliminatedEvent`].

pub mod component;
pub mod elimination;

pub use component::PlayerComponent;
pub use elimination::{PlayerEliminatedEvent, PlayersError, eliminate, lose_game, win_game};
