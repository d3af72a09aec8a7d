//! The [`GameSystem`] seam between the core runtime and game rules.
//!
//! A system is external game-rule logic: it receives a start hook when the
//! game starts (or immediately, if added to a running game) and registers
//! event listeners under its own [`SystemId`], so that removing the system
//! tears down exactly what it registered.
//!
//! Systems declare their component dependencies by constructing
//! [`crate::ComponentRetriever`] values explicitly — retrievers are
//! zero-state and game-independent, so no injection step is needed.

use serde::{Deserialize, Serialize};

use crate::game::Game;

/// Owner identifier for listener registrations, allocated by
/// [`Game::add_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(u64);

impl SystemId {
    /// Owner for listeners registered outside any system (tests, host code).
    pub const EXTERNAL: SystemId = SystemId(0);

    /// Create a system id from a raw `u64`.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "System({})", self.0)
    }
}

/// External game-rule logic driven by the core runtime.
pub trait GameSystem: 'static {
    /// Human-readable name, for logging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Start hook. Runs once, in registration order, when the game starts —
    /// or synchronously inside [`Game::add_system`] if the game already left
    /// `NotStarted`. `system` is this system's listener-owner id.
    fn start_game(&mut self, game: &mut Game, system: SystemId);
}
