//! # turnkit_core
//!
//! A minimal entity-component runtime for turn-based games: a pool of
//! entities composed of typed components, a three-phase (before / mutation /
//! after) event pipeline with optional cancellation, and typed component
//! retrieval without casts at call sites.
//!
//! This crate provides:
//!
//! - [`Component`] trait and [`ComponentKindId`] — typed units of state with
//!   stable kind tags and explicit capability sets.
//! - [`Entity`] / [`EntityId`] — kind-indexed component storage under
//!   monotone, never-reused ids.
//! - [`Event`], [`CancellableEvent`] and [`EventExecutor`] — the listener
//!   registry driving the guarded-mutation dispatch protocol.
//! - [`Game`] — the single-threaded, single-owner simulation facade that all
//!   mutation-as-event operations go through.
//! - [`ComponentRetriever`] / [`SingletonRetriever`] — stateless typed
//!   accessors.
//! - [`GameSystem`] / [`SystemId`] — the seam towards external game rules.

pub mod component;
pub mod entity;
pub mod error;
pub mod events;
pub mod game;
pub mod retriever;
pub mod system;

pub use component::{Component, ComponentKindId};
pub use entity::{Entity, EntityId};
pub use error::GameError;
pub use events::{
    CancellableEvent, EntityRemoveEvent, Event, EventExecutor, GameOverEvent, StartGameEvent,
    Timing,
};
pub use game::{Game, GameState};
pub use retriever::{ComponentRetriever, SingletonRetriever};
pub use system::{GameSystem, SystemId};
