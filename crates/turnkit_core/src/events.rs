//! Event model and the listener registry behind the three-phase pipeline.
//!
//! Events are plain values describing something that is about to happen or
//! has happened. Listeners register against an event *type* and a [`Timing`]
//! (before or after the guarded mutation), carrying an owner [`SystemId`] so
//! that removing a system tears down exactly its listeners. Dispatch itself
//! lives on [`crate::Game`], which owns the registry.
//!
//! Listener-list mutation during an active dispatch is resolved by policy:
//! both phase lists are snapshotted when dispatch starts, so a listener
//! registered or removed from inside a callback only affects later events.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::game::Game;
use crate::system::SystemId;

/// Marker for values that can travel through the event pipeline.
pub trait Event: Any {}

/// An event whose before-phase can veto the guarded mutation.
///
/// The cancel flag starts false and is set (one-way) by a before-listener;
/// after-listeners observe it via [`CancellableEvent::is_cancelled`].
pub trait CancellableEvent: Event {
    /// Veto the guarded mutation. Irreversible for this event instance.
    fn cancel(&mut self);

    /// Whether a before-listener cancelled the mutation.
    fn is_cancelled(&self) -> bool;
}

/// Fired post-only once the game has transitioned to running; there is no
/// "before the game exists" phase.
#[derive(Debug)]
pub struct StartGameEvent;

impl Event for StartGameEvent {}

/// Fired when the game is asked to end. Cancelling keeps the game running.
#[derive(Debug, Default)]
pub struct GameOverEvent {
    cancelled: bool,
}

impl GameOverEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Event for GameOverEvent {}

impl CancellableEvent for GameOverEvent {
    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fired around entity destruction. Listeners observe the removal but cannot
/// veto it.
#[derive(Debug)]
pub struct EntityRemoveEvent {
    /// The entity being destroyed. Still present in the game table during
    /// the before phase, gone in the after phase.
    pub entity: crate::entity::EntityId,
}

impl Event for EntityRemoveEvent {}

/// When a listener runs relative to the guarded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// Before the mutation; the only phase that may cancel.
    Before,
    /// After the mutation (or after the cancelled no-op).
    After,
}

/// Type-erased listener callback.
///
/// Listeners receive the game and the event; a returned error aborts the
/// remaining dispatch for that event and propagates to the caller.
pub(crate) type ListenerFn = Rc<dyn Fn(&mut Game, &mut dyn Any) -> anyhow::Result<()>>;

struct ListenerEntry {
    owner: SystemId,
    callback: ListenerFn,
}

/// Listener registry keyed by event type and [`Timing`].
///
/// Invocation order for one key is registration order; there is no priority
/// mechanism.
#[derive(Default)]
pub struct EventExecutor {
    listeners: HashMap<(TypeId, Timing), Vec<ListenerEntry>>,
}

impl EventExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `listener` to run before the guarded mutation of every
    /// dispatched event of type `E`, owned by `owner`.
    pub fn before<E: Event>(
        &mut self,
        owner: SystemId,
        listener: impl Fn(&mut Game, &mut E) -> anyhow::Result<()> + 'static,
    ) {
        self.register::<E>(Timing::Before, owner, listener);
    }

    /// Register `listener` to run after the guarded mutation (or after the
    /// cancelled no-op) of every dispatched event of type `E`.
    pub fn after<E: Event>(
        &mut self,
        owner: SystemId,
        listener: impl Fn(&mut Game, &mut E) -> anyhow::Result<()> + 'static,
    ) {
        self.register::<E>(Timing::After, owner, listener);
    }

    fn register<E: Event>(
        &mut self,
        timing: Timing,
        owner: SystemId,
        listener: impl Fn(&mut Game, &mut E) -> anyhow::Result<()> + 'static,
    ) {
        let callback: ListenerFn = Rc::new(move |game: &mut Game, event: &mut dyn Any| {
            match event.downcast_mut::<E>() {
                Some(event) => listener(game, event),
                None => Ok(()),
            }
        });
        self.listeners
            .entry((TypeId::of::<E>(), timing))
            .or_default()
            .push(ListenerEntry { owner, callback });
    }

    /// Remove every listener `owner` registered, across all event types and
    /// timings, leaving listeners owned by others untouched.
    pub fn remove_listeners_with_identifier(&mut self, owner: SystemId) {
        for entries in self.listeners.values_mut() {
            entries.retain(|entry| entry.owner != owner);
        }
    }

    /// Number of listeners registered for event type `E` at `timing`.
    #[must_use]
    pub fn listener_count<E: Event>(&self, timing: Timing) -> usize {
        self.listeners
            .get(&(TypeId::of::<E>(), timing))
            .map_or(0, Vec::len)
    }

    pub(crate) fn snapshot(&self, event: TypeId, timing: Timing) -> Vec<ListenerFn> {
        self.listeners
            .get(&(event, timing))
            .map(|entries| entries.iter().map(|entry| Rc::clone(&entry.callback)).collect())
            .unwrap_or_default()
    }
}
