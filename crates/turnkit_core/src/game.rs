//! The [`Game`] facade: one single-threaded, single-owner simulation.
//!
//! The game owns the entity table, the id sequence, the system list, the
//! event registry and a seedable random source. All lifecycle mutations go
//! through the three-phase event pipeline: before-listeners, the guarded
//! mutation, then after-listeners — synchronously, on the caller's thread,
//! nested dispatches included. Systems are held behind `Rc`, which also
//! makes `Game` deliberately `!Send`.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::component::Component;
use crate::entity::{Entity, EntityId, IdSequence};
use crate::error::GameError;
use crate::events::{
    CancellableEvent, EntityRemoveEvent, Event, EventExecutor, GameOverEvent, ListenerFn,
    StartGameEvent, Timing,
};
use crate::system::{GameSystem, SystemId};

/// Lifecycle state of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Constructed; systems may be added, start hooks have not run.
    NotStarted,
    /// `start_game` completed.
    Running,
    /// `end_game` ran uncancelled. Terminal.
    GameEnded,
}

struct SystemEntry {
    id: SystemId,
    name: &'static str,
    handler: Rc<RefCell<dyn GameSystem>>,
}

/// A single turn-based game simulation.
pub struct Game {
    ids: IdSequence,
    entities: HashMap<EntityId, Entity>,
    events: EventExecutor,
    systems: Vec<SystemEntry>,
    next_system_id: u64,
    rng: ChaCha8Rng,
    state: GameState,
}

impl Game {
    /// Create an empty game in [`GameState::NotStarted`], with an
    /// OS-seeded random source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: IdSequence::new(),
            entities: HashMap::new(),
            events: EventExecutor::new(),
            systems: Vec::new(),
            next_system_id: 0,
            rng: ChaCha8Rng::from_os_rng(),
            state: GameState::NotStarted,
        }
    }

    // -- Entities --

    /// Allocate the next entity id and register a new empty entity under it.
    /// Ids are monotone and never reused, even across removals.
    pub fn new_entity(&mut self) -> EntityId {
        let id = self.ids.allocate();
        trace!(entity = id.value(), "new entity");
        self.entities.insert(id, Entity::new(id));
        id
    }

    /// Look up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable lookup of a live entity.
    #[must_use]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Fetch component `T` on entity `id`; `None` if either is absent.
    #[must_use]
    pub fn component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id).and_then(|entity| entity.component::<T>())
    }

    /// Mutable variant of [`Game::component`].
    #[must_use]
    pub fn component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(&id)
            .and_then(|entity| entity.component_mut::<T>())
    }

    /// Ids of all live entities holding a component of exact kind `T`.
    /// Set semantics: unique ids, order not guaranteed.
    #[must_use]
    pub fn entities_with_component<T: Component>(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| entity.has_component::<T>())
            .map(Entity::id)
            .collect()
    }

    /// All live entities satisfying `condition`, in table iteration order
    /// (not stable across entity additions or removals).
    #[must_use]
    pub fn find_entities(&self, condition: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|entity| condition(entity))
            .map(Entity::id)
            .collect()
    }

    /// Iterator over all live entities.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether `id` was allocated by this game and later destroyed.
    #[must_use]
    pub fn was_removed(&self, id: EntityId) -> bool {
        self.ids.was_allocated(id) && !self.entities.contains_key(&id)
    }

    /// Destroy entity `id`, firing [`EntityRemoveEvent`] as a guarded,
    /// non-cancellable event. Before-listeners still see the entity; the
    /// guarded mutation clears its component storage and drops it from the
    /// table. The id is never reused.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<(), GameError> {
        if !self.entities.contains_key(&id) {
            return Err(self.missing_entity(id));
        }
        debug!(entity = id.value(), "destroy entity");
        self.execute_event(EntityRemoveEvent { entity: id }, |game| {
            if let Some(mut entity) = game.entities.remove(&id) {
                entity.clear_components();
            }
        })?;
        Ok(())
    }

    /// Create a new entity carrying an independent copy of every copyable
    /// component on `source`; non-copyable components are silently omitted.
    /// Fails with an invalid-state error if `source` was removed. No event
    /// is fired — like bulk composition, copying is setup, not a mutation
    /// systems get to observe.
    pub fn copy_entity(&mut self, source: EntityId) -> Result<EntityId, GameError> {
        if !self.entities.contains_key(&source) {
            return Err(self.missing_entity(source));
        }
        let copy = self.new_entity();
        let components = self
            .entities
            .get(&source)
            .map(|entity| entity.clone_components(copy))
            .unwrap_or_default();
        if let Some(entity) = self.entities.get_mut(&copy) {
            for component in components {
                entity.insert_boxed(component);
            }
        }
        Ok(copy)
    }

    fn missing_entity(&self, id: EntityId) -> GameError {
        if self.ids.was_allocated(id) {
            GameError::EntityRemoved(id)
        } else {
            GameError::EntityNotFound(id)
        }
    }

    // -- Event dispatch --

    /// Listener registry, for registration and inspection.
    #[must_use]
    pub fn events(&self) -> &EventExecutor {
        &self.events
    }

    /// Mutable listener registry.
    pub fn events_mut(&mut self) -> &mut EventExecutor {
        &mut self.events
    }

    /// Execute `event` around the guarded mutation `mutate`: every before
    /// listener in registration order, then `mutate` unconditionally, then
    /// every after listener. Returns the event for inspection. A listener
    /// error aborts the remaining dispatch and propagates.
    pub fn execute_event<E: Event>(
        &mut self,
        mut event: E,
        mutate: impl FnOnce(&mut Game),
    ) -> Result<E, GameError> {
        let before = self.events.snapshot(TypeId::of::<E>(), Timing::Before);
        let after = self.events.snapshot(TypeId::of::<E>(), Timing::After);
        self.run_phase(&before, &mut event)?;
        mutate(self);
        self.run_phase(&after, &mut event)?;
        Ok(event)
    }

    /// As [`Game::execute_event`], but a before-listener may cancel: if the
    /// event is cancelled after the before phase, `mutate` is skipped
    /// entirely and the after phase still runs, observing
    /// [`CancellableEvent::is_cancelled`] as `true`.
    pub fn execute_cancellable_event<E: CancellableEvent>(
        &mut self,
        mut event: E,
        mutate: impl FnOnce(&mut Game),
    ) -> Result<E, GameError> {
        let before = self.events.snapshot(TypeId::of::<E>(), Timing::Before);
        let after = self.events.snapshot(TypeId::of::<E>(), Timing::After);
        self.run_phase(&before, &mut event)?;
        if !event.is_cancelled() {
            mutate(self);
        }
        self.run_phase(&after, &mut event)?;
        Ok(event)
    }

    /// Fire only the after phase, for events describing something that has
    /// already unconditionally happened (no guarded mutation exists).
    pub fn execute_post_event<E: Event>(&mut self, mut event: E) -> Result<E, GameError> {
        let after = self.events.snapshot(TypeId::of::<E>(), Timing::After);
        self.run_phase(&after, &mut event)?;
        Ok(event)
    }

    fn run_phase(
        &mut self,
        listeners: &[ListenerFn],
        event: &mut dyn Any,
    ) -> Result<(), GameError> {
        for listener in listeners {
            listener(self, &mut *event).map_err(GameError::Listener)?;
        }
        Ok(())
    }

    // -- Systems --

    /// Append `system` to the system list and return its listener-owner id.
    /// If the game already left [`GameState::NotStarted`], the system's
    /// start hook runs synchronously before this returns.
    pub fn add_system<S: GameSystem>(&mut self, system: S) -> SystemId {
        self.next_system_id += 1;
        let id = SystemId::new(self.next_system_id);
        let name = system.name();
        info!(system = name, id = id.value(), "add system");
        let handler: Rc<RefCell<dyn GameSystem>> = Rc::new(RefCell::new(system));
        self.systems.push(SystemEntry {
            id,
            name,
            handler: Rc::clone(&handler),
        });
        if self.state != GameState::NotStarted {
            handler.borrow_mut().start_game(self, id);
        }
        id
    }

    /// Remove the system with id `system` and every listener it registered.
    /// Returns whether a system was actually removed.
    pub fn remove_system(&mut self, system: SystemId) -> bool {
        self.events.remove_listeners_with_identifier(system);
        let len_before = self.systems.len();
        self.systems.retain(|entry| entry.id != system);
        let removed = self.systems.len() != len_before;
        if removed {
            info!(id = system.value(), "remove system");
        }
        removed
    }

    /// Names of the active systems, in registration order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|entry| entry.name).collect()
    }

    // -- Lifecycle --

    /// Start the game: run every system's start hook in registration order,
    /// transition to [`GameState::Running`], then fire the post-only
    /// [`StartGameEvent`]. Fails if the game is not in `NotStarted`.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.state != GameState::NotStarted {
            return Err(GameError::AlreadyStarted);
        }
        // Index loop: a start hook may add further systems, which then also
        // get their hook before the game transitions.
        let mut index = 0;
        while index < self.systems.len() {
            let (id, handler) = {
                let entry = &self.systems[index];
                (entry.id, Rc::clone(&entry.handler))
            };
            handler.borrow_mut().start_game(self, id);
            index += 1;
        }
        self.state = GameState::Running;
        info!("game started");
        self.execute_post_event(StartGameEvent)?;
        Ok(())
    }

    /// Ask the game to end, firing the cancellable [`GameOverEvent`]. If a
    /// before-listener cancels it, the game stays [`GameState::Running`].
    /// Returns the event so callers can inspect the cancellation.
    pub fn end_game(&mut self) -> Result<GameOverEvent, GameError> {
        let event = self.execute_cancellable_event(GameOverEvent::new(), |game| {
            game.state = GameState::GameEnded;
        })?;
        info!(cancelled = event.is_cancelled(), "end game");
        Ok(event)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Returns `true` once the game reached [`GameState::GameEnded`].
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameEnded
    }

    // -- Randomness --

    /// The shared deterministic random source of this game.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Reseed the random source; all subsequent draws are determined by
    /// `seed`. Used for reproducible simulations.
    pub fn set_random_seed(&mut self, seed: u64) {
        debug!(seed, "reseed random source");
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rand::Rng;

    use super::*;
    use crate::component::ComponentKindId;

    #[derive(Debug, PartialEq)]
    struct Health {
        current: u32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }

        fn kind_name(&self) -> &'static str {
            Self::type_name()
        }

        fn clone_into(&self, _target: EntityId) -> Option<Box<dyn Component>> {
            Some(Box::new(Health {
                current: self.current,
            }))
        }
    }

    #[derive(Debug)]
    struct Cursed;

    impl Component for Cursed {
        fn type_name() -> &'static str {
            "Cursed"
        }

        fn kind_name(&self) -> &'static str {
            Self::type_name()
        }
    }

    fn entity_with_health(game: &mut Game, current: u32) -> EntityId {
        let id = game.new_entity();
        if let Some(entity) = game.entity_mut(id) {
            entity.add_component(Health { current });
        }
        id
    }

    #[test]
    fn entity_ids_are_strictly_increasing_and_never_reused() {
        let mut game = Game::new();
        let a = game.new_entity();
        let b = game.new_entity();
        game.destroy_entity(a).unwrap();
        let c = game.new_entity();
        assert!(a.value() < b.value());
        assert!(b.value() < c.value());
    }

    #[test]
    fn destroy_clears_storage_and_releases_id() {
        let mut game = Game::new();
        let id = entity_with_health(&mut game, 10);
        game.destroy_entity(id).unwrap();

        assert!(game.entity(id).is_none());
        assert!(game.component::<Health>(id).is_none());
        assert!(game.was_removed(id));
        assert!(matches!(
            game.destroy_entity(id),
            Err(GameError::EntityRemoved(_))
        ));
        assert!(matches!(
            game.destroy_entity(EntityId::from_raw(999)),
            Err(GameError::EntityNotFound(_))
        ));
    }

    #[test]
    fn destroy_fires_before_with_live_entity_and_after_with_dead_one() {
        let mut game = Game::new();
        let id = entity_with_health(&mut game, 10);

        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let before_log = Rc::clone(&seen);
        game.events_mut()
            .before::<EntityRemoveEvent>(SystemId::EXTERNAL, move |game, event| {
                before_log
                    .borrow_mut()
                    .push(("before", game.entity(event.entity).is_some()));
                Ok(())
            });
        let after_log = Rc::clone(&seen);
        game.events_mut()
            .after::<EntityRemoveEvent>(SystemId::EXTERNAL, move |game, event| {
                after_log
                    .borrow_mut()
                    .push(("after", game.entity(event.entity).is_some()));
                Ok(())
            });

        game.destroy_entity(id).unwrap();
        assert_eq!(*seen.borrow(), vec![("before", true), ("after", false)]);
    }

    #[test]
    fn copy_takes_copyable_components_only_and_does_not_alias() {
        let mut game = Game::new();
        let source = entity_with_health(&mut game, 10);
        if let Some(entity) = game.entity_mut(source) {
            entity.add_component(Cursed);
        }

        let copy = game.copy_entity(source).unwrap();
        assert_ne!(copy, source);
        assert_eq!(game.component::<Health>(copy), Some(&Health { current: 10 }));
        assert!(game.component::<Cursed>(copy).is_none());

        if let Some(health) = game.component_mut::<Health>(copy) {
            health.current = 1;
        }
        assert_eq!(game.component::<Health>(source), Some(&Health { current: 10 }));
    }

    #[test]
    fn copy_of_removed_entity_is_an_invalid_state() {
        let mut game = Game::new();
        let id = entity_with_health(&mut game, 10);
        game.destroy_entity(id).unwrap();
        assert!(matches!(
            game.copy_entity(id),
            Err(GameError::EntityRemoved(_))
        ));
    }

    #[test]
    fn entities_with_component_skips_removed_and_unrelated() {
        let mut game = Game::new();
        let a = entity_with_health(&mut game, 1);
        let b = entity_with_health(&mut game, 2);
        let bare = game.new_entity();
        game.destroy_entity(a).unwrap();

        let mut holders = game.entities_with_component::<Health>();
        holders.sort_unstable();
        assert_eq!(holders, vec![b]);
        assert!(!holders.contains(&bare));
    }

    #[test]
    fn find_entities_applies_arbitrary_predicates() {
        let mut game = Game::new();
        entity_with_health(&mut game, 1);
        let strong = entity_with_health(&mut game, 50);
        let found = game.find_entities(|entity| {
            entity
                .component::<Health>()
                .is_some_and(|health| health.current > 10)
        });
        assert_eq!(found, vec![strong]);
    }

    #[test]
    fn super_component_queries_work_through_the_game() {
        let mut game = Game::new();
        let id = entity_with_health(&mut game, 5);
        let components = game
            .entity(id)
            .map(|entity| entity.super_components(ComponentKindId::of::<Health>()))
            .unwrap_or_default();
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn start_game_transitions_and_rejects_a_second_start() {
        let mut game = Game::new();
        assert_eq!(game.state(), GameState::NotStarted);
        game.start_game().unwrap();
        assert_eq!(game.state(), GameState::Running);
        assert!(matches!(game.start_game(), Err(GameError::AlreadyStarted)));
    }

    #[test]
    fn start_game_fires_post_only_start_event() {
        let mut game = Game::new();
        let fired = Rc::new(std::cell::Cell::new(0));
        let before_fired = Rc::clone(&fired);
        game.events_mut()
            .before::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                before_fired.set(before_fired.get() + 10);
                Ok(())
            });
        let after_fired = Rc::clone(&fired);
        game.events_mut()
            .after::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                after_fired.set(after_fired.get() + 1);
                Ok(())
            });
        game.start_game().unwrap();
        // Post-only: the before listener never runs.
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn end_game_can_be_cancelled() {
        let mut game = Game::new();
        game.start_game().unwrap();
        game.events_mut()
            .before::<GameOverEvent>(SystemId::EXTERNAL, |_, event| {
                event.cancel();
                Ok(())
            });

        let event = game.end_game().unwrap();
        assert!(event.is_cancelled());
        assert_eq!(game.state(), GameState::Running);
        assert!(!game.is_game_over());

        game.events_mut()
            .remove_listeners_with_identifier(SystemId::EXTERNAL);
        let event = game.end_game().unwrap();
        assert!(!event.is_cancelled());
        assert!(game.is_game_over());
    }

    #[test]
    fn cancellable_dispatch_skips_mutation_and_still_runs_after_phase() {
        let mut game = Game::new();
        let after_saw_cancelled = Rc::new(std::cell::Cell::new(false));
        game.events_mut()
            .before::<GameOverEvent>(SystemId::EXTERNAL, |_, event| {
                event.cancel();
                Ok(())
            });
        let saw = Rc::clone(&after_saw_cancelled);
        game.events_mut()
            .after::<GameOverEvent>(SystemId::EXTERNAL, move |_, event| {
                saw.set(event.is_cancelled());
                Ok(())
            });

        let mut ran = false;
        game.execute_cancellable_event(GameOverEvent::new(), |_| ran = true)
            .unwrap();
        assert!(!ran);
        assert!(after_saw_cancelled.get());
    }

    #[test]
    fn non_cancellable_dispatch_always_runs_the_mutation() {
        let mut game = Game::new();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = Rc::clone(&order);
            game.events_mut()
                .before::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                    log.borrow_mut().push(tag);
                    Ok(())
                });
        }
        let log = Rc::clone(&order);
        game.events_mut()
            .after::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                log.borrow_mut().push("after");
                Ok(())
            });

        let mut ran = false;
        game.execute_event(StartGameEvent, |_| ran = true).unwrap();
        assert!(ran);
        assert_eq!(*order.borrow(), vec!["first", "second", "after"]);
    }

    #[test]
    fn listener_registered_during_dispatch_waits_for_the_next_event() {
        let mut game = Game::new();
        let count = Rc::new(std::cell::Cell::new(0));
        let outer_count = Rc::clone(&count);
        game.events_mut()
            .before::<StartGameEvent>(SystemId::EXTERNAL, move |game, _| {
                let inner_count = Rc::clone(&outer_count);
                game.events_mut()
                    .before::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                        inner_count.set(inner_count.get() + 1);
                        Ok(())
                    });
                Ok(())
            });

        game.execute_event(StartGameEvent, |_| {}).unwrap();
        assert_eq!(count.get(), 0);
        game.execute_event(StartGameEvent, |_| {}).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_error_aborts_the_remaining_dispatch() {
        let mut game = Game::new();
        let reached = Rc::new(std::cell::Cell::new(false));
        game.events_mut()
            .before::<StartGameEvent>(SystemId::EXTERNAL, |_, _| {
                anyhow::bail!("rule violation")
            });
        let later = Rc::clone(&reached);
        game.events_mut()
            .before::<StartGameEvent>(SystemId::EXTERNAL, move |_, _| {
                later.set(true);
                Ok(())
            });

        let mut ran = false;
        let result = game.execute_event(StartGameEvent, |_| ran = true);
        assert!(matches!(result, Err(GameError::Listener(_))));
        assert!(!ran);
        assert!(!reached.get());
    }

    struct CountingSystem {
        started: Rc<std::cell::RefCell<Vec<&'static str>>>,
        tag: &'static str,
    }

    impl GameSystem for CountingSystem {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn start_game(&mut self, _game: &mut Game, _system: SystemId) {
            self.started.borrow_mut().push(self.tag);
        }
    }

    #[test]
    fn start_hooks_run_in_registration_order() {
        let started = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut game = Game::new();
        game.add_system(CountingSystem {
            started: Rc::clone(&started),
            tag: "alpha",
        });
        game.add_system(CountingSystem {
            started: Rc::clone(&started),
            tag: "beta",
        });
        assert!(started.borrow().is_empty());

        game.start_game().unwrap();
        assert_eq!(*started.borrow(), vec!["alpha", "beta"]);
        assert_eq!(game.system_names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn adding_a_system_to_a_running_game_starts_it_synchronously() {
        let started = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut game = Game::new();
        game.start_game().unwrap();
        game.add_system(CountingSystem {
            started: Rc::clone(&started),
            tag: "late",
        });
        assert_eq!(*started.borrow(), vec!["late"]);
    }

    struct ListeningSystem;

    impl GameSystem for ListeningSystem {
        fn start_game(&mut self, game: &mut Game, system: SystemId) {
            game.events_mut()
                .before::<GameOverEvent>(system, |_, event| {
                    event.cancel();
                    Ok(())
                });
        }
    }

    #[test]
    fn remove_system_tears_down_only_its_listeners() {
        let mut game = Game::new();
        let veto = game.add_system(ListeningSystem);
        game.start_game().unwrap();
        game.events_mut()
            .before::<GameOverEvent>(SystemId::EXTERNAL, |_, _| Ok(()));

        let event = game.end_game().unwrap();
        assert!(event.is_cancelled());

        assert!(game.remove_system(veto));
        assert!(!game.remove_system(veto));
        assert_eq!(
            game.events().listener_count::<GameOverEvent>(Timing::Before),
            1
        );

        let event = game.end_game().unwrap();
        assert!(!event.is_cancelled());
        assert!(game.is_game_over());
    }

    #[test]
    fn reseeding_reproduces_the_draw_sequence() {
        let mut game = Game::new();
        game.set_random_seed(42);
        let first: [u64; 4] = std::array::from_fn(|_| game.rng().random());
        game.set_random_seed(42);
        let second: [u64; 4] = std::array::from_fn(|_| game.rng().random());
        assert_eq!(first, second);

        game.set_random_seed(43);
        let third: [u64; 4] = std::array::from_fn(|_| game.rng().random());
        assert_ne!(first, third);
    }
}
