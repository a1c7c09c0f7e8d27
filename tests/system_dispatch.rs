use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ecs_runtime::prelude::*;
use ecs_runtime::ManagerConfig;

mod common;
use common::{init_logging, spawn, Position, Velocity, A, B};


type Trace = Rc<RefCell<Vec<String>>>;

/// Records its label and the entities it was handed on every update.
struct Recorder {
    label: &'static str,
    trace: Trace,
    seen: Rc<RefCell<Vec<Vec<EntityId>>>>,
    initialized: Rc<Cell<u32>>,
}

impl Recorder {
    fn new(label: &'static str, trace: &Trace) -> Self {
        Self {
            label,
            trace: Rc::clone(trace),
            seen: Rc::default(),
            initialized: Rc::default(),
        }
    }
}

impl System for Recorder {
    fn name(&self) -> &str {
        self.label
    }

    fn initialize(&mut self, _manager: &mut Manager) {
        self.initialized.set(self.initialized.get() + 1);
    }

    fn is_interested_in(&self, entity: &Entity) -> bool {
        entity.has_all::<(A,)>()
    }

    fn update(&mut self, _manager: &mut Manager, entities: &[EntityId], _delta: f32) {
        self.trace.borrow_mut().push(self.label.to_owned());
        self.seen.borrow_mut().push(entities.to_vec());
    }
}

fn with_a(manager: &mut Manager, n: u64) -> EntityId {
    spawn(manager, |e| {
        e.add_component(A(n)).unwrap();
    })
}

#[test]
fn systems_run_in_registration_order() {
    init_logging();
    let trace = Trace::default();
    let mut manager = Manager::new();

    let s1 = manager.add_system(Recorder::new("s1", &trace));
    let s2 = manager.add_system(Recorder::new("s2", &trace));
    let s3 = manager.add_system(Recorder::new("s3", &trace));
    assert_eq!(manager.system_count(), 0, "systems join at the next sync");

    manager.update(0.1);
    assert_eq!(manager.system_ids(), vec![s1, s2, s3]);
    assert_eq!(*trace.borrow(), ["s1", "s2", "s3"]);
    assert_eq!(manager.system_name(s2), Some("s2"));
}

#[test]
fn re_added_system_moves_to_the_end() {
    let trace = Trace::default();
    let mut manager = Manager::new();

    let s1 = manager.add_system(Recorder::new("s1", &trace));
    let s2 = manager.add_system(Recorder::new("s2", &trace));
    manager.update(0.1);

    assert!(manager.remove_system(s1));
    let s1_again = manager.add_system(Recorder::new("s1", &trace));
    assert_ne!(s1, s1_again);
    trace.borrow_mut().clear();

    let summary = manager.update(0.1);
    assert_eq!(summary.systems_added, 1);
    assert_eq!(summary.systems_removed, 1);
    assert_eq!(manager.system_ids(), vec![s2, s1_again]);
    assert_eq!(*trace.borrow(), ["s2", "s1"]);
    assert!(!manager.remove_system(s1));
}

#[test]
fn changes_made_during_update_wait_for_the_next_tick() {
    let mut manager = Manager::new();
    let victim = with_a(&mut manager, 0);
    let bystander = with_a(&mut manager, 1);
    manager.synchronize();

    let spawned: Rc<Cell<Option<EntityId>>> = Rc::default();
    let spawned_in = Rc::clone(&spawned);
    let mutator = FnSystem::new("mutator", ComponentSet::of::<(A,)>(), move |manager, _ids, _dt| {
        if spawned_in.get().is_none() {
            let id = manager.create_entity().add_component(A(2)).unwrap().id();
            spawned_in.set(Some(id));
            manager.destroy_entity(victim);
        }
    });

    let trace = Trace::default();
    let observer = Recorder::new("observer", &trace);
    let seen = Rc::clone(&observer.seen);

    manager.add_system(mutator);
    manager.add_system(observer);

    manager.update(0.1);
    let new_id = spawned.get().unwrap();
    assert_eq!(seen.borrow()[0], vec![victim, bystander]);
    assert!(manager.get_entity(new_id).is_none());
    assert!(manager.get_entity(victim).is_some());

    manager.update(0.1);
    assert_eq!(seen.borrow()[1], vec![bystander, new_id]);
    assert!(manager.get_entity(victim).is_none());
    assert_eq!(manager.tick(), 2);
}

#[test]
fn disabled_system_is_skipped() {
    let trace = Trace::default();
    let mut manager = Manager::new();
    let s1 = manager.add_system(Recorder::new("s1", &trace));
    let s2 = manager.add_system(Recorder::new("s2", &trace));

    assert!(manager.set_system_enabled(s1, false));
    manager.update(0.1);
    assert_eq!(*trace.borrow(), ["s2"]);
    assert_eq!(manager.is_system_enabled(s1), Some(false));
    assert_eq!(manager.is_system_enabled(s2), Some(true));

    manager.set_system_enabled(s1, true);
    manager.update(0.1);
    assert_eq!(*trace.borrow(), ["s2", "s1", "s2"]);
}

#[test]
fn systems_initialize_once_on_sync_by_default() {
    let trace = Trace::default();
    let mut manager = Manager::new();
    let recorder = Recorder::new("s1", &trace);
    let initialized = Rc::clone(&recorder.initialized);
    let id = manager.add_system(recorder);

    assert_eq!(manager.is_system_initialized(id), Some(false));
    manager.update(0.1);
    manager.update(0.1);
    assert_eq!(initialized.get(), 1);
    assert_eq!(manager.is_system_initialized(id), Some(true));
    assert_eq!(manager.initialize_systems(), 0);
}

#[test]
fn uninitialized_systems_are_skipped_until_initialized() {
    let config = ManagerConfig { initialize_systems_on_sync: false, ..ManagerConfig::default() };
    let trace = Trace::default();
    let mut manager = Manager::with_config(config);
    let recorder = Recorder::new("s1", &trace);
    let initialized = Rc::clone(&recorder.initialized);
    manager.add_system(recorder);

    manager.update(0.1);
    assert_eq!(manager.system_count(), 1);
    assert!(trace.borrow().is_empty());

    assert_eq!(manager.initialize_systems(), 1);
    manager.update(0.1);
    assert_eq!(initialized.get(), 1);
    assert_eq!(*trace.borrow(), ["s1"]);
}

struct Spawner;

impl System for Spawner {
    fn initialize(&mut self, manager: &mut Manager) {
        manager.create_entity().add_component(B(0)).unwrap();
    }

    fn is_interested_in(&self, entity: &Entity) -> bool {
        entity.has_all::<(B,)>()
    }

    fn update(&mut self, manager: &mut Manager, entities: &[EntityId], _delta: f32) {
        for &id in entities {
            if let Some(mut entity) = manager.entity_mut(id) {
                entity.get_component_mut::<B>().unwrap().0 += 1;
            }
        }
    }
}

#[test]
fn entities_created_during_initialize_go_live_next_sync() {
    let mut manager = Manager::new();
    manager.add_system(Spawner);

    manager.update(0.1);
    assert_eq!(manager.entity_count(), 0);
    assert_eq!(manager.pending_entity_count(), 1);

    manager.update(0.1);
    let counts: Vec<u32> = manager.query::<(B,)>().map(|e| e.get_component::<B>().unwrap().0).collect();
    assert_eq!(counts, vec![1]);
}

#[test]
fn inactive_entities_are_not_dispatched() {
    let trace = Trace::default();
    let mut manager = Manager::new();
    let shown = with_a(&mut manager, 0);
    let hidden = with_a(&mut manager, 1);
    manager.entity_mut(hidden).unwrap().set_active(false);

    let recorder = Recorder::new("s1", &trace);
    let seen = Rc::clone(&recorder.seen);
    manager.add_system(recorder);
    manager.update(0.1);

    assert_eq!(*seen.borrow(), vec![vec![shown]]);
}

#[test]
fn nested_synchronize_is_refused() {
    let mut manager = Manager::new();
    let refused: Rc<Cell<bool>> = Rc::default();
    let refused_in = Rc::clone(&refused);

    manager.add_system(FnSystem::new("nested", ComponentSet::new(), move |manager, _ids, _dt| {
        manager.create_entity();
        let summary = manager.synchronize();
        refused_in.set(summary.is_empty() && manager.pending_entity_count() == 1);
    }));

    manager.update(0.1);
    assert!(refused.get());
    assert_eq!(manager.entity_count(), 0);
}

#[test]
fn movement_integrates_velocity() {
    let mut manager = Manager::new();
    let id = spawn(&mut manager, |e| {
        e.add_component(Position { x: 0.0, y: 0.0 }).unwrap()
            .add_component(Velocity { dx: 2.0, dy: -1.0 }).unwrap();
    });

    manager.add_system(FnSystem::new(
        "movement",
        ComponentSet::of::<(Position, Velocity)>(),
        |manager, ids, dt| {
            for &id in ids {
                let Some(mut entity) = manager.entity_mut(id) else { continue };
                let velocity = *entity.get_component::<Velocity>().unwrap();
                let position = entity.get_component_mut::<Position>().unwrap();
                position.x += velocity.dx * dt;
                position.y += velocity.dy * dt;
            }
        },
    ));

    manager.update(0.5);
    manager.update(0.5);
    let position = manager.get_entity(id).unwrap().get_component::<Position>().unwrap();
    assert_eq!(*position, Position { x: 2.0, y: -1.0 });
}

#[test]
fn registry_changes_during_update_wait_for_the_next_tick() {
    let trace = Trace::default();
    let mut manager = Manager::new();

    let late: Rc<RefCell<Option<Recorder>>> = Rc::new(RefCell::new(Some(Recorder::new("late", &trace))));
    let victim_id: Rc<Cell<Option<SystemId>>> = Rc::default();

    let killer_trace = Rc::clone(&trace);
    let killer_late = Rc::clone(&late);
    let killer_victim = Rc::clone(&victim_id);
    let killer = manager.add_system(FnSystem::new("killer", ComponentSet::new(), move |manager, _ids, _dt| {
        killer_trace.borrow_mut().push("killer".to_owned());
        if let Some(recorder) = killer_late.borrow_mut().take() {
            if let Some(victim) = killer_victim.get() {
                assert!(manager.remove_system(victim));
            }
            manager.add_system(recorder);
            // The live list is untouched until the next synchronization point.
            assert_eq!(manager.system_count(), 2);
        }
    }));
    let victim = manager.add_system(Recorder::new("victim", &trace));
    victim_id.set(Some(victim));
    manager.synchronize();

    manager.dispatch(0.1);
    assert_eq!(*trace.borrow(), ["killer", "victim"]);

    trace.borrow_mut().clear();
    manager.update(0.1);
    assert_eq!(*trace.borrow(), ["killer", "late"]);
    assert_eq!(manager.system_count(), 2);
    assert_eq!(manager.system_ids()[0], killer);
    assert_eq!(manager.system_name(manager.system_ids()[1]), Some("late"));
}

#[test]
fn nested_update_does_not_count_as_a_tick() {
    let mut manager = Manager::new();
    manager.add_system(FnSystem::new("nested", ComponentSet::new(), |manager, _ids, _dt| {
        let summary = manager.update(0.0);
        assert!(summary.is_empty());
    }));

    manager.update(0.1);
    assert_eq!(manager.tick(), 1);
    manager.update(0.1);
    assert_eq!(manager.tick(), 2);
}

#[test]
fn initialize_systems_is_refused_during_update() {
    let config = ManagerConfig { initialize_systems_on_sync: false, ..ManagerConfig::default() };
    let trace = Trace::default();
    let mut manager = Manager::with_config(config);

    let refused: Rc<Cell<Option<usize>>> = Rc::default();
    let refused_in = Rc::clone(&refused);
    let eager = manager.add_system(FnSystem::new("eager", ComponentSet::new(), move |manager, _ids, _dt| {
        refused_in.set(Some(manager.initialize_systems()));
    }));
    let recorder = Recorder::new("s1", &trace);
    let initialized = Rc::clone(&recorder.initialized);
    let lazy = manager.add_system(recorder);

    manager.synchronize();
    assert_eq!(manager.initialize_systems(), 2);
    assert_eq!(initialized.get(), 1);
    assert_eq!(manager.is_system_initialized(lazy), Some(true));

    // `late` goes live uninitialized, behind `eager`.
    let late = Recorder::new("late", &trace);
    let late_initialized = Rc::clone(&late.initialized);
    let late_id = manager.add_system(late);
    manager.update(0.1);

    assert_eq!(refused.get(), Some(0));
    assert_eq!(late_initialized.get(), 0);
    assert_eq!(manager.is_system_initialized(late_id), Some(false));
    assert_eq!(manager.is_system_initialized(eager), Some(true));
    assert_eq!(*trace.borrow(), ["s1"]);
}

#[test]
fn removed_system_can_be_restored_without_reinitializing() {
    let trace = Trace::default();
    let mut manager = Manager::new();

    let recorder = Recorder::new("s1", &trace);
    let initialized = Rc::clone(&recorder.initialized);
    let s1 = manager.add_system(recorder);
    let s2 = manager.add_system(Recorder::new("s2", &trace));
    manager.update(0.1);
    assert_eq!(initialized.get(), 1);

    manager.remove_system(s1);
    manager.update(0.1);
    let mut removed = manager.take_removed_systems();
    assert_eq!(removed.len(), 1);
    assert!(manager.take_removed_systems().is_empty());

    let removed = removed.remove(0);
    assert_eq!(removed.id(), s1);
    assert_eq!(removed.name(), "s1");
    assert!(removed.is_initialized());

    assert_eq!(manager.restore_system(removed), s1);
    trace.borrow_mut().clear();
    manager.update(0.1);

    assert_eq!(manager.system_ids(), vec![s2, s1]);
    assert_eq!(*trace.borrow(), ["s2", "s1"]);
    assert_eq!(initialized.get(), 1);
}

#[test]
fn restored_system_from_another_manager_gets_a_fresh_id() {
    let trace = Trace::default();
    let mut first = Manager::new();
    let mut second = Manager::new();

    let moved = first.add_system(Recorder::new("moved", &trace));
    first.synchronize();
    first.remove_system(moved);
    first.synchronize();

    let resident = second.add_system(Recorder::new("resident", &trace));
    let removed = first.take_removed_systems().pop().unwrap();
    let restored = second.restore_system(removed);

    assert_eq!(moved, resident);
    assert_ne!(restored, resident);
    second.update(0.1);
    assert_eq!(second.system_ids(), vec![resident, restored]);
    assert_eq!(*trace.borrow(), ["resident", "moved"]);
}

#[test]
fn untaken_removed_systems_are_dropped_at_the_next_sync() {
    let trace = Trace::default();
    let mut manager = Manager::new();
    let s1 = manager.add_system(Recorder::new("s1", &trace));
    manager.synchronize();

    manager.remove_system(s1);
    let summary = manager.synchronize();
    assert_eq!(summary.systems_removed, 1);

    // Nothing pending: the sync is a no-op apart from releasing removed systems.
    assert!(manager.synchronize().is_empty());
    assert!(manager.take_removed_systems().is_empty());
}
