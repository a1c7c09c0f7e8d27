#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ecs_runtime::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Component for Position {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Component for Velocity {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health(pub u32);

impl Component for Health {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct A(pub u64);

impl Component for A {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct B(pub u32);

impl Component for B {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct C(pub u8);

impl Component for C {}

/// Shared attach/detach counters.
#[derive(Clone, Default)]
pub struct HookCounts {
    pub attached: Rc<Cell<u32>>,
    pub detached: Rc<Cell<u32>>,
    pub owners: Rc<RefCell<Vec<EntityId>>>,
}

impl HookCounts {
    pub fn attached(&self) -> u32 { self.attached.get() }
    pub fn detached(&self) -> u32 { self.detached.get() }
}

/// Component that records every lifecycle hook it receives.
pub struct Probe {
    pub label: u32,
    pub counts: HookCounts,
}

impl Probe {
    pub fn new(label: u32, counts: &HookCounts) -> Self {
        Self { label, counts: counts.clone() }
    }
}

impl Component for Probe {
    fn on_attached(&mut self, ctx: &Attachment<'_>) {
        self.counts.attached.set(self.counts.attached.get() + 1);
        self.counts.owners.borrow_mut().push(ctx.owner());
    }

    fn on_detached(&mut self, _ctx: &Attachment<'_>) {
        self.counts.detached.set(self.counts.detached.get() + 1);
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates an entity, lets `setup` populate it, and returns its id.
pub fn spawn(manager: &mut Manager, setup: impl FnOnce(&mut EntityMut<'_>)) -> EntityId {
    let mut entity = manager.create_entity();
    setup(&mut entity);
    entity.id()
}
