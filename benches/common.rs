#![allow(dead_code)]

use ecs_runtime::{Component, EcsResult, Manager};

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Component for Position {}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

impl Component for Wealth {}

#[derive(Clone, Copy)]
pub struct Productivity {
    pub rate: f32,
}

impl Component for Productivity {}

/// Enqueues `agent_count` agents. Every agent has `Position` and `Wealth`;
/// every other agent also has `Productivity`.
pub fn populate(manager: &mut Manager, agent_count: usize) -> EcsResult<()> {
    for n in 0..agent_count {
        let mut agent = manager.create_entity();
        agent
            .add_component(Position { x: 0.0, y: 0.0 })?
            .add_component(Wealth { value: 100.0 })?;
        if n % 2 == 0 {
            agent.add_component(Productivity { rate: 1.0 })?;
        }
    }
    Ok(())
}

pub fn setup_world(agent_count: usize) -> EcsResult<Manager> {
    let mut manager = Manager::new();
    populate(&mut manager, agent_count)?;
    manager.synchronize();
    Ok(manager)
}
