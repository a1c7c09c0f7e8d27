use std::hint::black_box;

use criterion::*;
use ecs_runtime::{ComponentSet, FnSystem};

mod common;
use common::*;


fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    group.bench_function("tick_2_systems_10k", |b| {
        b.iter_batched(
            || {
                let mut manager = setup_world(AGENTS_SMALL).expect("setup failed");

                // System 1: wealth += productivity
                manager.add_system(FnSystem::new(
                    "production",
                    ComponentSet::of::<(Productivity, Wealth)>(),
                    |manager, ids, _dt| {
                        for &id in ids {
                            let Some(mut agent) = manager.entity_mut(id) else { continue };
                            let Some(rate) = agent.get_component::<Productivity>().map(|p| p.rate) else {
                                continue;
                            };
                            if let Some(wealth) = agent.get_component_mut::<Wealth>() {
                                wealth.value += rate;
                            }
                        }
                    },
                ));

                // System 2: wealth decay
                manager.add_system(FnSystem::new(
                    "decay",
                    ComponentSet::of::<(Wealth,)>(),
                    |manager, ids, _dt| {
                        for &id in ids {
                            let Some(mut agent) = manager.entity_mut(id) else { continue };
                            if let Some(wealth) = agent.get_component_mut::<Wealth>() {
                                wealth.value *= 0.9999;
                            }
                        }
                    },
                ));

                manager.synchronize();
                manager
            },
            |mut manager| {
                manager.update(1.0);
                black_box(manager);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
