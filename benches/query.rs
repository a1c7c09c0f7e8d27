use std::hint::black_box;

use criterion::*;
use ecs_runtime::Entity;

mod common;
use common::*;


fn query_benchmark(c: &mut Criterion) {
    let manager = setup_world(AGENTS_MED).expect("setup failed");

    let mut group = c.benchmark_group("query");

    group.bench_function("indexed_intersection_100k", |b| {
        b.iter(|| black_box(manager.entities_with::<(Productivity, Wealth)>()));
    });

    group.bench_function("linear_scan_100k", |b| {
        b.iter(|| {
            let ids: Vec<_> = manager
                .get_entities()
                .filter(|entity| entity.has_all::<(Productivity, Wealth)>())
                .map(Entity::id)
                .collect();
            black_box(ids)
        });
    });

    group.bench_function("query_sum_wealth_100k", |b| {
        b.iter(|| {
            let total: f32 = manager
                .query::<(Wealth,)>()
                .filter_map(|entity| entity.get_component::<Wealth>())
                .map(|wealth| wealth.value)
                .sum();
            black_box(total)
        });
    });

    group.finish();
}

criterion_group!(benches, query_benchmark);
criterion_main!(benches);
