//! ECS core performance benchmarks.
//!
//! Run with: `cargo bench --bench ecs_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::{ComponentBundle, World};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Health(u32);

fn setup_world(entity_count: usize) -> (World, Vec<seedfall_ecs::entity::EntityId>) {
    let mut world = World::new();
    world.register_component::<Position>("position");
    world.register_component::<Velocity>("velocity");
    world.register_component::<Health>("health");

    let mut entities = Vec::with_capacity(entity_count);
    for i in 0..entity_count {
        let mut bundle = ComponentBundle::new();
        bundle.add(
            world.registry(),
            Position {
                x: i as f64,
                y: 0.0,
            },
        );
        bundle.add(world.registry(), Velocity { dx: 1.0, dy: 0.0 });
        bundle.add(world.registry(), Health(100));
        entities.push(world.spawn_bundle(bundle));
    }
    (world, entities)
}

fn bench_spawn(c: &mut Criterion) {
    c.bench_function("spawn_1k_entities", |b| {
        b.iter(|| {
            let (world, _) = setup_world(1000);
            black_box(world.entity_count());
        });
    });
}

fn bench_query_iteration(c: &mut Criterion) {
    let (world, _) = setup_world(10_000);

    c.bench_function("query_pos_vel_10k", |b| {
        b.iter(|| {
            let sum: f64 = world
                .query::<(&Position, &Velocity)>()
                .map(|(_, (pos, vel))| pos.x + vel.dx)
                .sum();
            black_box(sum);
        });
    });
}

fn bench_command_buffer_apply(c: &mut Criterion) {
    let (mut world, entities) = setup_world(1000);
    let modify_count = entities.len() / 10;
    let mut tick = 0u32;

    c.bench_function("command_buffer_1k_10pct_modified", |b| {
        b.iter(|| {
            tick += 1;
            let mut buf = CommandBuffer::new();
            for &entity in entities.iter().take(modify_count) {
                buf.set_component(
                    entity,
                    "position",
                    serde_json::json!({"x": tick as f64, "y": 0.0}),
                    SystemId::ENGINE_INTERNAL,
                    CommandReason::SystemInternal("movement".to_owned()),
                );
            }
            let applied = buf.apply(&mut world);
            black_box(applied);
        });
    });
}

fn bench_snapshot_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_capture");

    for &count in &[100usize, 1000, 5000] {
        let (world, _) = setup_world(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let snapshot = world.capture_snapshot();
                black_box(snapshot.entities.len());
            });
        });
    }

    group.finish();
}

fn bench_snapshot_roundtrip(c: &mut Criterion) {
    let (world, _) = setup_world(1000);
    let snapshot = world.capture_snapshot();

    c.bench_function("snapshot_restore_1k", |b| {
        b.iter(|| {
            let mut restored = World::new();
            restored.register_component::<Position>("position");
            restored.register_component::<Velocity>("velocity");
            restored.register_component::<Health>("health");
            restored.restore_from_snapshot(&snapshot).unwrap();
            black_box(restored.entity_count());
        });
    });
}

criterion_group!(
    benches,
    bench_spawn,
    bench_query_iteration,
    bench_command_buffer_apply,
    bench_snapshot_capture,
    bench_snapshot_roundtrip,
);
criterion_main!(benches);
