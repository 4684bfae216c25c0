//! Tick loop performance benchmarks.
//!
//! Run with: `cargo bench --bench sim_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seedfall_ecs::world::{ComponentBundle, World};
use seedfall_sim::bootstrap::{register_components, register_systems};
use seedfall_procgen::content::DamageKind;
use seedfall_sim::components::{CombatStats, Health, Intent, Networked, Position, Team, Velocity};
use seedfall_sim::pipeline::{TickConfig, TickLoop};

fn build_populated_loop(entity_count: u32) -> TickLoop {
    let mut world = World::new();
    register_components(&mut world);

    for i in 0..entity_count {
        let mut bundle = ComponentBundle::new();
        bundle.add(world.registry(), Position { x: i as f32, y: 0.0, layer: 0 });
        bundle.add(world.registry(), Velocity { vx: 1.0, vy: 0.5 });
        bundle.add(world.registry(), Health { current: 100.0, max: 100.0 });
        bundle.add(
            world.registry(),
            CombatStats {
                attack: 10.0,
                defense: 5.0,
                crit_chance: 0.1,
                crit_damage: 1.5,
                resistances: Default::default(),
                cooldown: 1.0,
                cooldown_timer: 0.0,
                damage_kind: DamageKind::Physical,
            },
        );
        bundle.add(world.registry(), Team { id: i % 2 });
        bundle.add(world.registry(), Networked { last_sent_hash: 0, interest_score: 1.0 });
        bundle.add(world.registry(), Intent { move_x: 0.3, move_y: 0.1, aim_angle: 0.0, action_bits: 0, seq: 0 });
        world.spawn_bundle(bundle);
    }

    let mut tick_loop = TickLoop::new(world, TickConfig { fixed_dt: 1.0 / 60.0, headless: true });
    register_systems(&mut tick_loop);
    tick_loop
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_loop");

    for &count in &[100u32, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || build_populated_loop(count),
                |mut tick_loop| {
                    let commands = tick_loop.tick();
                    black_box(commands.len());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
