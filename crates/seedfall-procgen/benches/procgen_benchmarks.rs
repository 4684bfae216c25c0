//! Procedural generator performance benchmarks.
//!
//! Run with: `cargo bench --bench procgen_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seedfall_procgen::terrain::{generate, TerrainParams};
use seedfall_seed::SubSeed;

fn bench_terrain_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("terrain_generation");

    for &size in &[32u32, 64, 128] {
        let params = TerrainParams {
            width: size,
            height: size,
            min_room_size: 6,
            max_split_depth: 6,
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let (map, validation) = generate(SubSeed(12345), &params).unwrap();
                black_box((map.rooms.len(), validation.attempts));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_terrain_generation);
criterion_main!(benches);
