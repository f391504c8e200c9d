//! Benchmarks for world generation.
//!
//! Terrain noise dominates; object placement is measured with it.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fogline::mapgen::{self, MapPreset, MapSize};

fn bench_terrain(c: &mut Criterion) {
    let mut group = c.benchmark_group("terrain");
    group.sample_size(20);
    for side in [64u16, 128, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            b.iter(|| black_box(mapgen::generate_terrain(black_box(42), side, MapPreset::Default)));
        });
    }
    group.finish();
}

fn bench_full_world(c: &mut Criterion) {
    let mut group = c.benchmark_group("world");
    group.sample_size(10);
    for preset in [MapPreset::Default, MapPreset::FrozenWastes, MapPreset::InfernalRealms] {
        group.bench_function(preset.name(), |b| {
            b.iter(|| black_box(mapgen::generate(black_box(7), MapSize::Small, preset)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_terrain, bench_full_world);
criterion_main!(benches);
