//! Benchmark: Cache lookups, preload dedup and sweeps

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use showcase_viewer::{
    AssetCache, AssetStatus, MockEngine, MockSpawner, PreloadCoordinator, Scene,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn populated_cache(entries: usize) -> AssetCache {
    let cache = AssetCache::default();
    for i in 0..entries {
        cache.record_status(&format!("/models/{i}.glb"), AssetStatus::Preloaded);
    }
    cache
}

fn cache_hit_perf_benchmark(c: &mut Criterion) {
    let cache = populated_cache(1_000);

    c.bench_function("cache_hit_check", |b| {
        b.iter(|| black_box(cache.get(black_box("/models/500.glb")).is_some()))
    });

    c.bench_function("cache_miss_check", |b| {
        b.iter(|| black_box(cache.contains(black_box("/models/unknown.glb"))))
    });

    let engine = Arc::new(MockEngine::new());
    engine.insert_scene("/models/500.glb", Scene::cuboid(Vec3::ZERO, Vec3::ONE));
    let coordinator = PreloadCoordinator::new(engine, cache.clone(), MockSpawner::blocking());

    c.bench_function("preload_warm_skip", |b| {
        b.iter(|| black_box(coordinator.preload(black_box("/models/500.glb"))))
    });

    c.bench_function("sweep_1000_fresh_entries", |b| {
        let later = Instant::now() + Duration::from_secs(1);
        b.iter(|| black_box(cache.sweep_expired(later)))
    });
}

criterion_group!(benches, cache_hit_perf_benchmark);
criterion_main!(benches);
