// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime Microbenchmarks
//!
//! Hot paths of a single tick: cache hit lookup, pool submit-and-wait
//! round trip, and the rolling FPS update.

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use praxis_runtime::{FrameCache, PerformanceMonitor, TaskScheduler};

fn bench_cache_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_cache");
    let frame = vec![7u8; 64 * 64 * 3];
    let cache: FrameCache<usize> = FrameCache::new(Duration::from_secs(60));
    cache
        .get_or_compute(&frame, |f: &Vec<u8>| Ok::<_, ()>(f.len()))
        .unwrap_or_default();

    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| {
        b.iter(|| {
            let value = cache.get_or_compute(black_box(&frame), |f: &Vec<u8>| Ok::<_, ()>(f.len()));
            black_box(value)
        })
    });
    group.finish();
}

fn bench_scheduler_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    for workers in [1usize, 4] {
        let pool = match TaskScheduler::new(workers) {
            Ok(pool) => pool,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::new("submit_wait", workers), &workers, |b, _| {
            b.iter(|| {
                let handles: Vec<_> = (0..3u32)
                    .filter_map(|i| pool.submit(move || Ok::<_, ()>(black_box(i) * 2)).ok())
                    .collect();
                for handle in handles {
                    black_box(handle.wait().ok());
                }
            })
        });
    }
    group.finish();
}

fn bench_performance_monitor(c: &mut Criterion) {
    let origin = Instant::now();
    let mut monitor = PerformanceMonitor::starting_at(origin);
    let mut now = origin;
    c.bench_function("performance_monitor/frame_start_fps", |b| {
        b.iter(|| {
            now += Duration::from_millis(16);
            monitor.frame_start_at(now);
            black_box(monitor.fps())
        })
    });
}

criterion_group!(
    benches,
    bench_cache_hit,
    bench_scheduler_round_trip,
    bench_performance_monitor
);
criterion_main!(benches);
