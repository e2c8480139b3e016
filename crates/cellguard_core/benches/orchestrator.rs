//! Orchestrator benchmarks for cellguard_core.
//!
//! Run with: `cargo bench -p cellguard_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use cellguard_core::orchestrator::GameplayOrchestrator;
use cellguard_test_utils::fixtures::{bloodstream_zone, drive_frame, lungs_zone, run_scripted};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// Frame cost of a scripted session, warmed up to a busy field.
pub fn orchestrator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("orchestrator");

    for zone in [bloodstream_zone(), lungs_zone()] {
        let mut warmed = GameplayOrchestrator::new(zone.clone(), 42);
        run_scripted(&mut warmed, 1800);

        group.bench_function(format!("{}_60_frames", zone.id), |b| {
            b.iter_batched(
                || warmed.clone(),
                |mut session| {
                    for frame in 1800..1860 {
                        drive_frame(&mut session, frame);
                    }
                    session
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("{}_state_hash", zone.id), |b| {
            b.iter(|| black_box(&warmed).state_hash());
        });
    }

    group.finish();
}

criterion_group!(benches, orchestrator_benchmark);
criterion_main!(benches);
