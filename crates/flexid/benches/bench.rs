use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use flexid::{
    BaselineGenerator, CapacityPreset, DEFAULT_EPOCH, FlexibleGenerator, GeneratorConfig,
    IdGenerator, TimeSource,
};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (split across threads for
// contended runs). Matches the baseline sequence space so a fixed clock never
// exhausts a millisecond.
const TOTAL_IDS: usize = 4096;

fn thread_counts() -> Vec<usize> {
    let max = num_cpus::get().max(1);
    let mut counts = vec![1];
    while counts[counts.len() - 1] * 2 <= max.min(16) {
        counts.push(counts[counts.len() - 1] * 2);
    }
    counts
}

/// Benchmarks a generator on a single thread, building a fresh one per
/// iteration.
fn bench_generator<G>(c: &mut Criterion, group_name: &str, generator_factory: impl Fn() -> G)
where
    G: IdGenerator,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = generator_factory();
                for _ in 0..TOTAL_IDS {
                    black_box(generator.try_next_id().unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks one generator shared by several threads.
fn bench_generator_contended<G>(c: &mut Criterion, group_name: &str, generator_fn: impl Fn() -> G)
where
    G: IdGenerator + Send + Sync,
{
    let mut group = c.benchmark_group(group_name);

    for thread_count in thread_counts() {
        let ids_per_thread = TOTAL_IDS / thread_count;

        group.throughput(Throughput::Elements(TOTAL_IDS as u64));
        group.bench_function(format!("elems/{TOTAL_IDS}/threads/{thread_count}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();

                for _ in 0..iters {
                    let generator = Arc::new(generator_fn());
                    let barrier = Arc::new(Barrier::new(thread_count + 1));
                    scope(|s| {
                        for _ in 0..thread_count {
                            let generator = Arc::clone(&generator);
                            let barrier = Arc::clone(&barrier);
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..ids_per_thread {
                                    black_box(generator.try_next_id().unwrap());
                                }
                            });
                        }
                        barrier.wait();
                    });
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

fn benchmark_flexible_sequential(c: &mut Criterion) {
    for (name, preset) in [
        ("flexible/sequential/small", CapacityPreset::SMALL),
        ("flexible/sequential/medium", CapacityPreset::MEDIUM),
        ("flexible/sequential/large", CapacityPreset::LARGE),
    ] {
        bench_generator(c, name, || {
            FlexibleGenerator::new(GeneratorConfig::new(preset, 1).with_prefix("B")).unwrap()
        });
    }
}

fn benchmark_flexible_contended(c: &mut Criterion) {
    bench_generator_contended(c, "flexible/contended/large", || {
        FlexibleGenerator::new(GeneratorConfig::new(CapacityPreset::LARGE, 1)).unwrap()
    });
}

fn benchmark_mock_baseline_sequential(c: &mut Criterion) {
    bench_generator(c, "mock/baseline/sequential", || {
        let time = FixedMockTime {
            millis: DEFAULT_EPOCH.as_millis() as u64 + 1,
        };
        BaselineGenerator::with_time("BM", 1, DEFAULT_EPOCH, time).unwrap()
    });
}

fn benchmark_mock_baseline_contended(c: &mut Criterion) {
    bench_generator_contended(c, "mock/baseline/contended", || {
        let time = FixedMockTime {
            millis: DEFAULT_EPOCH.as_millis() as u64 + 1,
        };
        BaselineGenerator::with_time("BM", 1, DEFAULT_EPOCH, time).unwrap()
    });
}

fn benchmark_baseline_contended(c: &mut Criterion) {
    bench_generator_contended(c, "baseline/contended", || {
        BaselineGenerator::new("BC", 1).unwrap()
    });
}

criterion_group!(
    benches,
    // Mock clock
    benchmark_mock_baseline_sequential,
    benchmark_mock_baseline_contended,
    // System clock
    benchmark_flexible_sequential,
    benchmark_flexible_contended,
    benchmark_baseline_contended,
);

criterion_main!(benches);
