use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use elastic_pool::{Config, ThreadPool};
use std::hint::black_box;

// Benchmark 1: submit + result round-trip throughput
fn bench_submit_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_throughput");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("fixed", size), &size, |b, &size| {
            let pool = ThreadPool::new(Config::fixed(num_cpus::get()));
            pool.run();
            b.iter(|| {
                let handles: Vec<_> = (0..size)
                    .map(|i| pool.submit(move || black_box(i)))
                    .collect();
                for handle in handles {
                    black_box(handle.into_result().unwrap());
                }
            });
            pool.shut_down();
        });

        group.bench_with_input(BenchmarkId::new("cached", size), &size, |b, &size| {
            let pool = ThreadPool::new(Config::cached(num_cpus::get(), num_cpus::get() * 2));
            pool.run();
            b.iter(|| {
                let handles: Vec<_> = (0..size)
                    .map(|i| pool.submit(move || black_box(i)))
                    .collect();
                for handle in handles {
                    black_box(handle.into_result().unwrap());
                }
            });
            pool.shut_down();
        });
    }

    group.finish();
}

// Benchmark 2: cpu-bound tasks, completion latency dominated by work
fn bench_cpu_workload(c: &mut Criterion) {
    fn fib(idx: usize) -> u64 {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..idx {
            let next = a.wrapping_add(b);
            a = b;
            b = next;
        }
        a
    }

    let mut group = c.benchmark_group("cpu_workload");
    group.throughput(Throughput::Elements(100));

    group.bench_function("fib_batch", |b| {
        let pool = ThreadPool::new(Config::fixed(num_cpus::get()));
        pool.run();
        b.iter(|| {
            let handles: Vec<_> = (0..100).map(|i| pool.submit(move || fib(i))).collect();
            for handle in handles {
                black_box(handle.into_result().unwrap());
            }
        });
        pool.shut_down();
    });

    group.finish();
}

criterion_group!(benches, bench_submit_throughput, bench_cpu_workload);
criterion_main!(benches);
