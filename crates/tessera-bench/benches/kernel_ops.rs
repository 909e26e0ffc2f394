//! Criterion micro-benchmarks for the kernel catalogue, through both the
//! slice kernels and the offset-level ABI.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_arena::{Arena, ArenaConfig};
use tessera_bench::{random_matrix, random_vector};
use tessera_core::Offset;
use tessera_kernels::{execute, matrix, signal, stats, vector, KernelCall, MatrixShape};

/// Benchmark: dot product over 1K / 10K / 100K elements.
fn bench_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("vec_dot");
    for len in [1_000, 10_000, 100_000] {
        let a = random_vector(len, 1);
        let b = random_vector(len, 2);
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, _| {
            bench.iter(|| black_box(vector::dot(&a, &b).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark: 64x64 matrix multiply.
fn bench_matmul_64(c: &mut Criterion) {
    let shape = MatrixShape::new(64, 64);
    let a = random_matrix(64, 64, 3);
    let b = random_matrix(64, 64, 4);
    let mut out = vec![0.0; shape.len()];
    c.bench_function("mat_multiply_64", |bench| {
        bench.iter(|| {
            matrix::multiply(&a, shape, &b, shape, &mut out).unwrap();
            black_box(out[0]);
        });
    });
}

/// Benchmark: variance and moving average over 10K samples.
fn bench_stats_signal(c: &mut Criterion) {
    let data = random_vector(10_000, 5);
    let mut out = vec![0.0; data.len()];
    c.bench_function("stats_variance_10k", |bench| {
        bench.iter(|| black_box(stats::variance(&data)));
    });
    c.bench_function("signal_moving_avg_10k_w9", |bench| {
        bench.iter(|| {
            signal::moving_average(&data, 9, &mut out).unwrap();
            black_box(out[0]);
        });
    });
}

/// Benchmark: the same dot product dispatched through the ABI, including
/// region validation.
fn bench_abi_dot(c: &mut Criterion) {
    let len = 10_000;
    let mut arena = Arena::new(ArenaConfig::default()).unwrap();
    let a = arena.allocate(len * 8).unwrap();
    let b = arena.allocate(len * 8).unwrap();
    arena
        .words_mut(a, len)
        .unwrap()
        .copy_from_slice(&random_vector(len, 1));
    arena
        .words_mut(b, len)
        .unwrap()
        .copy_from_slice(&random_vector(len, 2));

    let call = KernelCall::VecDot { a, b, len };
    c.bench_function("abi_vec_dot_10k", |bench| {
        bench.iter(|| black_box(execute(&mut arena, &call).unwrap()));
    });

    let bogus = KernelCall::VecDot {
        a: Offset(arena.capacity()),
        b,
        len,
    };
    c.bench_function("abi_invalid_pointer", |bench| {
        bench.iter(|| black_box(execute(&mut arena, &bogus).is_err()));
    });
}

criterion_group!(
    benches,
    bench_dot,
    bench_matmul_64,
    bench_stats_signal,
    bench_abi_dot
);
criterion_main!(benches);
