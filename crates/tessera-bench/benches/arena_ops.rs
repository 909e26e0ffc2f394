//! Criterion micro-benchmarks for arena allocation, reuse, and growth.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_arena::{Arena, ArenaConfig};
use tessera_bench::churn_sizes;

/// Arena large enough that the churn traces rarely grow it.
fn make_arena() -> Arena {
    Arena::new(ArenaConfig::with_pages(64, 256)).unwrap()
}

/// Benchmark: 1K allocations into a fresh arena, then reset.
fn bench_arena_alloc_1k(c: &mut Criterion) {
    let sizes = churn_sizes(1000, 42);
    let mut arena = make_arena();
    c.bench_function("arena_alloc_1k", |b| {
        b.iter(|| {
            for &size in &sizes {
                black_box(arena.allocate(size).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: allocate/free churn served from the free list.
fn bench_arena_churn(c: &mut Criterion) {
    let sizes = churn_sizes(256, 7);
    let mut arena = make_arena();
    // Warm the free list with one block of every size.
    let warm: Vec<_> = sizes.iter().map(|&s| arena.allocate(s).unwrap()).collect();
    for offset in warm {
        arena.deallocate(offset);
    }

    c.bench_function("arena_churn_256", |b| {
        b.iter(|| {
            let live: Vec<_> = sizes.iter().map(|&s| arena.allocate(s).unwrap()).collect();
            for offset in live {
                arena.deallocate(black_box(offset));
            }
        });
    });
}

/// Benchmark: growth from one page to 64 pages, one page at a time.
fn bench_arena_grow(c: &mut Criterion) {
    c.bench_function("arena_grow_64_pages", |b| {
        b.iter(|| {
            let mut arena = Arena::new(ArenaConfig::with_pages(1, 64)).unwrap();
            let page = arena.config().page_size;
            for _ in 1..64 {
                arena.grow(page).unwrap();
            }
            black_box(arena.capacity());
        });
    });
}

criterion_group!(
    benches,
    bench_arena_alloc_1k,
    bench_arena_churn,
    bench_arena_grow
);
criterion_main!(benches);
