//! Benchmark inputs for the Tessera compute runtime.
//!
//! Everything here is deterministic in its seed so runs are comparable:
//!
//! - [`random_vector`] / [`random_matrix`]: uniform samples in `[-1, 1)`
//! - [`churn_sizes`]: a mixed allocation-size trace for free-list reuse
//! - [`bench_pool_config`]: a pool sized for benchmarking

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tessera_engine::PoolConfig;

/// `len` uniform samples in `[-1, 1)` from a ChaCha8 stream seeded with `seed`.
pub fn random_vector(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// A row-major `rows x cols` matrix of uniform samples.
pub fn random_matrix(rows: usize, cols: usize, seed: u64) -> Vec<f64> {
    random_vector(rows * cols, seed)
}

/// `count` allocation sizes in bytes, drawn from a small set of common
/// vector lengths so freed blocks are often reusable.
pub fn churn_sizes(count: usize, seed: u64) -> Vec<usize> {
    const LENGTHS: [usize; 6] = [4, 16, 64, 100, 256, 1000];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| LENGTHS[rng.random_range(0..LENGTHS.len())] * 8)
        .collect()
}

/// Pool configuration used by the pool benchmarks.
pub fn bench_pool_config(workers: usize) -> PoolConfig {
    PoolConfig {
        max_pending_per_worker: PoolConfig::DEFAULT_MAX_PENDING_PER_WORKER,
        ..PoolConfig::with_workers(workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(random_vector(64, 7), random_vector(64, 7));
        assert_ne!(random_vector(64, 7), random_vector(64, 8));
        assert_eq!(churn_sizes(32, 1), churn_sizes(32, 1));
    }

    #[test]
    fn samples_are_in_range() {
        assert!(random_matrix(8, 8, 3)
            .iter()
            .all(|x| (-1.0..1.0).contains(x)));
        assert!(churn_sizes(100, 2).iter().all(|s| s % 8 == 0));
    }
}
