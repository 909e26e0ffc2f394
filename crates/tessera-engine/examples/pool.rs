//! Tessera worker pool: least-loaded dispatch, overflow queueing, and
//! termination.
//!
//! Run with:
//!   RUST_LOG=tessera_engine=debug cargo run --example pool

use std::time::Duration;

use tessera_engine::{Operation, PoolConfig, PoolError, WorkerPool};
use tessera_kernels::MatrixShape;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Tessera Worker Pool ===\n");

    let mut pool = WorkerPool::new(PoolConfig {
        max_pending_per_worker: 2,
        ..PoolConfig::with_workers(3)
    })?;
    println!("{} workers ready", pool.worker_count());

    // 1. Partial-reduction parallel sum.
    let data: Vec<f64> = (1..=1_000_000).map(f64::from).collect();
    println!("parallel_sum(1..=1e6) = {}", pool.parallel_sum(&data, 12)?);

    // 2. More requests than the pool has slots: the rest queue.
    let n = 150;
    let pending: Vec<_> = (0..12)
        .map(|_| {
            pool.submit(Operation::MatrixMultiply {
                a: vec![1.0; n * n],
                a_shape: MatrixShape::new(n, n),
                b: vec![0.5; n * n],
                b_shape: MatrixShape::new(n, n),
            })
        })
        .collect::<Result<_, _>>()?;
    let m = pool.metrics();
    println!(
        "\nin flight: {} active workers, {} queued",
        m.active_workers, m.queued_tasks
    );
    for p in pending {
        let id = p.id();
        let value = p.wait()?;
        let first = value.into_vec().and_then(|v| v.first().copied());
        println!("  {id}: c[0][0] = {first:?}");
    }

    // 3. A failing request only fails itself.
    let bad = pool.submit(Operation::ChunkSum {
        data: vec![1.0; 4],
        start: 3,
        end: 1,
    })?;
    if let Err(e) = bad.wait_timeout(Duration::from_secs(1)) {
        println!("\nrejected as expected: {e}");
    }

    // 4. Termination rejects whatever is still outstanding.
    let late: Vec<_> = (0..6)
        .map(|_| pool.submit(Operation::Mean { data: data.clone() }))
        .collect::<Result<_, _>>()?;
    let report = pool.terminate();
    println!("\n{report:?}");
    let rejected = late
        .into_iter()
        .filter(|p| matches!(p.try_result(), Some(Err(PoolError::PoolTerminated))))
        .count();
    println!("{rejected} late requests rejected with PoolTerminated");

    let m = pool.metrics();
    println!(
        "completed {}, failed {}, mean turnaround {:?}",
        m.completed_tasks, m.failed_tasks, m.average_turnaround
    );
    Ok(())
}
