//! Tessera Quickstart: the compute facade on a single arena.
//!
//! Demonstrates:
//!   1. Creating a ComputeContext with a small, growable arena
//!   2. Allocating vectors and matrices and running kernels on them
//!   3. Watching mutations through a change observer
//!   4. Disposal, stale-handle detection, and free-list reuse
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use tessera_arena::ArenaConfig;
use tessera_core::ChangeEvent;
use tessera_engine::{ComputeConfig, ComputeContext, ComputeError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Tessera Quickstart ===\n");

    // 1. A 4 KiB arena that may grow to 64 KiB.
    let mut ctx = ComputeContext::new(ComputeConfig {
        arena: ArenaConfig {
            page_size: 4096,
            initial_pages: 1,
            max_pages: 16,
            reserved_prefix: 64,
        },
    })?;
    println!(
        "Arena: {} bytes, max {} bytes",
        ctx.arena().capacity(),
        ctx.arena().max_capacity()
    );

    // 2. Log grow events as they happen.
    ctx.subscribe(Box::new(|event: &ChangeEvent| {
        if let ChangeEvent::Grown {
            generation,
            capacity,
        } = event
        {
            println!("  arena grew to {capacity} bytes (generation {generation})");
        }
    }));

    // 3. Vector statistics.
    let a = ctx.vector_from(&[1.0, 2.0, 3.0, 4.0])?;
    let b = ctx.vector_from(&[4.0, 3.0, 2.0, 1.0])?;
    println!("\ndot(a, b)   = {}", ctx.dot(a, b)?);
    println!("mean(a)     = {}", ctx.mean(a)?);
    println!("variance(a) = {:.6}", ctx.variance(a)?);
    println!("std_dev(a)  = {:.6}", ctx.std_dev(a)?);

    let smooth = ctx.moving_average(a, 3)?;
    println!("moving_average(a, 3) = {:?}", ctx.read(smooth)?);

    // 4. A matrix product large enough to force growth.
    let n = 24;
    let data: Vec<f64> = (0..n * n).map(|i| i as f64).collect();
    let m = ctx.matrix_from(n, n, &data)?;
    let id = ctx.identity(n)?;
    let product = ctx.matmul(m, id)?;
    println!(
        "\n{n}x{n} x identity unchanged: {}",
        ctx.read_matrix(product)? == data
    );
    println!("frobenius_norm = {:.3}", ctx.frobenius_norm(product)?);

    // 5. Disposal: the handle goes stale, the block is reused.
    ctx.dispose(a)?;
    match ctx.mean(a) {
        Err(ComputeError::DisposedResourceAccess { offset }) => {
            println!("\nstale handle rejected at {offset}");
        }
        other => println!("\nunexpected: {other:?}"),
    }
    let c = ctx.vector_from(&[9.0; 4])?;
    println!("new vector reuses {}: {}", c.offset(), c.offset() == a.offset());

    let metrics = ctx.metrics();
    println!(
        "\nkernel calls: {}, peak usage: {} bytes, reuse hits: {}",
        metrics.kernel_calls, metrics.arena.peak_usage, metrics.arena.reuse_hits
    );
    Ok(())
}
