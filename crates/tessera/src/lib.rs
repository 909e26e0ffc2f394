//! Tessera: arena-backed numeric compute with a parallel worker pool.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tessera sub-crates. For most users, adding `tessera` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! // Synchronous: one context, one arena.
//! let mut ctx = ComputeContext::new(ComputeConfig::default()).unwrap();
//! let a = ctx.vector_from(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = ctx.vector_from(&[4.0, 3.0, 2.0, 1.0]).unwrap();
//! assert_eq!(ctx.dot(a, b).unwrap(), 20.0);
//! assert_eq!(ctx.mean(a).unwrap(), 2.5);
//!
//! ctx.dispose(a).unwrap();
//! assert!(matches!(
//!     ctx.mean(a),
//!     Err(ComputeError::DisposedResourceAccess { .. })
//! ));
//!
//! // Off-thread: owned operations on a worker pool.
//! let mut pool = WorkerPool::new(PoolConfig::with_workers(2)).unwrap();
//! let pending = pool
//!     .submit(Operation::Variance { data: vec![1.0, 2.0, 3.0, 4.0] })
//!     .unwrap();
//! let variance = pending.wait().unwrap().as_scalar().unwrap();
//! assert!((variance - 5.0 / 3.0).abs() < 1e-12);
//! pool.terminate();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | Offsets, request/worker ids, change observers |
//! | [`arena`] | `tessera-arena` | Linear arena, free list, growth, output windows |
//! | [`kernels`] | `tessera-kernels` | Slice kernels and the offset-level kernel ABI |
//! | [`engine`] | `tessera-engine` | Compute facade, scheduler, worker pool |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids and the change-observer interface (`tessera-core`).
pub use tessera_core as types;

/// Linear arena allocator (`tessera-arena`).
///
/// Most users never touch the [`arena::Arena`] directly; a
/// [`engine::ComputeContext`] owns one.
pub use tessera_arena as arena;

/// Numeric kernels (`tessera-kernels`).
///
/// Slice kernels live in [`kernels::vector`], [`kernels::matrix`],
/// [`kernels::stats`] and [`kernels::signal`]; the offset-level ABI is
/// [`kernels::KernelCall`] dispatched by [`kernels::execute`].
pub use tessera_kernels as kernels;

/// Compute facade and worker pool (`tessera-engine`).
///
/// [`engine::ComputeContext`] for synchronous work on typed handles,
/// [`engine::WorkerPool`] for owned operations on worker threads.
pub use tessera_engine as engine;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use tessera_core::{ChangeEvent, ChangeObserver, Offset};

    // Arena
    pub use tessera_arena::{ArenaConfig, ArenaError, ArenaStats};

    // Kernels
    pub use tessera_kernels::{KernelError, MatrixShape};

    // Facade
    pub use tessera_engine::{
        ComputeConfig, ComputeContext, ComputeError, ComputeMetrics, MatrixHandle, VectorHandle,
    };

    // Pool
    pub use tessera_engine::{
        ComputeValue, Operation, PendingResult, PoolConfig, PoolError, PoolMetrics, WorkerPool,
    };
}
