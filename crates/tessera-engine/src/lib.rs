//! Compute facade and worker pool for Tessera.
//!
//! Two ways to run kernels:
//!
//! - [`ComputeContext`] owns one [`Arena`](tessera_arena::Arena) and
//!   hands out typed [`VectorHandle`]/[`MatrixHandle`] views. Every
//!   operation checks its handles before dispatching a
//!   [`KernelCall`](tessera_kernels::KernelCall), so a disposed handle
//!   fails with [`ComputeError::DisposedResourceAccess`] instead of
//!   reading reused memory.
//! - [`WorkerPool`] runs owned [`Operation`]s on a set of worker threads,
//!   each with its own private `ComputeContext`. A single coordinator
//!   thread owns the [`Scheduler`], which dispatches to the least-loaded
//!   worker under a per-worker backlog cap and queues the overflow.
//!
//! ```text
//! ComputeContext ──KernelCall──► tessera_kernels::execute ──► Arena
//!       ▲
//!       │ one per worker thread
//! WorkerPool ─► coordinator (Scheduler) ─► tessera-worker-{i}
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compute;
pub mod config;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod pending;
pub mod pool;
pub mod protocol;
pub mod scheduler;
pub mod view;
mod worker;

pub use compute::ComputeContext;
pub use config::{ComputeConfig, ConfigError, PoolConfig};
pub use error::{ComputeError, PoolError};
pub use metrics::{ComputeMetrics, PoolMetrics, WorkerSnapshot};
pub use operation::{ComputeValue, Operation};
pub use pending::PendingResult;
pub use pool::{TerminateReport, WorkerPool};
pub use protocol::{WorkerEvent, WorkerMessage};
pub use scheduler::{EventOutcome, Rejections, Scheduler, WorkerLink, WorkerState};
pub use view::{MatrixHandle, VectorHandle};
