//! Aggregate metrics for compute contexts and worker pools.
//!
//! [`ComputeMetrics`] is returned by
//! [`ComputeContext::metrics`](crate::compute::ComputeContext::metrics);
//! [`PoolMetrics`] by [`WorkerPool::metrics`](crate::pool::WorkerPool::metrics).

use std::time::Duration;

use tessera_arena::ArenaStats;
use tessera_core::WorkerId;

use crate::scheduler::WorkerState;

/// Counters for one compute context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComputeMetrics {
    /// Arena allocation counters and geometry.
    pub arena: ArenaStats,
    /// Kernels executed.
    pub kernel_calls: u64,
    /// Vectors allocated through the facade.
    pub vectors_allocated: u64,
    /// Matrices allocated through the facade.
    pub matrices_allocated: u64,
    /// Handles disposed through the facade.
    pub disposals: u64,
    /// Total time spent inside kernels.
    pub compute_time: Duration,
    /// Duration of the most recent kernel.
    pub last_kernel_time: Duration,
}

/// Point-in-time view of one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSnapshot {
    /// Worker id.
    pub id: WorkerId,
    /// Lifecycle state.
    pub state: WorkerState,
    /// Requests dispatched and not yet answered.
    pub pending: usize,
    /// Requests dispatched over the worker's lifetime.
    pub request_count: u64,
}

/// Counters for a worker pool.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolMetrics {
    /// Workers in the pool.
    pub worker_count: usize,
    /// Workers with at least one pending request.
    pub active_workers: usize,
    /// Requests waiting in the overflow queue.
    pub queued_tasks: usize,
    /// Requests answered with a result.
    pub completed_tasks: u64,
    /// Requests answered with an error.
    pub failed_tasks: u64,
    /// Mean submit-to-response time over every answered request.
    pub average_turnaround: Duration,
    /// Per-worker breakdown, ordered by id.
    pub per_worker: Vec<WorkerSnapshot>,
}

/// Incrementally updated mean of durations.
///
/// Each sample moves the mean by `(x - mean) / n`; no samples are retained.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RunningMean {
    count: u64,
    mean_secs: f64,
}

impl RunningMean {
    pub fn record(&mut self, sample: Duration) {
        self.count += 1;
        self.mean_secs += (sample.as_secs_f64() - self.mean_secs) / self.count as f64;
    }

    pub fn mean(&self) -> Duration {
        Duration::from_secs_f64(self.mean_secs.max(0.0))
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}
