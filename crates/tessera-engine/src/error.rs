//! Compute facade and worker pool error types.

use std::error::Error;
use std::fmt;

use tessera_arena::ArenaError;
use tessera_core::{Offset, WorkerId};
use tessera_kernels::KernelError;

use crate::config::ConfigError;

/// Errors surfaced by [`ComputeContext`](crate::compute::ComputeContext).
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeError {
    /// The context could not be created.
    InitializationFailed {
        /// Description of what failed.
        reason: String,
    },
    /// The arena rejected an allocation or access.
    Arena(ArenaError),
    /// A kernel rejected its arguments.
    Kernel(KernelError),
    /// A handle was used after its block was disposed (or the context was
    /// reset).
    DisposedResourceAccess {
        /// Offset the stale handle pointed at.
        offset: Offset,
    },
    /// Supplied data does not match a handle's element count.
    ShapeMismatch {
        /// Element count the handle holds.
        expected: usize,
        /// Element count supplied.
        actual: usize,
    },
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed { reason } => {
                write!(f, "initialization failed: {reason}")
            }
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::Kernel(e) => write!(f, "kernel: {e}"),
            Self::DisposedResourceAccess { offset } => {
                write!(f, "access to disposed resource at {offset}")
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected} elements, got {actual}")
            }
        }
    }
}

impl Error for ComputeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::Kernel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ComputeError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<KernelError> for ComputeError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::Arena(inner) => Self::Arena(inner),
            other => Self::Kernel(other),
        }
    }
}

impl From<ConfigError> for ComputeError {
    fn from(e: ConfigError) -> Self {
        Self::InitializationFailed {
            reason: e.to_string(),
        }
    }
}

/// Errors surfaced by [`WorkerPool`](crate::pool::WorkerPool) and
/// [`PendingResult`](crate::pending::PendingResult).
#[derive(Clone, Debug, PartialEq)]
pub enum PoolError {
    /// A worker failed to bootstrap; the whole pool was torn down.
    InitializationFailed {
        /// The worker that failed, if known.
        worker: Option<WorkerId>,
        /// Description of what failed.
        reason: String,
    },
    /// The pool was terminated before the request completed, or the
    /// request was submitted after termination.
    PoolTerminated,
    /// The kernel failed inside the worker.
    WorkerExecutionError {
        /// Worker that ran the request.
        worker: WorkerId,
        /// The worker's error message.
        message: String,
    },
    /// A worker thread went away without answering.
    WorkerDisconnected {
        /// The worker that disconnected.
        worker: WorkerId,
    },
    /// A bounded wait elapsed before the result arrived.
    Timeout,
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed {
                worker: Some(w),
                reason,
            } => write!(f, "worker {w} failed to initialize: {reason}"),
            Self::InitializationFailed {
                worker: None,
                reason,
            } => write!(f, "pool failed to initialize: {reason}"),
            Self::PoolTerminated => write!(f, "worker pool terminated"),
            Self::WorkerExecutionError { worker, message } => {
                write!(f, "worker {worker} failed: {message}")
            }
            Self::WorkerDisconnected { worker } => {
                write!(f, "worker {worker} disconnected")
            }
            Self::Timeout => write!(f, "timed out waiting for result"),
        }
    }
}

impl Error for PoolError {}

impl From<ConfigError> for PoolError {
    fn from(e: ConfigError) -> Self {
        Self::InitializationFailed {
            worker: None,
            reason: e.to_string(),
        }
    }
}
