//! Compute and pool configuration, validation, and error types.
//!
//! [`ComputeConfig`] sets up one execution context (facade + arena).
//! [`PoolConfig`] sizes the worker pool and carries the per-worker
//! [`ComputeConfig`]. Both are validated by their constructors.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tessera_arena::{ArenaConfig, ArenaError};

// ── ComputeConfig ─────────────────────────────────────────────────

/// Configuration for a [`ComputeContext`](crate::compute::ComputeContext).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputeConfig {
    /// Arena geometry for this context.
    pub arena: ArenaConfig,
}

impl ComputeConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        Ok(())
    }
}

// ── PoolConfig ────────────────────────────────────────────────────

/// Configuration for a [`WorkerPool`](crate::pool::WorkerPool).
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[2, 16]`).
    pub worker_count: Option<usize>,
    /// Pending requests a worker may hold before new requests are queued
    /// instead of dispatched to it. Default: 10.
    pub max_pending_per_worker: usize,
    /// Configuration each worker builds its private context from.
    pub compute: ComputeConfig,
    /// How long pool construction waits for every worker to report ready.
    /// Default: 5 s.
    pub init_timeout: Duration,
}

impl PoolConfig {
    /// Default backlog cap per worker.
    pub const DEFAULT_MAX_PENDING_PER_WORKER: usize = 10;

    /// Default init handshake timeout.
    pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Config with an explicit worker count and defaults elsewhere.
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count: Some(worker_count),
            ..Self::default()
        }
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / 2).clamp(2, 16)
            }
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.max_pending_per_worker == 0 {
            return Err(ConfigError::ZeroBacklogCap);
        }
        self.compute.validate()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            max_pending_per_worker: Self::DEFAULT_MAX_PENDING_PER_WORKER,
            compute: ComputeConfig::default(),
            init_timeout: Self::DEFAULT_INIT_TIMEOUT,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`ComputeConfig`] or [`PoolConfig`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Arena configuration is invalid.
    Arena(ArenaError),
    /// `worker_count` was explicitly set to zero.
    ZeroWorkers,
    /// `max_pending_per_worker` is zero.
    ZeroBacklogCap,
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::ZeroWorkers => write!(f, "worker_count must be at least 1"),
            Self::ZeroBacklogCap => write!(f, "max_pending_per_worker must be at least 1"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ComputeConfig::default().validate().is_ok());
        let pool = PoolConfig::default();
        assert_eq!(pool.max_pending_per_worker, 10);
        assert!(pool.validate().is_ok());
    }

    #[test]
    fn worker_count_resolution() {
        assert_eq!(PoolConfig::with_workers(3).resolved_worker_count(), 3);
        assert_eq!(PoolConfig::with_workers(500).resolved_worker_count(), 64);
        let auto = PoolConfig::default().resolved_worker_count();
        assert!((2..=16).contains(&auto));
    }

    #[test]
    fn zero_workers_rejected() {
        assert_eq!(
            PoolConfig::with_workers(0).validate(),
            Err(ConfigError::ZeroWorkers)
        );
    }

    #[test]
    fn zero_backlog_rejected() {
        let config = PoolConfig {
            max_pending_per_worker: 0,
            ..PoolConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBacklogCap));
    }

    #[test]
    fn arena_errors_propagate() {
        let config = ComputeConfig {
            arena: ArenaConfig::with_pages(8, 4),
        };
        assert!(matches!(config.validate(), Err(ConfigError::Arena(_))));
    }
}
