//! Worker pool: N worker threads behind one coordinator thread.
//!
//! ```text
//!  callers ──submit──► control ─┐
//!                               ▼
//!                      ┌─────────────────┐  Compute   ┌──────────────────┐
//!                      │ tessera-        │──────────► │ tessera-worker-i │
//!                      │ coordinator     │            │ (own arena)      │
//!                      │ (Scheduler)     │◄────────── │                  │
//!                      └─────────────────┘   events   └──────────────────┘
//!                               │
//!                               ▼ bounded(1) reply per request
//!                         PendingResult
//! ```
//!
//! The coordinator thread owns the [`Scheduler`]; nothing else touches
//! the pending-request maps. Callers only hold a control sender and their
//! own reply receivers, so [`WorkerPool::submit`] never blocks on
//! scheduling.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, RecvTimeoutError, Sender};
use tessera_core::{RequestId, WorkerId};

use crate::config::{ConfigError, PoolConfig};
use crate::error::PoolError;
use crate::metrics::PoolMetrics;
use crate::operation::{ComputeValue, Operation};
use crate::pending::PendingResult;
use crate::protocol::{WorkerEvent, WorkerMessage};
use crate::scheduler::{EventOutcome, Rejections, ReplySender, Scheduler};
use crate::worker::worker_loop;

// ── Control ──────────────────────────────────────────────────────

enum Control {
    Submit {
        id: RequestId,
        operation: Operation,
        reply: ReplySender,
    },
    Metrics(Sender<PoolMetrics>),
    Terminate(Sender<(Rejections, PoolMetrics)>),
}

// ── TerminateReport ──────────────────────────────────────────────

/// Report from [`WorkerPool::terminate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminateReport {
    /// Dispatched requests rejected with `PoolTerminated`.
    pub rejected_pending: usize,
    /// Queued requests rejected with `PoolTerminated`.
    pub rejected_queued: usize,
    /// Whether the coordinator thread was joined successfully.
    pub coordinator_joined: bool,
    /// Number of worker threads joined.
    pub workers_joined: usize,
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
}

// ── WorkerPool ───────────────────────────────────────────────────

/// A fixed set of worker threads, each with a private
/// [`ComputeContext`](crate::compute::ComputeContext).
///
/// Requests go to the least-loaded worker; once every worker holds
/// `max_pending_per_worker` requests, further requests wait in a FIFO
/// queue. Dropping the pool terminates it.
pub struct WorkerPool {
    control_tx: Option<Sender<Control>>,
    coordinator: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
    next_id: AtomicU64,
    shutdown: Arc<AtomicBool>,
    final_metrics: Option<PoolMetrics>,
}

impl WorkerPool {
    /// Spawn the workers, wait for every one to report ready, then start
    /// the coordinator.
    ///
    /// If any worker fails to initialize, or the handshake exceeds
    /// `config.init_timeout`, every worker is torn down and
    /// [`PoolError::InitializationFailed`] is returned.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let worker_count = config.resolved_worker_count();

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut links = Vec::with_capacity(worker_count);
        let mut workers = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let (tx, rx) = crossbeam_channel::unbounded();
            let events = event_tx.clone();
            let flag = Arc::clone(&shutdown);
            let worker = WorkerId(i as u32);
            let spawned = thread::Builder::new()
                .name(format!("tessera-worker-{i}"))
                .spawn(move || worker_loop(worker, rx, events, flag));
            match spawned {
                Ok(handle) => {
                    links.push(tx);
                    workers.push(handle);
                }
                Err(e) => {
                    // Closing the inboxes stops the workers already running.
                    drop(links);
                    join_all(workers);
                    return Err(ConfigError::ThreadSpawnFailed {
                        reason: format!("tessera-worker-{i}: {e}"),
                    }
                    .into());
                }
            }
        }
        drop(event_tx);

        let mut scheduler = Scheduler::new(links, config.max_pending_per_worker);
        let handshake = scheduler
            .begin_init(&config.compute)
            .and_then(|()| await_ready(&mut scheduler, &event_rx, config.init_timeout));
        if let Err(e) = handshake {
            tracing::warn!(error = %e, "worker pool initialization failed");
            scheduler.terminate();
            drop(scheduler);
            join_all(workers);
            return Err(e);
        }

        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let spawned = thread::Builder::new()
            .name("tessera-coordinator".into())
            .spawn(move || coordinator_loop(scheduler, control_rx, event_rx));
        let coordinator = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                // The scheduler (and with it every inbox) was dropped with
                // the closure.
                join_all(workers);
                return Err(ConfigError::ThreadSpawnFailed {
                    reason: format!("tessera-coordinator: {e}"),
                }
                .into());
            }
        };

        tracing::info!(
            workers = worker_count,
            max_pending = config.max_pending_per_worker,
            "worker pool ready"
        );

        Ok(Self {
            control_tx: Some(control_tx),
            coordinator: Some(coordinator),
            workers,
            worker_count,
            next_id: AtomicU64::new(1),
            shutdown,
            final_metrics: None,
        })
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Submit an operation. Never blocks on scheduling.
    ///
    /// The returned [`PendingResult`] resolves when a worker answers or
    /// the pool terminates. Fails with [`PoolError::PoolTerminated`] once
    /// the pool has been terminated.
    pub fn submit(&self, operation: Operation) -> Result<PendingResult, PoolError> {
        let control = self.control_tx.as_ref().ok_or(PoolError::PoolTerminated)?;
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply, rx) = crossbeam_channel::bounded(1);
        control
            .send(Control::Submit {
                id,
                operation,
                reply,
            })
            .map_err(|_| PoolError::PoolTerminated)?;
        Ok(PendingResult::new(id, rx))
    }

    /// Snapshot of the scheduler's counters.
    ///
    /// After termination this is the final snapshot taken at shutdown.
    pub fn metrics(&self) -> PoolMetrics {
        if let Some(m) = &self.final_metrics {
            return m.clone();
        }
        let fallback = || PoolMetrics {
            worker_count: self.worker_count,
            ..PoolMetrics::default()
        };
        let Some(control) = &self.control_tx else {
            return fallback();
        };
        let (tx, rx) = crossbeam_channel::bounded(1);
        if control.send(Control::Metrics(tx)).is_err() {
            return fallback();
        }
        rx.recv().unwrap_or_else(|_| fallback())
    }

    /// Split `data` into `chunks` contiguous slices, sum each on the
    /// pool, and add the partial sums in slice order.
    ///
    /// `chunks` is clamped to `[1, data.len()]`. An empty slice sums to 0.
    pub fn parallel_sum(&self, data: &[f64], chunks: usize) -> Result<f64, PoolError> {
        if data.is_empty() {
            return Ok(0.0);
        }
        let chunks = chunks.clamp(1, data.len());
        let chunk_len = data.len().div_ceil(chunks);

        let pending = data
            .chunks(chunk_len)
            .map(|slice| {
                self.submit(Operation::ChunkSum {
                    data: slice.to_vec(),
                    start: 0,
                    end: slice.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut total = 0.0;
        for p in pending {
            // ChunkSum always yields a scalar.
            if let ComputeValue::Scalar(partial) = p.wait()? {
                total += partial;
            }
        }
        Ok(total)
    }

    /// Reject everything outstanding, stop the coordinator, and join all
    /// threads. Idempotent.
    ///
    /// Workers finish the request they are running, whose late reply is
    /// discarded, and skip everything still in their inboxes.
    pub fn terminate(&mut self) -> TerminateReport {
        let Some(control) = self.control_tx.take() else {
            return TerminateReport {
                coordinator_joined: true,
                ..TerminateReport::default()
            };
        };
        let start = Instant::now();
        self.shutdown.store(true, Ordering::Release);

        let (tx, rx) = crossbeam_channel::bounded(1);
        let (rejections, metrics) = if control.send(Control::Terminate(tx)).is_ok() {
            rx.recv().unwrap_or_default()
        } else {
            (Rejections::default(), PoolMetrics::default())
        };
        drop(control);
        self.final_metrics = Some(PoolMetrics {
            worker_count: self.worker_count,
            ..metrics
        });

        let coordinator_joined = match self.coordinator.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        };
        let workers_joined = join_all(std::mem::take(&mut self.workers));

        let report = TerminateReport {
            rejected_pending: rejections.pending,
            rejected_queued: rejections.queued,
            coordinator_joined,
            workers_joined,
            total_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            rejected_pending = report.rejected_pending,
            rejected_queued = report.rejected_queued,
            workers_joined = report.workers_joined,
            total_ms = report.total_ms,
            "worker pool terminated"
        );
        report
    }

    /// Whether [`terminate`](Self::terminate) has run.
    pub fn is_terminated(&self) -> bool {
        self.control_tx.is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.control_tx.is_some() {
            self.terminate();
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

// ── Threads ──────────────────────────────────────────────────────

fn await_ready<L: crate::scheduler::WorkerLink>(
    scheduler: &mut Scheduler<L>,
    events: &Receiver<WorkerEvent>,
    timeout: Duration,
) -> Result<(), PoolError> {
    let deadline = Instant::now() + timeout;
    while !scheduler.all_ready() {
        match events.recv_deadline(deadline) {
            Ok(event) => {
                if let EventOutcome::InitFailed { worker, reason } = scheduler.handle_event(event) {
                    return Err(PoolError::InitializationFailed {
                        worker: Some(worker),
                        reason,
                    });
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(PoolError::InitializationFailed {
                    worker: None,
                    reason: format!("workers not ready within {timeout:?}"),
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(PoolError::InitializationFailed {
                    worker: None,
                    reason: "workers exited during initialization".into(),
                });
            }
        }
    }
    Ok(())
}

fn coordinator_loop(
    mut scheduler: Scheduler<Sender<WorkerMessage>>,
    control: Receiver<Control>,
    events: Receiver<WorkerEvent>,
) {
    tracing::debug!("coordinator started");
    let mut events = events;
    let mut stop = false;
    while !stop {
        let mut events_closed = false;
        select! {
            recv(control) -> msg => match msg {
                Ok(Control::Submit { id, operation, reply }) => {
                    scheduler.submit(id, operation, reply);
                }
                Ok(Control::Metrics(tx)) => {
                    let _ = tx.send(scheduler.metrics());
                }
                Ok(Control::Terminate(tx)) => {
                    let rejections = scheduler.terminate();
                    let _ = tx.send((rejections, scheduler.metrics()));
                    stop = true;
                }
                Err(_) => {
                    scheduler.terminate();
                    stop = true;
                }
            },
            recv(events) -> event => match event {
                Ok(event) => {
                    scheduler.handle_event(event);
                }
                Err(_) => events_closed = true,
            },
        }
        if events_closed && !stop {
            // Every worker is gone; nothing outstanding can resolve.
            tracing::warn!("all workers exited, terminating scheduler");
            scheduler.terminate();
            events = crossbeam_channel::never();
        }
    }
    tracing::debug!("coordinator stopped");
}

fn join_all(handles: Vec<JoinHandle<()>>) -> usize {
    handles
        .into_iter()
        .map(JoinHandle::join)
        .filter(Result::is_ok)
        .count()
}
