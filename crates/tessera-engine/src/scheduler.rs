//! Least-loaded dispatch with a per-worker backlog cap.
//!
//! [`Scheduler`] is the synchronous core of the worker pool. It owns one
//! [`WorkerRecord`] per worker plus a FIFO overflow queue, and is driven
//! by two inputs: [`Scheduler::submit`] for new requests and
//! [`Scheduler::handle_event`] for worker replies. The pool's coordinator
//! thread owns it exclusively, so none of its state is shared.
//!
//! # Dispatch rule
//!
//! A request goes to the accepting worker with the fewest pending
//! requests (lowest id on a tie). If that worker already holds
//! `max_pending` requests, every worker is saturated and the request is
//! queued. Each reply frees a slot, after which the queue is drained in
//! FIFO order.
//!
//! # Worker lifecycle
//!
//! ```text
//! Uninitialized ─init→ Initializing ─ready→ Ready ⇄ Busy
//!                            │                  │
//!                            └──────────────────┴─terminate→ Terminated
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use crossbeam_channel::Sender;
use indexmap::IndexMap;
use tessera_core::{RequestId, WorkerId};

use crate::config::ComputeConfig;
use crate::error::PoolError;
use crate::metrics::{PoolMetrics, RunningMean, WorkerSnapshot};
use crate::operation::{ComputeValue, Operation};
use crate::protocol::{WorkerEvent, WorkerMessage};

/// Sending half of a caller's reply slot.
pub type ReplySender = Sender<Result<ComputeValue, PoolError>>;

/// Connection from the scheduler to one worker's inbox.
pub trait WorkerLink {
    /// Deliver `message`. On failure the undelivered message is returned.
    fn send(&self, message: WorkerMessage) -> Result<(), WorkerMessage>;
}

impl WorkerLink for Sender<WorkerMessage> {
    fn send(&self, message: WorkerMessage) -> Result<(), WorkerMessage> {
        Sender::send(self, message).map_err(|e| e.into_inner())
    }
}

/// Lifecycle state of a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Spawned, no `Init` sent yet.
    Uninitialized,
    /// `Init` sent, awaiting the reply.
    Initializing,
    /// Initialized and idle.
    Ready,
    /// At least one request pending.
    Busy,
    /// Disposed or unreachable; accepts nothing.
    Terminated,
}

impl WorkerState {
    fn accepts_work(self) -> bool {
        matches!(self, Self::Ready | Self::Busy)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Busy => "busy",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

struct PendingEntry {
    reply: ReplySender,
    submitted: Instant,
}

struct QueuedTask {
    id: RequestId,
    operation: Operation,
    reply: ReplySender,
    submitted: Instant,
}

/// One worker as seen by the scheduler.
pub struct WorkerRecord<L> {
    id: WorkerId,
    link: L,
    state: WorkerState,
    pending: IndexMap<RequestId, PendingEntry>,
    request_count: u64,
}

impl<L> WorkerRecord<L> {
    /// Worker id.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Requests dispatched and not yet answered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Requests dispatched over the worker's lifetime.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}

/// What [`Scheduler::handle_event`] did with an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// A worker answered its `Init`.
    WorkerReady(WorkerId),
    /// A worker failed its `Init`.
    InitFailed {
        /// The failing worker.
        worker: WorkerId,
        /// The worker's message.
        reason: String,
    },
    /// A pending request was resolved or rejected.
    Resolved(RequestId),
    /// The id matched nothing pending; the event was dropped.
    Unknown(RequestId),
}

/// Counts from [`Scheduler::terminate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rejections {
    /// Dispatched requests rejected with `PoolTerminated`.
    pub pending: usize,
    /// Queued requests rejected with `PoolTerminated`.
    pub queued: usize,
}

/// Synchronous worker-pool scheduling core.
pub struct Scheduler<L: WorkerLink> {
    workers: Vec<WorkerRecord<L>>,
    overflow: VecDeque<QueuedTask>,
    init_pending: IndexMap<RequestId, usize>,
    max_pending: usize,
    next_init_id: u64,
    completed: u64,
    failed: u64,
    turnaround: RunningMean,
    terminated: bool,
}

impl<L: WorkerLink> Scheduler<L> {
    /// Create a scheduler over `links`; worker `i` gets `WorkerId(i)`.
    ///
    /// `max_pending` is clamped to at least 1.
    pub fn new(links: Vec<L>, max_pending: usize) -> Self {
        let workers = links
            .into_iter()
            .enumerate()
            .map(|(i, link)| WorkerRecord {
                id: WorkerId(i as u32),
                link,
                state: WorkerState::Uninitialized,
                pending: IndexMap::new(),
                request_count: 0,
            })
            .collect();
        Self {
            workers,
            overflow: VecDeque::new(),
            init_pending: IndexMap::new(),
            max_pending: max_pending.max(1),
            // Init ids count down from the top so they never collide with
            // pool-assigned request ids.
            next_init_id: u64::MAX,
            completed: 0,
            failed: 0,
            turnaround: RunningMean::default(),
            terminated: false,
        }
    }

    /// Send `Init` to every uninitialized worker.
    ///
    /// A worker whose link is already closed is marked terminated and
    /// reported as a failure.
    pub fn begin_init(&mut self, config: &ComputeConfig) -> Result<(), PoolError> {
        for idx in 0..self.workers.len() {
            if self.workers[idx].state != WorkerState::Uninitialized {
                continue;
            }
            let id = RequestId(self.next_init_id);
            self.next_init_id -= 1;
            let worker = &mut self.workers[idx];
            let message = WorkerMessage::Init {
                id,
                config: config.clone(),
            };
            if worker.link.send(message).is_err() {
                worker.state = WorkerState::Terminated;
                return Err(PoolError::InitializationFailed {
                    worker: Some(worker.id),
                    reason: "worker inbox closed".into(),
                });
            }
            worker.state = WorkerState::Initializing;
            self.init_pending.insert(id, idx);
        }
        Ok(())
    }

    /// Whether every worker has answered its `Init`.
    pub fn all_ready(&self) -> bool {
        self.init_pending.is_empty()
            && self
                .workers
                .iter()
                .all(|w| w.state.accepts_work())
    }

    /// Accept a request, dispatching it or queueing it.
    ///
    /// After [`terminate`](Self::terminate) the request is rejected at once
    /// with [`PoolError::PoolTerminated`].
    pub fn submit(&mut self, id: RequestId, operation: Operation, reply: ReplySender) {
        self.submit_at(id, operation, reply, Instant::now());
    }

    fn submit_at(
        &mut self,
        id: RequestId,
        operation: Operation,
        reply: ReplySender,
        submitted: Instant,
    ) {
        if self.terminated {
            let _ = reply.send(Err(PoolError::PoolTerminated));
            return;
        }
        match self.pick_worker() {
            Some(idx) => self.dispatch(idx, id, operation, reply, submitted),
            None => {
                tracing::trace!(%id, queued = self.overflow.len() + 1, "all workers saturated, queueing");
                self.overflow.push_back(QueuedTask {
                    id,
                    operation,
                    reply,
                    submitted,
                });
            }
        }
    }

    /// Index of the least-loaded worker with spare capacity.
    fn pick_worker(&self) -> Option<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.state.accepts_work())
            .min_by_key(|(_, w)| w.pending.len())
            .filter(|(_, w)| w.pending.len() < self.max_pending)
            .map(|(idx, _)| idx)
    }

    fn dispatch(
        &mut self,
        idx: usize,
        id: RequestId,
        operation: Operation,
        reply: ReplySender,
        submitted: Instant,
    ) {
        let worker = &mut self.workers[idx];
        tracing::trace!(%id, worker = %worker.id, op = operation.name(), "dispatch");
        match worker.link.send(WorkerMessage::Compute { id, operation }) {
            Ok(()) => {
                worker.pending.insert(id, PendingEntry { reply, submitted });
                worker.request_count += 1;
                worker.state = WorkerState::Busy;
            }
            Err(_) => {
                tracing::warn!(worker = %worker.id, "worker inbox closed, marking terminated");
                worker.state = WorkerState::Terminated;
                let worker_id = worker.id;
                self.fail_worker(idx);
                self.failed += 1;
                let _ = reply.send(Err(PoolError::WorkerDisconnected { worker: worker_id }));
            }
        }
    }

    /// Reject everything pending on a worker that has gone away.
    fn fail_worker(&mut self, idx: usize) {
        let worker = &mut self.workers[idx];
        let worker_id = worker.id;
        for (_, entry) in worker.pending.drain(..) {
            let _ = entry
                .reply
                .send(Err(PoolError::WorkerDisconnected { worker: worker_id }));
            self.failed += 1;
        }
    }

    /// Match a worker reply to its pending entry.
    ///
    /// Replies whose id is not pending (for example late replies after
    /// [`terminate`](Self::terminate)) are logged and dropped.
    pub fn handle_event(&mut self, event: WorkerEvent) -> EventOutcome {
        let id = event.id();

        if let Some(idx) = self.init_pending.shift_remove(&id) {
            let worker = &mut self.workers[idx];
            return match event {
                WorkerEvent::Ready { .. } => {
                    worker.state = WorkerState::Ready;
                    EventOutcome::WorkerReady(worker.id)
                }
                WorkerEvent::Error { message, .. } => {
                    worker.state = WorkerState::Terminated;
                    EventOutcome::InitFailed {
                        worker: worker.id,
                        reason: message,
                    }
                }
                WorkerEvent::Result { .. } => {
                    tracing::warn!(%id, "compute result for an init request dropped");
                    EventOutcome::Unknown(id)
                }
            };
        }

        let worker_id = event.worker();
        let Some(idx) = self
            .workers
            .iter()
            .position(|w| w.id == worker_id && w.pending.contains_key(&id))
        else {
            tracing::warn!(%id, worker = %worker_id, "response for unknown request id dropped");
            return EventOutcome::Unknown(id);
        };

        let worker = &mut self.workers[idx];
        let Some(entry) = worker.pending.shift_remove(&id) else {
            return EventOutcome::Unknown(id);
        };
        if worker.pending.is_empty() && worker.state == WorkerState::Busy {
            worker.state = WorkerState::Ready;
        }
        self.turnaround.record(entry.submitted.elapsed());

        match event {
            WorkerEvent::Result { value, .. } => {
                self.completed += 1;
                let _ = entry.reply.send(Ok(value));
            }
            WorkerEvent::Error { message, .. } => {
                self.failed += 1;
                let _ = entry.reply.send(Err(PoolError::WorkerExecutionError {
                    worker: worker_id,
                    message,
                }));
            }
            WorkerEvent::Ready { .. } => {
                self.failed += 1;
                let _ = entry.reply.send(Err(PoolError::WorkerExecutionError {
                    worker: worker_id,
                    message: "unexpected ready reply".into(),
                }));
            }
        }

        self.drain_overflow();
        EventOutcome::Resolved(id)
    }

    fn drain_overflow(&mut self) {
        while !self.overflow.is_empty() {
            let Some(idx) = self.pick_worker() else {
                break;
            };
            let Some(task) = self.overflow.pop_front() else {
                break;
            };
            self.dispatch(idx, task.id, task.operation, task.reply, task.submitted);
        }
    }

    /// Reject every pending and queued request with
    /// [`PoolError::PoolTerminated`] and send `Dispose` to every worker.
    ///
    /// The overflow queue is cleared, not drained. Idempotent.
    pub fn terminate(&mut self) -> Rejections {
        let mut rejections = Rejections::default();
        if self.terminated {
            return rejections;
        }
        self.terminated = true;

        for worker in &mut self.workers {
            for (_, entry) in worker.pending.drain(..) {
                let _ = entry.reply.send(Err(PoolError::PoolTerminated));
                rejections.pending += 1;
            }
            let _ = worker.link.send(WorkerMessage::Dispose);
            worker.state = WorkerState::Terminated;
        }
        for task in self.overflow.drain(..) {
            let _ = task.reply.send(Err(PoolError::PoolTerminated));
            rejections.queued += 1;
        }
        self.init_pending.clear();
        rejections
    }

    /// Whether [`terminate`](Self::terminate) has run.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of queued (undispatched) requests.
    pub fn queued(&self) -> usize {
        self.overflow.len()
    }

    /// Worker records, ordered by id.
    pub fn workers(&self) -> &[WorkerRecord<L>] {
        &self.workers
    }

    /// Aggregate metrics snapshot.
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            worker_count: self.workers.len(),
            active_workers: self.workers.iter().filter(|w| !w.pending.is_empty()).count(),
            queued_tasks: self.overflow.len(),
            completed_tasks: self.completed,
            failed_tasks: self.failed,
            average_turnaround: self.turnaround.mean(),
            per_worker: self
                .workers
                .iter()
                .map(|w| WorkerSnapshot {
                    id: w.id,
                    state: w.state,
                    pending: w.pending.len(),
                    request_count: w.request_count,
                })
                .collect(),
        }
    }
}
