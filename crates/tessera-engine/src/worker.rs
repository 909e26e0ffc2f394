//! Worker thread main loop.
//!
//! Each worker owns one [`ComputeContext`] built from its `Init` message
//! and shares nothing with other workers. Requests arrive on a private
//! crossbeam inbox and are handled strictly in order; replies go to the
//! coordinator's event channel. The context is reset after every request
//! so the arena starts each request empty.
//!
//! Once the pool's shutdown flag is raised, queued `Compute` messages are
//! dropped unanswered: the coordinator has already rejected them.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use tessera_core::WorkerId;

use crate::compute::ComputeContext;
use crate::protocol::{WorkerEvent, WorkerMessage};

/// Run until `Dispose` arrives or the inbox closes.
pub(crate) fn worker_loop(
    worker: WorkerId,
    inbox: Receiver<WorkerMessage>,
    events: Sender<WorkerEvent>,
    shutdown: Arc<AtomicBool>,
) {
    let mut ctx: Option<ComputeContext> = None;
    let mut skipped = 0usize;
    tracing::debug!(%worker, "worker started");

    while let Ok(message) = inbox.recv() {
        match message {
            WorkerMessage::Init { id, config } => match ComputeContext::new(config) {
                Ok(c) => {
                    ctx = Some(c);
                    tracing::debug!(%worker, "worker ready");
                    let _ = events.send(WorkerEvent::Ready { id, worker });
                }
                Err(e) => {
                    let _ = events.send(WorkerEvent::Error {
                        id,
                        worker,
                        message: e.to_string(),
                    });
                }
            },
            WorkerMessage::Compute { id, operation } => {
                if shutdown.load(Ordering::Acquire) {
                    tracing::trace!(%worker, %id, "skipping request after shutdown");
                    skipped += 1;
                    continue;
                }
                let Some(c) = ctx.as_mut() else {
                    let _ = events.send(WorkerEvent::Error {
                        id,
                        worker,
                        message: "compute before init".into(),
                    });
                    continue;
                };
                let start = Instant::now();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| operation.execute(c)));
                let elapsed = start.elapsed();
                c.reset();
                let event = match outcome {
                    Ok(Ok(value)) => WorkerEvent::Result {
                        id,
                        worker,
                        value,
                        elapsed,
                    },
                    Ok(Err(e)) => WorkerEvent::Error {
                        id,
                        worker,
                        message: e.to_string(),
                    },
                    Err(_) => WorkerEvent::Error {
                        id,
                        worker,
                        message: format!("{} panicked", operation.name()),
                    },
                };
                let _ = events.send(event);
            }
            WorkerMessage::Dispose => break,
        }
    }

    tracing::debug!(%worker, skipped, "worker terminated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputeConfig;
    use crate::operation::{ComputeValue, Operation};
    use tessera_arena::ArenaConfig;
    use tessera_core::RequestId;

    fn spawn() -> (
        Sender<WorkerMessage>,
        Receiver<WorkerEvent>,
        std::thread::JoinHandle<()>,
    ) {
        let (tx, ev_rx, handle, _) = spawn_with_flag();
        (tx, ev_rx, handle)
    }

    fn spawn_with_flag() -> (
        Sender<WorkerMessage>,
        Receiver<WorkerEvent>,
        std::thread::JoinHandle<()>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ev_tx, ev_rx) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || worker_loop(WorkerId(0), rx, ev_tx, flag));
        (tx, ev_rx, handle, shutdown)
    }

    #[test]
    fn init_compute_dispose() {
        let (tx, events, handle) = spawn();
        tx.send(WorkerMessage::Init {
            id: RequestId(1),
            config: ComputeConfig::default(),
        })
        .unwrap();
        assert!(matches!(
            events.recv().unwrap(),
            WorkerEvent::Ready { id: RequestId(1), .. }
        ));

        tx.send(WorkerMessage::Compute {
            id: RequestId(2),
            operation: Operation::Mean {
                data: vec![1.0, 2.0, 3.0],
            },
        })
        .unwrap();
        match events.recv().unwrap() {
            WorkerEvent::Result { id, value, .. } => {
                assert_eq!(id, RequestId(2));
                assert_eq!(value, ComputeValue::Scalar(2.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        tx.send(WorkerMessage::Dispose).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn compute_before_init_is_an_error() {
        let (tx, events, handle) = spawn();
        tx.send(WorkerMessage::Compute {
            id: RequestId(7),
            operation: Operation::Mean { data: vec![] },
        })
        .unwrap();
        assert!(matches!(
            events.recv().unwrap(),
            WorkerEvent::Error { id: RequestId(7), .. }
        ));
        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn requests_after_shutdown_are_skipped() {
        let (tx, events, handle, shutdown) = spawn_with_flag();
        tx.send(WorkerMessage::Init {
            id: RequestId(1),
            config: ComputeConfig::default(),
        })
        .unwrap();
        events.recv().unwrap();

        shutdown.store(true, Ordering::Release);
        for id in 2..12 {
            tx.send(WorkerMessage::Compute {
                id: RequestId(id),
                operation: Operation::Mean {
                    data: vec![1.0; 8],
                },
            })
            .unwrap();
        }
        tx.send(WorkerMessage::Dispose).unwrap();
        handle.join().unwrap();

        // No replies: the event sender was dropped with nothing sent.
        assert!(events.recv().is_err());
    }

    #[test]
    fn bad_config_reports_init_error() {
        let (tx, events, handle) = spawn();
        tx.send(WorkerMessage::Init {
            id: RequestId(1),
            config: ComputeConfig {
                arena: ArenaConfig::with_pages(2, 1),
            },
        })
        .unwrap();
        assert!(matches!(events.recv().unwrap(), WorkerEvent::Error { .. }));
        tx.send(WorkerMessage::Dispose).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn arena_is_reset_between_requests() {
        let (tx, events, handle) = spawn();
        tx.send(WorkerMessage::Init {
            id: RequestId(1),
            config: ComputeConfig {
                arena: ArenaConfig {
                    page_size: 1024,
                    initial_pages: 1,
                    max_pages: 1,
                    reserved_prefix: 64,
                },
            },
        })
        .unwrap();
        events.recv().unwrap();

        // Each request uses most of the single page; without a reset the
        // second one would not fit.
        for id in 2..5 {
            tx.send(WorkerMessage::Compute {
                id: RequestId(id),
                operation: Operation::Mean {
                    data: vec![1.0; 100],
                },
            })
            .unwrap();
            assert!(matches!(
                events.recv().unwrap(),
                WorkerEvent::Result { .. }
            ));
        }
        tx.send(WorkerMessage::Dispose).unwrap();
        handle.join().unwrap();
    }
}
