//! Caller-side handle for a submitted request.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use tessera_core::RequestId;

use crate::error::PoolError;
use crate::operation::ComputeValue;

/// A request in flight on a [`WorkerPool`](crate::pool::WorkerPool).
///
/// Resolves exactly once: with the worker's result, with the worker's
/// error, or with [`PoolError::PoolTerminated`] if the pool shuts down
/// first.
#[derive(Debug)]
pub struct PendingResult {
    id: RequestId,
    rx: Receiver<Result<ComputeValue, PoolError>>,
}

impl PendingResult {
    pub(crate) fn new(id: RequestId, rx: Receiver<Result<ComputeValue, PoolError>>) -> Self {
        Self { id, rx }
    }

    /// The pool-assigned request id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Block until the request resolves.
    pub fn wait(self) -> Result<ComputeValue, PoolError> {
        self.rx.recv().unwrap_or(Err(PoolError::PoolTerminated))
    }

    /// Block for at most `timeout`.
    ///
    /// Returns [`PoolError::Timeout`] if nothing arrived in time; the
    /// request stays in flight and may be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<ComputeValue, PoolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PoolError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::PoolTerminated),
        }
    }

    /// The result if it has already arrived.
    pub fn try_result(&self) -> Option<Result<ComputeValue, PoolError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::PoolTerminated)),
        }
    }
}
