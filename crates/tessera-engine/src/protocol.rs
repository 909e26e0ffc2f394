//! Coordinator ↔ worker messages.
//!
//! Every request carries a [`RequestId`] chosen by the pool; the worker
//! echoes it in its reply so the coordinator can match replies to
//! callers regardless of arrival order. A worker must answer `Init`
//! before it accepts `Compute`.

use std::time::Duration;

use tessera_core::{RequestId, WorkerId};

use crate::config::ComputeConfig;
use crate::operation::{ComputeValue, Operation};

/// Coordinator → worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Build the worker's private compute context.
    Init {
        /// Request id echoed in the reply.
        id: RequestId,
        /// Context configuration.
        config: ComputeConfig,
    },
    /// Run one operation.
    Compute {
        /// Request id echoed in the reply.
        id: RequestId,
        /// The operation, with its input buffers.
        operation: Operation,
    },
    /// Tear down the context and exit.
    Dispose,
}

/// Worker → coordinator.
#[derive(Debug)]
pub enum WorkerEvent {
    /// `Init` succeeded.
    Ready {
        /// Id of the `Init` message.
        id: RequestId,
        /// Reporting worker.
        worker: WorkerId,
    },
    /// `Compute` succeeded.
    Result {
        /// Id of the `Compute` message.
        id: RequestId,
        /// Reporting worker.
        worker: WorkerId,
        /// The result.
        value: ComputeValue,
        /// Time the worker spent executing.
        elapsed: Duration,
    },
    /// `Init` or `Compute` failed.
    Error {
        /// Id of the failed message.
        id: RequestId,
        /// Reporting worker.
        worker: WorkerId,
        /// Human-readable failure.
        message: String,
    },
}

impl WorkerEvent {
    /// The request id this event answers.
    pub fn id(&self) -> RequestId {
        match self {
            Self::Ready { id, .. } | Self::Result { id, .. } | Self::Error { id, .. } => *id,
        }
    }

    /// The worker that sent this event.
    pub fn worker(&self) -> WorkerId {
        match self {
            Self::Ready { worker, .. }
            | Self::Result { worker, .. }
            | Self::Error { worker, .. } => *worker,
        }
    }
}
