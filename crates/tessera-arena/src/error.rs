//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use tessera_core::Offset;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// An allocation could not be satisfied because growing the buffer
    /// would exceed the configured ceiling.
    AllocationFailed {
        /// Number of bytes requested (after alignment).
        requested: usize,
        /// Capacity of the buffer at the time of the request.
        capacity: usize,
        /// Configured maximum capacity.
        max_capacity: usize,
    },
    /// An explicit growth request would exceed the configured ceiling.
    OutOfMemory {
        /// Capacity the growth would have produced.
        requested_capacity: usize,
        /// Configured maximum capacity.
        max_capacity: usize,
    },
    /// An offset/size pair lies outside the addressable region, is not
    /// word-aligned, or overlaps a region it must not alias.
    InvalidPointer {
        /// The offending offset.
        offset: Offset,
        /// Size of the access in bytes.
        size: usize,
        /// First addressable byte.
        reserved_prefix: usize,
        /// Capacity of the buffer at the time of the access.
        capacity: usize,
    },
    /// Arena configuration violates an invariant.
    InvalidConfig {
        /// Description of which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed {
                requested,
                capacity,
                max_capacity,
            } => {
                write!(
                    f,
                    "allocation failed: requested {requested} bytes, capacity {capacity} bytes, max {max_capacity} bytes"
                )
            }
            Self::OutOfMemory {
                requested_capacity,
                max_capacity,
            } => {
                write!(
                    f,
                    "out of memory: growth to {requested_capacity} bytes exceeds max {max_capacity} bytes"
                )
            }
            Self::InvalidPointer {
                offset,
                size,
                reserved_prefix,
                capacity,
            } => {
                write!(
                    f,
                    "invalid pointer: {size} bytes at {offset} outside [{reserved_prefix}, {capacity})"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
