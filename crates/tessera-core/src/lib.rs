//! Core identifiers and change-notification traits for Tessera.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! strongly-typed ids shared by the arena, kernel and engine crates, and
//! the push-based observer interface the compute facade fires after every
//! mutating operation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod observer;

pub use id::{ObserverId, Offset, RequestId, WorkerId, WORD_BYTES};
pub use observer::{ChangeEvent, ChangeObserver, ObserverSet};
