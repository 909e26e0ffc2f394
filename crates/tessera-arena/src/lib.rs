//! Growable linear-memory arena for Tessera.
//!
//! One contiguous `f64` buffer addressed by byte offsets, with a reserved
//! prefix, a bump cursor and a best-fit free list. Every numeric buffer
//! the kernels touch lives here.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── words: Vec<f64>            (capacity = pages × page_size)
//! ├── live: IndexMap<Offset, Block>
//! ├── FreeList                   (released blocks, best-fit, no coalescing)
//! ├── generation                 (bumped on every reallocation)
//! └── Counters → ArenaStats
//! ```
//!
//! # Allocation order
//!
//! - **Reuse:** smallest free block that fits; keeps its full size.
//! - **Bump:** advance the cursor, growing by whole pages first if needed.
//! - **Fail:** [`ArenaError::AllocationFailed`] once `max_pages` is reached.
//!
//! All storage is zero-initialised `Vec<f64>`; no `unsafe`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod error;
pub mod stats;
pub mod window;

pub use arena::Arena;
pub use block::{Allocation, Block, BlockKind, FreeBlock, FreeList};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use stats::ArenaStats;
pub use window::OutputWindow;
