//! Numeric kernel catalogue for Tessera arenas.
//!
//! Two layers:
//!
//! - Slice kernels in [`vector`], [`matrix`], [`stats`], [`signal`] and
//!   [`memory`]: pure functions over `&[f64]` / `&mut [f64]` with no
//!   allocation of their own.
//! - The offset-level ABI in [`abi`]: a closed [`KernelCall`] enum
//!   addressing arena regions by byte offset, dispatched by [`execute`]
//!   after the arena has validated every region.
//!
//! | ABI name | Slice kernel |
//! |----------|--------------|
//! | `vec_dot`, `vec_magnitude`, `vec_normalize`, `vec_add`, `vec_scale` | [`vector`] |
//! | `mat_multiply`, `mat_transpose`, `mat_frobenius_norm` | [`matrix`] |
//! | `stats_mean`, `stats_variance`, `stats_std_dev` | [`stats`] |
//! | `signal_moving_avg`, `signal_convolve` | [`signal`] |
//! | `process_chunk_sum`, `mem_copy`, `mem_fill_f64` | [`memory`] / arena |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abi;
pub mod error;
pub mod matrix;
pub mod memory;
pub mod signal;
pub mod stats;
pub mod vector;

pub use abi::{execute, KernelCall, KernelOutput};
pub use error::KernelError;
pub use matrix::MatrixShape;
