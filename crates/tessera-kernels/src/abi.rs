//! Offset-level kernel ABI.
//!
//! Each [`KernelCall`] names a kernel and the arena regions it reads and
//! writes, as byte [`Offset`]s plus element counts. [`execute`] validates
//! every region through the arena before touching memory, then runs the
//! slice kernel.
//!
//! Element-wise calls (`vec_add`, `vec_scale`) may write over one of their
//! inputs when the regions coincide exactly. Every other writing kernel
//! requires its output to be disjoint from its inputs, and a partial
//! overlap is always refused with [`KernelError::OverlappingRegions`].

use tessera_arena::Arena;
use tessera_core::{Offset, WORD_BYTES};

use crate::error::KernelError;
use crate::matrix::{self, MatrixShape};
use crate::{memory, signal, stats, vector};

/// One kernel invocation against an arena.
///
/// Lengths are element counts (`f64`s), never bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelCall {
    /// `vec_dot(a, b, len)`.
    VecDot {
        /// First operand.
        a: Offset,
        /// Second operand.
        b: Offset,
        /// Element count of both operands.
        len: usize,
    },
    /// `vec_magnitude(ptr, len)`.
    VecMagnitude {
        /// Vector start.
        ptr: Offset,
        /// Element count.
        len: usize,
    },
    /// `vec_normalize(ptr, len)`, in place.
    VecNormalize {
        /// Vector start.
        ptr: Offset,
        /// Element count.
        len: usize,
    },
    /// `vec_add(a, b, out, len)`. `out` may equal `a` or `b`.
    VecAdd {
        /// First operand.
        a: Offset,
        /// Second operand.
        b: Offset,
        /// Destination.
        out: Offset,
        /// Element count of all three regions.
        len: usize,
    },
    /// `vec_scale(ptr, out, len, factor)`. `out` may equal `ptr`.
    VecScale {
        /// Source vector.
        ptr: Offset,
        /// Destination.
        out: Offset,
        /// Element count.
        len: usize,
        /// Multiplier.
        factor: f64,
    },
    /// `mat_multiply(a, b, out)`.
    MatMultiply {
        /// Left operand.
        a: Offset,
        /// Shape of `a`.
        a_shape: MatrixShape,
        /// Right operand.
        b: Offset,
        /// Shape of `b`.
        b_shape: MatrixShape,
        /// Destination, `a_shape.rows × b_shape.cols`.
        out: Offset,
    },
    /// `mat_transpose(ptr, out)`.
    MatTranspose {
        /// Source matrix.
        ptr: Offset,
        /// Shape of the source.
        shape: MatrixShape,
        /// Destination, `shape.transposed()`.
        out: Offset,
    },
    /// `mat_frobenius_norm(ptr, size)`.
    MatFrobeniusNorm {
        /// Matrix start.
        ptr: Offset,
        /// Total element count.
        size: usize,
    },
    /// `stats_mean(ptr, len)`.
    StatsMean {
        /// Sample start.
        ptr: Offset,
        /// Sample count.
        len: usize,
    },
    /// `stats_variance(ptr, len)`.
    StatsVariance {
        /// Sample start.
        ptr: Offset,
        /// Sample count.
        len: usize,
    },
    /// `stats_std_dev(ptr, len)`.
    StatsStdDev {
        /// Sample start.
        ptr: Offset,
        /// Sample count.
        len: usize,
    },
    /// `signal_moving_avg(input, out, len, window)`.
    SignalMovingAvg {
        /// Input signal.
        input: Offset,
        /// Destination.
        out: Offset,
        /// Element count of input and output.
        len: usize,
        /// Window width in samples.
        window: usize,
    },
    /// `signal_convolve(input, kernel, out, len, kernel_len)`.
    SignalConvolve {
        /// Input signal.
        input: Offset,
        /// Filter taps.
        kernel: Offset,
        /// Destination.
        out: Offset,
        /// Element count of input and output.
        len: usize,
        /// Number of taps.
        kernel_len: usize,
    },
    /// `process_chunk_sum(ptr, start, end)`: sum of elements `[start, end)`.
    ProcessChunkSum {
        /// Array start.
        ptr: Offset,
        /// First element index.
        start: usize,
        /// One past the last element index.
        end: usize,
    },
    /// `mem_copy(src, dst, len)` with memmove semantics.
    MemCopy {
        /// Source.
        src: Offset,
        /// Destination.
        dst: Offset,
        /// Element count.
        len: usize,
    },
    /// `mem_fill_f64(ptr, len, value)`.
    MemFill {
        /// Region start.
        ptr: Offset,
        /// Element count.
        len: usize,
        /// Fill value.
        value: f64,
    },
}

impl KernelCall {
    /// Exported name of the kernel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VecDot { .. } => "vec_dot",
            Self::VecMagnitude { .. } => "vec_magnitude",
            Self::VecNormalize { .. } => "vec_normalize",
            Self::VecAdd { .. } => "vec_add",
            Self::VecScale { .. } => "vec_scale",
            Self::MatMultiply { .. } => "mat_multiply",
            Self::MatTranspose { .. } => "mat_transpose",
            Self::MatFrobeniusNorm { .. } => "mat_frobenius_norm",
            Self::StatsMean { .. } => "stats_mean",
            Self::StatsVariance { .. } => "stats_variance",
            Self::StatsStdDev { .. } => "stats_std_dev",
            Self::SignalMovingAvg { .. } => "signal_moving_avg",
            Self::SignalConvolve { .. } => "signal_convolve",
            Self::ProcessChunkSum { .. } => "process_chunk_sum",
            Self::MemCopy { .. } => "mem_copy",
            Self::MemFill { .. } => "mem_fill_f64",
        }
    }

    /// Region this call writes, if any.
    pub fn output(&self) -> Option<(Offset, usize)> {
        match *self {
            Self::VecNormalize { ptr, len } | Self::MemFill { ptr, len, .. } => Some((ptr, len)),
            Self::VecAdd { out, len, .. }
            | Self::VecScale { out, len, .. }
            | Self::SignalMovingAvg { out, len, .. }
            | Self::SignalConvolve { out, len, .. } => Some((out, len)),
            Self::MatMultiply {
                a_shape,
                b_shape,
                out,
                ..
            } => Some((out, a_shape.rows.saturating_mul(b_shape.cols))),
            Self::MatTranspose { shape, out, .. } => Some((out, shape.len())),
            Self::MemCopy { dst, len, .. } => Some((dst, len)),
            Self::VecDot { .. }
            | Self::VecMagnitude { .. }
            | Self::MatFrobeniusNorm { .. }
            | Self::StatsMean { .. }
            | Self::StatsVariance { .. }
            | Self::StatsStdDev { .. }
            | Self::ProcessChunkSum { .. } => None,
        }
    }
}

/// Result of a kernel invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelOutput {
    /// A reduction result.
    Scalar(f64),
    /// The kernel wrote `len` elements at `offset`.
    Written {
        /// Start of the written region.
        offset: Offset,
        /// Elements written.
        len: usize,
    },
}

impl KernelOutput {
    /// The scalar value, if this is a reduction result.
    pub fn scalar(self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Written { .. } => None,
        }
    }
}

fn overlaps(a: Offset, a_len: usize, b: Offset, b_len: usize) -> bool {
    if a_len == 0 || b_len == 0 {
        return false;
    }
    let a_end = a.0.saturating_add(a_len.saturating_mul(WORD_BYTES));
    let b_end = b.0.saturating_add(b_len.saturating_mul(WORD_BYTES));
    a.0 < b_end && b.0 < a_end
}

fn disjoint(input: Offset, in_len: usize, output: Offset, out_len: usize) -> Result<(), KernelError> {
    if overlaps(input, in_len, output, out_len) {
        Err(KernelError::OverlappingRegions { input, output })
    } else {
        Ok(())
    }
}

/// Run `call` against `arena`.
pub fn execute(arena: &mut Arena, call: &KernelCall) -> Result<KernelOutput, KernelError> {
    use KernelOutput::{Scalar, Written};

    match *call {
        KernelCall::VecDot { a, b, len } => {
            let x = arena.words(a, len)?;
            let y = arena.words(b, len)?;
            Ok(Scalar(vector::dot(x, y)?))
        }
        KernelCall::VecMagnitude { ptr, len } => Ok(Scalar(vector::magnitude(arena.words(ptr, len)?))),
        KernelCall::VecNormalize { ptr, len } => {
            vector::normalize(arena.words_mut(ptr, len)?);
            Ok(Written { offset: ptr, len })
        }
        KernelCall::VecAdd { a, b, out, len } => {
            match (out == a, out == b) {
                (true, true) => vector::scale_in_place(arena.words_mut(out, len)?, 2.0),
                (true, false) | (false, true) => {
                    let other = if out == a { b } else { a };
                    disjoint(other, len, out, len)?;
                    let mut win = arena.output_window(out, len)?;
                    let x = win.input(other, len)?;
                    vector::add_assign(win.output(), x)?;
                }
                (false, false) => {
                    disjoint(a, len, out, len)?;
                    disjoint(b, len, out, len)?;
                    let mut win = arena.output_window(out, len)?;
                    let x = win.input(a, len)?;
                    let y = win.input(b, len)?;
                    vector::add(x, y, win.output())?;
                }
            }
            Ok(Written { offset: out, len })
        }
        KernelCall::VecScale {
            ptr,
            out,
            len,
            factor,
        } => {
            if out == ptr {
                vector::scale_in_place(arena.words_mut(out, len)?, factor);
            } else {
                disjoint(ptr, len, out, len)?;
                let mut win = arena.output_window(out, len)?;
                let x = win.input(ptr, len)?;
                vector::scale(x, factor, win.output())?;
            }
            Ok(Written { offset: out, len })
        }
        KernelCall::MatMultiply {
            a,
            a_shape,
            b,
            b_shape,
            out,
        } => {
            if a_shape.cols != b_shape.rows {
                return Err(KernelError::DimensionMismatch {
                    left_cols: a_shape.cols,
                    right_rows: b_shape.rows,
                });
            }
            let a_len = a_shape.element_count()?;
            let b_len = b_shape.element_count()?;
            let out_len = MatrixShape::new(a_shape.rows, b_shape.cols).element_count()?;
            disjoint(a, a_len, out, out_len)?;
            disjoint(b, b_len, out, out_len)?;
            let mut win = arena.output_window(out, out_len)?;
            let x = win.input(a, a_len)?;
            let y = win.input(b, b_len)?;
            matrix::multiply(x, a_shape, y, b_shape, win.output())?;
            Ok(Written {
                offset: out,
                len: out_len,
            })
        }
        KernelCall::MatTranspose { ptr, shape, out } => {
            let len = shape.element_count()?;
            disjoint(ptr, len, out, len)?;
            let mut win = arena.output_window(out, len)?;
            let x = win.input(ptr, len)?;
            matrix::transpose(x, shape, win.output())?;
            Ok(Written { offset: out, len })
        }
        KernelCall::MatFrobeniusNorm { ptr, size } => {
            Ok(Scalar(matrix::frobenius_norm(arena.words(ptr, size)?)))
        }
        KernelCall::StatsMean { ptr, len } => Ok(Scalar(stats::mean(arena.words(ptr, len)?))),
        KernelCall::StatsVariance { ptr, len } => {
            Ok(Scalar(stats::variance(arena.words(ptr, len)?)))
        }
        KernelCall::StatsStdDev { ptr, len } => Ok(Scalar(stats::std_dev(arena.words(ptr, len)?))),
        KernelCall::SignalMovingAvg {
            input,
            out,
            len,
            window,
        } => {
            disjoint(input, len, out, len)?;
            let mut win = arena.output_window(out, len)?;
            let x = win.input(input, len)?;
            signal::moving_average(x, window, win.output())?;
            Ok(Written { offset: out, len })
        }
        KernelCall::SignalConvolve {
            input,
            kernel,
            out,
            len,
            kernel_len,
        } => {
            disjoint(input, len, out, len)?;
            disjoint(kernel, kernel_len, out, len)?;
            let mut win = arena.output_window(out, len)?;
            let x = win.input(input, len)?;
            let k = win.input(kernel, kernel_len)?;
            signal::convolve(x, k, win.output())?;
            Ok(Written { offset: out, len })
        }
        KernelCall::ProcessChunkSum { ptr, start, end } => {
            if start > end {
                return Err(KernelError::EmptyRange { start, end });
            }
            let data = arena.words(ptr, end)?;
            Ok(Scalar(memory::chunk_sum(data, start, end)?))
        }
        KernelCall::MemCopy { src, dst, len } => {
            arena.copy_within(src, dst, len)?;
            Ok(Written { offset: dst, len })
        }
        KernelCall::MemFill { ptr, len, value } => {
            memory::fill(arena.words_mut(ptr, len)?, value);
            Ok(Written { offset: ptr, len })
        }
    }
}
