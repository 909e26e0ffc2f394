//! The compute facade.
//!
//! [`ComputeContext`] is the single entry point application code uses. It
//! owns one [`Arena`], hands out typed [`VectorHandle`]s and
//! [`MatrixHandle`]s, runs kernels through the offset ABI, keeps aggregate
//! [`ComputeMetrics`], and pushes a [`ChangeEvent`] to every subscribed
//! observer after each mutation.
//!
//! Every operation validates its handles before touching memory: a handle
//! whose block has been disposed, or discarded by [`ComputeContext::reset`],
//! fails with [`ComputeError::DisposedResourceAccess`] even if a newer
//! block now occupies the same offset.

use std::time::{Duration, Instant};

use tessera_arena::{Allocation, Arena, ArenaError, BlockKind};
use tessera_core::{ChangeEvent, ChangeObserver, ObserverId, ObserverSet, Offset, WORD_BYTES};
use tessera_kernels::{execute, KernelCall, KernelError, KernelOutput, MatrixShape};

use crate::config::ComputeConfig;
use crate::error::ComputeError;
use crate::metrics::ComputeMetrics;
use crate::view::{MatrixHandle, VectorHandle};

#[derive(Clone, Copy, Debug, Default)]
struct FacadeCounters {
    kernel_calls: u64,
    vectors_allocated: u64,
    matrices_allocated: u64,
    disposals: u64,
    compute_time: Duration,
    last_kernel_time: Duration,
}

/// Arena-backed numeric context.
///
/// Not thread-safe by itself: one context per thread. The worker pool
/// gives every worker its own.
#[derive(Debug)]
pub struct ComputeContext {
    arena: Arena,
    observers: ObserverSet,
    counters: FacadeCounters,
}

impl ComputeContext {
    /// Create a context with a fresh arena.
    ///
    /// Fails with [`ComputeError::InitializationFailed`] if the config is
    /// invalid.
    pub fn new(config: ComputeConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let arena = Arena::new(config.arena).map_err(|e| ComputeError::InitializationFailed {
            reason: e.to_string(),
        })?;
        tracing::debug!(capacity = arena.capacity(), "compute context initialized");
        Ok(Self {
            arena,
            observers: ObserverSet::new(),
            counters: FacadeCounters::default(),
        })
    }

    // ── Allocation ────────────────────────────────────────────────

    fn alloc(
        &mut self,
        len: usize,
        kind: BlockKind,
        label: Option<&str>,
    ) -> Result<Allocation, ComputeError> {
        let bytes = len
            .checked_mul(WORD_BYTES)
            .ok_or_else(|| self.too_large())?;
        let generation = self.arena.generation();
        let alloc = self
            .arena
            .allocate_block(bytes, kind, label.map(str::to_owned))?;
        if self.arena.generation() != generation {
            self.observers.notify(&ChangeEvent::Grown {
                generation: self.arena.generation(),
                capacity: self.arena.capacity(),
            });
        }
        self.observers.notify(&ChangeEvent::Allocated {
            offset: alloc.offset,
            size_bytes: alloc.size_bytes,
        });
        Ok(alloc)
    }

    fn too_large(&self) -> ArenaError {
        ArenaError::AllocationFailed {
            requested: usize::MAX,
            capacity: self.arena.capacity(),
            max_capacity: self.arena.max_capacity(),
        }
    }

    /// Allocate a zeroed vector of `len` elements.
    pub fn vector(&mut self, len: usize, label: Option<&str>) -> Result<VectorHandle, ComputeError> {
        let alloc = self.alloc(len, BlockKind::Vector { len }, label)?;
        self.counters.vectors_allocated += 1;
        Ok(VectorHandle {
            offset: alloc.offset,
            len,
            serial: alloc.serial,
        })
    }

    /// Allocate a vector holding a copy of `data`.
    pub fn vector_from(&mut self, data: &[f64]) -> Result<VectorHandle, ComputeError> {
        let v = self.vector(data.len(), None)?;
        self.write(v, data)?;
        Ok(v)
    }

    /// Allocate a zeroed `rows × cols` matrix.
    pub fn matrix(&mut self, rows: usize, cols: usize) -> Result<MatrixHandle, ComputeError> {
        let shape = MatrixShape::new(rows, cols);
        let len = rows.checked_mul(cols).ok_or_else(|| self.too_large())?;
        let alloc = self.alloc(len, BlockKind::Matrix { rows, cols }, None)?;
        self.counters.matrices_allocated += 1;
        Ok(MatrixHandle {
            offset: alloc.offset,
            shape,
            serial: alloc.serial,
        })
    }

    /// Allocate a matrix holding a copy of row-major `data`.
    ///
    /// Fails with [`ComputeError::ShapeMismatch`] unless
    /// `data.len() == rows * cols`.
    pub fn matrix_from(
        &mut self,
        rows: usize,
        cols: usize,
        data: &[f64],
    ) -> Result<MatrixHandle, ComputeError> {
        let expected = rows.saturating_mul(cols);
        if data.len() != expected {
            return Err(ComputeError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let m = self.matrix(rows, cols)?;
        self.write(m.as_vector(), data)?;
        Ok(m)
    }

    /// Allocate an `n × n` identity matrix.
    pub fn identity(&mut self, n: usize) -> Result<MatrixHandle, ComputeError> {
        let m = self.matrix(n, n)?;
        let words = self.arena.words_mut(m.offset, m.len())?;
        for i in 0..n {
            words[i * n + i] = 1.0;
        }
        self.observers.notify(&ChangeEvent::Written {
            offset: m.offset,
            len: m.len(),
        });
        Ok(m)
    }

    // ── Access ────────────────────────────────────────────────────

    fn check(&self, offset: Offset, serial: u64) -> Result<(), ComputeError> {
        if self.arena.is_live(offset, serial) {
            Ok(())
        } else {
            Err(ComputeError::DisposedResourceAccess { offset })
        }
    }

    /// Borrow a vector's elements from the arena's current buffer.
    pub fn slice(&self, v: VectorHandle) -> Result<&[f64], ComputeError> {
        self.check(v.offset, v.serial)?;
        Ok(self.arena.words(v.offset, v.len)?)
    }

    /// Copy a vector's elements out.
    pub fn read(&self, v: VectorHandle) -> Result<Vec<f64>, ComputeError> {
        self.slice(v).map(<[f64]>::to_vec)
    }

    /// Copy a matrix's elements out, row-major.
    pub fn read_matrix(&self, m: MatrixHandle) -> Result<Vec<f64>, ComputeError> {
        self.read(m.as_vector())
    }

    /// Overwrite a vector with `data`.
    ///
    /// Fails with [`ComputeError::ShapeMismatch`] unless `data.len()`
    /// equals the vector's length.
    pub fn write(&mut self, v: VectorHandle, data: &[f64]) -> Result<(), ComputeError> {
        self.check(v.offset, v.serial)?;
        if data.len() != v.len {
            return Err(ComputeError::ShapeMismatch {
                expected: v.len,
                actual: data.len(),
            });
        }
        self.arena
            .words_mut(v.offset, v.len)?
            .copy_from_slice(data);
        self.observers.notify(&ChangeEvent::Written {
            offset: v.offset,
            len: v.len,
        });
        Ok(())
    }

    /// Set every element of `v` to `value`.
    pub fn fill(&mut self, v: VectorHandle, value: f64) -> Result<(), ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run(KernelCall::MemFill {
            ptr: v.offset,
            len: v.len,
            value,
        })?;
        Ok(())
    }

    /// Copy `src` into `dst`. Both must have the same length.
    pub fn copy(&mut self, src: VectorHandle, dst: VectorHandle) -> Result<(), ComputeError> {
        self.check(src.offset, src.serial)?;
        self.check(dst.offset, dst.serial)?;
        same_len(src.len, dst.len)?;
        self.run(KernelCall::MemCopy {
            src: src.offset,
            dst: dst.offset,
            len: src.len,
        })?;
        Ok(())
    }

    // ── Release ───────────────────────────────────────────────────

    /// Return a vector's block to the free list.
    ///
    /// Disposing an already-disposed handle fails with
    /// [`ComputeError::DisposedResourceAccess`].
    pub fn dispose(&mut self, v: VectorHandle) -> Result<(), ComputeError> {
        self.release(v.offset, v.serial)
    }

    /// Return a matrix's block to the free list.
    pub fn dispose_matrix(&mut self, m: MatrixHandle) -> Result<(), ComputeError> {
        self.release(m.offset, m.serial)
    }

    fn release(&mut self, offset: Offset, serial: u64) -> Result<(), ComputeError> {
        self.check(offset, serial)?;
        self.arena.deallocate(offset);
        self.counters.disposals += 1;
        self.observers.notify(&ChangeEvent::Released { offset });
        Ok(())
    }

    /// Discard every allocation. All outstanding handles become stale.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.observers.notify(&ChangeEvent::Reset);
    }

    // ── Kernel dispatch ───────────────────────────────────────────

    fn run(&mut self, call: KernelCall) -> Result<KernelOutput, ComputeError> {
        let start = Instant::now();
        let output = execute(&mut self.arena, &call)?;
        let elapsed = start.elapsed();
        self.counters.kernel_calls += 1;
        self.counters.compute_time += elapsed;
        self.counters.last_kernel_time = elapsed;
        tracing::trace!(kernel = call.name(), ?elapsed, "kernel executed");
        self.observers.notify(&ChangeEvent::Computed {
            kernel: call.name(),
            output: call.output().map(|(offset, _)| offset),
        });
        Ok(output)
    }

    fn run_scalar(&mut self, call: KernelCall) -> Result<f64, ComputeError> {
        match self.run(call)? {
            KernelOutput::Scalar(v) => Ok(v),
            KernelOutput::Written { .. } => Err(KernelError::NotAReduction {
                kernel: call.name(),
            }
            .into()),
        }
    }

    /// Run a kernel into a freshly allocated output, releasing the output
    /// again if the kernel fails.
    fn run_into(&mut self, out: Offset, call: KernelCall) -> Result<(), ComputeError> {
        if let Err(e) = self.run(call) {
            self.arena.deallocate(out);
            return Err(e);
        }
        Ok(())
    }

    // ── Element-wise ──────────────────────────────────────────────

    /// `a + b` into a new vector.
    pub fn add(&mut self, a: VectorHandle, b: VectorHandle) -> Result<VectorHandle, ComputeError> {
        self.check(a.offset, a.serial)?;
        self.check(b.offset, b.serial)?;
        same_len(a.len, b.len)?;
        let out = self.vector(a.len, None)?;
        self.run_into(
            out.offset,
            KernelCall::VecAdd {
                a: a.offset,
                b: b.offset,
                out: out.offset,
                len: a.len,
            },
        )?;
        Ok(out)
    }

    /// `out = a + b`. `out` may be `a` or `b`.
    pub fn add_into(
        &mut self,
        a: VectorHandle,
        b: VectorHandle,
        out: VectorHandle,
    ) -> Result<(), ComputeError> {
        self.check(a.offset, a.serial)?;
        self.check(b.offset, b.serial)?;
        self.check(out.offset, out.serial)?;
        same_len(a.len, b.len)?;
        same_len(a.len, out.len)?;
        self.run(KernelCall::VecAdd {
            a: a.offset,
            b: b.offset,
            out: out.offset,
            len: a.len,
        })?;
        Ok(())
    }

    /// `v * factor` into a new vector.
    pub fn scale(&mut self, v: VectorHandle, factor: f64) -> Result<VectorHandle, ComputeError> {
        self.check(v.offset, v.serial)?;
        let out = self.vector(v.len, None)?;
        self.run_into(
            out.offset,
            KernelCall::VecScale {
                ptr: v.offset,
                out: out.offset,
                len: v.len,
                factor,
            },
        )?;
        Ok(out)
    }

    /// `out = v * factor`. `out` may be `v`.
    pub fn scale_into(
        &mut self,
        v: VectorHandle,
        factor: f64,
        out: VectorHandle,
    ) -> Result<(), ComputeError> {
        self.check(v.offset, v.serial)?;
        self.check(out.offset, out.serial)?;
        same_len(v.len, out.len)?;
        self.run(KernelCall::VecScale {
            ptr: v.offset,
            out: out.offset,
            len: v.len,
            factor,
        })?;
        Ok(())
    }

    /// Scale `v` to unit length in place. Near-zero vectors are left as is.
    pub fn normalize(&mut self, v: VectorHandle) -> Result<(), ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run(KernelCall::VecNormalize {
            ptr: v.offset,
            len: v.len,
        })?;
        Ok(())
    }

    // ── Reductions ────────────────────────────────────────────────

    /// Dot product.
    pub fn dot(&mut self, a: VectorHandle, b: VectorHandle) -> Result<f64, ComputeError> {
        self.check(a.offset, a.serial)?;
        self.check(b.offset, b.serial)?;
        same_len(a.len, b.len)?;
        self.run_scalar(KernelCall::VecDot {
            a: a.offset,
            b: b.offset,
            len: a.len,
        })
    }

    /// Euclidean norm.
    pub fn magnitude(&mut self, v: VectorHandle) -> Result<f64, ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run_scalar(KernelCall::VecMagnitude {
            ptr: v.offset,
            len: v.len,
        })
    }

    /// Arithmetic mean (zero for an empty vector).
    pub fn mean(&mut self, v: VectorHandle) -> Result<f64, ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run_scalar(KernelCall::StatsMean {
            ptr: v.offset,
            len: v.len,
        })
    }

    /// Sample variance (zero for fewer than two elements).
    pub fn variance(&mut self, v: VectorHandle) -> Result<f64, ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run_scalar(KernelCall::StatsVariance {
            ptr: v.offset,
            len: v.len,
        })
    }

    /// Sample standard deviation.
    pub fn std_dev(&mut self, v: VectorHandle) -> Result<f64, ComputeError> {
        self.check(v.offset, v.serial)?;
        self.run_scalar(KernelCall::StatsStdDev {
            ptr: v.offset,
            len: v.len,
        })
    }

    /// Sum of elements `[start, end)` of `v`.
    pub fn chunk_sum(
        &mut self,
        v: VectorHandle,
        start: usize,
        end: usize,
    ) -> Result<f64, ComputeError> {
        self.check(v.offset, v.serial)?;
        if end > v.len {
            return Err(KernelError::LengthMismatch {
                left: end,
                right: v.len,
            }
            .into());
        }
        self.run_scalar(KernelCall::ProcessChunkSum {
            ptr: v.offset,
            start,
            end,
        })
    }

    /// Frobenius norm of a matrix.
    pub fn frobenius_norm(&mut self, m: MatrixHandle) -> Result<f64, ComputeError> {
        self.check(m.offset, m.serial)?;
        self.run_scalar(KernelCall::MatFrobeniusNorm {
            ptr: m.offset,
            size: m.len(),
        })
    }

    // ── Matrix ────────────────────────────────────────────────────

    /// `a · b` into a new matrix.
    pub fn matmul(&mut self, a: MatrixHandle, b: MatrixHandle) -> Result<MatrixHandle, ComputeError> {
        self.check(a.offset, a.serial)?;
        self.check(b.offset, b.serial)?;
        if a.cols() != b.rows() {
            return Err(KernelError::DimensionMismatch {
                left_cols: a.cols(),
                right_rows: b.rows(),
            }
            .into());
        }
        let out = self.matrix(a.rows(), b.cols())?;
        self.run_into(
            out.offset,
            KernelCall::MatMultiply {
                a: a.offset,
                a_shape: a.shape,
                b: b.offset,
                b_shape: b.shape,
                out: out.offset,
            },
        )?;
        Ok(out)
    }

    /// Transpose into a new matrix.
    pub fn transpose(&mut self, m: MatrixHandle) -> Result<MatrixHandle, ComputeError> {
        self.check(m.offset, m.serial)?;
        let out = self.matrix(m.cols(), m.rows())?;
        self.run_into(
            out.offset,
            KernelCall::MatTranspose {
                ptr: m.offset,
                shape: m.shape,
                out: out.offset,
            },
        )?;
        Ok(out)
    }

    // ── Signal ────────────────────────────────────────────────────

    /// Centered moving average into a new vector.
    pub fn moving_average(
        &mut self,
        v: VectorHandle,
        window: usize,
    ) -> Result<VectorHandle, ComputeError> {
        self.check(v.offset, v.serial)?;
        let out = self.vector(v.len, None)?;
        self.run_into(
            out.offset,
            KernelCall::SignalMovingAvg {
                input: v.offset,
                out: out.offset,
                len: v.len,
                window,
            },
        )?;
        Ok(out)
    }

    /// Centered correlation of `v` with `kernel` into a new vector.
    pub fn convolve(
        &mut self,
        v: VectorHandle,
        kernel: VectorHandle,
    ) -> Result<VectorHandle, ComputeError> {
        self.check(v.offset, v.serial)?;
        self.check(kernel.offset, kernel.serial)?;
        let out = self.vector(v.len, None)?;
        self.run_into(
            out.offset,
            KernelCall::SignalConvolve {
                input: v.offset,
                kernel: kernel.offset,
                out: out.offset,
                len: v.len,
                kernel_len: kernel.len,
            },
        )?;
        Ok(out)
    }

    // ── Observation ───────────────────────────────────────────────

    /// Register an observer for [`ChangeEvent`]s.
    pub fn subscribe(&mut self, observer: Box<dyn ChangeObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Snapshot of facade and arena counters.
    pub fn metrics(&self) -> ComputeMetrics {
        ComputeMetrics {
            arena: self.arena.stats(),
            kernel_calls: self.counters.kernel_calls,
            vectors_allocated: self.counters.vectors_allocated,
            matrices_allocated: self.counters.matrices_allocated,
            disposals: self.counters.disposals,
            compute_time: self.counters.compute_time,
            last_kernel_time: self.counters.last_kernel_time,
        }
    }

    /// The underlying arena, for introspection.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Whether `v` still refers to a live block.
    pub fn is_live(&self, v: VectorHandle) -> bool {
        self.arena.is_live(v.offset, v.serial)
    }
}

fn same_len(left: usize, right: usize) -> Result<(), ComputeError> {
    if left == right {
        Ok(())
    } else {
        Err(KernelError::LengthMismatch { left, right }.into())
    }
}
