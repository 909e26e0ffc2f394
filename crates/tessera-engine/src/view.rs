//! Typed handles to arena-backed vectors and matrices.
//!
//! A handle is a `Copy` token: offset, shape and the serial of the block
//! it was created for. It never caches a slice. Every access goes back
//! through the owning [`ComputeContext`](crate::compute::ComputeContext),
//! which checks the serial against the arena's live block table and then
//! borrows from the arena's current buffer, so a growth between two
//! accesses is invisible to the handle holder.

use tessera_core::{Offset, WORD_BYTES};
use tessera_kernels::MatrixShape;

/// Handle to an `f64` vector in a context's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VectorHandle {
    pub(crate) offset: Offset,
    pub(crate) len: usize,
    pub(crate) serial: u64,
}

impl VectorHandle {
    /// Byte offset of the first element.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the data in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * WORD_BYTES
    }
}

/// Handle to a row-major `f64` matrix in a context's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatrixHandle {
    pub(crate) offset: Offset,
    pub(crate) shape: MatrixShape,
    pub(crate) serial: u64,
}

impl MatrixHandle {
    /// Byte offset of element `(0, 0)`.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    /// Dimensions.
    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        self.shape.len()
    }

    /// Whether the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// The matrix's storage viewed as a flat vector.
    ///
    /// The returned handle shares this matrix's block; disposing either
    /// invalidates both.
    pub fn as_vector(&self) -> VectorHandle {
        VectorHandle {
            offset: self.offset,
            len: self.shape.len(),
            serial: self.serial,
        }
    }
}
