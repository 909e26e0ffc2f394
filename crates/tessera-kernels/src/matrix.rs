//! Row-major matrix kernels.

use std::fmt;

use crate::error::KernelError;
use crate::vector;

/// Dimensions of a row-major matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
}

impl MatrixShape {
    /// Create a shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements, saturating at `usize::MAX`.
    pub fn len(self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Number of elements, or `None` if `rows * cols` overflows.
    pub fn checked_len(self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    /// Like [`checked_len`](Self::checked_len), failing with
    /// [`KernelError::ShapeOverflow`].
    pub fn element_count(self) -> Result<usize, KernelError> {
        self.checked_len().ok_or(KernelError::ShapeOverflow {
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Whether the matrix has no elements.
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Shape of the transpose.
    pub fn transposed(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
        }
    }
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

fn check_len(data: &[f64], shape: MatrixShape) -> Result<(), KernelError> {
    if data.len() == shape.len() {
        Ok(())
    } else {
        Err(KernelError::LengthMismatch {
            left: data.len(),
            right: shape.len(),
        })
    }
}

/// `C = A · B` for `A[m×k]`, `B[k×n]`, `C[m×n]`.
///
/// Plain triple loop, O(m·k·n). Fails with
/// [`KernelError::DimensionMismatch`] if `A.cols != B.rows`.
pub fn multiply(
    a: &[f64],
    a_shape: MatrixShape,
    b: &[f64],
    b_shape: MatrixShape,
    out: &mut [f64],
) -> Result<(), KernelError> {
    if a_shape.cols != b_shape.rows {
        return Err(KernelError::DimensionMismatch {
            left_cols: a_shape.cols,
            right_rows: b_shape.rows,
        });
    }
    check_len(a, a_shape)?;
    check_len(b, b_shape)?;
    check_len(out, MatrixShape::new(a_shape.rows, b_shape.cols))?;

    let (m, k, n) = (a_shape.rows, a_shape.cols, b_shape.cols);
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            out[i * n + j] = sum;
        }
    }
    Ok(())
}

/// Write the transpose of `a[rows×cols]` into `out[cols×rows]`.
pub fn transpose(a: &[f64], shape: MatrixShape, out: &mut [f64]) -> Result<(), KernelError> {
    check_len(a, shape)?;
    check_len(out, shape.transposed())?;
    for r in 0..shape.rows {
        for c in 0..shape.cols {
            out[c * shape.rows + r] = a[r * shape.cols + c];
        }
    }
    Ok(())
}

/// √(Σ mᵢ²) over the flattened matrix.
pub fn frobenius_norm(m: &[f64]) -> f64 {
    vector::magnitude(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_test_utils::fixtures::{assert_close, identity, sequential_matrix};

    #[test]
    fn multiply_2x3_by_3x2() {
        let a = sequential_matrix(2, 3);
        let b = sequential_matrix(3, 2);
        let mut c = [0.0; 4];
        multiply(&a, MatrixShape::new(2, 3), &b, MatrixShape::new(3, 2), &mut c).unwrap();
        assert_eq!(c, [22.0, 28.0, 49.0, 64.0]);
    }

    #[test]
    fn multiply_rejects_inner_mismatch() {
        let err = multiply(
            &[0.0; 6],
            MatrixShape::new(2, 3),
            &[0.0; 4],
            MatrixShape::new(2, 2),
            &mut [0.0; 4],
        )
        .unwrap_err();
        assert_eq!(
            err,
            KernelError::DimensionMismatch {
                left_cols: 3,
                right_rows: 2
            }
        );
    }

    #[test]
    fn transpose_rectangular() {
        let a = sequential_matrix(2, 3);
        let mut t = [0.0; 6];
        transpose(&a, MatrixShape::new(2, 3), &mut t).unwrap();
        assert_eq!(t, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn frobenius_of_identity() {
        assert_close(frobenius_norm(&identity(4)), 2.0);
    }

    #[test]
    fn oversized_shapes_do_not_wrap() {
        let huge = MatrixShape::new(1 << 40, 1 << 40);
        assert_eq!(huge.checked_len(), None);
        assert_eq!(huge.len(), usize::MAX);
        assert_eq!(
            huge.element_count(),
            Err(KernelError::ShapeOverflow {
                rows: 1 << 40,
                cols: 1 << 40
            })
        );
        assert_eq!(MatrixShape::new(3, 4).element_count(), Ok(12));

        // The slice kernels reject the shape instead of overflowing.
        let err = transpose(&[0.0; 4], huge, &mut [0.0; 4]).unwrap_err();
        assert!(matches!(err, KernelError::LengthMismatch { .. }));
    }

    #[test]
    fn shape_display() {
        assert_eq!(MatrixShape::new(2, 3).to_string(), "2x3");
    }

    fn matrix() -> impl Strategy<Value = (usize, usize, Vec<f64>)> {
        (1usize..6, 1usize..6).prop_flat_map(|(r, c)| {
            proptest::collection::vec(-100.0f64..100.0, r * c).prop_map(move |d| (r, c, d))
        })
    }

    proptest! {
        #[test]
        fn transpose_is_involution((rows, cols, a) in matrix()) {
            let shape = MatrixShape::new(rows, cols);
            let mut t = vec![0.0; a.len()];
            let mut back = vec![0.0; a.len()];
            transpose(&a, shape, &mut t).unwrap();
            transpose(&t, shape.transposed(), &mut back).unwrap();
            prop_assert_eq!(back, a);
        }

        #[test]
        fn identity_is_right_neutral((rows, cols, a) in matrix()) {
            let mut out = vec![0.0; a.len()];
            multiply(
                &a,
                MatrixShape::new(rows, cols),
                &identity(cols),
                MatrixShape::new(cols, cols),
                &mut out,
            ).unwrap();
            prop_assert_eq!(out, a);
        }
    }
}
