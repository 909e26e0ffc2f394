//! Bulk memory kernels.

use crate::error::KernelError;

/// Sum of `data[start..end]`.
///
/// `start == end` sums nothing and returns zero. Fails with
/// [`KernelError::EmptyRange`] when `start > end` and with
/// [`KernelError::LengthMismatch`] when `end` runs past `data`.
pub fn chunk_sum(data: &[f64], start: usize, end: usize) -> Result<f64, KernelError> {
    if start > end {
        return Err(KernelError::EmptyRange { start, end });
    }
    let chunk = data.get(start..end).ok_or(KernelError::LengthMismatch {
        left: end,
        right: data.len(),
    })?;
    Ok(chunk.iter().sum())
}

/// Set every element of `data` to `value`.
pub fn fill(data: &mut [f64], value: f64) {
    data.fill(value);
}
