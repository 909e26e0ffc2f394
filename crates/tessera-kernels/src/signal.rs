//! One-dimensional signal filters.

use crate::error::KernelError;

/// Centered moving average with edge clipping.
///
/// `out[i]` is the mean of `input[lo..hi]` where
/// `lo = max(0, i - window/2)` and `hi = min(len, i + window/2 + 1)`.
/// Near the edges the window shrinks rather than padding with zeros.
/// An even `window` therefore averages `window + 1` samples in the
/// interior.
pub fn moving_average(input: &[f64], window: usize, out: &mut [f64]) -> Result<(), KernelError> {
    if input.len() != out.len() {
        return Err(KernelError::LengthMismatch {
            left: input.len(),
            right: out.len(),
        });
    }
    let half = window / 2;
    let len = input.len();
    for (i, o) in out.iter_mut().enumerate() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(len);
        let span = &input[lo..hi];
        *o = span.iter().sum::<f64>() / span.len() as f64;
    }
    Ok(())
}

/// Centered correlation with implicit zero padding.
///
/// `out[i] = Σⱼ input[i + kernel.len()/2 − j] · kernel[j]`, skipping terms
/// whose input index falls outside `input`.
pub fn convolve(input: &[f64], kernel: &[f64], out: &mut [f64]) -> Result<(), KernelError> {
    if input.len() != out.len() {
        return Err(KernelError::LengthMismatch {
            left: input.len(),
            right: out.len(),
        });
    }
    let half = kernel.len() / 2;
    for (i, o) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (j, k) in kernel.iter().enumerate() {
            // i + half - j, kept in range without going negative.
            if let Some(idx) = (i + half).checked_sub(j) {
                if let Some(x) = input.get(idx) {
                    sum += x * k;
                }
            }
        }
        *o = sum;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_test_utils::fixtures::assert_slices_close;

    #[test]
    fn moving_average_clips_at_edges() {
        let input = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0; 5];
        moving_average(&input, 3, &mut out).unwrap();
        assert_slices_close(&out, &[1.5, 2.0, 3.0, 4.0, 4.5]);
    }

    #[test]
    fn moving_average_window_one_is_identity() {
        let input = [3.0, -1.0, 7.0];
        let mut out = [0.0; 3];
        moving_average(&input, 1, &mut out).unwrap();
        assert_eq!(out, input);
        moving_average(&input, 0, &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn moving_average_even_window() {
        let input = [0.0, 0.0, 6.0, 0.0, 0.0];
        let mut out = [0.0; 5];
        moving_average(&input, 2, &mut out).unwrap();
        assert_slices_close(&out, &[0.0, 2.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn convolve_with_delta_is_identity() {
        let input = [1.0, 2.0, 3.0, 4.0];
        let mut out = [0.0; 4];
        convolve(&input, &[0.0, 1.0, 0.0], &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn convolve_zero_pads_edges() {
        let input = [1.0, 2.0, 3.0];
        let mut out = [0.0; 3];
        convolve(&input, &[1.0, 1.0, 1.0], &mut out).unwrap();
        assert_eq!(out, [3.0, 6.0, 5.0]);
    }

    #[test]
    fn convolve_is_flipped() {
        // Kernel [1, 2] with half = 1: out[i] = in[i+1]*1 + in[i]*2.
        let input = [1.0, 10.0, 100.0];
        let mut out = [0.0; 3];
        convolve(&input, &[1.0, 2.0], &mut out).unwrap();
        assert_eq!(out, [12.0, 120.0, 200.0]);
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut out = [0.0; 2];
        assert!(moving_average(&[1.0, 2.0, 3.0], 3, &mut out).is_err());
        assert!(convolve(&[1.0, 2.0, 3.0], &[1.0], &mut out).is_err());
    }
}
