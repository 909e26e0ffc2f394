//! Dense vector kernels.

use crate::error::KernelError;

/// Magnitudes at or below this are treated as zero by [`normalize`].
pub const NORMALIZE_EPSILON: f64 = 1e-7;

fn check_len(left: usize, right: usize) -> Result<(), KernelError> {
    if left == right {
        Ok(())
    } else {
        Err(KernelError::LengthMismatch { left, right })
    }
}

/// Σ aᵢ·bᵢ.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64, KernelError> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Euclidean norm, √(Σ vᵢ²).
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scale `v` to unit length in place.
///
/// Leaves `v` unchanged when its magnitude is at most
/// [`NORMALIZE_EPSILON`].
pub fn normalize(v: &mut [f64]) {
    let mag = magnitude(v);
    if mag > NORMALIZE_EPSILON {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

/// `out[i] = a[i] + b[i]`.
pub fn add(a: &[f64], b: &[f64], out: &mut [f64]) -> Result<(), KernelError> {
    check_len(a.len(), b.len())?;
    check_len(a.len(), out.len())?;
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x + y;
    }
    Ok(())
}

/// `acc[i] += other[i]`.
pub fn add_assign(acc: &mut [f64], other: &[f64]) -> Result<(), KernelError> {
    check_len(acc.len(), other.len())?;
    for (o, x) in acc.iter_mut().zip(other) {
        *o += x;
    }
    Ok(())
}

/// `out[i] = v[i] * factor`.
pub fn scale(v: &[f64], factor: f64, out: &mut [f64]) -> Result<(), KernelError> {
    check_len(v.len(), out.len())?;
    for (o, x) in out.iter_mut().zip(v) {
        *o = x * factor;
    }
    Ok(())
}

/// `v[i] *= factor`.
pub fn scale_in_place(v: &mut [f64], factor: f64) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_test_utils::fixtures::{assert_close, assert_slices_close, SCENARIO_A, SCENARIO_B};

    #[test]
    fn dot_of_scenario_vectors() {
        assert_close(dot(&SCENARIO_A, &SCENARIO_B).unwrap(), 20.0);
    }

    #[test]
    fn dot_rejects_length_mismatch() {
        assert_eq!(
            dot(&[1.0, 2.0], &[1.0]),
            Err(KernelError::LengthMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn empty_vectors() {
        assert_eq!(dot(&[], &[]).unwrap(), 0.0);
        assert_eq!(magnitude(&[]), 0.0);
    }

    #[test]
    fn magnitude_3_4_5() {
        assert_close(magnitude(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn normalize_to_unit_length() {
        let mut v = [3.0, 4.0];
        normalize(&mut v);
        assert_slices_close(&v, &[0.6, 0.8]);
    }

    #[test]
    fn normalize_tiny_vector_is_noop() {
        let mut v = [1e-8, 0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, [1e-8, 0.0, 0.0]);
        let mut zero = [0.0; 3];
        normalize(&mut zero);
        assert_eq!(zero, [0.0; 3]);
    }

    #[test]
    fn add_and_scale() {
        let mut out = [0.0; 4];
        add(&SCENARIO_A, &SCENARIO_B, &mut out).unwrap();
        assert_eq!(out, [5.0; 4]);
        scale(&SCENARIO_A, 0.5, &mut out).unwrap();
        assert_eq!(out, [0.5, 1.0, 1.5, 2.0]);
        assert!(add(&SCENARIO_A, &SCENARIO_B, &mut [0.0; 3]).is_err());
    }

    #[test]
    fn in_place_variants() {
        let mut acc = SCENARIO_A;
        add_assign(&mut acc, &SCENARIO_B).unwrap();
        assert_eq!(acc, [5.0; 4]);
        scale_in_place(&mut acc, 2.0);
        assert_eq!(acc, [10.0; 4]);
    }

    proptest! {
        #[test]
        fn dot_is_commutative(pairs in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 0..64)) {
            let (a, b): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            prop_assert_eq!(dot(&a, &b).unwrap(), dot(&b, &a).unwrap());
        }

        #[test]
        fn magnitude_is_non_negative(v in proptest::collection::vec(-1e6f64..1e6, 0..64)) {
            prop_assert!(magnitude(&v) >= 0.0);
        }

        #[test]
        fn normalized_has_unit_length(v in proptest::collection::vec(-1e3f64..1e3, 1..64)) {
            let mut v = v;
            let before = magnitude(&v);
            normalize(&mut v);
            if before > NORMALIZE_EPSILON {
                prop_assert!((magnitude(&v) - 1.0).abs() < 1e-9);
            }
        }
    }
}
