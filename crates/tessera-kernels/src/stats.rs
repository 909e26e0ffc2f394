//! Descriptive statistics.

/// Arithmetic mean. Zero for an empty slice.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Sample variance, Σ(vᵢ − mean)² / (n − 1). Zero when `n ≤ 1`.
///
/// Accumulated with Welford's update, so a constant slice yields exactly
/// zero regardless of rounding in the mean.
pub fn variance(v: &[f64]) -> f64 {
    if v.len() <= 1 {
        return 0.0;
    }
    let mut running_mean = 0.0;
    let mut m2 = 0.0;
    for (i, &x) in v.iter().enumerate() {
        let delta = x - running_mean;
        running_mean += delta / (i + 1) as f64;
        m2 += delta * (x - running_mean);
    }
    m2 / (v.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(v: &[f64]) -> f64 {
    variance(v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_test_utils::fixtures::{
        assert_close, SCENARIO_A, SCENARIO_MEAN, SCENARIO_STD_DEV, SCENARIO_VARIANCE,
    };

    #[test]
    fn scenario_statistics() {
        assert_close(mean(&SCENARIO_A), SCENARIO_MEAN);
        assert_close(variance(&SCENARIO_A), SCENARIO_VARIANCE);
        assert_close(std_dev(&SCENARIO_A), SCENARIO_STD_DEV);
    }

    #[test]
    fn degenerate_lengths() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[42.0]), 0.0);
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    proptest! {
        #[test]
        fn variance_is_non_negative(v in proptest::collection::vec(-1e6f64..1e6, 2..64)) {
            prop_assert!(variance(&v) >= 0.0);
        }

        #[test]
        fn constant_vector_has_zero_variance(x in -1e6f64..1e6, n in 2usize..64) {
            prop_assert_eq!(variance(&vec![x; n]), 0.0);
        }
    }
}
