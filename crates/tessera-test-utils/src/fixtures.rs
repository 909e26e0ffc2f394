//! Reusable numeric fixtures.
//!
//! - [`SCENARIO_A`] / [`SCENARIO_B`]: the four-element reference vectors
//!   whose dot product, mean, variance and standard deviation are known.
//! - [`identity`]: row-major identity matrices.
//! - [`assert_close`] / [`assert_slices_close`]: tolerance comparisons.

/// Reference vector `a`.
pub const SCENARIO_A: [f64; 4] = [1.0, 2.0, 3.0, 4.0];

/// Reference vector `b`.
pub const SCENARIO_B: [f64; 4] = [4.0, 3.0, 2.0, 1.0];

/// `dot(SCENARIO_A, SCENARIO_B)`.
pub const SCENARIO_DOT: f64 = 20.0;

/// `mean(SCENARIO_A)`.
pub const SCENARIO_MEAN: f64 = 2.5;

/// Sample variance of `SCENARIO_A` (n - 1 denominator).
pub const SCENARIO_VARIANCE: f64 = 5.0 / 3.0;

/// Sample standard deviation of `SCENARIO_A`.
pub const SCENARIO_STD_DEV: f64 = 1.290_994_448_735_805_6;

/// Default absolute tolerance for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// Row-major `n × n` identity matrix.
pub fn identity(n: usize) -> Vec<f64> {
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        data[i * n + i] = 1.0;
    }
    data
}

/// Row-major `rows × cols` matrix with `m[r][c] = r * cols + c + 1`.
pub fn sequential_matrix(rows: usize, cols: usize) -> Vec<f64> {
    (0..rows * cols).map(|i| (i + 1) as f64).collect()
}

/// Whether `a` and `b` differ by at most `eps` (absolute).
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Panic unless `actual` is within [`EPSILON`] of `expected`.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        approx_eq(actual, expected, EPSILON),
        "expected {expected}, got {actual} (|diff| = {})",
        (actual - expected).abs()
    );
}

/// Panic unless the slices have equal length and every pair is within
/// [`EPSILON`].
#[track_caller]
pub fn assert_slices_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "length mismatch: {actual:?} vs {expected:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            approx_eq(*a, *e, EPSILON),
            "index {i}: expected {e}, got {a} in {actual:?}"
        );
    }
}
