/// Mathematical utility functions for the chamber thermal simulations
///
/// Shared numeric helpers: interpolation, percentage deviation, trapezoidal
/// integration, percentile extraction and a small dense Cholesky factorization
/// used by the Gaussian copula.

/// Assert that the deviation between two values is less than a threshold
///
/// Calculates the percentage deviation between `actual` and `expected`, then
/// asserts that this deviation is less than the specified `max_deviation`.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values (ratio 0.0 = a, 1.0 = b)
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Percentage deviation of `actual` from `expected`
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        // Avoid division by zero - if expected is 0, return 0 if actual is also 0
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}

/// Trapezoidal integration over (x, y) samples. Samples must be sorted by x.
pub fn trapezoid(samples: &[(f64, f64)]) -> f64 {
    samples
        .windows(2)
        .map(|w| 0.5 * (w[0].1 + w[1].1) * (w[1].0 - w[0].0))
        .sum()
}

/// Percentile of a sorted slice with linear interpolation between ranks.
///
/// `p` is in percent (0..=100). Panics on an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of empty slice");
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    lerp(sorted[lo], sorted[hi], rank - lo as f64)
}

/// Cholesky factorization of a symmetric positive-definite matrix.
///
/// Returns the lower-triangular factor L with A = L L^T, or None when the
/// matrix is not positive definite (singular correlation matrices land here).
pub fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        if a[i].len() != n {
            return None;
        }
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}
