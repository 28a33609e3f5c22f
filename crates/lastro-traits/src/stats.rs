//! Numeric kernels shared across the engine.
//!
//! Ratios here follow the zero-guard rule used by every multiple: a zero
//! denominator yields exactly `0.0`. Downstream consumers depend on this, even
//! though it makes an undefined multiple indistinguishable from a zero one.

use ndarray::Array1;

/// Divides `numerator` by `denominator`, returning `0.0` when the denominator
/// is exactly zero.
///
/// # Examples
///
/// ```
/// use lastro_traits::stats::ratio;
///
/// assert_eq!(ratio(50.0, 4.0), 12.5);
/// assert_eq!(ratio(50.0, 0.0), 0.0);
/// assert_eq!(ratio(-3.0, 0.0), 0.0);
/// ```
#[inline]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Straight line fitted by ordinary least squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    /// Change per unit of the time index.
    pub slope: f64,
    /// Value at index zero.
    pub intercept: f64,
}

/// Fits `y = intercept + slope * t` for `t = 0, 1, ..., n - 1`.
///
/// Returns `None` when the fit is undefined: fewer than two points, or any
/// non-finite input or result.
///
/// # Examples
///
/// ```
/// use lastro_traits::stats::linear_trend;
/// use ndarray::array;
///
/// let trend = linear_trend(&array![1.0, 3.0, 5.0, 7.0]).unwrap();
/// assert!((trend.slope - 2.0).abs() < 1e-12);
/// assert!((trend.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn linear_trend(y: &Array1<f64>) -> Option<LinearTrend> {
    let n = y.len();
    if n < 2 || y.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let t = Array1::from_iter((0..n).map(|i| i as f64));
    let t_mean = t.mean()?;
    let y_mean = y.mean()?;

    let dt = &t - t_mean;
    let sxx = dt.dot(&dt);
    if sxx == 0.0 {
        return None;
    }
    let sxy = dt.dot(&(y - y_mean));

    let slope = sxy / sxx;
    let intercept = y_mean - slope * t_mean;
    if slope.is_finite() && intercept.is_finite() {
        Some(LinearTrend { slope, intercept })
    } else {
        None
    }
}
