// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Small numeric helpers shared across method implementations.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two samples.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Least-squares line through `(0, y0), (1, y1), ...`; returns `(slope, intercept)`.
///
/// A single sample yields a flat line through that sample.
pub fn linear_fit(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, values[0]);
    }

    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    (slope, y_mean - slope * x_mean)
}

/// Pearson correlation; 0.0 when either side has no variance or lengths differ.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    if va == 0.0 || vb == 0.0 {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Linearly interpolated quantile of `values` at `q` in `[0, 1]`.
///
/// Matches the numpy `percentile` convention: the sorted samples sit at
/// fractional positions `0 ..= n-1` and the result interpolates between the
/// two neighbours of `q * (n - 1)`. Empty input yields 0.0.
pub fn interpolated_quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Numerically stable `ln(sum(exp(x)))` over a slice of log-domain values.
pub fn log_sum_exp(log_values: &[f64]) -> f64 {
    let max = log_values
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = log_values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

#[cfg(test)]
mod tests {
    use super::{interpolated_quantile, linear_fit, log_sum_exp, mean, pearson, population_std};

    const TOL: f64 = 1e-12;

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_and_std_of_constant_series() {
        let values = [4.0; 8];
        assert!((mean(&values) - 4.0).abs() < TOL);
        assert_eq!(population_std(&values), 0.0);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.5).collect();
        let (slope, intercept) = linear_fit(&values);
        assert!((slope - 3.0).abs() < 1e-9);
        assert!((intercept - 1.5).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_handles_degenerate_inputs() {
        assert_eq!(linear_fit(&[]), (0.0, 0.0));
        assert_eq!(linear_fit(&[7.0]), (0.0, 7.0));
    }

    #[test]
    fn pearson_of_identical_series_is_one() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&values, &values) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_of_anti_correlated_series_is_minus_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_without_variance_is_zero() {
        let flat = [2.0, 2.0, 2.0];
        let ramp = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&flat, &ramp), 0.0);
    }

    #[test]
    fn quantile_interpolates_between_samples() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // position = 0.9 * 3 = 2.7 -> 3.0 * 0.3 + 4.0 * 0.7
        assert!((interpolated_quantile(&values, 0.9) - 3.7).abs() < TOL);
        assert_eq!(interpolated_quantile(&values, 0.0), 1.0);
        assert_eq!(interpolated_quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn quantile_of_singleton_is_that_value() {
        assert_eq!(interpolated_quantile(&[5.0], 0.5), 5.0);
    }

    #[test]
    fn log_sum_exp_matches_direct_computation() {
        let values: [f64; 3] = [-1.0, -2.0, -3.0];
        let direct: f64 = values.iter().map(|v| v.exp()).sum::<f64>().ln();
        assert!((log_sum_exp(&values) - direct).abs() < 1e-12);
    }

    #[test]
    fn log_sum_exp_of_all_neg_infinity_stays_neg_infinity() {
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY; 3]), f64::NEG_INFINITY);
    }
}
