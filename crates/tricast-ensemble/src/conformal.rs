// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Conformal-interval wrapper.
//!
//! Wraps a base method's point prediction with a symmetric per-digit
//! interval derived from an empirical error distribution: for each of the
//! last W draws, a naive short-moving-average reference prediction is
//! scored against the true outcome, and the `(1 - alpha)`-quantile of
//! those error samples is spread evenly across the three digit positions.
//! The identical-margin-per-digit simplification is intentional (see
//! DESIGN.md). When no error sample exists the interval collapses to the
//! point prediction and is flagged degenerate rather than reported as a
//! valid guarantee.

use tricast_core::{
    interpolated_quantile, DrawSequence, MethodPrediction, PredictionInterval, CHANNELS,
};

/// Rolling-error window (draws).
const ERROR_WINDOW: usize = 10;
/// Draws feeding each naive reference prediction.
const REFERENCE_WINDOW: usize = 5;

/// Per-draw error sample: summed absolute per-digit deviation between the
/// short-moving-average reference and the true outcome.
fn error_samples(draws: &DrawSequence) -> Vec<f64> {
    let n = draws.len();
    let window = ERROR_WINDOW.min(n.saturating_sub(1));
    let records = draws.records();

    let mut samples = Vec::with_capacity(window);
    for i in n - window..n {
        if i == 0 {
            continue;
        }
        let start = i.saturating_sub(REFERENCE_WINDOW);
        let mut error = 0.0;
        for channel in CHANNELS {
            let mean: f64 = records[start..i]
                .iter()
                .map(|r| f64::from(r.digit(channel)))
                .sum::<f64>()
                / (i - start) as f64;
            let reference = mean.round();
            error += (f64::from(records[i].digit(channel)) - reference).abs();
        }
        samples.push(error);
    }
    samples
}

/// Builds the conformal interval around `base` at `target_coverage`.
pub fn conformal_interval(
    base: &MethodPrediction,
    draws: &DrawSequence,
    target_coverage: f64,
) -> PredictionInterval {
    let samples = error_samples(draws);
    let point = base.set_prediction.clone();

    if samples.is_empty() {
        return PredictionInterval {
            lower: point.clone(),
            upper: point.clone(),
            point,
            coverage: target_coverage,
            margin: 0,
            degenerate: true,
            base_method: base.method.clone(),
        };
    }

    let quantile = interpolated_quantile(&samples, target_coverage);
    let margin = (quantile / 3.0).ceil() as u8;

    let digits: Vec<u8> = point.bytes().map(|b| b - b'0').collect();
    let lower: String = digits
        .iter()
        .map(|d| char::from(b'0' + d.saturating_sub(margin)))
        .collect();
    let upper: String = digits
        .iter()
        .map(|d| char::from(b'0' + (d + margin).min(9)))
        .collect();

    PredictionInterval {
        point,
        lower,
        upper,
        coverage: target_coverage,
        margin,
        degenerate: false,
        base_method: base.method.clone(),
    }
}
