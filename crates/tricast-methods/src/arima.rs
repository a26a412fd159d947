// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Fixed-order ARIMA(2,1,2) predictor.
//!
//! Each digit channel is differenced once and fitted with a two-stage
//! Hannan-Rissanen procedure: a long autoregression supplies residual
//! proxies, then a least-squares pass over AR and MA lags yields the
//! one-step forecast. A channel that cannot be fitted (too little history,
//! singular normal equations, non-finite forecast) falls back to its last
//! observed digit, leaving the other channels untouched.

use crate::linalg::ridge_fit;
use crate::support::clip_round_digit;
use tricast_core::{
    DrawSequence, MethodFamily, MethodPrediction, Predictor, TricastError, CHANNELS,
};

const METHOD: &str = "arima";
const CONFIDENCE: f64 = 0.73;
/// AR and MA order of the fitted model.
const AR_ORDER: usize = 2;
const MA_ORDER: usize = 2;
/// Long-autoregression order for the residual-proxy stage.
const PROXY_ORDER: usize = 5;
/// Minimum channel history before a fit is attempted.
const MIN_POINTS: usize = 30;
/// Tiny penalty keeping the normal equations solvable when lag columns are
/// collinear (constant or perfectly trending channels).
const STABILIZER: f64 = 1e-6;

/// One-step forecast of the differenced series, or `None` on fit failure.
fn forecast_differenced(diffs: &[f64]) -> Option<f64> {
    let m = diffs.len();
    if m <= PROXY_ORDER + MA_ORDER {
        return None;
    }

    // Stage 1: long AR for residual proxies.
    let mut proxy_rows = Vec::with_capacity(m - PROXY_ORDER);
    let mut proxy_targets = Vec::with_capacity(m - PROXY_ORDER);
    for t in PROXY_ORDER..m {
        let mut row = Vec::with_capacity(PROXY_ORDER + 1);
        row.push(1.0);
        for lag in 1..=PROXY_ORDER {
            row.push(diffs[t - lag]);
        }
        proxy_rows.push(row);
        proxy_targets.push(diffs[t]);
    }
    let proxy_beta = ridge_fit(&proxy_rows, &proxy_targets, STABILIZER, true)?;

    let mut residuals = vec![0.0; m];
    for (offset, row) in proxy_rows.iter().enumerate() {
        let t = PROXY_ORDER + offset;
        let fitted: f64 = row.iter().zip(proxy_beta.iter()).map(|(x, b)| x * b).sum();
        residuals[t] = diffs[t] - fitted;
    }

    // Stage 2: regression on AR and MA lags.
    let start = PROXY_ORDER + MA_ORDER.max(AR_ORDER);
    if start >= m {
        return None;
    }
    let mut rows = Vec::with_capacity(m - start);
    let mut targets = Vec::with_capacity(m - start);
    for t in start..m {
        let mut row = Vec::with_capacity(1 + AR_ORDER + MA_ORDER);
        row.push(1.0);
        for lag in 1..=AR_ORDER {
            row.push(diffs[t - lag]);
        }
        for lag in 1..=MA_ORDER {
            row.push(residuals[t - lag]);
        }
        rows.push(row);
        targets.push(diffs[t]);
    }
    let beta = ridge_fit(&rows, &targets, STABILIZER, true)?;

    let mut forecast = beta[0];
    for lag in 1..=AR_ORDER {
        forecast += beta[lag] * diffs[m - lag];
    }
    for lag in 1..=MA_ORDER {
        forecast += beta[AR_ORDER + lag] * residuals[m - lag];
    }
    forecast.is_finite().then_some(forecast)
}

/// One-step channel forecast on the original scale.
fn forecast_channel(values: &[f64]) -> Option<f64> {
    if values.len() < MIN_POINTS {
        return None;
    }
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let step = forecast_differenced(&diffs)?;
    Some(values[values.len() - 1] + step)
}

/// ARIMA-class predictor over independent digit channels.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArimaPredictor;

impl ArimaPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for ArimaPredictor {
    fn id(&self) -> &'static str {
        METHOD
    }

    fn family(&self) -> MethodFamily {
        MethodFamily::StateModel
    }

    fn predict(
        &self,
        draws: &DrawSequence,
    ) -> Result<Option<MethodPrediction>, TricastError> {
        let Some(last) = draws.last().copied() else {
            return Ok(None);
        };

        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            let values = draws.channel(*channel);
            digits[slot] = match forecast_channel(&values) {
                Some(forecast) => clip_round_digit(forecast),
                None => last.digit(*channel),
            };
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "one-step ARIMA(2,1,2) forecast per digit channel",
        )
        .map(Some)
    }
}
