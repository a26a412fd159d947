// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Filter-based predictor: a (value, velocity) linear state-space filter
//! per digit channel, updated sequentially over the whole history.

use crate::support::{clip_round_digit, repeat_last_fallback};
use tricast_core::{
    DrawSequence, MethodFamily, MethodPrediction, Predictor, TricastError, CHANNELS,
};

const METHOD: &str = "kalman";
const CONFIDENCE: f64 = 0.72;
const MIN_POINTS: usize = 10;
/// Initial state covariance (uninformative).
const INITIAL_VARIANCE: f64 = 1000.0;
/// Observation-noise variance.
const MEASUREMENT_NOISE: f64 = 5.0;

/// Constant-velocity filter state:
/// `x = [value, velocity]`, `F = [[1, 1], [0, 1]]`, `H = [1, 0]`,
/// process noise `Q = I`.
struct VelocityFilter {
    x: [f64; 2],
    // Covariance matrix [[p00, p01], [p10, p11]].
    p: [[f64; 2]; 2],
}

impl VelocityFilter {
    fn new(first_value: f64) -> Self {
        Self {
            x: [first_value, 0.0],
            p: [[INITIAL_VARIANCE, 0.0], [0.0, INITIAL_VARIANCE]],
        }
    }

    /// Time update: `x <- F x`, `P <- F P F^T + Q`.
    fn predict(&mut self) {
        self.x = [self.x[0] + self.x[1], self.x[1]];
        let [[p00, p01], [p10, p11]] = self.p;
        self.p = [
            [p00 + p10 + p01 + p11 + 1.0, p01 + p11],
            [p10 + p11, p11 + 1.0],
        ];
    }

    /// Measurement update against observation `z`.
    fn update(&mut self, z: f64) {
        let [[p00, p01], [p10, p11]] = self.p;
        let innovation = z - self.x[0];
        let s = p00 + MEASUREMENT_NOISE;
        let k0 = p00 / s;
        let k1 = p10 / s;
        self.x = [self.x[0] + k0 * innovation, self.x[1] + k1 * innovation];
        self.p = [
            [(1.0 - k0) * p00, (1.0 - k0) * p01],
            [p10 - k1 * p00, p11 - k1 * p01],
        ];
    }
}

/// One-step-ahead value forecast for a channel; `None` when the filter
/// diverges numerically.
fn forecast_channel(values: &[f64]) -> Option<f64> {
    let mut filter = VelocityFilter::new(values[0]);
    for z in &values[1..] {
        filter.predict();
        filter.update(*z);
    }
    filter.predict();
    filter.x[0].is_finite().then_some(filter.x[0])
}

/// Kalman-class predictor over independent digit channels.
#[derive(Clone, Copy, Debug, Default)]
pub struct KalmanPredictor;

impl KalmanPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for KalmanPredictor {
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
        if draws.len() < MIN_POINTS {
            return repeat_last_fallback(METHOD, draws, &format!("need {MIN_POINTS} draws"));
        }

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
            "one-step forecast of a per-channel value/velocity state-space filter",
        )
        .map(Some)
    }
}
