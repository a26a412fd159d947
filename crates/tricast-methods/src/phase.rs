// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Phase-inversion predictor.
//!
//! Treats each digit channel as samples of `floor(5*sin(0.5*t + phi) + 5)
//! mod 10` and recovers, per historical index, the phase that best
//! reproduces the observed digit. A linear trend over the recovered phase
//! sequence is extrapolated one step to predict the next digit.

use tricast_core::{
    linear_fit, Channel, DrawSequence, MethodFamily, MethodPrediction, Predictor, StableRng,
    TricastError, CHANNELS,
};

const METHOD: &str = "chaos";
const CONFIDENCE: f64 = 0.65;
/// Upper bound of the phase search interval.
const PHASE_UPPER: f64 = 6.28;
/// Golden-section iterations; the objective is cheap, so convergence is
/// driven to well below the digit-quantization scale.
const SEARCH_ITERS: usize = 60;
const GOLDEN_RATIO: f64 = 0.618_033_988_749_894_9;

/// Digit generated by the assumed oscillator at time `t` with phase `phi`.
fn oscillator_digit(t: f64, phi: f64) -> u8 {
    let raw = (5.0 * (0.5 * t + phi).sin() + 5.0).floor() as i64;
    raw.rem_euclid(10) as u8
}

/// Bounded golden-section minimization of the phase-reconstruction error.
///
/// The objective is piecewise constant, so this finds a representative
/// minimizer rather than a unique one; determinism is what matters here.
fn invert_phase(t: f64, target: u8) -> f64 {
    let error = |phi: f64| {
        let predicted = oscillator_digit(t, phi);
        f64::from(target.abs_diff(predicted))
    };

    let mut lo = 0.0;
    let mut hi = PHASE_UPPER;
    let mut mid_lo = hi - GOLDEN_RATIO * (hi - lo);
    let mut mid_hi = lo + GOLDEN_RATIO * (hi - lo);
    let mut err_lo = error(mid_lo);
    let mut err_hi = error(mid_hi);

    for _ in 0..SEARCH_ITERS {
        if err_lo <= err_hi {
            hi = mid_hi;
            mid_hi = mid_lo;
            err_hi = err_lo;
            mid_lo = hi - GOLDEN_RATIO * (hi - lo);
            err_lo = error(mid_lo);
        } else {
            lo = mid_lo;
            mid_lo = mid_hi;
            err_lo = err_hi;
            mid_hi = lo + GOLDEN_RATIO * (hi - lo);
            err_hi = error(mid_hi);
        }
    }
    (lo + hi) / 2.0
}

/// Phase/chaos predictor over the full history.
#[derive(Clone, Debug)]
pub struct PhasePredictor {
    seed: u64,
}

impl PhasePredictor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn recovered_phases(&self, draws: &DrawSequence, channel: Channel) -> Vec<f64> {
        draws
            .records()
            .iter()
            .enumerate()
            .map(|(t, record)| invert_phase(t as f64, record.digit(channel)))
            .collect()
    }
}

impl Predictor for PhasePredictor {
    fn id(&self) -> &'static str {
        METHOD
    }

    fn family(&self) -> MethodFamily {
        MethodFamily::Heuristic
    }

    fn predict(
        &self,
        draws: &DrawSequence,
    ) -> Result<Option<MethodPrediction>, TricastError> {
        if draws.is_empty() {
            return Ok(None);
        }

        let next_t = draws.len() as f64;
        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            let phases = self.recovered_phases(draws, *channel);
            if phases.len() < 2 {
                // Not enough phase samples for a trend; degrade to a
                // seeded uniform digit (the documented fallback exception).
                let mut rng = StableRng::new(self.seed).fork(channel.label());
                digits[slot] = rng.digit();
                continue;
            }
            let (slope, intercept) = linear_fit(&phases);
            let next_phase = slope * phases.len() as f64 + intercept;
            digits[slot] = oscillator_digit(next_t, next_phase);
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "one-step extrapolation of the linear trend over recovered oscillator phases",
        )
        .map(Some)
    }
}
