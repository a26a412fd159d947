// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Bayesian blend of long-run and short-run digit frequencies.

use crate::support::argmax_digit;
use tricast_core::{
    Channel, DrawSequence, MethodFamily, MethodPrediction, Predictor, TricastError, CHANNELS,
};

const METHOD: &str = "bayesian";
const CONFIDENCE: f64 = 0.68;
/// Observations feeding the short-run likelihood.
const LIKELIHOOD_WINDOW: usize = 20;
/// Posterior mix: 0.3 * prior + 0.7 * likelihood.
const PRIOR_WEIGHT: f64 = 0.3;
const LIKELIHOOD_WEIGHT: f64 = 0.7;
/// Smoothing mass assigned to digits unseen in the full history / window.
const PRIOR_FILL: f64 = 0.1;
const LIKELIHOOD_FILL: f64 = 0.05;

/// Relative digit frequencies with a fill value for unseen digits.
fn frequencies(values: &[f64], fill: f64) -> [f64; 10] {
    let mut counts = [0.0f64; 10];
    for value in values {
        let digit = *value as usize;
        if digit < 10 {
            counts[digit] += 1.0;
        }
    }
    let total: f64 = counts.iter().sum();
    let mut out = [fill; 10];
    if total > 0.0 {
        for (digit, count) in counts.iter().enumerate() {
            if *count > 0.0 {
                out[digit] = count / total;
            }
        }
    }
    out
}

/// Posterior-argmax predictor: long-run prior, last-20 likelihood.
#[derive(Clone, Copy, Debug, Default)]
pub struct BayesianPredictor;

impl BayesianPredictor {
    pub fn new() -> Self {
        Self
    }

    fn posterior(draws: &DrawSequence, channel: Channel) -> [f64; 10] {
        let prior = frequencies(&draws.channel(channel), PRIOR_FILL);
        let likelihood = frequencies(
            &draws.channel_tail(channel, LIKELIHOOD_WINDOW),
            LIKELIHOOD_FILL,
        );
        let mut posterior = [0.0f64; 10];
        for digit in 0..10 {
            posterior[digit] =
                PRIOR_WEIGHT * prior[digit] + LIKELIHOOD_WEIGHT * likelihood[digit];
        }
        posterior
    }
}

impl Predictor for BayesianPredictor {
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

        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            digits[slot] = argmax_digit(&Self::posterior(draws, *channel));
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "argmax of the posterior blending long-run prior and last-20 likelihood",
        )
        .map(Some)
    }
}
