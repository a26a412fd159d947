// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! First-order Markov-chain predictor.

use crate::support::argmax_digit;
use tricast_core::{
    Channel, DrawSequence, MethodFamily, MethodPrediction, Predictor, TricastError, CHANNELS,
};

const METHOD: &str = "markov";
const CONFIDENCE: f64 = 0.70;

/// Predicts the most probable successor of the last observed digit from a
/// per-channel 10x10 transition matrix built over consecutive pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkovPredictor;

impl MarkovPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Row-normalized transition matrix for one channel. Rows with zero
    /// mass default to uniform.
    fn transition_matrix(draws: &DrawSequence, channel: Channel) -> [[f64; 10]; 10] {
        let mut counts = [[0.0f64; 10]; 10];
        let records = draws.records();
        for pair in records.windows(2) {
            let from = pair[0].digit(channel) as usize;
            let to = pair[1].digit(channel) as usize;
            counts[from][to] += 1.0;
        }

        for row in counts.iter_mut() {
            let mass: f64 = row.iter().sum();
            if mass == 0.0 {
                *row = [0.1; 10];
            } else {
                for cell in row.iter_mut() {
                    *cell /= mass;
                }
            }
        }
        counts
    }
}

impl Predictor for MarkovPredictor {
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
        let Some(last) = draws.last() else {
            return Ok(None);
        };

        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            let matrix = Self::transition_matrix(draws, *channel);
            let row = &matrix[last.digit(*channel) as usize];
            digits[slot] = argmax_digit(row);
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "most probable successor of the last digit under the per-channel transition matrix",
        )
        .map(Some)
    }
}
