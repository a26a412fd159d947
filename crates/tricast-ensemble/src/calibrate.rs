// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Dynamic confidence calibration.
//!
//! Starting from a method's static base confidence, the calibrator adds a
//! prediction-diversity boost from the persisted history log, a boost for
//! candidates ranking high among all-time frequent outcomes, and a small
//! bonus when the candidate agrees with the short-term trend direction of
//! the hundred channel. The result is clamped to [0, 0.95] and is a pure
//! function of the sequence, the history log and the config tables.

use crate::analysis::{trend_window, SHORT_WINDOW};
use crate::history::PredictionHistory;
use tricast_core::{
    Channel, DrawSequence, EnsembleConfig, FrequencyTables, CONFIDENCE_CEILING,
};

/// Scale of the prediction-diversity boost.
const DIVERSITY_FACTOR: f64 = 0.05;
/// Frequency table depth consulted for the rank boost.
const FREQUENCY_TOP_N: usize = 20;
/// Ranks eligible for the boost; rank 1 earns the largest step.
const RANK_CUTOFF: usize = 10;
const RANK_STEP: f64 = 0.01;
/// Bonus for moving with the short-term trend.
const TREND_BONUS: f64 = 0.02;

/// Precomputed calibration context for one forecasting pass.
pub struct Calibrator<'a> {
    config: &'a EnsembleConfig,
    history: Option<&'a PredictionHistory>,
    tables: FrequencyTables,
    short_trend_slope: Option<f64>,
    last_hundred: Option<u8>,
}

impl<'a> Calibrator<'a> {
    pub fn new(
        config: &'a EnsembleConfig,
        draws: &DrawSequence,
        history: Option<&'a PredictionHistory>,
    ) -> Self {
        let hundred = draws.channel(Channel::Hundred);
        Self {
            config,
            history,
            tables: FrequencyTables::compute(draws, FREQUENCY_TOP_N),
            short_trend_slope: trend_window(&hundred, SHORT_WINDOW).map(|t| t.slope),
            last_hundred: draws.last().map(|r| r.hundred()),
        }
    }

    /// Calibrated confidence for `method` proposing `candidate`.
    pub fn calibrate(&self, method: &str, candidate: &str) -> f64 {
        let mut confidence = self.config.base_confidence_for(method);

        if let Some(history) = self.history {
            if let Some(fraction) =
                history.distinct_fraction(method, self.config.history_window)
            {
                confidence += fraction * DIVERSITY_FACTOR;
            }
        }

        if let Some(rank) = self.tables.set_rank(candidate) {
            if rank <= RANK_CUTOFF {
                let boost = (RANK_CUTOFF + 1 - rank) as f64 * RANK_STEP;
                confidence = (confidence + boost).min(CONFIDENCE_CEILING);
            }
        }

        if let (Some(slope), Some(last), Some(predicted)) = (
            self.short_trend_slope,
            self.last_hundred,
            candidate_hundred(candidate),
        ) {
            let rising = slope > 0.0 && predicted > last;
            let falling = slope < 0.0 && predicted < last;
            if rising || falling {
                confidence += TREND_BONUS;
            }
        }

        confidence.clamp(0.0, CONFIDENCE_CEILING)
    }
}

/// Hundred's digit of a well-formed 3-digit candidate.
fn candidate_hundred(candidate: &str) -> Option<u8> {
    if candidate.len() != 3 || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(candidate.as_bytes()[0] - b'0')
}
