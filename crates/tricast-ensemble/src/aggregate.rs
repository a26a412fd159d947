// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Confidence-weighted vote aggregation.
//!
//! Every available method contributes `confidence * class_weight` to the
//! candidate it predicts, in two independent tallies (3-digit and 2-digit
//! projections). Tallies rank descending by accumulated score with ties
//! kept in first-seen order, and the top-5 scores are normalized by the sum
//! of contributing class weights. This is the single ranking policy for
//! both projections.

use tricast_core::{EnsembleConfig, MethodPrediction, RankedCandidate, TricastError, TOP_K};

/// Ranked top-K lists for both projections.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub set_predictions: Vec<RankedCandidate>,
    pub mini_predictions: Vec<RankedCandidate>,
}

/// Insertion-ordered tally; linear scan is fine at ensemble scale.
#[derive(Default)]
struct VoteTally {
    votes: Vec<(String, f64)>,
}

impl VoteTally {
    fn add(&mut self, candidate: &str, score: f64) {
        match self.votes.iter_mut().find(|(number, _)| number == candidate) {
            Some((_, accumulated)) => *accumulated += score,
            None => self.votes.push((candidate.to_string(), score)),
        }
    }

    /// Top-K candidates, score-descending, first-seen order on ties.
    fn ranked(mut self, total_weight: f64) -> Vec<RankedCandidate> {
        // Stable sort preserves insertion order among equal scores.
        self.votes
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.votes
            .into_iter()
            .take(TOP_K)
            .enumerate()
            .map(|(index, (number, score))| RankedCandidate {
                rank: index + 1,
                number,
                confidence: round3(score / total_weight),
            })
            .collect()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Aggregates method predictions into ranked top-5 lists.
///
/// The aggregator must function with any non-empty subset of methods;
/// an empty input is the one fatal condition.
pub fn aggregate(
    predictions: &[MethodPrediction],
    config: &EnsembleConfig,
) -> Result<Aggregation, TricastError> {
    if predictions.is_empty() {
        return Err(TricastError::NoCandidates);
    }

    let mut set_tally = VoteTally::default();
    let mut mini_tally = VoteTally::default();
    let mut total_weight = 0.0;

    for prediction in predictions {
        let weight = config.class_weight_for(&prediction.method);
        let score = prediction.confidence * weight;
        set_tally.add(&prediction.set_prediction, score);
        mini_tally.add(&prediction.mini_prediction, score);
        total_weight += weight;
    }

    Ok(Aggregation {
        set_predictions: set_tally.ranked(total_weight),
        mini_predictions: mini_tally.ranked(total_weight),
    })
}
