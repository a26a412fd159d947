// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Frequent-pattern predictor.
//!
//! Biases the one's and hundred's digits toward the most frequent
//! historical combinations when the last draw's digit pairs are themselves
//! frequent. The ten's digit is carried over unchanged from the last draw;
//! that is a placeholder policy kept deliberately (see DESIGN.md), not a
//! learned signal.

use tricast_core::{
    DrawSequence, FrequencyTables, MethodFamily, MethodPrediction, Predictor, TricastError,
};

const METHOD: &str = "pattern";
const CONFIDENCE: f64 = 0.68;
/// Pattern tables are consulted at this depth.
const TOP_N: usize = 10;

#[derive(Clone, Copy, Debug, Default)]
pub struct PatternPredictor;

impl PatternPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for PatternPredictor {
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
        let tables = FrequencyTables::compute(draws, TOP_N);

        // If the leading pair of the last draw is frequent, pull the one's
        // digit from the most frequent trailing pair; otherwise carry it.
        let lead_pair = format!("{}{}", last.hundred(), last.ten());
        let one = if tables.contains_lead_pair(&lead_pair) {
            tables
                .mini_top
                .first()
                .and_then(|(combo, _)| combo.as_bytes().get(1).copied())
                .map(|byte| byte - b'0')
                .unwrap_or_else(|| last.one())
        } else {
            last.one()
        };

        // Symmetrically, a frequent trailing pair pulls the hundred's digit
        // from the most frequent full combination.
        let trail_pair = last.as_mini_string();
        let hundred = if tables.contains_mini(&trail_pair) {
            tables
                .set_top
                .first()
                .and_then(|(combo, _)| combo.as_bytes().first().copied())
                .map(|byte| byte - b'0')
                .unwrap_or_else(|| last.hundred())
        } else {
            last.hundred()
        };

        MethodPrediction::from_digits(
            METHOD,
            hundred,
            last.ten(), // carried over unchanged; known weak link
            one,
            CONFIDENCE,
            "frequent 3-digit and 2-digit combinations bias the outer digits",
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::{PatternPredictor, Predictor};
    use crate::support::testutil::sequence;
    use tricast_core::DrawSequence;

    #[test]
    fn tens_digit_is_always_carried_over() {
        let seq = sequence(&[123, 456, 789, 153]);
        let prediction = PatternPredictor::new()
            .predict(&seq)
            .expect("predict should succeed")
            .expect("prediction present");
        assert_eq!(prediction.set_prediction.as_bytes()[1], b'5');
    }

    #[test]
    fn frequent_pairs_pull_digits_from_the_top_combinations() {
        // "777" dominates, so its pairs are all frequent; the last draw
        // "778" shares the leading pair (77) and the trailing pair (78)
        // appears once, inside the top-10 of a short table. Both outer
        // digits therefore come from the top combinations.
        let seq = sequence(&[777, 777, 777, 777, 778]);
        let prediction = PatternPredictor::new()
            .predict(&seq)
            .expect("predict should succeed")
            .expect("prediction present");
        // one's digit <- second char of the most frequent mini ("77");
        // hundred's digit <- first char of the most frequent set ("777").
        assert_eq!(prediction.set_prediction, "777");
    }

    #[test]
    fn infrequent_pairs_carry_the_last_draw() {
        // Twelve distinct pairs, all count 1: the top-10 tables keep the
        // ten earliest, so the last draw's pairs (94, 42) fall outside and
        // both outer digits take the carry path.
        let seq = sequence(&[
            100, 211, 322, 433, 544, 655, 766, 877, 988, 199, 310, 942,
        ]);
        let prediction = PatternPredictor::new()
            .predict(&seq)
            .expect("predict should succeed")
            .expect("prediction present");
        assert_eq!(prediction.set_prediction, "942");
    }

    #[test]
    fn empty_sequence_is_absent() {
        assert!(PatternPredictor::new()
            .predict(&DrawSequence::new())
            .expect("predict should succeed")
            .is_none());
    }
}
