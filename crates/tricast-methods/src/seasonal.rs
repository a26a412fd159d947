// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Calendar-periodicity predictor.
//!
//! Conditions digit frequencies on weekday, month and quarter
//! independently, then blends the three conditional distributions for the
//! latest draw's calendar position.

use crate::support::argmax_digit;
use chrono::Datelike;
use tricast_core::{
    Channel, DrawRecord, DrawSequence, MethodFamily, MethodPrediction, Predictor, TricastError,
    CHANNELS,
};

const METHOD: &str = "seasonal";
const CONFIDENCE: f64 = 0.72;
const WEEKDAY_WEIGHT: f64 = 0.4;
const MONTH_WEIGHT: f64 = 0.3;
const QUARTER_WEIGHT: f64 = 0.3;
/// Flat probability for digits with no observation in any component.
const FLAT_FALLBACK: f64 = 0.1;

fn weekday_index(record: &DrawRecord) -> u32 {
    record.date.weekday().num_days_from_monday()
}

fn quarter_index(record: &DrawRecord) -> u32 {
    (record.date.month() - 1) / 3 + 1
}

/// Digit frequencies over the records selected by `matches`; `None` when no
/// record matches.
fn conditional_frequencies(
    draws: &DrawSequence,
    channel: Channel,
    matches: impl Fn(&DrawRecord) -> bool,
) -> Option<[f64; 10]> {
    let mut counts = [0.0f64; 10];
    let mut total = 0.0;
    for record in draws.records().iter().filter(|r| matches(r)) {
        counts[record.digit(channel) as usize] += 1.0;
        total += 1.0;
    }
    if total == 0.0 {
        return None;
    }
    for count in counts.iter_mut() {
        *count /= total;
    }
    Some(counts)
}

/// Weekday/month/quarter conditional-blend predictor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeasonalPredictor;

impl SeasonalPredictor {
    pub fn new() -> Self {
        Self
    }

    fn blended(draws: &DrawSequence, channel: Channel, last: &DrawRecord) -> [f64; 10] {
        let weekday = weekday_index(last);
        let month = last.date.month();
        let quarter = quarter_index(last);

        let components = [
            (
                conditional_frequencies(draws, channel, |r| weekday_index(r) == weekday),
                WEEKDAY_WEIGHT,
            ),
            (
                conditional_frequencies(draws, channel, |r| r.date.month() == month),
                MONTH_WEIGHT,
            ),
            (
                conditional_frequencies(draws, channel, |r| quarter_index(r) == quarter),
                QUARTER_WEIGHT,
            ),
        ];

        let mut blended = [0.0f64; 10];
        for (digit, slot) in blended.iter_mut().enumerate() {
            let mut acc = 0.0;
            let mut weight_sum = 0.0;
            for (component, weight) in &components {
                if let Some(freq) = component {
                    // A digit contributes only where it was actually
                    // observed under that calendar condition.
                    if freq[digit] > 0.0 {
                        acc += freq[digit] * weight;
                        weight_sum += weight;
                    }
                }
            }
            *slot = if weight_sum > 0.0 {
                acc / weight_sum
            } else {
                FLAT_FALLBACK
            };
        }
        blended
    }
}

impl Predictor for SeasonalPredictor {
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
        let Some(last) = draws.last().copied() else {
            return Ok(None);
        };

        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            digits[slot] = argmax_digit(&Self::blended(draws, *channel, &last));
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "weighted blend of weekday, month and quarter conditional digit frequencies",
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::{quarter_index, weekday_index, Predictor, SeasonalPredictor};
    use crate::support::testutil::{sequence, varied_sequence};
    use chrono::NaiveDate;
    use tricast_core::{Channel, DrawRecord, DrawSequence};

    #[test]
    fn calendar_indices_decompose_as_expected() {
        // 2020-01-01 was a Wednesday.
        let record = DrawRecord::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
            123,
        )
        .expect("valid record");
        assert_eq!(weekday_index(&record), 2);
        assert_eq!(quarter_index(&record), 1);

        let autumn = DrawRecord::new(
            NaiveDate::from_ymd_opt(2020, 11, 30).expect("valid date"),
            123,
        )
        .expect("valid record");
        assert_eq!(quarter_index(&autumn), 4);
    }

    #[test]
    fn constant_channel_is_predicted_verbatim() {
        // Every draw starts with 7, under every calendar condition.
        let seq = sequence(&[701, 712, 723, 734, 745, 756, 767, 778]);
        let prediction = SeasonalPredictor::new()
            .predict(&seq)
            .expect("predict should succeed")
            .expect("prediction present");
        assert_eq!(prediction.set_prediction.as_bytes()[0], b'7');
    }

    #[test]
    fn weekly_pattern_dominates_the_blend() {
        // 15 draws, one per day: the same weekday recurs at steps 0, 7 and
        // 14, and on that weekday the one's digit is always 4; elsewhere it
        // varies. The last draw (step 14) shares the weekday, so the blend
        // must put 4 on top.
        let numbers: Vec<u16> = (0..15u16)
            .map(|i| if i % 7 == 0 { 4 } else { (i % 9) + 10 })
            .collect();
        let prediction = SeasonalPredictor::new()
            .predict(&sequence(&numbers))
            .expect("predict should succeed")
            .expect("prediction present");
        assert_eq!(prediction.set_prediction.as_bytes()[2], b'4');
    }

    #[test]
    fn blend_falls_back_flat_for_unseen_digits() {
        let seq = varied_sequence();
        let last = *seq.last().expect("non-empty");
        let blended = SeasonalPredictor::blended(&seq, Channel::Hundred, &last);
        assert!(blended.iter().all(|p| *p > 0.0));
    }

    #[test]
    fn empty_sequence_is_absent() {
        assert!(SeasonalPredictor::new()
            .predict(&DrawSequence::new())
            .expect("predict should succeed")
            .is_none());
    }
}
