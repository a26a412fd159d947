// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use tricast_core::{DrawSequence, MethodPrediction, TricastError};

/// Confidence attached to every insufficient-history fallback.
pub(crate) const FALLBACK_CONFIDENCE: f64 = 0.60;

/// Degraded fallback shared by the data-hungry methods: repeat the last
/// observed digits verbatim with a fixed low confidence.
pub(crate) fn repeat_last_fallback(
    method: &'static str,
    draws: &DrawSequence,
    detail: &str,
) -> Result<Option<MethodPrediction>, TricastError> {
    let Some(last) = draws.last() else {
        return Ok(None);
    };
    MethodPrediction::from_digits(
        method,
        last.hundred(),
        last.ten(),
        last.one(),
        FALLBACK_CONFIDENCE,
        format!("insufficient history ({detail}); repeating the last draw"),
    )
    .map(Some)
}

/// Clips to the digit range and rounds to the nearest digit.
pub(crate) fn clip_round_digit(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 9.0).round() as u8
}

/// First-max argmax over a digit distribution; ties resolve to the lowest
/// digit value.
pub(crate) fn argmax_digit(weights: &[f64; 10]) -> u8 {
    let mut best = 0usize;
    for (digit, weight) in weights.iter().enumerate().skip(1) {
        if *weight > weights[best] {
            best = digit;
        }
    }
    best as u8
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::NaiveDate;
    use tricast_core::{DrawRecord, DrawSequence};

    /// Builds a daily sequence starting 2020-01-01 from raw numbers.
    pub(crate) fn sequence(numbers: &[u16]) -> DrawSequence {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid start date");
        let records = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let date = start
                    .checked_add_days(chrono::Days::new(i as u64))
                    .expect("valid date offset");
                DrawRecord::new(date, *n).expect("valid test record")
            })
            .collect();
        DrawSequence::from_records(records).expect("valid test sequence")
    }

    /// A mildly irregular 40-draw sequence used across method tests.
    pub(crate) fn varied_sequence() -> DrawSequence {
        let numbers: Vec<u16> = (0..40u16)
            .map(|i| (i * 137 + 41 * (i % 7)) % 1000)
            .collect();
        sequence(&numbers)
    }

    /// A 120-draw sequence, long enough for the windowed regressors to
    /// train instead of falling back.
    pub(crate) fn long_varied_sequence() -> DrawSequence {
        let numbers: Vec<u16> = (0..120u32)
            .map(|i| ((i * 137 + 41 * (i % 7) + (i / 3) * 29) % 1000) as u16)
            .collect();
        sequence(&numbers)
    }
}
