// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Informational statistics carried in every forecast report: trend
//! windows, channel correlations, frequency tables and occurrence-gap
//! summaries. The calibrator reuses the short-window trend slope; nothing
//! else here feeds back into the forecasting contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tricast_core::{
    linear_fit, mean, pearson, population_std, Channel, DrawSequence, FrequencyTables, CHANNELS,
};

/// Trend window sizes (draws).
pub const SHORT_WINDOW: usize = 10;
pub const MID_WINDOW: usize = 50;
pub const LONG_WINDOW: usize = 200;
/// Autocorrelation lags reported per channel.
const CORRELATION_LAGS: [usize; 5] = [1, 2, 3, 5, 10];
/// Depth of the report's frequency tables.
const PATTERN_TOP_N: usize = 10;

/// Mean, linear slope and volatility of one trailing window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub mean: f64,
    pub slope: f64,
    pub volatility: f64,
}

/// Short/mid/long trend windows of one digit channel; windows longer than
/// the history are omitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelTrends {
    pub short: Option<TrendWindow>,
    pub mid: Option<TrendWindow>,
    pub long: Option<TrendWindow>,
}

/// Occurrence-gap summary of one digit within one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GapStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: usize,
    pub max: usize,
    pub count: usize,
}

/// Gap summaries of all ten digits within one channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelGaps {
    pub digits: Vec<GapStats>,
}

/// The full informational block of a forecast report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub trends: BTreeMap<String, ChannelTrends>,
    pub correlations: BTreeMap<String, f64>,
    pub frequent_patterns: FrequencyTables,
    pub gaps: BTreeMap<String, ChannelGaps>,
}

/// Trend window over the trailing `window` samples, if available.
pub fn trend_window(values: &[f64], window: usize) -> Option<TrendWindow> {
    if values.len() < window {
        return None;
    }
    let tail = &values[values.len() - window..];
    let (slope, _) = linear_fit(tail);
    Some(TrendWindow {
        mean: mean(tail),
        slope,
        volatility: population_std(tail),
    })
}

fn channel_trends(values: &[f64]) -> ChannelTrends {
    ChannelTrends {
        short: trend_window(values, SHORT_WINDOW),
        mid: trend_window(values, MID_WINDOW),
        long: trend_window(values, LONG_WINDOW),
    }
}

fn lagged_correlation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return 0.0;
    }
    pearson(&values[lag..], &values[..values.len() - lag])
}

fn correlations(draws: &DrawSequence) -> BTreeMap<String, f64> {
    let hundred = draws.channel(Channel::Hundred);
    let ten = draws.channel(Channel::Ten);
    let one = draws.channel(Channel::One);
    let sums = draws.sums();

    let mut out = BTreeMap::new();
    out.insert("hundred_ten".to_string(), pearson(&hundred, &ten));
    out.insert("ten_one".to_string(), pearson(&ten, &one));
    out.insert("hundred_one".to_string(), pearson(&hundred, &one));

    for (label, values) in [("hundred", &hundred), ("ten", &ten), ("one", &one)] {
        for lag in CORRELATION_LAGS {
            out.insert(
                format!("{label}_lag{lag}"),
                lagged_correlation(values, lag),
            );
        }
        out.insert(format!("{label}_sum"), pearson(values, &sums));
    }
    out
}

fn channel_gaps(draws: &DrawSequence, channel: Channel) -> ChannelGaps {
    let values = draws.channel(channel);
    let mut digits = Vec::with_capacity(10);
    for digit in 0..10u8 {
        let positions: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == f64::from(digit))
            .map(|(i, _)| i)
            .collect();
        let gaps: Vec<f64> = positions
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect();
        if gaps.is_empty() {
            digits.push(GapStats::default());
            continue;
        }
        let mut sorted = gaps.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };
        digits.push(GapStats {
            mean: mean(&gaps),
            median,
            std: population_std(&gaps),
            min: sorted[0] as usize,
            max: sorted[sorted.len() - 1] as usize,
            count: gaps.len(),
        });
    }
    ChannelGaps { digits }
}

impl AnalysisReport {
    /// Computes the full informational block for one sequence.
    pub fn compute(draws: &DrawSequence) -> Self {
        let mut trends = BTreeMap::new();
        let mut gaps = BTreeMap::new();
        for channel in CHANNELS {
            let values = draws.channel(channel);
            trends.insert(channel.label().to_string(), channel_trends(&values));
            gaps.insert(channel.label().to_string(), channel_gaps(draws, channel));
        }
        Self {
            trends,
            correlations: correlations(draws),
            frequent_patterns: FrequencyTables::compute(draws, PATTERN_TOP_N),
            gaps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{trend_window, AnalysisReport, SHORT_WINDOW};
    use chrono::NaiveDate;
    use tricast_core::{DrawRecord, DrawSequence};

    fn sequence(numbers: &[u16]) -> DrawSequence {
        let start = NaiveDate::from_ymd_opt(2021, 3, 1).expect("valid start");
        let records = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let date = start
                    .checked_add_days(chrono::Days::new(i as u64))
                    .expect("valid offset");
                DrawRecord::new(date, *n).expect("valid record")
            })
            .collect();
        DrawSequence::from_records(records).expect("valid sequence")
    }

    #[test]
    fn trend_window_requires_enough_samples() {
        let values: Vec<f64> = (0..5).map(f64::from).collect();
        assert!(trend_window(&values, SHORT_WINDOW).is_none());
    }

    #[test]
    fn rising_tail_has_positive_slope() {
        let values: Vec<f64> = (0..20).map(|i| f64::from(i % 10)).collect();
        let trend = trend_window(&values, 5).expect("window available");
        assert!(trend.slope > 0.0);
    }

    #[test]
    fn report_omits_windows_longer_than_history() {
        let numbers: Vec<u16> = (0..30).map(|i| (i * 31) % 1000).collect();
        let report = AnalysisReport::compute(&sequence(&numbers));
        let hundred = &report.trends["hundred"];
        assert!(hundred.short.is_some());
        assert!(hundred.mid.is_none());
        assert!(hundred.long.is_none());
    }

    #[test]
    fn correlations_cover_pairs_lags_and_sums() {
        let numbers: Vec<u16> = (0..40).map(|i| (i * 173) % 1000).collect();
        let report = AnalysisReport::compute(&sequence(&numbers));
        assert!(report.correlations.contains_key("hundred_ten"));
        assert!(report.correlations.contains_key("one_lag10"));
        assert!(report.correlations.contains_key("ten_sum"));
        for value in report.correlations.values() {
            assert!((-1.0..=1.0).contains(value) || *value == 0.0);
        }
    }

    #[test]
    fn gap_stats_count_recurrences() {
        // Digit 5 occupies the one's place at indices 0, 2 and 4.
        let report = AnalysisReport::compute(&sequence(&[5, 11, 25, 33, 45]));
        let one_gaps = &report.gaps["one"];
        let five = one_gaps.digits[5];
        assert_eq!(five.count, 2);
        assert_eq!(five.min, 2);
        assert_eq!(five.max, 2);
        assert!((five.mean - 2.0).abs() < 1e-12);
        // A digit that never appears twice has no gaps.
        assert_eq!(one_gaps.digits[9].count, 0);
    }

    #[test]
    fn analysis_report_serde_roundtrip() {
        let numbers: Vec<u16> = (0..25).map(|i| (i * 59) % 1000).collect();
        let report = AnalysisReport::compute(&sequence(&numbers));
        let encoded = serde_json::to_string(&report).expect("serialize analysis");
        let decoded: AnalysisReport =
            serde_json::from_str(&encoded).expect("deserialize analysis");
        assert_eq!(decoded, report);
    }
}
