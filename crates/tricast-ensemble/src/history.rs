// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Trailing log of past forecast snapshots.
//!
//! Appended by the persistence layer after each run and consumed read-only
//! by the confidence calibrator, which looks at a bounded trailing window
//! of per-method predictions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tricast_core::MethodPrediction;

/// One persisted forecast snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Raw per-method predictions of that pass.
    pub methods: BTreeMap<String, MethodPrediction>,
}

/// Ordered collection of history entries, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionHistory {
    entries: Vec<HistoryEntry>,
}

impl PredictionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The trailing `window` entries, oldest first.
    pub fn trailing(&self, window: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(window);
        &self.entries[start..]
    }

    /// Fraction of distinct set predictions a method produced over the
    /// trailing `window` entries; `None` when the method never appears.
    ///
    /// A method that keeps emitting the same value scores low; one whose
    /// predictions move with the data scores high.
    pub fn distinct_fraction(&self, method: &str, window: usize) -> Option<f64> {
        let predictions: Vec<&str> = self
            .trailing(window)
            .iter()
            .filter_map(|entry| entry.methods.get(method))
            .map(|prediction| prediction.set_prediction.as_str())
            .collect();
        if predictions.is_empty() {
            return None;
        }
        let mut distinct: Vec<&str> = predictions.clone();
        distinct.sort_unstable();
        distinct.dedup();
        Some(distinct.len() as f64 / predictions.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryEntry, PredictionHistory};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tricast_core::MethodPrediction;

    fn entry(day: u32, method: &str, set: (u8, u8, u8)) -> HistoryEntry {
        let mut methods = BTreeMap::new();
        methods.insert(
            method.to_string(),
            MethodPrediction::from_digits(method, set.0, set.1, set.2, 0.7, "test")
                .expect("valid prediction"),
        );
        HistoryEntry {
            timestamp: Utc
                .with_ymd_and_hms(2024, 5, day, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            methods,
        }
    }

    #[test]
    fn trailing_window_returns_the_most_recent_entries() {
        let mut history = PredictionHistory::new();
        for day in 1..=25 {
            history.push(entry(day, "markov", (1, 2, 3)));
        }
        assert_eq!(history.len(), 25);
        assert_eq!(history.trailing(20).len(), 20);
        assert_eq!(history.trailing(100).len(), 25);
        let first = &history.trailing(20)[0];
        assert_eq!(chrono::Datelike::day(&first.timestamp), 6);
    }

    #[test]
    fn distinct_fraction_rewards_varied_predictions() {
        let mut history = PredictionHistory::new();
        history.push(entry(1, "markov", (1, 2, 3)));
        history.push(entry(2, "markov", (4, 5, 6)));
        history.push(entry(3, "markov", (1, 2, 3)));
        history.push(entry(4, "markov", (7, 8, 9)));
        let fraction = history
            .distinct_fraction("markov", 20)
            .expect("method present");
        assert!((fraction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn distinct_fraction_of_a_repeating_method_is_low() {
        let mut history = PredictionHistory::new();
        for day in 1..=10 {
            history.push(entry(day, "pattern", (2, 2, 2)));
        }
        let fraction = history
            .distinct_fraction("pattern", 20)
            .expect("method present");
        assert!((fraction - 0.1).abs() < 1e-12);
    }

    #[test]
    fn absent_method_yields_none() {
        let mut history = PredictionHistory::new();
        history.push(entry(1, "markov", (1, 2, 3)));
        assert!(history.distinct_fraction("arima", 20).is_none());
    }

    #[test]
    fn history_serde_roundtrip_is_a_plain_array() {
        let mut history = PredictionHistory::new();
        history.push(entry(1, "markov", (1, 2, 3)));
        let encoded = serde_json::to_string(&history).expect("serialize history");
        assert!(encoded.starts_with('['));
        let decoded: PredictionHistory =
            serde_json::from_str(&encoded).expect("deserialize history");
        assert_eq!(decoded, history);
    }
}
