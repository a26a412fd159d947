// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! File plumbing around the forecasting engine: draw-history loading,
//! report writing and the append-then-rewrite history discipline.
//!
//! The acquisition side is expected to deliver records already normalized
//! to `{date: ISO-8601, number: zero-padded 3-digit string}` with no
//! duplicate `(date, number)` pairs; the loaders still re-check the
//! sequence invariants defensively on the way in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tricast_core::{DrawRecord, DrawSequence, TricastError};
use tricast_ensemble::{ForecastReport, HistoryEntry, PredictionHistory};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire form of one draw record: ISO date plus zero-padded number string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawDraw {
    pub date: String,
    pub number: String,
}

impl RawDraw {
    fn parse(&self) -> Result<DrawRecord, TricastError> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|e| {
            TricastError::parse(format!("invalid draw date '{}': {e}", self.date))
        })?;
        if self.number.len() != 3 || !self.number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TricastError::parse(format!(
                "invalid draw number '{}': expected exactly three digits",
                self.number
            )));
        }
        let number: u16 = self
            .number
            .parse()
            .map_err(|e| TricastError::parse(format!("invalid draw number '{}': {e}", self.number)))?;
        DrawRecord::new(date, number)
    }

    fn from_record(record: &DrawRecord) -> Self {
        Self {
            date: record.date.format(DATE_FORMAT).to_string(),
            number: record.as_set_string(),
        }
    }
}

/// Loads a draw history file; JSON arrays and two-column CSV are accepted,
/// chosen by file extension (everything that is not `.json` parses as CSV).
pub fn load_draws(path: &Path) -> Result<DrawSequence, TricastError> {
    let contents = fs::read_to_string(path)?;
    let raws = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str::<Vec<RawDraw>>(&contents)
            .map_err(|e| TricastError::parse(format!("{}: {e}", path.display())))?
    } else {
        parse_csv(&contents)?
    };

    let mut records = Vec::with_capacity(raws.len());
    for raw in &raws {
        records.push(raw.parse()?);
    }
    DrawSequence::from_records(records)
}

/// Two-column `date,number` CSV; a single header line is tolerated.
fn parse_csv(contents: &str) -> Result<Vec<RawDraw>, TricastError> {
    let mut raws = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((date, number)) = trimmed.split_once(',') else {
            return Err(TricastError::parse(format!(
                "line {}: expected 'date,number', got '{trimmed}'",
                line_no + 1
            )));
        };
        let raw = RawDraw {
            date: date.trim().to_string(),
            number: number.trim().to_string(),
        };
        if line_no == 0 && raw.parse().is_err() && raw.date.eq_ignore_ascii_case("date") {
            continue; // header row
        }
        raws.push(raw);
    }
    Ok(raws)
}

/// Rewrites the draw file with `record` appended, preserving the file's
/// format. The write is one scoped whole-file operation.
pub fn append_draw(path: &Path, record: DrawRecord) -> Result<usize, TricastError> {
    let mut draws = if path.exists() {
        load_draws(path)?
    } else {
        DrawSequence::new()
    };
    draws.append(record)?;

    let raws: Vec<RawDraw> = draws.records().iter().map(RawDraw::from_record).collect();
    if path.extension().is_some_and(|ext| ext == "json") {
        let encoded = serde_json::to_string_pretty(&raws)
            .map_err(|e| TricastError::parse(format!("encoding draws: {e}")))?;
        fs::write(path, encoded)?;
    } else {
        let mut lines = String::from("date,number\n");
        for raw in &raws {
            lines.push_str(&format!("{},{}\n", raw.date, raw.number));
        }
        fs::write(path, lines)?;
    }
    Ok(draws.len())
}

/// Loads the prediction-history log; a missing file is an empty log.
pub fn load_history(path: &Path) -> Result<PredictionHistory, TricastError> {
    if !path.exists() {
        return Ok(PredictionHistory::new());
    }
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| TricastError::parse(format!("{}: {e}", path.display())))
}

/// Appends one entry to the history log using the append-then-rewrite
/// discipline: read the whole log, push, rewrite the whole file.
pub fn append_history(path: &Path, entry: HistoryEntry) -> Result<usize, TricastError> {
    let mut history = load_history(path)?;
    history.push(entry);
    let encoded = serde_json::to_string_pretty(&history)
        .map_err(|e| TricastError::parse(format!("encoding history: {e}")))?;
    fs::write(path, encoded)?;
    Ok(history.len())
}

/// Writes the forecast report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &ForecastReport) -> Result<(), TricastError> {
    let encoded = serde_json::to_string_pretty(report)
        .map_err(|e| TricastError::parse(format!("encoding report: {e}")))?;
    fs::write(path, encoded)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{append_draw, append_history, load_draws, load_history};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::BTreeMap;
    use tricast_core::{DrawRecord, MethodPrediction};
    use tricast_ensemble::HistoryEntry;

    fn record(date: (i32, u32, u32), number: u16) -> DrawRecord {
        DrawRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
            number,
        )
        .expect("valid record")
    }

    #[test]
    fn json_draws_round_trip_through_append() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draws.json");

        append_draw(&path, record((2024, 1, 2), 123)).expect("first append");
        append_draw(&path, record((2024, 1, 1), 45)).expect("second append");

        let draws = load_draws(&path).expect("load succeeds");
        assert_eq!(draws.len(), 2);
        // Re-sorted by date on append.
        assert_eq!(draws.records()[0].number, 45);
        assert_eq!(draws.records()[1].number, 123);
    }

    #[test]
    fn csv_draws_parse_with_and_without_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draws.csv");
        std::fs::write(&path, "date,number\n2024-03-01,007\n2024-03-02,980\n")
            .expect("write csv");
        let draws = load_draws(&path).expect("load with header");
        assert_eq!(draws.len(), 2);
        assert_eq!(draws.records()[0].number, 7);

        std::fs::write(&path, "2024-03-01,007\n").expect("write headerless csv");
        let draws = load_draws(&path).expect("load without header");
        assert_eq!(draws.len(), 1);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draws.csv");
        std::fs::write(&path, "2024-03-01,1234\n").expect("write csv");
        let err = load_draws(&path).expect_err("four digits must fail");
        assert!(err.to_string().contains("three digits"));

        std::fs::write(&path, "2024-03-01,12\n").expect("write csv");
        let err = load_draws(&path).expect_err("two digits must fail");
        assert!(err.to_string().contains("three digits"));
    }

    #[test]
    fn duplicate_draws_are_rejected_on_append() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("draws.json");
        append_draw(&path, record((2024, 1, 1), 123)).expect("first append");
        let err = append_draw(&path, record((2024, 1, 1), 123))
            .expect_err("duplicate must be rejected");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn missing_history_is_an_empty_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = load_history(&dir.path().join("absent.json")).expect("load succeeds");
        assert!(history.is_empty());
    }

    #[test]
    fn history_append_then_rewrite_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");

        let mut methods = BTreeMap::new();
        methods.insert(
            "markov".to_string(),
            MethodPrediction::from_digits("markov", 1, 2, 3, 0.7, "test")
                .expect("valid prediction"),
        );
        let entry = HistoryEntry {
            timestamp: Utc
                .with_ymd_and_hms(2024, 4, 1, 8, 30, 0)
                .single()
                .expect("valid timestamp"),
            methods,
        };

        assert_eq!(append_history(&path, entry.clone()).expect("first"), 1);
        assert_eq!(append_history(&path, entry).expect("second"), 2);

        let history = load_history(&path).expect("load succeeds");
        assert_eq!(history.len(), 2);
        assert!(history.entries()[0].methods.contains_key("markov"));
    }
}
