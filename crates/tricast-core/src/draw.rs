// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TricastError;
use chrono::NaiveDate;

/// The three independent digit positions of a 3-digit outcome.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Hundred,
    Ten,
    One,
}

/// Channels in display order (hundred, ten, one).
pub const CHANNELS: [Channel; 3] = [Channel::Hundred, Channel::Ten, Channel::One];

impl Channel {
    /// Stable lowercase label used in rationales and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hundred => "hundred",
            Self::Ten => "ten",
            Self::One => "one",
        }
    }
}

/// One recorded draw outcome.
///
/// Immutable once constructed; the digit channels, digit sum and span are
/// derived at construction time.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRecord {
    pub date: NaiveDate,
    pub number: u16,
}

impl DrawRecord {
    /// Constructs a validated record; `number` must be in `0..=999`.
    pub fn new(date: NaiveDate, number: u16) -> Result<Self, TricastError> {
        if number > 999 {
            return Err(TricastError::invalid_input(format!(
                "draw number must be in 0..=999; got {number}"
            )));
        }
        Ok(Self { date, number })
    }

    pub fn hundred(&self) -> u8 {
        (self.number / 100) as u8
    }

    pub fn ten(&self) -> u8 {
        ((self.number / 10) % 10) as u8
    }

    pub fn one(&self) -> u8 {
        (self.number % 10) as u8
    }

    pub fn digit(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Hundred => self.hundred(),
            Channel::Ten => self.ten(),
            Channel::One => self.one(),
        }
    }

    /// Digit sum, `0..=27`.
    pub fn digit_sum(&self) -> u8 {
        self.hundred() + self.ten() + self.one()
    }

    /// Max digit minus min digit, `0..=9`.
    pub fn digit_span(&self) -> u8 {
        let digits = [self.hundred(), self.ten(), self.one()];
        let max = digits.iter().copied().max().unwrap_or(0);
        let min = digits.iter().copied().min().unwrap_or(0);
        max - min
    }

    /// Zero-padded 3-digit representation.
    pub fn as_set_string(&self) -> String {
        format!("{:03}", self.number)
    }

    /// Trailing two digits, zero-padded.
    pub fn as_mini_string(&self) -> String {
        format!("{}{}", self.ten(), self.one())
    }
}

/// Append-only store of draw outcomes, ordered by date.
///
/// Invariants: records are non-decreasing by date (same-date ties keep
/// insertion order) and no `(date, number)` pair appears twice. Mutation
/// happens only through [`DrawSequence::append`], which re-sorts after
/// insertion; the forecasting pass reads an immutable snapshot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawSequence {
    records: Vec<DrawRecord>,
}

impl DrawSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from records, sorting by date and rejecting
    /// duplicate `(date, number)` pairs.
    pub fn from_records(records: Vec<DrawRecord>) -> Result<Self, TricastError> {
        let mut sequence = Self::new();
        for record in records {
            sequence.append(record)?;
        }
        Ok(sequence)
    }

    /// Appends one record, then restores date order (stable sort).
    pub fn append(&mut self, record: DrawRecord) -> Result<(), TricastError> {
        if self
            .records
            .iter()
            .any(|r| r.date == record.date && r.number == record.number)
        {
            return Err(TricastError::invalid_input(format!(
                "duplicate draw record: {} {}",
                record.date,
                record.as_set_string()
            )));
        }
        self.records.push(record);
        self.records.sort_by_key(|r| r.date);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&DrawRecord> {
        self.records.last()
    }

    /// One digit channel as f64 samples, oldest first.
    pub fn channel(&self, channel: Channel) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| f64::from(r.digit(channel)))
            .collect()
    }

    /// Digit channel restricted to the trailing `window` records.
    pub fn channel_tail(&self, channel: Channel, window: usize) -> Vec<f64> {
        let start = self.records.len().saturating_sub(window);
        self.records[start..]
            .iter()
            .map(|r| f64::from(r.digit(channel)))
            .collect()
    }

    /// Digit-sum series as f64 samples.
    pub fn sums(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| f64::from(r.digit_sum()))
            .collect()
    }

    /// Digit-span series as f64 samples.
    pub fn spans(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| f64::from(r.digit_span()))
            .collect()
    }
}
