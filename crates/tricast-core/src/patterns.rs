// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::DrawSequence;
use std::collections::HashMap;

/// Most frequent historical combinations, count-descending.
///
/// Equal counts are ordered by first appearance in the sequence, which makes
/// the rank of any combination (and everything derived from it, like the
/// calibrator's frequency boost) deterministic.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyTables {
    /// Full 3-digit combinations.
    pub set_top: Vec<(String, usize)>,
    /// Trailing 2-digit combinations (ten, one).
    pub mini_top: Vec<(String, usize)>,
    /// Leading 2-digit combinations (hundred, ten).
    pub lead_pair_top: Vec<(String, usize)>,
}

impl FrequencyTables {
    /// Computes the top-`top_n` tables over the whole sequence.
    pub fn compute(draws: &DrawSequence, top_n: usize) -> Self {
        Self {
            set_top: top_counts(draws, top_n, |r| r.as_set_string()),
            mini_top: top_counts(draws, top_n, |r| r.as_mini_string()),
            lead_pair_top: top_counts(draws, top_n, |r| {
                format!("{}{}", r.hundred(), r.ten())
            }),
        }
    }

    /// 1-based rank of `candidate` in the 3-digit table, if present.
    pub fn set_rank(&self, candidate: &str) -> Option<usize> {
        self.set_top
            .iter()
            .position(|(number, _)| number == candidate)
            .map(|idx| idx + 1)
    }

    pub fn contains_lead_pair(&self, pair: &str) -> bool {
        self.lead_pair_top.iter().any(|(key, _)| key == pair)
    }

    pub fn contains_mini(&self, pair: &str) -> bool {
        self.mini_top.iter().any(|(key, _)| key == pair)
    }
}

fn top_counts(
    draws: &DrawSequence,
    top_n: usize,
    key: impl Fn(&crate::DrawRecord) -> String,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, record) in draws.records().iter().enumerate() {
        let entry = counts.entry(key(record)).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(combo, (count, first_seen))| (combo, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(combo, count, _)| (combo, count))
        .collect()
}
