// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Sliding-window design matrix shared by the supervised regressors.
//!
//! Each training row concatenates the raw per-draw values
//! `[hundred, ten, one, sum, span]` over the trailing window with nine
//! indicator features computed at the row's position: the 20-draw moving
//! average, the 14-step momentum oscillator (RSI) and the 12/26
//! convergence-divergence signal (MACD) of each digit channel. Rows whose
//! moving-average warm-up is incomplete carry zeros for the indicator
//! block.

use tricast_core::{Channel, DrawSequence, CHANNELS};

/// Moving-average window for the indicator block.
const MA_WINDOW: usize = 20;
/// Momentum-oscillator lookback.
const RSI_WINDOW: usize = 14;
/// Convergence-divergence EMA spans.
const MACD_FAST_SPAN: usize = 12;
const MACD_SLOW_SPAN: usize = 26;
/// Guard against zero average loss in the oscillator.
const RSI_EPSILON: f64 = 1e-10;
/// Neutral oscillator reading when the lookback is incomplete.
const RSI_NEUTRAL: f64 = 50.0;

/// Values per draw inside the window block.
pub const VALUES_PER_DRAW: usize = 5;
/// Width of the indicator block.
pub const INDICATOR_COUNT: usize = 9;

/// Training rows, per-channel targets, and the prediction row for the most
/// recent window.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignMatrix {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<[f64; 3]>,
    pub latest: Vec<f64>,
}

impl DesignMatrix {
    pub fn feature_count(window: usize) -> usize {
        window * VALUES_PER_DRAW + INDICATOR_COUNT
    }

    /// Targets of one digit channel as a flat vector.
    pub fn channel_targets(&self, channel: Channel) -> Vec<f64> {
        let index = CHANNELS
            .iter()
            .position(|c| *c == channel)
            .unwrap_or_default();
        self.targets.iter().map(|t| t[index]).collect()
    }
}

/// Recursive exponential moving average over the full series
/// (`alpha = 2 / (span + 1)`, seeded with the first sample).
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut state = match values.first() {
        Some(first) => *first,
        None => return out,
    };
    out.push(state);
    for value in &values[1..] {
        state = alpha * value + (1.0 - alpha) * state;
        out.push(state);
    }
    out
}

fn moving_average(values: &[f64], end_inclusive: usize, window: usize) -> f64 {
    let start = end_inclusive + 1 - window;
    values[start..=end_inclusive].iter().sum::<f64>() / window as f64
}

/// Relative-strength oscillator at `end_inclusive`; neutral when fewer than
/// `RSI_WINDOW` deltas are available.
fn rsi(values: &[f64], end_inclusive: usize) -> f64 {
    if end_inclusive < RSI_WINDOW {
        return RSI_NEUTRAL;
    }
    let mut gain = 0.0;
    let mut loss = 0.0;
    for t in end_inclusive - RSI_WINDOW + 1..=end_inclusive {
        let delta = values[t] - values[t - 1];
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    let avg_gain = gain / RSI_WINDOW as f64;
    let avg_loss = loss / RSI_WINDOW as f64;
    let rs = avg_gain / (avg_loss + RSI_EPSILON);
    100.0 - 100.0 / (1.0 + rs)
}

struct ChannelSeries {
    values: Vec<f64>,
    ema_fast: Vec<f64>,
    ema_slow: Vec<f64>,
}

impl ChannelSeries {
    fn new(values: Vec<f64>) -> Self {
        let ema_fast = ema(&values, MACD_FAST_SPAN);
        let ema_slow = ema(&values, MACD_SLOW_SPAN);
        Self {
            values,
            ema_fast,
            ema_slow,
        }
    }

    fn macd(&self, t: usize) -> f64 {
        self.ema_fast[t] - self.ema_slow[t]
    }
}

/// Builds the design matrix for `window`-draw training rows.
///
/// Rows exist for every index `i` in `window..n`; the prediction row spans
/// the trailing `window` draws with indicators taken at the final index.
/// Returns `None` when the history cannot produce a single row.
pub fn design_matrix(draws: &DrawSequence, window: usize) -> Option<DesignMatrix> {
    let n = draws.len();
    if window == 0 || n <= window {
        return None;
    }

    let channels: Vec<ChannelSeries> = CHANNELS
        .iter()
        .map(|c| ChannelSeries::new(draws.channel(*c)))
        .collect();
    let sums = draws.sums();
    let spans = draws.spans();

    let window_block = |start: usize| {
        let mut block = Vec::with_capacity(window * VALUES_PER_DRAW);
        for idx in start..start + window {
            block.push(channels[0].values[idx]);
            block.push(channels[1].values[idx]);
            block.push(channels[2].values[idx]);
            block.push(sums[idx]);
            block.push(spans[idx]);
        }
        block
    };

    let indicator_block = |at: usize| {
        if at + 1 < MA_WINDOW {
            return vec![0.0; INDICATOR_COUNT];
        }
        let mut block = Vec::with_capacity(INDICATOR_COUNT);
        for series in &channels {
            block.push(moving_average(&series.values, at, MA_WINDOW));
        }
        for series in &channels {
            block.push(rsi(&series.values, at));
        }
        for series in &channels {
            block.push(series.macd(at));
        }
        block
    };

    let mut rows = Vec::with_capacity(n - window);
    let mut targets = Vec::with_capacity(n - window);
    for i in window..n {
        let mut row = window_block(i - window);
        row.extend(indicator_block(i));
        rows.push(row);
        targets.push([
            channels[0].values[i],
            channels[1].values[i],
            channels[2].values[i],
        ]);
    }

    let mut latest = window_block(n - window);
    latest.extend(indicator_block(n - 1));

    Some(DesignMatrix {
        rows,
        targets,
        latest,
    })
}
