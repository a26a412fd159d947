// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Linear-stacked ensemble over the windowed regressors.
//!
//! Base learners (a small bagged forest and both boosted configurations)
//! produce out-of-fold predictions on contiguous folds; a ridge
//! meta-regression per digit channel combines them. The ridge penalty is
//! chosen per channel from a small grid by the same fold split.

use crate::boost::fit_boosted;
use crate::features::{design_matrix, DesignMatrix};
use crate::linalg::ridge_fit;
use crate::support::{clip_round_digit, repeat_last_fallback};
use crate::tree::{RegressionTree, TreeConfig};
use tricast_core::{
    Channel, DrawSequence, MethodFamily, MethodPrediction, Predictor, StableRng, TricastError,
    CHANNELS,
};

const METHOD: &str = "stacking";
const CONFIDENCE: f64 = 0.82;
const MAX_WINDOW: usize = 100;
const MIN_TRAIN_ROWS: usize = 10;
const FOLDS: usize = 3;
/// Base-learner sizes are reduced relative to the standalone methods.
const FOREST_TREES: usize = 50;
const FOREST_DEPTH: usize = 8;
const BOOST_ROUNDS: usize = 50;
const BOOST_DEPTH: usize = 6;
const BOOST_RATE: f64 = 0.1;
const FINE_DEPTH: usize = 4;
const FINE_RATE: f64 = 0.05;
/// Ridge penalty grid, mirroring the usual cross-validated default.
const RIDGE_GRID: [f64; 3] = [0.1, 1.0, 10.0];

#[derive(Clone, Debug)]
pub struct StackingPredictor {
    seed: u64,
}

impl StackingPredictor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Scalar-output base learners fitted on a subset of rows.
fn base_predictions(
    rows: &[Vec<f64>],
    targets: &[f64],
    train: &[usize],
    query_rows: &[&[f64]],
    rng: &mut StableRng,
) -> Vec<Vec<f64>> {
    let train_rows: Vec<Vec<f64>> = train.iter().map(|&i| rows[i].clone()).collect();
    let train_targets: Vec<f64> = train.iter().map(|&i| targets[i]).collect();

    // Base 1: small bagged forest.
    let wrapped: Vec<[f64; 1]> = train_targets.iter().map(|y| [*y]).collect();
    let subsample = (train_rows
        .first()
        .map(|r| (r.len() as f64).sqrt().ceil() as usize)
        .unwrap_or(1))
    .max(1);
    let config = TreeConfig {
        max_depth: FOREST_DEPTH,
        feature_subsample: Some(subsample),
    };
    let mut importance = vec![0.0; train_rows.first().map(Vec::len).unwrap_or(0)];
    let mut forest_out = vec![0.0; query_rows.len()];
    for _ in 0..FOREST_TREES {
        let indices: Vec<usize> = (0..train_rows.len())
            .map(|_| rng.index(train_rows.len()))
            .collect();
        let tree = RegressionTree::<1>::fit(
            &train_rows,
            &wrapped,
            indices,
            &config,
            rng,
            &mut importance,
        );
        for (slot, query) in forest_out.iter_mut().zip(query_rows.iter()) {
            *slot += tree.predict(query)[0];
        }
    }
    for slot in forest_out.iter_mut() {
        *slot /= FOREST_TREES as f64;
    }

    // Bases 2 and 3: the two boosted configurations.
    let boost_out = fit_boosted(
        &train_rows,
        &train_targets,
        query_rows,
        BOOST_ROUNDS,
        BOOST_DEPTH,
        BOOST_RATE,
    );
    let fine_out = fit_boosted(
        &train_rows,
        &train_targets,
        query_rows,
        BOOST_ROUNDS,
        FINE_DEPTH,
        FINE_RATE,
    );

    query_rows
        .iter()
        .enumerate()
        .map(|(i, _)| vec![1.0, forest_out[i], boost_out[i], fine_out[i]])
        .collect()
}

/// Contiguous fold boundaries over `n` samples.
fn fold_ranges(n: usize, folds: usize) -> Vec<(usize, usize)> {
    let folds = folds.min(n).max(1);
    let base = n / folds;
    let remainder = n % folds;
    let mut out = Vec::with_capacity(folds);
    let mut start = 0;
    for fold in 0..folds {
        let len = base + usize::from(fold < remainder);
        out.push((start, start + len));
        start += len;
    }
    out
}

fn stack_channel(
    matrix: &DesignMatrix,
    channel: Channel,
    rng: &mut StableRng,
) -> Option<f64> {
    let targets = matrix.channel_targets(channel);
    let n = matrix.rows.len();

    // Out-of-fold meta features.
    let mut meta_rows: Vec<Vec<f64>> = vec![Vec::new(); n];
    for (start, end) in fold_ranges(n, FOLDS) {
        let train: Vec<usize> = (0..n).filter(|i| *i < start || *i >= end).collect();
        if train.is_empty() {
            return None;
        }
        let queries: Vec<&[f64]> = (start..end).map(|i| matrix.rows[i].as_slice()).collect();
        let fold_meta = base_predictions(&matrix.rows, &targets, &train, &queries, rng);
        for (offset, row) in fold_meta.into_iter().enumerate() {
            meta_rows[start + offset] = row;
        }
    }

    // Penalty selection on the same fold split, then the final fit.
    let mut best: Option<(f64, f64)> = None;
    for lambda in RIDGE_GRID {
        let mut squared_error = 0.0;
        let mut counted = 0usize;
        for (start, end) in fold_ranges(n, FOLDS) {
            let train_rows: Vec<Vec<f64>> = (0..n)
                .filter(|i| *i < start || *i >= end)
                .map(|i| meta_rows[i].clone())
                .collect();
            let train_targets: Vec<f64> = (0..n)
                .filter(|i| *i < start || *i >= end)
                .map(|i| targets[i])
                .collect();
            let Some(beta) = ridge_fit(&train_rows, &train_targets, lambda, true) else {
                continue;
            };
            for i in start..end {
                let predicted: f64 = meta_rows[i]
                    .iter()
                    .zip(beta.iter())
                    .map(|(x, b)| x * b)
                    .sum();
                squared_error += (predicted - targets[i]) * (predicted - targets[i]);
                counted += 1;
            }
        }
        if counted == 0 {
            continue;
        }
        let mse = squared_error / counted as f64;
        if best.map_or(true, |(_, best_mse)| mse < best_mse) {
            best = Some((lambda, mse));
        }
    }
    let (lambda, _) = best?;
    let beta = ridge_fit(&meta_rows, &targets, lambda, true)?;

    // Refit the bases on everything and stack the latest window.
    let all: Vec<usize> = (0..n).collect();
    let latest_meta = base_predictions(
        &matrix.rows,
        &targets,
        &all,
        &[matrix.latest.as_slice()],
        rng,
    );
    let prediction = latest_meta[0]
        .iter()
        .zip(beta.iter())
        .map(|(x, b)| x * b)
        .sum();
    Some(prediction)
}

impl Predictor for StackingPredictor {
    fn id(&self) -> &'static str {
        METHOD
    }

    fn family(&self) -> MethodFamily {
        MethodFamily::Regression
    }

    fn predict(
        &self,
        draws: &DrawSequence,
    ) -> Result<Option<MethodPrediction>, TricastError> {
        if draws.is_empty() {
            return Ok(None);
        }
        let window = MAX_WINDOW.min(draws.len());
        let matrix = match design_matrix(draws, window) {
            Some(matrix) if matrix.rows.len() >= MIN_TRAIN_ROWS => matrix,
            _ => {
                return repeat_last_fallback(
                    METHOD,
                    draws,
                    &format!("need {MIN_TRAIN_ROWS} trainable windows"),
                )
            }
        };

        let mut rng = StableRng::new(self.seed).fork(METHOD);
        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            match stack_channel(&matrix, *channel, &mut rng) {
                Some(value) => digits[slot] = clip_round_digit(value),
                // Meta fit degenerated: hold the channel at its last digit.
                None => {
                    let last = draws.last().map(|r| r.digit(*channel)).unwrap_or(0);
                    digits[slot] = last;
                }
            }
        }

        MethodPrediction::from_digits(
            METHOD,
            digits[0],
            digits[1],
            digits[2],
            CONFIDENCE,
            "ridge meta-regression over out-of-fold forest and boosted predictions",
        )
        .map(Some)
    }
}
