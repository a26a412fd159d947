// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Bagged-tree regressor over the sliding feature window.

use crate::features::{design_matrix, DesignMatrix};
use crate::support::{clip_round_digit, repeat_last_fallback};
use crate::tree::{RegressionTree, TreeConfig};
use tricast_core::{
    population_std, DrawSequence, MethodFamily, MethodPrediction, Predictor, StableRng,
    TricastError,
};

const METHOD: &str = "forest";
/// Draws per training window, bounded by the history length.
const MAX_WINDOW: usize = 100;
const TREE_COUNT: usize = 100;
const MAX_DEPTH: usize = 10;
/// Minimum trainable windows before the model is attempted.
const MIN_TRAIN_ROWS: usize = 10;
const CONFIDENCE_FLOOR: f64 = 0.75;
const CONFIDENCE_CAP: f64 = 0.90;

/// Multi-output bagged regression forest.
#[derive(Clone, Debug)]
pub struct ForestPredictor {
    seed: u64,
}

impl ForestPredictor {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Fits `tree_count` bagged trees and returns the prediction for `latest`
/// plus normalized feature importances.
pub(crate) fn fit_bagged_forest(
    matrix: &DesignMatrix,
    tree_count: usize,
    max_depth: usize,
    rng: &mut StableRng,
) -> ([f64; 3], Vec<f64>) {
    let feature_count = matrix.latest.len();
    let sample_count = matrix.rows.len();
    let subsample = (feature_count as f64).sqrt().ceil() as usize;
    let config = TreeConfig {
        max_depth,
        feature_subsample: Some(subsample.max(1)),
    };

    let mut importance = vec![0.0; feature_count];
    let mut accumulated = [0.0f64; 3];
    for _ in 0..tree_count {
        let indices: Vec<usize> = (0..sample_count)
            .map(|_| rng.index(sample_count))
            .collect();
        let tree =
            RegressionTree::<3>::fit(&matrix.rows, &matrix.targets, indices, &config, rng, &mut importance);
        let prediction = tree.predict(&matrix.latest);
        for k in 0..3 {
            accumulated[k] += prediction[k];
        }
    }
    for slot in accumulated.iter_mut() {
        *slot /= tree_count as f64;
    }

    let total: f64 = importance.iter().sum();
    if total > 0.0 {
        for slot in importance.iter_mut() {
            *slot /= total;
        }
    }
    (accumulated, importance)
}

impl Predictor for ForestPredictor {
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
        let (prediction, importance) =
            fit_bagged_forest(&matrix, TREE_COUNT, MAX_DEPTH, &mut rng);

        // Spread-out importances signal that the forest found structure
        // beyond a couple of dominant columns.
        let confidence =
            (CONFIDENCE_FLOOR + 2.0 * population_std(&importance)).min(CONFIDENCE_CAP);

        MethodPrediction::from_digits(
            METHOD,
            clip_round_digit(prediction[0]),
            clip_round_digit(prediction[1]),
            clip_round_digit(prediction[2]),
            confidence,
            "bagged regression trees over the sliding feature window",
        )
        .map(Some)
    }
}
