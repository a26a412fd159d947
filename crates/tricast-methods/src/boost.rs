// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Gradient-boosted regression trees over the sliding feature window.
//!
//! Two configurations are registered in the standard set: `gboost`
//! (shallow-ish, fast learning rate) and `gboost_fine` (smaller trees,
//! slower rate, more rounds). Both share the squared-loss residual-fitting
//! core below.

use crate::features::{design_matrix, DesignMatrix};
use crate::support::{clip_round_digit, repeat_last_fallback};
use crate::tree::{RegressionTree, TreeConfig};
use tricast_core::{
    mean, Channel, DrawSequence, MethodFamily, MethodPrediction, Predictor, StableRng,
    TricastError, CHANNELS,
};

/// Draws per training window (the boosted variants use a short window).
const WINDOW: usize = 20;
const MIN_TRAIN_ROWS: usize = 10;

/// Hyperparameters distinguishing the two registered boosted variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostConfig {
    pub method: &'static str,
    pub rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub confidence: f64,
}

impl BoostConfig {
    /// 100 rounds of depth-6 trees at rate 0.1.
    pub fn standard() -> Self {
        Self {
            method: "gboost",
            rounds: 100,
            max_depth: 6,
            learning_rate: 0.1,
            confidence: 0.78,
        }
    }

    /// 200 rounds of depth-4 trees at rate 0.05.
    pub fn fine() -> Self {
        Self {
            method: "gboost_fine",
            rounds: 200,
            max_depth: 4,
            learning_rate: 0.05,
            confidence: 0.80,
        }
    }
}

/// Gradient-boosting predictor parameterized by a [`BoostConfig`].
#[derive(Clone, Debug)]
pub struct BoostPredictor {
    config: BoostConfig,
}

impl BoostPredictor {
    pub fn new(config: BoostConfig) -> Self {
        Self { config }
    }
}

/// Boosts scalar targets once and evaluates every query row.
pub(crate) fn fit_boosted(
    rows: &[Vec<f64>],
    targets: &[f64],
    queries: &[&[f64]],
    rounds: usize,
    max_depth: usize,
    learning_rate: f64,
) -> Vec<f64> {
    let base = mean(targets);
    let mut residuals: Vec<[f64; 1]> = targets.iter().map(|y| [y - base]).collect();
    let mut predictions = vec![base; queries.len()];

    // Boosting is deterministic: every round sees all rows and features.
    let config = TreeConfig {
        max_depth,
        feature_subsample: None,
    };
    let mut rng = StableRng::new(0);
    let feature_count = rows.first().map(Vec::len).unwrap_or(0);
    let mut importance = vec![0.0; feature_count];
    let indices: Vec<usize> = (0..rows.len()).collect();

    for _ in 0..rounds {
        let tree = RegressionTree::<1>::fit(
            rows,
            &residuals,
            indices.clone(),
            &config,
            &mut rng,
            &mut importance,
        );
        for (i, row) in rows.iter().enumerate() {
            residuals[i][0] -= learning_rate * tree.predict(row)[0];
        }
        for (slot, query) in predictions.iter_mut().zip(queries.iter()) {
            *slot += learning_rate * tree.predict(query)[0];
        }

        // All residual mass consumed: further rounds are no-ops.
        if residuals.iter().all(|r| r[0].abs() < 1e-9) {
            break;
        }
    }
    predictions
}

fn boost_channel(matrix: &DesignMatrix, channel: Channel, config: &BoostConfig) -> f64 {
    let targets = matrix.channel_targets(channel);
    fit_boosted(
        &matrix.rows,
        &targets,
        &[matrix.latest.as_slice()],
        config.rounds,
        config.max_depth,
        config.learning_rate,
    )[0]
}

impl Predictor for BoostPredictor {
    fn id(&self) -> &'static str {
        self.config.method
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
        let matrix = match design_matrix(draws, WINDOW) {
            Some(matrix) if matrix.rows.len() >= MIN_TRAIN_ROWS => matrix,
            _ => {
                return repeat_last_fallback(
                    self.config.method,
                    draws,
                    &format!("need {MIN_TRAIN_ROWS} trainable windows"),
                )
            }
        };

        let mut digits = [0u8; 3];
        for (slot, channel) in CHANNELS.iter().enumerate() {
            digits[slot] = clip_round_digit(boost_channel(&matrix, *channel, &self.config));
        }

        MethodPrediction::from_digits(
            self.config.method,
            digits[0],
            digits[1],
            digits[2],
            self.config.confidence,
            "gradient-boosted regression trees over the sliding feature window",
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::{fit_boosted, BoostConfig, BoostPredictor, Predictor};
    use crate::support::testutil::{sequence, varied_sequence};

    #[test]
    fn boosting_fits_a_separable_target_closely() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..20).map(|i| if i < 10 { 2.0 } else { 7.0 }).collect();
        let low: &[f64] = &[3.0];
        let high: &[f64] = &[15.0];
        let fitted = fit_boosted(&rows, &targets, &[low, high], 100, 3, 0.1);
        assert!((fitted[0] - 2.0).abs() < 0.1);
        assert!((fitted[1] - 7.0).abs() < 0.1);
    }

    #[test]
    fn constant_targets_converge_to_the_constant() {
        let rows: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64]).collect();
        let targets = vec![5.0; 12];
        let query: &[f64] = &[4.0];
        let fitted = fit_boosted(&rows, &targets, &[query], 50, 3, 0.1);
        assert!((fitted[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn short_history_falls_back() {
        let prediction = BoostPredictor::new(BoostConfig::standard())
            .predict(&sequence(&[12, 345, 678]))
            .expect("predict should succeed")
            .expect("prediction present");
        assert_eq!(prediction.set_prediction, "678");
        assert_eq!(prediction.confidence, 0.60);
    }

    #[test]
    fn both_variants_report_their_own_ids_and_confidences() {
        let seq = varied_sequence();
        let standard = BoostPredictor::new(BoostConfig::standard())
            .predict(&seq)
            .expect("predict standard")
            .expect("prediction present");
        let fine = BoostPredictor::new(BoostConfig::fine())
            .predict(&seq)
            .expect("predict fine")
            .expect("prediction present");
        assert_eq!(standard.method, "gboost");
        assert_eq!(fine.method, "gboost_fine");
        assert_eq!(standard.confidence, 0.78);
        assert_eq!(fine.confidence, 0.80);
    }

    #[test]
    fn boosting_is_deterministic() {
        let seq = varied_sequence();
        let predictor = BoostPredictor::new(BoostConfig::standard());
        let a = predictor.predict(&seq).expect("predict a");
        let b = predictor.predict(&seq).expect("predict b");
        assert_eq!(a, b);
    }
}
