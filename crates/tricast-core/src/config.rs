// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TricastError;

/// Default RNG seed for every stochastic method.
pub const DEFAULT_SEED: u64 = 42;

/// Fallback weight/confidence for a method id missing from the tables.
pub const DEFAULT_METHOD_WEIGHT: f64 = 0.65;

/// Ceiling applied to every calibrated confidence.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Number of ranked candidates the aggregator emits per projection.
pub const TOP_K: usize = 5;

const BASE_CONFIDENCE: [(&str, f64); 14] = [
    ("chaos", 0.65),
    ("markov", 0.70),
    ("bayesian", 0.68),
    ("seasonal", 0.72),
    ("pattern", 0.68),
    ("forest", 0.75),
    ("gboost", 0.78),
    ("gboost_fine", 0.80),
    ("arima", 0.73),
    ("stacking", 0.82),
    ("hmm", 0.74),
    ("rnn", 0.76),
    ("kalman", 0.72),
    ("conformal", 0.75),
];

/// Immutable weighting tables and knobs for one forecasting pass.
///
/// Base confidences seed the calibrator; class weights scale each method's
/// vote in the aggregator. Both default to the same per-method table of
/// assumed relative skill, but they are separate inputs on purpose so one
/// can be tuned without the other.
#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleConfig {
    pub base_confidence: Vec<(String, f64)>,
    pub class_weight: Vec<(String, f64)>,
    pub seed: u64,
    /// Trailing prediction-history entries the calibrator inspects.
    pub history_window: usize,
    /// Target coverage for the conformal wrapper.
    pub target_coverage: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        let table: Vec<(String, f64)> = BASE_CONFIDENCE
            .iter()
            .map(|(id, w)| ((*id).to_string(), *w))
            .collect();
        Self {
            base_confidence: table.clone(),
            class_weight: table,
            seed: DEFAULT_SEED,
            history_window: 20,
            target_coverage: 0.9,
        }
    }
}

impl EnsembleConfig {
    /// Validates table entries and knob ranges.
    pub fn validate(&self) -> Result<(), TricastError> {
        for (id, weight) in self.base_confidence.iter().chain(&self.class_weight) {
            if !(0.0..=1.0).contains(weight) || !weight.is_finite() {
                return Err(TricastError::invalid_input(format!(
                    "method weight for '{id}' must be finite and in [0, 1]; got {weight}"
                )));
            }
        }
        if !(0.0 < self.target_coverage && self.target_coverage < 1.0) {
            return Err(TricastError::invalid_input(format!(
                "target coverage must be in (0, 1); got {}",
                self.target_coverage
            )));
        }
        if self.history_window == 0 {
            return Err(TricastError::invalid_input(
                "history window must be >= 1",
            ));
        }
        Ok(())
    }

    /// Base confidence for a method, falling back to the default weight.
    pub fn base_confidence_for(&self, method: &str) -> f64 {
        lookup(&self.base_confidence, method)
    }

    /// Class weight for a method, falling back to the default weight.
    pub fn class_weight_for(&self, method: &str) -> f64 {
        lookup(&self.class_weight, method)
    }
}

fn lookup(table: &[(String, f64)], method: &str) -> f64 {
    table
        .iter()
        .find(|(id, _)| id == method)
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_METHOD_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::{EnsembleConfig, CONFIDENCE_CEILING, DEFAULT_METHOD_WEIGHT, TOP_K};

    #[test]
    fn default_config_is_valid() {
        EnsembleConfig::default()
            .validate()
            .expect("default config must validate");
    }

    #[test]
    fn known_methods_resolve_their_table_weights() {
        let config = EnsembleConfig::default();
        assert_eq!(config.base_confidence_for("stacking"), 0.82);
        assert_eq!(config.class_weight_for("gboost_fine"), 0.80);
        assert_eq!(config.base_confidence_for("chaos"), 0.65);
    }

    #[test]
    fn unknown_methods_fall_back_to_the_default_weight() {
        let config = EnsembleConfig::default();
        assert_eq!(
            config.class_weight_for("not-a-method"),
            DEFAULT_METHOD_WEIGHT
        );
    }

    #[test]
    fn rejects_out_of_range_weights() {
        let mut config = EnsembleConfig::default();
        config.class_weight.push(("broken".to_string(), 1.5));
        let err = config.validate().expect_err("weight 1.5 must fail");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn rejects_degenerate_coverage() {
        let mut config = EnsembleConfig::default();
        config.target_coverage = 1.0;
        let err = config.validate().expect_err("coverage 1.0 must fail");
        assert!(err.to_string().contains("target coverage"));
    }

    #[test]
    fn ceiling_and_top_k_constants_hold_expected_values() {
        assert_eq!(CONFIDENCE_CEILING, 0.95);
        assert_eq!(TOP_K, 5);
    }
}
