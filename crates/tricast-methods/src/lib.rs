// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Prediction-method implementations.
//!
//! Each module holds one forecasting strategy implementing
//! [`tricast_core::Predictor`]. The heavier families are feature-gated so
//! the ensemble operates over whatever subset is compiled in:
//! `trees` (forest, boosting, stacking), `state-models` (arima, hmm,
//! kalman) and `neural` (rnn).

pub mod bayes;
pub mod markov;
pub mod pattern;
pub mod phase;
pub mod seasonal;

#[cfg(feature = "trees")]
pub mod boost;
#[cfg(feature = "trees")]
pub mod features;
#[cfg(feature = "trees")]
pub mod forest;
#[cfg(feature = "trees")]
pub mod stacking;
#[cfg(feature = "trees")]
pub mod tree;

#[cfg(feature = "state-models")]
pub mod arima;
#[cfg(feature = "state-models")]
pub mod hmm;
#[cfg(feature = "state-models")]
pub mod kalman;

#[cfg(feature = "neural")]
pub mod rnn;

#[cfg(any(feature = "trees", feature = "state-models"))]
mod linalg;
mod support;

pub use bayes::BayesianPredictor;
pub use markov::MarkovPredictor;
pub use pattern::PatternPredictor;
pub use phase::PhasePredictor;
pub use seasonal::SeasonalPredictor;

#[cfg(feature = "trees")]
pub use boost::{BoostConfig, BoostPredictor};
#[cfg(feature = "trees")]
pub use forest::ForestPredictor;
#[cfg(feature = "trees")]
pub use stacking::StackingPredictor;

#[cfg(feature = "state-models")]
pub use arima::ArimaPredictor;
#[cfg(feature = "state-models")]
pub use hmm::HmmPredictor;
#[cfg(feature = "state-models")]
pub use kalman::KalmanPredictor;

#[cfg(feature = "neural")]
pub use rnn::RnnPredictor;

use tricast_core::{EnsembleConfig, Predictor};

/// Assembles the standard predictor set for one forecasting pass.
///
/// The list is ordered lightweight-heuristics-first, matching the order the
/// methods are reported in; feature-gated families are simply absent when
/// not compiled in.
pub fn standard_predictors(config: &EnsembleConfig) -> Vec<Box<dyn Predictor>> {
    let mut predictors: Vec<Box<dyn Predictor>> = vec![
        Box::new(PhasePredictor::new(config.seed)),
        Box::new(MarkovPredictor::new()),
        Box::new(BayesianPredictor::new()),
        Box::new(SeasonalPredictor::new()),
        Box::new(PatternPredictor::new()),
    ];

    #[cfg(feature = "trees")]
    {
        predictors.push(Box::new(ForestPredictor::new(config.seed)));
        predictors.push(Box::new(BoostPredictor::new(BoostConfig::standard())));
        predictors.push(Box::new(BoostPredictor::new(BoostConfig::fine())));
        predictors.push(Box::new(StackingPredictor::new(config.seed)));
    }

    #[cfg(feature = "state-models")]
    {
        predictors.push(Box::new(ArimaPredictor::new()));
        predictors.push(Box::new(HmmPredictor::new()));
        predictors.push(Box::new(KalmanPredictor::new()));
    }

    #[cfg(feature = "neural")]
    {
        predictors.push(Box::new(RnnPredictor::new(config.seed)));
    }

    predictors
}

#[cfg(test)]
mod tests {
    use super::standard_predictors;
    use tricast_core::EnsembleConfig;

    #[test]
    fn standard_set_always_contains_the_heuristic_methods() {
        let predictors = standard_predictors(&EnsembleConfig::default());
        let ids: Vec<&str> = predictors.iter().map(|p| p.id()).collect();
        for id in ["chaos", "markov", "bayesian", "seasonal", "pattern"] {
            assert!(ids.contains(&id), "missing heuristic method {id}");
        }
    }

    #[cfg(all(feature = "trees", feature = "state-models", feature = "neural"))]
    #[test]
    fn full_feature_set_registers_thirteen_methods() {
        let predictors = standard_predictors(&EnsembleConfig::default());
        assert_eq!(predictors.len(), 13);
    }

    #[test]
    fn method_ids_are_unique() {
        let predictors = standard_predictors(&EnsembleConfig::default());
        let mut ids: Vec<&str> = predictors.iter().map(|p| p.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), predictors.len());
    }
}
