// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types and traits for the tricast forecasting engine.
//!
//! This crate holds everything the method and ensemble crates agree on:
//! the draw sequence store, the `Predictor` contract, the ensemble
//! configuration tables, and the small numeric helpers shared across
//! method implementations.

pub mod config;
pub mod draw;
pub mod error;
pub mod patterns;
pub mod prediction;
pub mod predictor;
pub mod rng;
pub mod stats;

pub use config::{
    EnsembleConfig, CONFIDENCE_CEILING, DEFAULT_METHOD_WEIGHT, DEFAULT_SEED, TOP_K,
};
pub use draw::{Channel, DrawRecord, DrawSequence, CHANNELS};
pub use error::TricastError;
pub use patterns::FrequencyTables;
pub use prediction::{MethodFamily, MethodPrediction, PredictionInterval, RankedCandidate};
pub use predictor::Predictor;
pub use rng::StableRng;
pub use stats::{
    interpolated_quantile, linear_fit, log_sum_exp, mean, pearson, population_std,
};
