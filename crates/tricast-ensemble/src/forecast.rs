// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! The orchestrated forecasting pass.
//!
//! Runs every compiled-in method sequentially over an immutable sequence
//! snapshot, isolates per-method failures, wraps the stacking prediction
//! in a conformal interval, calibrates confidences, aggregates the votes
//! and assembles the report. Only the total absence of candidates
//! propagates as an error.

use crate::aggregate::aggregate;
use crate::analysis::AnalysisReport;
use crate::calibrate::Calibrator;
use crate::conformal::conformal_interval;
use crate::history::PredictionHistory;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tricast_core::{
    DrawSequence, EnsembleConfig, MethodPrediction, PredictionInterval, RankedCandidate,
    TricastError,
};
use tricast_methods::standard_predictors;

/// Report schema version for forecast documents.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Method id of the conformal wrapper's vote entry.
const CONFORMAL_METHOD: &str = "conformal";
/// Base method wrapped by the conformal interval.
const CONFORMAL_BASE: &str = "stacking";

/// Sequence-level statistics carried in every report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastStatistics {
    pub total_records: usize,
    pub last_date: NaiveDate,
    pub last_number: String,
}

/// The full structured output of one forecasting pass.
///
/// `methods` preserves each method's raw output; the ranked lists carry
/// calibrated, class-weighted, normalized confidences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub schema_version: u32,
    pub timestamp: DateTime<Utc>,
    pub set_predictions: Vec<RankedCandidate>,
    pub mini_predictions: Vec<RankedCandidate>,
    pub methods: BTreeMap<String, MethodPrediction>,
    pub interval: Option<PredictionInterval>,
    pub statistics: ForecastStatistics,
    pub analysis: AnalysisReport,
}

/// Runs one full forecasting pass over `draws`.
///
/// `timestamp` is supplied by the caller so the pass itself stays a pure
/// function of its inputs.
pub fn run_forecast(
    draws: &DrawSequence,
    history: Option<&PredictionHistory>,
    config: &EnsembleConfig,
    timestamp: DateTime<Utc>,
) -> Result<ForecastReport, TricastError> {
    config.validate()?;
    let Some(last) = draws.last().copied() else {
        return Err(TricastError::insufficient_data(
            "forecasting requires a non-empty draw sequence",
            1,
            0,
        ));
    };

    // Sequential pass; each method reads the same immutable snapshot and a
    // failure in one never blocks the rest.
    let mut results: Vec<MethodPrediction> = Vec::new();
    for predictor in standard_predictors(config) {
        match predictor.predict(draws) {
            Ok(Some(prediction)) => results.push(prediction),
            Ok(None) => log::debug!("method {} abstained", predictor.id()),
            Err(error) => log::warn!("method {} skipped: {error}", predictor.id()),
        }
    }

    // The conformal wrapper votes with the base method's prediction and
    // carries the interval alongside.
    let conformal_base = results
        .iter()
        .find(|p| p.method == CONFORMAL_BASE)
        .cloned();
    let interval = conformal_base.map(|base| {
        let interval = conformal_interval(&base, draws, config.target_coverage);
        let vote = MethodPrediction {
            method: CONFORMAL_METHOD.to_string(),
            rationale: format!(
                "conformal interval at {:.0}% coverage around {}",
                config.target_coverage * 100.0,
                base.method
            ),
            ..base
        };
        results.push(vote);
        interval
    });

    if results.is_empty() {
        return Err(TricastError::NoCandidates);
    }

    let calibrator = Calibrator::new(config, draws, history);
    let calibrated: Vec<MethodPrediction> = results
        .iter()
        .map(|prediction| MethodPrediction {
            confidence: calibrator.calibrate(&prediction.method, &prediction.set_prediction),
            ..prediction.clone()
        })
        .collect();

    let aggregation = aggregate(&calibrated, config)?;

    let methods: BTreeMap<String, MethodPrediction> = results
        .into_iter()
        .map(|prediction| (prediction.method.clone(), prediction))
        .collect();

    Ok(ForecastReport {
        schema_version: REPORT_SCHEMA_VERSION,
        timestamp,
        set_predictions: aggregation.set_predictions,
        mini_predictions: aggregation.mini_predictions,
        methods,
        interval,
        statistics: ForecastStatistics {
            total_records: draws.len(),
            last_date: last.date,
            last_number: last.as_set_string(),
        },
        analysis: AnalysisReport::compute(draws),
    })
}
