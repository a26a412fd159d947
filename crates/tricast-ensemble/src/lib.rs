// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Ensemble layer: descriptive analysis, confidence calibration, vote
//! aggregation, the conformal-interval wrapper and the orchestrated
//! forecasting pass.

pub mod aggregate;
pub mod analysis;
pub mod calibrate;
pub mod conformal;
pub mod forecast;
pub mod history;

pub use aggregate::{aggregate, Aggregation};
pub use analysis::{
    AnalysisReport, ChannelGaps, ChannelTrends, GapStats, TrendWindow,
};
pub use calibrate::Calibrator;
pub use conformal::conformal_interval;
pub use forecast::{run_forecast, ForecastReport, ForecastStatistics, REPORT_SCHEMA_VERSION};
pub use history::{HistoryEntry, PredictionHistory};
