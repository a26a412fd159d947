// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TricastError;

/// Method families, used for class-weight grouping and feature gating.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodFamily {
    /// Closed-form heuristics over the raw digit stream.
    Heuristic,
    /// Windowed supervised regressors (trees, boosting, stacking).
    Regression,
    /// Sequential state-space and latent-state models.
    StateModel,
    /// Recurrent sequence models.
    Neural,
    /// Interval wrappers around another method.
    Wrapper,
}

/// One method's forecast for the next draw.
///
/// Produced fresh on every forecasting call and never persisted as part of
/// the draw sequence.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MethodPrediction {
    pub method: String,
    pub set_prediction: String,
    pub mini_prediction: String,
    pub confidence: f64,
    pub rationale: String,
}

impl MethodPrediction {
    /// Builds a prediction from the three digit channels.
    ///
    /// The mini prediction is always the trailing two digits of the set
    /// prediction; constructing both from the same digits keeps that
    /// invariant unbreakable.
    pub fn from_digits(
        method: impl Into<String>,
        hundred: u8,
        ten: u8,
        one: u8,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Result<Self, TricastError> {
        if hundred > 9 || ten > 9 || one > 9 {
            return Err(TricastError::invalid_input(format!(
                "predicted digits must be in 0..=9; got ({hundred}, {ten}, {one})"
            )));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(TricastError::invalid_input(format!(
                "confidence must be in [0, 1]; got {confidence}"
            )));
        }
        Ok(Self {
            method: method.into(),
            set_prediction: format!("{hundred}{ten}{one}"),
            mini_prediction: format!("{ten}{one}"),
            confidence,
            rationale: rationale.into(),
        })
    }
}

/// One entry of a ranked top-K list.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCandidate {
    pub rank: usize,
    pub number: String,
    pub confidence: f64,
}

/// Conformal interval around a point prediction.
///
/// `degenerate` marks the documented corner case where no empirical error
/// sample could be computed and the interval collapsed to the point
/// prediction; `coverage` still reports the nominal target in that case.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionInterval {
    pub point: String,
    pub lower: String,
    pub upper: String,
    pub coverage: f64,
    pub margin: u8,
    pub degenerate: bool,
    pub base_method: String,
}
