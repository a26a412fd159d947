// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Workspace-wide error type.
///
/// Predictor-internal failures (insufficient history, fit divergence) are
/// normally recovered locally and never surface as an `Err`; the variants
/// here cover input validation, plumbing, and the one fatal ensemble
/// condition of having no candidate to rank.
#[derive(Error, Debug)]
pub enum TricastError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {context}: need {required}, have {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("no predictor produced a candidate to rank")]
    NoCandidates,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl TricastError {
    /// Builds an `InvalidInput` error from any message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Builds an `InsufficientData` error with the required/available counts.
    pub fn insufficient_data(
        context: impl Into<String>,
        required: usize,
        available: usize,
    ) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            available,
        }
    }

    /// Builds a `ModelFit` error from any message.
    pub fn model_fit(message: impl Into<String>) -> Self {
        Self::ModelFit(message.into())
    }

    /// Builds a `Parse` error from any message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
