// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{DrawSequence, MethodFamily, MethodPrediction, TricastError};

/// Forecasting-strategy contract: one immutable sequence in, at most one
/// prediction out.
///
/// `Ok(None)` means the method has nothing to contribute (a capability is
/// unavailable or the method elected to abstain) and must be excluded from
/// voting without being treated as an error. Degraded-but-usable situations
/// return `Ok(Some(..))` with a reduced confidence and an explicit
/// rationale. `Err` is reserved for genuine failures; the orchestrating
/// call site isolates it so one method can never block the rest.
pub trait Predictor {
    /// Stable method identifier used in weight tables and reports.
    fn id(&self) -> &'static str;

    /// Method family, used for feature gating and class-weight grouping.
    fn family(&self) -> MethodFamily;

    /// Produces a forecast for the draw following `draws`.
    fn predict(&self, draws: &DrawSequence)
        -> Result<Option<MethodPrediction>, TricastError>;
}
