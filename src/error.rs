//! Calibration error taxonomy
//!
//! Fatal failures abort the calibration of one well and identify the
//! offending depth/value. Advisory conditions never fail a run; they are
//! returned next to the successful model as [`CalibrationWarning`]s so the
//! presentation layer can render "result with caveats" distinctly from
//! "no result".

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Fatal Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("Invalid velocity {value} at depth {depth:.2} m (must be finite and > 0)")]
    InvalidVelocity { depth: f64, value: f64 },

    #[error("Invalid {field} at depth {depth:.2} m: {value} ({reason})")]
    InvalidInput {
        field: &'static str,
        depth: f64,
        value: f64,
        reason: &'static str,
    },

    #[error("Insufficient control points: have {usable}, need {required}")]
    InsufficientControlPoints { usable: usize, required: usize },

    #[error("Invalid uncertainty {name} = {value} (must be finite and >= 0, not both zero)")]
    InvalidUncertainty { name: &'static str, value: f64 },

    #[error("Posterior travel time does not increase at depth {depth:.2} m")]
    NonPhysicalPosterior { depth: f64 },
}

impl CalibrationError {
    pub(crate) fn input(field: &'static str, depth: f64, value: f64, reason: &'static str) -> Self {
        Self::InvalidInput {
            field,
            depth,
            value,
            reason,
        }
    }
}

// ============================================================================
// Advisory Warnings
// ============================================================================

/// Non-fatal annotation attached to a successful calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationWarning {
    /// Checkshot lies outside the log depth range; the nearest log edge
    /// value was used for alignment.
    OutOfRangeExtrapolation { depth: f64, nearest_log_depth: f64 },
    /// Checkshot rows without a picked time were dropped before calibration.
    DroppedMissingTimes { count: usize },
}

impl std::fmt::Display for CalibrationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRangeExtrapolation {
                depth,
                nearest_log_depth,
            } => write!(
                f,
                "checkshot at {depth:.1} m is outside log coverage (edge value from {nearest_log_depth:.1} m)"
            ),
            Self::DroppedMissingTimes { count } => {
                write!(f, "{count} checkshot row(s) without picked time dropped")
            }
        }
    }
}
