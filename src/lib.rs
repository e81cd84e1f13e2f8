//! TDCAL: Bayesian time-depth calibration
//!
//! Calibrates a sonic-log velocity curve against sparse checkshot travel
//! times and reports the resulting drift.
//!
//! ## Architecture
//!
//! - **Time-Depth**: integration of velocity logs and alignment to checkshots
//! - **Calibration**: precision-weighted posterior and drift curves
//! - **Well**: flat-table ingestion and the per-well pipeline
//! - **Config**: uncertainty and datum settings from TOML

pub mod calibration;
pub mod config;
pub mod error;
pub mod time_depth;
pub mod types;
pub mod well;

// Re-export configuration
pub use config::CalibrationConfig;

// Re-export the core API
pub use calibration::{
    BayesianCalibrator, CalibrationModel, CalibrationSettings, DriftCurve, DriftReport,
    PriorModel, PriorUncertainty,
};
pub use error::{CalibrationError, CalibrationWarning};
pub use time_depth::{align, differentiate, integrate};
pub use types::{CheckshotPoint, CheckshotSurvey, DepthSeries, ReferenceDatum, TimeConvention};
pub use well::{calibrate_well, WellCalibration, WellOutcome, WellTable};
