//! Calibration Module
//!
//! Bayesian correction of a sonic-derived time-depth curve against
//! checkshot observations, and the drift curves used to judge the result.
//!
//! - `BayesianCalibrator` - prior model + posterior model for one setting
//! - `DriftReport` - prior/posterior drift at checkshot and log depths

pub mod bayes;
pub mod drift;

pub use bayes::{
    BayesianCalibrator, CalibrationModel, CalibrationSettings, ControlPoint, PriorModel,
    PriorUncertainty, MIN_CONTROL_POINTS,
};
pub use drift::{drift_at_checkshots, drift_at_log_depths, DriftCurve, DriftPoint, DriftReport, DriftStats};
