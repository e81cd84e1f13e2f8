//! Calibration Configuration Module
//!
//! Provides uncertainty, datum and ingestion settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `TDCAL_CONFIG` environment variable (path to TOML file)
//! 2. `calibration.toml` in the current working directory
//! 3. Built-in defaults (see `defaults.rs`)
//!
//! ## Usage
//!
//! The config is loaded once by the caller and passed down explicitly:
//!
//! ```ignore
//! let config = CalibrationConfig::load();
//! let calibrator = BayesianCalibrator::new(config.settings())?;
//! ```

mod calibration_config;
pub mod defaults;
pub mod validation;

pub use calibration_config::*;
