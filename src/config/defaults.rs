//! System-wide default constants.
//!
//! Centralises the built-in values used when no config file is present.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable pointing at a calibration TOML file.
pub const CONFIG_ENV_VAR: &str = "TDCAL_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "calibration.toml";

// ============================================================================
// Uncertainty
// ============================================================================

/// Prior travel-time standard deviation (s).
pub const SIGMA_PRIOR_S: f64 = 0.01;

/// Checkshot travel-time standard deviation (s).
///
/// Lower end of the 5-50 ms range offered for checkshot picks.
pub const SIGMA_CHECKSHOT_S: f64 = 0.005;

/// Checkshot sigma multiplier for points outside log coverage.
pub const EXTRAPOLATION_SIGMA_SCALE: f64 = 2.0;

// ============================================================================
// Reference Datum
// ============================================================================

/// Datum depth (m). TVDSS logs are referenced to mean sea level.
pub const DATUM_DEPTH_M: f64 = 0.0;

/// Sea-water P-wave velocity (m/s).
pub const WATER_VELOCITY_MS: f64 = 1480.0;

// ============================================================================
// Table Ingestion
// ============================================================================

/// Picked times in the checkshot table are milliseconds.
pub const TIME_SCALE_TO_SECONDS: f64 = 0.001;

/// LAS-style null value treated as a missing sample.
pub const NULL_VALUE: f64 = -999.25;
