//! Calibration Configuration - uncertainty, datum and ingestion settings as TOML
//!
//! Each struct implements `Default` with the values in `defaults.rs`, so a
//! missing file or a partial file always yields a complete configuration.

use super::defaults;
use crate::calibration::{CalibrationSettings, PriorUncertainty};
use crate::types::{ReferenceDatum, TimeConvention};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of a calibration run.
///
/// Load with `CalibrationConfig::load()` which searches:
/// 1. `$TDCAL_CONFIG` env var
/// 2. `./calibration.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Prior and checkshot uncertainties
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,

    /// Reference datum (time-zero level and velocity above the log)
    #[serde(default)]
    pub datum: DatumConfig,

    /// Travel-time convention
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// Flat-table ingestion
    #[serde(default)]
    pub table: TableConfig,
}

impl CalibrationConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TDCAL_CONFIG` environment variable
    /// 2. `./calibration.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that fails to load or validate falls back to the defaults.
    pub fn load() -> Self {
        if let Some(path) = Self::search_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Loaded calibration config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                    return Self::default();
                }
            }
        }

        info!("No calibration.toml found, using built-in defaults");
        Self::default()
    }

    /// First existing config file in the search order, if any.
    pub fn search_path() -> Option<PathBuf> {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                return Some(p);
            }
            warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
        }

        // 2. Check ./calibration.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file without validating it, for callers that apply
    /// overrides before calling `validate()` themselves.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse_toml(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; a document that parses but fails
    /// validation is an error.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_toml(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without validating values.
    pub fn parse_toml(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Sigmas must be finite and >= 0, and not both zero
    /// - Datum velocity must be > 0
    /// - Extrapolation scale must be >= 1
    /// - Time scale must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let u = &self.uncertainty;
        let mut errors: Vec<String> = Vec::new();

        Self::check_sigma(u.sigma_prior, "uncertainty.sigma_prior", &mut errors);
        Self::check_sigma(u.sigma_checkshot, "uncertainty.sigma_checkshot", &mut errors);
        if let Some(sigma_v) = u.sonic_velocity_sigma {
            Self::check_sigma(sigma_v, "uncertainty.sonic_velocity_sigma", &mut errors);
        }
        if self.settings().prior.value() == 0.0 && u.sigma_checkshot == 0.0 {
            errors.push(
                "uncertainty: prior and checkshot sigma cannot both be zero (contradictory absolute trust)"
                    .to_string(),
            );
        }
        if !u.extrapolation_sigma_scale.is_finite() || u.extrapolation_sigma_scale < 1.0 {
            errors.push(format!(
                "uncertainty.extrapolation_sigma_scale ({}) must be >= 1",
                u.extrapolation_sigma_scale
            ));
        }

        if !self.datum.depth.is_finite() {
            errors.push(format!("datum.depth ({}) must be finite", self.datum.depth));
        }
        if !self.datum.velocity.is_finite() || self.datum.velocity <= 0.0 {
            errors.push(format!("datum.velocity ({}) must be > 0", self.datum.velocity));
        }

        if !self.table.time_scale.is_finite() || self.table.time_scale <= 0.0 {
            errors.push(format!("table.time_scale ({}) must be > 0", self.table.time_scale));
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_sigma(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("{name} ({value}) must be finite and >= 0"));
        }
    }

    /// Calibrator settings described by this config.
    pub fn settings(&self) -> CalibrationSettings {
        let u = &self.uncertainty;
        CalibrationSettings {
            prior: u
                .sonic_velocity_sigma
                .map_or(PriorUncertainty::Time(u.sigma_prior), PriorUncertainty::Velocity),
            sigma_checkshot: u.sigma_checkshot,
            extrapolation_sigma_scale: u.extrapolation_sigma_scale,
            datum: ReferenceDatum::new(self.datum.depth, self.datum.velocity),
            convention: self.integration.convention,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Uncertainty
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyConfig {
    /// Prior travel-time sigma (s). Zero pins the posterior to the sonic log.
    #[serde(default = "default_sigma_prior")]
    pub sigma_prior: f64,

    /// Global checkshot travel-time sigma (s). Zero pins the posterior to
    /// the checkshots.
    #[serde(default = "default_sigma_checkshot")]
    pub sigma_checkshot: f64,

    /// Sonic velocity sigma (m/s). When set it replaces `sigma_prior` and is
    /// propagated to time at every control point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonic_velocity_sigma: Option<f64>,

    /// Checkshot sigma multiplier for points outside log coverage
    #[serde(default = "default_extrapolation_sigma_scale")]
    pub extrapolation_sigma_scale: f64,
}

fn default_sigma_prior() -> f64 {
    defaults::SIGMA_PRIOR_S
}
fn default_sigma_checkshot() -> f64 {
    defaults::SIGMA_CHECKSHOT_S
}
fn default_extrapolation_sigma_scale() -> f64 {
    defaults::EXTRAPOLATION_SIGMA_SCALE
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            sigma_prior: default_sigma_prior(),
            sigma_checkshot: default_sigma_checkshot(),
            sonic_velocity_sigma: None,
            extrapolation_sigma_scale: default_extrapolation_sigma_scale(),
        }
    }
}

// ============================================================================
// Datum
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatumConfig {
    /// Depth at which travel time is zero (m)
    #[serde(default = "default_datum_depth", alias = "water_depth")]
    pub depth: f64,

    /// Velocity between the datum and the first log sample (m/s)
    #[serde(default = "default_datum_velocity", alias = "water_velocity")]
    pub velocity: f64,
}

fn default_datum_depth() -> f64 {
    defaults::DATUM_DEPTH_M
}
fn default_datum_velocity() -> f64 {
    defaults::WATER_VELOCITY_MS
}

impl Default for DatumConfig {
    fn default() -> Self {
        Self {
            depth: default_datum_depth(),
            velocity: default_datum_velocity(),
        }
    }
}

// ============================================================================
// Integration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// "two_way" (checkshot TWT picks) or "one_way"
    #[serde(default)]
    pub convention: TimeConvention,
}

// ============================================================================
// Table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Factor converting picked times to seconds (0.001 for milliseconds)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Sentinel treated as a missing sample
    #[serde(default = "default_null_value")]
    pub null_value: f64,
}

fn default_time_scale() -> f64 {
    defaults::TIME_SCALE_TO_SECONDS
}
fn default_null_value() -> f64 {
    defaults::NULL_VALUE
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
            null_value: default_null_value(),
        }
    }
}
