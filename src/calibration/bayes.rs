//! Bayesian calibration of a sonic-derived time-depth curve
//!
//! The prior travel time at each checkshot depth and the checkshot pick are
//! two Gaussian estimates of the same quantity. Their precision-weighted
//! average is the posterior at that depth; the time correction
//! (posterior - prior) is then spread piecewise-linearly over every log
//! sample and the posterior velocity is recovered by differentiation.
//!
//! ## Correction outside the control points
//!
//! - Above the shallowest control point the correction tapers linearly to
//!   zero at the reference datum, where travel time is zero by definition.
//! - Below the deepest control point the correction is held constant, so
//!   the posterior velocity equals the prior there.

use crate::config::defaults;
use crate::error::{CalibrationError, CalibrationWarning};
use crate::time_depth::{align, differentiate, extrapolation_warnings, integrate};
use crate::types::{CheckshotSurvey, DepthSeries, ReferenceDatum, TimeConvention};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

/// Minimum number of usable checkshots for a calibration.
pub const MIN_CONTROL_POINTS: usize = 2;

// ============================================================================
// Settings
// ============================================================================

/// How much the sonic-derived prior is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sigma", rename_all = "snake_case")]
pub enum PriorUncertainty {
    /// Standard deviation of prior travel time (s), identical at every depth
    Time(f64),
    /// Standard deviation of sonic velocity (m/s), propagated to time per
    /// control point as `t * sigma_v / v_avg`.
    ///
    /// The propagated sigma is zero at or above the datum, so a checkshot
    /// there must carry a non-zero checkshot sigma or the calibration fails
    /// with `InvalidUncertainty`.
    Velocity(f64),
}

impl PriorUncertainty {
    pub(crate) const fn value(self) -> f64 {
        match self {
            Self::Time(s) | Self::Velocity(s) => s,
        }
    }

    /// Prior time sigma at `depth`, given the prior time there.
    fn time_sigma(self, depth: f64, prior_time: f64, datum: &ReferenceDatum, convention: TimeConvention) -> f64 {
        match self {
            Self::Time(s) => s,
            Self::Velocity(sigma_v) => {
                let path = convention.factor() * (depth - datum.depth);
                if path <= 0.0 || prior_time <= 0.0 {
                    // Time at the datum is exact
                    0.0
                } else {
                    let v_avg = path / prior_time;
                    prior_time * sigma_v / v_avg
                }
            }
        }
    }
}

/// Explicit inputs of one calibration run besides the series themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationSettings {
    pub prior: PriorUncertainty,
    /// Global checkshot time sigma (s), used when a point has none
    pub sigma_checkshot: f64,
    /// Multiplier (>= 1) on the checkshot sigma of points outside log coverage
    pub extrapolation_sigma_scale: f64,
    pub datum: ReferenceDatum,
    pub convention: TimeConvention,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            prior: PriorUncertainty::Time(defaults::SIGMA_PRIOR_S),
            sigma_checkshot: defaults::SIGMA_CHECKSHOT_S,
            extrapolation_sigma_scale: defaults::EXTRAPOLATION_SIGMA_SCALE,
            datum: ReferenceDatum::new(defaults::DATUM_DEPTH_M, defaults::WATER_VELOCITY_MS),
            convention: TimeConvention::TwoWay,
        }
    }
}

impl CalibrationSettings {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let sigma_prior = self.prior.value();
        if !sigma_prior.is_finite() || sigma_prior < 0.0 {
            return Err(CalibrationError::InvalidUncertainty {
                name: "sigma_prior",
                value: sigma_prior,
            });
        }
        if !self.sigma_checkshot.is_finite() || self.sigma_checkshot < 0.0 {
            return Err(CalibrationError::InvalidUncertainty {
                name: "sigma_checkshot",
                value: self.sigma_checkshot,
            });
        }
        if !self.extrapolation_sigma_scale.is_finite() || self.extrapolation_sigma_scale < 1.0 {
            return Err(CalibrationError::InvalidUncertainty {
                name: "extrapolation_sigma_scale",
                value: self.extrapolation_sigma_scale,
            });
        }
        self.datum.check()
    }
}

// ============================================================================
// Models
// ============================================================================

/// Uncalibrated curves: the sonic log and its integrated travel time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorModel {
    pub velocity: DepthSeries,
    pub time: DepthSeries,
}

/// One checkshot as used by the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlPoint {
    pub depth: f64,
    pub observed_time: f64,
    pub prior_time: f64,
    pub posterior_time: f64,
    pub sigma_prior: f64,
    pub sigma_checkshot: f64,
    pub sigma_posterior: f64,
    pub extrapolated: bool,
}

impl ControlPoint {
    /// Time correction applied at this depth (posterior - prior).
    pub fn correction(&self) -> f64 {
        self.posterior_time - self.prior_time
    }

    /// Symmetric credible interval of the posterior time for `level` in (0, 1).
    pub fn credible_interval(&self, level: f64) -> Option<(f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return None;
        }
        let z = Normal::new(0.0, 1.0).ok()?.inverse_cdf(0.5 + level / 2.0);
        let half = z * self.sigma_posterior;
        Some((self.posterior_time - half, self.posterior_time + half))
    }
}

/// Prior and posterior curves of one well for one uncertainty setting.
///
/// Immutable once built; a different setting yields a new model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationModel {
    prior: PriorModel,
    posterior_velocity: DepthSeries,
    posterior_time: DepthSeries,
    control_points: Vec<ControlPoint>,
    warnings: Vec<CalibrationWarning>,
    datum: ReferenceDatum,
    convention: TimeConvention,
}

impl CalibrationModel {
    pub const fn prior(&self) -> &PriorModel {
        &self.prior
    }

    pub const fn prior_velocity(&self) -> &DepthSeries {
        &self.prior.velocity
    }

    pub const fn prior_time(&self) -> &DepthSeries {
        &self.prior.time
    }

    pub const fn posterior_velocity(&self) -> &DepthSeries {
        &self.posterior_velocity
    }

    pub const fn posterior_time(&self) -> &DepthSeries {
        &self.posterior_time
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    pub fn warnings(&self) -> &[CalibrationWarning] {
        &self.warnings
    }

    pub const fn datum(&self) -> &ReferenceDatum {
        &self.datum
    }

    pub const fn convention(&self) -> TimeConvention {
        self.convention
    }

    /// Boundary condition that reproduces the posterior time when the
    /// posterior velocity is integrated: the datum depth with the posterior
    /// average velocity above the first log sample.
    pub fn posterior_datum(&self) -> ReferenceDatum {
        match (self.posterior_velocity.depths().first(), self.posterior_velocity.values().first()) {
            (Some(&z0), Some(&v0)) if z0 > self.datum.depth => ReferenceDatum::new(self.datum.depth, v0),
            _ => self.datum,
        }
    }

    /// Posterior minus prior velocity at every log sample.
    pub fn velocity_difference(&self) -> DepthSeries {
        let diff = self
            .posterior_velocity
            .values()
            .iter()
            .zip(self.prior.velocity.values())
            .map(|(post, prior)| post - prior)
            .collect();
        DepthSeries::on_grid(self.posterior_velocity.depths(), diff)
    }
}

// ============================================================================
// Calibrator
// ============================================================================

/// Stateless calibrator bound to validated settings.
#[derive(Debug, Clone)]
pub struct BayesianCalibrator {
    settings: CalibrationSettings,
}

impl BayesianCalibrator {
    pub fn new(settings: CalibrationSettings) -> Result<Self, CalibrationError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub const fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Integrate the sonic log into the prior model.
    pub fn prior(&self, velocity: &DepthSeries) -> Result<PriorModel, CalibrationError> {
        if velocity.is_empty() {
            return Err(CalibrationError::input(
                "vp",
                self.settings.datum.depth,
                0.0,
                "empty velocity log",
            ));
        }
        let time = integrate(velocity, &self.settings.datum, self.settings.convention)?;
        Ok(PriorModel {
            velocity: velocity.clone(),
            time,
        })
    }

    /// Calibrate a sonic log against a checkshot survey.
    pub fn calibrate(
        &self,
        velocity: &DepthSeries,
        survey: &CheckshotSurvey,
    ) -> Result<CalibrationModel, CalibrationError> {
        let prior = self.prior(velocity)?;
        self.calibrate_prior(prior, survey)
    }

    /// Calibrate an already integrated prior model.
    pub fn calibrate_prior(
        &self,
        prior: PriorModel,
        survey: &CheckshotSurvey,
    ) -> Result<CalibrationModel, CalibrationError> {
        let s = &self.settings;

        if survey.len() < MIN_CONTROL_POINTS {
            return Err(CalibrationError::InsufficientControlPoints {
                usable: survey.len(),
                required: MIN_CONTROL_POINTS,
            });
        }

        let aligned = align(survey.points(), &prior.time)?;

        let control_points = survey
            .points()
            .iter()
            .zip(&aligned)
            .map(|(point, a)| {
                let scale = if a.extrapolated { s.extrapolation_sigma_scale } else { 1.0 };
                let sigma_checkshot = point.sigma.unwrap_or(s.sigma_checkshot) * scale;
                let sigma_prior = s.prior.time_sigma(point.depth, a.value, &s.datum, s.convention);
                let (posterior_time, sigma_posterior) =
                    precision_weighted(a.value, sigma_prior, point.time, sigma_checkshot)?;
                Ok(ControlPoint {
                    depth: point.depth,
                    observed_time: point.time,
                    prior_time: a.value,
                    posterior_time,
                    sigma_prior,
                    sigma_checkshot,
                    sigma_posterior,
                    extrapolated: a.extrapolated,
                })
            })
            .collect::<Result<Vec<_>, CalibrationError>>()?;

        let correction = correction_knots(&control_points, &s.datum);
        let posterior_values = prior
            .time
            .iter()
            .map(|(z, t)| t + correction.locate(z).map_or(0.0, |l| l.value))
            .collect();
        let posterior_time = DepthSeries::on_grid(prior.time.depths(), posterior_values);
        let posterior_velocity = differentiate(&posterior_time, &s.datum, s.convention)?;

        let mut warnings = Vec::new();
        if survey.dropped_missing() > 0 {
            warnings.push(CalibrationWarning::DroppedMissingTimes {
                count: survey.dropped_missing(),
            });
        }
        warnings.extend(extrapolation_warnings(&aligned));

        debug!(
            control_points = control_points.len(),
            log_samples = posterior_time.len(),
            warnings = warnings.len(),
            "Calibration complete"
        );
        if !warnings.is_empty() {
            info!(count = warnings.len(), "Calibration finished with advisories");
        }

        Ok(CalibrationModel {
            prior,
            posterior_velocity,
            posterior_time,
            control_points,
            warnings,
            datum: s.datum,
            convention: s.convention,
        })
    }
}

/// Precision-weighted average of prior and observation, with its sigma.
///
/// A zero sigma is absolute trust in that source. The weight is computed
/// from the sigma ratio so that very small sigmas do not underflow.
fn precision_weighted(
    prior: f64,
    sigma_prior: f64,
    observed: f64,
    sigma_observed: f64,
) -> Result<(f64, f64), CalibrationError> {
    match (sigma_prior == 0.0, sigma_observed == 0.0) {
        (true, true) => Err(CalibrationError::InvalidUncertainty {
            name: "sigma_prior and sigma_checkshot",
            value: 0.0,
        }),
        (true, false) => Ok((prior, 0.0)),
        (false, true) => Ok((observed, 0.0)),
        (false, false) => {
            // Weight on the observation: sp^2 / (sp^2 + sc^2)
            let w = if sigma_prior <= sigma_observed {
                let r = sigma_prior / sigma_observed;
                r * r / (1.0 + r * r)
            } else {
                let r = sigma_observed / sigma_prior;
                1.0 / (1.0 + r * r)
            };
            let posterior = prior + (observed - prior) * w;
            // sp * sc / hypot(sp, sc), from the ratio so the product cannot underflow
            let (small, large) = (sigma_prior.min(sigma_observed), sigma_prior.max(sigma_observed));
            let r = small / large;
            let sigma = small / (1.0 + r * r).sqrt();
            Ok((posterior, sigma))
        }
    }
}

/// Correction knots: control points plus a zero anchor at the datum.
fn correction_knots(points: &[ControlPoint], datum: &ReferenceDatum) -> DepthSeries {
    let mut depths = Vec::with_capacity(points.len() + 1);
    let mut values = Vec::with_capacity(points.len() + 1);
    if points.first().is_some_and(|p| p.depth > datum.depth) {
        depths.push(datum.depth);
        values.push(0.0);
    }
    for p in points {
        depths.push(p.depth);
        values.push(p.correction());
    }
    DepthSeries::on_grid(&depths, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckshotPoint;

    fn one_way(sigma_prior: f64, sigma_checkshot: f64) -> BayesianCalibrator {
        BayesianCalibrator::new(CalibrationSettings {
            prior: PriorUncertainty::Time(sigma_prior),
            sigma_checkshot,
            extrapolation_sigma_scale: 1.0,
            datum: ReferenceDatum::new(0.0, 1000.0),
            convention: TimeConvention::OneWay,
        })
        .unwrap()
    }

    fn constant_log() -> DepthSeries {
        DepthSeries::from_pairs("vp", [(0.0, 1000.0), (100.0, 1000.0), (250.0, 1000.0)]).unwrap()
    }

    #[test]
    fn test_equal_precision_average() {
        let survey =
            CheckshotSurvey::new(vec![CheckshotPoint::new(100.0, 0.12), CheckshotPoint::new(250.0, 0.25)]).unwrap();
        let model = one_way(0.01, 0.01).calibrate(&constant_log(), &survey).unwrap();
        let cp = model.control_points()[0];
        assert!((cp.prior_time - 0.1).abs() < 1e-12);
        assert!((cp.posterior_time - 0.11).abs() < 1e-12);
        assert!((model.posterior_time().values()[1] - 0.11).abs() < 1e-12);
        assert!((cp.sigma_posterior - 0.01 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_checkshot_sigma_pins_to_observation() {
        let (t, s) = precision_weighted(0.1, 0.01, 0.12, 0.0).unwrap();
        assert_eq!(t, 0.12);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_zero_prior_sigma_pins_to_prior() {
        let (t, _) = precision_weighted(0.1, 0.0, 0.12, 0.01).unwrap();
        assert_eq!(t, 0.1);
    }

    #[test]
    fn test_both_zero_sigmas_rejected() {
        assert!(matches!(
            precision_weighted(0.1, 0.0, 0.12, 0.0),
            Err(CalibrationError::InvalidUncertainty { .. })
        ));
    }

    #[test]
    fn test_tiny_sigmas_do_not_underflow() {
        let (t, s) = precision_weighted(0.1, 1e-200, 0.12, 1e-200).unwrap();
        assert!((t - 0.11).abs() < 1e-12);
        assert!(s.is_finite() && s > 0.0);
        assert!((s * 1e200 - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_posterior_sigma_matches_closed_form() {
        let (_, s) = precision_weighted(0.1, 0.03, 0.12, 0.04).unwrap();
        assert!((s - 0.024).abs() < 1e-12);
        let (_, s) = precision_weighted(0.1, 0.04, 0.12, 0.03).unwrap();
        assert!((s - 0.024).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_prior_with_exact_checkshot_at_datum_is_rejected() {
        let calibrator = BayesianCalibrator::new(CalibrationSettings {
            prior: PriorUncertainty::Velocity(500.0),
            sigma_checkshot: 0.0,
            extrapolation_sigma_scale: 1.0,
            datum: ReferenceDatum::new(0.0, 1000.0),
            convention: TimeConvention::OneWay,
        })
        .unwrap();
        let survey =
            CheckshotSurvey::new(vec![CheckshotPoint::new(0.0, 0.0), CheckshotPoint::new(250.0, 0.25)]).unwrap();
        assert!(matches!(
            calibrator.calibrate(&constant_log(), &survey),
            Err(CalibrationError::InvalidUncertainty { .. })
        ));

        // a per-point sigma at the datum resolves the conflict
        let survey = CheckshotSurvey::new(vec![
            CheckshotPoint::new(0.0, 0.0).with_sigma(0.001),
            CheckshotPoint::new(250.0, 0.25),
        ])
        .unwrap();
        assert!(calibrator.calibrate(&constant_log(), &survey).is_ok());
    }

    #[test]
    fn test_correction_tapers_to_datum_and_holds_below() {
        let log = DepthSeries::from_pairs("vp", (0..=10).map(|i| (f64::from(i) * 50.0, 1000.0))).unwrap();
        let survey =
            CheckshotSurvey::new(vec![CheckshotPoint::new(200.0, 0.22), CheckshotPoint::new(300.0, 0.32)]).unwrap();
        let model = one_way(1.0, 1e-6).calibrate(&log, &survey).unwrap();
        let prior = model.prior_time().values();
        let post = model.posterior_time().values();

        // datum anchor
        assert!((post[0] - prior[0]).abs() < 1e-12);
        // halfway to the first control point
        assert!((post[2] - prior[2] - 0.01).abs() < 1e-6);
        // constant below the deepest control point
        assert!((post[10] - prior[10] - 0.02).abs() < 1e-6);
        assert!((model.posterior_velocity().values()[10] - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_negative_settings() {
        let settings = CalibrationSettings {
            sigma_checkshot: -0.1,
            ..CalibrationSettings::default()
        };
        assert!(BayesianCalibrator::new(settings).is_err());

        let settings = CalibrationSettings {
            extrapolation_sigma_scale: 0.5,
            ..CalibrationSettings::default()
        };
        assert!(BayesianCalibrator::new(settings).is_err());
    }

    #[test]
    fn test_velocity_prior_grows_with_time() {
        let datum = ReferenceDatum::new(0.0, 1500.0);
        let prior = PriorUncertainty::Velocity(500.0);
        let shallow = prior.time_sigma(500.0, 0.5, &datum, TimeConvention::TwoWay);
        let deep = prior.time_sigma(2000.0, 1.6, &datum, TimeConvention::TwoWay);
        assert!(shallow > 0.0);
        assert!(deep > shallow);
        // v_avg = 2 * 500 / 0.5 = 2000 m/s, sigma_t = 0.5 * 500 / 2000
        assert!((shallow - 0.125).abs() < 1e-12);
        assert_eq!(prior.time_sigma(0.0, 0.0, &datum, TimeConvention::TwoWay), 0.0);
    }

    #[test]
    fn test_credible_interval_contains_posterior() {
        let cp = ControlPoint {
            depth: 100.0,
            observed_time: 0.12,
            prior_time: 0.1,
            posterior_time: 0.11,
            sigma_prior: 0.01,
            sigma_checkshot: 0.01,
            sigma_posterior: 0.007,
            extrapolated: false,
        };
        let (lo, hi) = cp.credible_interval(0.95).unwrap();
        assert!(lo < 0.11 && hi > 0.11);
        assert!((hi - 0.11 - 1.959_964 * 0.007).abs() < 1e-5);
        assert!(cp.credible_interval(1.0).is_none());
    }

    #[test]
    fn test_velocity_difference_is_zero_without_correction() {
        let survey =
            CheckshotSurvey::new(vec![CheckshotPoint::new(100.0, 0.1), CheckshotPoint::new(250.0, 0.25)]).unwrap();
        let model = one_way(0.01, 0.01).calibrate(&constant_log(), &survey).unwrap();
        assert!(model.velocity_difference().values().iter().all(|d| d.abs() < 1e-6));
    }
}
