//! Per-well calibration pipeline
//!
//! Turns one [`WellSelection`] into a typed [`WellOutcome`]. Every input is
//! an explicit argument; nothing is cached between calls.

use super::table::WellSelection;
use crate::calibration::{
    BayesianCalibrator, CalibrationSettings, ControlPoint, DriftReport, PriorModel, PriorUncertainty,
};
use crate::error::{CalibrationError, CalibrationWarning};
use crate::time_depth::interval_velocity;
use crate::types::{CheckshotSurvey, DepthSeries, ReferenceDatum, TimeConvention};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

/// Prior and posterior curves at one log sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WellSample {
    pub tvd: f64,
    pub vp_prior: f64,
    pub vp_posterior: f64,
    pub t_prior: f64,
    pub t_posterior: f64,
    /// Posterior minus prior velocity
    pub vp_difference: f64,
}

/// `vp ± sigma_v` at one log sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopePoint {
    pub tvd: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Merged result of a successful calibration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellCalibration {
    pub uwi: String,
    pub convention: TimeConvention,
    pub datum: ReferenceDatum,
    pub samples: Vec<WellSample>,
    pub control_points: Vec<ControlPoint>,
    pub checkshot_interval_velocity: DepthSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sonic_envelope: Option<Vec<EnvelopePoint>>,
    pub drift: DriftReport,
    pub warnings: Vec<CalibrationWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WellOutcome {
    /// The selection has no sonic log.
    NoData { uwi: String },
    /// Calibration failed; the prior is returned when it could be built.
    Unavailable {
        uwi: String,
        prior: Option<PriorModel>,
        #[serde(serialize_with = "serialize_display")]
        error: CalibrationError,
    },
    Calibrated(WellCalibration),
}

fn serialize_display<S: Serializer>(error: &CalibrationError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl WellOutcome {
    pub fn calibration(&self) -> Option<&WellCalibration> {
        match self {
            Self::Calibrated(c) => Some(c),
            _ => None,
        }
    }
}

/// Calibrate one well.
pub fn calibrate_well(selection: &WellSelection, settings: &CalibrationSettings) -> WellOutcome {
    let uwi = selection.uwi.clone();
    if selection.is_empty() {
        info!(well = %uwi, "No sonic log for well");
        return WellOutcome::NoData { uwi };
    }

    let unavailable = |prior: Option<PriorModel>, error: CalibrationError| {
        warn!(well = %selection.uwi, error = %error, "Calibration unavailable");
        WellOutcome::Unavailable {
            uwi: selection.uwi.clone(),
            prior,
            error,
        }
    };

    let (calibrator, prior) = match BayesianCalibrator::new(*settings).and_then(|c| {
        let velocity = DepthSeries::from_velocity_pairs(selection.sonic.iter().copied())?;
        c.prior(&velocity).map(|p| (c, p))
    }) {
        Ok(v) => v,
        Err(e) => return unavailable(None, e),
    };

    let survey = match CheckshotSurvey::from_picks(selection.picks.iter().map(|&(z, t)| (z, t, None))) {
        Ok(s) => s,
        Err(e) => return unavailable(Some(prior), e),
    };

    let result = calibrator
        .calibrate_prior(prior.clone(), &survey)
        .and_then(|model| DriftReport::compute(&survey, &model).map(|drift| (model, drift)));
    let (model, drift) = match result {
        Ok(v) => v,
        Err(e) => return unavailable(Some(prior), e),
    };

    let difference = model.velocity_difference();
    let samples = model
        .prior_time()
        .iter()
        .zip(model.posterior_time().values())
        .zip(model.prior_velocity().values())
        .zip(model.posterior_velocity().values())
        .zip(difference.values())
        .map(|(((((tvd, t_prior), &t_posterior), &vp_prior), &vp_posterior), &vp_difference)| WellSample {
            tvd,
            vp_prior,
            vp_posterior,
            t_prior,
            t_posterior,
            vp_difference,
        })
        .collect();

    let sonic_envelope = match settings.prior {
        PriorUncertainty::Velocity(sigma_v) => Some(
            model
                .prior_velocity()
                .iter()
                .map(|(tvd, vp)| EnvelopePoint {
                    tvd,
                    lower: vp - sigma_v,
                    upper: vp + sigma_v,
                })
                .collect(),
        ),
        PriorUncertainty::Time(_) => None,
    };

    if let (Some(prior_stats), Some(post_stats)) =
        (drift.prior_at_checkshots.stats(), drift.posterior_at_checkshots.stats())
    {
        info!(
            well = %uwi,
            control_points = model.control_points().len(),
            log_range = ?model.prior_velocity().depth_range(),
            prior_rms_drift = prior_stats.rms,
            posterior_rms_drift = post_stats.rms,
            "Well calibrated"
        );
    }

    WellOutcome::Calibrated(WellCalibration {
        uwi,
        convention: model.convention(),
        datum: *model.datum(),
        samples,
        control_points: model.control_points().to_vec(),
        checkshot_interval_velocity: interval_velocity(&survey, model.convention()),
        sonic_envelope,
        drift,
        warnings: model.warnings().to_vec(),
    })
}
