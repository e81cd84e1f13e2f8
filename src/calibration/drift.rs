//! Drift between a model time-depth curve and the checkshots
//!
//! Sign convention: `drift = model_time - checkshot_time`. Positive drift
//! means the model arrives later (is slower) than the checkshots.

use super::bayes::CalibrationModel;
use crate::error::CalibrationError;
use crate::time_depth::align;
use crate::types::{CheckshotSurvey, DepthSeries};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftPoint {
    pub depth: f64,
    /// `None` where the drift is undefined (outside checkshot coverage)
    pub drift: Option<f64>,
    /// Model time was taken from the nearest log edge
    pub extrapolated: bool,
}

/// Aggregate quality figures of a drift curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftStats {
    pub defined: usize,
    pub mean: f64,
    pub max_abs: f64,
    pub rms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftCurve {
    points: Vec<DriftPoint>,
}

impl DriftCurve {
    pub fn points(&self) -> &[DriftPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(depth, drift)` for points where drift is defined.
    pub fn defined(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().filter_map(|p| p.drift.map(|d| (p.depth, d)))
    }

    /// Statistics over defined points; `None` when none are defined.
    pub fn stats(&self) -> Option<DriftStats> {
        let drifts: Vec<f64> = self.defined().map(|(_, d)| d).collect();
        if drifts.is_empty() {
            return None;
        }
        let n = drifts.len() as f64;
        Some(DriftStats {
            defined: drifts.len(),
            mean: drifts.iter().sum::<f64>() / n,
            max_abs: drifts.iter().fold(0.0_f64, |m, d| m.max(d.abs())),
            rms: (drifts.iter().map(|d| d * d).sum::<f64>() / n).sqrt(),
        })
    }
}

/// Drift at every checkshot depth, model time aligned to the checkshots.
pub fn drift_at_checkshots(
    survey: &CheckshotSurvey,
    model_time: &DepthSeries,
) -> Result<DriftCurve, CalibrationError> {
    let aligned = align(survey.points(), model_time)?;
    let points = survey
        .points()
        .iter()
        .zip(aligned)
        .map(|(p, a)| DriftPoint {
            depth: p.depth,
            drift: Some(a.value - p.time),
            extrapolated: a.extrapolated,
        })
        .collect();
    Ok(DriftCurve { points })
}

/// Drift at every log depth, checkshot time interpolated between the two
/// nearest checkshots. Undefined outside checkshot coverage.
pub fn drift_at_log_depths(survey: &CheckshotSurvey, model_time: &DepthSeries) -> DriftCurve {
    let checkshot_time = survey.time_series();
    let points = model_time
        .iter()
        .map(|(z, t)| DriftPoint {
            depth: z,
            drift: checkshot_time.value_within(z).map(|tc| t - tc),
            extrapolated: false,
        })
        .collect();
    DriftCurve { points }
}

/// The four drift curves of a calibrated model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub prior_at_checkshots: DriftCurve,
    pub prior_at_log: DriftCurve,
    pub posterior_at_checkshots: DriftCurve,
    pub posterior_at_log: DriftCurve,
}

impl DriftReport {
    pub fn compute(survey: &CheckshotSurvey, model: &CalibrationModel) -> Result<Self, CalibrationError> {
        Ok(Self {
            prior_at_checkshots: drift_at_checkshots(survey, model.prior_time())?,
            prior_at_log: drift_at_log_depths(survey, model.prior_time()),
            posterior_at_checkshots: drift_at_checkshots(survey, model.posterior_time())?,
            posterior_at_log: drift_at_log_depths(survey, model.posterior_time()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckshotPoint;

    fn survey() -> CheckshotSurvey {
        CheckshotSurvey::new(vec![
            CheckshotPoint::new(100.0, 0.12),
            CheckshotPoint::new(200.0, 0.22),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_drift_when_model_matches() {
        let model = survey().time_series();
        let curve = drift_at_checkshots(&survey(), &model).unwrap();
        assert!(curve.points().iter().all(|p| p.drift == Some(0.0)));
    }

    #[test]
    fn test_sign_convention() {
        let slow = DepthSeries::from_pairs("twt", [(100.0, 0.13), (200.0, 0.23)]).unwrap();
        let curve = drift_at_checkshots(&survey(), &slow).unwrap();
        let d = curve.points()[0].drift.unwrap();
        assert!((d - 0.01).abs() < 1e-12, "slower model must drift positive, got {d}");
    }

    #[test]
    fn test_log_drift_undefined_outside_coverage() {
        let model = DepthSeries::from_pairs("twt", [(50.0, 0.05), (150.0, 0.18), (250.0, 0.25)]).unwrap();
        let curve = drift_at_log_depths(&survey(), &model);
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.points()[0].drift, None);
        assert!((curve.points()[1].drift.unwrap() - 0.01).abs() < 1e-12);
        assert_eq!(curve.points()[2].drift, None);
    }

    #[test]
    fn test_stats_ignore_undefined() {
        let model = DepthSeries::from_pairs("twt", [(50.0, 0.05), (100.0, 0.13), (200.0, 0.19)]).unwrap();
        let stats = drift_at_log_depths(&survey(), &model).stats().unwrap();
        assert_eq!(stats.defined, 2);
        assert!((stats.max_abs - 0.03).abs() < 1e-12);
        assert!((stats.mean + 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_stats_none_when_all_undefined() {
        let model = DepthSeries::from_pairs("twt", [(10.0, 0.01)]).unwrap();
        assert!(drift_at_log_depths(&survey(), &model).stats().is_none());
    }
}
