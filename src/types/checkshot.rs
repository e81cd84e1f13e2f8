//! Checkshot control points

use super::series::DepthSeries;
use crate::error::CalibrationError;
use serde::{Deserialize, Serialize};

/// One noisy observation of travel time at a depth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CheckshotPoint {
    /// Depth (m)
    pub depth: f64,
    /// Picked travel time (s)
    pub time: f64,
    /// Per-point standard deviation (s); the global checkshot sigma applies
    /// when absent
    pub sigma: Option<f64>,
}

impl CheckshotPoint {
    pub const fn new(depth: f64, time: f64) -> Self {
        Self {
            depth,
            time,
            sigma: None,
        }
    }

    pub const fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }
}

/// Depth-ordered checkshot survey of a single well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckshotSurvey {
    points: Vec<CheckshotPoint>,
    dropped_missing: usize,
}

impl CheckshotSurvey {
    /// Validate and wrap already complete points.
    ///
    /// Depths must be strictly increasing; depth and time must be finite,
    /// time non-negative; a per-point sigma must be finite and non-negative.
    pub fn new(points: Vec<CheckshotPoint>) -> Result<Self, CalibrationError> {
        for (i, p) in points.iter().enumerate() {
            if !p.depth.is_finite() {
                return Err(CalibrationError::input("checkshot depth", p.depth, p.depth, "non-finite depth"));
            }
            if !p.time.is_finite() {
                return Err(CalibrationError::input("checkshot time", p.depth, p.time, "non-finite time"));
            }
            if p.time < 0.0 {
                return Err(CalibrationError::input("checkshot time", p.depth, p.time, "negative travel time"));
            }
            if let Some(sigma) = p.sigma {
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(CalibrationError::InvalidUncertainty {
                        name: "checkshot sigma",
                        value: sigma,
                    });
                }
            }
            if i > 0 && p.depth <= points[i - 1].depth {
                return Err(CalibrationError::input(
                    "checkshot depth",
                    p.depth,
                    p.depth,
                    "depths must be strictly increasing",
                ));
            }
        }
        Ok(Self {
            points,
            dropped_missing: 0,
        })
    }

    /// Build from raw `(depth, time, sigma)` picks, dropping rows whose time
    /// is missing. The number of dropped rows is kept for reporting.
    pub fn from_picks<I>(picks: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = (f64, Option<f64>, Option<f64>)>,
    {
        let mut dropped = 0;
        let points = picks
            .into_iter()
            .filter_map(|(depth, time, sigma)| match time {
                Some(time) => Some(CheckshotPoint { depth, time, sigma }),
                None => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        let mut survey = Self::new(points)?;
        survey.dropped_missing = dropped;
        Ok(survey)
    }

    pub fn points(&self) -> &[CheckshotPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows dropped at construction because their time was missing.
    pub const fn dropped_missing(&self) -> usize {
        self.dropped_missing
    }

    /// The survey as a time-depth series.
    pub fn time_series(&self) -> DepthSeries {
        let depths: Vec<f64> = self.points.iter().map(|p| p.depth).collect();
        let times = self.points.iter().map(|p| p.time).collect();
        DepthSeries::on_grid(&depths, times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_picks_drops_missing_times() {
        let survey = CheckshotSurvey::from_picks([
            (100.0, Some(0.1), None),
            (200.0, None, None),
            (300.0, Some(0.3), Some(0.004)),
        ])
        .unwrap();
        assert_eq!(survey.len(), 2);
        assert_eq!(survey.dropped_missing(), 1);
        assert_eq!(survey.points()[1].sigma, Some(0.004));
    }

    #[test]
    fn test_rejects_out_of_order_depths() {
        let err = CheckshotSurvey::new(vec![
            CheckshotPoint::new(300.0, 0.3),
            CheckshotPoint::new(200.0, 0.2),
        ])
        .unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput { depth, .. } if depth == 200.0));
    }

    #[test]
    fn test_rejects_non_finite_time() {
        let err = CheckshotSurvey::new(vec![CheckshotPoint::new(100.0, f64::INFINITY)]).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput { field: "checkshot time", .. }));
    }

    #[test]
    fn test_rejects_negative_sigma() {
        let err = CheckshotSurvey::new(vec![CheckshotPoint::new(100.0, 0.1).with_sigma(-0.01)]).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidUncertainty { .. }));
    }

    #[test]
    fn test_time_series_mirrors_points() {
        let survey = CheckshotSurvey::new(vec![
            CheckshotPoint::new(100.0, 0.1),
            CheckshotPoint::new(250.0, 0.2),
        ])
        .unwrap();
        let ts = survey.time_series();
        assert_eq!(ts.depths(), &[100.0, 250.0]);
        assert_eq!(ts.values(), &[0.1, 0.2]);
    }
}
