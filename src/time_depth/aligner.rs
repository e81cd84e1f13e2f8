//! Checkshot / log alignment
//!
//! Places checkshot depths on the log's depth grid so that quantities
//! computed from the log (travel time, velocity) can be compared with the
//! checkshot observations point by point.

use crate::error::{CalibrationError, CalibrationWarning};
use crate::types::{CheckshotPoint, DepthSeries};
use serde::Serialize;

/// Log-derived value evaluated at one checkshot depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedSample {
    /// Checkshot depth
    pub depth: f64,
    /// Log depth the value was taken from (the checkshot depth unless
    /// extrapolated, then the nearest log edge)
    pub matched_depth: f64,
    pub value: f64,
    /// Checkshot lies outside the log depth range
    pub extrapolated: bool,
}

/// Evaluate `log` at every checkshot depth.
///
/// Bracketing samples are found by binary search and linearly interpolated.
/// Points outside the log range take the nearest edge value and are flagged,
/// never dropped. Output order mirrors `points`.
pub fn align(points: &[CheckshotPoint], log: &DepthSeries) -> Result<Vec<AlignedSample>, CalibrationError> {
    points
        .iter()
        .map(|p| {
            let located = log.locate(p.depth).ok_or_else(|| {
                CalibrationError::input("log", p.depth, 0.0, "log series has no samples")
            })?;
            Ok(AlignedSample {
                depth: p.depth,
                matched_depth: located.matched_depth,
                value: located.value,
                extrapolated: located.extrapolated,
            })
        })
        .collect()
}

/// One `OutOfRangeExtrapolation` warning per extrapolated sample.
pub fn extrapolation_warnings(aligned: &[AlignedSample]) -> Vec<CalibrationWarning> {
    aligned
        .iter()
        .filter(|a| a.extrapolated)
        .map(|a| CalibrationWarning::OutOfRangeExtrapolation {
            depth: a.depth,
            nearest_log_depth: a.matched_depth,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> DepthSeries {
        DepthSeries::from_pairs("twt", [(0.0, 0.0), (100.0, 0.1), (250.0, 0.25)]).unwrap()
    }

    #[test]
    fn test_interpolates_inside_log() {
        let aligned = align(&[CheckshotPoint::new(175.0, 0.2)], &log()).unwrap();
        assert_eq!(aligned.len(), 1);
        assert!((aligned[0].value - 0.175).abs() < 1e-12);
        assert!(!aligned[0].extrapolated);
        assert_eq!(aligned[0].matched_depth, 175.0);
    }

    #[test]
    fn test_flags_points_below_log() {
        let points = [CheckshotPoint::new(100.0, 0.12), CheckshotPoint::new(400.0, 0.41)];
        let aligned = align(&points, &log()).unwrap();
        assert_eq!(aligned.len(), 2, "extrapolated points must not be dropped");
        assert!(aligned[1].extrapolated);
        assert_eq!(aligned[1].value, 0.25);
        assert_eq!(aligned[1].matched_depth, 250.0);

        let warnings = extrapolation_warnings(&aligned);
        assert_eq!(
            warnings,
            vec![CalibrationWarning::OutOfRangeExtrapolation {
                depth: 400.0,
                nearest_log_depth: 250.0
            }]
        );
    }

    #[test]
    fn test_preserves_input_order() {
        let points = [
            CheckshotPoint::new(200.0, 0.2),
            CheckshotPoint::new(50.0, 0.05),
            CheckshotPoint::new(120.0, 0.12),
        ];
        let aligned = align(&points, &log()).unwrap();
        let depths: Vec<f64> = aligned.iter().map(|a| a.depth).collect();
        assert_eq!(depths, vec![200.0, 50.0, 120.0]);
    }

    #[test]
    fn test_empty_log_is_an_error() {
        let empty = DepthSeries::from_pairs("twt", Vec::<(f64, f64)>::new()).unwrap();
        assert!(align(&[CheckshotPoint::new(10.0, 0.01)], &empty).is_err());
    }
}
