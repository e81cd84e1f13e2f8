//! Depth-indexed series and the reference datum

use crate::error::CalibrationError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Time Convention
// ============================================================================

/// Whether travel times are one-way (datum to depth) or two-way (round trip).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeConvention {
    OneWay,
    #[default]
    TwoWay,
}

impl TimeConvention {
    /// Multiplier applied to the one-way slowness integral.
    pub const fn factor(self) -> f64 {
        match self {
            Self::OneWay => 1.0,
            Self::TwoWay => 2.0,
        }
    }
}

impl std::fmt::Display for TimeConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneWay => write!(f, "OWT"),
            Self::TwoWay => write!(f, "TWT"),
        }
    }
}

// ============================================================================
// Reference Datum
// ============================================================================

/// Level at which travel time is zero, and the velocity assumed between it
/// and the first log sample (sea level and water velocity offshore).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDatum {
    /// Datum depth (m, same reference as the log depths)
    pub depth: f64,
    /// Velocity above the first log sample (m/s)
    pub velocity: f64,
}

impl ReferenceDatum {
    pub const fn new(depth: f64, velocity: f64) -> Self {
        Self { depth, velocity }
    }

    pub(crate) fn check(&self) -> Result<(), CalibrationError> {
        if !self.depth.is_finite() {
            return Err(CalibrationError::input(
                "datum depth",
                self.depth,
                self.depth,
                "non-finite datum depth",
            ));
        }
        if !self.velocity.is_finite() || self.velocity <= 0.0 {
            return Err(CalibrationError::InvalidVelocity {
                depth: self.depth,
                value: self.velocity,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Depth Series
// ============================================================================

/// Value of a series evaluated at an arbitrary depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub value: f64,
    /// Depth the value was taken from: the query depth when bracketed,
    /// otherwise the nearest edge sample.
    pub matched_depth: f64,
    pub extrapolated: bool,
}

/// Ordered `(depth, value)` samples with strictly increasing depth.
///
/// Construction validates the ordering and rejects non-finite samples.
/// Every transform in this crate returns a new series; none mutates its
/// input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthSeries {
    depths: Vec<f64>,
    values: Vec<f64>,
}

impl DepthSeries {
    /// Build a series from `(depth, value)` pairs.
    ///
    /// `field` names the quantity in error messages ("vp", "twt", ...).
    pub fn from_pairs<I>(field: &'static str, pairs: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (depths, values): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        for (i, (&depth, &value)) in depths.iter().zip(&values).enumerate() {
            if !depth.is_finite() {
                return Err(CalibrationError::input("depth", depth, depth, "non-finite depth"));
            }
            if !value.is_finite() {
                return Err(CalibrationError::input(field, depth, value, "non-finite sample"));
            }
            if i > 0 && depth <= depths[i - 1] {
                return Err(CalibrationError::input(
                    "depth",
                    depth,
                    depth,
                    "depths must be strictly increasing",
                ));
            }
        }
        Ok(Self { depths, values })
    }

    /// Build a series from pairs with possibly missing values.
    ///
    /// Missing samples are dropped, never coerced to zero. Present but
    /// non-finite samples are still rejected.
    pub fn from_optional<I>(field: &'static str, pairs: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = (f64, Option<f64>)>,
    {
        Self::from_pairs(
            field,
            pairs
                .into_iter()
                .filter_map(|(depth, value)| value.map(|v| (depth, v))),
        )
    }

    /// Build a sonic velocity log from `(depth, vp)` pairs.
    ///
    /// A non-finite velocity is an `InvalidVelocity`, the same error
    /// integration reports for a non-positive one.
    pub fn from_velocity_pairs<I>(pairs: I) -> Result<Self, CalibrationError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
        if let Some(&(depth, value)) = pairs.iter().find(|(z, v)| z.is_finite() && !v.is_finite()) {
            return Err(CalibrationError::InvalidVelocity { depth, value });
        }
        Self::from_pairs("vp", pairs)
    }

    /// Series on an already validated depth grid.
    pub(crate) fn on_grid(depths: &[f64], values: Vec<f64>) -> Self {
        debug_assert_eq!(depths.len(), values.len());
        Self {
            depths: depths.to_vec(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.depths.iter().copied().zip(self.values.iter().copied())
    }

    /// Shallowest and deepest sample depth.
    pub fn depth_range(&self) -> Option<(f64, f64)> {
        Some((*self.depths.first()?, *self.depths.last()?))
    }

    /// Evaluate the series at `depth` by linear interpolation between the
    /// bracketing samples. Outside the covered range the nearest edge value
    /// is returned and flagged as extrapolated.
    pub fn locate(&self, depth: f64) -> Option<Located> {
        let last = self.depths.len().checked_sub(1)?;
        let idx = self.depths.partition_point(|&d| d < depth);

        if idx > last {
            return Some(Located {
                value: self.values[last],
                matched_depth: self.depths[last],
                extrapolated: true,
            });
        }
        if self.depths[idx] == depth {
            return Some(Located {
                value: self.values[idx],
                matched_depth: depth,
                extrapolated: false,
            });
        }
        if idx == 0 {
            return Some(Located {
                value: self.values[0],
                matched_depth: self.depths[0],
                extrapolated: true,
            });
        }

        let (z0, z1) = (self.depths[idx - 1], self.depths[idx]);
        let (v0, v1) = (self.values[idx - 1], self.values[idx]);
        let frac = (depth - z0) / (z1 - z0);
        Some(Located {
            value: v0 + (v1 - v0) * frac,
            matched_depth: depth,
            extrapolated: false,
        })
    }

    /// Interpolated value, `None` outside the covered depth range.
    pub fn value_within(&self, depth: f64) -> Option<f64> {
        self.locate(depth)
            .filter(|l| !l.extrapolated)
            .map(|l| l.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> DepthSeries {
        DepthSeries::from_pairs("twt", [(100.0, 0.1), (200.0, 0.3), (400.0, 0.5)]).unwrap()
    }

    #[test]
    fn test_rejects_unordered_depths() {
        let err = DepthSeries::from_pairs("vp", [(10.0, 1.0), (10.0, 2.0)]).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidInput { field: "depth", .. }));
    }

    #[test]
    fn test_rejects_nan_value() {
        let err = DepthSeries::from_pairs("vp", [(10.0, f64::NAN)]).unwrap_err();
        match err {
            CalibrationError::InvalidInput { field, depth, .. } => {
                assert_eq!(field, "vp");
                assert_eq!(depth, 10.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_velocity_is_invalid_velocity() {
        let err = DepthSeries::from_velocity_pairs([(10.0, 1500.0), (20.0, f64::INFINITY)]).unwrap_err();
        assert_eq!(
            err,
            CalibrationError::InvalidVelocity {
                depth: 20.0,
                value: f64::INFINITY
            }
        );
        assert!(DepthSeries::from_velocity_pairs([(10.0, 1500.0), (20.0, 1600.0)]).is_ok());
    }

    #[test]
    fn test_from_optional_drops_missing() {
        let s = DepthSeries::from_optional("vp", [(1.0, Some(1500.0)), (2.0, None), (3.0, Some(1600.0))])
            .unwrap();
        assert_eq!(s.depths(), &[1.0, 3.0]);
        assert_eq!(s.values(), &[1500.0, 1600.0]);
    }

    #[test]
    fn test_locate_interpolates_between_samples() {
        let l = series().locate(300.0).unwrap();
        assert!((l.value - 0.4).abs() < 1e-12);
        assert!(!l.extrapolated);
        assert_eq!(l.matched_depth, 300.0);
    }

    #[test]
    fn test_locate_exact_sample() {
        let l = series().locate(200.0).unwrap();
        assert_eq!(l.value, 0.3);
        assert!(!l.extrapolated);
    }

    #[test]
    fn test_locate_extrapolates_to_edges() {
        let below = series().locate(900.0).unwrap();
        assert!(below.extrapolated);
        assert_eq!(below.value, 0.5);
        assert_eq!(below.matched_depth, 400.0);

        let above = series().locate(50.0).unwrap();
        assert!(above.extrapolated);
        assert_eq!(above.value, 0.1);
        assert_eq!(above.matched_depth, 100.0);
    }

    #[test]
    fn test_value_within_is_none_outside_coverage() {
        assert!(series().value_within(450.0).is_none());
        assert!(series().value_within(150.0).is_some());
    }

    #[test]
    fn test_locate_empty_series() {
        let s = DepthSeries::from_pairs("twt", Vec::<(f64, f64)>::new()).unwrap();
        assert!(s.locate(1.0).is_none());
    }

    #[test]
    fn test_convention_factor() {
        assert_eq!(TimeConvention::OneWay.factor(), 1.0);
        assert_eq!(TimeConvention::TwoWay.factor(), 2.0);
        assert_eq!(TimeConvention::default(), TimeConvention::TwoWay);
    }
}
