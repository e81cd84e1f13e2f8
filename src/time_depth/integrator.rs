//! Velocity <-> travel time conversion
//!
//! Each interval `[z(i-1), z(i)]` is assigned the velocity recorded at its
//! lower sample, so `differentiate` is the exact inverse of `integrate`.
//! The interval between the reference datum and the first sample uses the
//! datum velocity.

use crate::error::CalibrationError;
use crate::types::{CheckshotSurvey, DepthSeries, ReferenceDatum, TimeConvention};
use tracing::debug;

/// Integrate a velocity log into a travel-time curve.
///
/// Time is zero at `datum.depth`. The result has the same depth grid as the
/// input and is non-decreasing with depth.
///
/// ## Errors
/// - `InvalidVelocity` for any zero, negative or non-finite velocity sample
/// - `InvalidInput` when the first sample lies above the datum
pub fn integrate(
    velocity: &DepthSeries,
    datum: &ReferenceDatum,
    convention: TimeConvention,
) -> Result<DepthSeries, CalibrationError> {
    datum.check()?;
    let k = convention.factor();
    let depths = velocity.depths();

    let Some(&first) = depths.first() else {
        return Ok(DepthSeries::on_grid(depths, Vec::new()));
    };
    if first < datum.depth {
        return Err(CalibrationError::input(
            "depth",
            first,
            first,
            "log sample above reference datum",
        ));
    }

    let mut times = Vec::with_capacity(depths.len());
    let mut t = k * (first - datum.depth) / datum.velocity;
    for (i, (z, v)) in velocity.iter().enumerate() {
        if !v.is_finite() || v <= 0.0 {
            return Err(CalibrationError::InvalidVelocity { depth: z, value: v });
        }
        if i > 0 {
            t += k * (z - depths[i - 1]) / v;
        }
        times.push(t);
    }

    Ok(DepthSeries::on_grid(depths, times))
}

/// Recover interval velocity from a travel-time curve.
///
/// `v(i) = k * dz / dt` for every sample below the first. The first sample
/// gets the average velocity between the datum and itself, or the velocity
/// of the next interval when it sits on the datum.
///
/// ## Errors
/// - `NonPhysicalPosterior` when time fails to increase between samples
pub fn differentiate(
    time: &DepthSeries,
    datum: &ReferenceDatum,
    convention: TimeConvention,
) -> Result<DepthSeries, CalibrationError> {
    datum.check()?;
    let k = convention.factor();
    let depths = time.depths();
    let times = time.values();

    if depths.is_empty() {
        return Ok(DepthSeries::on_grid(depths, Vec::new()));
    }

    let mut velocities = Vec::with_capacity(depths.len());
    for i in 1..depths.len() {
        let dt = times[i] - times[i - 1];
        if dt.is_nan() || dt <= 0.0 {
            return Err(CalibrationError::NonPhysicalPosterior { depth: depths[i] });
        }
        velocities.push(k * (depths[i] - depths[i - 1]) / dt);
    }

    let top = depths[0] - datum.depth;
    let first = if top > 0.0 {
        if times[0].is_nan() || times[0] <= 0.0 {
            return Err(CalibrationError::NonPhysicalPosterior { depth: depths[0] });
        }
        k * top / times[0]
    } else {
        velocities.first().copied().unwrap_or(datum.velocity)
    };
    velocities.insert(0, first);

    Ok(DepthSeries::on_grid(depths, velocities))
}

/// Interval velocity between consecutive checkshots.
///
/// The shallowest point has no interval above it and is omitted, as is any
/// pair whose time does not increase.
pub fn interval_velocity(survey: &CheckshotSurvey, convention: TimeConvention) -> DepthSeries {
    let k = convention.factor();
    let points = survey.points();
    let mut depths = Vec::with_capacity(points.len());
    let mut velocities = Vec::with_capacity(points.len());

    for pair in points.windows(2) {
        let dt = pair[1].time - pair[0].time;
        if dt > 0.0 {
            depths.push(pair[1].depth);
            velocities.push(k * (pair[1].depth - pair[0].depth) / dt);
        }
    }

    let skipped = points.len().saturating_sub(1) - depths.len();
    if skipped > 0 {
        debug!(skipped, "Checkshot intervals without increasing time skipped");
    }

    DepthSeries::on_grid(&depths, velocities)
}
