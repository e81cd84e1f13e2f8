//! Time-Depth Module
//!
//! Deterministic conversions between velocity-depth and time-depth curves.
//! Everything here is a pure function of its arguments.
//!
//! - `integrate()` - cumulative travel time from a velocity log
//! - `differentiate()` - interval velocity recovered from a time curve
//! - `interval_velocity()` - checkshot interval velocities
//! - `align()` - evaluate a log-derived curve at checkshot depths

pub mod aligner;
pub mod integrator;

pub use aligner::{align, extrapolation_warnings, AlignedSample};
pub use integrator::{differentiate, integrate, interval_velocity};
