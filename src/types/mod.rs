//! Shared data structures for time-depth calibration
//!
//! - `DepthSeries`: depth-indexed samples (sonic velocity, travel time)
//! - `CheckshotSurvey`: depth-ordered travel-time observations
//! - `ReferenceDatum` / `TimeConvention`: boundary condition and time basis

mod checkshot;
mod series;

pub use checkshot::*;
pub use series::*;
