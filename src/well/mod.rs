//! Well-level collaborators: flat table ingestion and the per-well pipeline

pub mod pipeline;
pub mod table;

pub use pipeline::{calibrate_well, EnvelopePoint, WellCalibration, WellOutcome, WellSample};
pub use table::{TableError, TableRow, WellSelection, WellTable};
