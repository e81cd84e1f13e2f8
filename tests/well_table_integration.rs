//! Well Table Integration Test
//!
//! Loads the sample checkshot/sonic table that ships with the repo and runs
//! every well through the calibration pipeline.

use std::path::PathBuf;
use tdcal::config::{CalibrationConfig, TableConfig};
use tdcal::error::{CalibrationError, CalibrationWarning};
use tdcal::well::{calibrate_well, WellOutcome, WellTable};

/// Path to the sample table that ships with the repo.
fn sample_csv_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/checkshot_sonic_sample.csv")
}

fn load_sample() -> WellTable {
    let csv_path = sample_csv_path();
    assert!(csv_path.exists(), "Sample CSV not found at {}", csv_path.display());
    WellTable::load(&csv_path, &TableConfig::default()).expect("Failed to load sample table")
}

#[test]
fn sample_table_lists_all_wells() {
    assert_eq!(load_sample().wells(), vec!["W-1", "W-2", "W-3"]);
}

#[test]
fn calibrated_well_exposes_merged_result() {
    let table = load_sample();
    let selection = table.select("W-1");
    assert_eq!(selection.sonic.len(), 57);

    let outcome = calibrate_well(&selection, &CalibrationConfig::default().settings());
    let cal = outcome.calibration().expect("W-1 should calibrate");

    assert_eq!(cal.samples.len(), 57);
    assert_eq!(cal.control_points.len(), 8);
    assert_eq!(cal.datum.velocity, 1480.0);
    assert_eq!(cal.checkshot_interval_velocity.len(), 7);

    // posterior travel time is a physical time-depth curve
    assert!(cal.samples.windows(2).all(|w| w[1].t_posterior > w[0].t_posterior));
    assert!(cal.samples.iter().all(|s| s.vp_posterior > 0.0));

    // one level without a pick, one checkshot below the log
    assert!(cal.warnings.contains(&CalibrationWarning::DroppedMissingTimes { count: 1 }));
    assert!(cal.warnings.contains(&CalibrationWarning::OutOfRangeExtrapolation {
        depth: 1600.0,
        nearest_log_depth: 1500.0,
    }));
}

#[test]
fn calibration_tightens_drift_on_sample_well() {
    let table = load_sample();
    let outcome = calibrate_well(&table.select("W-1"), &CalibrationConfig::default().settings());
    let drift = &outcome.calibration().expect("calibrated").drift;

    let prior = drift.prior_at_checkshots.stats().unwrap();
    let post = drift.posterior_at_checkshots.stats().unwrap();
    assert!(post.rms < prior.rms, "posterior rms {} >= prior rms {}", post.rms, prior.rms);

    // log-depth drift only exists inside checkshot coverage
    assert_eq!(drift.prior_at_log.points()[0].drift, None);
    assert!(drift.prior_at_log.defined().count() > 0);
}

#[test]
fn single_checkshot_well_is_unavailable_with_prior() {
    let table = load_sample();
    match calibrate_well(&table.select("W-2"), &CalibrationConfig::default().settings()) {
        WellOutcome::Unavailable { prior, error, .. } => {
            assert_eq!(prior.map(|p| p.time.len()), Some(13));
            assert_eq!(error, CalibrationError::InsufficientControlPoints { usable: 1, required: 2 });
        }
        other => panic!("expected unavailable outcome, got {other:?}"),
    }
}

#[test]
fn well_without_picks_is_unavailable_with_prior() {
    let table = load_sample();
    match calibrate_well(&table.select("W-3"), &CalibrationConfig::default().settings()) {
        WellOutcome::Unavailable { prior, error, .. } => {
            assert_eq!(prior.map(|p| p.time.len()), Some(3));
            assert_eq!(error, CalibrationError::InsufficientControlPoints { usable: 0, required: 2 });
        }
        other => panic!("expected unavailable outcome, got {other:?}"),
    }
}

#[test]
fn unknown_well_has_no_data() {
    let table = load_sample();
    assert!(matches!(
        calibrate_well(&table.select("W-9"), &CalibrationConfig::default().settings()),
        WellOutcome::NoData { .. }
    ));
}

#[test]
fn outcome_serializes_to_json() {
    let table = load_sample();
    let outcome = calibrate_well(&table.select("W-1"), &CalibrationConfig::default().settings());
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "calibrated");
    assert_eq!(json["samples"].as_array().map(Vec::len), Some(57));
    assert!(json["drift"]["posterior_at_log"]["points"].is_array());
}
