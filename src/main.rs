//! TDCAL command line
//!
//! Loads the flat checkshot/sonic table, calibrates one well and prints a
//! human summary or the merged result as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # List wells in the table
//! tdcal --table data/checkshot_sonic_sample.csv --list-wells
//!
//! # Calibrate a well with a looser checkshot sigma
//! tdcal --table data/checkshot_sonic_sample.csv --well W-1 --sigma-checkshot 0.02
//!
//! # Full JSON output
//! tdcal --table data/checkshot_sonic_sample.csv --well W-1 --json
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tdcal::calibration::DriftCurve;
use tdcal::config::CalibrationConfig;
use tdcal::types::TimeConvention;
use tdcal::well::{calibrate_well, WellCalibration, WellOutcome, WellTable};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tdcal")]
#[command(about = "Bayesian calibration of sonic logs against checkshots")]
#[command(version)]
struct CliArgs {
    /// Flat checkshot/sonic CSV table
    #[arg(long, value_name = "CSV")]
    table: PathBuf,

    /// Well to calibrate (defaults to the first well in the table)
    #[arg(long, value_name = "UWI")]
    well: Option<String>,

    /// List the wells in the table and exit
    #[arg(long)]
    list_wells: bool,

    /// Config file (overrides TDCAL_CONFIG and ./calibration.toml)
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Prior travel-time sigma (s)
    #[arg(long, value_name = "S")]
    sigma_prior: Option<f64>,

    /// Checkshot travel-time sigma (s)
    #[arg(long, value_name = "S")]
    sigma_checkshot: Option<f64>,

    /// Sonic velocity sigma (m/s); replaces the prior time sigma
    #[arg(long, value_name = "V")]
    sonic_sigma: Option<f64>,

    /// Reference datum depth (m)
    #[arg(long, value_name = "Z")]
    datum_depth: Option<f64>,

    /// Velocity between datum and first log sample (m/s)
    #[arg(long, value_name = "V")]
    datum_velocity: Option<f64>,

    /// Treat picked times as one-way
    #[arg(long)]
    one_way: bool,

    /// Print the merged result as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "TDCAL_LOG_JSON")]
    log_json: bool,
}

impl CliArgs {
    /// Apply command line overrides on top of the loaded config.
    fn apply(&self, config: &mut CalibrationConfig) {
        let u = &mut config.uncertainty;
        if let Some(s) = self.sigma_prior {
            u.sigma_prior = s;
        }
        if let Some(s) = self.sigma_checkshot {
            u.sigma_checkshot = s;
        }
        if self.sonic_sigma.is_some() {
            u.sonic_velocity_sigma = self.sonic_sigma;
        }
        if let Some(z) = self.datum_depth {
            config.datum.depth = z;
        }
        if let Some(v) = self.datum_velocity {
            config.datum.velocity = v;
        }
        if self.one_way {
            config.integration.convention = TimeConvention::OneWay;
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    // Validated once, after the command line overrides
    let mut config = match args.config.clone().or_else(CalibrationConfig::search_path) {
        Some(path) => {
            info!(path = %path.display(), "Loading calibration config");
            CalibrationConfig::read_file(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => CalibrationConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid calibration settings")?;

    let table = WellTable::load(&args.table, &config.table)
        .with_context(|| format!("Failed to load table {}", args.table.display()))?;

    if args.list_wells {
        for uwi in table.wells() {
            println!("{uwi}");
        }
        return Ok(());
    }

    let uwi = match &args.well {
        Some(w) => w.clone(),
        None => table
            .wells()
            .first()
            .map(|w| (*w).to_string())
            .context("Table contains no wells")?,
    };
    info!(well = %uwi, convention = %config.integration.convention, "Calibrating");

    let outcome = calibrate_well(&table.select(&uwi), &config.settings());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        WellOutcome::Calibrated(cal) => {
            if !args.json {
                print_summary(&cal);
            }
            Ok(())
        }
        WellOutcome::NoData { uwi } => bail!("No sonic log for well {uwi}"),
        WellOutcome::Unavailable { uwi, error, .. } => {
            Err(anyhow::Error::new(error).context(format!("Calibration unavailable for well {uwi}")))
        }
    }
}

fn print_summary(cal: &WellCalibration) {
    println!("Well {} ({})", cal.uwi, cal.convention);
    println!(
        "  datum: {:.1} m @ {:.0} m/s   log samples: {}   control points: {}",
        cal.datum.depth,
        cal.datum.velocity,
        cal.samples.len(),
        cal.control_points.len()
    );

    println!();
    println!(
        "  {:>9} {:>9} {:>9} {:>9} {:>8} {:>19}",
        "depth", "observed", "prior", "posterior", "sigma", "95% interval"
    );
    for cp in &cal.control_points {
        let (lo, hi) = cp.credible_interval(0.95).unwrap_or((cp.posterior_time, cp.posterior_time));
        println!(
            "  {:>9.1} {:>9.4} {:>9.4} {:>9.4} {:>8.4}   [{lo:>7.4}, {hi:>7.4}]{}",
            cp.depth,
            cp.observed_time,
            cp.prior_time,
            cp.posterior_time,
            cp.sigma_posterior,
            if cp.extrapolated { "  *" } else { "" }
        );
    }

    println!();
    print_drift("prior drift at checkshots", &cal.drift.prior_at_checkshots);
    print_drift("posterior drift at checkshots", &cal.drift.posterior_at_checkshots);
    print_drift("prior drift along log", &cal.drift.prior_at_log);
    print_drift("posterior drift along log", &cal.drift.posterior_at_log);

    if !cal.warnings.is_empty() {
        println!();
        for w in &cal.warnings {
            println!("  warning: {w}");
        }
    }
}

fn print_drift(label: &str, curve: &DriftCurve) {
    match curve.stats() {
        Some(s) => println!(
            "  {label:<30} mean {:>8.2} ms   max |d| {:>7.2} ms   rms {:>7.2} ms   ({} pts)",
            s.mean * 1e3,
            s.max_abs * 1e3,
            s.rms * 1e3,
            s.defined
        ),
        None => println!("  {label:<30} undefined"),
    }
}
