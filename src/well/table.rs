//! Flat checkshot/sonic table ingestion
//!
//! One CSV holds every well: each row carries a well id (`uwi`), a depth
//! (`tvd_ss`) and any of the checkshot pick (`twt picked`), the reported
//! checkshot velocities and the sonic velocity (`vp`). Missing cells are
//! kept as `None` per series so a row that only carries a sonic sample never
//! invents a checkshot, and vice versa.

use crate::config::TableConfig;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Table has no header line")]
    Empty,

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Line {line}: cannot parse {column} value '{value}'")]
    Parse {
        line: usize,
        column: &'static str,
        value: String,
    },
}

// ============================================================================
// CSV Parsing Helpers
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Column indices resolved from the header line.
#[derive(Debug, Clone, Default)]
struct ColumnMap {
    uwi: Option<usize>,
    depth: Option<usize>,
    twt: Option<usize>,
    average_velocity: Option<usize>,
    interval_velocity: Option<usize>,
    vp: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Self {
        let mut map = Self::default();
        for (idx, col) in csv_split(header).iter().enumerate() {
            let name = col.trim().trim_start_matches('\u{feff}').to_lowercase().replace('_', " ");
            match name.as_str() {
                "uwi" | "well" | "well id" => map.uwi = Some(idx),
                "tvd ss" | "tvdss" | "depth" => map.depth = Some(idx),
                "twt picked" | "twt" => map.twt = Some(idx),
                "average velocity" => map.average_velocity = Some(idx),
                "interval velocity" => map.interval_velocity = Some(idx),
                "vp" | "sonic" => map.vp = Some(idx),
                _ => {}
            }
        }
        map
    }

    fn validate(&self) -> Result<(), TableError> {
        let required = [
            (self.uwi, "uwi"),
            (self.depth, "tvd_ss"),
            (self.twt, "twt picked"),
            (self.vp, "vp"),
        ];
        match required.iter().find(|(idx, _)| idx.is_none()) {
            Some(&(_, name)) => Err(TableError::MissingColumn(name)),
            None => Ok(()),
        }
    }
}

/// Read an optional numeric cell. Blank, `nan` and the null sentinel are
/// missing; anything else must parse.
fn get_f64(
    fields: &[String],
    idx: Option<usize>,
    column: &'static str,
    line: usize,
    null_value: f64,
) -> Result<Option<f64>, TableError> {
    let Some(raw) = idx.and_then(|i| fields.get(i)) else {
        return Ok(None);
    };
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: f64 = s.parse().map_err(|_| TableError::Parse {
        line,
        column,
        value: s.to_string(),
    })?;
    if value.is_nan() || (value - null_value).abs() < 1e-9 {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

// ============================================================================
// Table
// ============================================================================

/// One row of the flat table. Times are already converted to seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub uwi: String,
    pub depth: f64,
    pub twt: Option<f64>,
    pub average_velocity: Option<f64>,
    pub interval_velocity: Option<f64>,
    pub vp: Option<f64>,
}

impl TableRow {
    /// Row describes a checkshot level (even if its pick is missing).
    fn is_checkshot(&self) -> bool {
        self.twt.is_some() || self.average_velocity.is_some() || self.interval_velocity.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct WellTable {
    rows: Vec<TableRow>,
    skipped: usize,
}

impl WellTable {
    /// Load a table from disk.
    pub fn load(path: impl AsRef<Path>, config: &TableConfig) -> Result<Self, TableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse_str(&contents, config)?;
        info!(
            file = %path.display(),
            rows = table.rows.len(),
            wells = table.wells().len(),
            skipped = table.skipped,
            "Well table loaded"
        );
        Ok(table)
    }

    /// Parse table text. Rows without a well id or depth are skipped.
    pub fn parse_str(contents: &str, config: &TableConfig) -> Result<Self, TableError> {
        let mut lines = contents.lines().enumerate();
        let (_, header) = lines.find(|(_, l)| !l.trim().is_empty()).ok_or(TableError::Empty)?;

        let cols = ColumnMap::from_header(header);
        cols.validate()?;

        let mut rows = Vec::new();
        let mut skipped = 0;
        for (i, line) in lines {
            let line_num = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields = csv_split(line);
            let null = config.null_value;

            let uwi = cols
                .uwi
                .and_then(|idx| fields.get(idx))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            let depth = get_f64(&fields, cols.depth, "tvd_ss", line_num, null)?;
            let Some(depth) = depth.filter(|_| !uwi.is_empty()) else {
                debug!(line = line_num, "Row without uwi or depth skipped");
                skipped += 1;
                continue;
            };

            rows.push(TableRow {
                uwi,
                depth,
                twt: get_f64(&fields, cols.twt, "twt picked", line_num, null)?.map(|t| t * config.time_scale),
                average_velocity: get_f64(&fields, cols.average_velocity, "average velocity", line_num, null)?,
                interval_velocity: get_f64(&fields, cols.interval_velocity, "interval velocity", line_num, null)?,
                vp: get_f64(&fields, cols.vp, "vp", line_num, null)?,
            });
        }

        Ok(Self { rows, skipped })
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Rows skipped for lacking a well id or depth.
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Distinct well ids in order of first appearance.
    pub fn wells(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.uwi.as_str())
            .filter(|uwi| seen.insert(*uwi))
            .collect()
    }

    /// Rows of one well split into its checkshot picks and sonic samples,
    /// each sorted by depth. An unknown well yields an empty selection.
    pub fn select(&self, uwi: &str) -> WellSelection {
        let mut picks: Vec<(f64, Option<f64>)> = Vec::new();
        let mut sonic: Vec<(f64, f64)> = Vec::new();
        for row in self.rows.iter().filter(|r| r.uwi == uwi) {
            if row.is_checkshot() {
                picks.push((row.depth, row.twt));
            }
            if let Some(vp) = row.vp {
                sonic.push((row.depth, vp));
            }
        }
        picks.sort_by(|a, b| a.0.total_cmp(&b.0));
        sonic.sort_by(|a, b| a.0.total_cmp(&b.0));

        WellSelection {
            uwi: uwi.to_string(),
            picks,
            sonic,
        }
    }
}

/// Data of a single well, ready for calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSelection {
    pub uwi: String,
    /// `(depth, time)` checkshot levels; a missing time is dropped later
    pub picks: Vec<(f64, Option<f64>)>,
    /// `(depth, vp)` sonic samples
    pub sonic: Vec<(f64, f64)>,
}

impl WellSelection {
    /// Nothing to calibrate: the well has no sonic log. Missing checkshots
    /// are a calibration failure, not an empty selection.
    pub fn is_empty(&self) -> bool {
        self.sonic.is_empty()
    }
}
