//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for CalibrationConfig.
///
/// Maintained by hand to match the struct hierarchy in calibration_config.rs.
/// Any new field added there must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [uncertainty]
        "uncertainty",
        "uncertainty.sigma_prior",
        "uncertainty.sigma_checkshot",
        "uncertainty.sonic_velocity_sigma",
        "uncertainty.extrapolation_sigma_scale",
        // [datum]
        "datum",
        "datum.depth",
        "datum.velocity",
        "datum.water_depth",
        "datum.water_velocity",
        // [integration]
        "integration",
        "integration.convention",
        // [table]
        "table",
        "table.time_scale",
        "table.null_value",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed CalibrationConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent a run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::CalibrationConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Datum velocity: 300 m/s (air) to 7000 m/s (fast carbonates/salt)
    let v = config.datum.velocity;
    if v.is_finite() && !(300.0..=7000.0).contains(&v) {
        errors.push(format!(
            "datum.velocity = {v:.1} is outside physical range (300-7000 m/s)"
        ));
    }

    let u = &config.uncertainty;

    // Checkshot picks: 1-100 ms is the plausible sigma range
    let sc = u.sigma_checkshot;
    if sc > 0.0 && !(0.001..=0.1).contains(&sc) {
        warnings.push(ValidationWarning {
            field: "uncertainty.sigma_checkshot".to_string(),
            message: format!("sigma_checkshot = {sc} s is outside typical range (0.001-0.1 s)"),
            suggestion: None,
        });
    }

    // Prior time sigma above 100 ms effectively ignores the sonic log
    if u.sigma_prior > 0.1 {
        warnings.push(ValidationWarning {
            field: "uncertainty.sigma_prior".to_string(),
            message: format!("sigma_prior = {} s is unusually large (> 0.1 s)", u.sigma_prior),
            suggestion: None,
        });
    }

    // Sonic velocity sigma: 50-2000 m/s
    if let Some(sv) = u.sonic_velocity_sigma {
        if sv > 0.0 && !(50.0..=2000.0).contains(&sv) {
            warnings.push(ValidationWarning {
                field: "uncertainty.sonic_velocity_sigma".to_string(),
                message: format!("sonic_velocity_sigma = {sv:.1} m/s is outside typical range (50-2000 m/s)"),
                suggestion: None,
            });
        }
    }

    // Picked times are in seconds or milliseconds
    let ts = config.table.time_scale;
    if ts > 0.0 && ts != 1.0 && ts != 0.001 {
        warnings.push(ValidationWarning {
            field: "table.time_scale".to_string(),
            message: format!("time_scale = {ts} is neither 1 (seconds) nor 0.001 (milliseconds)"),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalibrationConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("datum", "datum"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("chekshot", "checkshot"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [uncertainty]
            sigma_prior = 0.01
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"uncertainty".to_string()));
        assert!(keys.contains(&"uncertainty.sigma_prior".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[uncertainty]
sigma_chekshot = 0.01
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("sigma_chekshot"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("uncertainty.sigma_checkshot")
        );
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_physical_range_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&CalibrationConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {errors:?}");
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {warnings:?}");
    }

    #[test]
    fn test_physical_range_datum_velocity_impossible() {
        let mut config = CalibrationConfig::default();
        config.datum.velocity = 25_000.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("datum.velocity")));
    }

    #[test]
    fn test_physical_range_checkshot_sigma_suspicious() {
        let mut config = CalibrationConfig::default();
        config.uncertainty.sigma_checkshot = 0.5;
        let (_, warnings) = validate_physical_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "uncertainty.sigma_checkshot"));
    }
}
