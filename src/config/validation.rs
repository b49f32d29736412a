//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks on parsed values.
//!
//! The raw TOML is first walked as a `toml::Value` tree and every key is
//! compared against the known field names; typos produce warnings with a
//! "did you mean?" suggestion. Normal serde deserialization follows.
//! Warnings never break an existing config.

use std::collections::HashSet;

use chrono::format::{Item, StrftimeItems};

use crate::types::{InputLimits, Parameter};

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

/// Every valid dotted key path of `MonitorConfig`.
///
/// Kept by hand in step with monitor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [api]
        "api",
        "api.base_url",
        "api.timeout_secs",
        "api.sample_limit",
        // [thresholds]
        "thresholds",
        "thresholds.turbidity",
        "thresholds.turbidity.min",
        "thresholds.turbidity.max",
        "thresholds.turbidity.label",
        "thresholds.ph",
        "thresholds.ph.min",
        "thresholds.ph.max",
        "thresholds.ph.label",
        "thresholds.temperature",
        "thresholds.temperature.min",
        "thresholds.temperature.max",
        "thresholds.temperature.label",
        // [view]
        "view",
        "view.page_size",
        "view.all_locations_label",
        // [series]
        "series",
        "series.window_size",
        "series.newest_first",
        "series.label_format",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect all dotted key paths of a `toml::Value` tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
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

/// Closest known key within edit distance 3, if any.
///
/// Ties go to the lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every unknown key in a raw TOML string.
///
/// Parse errors are left to the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
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
// Range Validation
// ============================================================================

/// Plausibility checks on a parsed `MonitorConfig`.
///
/// Returns (errors, warnings): errors must prevent startup, warnings are
/// suspicious but accepted.
pub fn validate_ranges(config: &super::MonitorConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let base = config.api.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        errors.push(format!(
            "api.base_url = '{}' must start with http:// or https://",
            config.api.base_url
        ));
    }

    // Bounds outside what an operator could ever enter can never be reached
    // by a corrected sample
    let limits = InputLimits::default();
    for parameter in Parameter::ALL {
        let section = super::section_name(parameter);
        let bounds = config.thresholds.get(parameter);
        let (lo, hi) = limits.bounds(parameter);
        if bounds.max < lo || bounds.min > hi {
            warnings.push(ValidationWarning {
                field: format!("thresholds.{section}"),
                message: format!(
                    "thresholds.{section} = [{}, {}] lies entirely outside the input range [{lo}, {hi}]",
                    bounds.min, bounds.max
                ),
                suggestion: None,
            });
        }
    }

    if config.api.timeout_secs > 300 {
        warnings.push(ValidationWarning {
            field: "api.timeout_secs".to_string(),
            message: format!(
                "api.timeout_secs = {} is unusually long (over 5 minutes)",
                config.api.timeout_secs
            ),
            suggestion: None,
        });
    }

    let label_format = &config.series.label_format;
    if label_format.trim().is_empty() {
        errors.push("series.label_format must not be empty".to_string());
    } else if StrftimeItems::new(label_format).any(|item| matches!(item, Item::Error)) {
        errors.push(format!(
            "series.label_format = '{label_format}' is not a valid strftime format"
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
