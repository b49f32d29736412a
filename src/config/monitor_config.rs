//! Monitor Configuration - service endpoint, classification thresholds and
//! view defaults as operator-tunable TOML values
//!
//! Every struct implements `Default` with the built-in values, so a missing
//! file or a partial file behaves exactly like the stock deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::collection::{DEFAULT_PAGE_SIZE, ALL_LOCATIONS};
use crate::series::{WindowOptions, DEFAULT_LABEL_FORMAT};
use crate::types::{Parameter, ParameterThreshold, SortOrder, ThresholdRegistry};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SUNGAI_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sungai_watch.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one monitoring deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$SUNGAI_CONFIG` env var
/// 2. `./sungai_watch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Classification service connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Per-parameter classification bounds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub view: ViewConfig,

    /// Chart windowing
    #[serde(default)]
    pub series: SeriesConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SUNGAI_CONFIG` environment variable
    /// 2. `./sungai_watch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), base_url = %config.api.base_url, "Loaded monitor config from SUNGAI_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SUNGAI_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SUNGAI_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(base_url = %config.api.base_url, "Loaded monitor config from ./sungai_watch.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./sungai_watch.toml, using defaults");
                }
            }
        }

        info!("No sungai_watch.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Monitor config saved");
        Ok(())
    }

    /// Validate for internal consistency.
    ///
    /// Rules:
    /// - Threshold bounds must be finite with min <= max
    /// - Labels must be non-empty and distinct
    /// - Timeout, sample limit and page sizes must be > 0
    /// - The base URL must be http(s)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        for parameter in Parameter::ALL {
            let bounds = self.thresholds.get(parameter);
            Self::check_bounds(bounds.min, bounds.max, section_name(parameter), &mut errors);
            if bounds.label.trim().is_empty() {
                errors.push(format!("thresholds.{}.label must not be empty", section_name(parameter)));
            }
        }
        let labels: std::collections::HashSet<&str> = Parameter::ALL
            .into_iter()
            .map(|p| self.thresholds.get(p).label.as_str())
            .collect();
        if labels.len() != Parameter::ALL.len() {
            errors.push("thresholds: every parameter needs a distinct label".to_string());
        }

        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be > 0".to_string());
        }
        if self.api.sample_limit == 0 {
            errors.push("api.sample_limit must be > 0".to_string());
        }
        if self.view.page_size == 0 {
            errors.push("view.page_size must be > 0".to_string());
        }
        if self.series.window_size == 0 {
            errors.push("series.window_size must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_bounds(min: f64, max: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, so catch them explicitly
        if !min.is_finite() || !max.is_finite() {
            errors.push(format!(
                "thresholds.{name}: bounds must be finite (got min={min}, max={max})"
            ));
            return;
        }
        if min > max {
            errors.push(format!("thresholds.{name}: min ({min}) must be <= max ({max})"));
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn window_options(&self) -> WindowOptions {
        WindowOptions {
            order: if self.series.newest_first {
                SortOrder::NewestFirst
            } else {
                SortOrder::OldestFirst
            },
            label_format: self.series.label_format.clone(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Service Connection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the classification service, e.g. `http://host:3000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on every request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of combined samples requested for statistics
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_timeout_secs() -> u64 { 15 }
fn default_sample_limit() -> usize { 100 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            sample_limit: default_sample_limit(),
        }
    }
}

// ============================================================================
// Classification Thresholds
// ============================================================================

/// Inclusive classification bounds for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    pub min: f64,
    pub max: f64,
    /// Name reported in a record's anomaly types
    pub label: String,
}

/// Partial `[thresholds.<parameter>]` table; omitted keys keep the
/// parameter's built-in value.
#[derive(Deserialize)]
struct PartialBounds {
    min: Option<f64>,
    max: Option<f64>,
    label: Option<String>,
}

impl PartialBounds {
    fn over(self, base: ParameterBounds) -> ParameterBounds {
        ParameterBounds {
            min: self.min.unwrap_or(base.min),
            max: self.max.unwrap_or(base.max),
            label: self.label.unwrap_or(base.label),
        }
    }
}

/// Table name of a parameter under `[thresholds]`.
pub const fn section_name(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Turbidity => "turbidity",
        Parameter::Ph => "ph",
        Parameter::Temperature => "temperature",
    }
}

fn bounds_default(parameter: Parameter) -> ParameterBounds {
    let registry = ThresholdRegistry::default();
    let t = registry.get(parameter);
    ParameterBounds {
        min: t.min_inclusive.unwrap_or(f64::NEG_INFINITY),
        max: t.max_inclusive.unwrap_or(f64::INFINITY),
        label: t.label.clone(),
    }
}

fn deserialize_bounds<'de, D>(deserializer: D, parameter: Parameter) -> Result<ParameterBounds, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let partial = PartialBounds::deserialize(deserializer)?;
    Ok(partial.over(bounds_default(parameter)))
}

fn default_turbidity() -> ParameterBounds { bounds_default(Parameter::Turbidity) }
fn default_ph() -> ParameterBounds { bounds_default(Parameter::Ph) }
fn default_temperature() -> ParameterBounds { bounds_default(Parameter::Temperature) }

fn de_turbidity<'de, D: serde::Deserializer<'de>>(d: D) -> Result<ParameterBounds, D::Error> {
    deserialize_bounds(d, Parameter::Turbidity)
}
fn de_ph<'de, D: serde::Deserializer<'de>>(d: D) -> Result<ParameterBounds, D::Error> {
    deserialize_bounds(d, Parameter::Ph)
}
fn de_temperature<'de, D: serde::Deserializer<'de>>(d: D) -> Result<ParameterBounds, D::Error> {
    deserialize_bounds(d, Parameter::Temperature)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// NTU
    #[serde(default = "default_turbidity", deserialize_with = "de_turbidity")]
    pub turbidity: ParameterBounds,

    #[serde(default = "default_ph", deserialize_with = "de_ph")]
    pub ph: ParameterBounds,

    /// °C
    #[serde(default = "default_temperature", deserialize_with = "de_temperature")]
    pub temperature: ParameterBounds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            turbidity: default_turbidity(),
            ph: default_ph(),
            temperature: default_temperature(),
        }
    }
}

impl ThresholdConfig {
    pub const fn get(&self, parameter: Parameter) -> &ParameterBounds {
        match parameter {
            Parameter::Turbidity => &self.turbidity,
            Parameter::Ph => &self.ph,
            Parameter::Temperature => &self.temperature,
        }
    }

    /// Classification registry built from these bounds.
    pub fn to_registry(&self) -> ThresholdRegistry {
        let threshold = |p: Parameter| {
            let b = self.get(p);
            ParameterThreshold::new(p, Some(b.min), Some(b.max), &b.label)
        };
        ThresholdRegistry::new(
            threshold(Parameter::Turbidity),
            threshold(Parameter::Ph),
            threshold(Parameter::Temperature),
        )
    }
}

// ============================================================================
// View and Series
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Anomaly records per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Label of the "every location" selector entry
    #[serde(default = "default_all_locations_label")]
    pub all_locations_label: String,
}

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }
fn default_all_locations_label() -> String { ALL_LOCATIONS.to_string() }

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            all_locations_label: default_all_locations_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Samples per chart window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_newest_first")]
    pub newest_first: bool,

    /// chrono format for axis labels
    #[serde(default = "default_label_format")]
    pub label_format: String,
}

fn default_window_size() -> usize { 10 }
fn default_newest_first() -> bool { true }
fn default_label_format() -> String { DEFAULT_LABEL_FORMAT.to_string() }

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            newest_first: default_newest_first(),
            label_format: default_label_format(),
        }
    }
}
