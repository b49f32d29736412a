//! Classification thresholds, operator-facing display ranges and
//! correction input limits.
//!
//! Three independent range tables live here and are deliberately kept apart:
//!
//! - [`ThresholdRegistry`] decides whether a reading is anomalous.
//! - [`DisplayRange`] is the "normal range" text shown to the operator. It
//!   overlaps but does not match the classification bounds (turbidity shows
//!   `-1 < x ≤ 25` while classifying against `[-1, 200]`).
//! - [`InputLimits`] bounds what an operator may type into a correction.

use serde::{Deserialize, Serialize};

use super::Parameter;

/// Version of the built-in threshold table.
pub const REGISTRY_VERSION: u32 = 1;

/// Inclusive valid range for one parameter. `None` is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterThreshold {
    pub parameter: Parameter,
    pub min_inclusive: Option<f64>,
    pub max_inclusive: Option<f64>,
    /// Label reported in `anomaly_types`
    pub label: String,
}

impl ParameterThreshold {
    pub fn new(parameter: Parameter, min: Option<f64>, max: Option<f64>, label: &str) -> Self {
        Self {
            parameter,
            min_inclusive: min,
            max_inclusive: max,
            label: label.to_string(),
        }
    }

    pub fn is_below(&self, value: f64) -> bool {
        self.min_inclusive.is_some_and(|min| value < min)
    }

    pub fn is_above(&self, value: f64) -> bool {
        self.max_inclusive.is_some_and(|max| value > max)
    }
}

/// Static lookup table of classification thresholds, one per parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRegistry {
    pub version: u32,
    turbidity: ParameterThreshold,
    ph: ParameterThreshold,
    temperature: ParameterThreshold,
}

impl ThresholdRegistry {
    pub fn new(
        turbidity: ParameterThreshold,
        ph: ParameterThreshold,
        temperature: ParameterThreshold,
    ) -> Self {
        Self {
            version: REGISTRY_VERSION,
            turbidity,
            ph,
            temperature,
        }
    }

    pub const fn get(&self, parameter: Parameter) -> &ParameterThreshold {
        match parameter {
            Parameter::Turbidity => &self.turbidity,
            Parameter::Ph => &self.ph,
            Parameter::Temperature => &self.temperature,
        }
    }

    pub fn label(&self, parameter: Parameter) -> &str {
        &self.get(parameter).label
    }

    /// Parameter whose label matches `label` exactly.
    pub fn parameter_for_label(&self, label: &str) -> Option<Parameter> {
        Parameter::ALL
            .into_iter()
            .find(|p| self.get(*p).label == label)
    }
}

impl Default for ThresholdRegistry {
    fn default() -> Self {
        Self::new(
            ParameterThreshold::new(Parameter::Turbidity, Some(-1.0), Some(200.0), "Turbidity"),
            ParameterThreshold::new(Parameter::Ph, Some(6.0), Some(9.0), "pH"),
            ParameterThreshold::new(Parameter::Temperature, Some(10.0), Some(35.0), "Temperature"),
        )
    }
}

// ============================================================================
// Display ranges
// ============================================================================

/// Operator-facing "normal range" description. Never used to classify.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayRange {
    pub parameter: Parameter,
    pub lower: f64,
    pub lower_inclusive: bool,
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl DisplayRange {
    pub const fn for_parameter(parameter: Parameter) -> Self {
        match parameter {
            Parameter::Turbidity => Self {
                parameter,
                lower: -1.0,
                lower_inclusive: false,
                upper: 25.0,
                upper_inclusive: true,
            },
            Parameter::Ph => Self {
                parameter,
                lower: 6.0,
                lower_inclusive: true,
                upper: 9.0,
                upper_inclusive: true,
            },
            Parameter::Temperature => Self {
                parameter,
                lower: 10.0,
                lower_inclusive: true,
                upper: 35.0,
                upper_inclusive: true,
            },
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_lower = if self.lower_inclusive {
            value >= self.lower
        } else {
            value > self.lower
        };
        let below_upper = if self.upper_inclusive {
            value <= self.upper
        } else {
            value < self.upper
        };
        above_lower && below_upper
    }

    /// Range text such as `-1 < x ≤ 25 NTU`.
    pub fn text(&self) -> String {
        let lo = if self.lower_inclusive { "≤" } else { "<" };
        let hi = if self.upper_inclusive { "≤" } else { "<" };
        let unit = self.parameter.unit();
        let base = format!("{} {lo} x {hi} {}", self.lower, self.upper);
        if unit.is_empty() {
            base
        } else {
            format!("{base} {unit}")
        }
    }
}

// ============================================================================
// Correction input limits
// ============================================================================

/// Inclusive bounds an operator-entered correction must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputLimits {
    pub ph: (f64, f64),
    pub temperature: (f64, f64),
    pub turbidity: (f64, f64),
}

impl InputLimits {
    pub const fn bounds(&self, parameter: Parameter) -> (f64, f64) {
        match parameter {
            Parameter::Turbidity => self.turbidity,
            Parameter::Ph => self.ph,
            Parameter::Temperature => self.temperature,
        }
    }
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            ph: (0.0, 14.0),
            temperature: (-50.0, 100.0),
            turbidity: (0.0, 1000.0),
        }
    }
}
