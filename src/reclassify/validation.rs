//! Operator input validation for corrections

use crate::types::{CorrectionValues, InputLimits, Parameter};

/// One rejected correction field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub parameter: Parameter,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_finite() {
            write!(
                f,
                "{} = {} is outside [{}, {}]",
                self.parameter, self.value, self.min, self.max
            )
        } else {
            write!(f, "{} must be a finite number", self.parameter)
        }
    }
}

/// Malformed or out-of-range operator input, caught before any I/O.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid correction: {}", join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check every field, reporting all violations at once.
pub fn validate_correction(
    values: &CorrectionValues,
    limits: &InputLimits,
) -> Result<(), ValidationError> {
    let issues: Vec<FieldIssue> = [Parameter::Ph, Parameter::Temperature, Parameter::Turbidity]
        .into_iter()
        .filter_map(|parameter| {
            let value = values.get(parameter);
            let (min, max) = limits.bounds(parameter);
            // NaN fails the range check too
            (!(min..=max).contains(&value)).then_some(FieldIssue {
                parameter,
                value,
                min,
                max,
            })
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}
