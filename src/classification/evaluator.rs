//! Per-parameter threshold evaluation

use crate::types::{
    Coerced, Parameter, ParameterVerdict, RawValue, ThresholdRegistry, MSG_INVALID, MSG_NORMAL,
    MSG_UNAVAILABLE,
};

/// Classifies single parameter values against a [`ThresholdRegistry`].
///
/// Never fails: missing or non-numeric input degrades to a non-anomalous
/// verdict with an explanatory message.
#[derive(Debug, Clone, Default)]
pub struct ParameterEvaluator {
    registry: ThresholdRegistry,
}

impl ParameterEvaluator {
    pub const fn new(registry: ThresholdRegistry) -> Self {
        Self { registry }
    }

    pub const fn registry(&self) -> &ThresholdRegistry {
        &self.registry
    }

    /// Evaluate a raw, possibly absent, value.
    pub fn evaluate(&self, parameter: Parameter, raw: Option<&RawValue>) -> ParameterVerdict {
        match raw.map(RawValue::coerce) {
            None | Some(Coerced::Blank) => unavailable(parameter, MSG_UNAVAILABLE),
            // Non-numeric input is reported, not flagged as an anomaly
            Some(Coerced::Invalid) => unavailable(parameter, MSG_INVALID),
            Some(Coerced::Finite(value)) => self.evaluate_value(parameter, value),
        }
    }

    /// Evaluate a numeric value. NaN and infinities are reported as invalid.
    pub fn evaluate_value(&self, parameter: Parameter, value: f64) -> ParameterVerdict {
        if !value.is_finite() {
            return unavailable(parameter, MSG_INVALID);
        }
        let threshold = self.registry.get(parameter);

        // Low is checked first so it wins if a malformed range violates both sides
        let message = if let Some(min) = threshold.min_inclusive.filter(|_| threshold.is_below(value)) {
            format!("Terlalu rendah ({value} < {min})")
        } else if let Some(max) = threshold.max_inclusive.filter(|_| threshold.is_above(value)) {
            format!("Terlalu tinggi ({value} > {max})")
        } else {
            MSG_NORMAL.to_string()
        };

        ParameterVerdict {
            parameter,
            value: Some(value),
            is_anomaly: message != MSG_NORMAL,
            message,
            coordinate: None,
        }
    }
}

fn unavailable(parameter: Parameter, message: &str) -> ParameterVerdict {
    ParameterVerdict {
        parameter,
        value: None,
        is_anomaly: false,
        message: message.to_string(),
        coordinate: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParameterThreshold;

    fn evaluator() -> ParameterEvaluator {
        ParameterEvaluator::default()
    }

    #[test]
    fn test_missing_value_is_not_available() {
        let v = evaluator().evaluate(Parameter::Ph, None);
        assert_eq!(v.message, "Data tidak tersedia");
        assert!(!v.is_anomaly);
        assert_eq!(v.value, None);
    }

    #[test]
    fn test_non_numeric_value_is_invalid_but_not_anomalous() {
        let raw = RawValue::from("sensor error");
        let v = evaluator().evaluate(Parameter::Temperature, Some(&raw));
        assert_eq!(v.message, "Data tidak valid");
        assert!(!v.is_anomaly);
        assert_eq!(v.value, None);
    }

    #[test]
    fn test_too_high_message_format() {
        let v = evaluator().evaluate(Parameter::Ph, Some(&RawValue::Number(10.0)));
        assert!(v.is_anomaly);
        assert_eq!(v.message, "Terlalu tinggi (10 > 9)");
        assert_eq!(v.value, Some(10.0));
    }

    #[test]
    fn test_too_low_message_format() {
        let v = evaluator().evaluate(Parameter::Temperature, Some(&RawValue::Number(7.5)));
        assert!(v.is_anomaly);
        assert_eq!(v.message, "Terlalu rendah (7.5 < 10)");

        let v = evaluator().evaluate(Parameter::Turbidity, Some(&RawValue::Number(-3.0)));
        assert_eq!(v.message, "Terlalu rendah (-3 < -1)");
    }

    #[test]
    fn test_boundaries_are_normal() {
        let e = evaluator();
        for (p, v) in [
            (Parameter::Ph, 6.0),
            (Parameter::Ph, 9.0),
            (Parameter::Temperature, 10.0),
            (Parameter::Temperature, 35.0),
            (Parameter::Turbidity, -1.0),
            (Parameter::Turbidity, 200.0),
        ] {
            let verdict = e.evaluate_value(p, v);
            assert!(!verdict.is_anomaly, "{p} = {v} should be normal");
            assert_eq!(verdict.message, "Normal");
        }
    }

    #[test]
    fn test_numeric_string_is_evaluated() {
        let v = evaluator().evaluate(Parameter::Turbidity, Some(&RawValue::from("250")));
        assert!(v.is_anomaly);
        assert_eq!(v.message, "Terlalu tinggi (250 > 200)");
    }

    #[test]
    fn test_inverted_range_reports_too_low() {
        let registry = ThresholdRegistry::new(
            ParameterThreshold::new(Parameter::Turbidity, Some(-1.0), Some(200.0), "Turbidity"),
            ParameterThreshold::new(Parameter::Ph, Some(9.0), Some(6.0), "pH"),
            ParameterThreshold::new(Parameter::Temperature, Some(10.0), Some(35.0), "Temperature"),
        );
        let v = ParameterEvaluator::new(registry).evaluate_value(Parameter::Ph, 7.0);
        assert!(v.is_anomaly);
        assert_eq!(v.message, "Terlalu rendah (7 < 9)");
    }

    #[test]
    fn test_non_finite_value_is_invalid_not_normal() {
        let e = ParameterEvaluator::default();
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let verdict = e.evaluate_value(Parameter::Ph, v);
            assert_eq!(verdict.message, MSG_INVALID);
            assert_eq!(verdict.value, None);
            assert!(!verdict.is_anomaly);
        }
    }
}
