//! Measured water-quality parameters and lenient raw value coercion

use serde::{Deserialize, Serialize};

/// One of the three water-quality parameters carried by every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "turbidity")]
    Turbidity,
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "temperature")]
    Temperature,
}

impl Parameter {
    /// All parameters in the order anomaly labels are reported.
    pub const ALL: [Self; 3] = [Self::Turbidity, Self::Ph, Self::Temperature];

    /// Registry key (`turbidity`, `pH`, `temperature`).
    pub const fn key(self) -> &'static str {
        match self {
            Self::Turbidity => "turbidity",
            Self::Ph => "pH",
            Self::Temperature => "temperature",
        }
    }

    /// Field name of the raw value in combined samples and classification sub-records.
    pub const fn value_field(self) -> &'static str {
        match self {
            Self::Turbidity => "nilai_turbidity",
            Self::Ph => "nilai_ph",
            Self::Temperature => "nilai_temperature",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Turbidity => "NTU",
            Self::Ph => "",
            Self::Temperature => "°C",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Parameter {
    type Err = String;

    /// Accepts registry keys and raw field names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "turbidity" | "nilai_turbidity" => Ok(Self::Turbidity),
            "ph" | "nilai_ph" => Ok(Self::Ph),
            "temperature" | "nilai_temperature" | "suhu" => Ok(Self::Temperature),
            other => Err(format!("unknown parameter '{other}'")),
        }
    }
}

// ============================================================================
// Raw values
// ============================================================================

/// A raw value exactly as the remote API delivered it.
///
/// The service is loosely typed: the same field may arrive as a JSON number,
/// a numeric string, or something else entirely. Coercion happens here, at
/// the boundary, and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Result of coercing a present raw value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    /// Blank text, treated the same as an absent value
    Blank,
    /// Present but not a finite number
    Invalid,
    Finite(f64),
}

impl RawValue {
    pub fn coerce(&self) -> Coerced {
        match self {
            Self::Number(n) if n.is_finite() => Coerced::Finite(*n),
            Self::Number(_) | Self::Other(_) => Coerced::Invalid,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Coerced::Blank;
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Coerced::Finite(n),
                    _ => Coerced::Invalid,
                }
            }
        }
    }

    /// Finite numeric value, if any.
    pub fn as_finite(&self) -> Option<f64> {
        match self.coerce() {
            Coerced::Finite(n) => Some(n),
            Coerced::Blank | Coerced::Invalid => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Coerce an optional raw value to a finite number.
pub fn finite(value: Option<&RawValue>) -> Option<f64> {
    value.and_then(RawValue::as_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_from_field_name() {
        assert_eq!("nilai_ph".parse::<Parameter>().unwrap(), Parameter::Ph);
        assert_eq!("pH".parse::<Parameter>().unwrap(), Parameter::Ph);
        assert_eq!("Turbidity".parse::<Parameter>().unwrap(), Parameter::Turbidity);
        assert!("salinity".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_raw_value_deserializes_numbers_and_strings() {
        let v: Vec<RawValue> = serde_json::from_str(r#"[7, 7.5, "8.25", "x", true]"#).unwrap();
        assert_eq!(v[0].coerce(), Coerced::Finite(7.0));
        assert_eq!(v[1].coerce(), Coerced::Finite(7.5));
        assert_eq!(v[2].coerce(), Coerced::Finite(8.25));
        assert_eq!(v[3].coerce(), Coerced::Invalid);
        assert_eq!(v[4].coerce(), Coerced::Invalid);
    }

    #[test]
    fn test_blank_and_non_finite_text() {
        assert_eq!(RawValue::from("  ").coerce(), Coerced::Blank);
        assert_eq!(RawValue::from("NaN").coerce(), Coerced::Invalid);
        assert_eq!(RawValue::from("inf").coerce(), Coerced::Invalid);
        assert_eq!(RawValue::Number(f64::NAN).coerce(), Coerced::Invalid);
    }
}
