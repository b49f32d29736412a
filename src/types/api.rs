//! Wire schemas of the remote classification service
//!
//! The service payloads are loosely typed; every field the engine reads is
//! declared here and coerced through [`RawValue`] so the rest of the crate
//! only ever sees well-typed data.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::{finite, Parameter, RawValue};

/// Accept an identifier delivered either as a JSON number or a string.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Int(n) => n.to_string(),
        Id::Float(f) => f.to_string(),
        Id::Text(s) => s,
    })
}

// ============================================================================
// GET /klasifikasi/all
// ============================================================================

/// Monitoring location referenced by a classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub nama_sungai: Option<String>,
    #[serde(default)]
    pub lat: Option<RawValue>,
    #[serde(default)]
    pub lon: Option<RawValue>,
}

/// One parameter sub-record (`data_ph`, `data_temperature`, `data_turbidity`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParameterRecord {
    #[serde(
        default,
        alias = "nilai_ph",
        alias = "nilai_temperature",
        alias = "nilai_turbidity"
    )]
    pub value: Option<RawValue>,
    #[serde(default)]
    pub lat: Option<RawValue>,
    #[serde(default)]
    pub lon: Option<RawValue>,
}

/// One classification row as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassificationItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id_klasifikasi: String,
    #[serde(default)]
    pub tanggal: Option<String>,
    #[serde(default)]
    pub data_lokasi: Option<RawLocation>,
    #[serde(default)]
    pub data_ph: Option<RawParameterRecord>,
    #[serde(default)]
    pub data_temperature: Option<RawParameterRecord>,
    #[serde(default)]
    pub data_turbidity: Option<RawParameterRecord>,
}

/// One parameter's raw reading plus the coordinate of the sensor that took it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterReading {
    pub parameter: Parameter,
    pub raw_value: Option<RawValue>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawClassificationItem {
    pub const fn sub_record(&self, parameter: Parameter) -> Option<&RawParameterRecord> {
        match parameter {
            Parameter::Turbidity => self.data_turbidity.as_ref(),
            Parameter::Ph => self.data_ph.as_ref(),
            Parameter::Temperature => self.data_temperature.as_ref(),
        }
    }

    pub fn reading(&self, parameter: Parameter) -> ParameterReading {
        let sub = self.sub_record(parameter);
        ParameterReading {
            parameter,
            raw_value: sub.and_then(|s| s.value.clone()),
            latitude: sub.and_then(|s| finite(s.lat.as_ref())),
            longitude: sub.and_then(|s| finite(s.lon.as_ref())),
        }
    }

    pub fn location_name(&self) -> Option<&str> {
        self.data_lokasi
            .as_ref()
            .and_then(|l| l.nama_sungai.as_deref())
    }
}

// ============================================================================
// GET /data_combined
// ============================================================================

/// One combined sensor sample used for statistics and charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    #[serde(default)]
    pub tanggal: Option<String>,
    #[serde(default)]
    pub nilai_ph: Option<RawValue>,
    #[serde(default)]
    pub nilai_temperature: Option<RawValue>,
    #[serde(default)]
    pub nilai_turbidity: Option<RawValue>,
    /// Motion and position fields, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawSample {
    pub const fn value(&self, parameter: Parameter) -> Option<&RawValue> {
        match parameter {
            Parameter::Turbidity => self.nilai_turbidity.as_ref(),
            Parameter::Ph => self.nilai_ph.as_ref(),
            Parameter::Temperature => self.nilai_temperature.as_ref(),
        }
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// `{ success, data: [...] }` list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shape used by the service on failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

// ============================================================================
// PUT /klasifikasi/{id}/prediction
// ============================================================================

/// Corrected raw values for one past sample. Always submitted together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionValues {
    pub ph: f64,
    pub temperature: f64,
    pub turbidity: f64,
}

impl CorrectionValues {
    pub const fn get(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::Turbidity => self.turbidity,
            Parameter::Ph => self.ph,
            Parameter::Temperature => self.temperature,
        }
    }
}

/// New classification computed by the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub klasifikasi: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub prediction: Option<Prediction>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
