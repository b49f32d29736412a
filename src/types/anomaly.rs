//! Per-parameter verdicts and the canonical anomaly record

use serde::{Deserialize, Serialize};

use super::Parameter;

/// Verdict message for an absent value.
pub const MSG_UNAVAILABLE: &str = "Data tidak tersedia";
/// Verdict message for a present but non-numeric value.
pub const MSG_INVALID: &str = "Data tidak valid";
/// Verdict message for an in-range value.
pub const MSG_NORMAL: &str = "Normal";

/// A sensor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Both halves must be present and finite.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Self {
                latitude: lat,
                longitude: lon,
            }),
            _ => None,
        }
    }
}

/// Evaluation result for one parameter of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVerdict {
    pub parameter: Parameter,
    /// Parsed value; `None` when missing or invalid
    pub value: Option<f64>,
    pub is_anomaly: bool,
    pub message: String,
    /// Coordinate of the sensor that produced this parameter
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

impl ParameterVerdict {
    pub fn with_coordinate(mut self, coordinate: Option<Coordinate>) -> Self {
        self.coordinate = coordinate;
        self
    }
}

/// Canonical anomaly event.
///
/// `anomaly_types` always equals the labels of the anomalous verdicts, in
/// turbidity, pH, temperature order, and is never empty. Records are only
/// built by the normalizer and replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub id: String,
    pub location_name: String,
    pub date: String,
    pub time: String,
    /// Raw timestamp as delivered by the service
    pub recorded_at: Option<String>,
    pub turbidity: ParameterVerdict,
    pub ph: ParameterVerdict,
    pub temperature: ParameterVerdict,
    pub anomaly_types: Vec<String>,
    /// Coordinate of the monitoring location itself
    #[serde(default)]
    pub location_coordinate: Option<Coordinate>,
    /// Server-side classification label from the latest prediction
    #[serde(default)]
    pub classification: Option<String>,
}

impl AnomalyRecord {
    pub const fn verdict(&self, parameter: Parameter) -> &ParameterVerdict {
        match parameter {
            Parameter::Turbidity => &self.turbidity,
            Parameter::Ph => &self.ph,
            Parameter::Temperature => &self.temperature,
        }
    }

    pub fn is_anomalous(&self, parameter: Parameter) -> bool {
        self.verdict(parameter).is_anomaly
    }

    /// Single coordinate for map placement, consulting sources in
    /// [`COORDINATE_PRIORITY`] order.
    pub fn representative_coordinate(&self) -> Option<Coordinate> {
        COORDINATE_PRIORITY.iter().find_map(|source| match source {
            CoordinateSource::Sensor(p) => self.verdict(*p).coordinate,
            CoordinateSource::Location => self.location_coordinate,
        })
    }
}

/// Where a representative coordinate may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Sensor(Parameter),
    Location,
}

/// Fixed lookup order for a record's representative coordinate, most
/// reliable sensor first.
pub const COORDINATE_PRIORITY: [CoordinateSource; 4] = [
    CoordinateSource::Sensor(Parameter::Ph),
    CoordinateSource::Sensor(Parameter::Temperature),
    CoordinateSource::Sensor(Parameter::Turbidity),
    CoordinateSource::Location,
];
