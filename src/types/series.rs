//! Summary statistics and chart window types

use serde::{Serialize, Serializer};

use super::Parameter;

/// A statistic that may be unavailable.
///
/// Serializes as a bare number, or as the string `"-"` when no numeric
/// samples existed. Never stands in with `NaN` or `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Value(f64),
    Missing,
}

impl StatValue {
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Missing => f.write_str("-"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Missing => serializer.serialize_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub parameter: Parameter,
    pub min: StatValue,
    pub max: StatValue,
    pub avg: StatValue,
    /// Number of numeric samples the statistics were computed over
    pub count: usize,
}

impl StatisticsSummary {
    pub const fn empty(parameter: Parameter) -> Self {
        Self {
            parameter,
            min: StatValue::Missing,
            max: StatValue::Missing,
            avg: StatValue::Missing,
            count: 0,
        }
    }
}

/// Direction samples are ordered in before windowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// A page-indexed slice of a time-ordered series, ready for charting.
///
/// `values[i]` and `labels[i]` always describe the same sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesWindow {
    pub parameter: Parameter,
    pub page_index: usize,
    pub page_size: usize,
    pub values: Vec<f64>,
    pub labels: Vec<String>,
    pub total_samples: usize,
    pub total_pages: usize,
}
