//! Series Aggregator
//!
//! Stateless statistics and chart windowing over combined sensor samples.
//!
//! The two operations treat missing data differently on purpose:
//!
//! - [`summarize`] drops non-numeric points so they cannot skew min/max/avg.
//! - [`windowed`] keeps every point and substitutes `0` so each value stays
//!   aligned with its timestamp label.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::collection::{paginate, total_pages};
use crate::types::{
    finite, timestamp::parse_timestamp, Parameter, RawSample, SeriesWindow, SortOrder,
    StatValue, StatisticsSummary,
};

/// Default axis label format for chart windows.
pub const DEFAULT_LABEL_FORMAT: &str = "%d/%m %H:%M";

/// Options for [`windowed_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub order: SortOrder,
    /// chrono format string for axis labels
    pub label_format: String,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            order: SortOrder::NewestFirst,
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
        }
    }
}

/// Min, max and 2-dp rounded mean of the numeric values of `parameter`.
pub fn summarize(samples: &[RawSample], parameter: Parameter) -> StatisticsSummary {
    let values: Vec<f64> = samples
        .iter()
        .filter_map(|s| finite(s.value(parameter)))
        .collect();

    if values.is_empty() {
        return StatisticsSummary::empty(parameter);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = mean(&values);

    StatisticsSummary {
        parameter,
        min: StatValue::Value(min),
        max: StatValue::Value(max),
        avg: StatValue::Value(round2(mean)),
        count: values.len(),
    }
}

/// [`summarize`] for every parameter, in turbidity, pH, temperature order.
pub fn summarize_all(samples: &[RawSample]) -> Vec<StatisticsSummary> {
    Parameter::ALL
        .into_iter()
        .map(|p| summarize(samples, p))
        .collect()
}

/// Newest-first window with default label format.
pub fn windowed(
    samples: &[RawSample],
    page_index: usize,
    page_size: usize,
    parameter: Parameter,
) -> SeriesWindow {
    windowed_with(samples, page_index, page_size, parameter, &WindowOptions::default())
}

/// One-based page of the time-ordered series for `parameter`.
///
/// Samples with unparseable timestamps sort as the oldest. Sorting is
/// stable, so samples sharing a timestamp keep their input order.
pub fn windowed_with(
    samples: &[RawSample],
    page_index: usize,
    page_size: usize,
    parameter: Parameter,
    options: &WindowOptions,
) -> SeriesWindow {
    let ordered = ordered_samples(samples, options.order);
    let page = paginate(&ordered, page_index, page_size);

    SeriesWindow {
        parameter,
        page_index,
        page_size,
        values: page
            .iter()
            .map(|(_, s)| finite(s.value(parameter)).unwrap_or(0.0))
            .collect(),
        labels: page
            .iter()
            .map(|(ts, s)| axis_label(*ts, s, &options.label_format))
            .collect(),
        total_samples: samples.len(),
        total_pages: total_pages(samples.len(), page_size),
    }
}

/// Most recent sample by timestamp.
pub fn latest(samples: &[RawSample]) -> Option<&RawSample> {
    ordered_samples(samples, SortOrder::NewestFirst)
        .first()
        .map(|(_, s)| *s)
}

fn ordered_samples(samples: &[RawSample], order: SortOrder) -> Vec<(Option<NaiveDateTime>, &RawSample)> {
    let mut keyed: Vec<_> = samples
        .iter()
        .map(|s| (s.tanggal.as_deref().and_then(parse_timestamp), s))
        .collect();
    match order {
        SortOrder::NewestFirst => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
        SortOrder::OldestFirst => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
    }
    keyed
}

/// Running mean; stays finite when the plain sum would overflow.
fn mean(values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, v)| acc + (v - acc) / (i + 1) as f64)
}

/// Falls back to the raw `tanggal` when the format cannot render.
fn axis_label(ts: Option<NaiveDateTime>, sample: &RawSample, format: &str) -> String {
    let raw = || sample.tanggal.clone().unwrap_or_default();
    let Some(dt) = ts else {
        return raw();
    };
    let mut label = String::new();
    match write!(label, "{}", dt.format(format)) {
        Ok(()) => label,
        Err(_) => raw(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
