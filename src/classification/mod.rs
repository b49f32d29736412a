//! Classification Engine
//!
//! Evaluates each parameter of a sample against the threshold registry and
//! canonicalizes raw service payloads into anomaly records.
//!
//! ## Rules
//!
//! - A value outside its inclusive `[min, max]` range is an anomaly.
//! - Missing (`"Data tidak tersedia"`) and non-numeric (`"Data tidak valid"`)
//!   values are reported but never flagged.
//! - Only samples with at least one anomalous parameter become records.

mod evaluator;
mod normalizer;

pub use evaluator::ParameterEvaluator;
pub use normalizer::{RecordNormalizer, UNKNOWN_LOCATION};
