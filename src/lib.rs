//! Sungai Watch: water-quality anomaly monitoring
//!
//! Classifies river sensor samples (turbidity, pH, temperature) against
//! per-parameter thresholds, keeps the anomalous records as a filterable
//! working set, aggregates sample series for charts, and drives operator
//! corrections through a remote reclassification service.
//!
//! ## Architecture
//!
//! - **Classification**: per-parameter verdicts and record normalization
//! - **Collection**: the owned anomaly snapshot plus location/category/page view
//! - **Series**: summary statistics and paginated chart windows
//! - **Client**: the classification service behind [`ClassificationApi`]
//! - **Reclassify**: correction validation, submission and record replacement
//! - **Watch**: periodic snapshot refresh

pub mod config;
pub mod types;
pub mod classification;
pub mod collection;
pub mod series;
pub mod client;
pub mod reclassify;
pub mod watch;

// Re-export monitor configuration
pub use config::MonitorConfig;

// Re-export commonly used types
pub use types::{
    AnomalyRecord, CorrectionValues, Parameter, ParameterVerdict, RawClassificationItem,
    RawSample, RawValue, SeriesWindow, StatisticsSummary, ThresholdRegistry,
};

pub use classification::{ParameterEvaluator, RecordNormalizer};
pub use collection::{AnomalyCollection, Category, LocationFilter, PageView};
pub use client::{ClassificationApi, ClientError, HttpClassificationClient};
pub use reclassify::{
    CoordinatorError, CorrectionOutcome, CorrectionState, ReclassificationCoordinator,
    ValidationError,
};
