//! Shared data structures for water-quality anomaly classification
//!
//! - `parameter`: the three measured parameters and raw value coercion
//! - `thresholds`: classification registry, display ranges, input limits
//! - `anomaly`: per-parameter verdicts and the canonical anomaly record
//! - `api`: wire schemas of the remote classification service
//! - `series`: summary statistics and chart windows
//! - `timestamp`: parsing of service timestamps

mod parameter;
pub mod thresholds;
mod anomaly;
mod api;
mod series;
pub mod timestamp;

pub use parameter::*;
pub use thresholds::*;
pub use anomaly::*;
pub use api::*;
pub use series::*;
