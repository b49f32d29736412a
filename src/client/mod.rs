//! Classification Service Client
//!
//! The remote service owns storage and the prediction model; this crate only
//! talks to it through [`ClassificationApi`]. [`HttpClassificationClient`] is
//! the production implementation over reqwest. Tests substitute their own.
//!
//! ## Endpoints
//!
//! - `GET /klasifikasi/all`
//! - `PUT /klasifikasi/{id}/prediction`
//! - `DELETE /klasifikasi/{id}`
//! - `GET /data_combined[/{location_id}]?limit=N`

mod http;

pub use http::HttpClassificationClient;

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{CorrectionValues, Prediction, RawClassificationItem, RawSample};

/// Errors talking to the classification service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, broken transfer
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Server reachable but rejected the request (`success: false` or non-2xx)
    #[error("server rejected request (HTTP {status}): {message}")]
    Remote { status: u16, message: String },
    /// Server answered with a body that does not match the expected schema
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Operations the engine needs from the classification service.
#[async_trait]
pub trait ClassificationApi: Send + Sync {
    /// Every classification row, anomalous or not.
    async fn fetch_classifications(&self) -> Result<Vec<RawClassificationItem>, ClientError>;

    /// Submit corrected values for one record and return the new classification.
    async fn submit_prediction(
        &self,
        id: &str,
        values: &CorrectionValues,
    ) -> Result<Prediction, ClientError>;

    async fn delete_classification(&self, id: &str) -> Result<(), ClientError>;

    /// Most recent `limit` combined samples, optionally for one location.
    async fn fetch_samples(
        &self,
        location_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawSample>, ClientError>;
}
