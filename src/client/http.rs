//! reqwest implementation of [`ClassificationApi`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ClassificationApi, ClientError};
use crate::types::{
    CorrectionValues, ErrorBody, ListEnvelope, Prediction, PredictionResponse,
    RawClassificationItem, RawSample,
};

/// HTTP client for the classification service
#[derive(Clone)]
pub struct HttpClassificationClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpClassificationClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Network(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Network(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Get base URL for logging
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn transport_error(&self, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        request.send().await.map_err(|e| {
            let err = self.transport_error(&e);
            warn!(error = %err, "Classification service request failed");
            err
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, resp: Response) -> Result<T, ClientError> {
        let body = resp.bytes().await.map_err(|e| self.transport_error(&e))?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into [`ClientError::Remote`], preferring the
    /// server's own message.
    async fn rejection(resp: Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        ClientError::Remote {
            status: status.as_u16(),
            message,
        }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Vec<T>, ClientError> {
        let resp = self.send(request).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(resp).await);
        }

        let envelope: ListEnvelope<T> = self.read_json(resp).await?;
        if !envelope.success {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| format!("{what} request reported failure")),
            });
        }
        debug!(count = envelope.data.len(), "Fetched {}", what);
        Ok(envelope.data)
    }
}

#[async_trait]
impl ClassificationApi for HttpClassificationClient {
    async fn fetch_classifications(&self) -> Result<Vec<RawClassificationItem>, ClientError> {
        let url = self.endpoint(&["klasifikasi", "all"]);
        self.fetch_list(self.http.get(url), "classification").await
    }

    async fn submit_prediction(
        &self,
        id: &str,
        values: &CorrectionValues,
    ) -> Result<Prediction, ClientError> {
        let url = self.endpoint(&["klasifikasi", id, "prediction"]);
        let resp = self.send(self.http.put(url).json(values)).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::rejection(resp).await);
        }

        let body: PredictionResponse = self.read_json(resp).await?;
        if !body.success {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: body
                    .error
                    .or(body.message)
                    .unwrap_or_else(|| "prediction request reported failure".to_string()),
            });
        }
        body.prediction
            .ok_or_else(|| ClientError::Decode("successful response without prediction".to_string()))
    }

    async fn delete_classification(&self, id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["klasifikasi", id]);
        let resp = self.send(self.http.delete(url)).await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(resp).await)
        }
    }

    async fn fetch_samples(
        &self,
        location_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawSample>, ClientError> {
        let url = match location_id {
            Some(location) => self.endpoint(&["data_combined", location]),
            None => self.endpoint(&["data_combined"]),
        };
        let request = self.http.get(url).query(&[("limit", limit)]);
        self.fetch_list(request, "sample").await
    }
}
