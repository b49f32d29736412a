//! Reclassification Coordinator
//!
//! Orchestrates every network-backed change to the anomaly working set:
//! snapshot refresh, delete, and the correct-then-reclassify protocol.
//!
//! ## Correction protocol
//!
//! ```text
//! Idle → Validating → Submitting → Succeeded
//!                  ↘            ↘ Failed
//! ```
//!
//! - Input is validated before any network I/O.
//! - All three corrected values travel in one request.
//! - On success the held record is replaced wholesale, rebuilt from the
//!   corrected values; on failure it is left untouched.
//! - Nothing is retried automatically.
//!
//! ## Concurrency
//!
//! - One reclassification per record at a time; a second is rejected.
//! - A delete may overtake a pending reclassification. The late
//!   reclassification response is discarded because the record is gone.
//! - A refetch that drops the record mid-flight is treated the same way:
//!   already resolved, not an error.
//! - Dropping an operation's future cancels it and releases its claim.

mod validation;

pub use validation::{validate_correction, FieldIssue, ValidationError};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::classification::RecordNormalizer;
use crate::client::{ClassificationApi, ClientError};
use crate::collection::AnomalyCollection;
use crate::types::{AnomalyRecord, CorrectionValues, InputLimits};

/// Default bound on every network call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Errors and outcomes
// ============================================================================

/// Network-backed operation kinds that claim a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PendingOperation {
    Reclassify,
    Delete,
}

impl std::fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reclassify => write!(f, "reclassification"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Another operation on the same record is still in flight
    #[error("a {pending} is already in flight for record {id}")]
    Busy {
        id: String,
        pending: PendingOperation,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    /// Server reachable but reported failure
    #[error("remote classification failed: {message}")]
    RemoteClassification { status: Option<u16>, message: String },
}

impl From<ClientError> for CoordinatorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(msg) => Self::Network(msg),
            ClientError::Timeout(d) => Self::Timeout(d),
            ClientError::Remote { status, message } => Self::RemoteClassification {
                status: Some(status),
                message,
            },
            ClientError::Decode(msg) => Self::RemoteClassification {
                status: None,
                message: msg,
            },
        }
    }
}

/// Per-record correction progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CorrectionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl CorrectionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// What a successful correction did to the working set.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionOutcome {
    /// The held record was swapped for the recomputed one
    Replaced(AnomalyRecord),
    /// The corrected sample is no longer anomalous and left the set
    Cleared { id: String, classification: String },
    /// The record vanished while the request was in flight (deleted or
    /// dropped by a refetch); the service accepted it but the response was
    /// discarded
    Discarded { id: String },
    /// No record with this id was held; nothing was sent
    NotHeld { id: String },
}

// ============================================================================
// Coordinator
// ============================================================================

#[derive(Debug, Default)]
struct Tracker {
    in_flight: HashSet<(String, PendingOperation)>,
    states: HashMap<String, CorrectionState>,
}

/// Releases a record claim when dropped, including on cancellation.
struct Claim<'a> {
    tracker: &'a Mutex<Tracker>,
    id: String,
    operation: PendingOperation,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        tracker.in_flight.remove(&(self.id.clone(), self.operation));
        if self.operation == PendingOperation::Reclassify {
            // Cancelled mid-flight: back to Idle rather than stuck in Submitting
            if let Some(state) = tracker.states.get_mut(&self.id) {
                if !state.is_terminal() {
                    *state = CorrectionState::Idle;
                }
            }
        }
    }
}

pub struct ReclassificationCoordinator<A: ClassificationApi> {
    api: Arc<A>,
    store: Arc<RwLock<AnomalyCollection>>,
    normalizer: RecordNormalizer,
    limits: InputLimits,
    timeout: Duration,
    tracker: Mutex<Tracker>,
}

impl<A: ClassificationApi> ReclassificationCoordinator<A> {
    pub fn new(
        api: Arc<A>,
        store: Arc<RwLock<AnomalyCollection>>,
        normalizer: RecordNormalizer,
    ) -> Self {
        Self {
            api,
            store,
            normalizer,
            limits: InputLimits::default(),
            timeout: DEFAULT_TIMEOUT,
            tracker: Mutex::new(Tracker::default()),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: InputLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> Arc<RwLock<AnomalyCollection>> {
        Arc::clone(&self.store)
    }

    /// Current correction state of a record.
    pub fn correction_state(&self, id: &str) -> CorrectionState {
        self.tracker()
            .states
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_pending(&self, id: &str, operation: PendingOperation) -> bool {
        self.tracker()
            .in_flight
            .contains(&(id.to_string(), operation))
    }

    /// Fetch every classification and replace the held snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<usize, CoordinatorError> {
        let items = self.bounded(self.api.fetch_classifications()).await?;
        let count = {
            let mut store = self.store.write().await;
            let count = store.ingest(&items, &self.normalizer);
            self.prune_states(&store);
            count
        };
        info!(fetched = items.len(), anomalies = count, "Anomaly list refreshed");
        Ok(count)
    }

    /// Submit corrected values for `id` and swap in the reclassified record.
    pub async fn submit_correction(
        &self,
        id: &str,
        values: CorrectionValues,
    ) -> Result<CorrectionOutcome, CoordinatorError> {
        let _claim = self.claim(id, PendingOperation::Reclassify)?;

        self.set_state(id, CorrectionState::Validating);
        if let Err(e) = validate_correction(&values, &self.limits) {
            warn!(id = %id, error = %e, "Correction rejected before submission");
            self.set_state(id, CorrectionState::Failed);
            return Err(e.into());
        }

        if self.store.read().await.get(id).is_none() {
            info!(id = %id, "Record not held, correction not sent");
            self.clear_state(id);
            return Ok(CorrectionOutcome::NotHeld { id: id.to_string() });
        }

        self.set_state(id, CorrectionState::Submitting);
        info!(
            id = %id,
            ph = values.ph,
            temperature = values.temperature,
            turbidity = values.turbidity,
            "Submitting correction"
        );

        let prediction = match self.bounded(self.api.submit_prediction(id, &values)).await {
            Ok(p) => p,
            Err(e) => {
                warn!(id = %id, error = %e, "Reclassification failed, record left untouched");
                self.set_state(id, CorrectionState::Failed);
                return Err(e);
            }
        };

        let outcome = {
            let mut store = self.store.write().await;
            let held = store.get(id).cloned();
            match held {
                None => {
                    info!(id = %id, "Record no longer held, discarding reclassification response");
                    drop(store);
                    self.clear_state(id);
                    return Ok(CorrectionOutcome::Discarded { id: id.to_string() });
                }
                Some(current) => {
                    match self.normalizer.normalize_correction(&current, &values, &prediction) {
                        Some(record) => {
                            store.replace(record.clone());
                            CorrectionOutcome::Replaced(record)
                        }
                        None => {
                            store.delete(id);
                            CorrectionOutcome::Cleared {
                                id: id.to_string(),
                                classification: prediction.klasifikasi.clone(),
                            }
                        }
                    }
                }
            }
        };

        info!(id = %id, classification = %prediction.klasifikasi, "Reclassification applied");
        self.set_state(id, CorrectionState::Succeeded);
        Ok(outcome)
    }

    /// Delete `id` remotely, then drop it from the held snapshot.
    ///
    /// Confirmation is the caller's job. Returns the removed record, or
    /// `None` if it was not in the current snapshot.
    pub async fn delete(&self, id: &str) -> Result<Option<AnomalyRecord>, CoordinatorError> {
        let _claim = self.claim(id, PendingOperation::Delete)?;

        if let Err(e) = self.bounded(self.api.delete_classification(id)).await {
            warn!(id = %id, error = %e, "Delete failed, record kept");
            return Err(e);
        }

        let removed = self.store.write().await.delete(id);
        self.clear_state(id);
        info!(id = %id, held = removed.is_some(), "Record deleted");
        Ok(removed)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, CoordinatorError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(CoordinatorError::from),
            Err(_) => Err(CoordinatorError::Timeout(self.timeout)),
        }
    }

    fn claim(&self, id: &str, operation: PendingOperation) -> Result<Claim<'_>, CoordinatorError> {
        let mut tracker = self.tracker();
        let blocking = match operation {
            // A pending delete means the record is about to vanish
            PendingOperation::Reclassify => [PendingOperation::Reclassify, PendingOperation::Delete]
                .into_iter()
                .find(|op| tracker.in_flight.contains(&(id.to_string(), *op))),
            PendingOperation::Delete => tracker
                .in_flight
                .contains(&(id.to_string(), PendingOperation::Delete))
                .then_some(PendingOperation::Delete),
        };
        if let Some(pending) = blocking {
            warn!(id = %id, requested = %operation, pending = %pending, "Rejected overlapping operation");
            return Err(CoordinatorError::Busy {
                id: id.to_string(),
                pending,
            });
        }

        tracker.in_flight.insert((id.to_string(), operation));
        Ok(Claim {
            tracker: &self.tracker,
            id: id.to_string(),
            operation,
        })
    }

    fn set_state(&self, id: &str, state: CorrectionState) {
        self.tracker().states.insert(id.to_string(), state);
    }

    fn clear_state(&self, id: &str) {
        self.tracker().states.remove(id);
    }

    /// Forget states of records that left the snapshot, unless a
    /// reclassification for them is still in flight.
    fn prune_states(&self, store: &AnomalyCollection) {
        let mut tracker = self.tracker();
        let Tracker { in_flight, states } = &mut *tracker;
        states.retain(|id, _| {
            store.get(id).is_some()
                || in_flight.contains(&(id.clone(), PendingOperation::Reclassify))
        });
    }

    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }
}
