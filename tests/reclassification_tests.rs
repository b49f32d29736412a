//! Reclassification Protocol Tests
//!
//! Drives `ReclassificationCoordinator` against an in-process scripted
//! service. Gates on the fake let a test hold a request in flight while it
//! deletes or refetches underneath it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

use sungai_watch::client::{ClassificationApi, ClientError};
use sungai_watch::collection::{AnomalyCollection, Category};
use sungai_watch::reclassify::{
    CoordinatorError, CorrectionOutcome, CorrectionState, PendingOperation,
    ReclassificationCoordinator,
};
use sungai_watch::types::{CorrectionValues, Prediction, RawClassificationItem, RawSample};
use sungai_watch::watch::run_watch;
use sungai_watch::RecordNormalizer;

// ============================================================================
// Scripted service
// ============================================================================

struct ScriptedApi {
    items: Mutex<Vec<RawClassificationItem>>,
    fail_fetch: Mutex<bool>,
    /// When set, predictions wait for a permit
    prediction_gate: Option<Arc<Semaphore>>,
    /// When set, deletes wait for a permit
    delete_gate: Option<Arc<Semaphore>>,
    /// One permit per request that reached the service
    entered: Arc<Semaphore>,
    fetches: AtomicUsize,
    predictions: AtomicUsize,
    deletes: AtomicUsize,
}

impl ScriptedApi {
    fn with_items(items: Vec<RawClassificationItem>) -> Self {
        Self {
            items: Mutex::new(items),
            fail_fetch: Mutex::new(false),
            prediction_gate: None,
            delete_gate: None,
            entered: Arc::new(Semaphore::new(0)),
            fetches: AtomicUsize::new(0),
            predictions: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    async fn wait_entered(&self) {
        self.entered.acquire().await.unwrap().forget();
    }
}

#[async_trait]
impl ClassificationApi for ScriptedApi {
    async fn fetch_classifications(&self) -> Result<Vec<RawClassificationItem>, ClientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fetch.lock().unwrap() {
            return Err(ClientError::Network("connection refused".to_string()));
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn submit_prediction(
        &self,
        _id: &str,
        values: &CorrectionValues,
    ) -> Result<Prediction, ClientError> {
        self.predictions.fetch_add(1, Ordering::SeqCst);
        self.entered.add_permits(1);
        if let Some(gate) = &self.prediction_gate {
            gate.acquire().await.unwrap().forget();
        }
        let klasifikasi = if values.ph < 6.0 || values.ph > 9.0 {
            "Tercemar"
        } else {
            "Baik"
        };
        Ok(Prediction {
            klasifikasi: klasifikasi.to_string(),
            extra: BTreeMap::new(),
        })
    }

    async fn delete_classification(&self, id: &str) -> Result<(), ClientError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.entered.add_permits(1);
        if let Some(gate) = &self.delete_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.items.lock().unwrap().retain(|i| i.id_klasifikasi != id);
        Ok(())
    }

    async fn fetch_samples(
        &self,
        _location_id: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<RawSample>, ClientError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn item(id: &str, river: &str, ph: f64, temperature: f64, turbidity: f64) -> RawClassificationItem {
    serde_json::from_value(json!({
        "id_klasifikasi": id,
        "tanggal": "2024-06-02T14:05:00",
        "data_lokasi": { "nama_sungai": river, "lat": -7.25, "lon": 112.75 },
        "data_ph": { "nilai_ph": ph, "lat": -7.251, "lon": 112.751 },
        "data_temperature": { "nilai_temperature": temperature },
        "data_turbidity": { "nilai_turbidity": turbidity }
    }))
    .unwrap()
}

fn fixture() -> Vec<RawClassificationItem> {
    vec![
        item("1", "Brantas", 4.5, 27.0, 10.0),
        item("2", "Brantas", 7.0, 40.0, 10.0),
        item("3", "Bengawan Solo", 7.2, 26.0, 12.0),
        item("4", "Bengawan Solo", 10.0, 26.0, 250.0),
    ]
}

fn fixed(ph: f64, temperature: f64, turbidity: f64) -> CorrectionValues {
    CorrectionValues {
        ph,
        temperature,
        turbidity,
    }
}

async fn coordinator(api: ScriptedApi) -> ReclassificationCoordinator<ScriptedApi> {
    let store = Arc::new(RwLock::new(AnomalyCollection::default()));
    let c = ReclassificationCoordinator::new(Arc::new(api), store, RecordNormalizer::default());
    c.refresh().await.unwrap();
    c
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn refresh_keeps_only_anomalous_records() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    let store = c.store();
    let store = store.read().await;

    let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "4"]);
    assert_eq!(store.get("4").unwrap().anomaly_types, vec!["Turbidity", "pH"]);
}

#[tokio::test]
async fn correction_updates_view_counts() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    assert_eq!(c.store().read().await.category_counts().ph, 2);

    let outcome = c.submit_correction("4", fixed(7.5, 26.0, 250.0)).await.unwrap();
    let CorrectionOutcome::Replaced(record) = outcome else {
        panic!("expected replacement");
    };
    assert_eq!(record.anomaly_types, vec!["Turbidity"]);
    assert_eq!(record.classification.as_deref(), Some("Baik"));
    assert_eq!(record.location_name, "Bengawan Solo");

    let store = c.store();
    let mut view = store.write().await;
    assert_eq!(view.category_counts().ph, 1);
    view.set_category(Category::Turbidity);
    assert_eq!(view.filtered().len(), 1);
}

#[tokio::test]
async fn correction_to_normal_removes_record() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    let outcome = c.submit_correction("2", fixed(7.0, 28.0, 10.0)).await.unwrap();

    assert!(matches!(outcome, CorrectionOutcome::Cleared { ref id, .. } if id == "2"));
    assert!(c.store().read().await.get("2").is_none());
    assert_eq!(c.correction_state("2"), CorrectionState::Succeeded);

    // the next snapshot no longer holds "2", so its state is forgotten
    c.api().items.lock().unwrap().retain(|i| i.id_klasifikasi != "2");
    c.refresh().await.unwrap();
    assert_eq!(c.correction_state("2"), CorrectionState::Idle);
}

#[tokio::test]
async fn correction_for_unknown_record_is_not_sent() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    // "3" is normal, so it never entered the anomaly list
    let outcome = c.submit_correction("3", fixed(7.0, 26.0, 12.0)).await.unwrap();

    assert_eq!(outcome, CorrectionOutcome::NotHeld { id: "3".to_string() });
    assert_eq!(c.api().predictions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn out_of_range_input_is_rejected_locally() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    let err = c.submit_correction("1", fixed(15.0, 27.0, -3.0)).await.unwrap_err();

    let CoordinatorError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert_eq!(validation.issues.len(), 2);
    assert_eq!(c.api().predictions.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Overlap and staleness
// ============================================================================

#[tokio::test]
async fn delete_overtakes_pending_reclassification() {
    let gate = Arc::new(Semaphore::new(0));
    let mut api = ScriptedApi::with_items(fixture());
    api.prediction_gate = Some(Arc::clone(&gate));
    let c = coordinator(api).await;

    let (reclassified, deleted) = tokio::join!(
        c.submit_correction("1", fixed(7.0, 27.0, 10.0)),
        async {
            c.api().wait_entered().await;
            let removed = c.delete("1").await;
            gate.add_permits(1);
            removed
        }
    );

    assert_eq!(deleted.unwrap().map(|r| r.id), Some("1".to_string()));
    assert_eq!(
        reclassified.unwrap(),
        CorrectionOutcome::Discarded { id: "1".to_string() }
    );
    assert!(c.store().read().await.get("1").is_none());
}

#[tokio::test]
async fn refetch_dropping_record_discards_response() {
    let gate = Arc::new(Semaphore::new(0));
    let mut api = ScriptedApi::with_items(fixture());
    api.prediction_gate = Some(Arc::clone(&gate));
    let c = coordinator(api).await;

    let (reclassified, refreshed) = tokio::join!(
        c.submit_correction("2", fixed(7.0, 30.0, 10.0)),
        async {
            c.api().wait_entered().await;
            c.api().items.lock().unwrap().retain(|i| i.id_klasifikasi != "2");
            let count = c.refresh().await;
            gate.add_permits(1);
            count
        }
    );

    assert_eq!(refreshed.unwrap(), 2);
    assert_eq!(
        reclassified.unwrap(),
        CorrectionOutcome::Discarded { id: "2".to_string() }
    );
    assert_eq!(c.correction_state("2"), CorrectionState::Idle);
}

#[tokio::test]
async fn reclassification_rejected_while_delete_pending() {
    let gate = Arc::new(Semaphore::new(0));
    let mut api = ScriptedApi::with_items(fixture());
    api.delete_gate = Some(Arc::clone(&gate));
    let c = coordinator(api).await;

    let (deleted, (reclassified, second_delete)) = tokio::join!(c.delete("4"), async {
        c.api().wait_entered().await;
        assert!(c.is_pending("4", PendingOperation::Delete));
        let r = c.submit_correction("4", fixed(7.0, 26.0, 10.0)).await;
        let d = c.delete("4").await;
        gate.add_permits(1);
        (r, d)
    });

    assert!(deleted.unwrap().is_some());
    assert_eq!(
        reclassified.unwrap_err(),
        CoordinatorError::Busy {
            id: "4".to_string(),
            pending: PendingOperation::Delete
        }
    );
    assert!(matches!(
        second_delete.unwrap_err(),
        CoordinatorError::Busy { pending: PendingOperation::Delete, .. }
    ));
    assert_eq!(c.api().deletes.load(Ordering::SeqCst), 1);
    assert_eq!(c.api().predictions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn different_records_do_not_block_each_other() {
    let gate = Arc::new(Semaphore::new(0));
    let mut api = ScriptedApi::with_items(fixture());
    api.prediction_gate = Some(Arc::clone(&gate));
    let c = coordinator(api).await;

    let (first, second, _) = tokio::join!(
        c.submit_correction("1", fixed(7.0, 27.0, 10.0)),
        c.submit_correction("2", fixed(7.0, 40.0, 10.0)),
        async {
            c.api().wait_entered().await;
            c.api().wait_entered().await;
            gate.add_permits(2);
        }
    );

    assert!(first.is_ok());
    assert!(matches!(second.unwrap(), CorrectionOutcome::Replaced(_)));
    assert_eq!(c.api().predictions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    let generation = c.store().read().await.generation();
    *c.api().fail_fetch.lock().unwrap() = true;

    let err = c.refresh().await.unwrap_err();
    assert_eq!(err, CoordinatorError::Network("connection refused".to_string()));
    assert_eq!(c.api().fetches.load(Ordering::SeqCst), 2);

    let store = c.store();
    let store = store.read().await;
    assert_eq!(store.len(), 3);
    assert_eq!(store.generation(), generation);
}

// ============================================================================
// Watch loop
// ============================================================================

#[tokio::test]
async fn watch_refreshes_until_cancelled() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        stopper.cancel();
    });

    let summary = run_watch(&c, Duration::from_millis(10), cancel).await;
    assert!(summary.cycles >= 2, "only {} cycles", summary.cycles);
    assert_eq!(summary.failures, 0);
    assert_eq!(summary.last_count, Some(3));
}

#[tokio::test]
async fn watch_counts_failures() {
    let c = coordinator(ScriptedApi::with_items(fixture())).await;
    *c.api().fail_fetch.lock().unwrap() = true;
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stopper.cancel();
    });

    let summary = run_watch(&c, Duration::from_millis(5), cancel).await;
    assert!(summary.failures >= 1);
    assert_eq!(summary.failures, summary.cycles);
    assert_eq!(summary.last_count, None);
    // the snapshot from setup survives
    assert_eq!(c.store().read().await.len(), 3);
}
