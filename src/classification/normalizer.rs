//! Canonicalization of raw classification payloads into [`AnomalyRecord`]s

use tracing::debug;

use super::ParameterEvaluator;
use crate::types::{
    finite, timestamp, AnomalyRecord, Coordinate, CorrectionValues, Parameter, ParameterReading,
    ParameterVerdict, Prediction, RawClassificationItem, RawValue, ThresholdRegistry,
};

/// Location name used when the payload carries none.
pub const UNKNOWN_LOCATION: &str = "Tidak diketahui";

/// Builds canonical anomaly records. Pure; never fails.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    evaluator: ParameterEvaluator,
}

impl RecordNormalizer {
    pub const fn new(evaluator: ParameterEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn from_registry(registry: ThresholdRegistry) -> Self {
        Self::new(ParameterEvaluator::new(registry))
    }

    pub const fn evaluator(&self) -> &ParameterEvaluator {
        &self.evaluator
    }

    /// Normalize one raw item. Returns `None` when no parameter is anomalous.
    pub fn normalize(&self, item: &RawClassificationItem) -> Option<AnomalyRecord> {
        let verdict = |p: Parameter| self.verdict_for(&item.reading(p));
        let (date, time) = timestamp::split_date_time(item.tanggal.as_deref());
        let location_coordinate = item.data_lokasi.as_ref().and_then(|l| {
            Coordinate::from_parts(finite(l.lat.as_ref()), finite(l.lon.as_ref()))
        });

        let record = self.assemble(RecordParts {
            id: item.id_klasifikasi.clone(),
            location_name: item
                .location_name()
                .unwrap_or(UNKNOWN_LOCATION)
                .to_string(),
            date,
            time,
            recorded_at: item.tanggal.clone(),
            turbidity: verdict(Parameter::Turbidity),
            ph: verdict(Parameter::Ph),
            temperature: verdict(Parameter::Temperature),
            location_coordinate,
            classification: None,
        });

        if record.is_none() {
            debug!(id = %item.id_klasifikasi, "All parameters in range, dropping from anomaly set");
        }
        record
    }

    /// Normalize a whole fetch cycle, keeping service order.
    pub fn normalize_all(&self, items: &[RawClassificationItem]) -> Vec<AnomalyRecord> {
        items.iter().filter_map(|item| self.normalize(item)).collect()
    }

    /// Rebuild a record from operator-corrected values.
    ///
    /// Every verdict and the anomaly set are recomputed from scratch; only
    /// identity, location, timestamps and sensor coordinates carry over.
    /// Returns `None` when the corrected sample is no longer anomalous.
    pub fn normalize_correction(
        &self,
        current: &AnomalyRecord,
        values: &CorrectionValues,
        prediction: &Prediction,
    ) -> Option<AnomalyRecord> {
        let verdict = |p: Parameter| {
            self.evaluator
                .evaluate(p, Some(&RawValue::Number(values.get(p))))
                .with_coordinate(current.verdict(p).coordinate)
        };

        self.assemble(RecordParts {
            id: current.id.clone(),
            location_name: current.location_name.clone(),
            date: current.date.clone(),
            time: current.time.clone(),
            recorded_at: current.recorded_at.clone(),
            turbidity: verdict(Parameter::Turbidity),
            ph: verdict(Parameter::Ph),
            temperature: verdict(Parameter::Temperature),
            location_coordinate: current.location_coordinate,
            classification: Some(prediction.klasifikasi.clone()),
        })
    }

    fn verdict_for(&self, reading: &ParameterReading) -> ParameterVerdict {
        self.evaluator
            .evaluate(reading.parameter, reading.raw_value.as_ref())
            .with_coordinate(Coordinate::from_parts(reading.latitude, reading.longitude))
    }

    fn assemble(&self, parts: RecordParts) -> Option<AnomalyRecord> {
        let registry = self.evaluator.registry();
        let anomaly_types: Vec<String> = [&parts.turbidity, &parts.ph, &parts.temperature]
            .into_iter()
            .filter(|v| v.is_anomaly)
            .map(|v| registry.label(v.parameter).to_string())
            .collect();

        if anomaly_types.is_empty() {
            return None;
        }

        Some(AnomalyRecord {
            id: parts.id,
            location_name: parts.location_name,
            date: parts.date,
            time: parts.time,
            recorded_at: parts.recorded_at,
            turbidity: parts.turbidity,
            ph: parts.ph,
            temperature: parts.temperature,
            anomaly_types,
            location_coordinate: parts.location_coordinate,
            classification: parts.classification,
        })
    }
}

struct RecordParts {
    id: String,
    location_name: String,
    date: String,
    time: String,
    recorded_at: Option<String>,
    turbidity: ParameterVerdict,
    ph: ParameterVerdict,
    temperature: ParameterVerdict,
    location_coordinate: Option<Coordinate>,
    classification: Option<String>,
}
