//! Pipeline Regression Tests
//!
//! Runs captured service payloads (tests/fixtures) through normalization,
//! the anomaly collection and the series aggregator, and pins the results:
//! which records survive, their messages, view counts, pagination, and
//! chart statistics.

use std::path::PathBuf;

use sungai_watch::classification::UNKNOWN_LOCATION;
use sungai_watch::collection::{AnomalyCollection, Category, LocationFilter, ALL_LOCATIONS};
use sungai_watch::series::{self, WindowOptions};
use sungai_watch::types::{
    Coordinate, ListEnvelope, Parameter, RawClassificationItem, RawSample, SortOrder, StatValue,
    MSG_INVALID, MSG_UNAVAILABLE,
};
use sungai_watch::RecordNormalizer;

fn fixture<T: serde::de::DeserializeOwned>(name: &str) -> Vec<T> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    let envelope: ListEnvelope<T> = serde_json::from_str(&raw).unwrap();
    assert!(envelope.success);
    envelope.data
}

fn loaded_collection(page_size: usize) -> AnomalyCollection {
    let items: Vec<RawClassificationItem> = fixture("klasifikasi_all.json");
    let mut collection = AnomalyCollection::new(page_size);
    let kept = collection.ingest(&items, &RecordNormalizer::default());
    assert_eq!(kept, 6);
    collection
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn only_anomalous_items_survive_in_service_order() {
    let collection = loaded_collection(10);
    let ids: Vec<&str> = collection.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "104", "105", "106", "107"]);
}

#[test]
fn anomaly_messages_and_types_are_pinned() {
    let collection = loaded_collection(10);

    let r101 = collection.get("101").unwrap();
    assert_eq!(r101.anomaly_types, vec!["pH"]);
    assert_eq!(r101.ph.message, "Terlalu rendah (5.5 < 6)");
    assert_eq!((r101.date.as_str(), r101.time.as_str()), ("01/05/2024", "08:00:00"));

    let r102 = collection.get("102").unwrap();
    assert_eq!(r102.anomaly_types, vec!["Turbidity", "Temperature"]);
    assert_eq!(r102.temperature.message, "Terlalu tinggi (36 > 35)");
    assert_eq!(r102.turbidity.message, "Terlalu tinggi (300 > 200)");

    let r104 = collection.get("104").unwrap();
    assert_eq!(r104.anomaly_types, vec!["Turbidity"]);
    assert_eq!(r104.ph.message, MSG_INVALID);
    assert!(!r104.ph.is_anomaly);
    assert_eq!(r104.temperature.message, MSG_UNAVAILABLE);
    assert_eq!(r104.temperature.value, None);

    let r105 = collection.get("105").unwrap();
    assert_eq!(r105.anomaly_types, vec!["pH", "Temperature"]);
    assert_eq!(r105.temperature.message, "Terlalu rendah (9.9 < 10)");
    // -1 sits on the inclusive lower bound
    assert!(!r105.turbidity.is_anomaly);

    let r106 = collection.get("106").unwrap();
    assert_eq!(r106.location_name, UNKNOWN_LOCATION);
    assert_eq!(r106.turbidity.message, "Terlalu rendah (-1.5 < -1)");

    let r107 = collection.get("107").unwrap();
    assert_eq!((r107.date.as_str(), r107.time.as_str()), ("invalid-date", ""));
}

#[test]
fn representative_coordinate_follows_priority() {
    let collection = loaded_collection(10);
    let coord = |id: &str| collection.get(id).unwrap().representative_coordinate();

    // pH sensor first
    assert_eq!(
        coord("101"),
        Some(Coordinate { latitude: -7.961, longitude: 112.631 })
    );
    // no pH coordinate, temperature sensor next (delivered as strings)
    assert_eq!(
        coord("102"),
        Some(Coordinate { latitude: -7.97, longitude: 112.64 })
    );
    // no sensor coordinates, fall back to the location
    assert_eq!(
        coord("105"),
        Some(Coordinate { latitude: -6.2, longitude: 106.83 })
    );
    assert_eq!(
        coord("106"),
        Some(Coordinate { latitude: -6.5, longitude: 106.9 })
    );
    assert_eq!(coord("107"), None);
}

// ============================================================================
// View
// ============================================================================

#[test]
fn category_counts_follow_location_filter() {
    let mut collection = loaded_collection(10);

    let all = collection.category_counts();
    assert_eq!((all.all, all.turbidity, all.ph, all.temperature), (6, 3, 3, 2));

    collection.set_location(LocationFilter::Named("Sungai Ciliwung".to_string()));
    let ciliwung = collection.category_counts();
    assert_eq!(
        (ciliwung.all, ciliwung.turbidity, ciliwung.ph, ciliwung.temperature),
        (3, 1, 2, 1)
    );

    collection.set_category(Category::Ph);
    let ids: Vec<&str> = collection.filtered().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["105", "107"]);
}

#[test]
fn pagination_over_filtered_view() {
    let mut collection = loaded_collection(4);
    assert_eq!(collection.total_pages(), 2);
    assert!(collection.has_next_page());
    assert!(!collection.has_prev_page());

    collection.set_page(2);
    let page = collection.page_view();
    let ids: Vec<&str> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["106", "107"]);
    assert!(!collection.has_next_page());

    // changing the filter returns to page 1
    collection.set_category(Category::Temperature);
    assert_eq!(collection.page(), 1);
    assert_eq!(collection.total_pages(), 1);
}

#[test]
fn location_selector_lists_sentinel_then_names() {
    let collection = loaded_collection(10);
    assert_eq!(
        collection.location_options(ALL_LOCATIONS),
        vec![ALL_LOCATIONS, "Sungai Brantas", "Sungai Ciliwung", UNKNOWN_LOCATION]
    );
}

// ============================================================================
// Series
// ============================================================================

#[test]
fn summaries_skip_non_numeric_points() {
    let samples: Vec<RawSample> = fixture("data_combined.json");
    let summaries = series::summarize_all(&samples);
    let by = |p: Parameter| summaries.iter().find(|s| s.parameter == p).unwrap().clone();

    let ph = by(Parameter::Ph);
    assert_eq!((ph.min, ph.max, ph.avg, ph.count), (
        StatValue::Value(6.5),
        StatValue::Value(8.0),
        StatValue::Value(7.25),
        4
    ));

    let temperature = by(Parameter::Temperature);
    assert_eq!(temperature.avg, StatValue::Value(26.63));
    assert_eq!(temperature.count, 4);

    let turbidity = by(Parameter::Turbidity);
    assert_eq!(turbidity.avg, StatValue::Value(12.0));
    assert_eq!(turbidity.min, StatValue::Value(10.0));
}

#[test]
fn chart_windows_page_newest_first() {
    let samples: Vec<RawSample> = fixture("data_combined.json");

    let first = series::windowed(&samples, 1, 2, Parameter::Ph);
    assert_eq!(first.values, vec![6.5, 0.0]);
    assert_eq!(first.labels, vec!["01/05 11:00", "01/05 10:00"]);
    assert_eq!(first.total_pages, 3);

    let last = series::windowed(&samples, 3, 2, Parameter::Ph);
    assert_eq!(last.values, vec![8.0]);
    assert_eq!(last.labels, vec!["bad-ts"]);

    let beyond = series::windowed(&samples, 4, 2, Parameter::Ph);
    assert!(beyond.values.is_empty());
    assert!(beyond.labels.is_empty());

    assert_eq!(
        series::latest(&samples).and_then(|s| s.tanggal.as_deref()),
        Some("2024-05-01 11:00:00")
    );
}

#[test]
fn oldest_first_window_starts_with_unparseable() {
    let samples: Vec<RawSample> = fixture("data_combined.json");
    let options = WindowOptions {
        order: SortOrder::OldestFirst,
        label_format: "%H:%M".to_string(),
    };
    let window = series::windowed_with(&samples, 1, 3, Parameter::Turbidity, &options);
    assert_eq!(window.values, vec![11.0, 10.0, 12.0]);
    assert_eq!(window.labels, vec!["bad-ts", "08:00", "09:00"]);
}
