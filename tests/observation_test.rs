// ABOUTME: Integration tests for the observation engine over both delivery models
// ABOUTME: Verifies exactly-once delivery, retry behavior and stream cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tokio_stream::StreamExt;

use vitalbridge::capabilities::{Platform, PlatformVersion};
use vitalbridge::errors::ConnectorError;
use vitalbridge::models::{DataPoint, MetricType, MetricValue};
use vitalbridge::observation::{MetricStream, ObservationConfig, ObservationEngine};
use vitalbridge::store::simulated::SimulatedHealthStore;
use vitalbridge::store::UpdateModel;

fn health_connect_store() -> SimulatedHealthStore {
    SimulatedHealthStore::new(Platform::HealthConnect, PlatformVersion::new(34, 0))
}

fn health_kit_store() -> SimulatedHealthStore {
    SimulatedHealthStore::new(Platform::HealthKit, PlatformVersion::new(17, 0))
}

fn engine_over(store: &SimulatedHealthStore) -> ObservationEngine<SimulatedHealthStore> {
    ObservationEngine::new(Arc::new(store.clone()), ObservationConfig::default())
}

fn heart_rate(bpm: f64) -> DataPoint {
    DataPoint::new(MetricValue::HeartRate { bpm }, Utc::now())
}

fn bpm_of(point: &DataPoint) -> f64 {
    match point.value {
        MetricValue::HeartRate { bpm } => bpm,
        ref other => panic!("expected a heart rate sample, got {other:?}"),
    }
}

/// Bounded read: virtual time makes the timeout elapse instantly once the
/// runtime is otherwise idle, so "nothing more" checks are deterministic.
async fn next_point(stream: &mut MetricStream) -> Option<DataPoint> {
    timeout(Duration::from_secs(60), stream.next())
        .await
        .ok()
        .flatten()
}

#[tokio::test(start_paused = true)]
async fn test_windowed_stream_delivers_new_records_exactly_once() {
    let store = health_connect_store();
    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(5))
        .await
        .unwrap();

    store.push_record(heart_rate(71.0)).unwrap();
    store.push_record(heart_rate(72.0)).unwrap();

    let first = next_point(&mut stream).await.expect("first record");
    let second = next_point(&mut stream).await.expect("second record");
    assert!((bpm_of(&first) - 71.0).abs() < f64::EPSILON);
    assert!((bpm_of(&second) - 72.0).abs() < f64::EPSILON);

    // Later polls re-see the same records inside the overlapping window but
    // must not deliver them again.
    assert!(next_point(&mut stream).await.is_none());
    assert!(store.query_range_calls() > 2, "window should keep polling");
}

#[tokio::test(start_paused = true)]
async fn test_windowed_stream_does_not_replay_history() {
    let store = health_connect_store();
    store
        .push_record(DataPoint::new(
            MetricValue::HeartRate { bpm: 55.0 },
            Utc::now() - chrono::Duration::minutes(1),
        ))
        .unwrap();

    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(5))
        .await
        .unwrap();
    store.push_record(heart_rate(62.0)).unwrap();

    let only = next_point(&mut stream).await.expect("post-subscribe record");
    assert!((bpm_of(&only) - 62.0).abs() < f64::EPSILON);
    assert!(next_point(&mut stream).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_windowed_poll_failures_are_retried_on_the_next_tick() {
    let store = health_connect_store();
    store.fail_next_queries(2);
    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(5))
        .await
        .unwrap();
    store.push_record(heart_rate(80.0)).unwrap();

    let delivered = next_point(&mut stream).await.expect("survives failed polls");
    assert!((bpm_of(&delivered) - 80.0).abs() < f64::EPSILON);
    assert!(store.query_range_calls() >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_steady_samples_arrive_one_per_poll_cycle() {
    let store = health_connect_store();
    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(5))
        .await
        .unwrap();

    // One new native sample lands before each tick; every tick delivers it.
    let mut timestamps = Vec::new();
    for bpm in [60.0, 61.0, 62.0, 63.0] {
        store.push_record(heart_rate(bpm)).unwrap();
        let point = next_point(&mut stream).await.expect("one value per tick");
        assert!((bpm_of(&point) - bpm).abs() < f64::EPSILON);
        timestamps.push(point.timestamp);
    }

    assert_eq!(timestamps.len(), 4);
    assert!(
        timestamps.windows(2).all(|pair| pair[0] < pair[1]),
        "timestamps strictly increase"
    );
    assert!(next_point(&mut stream).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_stream_stops_polling() {
    let store = health_connect_store();
    let engine = engine_over(&store);
    let stream = engine
        .observe(MetricType::Steps, Duration::from_secs(5))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(store.query_range_calls() >= 1);

    drop(stream);
    tokio::time::sleep(Duration::from_secs(5)).await;
    let settled = store.query_range_calls();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(
        store.query_range_calls(),
        settled,
        "no polls after cancellation"
    );
}

#[tokio::test(start_paused = true)]
async fn test_incremental_stream_delivers_each_record_once() {
    let store = health_kit_store();
    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(1))
        .await
        .unwrap();

    store.push_record(heart_rate(61.0)).unwrap();
    store.push_record(heart_rate(62.0)).unwrap();
    let mut observed = vec![
        bpm_of(&next_point(&mut stream).await.expect("first")),
        bpm_of(&next_point(&mut stream).await.expect("second")),
    ];

    store.push_record(heart_rate(63.0)).unwrap();
    store.push_record(heart_rate(64.0)).unwrap();
    observed.push(bpm_of(&next_point(&mut stream).await.expect("third")));
    observed.push(bpm_of(&next_point(&mut stream).await.expect("fourth")));

    assert_eq!(observed, vec![61.0, 62.0, 63.0, 64.0]);
    assert!(next_point(&mut stream).await.is_none());
    assert_eq!(
        store.query_range_calls(),
        0,
        "incremental delivery never polls"
    );
}

#[tokio::test]
async fn test_incremental_open_failure_is_reported() {
    let store = health_kit_store();
    store.fail_next_subscriptions(1);
    let engine = engine_over(&store);

    let err = engine
        .observe(MetricType::HeartRate, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::DataAccessFailed { .. }));
    assert!(err.is_transient());
}

#[tokio::test(start_paused = true)]
async fn test_update_model_override_switches_delivery_strategy() {
    // A Health Connect build that gained anchor feeds for heart rate.
    let store = health_connect_store()
        .with_update_model(MetricType::HeartRate, UpdateModel::Incremental);
    let engine = engine_over(&store);
    let mut stream = engine
        .observe(MetricType::HeartRate, Duration::from_secs(5))
        .await
        .unwrap();

    store.push_record(heart_rate(90.0)).unwrap();
    let delivered = next_point(&mut stream).await.expect("fed incrementally");
    assert!((bpm_of(&delivered) - 90.0).abs() < f64::EPSILON);
    assert_eq!(store.query_range_calls(), 0);
}

#[tokio::test]
async fn test_observe_rejects_zero_sampling_interval() {
    let engine = engine_over(&health_connect_store());
    let err = engine
        .observe(MetricType::HeartRate, Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::ValidationFailed {
            field: "sampling_interval",
            ..
        }
    ));
}
