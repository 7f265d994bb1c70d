// ABOUTME: Integration tests for the connector facade over a simulated store
// ABOUTME: Covers initialization, capability gating, writes and end-to-end flows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use vitalbridge::capabilities::{Platform, PlatformVersion};
use vitalbridge::connector::{ConnectorConfig, HealthConnector, StoreConnector};
use vitalbridge::errors::ConnectorError;
use vitalbridge::models::{
    DataPoint, MetricType, MetricValue, Permission, PermissionStatus, StatOp, TimeRange,
    WorkoutType,
};
use vitalbridge::sessions::SessionConfig;
use vitalbridge::store::simulated::SimulatedHealthStore;

fn health_kit_store() -> SimulatedHealthStore {
    SimulatedHealthStore::new(Platform::HealthKit, PlatformVersion::new(17, 0))
}

fn health_connect_store() -> SimulatedHealthStore {
    SimulatedHealthStore::new(Platform::HealthConnect, PlatformVersion::new(36, 0))
}

async fn connector_over(store: &SimulatedHealthStore) -> StoreConnector<SimulatedHealthStore> {
    StoreConnector::initialize(store.clone(), ConnectorConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_initialize_rejects_an_unavailable_store() {
    let store = health_connect_store().with_unavailable("Health Connect is not installed");

    let err = StoreConnector::initialize(store, ConnectorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::InitializationFailed { .. }));
    assert_eq!(
        err.to_string(),
        "connector initialization failed: Health Connect is not installed"
    );
}

#[tokio::test]
async fn test_reads_gate_on_platform_support() {
    let connector = connector_over(&health_connect_store()).await;

    let err = connector
        .read_latest(MetricType::UvExposure)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::MetricUnavailable {
            metric: MetricType::UvExposure
        }
    ));
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let connector = connector_over(&health_kit_store()).await;
    let point = DataPoint::new(
        MetricValue::Weight { kilograms: 81.4 },
        Utc.with_ymd_and_hms(2026, 2, 1, 7, 30, 0).unwrap(),
    );

    let uid = connector.write(point).await.unwrap();
    let latest = connector
        .read_latest(MetricType::Weight)
        .await
        .unwrap()
        .expect("the written record is readable");

    assert_eq!(latest.uid.as_deref(), Some(uid.as_str()));
    assert_eq!(latest.value, MetricValue::Weight { kilograms: 81.4 });
}

#[tokio::test]
async fn test_write_rejects_platform_derived_metrics() {
    let connector = connector_over(&health_kit_store()).await;
    let point = DataPoint::new(MetricValue::ExerciseTime { minutes: 30.0 }, Utc::now());

    let err = connector.write(point).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::UnsupportedOnPlatform {
            platform: Platform::HealthKit,
            ..
        }
    ));
}

#[tokio::test]
async fn test_write_rejects_unsupported_metrics() {
    let connector = connector_over(&health_connect_store()).await;
    let point = DataPoint::new(MetricValue::BodyMassIndex { index: 22.5 }, Utc::now());

    let err = connector.write(point).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::MetricUnavailable {
            metric: MetricType::BodyMassIndex
        }
    ));
}

#[tokio::test]
async fn test_write_validates_the_payload() {
    let connector = connector_over(&health_kit_store()).await;
    let point = DataPoint::new(MetricValue::HeartRate { bpm: -5.0 }, Utc::now());

    let err = connector.write(point).await.unwrap_err();
    assert!(matches!(err, ConnectorError::ValidationFailed { .. }));
}

#[tokio::test]
async fn test_observe_gates_on_capability() {
    let connector = connector_over(&health_connect_store()).await;

    let err = connector
        .observe(MetricType::RunningPower, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::MetricUnavailable {
            metric: MetricType::RunningPower
        }
    ));
}

#[tokio::test]
async fn test_statistics_flow_through_the_facade() {
    let store = health_connect_store();
    let day = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    store
        .push_record(DataPoint::new(
            MetricValue::Steps { count: 4000 },
            day + chrono::Duration::hours(9),
        ))
        .unwrap();
    store
        .push_record(DataPoint::new(
            MetricValue::Steps { count: 6000 },
            day + chrono::Duration::hours(17),
        ))
        .unwrap();
    let connector = connector_over(&store).await;

    let range = TimeRange::new(day, day + chrono::Duration::days(1)).unwrap();
    let result = connector
        .statistics(
            MetricType::Steps,
            range,
            &BTreeSet::from([StatOp::Sum]),
            None,
        )
        .await
        .unwrap();
    assert!((result.buckets[0].values[&StatOp::Sum] - 10000.0).abs() < 1e-9);

    // Statistics are capability-gated like every other read.
    let err = connector
        .statistics(
            MetricType::UvExposure,
            range,
            &BTreeSet::from([StatOp::Count]),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::MetricUnavailable { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_sessions_flow_through_the_facade() {
    let store = health_kit_store();
    let connector = connector_over(&store).await;

    let session = connector
        .start_session(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();
    assert_eq!(connector.active_sessions().await.len(), 1);

    let summary = connector.end_session(session.id).await.unwrap();
    assert_eq!(summary.id, session.id);
    assert_eq!(store.records_of(MetricType::Workout).unwrap().len(), 1);
    assert!(connector.active_sessions().await.is_empty());
}

#[tokio::test]
async fn test_permissions_flow_through_the_facade() {
    let connector = connector_over(&health_kit_store()).await;
    let requested = BTreeSet::from([
        Permission::read(MetricType::HeartRate),
        Permission::write(MetricType::Weight),
    ]);

    let status = connector.request_permissions(&requested).await.unwrap();
    assert_eq!(status, PermissionStatus::Granted);
    let status = connector.check_permissions(&requested).await.unwrap();
    assert_eq!(status, PermissionStatus::Granted);
}

#[tokio::test]
async fn test_the_connector_is_object_safe() {
    let boxed: Box<dyn HealthConnector> =
        Box::new(connector_over(&health_kit_store()).await);

    assert_eq!(boxed.platform(), Platform::HealthKit);
    assert_eq!(
        boxed.read_latest(MetricType::HeartRate).await.unwrap(),
        None
    );
}
