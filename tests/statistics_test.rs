// ABOUTME: Integration tests for range statistics and bucketing
// ABOUTME: Covers op filtering by aggregation kind, unit normalization and bucket carving
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use vitalbridge::capabilities::{Platform, PlatformVersion};
use vitalbridge::errors::ConnectorError;
use vitalbridge::models::{
    DataPoint, MetricType, MetricValue, StatOp, TimeRange, WorkoutType,
};
use vitalbridge::statistics::StatisticsEngine;
use vitalbridge::store::simulated::SimulatedHealthStore;
use vitalbridge::store::HealthStore;
use vitalbridge::units::{ConversionTable, Unit};

fn store() -> SimulatedHealthStore {
    SimulatedHealthStore::new(Platform::HealthConnect, PlatformVersion::new(36, 0))
}

fn engine_over(store: &SimulatedHealthStore) -> StatisticsEngine<SimulatedHealthStore> {
    let shared = Arc::new(store.clone());
    let conversions = Arc::new(ConversionTable::new_with(|metric| {
        shared.native_unit(metric)
    }));
    StatisticsEngine::new(shared, conversions)
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

fn steps(count: u64, timestamp: DateTime<Utc>) -> DataPoint {
    DataPoint::new(MetricValue::Steps { count }, timestamp)
}

fn ops(selected: impl IntoIterator<Item = StatOp>) -> BTreeSet<StatOp> {
    selected.into_iter().collect()
}

#[tokio::test]
async fn test_whole_range_is_a_single_bucket() {
    let store = store();
    store.push_record(steps(1000, at(1, 8))).unwrap();
    store.push_record(steps(2000, at(1, 12))).unwrap();
    store.push_record(steps(500, at(1, 20))).unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();
    let result = engine
        .statistics(
            MetricType::Steps,
            range,
            &ops([StatOp::Sum, StatOp::Count]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(result.metric, MetricType::Steps);
    assert_eq!(result.buckets.len(), 1);
    let bucket = &result.buckets[0];
    assert_eq!(bucket.range, range);
    assert!((bucket.values[&StatOp::Sum] - 3500.0).abs() < 1e-9);
    assert!((bucket.values[&StatOp::Count] - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_daily_buckets_carve_the_range() {
    let store = store();
    store.push_record(steps(1000, at(1, 9))).unwrap();
    store.push_record(steps(2000, at(1, 18))).unwrap();
    store.push_record(steps(500, at(2, 12))).unwrap();
    store.push_record(steps(4000, at(3, 7))).unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(4, 0)).unwrap();
    let result = engine
        .statistics(
            MetricType::Steps,
            range,
            &ops([StatOp::Sum, StatOp::Count]),
            Some(Duration::from_secs(24 * 60 * 60)),
        )
        .await
        .unwrap();

    assert_eq!(result.buckets.len(), 3);
    let sums: Vec<f64> = result
        .buckets
        .iter()
        .map(|bucket| bucket.values[&StatOp::Sum])
        .collect();
    assert_eq!(sums, vec![3000.0, 500.0, 4000.0]);
    assert!((result.buckets[0].values[&StatOp::Count] - 2.0).abs() < 1e-9);

    // Buckets tile the range without gaps.
    for pair in result.buckets.windows(2) {
        assert_eq!(pair[0].range.end, pair[1].range.start);
    }
    assert_eq!(result.buckets[0].range.start, range.start);
    assert_eq!(result.buckets[2].range.end, range.end);
}

#[tokio::test]
async fn test_ops_outside_the_aggregation_kind_are_dropped() {
    let store = store();
    store
        .push_record(DataPoint::new(
            MetricValue::HeartRate { bpm: 60.0 },
            at(1, 8),
        ))
        .unwrap();
    store
        .push_record(DataPoint::new(
            MetricValue::HeartRate { bpm: 80.0 },
            at(1, 9),
        ))
        .unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();
    let result = engine
        .statistics(
            MetricType::HeartRate,
            range,
            &ops([StatOp::Sum, StatOp::Average, StatOp::Count]),
            None,
        )
        .await
        .unwrap();

    let bucket = &result.buckets[0];
    assert!(
        !bucket.values.contains_key(&StatOp::Sum),
        "summing heart rate samples is meaningless"
    );
    assert!((bucket.values[&StatOp::Average] - 70.0).abs() < 1e-9);
    assert!((bucket.values[&StatOp::Count] - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_recorded_metrics_support_count_only() {
    let store = store();
    let workout = MetricValue::Workout {
        workout_type: WorkoutType::Running,
        duration_seconds: 1800.0,
        total_active_calories: None,
        total_distance_meters: None,
        min_heart_rate_bpm: None,
        max_heart_rate_bpm: None,
        step_count: None,
    };
    store
        .push_record(DataPoint::new(workout.clone(), at(1, 7)))
        .unwrap();
    store
        .push_record(DataPoint::new(workout, at(1, 19)))
        .unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();
    let result = engine
        .statistics(
            MetricType::Workout,
            range,
            &ops([StatOp::Count, StatOp::Sum, StatOp::Average]),
            None,
        )
        .await
        .unwrap();

    let bucket = &result.buckets[0];
    assert_eq!(bucket.values.len(), 1);
    assert!((bucket.values[&StatOp::Count] - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_native_units_are_normalized_to_base() {
    let store = store().with_native_unit(MetricType::Distance, Unit::Miles);
    store
        .push_record(DataPoint::new(
            MetricValue::Distance { meters: 1609.344 },
            at(1, 10),
        ))
        .unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();
    let result = engine
        .statistics(MetricType::Distance, range, &ops([StatOp::Sum]), None)
        .await
        .unwrap();

    // The store reports one mile; the result is back in meters.
    let sum = result.buckets[0].values[&StatOp::Sum];
    assert!((sum - 1609.344).abs() < 1e-6, "got {sum}");
}

#[tokio::test]
async fn test_store_failures_are_wrapped() {
    let store = store();
    store.fail_next_queries(1);
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();
    let err = engine
        .statistics(MetricType::Steps, range, &ops([StatOp::Sum]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::DataAccessFailed { .. }));
}

#[tokio::test]
async fn test_empty_op_sets_are_rejected() {
    let engine = engine_over(&store());
    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();

    let err = engine
        .statistics(MetricType::Steps, range, &BTreeSet::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::ValidationFailed { field: "ops", .. }
    ));
}

#[tokio::test]
async fn test_zero_bucket_duration_is_rejected() {
    let engine = engine_over(&store());
    let range = TimeRange::new(at(1, 0), at(2, 0)).unwrap();

    let err = engine
        .statistics(
            MetricType::Steps,
            range,
            &ops([StatOp::Count]),
            Some(Duration::ZERO),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::ValidationFailed {
            field: "bucket_duration",
            ..
        }
    ));
}

#[tokio::test]
async fn test_final_bucket_truncates_at_the_range_end() {
    let store = store();
    store.push_record(steps(100, at(1, 0))).unwrap();
    let engine = engine_over(&store);

    let range = TimeRange::new(at(1, 0), at(1, 1)).unwrap();
    let result = engine
        .statistics(
            MetricType::Steps,
            range,
            &ops([StatOp::Count]),
            Some(Duration::from_secs(25 * 60)),
        )
        .await
        .unwrap();

    assert_eq!(result.buckets.len(), 3);
    let last = &result.buckets[2];
    assert_eq!(last.range.end, range.end);
    assert_eq!(
        last.range.duration(),
        chrono::Duration::minutes(10),
        "the tail bucket is shorter"
    );
}
