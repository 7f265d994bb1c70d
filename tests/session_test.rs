// ABOUTME: Integration tests for the workout session lifecycle
// ABOUTME: Covers live totals folding, pause/resume semantics and summary persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use vitalbridge::capabilities::{CapabilityRegistry, Platform, PlatformVersion};
use vitalbridge::errors::ConnectorError;
use vitalbridge::models::{
    DataPoint, MetricType, MetricValue, SessionId, SessionState, SourceOrigin, WorkoutType,
};
use vitalbridge::observation::{ObservationConfig, ObservationEngine};
use vitalbridge::sessions::{SessionConfig, SessionEngine, SessionRegistry, SessionTotals};
use vitalbridge::store::simulated::SimulatedHealthStore;

fn harness() -> (SimulatedHealthStore, SessionEngine<SimulatedHealthStore>) {
    let platform = Platform::HealthKit;
    let version = PlatformVersion::new(17, 0);
    let store = SimulatedHealthStore::new(platform, version);
    let shared = Arc::new(store.clone());
    let engine = SessionEngine::new(
        Arc::clone(&shared),
        Arc::new(ObservationEngine::new(
            Arc::clone(&shared),
            ObservationConfig::default(),
        )),
        Arc::new(CapabilityRegistry::new(platform, version)),
        SessionRegistry::new(),
    );
    (store, engine)
}

fn sample(value: MetricValue) -> DataPoint {
    DataPoint::new(value, Utc::now())
}

/// Virtual-time sleeps let the collector tasks run; the loop bounds how long
/// we are willing to wait for the fold to catch up.
async fn totals_with_samples(
    engine: &SessionEngine<SimulatedHealthStore>,
    id: SessionId,
    at_least: u64,
) -> SessionTotals {
    for _ in 0..200 {
        let totals = engine.live_totals(id).await.unwrap();
        if totals.samples_seen >= at_least {
            return totals;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("collectors never folded {at_least} samples");
}

#[tokio::test(start_paused = true)]
async fn test_start_returns_a_running_session() {
    let (_store, engine) = harness();
    let session = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();

    assert_eq!(session.state, SessionState::Running);
    assert_eq!(session.workout_type, WorkoutType::Running);
    assert_eq!(engine.session(session.id).await.unwrap(), session);
    assert_eq!(engine.active_sessions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_live_totals_fold_streamed_samples() {
    let (store, engine) = harness();
    let session = engine
        .start(WorkoutType::Cycling, SessionConfig::default().with_steps())
        .await
        .unwrap();

    store
        .push_record(sample(MetricValue::HeartRate { bpm: 150.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::HeartRate { bpm: 120.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::ActiveCalories { kilocalories: 10.5 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::Distance { meters: 120.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::Steps { count: 500 }))
        .unwrap();

    let totals = totals_with_samples(&engine, session.id, 5).await;
    assert_eq!(totals.min_heart_rate, Some(120.0));
    assert_eq!(totals.max_heart_rate, Some(150.0));
    assert_eq!(totals.last_heart_rate, Some(120.0));
    assert!((totals.active_calories - 10.5).abs() < f64::EPSILON);
    assert!((totals.distance_meters - 120.0).abs() < f64::EPSILON);
    assert_eq!(totals.step_count, 500);

    store
        .push_record(sample(MetricValue::ActiveCalories { kilocalories: 4.5 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::Distance { meters: 80.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::Steps { count: 250 }))
        .unwrap();

    let totals = totals_with_samples(&engine, session.id, 8).await;
    assert!((totals.active_calories - 15.0).abs() < f64::EPSILON);
    assert!((totals.distance_meters - 200.0).abs() < f64::EPSILON);
    assert_eq!(totals.step_count, 750);
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_folding_and_resume_restarts() {
    let (store, engine) = harness();
    let session = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();

    store
        .push_record(sample(MetricValue::HeartRate { bpm: 100.0 }))
        .unwrap();
    totals_with_samples(&engine, session.id, 1).await;

    let paused = engine.pause(session.id).await.unwrap();
    assert_eq!(paused.state, SessionState::Paused);

    // Recorded while paused; must never reach the totals.
    store
        .push_record(sample(MetricValue::HeartRate { bpm: 160.0 }))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    let totals = engine.live_totals(session.id).await.unwrap();
    assert_eq!(totals.samples_seen, 1);
    assert_eq!(totals.max_heart_rate, Some(100.0));

    let resumed = engine.resume(session.id).await.unwrap();
    assert_eq!(resumed.state, SessionState::Running);
    store
        .push_record(sample(MetricValue::HeartRate { bpm: 140.0 }))
        .unwrap();

    let totals = totals_with_samples(&engine, session.id, 2).await;
    assert_eq!(totals.min_heart_rate, Some(100.0));
    assert_eq!(totals.max_heart_rate, Some(140.0), "paused sample leaked in");
    assert_eq!(totals.last_heart_rate, Some(140.0));
}

#[tokio::test(start_paused = true)]
async fn test_a_stalled_resume_does_not_block_other_sessions() {
    let (store, engine) = harness();
    let engine = Arc::new(engine);

    let stuck = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();
    let healthy = engine
        .start(WorkoutType::Cycling, SessionConfig::default())
        .await
        .unwrap();
    engine.pause(stuck.id).await.unwrap();

    // The next platform subscribe hangs forever, wedging the resume while
    // it reopens the session's streams.
    store.stall_next_subscriptions(1);
    let resumer = {
        let engine = Arc::clone(&engine);
        let id = stuck.id;
        tokio::spawn(async move { engine.resume(id).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!resumer.is_finished(), "resume must be wedged on the store");

    // Unrelated sessions keep answering while the resume hangs.
    let snapshot = timeout(Duration::from_secs(5), engine.session(healthy.id))
        .await
        .expect("snapshot must not wait on the stalled resume")
        .unwrap();
    assert_eq!(snapshot.id, healthy.id);
    timeout(Duration::from_secs(5), engine.live_totals(healthy.id))
        .await
        .expect("totals must not wait on the stalled resume")
        .unwrap();

    // Abandoning the wedged call leaves the session untouched.
    resumer.abort();
    let unchanged = engine.session(stuck.id).await.unwrap();
    assert_eq!(unchanged.state, SessionState::Paused);

    // The stall was consumed; a fresh resume goes through.
    let resumed = engine.resume(stuck.id).await.unwrap();
    assert_eq!(resumed.state, SessionState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_end_persists_one_workout_record() {
    let (store, engine) = harness();
    let session = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();

    store
        .push_record(sample(MetricValue::HeartRate { bpm: 150.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::ActiveCalories { kilocalories: 12.0 }))
        .unwrap();
    store
        .push_record(sample(MetricValue::Distance { meters: 340.0 }))
        .unwrap();
    totals_with_samples(&engine, session.id, 3).await;

    let summary = engine.end(session.id).await.unwrap();
    assert_eq!(summary.id, session.id);
    assert_eq!(summary.workout_type, WorkoutType::Running);
    assert!(summary.ended_at >= summary.started_at);
    assert_eq!(summary.totals.max_heart_rate, Some(150.0));

    let records = store.records_of(MetricType::Workout).unwrap();
    assert_eq!(records.len(), 1, "exactly one summary record");
    let record = &records[0];
    assert_eq!(record.uid.as_deref(), Some(summary.record_uid.as_str()));

    let source = record.source.as_ref().expect("summary carries its source");
    assert_eq!(source.name, "vitalbridge");
    assert_eq!(source.origin, SourceOrigin::Application);

    match &record.value {
        MetricValue::Workout {
            workout_type,
            total_active_calories,
            total_distance_meters,
            min_heart_rate_bpm,
            max_heart_rate_bpm,
            step_count,
            ..
        } => {
            assert_eq!(*workout_type, WorkoutType::Running);
            assert_eq!(*total_active_calories, Some(12.0));
            assert_eq!(*total_distance_meters, Some(340.0));
            assert_eq!(*min_heart_rate_bpm, Some(150.0));
            assert_eq!(*max_heart_rate_bpm, Some(150.0));
            assert_eq!(*step_count, None, "steps were not tracked");
        }
        other => panic!("expected a workout record, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_ending_a_paused_session_is_legal() {
    let (store, engine) = harness();
    let session = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();
    engine.pause(session.id).await.unwrap();

    let summary = engine.end(session.id).await.unwrap();
    assert!(summary.ended_at >= summary.started_at);
    assert!(
        engine.active_sessions().await.is_empty(),
        "ended sessions leave the registry"
    );
    assert!(matches!(
        engine.session(session.id).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert_eq!(store.records_of(MetricType::Workout).unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ending_twice_reports_the_session_gone() {
    let (_store, engine) = harness();
    let session = engine
        .start(WorkoutType::Walking, SessionConfig::default())
        .await
        .unwrap();

    engine.end(session.id).await.unwrap();
    let err = engine.end(session.id).await.unwrap_err();
    assert!(matches!(err, ConnectorError::SessionNotFound { .. }));
    let err = engine.pause(session.id).await.unwrap_err();
    assert!(matches!(err, ConnectorError::SessionNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_discard_persists_nothing() {
    let (store, engine) = harness();
    let session = engine
        .start(WorkoutType::Yoga, SessionConfig::default())
        .await
        .unwrap();
    store
        .push_record(sample(MetricValue::HeartRate { bpm: 90.0 }))
        .unwrap();
    totals_with_samples(&engine, session.id, 1).await;

    let discarded = engine.discard(session.id).await.unwrap();
    assert_eq!(discarded.state, SessionState::Discarded);
    assert!(store.records_of(MetricType::Workout).unwrap().is_empty());
    assert!(engine.active_sessions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_guards_reject_wrong_states() {
    let (_store, engine) = harness();
    let session = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();

    let err = engine.resume(session.id).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::ValidationFailed {
            field: "session_state",
            ..
        }
    ));

    engine.pause(session.id).await.unwrap();
    let err = engine.pause(session.id).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectorError::ValidationFailed {
            field: "session_state",
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_session_ids_are_reported() {
    let (_store, engine) = harness();
    let unknown = uuid::Uuid::new_v4();

    assert!(matches!(
        engine.pause(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert!(matches!(
        engine.resume(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert!(matches!(
        engine.end(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert!(matches!(
        engine.discard(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert!(matches!(
        engine.session(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
    assert!(matches!(
        engine.live_totals(unknown).await.unwrap_err(),
        ConnectorError::SessionNotFound { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_active_sessions_list_follows_the_lifecycle() {
    let (_store, engine) = harness();
    let first = engine
        .start(WorkoutType::Running, SessionConfig::default())
        .await
        .unwrap();
    let second = engine
        .start(WorkoutType::Swimming, SessionConfig::default())
        .await
        .unwrap();

    let listed = engine.active_sessions().await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id, "ordered by start time");
    assert_eq!(listed[1].id, second.id);

    engine.end(first.id).await.unwrap();
    let listed = engine.active_sessions().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, second.id);
}
