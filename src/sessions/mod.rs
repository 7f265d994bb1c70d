// ABOUTME: Workout session engine with lifecycle management and live metric fan-out
// ABOUTME: Folds observed samples into running totals and persists a summary on end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Workout Session Engine
//!
//! A session ties a group of metric observations to one workout. Starting a
//! session opens a stream per tracked metric and folds every sample into
//! [`SessionTotals`] as it arrives, so callers can show live distance,
//! calories and heart rate without querying.
//!
//! ## Lifecycle
//!
//! ```text
//! Preparing -> Running <-> Paused
//!                 |           |
//!                 +--> Ended (summary persisted)
//!                 +--> Discarded (nothing persisted)
//! ```
//!
//! `Preparing` only exists while `start` is opening subscriptions; callers
//! always observe `Running` first. Ending a session removes it from the
//! registry before anything else, so of two racing `end` calls exactly one
//! persists a summary and the other gets `SessionNotFound`.

mod registry;

pub use registry::SessionRegistry;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::capabilities::CapabilityRegistry;
use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::{
    DataPoint, DataSource, MetricType, MetricValue, SessionId, SessionState, WorkoutSession,
    WorkoutType,
};
use crate::observation::{MetricStream, ObservationEngine};
use crate::store::HealthStore;

/// Source name stamped on records this library writes.
const RECORDING_APP: &str = "vitalbridge";

/// What a session tracks and how often its streams sample.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Poll cadence for the session's metric streams.
    pub sampling_interval: Duration,
    /// Track instantaneous speed.
    pub include_speed: bool,
    /// Track power output.
    pub include_power: bool,
    /// Track pedaling cadence.
    pub include_cadence: bool,
    /// Track steps taken during the session.
    pub include_steps: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sampling_interval: Duration::from_secs(5),
            include_speed: false,
            include_power: false,
            include_cadence: false,
            include_steps: false,
        }
    }
}

impl SessionConfig {
    /// Replace the stream sampling cadence.
    #[must_use]
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Also track instantaneous speed.
    #[must_use]
    pub const fn with_speed(mut self) -> Self {
        self.include_speed = true;
        self
    }

    /// Also track power output.
    #[must_use]
    pub const fn with_power(mut self) -> Self {
        self.include_power = true;
        self
    }

    /// Also track pedaling cadence.
    #[must_use]
    pub const fn with_cadence(mut self) -> Self {
        self.include_cadence = true;
        self
    }

    /// Also track steps taken during the session.
    #[must_use]
    pub const fn with_steps(mut self) -> Self {
        self.include_steps = true;
        self
    }

    /// The metrics this configuration asks to track, before capability
    /// filtering.
    #[must_use]
    pub fn tracked_metrics(&self) -> Vec<MetricType> {
        let mut metrics = vec![
            MetricType::HeartRate,
            MetricType::ActiveCalories,
            MetricType::Distance,
        ];
        if self.include_speed {
            metrics.push(MetricType::Speed);
        }
        if self.include_power {
            metrics.push(MetricType::Power);
        }
        if self.include_cadence {
            metrics.push(MetricType::CyclingCadence);
        }
        if self.include_steps {
            metrics.push(MetricType::Steps);
        }
        metrics
    }
}

/// Running totals folded from a session's metric streams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Active energy burned so far, kilocalories.
    pub active_calories: f64,
    /// Distance covered so far, meters.
    pub distance_meters: f64,
    /// Steps taken so far.
    pub step_count: u64,
    /// Lowest heart rate sample seen.
    pub min_heart_rate: Option<f64>,
    /// Highest heart rate sample seen.
    pub max_heart_rate: Option<f64>,
    /// Most recent heart rate sample.
    pub last_heart_rate: Option<f64>,
    /// Samples folded so far across all streams.
    pub samples_seen: u64,
    speed_sum: f64,
    speed_samples: u64,
    power_sum: f64,
    power_samples: u64,
    cadence_sum: f64,
    cadence_samples: u64,
}

impl SessionTotals {
    /// Fold one observed value into the totals.
    ///
    /// Values outside the session's vocabulary are ignored.
    pub fn apply(&mut self, value: &MetricValue) {
        match *value {
            MetricValue::HeartRate { bpm } => {
                self.min_heart_rate = Some(self.min_heart_rate.map_or(bpm, |m| m.min(bpm)));
                self.max_heart_rate = Some(self.max_heart_rate.map_or(bpm, |m| m.max(bpm)));
                self.last_heart_rate = Some(bpm);
            }
            MetricValue::ActiveCalories { kilocalories } => {
                self.active_calories += kilocalories;
            }
            MetricValue::Distance { meters } => {
                self.distance_meters += meters;
            }
            MetricValue::Steps { count } => {
                self.step_count += count;
            }
            MetricValue::Speed { meters_per_second } => {
                self.speed_sum += meters_per_second;
                self.speed_samples += 1;
            }
            MetricValue::Power { watts } => {
                self.power_sum += watts;
                self.power_samples += 1;
            }
            MetricValue::CyclingCadence { rpm } => {
                self.cadence_sum += rpm;
                self.cadence_samples += 1;
            }
            _ => return,
        }
        self.samples_seen += 1;
    }

    /// Mean speed over the session, meters per second.
    #[must_use]
    pub fn average_speed(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        (self.speed_samples > 0).then(|| self.speed_sum / self.speed_samples as f64)
    }

    /// Mean power over the session, watts.
    #[must_use]
    pub fn average_power(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        (self.power_samples > 0).then(|| self.power_sum / self.power_samples as f64)
    }

    /// Mean cadence over the session, revolutions per minute.
    #[must_use]
    pub fn average_cadence(&self) -> Option<f64> {
        #[allow(clippy::cast_precision_loss)]
        (self.cadence_samples > 0).then(|| self.cadence_sum / self.cadence_samples as f64)
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// The session this summarizes.
    pub id: SessionId,
    /// The kind of workout.
    pub workout_type: WorkoutType,
    /// When tracking started.
    pub started_at: DateTime<Utc>,
    /// When the session ended.
    pub ended_at: DateTime<Utc>,
    /// Wall-clock length of the session.
    pub duration: Duration,
    /// Final folded totals.
    pub totals: SessionTotals,
    /// Uid of the workout record persisted to the store.
    pub record_uid: String,
}

/// One live stream being folded for a session. Dropping it stops the fold
/// and, through the stream, the observation behind it.
#[derive(Debug)]
pub(crate) struct SessionCollector {
    metric: MetricType,
    task: JoinHandle<()>,
}

impl Drop for SessionCollector {
    fn drop(&mut self) {
        self.task.abort();
        debug!(metric = %self.metric, "session collector stopped");
    }
}

#[derive(Debug)]
pub(crate) struct ActiveSession {
    pub(crate) snapshot: WorkoutSession,
    pub(crate) sampling_interval: Duration,
    pub(crate) metrics: Vec<MetricType>,
    pub(crate) collectors: Vec<SessionCollector>,
    pub(crate) totals: Arc<Mutex<SessionTotals>>,
}

/// Runs workout sessions over a health store.
#[derive(Debug)]
pub struct SessionEngine<S: HealthStore> {
    store: Arc<S>,
    observation: Arc<ObservationEngine<S>>,
    capabilities: Arc<CapabilityRegistry>,
    registry: SessionRegistry,
}

impl<S: HealthStore> SessionEngine<S> {
    /// An engine running sessions over `store`, observing through
    /// `observation` and filtering tracked metrics through `capabilities`.
    pub fn new(
        store: Arc<S>,
        observation: Arc<ObservationEngine<S>>,
        capabilities: Arc<CapabilityRegistry>,
        registry: SessionRegistry,
    ) -> Self {
        Self {
            store,
            observation,
            capabilities,
            registry,
        }
    }

    /// Start tracking a workout.
    ///
    /// Opens one observation stream per tracked metric the platform can
    /// read; unreadable metrics are skipped rather than failing the start.
    /// The returned snapshot is already `Running`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for a zero sampling interval and
    /// `DataAccessFailed` when a subscription cannot be opened.
    pub async fn start(
        &self,
        workout_type: WorkoutType,
        config: SessionConfig,
    ) -> ConnectorResult<WorkoutSession> {
        let mut metrics = config.tracked_metrics();
        metrics.retain(|&metric| {
            let readable = self.capabilities.capabilities_of(metric).can_read;
            if !readable {
                debug!(metric = %metric, "skipping unreadable session metric");
            }
            readable
        });

        let snapshot = WorkoutSession {
            id: Uuid::new_v4(),
            workout_type,
            state: SessionState::Preparing,
            started_at: Utc::now(),
        };
        let totals = Arc::new(Mutex::new(SessionTotals::default()));
        let collectors = self
            .open_collectors(&metrics, config.sampling_interval, &totals)
            .await?;

        let mut snapshot = snapshot;
        snapshot.state = SessionState::Running;
        self.registry
            .insert(ActiveSession {
                snapshot: snapshot.clone(),
                sampling_interval: config.sampling_interval,
                metrics,
                collectors,
                totals,
            })
            .await;
        info!(
            session = %snapshot.id,
            workout = %workout_type,
            "workout session started"
        );
        Ok(snapshot)
    }

    /// Suspend a running session, stopping its streams.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids and `ValidationFailed` when
    /// the session is not `Running`.
    pub async fn pause(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        let mut sessions = self.registry.write().await;
        let active = sessions
            .get_mut(&id)
            .ok_or(ConnectorError::session_not_found(id))?;
        if active.snapshot.state != SessionState::Running {
            return Err(ConnectorError::validation(
                "session_state",
                format!("cannot pause a session in state {}", active.snapshot.state),
            ));
        }
        active.collectors.clear();
        active.snapshot.state = SessionState::Paused;
        info!(session = %id, "workout session paused");
        Ok(active.snapshot.clone())
    }

    /// Resume a paused session, reopening its streams.
    ///
    /// Totals keep their pre-pause values; samples recorded while paused are
    /// not back-filled. Streams are reopened without holding the registry
    /// lock, so a slow platform subscribe stalls only this call; the state
    /// change commits afterwards, re-checking the session is still paused.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown ids, `ValidationFailed` when
    /// the session is not `Paused`, and `DataAccessFailed` when a
    /// subscription cannot be reopened (the session then stays `Paused`).
    pub async fn resume(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        let (state, metrics, sampling_interval, totals) = self
            .registry
            .with_session(id, |active| {
                (
                    active.snapshot.state,
                    active.metrics.clone(),
                    active.sampling_interval,
                    Arc::clone(&active.totals),
                )
            })
            .await
            .ok_or(ConnectorError::session_not_found(id))?;
        if state != SessionState::Paused {
            return Err(ConnectorError::validation(
                "session_state",
                format!("cannot resume a session in state {state}"),
            ));
        }

        // The registry lock must not be held across this await: a hung
        // native subscribe would block every other session operation.
        let collectors = self
            .open_collectors(&metrics, sampling_interval, &totals)
            .await?;

        let mut sessions = self.registry.write().await;
        let active = sessions
            .get_mut(&id)
            .ok_or(ConnectorError::session_not_found(id))?;
        if active.snapshot.state != SessionState::Paused {
            // Lost a race against another resume; the fresh collectors are
            // dropped and their streams cancelled.
            return Err(ConnectorError::validation(
                "session_state",
                format!("cannot resume a session in state {}", active.snapshot.state),
            ));
        }
        active.collectors = collectors;
        active.snapshot.state = SessionState::Running;
        info!(session = %id, "workout session resumed");
        Ok(active.snapshot.clone())
    }

    /// End a session, persisting its summary as a workout record.
    ///
    /// The session leaves the registry before anything else happens, so a
    /// second `end` for the same id gets `SessionNotFound`. If persisting
    /// fails the session is still gone; the error carries the store failure.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown or already-ended ids and
    /// `DataAccessFailed` when the summary record cannot be written.
    pub async fn end(&self, id: SessionId) -> ConnectorResult<SessionSummary> {
        let mut active = self
            .registry
            .remove(id)
            .await
            .ok_or(ConnectorError::session_not_found(id))?;
        active.collectors.clear();

        let ended_at = Utc::now();
        let duration = (ended_at - active.snapshot.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let totals = active
            .totals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let tracked = |metric: MetricType| active.metrics.contains(&metric);
        let value = MetricValue::Workout {
            workout_type: active.snapshot.workout_type,
            duration_seconds: duration.as_secs_f64(),
            total_active_calories: tracked(MetricType::ActiveCalories)
                .then_some(totals.active_calories),
            total_distance_meters: tracked(MetricType::Distance)
                .then_some(totals.distance_meters),
            min_heart_rate_bpm: totals.min_heart_rate,
            max_heart_rate_bpm: totals.max_heart_rate,
            step_count: tracked(MetricType::Steps).then_some(totals.step_count),
        };
        let point = DataPoint::new(value, ended_at)
            .with_source(DataSource::application(RECORDING_APP));
        let record_uid = self
            .store
            .insert(point)
            .await
            .map_err(|e| ConnectorError::data_access("persisting workout summary", e))?;

        info!(
            session = %id,
            uid = %record_uid,
            samples = totals.samples_seen,
            "workout session ended"
        );
        Ok(SessionSummary {
            id,
            workout_type: active.snapshot.workout_type,
            started_at: active.snapshot.started_at,
            ended_at,
            duration,
            totals,
            record_uid,
        })
    }

    /// Abandon a session without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for unknown or already-ended ids.
    pub async fn discard(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        let mut active = self
            .registry
            .remove(id)
            .await
            .ok_or(ConnectorError::session_not_found(id))?;
        active.collectors.clear();
        active.snapshot.state = SessionState::Discarded;
        info!(session = %id, "workout session discarded");
        Ok(active.snapshot)
    }

    /// Snapshot of one live session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when the id is not live.
    pub async fn session(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        self.registry
            .snapshot(id)
            .await
            .ok_or(ConnectorError::session_not_found(id))
    }

    /// Current folded totals of one live session.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when the id is not live.
    pub async fn live_totals(&self, id: SessionId) -> ConnectorResult<SessionTotals> {
        self.registry
            .with_session(id, |active| {
                active
                    .totals
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            })
            .await
            .ok_or(ConnectorError::session_not_found(id))
    }

    /// Snapshots of every live session, oldest first.
    pub async fn active_sessions(&self) -> Vec<WorkoutSession> {
        self.registry.snapshots().await
    }

    async fn open_collectors(
        &self,
        metrics: &[MetricType],
        sampling_interval: Duration,
        totals: &Arc<Mutex<SessionTotals>>,
    ) -> ConnectorResult<Vec<SessionCollector>> {
        let mut collectors = Vec::with_capacity(metrics.len());
        for &metric in metrics {
            let stream = self.observation.observe(metric, sampling_interval).await?;
            let totals = Arc::clone(totals);
            let task = tokio::spawn(collect(stream, totals));
            collectors.push(SessionCollector { metric, task });
        }
        Ok(collectors)
    }
}

/// Fold every sample from `stream` into the shared totals until the stream
/// ends or the collector is dropped.
async fn collect(mut stream: MetricStream, totals: Arc<Mutex<SessionTotals>>) {
    let metric = stream.metric();
    while let Some(point) = stream.next().await {
        let mut guard = totals.lock().unwrap_or_else(PoisonError::into_inner);
        guard.apply(&point.value);
    }
    debug!(metric = %metric, "session collector finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_fold_each_value_kind() {
        let mut totals = SessionTotals::default();
        totals.apply(&MetricValue::HeartRate { bpm: 150.0 });
        totals.apply(&MetricValue::HeartRate { bpm: 120.0 });
        totals.apply(&MetricValue::HeartRate { bpm: 140.0 });
        totals.apply(&MetricValue::ActiveCalories { kilocalories: 12.5 });
        totals.apply(&MetricValue::Distance { meters: 400.0 });
        totals.apply(&MetricValue::Distance { meters: 350.0 });
        totals.apply(&MetricValue::Steps { count: 60 });
        totals.apply(&MetricValue::Speed {
            meters_per_second: 3.0,
        });
        totals.apply(&MetricValue::Speed {
            meters_per_second: 4.0,
        });

        assert_eq!(totals.min_heart_rate, Some(120.0));
        assert_eq!(totals.max_heart_rate, Some(150.0));
        assert_eq!(totals.last_heart_rate, Some(140.0));
        assert!((totals.active_calories - 12.5).abs() < f64::EPSILON);
        assert!((totals.distance_meters - 750.0).abs() < f64::EPSILON);
        assert_eq!(totals.step_count, 60);
        assert_eq!(totals.average_speed(), Some(3.5));
        assert_eq!(totals.samples_seen, 9);
    }

    #[test]
    fn test_totals_ignore_values_outside_the_session_vocabulary() {
        let mut totals = SessionTotals::default();
        totals.apply(&MetricValue::BloodGlucose { mmol_per_liter: 5.2 });
        assert_eq!(totals.samples_seen, 0);
    }

    #[test]
    fn test_averages_are_absent_without_samples() {
        let totals = SessionTotals::default();
        assert_eq!(totals.average_speed(), None);
        assert_eq!(totals.average_power(), None);
        assert_eq!(totals.average_cadence(), None);
    }

    #[test]
    fn test_default_config_tracks_the_base_metrics() {
        let metrics = SessionConfig::default().tracked_metrics();
        assert_eq!(
            metrics,
            vec![
                MetricType::HeartRate,
                MetricType::ActiveCalories,
                MetricType::Distance
            ]
        );
    }

    #[test]
    fn test_config_flags_extend_the_tracked_set() {
        let metrics = SessionConfig::default()
            .with_speed()
            .with_steps()
            .tracked_metrics();
        assert!(metrics.contains(&MetricType::Speed));
        assert!(metrics.contains(&MetricType::Steps));
        assert!(!metrics.contains(&MetricType::Power));
    }
}
