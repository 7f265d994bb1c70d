// ABOUTME: High-level connector facade tying every engine together behind one trait
// ABOUTME: Gates reads and writes through the capability registry before touching the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Connector Facade
//!
//! [`HealthConnector`] is the one trait applications program against. A
//! [`StoreConnector`] implements it over any [`HealthStore`], wiring the
//! capability registry, permission negotiator, observation engine, session
//! engine and statistics aggregator together at initialization.
//!
//! Every read path is gated through the capability table first, so an
//! unsupported metric fails with [`ConnectorError::MetricUnavailable`]
//! before any platform call is made. Writes additionally distinguish "this
//! platform derives that metric itself" from "this metric does not exist
//! here".
//!
//! Raw store errors never cross this boundary: they surface as
//! [`ConnectorError::DataAccessFailed`] with the failing operation named.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::capabilities::{CapabilityDescriptor, CapabilityRegistry, Platform, PlatformVersion};
use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::{
    DataPoint, MetricType, Permission, PermissionStatus, SessionId, StatOp, StatisticsResult,
    TimeRange, WorkoutSession, WorkoutType,
};
use crate::observation::{MetricStream, ObservationConfig, ObservationEngine};
use crate::permissions::PermissionNegotiator;
use crate::sessions::{SessionConfig, SessionEngine, SessionRegistry, SessionSummary, SessionTotals};
use crate::statistics::StatisticsEngine;
use crate::store::{HealthStore, StoreAvailability};
use crate::units::ConversionTable;

/// Tuning for a connector instance.
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    /// Settings for the observation engine.
    pub observation: ObservationConfig,
}

impl ConnectorConfig {
    /// Replace the observation settings.
    #[must_use]
    pub fn with_observation(mut self, observation: ObservationConfig) -> Self {
        self.observation = observation;
        self
    }
}

/// The unified surface applications program against.
///
/// Object safe: hold a `Box<dyn HealthConnector>` or `Arc<dyn
/// HealthConnector>` to stay independent of the concrete store.
#[async_trait]
pub trait HealthConnector: Send + Sync {
    /// The platform behind this connector.
    fn platform(&self) -> Platform;

    /// The platform release the capability table was built for.
    fn platform_version(&self) -> PlatformVersion;

    /// Support flags for one metric on this platform release.
    fn capabilities_of(&self, metric: MetricType) -> CapabilityDescriptor;

    /// Every capability descriptor, ordered by metric.
    fn all_capabilities(&self) -> Vec<CapabilityDescriptor>;

    /// Request permission pairs, presenting the system UI at most once.
    async fn request_permissions(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus>;

    /// Report the current status of permission pairs without any UI.
    async fn check_permissions(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus>;

    /// The most recent record of `metric`, if any.
    async fn read_latest(&self, metric: MetricType) -> ConnectorResult<Option<DataPoint>>;

    /// All records of `metric` inside `range`, ascending by timestamp.
    async fn read_range(
        &self,
        metric: MetricType,
        range: TimeRange,
    ) -> ConnectorResult<Vec<DataPoint>>;

    /// Persist one record, returning the uid the store assigned.
    async fn write(&self, point: DataPoint) -> ConnectorResult<String>;

    /// Observe new records of `metric` as a cancellable stream.
    async fn observe(
        &self,
        metric: MetricType,
        sampling_interval: Duration,
    ) -> ConnectorResult<MetricStream>;

    /// Start a workout session.
    async fn start_session(
        &self,
        workout_type: WorkoutType,
        config: SessionConfig,
    ) -> ConnectorResult<WorkoutSession>;

    /// Suspend a running session.
    async fn pause_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession>;

    /// Resume a paused session.
    async fn resume_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession>;

    /// End a session and persist its summary.
    async fn end_session(&self, id: SessionId) -> ConnectorResult<SessionSummary>;

    /// Abandon a session without persisting anything.
    async fn discard_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession>;

    /// Snapshot of one live session.
    async fn session(&self, id: SessionId) -> ConnectorResult<WorkoutSession>;

    /// Current folded totals of one live session.
    async fn session_totals(&self, id: SessionId) -> ConnectorResult<SessionTotals>;

    /// Snapshots of every live session, oldest first.
    async fn active_sessions(&self) -> Vec<WorkoutSession>;

    /// Bucketed statistics for `metric` over `range`.
    async fn statistics(
        &self,
        metric: MetricType,
        range: TimeRange,
        ops: &BTreeSet<StatOp>,
        bucket_duration: Option<Duration>,
    ) -> ConnectorResult<StatisticsResult>;
}

/// [`HealthConnector`] implementation over a concrete [`HealthStore`].
#[derive(Debug)]
pub struct StoreConnector<S: HealthStore> {
    store: Arc<S>,
    capabilities: Arc<CapabilityRegistry>,
    negotiator: PermissionNegotiator<S>,
    observation: Arc<ObservationEngine<S>>,
    sessions: SessionEngine<S>,
    statistics: StatisticsEngine<S>,
}

impl<S: HealthStore> StoreConnector<S> {
    /// Probe the store and assemble the engines over it.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` when the store reports itself
    /// unavailable or the availability probe itself fails.
    pub async fn initialize(store: S, config: ConnectorConfig) -> ConnectorResult<Self> {
        match store.availability().await {
            Ok(StoreAvailability::Available) => {}
            Ok(StoreAvailability::Unavailable { reason }) => {
                return Err(ConnectorError::initialization(reason));
            }
            Err(e) => {
                return Err(ConnectorError::initialization(format!(
                    "availability probe failed: {e}"
                )));
            }
        }

        let store = Arc::new(store);
        let capabilities = Arc::new(CapabilityRegistry::new(
            store.platform(),
            store.platform_version(),
        ));
        let conversions = Arc::new(ConversionTable::new_with(|metric| store.native_unit(metric)));
        let negotiator = PermissionNegotiator::new(Arc::clone(&store), &capabilities);
        let observation = Arc::new(ObservationEngine::new(
            Arc::clone(&store),
            config.observation,
        ));
        let sessions = SessionEngine::new(
            Arc::clone(&store),
            Arc::clone(&observation),
            Arc::clone(&capabilities),
            SessionRegistry::new(),
        );
        let statistics = StatisticsEngine::new(Arc::clone(&store), conversions);

        info!(
            platform = %store.platform(),
            version = %store.platform_version(),
            "health connector initialized"
        );
        Ok(Self {
            store,
            capabilities,
            negotiator,
            observation,
            sessions,
            statistics,
        })
    }

    fn ensure_readable(&self, metric: MetricType) -> ConnectorResult<()> {
        if self.capabilities.readable(metric) {
            Ok(())
        } else {
            Err(ConnectorError::metric_unavailable(metric))
        }
    }
}

#[async_trait]
impl<S: HealthStore> HealthConnector for StoreConnector<S> {
    fn platform(&self) -> Platform {
        self.capabilities.platform()
    }

    fn platform_version(&self) -> PlatformVersion {
        self.capabilities.version()
    }

    fn capabilities_of(&self, metric: MetricType) -> CapabilityDescriptor {
        self.capabilities.capabilities_of(metric)
    }

    fn all_capabilities(&self) -> Vec<CapabilityDescriptor> {
        self.capabilities.all()
    }

    async fn request_permissions(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus> {
        self.negotiator.request(requested).await
    }

    async fn check_permissions(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus> {
        self.negotiator.check(requested).await
    }

    async fn read_latest(&self, metric: MetricType) -> ConnectorResult<Option<DataPoint>> {
        self.ensure_readable(metric)?;
        self.store
            .query_latest(metric)
            .await
            .map_err(|e| ConnectorError::data_access(format!("reading latest {metric} record"), e))
    }

    async fn read_range(
        &self,
        metric: MetricType,
        range: TimeRange,
    ) -> ConnectorResult<Vec<DataPoint>> {
        self.ensure_readable(metric)?;
        self.store
            .query_range(metric, range)
            .await
            .map_err(|e| ConnectorError::data_access(format!("reading {metric} records"), e))
    }

    async fn write(&self, point: DataPoint) -> ConnectorResult<String> {
        let metric = point.metric();
        let descriptor = self.capabilities.capabilities_of(metric);
        if !descriptor.is_supported() {
            return Err(ConnectorError::metric_unavailable(metric));
        }
        if !descriptor.can_write {
            return Err(ConnectorError::unsupported(
                self.platform(),
                format!("writing {metric} records"),
            ));
        }
        point.value.validate()?;
        self.store
            .insert(point)
            .await
            .map_err(|e| ConnectorError::data_access(format!("writing {metric} record"), e))
    }

    async fn observe(
        &self,
        metric: MetricType,
        sampling_interval: Duration,
    ) -> ConnectorResult<MetricStream> {
        self.ensure_readable(metric)?;
        self.observation.observe(metric, sampling_interval).await
    }

    async fn start_session(
        &self,
        workout_type: WorkoutType,
        config: SessionConfig,
    ) -> ConnectorResult<WorkoutSession> {
        self.sessions.start(workout_type, config).await
    }

    async fn pause_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        self.sessions.pause(id).await
    }

    async fn resume_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        self.sessions.resume(id).await
    }

    async fn end_session(&self, id: SessionId) -> ConnectorResult<SessionSummary> {
        self.sessions.end(id).await
    }

    async fn discard_session(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        self.sessions.discard(id).await
    }

    async fn session(&self, id: SessionId) -> ConnectorResult<WorkoutSession> {
        self.sessions.session(id).await
    }

    async fn session_totals(&self, id: SessionId) -> ConnectorResult<SessionTotals> {
        self.sessions.live_totals(id).await
    }

    async fn active_sessions(&self) -> Vec<WorkoutSession> {
        self.sessions.active_sessions().await
    }

    async fn statistics(
        &self,
        metric: MetricType,
        range: TimeRange,
        ops: &BTreeSet<StatOp>,
        bucket_duration: Option<Duration>,
    ) -> ConnectorResult<StatisticsResult> {
        self.ensure_readable(metric)?;
        self.statistics
            .statistics(metric, range, ops, bucket_duration)
            .await
    }
}
