// ABOUTME: In-memory simulated health store for development and testing
// ABOUTME: Provides record injection, grant policies and fault injection without a device
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Simulated Health Store
//!
//! A full [`HealthStore`] implementation backed by in-memory maps. Unlike the
//! real platform adapters it:
//!
//! - requires no device, emulator or system health app
//! - accepts injected records at any time (`push_record`)
//! - resolves permission prompts through a configurable [`GrantPolicy`]
//! - can impersonate either platform at any version
//! - supports fault injection (failures and stalls) for query, subscription
//!   and grant-lookup paths
//!
//! ## Use Cases
//!
//! - **Development**: exercise engines without platform bindings
//! - **CI**: run the whole integration suite on any host
//! - **Demos**: preload believable data and run the public API against it
//!
//! ## Thread Safety
//!
//! All state is behind `RwLock`s, and the store is `Clone`: tests keep one
//! handle for injection while the connector owns another.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::capabilities::{Platform, PlatformVersion};
use crate::models::{DataPoint, MetricType, StatOp, TimeRange};
use crate::store::{
    HealthStore, IncrementalFeed, NativeToken, StoreAvailability, StoreError, StoreResult,
    UpdateModel,
};
use crate::units::{self, Unit};

/// How many pushed records an open incremental feed may buffer before the
/// oldest are dropped with a warning.
const FEED_BUFFER: usize = 256;

/// How the simulated permission prompt decides each requested token.
#[derive(Debug, Clone)]
pub enum GrantPolicy {
    /// Grant everything that is asked for.
    GrantAll,
    /// Deny everything that is asked for.
    DenyAll,
    /// Grant only tokens contained in the set, deny the rest.
    GrantOnly(HashSet<NativeToken>),
}

/// In-memory health store impersonating a platform at a chosen version.
#[derive(Clone)]
pub struct SimulatedHealthStore {
    platform: Platform,
    version: PlatformVersion,
    records: Arc<RwLock<HashMap<MetricType, Vec<DataPoint>>>>,
    feeds: Arc<RwLock<HashMap<MetricType, broadcast::Sender<DataPoint>>>>,
    grants: Arc<RwLock<HashSet<NativeToken>>>,
    grant_policy: Arc<RwLock<GrantPolicy>>,
    availability: Arc<RwLock<StoreAvailability>>,
    native_units: Arc<RwLock<HashMap<MetricType, Unit>>>,
    update_models: Arc<RwLock<HashMap<MetricType, UpdateModel>>>,
    query_range_calls: Arc<AtomicUsize>,
    authorize_calls: Arc<AtomicUsize>,
    failing_queries: Arc<AtomicUsize>,
    failing_subscriptions: Arc<AtomicUsize>,
    stalled_subscriptions: Arc<AtomicUsize>,
    failing_grant_lookups: Arc<AtomicUsize>,
}

impl SimulatedHealthStore {
    /// A store impersonating `platform` at `version`, empty and granting
    /// every permission request.
    #[must_use]
    pub fn new(platform: Platform, version: PlatformVersion) -> Self {
        Self {
            platform,
            version,
            records: Arc::new(RwLock::new(HashMap::new())),
            feeds: Arc::new(RwLock::new(HashMap::new())),
            grants: Arc::new(RwLock::new(HashSet::new())),
            grant_policy: Arc::new(RwLock::new(GrantPolicy::GrantAll)),
            availability: Arc::new(RwLock::new(StoreAvailability::Available)),
            native_units: Arc::new(RwLock::new(HashMap::new())),
            update_models: Arc::new(RwLock::new(HashMap::new())),
            query_range_calls: Arc::new(AtomicUsize::new(0)),
            authorize_calls: Arc::new(AtomicUsize::new(0)),
            failing_queries: Arc::new(AtomicUsize::new(0)),
            failing_subscriptions: Arc::new(AtomicUsize::new(0)),
            stalled_subscriptions: Arc::new(AtomicUsize::new(0)),
            failing_grant_lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the grant policy, consuming the builder.
    #[must_use]
    pub fn with_grant_policy(self, policy: GrantPolicy) -> Self {
        self.set_grant_policy(policy);
        self
    }

    /// Report `metric` aggregates in `unit` instead of the base unit.
    #[must_use]
    pub fn with_native_unit(self, metric: MetricType, unit: Unit) -> Self {
        if let Ok(mut units) = self.native_units.write() {
            units.insert(metric, unit);
        }
        self
    }

    /// Override the delivery model for `metric` (defaults follow the
    /// impersonated platform).
    #[must_use]
    pub fn with_update_model(self, metric: MetricType, model: UpdateModel) -> Self {
        if let Ok(mut models) = self.update_models.write() {
            models.insert(metric, model);
        }
        self
    }

    /// Mark the store unavailable with the given reason.
    #[must_use]
    pub fn with_unavailable(self, reason: impl Into<String>) -> Self {
        if let Ok(mut availability) = self.availability.write() {
            *availability = StoreAvailability::Unavailable {
                reason: reason.into(),
            };
        }
        self
    }

    /// Swap the grant policy at runtime.
    pub fn set_grant_policy(&self, policy: GrantPolicy) {
        if let Ok(mut current) = self.grant_policy.write() {
            *current = policy;
        }
    }

    /// Preseed already-granted tokens, as if a previous run authorized them.
    pub fn grant(&self, tokens: impl IntoIterator<Item = NativeToken>) {
        if let Ok(mut grants) = self.grants.write() {
            grants.extend(tokens);
        }
    }

    /// Inject a record, assigning a uid when the point has none, and wake any
    /// open incremental feed for its metric.
    ///
    /// Returns the stored point (uid always present).
    ///
    /// # Errors
    ///
    /// Returns an error if an internal lock is poisoned.
    pub fn push_record(&self, point: DataPoint) -> StoreResult<DataPoint> {
        self.store_point(point)
    }

    /// All stored records of `metric`, ascending by timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if an internal lock is poisoned.
    pub fn records_of(&self, metric: MetricType) -> StoreResult<Vec<DataPoint>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: records lock"))?;
        Ok(records.get(&metric).cloned().unwrap_or_default())
    }

    /// Number of `query_range` calls the store has served (or failed).
    #[must_use]
    pub fn query_range_calls(&self) -> usize {
        self.query_range_calls.load(Ordering::SeqCst)
    }

    /// Number of times the permission prompt was presented.
    #[must_use]
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` range queries fail with an injected error.
    pub fn fail_next_queries(&self, n: usize) {
        self.failing_queries.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` subscription attempts fail.
    pub fn fail_next_subscriptions(&self, n: usize) {
        self.failing_subscriptions.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` subscription attempts hang forever, like a native
    /// call that never comes back.
    pub fn stall_next_subscriptions(&self, n: usize) {
        self.stalled_subscriptions.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` grant lookups fail.
    pub fn fail_next_grant_lookups(&self, n: usize) {
        self.failing_grant_lookups.store(n, Ordering::SeqCst);
    }

    fn store_point(&self, mut point: DataPoint) -> StoreResult<DataPoint> {
        if point.uid.is_none() {
            point.uid = Some(Uuid::new_v4().to_string());
        }
        let metric = point.metric();
        {
            let mut records = self
                .records
                .write()
                .map_err(|_| StoreError::new("RwLock poisoned: records lock"))?;
            let list = records.entry(metric).or_default();
            let index = list.partition_point(|existing| existing.timestamp <= point.timestamp);
            list.insert(index, point.clone());
        }
        let feeds = self
            .feeds
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: feeds lock"))?;
        if let Some(sender) = feeds.get(&metric) {
            // A send error only means no feed is currently listening.
            let _ = sender.send(point.clone());
        }
        Ok(point)
    }

    fn take_injected_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl std::fmt::Debug for SimulatedHealthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHealthStore")
            .field("platform", &self.platform)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HealthStore for SimulatedHealthStore {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn platform_version(&self) -> PlatformVersion {
        self.version
    }

    async fn availability(&self) -> StoreResult<StoreAvailability> {
        let availability = self
            .availability
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: availability lock"))?;
        Ok(availability.clone())
    }

    fn native_unit(&self, metric: MetricType) -> Unit {
        self.native_units
            .read()
            .ok()
            .and_then(|units| units.get(&metric).copied())
            .unwrap_or_else(|| units::base_unit(metric))
    }

    fn update_model(&self, metric: MetricType) -> UpdateModel {
        let platform_default = match self.platform {
            Platform::HealthKit => UpdateModel::Incremental,
            Platform::HealthConnect => UpdateModel::Windowed,
        };
        self.update_models
            .read()
            .ok()
            .and_then(|models| models.get(&metric).copied())
            .unwrap_or(platform_default)
    }

    async fn query_latest(&self, metric: MetricType) -> StoreResult<Option<DataPoint>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: records lock"))?;
        Ok(records.get(&metric).and_then(|list| list.last().cloned()))
    }

    async fn query_range(
        &self,
        metric: MetricType,
        range: TimeRange,
    ) -> StoreResult<Vec<DataPoint>> {
        self.query_range_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_injected_failure(&self.failing_queries) {
            return Err(StoreError::new("injected range query failure"));
        }
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: records lock"))?;
        let hits = records
            .get(&metric)
            .map(|list| {
                list.iter()
                    .filter(|point| range.contains(point.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(hits)
    }

    async fn subscribe_incremental(
        &self,
        metric: MetricType,
    ) -> StoreResult<Box<dyn IncrementalFeed>> {
        if Self::take_injected_failure(&self.stalled_subscriptions) {
            std::future::pending::<()>().await;
        }
        if Self::take_injected_failure(&self.failing_subscriptions) {
            return Err(StoreError::new("injected subscription failure"));
        }
        let mut feeds = self
            .feeds
            .write()
            .map_err(|_| StoreError::new("RwLock poisoned: feeds lock"))?;
        let sender = feeds
            .entry(metric)
            .or_insert_with(|| broadcast::channel(FEED_BUFFER).0);
        Ok(Box::new(SimulatedFeed {
            metric,
            receiver: sender.subscribe(),
        }))
    }

    async fn aggregate(
        &self,
        metric: MetricType,
        range: TimeRange,
        ops: &[StatOp],
    ) -> StoreResult<HashMap<StatOp, f64>> {
        let points = self.query_range(metric, range).await?;
        let magnitudes: Vec<f64> = points
            .iter()
            .filter_map(|point| point.value.magnitude())
            .collect();

        let native = self.native_unit(metric);
        let base = units::base_unit(metric);
        let to_native = |value: f64| {
            units::convert(value, base, native)
                .map_err(|_| StoreError::new(format!("no native representation in {native}")))
        };

        let mut result = HashMap::new();
        for &op in ops {
            match op {
                #[allow(clippy::cast_precision_loss)]
                StatOp::Count => {
                    result.insert(op, points.len() as f64);
                }
                StatOp::Sum => {
                    result.insert(op, to_native(magnitudes.iter().sum())?);
                }
                StatOp::Average => {
                    #[allow(clippy::cast_precision_loss)]
                    if !magnitudes.is_empty() {
                        let mean = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
                        result.insert(op, to_native(mean)?);
                    }
                }
                StatOp::Minimum => {
                    if let Some(min) = magnitudes.iter().copied().reduce(f64::min) {
                        result.insert(op, to_native(min)?);
                    }
                }
                StatOp::Maximum => {
                    if let Some(max) = magnitudes.iter().copied().reduce(f64::max) {
                        result.insert(op, to_native(max)?);
                    }
                }
            }
        }
        Ok(result)
    }

    async fn insert(&self, point: DataPoint) -> StoreResult<String> {
        let stored = self.store_point(point)?;
        stored
            .uid
            .ok_or_else(|| StoreError::new("stored record lost its uid"))
    }

    async fn authorize(&self, tokens: &[NativeToken]) -> StoreResult<Vec<NativeToken>> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        let policy = self
            .grant_policy
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: grant_policy lock"))?
            .clone();
        let newly_granted: Vec<NativeToken> = match policy {
            GrantPolicy::GrantAll => tokens.to_vec(),
            GrantPolicy::DenyAll => Vec::new(),
            GrantPolicy::GrantOnly(allowed) => tokens
                .iter()
                .filter(|token| allowed.contains(token))
                .cloned()
                .collect(),
        };
        let mut grants = self
            .grants
            .write()
            .map_err(|_| StoreError::new("RwLock poisoned: grants lock"))?;
        grants.extend(newly_granted);
        // Grants are monotonic, so answer with everything requested that is
        // now granted, including tokens granted on earlier prompts.
        Ok(tokens
            .iter()
            .filter(|token| grants.contains(token))
            .cloned()
            .collect())
    }

    async fn granted_tokens(&self) -> StoreResult<HashSet<NativeToken>> {
        if Self::take_injected_failure(&self.failing_grant_lookups) {
            return Err(StoreError::new("injected grant lookup failure"));
        }
        let grants = self
            .grants
            .read()
            .map_err(|_| StoreError::new("RwLock poisoned: grants lock"))?;
        Ok(grants.clone())
    }
}

struct SimulatedFeed {
    metric: MetricType,
    receiver: broadcast::Receiver<DataPoint>,
}

#[async_trait]
impl IncrementalFeed for SimulatedFeed {
    async fn next_batch(&mut self) -> StoreResult<Vec<DataPoint>> {
        loop {
            match self.receiver.recv().await {
                Ok(point) => return Ok(vec![point]),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(
                        metric = %self.metric,
                        missed,
                        "incremental feed lagged, oldest records dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(StoreError::new("incremental feed closed"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricValue;
    use chrono::{Duration, Utc};

    fn store() -> SimulatedHealthStore {
        SimulatedHealthStore::new(Platform::HealthConnect, PlatformVersion::new(34, 0))
    }

    fn heart_rate(bpm: f64, at: chrono::DateTime<Utc>) -> DataPoint {
        DataPoint::new(MetricValue::HeartRate { bpm }, at)
    }

    #[tokio::test]
    async fn test_pushed_records_come_back_sorted_and_uided() {
        let store = store();
        let now = Utc::now();
        store.push_record(heart_rate(80.0, now)).unwrap();
        store
            .push_record(heart_rate(70.0, now - Duration::seconds(30)))
            .unwrap();

        let range = TimeRange::new(now - Duration::minutes(5), now + Duration::seconds(1)).unwrap();
        let points = store.query_range(MetricType::HeartRate, range).await.unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0].timestamp < points[1].timestamp);
        assert!(points.iter().all(|p| p.uid.is_some()));
    }

    #[tokio::test]
    async fn test_query_range_respects_half_open_bounds() {
        let store = store();
        let start = Utc::now();
        let end = start + Duration::seconds(60);
        store.push_record(heart_rate(60.0, start)).unwrap();
        store.push_record(heart_rate(61.0, end)).unwrap();

        let range = TimeRange::new(start, end).unwrap();
        let points = store.query_range(MetricType::HeartRate, range).await.unwrap();
        assert_eq!(points.len(), 1, "end bound must be exclusive");
    }

    #[tokio::test]
    async fn test_aggregate_reports_native_units() {
        let store = store().with_native_unit(MetricType::ActiveCalories, Unit::Joules);
        let now = Utc::now();
        store
            .push_record(DataPoint::new(
                MetricValue::ActiveCalories { kilocalories: 2.0 },
                now,
            ))
            .unwrap();

        let range = TimeRange::new(now - Duration::minutes(1), now + Duration::minutes(1)).unwrap();
        let values = store
            .aggregate(MetricType::ActiveCalories, range, &[StatOp::Sum, StatOp::Count])
            .await
            .unwrap();
        assert!((values[&StatOp::Sum] - 8_368.0).abs() < 1e-9);
        assert!((values[&StatOp::Count] - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_aggregate_omits_uncomputable_ops() {
        let store = store();
        let now = Utc::now();
        let range = TimeRange::new(now - Duration::minutes(1), now).unwrap();
        let values = store
            .aggregate(
                MetricType::HeartRate,
                range,
                &[StatOp::Average, StatOp::Minimum, StatOp::Count],
            )
            .await
            .unwrap();
        assert!(!values.contains_key(&StatOp::Average));
        assert!(!values.contains_key(&StatOp::Minimum));
        assert!((values[&StatOp::Count]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_grant_policy_partitions_requests() {
        let read_steps = NativeToken::read("android.permission.health.READ_STEPS");
        let read_hr = NativeToken::read("android.permission.health.READ_HEART_RATE");
        let store = store().with_grant_policy(GrantPolicy::GrantOnly(
            [read_steps.clone()].into_iter().collect(),
        ));

        let granted = store
            .authorize(&[read_steps.clone(), read_hr.clone()])
            .await
            .unwrap();
        assert_eq!(granted, vec![read_steps.clone()]);

        let remembered = store.granted_tokens().await.unwrap();
        assert!(remembered.contains(&read_steps));
        assert!(!remembered.contains(&read_hr));
        assert_eq!(store.authorize_calls(), 1);
    }

    #[tokio::test]
    async fn test_grants_are_monotonic_across_prompts() {
        let token = NativeToken::read("android.permission.health.READ_STEPS");
        let store = store();
        store.authorize(&[token.clone()]).await.unwrap();
        store.set_grant_policy(GrantPolicy::DenyAll);

        // A later prompt cannot take the earlier grant away.
        let granted = store.authorize(&[token.clone()]).await.unwrap();
        assert_eq!(granted, vec![token]);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed_in_order() {
        let store = store();
        store.fail_next_queries(1);
        let range = TimeRange::new(Utc::now() - Duration::minutes(1), Utc::now()).unwrap();

        assert!(store.query_range(MetricType::Steps, range).await.is_err());
        assert!(store.query_range(MetricType::Steps, range).await.is_ok());
        assert_eq!(store.query_range_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_subscriptions_never_return() {
        let store = SimulatedHealthStore::new(Platform::HealthKit, PlatformVersion::new(17, 0));
        store.stall_next_subscriptions(1);

        let stalled = tokio::time::timeout(
            std::time::Duration::from_secs(60),
            store.subscribe_incremental(MetricType::HeartRate),
        )
        .await;
        assert!(stalled.is_err(), "stalled call must hang");

        // The stall is consumed; the next attempt completes.
        assert!(store
            .subscribe_incremental(MetricType::HeartRate)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_incremental_feed_sees_only_records_after_subscribe() {
        let store =
            SimulatedHealthStore::new(Platform::HealthKit, PlatformVersion::new(17, 0));
        store.push_record(heart_rate(55.0, Utc::now())).unwrap();

        let mut feed = store
            .subscribe_incremental(MetricType::HeartRate)
            .await
            .unwrap();
        let pushed = store.push_record(heart_rate(66.0, Utc::now())).unwrap();

        let batch = feed.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].uid, pushed.uid);
    }
}
