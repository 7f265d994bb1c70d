// ABOUTME: Observation engine unifying incremental and windowed change delivery
// ABOUTME: Exposes every metric as one cancellable stream regardless of platform model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Observation Engine
//!
//! The two platforms signal "new data" in incompatible ways. HealthKit hands
//! out anchor-backed feeds that deliver exactly the records added since the
//! last read. Health Connect only signals *that* something changed, so new
//! records must be re-queried from a trailing window and deduplicated.
//!
//! The engine hides the difference behind [`MetricStream`]: callers pick a
//! metric and a sampling interval, and receive each new record exactly once,
//! starting from the moment of subscription. Dropping the stream cancels the
//! background work.
//!
//! ## Failure Handling
//!
//! Opening an incremental subscription can fail and is reported to the
//! caller. Once a stream is live, read and poll failures are logged and
//! retried so a transient platform error never kills an observation.

mod anchored;
mod windowed;

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::{DataPoint, MetricCategory, MetricType};
use crate::store::{HealthStore, UpdateModel};

/// Sampling metrics that stream while in active use.
const LOOKBACK_LIVE: Duration = Duration::from_secs(2 * 60);
/// Metrics written continuously through the day.
const LOOKBACK_DAILY: Duration = Duration::from_secs(30 * 60);
/// Metrics recorded in sparse sessions, often synced hours later.
const LOOKBACK_SESSION: Duration = Duration::from_secs(24 * 60 * 60);

/// How far back a windowed poll looks by default for `metric`.
///
/// Wide enough to catch records synced late from companion devices, small
/// enough to keep re-query cost flat. Checkpoint deduplication makes the
/// overlap harmless, so the cost of a generous window is query time only.
#[must_use]
pub fn default_lookback(metric: MetricType) -> Duration {
    match metric.category() {
        MetricCategory::Vitals => LOOKBACK_LIVE,
        MetricCategory::Fitness => {
            if metric == MetricType::Workout {
                LOOKBACK_SESSION
            } else {
                LOOKBACK_DAILY
            }
        }
        MetricCategory::Nutrition
        | MetricCategory::Mobility
        | MetricCategory::Environmental => LOOKBACK_DAILY,
        MetricCategory::BodyMeasurement
        | MetricCategory::Sleep
        | MetricCategory::Clinical
        | MetricCategory::ReproductiveHealth => LOOKBACK_SESSION,
    }
}

/// Tuning for the observation engine.
#[derive(Debug, Clone)]
pub struct ObservationConfig {
    /// Buffered records per stream before the producer task awaits.
    pub channel_capacity: usize,
    /// Per-metric replacements for [`default_lookback`].
    pub lookback_overrides: HashMap<MetricType, Duration>,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            lookback_overrides: HashMap::new(),
        }
    }
}

impl ObservationConfig {
    /// Override the per-stream buffer size.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Override the windowed lookback for one metric.
    #[must_use]
    pub fn with_lookback(mut self, metric: MetricType, lookback: Duration) -> Self {
        self.lookback_overrides.insert(metric, lookback);
        self
    }
}

/// Starts and owns per-metric observation tasks.
#[derive(Debug)]
pub struct ObservationEngine<S: HealthStore> {
    store: Arc<S>,
    config: ObservationConfig,
}

impl<S: HealthStore> ObservationEngine<S> {
    /// An engine observing `store` with the given settings.
    pub fn new(store: Arc<S>, config: ObservationConfig) -> Self {
        Self { store, config }
    }

    /// Observe new records of `metric` as a cancellable stream.
    ///
    /// Delivery starts at the moment of the call: history already in the
    /// store is not replayed. `sampling_interval` is the poll cadence on
    /// windowed platforms and the retry delay after read failures on
    /// incremental ones.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for a zero `sampling_interval` and
    /// `DataAccessFailed` when an incremental subscription cannot be opened.
    pub async fn observe(
        &self,
        metric: MetricType,
        sampling_interval: Duration,
    ) -> ConnectorResult<MetricStream> {
        if sampling_interval.is_zero() {
            return Err(ConnectorError::validation(
                "sampling_interval",
                "must be positive",
            ));
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let model = self.store.update_model(metric);
        let task = match model {
            UpdateModel::Incremental => {
                let feed = self.store.subscribe_incremental(metric).await.map_err(|e| {
                    ConnectorError::data_access(
                        format!("opening incremental subscription for {metric}"),
                        e,
                    )
                })?;
                tokio::spawn(anchored::run(feed, tx, metric, sampling_interval))
            }
            UpdateModel::Windowed => {
                let lookback = self.lookback(metric, sampling_interval);
                // The checkpoint anchors here, not at first poll, so records
                // written while the task is still waiting to run are kept.
                tokio::spawn(windowed::run(
                    Arc::clone(&self.store),
                    tx,
                    metric,
                    Utc::now(),
                    sampling_interval,
                    lookback,
                ))
            }
        };
        debug!(metric = %metric, model = ?model, "observation started");
        Ok(MetricStream {
            metric,
            inner: ReceiverStream::new(rx),
            task,
        })
    }

    /// Effective windowed lookback, never shorter than two sampling
    /// intervals so consecutive windows always overlap.
    fn lookback(&self, metric: MetricType, sampling_interval: Duration) -> Duration {
        let base = self
            .config
            .lookback_overrides
            .get(&metric)
            .copied()
            .unwrap_or_else(|| default_lookback(metric));
        base.max(sampling_interval.saturating_mul(2))
    }
}

/// A live stream of new records for one metric.
///
/// Dropping the stream aborts the background task, which stops all polling
/// or feed reads for this observation.
pub struct MetricStream {
    metric: MetricType,
    inner: ReceiverStream<DataPoint>,
    task: JoinHandle<()>,
}

impl MetricStream {
    /// The metric this stream observes.
    #[must_use]
    pub const fn metric(&self) -> MetricType {
        self.metric
    }

    /// Stop the observation. Equivalent to dropping the stream.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Stream for MetricStream {
    type Item = DataPoint;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for MetricStream {
    fn drop(&mut self) {
        self.task.abort();
        debug!(metric = %self.metric, "observation stopped");
    }
}

impl std::fmt::Debug for MetricStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStream")
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}
