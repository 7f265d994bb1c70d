// ABOUTME: Polling loop for windowed platforms, re-querying a trailing window each tick
// ABOUTME: A checkpoint deduplicates overlapping windows so each record is delivered once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::models::{DataPoint, MetricType, TimeRange};
use crate::store::HealthStore;

/// Delivery frontier for overlapping window polls.
///
/// Windows overlap on purpose so late-arriving records are not missed, which
/// means most polls re-see records already delivered. The checkpoint keeps
/// the newest delivered timestamp plus the uids seen exactly at it, enough to
/// admit each record at most once without retaining full history.
#[derive(Debug)]
pub(crate) struct Checkpoint {
    last: Option<DateTime<Utc>>,
    seen_at_last: HashSet<String>,
}

impl Checkpoint {
    /// A frontier that rejects everything recorded before `instant`.
    pub(crate) fn starting_at(instant: DateTime<Utc>) -> Self {
        Self {
            last: Some(instant),
            seen_at_last: HashSet::new(),
        }
    }

    /// Decide whether `point` is new, advancing the frontier when it is.
    ///
    /// Records behind the frontier are rejected. Records exactly at it are
    /// admitted once per uid; a record at the frontier with no uid cannot be
    /// told apart from one already delivered and is dropped.
    pub(crate) fn admit(&mut self, point: &DataPoint) -> bool {
        match self.last {
            Some(last) if point.timestamp < last => false,
            Some(last) if point.timestamp == last => match &point.uid {
                Some(uid) => self.seen_at_last.insert(uid.clone()),
                None => false,
            },
            _ => {
                self.last = Some(point.timestamp);
                self.seen_at_last.clear();
                if let Some(uid) = &point.uid {
                    self.seen_at_last.insert(uid.clone());
                }
                true
            }
        }
    }
}

/// Poll `metric` every `sampling_interval`, delivering new records to `tx`.
///
/// Each tick queries the trailing `lookback` window and filters it through a
/// checkpoint anchored at `started_at`, the instant the subscription was
/// opened. A failed poll is logged and retried on the next tick; the loop
/// ends when the receiving side goes away.
pub(crate) async fn run<S: HealthStore>(
    store: Arc<S>,
    tx: mpsc::Sender<DataPoint>,
    metric: MetricType,
    started_at: DateTime<Utc>,
    sampling_interval: Duration,
    lookback: Duration,
) {
    let lookback = chrono::Duration::from_std(lookback)
        .unwrap_or_else(|_| chrono::Duration::days(3650));
    let mut checkpoint = Checkpoint::starting_at(started_at);
    let mut ticker = tokio::time::interval(sampling_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = tx.closed() => {
                debug!(metric = %metric, "windowed observation cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let window = TimeRange::trailing(Utc::now(), lookback);
        match store.query_range(metric, window).await {
            Ok(mut points) => {
                points.sort_by_key(|point| point.timestamp);
                for point in points {
                    if checkpoint.admit(&point) && tx.send(point).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(
                    metric = %metric,
                    error = %e,
                    "windowed poll failed, retrying on next tick"
                );
            }
        }
    }
}
