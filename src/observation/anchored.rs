// ABOUTME: Forwarding loop for incremental platforms with anchor-backed feeds
// ABOUTME: Drains store batches into the stream channel, retrying reads after failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{DataPoint, MetricType};
use crate::store::IncrementalFeed;

/// Forward batches from an anchor-backed feed to `tx` until cancelled.
///
/// The platform anchor already guarantees each record appears in exactly one
/// batch, so no deduplication happens here. A failed read is logged and
/// retried after `retry_delay`; the loop ends when the receiving side goes
/// away.
pub(crate) async fn run(
    mut feed: Box<dyn IncrementalFeed>,
    tx: mpsc::Sender<DataPoint>,
    metric: MetricType,
    retry_delay: Duration,
) {
    loop {
        tokio::select! {
            () = tx.closed() => {
                debug!(metric = %metric, "incremental observation cancelled");
                return;
            }
            batch = feed.next_batch() => match batch {
                Ok(mut points) => {
                    points.sort_by_key(|point| point.timestamp);
                    for point in points {
                        if tx.send(point).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        metric = %metric,
                        error = %e,
                        "incremental feed read failed, retrying"
                    );
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
}
