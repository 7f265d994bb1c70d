// ABOUTME: Statistics aggregator computing bucketed summaries over stored records
// ABOUTME: Delegates math to the store, then normalizes results into base units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Statistics Aggregator
//!
//! Answers questions like "daily step totals for the last week" with one
//! call. The range is carved into half-open buckets, each bucket is
//! aggregated by the store in its native units, and every non-count value is
//! normalized into the metric's base unit before it reaches the caller.
//!
//! Operations a metric's aggregation kind cannot support are filtered out
//! rather than failing: asking for the `Sum` of heart rate samples yields
//! buckets without a `Sum` entry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::{MetricType, StatOp, StatisticBucket, StatisticsResult, TimeRange};
use crate::store::HealthStore;
use crate::units::ConversionTable;

/// Computes bucketed statistics over a health store.
#[derive(Debug)]
pub struct StatisticsEngine<S: HealthStore> {
    store: Arc<S>,
    conversions: Arc<ConversionTable>,
}

impl<S: HealthStore> StatisticsEngine<S> {
    /// An engine aggregating over `store`, normalizing via `conversions`.
    pub fn new(store: Arc<S>, conversions: Arc<ConversionTable>) -> Self {
        Self { store, conversions }
    }

    /// Aggregate `metric` over `range`.
    ///
    /// With a `bucket_duration` the range is carved into consecutive buckets
    /// of that length, the final one truncated at the range end; without one
    /// the whole range is a single bucket. Every requested operation the
    /// metric's aggregation kind supports appears in each bucket where the
    /// store could compute it, in base units (`Count` excepted).
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for an empty operation set or a zero
    /// bucket duration, `DataAccessFailed` when the store fails, and
    /// `ConversionFailed` when a native unit has no path to the base unit.
    pub async fn statistics(
        &self,
        metric: MetricType,
        range: TimeRange,
        ops: &BTreeSet<StatOp>,
        bucket_duration: Option<Duration>,
    ) -> ConnectorResult<StatisticsResult> {
        if ops.is_empty() {
            return Err(ConnectorError::validation(
                "ops",
                "at least one operation is required",
            ));
        }
        let bucket_ranges = carve(range, bucket_duration)?;
        let kind = metric.aggregation_kind();
        let meaningful: Vec<StatOp> = ops
            .iter()
            .copied()
            .filter(|&op| kind.supports(op))
            .collect();

        let mut buckets = Vec::with_capacity(bucket_ranges.len());
        for bucket_range in bucket_ranges {
            let values = if meaningful.is_empty() {
                HashMap::new()
            } else {
                let native = self
                    .store
                    .aggregate(metric, bucket_range, &meaningful)
                    .await
                    .map_err(|e| {
                        ConnectorError::data_access(
                            format!("aggregating {metric} statistics"),
                            e,
                        )
                    })?;
                let mut converted = HashMap::with_capacity(native.len());
                for (op, value) in native {
                    let value = if op == StatOp::Count {
                        value
                    } else {
                        self.conversions.normalize(metric, value)?
                    };
                    converted.insert(op, value);
                }
                converted
            };
            buckets.push(StatisticBucket {
                range: bucket_range,
                values,
            });
        }

        debug!(metric = %metric, buckets = buckets.len(), "statistics computed");
        Ok(StatisticsResult {
            metric,
            range,
            buckets,
        })
    }
}

/// Carve `range` into consecutive half-open buckets of `bucket_duration`.
fn carve(range: TimeRange, bucket_duration: Option<Duration>) -> ConnectorResult<Vec<TimeRange>> {
    let Some(duration) = bucket_duration else {
        return Ok(vec![range]);
    };
    if duration.is_zero() {
        return Err(ConnectorError::validation(
            "bucket_duration",
            "must be positive",
        ));
    }
    let step = chrono::Duration::from_std(duration)
        .map_err(|_| ConnectorError::validation("bucket_duration", "out of range"))?;

    let mut buckets = Vec::new();
    let mut cursor = range.start;
    while cursor < range.end {
        let end = (cursor + step).min(range.end);
        buckets.push(TimeRange::new(cursor, end)?);
        cursor = end;
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day_range() -> TimeRange {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_no_bucket_duration_means_one_bucket() {
        let buckets = carve(day_range(), None).unwrap();
        assert_eq!(buckets, vec![day_range()]);
    }

    #[test]
    fn test_even_division_produces_equal_buckets() {
        let buckets = carve(day_range(), Some(Duration::from_secs(6 * 3600))).unwrap();
        assert_eq!(buckets.len(), 4);
        assert!(buckets
            .iter()
            .all(|b| b.duration() == chrono::Duration::hours(6)));
        assert_eq!(buckets[0].start, day_range().start);
        assert_eq!(buckets[3].end, day_range().end);
    }

    #[test]
    fn test_final_bucket_truncates_at_the_range_end() {
        let buckets = carve(day_range(), Some(Duration::from_secs(7 * 3600))).unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[3].duration(), chrono::Duration::hours(3));
        assert_eq!(buckets[3].end, day_range().end);
    }

    #[test]
    fn test_buckets_tile_the_range_without_gaps() {
        let buckets = carve(day_range(), Some(Duration::from_secs(5 * 3600))).unwrap();
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_zero_bucket_duration_is_rejected() {
        let err = carve(day_range(), Some(Duration::ZERO)).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::ValidationFailed {
                field: "bucket_duration",
                ..
            }
        ));
    }
}
