// ABOUTME: Platform adapter boundary for native health stores
// ABOUTME: Defines the HealthStore trait, incremental feeds, native tokens and StoreError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Store Adapter Boundary
//!
//! Everything platform-specific lives behind [`HealthStore`]. The engines
//! above it (observation, sessions, statistics, the facade) are written once
//! against this trait and never mention a native API.
//!
//! Adapter failures are reported as [`StoreError`], a context string plus the
//! boxed native error. The facade wraps every `StoreError` in
//! [`ConnectorError::DataAccessFailed`](crate::errors::ConnectorError) before
//! a caller sees it, so the native error type never leaks into application
//! code.

use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{Platform, PlatformVersion};
use crate::models::{AccessKind, DataPoint, MetricType, StatOp, TimeRange};
use crate::units::{self, Unit};

mod tokens;

/// In-memory store double for tests and local development.
#[cfg(feature = "simulated")]
pub mod simulated;

pub use tokens::native_token;

/// Result alias for adapter operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by a platform adapter.
///
/// Carries the operation context and, when the platform produced one, the
/// boxed native error as `source`.
#[derive(Debug, Error)]
#[error("{context}")]
pub struct StoreError {
    context: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StoreError {
    /// An adapter failure with a context message only.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source: None,
        }
    }

    /// An adapter failure wrapping the native error that caused it.
    pub fn with_source(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            context: context.into(),
            source: Some(source.into()),
        }
    }
}

/// Whether the native store can be used at all on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreAvailability {
    /// The store is present and usable.
    Available,
    /// The store cannot be used (hardware, OS build, missing system app, ...).
    Unavailable {
        /// Platform-reported reason
        reason: String,
    },
}

/// How a platform delivers new records for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateModel {
    /// The store pushes batches of new records through a long-lived
    /// subscription (HealthKit anchored queries).
    Incremental,
    /// The store must be polled with windowed range queries (Health Connect).
    Windowed,
}

/// A platform-native permission token.
///
/// Health Connect spells these as manifest permission strings, HealthKit as
/// object type identifiers. The negotiator maps canonical [`Permission`]
/// pairs to these tokens and back; nothing above the negotiator handles them.
///
/// [`Permission`]: crate::models::Permission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeToken {
    /// Platform-native identifier
    pub identifier: String,
    /// Access direction the token covers
    pub access: AccessKind,
}

impl NativeToken {
    /// A read token for `identifier`.
    #[must_use]
    pub fn read(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            access: AccessKind::Read,
        }
    }

    /// A write token for `identifier`.
    #[must_use]
    pub fn write(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            access: AccessKind::Write,
        }
    }
}

impl Display for NativeToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.access, self.identifier)
    }
}

/// One platform adapter: the only trait a new platform has to implement.
///
/// All engines treat the store as a passive device: they decide *when* to
/// query, subscribe or write, and the adapter only translates those calls
/// into native API usage. Implementations must be cheap to share behind an
/// `Arc` and safe to call concurrently.
#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// The platform this adapter fronts.
    fn platform(&self) -> Platform;

    /// The OS release the adapter is running on.
    fn platform_version(&self) -> PlatformVersion;

    /// Probe whether the native store is usable on this device.
    async fn availability(&self) -> StoreResult<StoreAvailability>;

    /// The unit this store reports `metric` aggregates in.
    ///
    /// Defaults to the canonical base unit; adapters override it for the
    /// metrics their platform reports differently.
    fn native_unit(&self, metric: MetricType) -> Unit {
        units::base_unit(metric)
    }

    /// How new records of `metric` are delivered on this platform.
    fn update_model(&self, metric: MetricType) -> UpdateModel;

    /// The most recent record of `metric`, if any exists.
    async fn query_latest(&self, metric: MetricType) -> StoreResult<Option<DataPoint>>;

    /// All records of `metric` inside `range`, ascending by timestamp.
    async fn query_range(&self, metric: MetricType, range: TimeRange)
        -> StoreResult<Vec<DataPoint>>;

    /// Open a push subscription for `metric`.
    ///
    /// Only called for metrics whose [`update_model`](Self::update_model) is
    /// [`UpdateModel::Incremental`].
    async fn subscribe_incremental(
        &self,
        metric: MetricType,
    ) -> StoreResult<Box<dyn IncrementalFeed>>;

    /// Compute native aggregates of `metric` over `range`.
    ///
    /// Values are reported in [`native_unit`](Self::native_unit); ops that
    /// cannot be computed (an average over zero samples) are simply absent
    /// from the result map.
    async fn aggregate(
        &self,
        metric: MetricType,
        range: TimeRange,
        ops: &[StatOp],
    ) -> StoreResult<HashMap<StatOp, f64>>;

    /// Persist one record and return the platform-assigned uid.
    async fn insert(&self, point: DataPoint) -> StoreResult<String>;

    /// Present the platform permission UI for `tokens` and return the subset
    /// that ended up granted.
    ///
    /// Grants are monotonic: a token granted once stays granted for the
    /// lifetime of the adapter.
    async fn authorize(&self, tokens: &[NativeToken]) -> StoreResult<Vec<NativeToken>>;

    /// The set of tokens currently granted, without any UI.
    async fn granted_tokens(&self) -> StoreResult<HashSet<NativeToken>>;
}

/// A live incremental subscription opened by
/// [`HealthStore::subscribe_incremental`].
///
/// Each call yields only records that arrived since the previous yield; the
/// platform anchor that makes this possible stays inside the adapter.
#[async_trait]
pub trait IncrementalFeed: Send {
    /// Wait for and return the next batch of new records.
    ///
    /// An empty batch is legal and means the platform woke the subscription
    /// without new data.
    async fn next_batch(&mut self) -> StoreResult<Vec<DataPoint>>;
}
