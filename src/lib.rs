// ABOUTME: Main library entry point for the vitalbridge health data connector
// ABOUTME: Unifies HealthKit and Health Connect behind one typed async interface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

#![deny(unsafe_code)]

//! # Vitalbridge
//!
//! A unified connector for on-device health data stores. The same typed API
//! reads, writes, observes and aggregates health metrics whether the device
//! runs `HealthKit` or Health Connect.
//!
//! ## Features
//!
//! - **Canonical model**: one [`models::MetricType`] vocabulary and one
//!   [`models::MetricValue`] payload shape across platforms
//! - **Capability registry**: per-platform, version-gated support tables so
//!   callers can ask before touching a metric
//! - **Permission negotiation**: canonical `metric:access` pairs mapped to
//!   native grants, with the system UI shown at most once per request
//! - **Observation**: incremental and windowed change delivery unified into
//!   one cancellable stream per metric
//! - **Workout sessions**: lifecycle management with live totals and a
//!   persisted summary record
//! - **Statistics**: bucketed min/max/avg/sum/count in base units
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitalbridge::capabilities::{Platform, PlatformVersion};
//! use vitalbridge::connector::{ConnectorConfig, HealthConnector, StoreConnector};
//! use vitalbridge::errors::ConnectorResult;
//! use vitalbridge::models::MetricType;
//! use vitalbridge::store::simulated::SimulatedHealthStore;
//!
//! #[tokio::main]
//! async fn main() -> ConnectorResult<()> {
//!     let store = SimulatedHealthStore::new(Platform::HealthConnect, PlatformVersion::new(34, 0));
//!     let connector = StoreConnector::initialize(store, ConnectorConfig::default()).await?;
//!
//!     let latest = connector.read_latest(MetricType::HeartRate).await?;
//!     println!("latest heart rate: {latest:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Store**: the [`store::HealthStore`] trait is the only
//!   platform-specific seam; everything above it is shared
//! - **Engines**: permissions, observation, sessions and statistics each
//!   own one concern over the store
//! - **Facade**: [`connector::StoreConnector`] wires the engines together
//!   behind the [`connector::HealthConnector`] trait

/// Per-platform, version-gated metric support tables
pub mod capabilities;

/// Connector facade tying the engines together behind one trait
pub mod connector;

/// Unified error handling with typed failure categories
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Canonical metric vocabulary, values, permissions and time ranges
pub mod models;

/// Change observation as cancellable per-metric streams
pub mod observation;

/// Canonical-to-native permission negotiation
pub mod permissions;

/// Workout session lifecycle and live totals
pub mod sessions;

/// Bucketed statistics over stored records
pub mod statistics;

/// Platform store abstraction and native permission tokens
pub mod store;

/// Units of measure and conversions
pub mod units;

pub use capabilities::{CapabilityDescriptor, CapabilityRegistry, Platform, PlatformVersion};
pub use connector::{ConnectorConfig, HealthConnector, StoreConnector};
pub use errors::{ConnectorError, ConnectorResult};
pub use models::{
    AccessKind, DataPoint, MetricCategory, MetricType, MetricValue, Permission, PermissionStatus,
    SessionId, SessionState, StatOp, StatisticsResult, TimeRange, WorkoutSession, WorkoutType,
};
pub use observation::{MetricStream, ObservationConfig};
pub use sessions::{SessionConfig, SessionSummary, SessionTotals};
pub use store::{HealthStore, NativeToken, StoreAvailability, UpdateModel};
pub use units::Unit;
