// ABOUTME: Unified error taxonomy for all connector operations
// ABOUTME: Defines ConnectorError, ConnectorResult and convenience constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Unified Error Handling
//!
//! Every fallible connector operation returns [`ConnectorResult`], so callers
//! handle one taxonomy regardless of which platform sits underneath. Raw
//! adapter failures ([`StoreError`](crate::store::StoreError)) never cross the
//! facade on their own; they are wrapped in
//! [`ConnectorError::DataAccessFailed`] along with the operation that was in
//! flight.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::capabilities::Platform;
use crate::models::{MetricType, Permission, SessionId};
use crate::store::StoreError;
use crate::units::Unit;

/// Result alias used across the crate.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// The single error taxonomy surfaced by every connector operation.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The underlying store could not be brought up (unavailable on this
    /// device, version probe failed, ...).
    #[error("connector initialization failed: {reason}")]
    InitializationFailed {
        /// What went wrong during bring-up
        reason: String,
    },

    /// The platform refused one or more of the requested permissions.
    #[error("permission denied for [{}]", format_permissions(.requested))]
    PermissionDenied {
        /// The specific (metric, access) pairs that were denied
        requested: BTreeSet<Permission>,
    },

    /// The metric is not supported on this platform/version combination.
    #[error("metric {metric} is not available on this platform")]
    MetricUnavailable {
        /// The unavailable metric
        metric: MetricType,
    },

    /// No live session carries the given identifier.
    #[error("no active workout session with id {id}")]
    SessionNotFound {
        /// The identifier that failed to resolve
        id: SessionId,
    },

    /// The operation exists in the API but the platform cannot perform it.
    #[error("{feature} is not supported on {platform}")]
    UnsupportedOnPlatform {
        /// The platform that lacks the feature
        platform: Platform,
        /// Human-readable feature description
        feature: String,
    },

    /// The store failed while executing an otherwise valid operation.
    #[error("health store access failed while {context}")]
    DataAccessFailed {
        /// The operation that was in flight
        context: String,
        /// The underlying adapter failure
        #[source]
        source: StoreError,
    },

    /// No conversion path exists between two units.
    #[error("no unit conversion from {from} to {to}")]
    ConversionFailed {
        /// Source unit
        from: Unit,
        /// Target unit
        to: Unit,
    },

    /// A caller-supplied value failed validation.
    #[error("invalid {field}: {reason}")]
    ValidationFailed {
        /// The offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

fn format_permissions(permissions: &BTreeSet<Permission>) -> String {
    permissions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConnectorError {
    /// Initialization failure with a reason.
    pub fn initialization(reason: impl Into<String>) -> Self {
        Self::InitializationFailed {
            reason: reason.into(),
        }
    }

    /// Permission denial naming the refused pairs.
    pub fn permission_denied(requested: impl IntoIterator<Item = Permission>) -> Self {
        Self::PermissionDenied {
            requested: requested.into_iter().collect(),
        }
    }

    /// The metric is unsupported on the current platform.
    #[must_use]
    pub const fn metric_unavailable(metric: MetricType) -> Self {
        Self::MetricUnavailable { metric }
    }

    /// No session registered under `id`.
    #[must_use]
    pub const fn session_not_found(id: SessionId) -> Self {
        Self::SessionNotFound { id }
    }

    /// The platform cannot perform the described feature.
    pub fn unsupported(platform: Platform, feature: impl Into<String>) -> Self {
        Self::UnsupportedOnPlatform {
            platform,
            feature: feature.into(),
        }
    }

    /// Wrap a store failure with the operation that was in flight.
    pub fn data_access(context: impl Into<String>, source: StoreError) -> Self {
        Self::DataAccessFailed {
            context: context.into(),
            source,
        }
    }

    /// No conversion path between `from` and `to`.
    #[must_use]
    pub const fn conversion(from: Unit, to: Unit) -> Self {
        Self::ConversionFailed { from, to }
    }

    /// A field failed validation.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call later could succeed without any state
    /// change on the caller's side.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::DataAccessFailed { .. })
    }
}
