// ABOUTME: Permission negotiation between canonical permission pairs and native grants
// ABOUTME: Maps metric/access pairs to platform tokens and prompts at most once per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

//! # Permission Negotiator
//!
//! Callers ask for [`Permission`] pairs (`metric:access`). Platforms answer
//! in their own vocabulary: Health Connect permission strings, HealthKit
//! object types. The negotiator owns the mapping table between the two and
//! the policy around the system permission UI.
//!
//! ## Design Principles
//!
//! 1. **One prompt per request**: a single `request` call presents the
//!    system UI at most once, covering every still-missing token.
//! 2. **No UI without a mapping**: pairs the platform cannot express are
//!    denied locally and never reach the prompt.
//! 3. **Monotonic grants**: already-granted tokens are never re-requested.
//!
//! The mapping table is built once at construction from the capability
//! registry, so a pair is only promptable when the platform has a token for
//! it *and* the capability table allows that direction at the running
//! version.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::capabilities::{CapabilityRegistry, Platform};
use crate::errors::{ConnectorError, ConnectorResult};
use crate::models::{AccessKind, MetricType, Permission, PermissionStatus};
use crate::store::{native_token, HealthStore, NativeToken};

/// Translates canonical permission pairs into native grants.
#[derive(Debug)]
pub struct PermissionNegotiator<S: HealthStore> {
    store: Arc<S>,
    platform: Platform,
    tokens: HashMap<Permission, NativeToken>,
}

impl<S: HealthStore> PermissionNegotiator<S> {
    /// Build the pair-to-token table for the store's platform.
    ///
    /// A pair gets a token only when the platform can express it and the
    /// capability registry allows the access direction, so version-gated
    /// metrics below their gate stay unmappable.
    #[must_use]
    pub fn new(store: Arc<S>, capabilities: &CapabilityRegistry) -> Self {
        let platform = store.platform();
        let mut tokens = HashMap::new();
        for metric in MetricType::ALL {
            let descriptor = capabilities.capabilities_of(metric);
            for access in [AccessKind::Read, AccessKind::Write] {
                let allowed = match access {
                    AccessKind::Read => descriptor.can_read,
                    AccessKind::Write => descriptor.can_write,
                };
                if !allowed {
                    continue;
                }
                if let Some(token) = native_token(platform, metric, access) {
                    tokens.insert(Permission { metric, access }, token);
                }
            }
        }
        debug!(
            platform = %platform,
            mappable_pairs = tokens.len(),
            "permission mapping table built"
        );
        Self {
            store,
            platform,
            tokens,
        }
    }

    /// The native token backing `permission`, if the platform can express it.
    #[must_use]
    pub fn native_token(&self, permission: &Permission) -> Option<&NativeToken> {
        self.tokens.get(permission)
    }

    /// Request the given pairs, presenting the system UI at most once.
    ///
    /// Pairs without a native mapping are denied locally. Pairs whose tokens
    /// are already granted are skipped. Only the remainder reaches the
    /// prompt, in a single batch.
    ///
    /// An empty request is vacuously granted without any platform call.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::DataAccessFailed`] when the platform prompt
    /// itself fails. A failed pre-prompt grant lookup is tolerated and the
    /// full batch is prompted instead.
    pub async fn request(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus> {
        if requested.is_empty() {
            return Ok(PermissionStatus::Granted);
        }

        let mut unmappable = BTreeSet::new();
        let mut mapped: Vec<(Permission, NativeToken)> = Vec::new();
        for permission in requested {
            match self.tokens.get(permission) {
                Some(token) => mapped.push((*permission, token.clone())),
                None => {
                    unmappable.insert(*permission);
                }
            }
        }
        if !unmappable.is_empty() {
            debug!(
                platform = %self.platform,
                denied = unmappable.len(),
                "denying pairs with no native mapping"
            );
        }

        let already = match self.store.granted_tokens().await {
            Ok(granted) => granted,
            Err(e) => {
                warn!(error = %e, "grant lookup failed before prompt, prompting full batch");
                HashSet::new()
            }
        };

        let missing: Vec<NativeToken> = mapped
            .iter()
            .filter(|(_, token)| !already.contains(token))
            .map(|(_, token)| token.clone())
            .collect();

        let mut effective = already;
        if !missing.is_empty() {
            let granted_now = self
                .store
                .authorize(&missing)
                .await
                .map_err(|e| ConnectorError::data_access("requesting permission grants", e))?;
            effective.extend(granted_now);
        }

        let mut granted = BTreeSet::new();
        let mut denied = unmappable;
        for (permission, token) in mapped {
            if effective.contains(&token) {
                granted.insert(permission);
            } else {
                denied.insert(permission);
            }
        }
        Ok(PermissionStatus::from_partition(granted, denied))
    }

    /// Report the current status of the given pairs without any UI.
    ///
    /// # Errors
    ///
    /// Never fails: when the platform cannot report its grant state the
    /// status is [`PermissionStatus::NotDetermined`].
    pub async fn check(
        &self,
        requested: &BTreeSet<Permission>,
    ) -> ConnectorResult<PermissionStatus> {
        if requested.is_empty() {
            return Ok(PermissionStatus::Granted);
        }
        let granted_tokens = match self.store.granted_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "grant state unavailable");
                return Ok(PermissionStatus::NotDetermined);
            }
        };

        let mut granted = BTreeSet::new();
        let mut denied = BTreeSet::new();
        for permission in requested {
            let holds = self
                .tokens
                .get(permission)
                .is_some_and(|token| granted_tokens.contains(token));
            if holds {
                granted.insert(*permission);
            } else {
                denied.insert(*permission);
            }
        }
        Ok(PermissionStatus::from_partition(granted, denied))
    }
}
