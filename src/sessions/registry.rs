// ABOUTME: Shared registry of live workout sessions keyed by session id
// ABOUTME: Owns the active session objects so engine handles can stay cheap clones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitalbridge Project

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::models::{SessionId, WorkoutSession};

use super::ActiveSession;

/// Shared map of in-flight sessions.
///
/// Cloning the registry clones a handle to the same map, so every engine
/// built over it sees the same sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<SessionId, ActiveSession>>>,
}

impl SessionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, session: ActiveSession) {
        let mut sessions = self.inner.write().await;
        sessions.insert(session.snapshot.id, session);
    }

    /// Remove and return the session, if it is still live.
    ///
    /// Removal is the commit point of `end` and `discard`: of two racing
    /// callers exactly one gets the session back.
    pub(crate) async fn remove(&self, id: SessionId) -> Option<ActiveSession> {
        let mut sessions = self.inner.write().await;
        sessions.remove(&id)
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, ActiveSession>> {
        self.inner.write().await
    }

    /// Run `f` over the live session, if present.
    pub(crate) async fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&ActiveSession) -> T,
    ) -> Option<T> {
        let sessions = self.inner.read().await;
        sessions.get(&id).map(f)
    }

    /// Snapshot of one live session.
    pub async fn snapshot(&self, id: SessionId) -> Option<WorkoutSession> {
        self.with_session(id, |active| active.snapshot.clone()).await
    }

    /// Snapshots of every live session, oldest first.
    pub async fn snapshots(&self) -> Vec<WorkoutSession> {
        let sessions = self.inner.read().await;
        let mut all: Vec<WorkoutSession> = sessions
            .values()
            .map(|active| active.snapshot.clone())
            .collect();
        all.sort_by_key(|session| session.started_at);
        all
    }
}
