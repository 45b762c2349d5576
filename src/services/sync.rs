//! Bridges in-memory board state to the persistence provider.
//!
//! A mutating operation moves through
//! `Idle -> LocalMutationApplied -> RemoteWritePending -> RemoteWriteAcked | RemoteWriteFailed -> Idle`.
//! Local state is applied before the write and is never rolled back. There is
//! no retry and no ordering between concurrent pushes: whichever whole-collection
//! write the store acknowledges last is what the store holds, so concurrent
//! edits from different processes can silently overwrite each other.
use std::sync::Arc;
use serde::Serialize;
use crate::errors::{AppError, AppResult, PersistenceError, PersistenceResult};
use crate::models::{TaskRecord, TaskSnapshot, UserMap, UserSnapshot};
use crate::services::provider::PersistenceProvider;
use crate::services::user_cache::UserCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    LocalMutationApplied,
    RemoteWritePending,
    RemoteWriteAcked,
    RemoteWriteFailed,
}

/// Result of the remote write that followed a local mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum SyncOutcome {
    Acked,
    Failed(String),
}

impl SyncOutcome {
    fn from_write(document: &str, result: PersistenceResult<()>) -> Self {
        match result {
            Ok(()) => {
                trace_phase(document, SyncPhase::RemoteWriteAcked);
                SyncOutcome::Acked
            }
            Err(e) => {
                trace_phase(document, SyncPhase::RemoteWriteFailed);
                tracing::error!("Failed to write {} to the store: {}", document, e);
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn is_acked(&self) -> bool {
        matches!(self, SyncOutcome::Acked)
    }

    /// Keeps the first failure when a mutation needed more than one write.
    pub fn and(self, other: SyncOutcome) -> SyncOutcome {
        match self {
            SyncOutcome::Acked => other,
            failed => failed,
        }
    }
}

/// A locally applied mutation together with the outcome of persisting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub value: T,
    pub sync: SyncOutcome,
}

impl<T> Mutation<T> {
    pub fn is_synced(&self) -> bool {
        self.sync.is_acked()
    }

    pub fn warning(&self) -> Option<String> {
        match &self.sync {
            SyncOutcome::Acked => None,
            SyncOutcome::Failed(reason) => {
                Some(format!("Saved locally but not persisted: {}", reason))
            }
        }
    }

    /// Treats a failed push as an error. The local change stays applied either way.
    pub fn into_result(self) -> AppResult<T> {
        match self.sync {
            SyncOutcome::Acked => Ok(self.value),
            SyncOutcome::Failed(reason) => {
                Err(AppError::Persistence(PersistenceError::Unavailable(reason)))
            }
        }
    }
}

pub(crate) fn trace_phase(document: &str, phase: SyncPhase) {
    tracing::debug!(document, ?phase, "sync phase");
}

pub struct SyncCoordinator {
    provider: Arc<dyn PersistenceProvider>,
    cache: Option<UserCache>,
}

impl SyncCoordinator {
    pub fn new(provider: Arc<dyn PersistenceProvider>, cache: Option<UserCache>) -> Self {
        Self { provider, cache }
    }

    /// Reads the task collection, surfacing a failed read to the caller.
    pub async fn read_tasks(&self) -> PersistenceResult<Vec<TaskRecord>> {
        let tasks = self.provider.read_tasks().await?;
        tracing::debug!("Pulled {} tasks", tasks.len());
        Ok(tasks)
    }

    /// Reads the task collection at startup. A failed read yields an empty collection.
    pub async fn pull_tasks(&self) -> Vec<TaskRecord> {
        self.read_tasks().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read tasks, continuing with an empty board: {}", e);
            Vec::new()
        })
    }

    pub async fn push_tasks(&self, snapshot: TaskSnapshot) -> SyncOutcome {
        trace_phase("tasks", SyncPhase::RemoteWritePending);
        let outcome = SyncOutcome::from_write("tasks", self.provider.write_tasks(&snapshot).await);
        trace_phase("tasks", SyncPhase::Idle);
        outcome
    }

    /// Reads the user map, preferring the local cache when it holds a copy.
    pub async fn pull_users(&self) -> PersistenceResult<Option<UserMap>> {
        if let Some(cache) = &self.cache {
            match cache.load().await {
                Ok(Some(users)) => {
                    tracing::debug!("Using cached users from {}", cache.path().display());
                    return Ok(Some(users));
                }
                Ok(None) => tracing::debug!("No user cache at {}", cache.path().display()),
                Err(e) => tracing::warn!("Ignoring unreadable user cache: {}", e),
            }
        }

        let users = self.provider.read_users().await?;
        if let (Some(cache), Some(users)) = (&self.cache, &users) {
            if let Err(e) = cache.store(&UserSnapshot::new(users.clone())).await {
                tracing::warn!("Failed to refresh user cache: {}", e);
            }
        }
        Ok(users)
    }

    /// Writes the user map to the local cache and the store.
    pub async fn push_users(&self, snapshot: UserSnapshot) -> SyncOutcome {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&snapshot).await {
                tracing::warn!("Failed to update user cache: {}", e);
            }
        }
        trace_phase("users", SyncPhase::RemoteWritePending);
        let outcome = SyncOutcome::from_write("users", self.provider.write_users(&snapshot).await);
        trace_phase("users", SyncPhase::Idle);
        outcome
    }
}
