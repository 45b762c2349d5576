//! The persistence contract the board syncs against.
use async_trait::async_trait;
use tokio::sync::Mutex;
use crate::errors::PersistenceResult;
use crate::models::{Snapshot, TaskRecord, TaskSnapshot, UserMap, UserSnapshot};

/// A durable shared store holding the task collection and the user map as two
/// whole documents. Every write replaces the stored document; last writer wins.
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    async fn read_tasks(&self) -> PersistenceResult<Vec<TaskRecord>>;

    async fn write_tasks(&self, snapshot: &TaskSnapshot) -> PersistenceResult<()>;

    /// `None` when no user map has ever been written.
    async fn read_users(&self) -> PersistenceResult<Option<UserMap>>;

    async fn write_users(&self, snapshot: &UserSnapshot) -> PersistenceResult<()>;
}

#[derive(Default)]
struct Documents {
    tasks: Option<TaskSnapshot>,
    users: Option<UserSnapshot>,
}

/// Keeps both documents in process memory.
#[derive(Default)]
pub struct MemoryProvider {
    documents: Mutex<Documents>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceProvider for MemoryProvider {
    async fn read_tasks(&self) -> PersistenceResult<Vec<TaskRecord>> {
        let documents = self.documents.lock().await;
        Ok(documents.tasks.clone().map(Snapshot::into_inner).unwrap_or_default())
    }

    async fn write_tasks(&self, snapshot: &TaskSnapshot) -> PersistenceResult<()> {
        self.documents.lock().await.tasks = Some(snapshot.clone());
        Ok(())
    }

    async fn read_users(&self) -> PersistenceResult<Option<UserMap>> {
        let documents = self.documents.lock().await;
        Ok(documents.users.clone().map(Snapshot::into_inner))
    }

    async fn write_users(&self, snapshot: &UserSnapshot) -> PersistenceResult<()> {
        self.documents.lock().await.users = Some(snapshot.clone());
        Ok(())
    }
}
