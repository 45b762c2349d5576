use redis::{Client, AsyncCommands};
use async_trait::async_trait;
use std::sync::Arc;
use crate::errors::PersistenceResult;
use crate::models::{TaskRecord, TaskSnapshot, UserMap, UserSnapshot};
use crate::services::provider::PersistenceProvider;

/// Stores the task collection and user map as one JSON document each.
pub struct RedisService {
    client: Arc<Client>,
    key_prefix: String,
}

impl RedisService {
    pub fn new(client: Arc<Client>, key_prefix: impl Into<String>) -> Self {
        Self { client, key_prefix: key_prefix.into() }
    }

    fn tasks_key(&self) -> String {
        format!("{}:tasks", self.key_prefix)
    }

    fn users_key(&self) -> String {
        format!("{}:users", self.key_prefix)
    }

    async fn read_document(&self, key: &str) -> PersistenceResult<Option<String>> {
        let mut conn = self.client.get_async_connection().await?;
        let data: Option<String> = conn.get(key).await?;
        Ok(data)
    }

    async fn write_document(&self, key: &str, document: String) -> PersistenceResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        conn.set::<_, _, ()>(key, document).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceProvider for RedisService {
    async fn read_tasks(&self) -> PersistenceResult<Vec<TaskRecord>> {
        match self.read_document(&self.tasks_key()).await? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_tasks(&self, snapshot: &TaskSnapshot) -> PersistenceResult<()> {
        self.write_document(&self.tasks_key(), serde_json::to_string(snapshot)?).await
    }

    async fn read_users(&self) -> PersistenceResult<Option<UserMap>> {
        self.read_document(&self.users_key())
            .await?
            .map(|data| serde_json::from_str(&data))
            .transpose()
            .map_err(Into::into)
    }

    async fn write_users(&self, snapshot: &UserSnapshot) -> PersistenceResult<()> {
        self.write_document(&self.users_key(), serde_json::to_string(snapshot)?).await
    }
}
