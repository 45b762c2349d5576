use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use crate::errors::PersistenceResult;
use crate::models::{UserMap, UserSnapshot};

/// Local JSON copy of the user map, read at startup before asking the remote store.
#[derive(Debug, Clone)]
pub struct UserCache {
    path: PathBuf,
}

impl UserCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no cache file exists yet.
    pub async fn load(&self) -> PersistenceResult<Option<UserMap>> {
        match fs::read_to_string(&self.path).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn store(&self, snapshot: &UserSnapshot) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(snapshot)?).await?;
        Ok(())
    }
}
