use std::sync::Arc;
use bcrypt::{hash, verify};
use crate::errors::{AppError, AppResult, PersistenceResult};
use crate::models::{Snapshot, UserEntry, UserMap, UserRecord, UserSnapshot};
use crate::services::policy;

/// Seals passwords for storage and checks login attempts against stored values.
pub trait CredentialVerifier: Send + Sync {
    fn seal(&self, password: &str) -> AppResult<String>;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Stores passwords as given and compares them verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn seal(&self, password: &str) -> AppResult<String> {
        Ok(password.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        password == stored
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl BcryptVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialVerifier for BcryptVerifier {
    fn seal(&self, password: &str) -> AppResult<String> {
        Ok(hash(password.as_bytes(), self.cost)?)
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        verify(password, stored).unwrap_or_else(|e| {
            tracing::warn!("Stored credential is not a bcrypt hash: {}", e);
            false
        })
    }
}

/// How the user map came to be at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    /// A stored map was read.
    Loaded,
    /// Nothing was stored; the principal-only map was created and should be persisted.
    Created,
    /// Reading failed; the principal-only map is used but not persisted.
    Fallback,
}

/// Username to password mapping, including the undeletable principal account.
pub struct CredentialStore {
    users: UserMap,
    principal: String,
    verifier: Arc<dyn CredentialVerifier>,
}

impl CredentialStore {
    /// A store holding only the principal account at `default_password`.
    pub fn bootstrap(
        principal: &str,
        default_password: &str,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> AppResult<Self> {
        let mut users = UserMap::new();
        users.insert(
            principal.to_string(),
            UserRecord { password: verifier.seal(default_password)? },
        );
        Ok(Self { users, principal: principal.to_string(), verifier })
    }

    /// Builds the store from a read of the persisted map. Read failures never block startup.
    pub fn bootstrap_or_load(
        loaded: PersistenceResult<Option<UserMap>>,
        principal: &str,
        default_password: &str,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> AppResult<(Self, BootstrapSource)> {
        match loaded {
            Ok(Some(mut users)) => {
                if !users.contains_key(principal) {
                    tracing::warn!("Stored user map lacks principal {}, restoring it", principal);
                    users.insert(
                        principal.to_string(),
                        UserRecord { password: verifier.seal(default_password)? },
                    );
                }
                tracing::info!("Loaded {} users", users.len());
                let store = Self { users, principal: principal.to_string(), verifier };
                Ok((store, BootstrapSource::Loaded))
            }
            Ok(None) => {
                tracing::info!("No stored users, bootstrapping principal {}", principal);
                let store = Self::bootstrap(principal, default_password, verifier)?;
                Ok((store, BootstrapSource::Created))
            }
            Err(e) => {
                tracing::warn!("Failed to load users, falling back to defaults: {}", e);
                let store = Self::bootstrap(principal, default_password, verifier)?;
                Ok((store, BootstrapSource::Fallback))
            }
        }
    }

    pub fn is_principal(&self, username: &str) -> bool {
        username == self.principal
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn register(&mut self, username: &str, password: &str) -> AppResult<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".into()));
        }
        if self.users.contains_key(username) {
            return Err(AppError::DuplicateUser(username.to_string()));
        }

        let password = self.verifier.seal(password)?;
        self.users.insert(username.to_string(), UserRecord { password });
        Ok(())
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map_or(false, |user| self.verifier.verify(password, &user.password))
    }

    pub fn change_password(&mut self, username: &str, new_password: &str) -> AppResult<()> {
        let new_password = new_password.trim();
        if new_password.is_empty() {
            return Err(AppError::InvalidInput("Password cannot be empty".into()));
        }
        let sealed = self.verifier.seal(new_password)?;
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;
        user.password = sealed;
        Ok(())
    }

    /// Deletes a user. The principal and the signed-in user can never be removed.
    pub fn remove(&mut self, username: &str, current_user: Option<&str>) -> AppResult<()> {
        if self.is_principal(username) {
            return Err(AppError::Forbidden("The principal account cannot be deleted".into()));
        }
        if current_user == Some(username) {
            return Err(AppError::Forbidden("You cannot delete your own account".into()));
        }
        self.users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub fn entries(&self, acting_user: &str) -> Vec<UserEntry> {
        self.users
            .keys()
            .map(|name| UserEntry {
                username: name.clone(),
                is_principal: self.is_principal(name),
                is_current_user: name == acting_user,
                can_edit: policy::can_edit_or_delete_user(name, acting_user, &self.principal),
            })
            .collect()
    }

    pub fn snapshot(&self) -> UserSnapshot {
        Snapshot::new(self.users.clone())
    }
}
