use crate::errors::{AppError, AppResult};
use crate::services::credentials::CredentialStore;

/// The acting user for attribution and authorization checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    principal: String,
    current: Option<String>,
}

impl Session {
    pub fn new(principal: impl Into<String>) -> Self {
        Self { principal: principal.into(), current: None }
    }

    /// Re-enters a session for an already authenticated user.
    pub fn resume(principal: impl Into<String>, username: impl Into<String>) -> Self {
        Self { principal: principal.into(), current: Some(username.into()) }
    }

    pub fn login(&mut self, credentials: &CredentialStore, username: &str, password: &str) -> AppResult<()> {
        let username = username.trim();
        if !credentials.verify(username, password) {
            tracing::info!("Rejected login for user: {}", username);
            return Err(AppError::Auth("Invalid username or password".into()));
        }
        tracing::info!("User {} logged in", username);
        self.current = Some(username.to_string());
        Ok(())
    }

    pub fn logoff(&mut self) {
        if let Some(user) = self.current.take() {
            tracing::info!("User {} logged off", user);
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_principal(&self) -> bool {
        self.current.as_deref() == Some(self.principal.as_str())
    }

    /// The acting user, or an authentication error when nobody is signed in.
    pub fn require_user(&self) -> AppResult<&str> {
        self.current_user()
            .ok_or_else(|| AppError::Auth("Not authenticated".into()))
    }
}
