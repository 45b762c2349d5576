// Defines the board's error type and result alias using the thiserror crate.
use thiserror::Error;

pub mod persistence;
pub mod response;

pub use persistence::{PersistenceError, PersistenceResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User {0} already exists")]
    DuplicateUser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // Raised after the local mutation was already applied; nothing is rolled back.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
