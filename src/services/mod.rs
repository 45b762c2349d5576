pub mod board;
pub mod credentials;
pub mod policy;
pub mod provider;
pub mod redis_service;
pub mod session;
pub mod sync;
pub mod tasks;
pub mod user_cache;

pub use board::Board;
pub use credentials::{BcryptVerifier, CredentialVerifier, PlaintextVerifier};
pub use provider::{MemoryProvider, PersistenceProvider};
pub use redis_service::RedisService;
pub use session::Session;
pub use sync::{Mutation, SyncCoordinator};
pub use tasks::TaskFilter;
pub use user_cache::UserCache;
