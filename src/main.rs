mod app;
mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;

use anyhow::Context;
use std::sync::Arc;
use crate::{
    app::AppState,
    config::{Config, PasswordScheme, StorageBackend},
    services::{
        BcryptVerifier, Board, CredentialVerifier, MemoryProvider, PersistenceProvider,
        PlaintextVerifier, RedisService, SyncCoordinator, UserCache,
    },
};

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn PersistenceProvider>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, nothing survives a restart");
            Ok(Arc::new(MemoryProvider::new()))
        }
        StorageBackend::Redis => {
            let url = if config.redis.sentinel_enabled {
                config.redis.sentinel_url.clone().context("Sentinel URL not configured")?
            } else {
                config.redis.url.clone()
            };
            let client = redis::Client::open(url).context("Invalid Redis connection URL")?;
            Ok(Arc::new(RedisService::new(Arc::new(client), config.storage.key_prefix.clone())))
        }
    }
}

fn build_verifier(config: &Config) -> Arc<dyn CredentialVerifier> {
    match config.board.password_scheme {
        PasswordScheme::Plaintext => Arc::new(PlaintextVerifier),
        PasswordScheme::Bcrypt => Arc::new(BcryptVerifier::new(config.board.bcrypt_cost)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    let provider = build_provider(&config)?;
    let cache = config.storage.user_cache_path.as_ref().map(UserCache::new);
    let sync = SyncCoordinator::new(provider, cache);

    let board = Board::bootstrap(&config.board, sync, build_verifier(&config))
        .await
        .context("Failed to bootstrap the board")?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = app::router(AppState { board: Arc::new(board), config });

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Failed to start server")?;
    Ok(())
}
