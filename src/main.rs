use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use arsip_api::app::{app, AppState};
use arsip_api::config::{self, StorageBackend};
use arsip_api::database::{ArchiveStore, DatabaseManager, MemoryStore, PgStore};
use arsip_api::is_production;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config().clone();

    let default_level = if config.query.debug_logging { "arsip_api=debug,tower_http=debug" } else { "arsip_api=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    tracing::info!("Starting Arsip API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let store: Arc<dyn ArchiveStore> = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::ensure_schema(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory if is_production!() => {
            anyhow::bail!("the in-memory backend cannot be used in production");
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Arsip API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(store, config))).await?;
    Ok(())
}
