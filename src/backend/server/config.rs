/**
 * Server Configuration
 *
 * This module loads the server configuration from the environment and opens
 * the durable store.
 *
 * # Configuration Sources
 *
 * Values come from environment variables (a `.env` file is loaded by the
 * binary through `dotenv`):
 *
 * - `SERVER_PORT` (default 3000)
 * - `DATABASE_URL` (optional)
 * - `JWT_SECRET` (required)
 * - `DEFAULT_PAGE_SIZE` (default 50)
 * - `MAX_PAGE_SIZE` (default 200)
 *
 * # Store Selection
 *
 * Without `DATABASE_URL` the server uses the in-memory store and logs a
 * warning; data then lives only as long as the process. When `DATABASE_URL`
 * is set, an unreachable database or a failed migration aborts startup.
 */

use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::store::{ChatStore, InMemoryStore, PgStore};
use crate::shared::config::{AppConfig, ConfigError};

/// Build an [`AppConfig`] from environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut builder = AppConfig::builder();

    if let Some(port) = parse_var::<u16>("SERVER_PORT")? {
        builder = builder.port(port);
    }
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            builder = builder.database_url(url);
        }
    }
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        builder = builder.jwt_secret(secret);
    }
    if let Some(size) = parse_var::<u32>("DEFAULT_PAGE_SIZE")? {
        builder = builder.default_page_size(size);
    }
    if let Some(size) = parse_var::<u32>("MAX_PAGE_SIZE")? {
        builder = builder.max_page_size(size);
    }

    builder.build()
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key,
                message: format!("'{raw}' is not a valid number"),
            }),
        Err(_) => Ok(None),
    }
}

/// Connect to PostgreSQL and run migrations, or `None` when no database is configured
pub async fn load_database(config: &AppConfig) -> Result<Option<PgPool>, BackendError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; data will not survive a restart.");
        return Ok(None);
    };

    tracing::info!("Connecting to database...");

    let pool = PgPool::connect(database_url).await.map_err(|e| {
        tracing::error!("Failed to create database connection pool: {:?}", e);
        BackendError::storage(format!("database unreachable: {e}"))
    })?;

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        BackendError::storage(format!("migrations failed: {e}"))
    })?;
    tracing::info!("Database migrations completed successfully");

    Ok(Some(pool))
}

/// Pick the durable store for this process
pub async fn load_store(config: &AppConfig) -> Result<Arc<dyn ChatStore>, BackendError> {
    let store: Arc<dyn ChatStore> = match load_database(config).await? {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => Arc::new(InMemoryStore::new()),
    };
    Ok(store)
}
