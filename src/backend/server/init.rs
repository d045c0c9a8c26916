/**
 * Server Initialization
 *
 * This module assembles the Axum application.
 *
 * # Initialization Process
 *
 * 1. Open the durable store (PostgreSQL or in-memory)
 * 2. Wire the real-time core into `AppState`
 * 3. Reset stale presence flags left by a previous process
 * 4. Create and configure the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::backend::store::ChatStore;
use crate::shared::config::AppConfig;

/// Build the application for `config`, choosing the store from its settings
pub async fn create_app(config: AppConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing chat server");

    // Step 1: Open the durable store
    let store = load_store(&config).await?;

    // Steps 2-4
    let app_state = build_state(config, store).await?;
    Ok(create_router(app_state))
}

/// Wire `AppState` over an existing store and reset presence
pub async fn build_state(
    config: AppConfig,
    store: Arc<dyn ChatStore>,
) -> Result<AppState, BackendError> {
    // Step 2: Wire registry, router and services
    let app_state = AppState::new(config, store);
    tracing::info!("Real-time core initialized");

    // Step 3: Nobody is connected to a fresh process
    app_state.presence.initialize().await?;

    Ok(app_state)
}
