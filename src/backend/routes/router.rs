/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Chat routes (`/ws`)
 * 2. API routes (`/api/...`)
 * 3. Fallback handler (404)
 *
 * Every request is traced through `tower_http::trace::TraceLayer`.
 */

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::server::state::AppState;

pub fn create_router(app_state: AppState) -> Router<()> {
    // Start with chat routes
    let router = configure_chat_routes(Router::new());

    // Add API routes
    let router = configure_api_routes(router);

    // Fallback handler for 404
    let router = router.fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
