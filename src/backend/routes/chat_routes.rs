/**
 * Chat Route Handlers
 *
 * # Routes
 *
 * - `GET /ws` - WebSocket upgrade for real-time events and client commands
 */

use axum::{routing::get, Router};

use crate::backend::realtime::subscription::handle_ws;
use crate::backend::server::state::AppState;

/// Configure real-time routes
pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(handle_ws))
}
