/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Room messages
 * - `GET /api/rooms/{room_id}/messages?limit=` - Latest page, oldest first
 * - `POST /api/rooms/{room_id}/messages` - Send a message
 * - `POST /api/rooms/{room_id}/seen` - Mark the room seen
 * - `POST /api/messages/delivered` - Acknowledge delivery of `messageIds`
 * - `PUT /api/messages/{id}` - Edit (sender only)
 * - `DELETE /api/messages/{id}?reason=` - Soft delete (sender only)
 * - `GET /api/messages/{id}/history` - Edit log, newest first
 *
 * ## Private messages
 * - `GET /api/private/{username}?limit=` - Conversation with `username`
 * - `POST /api/private/{username}` - Send to `username`
 * - `POST /api/private/{username}/seen` - Mark their messages seen
 *
 * ## Reactions
 * - `POST /api/reactions` - Add
 * - `DELETE /api/reactions/{id}` - Remove (reacting user only)
 * - `GET /api/reactions/message/{id}` - Reactions on a room message
 * - `GET /api/reactions/private/{id}` - Reactions on a private message
 *
 * ## Notifications and presence
 * - `GET /api/notifications` - Own notifications, newest first
 * - `POST /api/notifications/{id}/read` - Mark one read
 * - `POST /api/notifications/read-all` - Mark all read
 * - `GET /api/users/{username}/presence` - Durable presence record
 *
 * All routes require a bearer token; handlers take `AuthUser`.
 */

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::chat::handlers::{messages, notifications, private, reactions};
use crate::backend::server::state::AppState;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Room messages
        .route(
            "/api/rooms/{room_id}/messages",
            get(messages::list_room_messages).post(messages::send_room_message),
        )
        .route("/api/rooms/{room_id}/seen", post(messages::mark_room_seen))
        .route("/api/messages/delivered", post(messages::mark_delivered))
        .route(
            "/api/messages/{message_id}",
            put(messages::edit_message).delete(messages::delete_message),
        )
        .route("/api/messages/{message_id}/history", get(messages::edit_history))
        // Private messages
        .route(
            "/api/private/{username}",
            get(private::list_private_messages).post(private::send_private_message),
        )
        .route("/api/private/{username}/seen", post(private::mark_private_seen))
        // Reactions
        .route("/api/reactions", post(reactions::add_reaction))
        .route("/api/reactions/{reaction_id}", delete(reactions::remove_reaction))
        .route(
            "/api/reactions/message/{message_id}",
            get(reactions::list_message_reactions),
        )
        .route(
            "/api/reactions/private/{message_id}",
            get(reactions::list_private_reactions),
        )
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{notification_id}/read",
            post(notifications::mark_notification_read),
        )
        // Presence
        .route(
            "/api/users/{username}/presence",
            get(notifications::get_user_presence),
        )
}
