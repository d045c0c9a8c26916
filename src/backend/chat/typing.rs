/**
 * Typing Indicators
 *
 * Typing indicators let room members see when someone is typing. Nothing is
 * persisted: the event goes straight to the room's current members, minus the
 * connection the typist is typing on.
 *
 * # Event Flow
 *
 * 1. Client sends `{"type": "Typing", "roomId": 7, "isTyping": true}` on its socket
 * 2. The adapter calls [`notify_typing`] with that connection as the exclusion
 * 3. Every other connection joined to the room receives `UserTyping`
 */
use crate::backend::realtime::broadcast::{DeliveryReport, DeliveryRouter};
use crate::backend::realtime::registry::ConnectionId;
use crate::shared::message::RoomId;
use crate::shared::RealtimeEvent;

/// Tell everyone else in `room` that `username` started or stopped typing
pub async fn notify_typing(
    router: &DeliveryRouter,
    origin: ConnectionId,
    room: RoomId,
    username: &str,
    is_typing: bool,
) -> DeliveryReport {
    let event = RealtimeEvent::typing(room, username, is_typing);
    router.deliver_to_room_except(room, &event, Some(origin)).await
}
