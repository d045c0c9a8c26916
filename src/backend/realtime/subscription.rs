/**
 * WebSocket Subscription Handler
 *
 * `GET /ws` upgrades an authenticated request into a long-lived connection
 * that both receives `RealtimeEvent`s and issues `ClientCommand`s.
 *
 * # Connection Actor
 *
 * Each socket is split in two:
 * - a writer task that drains the connection's `ChannelTransport` queue and
 *   writes every event as a JSON text frame
 * - a reader loop that parses client frames and dispatches them to the core
 *
 * When the reader loop ends (close frame, socket error or stream end) the
 * writer is aborted, the queue detached and the presence manager told the
 * connection is gone. If presence cannot be recorded when the connection
 * opens, the socket is closed straight away.
 *
 * # Command Frames
 *
 * ```json
 * {"type": "JoinRoom", "roomId": 7}
 * {"type": "SendMessage", "roomId": 7, "text": "hi"}
 * {"type": "Typing", "roomId": 7, "isTyping": true}
 * {"type": "SendPrivateMessage", "receiver": "bob", "text": "hi"}
 * ```
 *
 * A command that fails is answered with `CommandRejected` on the issuing
 * connection only.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use crate::backend::chat::notify_typing;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::realtime::registry::ConnectionId;
use crate::backend::realtime::transport::EventReceiver;
use crate::backend::server::state::AppState;
use crate::shared::message::RoomId;
use crate::shared::{RealtimeEvent, SharedError};

/// Frames a client may send on its socket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    JoinRoom { room_id: RoomId },
    LeaveRoom { room_id: RoomId },
    SendMessage { room_id: RoomId, text: String },
    Typing { room_id: RoomId, is_typing: bool },
    MarkRoomSeen { room_id: RoomId },
    SendPrivateMessage { receiver: String, text: String },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "JoinRoom",
            Self::LeaveRoom { .. } => "LeaveRoom",
            Self::SendMessage { .. } => "SendMessage",
            Self::Typing { .. } => "Typing",
            Self::MarkRoomSeen { .. } => "MarkRoomSeen",
            Self::SendPrivateMessage { .. } => "SendPrivateMessage",
        }
    }
}

/// GET /ws
///
/// The bearer token comes from the `Authorization` header or the
/// `access_token` query parameter; a bad token is rejected with 401 before
/// the upgrade.
pub async fn handle_ws(
    AuthUser(username): AuthUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::info!(user = %username, "[Realtime] WebSocket upgrade accepted");
    ws.on_upgrade(move |socket| run_connection(socket, state, username))
}

/// Drive one authenticated socket until it closes
pub async fn run_connection(socket: WebSocket, state: AppState, username: String) {
    let connection = ConnectionId::new();
    let (ws_sender, mut ws_receiver) = socket.split();

    // Queue first so nothing broadcast after the bind is lost
    let events = state.transport.attach(connection);
    let writer_handle = tokio::spawn(writer_task(ws_sender, events));

    if let Err(e) = state.presence.on_connect(connection, &username).await {
        tracing::error!(connection = %connection, user = %username, error = %e, "[Realtime] Presence update failed on connect, closing");
        writer_handle.abort();
        state.transport.detach(connection);
        return;
    }

    tracing::info!(connection = %connection, user = %username, "[Realtime] Connection actor started");

    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                dispatch_frame(&state, connection, &username, text.as_str()).await;
            }
            Some(Ok(Message::Binary(_))) => {
                let err = BackendError::from(SharedError::serialization("binary frames are not supported"));
                reject(&state, connection, "Unknown", &err).await;
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(connection = %connection, reason = ?frame, "[Realtime] Client initiated close");
                break;
            }
            // Pings are answered by the socket itself
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Err(e)) => {
                tracing::warn!(connection = %connection, error = %e, "[Realtime] WebSocket receive error");
                break;
            }
            None => {
                tracing::info!(connection = %connection, "[Realtime] WebSocket stream ended");
                break;
            }
        }
    }

    writer_handle.abort();
    state.transport.detach(connection);

    if let Err(e) = state.presence.on_disconnect(connection).await {
        tracing::warn!(connection = %connection, user = %username, error = %e, "[Realtime] Presence update failed on disconnect");
    }

    tracing::info!(connection = %connection, user = %username, "[Realtime] Connection actor stopped");
}

async fn writer_task(mut ws_sender: SplitSink<WebSocket, Message>, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        let frame = match serde_json::to_string(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event = %event.event_type, error = %e, "[Realtime] Failed to serialize event");
                continue;
            }
        };
        if ws_sender.send(Message::Text(frame.into())).await.is_err() {
            break;
        }
    }
}

/// Parse one client frame and run it on behalf of `connection`.
///
/// Never fails: problems are reported back to the connection as
/// `CommandRejected`.
pub async fn dispatch_frame(state: &AppState, connection: ConnectionId, username: &str, frame: &str) {
    let command = match serde_json::from_str::<ClientCommand>(frame) {
        Ok(command) => command,
        Err(e) => {
            let err = BackendError::from(SharedError::from(e));
            reject(state, connection, "Unknown", &err).await;
            return;
        }
    };

    let name = command.name();
    if let Err(err) = execute(state, connection, username, command).await {
        reject(state, connection, name, &err).await;
    }
}

async fn execute(
    state: &AppState,
    connection: ConnectionId,
    username: &str,
    command: ClientCommand,
) -> Result<(), BackendError> {
    match command {
        ClientCommand::JoinRoom { room_id } => {
            if state.groups.join(connection, room_id) {
                state
                    .router
                    .deliver_to_room(room_id, &RealtimeEvent::user_joined(room_id, username))
                    .await;
                tracing::debug!(connection = %connection, room_id, "[Realtime] Joined room");
            }
        }
        ClientCommand::LeaveRoom { room_id } => {
            if state.groups.leave(connection, room_id) {
                state
                    .router
                    .deliver_to_room(room_id, &RealtimeEvent::user_left(room_id, username))
                    .await;
                tracing::debug!(connection = %connection, room_id, "[Realtime] Left room");
            }
        }
        ClientCommand::SendMessage { room_id, text } => {
            state.lifecycle.send_room_message(room_id, username, &text).await?;
        }
        ClientCommand::Typing { room_id, is_typing } => {
            notify_typing(&state.router, connection, room_id, username, is_typing).await;
        }
        ClientCommand::MarkRoomSeen { room_id } => {
            state.lifecycle.mark_room_seen(room_id, username).await?;
        }
        ClientCommand::SendPrivateMessage { receiver, text } => {
            state
                .lifecycle
                .send_private_message(username, &receiver, &text)
                .await?;
        }
    }
    Ok(())
}

async fn reject(state: &AppState, connection: ConnectionId, command: &str, err: &BackendError) {
    tracing::debug!(connection = %connection, command, error = %err, "[Realtime] Command rejected");
    let event = RealtimeEvent::command_rejected(command, &err.message(), err.status_code().as_u16());
    state.router.deliver_to_connection(connection, &event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::InMemoryStore;
    use crate::shared::config::AppConfig;
    use crate::shared::EventType;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let config = AppConfig::builder().jwt_secret("secret").build().unwrap();
        AppState::new(config, Arc::new(InMemoryStore::new()))
    }

    async fn connect(state: &AppState, username: &str) -> (ConnectionId, EventReceiver) {
        let connection = ConnectionId::new();
        let rx = state.transport.attach(connection);
        state.presence.on_connect(connection, username).await.unwrap();
        (connection, rx)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_parse_commands() {
        let join: ClientCommand = serde_json::from_str(r#"{"type":"JoinRoom","roomId":7}"#).unwrap();
        assert_eq!(join, ClientCommand::JoinRoom { room_id: 7 });

        let typing: ClientCommand =
            serde_json::from_str(r#"{"type":"Typing","roomId":7,"isTyping":false}"#).unwrap();
        assert_eq!(typing, ClientCommand::Typing { room_id: 7, is_typing: false });
        assert_eq!(typing.name(), "Typing");

        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"Shout"}"#).is_err());
    }

    #[tokio::test]
    async fn test_join_announces_to_room_including_joiner() {
        let state = test_state();
        let (alice, mut alice_rx) = connect(&state, "alice").await;
        let (bob, mut bob_rx) = connect(&state, "bob").await;
        dispatch_frame(&state, alice, "alice", r#"{"type":"JoinRoom","roomId":7}"#).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        dispatch_frame(&state, bob, "bob", r#"{"type":"JoinRoom","roomId":7}"#).await;

        let to_alice = drain(&mut alice_rx);
        let to_bob = drain(&mut bob_rx);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0].event_type, EventType::UserJoined);
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].payload["username"], "bob");

        // Joining again is a no-op
        dispatch_frame(&state, bob, "bob", r#"{"type":"JoinRoom","roomId":7}"#).await;
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[tokio::test]
    async fn test_leave_announces_to_remaining_members() {
        let state = test_state();
        let (alice, mut alice_rx) = connect(&state, "alice").await;
        let (bob, mut bob_rx) = connect(&state, "bob").await;
        dispatch_frame(&state, alice, "alice", r#"{"type":"JoinRoom","roomId":7}"#).await;
        dispatch_frame(&state, bob, "bob", r#"{"type":"JoinRoom","roomId":7}"#).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        dispatch_frame(&state, bob, "bob", r#"{"type":"LeaveRoom","roomId":7}"#).await;

        let to_alice = drain(&mut alice_rx);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0].event_type, EventType::UserLeft);
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_rejected_to_issuer_only() {
        let state = test_state();
        let (alice, mut alice_rx) = connect(&state, "alice").await;
        let (bob, mut bob_rx) = connect(&state, "bob").await;
        dispatch_frame(&state, alice, "alice", r#"{"type":"JoinRoom","roomId":7}"#).await;
        dispatch_frame(&state, bob, "bob", r#"{"type":"JoinRoom","roomId":7}"#).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        dispatch_frame(&state, alice, "alice", r#"{"type":"SendMessage","roomId":7,"text":"   "}"#).await;

        let to_alice = drain(&mut alice_rx);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0].event_type, EventType::CommandRejected);
        assert_eq!(to_alice[0].payload["command"], "SendMessage");
        assert_eq!(to_alice[0].payload["status"], 400);
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_frame_rejected() {
        let state = test_state();
        let (alice, mut alice_rx) = connect(&state, "alice").await;
        drain(&mut alice_rx);

        dispatch_frame(&state, alice, "alice", "not json").await;

        let events = drain(&mut alice_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["command"], "Unknown");
    }

    #[tokio::test]
    async fn test_send_message_reaches_room() {
        let state = test_state();
        let (alice, mut alice_rx) = connect(&state, "alice").await;
        dispatch_frame(&state, alice, "alice", r#"{"type":"JoinRoom","roomId":7}"#).await;
        drain(&mut alice_rx);

        dispatch_frame(&state, alice, "alice", r#"{"type":"SendMessage","roomId":7,"text":"hi"}"#).await;

        let events = drain(&mut alice_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::ReceiveMessage);
    }
}
