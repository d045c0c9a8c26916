//! In-process server fixture
//!
//! Wires `AppState` over an `InMemoryStore` and opens connections straight
//! on the `ChannelTransport`, so tests read exactly what a socket would have
//! been sent.

use std::sync::Arc;

use axum::Router;
use chatbox::backend::middleware::Claims;
use chatbox::backend::realtime::subscription::dispatch_frame;
use chatbox::backend::realtime::{ConnectionId, EventReceiver};
use chatbox::backend::routes::create_router;
use chatbox::backend::server::AppState;
use chatbox::backend::store::InMemoryStore;
use chatbox::shared::config::AppConfig;
use chatbox::shared::{EventType, RealtimeEvent};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use super::faulty_store::FaultyStore;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
}

pub struct TestConnection {
    pub id: ConnectionId,
    pub username: String,
    events: EventReceiver,
}

fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(TEST_SECRET)
        .build()
        .expect("test config is valid")
}

impl TestServer {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(test_config(), store.clone());
        Self { state, store }
    }

    /// Server whose store calls go through a [`FaultyStore`]
    pub fn with_faults() -> (Self, Arc<FaultyStore>) {
        let store = Arc::new(InMemoryStore::new());
        let faulty = Arc::new(FaultyStore::new(store.clone()));
        let state = AppState::new(test_config(), faulty.clone());
        (Self { state, store }, faulty)
    }

    /// Open an authenticated connection for `username`
    pub async fn connect(&self, username: &str) -> TestConnection {
        let id = ConnectionId::new();
        let events = self.state.transport.attach(id);
        self.state
            .presence
            .on_connect(id, username)
            .await
            .expect("connect succeeds");
        TestConnection {
            id,
            username: username.to_string(),
            events,
        }
    }

    pub async fn disconnect(&self, connection: &TestConnection) {
        self.state.transport.detach(connection.id);
        self.state
            .presence
            .on_disconnect(connection.id)
            .await
            .expect("disconnect succeeds");
    }

    /// Send a client command frame as if it arrived on the socket
    pub async fn command(&self, connection: &TestConnection, frame: serde_json::Value) {
        dispatch_frame(&self.state, connection.id, &connection.username, &frame.to_string()).await;
    }

    pub async fn join(&self, connection: &TestConnection, room_id: i64) {
        self.command(connection, serde_json::json!({ "type": "JoinRoom", "roomId": room_id }))
            .await;
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}

impl TestConnection {
    /// Everything queued for this connection so far
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn event_types(&mut self) -> Vec<EventType> {
        self.drain().into_iter().map(|e| e.event_type).collect()
    }
}

/// Sign an HS256 token for `username`, as the account service would
pub fn issue_token(username: &str, secret: &str, ttl_secs: u64) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: username.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token signs")
}

pub fn bearer(username: &str) -> String {
    format!("Bearer {}", issue_token(username, TEST_SECRET, 3600))
}
