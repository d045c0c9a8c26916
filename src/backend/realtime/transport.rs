/**
 * Transport Contract
 *
 * The router never talks to sockets directly. It hands each event to a
 * `Transport`, which either queues it for the connection or reports
 * `ConnectionGone`.
 *
 * `ChannelTransport` keeps one unbounded mpsc sender per live connection. The
 * WebSocket adapter attaches a connection, drains the receiver in its writer
 * task and detaches on exit. Tests attach connections and read the receivers
 * directly.
 */
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::backend::error::BackendError;
use crate::backend::realtime::registry::ConnectionId;
use crate::shared::RealtimeEvent;

/// Outbound half of the wire transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push `event` to one connection.
    ///
    /// Fails with `BackendError::ConnectionGone` if the connection is closed.
    async fn send(&self, connection: ConnectionId, event: &RealtimeEvent) -> Result<(), BackendError>;
}

pub type EventReceiver = mpsc::UnboundedReceiver<RealtimeEvent>;

#[derive(Debug, Default)]
pub struct ChannelTransport {
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<RealtimeEvent>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound queue for `connection`
    pub fn attach(&self, connection: ConnectionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(connection, tx);
        rx
    }

    /// Close the outbound queue; later sends yield `ConnectionGone`
    pub fn detach(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
    }

    pub fn is_attached(&self, connection: ConnectionId) -> bool {
        self.senders
            .get(&connection)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, connection: ConnectionId, event: &RealtimeEvent) -> Result<(), BackendError> {
        let sender = self
            .senders
            .get(&connection)
            .map(|tx| tx.clone())
            .ok_or_else(|| BackendError::connection_gone(connection))?;

        sender
            .send(event.clone())
            .map_err(|_| BackendError::connection_gone(connection))
    }
}
