//! Presence Manager
//!
//! Turns connection arrivals and departures into edge-triggered presence
//! transitions:
//!
//! - `Offline -> Online` when a user's first connection is bound
//! - `Online -> Offline` when the registry reports zero connections for the
//!   user, evaluated after the unbind has completed
//!
//! Each transition is persisted (`isOnline`, `lastSeen`) before it is
//! broadcast to every live connection. Reconciliation for one user runs under
//! a striped lock, so a reconnect storm yields at most one broadcast per real
//! transition and the broadcasts for a user go out in the order they happened.

use chrono::Utc;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::DeliveryRouter;
use crate::backend::realtime::groups::GroupMembership;
use crate::backend::realtime::registry::{ConnectionId, ConnectionRegistry};
use crate::backend::store::ChatStore;
use crate::shared::presence::{PresenceState, UserPresence};
use crate::shared::RealtimeEvent;

const LOCK_STRIPES: usize = 64;

pub struct PresenceManager {
    registry: Arc<ConnectionRegistry>,
    groups: Arc<GroupMembership>,
    router: DeliveryRouter,
    store: Arc<dyn ChatStore>,
    /// Last state announced per user; absent means `Offline`
    states: DashMap<String, PresenceState>,
    stripes: Vec<Mutex<()>>,
}

impl PresenceManager {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        groups: Arc<GroupMembership>,
        router: DeliveryRouter,
        store: Arc<dyn ChatStore>,
    ) -> Self {
        Self {
            registry,
            groups,
            router,
            store,
            states: DashMap::new(),
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Reset durable presence at startup.
    ///
    /// The registry starts empty, so nobody is reachable until they reconnect.
    pub async fn initialize(&self) -> Result<(), BackendError> {
        let reset = self.store.mark_all_offline().await?;
        if reset > 0 {
            tracing::info!("[Presence] Reset {} stale online flags", reset);
        }
        Ok(())
    }

    /// A transport connection was authenticated as `username`.
    ///
    /// Returns the transition that was broadcast, if any. If the transition
    /// cannot be persisted the binding is undone and the caller must close
    /// the connection.
    pub async fn on_connect(
        &self,
        connection: ConnectionId,
        username: &str,
    ) -> Result<Option<PresenceState>, BackendError> {
        self.registry.bind(connection, username);
        match self.reconcile(username).await {
            Ok(transition) => Ok(transition),
            Err(err) => {
                self.registry.unbind(connection);
                Err(err)
            }
        }
    }

    /// A transport connection closed.
    ///
    /// Drops its room memberships, unbinds it and reconciles the owner's
    /// presence. Safe to call more than once for the same connection.
    pub async fn on_disconnect(
        &self,
        connection: ConnectionId,
    ) -> Result<Option<PresenceState>, BackendError> {
        self.groups.drop_connection(connection);

        let Some(binding) = self.registry.unbind(connection) else {
            tracing::debug!(connection = %connection, "[Presence] Disconnect for unknown connection");
            return Ok(None);
        };

        self.reconcile(&binding.username).await
    }

    /// Durable presence record for `username`
    pub async fn presence_of(&self, username: &str) -> Result<UserPresence, BackendError> {
        self.store.get_user_presence(username).await
    }

    /// Last announced state; follows the registry once reconciliation settles
    pub fn state_of(&self, username: &str) -> PresenceState {
        self.states
            .get(username)
            .map(|state| *state)
            .unwrap_or_default()
    }

    async fn reconcile(&self, username: &str) -> Result<Option<PresenceState>, BackendError> {
        let _guard = self.stripe(username).lock().await;

        let current = self.state_of(username);
        let live = self.registry.connections_for(username).len();
        let Some(next) = current.next(live) else {
            return Ok(None);
        };

        let last_seen = Utc::now();
        if let Err(err) = self
            .store
            .set_user_presence(username, next.is_online(), last_seen)
            .await
        {
            tracing::error!(user = %username, "[Presence] Failed to persist presence: {}", err);
            return Err(err);
        }

        match next {
            PresenceState::Online => {
                self.states.insert(username.to_string(), next);
            }
            PresenceState::Offline => {
                self.states.remove(username);
            }
        }

        let event = match next {
            PresenceState::Online => RealtimeEvent::user_connected(username, last_seen),
            PresenceState::Offline => RealtimeEvent::user_disconnected(username, last_seen),
        };
        let report = self.router.deliver_to_all(&event).await;

        tracing::info!(
            user = %username,
            state = ?next,
            delivered = report.delivered,
            "[Presence] User is now {:?}",
            next
        );
        Ok(Some(next))
    }

    fn stripe(&self, username: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        username.hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }
}
