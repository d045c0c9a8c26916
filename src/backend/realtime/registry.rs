/**
 * Connection Registry
 *
 * Bidirectional mapping between live connection ids and the authenticated
 * usernames that own them. A user may hold any number of connections (one per
 * device or tab).
 *
 * # Synchronization
 *
 * Both directions are `DashMap`s, so unrelated users never contend on the same
 * shard lock. Per-user connection sets are mutated only while holding that
 * user's entry guard, and the two maps are never locked at the same time.
 *
 * The registry is a best-effort cache of who is reachable right now. It is
 * rebuilt from scratch on every process start.
 */
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Opaque id issued by the transport layer for one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of removing a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The user the connection belonged to
    pub username: String,
    /// Connections the user still holds after the removal
    pub live_connections: usize,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    owners: DashMap<ConnectionId, String>,
    by_user: DashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `connection` belongs to `username`.
    ///
    /// Returns the number of connections the user holds afterwards.
    pub fn bind(&self, connection: ConnectionId, username: &str) -> usize {
        self.owners.insert(connection, username.to_string());

        let mut entry = self.by_user.entry(username.to_string()).or_default();
        entry.insert(connection);
        let live = entry.len();
        drop(entry);

        tracing::debug!(
            connection = %connection,
            user = %username,
            live,
            "[Registry] Connection bound"
        );
        live
    }

    /// Remove the binding for `connection`.
    ///
    /// Returns `None` if the connection was not bound (double unbind).
    pub fn unbind(&self, connection: ConnectionId) -> Option<Binding> {
        let (_, username) = self.owners.remove(&connection)?;

        let live = match self.by_user.get_mut(&username) {
            Some(mut set) => {
                set.remove(&connection);
                set.len()
            }
            None => 0,
        };
        if live == 0 {
            // A concurrent bind may have refilled the set between the guard
            // above and this removal.
            self.by_user.remove_if(&username, |_, set| set.is_empty());
        }

        let live_connections = self.connections_for(&username).len();
        tracing::debug!(
            connection = %connection,
            user = %username,
            live = live_connections,
            "[Registry] Connection unbound"
        );

        Some(Binding {
            username,
            live_connections,
        })
    }

    /// Snapshot of the user's live connections; empty if none
    pub fn connections_for(&self, username: &str) -> Vec<ConnectionId> {
        self.by_user
            .get(username)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_online(&self, username: &str) -> bool {
        self.by_user
            .get(username)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// The user bound to `connection`, if any
    pub fn username_of(&self, connection: ConnectionId) -> Option<String> {
        self.owners.get(&connection).map(|name| name.clone())
    }

    /// Every live connection across all users
    pub fn all_connections(&self) -> Vec<ConnectionId> {
        self.owners.iter().map(|entry| *entry.key()).collect()
    }

    pub fn online_users(&self) -> Vec<String> {
        self.by_user
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.owners.len()
    }
}
