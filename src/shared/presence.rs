//! User presence.
//!
//! `isOnline` is derived from the number of live connections a user has.
//! Transitions are edge-triggered: only the first connection and the last
//! disconnection change the state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable presence record for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub username: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PresenceState {
    #[default]
    Offline,
    Online,
}

impl PresenceState {
    /// Next state given the number of live connections after a bind/unbind.
    ///
    /// Returns `None` when the state does not change.
    pub fn next(self, live_connections: usize) -> Option<PresenceState> {
        let target = if live_connections > 0 {
            Self::Online
        } else {
            Self::Offline
        };
        (target != self).then_some(target)
    }

    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}
