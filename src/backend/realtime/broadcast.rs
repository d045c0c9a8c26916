/**
 * Delivery Router
 *
 * Resolves an audience (a room, a user, a set of users, or everyone) against
 * the connection registry and group tracker at call time, then pushes the
 * event to every resolved connection.
 *
 * # Delivery
 *
 * Sends for one event are dispatched concurrently and awaited together, so
 * the call returns only after every connection has been attempted. A failed
 * send (the connection closed mid-delivery) is logged at `debug` and counted
 * in the returned [`DeliveryReport`]; it never fails the call. Cleanup of the
 * vanished connection is left to its own disconnect path.
 *
 * The router only reads the registry and the group tracker.
 */
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::realtime::groups::GroupMembership;
use crate::backend::realtime::registry::{ConnectionId, ConnectionRegistry};
use crate::backend::realtime::transport::Transport;
use crate::shared::message::RoomId;
use crate::shared::RealtimeEvent;

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

#[derive(Clone)]
pub struct DeliveryRouter {
    registry: Arc<ConnectionRegistry>,
    groups: Arc<GroupMembership>,
    transport: Arc<dyn Transport>,
}

impl DeliveryRouter {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        groups: Arc<GroupMembership>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            groups,
            transport,
        }
    }

    /// Deliver to every connection currently joined to `room`
    pub async fn deliver_to_room(&self, room: RoomId, event: &RealtimeEvent) -> DeliveryReport {
        self.deliver_to_room_except(room, event, None).await
    }

    /// Deliver to the room, skipping `exclude` (e.g. the typist's own connection)
    pub async fn deliver_to_room_except(
        &self,
        room: RoomId,
        event: &RealtimeEvent,
        exclude: Option<ConnectionId>,
    ) -> DeliveryReport {
        let audience = without(self.groups.members_of(room), exclude);
        let report = self.dispatch(&audience, event).await;
        tracing::debug!(
            room_id = room,
            event = %event.event_type,
            delivered = report.delivered,
            failed = report.failed,
            "[Router] Room delivery"
        );
        report
    }

    /// Deliver to every connection of `username`, optionally skipping one
    pub async fn deliver_to_user(
        &self,
        username: &str,
        event: &RealtimeEvent,
        exclude: Option<ConnectionId>,
    ) -> DeliveryReport {
        let audience = without(self.registry.connections_for(username), exclude);
        let report = self.dispatch(&audience, event).await;
        tracing::debug!(
            user = %username,
            event = %event.event_type,
            delivered = report.delivered,
            failed = report.failed,
            "[Router] User delivery"
        );
        report
    }

    /// Deliver to every connection of each user; each connection receives the event once
    pub async fn deliver_to_users(&self, usernames: &[&str], event: &RealtimeEvent) -> DeliveryReport {
        let mut seen = HashSet::new();
        let audience: Vec<ConnectionId> = usernames
            .iter()
            .flat_map(|name| self.registry.connections_for(name))
            .filter(|conn| seen.insert(*conn))
            .collect();
        self.dispatch(&audience, event).await
    }

    /// Deliver to every live connection
    pub async fn deliver_to_all(&self, event: &RealtimeEvent) -> DeliveryReport {
        let audience = self.registry.all_connections();
        let report = self.dispatch(&audience, event).await;
        tracing::debug!(
            event = %event.event_type,
            delivered = report.delivered,
            failed = report.failed,
            "[Router] Broadcast to all"
        );
        report
    }

    /// Deliver to exactly one connection
    pub async fn deliver_to_connection(
        &self,
        connection: ConnectionId,
        event: &RealtimeEvent,
    ) -> DeliveryReport {
        self.dispatch(&[connection], event).await
    }

    /// Whether `username` has at least one live connection right now
    pub fn is_reachable(&self, username: &str) -> bool {
        self.registry.is_online(username)
    }

    async fn dispatch(&self, audience: &[ConnectionId], event: &RealtimeEvent) -> DeliveryReport {
        let sends = audience.iter().map(|conn| {
            let transport = self.transport.clone();
            async move { (*conn, transport.send(*conn, event).await) }
        });

        let mut report = DeliveryReport::default();
        for (conn, result) in join_all(sends).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::debug!(
                        connection = %conn,
                        event = %event.event_type,
                        "[Router] Delivery failed: {}",
                        err
                    );
                }
            }
        }
        report
    }
}

fn without(connections: Vec<ConnectionId>, exclude: Option<ConnectionId>) -> Vec<ConnectionId> {
    match exclude {
        Some(skip) => connections.into_iter().filter(|c| *c != skip).collect(),
        None => connections,
    }
}
