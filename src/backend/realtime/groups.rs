/**
 * Group Membership Tracker
 *
 * Per-connection set of joined rooms. Memberships live exactly as long as the
 * connection; clients rejoin explicitly after reconnecting.
 *
 * # Consistency
 *
 * `rooms_by_conn` is the authoritative map. `members_by_room` is an index used
 * to find candidate connections for a room quickly. `members_of` filters every
 * candidate against the authoritative map, so dropping a connection (a single
 * `remove` on `rooms_by_conn`) hides all of its memberships at once even while
 * the index is still being cleaned up.
 */
use dashmap::DashMap;
use std::collections::HashSet;

use crate::backend::realtime::registry::ConnectionId;
use crate::shared::message::RoomId;

#[derive(Debug, Default)]
pub struct GroupMembership {
    rooms_by_conn: DashMap<ConnectionId, HashSet<RoomId>>,
    members_by_room: DashMap<RoomId, HashSet<ConnectionId>>,
}

impl GroupMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to `room`. Returns `false` if it was already a member.
    pub fn join(&self, connection: ConnectionId, room: RoomId) -> bool {
        let newly_joined = self.rooms_by_conn.entry(connection).or_default().insert(room);
        if newly_joined {
            self.members_by_room.entry(room).or_default().insert(connection);
            tracing::debug!(connection = %connection, room_id = room, "[Groups] Joined room");
        }
        newly_joined
    }

    /// Remove `connection` from `room`. Returns `false` if it was not a member.
    pub fn leave(&self, connection: ConnectionId, room: RoomId) -> bool {
        let removed = self
            .rooms_by_conn
            .get_mut(&connection)
            .map(|mut rooms| rooms.remove(&room))
            .unwrap_or(false);
        if removed {
            self.remove_from_index(connection, room);
            tracing::debug!(connection = %connection, room_id = room, "[Groups] Left room");
        }
        removed
    }

    /// Drop every membership of `connection` in one step.
    ///
    /// Returns the rooms it had joined.
    pub fn drop_connection(&self, connection: ConnectionId) -> Vec<RoomId> {
        let Some((_, rooms)) = self.rooms_by_conn.remove(&connection) else {
            return Vec::new();
        };
        for room in &rooms {
            self.remove_from_index(connection, *room);
        }
        tracing::debug!(
            connection = %connection,
            rooms = rooms.len(),
            "[Groups] Dropped connection memberships"
        );
        rooms.into_iter().collect()
    }

    /// Connections currently joined to `room`
    pub fn members_of(&self, room: RoomId) -> Vec<ConnectionId> {
        let candidates: Vec<ConnectionId> = self
            .members_by_room
            .get(&room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        candidates
            .into_iter()
            .filter(|conn| {
                self.rooms_by_conn
                    .get(conn)
                    .map(|rooms| rooms.contains(&room))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn rooms_of(&self, connection: ConnectionId) -> Vec<RoomId> {
        self.rooms_by_conn
            .get(&connection)
            .map(|rooms| rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, connection: ConnectionId, room: RoomId) -> bool {
        self.rooms_by_conn
            .get(&connection)
            .map(|rooms| rooms.contains(&room))
            .unwrap_or(false)
    }

    fn remove_from_index(&self, connection: ConnectionId, room: RoomId) {
        if let Some(mut members) = self.members_by_room.get_mut(&room) {
            members.remove(&connection);
        }
        self.members_by_room.remove_if(&room, |_, members| members.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let groups = GroupMembership::new();
        let c = ConnectionId::new();

        assert!(groups.join(c, 7));
        assert!(!groups.join(c, 7));
        assert_eq!(groups.members_of(7), vec![c]);
    }

    #[test]
    fn test_leave_non_member_is_noop() {
        let groups = GroupMembership::new();
        let c = ConnectionId::new();

        assert!(!groups.leave(c, 7));
        groups.join(c, 7);
        assert!(groups.leave(c, 7));
        assert!(!groups.leave(c, 7));
        assert!(groups.members_of(7).is_empty());
    }

    #[test]
    fn test_drop_connection_removes_all_rooms() {
        let groups = GroupMembership::new();
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();
        groups.join(c1, 1);
        groups.join(c1, 2);
        groups.join(c2, 2);

        let mut dropped = groups.drop_connection(c1);
        dropped.sort();
        assert_eq!(dropped, vec![1, 2]);

        assert!(groups.members_of(1).is_empty());
        assert_eq!(groups.members_of(2), vec![c2]);
        assert!(groups.rooms_of(c1).is_empty());
        assert!(groups.drop_connection(c1).is_empty());
    }

    #[test]
    fn test_members_are_room_scoped() {
        let groups = GroupMembership::new();
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();
        groups.join(c1, 1);
        groups.join(c2, 2);

        assert_eq!(groups.members_of(1), vec![c1]);
        assert!(groups.is_member(c2, 2));
        assert!(!groups.is_member(c2, 1));
    }
}
