/**
 * Reaction Fan-out
 *
 * Adds and removes reactions and announces them to the right audience:
 *
 * - a reaction on a room message goes to every connection currently joined to
 *   that room
 * - a reaction on a private message goes to every connection of the two
 *   participants, whatever rooms they are in
 *
 * The audience is resolved when the action happens, for removal as well as
 * for addition. A member who left the room after a reaction was added does
 * not see it removed.
 */
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::{DeliveryReport, DeliveryRouter};
use crate::backend::store::ChatStore;
use crate::shared::message::RoomId;
use crate::shared::reaction::{Reaction, ReactionRequest, ReactionTarget};
use crate::shared::RealtimeEvent;

/// Who hears about a reaction
#[derive(Debug, Clone, PartialEq, Eq)]
enum Audience {
    Room(RoomId),
    Participants([String; 2]),
}

pub struct ReactionFanout {
    store: Arc<dyn ChatStore>,
    router: DeliveryRouter,
}

impl ReactionFanout {
    pub fn new(store: Arc<dyn ChatStore>, router: DeliveryRouter) -> Self {
        Self { store, router }
    }

    /// Validate, persist and announce a new reaction by `actor`.
    ///
    /// A request naming both or neither parent fails with `InvalidTarget`
    /// before anything is read or written.
    pub async fn add_reaction(
        &self,
        actor: &str,
        request: ReactionRequest,
    ) -> Result<Reaction, BackendError> {
        let new_reaction = request.into_new_reaction(actor)?;

        let audience = self.resolve_audience(new_reaction.target, false).await?;
        if let Audience::Participants(participants) = &audience {
            if !participants.iter().any(|p| p == actor) {
                return Err(BackendError::permission_denied(
                    "only participants may react to a private message",
                ));
            }
        }

        let reaction = self.store.create_reaction(new_reaction).await?;
        let report = self
            .announce(&audience, &RealtimeEvent::reaction_added(&reaction))
            .await;

        tracing::debug!(
            reaction_id = reaction.id,
            user = %actor,
            delivered = report.delivered,
            "[Reactions] Reaction added"
        );
        Ok(reaction)
    }

    /// Remove reaction `id`. Only the user who added it may remove it.
    pub async fn remove_reaction(&self, actor: &str, id: i64) -> Result<Reaction, BackendError> {
        let existing = self.store.get_reaction(id).await?;
        if existing.reacted_by != actor {
            tracing::warn!(reaction_id = id, user = %actor, "[Reactions] Removal by non-owner rejected");
            return Err(BackendError::permission_denied(
                "only the reacting user may remove a reaction",
            ));
        }

        let audience = self.resolve_audience(existing.target, true).await?;
        let removed = self.store.delete_reaction(id, actor).await?;
        let report = self
            .announce(&audience, &RealtimeEvent::reaction_removed(&removed))
            .await;

        tracing::debug!(
            reaction_id = id,
            user = %actor,
            delivered = report.delivered,
            "[Reactions] Reaction removed"
        );
        Ok(removed)
    }

    pub async fn list_reactions(&self, target: ReactionTarget) -> Result<Vec<Reaction>, BackendError> {
        self.store.list_reactions(target).await
    }

    async fn resolve_audience(
        &self,
        target: ReactionTarget,
        include_deleted: bool,
    ) -> Result<Audience, BackendError> {
        match target {
            ReactionTarget::RoomMessage(id) => {
                let message = self.store.get_message(id).await?;
                if message.is_deleted && !include_deleted {
                    return Err(BackendError::not_found("message", id));
                }
                Ok(Audience::Room(message.room_id))
            }
            ReactionTarget::PrivateMessage(id) => {
                let message = self.store.get_private_message(id).await?;
                if message.is_deleted && !include_deleted {
                    return Err(BackendError::not_found("private message", id));
                }
                Ok(Audience::Participants([
                    message.sender_username,
                    message.receiver_username,
                ]))
            }
        }
    }

    async fn announce(&self, audience: &Audience, event: &RealtimeEvent) -> DeliveryReport {
        match audience {
            Audience::Room(room) => self.router.deliver_to_room(*room, event).await,
            Audience::Participants([a, b]) => {
                self.router.deliver_to_users(&[a.as_str(), b.as_str()], event).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::groups::GroupMembership;
    use crate::backend::realtime::registry::{ConnectionId, ConnectionRegistry};
    use crate::backend::realtime::transport::{ChannelTransport, EventReceiver};
    use crate::backend::store::InMemoryStore;
    use crate::shared::event::EventType;
    use crate::shared::message::{NewMessage, NewPrivateMessage};
    use assert_matches::assert_matches;

    struct Harness {
        store: Arc<InMemoryStore>,
        registry: Arc<ConnectionRegistry>,
        groups: Arc<GroupMembership>,
        transport: Arc<ChannelTransport>,
        reactions: ReactionFanout,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let registry = Arc::new(ConnectionRegistry::new());
            let groups = Arc::new(GroupMembership::new());
            let transport = Arc::new(ChannelTransport::new());
            let router = DeliveryRouter::new(registry.clone(), groups.clone(), transport.clone());
            let reactions = ReactionFanout::new(store.clone(), router);
            Self {
                store,
                registry,
                groups,
                transport,
                reactions,
            }
        }

        fn connect(&self, user: &str, room: Option<RoomId>) -> (ConnectionId, EventReceiver) {
            let conn = ConnectionId::new();
            let rx = self.transport.attach(conn);
            self.registry.bind(conn, user);
            if let Some(room) = room {
                self.groups.join(conn, room);
            }
            (conn, rx)
        }
    }

    fn thumbs_up(message_id: Option<i64>, private_message_id: Option<i64>) -> ReactionRequest {
        ReactionRequest {
            reaction: "👍".into(),
            message_id,
            private_message_id,
        }
    }

    #[tokio::test]
    async fn test_both_parents_rejected_before_persistence() {
        let h = Harness::new();
        let result = h.reactions.add_reaction("alice", thumbs_up(Some(1), Some(2))).await;

        assert_matches!(result, Err(BackendError::InvalidTarget { .. }));
        assert!(h
            .store
            .list_reactions(ReactionTarget::RoomMessage(1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_missing_parent_is_not_found() {
        let h = Harness::new();
        let result = h.reactions.add_reaction("alice", thumbs_up(Some(42), None)).await;
        assert_matches!(result, Err(BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_room_reaction_goes_to_room_members() {
        let h = Harness::new();
        let message = h
            .store
            .create_message(NewMessage::new(7, "alice", "hi").unwrap())
            .await
            .unwrap();
        let (_c1, mut member) = h.connect("bob", Some(7));
        let (_c2, mut outsider) = h.connect("carol", Some(8));

        h.reactions
            .add_reaction("bob", thumbs_up(Some(message.id), None))
            .await
            .unwrap();

        assert_eq!(member.try_recv().unwrap().event_type, EventType::ReactionAdded);
        assert!(outsider.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_private_reaction_goes_to_participants_only() {
        let h = Harness::new();
        let message = h
            .store
            .create_private_message(NewPrivateMessage::new("alice", "bob", "psst").unwrap())
            .await
            .unwrap();
        let (_a, mut alice) = h.connect("alice", None);
        let (_b, mut bob) = h.connect("bob", Some(3));
        let (_c, mut carol) = h.connect("carol", Some(3));

        h.reactions
            .add_reaction("bob", thumbs_up(None, Some(message.id)))
            .await
            .unwrap();

        assert_eq!(alice.try_recv().unwrap().event_type, EventType::ReactionAdded);
        assert_eq!(bob.try_recv().unwrap().event_type, EventType::ReactionAdded);
        assert!(carol.try_recv().is_err());

        assert_matches!(
            h.reactions
                .add_reaction("carol", thumbs_up(None, Some(message.id)))
                .await,
            Err(BackendError::PermissionDenied { .. })
        );
    }

    #[tokio::test]
    async fn test_remove_requires_owner_and_reresolves_audience() {
        let h = Harness::new();
        let message = h
            .store
            .create_message(NewMessage::new(7, "alice", "hi").unwrap())
            .await
            .unwrap();
        let (bob_conn, mut bob) = h.connect("bob", Some(7));
        let (_c, mut carol) = h.connect("carol", Some(7));

        let reaction = h
            .reactions
            .add_reaction("bob", thumbs_up(Some(message.id), None))
            .await
            .unwrap();
        bob.try_recv().unwrap();
        carol.try_recv().unwrap();

        assert_matches!(
            h.reactions.remove_reaction("carol", reaction.id).await,
            Err(BackendError::PermissionDenied { .. })
        );
        assert!(carol.try_recv().is_err());

        h.groups.leave(bob_conn, 7);
        h.reactions.remove_reaction("bob", reaction.id).await.unwrap();

        assert_eq!(carol.try_recv().unwrap().event_type, EventType::ReactionRemoved);
        assert!(bob.try_recv().is_err());

        assert_matches!(
            h.reactions.remove_reaction("bob", reaction.id).await,
            Err(BackendError::NotFound { .. })
        );
    }
}
