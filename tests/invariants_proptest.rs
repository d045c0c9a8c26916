//! Property-based tests for registry, presence and status invariants

#[cfg(feature = "ssr")]
#[macro_use]
mod common;

#[cfg(feature = "ssr")]
mod tests {
    use super::common::TestServer;
    use chatbox::backend::realtime::{ConnectionId, ConnectionRegistry};
    use chatbox::backend::store::{ChatStore, InMemoryStore};
    use chatbox::shared::message::NewMessage;
    use chatbox::shared::{EventType, MessageStatus};
    use proptest::prelude::*;
    use std::collections::HashMap;

    const USERS: [&str; 3] = ["alice", "bob", "carol"];
    const CONNECTIONS: usize = 6;

    /// (bind?, connection index); connection `i` always belongs to `USERS[i % 3]`
    fn ops() -> impl Strategy<Value = Vec<(bool, usize)>> {
        prop::collection::vec((any::<bool>(), 0..CONNECTIONS), 0..60)
    }

    fn status() -> impl Strategy<Value = MessageStatus> {
        prop_oneof![
            Just(MessageStatus::Sent),
            Just(MessageStatus::Delivered),
            Just(MessageStatus::Seen),
        ]
    }

    proptest! {
        #[test]
        fn test_online_iff_connections(ops in ops()) {
            let registry = ConnectionRegistry::new();
            let ids: Vec<ConnectionId> = (0..CONNECTIONS).map(|_| ConnectionId::new()).collect();
            let mut model: HashMap<&str, usize> = HashMap::new();
            let mut bound = [false; CONNECTIONS];

            for (bind, index) in ops {
                let user = USERS[index % USERS.len()];
                if bind {
                    registry.bind(ids[index], user);
                    if !bound[index] {
                        *model.entry(user).or_default() += 1;
                    }
                    bound[index] = true;
                } else {
                    let binding = registry.unbind(ids[index]);
                    prop_assert_eq!(binding.is_some(), bound[index]);
                    if bound[index] {
                        *model.entry(user).or_default() -= 1;
                    }
                    bound[index] = false;
                }

                for user in USERS {
                    let live = registry.connections_for(user);
                    prop_assert_eq!(registry.is_online(user), !live.is_empty());
                    prop_assert_eq!(live.len(), model.get(user).copied().unwrap_or(0));
                }
            }
        }

        #[test]
        fn test_presence_transitions_alternate(ops in ops()) {
            tokio_test::block_on(async {
                let server = TestServer::new();
                let mut watcher = server.connect("watcher").await;
                watcher.drain();
                let ids: Vec<ConnectionId> = (0..CONNECTIONS).map(|_| ConnectionId::new()).collect();
                let mut last: HashMap<String, EventType> = HashMap::new();

                for (bind, index) in ops {
                    let user = USERS[index % USERS.len()];
                    if bind {
                        server.state.presence.on_connect(ids[index], user).await.unwrap();
                    } else {
                        server.state.presence.on_disconnect(ids[index]).await.unwrap();
                    }

                    for event in watcher.drain() {
                        let username = event.payload["username"].as_str().unwrap().to_string();
                        let previous = last.insert(username, event.event_type);
                        match event.event_type {
                            EventType::UserConnected => {
                                assert_ne!(previous, Some(EventType::UserConnected));
                            }
                            EventType::UserDisconnected => {
                                assert_eq!(previous, Some(EventType::UserConnected));
                            }
                            other => panic!("unexpected event {other}"),
                        }
                    }

                    for user in USERS {
                        assert_eq!(
                            server.state.presence.state_of(user).is_online(),
                            server.state.registry.is_online(user)
                        );
                    }
                }
            });
        }

        #[test]
        fn test_status_never_moves_backward(targets in prop::collection::vec(status(), 1..12)) {
            let store = InMemoryStore::new();
            tokio_test::block_on(async {
                let message = store
                    .create_message(NewMessage::new(7, "alice", "hi").unwrap())
                    .await
                    .unwrap();
                let mut highest = MessageStatus::Sent;

                for target in targets {
                    let moved = store.update_message_status(&[message.id], target).await.unwrap();
                    assert_eq!(moved.len(), usize::from(target > highest));
                    highest = highest.max(target);

                    let current = store.get_message(message.id).await.unwrap();
                    assert_eq!(current.status, highest);
                }
            });
        }
    }
}
