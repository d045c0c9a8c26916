/**
 * Notifications
 *
 * Persisted notices for a single user. A notification is written first and
 * then pushed as `ReceiveNotification` to every live connection of the
 * recipient; a recipient with no connections finds it on the next fetch.
 */
use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::DeliveryRouter;
use crate::backend::store::ChatStore;
use crate::shared::notification::{NewNotification, Notification};
use crate::shared::{RealtimeEvent, SharedError};

pub struct NotificationService {
    store: Arc<dyn ChatStore>,
    router: DeliveryRouter,
}

impl NotificationService {
    pub fn new(store: Arc<dyn ChatStore>, router: DeliveryRouter) -> Self {
        Self { store, router }
    }

    /// Persist a notification for `recipient` and push it to their connections
    pub async fn send(
        &self,
        recipient: &str,
        content: impl Into<String>,
        related_id: Option<i64>,
    ) -> Result<Notification, BackendError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SharedError::validation("content", "Notification content cannot be empty").into());
        }

        let notification = self
            .store
            .create_notification(NewNotification {
                recipient_username: recipient.to_string(),
                content,
                related_id,
            })
            .await?;

        let report = self
            .router
            .deliver_to_user(recipient, &RealtimeEvent::notification(&notification), None)
            .await;
        tracing::debug!(
            user = %recipient,
            notification_id = notification.id,
            delivered = report.delivered,
            "[Notifications] Notification sent"
        );
        Ok(notification)
    }

    pub async fn list(&self, username: &str) -> Result<Vec<Notification>, BackendError> {
        self.store.list_notifications(username).await
    }

    /// Mark one of `username`'s notifications read; someone else's is `NotFound`
    pub async fn mark_read(&self, id: i64, username: &str) -> Result<Notification, BackendError> {
        self.store.mark_notification_read(id, username).await
    }

    pub async fn mark_all_read(&self, username: &str) -> Result<u64, BackendError> {
        self.store.mark_all_notifications_read(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::groups::GroupMembership;
    use crate::backend::realtime::registry::{ConnectionId, ConnectionRegistry};
    use crate::backend::realtime::transport::ChannelTransport;
    use crate::backend::store::InMemoryStore;
    use crate::shared::event::EventType;

    #[tokio::test]
    async fn test_send_persists_and_delivers() {
        let registry = Arc::new(ConnectionRegistry::new());
        let transport = Arc::new(ChannelTransport::new());
        let router = DeliveryRouter::new(
            registry.clone(),
            Arc::new(GroupMembership::new()),
            transport.clone(),
        );
        let service = NotificationService::new(Arc::new(InMemoryStore::new()), router);

        let conn = ConnectionId::new();
        let mut rx = transport.attach(conn);
        registry.bind(conn, "bob");

        let sent = service.send("bob", "You have a new message", Some(4)).await.unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, EventType::ReceiveNotification);
        assert_eq!(event.payload["id"], sent.id);

        let listed = service.list("bob").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(service.list("alice").await.unwrap().is_empty());

        assert_eq!(service.mark_all_read("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_content_rejected() {
        let router = DeliveryRouter::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(GroupMembership::new()),
            Arc::new(ChannelTransport::new()),
        );
        let service = NotificationService::new(Arc::new(InMemoryStore::new()), router);

        let result = service.send("bob", "  ", None).await;
        assert!(matches!(result, Err(BackendError::Validation(_))));
    }
}
