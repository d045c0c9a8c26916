/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct is the central container wiring the real-time core
 * together:
 * - the connection registry and group tracker (ephemeral)
 * - the channel transport the WebSocket adapter writes through
 * - the delivery router, built over the three above
 * - the presence manager, lifecycle coordinator, reaction fan-out and
 *   notification service, all sharing one `ChatStore`
 *
 * # Thread Safety
 *
 * Every component is internally synchronized and held in an `Arc`, so
 * cloning `AppState` per request is cheap.
 *
 * # Example
 *
 * ```rust,no_run
 * use chatbox::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) {
 *     let online = state.registry.online_users();
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::chat::{MessageLifecycleCoordinator, NotificationService, ReactionFanout};
use crate::backend::presence::PresenceManager;
use crate::backend::realtime::broadcast::DeliveryRouter;
use crate::backend::realtime::groups::GroupMembership;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::transport::ChannelTransport;
use crate::backend::store::ChatStore;
use crate::shared::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    pub store: Arc<dyn ChatStore>,

    pub registry: Arc<ConnectionRegistry>,

    pub groups: Arc<GroupMembership>,

    pub transport: Arc<ChannelTransport>,

    pub router: DeliveryRouter,

    pub presence: Arc<PresenceManager>,

    pub lifecycle: Arc<MessageLifecycleCoordinator>,

    pub reactions: Arc<ReactionFanout>,

    pub notifications: Arc<NotificationService>,
}

impl AppState {
    /// Wire every component over `store`
    pub fn new(config: AppConfig, store: Arc<dyn ChatStore>) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(ConnectionRegistry::new());
        let groups = Arc::new(GroupMembership::new());
        let transport = Arc::new(ChannelTransport::new());
        let router = DeliveryRouter::new(registry.clone(), groups.clone(), transport.clone());

        let presence = Arc::new(PresenceManager::new(
            registry.clone(),
            groups.clone(),
            router.clone(),
            store.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(store.clone(), router.clone()));
        let lifecycle = Arc::new(MessageLifecycleCoordinator::new(
            store.clone(),
            router.clone(),
            notifications.clone(),
            config.clone(),
        ));
        let reactions = Arc::new(ReactionFanout::new(store.clone(), router.clone()));

        Self {
            config,
            store,
            registry,
            groups,
            transport,
            router,
            presence,
            lifecycle,
            reactions,
            notifications,
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<MessageLifecycleCoordinator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.lifecycle.clone()
    }
}

impl FromRef<AppState> for Arc<ReactionFanout> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.reactions.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notifications.clone()
    }
}

impl FromRef<AppState> for Arc<PresenceManager> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}
