//! Real-time Delivery Module
//!
//! Everything between "this event should reach these people" and bytes on a
//! socket.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── registry.rs     - ConnectionId and the user <-> connection registry
//! ├── groups.rs       - Room membership per connection
//! ├── transport.rs    - Transport trait and the mpsc-backed ChannelTransport
//! ├── broadcast.rs    - DeliveryRouter: resolve an audience, send, report
//! └── subscription.rs - GET /ws connection actor and client commands
//! ```
//!
//! # Delivery
//!
//! The router resolves its audience from the registry and group tracker at
//! send time. Failed sends are counted in the `DeliveryReport` and never fail
//! the operation that triggered them; the store already holds the state.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbox::backend::realtime::{DeliveryRouter, ChannelTransport, ConnectionRegistry, GroupMembership};
//! use chatbox::shared::RealtimeEvent;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let registry = Arc::new(ConnectionRegistry::new());
//! let groups = Arc::new(GroupMembership::new());
//! let transport = Arc::new(ChannelTransport::new());
//! let router = DeliveryRouter::new(registry, groups, transport);
//!
//! let report = router.deliver_to_room(7, &RealtimeEvent::user_left(7, "alice")).await;
//! assert_eq!(report.attempted(), 0);
//! # }
//! ```

pub mod broadcast;
pub mod groups;
pub mod registry;
pub mod subscription;
pub mod transport;

pub use broadcast::{DeliveryReport, DeliveryRouter};
pub use groups::GroupMembership;
pub use registry::{Binding, ConnectionId, ConnectionRegistry};
pub use subscription::{handle_ws, ClientCommand};
pub use transport::{ChannelTransport, EventReceiver, Transport};
