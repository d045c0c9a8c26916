//! Chat Handlers Module
//!
//! Axum handlers for the REST surface. Each handler authenticates through
//! `AuthUser`, calls one operation on a core service and returns JSON;
//! failures become `BackendError` responses.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs           - Module exports and documentation
//! ├── messages.rs      - Room messages, receipts, edits and deletes
//! ├── private.rs       - Private messages
//! ├── reactions.rs     - Reaction add/remove/list
//! └── notifications.rs - Notifications and presence lookup
//! ```

pub mod messages;
pub mod notifications;
pub mod private;
pub mod reactions;
