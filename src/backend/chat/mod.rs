//! Chat Backend Module
//!
//! Everything that turns a chat action into a durable write followed by a
//! real-time announcement:
//!
//! - **`lifecycle`** - room and private messages, edits, soft deletes,
//!   delivered/seen receipts
//! - **`reactions`** - reaction add/remove and audience resolution
//! - **`typing`** - typing indicators (not persisted)
//! - **`notifications`** - persisted per-user notifications
//! - **`handlers`** - Axum handlers for the REST surface
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbox::backend::chat::MessageLifecycleCoordinator;
//!
//! # async fn example(lifecycle: &MessageLifecycleCoordinator) -> Result<(), chatbox::backend::error::BackendError> {
//! let message = lifecycle.send_room_message(7, "alice", "hi").await?;
//! lifecycle.mark_room_seen(7, "bob").await?;
//! # Ok(())
//! # }
//! ```

/// Message lifecycle coordination
pub mod lifecycle;

/// Reaction fan-out
pub mod reactions;

/// Typing indicators
pub mod typing;

/// Persisted notifications
pub mod notifications;

/// HTTP handlers
pub mod handlers;

/// Re-export commonly used types
pub use lifecycle::MessageLifecycleCoordinator;
pub use notifications::NotificationService;
pub use reactions::ReactionFanout;
pub use typing::notify_typing;
