// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! Chatbox - Main Library
//!
//! Chatbox is the real-time core of a chat service: it tracks who is
//! connected, which rooms each connection has joined and who is online, and
//! turns every chat action into a durable write followed by an ordered
//! real-time announcement.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between the server and its clients
//!   - Messages, private messages, reactions, notifications, presence
//!   - The `RealtimeEvent` envelope pushed to clients
//!   - Configuration and validation errors
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Connection registry, group membership and delivery router
//!   - Presence manager, message lifecycle and reaction fan-out
//!   - PostgreSQL and in-memory stores
//!   - Axum REST routes and the `/ws` WebSocket endpoint
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend and the `chatbox-server` binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatbox::backend::server::{create_app, load_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(load_config()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Every mutating operation persists before it broadcasts, so a client that
//! refetches after an event always sees the state that event describes.
//! Presence transitions for one user are serialized; different users never
//! wait on each other.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
