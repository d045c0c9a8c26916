//! Backend Module
//!
//! Server-side code, compiled only with the `ssr` feature.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── realtime/   - Connection registry, groups, transport, delivery router, /ws
//! ├── presence/   - Online/offline reconciliation
//! ├── chat/       - Message lifecycle, reactions, typing, notifications, handlers
//! ├── store/      - ChatStore trait with PostgreSQL and in-memory implementations
//! ├── middleware/ - Bearer-token authentication
//! ├── routes/     - Router assembly
//! ├── server/     - AppState, configuration, app creation
//! └── error/      - BackendError and its HTTP mapping
//! ```

/// Server setup and configuration
#[cfg(feature = "ssr")]
pub mod server;

/// Route configuration
#[cfg(feature = "ssr")]
pub mod routes;

/// Chat-related backend functionality
#[cfg(feature = "ssr")]
pub mod chat;

/// Real-time delivery
#[cfg(feature = "ssr")]
pub mod realtime;

/// Presence tracking
#[cfg(feature = "ssr")]
pub mod presence;

/// Durable storage
#[cfg(feature = "ssr")]
pub mod store;

/// Backend error types
#[cfg(feature = "ssr")]
pub mod error;

/// Middleware for request processing
#[cfg(feature = "ssr")]
pub mod middleware;

/// Re-export commonly used types
#[cfg(feature = "ssr")]
pub use server::create_app;
#[cfg(feature = "ssr")]
pub use error::BackendError;
