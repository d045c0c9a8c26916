//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! ├── chat_routes.rs  - WebSocket endpoint
//! └── api_routes.rs   - REST endpoints
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbox::backend::routes::create_router;
//! use chatbox::backend::server::state::AppState;
//! use chatbox::backend::store::InMemoryStore;
//! use chatbox::shared::config::AppConfig;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::builder().jwt_secret("secret").build()?;
//! let app = create_router(AppState::new(config, Arc::new(InMemoryStore::new())));
//! # Ok(())
//! # }
//! ```

pub mod api_routes;
pub mod chat_routes;
pub mod router;

pub use router::create_router;
