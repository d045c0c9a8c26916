//! Server Module
//!
//! This module contains the server-side code for configuring and assembling
//! the Axum application.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Configuration loading and store selection
//! - **`init`** - App creation
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Environment configuration, database connection
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbox::backend::server::{create_app, load_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! let app = create_app(config).await?;
//! # Ok(())
//! # }
//! ```

/// Application state structure
pub mod state;

/// Configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::load_config;
pub use init::{build_state, create_app};
pub use state::AppState;
