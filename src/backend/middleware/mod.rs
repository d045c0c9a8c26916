//! Middleware Module
//!
//! This module contains request processing shared by all routes.
//!
//! - **`auth`** - bearer-token verification and the `AuthUser` extractor
//!
//! # Example
//!
//! ```rust,no_run
//! use chatbox::backend::middleware::AuthUser;
//!
//! async fn whoami(AuthUser(username): AuthUser) -> String {
//!     username
//! }
//! ```

pub mod auth;

pub use auth::{verify_token, AuthUser, Claims};
