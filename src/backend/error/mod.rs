//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Propagation
//!
//! - `NotFound`, `PermissionDenied`, `InvalidTarget` and `Validation` are
//!   returned to the caller and produce no real-time side effects.
//! - `ConnectionGone` never leaves the delivery router.
//! - `StorageError` aborts the whole event before anything is broadcast.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
