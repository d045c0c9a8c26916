//! Shared Error Types
//!
//! This module defines error types that are shared between the frontend and backend.
//! They describe input that is malformed before any server-side state is touched.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - A field failed validation (empty text, oversized emoji)
//! - `InvalidTarget` - A reaction referenced both or neither of its possible parents
//!
//! # Usage
//!
//! ```rust
//! use chatbox::shared::error::SharedError;
//!
//! let error = SharedError::validation("text", "Message text cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types that can occur in both frontend and backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A reaction target that is not exactly one of room message / private message
    #[error("Invalid reaction target: {message}")]
    InvalidTarget {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid-target error
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
