/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server. They are
 * returned by the real-time core (registry, router, presence, lifecycle,
 * reactions) and by the store, and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Caller errors
 *
 * Recovered one layer above the core and never broadcast:
 * - `NotFound` - an entity id does not resolve
 * - `PermissionDenied` - the actor does not own the entity it tries to mutate
 * - `InvalidTarget` - a reaction references both or neither of its parents
 * - `Validation` - malformed input (empty text, oversized reaction)
 * - `Unauthorized` - missing or invalid bearer token
 *
 * ## Delivery errors
 *
 * - `ConnectionGone` - a delivery target vanished; swallowed by the router
 *
 * ## Storage errors
 *
 * - `StorageError` - the durable write failed; the event is aborted and
 *   nothing is broadcast
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::realtime::registry::ConnectionId;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatbox::backend::error::BackendError;
///
/// let err = BackendError::not_found("message", 42);
/// let err = BackendError::permission_denied("only the sender may edit this message");
/// let err = BackendError::storage("connection reset");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// An entity id does not resolve
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity, e.g. "message"
        entity: &'static str,
        /// The id or key that was looked up
        id: String,
    },

    /// The actor is not the owner of the entity it tried to mutate
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Human-readable error message
        message: String,
    },

    /// A reaction referencing both or neither of its parents
    #[error("Invalid target: {message}")]
    InvalidTarget {
        /// Human-readable error message
        message: String,
    },

    /// Best-effort delivery target vanished
    ///
    /// Only the transport produces this and the router never lets it escape.
    #[error("Connection {connection} is gone")]
    ConnectionGone {
        /// The connection that could not be reached
        connection: ConnectionId,
    },

    /// Durable write or read failure
    #[error("Storage error: {message}")]
    StorageError {
        /// Human-readable error message
        message: String,
    },

    /// Input validation error from the shared types
    #[error(transparent)]
    Validation(SharedError),

    /// Missing or invalid credentials at the HTTP edge
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },
}

impl BackendError {
    /// Create a new not-found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new permission error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn connection_gone(connection: ConnectionId) -> Self {
        Self::ConnectionGone { connection }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `NotFound` - 404 Not Found
    /// - `PermissionDenied` - 403 Forbidden
    /// - `InvalidTarget` / `Validation` - 400 Bad Request
    /// - `Unauthorized` - 401 Unauthorized
    /// - `StorageError` / `ConnectionGone` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            },
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::StorageError { .. } | Self::ConnectionGone { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error message
    ///
    /// Storage details are not exposed to callers.
    pub fn message(&self) -> String {
        match self {
            Self::StorageError { .. } => "Internal storage error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<SharedError> for BackendError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::InvalidTarget { message } => Self::InvalidTarget { message },
            other => Self::Validation(other),
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("row", "unknown"),
            other => Self::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = BackendError::not_found("message", 42);
        assert_eq!(error.to_string(), "message 42 not found");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            BackendError::permission_denied("nope").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BackendError::storage("db down").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BackendError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BackendError::connection_gone(ConnectionId::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_shared_error() {
        let backend_error: BackendError = SharedError::validation("text", "empty").into();
        assert!(matches!(backend_error, BackendError::Validation(_)));
        assert_eq!(backend_error.status_code(), StatusCode::BAD_REQUEST);

        let backend_error: BackendError = SharedError::invalid_target("both").into();
        assert!(matches!(backend_error, BackendError::InvalidTarget { .. }));
    }

    #[test]
    fn test_storage_message_hidden() {
        let error = BackendError::storage("password authentication failed for user chat");
        assert_eq!(error.message(), "Internal storage error");
    }

    #[test]
    fn test_sqlx_row_not_found() {
        let error: BackendError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, BackendError::NotFound { .. }));

        let error: BackendError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(error, BackendError::StorageError { .. }));
    }
}
