//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. These types are used for serialization over
//! the REST API and the real-time WebSocket channel.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. Nothing in here depends on the `ssr`
//! feature.

/// Room and private message structures
pub mod message;

/// Reaction types
pub mod reaction;

/// Presence types
pub mod presence;

/// Notification types
pub mod notification;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{EventType, RealtimeEvent};
pub use message::{EditLogEntry, Message, MessageStatus, PrivateMessage};
pub use notification::Notification;
pub use presence::{PresenceState, UserPresence};
pub use reaction::{Reaction, ReactionTarget};
