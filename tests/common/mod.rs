//! Common test utilities and helpers
//!
//! - In-process server fixture over the in-memory store
//! - Fault-injecting store wrapper
//! - Bearer token helper
//! - Custom assertion macros

#![allow(dead_code)]

#[macro_use]
pub mod assertions;
pub mod faulty_store;
pub mod fixtures;

pub use fixtures::*;
