//! Configuration types for the catalog adapter.
//!
//! - `ConnectionConfig`: where the catalog lives
//! - `environment`: resolution of flags, environment variables and vault
//!   encoded credentials into a connection target
//!
//! # Security
//! These configuration structs intentionally do NOT store passwords.
//! Credentials are handled separately through the security module.

mod connection;
pub mod environment;

pub use connection::{ConnectionConfig, DEFAULT_PORT};
pub use environment::{ConnectionOverrides, ResolvedConnection, ShellKind};
