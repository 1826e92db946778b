//! Credential protection for catalog connections.
//!
//! # Module Structure
//! - `credentials`: zeroizing credential containers and the pooling identity
//! - `connection`: connection string parsing with credential extraction
//! - `vault`: reversible encoding of credentials kept in environment variables
//!
//! # Security Guarantees
//! - Credentials are stored in containers cleared on drop
//! - Passwords never appear in logs, errors or debug output

mod connection;
mod credentials;
pub mod vault;

pub use connection::parse_connection_string;
pub use credentials::{CredentialIdentity, Credentials};
pub use vault::{VaultValue, decode_secret, encode_secret};
