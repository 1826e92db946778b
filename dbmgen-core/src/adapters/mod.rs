//! Catalog adapter seams, connection pooling and configuration.
//!
//! A [`Connector`] opens live [`CatalogSource`] connections for a
//! [`CredentialIdentity`]; the [`ConnectionRegistry`] deduplicates them so
//! that each identity is connected at most once per process.
//!
//! # Module Structure
//! - `config`: connection configuration and environment resolution
//! - `registry`: identity-keyed connection cache with explicit shutdown
//! - `mysql`: sqlx-backed MySQL catalog adapter (feature `mysql`)
//!
//! # Security Guarantees
//! - All catalog operations are read-only
//! - Credentials are never stored in returned metadata or logged

use crate::Result;
use crate::error::DbmError;
use crate::models::CatalogTable;
use crate::security::CredentialIdentity;
use async_trait::async_trait;
use std::sync::Arc;

pub mod config;
pub mod registry;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use config::{ConnectionConfig, ConnectionOverrides, DEFAULT_PORT, ResolvedConnection};
pub use registry::ConnectionRegistry;

/// A live catalog connection.
///
/// # Object Safety
/// This trait is object-safe; sources are shared as `Arc<dyn CatalogSource>`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Describes one table's columns in ordinal order.
    ///
    /// An unknown table yields an empty column list; callers decide whether
    /// that is fatal.
    ///
    /// # Errors
    /// Returns a query error carrying the query text if the catalog query fails.
    async fn describe_table(&self, database: &str, table: &str) -> Result<CatalogTable>;

    /// Closes the connection. Called exactly once, by registry shutdown.
    async fn close(&self);
}

/// Opens catalog connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection for the identity.
    ///
    /// # Errors
    /// Returns a connection error if the server cannot be reached or rejects
    /// the credentials.
    async fn connect(&self, identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>>;
}

/// Connector of builds without a database driver; every connect fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableConnector;

#[async_trait]
impl Connector for UnavailableConnector {
    async fn connect(&self, _identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>> {
        Err(DbmError::configuration(
            "No database driver available. Compile with --features mysql",
        ))
    }
}

/// Connector for the compiled-in database driver
pub fn default_connector() -> Arc<dyn Connector> {
    #[cfg(feature = "mysql")]
    {
        Arc::new(mysql::MySqlConnector::default())
    }
    #[cfg(not(feature = "mysql"))]
    {
        Arc::new(UnavailableConnector)
    }
}
