//! MySQL catalog adapter.
//!
//! # Module Structure
//! - `connection`: connector opening single-connection sqlx pools
//! - `catalog`: the fixed catalog query and row decoding
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT on INFORMATION_SCHEMA only)
//! - Sessions are switched to read-only transactions on connect
//! - Passwords never appear in error messages

pub mod catalog;
pub mod connection;

#[cfg(test)]
mod tests;

use super::CatalogSource;
use crate::Result;
use crate::models::CatalogTable;
use async_trait::async_trait;
use sqlx::MySqlPool;

pub use catalog::{CATALOG_QUERY, CatalogRow};
pub use connection::MySqlConnector;

/// Live MySQL catalog connection
pub struct MySqlCatalog {
    pool: MySqlPool,
    /// `user@host:port/database`, never the password
    label: String,
}

impl std::fmt::Debug for MySqlCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlCatalog")
            .field("target", &self.label)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl MySqlCatalog {
    pub(crate) fn new(pool: MySqlPool, label: String) -> Self {
        Self { pool, label }
    }

    /// Connection target label without credentials
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl CatalogSource for MySqlCatalog {
    async fn describe_table(&self, database: &str, table: &str) -> Result<CatalogTable> {
        catalog::describe_table(&self.pool, database, table).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
