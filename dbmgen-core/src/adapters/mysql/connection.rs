//! MySQL connection management.
//!
//! Each identity gets a single-connection pool opened eagerly, so an
//! unreachable host or rejected credential fails the run immediately.

use super::MySqlCatalog;
use crate::Result;
use crate::adapters::{CatalogSource, Connector};
use crate::error::DbmError;
use crate::security::CredentialIdentity;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::sync::Arc;
use std::time::Duration;

/// Opens MySQL catalog connections
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    connect_timeout: Duration,
}

impl Default for MySqlConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Builds driver options for an identity
    pub fn connect_options(identity: &CredentialIdentity) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(identity.host())
            .port(identity.port())
            .username(identity.user())
            .database(identity.database());
        if identity.password().is_empty() {
            options
        } else {
            options.password(identity.password())
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, identity: &CredentialIdentity) -> Result<Arc<dyn CatalogSource>> {
        use sqlx::Executor;

        let label = identity.target_label();
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(self.connect_timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                    Ok(())
                })
            })
            .connect_with(Self::connect_options(identity))
            .await
            .map_err(|e| DbmError::connection_failed(format!("cannot connect to {}", label), e))?;

        tracing::debug!("Connected to {}", label);
        Ok(Arc::new(MySqlCatalog::new(pool, label)))
    }
}
