//! Catalog connection configuration.
//!
//! This module provides the `ConnectionConfig` struct describing where the
//! catalog lives. It never carries passwords.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default MySQL server port
pub const DEFAULT_PORT: u16 = 3306;

/// Configuration for the catalog connection.
///
/// # Security
/// This struct intentionally does NOT store passwords or credentials.
/// Credentials are resolved separately and never logged or serialized.
///
/// # Example
/// ```rust
/// use dbmgen_core::adapters::ConnectionConfig;
///
/// let config = ConnectionConfig::new("localhost".to_string())
///     .with_port(3306)
///     .with_database("shop".to_string())
///     .with_username("admin".to_string());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "localhost:3306/shop");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Optional port number; [`DEFAULT_PORT`] when absent
    pub port: Option<u16>,
    /// Schema holding the table to inspect
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}{}",
            self.host,
            self.effective_port(),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns an input error when the host or database is missing and a
    /// configuration error for out-of-range values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.trim().is_empty() {
            return Err(crate::error::DbmError::input("host cannot be empty"));
        }

        if self.database.as_deref().is_none_or(|db| db.trim().is_empty()) {
            return Err(crate::error::DbmError::input(
                "database is required (use --database or DBMGEN_DB)",
            ));
        }

        if self.port == Some(0) {
            return Err(crate::error::DbmError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.connect_timeout.as_secs() == 0 {
            return Err(crate::error::DbmError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Creates a new connection config with safe defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Port to connect to
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Database name, empty when unset
    pub fn database_name(&self) -> &str {
        self.database.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, None);
        assert_eq!(config.effective_port(), DEFAULT_PORT);
    }

    #[test]
    fn test_connection_config_validation() {
        let config = ConnectionConfig::new("localhost".to_string()).with_database("shop".into());
        assert!(config.validate().is_ok());

        // Missing database is an input error
        let config = ConnectionConfig::new("localhost".to_string());
        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let config = ConnectionConfig {
            host: String::new(),
            database: Some("shop".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ConnectionConfig {
            port: Some(0),
            database: Some("shop".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::new("example.com".to_string())
            .with_port(3307)
            .with_database("testdb".to_string())
            .with_username("admin".to_string());

        assert_eq!(config.host, "example.com");
        assert_eq!(config.effective_port(), 3307);
        assert_eq!(config.database_name(), "testdb");
        assert_eq!(config.username, Some("admin".to_string()));
    }

    #[test]
    fn test_connection_config_display_no_credentials() {
        let config = ConnectionConfig::new("example.com".to_string())
            .with_database("testdb".to_string())
            .with_username("testuser".to_string());

        let display = format!("{}", config);
        assert_eq!(display, "example.com:3306/testdb");
        assert!(!display.contains("testuser"));
    }
}
