//! Connection target and credential resolution from flags and environment.
//!
//! Every setting is taken from the first source that provides it:
//! 1. the command line (`--host`, `--username`, ... or `--url`)
//! 2. the per-database variable, e.g. `DBMGEN_HOST_SHOP`
//! 3. the generic variable, e.g. `DBMGEN_HOST`
//!
//! Users and passwords read from the environment pass through the vault.
//! Values that do not decode are used verbatim, so plain-text variables keep
//! working.

use super::connection::{ConnectionConfig, DEFAULT_PORT};
use crate::error::DbmError;
use crate::security::{
    CredentialIdentity, Credentials, decode_secret, encode_secret, parse_connection_string,
};
use std::fmt;

/// Prefix shared by all environment variables
pub const ENV_PREFIX: &str = "DBMGEN";

/// Printed when host, user or password cannot be resolved
pub const MISSING_CREDENTIALS_GUIDANCE: &str = "Missing connection settings. On first use pass \
`--host <host> --port <port> --username <user> --password <password> --save` \
and store the printed variables in your environment";

/// Connection settings given on the command line
#[derive(Clone, Default)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ConnectionOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOverrides")
            .field("url", &self.url.as_deref().map(crate::error::redact_database_url))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Fully resolved connection target
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub config: ConnectionConfig,
    pub credentials: Credentials,
}

impl ResolvedConnection {
    /// Pooling identity of this connection
    pub fn identity(&self) -> CredentialIdentity {
        CredentialIdentity::new(
            &self.credentials,
            self.config.host.clone(),
            self.config.effective_port(),
            self.config.database_name(),
        )
    }
}

/// Environment variable suffix for a database, e.g. `_SHOP`.
///
/// This string is also the vault key of the per-database user.
pub fn database_suffix(database: &str) -> String {
    format!("_{}", database.to_uppercase())
}

/// Vault key of a password: `user@host` or `user@host/_DB`
pub fn password_key(user: &str, host: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{}@{}/{}", user, host, suffix),
        None => format!("{}@{}", user, host),
    }
}

fn var_name(setting: &str, suffix: &str) -> String {
    format!("{}_{}{}", ENV_PREFIX, setting, suffix)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn decoded_env_var(name: &str, key: &str) -> Option<String> {
    env_var(name).map(|stored| {
        let value = decode_secret(&stored, key);
        tracing::trace!("{} decoded: {}", name, value.is_decoded());
        value.into_inner()
    })
}

/// Resolves the database name from the command line or environment.
pub fn resolve_database(overrides: &ConnectionOverrides) -> Option<String> {
    overrides
        .database
        .clone()
        .filter(|db| !db.is_empty())
        .or_else(|| env_var(&format!("{}_DB", ENV_PREFIX)))
        .or_else(|| env_var(&format!("{}_DATABASE", ENV_PREFIX)))
}

/// Resolves the connection target and credentials.
///
/// # Errors
/// Returns an input error if the database, host, user or password cannot be
/// resolved, and a configuration error for a malformed `--url`.
pub fn resolve(overrides: &ConnectionOverrides) -> crate::Result<ResolvedConnection> {
    let (url_config, url_credentials) = match overrides.url.as_deref() {
        Some(url) => {
            let (config, credentials) = parse_connection_string(url)?;
            (Some(config), Some(credentials))
        }
        None => (None, None),
    };

    let mut merged = overrides.clone();
    if let Some(config) = &url_config {
        merged.database = merged.database.or_else(|| config.database.clone());
        merged.host = merged.host.or_else(|| Some(config.host.clone()));
        merged.port = merged.port.or(config.port);
    }
    if let Some(credentials) = &url_credentials {
        if !credentials.username().is_empty() {
            merged.username = merged
                .username
                .or_else(|| Some(credentials.username().to_string()));
        }
        merged.password = merged
            .password
            .or_else(|| credentials.password().map(str::to_string));
    }

    let database = resolve_database(&merged).ok_or_else(|| {
        DbmError::input("A database name is required: pass --database <name> or set DBMGEN_DB")
    })?;
    let suffix = database_suffix(&database);

    let host = merged
        .host
        .clone()
        .or_else(|| env_var(&var_name("HOST", &suffix)))
        .or_else(|| env_var(&var_name("HOST", "")));

    let port = merged
        .port
        .or_else(|| env_var(&var_name("PORT", &suffix)).and_then(|p| p.parse().ok()))
        .or_else(|| env_var(&var_name("PORT", "")).and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    let host_key = host.clone().unwrap_or_default();
    let user = merged
        .username
        .clone()
        .or_else(|| decoded_env_var(&var_name("USER", &suffix), &suffix))
        .or_else(|| decoded_env_var(&var_name("USER", ""), &host_key));

    let user_key = user.clone().unwrap_or_default();
    let database_password_key = password_key(&user_key, &host_key, Some(&suffix));
    let generic_password_key = password_key(&user_key, &host_key, None);
    let password = merged
        .password
        .clone()
        .or_else(|| decoded_env_var(&var_name("PWD", &suffix), &database_password_key))
        .or_else(|| decoded_env_var(&var_name("PASSWORD", &suffix), &database_password_key))
        .or_else(|| decoded_env_var(&var_name("PWD", ""), &generic_password_key))
        .or_else(|| decoded_env_var(&var_name("PASSWORD", ""), &generic_password_key));

    let (Some(host), Some(user), Some(password)) = (host, user, password) else {
        tracing::debug!("Unresolved connection settings for database '{}'", database);
        return Err(DbmError::input(MISSING_CREDENTIALS_GUIDANCE));
    };

    let mut config = ConnectionConfig::new(host)
        .with_port(port)
        .with_database(database)
        .with_username(user.clone());
    if let Some(url_config) = url_config {
        config.connect_timeout = url_config.connect_timeout;
    }
    config.validate()?;

    tracing::debug!("Resolved catalog connection {}", config);

    Ok(ResolvedConnection {
        config,
        credentials: Credentials::new(user, Some(password)),
    })
}

/// Shell flavour of the `--save` guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// `export NAME=value`
    Posix,
    /// `SETX NAME value`
    Windows,
}

impl ShellKind {
    /// Shell of the running platform
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    fn assignment(self, name: &str, value: &str) -> String {
        match self {
            Self::Posix => format!("export {}={}", name, value),
            Self::Windows => format!("SETX {} {}", name, value),
        }
    }
}

/// Builds the `--save` guidance: variable assignments that reproduce the
/// resolved connection, with user and password vault-encoded.
///
/// Both the per-database and the generic variable sets are printed; nothing
/// is written to the environment.
///
/// # Errors
/// Returns a vault error if a value cannot be encoded.
pub fn save_guidance(resolved: &ResolvedConnection, shell: ShellKind) -> crate::Result<String> {
    let config = &resolved.config;
    let host = config.host.as_str();
    let port = config.effective_port().to_string();
    let user = resolved.credentials.username();
    let password = resolved.credentials.password().unwrap_or_default();
    let suffix = database_suffix(config.database_name());

    let per_database = [
        (var_name("HOST", &suffix), host.to_string()),
        (var_name("PORT", &suffix), port.clone()),
        (var_name("USER", &suffix), encode_secret(user, &suffix)?),
        (
            var_name("PWD", &suffix),
            encode_secret(password, &password_key(user, host, Some(&suffix)))?,
        ),
    ];
    let generic = [
        (var_name("HOST", ""), host.to_string()),
        (var_name("PORT", ""), port),
        (var_name("USER", ""), encode_secret(user, host)?),
        (
            var_name("PWD", ""),
            encode_secret(password, &password_key(user, host, None))?,
        ),
    ];

    let render = |entries: &[(String, String)]| {
        entries
            .iter()
            .map(|(name, value)| shell.assignment(name, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(format!(
        "Save the following variables to your user environment:\n\n{}\n\nor use the generic settings:\n\n{}\n",
        render(&per_database),
        render(&generic)
    ))
}
