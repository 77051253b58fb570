//! Server configuration from command-line flags and environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("jwt secret key must not be blank")]
    BlankJwtSecret,
    #[error("database url must not be blank")]
    BlankDatabaseUrl,
    #[error("unsupported database url `{0}`; expected a SQLite path or sqlite:// url")]
    UnsupportedDatabaseUrl(String),
}

/// Richard account API server
#[derive(Debug, Clone, Parser)]
#[command(name = "richard-api", version, about, long_about = None)]
pub struct ServerConfig {
    /// SQLite database path, `sqlite://` url or `:memory:`
    #[arg(long, env = "RICHARD_DATABASE_URL", default_value = "richard.db")]
    pub database_url: String,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, env = "RICHARD_JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret_key: String,

    /// Address to listen on
    #[arg(long, env = "RICHARD_BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "RICHARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr only when unset
    #[arg(long, env = "RICHARD_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServerConfig {
    /// Checks values clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret_key.trim().is_empty() {
            return Err(ConfigError::BlankJwtSecret);
        }
        self.database_target().map(|_| ())
    }

    /// Resolves `database_url` into a concrete target.
    ///
    /// `sqlite:///relative.db` and `sqlite:////abs/path.db` follow the usual
    /// url convention of one separator slash after the scheme.
    pub fn database_target(&self) -> Result<DatabaseTarget, ConfigError> {
        let raw = self.database_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::BlankDatabaseUrl);
        }

        let path = match raw.strip_prefix("sqlite://") {
            Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
            None if raw.contains("://") => {
                return Err(ConfigError::UnsupportedDatabaseUrl(raw.to_string()))
            }
            None => raw,
        };

        match path {
            "" | ":memory:" => Ok(DatabaseTarget::Memory),
            path => Ok(DatabaseTarget::File(PathBuf::from(path))),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| richard_core::default_log_level())
    }
}
