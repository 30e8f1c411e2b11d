//! Error types for configuration resolution and database provisioning
//!
//! Configuration and connection failures are fatal and abort provisioning
//! immediately; statement failures inside the bounded cleanup loop are
//! swallowed by design and never reach these types.

use thiserror::Error;

use crate::engine::Engine;

/// Fatal configuration errors
///
/// All variants indicate a deployment problem (missing file, missing or
/// malformed settings) rather than a runtime-retryable condition.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The engine configuration file does not exist at the expected path
    #[error("configuration file not found at '{path}'; create it with per-engine connection settings")]
    FileNotFound { path: String },

    /// The engine configuration file exists but could not be read or parsed
    #[error("failed to load configuration file '{path}': {message}")]
    FileUnreadable { path: String, message: String },

    /// No connection URL template is configured for the engine
    #[error("no connection URL template configured for engine {engine}; add a 'url' key under [{engine}]")]
    MissingUrlTemplate { engine: Engine },

    /// No port is configured for the engine and none was supplied
    #[error("no port configured for engine {engine}")]
    MissingPort { engine: Engine },

    /// The configured port value is not a valid port number
    #[error("invalid port value for engine {engine}: '{value}'")]
    InvalidPort { engine: Engine, value: String },
}

/// Fatal provisioning errors
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Configuration resolution failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No connector is registered for the engine
    #[error("no connector registered for engine {engine}")]
    NoConnector { engine: Engine },

    /// The underlying connection could not be established
    #[error("failed to connect to {engine} at '{url}': {source}")]
    Connection {
        engine: Engine,
        url: String,
        source: SessionError,
    },

    /// A post-connect session-configuration statement failed
    ///
    /// Unlike cleanup-loop misses, these statements change engine semantics
    /// for everything that follows, so their failure aborts provisioning.
    #[error("session statement '{statement}' failed for engine {engine}: {source}")]
    Session {
        engine: Engine,
        statement: String,
        source: SessionError,
    },
}

/// Opaque error from an underlying database driver
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SessionError {
    message: String,
}

impl SessionError {
    pub fn new(message: impl Into<String>) -> Self {
        SessionError {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(e: rusqlite::Error) -> Self {
        SessionError::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_engine() {
        let err = ConfigError::MissingUrlTemplate {
            engine: Engine::PostgreSql,
        };
        assert!(err.to_string().contains("POSTGRESQL"));

        let err = ConfigError::InvalidPort {
            engine: Engine::MySql,
            value: "not-a-port".to_string(),
        };
        assert!(err.to_string().contains("MYSQL"));
        assert!(err.to_string().contains("not-a-port"));
    }

    #[test]
    fn test_provision_error_wraps_config_error() {
        let err: ProvisionError = ConfigError::MissingPort {
            engine: Engine::ClickHouse,
        }
        .into();
        assert!(matches!(
            err,
            ProvisionError::Config(ConfigError::MissingPort { .. })
        ));
    }
}
