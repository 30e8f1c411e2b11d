//! Database sessions and connectors
//!
//! The provisioner talks to every backend through the same two seams: a
//! [`SqlSession`] executes one statement at a time over an open
//! connection, and a [`Connector`] turns a rendered connection string into
//! a session. The [`ConnectorRegistry`] maps engines to connectors; the
//! SQLITE connector ships built in, network engines are registered by the
//! harness that owns their drivers.

pub mod sqlite;

pub use sqlite::{SqliteConnector, SqliteSession};

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::SessionError;

/// An open, exclusively owned database session
///
/// Calls are synchronous and blocking; each `execute` issues exactly one
/// statement and returns once the driver does.
pub trait SqlSession: Send {
    fn execute(&mut self, sql: &str) -> Result<(), SessionError>;
}

/// Opens sessions from rendered connection strings
pub trait Connector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Box<dyn SqlSession>, SessionError>;
}

/// Engine-to-connector map
pub struct ConnectorRegistry {
    connectors: HashMap<Engine, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ConnectorRegistry {
            connectors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in connectors registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Engine::Sqlite, Arc::new(SqliteConnector));
        registry
    }

    /// Register a connector for an engine, replacing any existing one
    pub fn register(&mut self, engine: Engine, connector: Arc<dyn Connector>) {
        self.connectors.insert(engine, connector);
    }

    /// Look up the connector for an engine
    pub fn get(&self, engine: Engine) -> Option<&Arc<dyn Connector>> {
        self.connectors.get(&engine)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
