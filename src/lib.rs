#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Crucible - database provisioning for differential SQL testing
//!
//! Crucible resolves database-connection configuration from layered
//! sources and brings a target database to a known, clean, ready-to-test
//! state across many heterogeneous backends, each with different
//! capabilities for dropping and creating schemas.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaves first:
//!
//! - **[`config`]**: layered configuration
//!   - `store`: loads the engine property file once, merges lookups with
//!     environment variables (`SQLANCER_<ENGINE>_<PROPERTY>`)
//!   - `resolver`: per-setting precedence (override > environment > file)
//!     and connection-string template substitution
//!
//! - **[`engine`]**: the closed set of supported backends and the
//!   per-engine profile table describing how each one's connection string
//!   is built and how its schema is reset
//!
//! - **[`session`]**: the `SqlSession`/`Connector` seams the provisioner
//!   uses to talk to drivers, plus the built-in rusqlite connector
//!
//! - **[`sink`]**: the write-only statement audit sink
//!
//! - **[`provision`]**: the provisioner orchestrating resolve → connect →
//!   reset → freshness
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crucible::{
//!     ConfigStore, ConnectorRegistry, Engine, Overrides, Provisioner, TracingSink,
//! };
//!
//! let store = Arc::new(ConfigStore::new());
//! let provisioner = Provisioner::new(
//!     store,
//!     ConnectorRegistry::with_defaults(),
//!     Arc::new(TracingSink),
//! );
//!
//! let mut db = provisioner.provision(Engine::Sqlite, "db0", &Overrides::default())?;
//! if db.fresh {
//!     // schema was freshly created; derive metadata from scratch
//! }
//! db.session.execute("CREATE TABLE db0_t0 (id INTEGER)")?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod provision;
pub mod session;
pub mod sink;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{ConfigResolver, ConfigStore, Overrides, DEFAULT_CONFIG_PATH, ENV_PREFIX};

// =============================================================================
// Engines and profiles
// =============================================================================

pub use engine::{
    ConnectionStrategy, Engine, EngineProfile, ResetStrategy, SyncStrategy, DEFAULT_DELIMITER,
    MAX_INDEXED_OBJECTS,
};

// =============================================================================
// Sessions and connectors
// =============================================================================

pub use session::{Connector, ConnectorRegistry, SqlSession, SqliteConnector, SqliteSession};

// =============================================================================
// Provisioning
// =============================================================================

pub use provision::{ProvisionedDatabase, Provisioner};

// =============================================================================
// Auditing and errors
// =============================================================================

pub use error::{ConfigError, ProvisionError, SessionError};
pub use sink::{MemorySink, NullSink, StatementSink, TracingSink};
