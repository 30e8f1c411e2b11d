//! Engine profile records and their strategy types
//!
//! A profile captures everything that varies between backends: how the
//! connection string is built, how the schema is reset to empty, which
//! session statements run right after connecting, and how data is flushed
//! after a test run. Profiles are plain data; the provisioner interprets
//! them.

use crate::config::{ConfigResolver, Overrides};
use crate::engine::Engine;
use crate::error::ConfigError;

/// Upper bound on the per-object cleanup loop
///
/// The iterative reset drops tables `<db><delim>t0..t99` and views
/// `<db><delim>v0..v99`; objects outside this naming window are never
/// touched.
pub const MAX_INDEXED_OBJECTS: usize = 100;

/// Default delimiter between the database name and the object suffix
pub const DEFAULT_DELIMITER: &str = "_";

/// How an engine's connection string is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStrategy {
    /// Substitute `{host}`, `{port}`, `{user}`, `{password}` and
    /// `{database}` into the configured URL template
    Templated,

    /// Use the configured `url` property with `{dbname}` replaced by the
    /// target database name (file-based and in-process backends)
    DatabaseFile,

    /// Honor a process-level environment variable for the on-disk file
    /// location; fall back to the raw `url` property when unset
    PathOverride { env_var: &'static str },
}

/// How an engine's schema is brought to a clean state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStrategy {
    /// `DROP DATABASE IF EXISTS` / `CREATE DATABASE` / `USE`; falls back to
    /// the bounded per-object cleanup when any of the three statements fail
    DropCreate,

    /// Skip database-level DDL entirely and always run the bounded
    /// per-object cleanup
    IterativeOnly { cascade: bool },

    /// Best-effort `CREATE DATABASE IF NOT EXISTS` + `USE` (errors
    /// swallowed), then the bounded per-object cleanup
    CreateThenIterative { cascade: bool },

    /// Catalog-scoped isolation: per-object cleanup over
    /// `<catalog>.<db>.t<i>` names, then drop and recreate the schema
    /// inside the catalog
    CatalogScoped { catalog: &'static str },

    /// Issue a whole-database wipe statement, then discard and reopen the
    /// connection because the handle becomes invalid
    WipeAndReconnect { statement: &'static str },

    /// No reset statements; every database name addresses a fresh store
    FreshFile,
}

/// How an engine makes mutations visible after a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// No synchronization required
    None,

    /// A single flush statement
    Statement(&'static str),

    /// `REFRESH TABLE <t>` for every table the caller names
    RefreshTables,
}

/// Per-engine provisioning profile
#[derive(Debug)]
pub struct EngineProfile {
    pub engine: Engine,
    pub connection: ConnectionStrategy,
    pub reset: ResetStrategy,
    /// Issued immediately after connecting, before any cleanup
    pub session_statements: &'static [&'static str],
    pub sync: SyncStrategy,
}

impl EngineProfile {
    /// Derive the connection string for a target database
    ///
    /// Exactly one connection string is derived per provisioning call;
    /// identical settings always render the same string.
    pub fn connection_string(
        &self,
        resolver: &ConfigResolver,
        overrides: &Overrides,
        database: &str,
    ) -> Result<String, ConfigError> {
        match self.connection {
            ConnectionStrategy::Templated => resolver.connection_string(self.engine, overrides),
            ConnectionStrategy::DatabaseFile => {
                let template = resolver.url_template(self.engine)?;
                Ok(template.replace("{dbname}", database))
            }
            ConnectionStrategy::PathOverride { env_var } => {
                if let Ok(path) = std::env::var(env_var) {
                    if !path.is_empty() {
                        return Ok(format!("{}:{}", self.engine.name().to_lowercase(), path));
                    }
                }
                resolver.url_template(self.engine)
            }
        }
    }

    /// Whether the iterative cleanup for this engine requires `CASCADE`
    pub fn cascade_drops(&self) -> bool {
        matches!(
            self.reset,
            ResetStrategy::IterativeOnly { cascade: true }
                | ResetStrategy::CreateThenIterative { cascade: true }
        )
    }

    /// Render the statement that drops a single table on this engine
    pub fn drop_table_statement(&self, table: &str) -> String {
        if self.cascade_drops() {
            format!("DROP TABLE {} CASCADE", table)
        } else {
            format!("DROP TABLE {}", table)
        }
    }

    /// Render the statement that drops a single view on this engine
    pub fn drop_view_statement(&self, view: &str) -> String {
        if self.cascade_drops() {
            format!("DROP VIEW {} CASCADE", view)
        } else {
            format!("DROP VIEW {}", view)
        }
    }
}

impl std::fmt::Display for ConnectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStrategy::Templated => write!(f, "templated URL"),
            ConnectionStrategy::DatabaseFile => write!(f, "database file"),
            ConnectionStrategy::PathOverride { env_var } => {
                write!(f, "file path ({} override)", env_var)
            }
        }
    }
}

impl std::fmt::Display for ResetStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetStrategy::DropCreate => write!(f, "drop/create database"),
            ResetStrategy::IterativeOnly { cascade: true } => {
                write!(f, "iterative cleanup (cascade)")
            }
            ResetStrategy::IterativeOnly { cascade: false } => write!(f, "iterative cleanup"),
            ResetStrategy::CreateThenIterative { .. } => {
                write!(f, "create if absent + iterative cleanup")
            }
            ResetStrategy::CatalogScoped { catalog } => {
                write!(f, "catalog-scoped ({})", catalog)
            }
            ResetStrategy::WipeAndReconnect { .. } => write!(f, "wipe + reconnect"),
            ResetStrategy::FreshFile => write!(f, "fresh file"),
        }
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStrategy::None => write!(f, "none"),
            SyncStrategy::Statement(stmt) => write!(f, "{}", stmt),
            SyncStrategy::RefreshTables => write!(f, "refresh tables"),
        }
    }
}
