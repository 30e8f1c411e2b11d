//! Supported database engines and their provisioning profiles
//!
//! This module enumerates the closed set of backends the provisioner knows
//! how to bring to a clean state, and maps each one to an [`EngineProfile`]
//! describing how its connection string is built and how its schema is
//! reset. The per-engine variation lives in a table of strategy records
//! rather than a trait hierarchy: every deviation from the default protocol
//! is declared as data in [`catalog`].

pub mod catalog;
pub mod profile;

pub use profile::{
    ConnectionStrategy, EngineProfile, ResetStrategy, SyncStrategy, DEFAULT_DELIMITER,
    MAX_INDEXED_OBJECTS,
};

use serde::Serialize;

/// A supported database backend
///
/// The canonical name (e.g. `POSTGRESQL`) namespaces every property and
/// environment lookup for the engine: environment variables are read as
/// `SQLANCER_<ENGINE>_<PROPERTY>` and file keys as `<ENGINE>.<property>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engine {
    Crate,
    Firebird,
    MySql,
    Dolt,
    RisingWave,
    DuckDb,
    PostgreSql,
    Materialize,
    CockroachDb,
    TiDb,
    Sqlite,
    Umbra,
    MariaDb,
    ImmuDb,
    QuestDb,
    Percona,
    Virtuoso,
    MonetDb,
    H2,
    ClickHouse,
    Vitess,
    Presto,
    Oracle,
    CedarDb,
    OceanBase,
}

impl Engine {
    /// All supported engines
    pub fn all() -> &'static [Engine] {
        &[
            Engine::Crate,
            Engine::Firebird,
            Engine::MySql,
            Engine::Dolt,
            Engine::RisingWave,
            Engine::DuckDb,
            Engine::PostgreSql,
            Engine::Materialize,
            Engine::CockroachDb,
            Engine::TiDb,
            Engine::Sqlite,
            Engine::Umbra,
            Engine::MariaDb,
            Engine::ImmuDb,
            Engine::QuestDb,
            Engine::Percona,
            Engine::Virtuoso,
            Engine::MonetDb,
            Engine::H2,
            Engine::ClickHouse,
            Engine::Vitess,
            Engine::Presto,
            Engine::Oracle,
            Engine::CedarDb,
            Engine::OceanBase,
        ]
    }

    /// Canonical uppercase name used for property and environment lookups
    pub fn name(&self) -> &'static str {
        match self {
            Engine::Crate => "CRATE",
            Engine::Firebird => "FIREBIRD",
            Engine::MySql => "MYSQL",
            Engine::Dolt => "DOLT",
            Engine::RisingWave => "RISINGWAVE",
            Engine::DuckDb => "DUCKDB",
            Engine::PostgreSql => "POSTGRESQL",
            Engine::Materialize => "MATERIALIZE",
            Engine::CockroachDb => "COCKROACHDB",
            Engine::TiDb => "TIDB",
            Engine::Sqlite => "SQLITE",
            Engine::Umbra => "UMBRA",
            Engine::MariaDb => "MARIADB",
            Engine::ImmuDb => "IMMUDB",
            Engine::QuestDb => "QUESTDB",
            Engine::Percona => "PERCONA",
            Engine::Virtuoso => "VIRTUOSO",
            Engine::MonetDb => "MONETDB",
            Engine::H2 => "H2",
            Engine::ClickHouse => "CLICKHOUSE",
            Engine::Vitess => "VITESS",
            Engine::Presto => "PRESTO",
            Engine::Oracle => "ORACLE",
            Engine::CedarDb => "CEDARDB",
            Engine::OceanBase => "OCEANBASE",
        }
    }

    /// Look up an engine by name, case-insensitively
    pub fn from_name(s: &str) -> Option<Engine> {
        let upper = s.to_uppercase();
        Engine::all()
            .iter()
            .find(|engine| engine.name() == upper)
            .copied()
    }

    /// The provisioning profile for this engine
    pub fn profile(&self) -> &'static EngineProfile {
        catalog::profile(*self)
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
