//! The per-engine profile table
//!
//! One record per backend. Engines not listed with an override follow the
//! default protocol: templated connection string, drop/create reset with
//! iterative fallback, no session statements, no synchronization.

use crate::engine::profile::{ConnectionStrategy, EngineProfile, ResetStrategy, SyncStrategy};
use crate::engine::Engine;

macro_rules! default_profile {
    ($name:ident, $engine:expr) => {
        static $name: EngineProfile = EngineProfile {
            engine: $engine,
            connection: ConnectionStrategy::Templated,
            reset: ResetStrategy::DropCreate,
            session_statements: &[],
            sync: SyncStrategy::None,
        };
    };
}

// Engines on the default protocol.
default_profile!(FIREBIRD, Engine::Firebird);
default_profile!(MYSQL, Engine::MySql);
default_profile!(DOLT, Engine::Dolt);
default_profile!(MATERIALIZE, Engine::Materialize);
default_profile!(TIDB, Engine::TiDb);
default_profile!(MARIADB, Engine::MariaDb);
default_profile!(IMMUDB, Engine::ImmuDb);
default_profile!(QUESTDB, Engine::QuestDb);
default_profile!(PERCONA, Engine::Percona);
default_profile!(VIRTUOSO, Engine::Virtuoso);
default_profile!(ORACLE, Engine::Oracle);
default_profile!(OCEANBASE, Engine::OceanBase);

// CrateDB commits asynchronously; tables must be refreshed before reads
// observe prior writes.
static CRATE: EngineProfile = EngineProfile {
    engine: Engine::Crate,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::DropCreate,
    session_statements: &[],
    sync: SyncStrategy::RefreshTables,
};

static RISINGWAVE: EngineProfile = EngineProfile {
    engine: Engine::RisingWave,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: false },
    session_statements: &["SET query_mode TO local"],
    sync: SyncStrategy::Statement("FLUSH"),
};

static DUCKDB: EngineProfile = EngineProfile {
    engine: Engine::DuckDb,
    connection: ConnectionStrategy::PathOverride {
        env_var: "DUCKDB_DATABASE_FILE",
    },
    reset: ResetStrategy::FreshFile,
    session_statements: &[],
    sync: SyncStrategy::None,
};

// A session cannot drop the database it is connected to.
static POSTGRESQL: EngineProfile = EngineProfile {
    engine: Engine::PostgreSql,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: false },
    session_statements: &["SET statement_timeout TO 5000"],
    sync: SyncStrategy::None,
};

static COCKROACHDB: EngineProfile = EngineProfile {
    engine: Engine::CockroachDb,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::DropCreate,
    session_statements: &[
        "SET CLUSTER SETTING debug.panic_on_failed_assertions = true",
        "SET CLUSTER SETTING diagnostics.reporting.enabled = false",
        "SET CLUSTER SETTING diagnostics.reporting.send_crash_reports = false",
    ],
    sync: SyncStrategy::None,
};

static SQLITE: EngineProfile = EngineProfile {
    engine: Engine::Sqlite,
    connection: ConnectionStrategy::DatabaseFile,
    reset: ResetStrategy::FreshFile,
    session_statements: &[],
    sync: SyncStrategy::None,
};

static UMBRA: EngineProfile = EngineProfile {
    engine: Engine::Umbra,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: false },
    session_statements: &["SET debug.storage = 'P'"],
    sync: SyncStrategy::None,
};

static MONETDB: EngineProfile = EngineProfile {
    engine: Engine::MonetDb,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: true },
    session_statements: &[],
    sync: SyncStrategy::None,
};

// The wipe statement invalidates the connection handle.
static H2: EngineProfile = EngineProfile {
    engine: Engine::H2,
    connection: ConnectionStrategy::DatabaseFile,
    reset: ResetStrategy::WipeAndReconnect {
        statement: "DROP ALL OBJECTS DELETE FILES",
    },
    session_statements: &[],
    sync: SyncStrategy::None,
};

static CLICKHOUSE: EngineProfile = EngineProfile {
    engine: Engine::ClickHouse,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: false },
    session_statements: &[],
    sync: SyncStrategy::None,
};

// CREATE DATABASE is slow on Vitess, so it only runs when the database is
// absent and the cleanup loop does the actual reset.
static VITESS: EngineProfile = EngineProfile {
    engine: Engine::Vitess,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::CreateThenIterative { cascade: true },
    session_statements: &[],
    sync: SyncStrategy::None,
};

// Presto's memory connector only supports schema-scoped isolation inside
// the MEMORY catalog.
static PRESTO: EngineProfile = EngineProfile {
    engine: Engine::Presto,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::CatalogScoped { catalog: "MEMORY" },
    session_statements: &[],
    sync: SyncStrategy::None,
};

static CEDARDB: EngineProfile = EngineProfile {
    engine: Engine::CedarDb,
    connection: ConnectionStrategy::Templated,
    reset: ResetStrategy::IterativeOnly { cascade: true },
    session_statements: &["SET implicit_cross_products = ON"],
    sync: SyncStrategy::None,
};

/// Look up the profile for an engine
pub fn profile(engine: Engine) -> &'static EngineProfile {
    match engine {
        Engine::Crate => &CRATE,
        Engine::Firebird => &FIREBIRD,
        Engine::MySql => &MYSQL,
        Engine::Dolt => &DOLT,
        Engine::RisingWave => &RISINGWAVE,
        Engine::DuckDb => &DUCKDB,
        Engine::PostgreSql => &POSTGRESQL,
        Engine::Materialize => &MATERIALIZE,
        Engine::CockroachDb => &COCKROACHDB,
        Engine::TiDb => &TIDB,
        Engine::Sqlite => &SQLITE,
        Engine::Umbra => &UMBRA,
        Engine::MariaDb => &MARIADB,
        Engine::ImmuDb => &IMMUDB,
        Engine::QuestDb => &QUESTDB,
        Engine::Percona => &PERCONA,
        Engine::Virtuoso => &VIRTUOSO,
        Engine::MonetDb => &MONETDB,
        Engine::H2 => &H2,
        Engine::ClickHouse => &CLICKHOUSE,
        Engine::Vitess => &VITESS,
        Engine::Presto => &PRESTO,
        Engine::Oracle => &ORACLE,
        Engine::CedarDb => &CEDARDB,
        Engine::OceanBase => &OCEANBASE,
    }
}
