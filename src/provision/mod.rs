//! Database provisioning
//!
//! Single entry point that, given an engine and a target database name,
//! returns an open, ready session plus a schema-freshness flag. The
//! provisioner resolves the connection string, opens the connection, runs
//! the engine's reset-or-create protocol and reports every issued
//! statement to the audit sink.
//!
//! Failure policy: configuration and connection failures abort
//! provisioning immediately; statement failures inside the bounded
//! per-object cleanup are swallowed, because pre-existing absence of an
//! object is the expected common case.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ConfigResolver, ConfigStore, Overrides};
use crate::engine::{Engine, EngineProfile, ResetStrategy, SyncStrategy, MAX_INDEXED_OBJECTS};
use crate::error::ProvisionError;
use crate::session::{Connector, ConnectorRegistry, SqlSession};
use crate::sink::StatementSink;

/// Outcome of a provisioning call
pub struct ProvisionedDatabase {
    /// Open session, exclusively owned by the requesting worker
    pub session: Box<dyn SqlSession>,
    /// The connection string the session was opened with
    pub url: String,
    /// `true` if the schema was freshly created, `false` if an existing
    /// schema was found and cleaned in place
    pub fresh: bool,
}

impl std::fmt::Debug for ProvisionedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedDatabase")
            .field("url", &self.url)
            .field("fresh", &self.fresh)
            .finish_non_exhaustive()
    }
}

/// Brings target databases to a known, clean, ready-to-test state
pub struct Provisioner {
    resolver: ConfigResolver,
    registry: ConnectorRegistry,
    sink: Arc<dyn StatementSink>,
    delimiter: String,
}

impl Provisioner {
    pub fn new(
        store: Arc<ConfigStore>,
        registry: ConnectorRegistry,
        sink: Arc<dyn StatementSink>,
    ) -> Self {
        Provisioner {
            resolver: ConfigResolver::new(store),
            registry,
            sink,
            delimiter: crate::engine::DEFAULT_DELIMITER.to_string(),
        }
    }

    /// Use a different delimiter between database name and object suffix
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// The resolver backing this provisioner
    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Provision a database: resolve URL, connect, reset, report freshness
    pub fn provision(
        &self,
        engine: Engine,
        database: &str,
        overrides: &Overrides,
    ) -> Result<ProvisionedDatabase, ProvisionError> {
        let profile = engine.profile();
        let url = profile.connection_string(&self.resolver, overrides, database)?;
        debug!("connecting to {} at '{}'", engine, url);

        let connector = self
            .registry
            .get(engine)
            .ok_or(ProvisionError::NoConnector { engine })?;
        let mut session = connector
            .connect(&url)
            .map_err(|source| ProvisionError::Connection {
                engine,
                url: url.clone(),
                source,
            })?;

        // Session-configuration statements run before any cleanup; they
        // change engine semantics for everything that follows, so their
        // failure is fatal.
        for statement in profile.session_statements {
            self.sink.record(statement);
            session
                .execute(statement)
                .map_err(|source| ProvisionError::Session {
                    engine,
                    statement: statement.to_string(),
                    source,
                })?;
        }

        let fresh = self.reset(profile, &mut session, connector.as_ref(), &url, database)?;
        Ok(ProvisionedDatabase {
            session,
            url,
            fresh,
        })
    }

    /// Run the engine's post-test synchronization hook
    ///
    /// Invoked after a test session completes, separate from the
    /// reset-on-setup path. Statement failures are swallowed.
    pub fn sync_after_run(&self, engine: Engine, session: &mut dyn SqlSession, tables: &[String]) {
        match engine.profile().sync {
            SyncStrategy::None => {}
            SyncStrategy::Statement(statement) => {
                self.sink.record(statement);
                if let Err(e) = session.execute(statement) {
                    debug!("ignoring sync failure for '{}': {}", statement, e);
                }
            }
            SyncStrategy::RefreshTables => {
                for table in tables {
                    let statement = format!("REFRESH TABLE {}", table);
                    self.sink.record(&statement);
                    if let Err(e) = session.execute(&statement) {
                        debug!("ignoring sync failure for '{}': {}", statement, e);
                    }
                }
            }
        }
    }

    fn reset(
        &self,
        profile: &EngineProfile,
        session: &mut Box<dyn SqlSession>,
        connector: &dyn Connector,
        url: &str,
        database: &str,
    ) -> Result<bool, ProvisionError> {
        match profile.reset {
            ResetStrategy::DropCreate => {
                let statements = [
                    format!("DROP DATABASE IF EXISTS {}", database),
                    format!("CREATE DATABASE {}", database),
                    format!("USE {}", database),
                ];
                for statement in &statements {
                    self.sink.record(statement);
                    if let Err(e) = session.execute(statement) {
                        debug!(
                            "database-level reset failed on '{}' ({}), falling back to iterative cleanup",
                            statement, e
                        );
                        self.iterative_cleanup(profile, session.as_mut(), database);
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ResetStrategy::IterativeOnly { .. } => {
                self.iterative_cleanup(profile, session.as_mut(), database);
                Ok(false)
            }
            ResetStrategy::CreateThenIterative { .. } => {
                let statements = [
                    format!("CREATE DATABASE IF NOT EXISTS {}", database),
                    format!("USE {}", database),
                ];
                for statement in &statements {
                    self.sink.record(statement);
                    if let Err(e) = session.execute(statement) {
                        debug!("ignoring setup failure for '{}': {}", statement, e);
                    }
                }
                self.iterative_cleanup(profile, session.as_mut(), database);
                Ok(false)
            }
            ResetStrategy::CatalogScoped { catalog } => {
                let schema = format!("{}.{}", catalog, database);
                let mut dropped = 0usize;
                for i in 0..MAX_INDEXED_OBJECTS {
                    let statements = [
                        format!("DROP TABLE IF EXISTS {}.t{}", schema, i),
                        format!("DROP VIEW IF EXISTS {}.v{}", schema, i),
                    ];
                    for statement in &statements {
                        self.sink.record(statement);
                        if session.execute(statement).is_ok() {
                            dropped += 1;
                        }
                    }
                }
                debug!(
                    "catalog cleanup for '{}': {}/{} drop statements succeeded",
                    schema,
                    dropped,
                    MAX_INDEXED_OBJECTS * 2
                );
                let statements = [
                    format!("DROP SCHEMA IF EXISTS {}", schema),
                    format!("CREATE SCHEMA {}", schema),
                    format!("USE {}", schema),
                ];
                for statement in &statements {
                    self.sink.record(statement);
                    if let Err(e) = session.execute(statement) {
                        warn!("failed to recreate schema '{}': {}", schema, e);
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ResetStrategy::WipeAndReconnect { statement } => {
                self.sink.record(statement);
                session
                    .execute(statement)
                    .map_err(|source| ProvisionError::Session {
                        engine: profile.engine,
                        statement: statement.to_string(),
                        source,
                    })?;
                // The wipe invalidates the handle; reopen before returning.
                *session =
                    connector
                        .connect(url)
                        .map_err(|source| ProvisionError::Connection {
                            engine: profile.engine,
                            url: url.to_string(),
                            source,
                        })?;
                Ok(true)
            }
            ResetStrategy::FreshFile => Ok(true),
        }
    }

    /// Bounded best-effort cleanup of indexed tables and views
    ///
    /// Drops `<db><delim>t<i>` and `<db><delim>v<i>` for `i` in `[0,100)`.
    /// Per-statement failures are discarded without retry; absence of an
    /// object is the expected common case. Outcomes are counted for
    /// observability only.
    fn iterative_cleanup(&self, profile: &EngineProfile, session: &mut dyn SqlSession, database: &str) {
        let mut dropped = 0usize;
        for i in 0..MAX_INDEXED_OBJECTS {
            let table = format!("{}{}t{}", database, self.delimiter, i);
            let statement = profile.drop_table_statement(&table);
            self.sink.record(&statement);
            if session.execute(&statement).is_ok() {
                dropped += 1;
            }

            let view = format!("{}{}v{}", database, self.delimiter, i);
            let statement = profile.drop_view_statement(&view);
            self.sink.record(&statement);
            if session.execute(&statement).is_ok() {
                dropped += 1;
            }
        }
        debug!(
            "iterative cleanup for '{}': {}/{} drop statements succeeded",
            database,
            dropped,
            MAX_INDEXED_OBJECTS * 2
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::sink::MemorySink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Session that fails any statement containing one of the configured
    /// fragments and records everything it executes.
    struct ScriptedSession {
        fail_contains: Vec<&'static str>,
        executed: Arc<Mutex<Vec<String>>>,
    }

    impl SqlSession for ScriptedSession {
        fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
            self.executed.lock().unwrap().push(sql.to_string());
            if self.fail_contains.iter().any(|frag| sql.contains(frag)) {
                return Err(SessionError::new(format!("scripted failure: {}", sql)));
            }
            Ok(())
        }
    }

    struct ScriptedConnector {
        fail_contains: Vec<&'static str>,
        fail_connect: bool,
        connects: AtomicUsize,
        executed: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedConnector {
        fn new(fail_contains: Vec<&'static str>) -> Self {
            ScriptedConnector {
                fail_contains,
                fail_connect: false,
                connects: AtomicUsize::new(0),
                executed: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Connector for ScriptedConnector {
        fn connect(&self, _url: &str) -> Result<Box<dyn SqlSession>, SessionError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                return Err(SessionError::new("connection refused"));
            }
            Ok(Box::new(ScriptedSession {
                fail_contains: self.fail_contains.clone(),
                executed: self.executed.clone(),
            }))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        provisioner: Provisioner,
        sink: Arc<MemorySink>,
        connector: Arc<ScriptedConnector>,
    }

    fn harness(engine: Engine, config: &str, connector: ScriptedConnector) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engines.toml");
        std::fs::write(&path, config).unwrap();
        let store = Arc::new(ConfigStore::with_path(&path));
        let sink = Arc::new(MemorySink::new());
        let connector = Arc::new(connector);
        let mut registry = ConnectorRegistry::new();
        registry.register(engine, connector.clone());
        Harness {
            _dir: dir,
            provisioner: Provisioner::new(store, registry, sink.clone()),
            sink,
            connector,
        }
    }

    const DOLT_CONFIG: &str = r#"
        [DOLT]
        url = "mysql://{host}:{port}/{database}"
        host = "localhost"
        port = "3306"
    "#;

    #[test]
    fn test_drop_create_success_is_fresh() {
        let h = harness(Engine::Dolt, DOLT_CONFIG, ScriptedConnector::new(vec![]));
        let outcome = h
            .provisioner
            .provision(Engine::Dolt, "db0", &Overrides::default())
            .unwrap();
        assert!(outcome.fresh);
        assert_eq!(outcome.url, "mysql://localhost:3306/");
        assert_eq!(
            h.sink.statements(),
            vec![
                "DROP DATABASE IF EXISTS db0",
                "CREATE DATABASE db0",
                "USE db0"
            ]
        );
    }

    #[test]
    fn test_drop_create_failure_falls_back_to_cleanup() {
        let h = harness(
            Engine::Dolt,
            DOLT_CONFIG,
            ScriptedConnector::new(vec!["CREATE DATABASE"]),
        );
        let outcome = h
            .provisioner
            .provision(Engine::Dolt, "db0", &Overrides::default())
            .unwrap();
        assert!(!outcome.fresh);

        let statements = h.sink.statements();
        // DROP DATABASE + failed CREATE DATABASE, then 100 table and 100
        // view drops; USE is never reached.
        assert_eq!(statements.len(), 2 + 200);
        assert_eq!(statements[1], "CREATE DATABASE db0");
        assert_eq!(statements[2], "DROP TABLE db0_t0");
        assert_eq!(statements[3], "DROP VIEW db0_v0");
        assert_eq!(statements[201], "DROP VIEW db0_v99");
        assert!(!statements.contains(&"USE db0".to_string()));
    }

    #[test]
    fn test_iterative_engine_swallows_every_drop_failure() {
        let config = r#"
            [POSTGRESQL]
            url = "postgresql://{host}:{port}/{database}"
            host = "localhost"
            port = "5432"
        "#;
        // Every DROP fails; provisioning still succeeds with a clean flag.
        let h = harness(
            Engine::PostgreSql,
            config,
            ScriptedConnector::new(vec!["DROP"]),
        );
        let outcome = h
            .provisioner
            .provision(Engine::PostgreSql, "db1", &Overrides::default())
            .unwrap();
        assert!(!outcome.fresh);

        let statements = h.sink.statements();
        assert_eq!(statements[0], "SET statement_timeout TO 5000");
        assert_eq!(statements.len(), 1 + 200);
        assert_eq!(statements[1], "DROP TABLE db1_t0");
        assert_eq!(statements[199], "DROP TABLE db1_t99");
        assert_eq!(statements[200], "DROP VIEW db1_v99");
    }

    #[test]
    fn test_session_statement_failure_is_fatal() {
        let config = r#"
            [COCKROACHDB]
            url = "postgresql://{host}:{port}/{database}"
            host = "localhost"
            port = "26257"
        "#;
        let h = harness(
            Engine::CockroachDb,
            config,
            ScriptedConnector::new(vec!["SET CLUSTER SETTING"]),
        );
        let err = h
            .provisioner
            .provision(Engine::CockroachDb, "db0", &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Session { .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let config = r#"
            [CLICKHOUSE]
            url = "clickhouse://{host}:{port}"
            host = "localhost"
            port = "9000"
        "#;
        let h = harness(
            Engine::ClickHouse,
            config,
            ScriptedConnector::new(vec!["DROP"]),
        );
        let provisioner = h.provisioner.with_delimiter("__");
        provisioner
            .provision(Engine::ClickHouse, "db2", &Overrides::default())
            .unwrap();
        let statements = h.sink.statements();
        assert_eq!(statements[0], "DROP TABLE db2__t0");
        assert_eq!(statements[1], "DROP VIEW db2__v0");
    }

    #[test]
    fn test_cascade_engine_appends_cascade() {
        let config = r#"
            [MONETDB]
            url = "monetdb://{host}:{port}/{database}"
            host = "localhost"
            port = "50000"
        "#;
        let h = harness(Engine::MonetDb, config, ScriptedConnector::new(vec![]));
        h.provisioner
            .provision(Engine::MonetDb, "db0", &Overrides::default())
            .unwrap();
        let statements = h.sink.statements();
        assert_eq!(statements[0], "DROP TABLE db0_t0 CASCADE");
        assert_eq!(statements[1], "DROP VIEW db0_v0 CASCADE");
    }

    #[test]
    fn test_create_then_iterative_swallows_setup_failure() {
        let config = r#"
            [VITESS]
            url = "mysql://{host}:{port}/{database}"
            host = "localhost"
            port = "15306"
        "#;
        let h = harness(
            Engine::Vitess,
            config,
            ScriptedConnector::new(vec!["CREATE DATABASE"]),
        );
        let outcome = h
            .provisioner
            .provision(Engine::Vitess, "db0", &Overrides::default())
            .unwrap();
        assert!(!outcome.fresh);
        let statements = h.sink.statements();
        assert_eq!(statements[0], "CREATE DATABASE IF NOT EXISTS db0");
        assert_eq!(statements[1], "USE db0");
        assert_eq!(statements[2], "DROP TABLE db0_t0 CASCADE");
        assert_eq!(statements.len(), 2 + 200);
    }

    #[test]
    fn test_catalog_scoped_protocol() {
        let config = r#"
            [PRESTO]
            url = "presto://{host}:{port}"
            host = "localhost"
            port = "8080"
        "#;
        let h = harness(Engine::Presto, config, ScriptedConnector::new(vec![]));
        let outcome = h
            .provisioner
            .provision(Engine::Presto, "db0", &Overrides::default())
            .unwrap();
        assert!(outcome.fresh);

        let statements = h.sink.statements();
        assert_eq!(statements[0], "DROP TABLE IF EXISTS MEMORY.db0.t0");
        assert_eq!(statements[1], "DROP VIEW IF EXISTS MEMORY.db0.v0");
        assert_eq!(statements.len(), 200 + 3);
        assert_eq!(statements[200], "DROP SCHEMA IF EXISTS MEMORY.db0");
        assert_eq!(statements[201], "CREATE SCHEMA MEMORY.db0");
        assert_eq!(statements[202], "USE MEMORY.db0");
    }

    #[test]
    fn test_catalog_scoped_recreate_failure_is_not_fresh() {
        let config = r#"
            [PRESTO]
            url = "presto://{host}:{port}"
            host = "localhost"
            port = "8080"
        "#;
        let h = harness(
            Engine::Presto,
            config,
            ScriptedConnector::new(vec!["CREATE SCHEMA"]),
        );
        let outcome = h
            .provisioner
            .provision(Engine::Presto, "db0", &Overrides::default())
            .unwrap();
        assert!(!outcome.fresh);
    }

    #[test]
    fn test_wipe_and_reconnect_reopens_handle() {
        let config = "[H2]\nurl = \"h2:/tmp/{dbname}\"\n";
        let h = harness(Engine::H2, config, ScriptedConnector::new(vec![]));
        let outcome = h
            .provisioner
            .provision(Engine::H2, "db0", &Overrides::default())
            .unwrap();
        assert!(outcome.fresh);
        assert_eq!(outcome.url, "h2:/tmp/db0");
        assert_eq!(h.connector.connects.load(Ordering::SeqCst), 2);
        assert_eq!(h.sink.statements(), vec!["DROP ALL OBJECTS DELETE FILES"]);
    }

    #[test]
    fn test_wipe_failure_is_fatal() {
        let config = "[H2]\nurl = \"h2:/tmp/{dbname}\"\n";
        let h = harness(
            Engine::H2,
            config,
            ScriptedConnector::new(vec!["DROP ALL OBJECTS"]),
        );
        let err = h
            .provisioner
            .provision(Engine::H2, "db0", &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Session { .. }));
    }

    #[test]
    fn test_missing_connector_is_fatal() {
        let config = r#"
            [MARIADB]
            url = "mysql://{host}:{port}/{database}"
            host = "localhost"
            port = "3306"
        "#;
        // Registry only knows DOLT; MARIADB resolves a URL but has no driver.
        let h = harness(Engine::Dolt, config, ScriptedConnector::new(vec![]));
        let err = h
            .provisioner
            .provision(Engine::MariaDb, "db0", &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::NoConnector { .. }));
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let mut connector = ScriptedConnector::new(vec![]);
        connector.fail_connect = true;
        let h = harness(Engine::Dolt, DOLT_CONFIG, connector);
        let err = h
            .provisioner
            .provision(Engine::Dolt, "db0", &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Connection { .. }));
    }

    #[test]
    fn test_missing_template_aborts_before_connecting() {
        let h = harness(
            Engine::Dolt,
            "[DOLT]\nport = \"3306\"\n",
            ScriptedConnector::new(vec![]),
        );
        let err = h
            .provisioner
            .provision(Engine::Dolt, "db0", &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Config(_)));
        assert_eq!(h.connector.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sync_statement_swallows_failure() {
        let config = r#"
            [RISINGWAVE]
            url = "postgresql://{host}:{port}/{database}"
            host = "localhost"
            port = "4566"
        "#;
        let h = harness(
            Engine::RisingWave,
            config,
            ScriptedConnector::new(vec!["FLUSH"]),
        );
        let mut outcome = h
            .provisioner
            .provision(Engine::RisingWave, "db0", &Overrides::default())
            .unwrap();
        h.provisioner
            .sync_after_run(Engine::RisingWave, outcome.session.as_mut(), &[]);
        let statements = h.sink.statements();
        assert_eq!(statements.last().unwrap(), "FLUSH");
    }

    #[test]
    fn test_sync_refresh_tables() {
        let config = r#"
            [CRATE]
            url = "crate://{host}:{port}/"
            host = "localhost"
            port = "5432"
        "#;
        let h = harness(Engine::Crate, config, ScriptedConnector::new(vec![]));
        let mut outcome = h
            .provisioner
            .provision(Engine::Crate, "db0", &Overrides::default())
            .unwrap();
        h.provisioner.sync_after_run(
            Engine::Crate,
            outcome.session.as_mut(),
            &["db0_t0".to_string(), "db0_t1".to_string()],
        );
        let statements = h.sink.statements();
        assert_eq!(statements[statements.len() - 2], "REFRESH TABLE db0_t0");
        assert_eq!(statements[statements.len() - 1], "REFRESH TABLE db0_t1");
    }

    #[test]
    fn test_sqlite_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("engines.toml");
        let db_template = format!("sqlite:{}/{{dbname}}.db", dir.path().display());
        std::fs::write(&config_path, format!("[SQLITE]\nurl = \"{}\"\n", db_template)).unwrap();

        let store = Arc::new(ConfigStore::with_path(&config_path));
        let sink = Arc::new(MemorySink::new());
        let provisioner =
            Provisioner::new(store, ConnectorRegistry::with_defaults(), sink.clone());

        let mut outcome = provisioner
            .provision(Engine::Sqlite, "fuzz0", &Overrides::default())
            .unwrap();
        assert!(outcome.fresh);
        assert!(sink.statements().is_empty());

        outcome
            .session
            .execute("CREATE TABLE fuzz0_t0 (id INTEGER)")
            .unwrap();
        assert!(dir.path().join("fuzz0.db").exists());
    }
}
