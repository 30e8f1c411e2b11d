//! Built-in SQLite connector
//!
//! Backs the SQLITE engine with rusqlite so the provisioner is exercisable
//! end-to-end without an external server. Accepts `sqlite:<path>` strings,
//! bare file paths, and `:memory:`.

use rusqlite::Connection;

use crate::error::SessionError;
use crate::session::{Connector, SqlSession};

/// rusqlite-backed session
pub struct SqliteSession {
    pub conn: Connection,
}

impl SqliteSession {
    /// Open a session for a connection string
    ///
    /// An empty path or `:memory:` opens an in-memory database.
    pub fn open(url: &str) -> Result<Self, SessionError> {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        let conn = if path.is_empty() || path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Ok(SqliteSession { conn })
    }
}

impl SqlSession for SqliteSession {
    fn execute(&mut self, sql: &str) -> Result<(), SessionError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Connector for the SQLITE engine
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, url: &str) -> Result<Box<dyn SqlSession>, SessionError> {
        Ok(Box::new(SqliteSession::open(url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        assert!(SqliteSession::open(":memory:").is_ok());
        assert!(SqliteSession::open("sqlite::memory:").is_ok());
    }

    #[test]
    fn test_execute_ddl() {
        let mut session = SqliteSession::open(":memory:").unwrap();
        session
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .unwrap();
        session.execute("DROP TABLE t").unwrap();
    }

    #[test]
    fn test_execute_failure_surfaces() {
        let mut session = SqliteSession::open(":memory:").unwrap();
        assert!(session.execute("DROP TABLE missing_t0").is_err());
    }

    #[test]
    fn test_open_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fuzz.db");
        let url = format!("sqlite:{}", path.display());
        let mut session = SqliteSession::open(&url).unwrap();
        session.execute("CREATE TABLE t (x INTEGER)").unwrap();
        assert!(path.exists());
    }
}
