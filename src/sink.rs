//! Statement audit sink
//!
//! Every DDL/DML statement the provisioner issues is forwarded verbatim to
//! a sink before execution, regardless of whether the statement later
//! succeeds or is swallowed as an ignorable cleanup failure. The sink is
//! write-only: the audit trail consumer lives outside this crate.

use std::sync::Mutex;

use tracing::debug;

/// Write-only sink for issued statements
pub trait StatementSink: Send + Sync {
    fn record(&self, statement: &str);
}

/// Sink that forwards statements to the tracing subscriber
pub struct TracingSink;

impl StatementSink for TracingSink {
    fn record(&self, statement: &str) {
        debug!("issuing: {}", statement);
    }
}

/// Sink that discards everything
pub struct NullSink;

impl StatementSink for NullSink {
    fn record(&self, _statement: &str) {}
}

/// Sink that collects statements in memory, in issue order
///
/// Used by the CLI to print the audit of a provisioning run and by tests
/// to assert on the emitted protocol.
#[derive(Default)]
pub struct MemorySink {
    statements: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded statements
    pub fn statements(&self) -> Vec<String> {
        match self.statements.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StatementSink for MemorySink {
    fn record(&self, statement: &str) {
        let mut guard = match self.statements.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(statement.to_string());
    }
}
