//! Engine configuration store
//!
//! Loads the per-engine property file once and serves keyed lookups merged
//! with environment variables. The file snapshot is the only cached state;
//! the environment is consulted live on every lookup so a variable set
//! after the first load is still honored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use config::{Config, FileFormat};
use tracing::debug;

use crate::engine::Engine;
use crate::error::ConfigError;

/// Parsed engine tables: engine name (uppercase) -> property -> value
type EngineTable = HashMap<String, HashMap<String, String>>;

/// Well-known path of the engine configuration file
pub const DEFAULT_CONFIG_PATH: &str = "dbconfigs/engines.toml";

/// Prefix for environment variable lookups
pub const ENV_PREFIX: &str = "SQLANCER_";

/// Load-once store over the engine configuration file
///
/// `ConfigStore` is an explicitly constructed instance rather than ambient
/// global state, so tests can build isolated stores against their own
/// files. One store is typically shared (via `Arc`) by all test-session
/// workers; the internal `RwLock` guarantees that concurrent first access
/// performs exactly one file read and that `reload()` never interleaves
/// with a lookup in progress.
pub struct ConfigStore {
    path: PathBuf,
    file: RwLock<Option<EngineTable>>,
}

impl ConfigStore {
    /// Create a store over the well-known configuration path
    pub fn new() -> Self {
        Self::with_path(DEFAULT_CONFIG_PATH)
    }

    /// Create a store over a custom configuration path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        ConfigStore {
            path: path.into(),
            file: RwLock::new(None),
        }
    }

    /// Path of the configuration file backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration file if it is not already loaded
    ///
    /// A missing or unreadable file is a fatal [`ConfigError`]: it is a
    /// deployment problem, not a runtime-retryable condition. Calling
    /// `load()` while already loaded is a no-op.
    pub fn load(&self) -> Result<(), ConfigError> {
        let mut guard = write_lock(&self.file);
        if guard.is_some() {
            return Ok(());
        }
        let loaded = self.read_file()?;
        debug!("loaded engine configuration from '{}'", self.path.display());
        *guard = Some(loaded);
        Ok(())
    }

    /// Discard the cached file snapshot
    ///
    /// The next lookup re-reads the file. Holding the write lock here makes
    /// reload mutually exclusive with `get()`/`load()`, so no lookup can
    /// observe a half-loaded state.
    pub fn reload(&self) {
        let mut guard = write_lock(&self.file);
        *guard = None;
    }

    /// Look up a property for an engine
    ///
    /// Returns the environment variable `SQLANCER_<ENGINE>_<PROPERTY>` if
    /// set and non-empty, otherwise the file property `<ENGINE>.<property>`,
    /// otherwise an empty string. Triggers `load()` on first use: a missing
    /// file is surfaced even when the environment would cover the lookup.
    pub fn get(&self, engine: Engine, property: &str) -> Result<String, ConfigError> {
        self.ensure_loaded()?;

        let env_key = format!("{}{}_{}", ENV_PREFIX, engine.name(), property.to_uppercase());
        if let Ok(value) = std::env::var(&env_key) {
            if !value.is_empty() {
                return Ok(value);
            }
        }

        loop {
            {
                let guard = read_lock(&self.file);
                if let Some(file) = guard.as_ref() {
                    return Ok(file_value(file, engine, property));
                }
            }
            // A reload raced with this lookup; load again and retry.
            self.load()?;
        }
    }

    fn ensure_loaded(&self) -> Result<(), ConfigError> {
        {
            let guard = read_lock(&self.file);
            if guard.is_some() {
                return Ok(());
            }
        }
        self.load()
    }

    fn read_file(&self) -> Result<EngineTable, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::FileNotFound {
                path: self.path.display().to_string(),
            });
        }
        let settings = Config::builder()
            .add_source(config::File::from(self.path.as_path()).format(FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::FileUnreadable {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        settings
            .try_deserialize::<EngineTable>()
            .map_err(|e| ConfigError::FileUnreadable {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// File lookup for `<ENGINE>.<property>`; missing keys resolve to empty
fn file_value(file: &EngineTable, engine: Engine, property: &str) -> String {
    file.get(engine.name())
        .and_then(|props| props.get(property))
        .cloned()
        .unwrap_or_default()
}

// Lock poisoning only happens when a panicking thread held the guard; the
// snapshot itself is replaced wholesale, never mutated in place, so the
// inner value is still coherent.
fn read_lock(lock: &RwLock<Option<EngineTable>>) -> RwLockReadGuard<'_, Option<EngineTable>> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock(lock: &RwLock<Option<EngineTable>>) -> RwLockWriteGuard<'_, Option<EngineTable>> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
