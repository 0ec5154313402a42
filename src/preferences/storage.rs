use std::path::{Path, PathBuf};
use std::sync::RwLock;

use heed::types::Str;
use heed::{Database, Env};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::common::constants::*;
use crate::common::error_utils::{map_dir_creation_error, ErrorContext};
use crate::common::lmdb_config::open_lmdb_environment;
use super::{PreferenceError, PreferenceStore};

/// LMDB-backed preference store, survives process restarts
pub struct LmdbPreferenceStore {
    env: Env,
    db: Database<Str, Str>,
    path: PathBuf,
}

impl LmdbPreferenceStore {
    pub fn open(path: &Path) -> Result<Self, PreferenceError> {
        std::fs::create_dir_all(path).map_err(map_dir_creation_error(path))?;

        let env = open_lmdb_environment(path)?;

        let mut wtxn = env.write_txn()
            .with_db_context(LMDB_TRANSACTION_CONTEXT)?;
        let db = env
            .create_database::<Str, Str>(&mut wtxn, Some(PREFERENCES_DB_NAME))
            .with_db_context(LMDB_DATABASE_CONTEXT)?;
        wtxn.commit()
            .with_db_context(LMDB_TRANSACTION_CONTEXT)?;

        info!("✅ Opened preference store at {}", path.display());
        Ok(Self { env, db, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for LmdbPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let rtxn = self.env.read_txn()?;
        let value = self.db.get(&rtxn, key)?.map(str::to_owned);
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut wtxn = self.env.write_txn()?;
        self.db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        debug!("💾 Stored preference {}={}", key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, PreferenceError> {
        let mut wtxn = self.env.write_txn()?;
        let removed = self.db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        debug!("🗑️ Removed preference {} (present: {})", key, removed);
        Ok(removed)
    }
}

/// In-memory store for tests and hosts without a writable data directory
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<FxHashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(key: &str) -> Self {
        let store = Self::default();
        store
            .values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), PREFERENCE_ENABLED_VALUE.to_string());
        store
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, PreferenceError> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        Ok(values.remove(key).is_some())
    }
}
