/// Shared LMDB configuration for the preference environment
use heed::{Env, EnvOpenOptions};
use std::path::Path;
use crate::common::constants::{LMDB_ENV_CREATION_CONTEXT, LMDB_MAP_SIZE, LMDB_MAX_DBS, LMDB_MAX_READERS};
use crate::common::error_utils::ErrorContext;
use crate::preferences::errors::PreferenceError;

/// Open an LMDB environment with the preference store options.
/// Opening the same path twice must use identical options, so every caller goes through here.
pub fn open_lmdb_environment(path: &Path) -> Result<Env, PreferenceError> {
    unsafe {
        EnvOpenOptions::new()
            .map_size(LMDB_MAP_SIZE)
            .max_dbs(LMDB_MAX_DBS)
            .max_readers(LMDB_MAX_READERS)
            .open(path)
            .with_db_context(&format!("{} at: {}", LMDB_ENV_CREATION_CONTEXT, path.display()))
    }
}

/// Get the shared LMDB configuration values for validation or logging
pub fn get_lmdb_config() -> (usize, u32, u32) {
    (LMDB_MAP_SIZE, LMDB_MAX_DBS, LMDB_MAX_READERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_consistent_lmdb_config() {
        let (map_size, max_dbs, max_readers) = get_lmdb_config();
        assert_eq!(map_size, 1024 * 1024);
        assert_eq!(max_dbs, 2);
        assert_eq!(max_readers, 126);
    }

    #[test]
    fn test_open_lmdb_environment() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("prefs");
        std::fs::create_dir_all(&db_path).expect("Failed to create db dir");

        let result = open_lmdb_environment(&db_path);
        assert!(result.is_ok(), "Failed to open LMDB environment: {:?}", result.err());
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let result = open_lmdb_environment(&temp_dir.path().join("does_not_exist"));
        assert!(matches!(result, Err(PreferenceError::DatabaseInitialization(_))));
    }
}
