//! Persisted key-value preferences
//!
//! The collector keeps a single flag here so that a developer who switched
//! monitoring on keeps it on across restarts.

pub mod errors;
pub mod storage;

pub use errors::PreferenceError;
pub use storage::{LmdbPreferenceStore, MemoryPreferenceStore};

/// Process-wide key-value preference store
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
    /// Remove a key, returning whether it was present
    fn remove(&self, key: &str) -> Result<bool, PreferenceError>;

    fn contains(&self, key: &str) -> Result<bool, PreferenceError> {
        Ok(self.get(key)?.is_some())
    }
}
