use crate::preferences::errors::PreferenceError;

/// Common error mapping utilities to reduce repetitive .map_err() patterns
/// Map directory creation errors with context
pub fn map_dir_creation_error(path: &std::path::Path) -> impl Fn(std::io::Error) -> PreferenceError + '_ {
    let path_str = path.display().to_string();
    move |e| PreferenceError::DirectoryCreation(format!("Failed to create directory '{}': {}", path_str, e))
}

/// Helper trait for attaching context to storage errors
pub trait ErrorContext<T> {
    fn with_db_context(self, context: &str) -> Result<T, PreferenceError>;
}

impl<T> ErrorContext<T> for Result<T, heed::Error> {
    fn with_db_context(self, context: &str) -> Result<T, PreferenceError> {
        self.map_err(|e| PreferenceError::DatabaseInitialization(format!("{}: {}", context, e)))
    }
}
