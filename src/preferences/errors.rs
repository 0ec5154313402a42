use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Heed error: {0}")]
    Heed(#[from] heed::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database initialization error: {0}")]
    DatabaseInitialization(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Directory creation error: {0}")]
    DirectoryCreation(String),
}
