use thiserror::Error;

/// Why a timing source could not be attached. Never surfaces past the collector.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Timing source not supported: {0}")]
    Unsupported(String),
    #[error("No async runtime available for {0}")]
    NoRuntime(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
