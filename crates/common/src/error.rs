use std::io;
use std::path::Path;

use thiserror::Error;

/// Unified error type for Floe crates.
///
/// Variants carry rendered messages rather than the underlying error values so
/// that a failure can be cached and handed out again, unchanged, to later callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O failure on `path`.
    pub fn io(path: &Path, err: io::Error) -> Self {
        Error::Io(format!("{}: {}", path.display(), err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
