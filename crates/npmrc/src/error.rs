//! Error types for npmrc file operations

/// Errors from reading, parsing, or persisting an `.npmrc` file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("npmrc parse error: {0}")]
    Parse(String),

    #[error("cannot resolve home directory for user-level .npmrc")]
    NoHomeDir,
}

/// Result alias for npmrc operations.
pub type Result<T> = std::result::Result<T, Error>;
