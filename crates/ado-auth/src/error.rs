//! Error types for feed authentication operations

/// Errors from PAT validation and provisioning.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token validation failed: {0}")]
    ValidationFailed(String),

    #[error("no Azure DevOps registry found in .npmrc")]
    NoFeed,

    #[error("identity helper '{0}' not found on PATH")]
    HelperNotFound(String),

    #[error("identity helper failed: {0}")]
    HelperFailed(String),

    #[error("unusable identity helper output: {0}")]
    HelperOutput(String),

    #[error(transparent)]
    Npmrc(#[from] npmrc::Error),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
