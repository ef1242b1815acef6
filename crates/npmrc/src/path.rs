//! npmrc path resolution

use std::path::PathBuf;

use crate::error::{Error, Result};

/// The user-level npmrc where credentials are written: `~/.npmrc`.
pub fn default_user_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".npmrc"))
        .ok_or(Error::NoHomeDir)
}

/// The project-level npmrc in the current directory, which names the feed
/// a repository resolves packages from.
pub fn project_path() -> PathBuf {
    PathBuf::from(".npmrc")
}
