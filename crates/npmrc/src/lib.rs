//! npm configuration file model
//!
//! Reads and rewrites `.npmrc` files while preserving every line this tool
//! does not own: comments, blank lines, and unrelated settings survive a
//! rewrite byte-for-byte, in their original order. Only the credential
//! entries for the target feed are created or replaced.
//!
//! All writes go through an atomic temp-file + rename so a crash mid-write
//! never leaves a truncated config, and the file is chmod 0600 since it
//! carries an encoded PAT.

mod error;
mod feed;
mod file;
mod path;

pub use error::{Error, Result};
pub use feed::{Feed, FeedCredentials};
pub use file::{Line, NpmrcFile};
pub use path::{default_user_path, project_path};
