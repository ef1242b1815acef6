//! Feed credential entries
//!
//! npm stores registry credentials under keys derived from the registry URL
//! with the scheme stripped: `//host/path/:username`, `//host/path/:_password`
//! (base64-encoded), `//host/path/:email`. Azure DevOps feeds are commonly
//! addressed both with and without a trailing slash, and npm matches the key
//! literally, so both prefix variants are written.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;

use crate::error::{Error, Result};
use crate::file::NpmrcFile;

/// npm requires the email key to exist but ignores its value.
const PLACEHOLDER_EMAIL: &str = "npm requires email to be set but doesn't use the value";

/// A package feed identified by its registry URL.
#[derive(Debug, Clone)]
pub struct Feed {
    registry_url: String,
}

/// Credentials for one feed as stored in the npmrc.
pub struct FeedCredentials {
    pub username: String,
    /// Base64-encoded PAT, exactly as npm stores it under `_password`.
    pub password: Secret<String>,
}

impl Feed {
    /// Build a feed from a registry URL. Only http(s) URLs are meaningful
    /// as npm registries.
    pub fn from_registry_url(url: &str) -> Result<Self> {
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(Error::Parse(format!("registry URL has no scheme: {url}")));
        }
        Ok(Self {
            registry_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// The registry URL, without a trailing slash.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Credential key prefixes for this feed, slashless variant first.
    ///
    /// `https://host/path` becomes `//host/path:` and `//host/path/:`.
    pub fn credential_prefixes(&self) -> [String; 2] {
        let bare = self
            .registry_url
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        [format!("//{bare}:"), format!("//{bare}/:")]
    }
}

impl FeedCredentials {
    /// Assemble credentials from a raw (unencoded) PAT.
    pub fn from_pat(username: impl Into<String>, pat: &Secret<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(STANDARD.encode(pat.expose())),
        }
    }

    /// Decode the stored base64 `_password` back into the raw PAT.
    pub fn raw_pat(&self) -> Result<Secret<String>> {
        let bytes = STANDARD
            .decode(self.password.expose())
            .map_err(|e| Error::Parse(format!("_password is not valid base64: {e}")))?;
        let pat = String::from_utf8(bytes)
            .map_err(|_| Error::Parse("_password does not decode to UTF-8".into()))?;
        Ok(Secret::new(pat))
    }
}

impl NpmrcFile {
    /// Read the credentials configured for a feed, if any.
    ///
    /// Either prefix variant counts. Absence of a `_password` entry means no
    /// credential is configured at all.
    pub fn credentials_for(&self, feed: &Feed) -> Option<FeedCredentials> {
        for prefix in feed.credential_prefixes() {
            let Some(password) = self.get(&format!("{prefix}_password")) else {
                continue;
            };
            let username = self
                .get(&format!("{prefix}username"))
                .unwrap_or("ado-npm-auth")
                .to_string();
            return Some(FeedCredentials {
                username,
                password: Secret::new(password.to_string()),
            });
        }
        None
    }

    /// Create or replace the credential entries for a feed.
    ///
    /// Writes username, `_password`, and email under both prefix variants.
    /// Every line not belonging to these six keys is left untouched.
    pub fn set_credentials(&mut self, feed: &Feed, credentials: &FeedCredentials) {
        for prefix in feed.credential_prefixes() {
            self.set(&format!("{prefix}username"), &credentials.username);
            self.set(
                &format!("{prefix}_password"),
                credentials.password.expose(),
            );
            self.set(&format!("{prefix}email"), PLACEHOLDER_EMAIL);
        }
    }
}
