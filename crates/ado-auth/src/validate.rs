//! PAT validation against the feed
//!
//! The feed's registry endpoint doubles as the validation endpoint: a GET
//! with Basic credentials answers 401/403 for a revoked or expired PAT and
//! succeeds otherwise. There is no separate "introspect token" API for npm
//! feeds.

use std::path::Path;

use common::Secret;
use npmrc::{Feed, NpmrcFile};
use tracing::debug;

use crate::constants::ADO_FEED_HOSTS;
use crate::error::{Error, Result};

/// Classification of the PAT currently configured for the feed.
///
/// `Missing` and `Invalid` are treated identically by the orchestration
/// (both mean "provision a new one"); the distinction exists because the
/// npmrc layer can tell them apart for free and the telemetry message is
/// clearer for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatStatus {
    /// No credential entry exists for the feed.
    Missing,
    /// A credential exists but the feed rejects it (or it is malformed).
    Invalid,
    /// The feed accepts the credential.
    Valid,
}

impl PatStatus {
    /// Whether this status short-circuits provisioning.
    pub fn is_valid(self) -> bool {
        matches!(self, PatStatus::Valid)
    }
}

/// Check a PAT against the feed's registry endpoint.
///
/// 2xx/3xx means the feed accepted the credential; 401/403 means it was
/// rejected. Any other status is a validation error, not a verdict.
pub async fn check_pat(
    client: &reqwest::Client,
    feed: &Feed,
    username: &str,
    pat: &Secret<String>,
) -> Result<PatStatus> {
    if pat.is_empty() {
        return Ok(PatStatus::Invalid);
    }

    let response = client
        .get(feed.registry_url())
        .basic_auth(username, Some(pat.expose()))
        .send()
        .await
        .map_err(|e| Error::Http(format!("validation request failed: {e}")))?;

    let status = response.status();
    debug!(registry = feed.registry_url(), %status, "validation response");

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Ok(PatStatus::Invalid);
    }
    if status.is_success() || status.is_redirection() {
        return Ok(PatStatus::Valid);
    }
    Err(Error::ValidationFailed(format!(
        "registry returned unexpected status {status}"
    )))
}

/// Find the Azure DevOps feed a run should authenticate against.
///
/// The project npmrc names the feed (that's where `registry=` lives in a
/// repository); the user npmrc is consulted as a fallback. The first
/// registry entry on an Azure DevOps host wins.
pub async fn discover_feed(project_path: &Path, user_path: &Path) -> Result<Feed> {
    for path in [project_path, user_path] {
        let file = NpmrcFile::load(path).await?;
        for url in file.registry_urls() {
            if is_ado_registry(url) {
                debug!(registry = url, source = %path.display(), "feed discovered");
                return Ok(Feed::from_registry_url(url)?);
            }
        }
    }
    Err(Error::NoFeed)
}

/// Classify the PAT configured in the user npmrc for the discovered feed.
///
/// Returns `Missing` before touching the network when no credential entry
/// exists. A stored `_password` that isn't valid base64 counts as `Invalid`
/// rather than an error; the remedy is the same re-provision either way.
pub async fn validate_configured_pat(
    client: &reqwest::Client,
    project_path: &Path,
    user_path: &Path,
) -> Result<PatStatus> {
    let feed = discover_feed(project_path, user_path).await?;
    let user_file = NpmrcFile::load(user_path).await?;

    let Some(credentials) = user_file.credentials_for(&feed) else {
        return Ok(PatStatus::Missing);
    };
    let pat = match credentials.raw_pat() {
        Ok(pat) => pat,
        Err(_) => return Ok(PatStatus::Invalid),
    };

    check_pat(client, &feed, &credentials.username, &pat).await
}

fn is_ado_registry(url: &str) -> bool {
    ADO_FEED_HOSTS.iter().any(|host| url.contains(host))
}
