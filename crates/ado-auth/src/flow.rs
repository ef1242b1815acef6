//! Validation/provisioning seam for the orchestrator
//!
//! The orchestrator only needs two async operations; putting them behind a
//! dyn-compatible trait (boxed-future returns) lets it be exercised with
//! fakes instead of a real feed, helper, and home directory.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use npmrc::{FeedCredentials, NpmrcFile};
use tracing::info;

use crate::acquire::{HelperCommand, acquire_token};
use crate::constants::DEFAULT_USERNAME;
use crate::error::Result;
use crate::validate::{PatStatus, discover_feed, validate_configured_pat};

/// The two credential operations the orchestrator sequences.
pub trait CredentialFlow: Send + Sync {
    /// Classify the currently configured PAT.
    fn validate(&self) -> Pin<Box<dyn Future<Output = Result<PatStatus>> + Send + '_>>;

    /// Acquire a fresh PAT and persist it into the npmrc.
    fn provision(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// The real flow: Azure DevOps feed, `azureauth` helper, user-level npmrc.
pub struct AdoCredentialFlow {
    client: reqwest::Client,
    project_path: PathBuf,
    user_path: PathBuf,
    helper: HelperCommand,
}

impl AdoCredentialFlow {
    /// Build the flow for a run. `config_file` overrides the user-level
    /// npmrc location (`--configFile`); the helper command honors its
    /// environment override.
    pub fn new(config_file: Option<PathBuf>) -> Result<Self> {
        let user_path = match config_file {
            Some(path) => path,
            None => npmrc::default_user_path()?,
        };
        Ok(Self {
            client: reqwest::Client::new(),
            project_path: npmrc::project_path(),
            user_path,
            helper: HelperCommand::from_env(),
        })
    }

    /// Fully explicit constructor for tests and embedding.
    pub fn with_paths(
        client: reqwest::Client,
        project_path: PathBuf,
        user_path: PathBuf,
        helper: HelperCommand,
    ) -> Self {
        Self {
            client,
            project_path,
            user_path,
            helper,
        }
    }

    async fn provision_inner(&self) -> Result<()> {
        let feed = discover_feed(&self.project_path, &self.user_path).await?;
        let token = acquire_token(&self.helper).await?;
        let username = token
            .user
            .clone()
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());

        let mut file = NpmrcFile::load(&self.user_path).await?;
        file.set_credentials(&feed, &FeedCredentials::from_pat(username, &token.token));
        file.save().await?;

        info!(
            registry = feed.registry_url(),
            path = %self.user_path.display(),
            "credentials written"
        );
        Ok(())
    }
}

impl CredentialFlow for AdoCredentialFlow {
    fn validate(&self) -> Pin<Box<dyn Future<Output = Result<PatStatus>> + Send + '_>> {
        Box::pin(validate_configured_pat(
            &self.client,
            &self.project_path,
            &self.user_path,
        ))
    }

    fn provision(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.provision_inner())
    }
}
