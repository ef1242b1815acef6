//! Azure DevOps constants
//!
//! Well-known public identifiers for the Azure DevOps service and the
//! Visual Studio OAuth client the identity helper authenticates as. These
//! are not secrets; the PAT itself never appears here.

/// Azure DevOps resource id, the audience tokens are scoped to.
pub const AZURE_DEVOPS_RESOURCE_ID: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Visual Studio IDE public OAuth client id used for the helper login.
pub const VISUAL_STUDIO_CLIENT_ID: &str = "872cd9fa-d31f-45e0-9eab-6e460a02d1f1";

/// Default identity helper executable.
pub const DEFAULT_HELPER: &str = "azureauth";

/// Environment variable overriding the helper command line (CI and tests).
pub const HELPER_ENV: &str = "ADO_NPM_AUTH_HELPER";

/// Username written next to the PAT when the helper doesn't report one.
/// Azure DevOps accepts any username with Basic PAT credentials.
pub const DEFAULT_USERNAME: &str = "ado-npm-auth";

/// Hosts that identify a registry URL as an Azure DevOps feed.
pub const ADO_FEED_HOSTS: [&str; 2] = ["pkgs.dev.azure.com", ".pkgs.visualstudio.com"];
