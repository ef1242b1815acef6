//! Azure DevOps feed authentication
//!
//! Everything between the npmrc on disk and the feed: checking whether the
//! configured PAT is still accepted, acquiring a fresh PAT through the
//! external `azureauth` identity helper, and writing the result back.
//!
//! Provisioning flow:
//! 1. `validate::discover_feed()` finds the Azure DevOps registry in the
//!    project npmrc (user npmrc as fallback)
//! 2. `validate::validate_configured_pat()` classifies the stored PAT as
//!    `Missing`, `Invalid`, or `Valid`
//! 3. `acquire::acquire_token()` runs the identity helper subprocess
//! 4. `flow::AdoCredentialFlow::provision()` persists the new credential
//!    entries through the npmrc crate
//!
//! Token issuance itself is entirely the helper's concern; this crate only
//! invokes it and consumes its output.

pub mod acquire;
pub mod constants;
pub mod error;
pub mod flow;
pub mod validate;

pub use acquire::{HelperCommand, HelperToken, acquire_token};
pub use error::{Error, Result};
pub use flow::{AdoCredentialFlow, CredentialFlow};
pub use validate::{PatStatus, check_pat, discover_feed, validate_configured_pat};
