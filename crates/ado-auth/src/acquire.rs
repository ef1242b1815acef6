//! PAT acquisition through the identity helper
//!
//! Token issuance is delegated entirely to an external helper binary
//! (`azureauth` by default), which handles broker/browser/device-code login
//! on its own. This module only builds the command line, runs it, and parses
//! what comes back on stdout.

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{
    AZURE_DEVOPS_RESOURCE_ID, DEFAULT_HELPER, HELPER_ENV, VISUAL_STUDIO_CLIENT_ID,
};
use crate::error::{Error, Result};

/// The helper invocation: program plus fixed arguments.
#[derive(Debug, Clone)]
pub struct HelperCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HelperCommand {
    /// The stock `azureauth` invocation for an Azure DevOps-scoped token.
    pub fn default_helper() -> Self {
        Self {
            program: DEFAULT_HELPER.to_string(),
            args: vec![
                "aad".into(),
                "--resource".into(),
                AZURE_DEVOPS_RESOURCE_ID.into(),
                "--client".into(),
                VISUAL_STUDIO_CLIENT_ID.into(),
                "--output".into(),
                "json".into(),
            ],
        }
    }

    /// Resolve the helper from `ADO_NPM_AUTH_HELPER` (whitespace-split
    /// command line) or fall back to the stock invocation.
    pub fn from_env() -> Self {
        match std::env::var(HELPER_ENV) {
            Ok(line) if !line.trim().is_empty() => {
                let mut parts = line.split_whitespace().map(String::from);
                let program = parts.next().unwrap_or_else(|| DEFAULT_HELPER.to_string());
                Self {
                    program,
                    args: parts.collect(),
                }
            }
            _ => Self::default_helper(),
        }
    }
}

/// What the helper hands back: the PAT, and optionally the identity it
/// belongs to. Debug prints the token redacted.
#[derive(Debug)]
pub struct HelperToken {
    pub user: Option<String>,
    pub token: Secret<String>,
}

#[derive(Deserialize)]
struct HelperJson {
    user: Option<String>,
    token: String,
}

/// Run the identity helper and parse its output.
///
/// JSON output (`{"user": ..., "token": ...}`) is preferred; a bare
/// single-line token on stdout is accepted for helpers configured in
/// token-output mode. Stderr is surfaced in the failure message since that's
/// where the helper explains login problems.
pub async fn acquire_token(helper: &HelperCommand) -> Result<HelperToken> {
    debug!(program = %helper.program, "invoking identity helper");

    let output = tokio::process::Command::new(&helper.program)
        .args(&helper.args)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::HelperNotFound(helper.program.clone())
            } else {
                Error::HelperFailed(format!("spawning {}: {e}", helper.program))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(Error::HelperFailed(if stderr.is_empty() {
            format!("{} exited with {}", helper.program, output.status)
        } else {
            stderr.to_string()
        }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_helper_output(stdout.trim())
}

fn parse_helper_output(stdout: &str) -> Result<HelperToken> {
    if let Ok(json) = serde_json::from_str::<HelperJson>(stdout) {
        if json.token.is_empty() {
            return Err(Error::HelperOutput("helper returned an empty token".into()));
        }
        return Ok(HelperToken {
            user: json.user,
            token: Secret::new(json.token),
        });
    }

    // Token-output mode: a bare PAT on a single line
    if !stdout.is_empty() && !stdout.contains(char::is_whitespace) {
        return Ok(HelperToken {
            user: None,
            token: Secret::new(stdout.to_string()),
        });
    }

    Err(Error::HelperOutput(
        "stdout is neither helper JSON nor a bare token".into(),
    ))
}
