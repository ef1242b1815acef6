//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Automatic authentication for Azure DevOps npm feeds.
///
/// Flag spellings are camelCase for drop-in compatibility with the existing
/// package.json scripts that invoke this tool.
#[derive(Debug, Default, Parser)]
#[command(name = "ado-npm-auth", version)]
pub struct Args {
    /// Skip checking whether the current token is already valid
    #[arg(long = "skipCheck")]
    pub skip_check: bool,

    /// Only validate the current token; never attempt authentication
    #[arg(long = "skipAuth")]
    pub skip_auth: bool,

    /// Path to the .npmrc credentials are written to (default: ~/.npmrc)
    #[arg(long = "configFile", value_name = "PATH")]
    pub config_file: Option<PathBuf>,
}
