//! ado-npm-auth
//!
//! Writes a validated Azure DevOps PAT into the npm configuration so
//! installs against a private feed just work. One pass per invocation:
//! gate on the host, check the existing credential, provision a new one
//! only when needed, report the outcome.

mod args;
mod host;
mod run;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ado_auth::AdoCredentialFlow;
use telemetry::Reporter;

use crate::args::Args;
use crate::host::Host;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Diagnostics go to tracing (LOG_LEVEL / RUST_LOG); user-facing status
    // lines go to stdout. Default filter is quiet so normal runs print only
    // the status line.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let host = Host::detect();
    debug!(?host, ?args, "starting ado-npm-auth");

    let telemetry = Reporter::from_env();
    let flow = AdoCredentialFlow::new(args.config_file.clone())
        .context("failed to resolve npmrc location")?;

    let outcome = run::run(&host, &args, &flow, &telemetry).await;
    debug!(?outcome, "run finished");

    // Returning drops the runtime and cancels spawned sends; drain them
    // first so success events actually leave the process.
    telemetry.flush().await;

    Ok(ExitCode::from(outcome.exit_code()))
}
