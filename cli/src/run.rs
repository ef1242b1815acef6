//! Orchestration
//!
//! One pass through the decision flow, no retries, no persisted state. The
//! orchestrator returns an [`Outcome`] instead of exiting so it can be
//! driven by tests; only `main` maps the outcome to a process exit code.

use ado_auth::CredentialFlow;
use telemetry::{Reporter, TelemetryEvent};
use tracing::warn;

use crate::args::Args;
use crate::host::{self, Host};

/// Terminal result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Codespaces detected: silent no-op, not even telemetry.
    CodespacesNoOp,
    /// Host not on the allow-list; benign, reported, exit 0.
    UnsupportedPlatform,
    /// Existing credential already valid; nothing written.
    AlreadyAuthenticated,
    /// `--skipAuth` was set and no valid credential exists. Deliberately
    /// exits 0: this mode only reports, it doesn't fail the build.
    TokenInvalid,
    /// New credential provisioned and written.
    Authenticated,
    /// Provisioning was attempted and failed. The only non-zero exit.
    Failed,
}

impl Outcome {
    /// Process exit code this outcome maps to. Everything except a failed
    /// provisioning attempt is 0, including the benign skips.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Failed => 1,
            _ => 0,
        }
    }
}

/// Sequence the gates, the validity check, and (conditionally) provisioning.
///
/// At most one of {valid-credential short-circuit, provisioning attempt}
/// happens per run. The validator runs at most once; a validation error is
/// logged and treated as "not valid", which is indistinguishable from a
/// rejected token at this layer.
pub async fn run(
    host: &Host,
    args: &Args,
    flow: &dyn CredentialFlow,
    telemetry: &Reporter,
) -> Outcome {
    if host.codespaces {
        return Outcome::CodespacesNoOp;
    }

    if !host::is_supported(&host.os, &host.arch) {
        let message = format!(
            "Platform {} and architecture {} not supported for automatic authentication.",
            host.os, host.arch
        );
        println!("{message}");
        telemetry.log(TelemetryEvent::failure(message), true).await;
        return Outcome::UnsupportedPlatform;
    }

    let do_valid_check = !args.skip_check;
    let valid = if do_valid_check || args.skip_auth {
        match flow.validate().await {
            Ok(status) => status.is_valid(),
            Err(e) => {
                warn!(error = %e, "token validation errored, treating token as not valid");
                false
            }
        }
    } else {
        false
    };

    if do_valid_check && valid {
        telemetry.log(TelemetryEvent::success(), false).await;
        println!("✅ Current authentication is valid");
        return Outcome::AlreadyAuthenticated;
    }

    if args.skip_auth && !valid {
        telemetry
            .log(TelemetryEvent::automatic_failure("invalid token"), true)
            .await;
        println!("❌ Your token is invalid.");
        return Outcome::TokenInvalid;
    }

    println!("🔑 Authenticating to package feed...");
    match flow.provision().await {
        Ok(()) => {
            telemetry.log(TelemetryEvent::automatic_success(), false).await;
            println!("✅ Automatic authentication successful");
            Outcome::Authenticated
        }
        Err(e) => {
            telemetry
                .log(TelemetryEvent::automatic_failure(e.to_string()), true)
                .await;
            println!("❌ Authentication to package feed failed: {e}");
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ado_auth::{Error, PatStatus};
    use axum::Router;
    use axum::extract::State;
    use axum::routing::post;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Scriptable flow: a validation verdict (None simulates a transport
    /// error) and a provisioning result, with call counters.
    struct FakeFlow {
        status: Option<PatStatus>,
        provision_error: Option<String>,
        validate_calls: AtomicUsize,
        provision_calls: AtomicUsize,
    }

    impl FakeFlow {
        fn new(status: Option<PatStatus>, provision_error: Option<&str>) -> Self {
            Self {
                status,
                provision_error: provision_error.map(String::from),
                validate_calls: AtomicUsize::new(0),
                provision_calls: AtomicUsize::new(0),
            }
        }
    }

    impl CredentialFlow for FakeFlow {
        fn validate(
            &self,
        ) -> Pin<Box<dyn Future<Output = ado_auth::Result<PatStatus>> + Send + '_>> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            let status = self.status;
            Box::pin(async move {
                status.ok_or_else(|| Error::Http("connection reset".into()))
            })
        }

        fn provision(&self) -> Pin<Box<dyn Future<Output = ado_auth::Result<()>> + Send + '_>> {
            self.provision_calls.fetch_add(1, Ordering::SeqCst);
            let error = self.provision_error.clone();
            Box::pin(async move {
                match error {
                    None => Ok(()),
                    Some(msg) => Err(Error::HelperFailed(msg)),
                }
            })
        }
    }

    fn supported_host() -> Host {
        Host {
            os: "linux".into(),
            arch: "x86_64".into(),
            codespaces: false,
        }
    }

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn start_collector() -> (Reporter, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route(
                "/events",
                post(
                    |State(received): State<Received>,
                     axum::Json(body): axum::Json<serde_json::Value>| async move {
                        received.lock().unwrap().push(body);
                    },
                ),
            )
            .with_state(received.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (
            Reporter::new(Some(format!("http://{addr}/events"))),
            received,
        )
    }

    async fn wait_for_events(received: &Received, count: usize) -> Vec<serde_json::Value> {
        for _ in 0..100 {
            if received.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        received.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn codespaces_is_a_silent_noop() {
        let host = Host {
            os: "linux".into(),
            arch: "x86_64".into(),
            codespaces: true,
        };
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        let (reporter, received) = start_collector().await;

        let outcome = run(&host, &Args::default(), &flow, &reporter).await;

        assert_eq!(outcome, Outcome::CodespacesNoOp);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(received.lock().unwrap().is_empty(), "no telemetry allowed");
    }

    #[tokio::test]
    async fn unsupported_platform_never_provisions_and_exits_zero() {
        let host = Host {
            os: "freebsd".into(),
            arch: "riscv64".into(),
            codespaces: false,
        };
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        let (reporter, received) = start_collector().await;

        let outcome = run(&host, &Args::default(), &flow, &reporter).await;

        assert_eq!(outcome, Outcome::UnsupportedPlatform);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 0);

        let events = wait_for_events(&received, 1).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["success"], false);
        let error = events[0]["error"].as_str().unwrap();
        assert!(error.contains("freebsd") && error.contains("riscv64"));
    }

    #[tokio::test]
    async fn valid_token_short_circuits() {
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        let (reporter, received) = start_collector().await;

        let outcome = run(&supported_host(), &Args::default(), &flow, &reporter).await;

        assert_eq!(outcome, Outcome::AlreadyAuthenticated);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 0);

        let events = wait_for_events(&received, 1).await;
        assert_eq!(events[0]["success"], true);
        assert!(events[0].get("automaticSuccess").is_none());
    }

    #[tokio::test]
    async fn skip_check_bypasses_the_short_circuit() {
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        let args = Args {
            skip_check: true,
            ..Args::default()
        };

        let outcome = run(&supported_host(), &args, &flow, &Reporter::disabled()).await;

        // With the check skipped and no --skipAuth, the run goes straight
        // to provisioning without consulting the validator at all.
        assert_eq!(outcome, Outcome::Authenticated);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skip_auth_with_invalid_token_reports_and_exits_zero() {
        for status in [PatStatus::Missing, PatStatus::Invalid] {
            let flow = FakeFlow::new(Some(status), None);
            let args = Args {
                skip_auth: true,
                ..Args::default()
            };
            let (reporter, received) = start_collector().await;

            let outcome = run(&supported_host(), &args, &flow, &reporter).await;

            assert_eq!(outcome, Outcome::TokenInvalid);
            assert_eq!(outcome.exit_code(), 0);
            assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 0);

            let events = wait_for_events(&received, 1).await;
            assert_eq!(events[0]["success"], false);
            assert_eq!(events[0]["automaticSuccess"], false);
            assert_eq!(events[0]["error"], "invalid token");
        }
    }

    #[tokio::test]
    async fn skip_auth_with_valid_token_does_nothing_harmful() {
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        let args = Args {
            skip_auth: true,
            ..Args::default()
        };

        let outcome = run(&supported_host(), &args, &flow, &Reporter::disabled()).await;

        assert_eq!(outcome, Outcome::AlreadyAuthenticated);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_provisions_exactly_once() {
        let flow = FakeFlow::new(Some(PatStatus::Invalid), None);
        let (reporter, received) = start_collector().await;

        let outcome = run(&supported_host(), &Args::default(), &flow, &reporter).await;

        assert_eq!(outcome, Outcome::Authenticated);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 1);

        let events = wait_for_events(&received, 1).await;
        assert_eq!(events[0]["success"], true);
        assert_eq!(events[0]["automaticSuccess"], true);
    }

    #[tokio::test]
    async fn provisioning_failure_exits_one_with_error_telemetry() {
        let flow = FakeFlow::new(Some(PatStatus::Missing), Some("network error"));
        let (reporter, received) = start_collector().await;

        let outcome = run(&supported_host(), &Args::default(), &flow, &reporter).await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 1);

        let events = wait_for_events(&received, 1).await;
        assert_eq!(events[0]["success"], false);
        assert_eq!(events[0]["automaticSuccess"], false);
        assert_eq!(
            events[0]["error"].as_str().unwrap(),
            "identity helper failed: network error"
        );
    }

    #[tokio::test]
    async fn validation_error_is_treated_as_not_valid() {
        // Validator errors (None) fall through to provisioning
        let flow = FakeFlow::new(None, None);

        let outcome = run(&supported_host(), &Args::default(), &flow, &Reporter::disabled()).await;

        assert_eq!(outcome, Outcome::Authenticated);
        assert_eq!(flow.validate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.provision_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn telemetry_failures_never_change_the_outcome() {
        let flow = FakeFlow::new(Some(PatStatus::Valid), None);
        // Unreachable collector
        let reporter = Reporter::new(Some("http://127.0.0.1:1/events".into()));

        let outcome = run(&supported_host(), &Args::default(), &flow, &reporter).await;
        assert_eq!(outcome, Outcome::AlreadyAuthenticated);
    }
}
