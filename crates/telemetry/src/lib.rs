//! Outcome telemetry
//!
//! One JSON event per run, posted to an opaque collector endpoint. Telemetry
//! is strictly fire-and-forget: a missing endpoint disables it, and no
//! transmission failure may ever change the run's outcome or reach the
//! caller. Critical events (failures) are awaited inline; non-critical ones
//! are spawned and drained by [`Reporter::flush`] before the process exits.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Environment variable naming the collector endpoint. Unset means disabled.
pub const TELEMETRY_ENV: &str = "ADO_NPM_AUTH_TELEMETRY_URL";

/// How long a critical flush may hold up process exit.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// A single outcome event. Serialized as camelCase JSON; absent optional
/// fields are omitted entirely.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TelemetryEvent {
    /// Existing credential was already valid.
    pub fn success() -> Self {
        Self {
            success: true,
            automatic_success: None,
            error: None,
        }
    }

    /// Automatic provisioning succeeded.
    pub fn automatic_success() -> Self {
        Self {
            success: true,
            automatic_success: Some(true),
            error: None,
        }
    }

    /// Benign failure with no provisioning attempt (unsupported platform).
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            automatic_success: None,
            error: Some(error.into()),
        }
    }

    /// Provisioning path failed (or was skipped against an invalid token).
    pub fn automatic_failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            automatic_success: Some(false),
            error: Some(error.into()),
        }
    }
}

#[derive(Serialize)]
struct Payload {
    session_id: Uuid,
    #[serde(flatten)]
    event: TelemetryEvent,
}

/// Fire-and-forget event reporter with a per-run session id.
pub struct Reporter {
    client: reqwest::Client,
    endpoint: Option<String>,
    session_id: Uuid,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl Reporter {
    /// Reporter for the given collector endpoint (`None` disables sending).
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            session_id: Uuid::new_v4(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Resolve the endpoint from the environment.
    pub fn from_env() -> Self {
        Self::new(std::env::var(TELEMETRY_ENV).ok().filter(|v| !v.is_empty()))
    }

    /// A reporter that records nothing (tests, Codespaces paths).
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Record one event.
    ///
    /// `critical` awaits delivery (bounded by [`FLUSH_TIMEOUT`]) so failure
    /// events survive the imminent process exit; otherwise the send is
    /// spawned, the call returns immediately, and delivery completes at the
    /// next [`Reporter::flush`]. Either way every failure is swallowed.
    pub async fn log(&self, event: TelemetryEvent, critical: bool) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(?event, "telemetry disabled, dropping event");
            return;
        };
        let payload = Payload {
            session_id: self.session_id,
            event,
        };

        if critical {
            let send = self.client.post(&endpoint).json(&payload).send();
            match tokio::time::timeout(FLUSH_TIMEOUT, send).await {
                Ok(Ok(response)) => {
                    debug!(status = %response.status(), "telemetry event delivered")
                }
                Ok(Err(e)) => debug!(error = %e, "telemetry send failed"),
                Err(_) => debug!("telemetry flush timed out"),
            }
        } else {
            let client = self.client.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = client.post(&endpoint).json(&payload).send().await {
                    debug!(error = %e, "telemetry send failed");
                }
            });
            self.pending.lock().await.push(handle);
        }
    }

    /// Await any in-flight spawned sends, bounded by [`FLUSH_TIMEOUT`].
    ///
    /// Spawned sends are cancelled when the runtime is dropped, so the
    /// binary calls this once before returning from `main`. Sends that miss
    /// the deadline are abandoned, never surfaced.
    pub async fn flush(&self) {
        let pending: Vec<_> = self.pending.lock().await.drain(..).collect();
        if pending.is_empty() {
            return;
        }
        let drain = async {
            for handle in pending {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(FLUSH_TIMEOUT, drain).await.is_err() {
            debug!("telemetry flush timed out");
        }
    }
}
