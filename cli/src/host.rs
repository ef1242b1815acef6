//! Host gates
//!
//! Two pure predicates over system-reported strings decide whether a run
//! proceeds at all: the platform allow-list (the identity helper only ships
//! binaries for mainstream desktop/CI targets) and the Codespaces signal
//! (remote dev environments arrive pre-authenticated).

/// Environment variable Codespaces sets to `"true"` inside a codespace.
pub const CODESPACES_ENV: &str = "CODESPACES";

/// Snapshot of the host taken once at startup.
#[derive(Debug, Clone)]
pub struct Host {
    pub os: String,
    pub arch: String,
    pub codespaces: bool,
}

impl Host {
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            codespaces: is_codespaces(std::env::var(CODESPACES_ENV).ok().as_deref()),
        }
    }
}

/// Allow-list of (os, arch) pairs the helper supports. Anything
/// unrecognized is unsupported, never an error.
pub fn is_supported(os: &str, arch: &str) -> bool {
    matches!(
        (os, arch),
        ("windows" | "macos" | "linux", "x86_64" | "aarch64")
    )
}

/// Codespaces sets `CODESPACES=true`; any other value (or absence) means a
/// regular host.
pub fn is_codespaces(value: Option<&str>) -> bool {
    value == Some("true")
}
