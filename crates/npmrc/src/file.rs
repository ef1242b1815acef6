//! Line-preserving `.npmrc` parsing and persistence
//!
//! The npmrc format is line-oriented `key=value` with `#`/`;` comments.
//! Parsing keeps the raw text of every line so untouched lines round-trip
//! exactly; only entries rewritten through [`NpmrcFile::set`] are
//! re-serialized.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// One line of an `.npmrc` file.
#[derive(Debug, Clone)]
pub enum Line {
    /// A `key=value` setting. `raw` holds the original text so unmodified
    /// entries keep their exact spacing on rewrite.
    Entry {
        key: String,
        value: String,
        raw: String,
    },
    /// Comment, blank line, or anything else we don't interpret.
    Verbatim(String),
}

/// An `.npmrc` file held in memory as an ordered list of lines.
pub struct NpmrcFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl NpmrcFile {
    /// Load an npmrc from the given path.
    ///
    /// A missing file is not an error: it loads as empty and comes into
    /// existence on the first [`save`](Self::save), the same cold-start
    /// behavior npm itself has for a fresh user profile.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let lines = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading {}: {e}", path.display())))?;
            let lines = parse(&contents);
            debug!(path = %path.display(), lines = lines.len(), "loaded npmrc");
            lines
        } else {
            debug!(path = %path.display(), "npmrc not found, starting empty");
            Vec::new()
        };
        Ok(Self { path, lines })
    }

    /// Build an npmrc from in-memory contents, for callers that already
    /// read the file (and for tests).
    pub fn from_contents(path: impl Into<PathBuf>, contents: &str) -> Self {
        Self {
            path: path.into(),
            lines: parse(contents),
        }
    }

    /// Path this file was loaded from and will be saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of the last entry with the given key, npm's precedence rule
    /// when a key is repeated.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Create or replace an entry.
    ///
    /// The first occurrence is rewritten in place and any later duplicates
    /// of the same key are dropped, so a rewritten file has exactly one
    /// authoritative line per key we own. Unrelated keys are untouched.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut found = false;
        self.lines.retain_mut(|line| {
            let Line::Entry {
                key: k,
                value: v,
                raw,
            } = line
            else {
                return true;
            };
            if k != key {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            *v = value.to_string();
            *raw = format!("{key}={value}");
            true
        });
        if !found {
            self.lines.push(Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: format!("{key}={value}"),
            });
        }
    }

    /// All registry entries: the default `registry` key plus any scoped
    /// `@scope:registry` keys, in file order.
    pub fn registry_urls(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Entry { key, value, .. }
                    if key == "registry" || key.ends_with(":registry") =>
                {
                    Some(value.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Serialize back to npmrc text. Untouched lines reproduce their
    /// original bytes.
    pub fn to_contents(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { raw, .. } => out.push_str(raw),
                Line::Verbatim(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    /// Persist to disk atomically.
    ///
    /// Writes a temp file in the target directory, sets 0600 (the file holds
    /// an encoded PAT), then renames over the destination.
    pub async fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let tmp_path = dir.join(format!(".npmrc.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, self.to_contents())
            .await
            .map_err(|e| Error::Io(format!("writing temp npmrc: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| Error::Io(format!("setting npmrc permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp npmrc: {e}")))?;

        info!(path = %self.path.display(), "persisted npmrc");
        Ok(())
    }
}

/// Split npmrc text into lines, classifying each as an entry or verbatim.
fn parse(contents: &str) -> Vec<Line> {
    contents
        .lines()
        .map(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                return Line::Verbatim(raw.to_string());
            }
            match trimmed.split_once('=') {
                Some((key, value)) => Line::Entry {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                    raw: raw.to_string(),
                },
                None => Line::Verbatim(raw.to_string()),
            }
        })
        .collect()
}
