//! Server configuration, read from a TOML file.
//!
//! ```toml
//! schema_file = "/etc/vmdir/vmdir.schema"
//! invocation_id = "5b9e2f6e-0f3c-4e0b-9a51-1d6f1f0c8e7a"
//! poll_timeout_ms = 500
//! batch_size = 64
//! log_level = "info"
//! ```
//!
//! Every key is optional.

use crate::error::{ServerError, ServerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Matches the watch manager's default poll timeout.
const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Schema file loaded at startup.
    pub schema_file: Option<PathBuf>,
    /// This replica's invocation id. A fresh one is generated when absent.
    pub invocation_id: Option<String>,
    /// How long the watch dispatcher waits for an active session.
    pub poll_timeout_ms: u64,
    /// Events delivered to one session before it goes to the back of the
    /// queue.
    pub batch_size: usize,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            schema_file: None,
            invocation_id: None,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            batch_size: 64,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads a config file. Unlike a missing key, an unreadable or malformed
    /// file is an error.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn parse(contents: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ServerResult<()> {
        if self.batch_size == 0 {
            return Err(ServerError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}
