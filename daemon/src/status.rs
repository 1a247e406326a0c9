use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::condition::{ConditionId, TriState};

/// Runtime status written by the daemon to `status.toml`.
/// The settings window reads this file (read-only) to display the current state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonitorStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// Whether the monitor loop is polling.
    pub running: bool,
    pub proxy: TriState,
    pub tun: TriState,
    /// RFC 3339 timestamp of the most recent announced transition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition: Option<String>,
}

impl MonitorStatus {
    /// Constructs the initial status on daemon startup.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            running: false,
            proxy: TriState::Unknown,
            tun: TriState::Unknown,
            last_transition: None,
        }
    }

    pub fn state(&self, id: ConditionId) -> TriState {
        match id {
            ConditionId::Proxy => self.proxy,
            ConditionId::Tun => self.tun,
        }
    }

    pub fn set_state(&mut self, id: ConditionId, state: TriState) {
        match id {
            ConditionId::Proxy => self.proxy = state,
            ConditionId::Tun => self.tun = state,
        }
    }

    pub fn mark_transition(&mut self) {
        self.last_transition = Some(chrono::Local::now().to_rfc3339());
    }
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Failures are logged, never propagated.
pub fn write_status(path: &Path, status: &MonitorStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create status directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!("Failed to write status file {}: {e}", path.display());
            }
        }
        Err(e) => warn!("Failed to serialize status: {e}"),
    }
}
