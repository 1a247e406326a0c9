/// The monitored conditions and the contract their sensors implement.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;

/// One of the boolean system facts the daemon watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionId {
    /// The per-user system HTTP proxy is enabled.
    Proxy,
    /// A tunneling network adapter is up.
    Tun,
}

impl ConditionId {
    pub const ALL: [ConditionId; 2] = [ConditionId::Proxy, ConditionId::Tun];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionId::Proxy => "proxy",
            ConditionId::Tun => "tun",
        }
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxy" => Ok(ConditionId::Proxy),
            "tun" => Ok(ConditionId::Tun),
            other => Err(format!("unknown condition '{other}' (expected 'proxy' or 'tun')")),
        }
    }
}

/// A single reading of a condition. `Unknown` means "never sampled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    #[default]
    Unknown,
    Inactive,
    Active,
}

impl TriState {
    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl From<bool> for TriState {
    fn from(active: bool) -> Self {
        if active {
            TriState::Active
        } else {
            TriState::Inactive
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The sensor exists on this platform but could not produce a reading now.
    #[error("{0} unavailable: {1}")]
    Unavailable(&'static str, String),
    /// The sensor is not implemented on this platform.
    #[error("{0} sampling is only supported on Windows")]
    Unsupported(&'static str),
}

/// Reads the raw state of one condition.
///
/// Implementations must not panic. A failed read returns `Err`, which the
/// monitor treats exactly like "no change this tick". `config` is the live
/// snapshot for the current tick.
pub trait ConditionSource: Send {
    fn sample(&mut self, config: &Config) -> Result<TriState, SampleError>;
}

impl<F> ConditionSource for F
where
    F: FnMut(&Config) -> Result<TriState, SampleError> + Send,
{
    fn sample(&mut self, config: &Config) -> Result<TriState, SampleError> {
        self(config)
    }
}
