use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::condition::ConditionId;
use crate::detector::Direction;
use crate::event::DaemonEvent;

pub const MIN_VOLUME: i32 = 0;
pub const MAX_VOLUME: i32 = 100;
pub const DEFAULT_VOLUME: i32 = 100;
/// SAPI speaking-rate range.
pub const MIN_TTS_RATE: i32 = -10;
pub const MAX_TTS_RATE: i32 = 10;

pub const PROXY_ENABLED_TEXT: &str = "系统代理开启";
pub const PROXY_DISABLED_TEXT: &str = "系统代理关闭";
pub const TUN_ENABLED_TEXT: &str = "TUN模式开启";
pub const TUN_DISABLED_TEXT: &str = "TUN模式关闭";
pub const DEFAULT_TUN_KEYWORDS: &[&str] = &["tun", "wintun", "wireguard", "clash", "mihomo", "sing-box"];

/// Root configuration structure. Deserialized from the per-user `config.toml`.
///
/// A `Config` is never mutated while the monitor uses it. Saving builds a new
/// value and publishes it through [`SharedConfig::replace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Register the daemon under the user's Run key.
    #[serde(default)]
    pub run_on_startup: bool,
    #[serde(default = "default_proxy")]
    pub proxy: NotificationSettings,
    #[serde(default)]
    pub tun: TunConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_on_startup: false,
            proxy: default_proxy(),
            tun: TunConfig::default(),
        }
    }
}

/// How one condition is announced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Spoken when the condition becomes active. Absent means the built-in
    /// text for the condition; an empty string means "say nothing".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_clip_enabled: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_clip_disabled: Option<PathBuf>,
    /// Clip volume in percent. Clamped to [0, 100] at use.
    #[serde(default = "default_volume")]
    pub audio_volume_enabled: i32,
    #[serde(default = "default_volume")]
    pub audio_volume_disabled: i32,
    #[serde(default = "default_volume")]
    pub tts_volume: i32,
    /// Speech rate offset. Clamped to [-10, 10] at use.
    #[serde(default)]
    pub tts_rate: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// Prefer the configured clip over speech when it is readable.
    #[serde(default)]
    pub use_audio_file: bool,
}

impl NotificationSettings {
    /// Settings with the built-in texts of `id` filled in.
    pub fn for_condition(id: ConditionId) -> Self {
        Self {
            enabled_text: Some(default_text(id, Direction::BecameActive).to_string()),
            disabled_text: Some(default_text(id, Direction::BecameInactive).to_string()),
            audio_clip_enabled: None,
            audio_clip_disabled: None,
            audio_volume_enabled: DEFAULT_VOLUME,
            audio_volume_disabled: DEFAULT_VOLUME,
            tts_volume: DEFAULT_VOLUME,
            tts_rate: 0,
            voice_id: None,
            use_audio_file: false,
        }
    }

    pub fn text(&self, id: ConditionId, direction: Direction) -> &str {
        let configured = match direction {
            Direction::BecameActive => self.enabled_text.as_deref(),
            Direction::BecameInactive => self.disabled_text.as_deref(),
        };
        configured.unwrap_or_else(|| default_text(id, direction))
    }

    pub fn audio_clip(&self, direction: Direction) -> Option<&Path> {
        match direction {
            Direction::BecameActive => self.audio_clip_enabled.as_deref(),
            Direction::BecameInactive => self.audio_clip_disabled.as_deref(),
        }
    }

    pub fn audio_volume(&self, direction: Direction) -> u8 {
        clamp_volume(match direction {
            Direction::BecameActive => self.audio_volume_enabled,
            Direction::BecameInactive => self.audio_volume_disabled,
        })
    }

    pub fn speech_volume(&self) -> u8 {
        clamp_volume(self.tts_volume)
    }

    pub fn speech_rate(&self) -> i32 {
        self.tts_rate.clamp(MIN_TTS_RATE, MAX_TTS_RATE)
    }

    /// The configured voice, if any non-blank id is set.
    pub fn voice(&self) -> Option<&str> {
        self.voice_id.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// TUN adapter monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunConfig {
    #[serde(default)]
    pub monitoring_enabled: bool,
    /// Case-insensitive substrings matched against adapter names and descriptions.
    #[serde(default = "default_tun_keywords")]
    pub interface_keywords: Vec<String>,
    #[serde(flatten)]
    pub notification: NotificationSettings,
}

impl Default for TunConfig {
    fn default() -> Self {
        Self {
            monitoring_enabled: false,
            interface_keywords: default_tun_keywords(),
            notification: NotificationSettings::for_condition(ConditionId::Tun),
        }
    }
}

impl TunConfig {
    /// Keywords trimmed and lowercased, blanks dropped, duplicates removed
    /// keeping the first occurrence.
    pub fn keywords(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.interface_keywords.len());
        for keyword in &self.interface_keywords {
            let k = keyword.trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        out
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TUN monitoring is enabled but no interface keyword is configured")]
    NoTunKeywords,
}

impl Config {
    /// Per-condition settings lookup.
    pub fn notification(&self, id: ConditionId) -> &NotificationSettings {
        match id {
            ConditionId::Proxy => &self.proxy,
            ConditionId::Tun => &self.tun.notification,
        }
    }

    /// Whether `id` should be sampled on this tick.
    pub fn is_monitored(&self, id: ConditionId) -> bool {
        match id {
            ConditionId::Proxy => true,
            ConditionId::Tun => self.tun.monitoring_enabled,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tun.monitoring_enabled && self.tun.keywords().is_empty() {
            return Err(ConfigError::NoTunKeywords);
        }
        Ok(())
    }
}

/// Built-in text for `id` in `direction`.
pub fn default_text(id: ConditionId, direction: Direction) -> &'static str {
    match (id, direction) {
        (ConditionId::Proxy, Direction::BecameActive) => PROXY_ENABLED_TEXT,
        (ConditionId::Proxy, Direction::BecameInactive) => PROXY_DISABLED_TEXT,
        (ConditionId::Tun, Direction::BecameActive) => TUN_ENABLED_TEXT,
        (ConditionId::Tun, Direction::BecameInactive) => TUN_DISABLED_TEXT,
    }
}

pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(MIN_VOLUME, MAX_VOLUME) as u8
}

// ── Shared snapshot ───────────────────────────────────────────────────────────

/// The live configuration, published as immutable snapshots.
///
/// Readers take an `Arc<Config>` and keep it for as long as they need it.
/// [`SharedConfig::replace`] swaps the whole snapshot in one step, so a reader
/// never observes a half-written config.
#[derive(Clone)]
pub struct SharedConfig {
    tx: Arc<watch::Sender<Arc<Config>>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.tx.borrow().clone()
    }

    pub fn replace(&self, config: Config) {
        self.tx.send_replace(Arc::new(config));
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

pub trait ConfigStore {
    /// Returns the stored config, or the defaults if it is missing or corrupt.
    fn load(&self) -> Config;
    fn save(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        load_or_default(&self.path).unwrap_or_else(|e| {
            warn!("{e:#}; using defaults");
            Config::default()
        })
    }

    fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Spawns a file watcher on the parent directory of `path`.  Whenever the config
/// file is created or modified, reloads it and sends a `ConfigReloaded` event.
/// A file that fails to parse is reported and otherwise ignored.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<DaemonEvent>) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            warn!("Failed to create config file watcher: {e}");
            return;
        }
    };

    // Watch the parent directory rather than the file directly so we catch
    // editor-style atomic saves (write-new + rename).
    let (watch_dir, target) = match watch_target(&path) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Cannot resolve config directory for {}: {e}", path.display());
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        warn!("Failed to watch config directory {}: {e}", watch_dir.display());
        return;
    }
    debug!("Watching {} for config changes", watch_dir.display());

    while let Some(event) = watch_rx.recv().await {
        let affects_config = event.paths.iter().any(|p| p == &target);
        let is_write = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        );
        if !(affects_config && is_write) {
            continue;
        }

        match load_or_default(&target) {
            Ok(config) => {
                if tx.send(DaemonEvent::ConfigReloaded(config)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Failed to reload config, keeping current settings: {e:#}"),
        }
    }
}

/// Returns the canonical directory to watch and the path notify will report
/// for the config file inside it. A bare file name resolves against the
/// working directory.
fn watch_target(path: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "config path has no file name")
    })?;
    let dir = std::fs::canonicalize(parent)?;
    let target = dir.join(file_name);
    Ok((dir, target))
}

fn default_proxy() -> NotificationSettings {
    NotificationSettings::for_condition(ConditionId::Proxy)
}

fn default_volume() -> i32 {
    DEFAULT_VOLUME
}

fn default_tun_keywords() -> Vec<String> {
    DEFAULT_TUN_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
