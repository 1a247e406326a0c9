/// Canonical file paths for the daemon's data files.
///
/// Both files live in the per-user config directory
/// (`%APPDATA%\ProxyMonitor\` on Windows):
///   - config.toml  Written by the settings window, read by the daemon.
///   - status.toml  Written by the daemon next to config.toml, read by the settings window.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "ProxyMonitor";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the application data directory, falling back to the working
/// directory when the platform reports no config directory.
pub fn app_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}
